// Copyright (c) 2025 Felix Kahle.
//
// Permission is hereby granted, free of charge, to any person obtaining
// a copy of this software and associated documentation files (the
// "Software"), to deal in the Software without restriction, including
// without limitation the rights to use, copy, modify, merge, publish,
// distribute, sublicense, and/or sell copies of the Software, and to
// permit persons to whom the Software is furnished to do so, subject to
// the following conditions:
//
// The above copyright notice and this permission notice shall be
// included in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
// MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE
// LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION
// OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION
// WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

//! # Welds
//!
//! A weld is a straight seam parallel to the gantry travel axis at a fixed
//! Y, on one of the two sides of the rail. Progress is tracked as completed
//! length; a weld is complete once its full extent has been laid down.
//! The zone work-splitter may cut a weld into two fragments that replace
//! the parent in the [`WeldArena`]; fragments carry their parent's id for
//! audit and together conserve the original length.

use crate::id::WeldId;
use gantry_weld_core::space::{SpaceLength, SpanInterval, XPosition, YPosition};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Display;

/// Which side of the gantry a robot or a weld sits on. Robots only weld
/// seams on their own side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    XPlus,
    XMinus,
}

impl Side {
    #[inline]
    pub fn opposite(self) -> Side {
        match self {
            Side::XPlus => Side::XMinus,
            Side::XMinus => Side::XPlus,
        }
    }
}

impl Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::XPlus => write!(f, "x_plus"),
            Side::XMinus => write!(f, "x_minus"),
        }
    }
}

/// A straight seam at fixed Y, spanning an X interval on one gantry side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weld {
    id: WeldId,
    span: SpanInterval,
    y: YPosition,
    side: Side,
    done: SpaceLength,
    parent: Option<WeldId>,
}

impl Weld {
    /// Creates a fresh weld. The span is normalized, so the arguments may
    /// arrive in either order.
    pub fn new(id: WeldId, x_start: XPosition, x_end: XPosition, y: YPosition, side: Side) -> Self {
        Self {
            id,
            span: SpanInterval::new(x_start, x_end),
            y,
            side,
            done: SpaceLength::zero(),
            parent: None,
        }
    }

    #[inline]
    pub fn id(&self) -> WeldId {
        self.id
    }

    #[inline]
    pub fn span(&self) -> SpanInterval {
        self.span
    }

    #[inline]
    pub fn x_start(&self) -> XPosition {
        self.span.lo()
    }

    #[inline]
    pub fn x_end(&self) -> XPosition {
        self.span.hi()
    }

    #[inline]
    pub fn y(&self) -> YPosition {
        self.y
    }

    #[inline]
    pub fn side(&self) -> Side {
        self.side
    }

    #[inline]
    pub fn length(&self) -> SpaceLength {
        self.span.measure()
    }

    #[inline]
    pub fn done(&self) -> SpaceLength {
        self.done
    }

    #[inline]
    pub fn remaining(&self) -> SpaceLength {
        self.length() - self.done
    }

    #[inline]
    pub fn is_complete(&self) -> bool {
        self.done.value() >= self.length().value()
    }

    #[inline]
    pub fn parent(&self) -> Option<WeldId> {
        self.parent
    }

    /// Advances progress by `delta`, clamped to the weld length. Progress
    /// never decreases.
    pub fn advance(&mut self, delta: SpaceLength) {
        debug_assert!(delta.value() >= 0.0);
        self.done = (self.done + delta).min(self.length());
    }

    /// Cuts the weld at `at` into two fragments sharing no X range.
    ///
    /// Both fragments start with zero progress and record this weld as
    /// their parent. The cut point is clamped into the span, so the
    /// fragment lengths always sum to the original length.
    pub fn split_at(&self, at: XPosition, left_id: WeldId, right_id: WeldId) -> (Weld, Weld) {
        let at = at.clamp(self.x_start(), self.x_end());
        let left = Weld {
            id: left_id,
            span: SpanInterval::new(self.x_start(), at),
            y: self.y,
            side: self.side,
            done: SpaceLength::zero(),
            parent: Some(self.id),
        };
        let right = Weld {
            id: right_id,
            span: SpanInterval::new(at, self.x_end()),
            y: self.y,
            side: self.side,
            done: SpaceLength::zero(),
            parent: Some(self.id),
        };
        (left, right)
    }
}

/// Owning store for welds, addressed by [`WeldId`].
///
/// The planner works on an arena while splitting, and the simulator owns one
/// during execution; everything else holds ids.
#[derive(Debug, Clone, Default)]
pub struct WeldArena {
    welds: Vec<Weld>,
    index: HashMap<WeldId, usize>,
    next_id: u64,
}

impl WeldArena {
    pub fn from_welds(welds: Vec<Weld>) -> Self {
        let mut index = HashMap::with_capacity(welds.len());
        let mut next_id = 0;
        for (i, w) in welds.iter().enumerate() {
            let prev = index.insert(w.id(), i);
            debug_assert!(prev.is_none(), "duplicate weld id {}", w.id());
            next_id = next_id.max(w.id().value() + 1);
        }
        Self {
            welds,
            index,
            next_id,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.welds.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.welds.is_empty()
    }

    #[inline]
    pub fn get(&self, id: WeldId) -> Option<&Weld> {
        self.index.get(&id).map(|&i| &self.welds[i])
    }

    #[inline]
    pub fn get_mut(&mut self, id: WeldId) -> Option<&mut Weld> {
        self.index.get(&id).map(|&i| &mut self.welds[i])
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Weld> {
        self.welds.iter()
    }

    #[inline]
    pub fn ids(&self) -> impl Iterator<Item = WeldId> + '_ {
        self.welds.iter().map(|w| w.id())
    }

    pub fn into_welds(self) -> Vec<Weld> {
        self.welds
    }

    /// Total extent across all welds in the arena.
    pub fn total_length(&self) -> SpaceLength {
        self.welds.iter().map(|w| w.length()).sum()
    }

    /// Total completed extent across all welds in the arena.
    pub fn completed_length(&self) -> SpaceLength {
        self.welds.iter().map(|w| w.done()).sum()
    }

    /// Splits the weld `parent` at `at`, replacing it with two fresh
    /// fragments. The left fragment takes the parent's slot, the right is
    /// appended. Returns the fragment ids, or `None` for an unknown parent.
    pub fn split(&mut self, parent: WeldId, at: XPosition) -> Option<(WeldId, WeldId)> {
        let idx = *self.index.get(&parent)?;
        let left_id = self.alloc_id();
        let right_id = self.alloc_id();
        let (left, right) = self.welds[idx].split_at(at, left_id, right_id);
        self.welds[idx] = left;
        self.index.remove(&parent);
        self.index.insert(left_id, idx);
        self.index.insert(right_id, self.welds.len());
        self.welds.push(right);
        Some((left_id, right_id))
    }

    fn alloc_id(&mut self) -> WeldId {
        let id = WeldId::new(self.next_id);
        self.next_id += 1;
        id
    }
}
