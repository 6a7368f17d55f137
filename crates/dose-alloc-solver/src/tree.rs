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

//! Ordered partition of the start-time axis into ranges.
//!
//! The tree is an AVL tree whose nodes live in an arena and refer to each
//! other by index. Every node caches its height and the size of its subtree,
//! so lookups, positional access and rank queries all run in `O(log n)`.
//!
//! A tree created with [`RangeTree::new`] covers `[0, ∞)` without gaps and
//! keeps that partition under [`RangeTree::mark_occupied`]: after every call
//! no two adjacent ranges carry the same occupancy set.

use crate::range::{Range, RangeEntry};
use dose_alloc_core::{
    SolverVariable,
    primitives::Span,
    time::{TimePoint, TimeSpan},
};
use dose_alloc_model::id::MachineId;
use std::{cmp::Ordering, fmt::Display};
use tracing::trace;

#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct NodeId(usize);

#[derive(Debug, Clone)]
struct Node<T: SolverVariable> {
    range: Range<T>,
    left: Option<NodeId>,
    right: Option<NodeId>,
    height: u32,
    size: usize,
}

#[derive(Debug, Clone)]
enum Slot<T: SolverVariable> {
    Used(Node<T>),
    Free(Option<NodeId>),
}

/// No range contains or precedes the requested point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeNotFoundError<T: SolverVariable> {
    point: TimePoint<T>,
}

impl<T: SolverVariable> RangeNotFoundError<T> {
    #[inline]
    pub fn new(point: TimePoint<T>) -> Self {
        Self { point }
    }

    #[inline]
    pub fn point(&self) -> &TimePoint<T> {
        &self.point
    }
}

impl<T: SolverVariable> Display for RangeNotFoundError<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "No range found for time point {}", self.point)
    }
}

impl<T: SolverVariable> std::error::Error for RangeNotFoundError<T> {}

/// The tree was modified after the cursor was created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaleCursorError {
    cursor_generation: u64,
    tree_generation: u64,
}

impl StaleCursorError {
    #[inline]
    pub fn new(cursor_generation: u64, tree_generation: u64) -> Self {
        Self {
            cursor_generation,
            tree_generation,
        }
    }

    #[inline]
    pub fn cursor_generation(&self) -> u64 {
        self.cursor_generation
    }

    #[inline]
    pub fn tree_generation(&self) -> u64 {
        self.tree_generation
    }
}

impl Display for StaleCursorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Cursor created at tree generation {} used at generation {}",
            self.cursor_generation, self.tree_generation
        )
    }
}

impl std::error::Error for StaleCursorError {}

/// A structural property of the partition does not hold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeInvariantError<T: SolverVariable> {
    Empty,
    DoesNotStartAtZero {
        start: TimePoint<T>,
    },
    NotContiguous {
        end: TimePoint<T>,
        next_start: TimePoint<T>,
    },
    UnboundedInterior {
        start: TimePoint<T>,
    },
    BoundedTail {
        end: TimePoint<T>,
    },
    Unmerged {
        left: TimePoint<T>,
        right: TimePoint<T>,
    },
    Unbalanced {
        start: TimePoint<T>,
    },
    Misaugmented {
        start: TimePoint<T>,
    },
}

impl<T: SolverVariable> Display for TreeInvariantError<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "Tree holds no ranges"),
            Self::DoesNotStartAtZero { start } => {
                write!(f, "First range starts at {} instead of 0", start)
            }
            Self::NotContiguous { end, next_start } => write!(
                f,
                "Range ending at {} is followed by a range starting at {}",
                end, next_start
            ),
            Self::UnboundedInterior { start } => {
                write!(f, "Unbounded range starting at {} is not the last", start)
            }
            Self::BoundedTail { end } => write!(f, "Last range ends at {}", end),
            Self::Unmerged { left, right } => write!(
                f,
                "Adjacent ranges starting at {} and {} share an occupancy set",
                left, right
            ),
            Self::Unbalanced { start } => {
                write!(f, "Subtree rooted at range {} is unbalanced", start)
            }
            Self::Misaugmented { start } => write!(
                f,
                "Cached height or size of node {} is out of date",
                start
            ),
        }
    }
}

impl<T: SolverVariable> std::error::Error for TreeInvariantError<T> {}

#[derive(Debug, Clone)]
pub struct RangeTree<T: SolverVariable> {
    slots: Vec<Slot<T>>,
    free: Option<NodeId>,
    root: Option<NodeId>,
    generation: u64,
}

impl<T: SolverVariable> Default for RangeTree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: SolverVariable> RangeTree<T> {
    /// A tree holding the single free range `[0, ∞)`.
    pub fn new() -> Self {
        let mut tree = Self::empty();
        tree.insert(Range::free(Span::unbounded(TimePoint::zero())));
        tree
    }

    /// A tree without any range.
    #[inline]
    pub fn empty() -> Self {
        Self {
            slots: Vec::new(),
            free: None,
            root: None,
            generation: 0,
        }
    }

    /// Builds a tree from disjoint ranges, in any order.
    ///
    /// # Panics
    ///
    /// Panics if two of the ranges overlap.
    pub fn from_ranges<I>(ranges: I) -> Self
    where
        I: IntoIterator<Item = Range<T>>,
    {
        let mut tree = Self::empty();
        for range in ranges {
            tree.insert(range);
        }
        tree
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.size(self.root)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Counter bumped by every mutation. Cursors compare against it.
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Inserts a range.
    ///
    /// # Panics
    ///
    /// Panics if the range overlaps one already in the tree.
    pub fn insert(&mut self, range: Range<T>) {
        self.insert_node(range);
        self.generation += 1;
    }

    /// Removes the range starting at `start` and returns it.
    pub fn delete(&mut self, start: &TimePoint<T>) -> Option<Range<T>> {
        let removed = self.remove_node(start);
        if removed.is_some() {
            self.generation += 1;
        }
        removed
    }

    /// The range containing `point`.
    pub fn find(&self, point: &TimePoint<T>) -> Result<&Range<T>, RangeNotFoundError<T>> {
        self.find_node(point)
            .map(|id| &self.node(id).range)
            .ok_or_else(|| RangeNotFoundError::new(point.clone()))
    }

    /// The range containing `point`, or else the last range before it.
    pub fn find_or_previous(
        &self,
        point: &TimePoint<T>,
    ) -> Result<&Range<T>, RangeNotFoundError<T>> {
        let mut cur = self.root;
        let mut best = None;
        while let Some(id) = cur {
            let node = self.node(id);
            if point < node.range.start() {
                cur = node.left;
            } else if node.range.contains(point) {
                return Ok(&node.range);
            } else {
                best = Some(&node.range);
                cur = node.right;
            }
        }
        best.ok_or_else(|| RangeNotFoundError::new(point.clone()))
    }

    #[inline]
    pub fn first(&self) -> Option<&Range<T>> {
        self.nth(0)
    }

    #[inline]
    pub fn last(&self) -> Option<&Range<T>> {
        self.len().checked_sub(1).and_then(|i| self.nth(i))
    }

    /// The last range starting before `start`.
    pub fn predecessor(&self, start: &TimePoint<T>) -> Option<&Range<T>> {
        self.predecessor_node(start).map(|id| &self.node(id).range)
    }

    /// The first range starting after `start`.
    pub fn successor(&self, start: &TimePoint<T>) -> Option<&Range<T>> {
        self.successor_node(start).map(|id| &self.node(id).range)
    }

    /// The range at position `index` in start order.
    pub fn nth(&self, mut index: usize) -> Option<&Range<T>> {
        let mut cur = self.root;
        while let Some(id) = cur {
            let node = self.node(id);
            let left = self.size(node.left);
            match index.cmp(&left) {
                Ordering::Less => cur = node.left,
                Ordering::Equal => return Some(&node.range),
                Ordering::Greater => {
                    index -= left + 1;
                    cur = node.right;
                }
            }
        }
        None
    }

    /// Number of ranges that start strictly before `point`.
    pub fn rank(&self, point: &TimePoint<T>) -> usize {
        let mut cur = self.root;
        let mut rank = 0;
        while let Some(id) = cur {
            let node = self.node(id);
            if node.range.start() < point {
                rank += self.size(node.left) + 1;
                cur = node.right;
            } else {
                cur = node.left;
            }
        }
        rank
    }

    /// All ranges in start order.
    pub fn iter(&self) -> Iter<'_, T> {
        let mut stack = Vec::new();
        self.push_left_spine(self.root, &mut stack);
        Iter { tree: self, stack }
    }

    /// A copy of every range in start order.
    pub fn ranges(&self) -> Vec<Range<T>> {
        self.iter().cloned().collect()
    }

    /// Ranges sharing at least one point with `[lo, hi]`, each seen together
    /// with its neighbours. A missing `hi` leaves the window unbounded.
    ///
    /// # Panics
    ///
    /// Panics if `hi < lo`.
    pub fn iter_overlapping(
        &self,
        lo: &TimePoint<T>,
        hi: Option<&TimePoint<T>>,
    ) -> Overlapping<'_, T> {
        assert!(
            hi.is_none_or(|hi| lo <= hi),
            "RangeTree::iter_overlapping: lo must not exceed hi"
        );
        let mut iter = Iter {
            tree: self,
            stack: self.seek_stack(lo),
        };
        let pending = iter.next();
        let prev = pending.and_then(|r| self.predecessor(r.start()));
        Overlapping {
            iter,
            hi: hi.cloned(),
            prev,
            pending,
        }
    }

    /// Like [`RangeTree::iter_overlapping`], but detached from the borrow of
    /// the tree. The cursor refuses to move once the tree has changed.
    ///
    /// # Panics
    ///
    /// Panics if `hi < lo`.
    pub fn cursor_overlapping(
        &self,
        lo: &TimePoint<T>,
        hi: Option<&TimePoint<T>>,
    ) -> OverlapCursor<T> {
        assert!(
            hi.is_none_or(|hi| lo <= hi),
            "RangeTree::cursor_overlapping: lo must not exceed hi"
        );
        OverlapCursor {
            lo: lo.clone(),
            hi: hi.cloned(),
            next_point: Some(lo.clone()),
            generation: self.generation,
        }
    }

    /// Adds `machine` to the occupancy of every point in `[lo, hi]`.
    ///
    /// Ranges straddling a window border are split, and afterwards every pair
    /// of adjacent ranges between the left neighbour of `lo` and the right
    /// neighbour of `hi` with equal occupancy is merged again.
    ///
    /// The tree must cover `[0, ∞)`, as one built with [`RangeTree::new`] does.
    ///
    /// # Panics
    ///
    /// Panics if `hi < lo`.
    pub fn mark_occupied(&mut self, lo: &TimePoint<T>, hi: &TimePoint<T>, machine: MachineId) {
        let window = Span::bounded(lo.clone(), hi.clone());
        let touched: Vec<TimeSpan<T>> = self
            .iter_overlapping(lo, Some(hi))
            .filter(|e| !e.range().occupied().contains(machine))
            .map(|e| e.range().span().clone())
            .collect();
        let split = touched.len();
        for span in touched {
            self.mark_span(span, &window, machine);
        }
        let merged = self.coalesce(&lo.pred(), &hi.succ());
        self.generation += 1;
        debug_assert_eq!(self.check_invariants(), Ok(()));
        trace!(
            lo = %lo,
            hi = %hi,
            machine = machine.value(),
            split,
            merged,
            ranges = self.len(),
            "marked machine occupied"
        );
    }

    /// Verifies the partition and the balance of the tree.
    pub fn check_invariants(&self) -> Result<(), TreeInvariantError<T>> {
        if let Some(root) = self.root {
            self.check_node(root)?;
        }
        let mut ranges = self.iter().peekable();
        let first = ranges.peek().ok_or(TreeInvariantError::Empty)?;
        if first.start() != &TimePoint::zero() {
            return Err(TreeInvariantError::DoesNotStartAtZero {
                start: first.start().clone(),
            });
        }
        while let Some(range) = ranges.next() {
            let Some(next) = ranges.peek() else {
                return match range.end() {
                    Some(end) => Err(TreeInvariantError::BoundedTail { end: end.clone() }),
                    None => Ok(()),
                };
            };
            let Some(end) = range.end() else {
                return Err(TreeInvariantError::UnboundedInterior {
                    start: range.start().clone(),
                });
            };
            if &end.succ() != next.start() {
                return Err(TreeInvariantError::NotContiguous {
                    end: end.clone(),
                    next_start: next.start().clone(),
                });
            }
            if range.occupied() == next.occupied() {
                return Err(TreeInvariantError::Unmerged {
                    left: range.start().clone(),
                    right: next.start().clone(),
                });
            }
        }
        Ok(())
    }

    #[inline]
    fn node(&self, id: NodeId) -> &Node<T> {
        match &self.slots[id.0] {
            Slot::Used(node) => node,
            Slot::Free(_) => unreachable!("RangeTree: node {} is not allocated", id.0),
        }
    }

    #[inline]
    fn node_mut(&mut self, id: NodeId) -> &mut Node<T> {
        match &mut self.slots[id.0] {
            Slot::Used(node) => node,
            Slot::Free(_) => unreachable!("RangeTree: node {} is not allocated", id.0),
        }
    }

    fn alloc(&mut self, range: Range<T>) -> NodeId {
        let node = Node {
            range,
            left: None,
            right: None,
            height: 1,
            size: 1,
        };
        match self.free {
            Some(id) => {
                self.free = match &self.slots[id.0] {
                    Slot::Free(next) => *next,
                    Slot::Used(_) => unreachable!("RangeTree: free list points at a used slot"),
                };
                self.slots[id.0] = Slot::Used(node);
                id
            }
            None => {
                self.slots.push(Slot::Used(node));
                NodeId(self.slots.len() - 1)
            }
        }
    }

    fn release(&mut self, id: NodeId) -> Range<T> {
        let slot = std::mem::replace(&mut self.slots[id.0], Slot::Free(self.free));
        self.free = Some(id);
        match slot {
            Slot::Used(node) => node.range,
            Slot::Free(_) => unreachable!("RangeTree: node {} released twice", id.0),
        }
    }

    #[inline]
    fn height(&self, id: Option<NodeId>) -> u32 {
        id.map_or(0, |id| self.node(id).height)
    }

    #[inline]
    fn size(&self, id: Option<NodeId>) -> usize {
        id.map_or(0, |id| self.node(id).size)
    }

    #[inline]
    fn update(&mut self, id: NodeId) {
        let (left, right) = (self.node(id).left, self.node(id).right);
        let height = 1 + self.height(left).max(self.height(right));
        let size = 1 + self.size(left) + self.size(right);
        let node = self.node_mut(id);
        node.height = height;
        node.size = size;
    }

    #[inline]
    fn balance_factor(&self, id: NodeId) -> i64 {
        let node = self.node(id);
        i64::from(self.height(node.left)) - i64::from(self.height(node.right))
    }

    fn rotate_right(&mut self, id: NodeId) -> NodeId {
        let pivot = self
            .node(id)
            .left
            .expect("rotate_right requires a left child");
        let inner = self.node(pivot).right;
        self.node_mut(id).left = inner;
        self.node_mut(pivot).right = Some(id);
        self.update(id);
        self.update(pivot);
        pivot
    }

    fn rotate_left(&mut self, id: NodeId) -> NodeId {
        let pivot = self
            .node(id)
            .right
            .expect("rotate_left requires a right child");
        let inner = self.node(pivot).left;
        self.node_mut(id).right = inner;
        self.node_mut(pivot).left = Some(id);
        self.update(id);
        self.update(pivot);
        pivot
    }

    /// Restores the AVL property at `id` and returns the new subtree root.
    fn rebalance(&mut self, id: NodeId) -> NodeId {
        self.update(id);
        let balance = self.balance_factor(id);
        if balance > 1 {
            let left = self.node(id).left.expect("left-heavy node has a left child");
            if self.balance_factor(left) < 0 {
                let rotated = self.rotate_left(left);
                self.node_mut(id).left = Some(rotated);
            }
            return self.rotate_right(id);
        }
        if balance < -1 {
            let right = self
                .node(id)
                .right
                .expect("right-heavy node has a right child");
            if self.balance_factor(right) > 0 {
                let rotated = self.rotate_right(right);
                self.node_mut(id).right = Some(rotated);
            }
            return self.rotate_left(id);
        }
        id
    }

    fn insert_node(&mut self, range: Range<T>) {
        let new = self.alloc(range);
        let root = self.insert_at(self.root, new);
        self.root = Some(root);
    }

    fn insert_at(&mut self, root: Option<NodeId>, new: NodeId) -> NodeId {
        let Some(id) = root else {
            return new;
        };
        let position = self
            .node(new)
            .range
            .span()
            .position(self.node(id).range.span());
        match position {
            Ordering::Less => {
                let left = self.insert_at(self.node(id).left, new);
                self.node_mut(id).left = Some(left);
            }
            Ordering::Greater => {
                let right = self.insert_at(self.node(id).right, new);
                self.node_mut(id).right = Some(right);
            }
            Ordering::Equal => panic!(
                "RangeTree::insert: range {} overlaps existing range {}",
                self.node(new).range.span(),
                self.node(id).range.span()
            ),
        }
        self.rebalance(id)
    }

    fn remove_node(&mut self, start: &TimePoint<T>) -> Option<Range<T>> {
        let (root, removed) = self.remove_at(self.root, start);
        self.root = root;
        removed.map(|id| self.release(id))
    }

    /// Unlinks the node starting at `start` from the subtree.
    ///
    /// Returns the new subtree root and the unlinked node, which stays
    /// allocated until released.
    fn remove_at(
        &mut self,
        root: Option<NodeId>,
        start: &TimePoint<T>,
    ) -> (Option<NodeId>, Option<NodeId>) {
        let Some(id) = root else {
            return (None, None);
        };
        match start.cmp(self.node(id).range.start()) {
            Ordering::Less => {
                let (left, removed) = self.remove_at(self.node(id).left, start);
                if removed.is_none() {
                    return (Some(id), None);
                }
                self.node_mut(id).left = left;
                (Some(self.rebalance(id)), removed)
            }
            Ordering::Greater => {
                let (right, removed) = self.remove_at(self.node(id).right, start);
                if removed.is_none() {
                    return (Some(id), None);
                }
                self.node_mut(id).right = right;
                (Some(self.rebalance(id)), removed)
            }
            Ordering::Equal => {
                let node = self.node(id);
                let replacement = match (node.left, node.right) {
                    (None, None) => None,
                    (Some(child), None) | (None, Some(child)) => Some(child),
                    (Some(left), Some(right)) => {
                        let (rest, min) = self.remove_min(right);
                        let successor = self.node_mut(min);
                        successor.left = Some(left);
                        successor.right = rest;
                        Some(self.rebalance(min))
                    }
                };
                (replacement, Some(id))
            }
        }
    }

    fn remove_min(&mut self, id: NodeId) -> (Option<NodeId>, NodeId) {
        match self.node(id).left {
            None => (self.node(id).right, id),
            Some(left) => {
                let (rest, min) = self.remove_min(left);
                self.node_mut(id).left = rest;
                (Some(self.rebalance(id)), min)
            }
        }
    }

    fn find_node(&self, point: &TimePoint<T>) -> Option<NodeId> {
        let mut cur = self.root;
        while let Some(id) = cur {
            let node = self.node(id);
            if point < node.range.start() {
                cur = node.left;
            } else if node.range.contains(point) {
                return Some(id);
            } else {
                cur = node.right;
            }
        }
        None
    }

    /// The first range that does not end before `point`.
    fn seek_node(&self, point: &TimePoint<T>) -> Option<NodeId> {
        let mut cur = self.root;
        let mut best = None;
        while let Some(id) = cur {
            let node = self.node(id);
            if node.range.end().is_some_and(|end| end < point) {
                cur = node.right;
            } else {
                best = Some(id);
                cur = node.left;
            }
        }
        best
    }

    /// In-order traversal stack positioned at [`RangeTree::seek_node`].
    fn seek_stack(&self, point: &TimePoint<T>) -> Vec<NodeId> {
        let mut stack = Vec::new();
        let mut cur = self.root;
        while let Some(id) = cur {
            let node = self.node(id);
            if node.range.end().is_some_and(|end| end < point) {
                cur = node.right;
            } else {
                stack.push(id);
                cur = node.left;
            }
        }
        stack
    }

    fn push_left_spine(&self, mut cur: Option<NodeId>, stack: &mut Vec<NodeId>) {
        while let Some(id) = cur {
            stack.push(id);
            cur = self.node(id).left;
        }
    }

    fn predecessor_node(&self, start: &TimePoint<T>) -> Option<NodeId> {
        let mut cur = self.root;
        let mut best = None;
        while let Some(id) = cur {
            let node = self.node(id);
            if node.range.start() < start {
                best = Some(id);
                cur = node.right;
            } else {
                cur = node.left;
            }
        }
        best
    }

    fn successor_node(&self, start: &TimePoint<T>) -> Option<NodeId> {
        let mut cur = self.root;
        let mut best = None;
        while let Some(id) = cur {
            let node = self.node(id);
            if node.range.start() > start {
                best = Some(id);
                cur = node.left;
            } else {
                cur = node.right;
            }
        }
        best
    }

    fn entry<'a>(&'a self, range: &'a Range<T>) -> RangeEntry<'a, T> {
        RangeEntry::new(
            range,
            self.predecessor(range.start()),
            self.successor(range.start()),
        )
    }

    /// Adds `machine` to the part of `span` inside `window`, splitting off
    /// whatever lies outside. `span` must be the span of a range in the tree.
    fn mark_span(&mut self, span: TimeSpan<T>, window: &TimeSpan<T>, machine: MachineId) {
        let Some(overlap) = span.intersection(window) else {
            return;
        };
        let id = self
            .find_node(span.start())
            .expect("marked span belongs to a range in the tree");
        if overlap == span {
            self.node_mut(id).range.occupied_mut().insert(machine);
            return;
        }

        let (start, end) = span.into_parts();
        let (overlap_start, overlap_end) = overlap.into_parts();
        let overlap_end = overlap_end.expect("intersection with a bounded window is bounded");
        let tail = match end {
            None => Some(Span::unbounded(overlap_end.succ())),
            Some(end) if overlap_end < end => Some(Span::bounded(overlap_end.succ(), end)),
            Some(_) => None,
        };

        let node = self.node_mut(id);
        let occupied = node.range.occupied().clone();
        if start < overlap_start {
            node.range.set_end(Some(overlap_start.pred()));
            let mut marked = occupied.clone();
            marked.insert(machine);
            self.insert_node(Range::new(
                Span::bounded(overlap_start, overlap_end),
                marked,
            ));
        } else {
            node.range.set_end(Some(overlap_end));
            node.range.occupied_mut().insert(machine);
        }
        if let Some(tail) = tail {
            self.insert_node(Range::new(tail, occupied));
        }
    }

    /// Merges adjacent ranges with equal occupancy whose boundary lies in
    /// `(from, to]`. Returns the number of merges.
    fn coalesce(&mut self, from: &TimePoint<T>, to: &TimePoint<T>) -> usize {
        let Some(mut cur) = self.seek_node(from) else {
            return 0;
        };
        let mut merged = 0;
        loop {
            let current = &self.node(cur).range;
            let Some(next) = self.successor_node(current.start()) else {
                break;
            };
            let next_range = &self.node(next).range;
            if next_range.start() > to {
                break;
            }
            let adjacent = current
                .end()
                .is_some_and(|end| &end.succ() == next_range.start());
            if adjacent && current.occupied() == next_range.occupied() {
                let next_start = next_range.start().clone();
                let absorbed = self
                    .remove_node(&next_start)
                    .expect("successor is in the tree");
                let (span, _) = absorbed.into_parts();
                let (_, end) = span.into_parts();
                self.node_mut(cur).range.set_end(end);
                merged += 1;
            } else {
                cur = next;
            }
        }
        merged
    }

    fn check_node(&self, id: NodeId) -> Result<(u32, usize), TreeInvariantError<T>> {
        let node = self.node(id);
        let (lh, ls) = match node.left {
            Some(left) => self.check_node(left)?,
            None => (0, 0),
        };
        let (rh, rs) = match node.right {
            Some(right) => self.check_node(right)?,
            None => (0, 0),
        };
        let start = || node.range.start().clone();
        if lh.abs_diff(rh) > 1 {
            return Err(TreeInvariantError::Unbalanced { start: start() });
        }
        let (height, size) = (1 + lh.max(rh), 1 + ls + rs);
        if node.height != height || node.size != size {
            return Err(TreeInvariantError::Misaugmented { start: start() });
        }
        Ok((height, size))
    }
}

impl<T: SolverVariable> PartialEq for RangeTree<T> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<T: SolverVariable> Eq for RangeTree<T> {}

impl<T: SolverVariable> Display for RangeTree<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (n, range) in self.iter().enumerate() {
            if n > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", range)?;
        }
        Ok(())
    }
}

impl<'a, T: SolverVariable> IntoIterator for &'a RangeTree<T> {
    type Item = &'a Range<T>;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// In-order iterator over the ranges of a [`RangeTree`].
#[derive(Debug, Clone)]
pub struct Iter<'a, T: SolverVariable> {
    tree: &'a RangeTree<T>,
    stack: Vec<NodeId>,
}

impl<'a, T: SolverVariable> Iterator for Iter<'a, T> {
    type Item = &'a Range<T>;

    fn next(&mut self) -> Option<Self::Item> {
        let tree = self.tree;
        let id = self.stack.pop()?;
        let node = tree.node(id);
        tree.push_left_spine(node.right, &mut self.stack);
        Some(&node.range)
    }
}

/// Iterator returned by [`RangeTree::iter_overlapping`].
#[derive(Debug, Clone)]
pub struct Overlapping<'a, T: SolverVariable> {
    iter: Iter<'a, T>,
    hi: Option<TimePoint<T>>,
    prev: Option<&'a Range<T>>,
    pending: Option<&'a Range<T>>,
}

impl<'a, T: SolverVariable> Iterator for Overlapping<'a, T> {
    type Item = RangeEntry<'a, T>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.pending.take()?;
        if self.hi.as_ref().is_some_and(|hi| current.start() > hi) {
            return None;
        }
        self.pending = self.iter.next();
        let entry = RangeEntry::new(current, self.prev, self.pending);
        self.prev = Some(current);
        Some(entry)
    }
}

/// Position in an overlap query that does not borrow the tree.
///
/// The cursor remembers the tree generation it was created at and fails with
/// [`StaleCursorError`] once the tree has been mutated. Call
/// [`OverlapCursor::restart`] to run the query again on the new tree.
#[derive(Debug, Clone)]
pub struct OverlapCursor<T: SolverVariable> {
    lo: TimePoint<T>,
    hi: Option<TimePoint<T>>,
    next_point: Option<TimePoint<T>>,
    generation: u64,
}

impl<T: SolverVariable> OverlapCursor<T> {
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn next<'a>(
        &mut self,
        tree: &'a RangeTree<T>,
    ) -> Result<Option<RangeEntry<'a, T>>, StaleCursorError> {
        if tree.generation != self.generation {
            return Err(StaleCursorError::new(self.generation, tree.generation));
        }
        let Some(point) = self.next_point.take() else {
            return Ok(None);
        };
        let Some(id) = tree.seek_node(&point) else {
            return Ok(None);
        };
        let range = &tree.node(id).range;
        if self.hi.as_ref().is_some_and(|hi| range.start() > hi) {
            return Ok(None);
        }
        self.next_point = range.end().map(TimePoint::succ);
        Ok(Some(tree.entry(range)))
    }

    /// Rewinds the cursor to the start of its window on the current tree.
    pub fn restart(&mut self, tree: &RangeTree<T>) {
        self.generation = tree.generation;
        self.next_point = Some(self.lo.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::occupancy::OccupancySet;
    use num_bigint::BigInt;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn tp(v: i64) -> TimePoint<i64> {
        TimePoint::new(v)
    }

    fn m(id: usize) -> MachineId {
        MachineId::new(id)
    }

    fn set(ids: &[usize]) -> OccupancySet {
        ids.iter().copied().map(MachineId::new).collect()
    }

    fn bounded(a: i64, b: i64, ids: &[usize]) -> Range<i64> {
        Range::new(Span::bounded(tp(a), tp(b)), set(ids))
    }

    fn unbounded(a: i64, ids: &[usize]) -> Range<i64> {
        Range::new(Span::unbounded(tp(a)), set(ids))
    }

    #[test]
    fn test_new_tree_covers_the_whole_axis() {
        let tree: RangeTree<i64> = RangeTree::new();
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.ranges(), vec![unbounded(0, &[])]);
        assert_eq!(tree.find(&tp(1_000_000)).unwrap().start(), &tp(0));
        assert!(tree.check_invariants().is_ok());
    }

    #[test]
    fn test_insert_find_delete() {
        let mut tree = RangeTree::from_ranges([
            bounded(10, 19, &[1]),
            bounded(0, 4, &[0]),
            unbounded(30, &[]),
        ]);
        assert_eq!(tree.len(), 3);
        assert_eq!(tree.find(&tp(12)).unwrap(), &bounded(10, 19, &[1]));
        assert_eq!(tree.find(&tp(7)).unwrap_err().point(), &tp(7));
        assert_eq!(tree.find_or_previous(&tp(7)).unwrap(), &bounded(0, 4, &[0]));
        assert_eq!(tree.find_or_previous(&tp(25)).unwrap().start(), &tp(10));
        assert_eq!(tree.find_or_previous(&tp(99)).unwrap().start(), &tp(30));
        assert!(tree.find_or_previous(&tp(-1)).is_err());

        assert_eq!(tree.delete(&tp(10)), Some(bounded(10, 19, &[1])));
        assert_eq!(tree.delete(&tp(10)), None);
        assert_eq!(tree.len(), 2);
        tree.insert(bounded(5, 29, &[]));
        assert_eq!(tree.find(&tp(29)).unwrap().start(), &tp(5));
    }

    #[test]
    #[should_panic(expected = "overlaps existing range")]
    fn test_insert_overlapping_range_panics() {
        let mut tree = RangeTree::from_ranges([bounded(0, 9, &[])]);
        tree.insert(bounded(9, 12, &[]));
    }

    #[test]
    fn test_arena_reuses_released_slots() {
        let mut tree = RangeTree::empty();
        for i in 0..8 {
            tree.insert(bounded(i * 10, i * 10 + 9, &[]));
        }
        for i in 0..8 {
            assert!(tree.delete(&tp(i * 10)).is_some());
        }
        assert!(tree.is_empty());
        for i in 0..8 {
            tree.insert(bounded(i * 10, i * 10 + 9, &[]));
        }
        assert_eq!(tree.slots.len(), 8);
    }

    #[test]
    fn test_stays_balanced_under_sequential_inserts() {
        let mut tree = RangeTree::empty();
        for i in 0..1_000 {
            tree.insert(bounded(i, i, &[(i % 2) as usize]));
        }
        tree.insert(unbounded(1_000, &[]));
        assert!(tree.check_invariants().is_ok());
        // An AVL tree with n nodes is at most 1.44 log2(n + 2) high.
        assert!(tree.height(tree.root) <= 15);
        for i in (0..1_000).step_by(3) {
            tree.delete(&tp(i));
        }
        assert!(tree.root.is_some_and(|root| tree.check_node(root).is_ok()));
    }

    #[test]
    fn test_nth_and_rank() {
        let tree = RangeTree::from_ranges((0..50).map(|i| bounded(i * 2, i * 2 + 1, &[])));
        assert_eq!(tree.nth(0).unwrap().start(), &tp(0));
        assert_eq!(tree.nth(17).unwrap().start(), &tp(34));
        assert!(tree.nth(50).is_none());
        assert_eq!(tree.rank(&tp(0)), 0);
        assert_eq!(tree.rank(&tp(35)), 18);
        assert_eq!(tree.rank(&tp(1_000)), 50);
        assert_eq!(tree.first().unwrap().start(), &tp(0));
        assert_eq!(tree.last().unwrap().start(), &tp(98));
    }

    #[test]
    fn test_iter_overlapping_reports_neighbours() {
        let tree = RangeTree::from_ranges([
            bounded(0, 3, &[0]),
            bounded(4, 4, &[]),
            bounded(5, 9, &[0, 1]),
            unbounded(10, &[]),
        ]);
        let entries: Vec<_> = tree.iter_overlapping(&tp(4), Some(&tp(6))).collect();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].range().start(), &tp(4));
        assert_eq!(entries[0].left_occupied(), Some(&set(&[0])));
        assert_eq!(entries[0].right_occupied(), Some(&set(&[0, 1])));
        assert_eq!(entries[1].range().start(), &tp(5));
        assert_eq!(entries[1].right().unwrap().start(), &tp(10));

        let head: Vec<_> = tree.iter_overlapping(&tp(0), Some(&tp(0))).collect();
        assert_eq!(head.len(), 1);
        assert!(head[0].left().is_none());

        let tail: Vec<_> = tree.iter_overlapping(&tp(7), None).collect();
        assert_eq!(tail.len(), 2);
        assert!(tail[1].right().is_none());
    }

    #[test]
    fn test_mark_occupied_splits_the_free_axis() {
        let mut tree = RangeTree::new();
        tree.mark_occupied(&tp(0), &tp(1), m(0));
        assert_eq!(tree.ranges(), vec![bounded(0, 1, &[0]), unbounded(2, &[])]);
        assert!(tree.check_invariants().is_ok());

        tree.mark_occupied(&tp(5), &tp(7), m(0));
        assert_eq!(
            tree.ranges(),
            vec![bounded(0, 1, &[0]), bounded(2, 4, &[]), bounded(5, 7, &[0]), unbounded(8, &[])]
        );
    }

    #[test]
    fn test_mark_occupied_merges_with_neighbours() {
        let mut tree = RangeTree::new();
        tree.mark_occupied(&tp(0), &tp(1), m(0));
        tree.mark_occupied(&tp(5), &tp(7), m(0));
        tree.mark_occupied(&tp(2), &tp(4), m(0));
        assert_eq!(tree.ranges(), vec![bounded(0, 7, &[0]), unbounded(8, &[])]);
        assert!(tree.check_invariants().is_ok());
    }

    #[test]
    fn test_mark_occupied_inside_a_larger_range() {
        let mut tree = RangeTree::new();
        tree.mark_occupied(&tp(0), &tp(9), m(0));
        tree.mark_occupied(&tp(3), &tp(5), m(1));
        assert_eq!(
            tree.ranges(),
            vec![
                bounded(0, 2, &[0]),
                bounded(3, 5, &[0, 1]),
                bounded(6, 9, &[0]),
                unbounded(10, &[]),
            ]
        );
        tree.mark_occupied(&tp(3), &tp(5), m(1));
        assert_eq!(tree.len(), 4);
        tree.mark_occupied(&tp(0), &tp(2), m(1));
        tree.mark_occupied(&tp(6), &tp(9), m(1));
        assert_eq!(tree.ranges(), vec![bounded(0, 9, &[0, 1]), unbounded(10, &[])]);
    }

    #[test]
    fn test_cursor_matches_iterator_and_detects_mutation() {
        let mut tree = RangeTree::new();
        tree.mark_occupied(&tp(2), &tp(3), m(0));
        tree.mark_occupied(&tp(6), &tp(6), m(1));

        let mut cursor = tree.cursor_overlapping(&tp(1), Some(&tp(6)));
        let mut seen = Vec::new();
        while let Some(entry) = cursor.next(&tree).unwrap() {
            seen.push(entry.range().clone());
        }
        let expected: Vec<_> = tree
            .iter_overlapping(&tp(1), Some(&tp(6)))
            .map(|e| e.range().clone())
            .collect();
        assert_eq!(seen, expected);

        let mut cursor = tree.cursor_overlapping(&tp(0), None);
        assert!(cursor.next(&tree).unwrap().is_some());
        tree.mark_occupied(&tp(10), &tp(12), m(0));
        let err = cursor.next(&tree).unwrap_err();
        assert_eq!(err.tree_generation(), tree.generation());

        cursor.restart(&tree);
        assert_eq!(cursor.next(&tree).unwrap().unwrap().range().start(), &tp(0));
    }

    #[test]
    fn test_equality_compares_ranges_not_shape() {
        let a = RangeTree::from_ranges((0..20).map(|i| bounded(i, i, &[])));
        let b = RangeTree::from_ranges((0..20).rev().map(|i| bounded(i, i, &[])));
        assert_eq!(a, b);
        let c = RangeTree::from_ranges((0..19).map(|i| bounded(i, i, &[])));
        assert_ne!(a, c);
    }

    #[test]
    fn test_check_invariants_rejects_broken_partitions() {
        let gap = RangeTree::from_ranges([bounded(0, 3, &[0]), unbounded(5, &[])]);
        assert!(matches!(
            gap.check_invariants(),
            Err(TreeInvariantError::NotContiguous { .. })
        ));
        let unmerged = RangeTree::from_ranges([bounded(0, 3, &[0]), unbounded(4, &[0])]);
        assert!(matches!(
            unmerged.check_invariants(),
            Err(TreeInvariantError::Unmerged { .. })
        ));
        let bounded_tail = RangeTree::from_ranges([bounded(0, 3, &[0])]);
        assert!(matches!(
            bounded_tail.check_invariants(),
            Err(TreeInvariantError::BoundedTail { .. })
        ));
        let late = RangeTree::from_ranges([unbounded(1, &[])]);
        assert!(matches!(
            late.check_invariants(),
            Err(TreeInvariantError::DoesNotStartAtZero { .. })
        ));
        assert_eq!(
            RangeTree::<i64>::empty().check_invariants(),
            Err(TreeInvariantError::Empty)
        );
    }

    #[test]
    fn test_mark_occupied_matches_pointwise_model() {
        const HORIZON: i64 = 120;
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut tree = RangeTree::new();
        let mut model = vec![OccupancySet::new(); HORIZON as usize + 1];

        for _ in 0..400 {
            let lo = rng.random_range(0..HORIZON);
            let hi = rng.random_range(lo..HORIZON);
            let machine = m(rng.random_range(0..5));
            tree.mark_occupied(&tp(lo), &tp(hi), machine);
            for point in &mut model[lo as usize..=hi as usize] {
                point.insert(machine);
            }
            assert!(tree.check_invariants().is_ok());
        }

        for (t, expected) in model.iter().enumerate() {
            assert_eq!(tree.find(&tp(t as i64)).unwrap().occupied(), expected);
        }
        // Past the horizon the axis is still free.
        assert!(tree.find(&tp(HORIZON + 1)).unwrap().occupied().is_empty());
    }

    #[test]
    fn test_big_int_coordinates() {
        let big = |v: i64| TimePoint::new(BigInt::from(v) * BigInt::from(10).pow(30));
        let mut tree: RangeTree<BigInt> = RangeTree::new();
        tree.mark_occupied(&big(1), &big(2), m(3));
        assert_eq!(tree.len(), 3);
        assert!(tree.find(&big(1)).unwrap().occupied().contains(m(3)));
        assert!(!tree.find(&big(3)).unwrap().occupied().contains(m(3)));
        assert!(tree.check_invariants().is_ok());
    }
}
