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

//! The element type of a [`RangeTree`](crate::tree::RangeTree).
//!
//! A [`Range`] covers consecutive start points with identical blocked machines.
//! [`RangeEntry`] is what enumerations hand out: the range plus the occupancy
//! of its immediate neighbours.

use crate::occupancy::OccupancySet;
use dose_alloc_core::{
    SolverVariable,
    primitives::Span,
    time::{TimePoint, TimeSpan},
};
use std::fmt::Display;

/// A maximal run of start times that share the same set of blocked machines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Range<T: SolverVariable> {
    span: TimeSpan<T>,
    occupied: OccupancySet,
}

impl<T: SolverVariable> Range<T> {
    #[inline]
    pub fn new(span: TimeSpan<T>, occupied: OccupancySet) -> Self {
        Self { span, occupied }
    }

    /// A range on which no machine is blocked.
    #[inline]
    pub fn free(span: TimeSpan<T>) -> Self {
        Self::new(span, OccupancySet::new())
    }

    #[inline]
    pub fn span(&self) -> &TimeSpan<T> {
        &self.span
    }

    #[inline]
    pub fn start(&self) -> &TimePoint<T> {
        self.span.start()
    }

    #[inline]
    pub fn end(&self) -> Option<&TimePoint<T>> {
        self.span.end()
    }

    #[inline]
    pub fn is_bounded(&self) -> bool {
        self.span.is_bounded()
    }

    #[inline]
    pub fn contains(&self, point: &TimePoint<T>) -> bool {
        self.span.contains(point)
    }

    #[inline]
    pub fn occupied(&self) -> &OccupancySet {
        &self.occupied
    }

    #[inline]
    pub(crate) fn occupied_mut(&mut self) -> &mut OccupancySet {
        &mut self.occupied
    }

    /// Moves the end of the range. The start is the ordering key and never changes.
    #[inline]
    pub(crate) fn set_end(&mut self, end: Option<TimePoint<T>>) {
        self.span = Span::new(self.span.start().clone(), end);
    }

    #[inline]
    pub fn into_parts(self) -> (TimeSpan<T>, OccupancySet) {
        (self.span, self.occupied)
    }
}

impl<T: SolverVariable> Display for Range<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.span, self.occupied)
    }
}

/// A range seen together with its immediate neighbours in the tree.
///
/// The neighbours are what the placement scoring looks at: a machine busy on
/// both sides of a one-point range is a perfect fit, a machine busy on one
/// side gives a flush placement.
#[derive(Debug)]
pub struct RangeEntry<'a, T: SolverVariable> {
    range: &'a Range<T>,
    left: Option<&'a Range<T>>,
    right: Option<&'a Range<T>>,
}

impl<T: SolverVariable> Clone for RangeEntry<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: SolverVariable> Copy for RangeEntry<'_, T> {}

impl<'a, T: SolverVariable> RangeEntry<'a, T> {
    #[inline]
    pub(crate) fn new(
        range: &'a Range<T>,
        left: Option<&'a Range<T>>,
        right: Option<&'a Range<T>>,
    ) -> Self {
        Self { range, left, right }
    }

    #[inline]
    pub fn range(&self) -> &'a Range<T> {
        self.range
    }

    #[inline]
    pub fn left(&self) -> Option<&'a Range<T>> {
        self.left
    }

    #[inline]
    pub fn right(&self) -> Option<&'a Range<T>> {
        self.right
    }

    #[inline]
    pub fn left_occupied(&self) -> Option<&'a OccupancySet> {
        self.left.map(Range::occupied)
    }

    #[inline]
    pub fn right_occupied(&self) -> Option<&'a OccupancySet> {
        self.right.map(Range::occupied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dose_alloc_model::id::MachineId;

    fn tp(v: i64) -> TimePoint<i64> {
        TimePoint::new(v)
    }

    #[test]
    fn test_set_end_keeps_start() {
        let mut r = Range::free(Span::bounded(tp(2), tp(5)));
        r.set_end(None);
        assert_eq!(r.start(), &tp(2));
        assert!(!r.is_bounded());
        assert!(r.contains(&tp(1_000)));
        r.set_end(Some(tp(2)));
        assert!(r.span().is_point());
    }

    #[test]
    fn test_display() {
        let mut r = Range::free(Span::unbounded(tp(3)));
        r.occupied_mut().insert(MachineId::new(1));
        assert_eq!(r.to_string(), "[3, inf) {1}");
    }
}
