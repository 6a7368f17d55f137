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

//! # Core Primitives
//!
//! Interval building blocks used throughout the workspace. Unlike a half-open
//! range, a [`Span`] is closed on both sides and its end may be missing, which
//! is how the unbounded tail of the time axis is represented.

use std::cmp::Ordering;
use std::fmt;

/// An inclusive interval `[start, end]`, or `[start, ∞)` when `end` is absent.
///
/// # Examples
///
/// ```
/// use dose_alloc_core::primitives::Span;
///
/// let span = Span::bounded(2, 5);
/// assert!(span.contains(&2));
/// assert!(span.contains(&5));
/// assert!(!span.contains(&6));
///
/// let tail = Span::unbounded(7);
/// assert!(tail.contains(&1_000_000));
/// assert!(!tail.is_bounded());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Span<T> {
    start: T,
    end: Option<T>,
}

impl<T: Ord> Span<T> {
    /// Creates the bounded span `[start, end]`.
    ///
    /// # Panics
    ///
    /// Panics if `start > end`. An inverted span signals a logic error in the
    /// caller and is never silently repaired.
    #[inline]
    pub fn bounded(start: T, end: T) -> Self {
        assert!(start <= end, "Span::bounded: start must not exceed end");
        Self {
            start,
            end: Some(end),
        }
    }

    /// Creates the unbounded span `[start, ∞)`.
    #[inline]
    pub fn unbounded(start: T) -> Self {
        Self { start, end: None }
    }

    /// Creates a span from an optional end.
    ///
    /// # Panics
    ///
    /// Panics if the end is present and lies before `start`.
    #[inline]
    pub fn new(start: T, end: Option<T>) -> Self {
        match end {
            Some(end) => Self::bounded(start, end),
            None => Self::unbounded(start),
        }
    }

    #[inline]
    pub fn start(&self) -> &T {
        &self.start
    }

    #[inline]
    pub fn end(&self) -> Option<&T> {
        self.end.as_ref()
    }

    #[inline]
    pub fn is_bounded(&self) -> bool {
        self.end.is_some()
    }

    #[inline]
    pub fn into_parts(self) -> (T, Option<T>) {
        (self.start, self.end)
    }

    /// Returns `true` if `x` lies within the span, both ends inclusive.
    #[inline]
    pub fn contains(&self, x: &T) -> bool {
        *x >= self.start && self.end.as_ref().is_none_or(|e| x <= e)
    }

    /// Returns `true` if `other` lies entirely within `self`.
    #[inline]
    pub fn contains_span(&self, other: &Self) -> bool {
        if other.start < self.start {
            return false;
        }
        match (&self.end, &other.end) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(a), Some(b)) => b <= a,
        }
    }

    /// Returns `true` if every point of `self` comes before every point of `other`.
    #[inline]
    pub fn precedes(&self, other: &Self) -> bool {
        self.end.as_ref().is_some_and(|e| *e < other.start)
    }

    /// Returns `true` if the two spans share at least one point.
    ///
    /// ```
    /// use dose_alloc_core::primitives::Span;
    ///
    /// assert!(Span::bounded(1, 4).overlaps(&Span::bounded(4, 9)));
    /// assert!(!Span::bounded(1, 3).overlaps(&Span::bounded(4, 9)));
    /// assert!(Span::unbounded(3).overlaps(&Span::bounded(0, 3)));
    /// ```
    #[inline]
    pub fn overlaps(&self, other: &Self) -> bool {
        !self.precedes(other) && !other.precedes(self)
    }

    /// Three-way position of `self` relative to `other`.
    ///
    /// Spans that share a point compare [`Ordering::Equal`]; otherwise the one
    /// that lies entirely before the other is [`Ordering::Less`].
    #[inline]
    pub fn position(&self, other: &Self) -> Ordering {
        if self.precedes(other) {
            Ordering::Less
        } else if other.precedes(self) {
            Ordering::Greater
        } else {
            Ordering::Equal
        }
    }
}

impl<T: Ord + Clone> Span<T> {
    /// Returns the common part of two spans, if any.
    ///
    /// ```
    /// use dose_alloc_core::primitives::Span;
    ///
    /// let a = Span::bounded(2, 8);
    /// let b = Span::unbounded(5);
    /// assert_eq!(a.intersection(&b), Some(Span::bounded(5, 8)));
    /// assert_eq!(a.intersection(&Span::bounded(9, 10)), None);
    /// ```
    #[inline]
    pub fn intersection(&self, other: &Self) -> Option<Self> {
        if !self.overlaps(other) {
            return None;
        }
        let start = std::cmp::max(&self.start, &other.start).clone();
        let end = match (&self.end, &other.end) {
            (None, None) => None,
            (Some(e), None) | (None, Some(e)) => Some(e.clone()),
            (Some(a), Some(b)) => Some(std::cmp::min(a, b).clone()),
        };
        Some(Self { start, end })
    }
}

impl<T: fmt::Display> fmt::Display for Span<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.end {
            Some(end) => write!(f, "[{}, {}]", self.start, end),
            None => write!(f, "[{}, inf)", self.start),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounded_accessors() {
        let span = Span::bounded(3, 9);
        assert_eq!(*span.start(), 3);
        assert_eq!(span.end(), Some(&9));
        assert!(span.is_bounded());
        assert_eq!(span.into_parts(), (3, Some(9)));
    }

    #[test]
    fn test_single_point_span() {
        let span = Span::bounded(4, 4);
        assert!(span.contains(&4));
        assert!(!span.contains(&3));
        assert!(!span.contains(&5));
    }

    #[test]
    #[should_panic(expected = "start must not exceed end")]
    fn test_inverted_span_panics() {
        let _ = Span::bounded(5, 4);
    }

    #[test]
    fn test_contains_span() {
        let outer = Span::bounded(0, 10);
        assert!(outer.contains_span(&Span::bounded(0, 10)));
        assert!(outer.contains_span(&Span::bounded(3, 4)));
        assert!(!outer.contains_span(&Span::bounded(3, 11)));
        assert!(!outer.contains_span(&Span::unbounded(3)));
        assert!(Span::unbounded(0).contains_span(&Span::unbounded(3)));
        assert!(!Span::unbounded(4).contains_span(&Span::unbounded(3)));
    }

    #[test]
    fn test_position_is_three_way() {
        let mid = Span::bounded(5, 7);
        assert_eq!(Span::bounded(0, 4).position(&mid), Ordering::Less);
        assert_eq!(Span::bounded(8, 9).position(&mid), Ordering::Greater);
        assert_eq!(Span::bounded(7, 9).position(&mid), Ordering::Equal);
        assert_eq!(Span::bounded(0, 5).position(&mid), Ordering::Equal);
        assert_eq!(Span::unbounded(6).position(&mid), Ordering::Equal);
        assert_eq!(Span::bounded(0, 1).position(&Span::unbounded(2)), Ordering::Less);
    }

    #[test]
    fn test_intersection_with_unbounded() {
        let a = Span::unbounded(3);
        let b = Span::unbounded(10);
        assert_eq!(a.intersection(&b), Some(Span::unbounded(10)));
        assert_eq!(
            Span::bounded(0, 3).intersection(&a),
            Some(Span::bounded(3, 3))
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(Span::bounded(1, 2).to_string(), "[1, 2]");
        assert_eq!(Span::unbounded(5).to_string(), "[5, inf)");
    }
}
