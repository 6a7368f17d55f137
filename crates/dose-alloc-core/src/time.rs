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

//! # Time Types
//!
//! - `TimePoint<T>`: a coordinate on the time axis.
//! - `TimeDelta<T>`: a signed duration, the difference between two time points.
//! - `TimeSpan<T>`: an inclusive span of time points, possibly unbounded.
//!
//! Distinct newtypes keep durations and coordinates apart at compile time, so
//! adding two time points does not type-check. The scalar is any
//! [`SolverVariable`], which includes `num_bigint::BigInt`; arithmetic is
//! checked and panics when a fixed-width scalar would overflow.

use crate::{SolverVariable, primitives::Span};
use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, AddAssign, Neg, Sub, SubAssign},
};

#[repr(transparent)]
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimePoint<T: SolverVariable>(T);

#[repr(transparent)]
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimeDelta<T: SolverVariable>(T);

pub type TimeSpan<T> = Span<TimePoint<T>>;

impl<T: SolverVariable> TimePoint<T> {
    #[inline]
    pub const fn new(value: T) -> Self {
        TimePoint(value)
    }

    #[inline]
    pub fn zero() -> Self {
        TimePoint(T::zero())
    }

    #[inline]
    pub fn value(&self) -> &T {
        &self.0
    }

    #[inline]
    pub fn into_inner(self) -> T {
        self.0
    }

    #[inline]
    pub fn is_negative(&self) -> bool {
        self.0.is_negative()
    }

    /// The next point on the axis.
    #[inline]
    pub fn succ(&self) -> Self {
        self + &TimeDelta::one()
    }

    /// The previous point on the axis.
    #[inline]
    pub fn pred(&self) -> Self {
        self - &TimeDelta::one()
    }

    #[inline]
    pub fn checked_add(&self, delta: &TimeDelta<T>) -> Option<Self> {
        self.0.checked_add(&delta.0).map(TimePoint)
    }

    #[inline]
    pub fn checked_sub(&self, delta: &TimeDelta<T>) -> Option<Self> {
        self.0.checked_sub(&delta.0).map(TimePoint)
    }

    /// Clamps the point to the non-negative half of the axis.
    #[inline]
    pub fn clamp_non_negative(self) -> Self {
        if self.0.is_negative() {
            TimePoint::zero()
        } else {
            self
        }
    }

    /// The inclusive span covered by something starting here and lasting `len`.
    ///
    /// Returns `None` for a non-positive length, which covers no point.
    #[inline]
    pub fn span_of(&self, len: &TimeDelta<T>) -> Option<TimeSpan<T>> {
        if !len.is_positive() {
            return None;
        }
        let last = &(self + len) - &TimeDelta::one();
        Some(Span::bounded(self.clone(), last))
    }
}

impl<T: SolverVariable> TimeDelta<T> {
    #[inline]
    pub const fn new(value: T) -> Self {
        TimeDelta(value)
    }

    #[inline]
    pub fn zero() -> Self {
        TimeDelta(T::zero())
    }

    #[inline]
    pub fn one() -> Self {
        TimeDelta(T::one())
    }

    #[inline]
    pub fn value(&self) -> &T {
        &self.0
    }

    #[inline]
    pub fn into_inner(self) -> T {
        self.0
    }

    #[inline]
    pub fn is_negative(&self) -> bool {
        self.0.is_negative()
    }

    #[inline]
    pub fn is_positive(&self) -> bool {
        self.0.is_positive()
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    #[inline]
    pub fn checked_add(&self, rhs: &TimeDelta<T>) -> Option<Self> {
        self.0.checked_add(&rhs.0).map(TimeDelta)
    }

    #[inline]
    pub fn checked_sub(&self, rhs: &TimeDelta<T>) -> Option<Self> {
        self.0.checked_sub(&rhs.0).map(TimeDelta)
    }
}

impl<T: SolverVariable> Default for TimePoint<T> {
    #[inline]
    fn default() -> Self {
        TimePoint::zero()
    }
}

impl<T: SolverVariable> Default for TimeDelta<T> {
    #[inline]
    fn default() -> Self {
        TimeDelta::zero()
    }
}

impl<T: SolverVariable> From<T> for TimePoint<T> {
    #[inline]
    fn from(v: T) -> Self {
        TimePoint(v)
    }
}

impl<T: SolverVariable> From<T> for TimeDelta<T> {
    #[inline]
    fn from(v: T) -> Self {
        TimeDelta(v)
    }
}

impl<T: SolverVariable> Display for TimePoint<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<T: SolverVariable> Display for TimeDelta<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<T: SolverVariable> Add<&TimeDelta<T>> for &TimePoint<T> {
    type Output = TimePoint<T>;

    #[inline]
    fn add(self, rhs: &TimeDelta<T>) -> Self::Output {
        TimePoint(
            self.0
                .checked_add(&rhs.0)
                .expect("overflow in TimePoint + TimeDelta"),
        )
    }
}

impl<T: SolverVariable> Add<TimeDelta<T>> for TimePoint<T> {
    type Output = TimePoint<T>;

    #[inline]
    fn add(self, rhs: TimeDelta<T>) -> Self::Output {
        &self + &rhs
    }
}

impl<T: SolverVariable> AddAssign<&TimeDelta<T>> for TimePoint<T> {
    #[inline]
    fn add_assign(&mut self, rhs: &TimeDelta<T>) {
        *self = &*self + rhs;
    }
}

impl<T: SolverVariable> Sub<&TimeDelta<T>> for &TimePoint<T> {
    type Output = TimePoint<T>;

    #[inline]
    fn sub(self, rhs: &TimeDelta<T>) -> Self::Output {
        TimePoint(
            self.0
                .checked_sub(&rhs.0)
                .expect("underflow in TimePoint - TimeDelta"),
        )
    }
}

impl<T: SolverVariable> Sub<TimeDelta<T>> for TimePoint<T> {
    type Output = TimePoint<T>;

    #[inline]
    fn sub(self, rhs: TimeDelta<T>) -> Self::Output {
        &self - &rhs
    }
}

impl<T: SolverVariable> SubAssign<&TimeDelta<T>> for TimePoint<T> {
    #[inline]
    fn sub_assign(&mut self, rhs: &TimeDelta<T>) {
        *self = &*self - rhs;
    }
}

impl<T: SolverVariable> Sub<&TimePoint<T>> for &TimePoint<T> {
    type Output = TimeDelta<T>;

    #[inline]
    fn sub(self, rhs: &TimePoint<T>) -> Self::Output {
        TimeDelta(
            self.0
                .checked_sub(&rhs.0)
                .expect("underflow in TimePoint - TimePoint"),
        )
    }
}

impl<T: SolverVariable> Sub for TimePoint<T> {
    type Output = TimeDelta<T>;

    #[inline]
    fn sub(self, rhs: TimePoint<T>) -> Self::Output {
        &self - &rhs
    }
}

impl<T: SolverVariable> Add<&TimeDelta<T>> for &TimeDelta<T> {
    type Output = TimeDelta<T>;

    #[inline]
    fn add(self, rhs: &TimeDelta<T>) -> Self::Output {
        TimeDelta(
            self.0
                .checked_add(&rhs.0)
                .expect("overflow in TimeDelta + TimeDelta"),
        )
    }
}

impl<T: SolverVariable> Add for TimeDelta<T> {
    type Output = TimeDelta<T>;

    #[inline]
    fn add(self, rhs: Self) -> Self::Output {
        &self + &rhs
    }
}

impl<T: SolverVariable> Sub<&TimeDelta<T>> for &TimeDelta<T> {
    type Output = TimeDelta<T>;

    #[inline]
    fn sub(self, rhs: &TimeDelta<T>) -> Self::Output {
        TimeDelta(
            self.0
                .checked_sub(&rhs.0)
                .expect("underflow in TimeDelta - TimeDelta"),
        )
    }
}

impl<T: SolverVariable> Sub for TimeDelta<T> {
    type Output = TimeDelta<T>;

    #[inline]
    fn sub(self, rhs: Self) -> Self::Output {
        &self - &rhs
    }
}

impl<T: SolverVariable> AddAssign<&TimeDelta<T>> for TimeDelta<T> {
    #[inline]
    fn add_assign(&mut self, rhs: &TimeDelta<T>) {
        *self = &*self + rhs;
    }
}

impl<T: SolverVariable> Neg for TimeDelta<T> {
    type Output = TimeDelta<T>;

    #[inline]
    fn neg(self) -> Self::Output {
        &TimeDelta::zero() - &self
    }
}

impl<T: SolverVariable> Sum for TimeDelta<T> {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(TimeDelta::zero(), |acc, x| acc + x)
    }
}

impl<'a, T: SolverVariable> Sum<&'a TimeDelta<T>> for TimeDelta<T> {
    fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
        iter.fold(TimeDelta::zero(), |acc, x| &acc + x)
    }
}

impl<T: SolverVariable> Span<TimePoint<T>> {
    /// Number of points in a bounded span, `None` for an unbounded one.
    #[inline]
    pub fn len(&self) -> Option<TimeDelta<T>> {
        self.end()
            .map(|end| &(end - self.start()) + &TimeDelta::one())
    }

    /// Returns `true` if the span holds exactly one point.
    #[inline]
    pub fn is_point(&self) -> bool {
        self.end().is_some_and(|end| end == self.start())
    }

    /// The last point of the span, `None` if unbounded.
    #[inline]
    pub fn last(&self) -> Option<&TimePoint<T>> {
        self.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::BigInt;

    type T = i64;

    fn tp(v: T) -> TimePoint<T> {
        TimePoint::new(v)
    }

    fn td(v: T) -> TimeDelta<T> {
        TimeDelta::new(v)
    }

    #[test]
    fn test_time_point_creation() {
        assert_eq!(*tp(42).value(), 42);
        assert_eq!(TimePoint::<T>::zero(), tp(0));
        assert_eq!(TimePoint::<T>::default(), tp(0));
        assert_eq!(TimePoint::from(7i64), tp(7));
    }

    #[test]
    fn test_display_prints_plain_value() {
        assert_eq!(tp(12).to_string(), "12");
        assert_eq!(td(-3).to_string(), "-3");
    }

    #[test]
    fn test_point_delta_arithmetic() {
        assert_eq!(&tp(10) + &td(5), tp(15));
        assert_eq!(tp(10) - td(5), tp(5));
        assert_eq!(&tp(10) - &tp(4), td(6));
        assert_eq!(tp(3).succ(), tp(4));
        assert_eq!(tp(3).pred(), tp(2));

        let mut t = tp(1);
        t += &td(2);
        assert_eq!(t, tp(3));
        t -= &td(3);
        assert_eq!(t, tp(0));
    }

    #[test]
    fn test_delta_arithmetic() {
        assert_eq!(td(2) + td(3), td(5));
        assert_eq!(td(2) - td(3), td(-1));
        assert_eq!(-td(4), td(-4));
        assert!(td(-1).is_negative());
        assert!(td(1).is_positive());
        assert!(td(0).is_zero());
        let total: TimeDelta<T> = vec![td(1), td(2), td(3)].into_iter().sum();
        assert_eq!(total, td(6));
    }

    #[test]
    #[should_panic(expected = "overflow in TimePoint + TimeDelta")]
    fn test_fixed_width_overflow_panics() {
        let _ = &tp(i64::MAX) + &td(1);
    }

    #[test]
    fn test_checked_ops() {
        assert_eq!(tp(i64::MAX).checked_add(&td(1)), None);
        assert_eq!(tp(5).checked_sub(&td(1)), Some(tp(4)));
        assert_eq!(td(i64::MIN).checked_sub(&td(1)), None);
    }

    #[test]
    fn test_clamp_non_negative() {
        assert_eq!(tp(-4).clamp_non_negative(), tp(0));
        assert_eq!(tp(4).clamp_non_negative(), tp(4));
    }

    #[test]
    fn test_span_of_and_len() {
        let span = tp(3).span_of(&td(4)).expect("positive length");
        assert_eq!(span, Span::bounded(tp(3), tp(6)));
        assert_eq!(span.len(), Some(td(4)));
        assert!(tp(3).span_of(&td(0)).is_none());
        assert!(Span::bounded(tp(2), tp(2)).is_point());
        assert_eq!(Span::unbounded(tp(2)).len(), None);
    }

    #[test]
    fn test_big_integer_scalar() {
        let huge: BigInt = "123456789012345678901234567890".parse().expect("valid");
        let start = TimePoint::new(huge.clone());
        let end = &start + &TimeDelta::new(BigInt::from(10));
        assert_eq!(&end - &start, TimeDelta::new(BigInt::from(10)));
        assert_eq!(end.pred().succ(), end);
        assert!(end > start);
    }
}
