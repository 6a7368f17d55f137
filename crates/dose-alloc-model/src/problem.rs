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

use crate::{
    err::{
        EmptyWindowError, GapTooShortError, InvalidParameterError, JobError,
        NegativeJobValueError, ParameterKind, WindowKind,
    },
    id::JobId,
};
use dose_alloc_core::{
    SolverVariable,
    primitives::Span,
    time::{TimeDelta, TimePoint, TimeSpan},
};
use std::fmt::Display;

/// Run-wide constants shared by every job.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Parameters<T: SolverVariable> {
    first_duration: TimeDelta<T>,
    second_duration: TimeDelta<T>,
    gap: TimeDelta<T>,
}

impl<T: SolverVariable> Parameters<T> {
    pub fn new(
        first_duration: TimeDelta<T>,
        second_duration: TimeDelta<T>,
        gap: TimeDelta<T>,
    ) -> Result<Self, InvalidParameterError<T>> {
        if !first_duration.is_positive() {
            return Err(InvalidParameterError::new(
                ParameterKind::FirstDuration,
                first_duration,
            ));
        }
        if !second_duration.is_positive() {
            return Err(InvalidParameterError::new(
                ParameterKind::SecondDuration,
                second_duration,
            ));
        }
        if gap.is_negative() {
            return Err(InvalidParameterError::new(ParameterKind::Gap, gap));
        }
        Ok(Self {
            first_duration,
            second_duration,
            gap,
        })
    }

    /// Duration `p1` of the first operation.
    #[inline]
    pub fn first_duration(&self) -> &TimeDelta<T> {
        &self.first_duration
    }

    /// Duration `p2` of the second operation.
    #[inline]
    pub fn second_duration(&self) -> &TimeDelta<T> {
        &self.second_duration
    }

    /// Minimum idle time between the end of the first and the start of the second operation.
    #[inline]
    pub fn gap(&self) -> &TimeDelta<T> {
        &self.gap
    }
}

impl<T: SolverVariable> Display for Parameters<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Parameters(p1: {}, p2: {}, gap: {})",
            self.first_duration, self.second_duration, self.gap
        )
    }
}

/// A job exactly as it appears on an input line.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobRequest<T: SolverVariable> {
    first_interval_start: TimePoint<T>,
    first_interval_end: TimePoint<T>,
    extra_delay: TimeDelta<T>,
    second_interval_length: TimeDelta<T>,
}

impl<T: SolverVariable> JobRequest<T> {
    #[inline]
    pub fn new(
        first_interval_start: TimePoint<T>,
        first_interval_end: TimePoint<T>,
        extra_delay: TimeDelta<T>,
        second_interval_length: TimeDelta<T>,
    ) -> Self {
        Self {
            first_interval_start,
            first_interval_end,
            extra_delay,
            second_interval_length,
        }
    }

    #[inline]
    pub fn first_interval_start(&self) -> &TimePoint<T> {
        &self.first_interval_start
    }

    #[inline]
    pub fn first_interval_end(&self) -> &TimePoint<T> {
        &self.first_interval_end
    }

    #[inline]
    pub fn extra_delay(&self) -> &TimeDelta<T> {
        &self.extra_delay
    }

    #[inline]
    pub fn second_interval_length(&self) -> &TimeDelta<T> {
        &self.second_interval_length
    }
}

/// A job reduced to the two windows the scheduler works with.
///
/// The first operation may start anywhere in `[min_first_start, max_first_start]`.
/// If it starts at `t1`, the second operation may start anywhere in
/// `[t1 + min_gap, t1 + max_gap]`. Both windows are non-empty and
/// `min_gap >= p1`, so the two operations of one job never overlap.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Job<T: SolverVariable> {
    id: JobId,
    first_start_window: TimeSpan<T>,
    min_gap: TimeDelta<T>,
    max_gap: TimeDelta<T>,
}

impl<T: SolverVariable> Job<T> {
    pub fn new(
        id: JobId,
        parameters: &Parameters<T>,
        min_first_start: TimePoint<T>,
        max_first_start: TimePoint<T>,
        min_gap: TimeDelta<T>,
        max_gap: TimeDelta<T>,
    ) -> Result<Self, JobError<T>> {
        if min_first_start.is_negative() {
            return Err(NegativeJobValueError::new(
                id,
                "first start",
                min_first_start.into_inner(),
            )
            .into());
        }
        if min_first_start > max_first_start {
            return Err(EmptyWindowError::new(
                id,
                WindowKind::FirstStart,
                min_first_start.into_inner(),
                max_first_start.into_inner(),
            )
            .into());
        }
        if min_gap > max_gap {
            return Err(EmptyWindowError::new(
                id,
                WindowKind::Gap,
                min_gap.into_inner(),
                max_gap.into_inner(),
            )
            .into());
        }
        if min_gap < *parameters.first_duration() {
            return Err(
                GapTooShortError::new(id, min_gap, parameters.first_duration().clone()).into(),
            );
        }

        Ok(Self {
            id,
            first_start_window: Span::bounded(min_first_start, max_first_start),
            min_gap,
            max_gap,
        })
    }

    /// Derives the windows of a job from its input line.
    ///
    /// The first operation must run entirely inside
    /// `[first_interval_start, first_interval_end]`. The second operation must
    /// run entirely inside an interval of `second_interval_length` points that
    /// opens `p1 + gap + extra_delay` after the first operation started.
    pub fn derive(
        id: JobId,
        parameters: &Parameters<T>,
        request: &JobRequest<T>,
    ) -> Result<Self, JobError<T>> {
        if request.extra_delay().is_negative() {
            return Err(NegativeJobValueError::new(
                id,
                "extra delay",
                request.extra_delay().value().clone(),
            )
            .into());
        }

        let p1 = parameters.first_duration();
        let p2 = parameters.second_duration();
        let one = TimeDelta::one();

        let min_first_start = request.first_interval_start().clone();
        let max_first_start = &(request.first_interval_end() - p1) + &one;
        let min_gap = &(p1 + parameters.gap()) + request.extra_delay();
        let max_gap = &(&min_gap + request.second_interval_length()) - p2;

        Self::new(
            id,
            parameters,
            min_first_start,
            max_first_start,
            min_gap,
            max_gap,
        )
    }

    #[inline]
    pub fn id(&self) -> JobId {
        self.id
    }

    #[inline]
    pub fn first_start_window(&self) -> &TimeSpan<T> {
        &self.first_start_window
    }

    #[inline]
    pub fn min_first_start(&self) -> &TimePoint<T> {
        self.first_start_window.start()
    }

    #[inline]
    pub fn max_first_start(&self) -> &TimePoint<T> {
        self.first_start_window
            .end()
            .expect("first start window is bounded")
    }

    #[inline]
    pub fn min_gap(&self) -> &TimeDelta<T> {
        &self.min_gap
    }

    #[inline]
    pub fn max_gap(&self) -> &TimeDelta<T> {
        &self.max_gap
    }

    /// Every point at which the second operation could start for some legal first start.
    #[inline]
    pub fn second_start_window(&self) -> TimeSpan<T> {
        Span::bounded(
            self.min_first_start() + &self.min_gap,
            self.max_first_start() + &self.max_gap,
        )
    }

    /// Window of the second operation once the first one starts at `first_start`.
    #[inline]
    pub fn second_start_window_for(&self, first_start: &TimePoint<T>) -> TimeSpan<T> {
        Span::bounded(first_start + &self.min_gap, first_start + &self.max_gap)
    }
}

impl<T: SolverVariable> Display for Job<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Job({}, first start {}, gap [{}, {}])",
            self.id.value(),
            self.first_start_window,
            self.min_gap,
            self.max_gap
        )
    }
}
