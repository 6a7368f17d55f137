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

use crate::id::{JobId, MachineId};
use dose_alloc_core::{
    SolverVariable,
    time::{TimeDelta, TimeSpan},
};
use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterKind {
    FirstDuration,
    SecondDuration,
    Gap,
}

impl Display for ParameterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParameterKind::FirstDuration => write!(f, "first operation duration"),
            ParameterKind::SecondDuration => write!(f, "second operation duration"),
            ParameterKind::Gap => write!(f, "gap"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InvalidParameterError<T: SolverVariable> {
    kind: ParameterKind,
    value: TimeDelta<T>,
}

impl<T: SolverVariable> InvalidParameterError<T> {
    #[inline]
    pub fn new(kind: ParameterKind, value: TimeDelta<T>) -> Self {
        Self { kind, value }
    }

    #[inline]
    pub fn kind(&self) -> ParameterKind {
        self.kind
    }

    #[inline]
    pub fn value(&self) -> &TimeDelta<T> {
        &self.value
    }
}

impl<T: SolverVariable> Display for InvalidParameterError<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            ParameterKind::Gap => write!(
                f,
                "The {} must not be negative, got {}",
                self.kind, self.value
            ),
            _ => write!(f, "The {} must be positive, got {}", self.kind, self.value),
        }
    }
}

impl<T: SolverVariable> std::error::Error for InvalidParameterError<T> {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WindowKind {
    FirstStart,
    Gap,
}

impl Display for WindowKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WindowKind::FirstStart => write!(f, "first start window"),
            WindowKind::Gap => write!(f, "gap window"),
        }
    }
}

/// A derived job window whose lower bound exceeds its upper bound.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EmptyWindowError<T: SolverVariable> {
    id: JobId,
    kind: WindowKind,
    min: T,
    max: T,
}

impl<T: SolverVariable> EmptyWindowError<T> {
    #[inline]
    pub fn new(id: JobId, kind: WindowKind, min: T, max: T) -> Self {
        Self { id, kind, min, max }
    }

    #[inline]
    pub fn id(&self) -> JobId {
        self.id
    }

    #[inline]
    pub fn kind(&self) -> WindowKind {
        self.kind
    }

    #[inline]
    pub fn min(&self) -> &T {
        &self.min
    }

    #[inline]
    pub fn max(&self) -> &T {
        &self.max
    }
}

impl<T: SolverVariable> Display for EmptyWindowError<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Job {} has an empty {}: {} > {}",
            self.id, self.kind, self.min, self.max
        )
    }
}

impl<T: SolverVariable> std::error::Error for EmptyWindowError<T> {}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NegativeJobValueError<T: SolverVariable> {
    id: JobId,
    field: &'static str,
    value: T,
}

impl<T: SolverVariable> NegativeJobValueError<T> {
    #[inline]
    pub fn new(id: JobId, field: &'static str, value: T) -> Self {
        Self { id, field, value }
    }

    #[inline]
    pub fn id(&self) -> JobId {
        self.id
    }

    #[inline]
    pub fn field(&self) -> &'static str {
        self.field
    }

    #[inline]
    pub fn value(&self) -> &T {
        &self.value
    }
}

impl<T: SolverVariable> Display for NegativeJobValueError<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Job {} has a negative {}: {}",
            self.id, self.field, self.value
        )
    }
}

impl<T: SolverVariable> std::error::Error for NegativeJobValueError<T> {}

/// The second operation could start while the first one is still running.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GapTooShortError<T: SolverVariable> {
    id: JobId,
    min_gap: TimeDelta<T>,
    first_duration: TimeDelta<T>,
}

impl<T: SolverVariable> GapTooShortError<T> {
    #[inline]
    pub fn new(id: JobId, min_gap: TimeDelta<T>, first_duration: TimeDelta<T>) -> Self {
        Self {
            id,
            min_gap,
            first_duration,
        }
    }

    #[inline]
    pub fn id(&self) -> JobId {
        self.id
    }

    #[inline]
    pub fn min_gap(&self) -> &TimeDelta<T> {
        &self.min_gap
    }

    #[inline]
    pub fn first_duration(&self) -> &TimeDelta<T> {
        &self.first_duration
    }
}

impl<T: SolverVariable> Display for GapTooShortError<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Job {} has minimum gap {} shorter than the first operation ({})",
            self.id, self.min_gap, self.first_duration
        )
    }
}

impl<T: SolverVariable> std::error::Error for GapTooShortError<T> {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobError<T: SolverVariable> {
    NegativeValue(NegativeJobValueError<T>),
    EmptyWindow(EmptyWindowError<T>),
    GapTooShort(GapTooShortError<T>),
}

impl<T: SolverVariable> Display for JobError<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobError::NegativeValue(e) => write!(f, "{e}"),
            JobError::EmptyWindow(e) => write!(f, "{e}"),
            JobError::GapTooShort(e) => write!(f, "{e}"),
        }
    }
}

impl<T: SolverVariable> std::error::Error for JobError<T> {}

impl<T: SolverVariable> From<NegativeJobValueError<T>> for JobError<T> {
    fn from(value: NegativeJobValueError<T>) -> Self {
        JobError::NegativeValue(value)
    }
}

impl<T: SolverVariable> From<EmptyWindowError<T>> for JobError<T> {
    fn from(value: EmptyWindowError<T>) -> Self {
        JobError::EmptyWindow(value)
    }
}

impl<T: SolverVariable> From<GapTooShortError<T>> for JobError<T> {
    fn from(value: GapTooShortError<T>) -> Self {
        JobError::GapTooShort(value)
    }
}

/// A committed operation starts outside the window its job allows.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WindowViolationError<T: SolverVariable> {
    id: JobId,
    kind: WindowKind,
    value: T,
    window: TimeSpan<T>,
}

impl<T: SolverVariable> WindowViolationError<T> {
    #[inline]
    pub fn new(id: JobId, kind: WindowKind, value: T, window: TimeSpan<T>) -> Self {
        Self {
            id,
            kind,
            value,
            window,
        }
    }

    #[inline]
    pub fn id(&self) -> JobId {
        self.id
    }

    #[inline]
    pub fn kind(&self) -> WindowKind {
        self.kind
    }

    #[inline]
    pub fn value(&self) -> &T {
        &self.value
    }

    #[inline]
    pub fn window(&self) -> &TimeSpan<T> {
        &self.window
    }
}

impl<T: SolverVariable> Display for WindowViolationError<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Job {} violates its {}: {} not in {}",
            self.id, self.kind, self.value, self.window
        )
    }
}

impl<T: SolverVariable> std::error::Error for WindowViolationError<T> {}

/// Two operations overlap in time on the same machine.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MachineOverlapError<T: SolverVariable> {
    machine: MachineId,
    first: (JobId, TimeSpan<T>),
    second: (JobId, TimeSpan<T>),
}

impl<T: SolverVariable> MachineOverlapError<T> {
    #[inline]
    pub fn new(
        machine: MachineId,
        first: (JobId, TimeSpan<T>),
        second: (JobId, TimeSpan<T>),
    ) -> Self {
        Self {
            machine,
            first,
            second,
        }
    }

    #[inline]
    pub fn machine(&self) -> MachineId {
        self.machine
    }

    #[inline]
    pub fn first(&self) -> &(JobId, TimeSpan<T>) {
        &self.first
    }

    #[inline]
    pub fn second(&self) -> &(JobId, TimeSpan<T>) {
        &self.second
    }
}

impl<T: SolverVariable> Display for MachineOverlapError<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Operations of {} at {} and {} at {} overlap on {}",
            self.first.0, self.first.1, self.second.0, self.second.1, self.machine
        )
    }
}

impl<T: SolverVariable> std::error::Error for MachineOverlapError<T> {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UnknownJobError {
    id: JobId,
}

impl UnknownJobError {
    #[inline]
    pub fn new(id: JobId) -> Self {
        Self { id }
    }

    #[inline]
    pub fn id(&self) -> JobId {
        self.id
    }
}

impl Display for UnknownJobError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Schedule entry refers to unknown job {}", self.id)
    }
}

impl std::error::Error for UnknownJobError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleValidationError<T: SolverVariable> {
    UnknownJob(UnknownJobError),
    WindowViolation(WindowViolationError<T>),
    Overlap(MachineOverlapError<T>),
}

impl<T: SolverVariable> Display for ScheduleValidationError<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScheduleValidationError::UnknownJob(e) => write!(f, "{e}"),
            ScheduleValidationError::WindowViolation(e) => write!(f, "{e}"),
            ScheduleValidationError::Overlap(e) => write!(f, "{e}"),
        }
    }
}

impl<T: SolverVariable> std::error::Error for ScheduleValidationError<T> {}

#[derive(Debug)]
pub enum ParseErrorKind {
    UnexpectedEof { expected: &'static str },
    InvalidNumber { text: String },
    FieldCount { expected: usize, found: usize },
    Io(std::io::Error),
}

/// A malformed or missing line of the text protocol.
#[derive(Debug)]
pub struct ParseError {
    line: usize,
    kind: ParseErrorKind,
}

impl ParseError {
    #[inline]
    pub fn new(line: usize, kind: ParseErrorKind) -> Self {
        Self { line, kind }
    }

    /// One-based number of the offending line.
    #[inline]
    pub fn line(&self) -> usize {
        self.line
    }

    #[inline]
    pub fn kind(&self) -> &ParseErrorKind {
        &self.kind
    }
}

impl Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            ParseErrorKind::UnexpectedEof { expected } => {
                write!(f, "Line {}: input ended, expected {}", self.line, expected)
            }
            ParseErrorKind::InvalidNumber { text } => {
                write!(f, "Line {}: '{}' is not an integer", self.line, text)
            }
            ParseErrorKind::FieldCount { expected, found } => write!(
                f,
                "Line {}: expected {} fields, found {}",
                self.line, expected, found
            ),
            ParseErrorKind::Io(e) => write!(f, "Line {}: {}", self.line, e),
        }
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            ParseErrorKind::Io(e) => Some(e),
            _ => None,
        }
    }
}

/// Everything that can go wrong while turning the input into jobs.
#[derive(Debug)]
pub enum InputError<T: SolverVariable> {
    Parse(ParseError),
    Parameter(InvalidParameterError<T>),
    Job(JobError<T>),
}

impl<T: SolverVariable> Display for InputError<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputError::Parse(e) => write!(f, "{e}"),
            InputError::Parameter(e) => write!(f, "{e}"),
            InputError::Job(e) => write!(f, "{e}"),
        }
    }
}

impl<T: SolverVariable> std::error::Error for InputError<T> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            InputError::Parse(e) => Some(e),
            _ => None,
        }
    }
}

impl<T: SolverVariable> From<ParseError> for InputError<T> {
    fn from(value: ParseError) -> Self {
        InputError::Parse(value)
    }
}

impl<T: SolverVariable> From<InvalidParameterError<T>> for InputError<T> {
    fn from(value: InvalidParameterError<T>) -> Self {
        InputError::Parameter(value)
    }
}

impl<T: SolverVariable> From<JobError<T>> for InputError<T> {
    fn from(value: JobError<T>) -> Self {
        InputError::Job(value)
    }
}
