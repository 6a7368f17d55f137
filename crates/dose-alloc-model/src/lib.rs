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

//! # Dose Allocation Model (`dose-alloc-model`)
//!
//! Data model of the two-stage scheduling problem: run-wide [`problem::Parameters`],
//! jobs with their derived start and gap windows, the [`sol::Schedule`] that the
//! solver produces, and the line protocol used to read and write them.
//!
//! ## Key Data Structures
//!
//! - **`Parameters<T>`**: the durations `p1`, `p2` and the minimum `gap`.
//! - **`JobRequest<T>`**: a job as written on an input line.
//! - **`Job<T>`**: the first-start window and the gap window derived from a request.
//! - **`ScheduleEntry<T>`**: machine and start time of both operations of one job.
//! - **`Schedule<T>`**: all entries of a run, with validation against the jobs.
//!
//! Everything is generic over the time scalar `T`, which may be an
//! arbitrary-precision integer.

pub mod err;
pub mod id;
pub mod io;
pub mod problem;
pub mod sol;

pub mod prelude {
    pub use crate::err::*;
    pub use crate::id::{JobId, MachineId};
    pub use crate::io::{ProtocolReader, ProtocolWriter};
    pub use crate::problem::{Job, JobRequest, Parameters};
    pub use crate::sol::{Schedule, ScheduleEntry};
}
