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

//! # Dose Allocation Solver (`dose-alloc-solver`)
//!
//! Online placement of two-stage jobs on identical machines.
//!
//! ## Key Data Structures
//!
//! - **`OccupancySet`**: bit vector of busy machine ids.
//! - **`RangeTree<T>`**: balanced partition of the start-time axis into ranges
//!   of uniform occupancy, kept merged under updates.
//! - **`Machines<T>`**: the scheduler. Holds one tree per operation kind,
//!   scores candidate placements and commits the best one.
//!
//! The [`online`] module wires the scheduler to the line protocol of
//! `dose-alloc-model`.

pub mod config;
pub mod framework;
pub mod machines;
pub mod occupancy;
pub mod online;
pub mod placement;
pub mod range;
pub mod tree;

pub mod prelude {
    pub use crate::config::{Heuristic, OutputConfig, RunConfig, SchedulerConfig};
    pub use crate::framework::{OfflineSolver, OnlineScheduler, ReplaySolver};
    pub use crate::machines::Machines;
    pub use crate::occupancy::OccupancySet;
    pub use crate::online::{DriverError, RunReport, run_offline, run_offline_with, run_online};
    pub use crate::placement::{Assignment, Candidate, Placement, Score};
    pub use crate::range::{Range, RangeEntry};
    pub use crate::tree::{
        OverlapCursor, RangeNotFoundError, RangeTree, StaleCursorError, TreeInvariantError,
    };
}
