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

//! # Dose Allocation Core (`dose-alloc-core`)
//!
//! Numeric foundation shared by the model and the solver crates: the scalar
//! bound [`SolverVariable`], the time newtypes in [`time`] and the inclusive,
//! possibly unbounded [`primitives::Span`].
//!
//! Time coordinates are not assumed to fit a machine word. Everything in the
//! workspace is written against [`SolverVariable`], which is implemented by
//! fixed-width signed integers as well as by `num_bigint::BigInt`.

use num_traits::{CheckedAdd, CheckedSub, Num, Signed};
use std::fmt::{Debug, Display};
use std::hash::Hash;

pub mod primitives;
pub mod time;

pub trait SolverVariable:
    Num + Signed + CheckedAdd + CheckedSub + Ord + Clone + Hash + Send + Sync + Debug + Display
{
}

impl<T> SolverVariable for T where
    T: Num + Signed + CheckedAdd + CheckedSub + Ord + Clone + Hash + Send + Sync + Debug + Display
{
}
