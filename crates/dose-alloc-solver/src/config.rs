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

use std::fmt::Display;

/// How candidate placements are ranked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Heuristic {
    /// Prefers placements that sit flush against work already on a machine,
    /// then machines already in use, then a new machine.
    #[default]
    Scored,
    /// Takes the earliest feasible pair of start times on the lowest free machines.
    FirstFit,
}

impl Display for Heuristic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Heuristic::Scored => write!(f, "scored"),
            Heuristic::FirstFit => write!(f, "first-fit"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SchedulerConfig {
    pub heuristic: Heuristic,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OutputConfig {
    /// Added to every machine id written out.
    pub machine_base: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunConfig {
    pub scheduler: SchedulerConfig,
    pub output: OutputConfig,
    /// Check the finished schedule against the jobs before returning it.
    pub validate: bool,
}
