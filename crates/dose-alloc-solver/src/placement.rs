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

//! Scoring of candidate start positions.
//!
//! Every range overlapping an operation's start window offers a handful of
//! candidates: an interval of start times together with the machine that
//! would run the operation there and how good that choice is. The scheduler
//! pairs first-operation candidates with second-operation candidates and
//! keeps the best pair.

use crate::{config::Heuristic, range::RangeEntry};
use dose_alloc_core::{
    SolverVariable,
    primitives::Span,
    time::{TimeDelta, TimePoint, TimeSpan},
};
use dose_alloc_model::id::{JobId, MachineId};
use dose_alloc_model::sol::ScheduleEntry;
use std::{cmp::Ordering, fmt::Display};

/// Quality of a single operation's placement, worst first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Score {
    /// Every known machine is busy, a new one is opened.
    NewMachine,
    /// A machine already in use is free here, with no neighbour next to it.
    ExistingMachine,
    /// The operation starts right after, or ends right before, work on the
    /// same machine.
    NeighboursOne,
    /// The operation exactly fills the hole between two pieces of work on the
    /// same machine.
    Flush,
}

impl Score {
    #[inline]
    pub const fn weight(self) -> u32 {
        match self {
            Score::NewMachine => 0,
            Score::ExistingMachine => 1,
            Score::NeighboursOne => 2,
            Score::Flush => 3,
        }
    }
}

impl Display for Score {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Score::NewMachine => write!(f, "NewMachine"),
            Score::ExistingMachine => write!(f, "ExistingMachine"),
            Score::NeighboursOne => write!(f, "NeighboursOne"),
            Score::Flush => write!(f, "Flush"),
        }
    }
}

/// Start times on one machine that all earn the same score.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate<T: SolverVariable> {
    score: Score,
    machine: MachineId,
    starts: TimeSpan<T>,
}

impl<T: SolverVariable> Candidate<T> {
    /// # Panics
    ///
    /// Panics if `starts` is unbounded.
    #[inline]
    pub fn new(score: Score, machine: MachineId, starts: TimeSpan<T>) -> Self {
        assert!(starts.is_bounded(), "Candidate::new: starts must be bounded");
        Self {
            score,
            machine,
            starts,
        }
    }

    #[inline]
    fn at(score: Score, machine: MachineId, point: &TimePoint<T>) -> Self {
        Self::new(score, machine, Span::bounded(point.clone(), point.clone()))
    }

    #[inline]
    pub fn score(&self) -> Score {
        self.score
    }

    #[inline]
    pub fn machine(&self) -> MachineId {
        self.machine
    }

    #[inline]
    pub fn starts(&self) -> &TimeSpan<T> {
        &self.starts
    }

    #[inline]
    fn last_start(&self) -> &TimePoint<T> {
        self.starts
            .end()
            .expect("candidate start windows are bounded")
    }
}

impl Heuristic {
    /// Appends the candidates `entry` offers inside `window`.
    ///
    /// Candidates come out ordered by their earliest start, which lets the
    /// pairing loop stop early.
    pub fn candidates<T: SolverVariable>(
        self,
        entry: &RangeEntry<'_, T>,
        window: &TimeSpan<T>,
        machines_used: usize,
        out: &mut Vec<Candidate<T>>,
    ) {
        let range = entry.range();
        let Some(clipped) = range.span().intersection(window) else {
            return;
        };
        let occupied = range.occupied();
        let scored = self == Heuristic::Scored;
        let start_inside = clipped.start() == range.start();
        let end_inside = range.end().is_some_and(|end| clipped.end() == Some(end));

        if scored && start_inside {
            if range.span().is_point() {
                let both = entry.left_occupied().zip(entry.right_occupied());
                if let Some(machine) =
                    both.and_then(|(left, right)| occupied.unique_in_both_neighbours(left, right))
                {
                    out.push(Candidate::at(Score::Flush, machine, range.start()));
                }
            }
            if let Some(machine) = entry
                .left_occupied()
                .and_then(|left| occupied.unique_in_other(left))
            {
                out.push(Candidate::at(Score::NeighboursOne, machine, range.start()));
            }
        }

        let free = occupied.first_not_contained();
        let score = if occupied.covers_first(machines_used) {
            Score::NewMachine
        } else {
            Score::ExistingMachine
        };
        let fallback_score = if scored { score } else { Score::NewMachine };
        let end = range.end().filter(|_| scored && end_inside);
        out.push(Candidate::new(fallback_score, free, clipped));

        if let Some(end) = end {
            if let Some(machine) = entry
                .right_occupied()
                .and_then(|right| occupied.unique_in_other(right))
            {
                out.push(Candidate::at(Score::NeighboursOne, machine, end));
            }
        }
    }

    /// Combined rank of a pair of scores, higher is better.
    #[inline]
    pub fn rank(self, first: Score, second: Score) -> u32 {
        match self {
            Heuristic::Scored => first.weight() + second.weight(),
            Heuristic::FirstFit => 0,
        }
    }

    /// The rank no pair can beat.
    #[inline]
    pub fn max_rank(self) -> u32 {
        self.rank(Score::Flush, Score::Flush)
    }
}

/// Earliest start times `(t1, t2)` with `t1` in `first`, `t2` in `second` and
/// `min_gap <= t2 - t1 <= max_gap`.
pub fn resolve_pair<T: SolverVariable>(
    first: &TimeSpan<T>,
    second: &TimeSpan<T>,
    min_gap: &TimeDelta<T>,
    max_gap: &TimeDelta<T>,
) -> Option<(TimePoint<T>, TimePoint<T>)> {
    let (Some(first_end), Some(second_end)) = (first.end(), second.end()) else {
        return None;
    };
    let t1 = std::cmp::max(first.start().clone(), second.start() - max_gap);
    let latest = std::cmp::min(first_end.clone(), second_end - min_gap);
    if t1 > latest {
        return None;
    }
    let t2 = std::cmp::max(second.start().clone(), &t1 + min_gap);
    Some((t1, t2))
}

/// Machine, start and score chosen for one operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment<T: SolverVariable> {
    machine: MachineId,
    start: TimePoint<T>,
    score: Score,
}

impl<T: SolverVariable> Assignment<T> {
    #[inline]
    pub fn new(machine: MachineId, start: TimePoint<T>, score: Score) -> Self {
        Self {
            machine,
            start,
            score,
        }
    }

    #[inline]
    pub fn machine(&self) -> MachineId {
        self.machine
    }

    #[inline]
    pub fn start(&self) -> &TimePoint<T> {
        &self.start
    }

    #[inline]
    pub fn score(&self) -> Score {
        self.score
    }
}

/// Both operations of a job, placed but not yet committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement<T: SolverVariable> {
    job: JobId,
    first: Assignment<T>,
    second: Assignment<T>,
    rank: u32,
}

impl<T: SolverVariable> Placement<T> {
    #[inline]
    pub fn new(job: JobId, first: Assignment<T>, second: Assignment<T>, rank: u32) -> Self {
        Self {
            job,
            first,
            second,
            rank,
        }
    }

    #[inline]
    pub fn job(&self) -> JobId {
        self.job
    }

    #[inline]
    pub fn first(&self) -> &Assignment<T> {
        &self.first
    }

    #[inline]
    pub fn second(&self) -> &Assignment<T> {
        &self.second
    }

    #[inline]
    pub fn rank(&self) -> u32 {
        self.rank
    }

    /// Higher rank first, then earlier first start, then earlier second start.
    pub fn cmp_preference(&self, other: &Self) -> Ordering {
        other
            .rank
            .cmp(&self.rank)
            .then_with(|| self.first.start.cmp(&other.first.start))
            .then_with(|| self.second.start.cmp(&other.second.start))
    }

    pub fn to_entry(&self) -> ScheduleEntry<T> {
        ScheduleEntry::new(
            self.job,
            self.first.machine,
            self.first.start.clone(),
            self.second.machine,
            self.second.start.clone(),
        )
    }
}

impl<T: SolverVariable> Display for Placement<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {} on {} ({}), {} on {} ({})",
            self.job,
            self.first.start,
            self.first.machine,
            self.first.score,
            self.second.start,
            self.second.machine,
            self.second.score
        )
    }
}

/// Pairs every first candidate with every compatible second candidate and
/// returns the preferred placement.
///
/// `seconds` must be ordered by earliest start. The search stops as soon as a
/// pair reaches [`Heuristic::max_rank`].
pub fn best_pair<T: SolverVariable>(
    heuristic: Heuristic,
    job: JobId,
    firsts: &[Candidate<T>],
    seconds: &[Candidate<T>],
    min_gap: &TimeDelta<T>,
    max_gap: &TimeDelta<T>,
) -> Option<Placement<T>> {
    let max_rank = heuristic.max_rank();
    let mut best: Option<Placement<T>> = None;
    for c1 in firsts {
        let reach = c1.last_start() + max_gap;
        for c2 in seconds {
            if c2.starts.start() > &reach {
                break;
            }
            let Some((t1, t2)) = resolve_pair(&c1.starts, &c2.starts, min_gap, max_gap) else {
                continue;
            };
            let candidate = Placement::new(
                job,
                Assignment::new(c1.machine, t1, c1.score),
                Assignment::new(c2.machine, t2, c2.score),
                heuristic.rank(c1.score, c2.score),
            );
            let better = best
                .as_ref()
                .is_none_or(|b| candidate.cmp_preference(b) == Ordering::Less);
            if better {
                let done = candidate.rank == max_rank;
                best = Some(candidate);
                if done {
                    return best;
                }
            }
        }
    }
    best
}
