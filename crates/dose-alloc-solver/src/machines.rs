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
    config::SchedulerConfig,
    framework::OnlineScheduler,
    placement::{Candidate, Placement, best_pair},
    tree::RangeTree,
};
use dose_alloc_core::{
    SolverVariable,
    time::{TimeDelta, TimePoint, TimeSpan},
};
use dose_alloc_model::{id::MachineId, problem::Job, problem::Parameters, sol::ScheduleEntry};
use tracing::{debug, instrument, trace};

/// The online scheduler.
///
/// Keeps one [`RangeTree`] per operation kind. The tree for an operation of
/// length `p` records, for every start time, the machines on which such an
/// operation may not start because it would run into work already placed.
/// Both trees describe the same machines, so every committed operation is
/// recorded in both.
#[derive(Debug, Clone)]
pub struct Machines<T: SolverVariable> {
    parameters: Parameters<T>,
    first: RangeTree<T>,
    second: RangeTree<T>,
    machines_used: usize,
    config: SchedulerConfig,
}

impl<T: SolverVariable> Machines<T> {
    pub fn new(parameters: Parameters<T>, config: SchedulerConfig) -> Self {
        Self {
            parameters,
            first: RangeTree::new(),
            second: RangeTree::new(),
            machines_used: 0,
            config,
        }
    }

    #[inline]
    pub fn parameters(&self) -> &Parameters<T> {
        &self.parameters
    }

    #[inline]
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Start times blocked for first operations.
    #[inline]
    pub fn first_tree(&self) -> &RangeTree<T> {
        &self.first
    }

    /// Start times blocked for second operations.
    #[inline]
    pub fn second_tree(&self) -> &RangeTree<T> {
        &self.second
    }

    /// Chooses machines and start times for both operations of `job`.
    ///
    /// Nothing is recorded until the placement is passed to
    /// [`Machines::commit`].
    #[instrument(level = "debug", skip_all, fields(job = %job.id()))]
    pub fn place_job(&self, job: &Job<T>) -> Placement<T> {
        let firsts = self.candidates(&self.first, job.first_start_window());
        let seconds = self.candidates(&self.second, &job.second_start_window());
        trace!(
            firsts = firsts.len(),
            seconds = seconds.len(),
            "collected candidates"
        );

        let placement = best_pair(
            self.config.heuristic,
            job.id(),
            &firsts,
            &seconds,
            job.min_gap(),
            job.max_gap(),
        )
        .expect("a job with non-empty windows always fits on a new machine");
        debug!(%placement, rank = placement.rank(), "placed job");
        placement
    }

    /// Records a placement produced by [`Machines::place_job`] on the current state.
    #[instrument(level = "debug", skip_all, fields(job = %placement.job()))]
    pub fn commit(&mut self, placement: &Placement<T>) {
        let p1 = self.parameters.first_duration();
        let p2 = self.parameters.second_duration();
        for (assignment, duration) in [(placement.first(), p1), (placement.second(), p2)] {
            let start = assignment.start();
            let machine = assignment.machine();
            Self::block(&mut self.first, start, duration, p1, machine);
            Self::block(&mut self.second, start, duration, p2, machine);
        }

        let next = MachineId::new(self.machines_used);
        let (m1, m2) = (placement.first().machine(), placement.second().machine());
        debug_assert!(m1 <= next && m2 <= next, "machine ids are handed out densely");
        if m1 == next || m2 == next {
            self.machines_used += 1;
            debug!(machines = self.machines_used, "opened a new machine");
        }
    }

    fn candidates(&self, tree: &RangeTree<T>, window: &TimeSpan<T>) -> Vec<Candidate<T>> {
        let mut out = Vec::new();
        for entry in tree.iter_overlapping(window.start(), window.end()) {
            self.config
                .heuristic
                .candidates(&entry, window, self.machines_used, &mut out);
        }
        out
    }

    /// Marks the start times of `tree` that would collide with an operation
    /// running `duration` from `start`, for operations of length `length`.
    fn block(
        tree: &mut RangeTree<T>,
        start: &TimePoint<T>,
        duration: &TimeDelta<T>,
        length: &TimeDelta<T>,
        machine: MachineId,
    ) {
        let one = TimeDelta::one();
        let lo = (start - &(length - &one)).clamp_non_negative();
        let hi = &(start + duration) - &one;
        tree.mark_occupied(&lo, &hi, machine);
    }
}

impl<T: SolverVariable> OnlineScheduler<T> for Machines<T> {
    fn schedule(&mut self, job: &Job<T>) -> ScheduleEntry<T> {
        let placement = self.place_job(job);
        self.commit(&placement);
        placement.to_entry()
    }

    #[inline]
    fn machines_used(&self) -> usize {
        self.machines_used
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::Heuristic, placement::Score};
    use dose_alloc_model::{id::JobId, problem::JobRequest, sol::Schedule};
    use num_bigint::BigInt;

    fn params(p1: i64, p2: i64, gap: i64) -> Parameters<i64> {
        Parameters::new(TimeDelta::new(p1), TimeDelta::new(p2), TimeDelta::new(gap)).unwrap()
    }

    fn job(id: u64, p: &Parameters<i64>, start: i64, end: i64, delay: i64, len: i64) -> Job<i64> {
        let request = JobRequest::new(
            TimePoint::new(start),
            TimePoint::new(end),
            TimeDelta::new(delay),
            TimeDelta::new(len),
        );
        Job::derive(JobId::new(id), p, &request).unwrap()
    }

    fn tp(v: i64) -> TimePoint<i64> {
        TimePoint::new(v)
    }

    #[test]
    fn test_first_job_opens_machine_zero() {
        let p = params(2, 3, 0);
        let mut machines = Machines::new(p.clone(), SchedulerConfig::default());
        let entry = machines.schedule(&job(0, &p, 0, 1, 0, 3));
        assert_eq!(entry.time1(), &tp(0));
        assert_eq!(entry.time2(), &tp(2));
        assert_eq!(entry.machine1(), MachineId::new(0));
        assert_eq!(entry.machine2(), MachineId::new(0));
        assert_eq!(machines.machines_used(), 1);
    }

    #[test]
    fn test_commit_blocks_both_trees() {
        let p = params(2, 3, 0);
        let mut machines = Machines::new(p.clone(), SchedulerConfig::default());
        machines.schedule(&job(0, &p, 0, 1, 0, 3));
        // Operations run [0, 1] and [2, 4] on machine 0.
        let first: Vec<_> = machines
            .first_tree()
            .iter()
            .map(|r| r.span().clone())
            .collect();
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].end(), Some(&tp(4)));
        let second: Vec<_> = machines
            .second_tree()
            .iter()
            .map(|r| r.span().clone())
            .collect();
        assert_eq!(second.len(), 2);
        assert_eq!(second[0].end(), Some(&tp(4)));
        assert!(machines.first_tree().check_invariants().is_ok());
        assert!(machines.second_tree().check_invariants().is_ok());
    }

    #[test]
    fn test_coinciding_jobs_need_two_machines() {
        let p = params(2, 3, 0);
        let mut machines = Machines::new(p.clone(), SchedulerConfig::default());
        let a = machines.schedule(&job(0, &p, 0, 1, 0, 3));
        let b = machines.schedule(&job(1, &p, 0, 1, 0, 3));
        assert_eq!(machines.machines_used(), 2);
        assert_ne!(a.machine1(), b.machine1());
        assert_ne!(a.machine2(), b.machine2());
    }

    #[test]
    fn test_abutting_job_reuses_neighbour_machine() {
        let p = params(2, 3, 0);
        let mut machines = Machines::new(p.clone(), SchedulerConfig::default());
        machines.schedule(&job(0, &p, 0, 1, 0, 3));

        let next = job(1, &p, 5, 20, 0, 3);
        let placement = machines.place_job(&next);
        assert_eq!(placement.first().score(), Score::NeighboursOne);
        assert_eq!(placement.first().machine(), MachineId::new(0));
        assert_eq!(placement.first().start(), &tp(5));
        machines.commit(&placement);
        assert_eq!(machines.machines_used(), 1);
    }

    #[test]
    fn test_hole_between_operations_is_filled() {
        // Operations of length 1 on both sides leave exactly one free slot.
        let p = params(1, 1, 0);
        let mut machines = Machines::new(p.clone(), SchedulerConfig::default());
        machines.schedule(&job(0, &p, 0, 0, 0, 1)); // [0], [1]
        machines.schedule(&job(1, &p, 4, 4, 0, 1)); // [4], [5]
        let hole = job(2, &p, 2, 2, 0, 1); // [2], [3]
        let placement = machines.place_job(&hole);
        assert_eq!(placement.first().score(), Score::NeighboursOne);
        assert_eq!(placement.second().score(), Score::NeighboursOne);
        machines.commit(&placement);
        assert_eq!(machines.machines_used(), 1);
    }

    #[test]
    fn test_single_slot_holes_are_filled_flush() {
        let p = params(1, 1, 0);
        let mut machines = Machines::new(p.clone(), SchedulerConfig::default());
        machines.schedule(&job(0, &p, 0, 0, 0, 1)); // [0], [1]
        machines.schedule(&job(1, &p, 3, 3, 1, 1)); // [3], [5]

        // Start points 2 and 4 are free points with machine 0 busy on both sides.
        let placement = machines.place_job(&job(2, &p, 2, 2, 1, 1));
        assert_eq!(placement.first().score(), Score::Flush);
        assert_eq!(placement.second().score(), Score::Flush);
        assert_eq!(placement.first().machine(), MachineId::new(0));
        assert_eq!(placement.second().machine(), MachineId::new(0));
        assert_eq!(placement.first().start(), &tp(2));
        assert_eq!(placement.second().start(), &tp(4));
        assert_eq!(placement.rank(), Heuristic::Scored.max_rank());

        machines.commit(&placement);
        assert_eq!(machines.machines_used(), 1);
        assert_eq!(machines.first_tree().len(), 2);
        assert_eq!(machines.second_tree().len(), 2);
    }

    #[test]
    fn test_first_fit_takes_the_earliest_pair() {
        let p = params(2, 2, 1);
        let config = SchedulerConfig {
            heuristic: Heuristic::FirstFit,
        };
        let mut machines = Machines::new(p.clone(), config);
        let entry = machines.schedule(&job(0, &p, 3, 30, 0, 10));
        assert_eq!(entry.time1(), &tp(3));
        assert_eq!(entry.time2(), &tp(6));
    }

    #[test]
    fn test_schedules_validate() {
        let p = params(3, 2, 1);
        let jobs: Vec<_> = (0..40)
            .map(|i| job(i, &p, (i as i64 * 7) % 23, (i as i64 * 7) % 23 + 9, i as i64 % 3, 5))
            .collect();
        for heuristic in [Heuristic::Scored, Heuristic::FirstFit] {
            let mut machines = Machines::new(p.clone(), SchedulerConfig { heuristic });
            let mut schedule = Schedule::new();
            for j in &jobs {
                schedule.push(machines.schedule(j));
            }
            assert_eq!(schedule.validate(&p, &jobs), Ok(()));
            assert_eq!(schedule.machines_used(), machines.machines_used());
        }
    }

    #[test]
    fn test_big_int_times() {
        let big = BigInt::from(10).pow(40);
        let p = Parameters::new(
            TimeDelta::new(BigInt::from(2)),
            TimeDelta::new(BigInt::from(3)),
            TimeDelta::new(BigInt::from(0)),
        )
        .unwrap();
        let request = JobRequest::new(
            TimePoint::new(big.clone()),
            TimePoint::new(&big + BigInt::from(1)),
            TimeDelta::new(BigInt::from(0)),
            TimeDelta::new(BigInt::from(3)),
        );
        let j = Job::derive(JobId::new(0), &p, &request).unwrap();
        let mut machines = Machines::new(p, SchedulerConfig::default());
        let entry = machines.schedule(&j);
        assert_eq!(entry.time1().value(), &big);
        assert_eq!(entry.time2().value(), &(&big + BigInt::from(2)));
    }
}
