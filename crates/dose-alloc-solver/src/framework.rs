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

use crate::{config::SchedulerConfig, machines::Machines};
use dose_alloc_core::SolverVariable;
use dose_alloc_model::prelude::*;
use tracing::{info, instrument};

/// A scheduler that places one job at a time without knowing the jobs to come.
pub trait OnlineScheduler<T>
where
    T: SolverVariable,
{
    /// Places `job` irrevocably and returns where it went.
    fn schedule(&mut self, job: &Job<T>) -> ScheduleEntry<T>;

    /// Number of machines opened so far.
    fn machines_used(&self) -> usize;
}

/// A solver that sees the whole batch of jobs before placing any of them.
pub trait OfflineSolver<T>
where
    T: SolverVariable,
{
    type SolveError;

    fn solve(
        &mut self,
        parameters: &Parameters<T>,
        jobs: &[Job<T>],
    ) -> Result<Schedule<T>, Self::SolveError>;
}

/// Runs a batch through the online scheduler in input order.
///
/// The result is validated before it is returned, so a returned schedule is
/// always feasible.
#[derive(Debug, Clone, Default)]
pub struct ReplaySolver {
    config: SchedulerConfig,
}

impl ReplaySolver {
    #[inline]
    pub fn new(config: SchedulerConfig) -> Self {
        Self { config }
    }

    #[inline]
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }
}

impl<T: SolverVariable> OfflineSolver<T> for ReplaySolver {
    type SolveError = ScheduleValidationError<T>;

    #[instrument(level = "info", skip_all, fields(jobs = jobs.len()))]
    fn solve(
        &mut self,
        parameters: &Parameters<T>,
        jobs: &[Job<T>],
    ) -> Result<Schedule<T>, Self::SolveError> {
        let mut machines = Machines::new(parameters.clone(), self.config.clone());
        let mut schedule = Schedule::with_capacity(jobs.len());
        for job in jobs {
            schedule.push(machines.schedule(job));
        }
        schedule.validate(parameters, jobs)?;
        info!(machines = schedule.machines_used(), "replayed batch");
        Ok(schedule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Heuristic;
    use dose_alloc_core::time::{TimeDelta, TimePoint};

    fn jobs(p: &Parameters<i64>) -> Vec<Job<i64>> {
        (0..25u64)
            .map(|i| {
                let start = (i as i64 * 5) % 17;
                let request = JobRequest::new(
                    TimePoint::new(start),
                    TimePoint::new(start + 6),
                    TimeDelta::new(i as i64 % 2),
                    TimeDelta::new(4),
                );
                Job::derive(JobId::new(i), p, &request).unwrap()
            })
            .collect()
    }

    #[test]
    fn test_replay_matches_online_run() {
        let p = Parameters::new(TimeDelta::new(2), TimeDelta::new(2), TimeDelta::new(0)).unwrap();
        let jobs = jobs(&p);

        let mut online = Machines::new(p.clone(), SchedulerConfig::default());
        let expected: Vec<_> = jobs.iter().map(|j| online.schedule(j)).collect();

        let schedule = ReplaySolver::default().solve(&p, &jobs).unwrap();
        assert_eq!(schedule.entries(), expected.as_slice());
        assert_eq!(schedule.machines_used(), online.machines_used());
    }

    #[test]
    fn test_replay_with_first_fit_is_valid() {
        let p = Parameters::new(TimeDelta::new(3), TimeDelta::new(1), TimeDelta::new(2)).unwrap();
        let jobs = jobs(&p);
        let mut solver = ReplaySolver::new(SchedulerConfig {
            heuristic: Heuristic::FirstFit,
        });
        let schedule = solver.solve(&p, &jobs).unwrap();
        assert_eq!(schedule.len(), jobs.len());
    }
}
