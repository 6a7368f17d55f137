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
        MachineOverlapError, ScheduleValidationError, UnknownJobError, WindowKind,
        WindowViolationError,
    },
    id::{JobId, MachineId},
    problem::{Job, Parameters},
};
use dose_alloc_core::{
    SolverVariable,
    time::{TimePoint, TimeSpan},
};
use std::{collections::HashMap, fmt::Display};

/// The irrevocable placement of one job.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScheduleEntry<T: SolverVariable> {
    job: JobId,
    machine1: MachineId,
    time1: TimePoint<T>,
    machine2: MachineId,
    time2: TimePoint<T>,
}

impl<T: SolverVariable> ScheduleEntry<T> {
    #[inline]
    pub fn new(
        job: JobId,
        machine1: MachineId,
        time1: TimePoint<T>,
        machine2: MachineId,
        time2: TimePoint<T>,
    ) -> Self {
        Self {
            job,
            machine1,
            time1,
            machine2,
            time2,
        }
    }

    #[inline]
    pub fn job(&self) -> JobId {
        self.job
    }

    #[inline]
    pub fn machine1(&self) -> MachineId {
        self.machine1
    }

    #[inline]
    pub fn time1(&self) -> &TimePoint<T> {
        &self.time1
    }

    #[inline]
    pub fn machine2(&self) -> MachineId {
        self.machine2
    }

    #[inline]
    pub fn time2(&self) -> &TimePoint<T> {
        &self.time2
    }
}

impl<T: SolverVariable> Display for ScheduleEntry<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: first at {} on {}, second at {} on {}",
            self.job, self.time1, self.machine1, self.time2, self.machine2
        )
    }
}

/// All entries produced in one run, in commit order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule<T: SolverVariable> {
    entries: Vec<ScheduleEntry<T>>,
    machines_used: usize,
}

impl<T: SolverVariable> Default for Schedule<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: SolverVariable> Schedule<T> {
    #[inline]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            machines_used: 0,
        }
    }

    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            machines_used: 0,
        }
    }

    pub fn push(&mut self, entry: ScheduleEntry<T>) {
        let highest = entry.machine1.value().max(entry.machine2.value());
        self.machines_used = self.machines_used.max(highest + 1);
        self.entries.push(entry);
    }

    #[inline]
    pub fn entries(&self) -> &[ScheduleEntry<T>] {
        &self.entries
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of distinct machines the schedule needs, assuming dense ids.
    #[inline]
    pub fn machines_used(&self) -> usize {
        self.machines_used
    }

    /// Checks that every entry respects its job's windows and that no two
    /// operations overlap on the same machine.
    pub fn validate(
        &self,
        parameters: &Parameters<T>,
        jobs: &[Job<T>],
    ) -> Result<(), ScheduleValidationError<T>> {
        let by_id: HashMap<JobId, &Job<T>> = jobs.iter().map(|j| (j.id(), j)).collect();
        let mut per_machine: HashMap<MachineId, Vec<(JobId, TimeSpan<T>)>> = HashMap::new();

        for entry in &self.entries {
            let job = by_id.get(&entry.job).ok_or_else(|| {
                ScheduleValidationError::UnknownJob(UnknownJobError::new(entry.job))
            })?;

            if !job.first_start_window().contains(&entry.time1) {
                return Err(ScheduleValidationError::WindowViolation(
                    WindowViolationError::new(
                        entry.job,
                        WindowKind::FirstStart,
                        entry.time1.value().clone(),
                        job.first_start_window().clone(),
                    ),
                ));
            }

            let second_window = job.second_start_window_for(&entry.time1);
            if !second_window.contains(&entry.time2) {
                return Err(ScheduleValidationError::WindowViolation(
                    WindowViolationError::new(
                        entry.job,
                        WindowKind::Gap,
                        entry.time2.value().clone(),
                        second_window,
                    ),
                ));
            }

            let first_span = entry
                .time1
                .span_of(parameters.first_duration())
                .expect("durations are positive");
            let second_span = entry
                .time2
                .span_of(parameters.second_duration())
                .expect("durations are positive");
            per_machine
                .entry(entry.machine1)
                .or_default()
                .push((entry.job, first_span));
            per_machine
                .entry(entry.machine2)
                .or_default()
                .push((entry.job, second_span));
        }

        for (machine, mut spans) in per_machine {
            spans.sort_by(|a, b| a.1.start().cmp(b.1.start()));
            let mut reach: Option<&(JobId, TimeSpan<T>)> = None;
            for cur in &spans {
                if let Some(prev) = reach {
                    if prev.1.overlaps(&cur.1) {
                        return Err(ScheduleValidationError::Overlap(MachineOverlapError::new(
                            machine,
                            prev.clone(),
                            cur.clone(),
                        )));
                    }
                    if cur.1.end() > prev.1.end() {
                        reach = Some(cur);
                    }
                } else {
                    reach = Some(cur);
                }
            }
        }

        Ok(())
    }
}

impl<T: SolverVariable> Display for Schedule<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Schedule ({} machines):", self.machines_used)?;
        for entry in &self.entries {
            writeln!(f, "  {entry}")?;
        }
        Ok(())
    }
}
