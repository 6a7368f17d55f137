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

//! Drivers that connect the line protocol to the schedulers.
//!
//! Both drivers take any [`BufRead`] source and [`Write`] sink, so the binary
//! hands them locked stdin/stdout and tests hand them byte slices.

use crate::{
    config::RunConfig,
    framework::{OfflineSolver, OnlineScheduler, ReplaySolver},
    machines::Machines,
};
use dose_alloc_core::SolverVariable;
use dose_alloc_model::prelude::*;
use std::{
    fmt::Display,
    io::{BufRead, Write},
};
use tracing::{debug, info, instrument};

#[derive(Debug)]
pub enum DriverError<T: SolverVariable> {
    Input(InputError<T>),
    Output(std::io::Error),
    Validation(ScheduleValidationError<T>),
}

impl<T: SolverVariable> Display for DriverError<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DriverError::Input(e) => write!(f, "Invalid input: {e}"),
            DriverError::Output(e) => write!(f, "Failed to write output: {e}"),
            DriverError::Validation(e) => write!(f, "Infeasible schedule: {e}"),
        }
    }
}

impl<T: SolverVariable + 'static> std::error::Error for DriverError<T> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DriverError::Input(e) => Some(e),
            DriverError::Output(e) => Some(e),
            DriverError::Validation(e) => Some(e),
        }
    }
}

impl<T: SolverVariable> From<InputError<T>> for DriverError<T> {
    fn from(value: InputError<T>) -> Self {
        DriverError::Input(value)
    }
}

impl<T: SolverVariable> From<ParseError> for DriverError<T> {
    fn from(value: ParseError) -> Self {
        DriverError::Input(InputError::Parse(value))
    }
}

impl<T: SolverVariable> From<std::io::Error> for DriverError<T> {
    fn from(value: std::io::Error) -> Self {
        DriverError::Output(value)
    }
}

impl<T: SolverVariable> From<ScheduleValidationError<T>> for DriverError<T> {
    fn from(value: ScheduleValidationError<T>) -> Self {
        DriverError::Validation(value)
    }
}

/// Everything a finished run read and produced.
#[derive(Debug, Clone)]
pub struct RunReport<T: SolverVariable> {
    parameters: Parameters<T>,
    jobs: Vec<Job<T>>,
    schedule: Schedule<T>,
}

impl<T: SolverVariable> RunReport<T> {
    #[inline]
    pub fn parameters(&self) -> &Parameters<T> {
        &self.parameters
    }

    #[inline]
    pub fn jobs(&self) -> &[Job<T>] {
        &self.jobs
    }

    #[inline]
    pub fn schedule(&self) -> &Schedule<T> {
        &self.schedule
    }

    #[inline]
    pub fn machines_used(&self) -> usize {
        self.schedule.machines_used()
    }
}

/// Reads the header, then places and prints every job as soon as it is read.
///
/// Stops at the `x` terminator or at the end of the input.
#[instrument(level = "info", skip_all)]
pub fn run_online<T, R, W>(
    input: R,
    output: W,
    config: &RunConfig,
) -> Result<RunReport<T>, DriverError<T>>
where
    T: SolverVariable,
    R: BufRead,
    W: Write,
{
    let mut reader = ProtocolReader::new(input);
    let mut writer = ProtocolWriter::new(output, config.output.machine_base);
    let parameters = reader.read_parameters::<T>()?;
    debug!(%parameters, "read parameters");

    let mut machines = Machines::new(parameters.clone(), config.scheduler.clone());
    let mut jobs = Vec::new();
    let mut schedule = Schedule::new();
    while let Some(job) = reader.next_job(&parameters)? {
        let entry = machines.schedule(&job);
        writer.write_entry(&entry)?;
        writer.flush()?;
        schedule.push(entry);
        jobs.push(job);
    }

    if config.validate {
        schedule.validate(&parameters, &jobs)?;
    }
    info!(
        jobs = jobs.len(),
        machines = machines.machines_used(),
        "online run finished"
    );
    Ok(RunReport {
        parameters,
        jobs,
        schedule,
    })
}

/// Reads the header, the job count and all jobs, then prints the schedule
/// followed by the number of machines.
pub fn run_offline<T, R, W>(
    input: R,
    output: W,
    config: &RunConfig,
) -> Result<RunReport<T>, DriverError<T>>
where
    T: SolverVariable,
    R: BufRead,
    W: Write,
{
    let mut solver = ReplaySolver::new(config.scheduler.clone());
    run_offline_with(input, output, &mut solver, config)
}

/// [`run_offline`] with a caller-supplied batch solver.
#[instrument(level = "info", skip_all)]
pub fn run_offline_with<T, R, W, S>(
    input: R,
    output: W,
    solver: &mut S,
    config: &RunConfig,
) -> Result<RunReport<T>, DriverError<T>>
where
    T: SolverVariable,
    R: BufRead,
    W: Write,
    S: OfflineSolver<T>,
    S::SolveError: Into<DriverError<T>>,
{
    let mut reader = ProtocolReader::new(input);
    let parameters = reader.read_parameters::<T>()?;
    let count = reader.read_job_count()?;
    debug!(%parameters, count, "read header");

    let mut jobs = Vec::new();
    while jobs.len() < count {
        let Some(job) = reader.next_job(&parameters)? else {
            return Err(ParseError::new(
                reader.line() + 1,
                ParseErrorKind::UnexpectedEof {
                    expected: "job line",
                },
            )
            .into());
        };
        jobs.push(job);
    }

    let schedule = solver
        .solve(&parameters, &jobs)
        .map_err(Into::<DriverError<T>>::into)?;
    if config.validate {
        schedule.validate(&parameters, &jobs)?;
    }

    let mut writer = ProtocolWriter::new(output, config.output.machine_base);
    for entry in schedule.entries() {
        writer.write_entry(entry)?;
    }
    writer.write_machine_count(schedule.machines_used())?;
    writer.flush()?;

    info!(
        jobs = jobs.len(),
        machines = schedule.machines_used(),
        "offline run finished"
    );
    Ok(RunReport {
        parameters,
        jobs,
        schedule,
    })
}
