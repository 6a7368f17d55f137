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

//! Line-oriented text protocol.
//!
//! ```text
//! p1
//! p2
//! gap
//! [job count]                       offline mode only
//! firstStart, firstEnd, delay, secondLength
//! ...
//! x                                 online mode terminator
//! ```
//!
//! Every value is a decimal integer of arbitrary size. Output lines read
//! `time1, machine1, time2, machine2`.

use crate::{
    err::{InputError, ParseError, ParseErrorKind},
    id::JobId,
    problem::{Job, JobRequest, Parameters},
    sol::ScheduleEntry,
};
use dose_alloc_core::{
    SolverVariable,
    time::{TimeDelta, TimePoint},
};
use std::io::{BufRead, Write};

const JOB_FIELDS: usize = 4;
const TERMINATOR: &str = "x";

/// Reads parameters and jobs from any buffered source.
#[derive(Debug)]
pub struct ProtocolReader<R> {
    reader: R,
    line: usize,
    next_id: u64,
}

impl<R: BufRead> ProtocolReader<R> {
    #[inline]
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: 0,
            next_id: 0,
        }
    }

    /// Number of lines consumed so far.
    #[inline]
    pub fn line(&self) -> usize {
        self.line
    }

    /// Next non-blank line, trimmed, or `None` at end of input.
    fn next_line(&mut self) -> Result<Option<String>, ParseError> {
        let mut buf = String::new();
        loop {
            buf.clear();
            let read = self
                .reader
                .read_line(&mut buf)
                .map_err(|e| ParseError::new(self.line + 1, ParseErrorKind::Io(e)))?;
            if read == 0 {
                return Ok(None);
            }
            self.line += 1;
            let trimmed = buf.trim();
            if !trimmed.is_empty() {
                return Ok(Some(trimmed.to_owned()));
            }
        }
    }

    fn expect_line(&mut self, expected: &'static str) -> Result<String, ParseError> {
        self.next_line()?.ok_or_else(|| {
            ParseError::new(self.line + 1, ParseErrorKind::UnexpectedEof { expected })
        })
    }

    fn parse_number<T: SolverVariable>(&self, text: &str) -> Result<T, ParseError> {
        T::from_str_radix(text, 10).map_err(|_| {
            ParseError::new(
                self.line,
                ParseErrorKind::InvalidNumber {
                    text: text.to_owned(),
                },
            )
        })
    }

    fn read_scalar<T: SolverVariable>(&mut self, expected: &'static str) -> Result<T, ParseError> {
        let line = self.expect_line(expected)?;
        self.parse_number(&line)
    }

    /// Reads the three header lines `p1`, `p2` and `gap`.
    pub fn read_parameters<T: SolverVariable>(&mut self) -> Result<Parameters<T>, InputError<T>> {
        let p1 = self.read_scalar::<T>("first operation duration")?;
        let p2 = self.read_scalar::<T>("second operation duration")?;
        let gap = self.read_scalar::<T>("gap")?;
        Ok(Parameters::new(
            TimeDelta::new(p1),
            TimeDelta::new(p2),
            TimeDelta::new(gap),
        )?)
    }

    /// Reads the job count line that precedes the jobs in offline mode.
    pub fn read_job_count(&mut self) -> Result<usize, ParseError> {
        let line = self.expect_line("job count")?;
        line.parse::<usize>().map_err(|_| {
            ParseError::new(self.line, ParseErrorKind::InvalidNumber { text: line })
        })
    }

    /// Reads the next raw job line.
    ///
    /// Returns `Ok(None)` at the `x` terminator or at the end of input.
    pub fn next_request<T: SolverVariable>(
        &mut self,
    ) -> Result<Option<JobRequest<T>>, ParseError> {
        let Some(line) = self.next_line()? else {
            return Ok(None);
        };
        if line == TERMINATOR {
            return Ok(None);
        }

        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() != JOB_FIELDS {
            return Err(ParseError::new(
                self.line,
                ParseErrorKind::FieldCount {
                    expected: JOB_FIELDS,
                    found: fields.len(),
                },
            ));
        }

        let first_start = self.parse_number::<T>(fields[0])?;
        let first_end = self.parse_number::<T>(fields[1])?;
        let delay = self.parse_number::<T>(fields[2])?;
        let second_length = self.parse_number::<T>(fields[3])?;

        Ok(Some(JobRequest::new(
            TimePoint::new(first_start),
            TimePoint::new(first_end),
            TimeDelta::new(delay),
            TimeDelta::new(second_length),
        )))
    }

    /// Reads the next job line and derives its windows.
    ///
    /// Jobs are numbered in the order they are read.
    pub fn next_job<T: SolverVariable>(
        &mut self,
        parameters: &Parameters<T>,
    ) -> Result<Option<Job<T>>, InputError<T>> {
        let Some(request) = self.next_request::<T>()? else {
            return Ok(None);
        };
        let id = JobId::new(self.next_id);
        self.next_id += 1;
        Ok(Some(Job::derive(id, parameters, &request)?))
    }
}

/// Writes schedule entries in protocol order.
#[derive(Debug)]
pub struct ProtocolWriter<W> {
    writer: W,
    machine_base: usize,
}

impl<W: Write> ProtocolWriter<W> {
    /// `machine_base` is added to every machine id on output.
    #[inline]
    pub fn new(writer: W, machine_base: usize) -> Self {
        Self {
            writer,
            machine_base,
        }
    }

    pub fn write_entry<T: SolverVariable>(
        &mut self,
        entry: &ScheduleEntry<T>,
    ) -> std::io::Result<()> {
        writeln!(
            self.writer,
            "{}, {}, {}, {}",
            entry.time1(),
            entry.machine1().value() + self.machine_base,
            entry.time2(),
            entry.machine2().value() + self.machine_base
        )
    }

    pub fn write_machine_count(&mut self, count: usize) -> std::io::Result<()> {
        writeln!(self.writer, "{count}")
    }

    #[inline]
    pub fn flush(&mut self) -> std::io::Result<()> {
        self.writer.flush()
    }

    #[inline]
    pub fn into_inner(self) -> W {
        self.writer
    }
}
