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

mod cli;

use clap::Parser;
use cli::{Args, Mode};
use dose_alloc_solver::{
    config::RunConfig,
    online::{DriverError, RunReport, run_offline, run_online},
};
use num_bigint::BigInt;
use std::{
    error::Error,
    fs::File,
    io::{self, BufRead, BufReader, BufWriter, Write},
};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn enable_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();
}

fn run<R, W>(
    input: R,
    output: W,
    mode: Mode,
    config: &RunConfig,
) -> Result<RunReport<BigInt>, DriverError<BigInt>>
where
    R: BufRead,
    W: Write,
{
    match mode {
        Mode::Online => run_online(input, output, config),
        Mode::Offline => run_offline(input, output, config),
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    enable_tracing();
    let args = Args::parse();
    let config = args.run_config();
    info!(?args, "starting");

    let output = BufWriter::new(io::stdout().lock());
    let report = match &args.input {
        Some(path) => run(BufReader::new(File::open(path)?), output, args.mode, &config)?,
        None => run(io::stdin().lock(), output, args.mode, &config)?,
    };

    if config.validate {
        eprintln!(
            "Schedule valid: {} jobs on {} machines",
            report.jobs().len(),
            report.machines_used()
        );
    }
    Ok(())
}
