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

use clap::{Parser, ValueEnum};
use dose_alloc_solver::config::{Heuristic, OutputConfig, RunConfig, SchedulerConfig};
use std::path::PathBuf;

const APP_NAME: &str = env!("CARGO_PKG_NAME");
const AUTHOR: &str = env!("CARGO_PKG_AUTHORS");
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Place and print every job as soon as it is read
    Online,
    /// Read a counted batch, print the schedule and the machine count
    Offline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum HeuristicArg {
    Scored,
    FirstFit,
}

impl From<HeuristicArg> for Heuristic {
    fn from(value: HeuristicArg) -> Self {
        match value {
            HeuristicArg::Scored => Heuristic::Scored,
            HeuristicArg::FirstFit => Heuristic::FirstFit,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = APP_NAME)]
#[command(version = VERSION)]
#[command(author = AUTHOR)]
#[command(about = "Online two-stage job scheduler on identical machines", long_about = None)]
pub struct Args {
    /// How jobs are read and results written
    #[arg(short, long, value_enum, default_value_t = Mode::Online)]
    pub mode: Mode,

    /// Ranking of candidate placements
    #[arg(long, value_enum, default_value_t = HeuristicArg::Scored)]
    pub heuristic: HeuristicArg,

    /// Number machines from 1 instead of 0 in the output
    #[arg(long)]
    pub one_based: bool,

    /// Read from this file instead of stdin
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Check the finished schedule and report the result on stderr
    #[arg(long)]
    pub validate: bool,
}

impl Args {
    pub fn run_config(&self) -> RunConfig {
        RunConfig {
            scheduler: SchedulerConfig {
                heuristic: self.heuristic.into(),
            },
            output: OutputConfig {
                machine_base: usize::from(self.one_based),
            },
            validate: self.validate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["dose-alloc"]);
        assert_eq!(args.mode, Mode::Online);
        assert_eq!(args.run_config(), RunConfig::default());
    }

    #[test]
    fn test_flags_map_to_config() {
        let args = Args::parse_from([
            "dose-alloc",
            "--mode",
            "offline",
            "--heuristic",
            "first-fit",
            "--one-based",
            "--validate",
        ]);
        let config = args.run_config();
        assert_eq!(args.mode, Mode::Offline);
        assert_eq!(config.scheduler.heuristic, Heuristic::FirstFit);
        assert_eq!(config.output.machine_base, 1);
        assert!(config.validate);
    }
}
