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

use dose_alloc_core::{
    SolverVariable,
    time::{TimeDelta, TimePoint},
};
use dose_alloc_model::{
    id::JobId,
    problem::{Job, JobRequest, Parameters},
    sol::Schedule,
};
use dose_alloc_solver::{
    config::{Heuristic, SchedulerConfig},
    framework::OnlineScheduler,
    machines::Machines,
    tree::RangeTree,
};
use num_bigint::BigInt;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

struct Workload<T: SolverVariable> {
    parameters: Parameters<T>,
    jobs: Vec<Job<T>>,
}

/// Random jobs with windows between tight and loose. Points go through
/// `point`, durations through `delta`.
fn workload<T, P, D>(seed: u64, count: usize, point: P, delta: D) -> Workload<T>
where
    T: SolverVariable,
    P: Fn(i64) -> T,
    D: Fn(i64) -> T,
{
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let p1: i64 = rng.random_range(1..6);
    let p2: i64 = rng.random_range(1..6);
    let gap: i64 = rng.random_range(0..4);
    let parameters = Parameters::new(
        TimeDelta::new(delta(p1)),
        TimeDelta::new(delta(p2)),
        TimeDelta::new(delta(gap)),
    )
    .expect("positive durations");

    let mut clock = 0i64;
    let jobs = (0..count)
        .map(|i| {
            clock += rng.random_range(0..4);
            let first_end = clock + p1 - 1 + rng.random_range(0..12);
            let request = JobRequest::new(
                TimePoint::new(point(clock)),
                TimePoint::new(point(first_end)),
                TimeDelta::new(delta(rng.random_range(0..6))),
                TimeDelta::new(delta(p2 + rng.random_range(0..10))),
            );
            Job::derive(JobId::new(i as u64), &parameters, &request).expect("valid job")
        })
        .collect();
    Workload { parameters, jobs }
}

fn run<T: SolverVariable>(
    workload: &Workload<T>,
    heuristic: Heuristic,
) -> (Machines<T>, Schedule<T>) {
    let mut machines = Machines::new(
        workload.parameters.clone(),
        SchedulerConfig { heuristic },
    );
    let mut schedule = Schedule::new();
    for job in &workload.jobs {
        schedule.push(machines.schedule(job));
    }
    (machines, schedule)
}

fn assert_trees_sound<T: SolverVariable>(machines: &Machines<T>) {
    for tree in [machines.first_tree(), machines.second_tree()] {
        assert_eq!(tree.check_invariants(), Ok(()));
        let rebuilt = RangeTree::from_ranges(tree.ranges());
        assert_eq!(&rebuilt, tree);
    }
}

#[test]
fn random_workloads_produce_feasible_schedules() {
    for seed in 0..20 {
        let w = workload(seed, 150, |v| v, |v| v);
        for heuristic in [Heuristic::Scored, Heuristic::FirstFit] {
            let (machines, schedule) = run(&w, heuristic);
            assert_eq!(schedule.validate(&w.parameters, &w.jobs), Ok(()), "seed {seed}");
            assert_eq!(schedule.machines_used(), machines.machines_used());
            assert_trees_sound(&machines);
        }
    }
}

#[test]
fn machine_ids_are_dense() {
    let w = workload(3, 300, |v| v, |v| v);
    let (machines, schedule) = run(&w, Heuristic::Scored);
    let mut seen = vec![false; machines.machines_used()];
    for entry in schedule.entries() {
        seen[entry.machine1().value()] = true;
        seen[entry.machine2().value()] = true;
    }
    assert!(seen.into_iter().all(|s| s));
}

#[test]
fn cursor_goes_stale_after_commit() {
    let w = workload(11, 2, |v| v, |v| v);
    let mut machines = Machines::new(w.parameters.clone(), SchedulerConfig::default());
    machines.schedule(&w.jobs[0]);

    let zero = TimePoint::new(0i64);
    let mut cursor = machines.first_tree().cursor_overlapping(&zero, None);
    assert!(cursor.next(machines.first_tree()).unwrap().is_some());

    machines.schedule(&w.jobs[1]);
    assert!(cursor.next(machines.first_tree()).is_err());
    cursor.restart(machines.first_tree());
    let mut count = 0;
    while cursor.next(machines.first_tree()).unwrap().is_some() {
        count += 1;
    }
    assert_eq!(count, machines.first_tree().len());
}

#[test]
fn big_int_matches_i64_shifted() {
    let offset = BigInt::from(10).pow(35);
    for seed in 40..45 {
        let small = workload(seed, 120, |v| v, |v| v);
        let big = workload(
            seed,
            120,
            |v| &offset + BigInt::from(v),
            BigInt::from,
        );
        let (small_machines, small_schedule) = run(&small, Heuristic::Scored);
        let (big_machines, big_schedule) = run(&big, Heuristic::Scored);

        assert_eq!(big_schedule.validate(&big.parameters, &big.jobs), Ok(()));
        assert_eq!(small_machines.machines_used(), big_machines.machines_used());
        for (a, b) in small_schedule.entries().iter().zip(big_schedule.entries()) {
            assert_eq!(a.machine1(), b.machine1());
            assert_eq!(a.machine2(), b.machine2());
            assert_eq!(&(&offset + BigInt::from(*a.time1().value())), b.time1().value());
            assert_eq!(&(&offset + BigInt::from(*a.time2().value())), b.time2().value());
        }
    }
}
