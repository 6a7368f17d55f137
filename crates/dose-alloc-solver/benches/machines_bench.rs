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

use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use dose_alloc_core::time::{TimeDelta, TimePoint};
use dose_alloc_model::{
    id::JobId,
    problem::{Job, JobRequest, Parameters},
};
use dose_alloc_solver::{
    config::{Heuristic, SchedulerConfig},
    framework::OnlineScheduler,
    machines::Machines,
};
use rand::{Rng, SeedableRng, rngs::StdRng};
use std::hint::black_box;

type T = i64;

fn parameters() -> Parameters<T> {
    Parameters::new(TimeDelta::new(3), TimeDelta::new(2), TimeDelta::new(1))
        .expect("valid parameters")
}

// Jobs arriving roughly in time order with loose windows.
fn gen_jobs(params: &Parameters<T>, count: usize, seed: u64) -> Vec<Job<T>> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut clock: T = 0;
    (0..count)
        .map(|i| {
            clock += rng.random_range(0..3);
            let slack: T = rng.random_range(3..30);
            let request = JobRequest::new(
                TimePoint::new(clock),
                TimePoint::new(clock + slack),
                TimeDelta::new(rng.random_range(0..5)),
                TimeDelta::new(rng.random_range(2..20)),
            );
            Job::derive(JobId::new(i as u64), params, &request).expect("valid job")
        })
        .collect()
}

fn bench_schedule(c: &mut Criterion) {
    let params = parameters();
    let mut group = c.benchmark_group("machines_schedule");
    for &count in &[100usize, 1_000, 5_000] {
        let jobs = gen_jobs(&params, count, 42);
        for heuristic in [Heuristic::Scored, Heuristic::FirstFit] {
            group.bench_function(format!("{}_{}", heuristic, count), |b| {
                b.iter_batched(
                    || Machines::new(params.clone(), SchedulerConfig { heuristic }),
                    |mut machines| {
                        for job in &jobs {
                            black_box(machines.schedule(job));
                        }
                        black_box(machines.machines_used())
                    },
                    BatchSize::SmallInput,
                )
            });
        }
    }
    group.finish();
}

fn bench_place_job(c: &mut Criterion) {
    let params = parameters();
    let jobs = gen_jobs(&params, 2_000, 7);
    let mut machines = Machines::new(params.clone(), SchedulerConfig::default());
    for job in &jobs {
        machines.schedule(job);
    }
    let probes = gen_jobs(&params, 200, 8);

    c.bench_function("machines_place_job_loaded", |b| {
        b.iter(|| {
            for job in &probes {
                black_box(machines.place_job(job));
            }
        })
    });
}

criterion_group!(benches, bench_schedule, bench_place_job);
criterion_main!(benches);
