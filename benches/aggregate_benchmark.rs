// ========================================================================================
//
//                     TALLY WORKER-SCALING PERFORMANCE BENCHMARK
//
// ========================================================================================
//
// Measures how the fan-out/fan-in engine scales with the worker count over a
// dataset of the size the tool is built for. The interesting signal is the knee
// where rendezvous-channel handoff overhead stops paying for extra parallelism.

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::hint::black_box;

use tally::pipeline::aggregate;
use tally::types::Record;

/// The number of record pairs to aggregate per iteration.
const NUM_RECORDS: usize = 1_000_000;
/// The worker counts to sweep. This array defines the x-axis of the final plot.
const WORKER_COUNTS: [usize; 5] = [1, 2, 4, 8, 16];

fn synthetic_records(len: usize) -> Vec<Record> {
    let mut rng = StdRng::seed_from_u64(42);
    (0..len)
        .map(|_| Record::new(rng.gen_range(-100_000..100_000), rng.gen_range(-100_000..100_000)))
        .collect()
}

fn benchmark_worker_scaling(c: &mut Criterion) {
    let records = synthetic_records(NUM_RECORDS);

    let mut group = c.benchmark_group("aggregate");
    group.throughput(Throughput::Elements(NUM_RECORDS as u64));

    for workers in WORKER_COUNTS {
        group.bench_with_input(
            BenchmarkId::from_parameter(workers),
            &workers,
            |bench, &workers| {
                bench.iter(|| aggregate(black_box(&records), workers));
            },
        );
    }

    group.finish();
}

// Boilerplate to register the benchmark group with the Criterion runner.
criterion_group!(benches, benchmark_worker_scaling);
criterion_main!(benches);
