//! # Drive Cycle Benchmark

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};

use sumo_lib::exec::{ExecParams, SumoExec};

/// Cycle period used by the executable.
const CYCLE_PERIOD_MS: u64 = 10;

/// Build an executive which is past the start signal and cruising.
fn running_exec() -> SumoExec {
    let mut exec = SumoExec::new(&ExecParams::default(), CYCLE_PERIOD_MS);

    // Default start delay is 500 ms
    for _ in 0..60 {
        exec.cycle().unwrap();
    }

    exec
}

fn drive_cycle_benchmark(c: &mut Criterion) {
    c.bench_function("single drive cycle", |b| {
        b.iter_batched_ref(
            running_exec,
            |exec| exec.cycle().unwrap(),
            BatchSize::SmallInput
        )
    });

    c.bench_function("one second of cycles", |b| {
        b.iter_batched_ref(
            running_exec,
            |exec| {
                for _ in 0..100 {
                    exec.cycle().unwrap();
                }
            },
            BatchSize::SmallInput
        )
    });
}

criterion_group!(benches, drive_cycle_benchmark);
criterion_main!(benches);
