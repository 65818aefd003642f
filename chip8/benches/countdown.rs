use criterion::{black_box, criterion_group, criterion_main, Criterion};

use chip8::{prelude::*, FixedClock, NoKeys, NullDisplay};

/// Counts V0 down from 255, redrawing a glyph on every iteration, then starts over.
#[rustfmt::skip]
const COUNTDOWN: &[u8] = &[
    0x60, 0xFF, // LD v0, 0xFF
    0xF0, 0x29, // LD F, v0
    0xD1, 0x25, // DRW v1, v2, 5
    0x70, 0xFF, // ADD v0, 0xFF
    0x30, 0x00, // SE v0, 0
    0x12, 0x02, // JP 0x202
    0x12, 0x00, // JP 0x200
];

fn criterion_benchmark(c: &mut Criterion) {
    {
        let mut vm = Chip8Vm::new(Chip8Conf {
            clock_frequency: Some(Hz(0)),
            rng_seed: Some(0),
        });
        vm.load_bytecode(COUNTDOWN).unwrap();
        let mut clock = FixedClock::new(0.0);

        c.bench_function("countdown bytecode", |b| {
            b.iter(|| {
                let step_count = black_box(1000_usize);
                black_box(vm.run_steps(step_count, &mut NullDisplay, &NoKeys, &mut clock))
            })
        });
    }
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
