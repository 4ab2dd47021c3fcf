//! Benchmarks for MNA matrix operations.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use eddsim_core::{DeviceStamps, MnaSystem};

fn bench_stamp_conductance(c: &mut Criterion) {
    c.bench_function("stamp_conductance_10x10", |b| {
        let mut mna = MnaSystem::new(10, 0);
        b.iter(|| {
            mna.clear();
            for i in 0..9 {
                mna.stamp_conductance(Some(i), Some(i + 1), black_box(0.001));
            }
        });
    });
}

fn bench_scatter_device(c: &mut Criterion) {
    c.bench_function("scatter_8_port_device", |b| {
        let mut stamps = DeviceStamps::alloc_mna(8);
        for r in 0..8 {
            for col in 0..8 {
                stamps.set_y(r, col, (r * 8 + col) as f64 * 1e-3);
            }
        }
        let nodes: Vec<Option<usize>> = (0..8).map(|p| if p % 2 == 1 { None } else { Some(p) }).collect();
        let mut mna = MnaSystem::new(8, 0);
        b.iter(|| {
            mna.clear();
            stamps.scatter_into(black_box(&nodes), &mut mna);
        });
    });
}

criterion_group!(benches, bench_stamp_conductance, bench_scatter_device);
criterion_main!(benches);
