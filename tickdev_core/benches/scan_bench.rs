//! Scan and render hot-path benchmarks

use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use tickdev_core::render::render_report;
use tickdev_core::state::TimerShared;

/// Benchmark the non-zero byte scan over different logical sizes
fn bench_scan(c: &mut Criterion) {
    let mut state = TimerShared::new();
    for (i, byte) in state.data.iter_mut().enumerate() {
        *byte = if i % 3 == 0 { 0 } else { b'x' };
    }

    state.size = 64;
    c.bench_function("scan_64_bytes", |b| {
        b.iter(|| {
            black_box(state.count_nonzero());
        });
    });

    state.size = state.data.len();
    c.bench_function("scan_full_buffer", |b| {
        b.iter(|| {
            black_box(state.count_nonzero());
        });
    });
}

/// Benchmark report rendering with an ASCII and a worst-case buffer
fn bench_render(c: &mut Criterion) {
    let mut state = TimerShared::new();
    state.data.fill(b'a');
    state.size = state.data.len();
    state.tick_count = 12345;
    state.char_count = 1024;

    c.bench_function("render_ascii_full", |b| {
        b.iter(|| {
            let report = render_report(black_box(&state));
            black_box(report.len());
        });
    });

    // Worst case: every byte expands to a replacement character.
    state.data.fill(0xff);
    c.bench_function("render_lossy_full", |b| {
        b.iter(|| {
            let report = render_report(black_box(&state));
            black_box(report.len());
        });
    });
}

criterion_group!(benches, bench_scan, bench_render);
criterion_main!(benches);
