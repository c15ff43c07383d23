/* Measures the cost of turning raw socket reads into frames: a single decode,
and a 64-frame burst fed through the reassembler in different chunk sizes. */
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use tm_telemetry::{
    Frame,
    producer::synthetic_frame,
    stream::reassembler::Reassembler,
};

const BURST: u64 = 64;

fn bench_decode(c: &mut Criterion) {
    let bytes = synthetic_frame(42).encode();

    c.bench_function("frame_decode", |b| {
        b.iter(|| {
            let frame = Frame::decode(black_box(&bytes));
            black_box(frame)
        })
    });
}

fn bench_reassembly(c: &mut Criterion) {
    let wire: Vec<u8> = (0..BURST).flat_map(|seq| synthetic_frame(seq).encode()).collect();
    let mut group = c.benchmark_group("reassemble_burst");

    for chunk in [1usize, 38, 76, 1500, 4096] {
        group.bench_with_input(BenchmarkId::from_parameter(chunk), &chunk, |b, &chunk| {
            let mut reassembler = Reassembler::new();
            b.iter(|| {
                let mut frames = 0usize;
                for piece in wire.chunks(chunk) {
                    reassembler.feed(black_box(piece), |decoded| {
                        if let Ok(frame) = decoded {
                            black_box(frame);
                            frames += 1;
                        }
                    });
                }
                frames
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_decode, bench_reassembly);
criterion_main!(benches);
