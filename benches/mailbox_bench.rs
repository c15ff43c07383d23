/* Mailbox contention: publish/take on one thread, and take latency while a
background thread overwrites the slot as fast as it can. */
use criterion::{Criterion, criterion_group, criterion_main};
use std::{
    hint::black_box,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::Duration,
};

use tm_telemetry::{producer::synthetic_frame, stream::mailbox::Mailbox};

fn bench_publish_take(c: &mut Criterion) {
    let mailbox = Mailbox::new();
    let frame = synthetic_frame(7);

    c.bench_function("mailbox_publish_take", |b| {
        b.iter(|| {
            mailbox.publish(black_box(frame));
            black_box(mailbox.take())
        })
    });
}

fn bench_take_under_contention(c: &mut Criterion) {
    let mailbox = Arc::new(Mailbox::new());
    let running = Arc::new(AtomicBool::new(true));

    let writer = {
        let mailbox = mailbox.clone();
        let running = running.clone();
        thread::spawn(move || {
            let mut seq = 0u64;
            while running.load(Ordering::Relaxed) {
                mailbox.publish(synthetic_frame(seq));
                seq = seq.wrapping_add(1);
            }
        })
    };

    c.bench_function("mailbox_wait_take_contended", |b| {
        b.iter(|| black_box(mailbox.wait_take(Duration::from_millis(1))))
    });

    running.store(false, Ordering::Relaxed);
    let _ = writer.join();
}

criterion_group!(benches, bench_publish_take, bench_take_under_contention);
criterion_main!(benches);
