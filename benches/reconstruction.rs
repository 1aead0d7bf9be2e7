//! Benchmarks for MBP-10 reconstruction performance.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use mbp_reconstructor::{Action, MboEvent, OrderBook, Reconstructor, Side};

fn create_test_events(count: usize) -> Vec<MboEvent> {
    let mut events = Vec::with_capacity(count);
    let base_price: u64 = 100_000_000_000; // $100.00

    for i in 0..count {
        let order_id = (i + 1) as u64;
        let is_bid = i % 2 == 0;
        let price_offset = ((i % 10) as u64) * 10_000_000; // $0.01 increments

        let price = if is_bid {
            base_price - price_offset
        } else {
            base_price + 10_000_000 + price_offset
        };

        let (action, id) = if i % 5 == 4 {
            // Every fifth event cancels an earlier order.
            (Action::Cancel, (i / 2 + 1) as u64)
        } else {
            (Action::Add, order_id)
        };

        events.push(MboEvent::new(
            id,
            action,
            if is_bid { Side::Bid } else { Side::Ask },
            price,
            ((i % 100) + 1) as u32,
        ));
    }

    events
}

fn bench_reconstruction(c: &mut Criterion) {
    let events = create_test_events(10_000);

    let mut group = c.benchmark_group("reconstruction");
    group.throughput(Throughput::Elements(events.len() as u64));

    group.bench_function("process_events", |b| {
        b.iter(|| {
            let mut recon = Reconstructor::new();
            for ev in &events {
                black_box(recon.process(ev));
            }
        })
    });

    group.finish();
}

fn bench_book_ops(c: &mut Criterion) {
    // Build a populated book first.
    let mut book = OrderBook::new();
    for ev in create_test_events(1_000) {
        if ev.action == Action::Add {
            book.add(&ev);
        }
    }

    let best_bid = book.best_bid().unwrap();
    let trade = MboEvent::new(0, Action::Trade, Side::Bid, best_bid, 1);
    let mut snap = mbp_reconstructor::MbpSnapshot::new();
    let ev = MboEvent::new(1, Action::Add, Side::Bid, best_bid, 1);

    let mut group = c.benchmark_group("book_ops");

    group.bench_function("depth", |b| {
        b.iter(|| black_box(book.depth(Side::Bid, best_bid)))
    });

    group.bench_function("trade_effective_side", |b| {
        b.iter(|| black_box(book.trade(&trade)))
    });

    group.bench_function("write_snapshot", |b| {
        b.iter(|| {
            book.write_snapshot(&ev, Side::Bid, &mut snap);
            black_box(&snap);
        })
    });

    group.finish();
}

criterion_group!(benches, bench_reconstruction, bench_book_ops);
criterion_main!(benches);
