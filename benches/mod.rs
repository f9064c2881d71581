use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use marketmaker_rs::book::{ConsolidatedBook, VenueBook};
use marketmaker_rs::queue::SpscQueue;
use marketmaker_rs::strategy::{BasicQuoter, MarketMakerParams, MarketSignal, Quoter};
use marketmaker_rs::types::{Price, Qty, Side, Symbol, Tick, Venue};

fn bench_book_updates(c: &mut Criterion) {
    let book = VenueBook::new(Symbol::new("BTCUSDT"), Venue::Binance);
    let mut price = 10_000i64;

    c.bench_function("book_update_bid", |b| {
        b.iter(|| {
            price = 9_990 + (price + 1) % 20;
            book.update_bid(
                black_box(Price::from_f64(price as f64)),
                black_box(Qty::from_f64(1.0)),
            );
        })
    });

    c.bench_function("book_best_and_mid", |b| {
        book.update_bid(Price::from_f64(10_000.0), Qty::from_f64(1.0));
        book.update_ask(Price::from_f64(10_001.0), Qty::from_f64(1.0));
        b.iter(|| {
            black_box(book.best_bid());
            black_box(book.best_ask());
            black_box(book.mid_price());
        })
    });

    c.bench_function("book_vwap_5_levels", |b| {
        for i in 0..5 {
            book.update_ask(
                Price::from_f64(10_001.0 + i as f64),
                Qty::from_f64(1.0),
            );
        }
        b.iter(|| black_box(book.vwap(Side::Buy, Qty::from_f64(3.5))))
    });
}

fn bench_tick_to_quote(c: &mut Criterion) {
    let book = ConsolidatedBook::new(Symbol::new("BTCUSDT"));
    let mut quoter = Quoter::Basic(BasicQuoter::new(MarketMakerParams {
        // No hysteresis so every iteration walks the full quote path.
        min_quote_life_us: 0,
        ..MarketMakerParams::default()
    }));
    let signal = MarketSignal::flat();
    let mut sequence = 0u64;

    c.bench_function("tick_apply_and_quote", |b| {
        b.iter(|| {
            sequence += 1;
            let tick = Tick::quote(
                Venue::Binance,
                Price::from_f64(10_000.0 + (sequence % 7) as f64 * 0.5),
                Qty::from_f64(1.0),
                Price::from_f64(10_001.0 + (sequence % 7) as f64 * 0.5),
                Qty::from_f64(1.0),
                sequence,
                sequence,
                sequence,
            );
            book.apply_tick(black_box(&tick));
            black_box(quoter.compute_quotes(&book, Qty::ZERO, &signal, sequence * 1_000));
        })
    });
}

fn bench_spsc_queue(c: &mut Criterion) {
    let queue: SpscQueue<u64, 1024> = SpscQueue::new();

    c.bench_function("spsc_push_pop", |b| {
        b.iter(|| {
            let _ = queue.try_push(black_box(42));
            black_box(queue.try_pop());
        })
    });
}

criterion_group!(
    benches,
    bench_book_updates,
    bench_tick_to_quote,
    bench_spsc_queue
);
criterion_main!(benches);
