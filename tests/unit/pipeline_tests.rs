//! Engine pipeline tests over synthetic venue events.

use marketmaker_rs::engine::{
    Engine, EngineConfig, EngineEvent, EventRouter, EventRouterStd, Fill, VenueAdapter,
    VenueEvent,
};
use marketmaker_rs::types::{Order, OrderId, Price, Qty, Side, Symbol, Tick, TimestampNs, Venue};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

struct MockAdapter {
    venue: Venue,
    connected: AtomicBool,
    sent: AtomicU64,
}

impl MockAdapter {
    fn new(venue: Venue) -> Self {
        Self {
            venue,
            connected: AtomicBool::new(false),
            sent: AtomicU64::new(0),
        }
    }
}

impl VenueAdapter for MockAdapter {
    fn venue(&self) -> Venue {
        self.venue
    }

    fn connect(&self) -> bool {
        self.connected.store(true, Ordering::SeqCst);
        true
    }

    fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn subscribe_ticker(&self, _symbol: Symbol) -> bool {
        true
    }

    fn subscribe_orderbook(&self, _symbol: Symbol, _depth: usize) -> bool {
        true
    }

    fn subscribe_trades(&self, _symbol: Symbol) -> bool {
        true
    }

    fn unsubscribe(&self, _symbol: Symbol) {}

    fn send_order(&self, order: &Order) -> OrderId {
        self.sent.fetch_add(1, Ordering::SeqCst);
        order.id
    }

    fn cancel_order(&self, _order_id: OrderId, _symbol: Symbol) -> bool {
        true
    }

    fn cancel_all(&self, _symbol: Symbol) {}

    fn latency_ns(&self) -> TimestampNs {
        0
    }

    fn server_time(&self) -> TimestampNs {
        0
    }
}

fn tick(venue: Venue, bid: f64, ask: f64, sequence: u64) -> Tick {
    Tick::quote(
        venue,
        Price::from_f64(bid),
        Qty::from_f64(1.0),
        Price::from_f64(ask),
        Qty::from_f64(1.0),
        sequence,
        sequence,
        sequence,
    )
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(1));
    }
    condition()
}

#[test]
fn ticks_flow_into_quotes() {
    init_tracing();
    let mut engine = Engine::new(EngineConfig::default()).unwrap();
    let adapter = Arc::new(MockAdapter::new(Venue::Binance));
    let sender = engine.register_adapter(adapter.clone());

    let mut router = EventRouterStd::new();
    let quotes_placed = Arc::new(AtomicU64::new(0));
    let counter = Arc::clone(&quotes_placed);
    router.add_listener(Arc::new(move |event| {
        if matches!(event, EngineEvent::QuotePlaced { .. }) {
            counter.fetch_add(1, Ordering::SeqCst);
        }
    }));
    engine.set_event_publisher(router.publisher());
    let router_thread = router.start_processor();

    engine.start();
    assert!(engine.is_running());
    assert!(adapter.is_connected());

    assert!(sender.send(tick(Venue::Binance, 10_000.0, 10_001.0, 1)));

    let stats = engine.stats();
    assert!(
        wait_until(Duration::from_secs(2), || {
            stats.snapshot().quotes_emitted >= 2
        }),
        "expected a two-sided quote, stats: {:?}",
        stats.snapshot()
    );
    assert!(
        wait_until(Duration::from_secs(2), || {
            quotes_placed.load(Ordering::SeqCst) >= 2
        }),
        "expected QuotePlaced events"
    );

    engine.stop();
    assert!(!engine.is_running());

    // The processor exits once every publisher handle is gone: the
    // engine's clone goes with the engine.
    drop(engine);
    drop(router);
    router_thread.join().unwrap();
}

#[test]
fn fills_mutate_position_through_the_event_path() {
    init_tracing();
    let mut engine = Engine::new(EngineConfig::default()).unwrap();
    let _sender = engine.register_adapter(Arc::new(MockAdapter::new(Venue::Binance)));
    let symbol = engine.symbol();
    let events = engine.event_sink();
    engine.start();

    events
        .try_push(VenueEvent::Fill(Fill {
            order_id: 42,
            trade_id: 1,
            symbol,
            venue: Venue::Binance,
            side: Side::Buy,
            quantity: Qty::from_f64(0.25),
            price: Price::from_f64(10_000.0),
            timestamp: 1,
        }))
        .unwrap();

    let risk = engine.risk();
    assert!(
        wait_until(Duration::from_secs(2), || {
            risk.position_qty(symbol) == Qty::from_f64(0.25)
        }),
        "fill never reached the position book"
    );

    engine.stop();
}

#[test]
fn stale_sequences_are_dropped_by_the_book() {
    let mut engine = Engine::new(EngineConfig::default()).unwrap();
    let sender = engine.register_adapter(Arc::new(MockAdapter::new(Venue::Binance)));
    engine.start();

    assert!(sender.send(tick(Venue::Binance, 10_000.0, 10_001.0, 5)));
    let book = engine.book();
    assert!(wait_until(Duration::from_secs(2), || {
        book.nbbo().is_some()
    }));

    // Older sequence must not move the book.
    assert!(sender.send(tick(Venue::Binance, 9_000.0, 9_001.0, 4)));
    std::thread::sleep(Duration::from_millis(50));
    let nbbo = book.nbbo().unwrap();
    assert_eq!(nbbo.best_bid, Price::from_f64(10_000.0));

    engine.stop();
}

#[test]
fn kill_switch_blocks_quoting() {
    let mut engine = Engine::new(EngineConfig::default()).unwrap();
    let sender = engine.register_adapter(Arc::new(MockAdapter::new(Venue::Binance)));
    engine.risk().kill_switch().activate("test halt");
    engine.start();

    assert!(sender.send(tick(Venue::Binance, 10_000.0, 10_001.0, 1)));

    let stats = engine.stats();
    let risk = engine.risk();
    assert!(
        wait_until(Duration::from_secs(2), || risk.orders_checked() >= 1),
        "strategy cycle never ran"
    );
    assert_eq!(stats.snapshot().quotes_emitted, 0);

    engine.stop();
}

#[test]
fn stop_is_idempotent_and_drains() {
    let mut engine = Engine::new(EngineConfig::default()).unwrap();
    let sender = engine.register_adapter(Arc::new(MockAdapter::new(Venue::Binance)));
    engine.start();

    for sequence in 1..=100 {
        sender.send(tick(Venue::Binance, 10_000.0, 10_001.0, sequence));
    }
    engine.stop();
    engine.stop();
    assert!(!engine.is_running());

    // Everything pushed before shutdown was drained into the book.
    assert_eq!(engine.book().existing_venue_book(Venue::Binance).unwrap().last_sequence(), 100);
}
