//! The feed → book/strategy → risk → order pipeline.
//!
//! Two engine-owned threads run the trading loop:
//!
//! - the strategy thread drains every venue's tick ring into the
//!   consolidated book, evaluates the quoter, risk-checks the resulting
//!   intents, and enqueues accepted orders;
//! - the order thread drains the order queue to the venue adapters and
//!   consumes execution reports, mutating position and open-order state.
//!
//! Venue adapter threads are external: each one owns the producer side of
//! its venue's tick ring and pushes everything else onto the shared event
//! queue. Cancellation is cooperative through an atomic `running` flag;
//! on shutdown each queue is drained to completion unless a hard abort
//! was requested.

use super::adapter::VenueAdapter;
use super::config::{EngineConfig, StrategyKind};
use super::events::{EngineEvent, Fill, OrderCommand, VenueEvent};
use super::stats::EngineStats;
use crate::book::{ArbitrageDetector, ConsolidatedBook};
use crate::queue::{MpmcQueue, SpscQueue};
use crate::risk::RiskGate;
use crate::strategy::{
    AsQuoter, BasicQuoter, InventoryQuoter, MarketSignal, Quoter,
};
use crate::types::{Order, OrderStatus, Price, Qty, Side, Symbol, Tick, TimeInForce, Venue};
use crate::utils::current_time_nanos;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Per-venue tick ring capacity. Compile-time sized; the configurable
/// capacities in [`QueueConfig`](super::QueueConfig) govern the shared
/// runtime queues.
const TICK_QUEUE_CAPACITY: usize = 4_096;

/// Producer handle for one venue's tick ring.
///
/// Single-producer: exactly one adapter feed thread may hold and use a
/// given sender. A full ring drops the tick and counts it; market data is
/// overwritten by the next update anyway.
pub struct TickSender {
    queue: Arc<SpscQueue<Tick, TICK_QUEUE_CAPACITY>>,
    stats: Arc<EngineStats>,
}

impl TickSender {
    /// Push a tick; returns `false` when the ring was full.
    pub fn send(&self, tick: Tick) -> bool {
        match self.queue.try_push(tick) {
            Ok(()) => true,
            Err(_) => {
                self.stats.queue_dropped();
                false
            }
        }
    }
}

type EventPublisher = Arc<dyn Fn(EngineEvent) + Send + Sync>;

/// The assembled trading engine for one symbol.
pub struct Engine {
    config: EngineConfig,
    session_id: Uuid,
    symbol: Symbol,
    book: Arc<ConsolidatedBook>,
    risk: Arc<RiskGate>,
    quoter: Arc<Mutex<Quoter>>,
    signal: Arc<Mutex<MarketSignal>>,
    adapters: Vec<Arc<dyn VenueAdapter>>,
    tick_queues: Vec<(Venue, Arc<SpscQueue<Tick, TICK_QUEUE_CAPACITY>>)>,
    events: Arc<MpmcQueue<VenueEvent>>,
    orders: Arc<MpmcQueue<OrderCommand>>,
    running: Arc<AtomicBool>,
    hard_abort: Arc<AtomicBool>,
    stats: Arc<EngineStats>,
    publish: EventPublisher,
    next_order_id: Arc<AtomicU64>,
    threads: Vec<JoinHandle<()>>,
}

impl Engine {
    /// Build an engine from a validated configuration.
    pub fn new(config: EngineConfig) -> Result<Self, super::config::ConfigError> {
        config.validate()?;

        let symbol = config.trading.symbol;
        let quoter = build_quoter(&config);

        Ok(Self {
            session_id: Uuid::new_v4(),
            symbol,
            book: Arc::new(ConsolidatedBook::new(symbol)),
            risk: Arc::new(RiskGate::new(config.risk.clone())),
            quoter: Arc::new(Mutex::new(quoter)),
            signal: Arc::new(Mutex::new(MarketSignal::flat())),
            adapters: Vec::new(),
            tick_queues: Vec::new(),
            events: Arc::new(MpmcQueue::with_capacity(config.queues.event_queue_capacity)),
            orders: Arc::new(MpmcQueue::with_capacity(config.queues.order_queue_capacity)),
            running: Arc::new(AtomicBool::new(false)),
            hard_abort: Arc::new(AtomicBool::new(false)),
            stats: Arc::new(EngineStats::new()),
            publish: Arc::new(|_event| {}),
            next_order_id: Arc::new(AtomicU64::new(1)),
            threads: Vec::new(),
            config,
        })
    }

    #[must_use]
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    #[must_use]
    pub fn symbol(&self) -> Symbol {
        self.symbol
    }

    /// The consolidated book the strategy reads.
    #[must_use]
    pub fn book(&self) -> Arc<ConsolidatedBook> {
        Arc::clone(&self.book)
    }

    /// The risk gate, including positions and the kill switch.
    #[must_use]
    pub fn risk(&self) -> Arc<RiskGate> {
        Arc::clone(&self.risk)
    }

    #[must_use]
    pub fn stats(&self) -> Arc<EngineStats> {
        Arc::clone(&self.stats)
    }

    /// Queue handle adapters use for fills, order updates, and
    /// connectivity events.
    #[must_use]
    pub fn event_sink(&self) -> Arc<MpmcQueue<VenueEvent>> {
        Arc::clone(&self.events)
    }

    /// Route monitoring events to `publisher` (see
    /// [`EventRouter::publisher`](super::EventRouter::publisher)).
    ///
    /// Must be called before [`Engine::start`].
    pub fn set_event_publisher(&mut self, publisher: EventPublisher) {
        self.publish = publisher;
    }

    /// Update the signal inputs the quoter sees on its next cycle.
    pub fn set_signal(&self, signal: MarketSignal) {
        if let Ok(mut slot) = self.signal.lock() {
            *slot = signal;
        }
    }

    /// Register a venue adapter and hand back the producer side of its
    /// tick ring.
    ///
    /// Must be called before [`Engine::start`]. The first registered
    /// adapter's venue is where quotes are posted.
    pub fn register_adapter(&mut self, adapter: Arc<dyn VenueAdapter>) -> TickSender {
        let venue = adapter.venue();
        let queue: Arc<SpscQueue<Tick, TICK_QUEUE_CAPACITY>> = Arc::new(SpscQueue::new());
        // Create the venue book eagerly so readers see the venue as
        // active from the first tick.
        let _ = self.book.venue_book(venue);
        self.tick_queues.push((venue, Arc::clone(&queue)));
        self.adapters.push(adapter);
        info!("registered adapter for {}", venue);

        TickSender {
            queue,
            stats: Arc::clone(&self.stats),
        }
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Connect adapters, subscribe the symbol, and spawn the trading
    /// threads. Idempotent: a second call while running is a no-op.
    pub fn start(&mut self) {
        if self.running.swap(true, Ordering::AcqRel) {
            return;
        }
        self.hard_abort.store(false, Ordering::Release);
        info!("engine session {} starting for {}", self.session_id, self.symbol);
        emit(&self.publish, EngineEvent::Started {
            session_id: self.session_id,
        });

        for adapter in &self.adapters {
            if adapter.connect() {
                adapter.subscribe_ticker(self.symbol);
                emit(&self.publish, EngineEvent::VenueConnected(adapter.venue()));
            } else {
                warn!("adapter for {} failed to connect", adapter.venue());
            }
        }

        self.spawn_strategy_thread();
        self.spawn_order_thread();
    }

    /// Cooperative shutdown: clears the running flag, lets both threads
    /// drain their queues, then joins them and disconnects the adapters.
    pub fn stop(&mut self) {
        self.shutdown(false);
    }

    /// Hard abort: threads exit at the next poll without draining.
    pub fn abort(&mut self) {
        self.shutdown(true);
    }

    fn shutdown(&mut self, hard: bool) {
        if !self.running.swap(false, Ordering::AcqRel) && self.threads.is_empty() {
            return;
        }
        if hard {
            self.hard_abort.store(true, Ordering::Release);
        }

        for handle in self.threads.drain(..) {
            if handle.join().is_err() {
                error!("engine thread panicked during shutdown");
            }
        }
        for adapter in &self.adapters {
            adapter.disconnect();
        }

        info!("engine session {} stopped", self.session_id);
        emit(&self.publish, EngineEvent::Stopped {
            session_id: self.session_id,
        });
    }

    fn spawn_strategy_thread(&mut self) {
        let book = Arc::clone(&self.book);
        let risk = Arc::clone(&self.risk);
        let quoter = Arc::clone(&self.quoter);
        let signal = Arc::clone(&self.signal);
        let orders = Arc::clone(&self.orders);
        let running = Arc::clone(&self.running);
        let hard_abort = Arc::clone(&self.hard_abort);
        let stats = Arc::clone(&self.stats);
        let publish = Arc::clone(&self.publish);
        let next_order_id = Arc::clone(&self.next_order_id);
        let tick_queues = self.tick_queues.clone();
        let detector = ArbitrageDetector::new(self.config.arbitrage.clone());
        let trading = self.config.trading.clone();
        let symbol = self.symbol;
        let quote_venue = self
            .adapters
            .first()
            .map(|a| a.venue())
            .unwrap_or(Venue::Unknown);

        let handle = std::thread::Builder::new()
            .name("mm-strategy".to_string())
            .spawn(move || {
                loop {
                    if hard_abort.load(Ordering::Acquire) {
                        break;
                    }
                    let draining = !running.load(Ordering::Acquire);

                    let mut processed = 0usize;
                    for (_, queue) in &tick_queues {
                        while let Some(tick) = queue.try_pop() {
                            if book.apply_tick(&tick) {
                                stats.tick_processed();
                            }
                            processed += 1;
                        }
                    }

                    if processed > 0 && !draining {
                        quote_cycle(
                            symbol,
                            quote_venue,
                            &trading,
                            &book,
                            &risk,
                            &quoter,
                            &signal,
                            &orders,
                            &stats,
                            &publish,
                            &next_order_id,
                        );
                        if let Some(opportunity) =
                            detector.find_actionable(&book, current_time_nanos())
                        {
                            stats.arbitrage_found();
                            emit(&publish, EngineEvent::ArbitrageDetected(opportunity));
                        }
                    }

                    if draining {
                        if processed == 0 {
                            break;
                        }
                    } else if processed == 0 {
                        std::thread::yield_now();
                    }
                }
            })
            .expect("failed to spawn strategy thread");
        self.threads.push(handle);
    }

    fn spawn_order_thread(&mut self) {
        let risk = Arc::clone(&self.risk);
        let quoter = Arc::clone(&self.quoter);
        let orders = Arc::clone(&self.orders);
        let events = Arc::clone(&self.events);
        let running = Arc::clone(&self.running);
        let hard_abort = Arc::clone(&self.hard_abort);
        let stats = Arc::clone(&self.stats);
        let publish = Arc::clone(&self.publish);
        let adapters = self.adapters.clone();
        let paper_trading = self.config.trading.paper_trading;

        let handle = std::thread::Builder::new()
            .name("mm-order".to_string())
            .spawn(move || {
                loop {
                    if hard_abort.load(Ordering::Acquire) {
                        break;
                    }
                    let draining = !running.load(Ordering::Acquire);

                    let mut processed = 0usize;
                    while let Some(command) = orders.try_pop() {
                        processed += 1;
                        handle_command(command, &adapters, paper_trading, &risk, &quoter, &stats);
                    }
                    while let Some(event) = events.try_pop() {
                        processed += 1;
                        handle_event(event, &risk, &quoter, &stats, &publish);
                    }

                    if draining {
                        if processed == 0 {
                            break;
                        }
                    } else if processed == 0 {
                        std::thread::yield_now();
                    }
                }
            })
            .expect("failed to spawn order thread");
        self.threads.push(handle);
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        if self.is_running() || !self.threads.is_empty() {
            self.stop();
        }
    }
}

fn emit(publish: &EventPublisher, event: EngineEvent) {
    (**publish)(event);
}

/// Snap a quote onto the instrument grid: bid prices round down and ask
/// prices round up to the tick, sizes round down to the step and clamp to
/// the instrument maximum.
fn align_to_instrument(
    price: Price,
    size: Qty,
    side: Side,
    trading: &super::config::TradingConfig,
) -> (Price, Qty) {
    let tick = trading.tick_size;
    let price = if tick.is_positive() {
        let rem = price.raw().rem_euclid(tick.raw());
        match side {
            Side::Buy => Price::from_raw(price.raw() - rem),
            Side::Sell if rem != 0 => Price::from_raw(price.raw() + (tick.raw() - rem)),
            Side::Sell => price,
        }
    } else {
        price
    };

    let step = trading.step_size;
    let size = if step.is_positive() {
        Qty::from_raw(size.raw() - size.raw().rem_euclid(step.raw()))
    } else {
        size
    };
    (price, size.min(trading.max_qty))
}

fn build_quoter(config: &EngineConfig) -> Quoter {
    let mm = config.strategy.market_maker.clone();
    match config.strategy.kind {
        StrategyKind::Basic => Quoter::Basic(BasicQuoter::new(mm)),
        StrategyKind::InventoryAdjusted => {
            Quoter::InventoryAdjusted(InventoryQuoter::new(mm, config.strategy.ema_alpha))
        }
        StrategyKind::AvellanedaStoikov => Quoter::AvellanedaStoikov(AsQuoter::new(
            mm,
            config.strategy.avellaneda.clone(),
            current_time_nanos(),
        )),
    }
}

#[allow(clippy::too_many_arguments)]
fn quote_cycle(
    symbol: Symbol,
    quote_venue: Venue,
    trading: &super::config::TradingConfig,
    book: &Arc<ConsolidatedBook>,
    risk: &Arc<RiskGate>,
    quoter: &Arc<Mutex<Quoter>>,
    signal: &Arc<Mutex<MarketSignal>>,
    orders: &Arc<MpmcQueue<OrderCommand>>,
    stats: &Arc<EngineStats>,
    publish: &EventPublisher,
    next_order_id: &Arc<AtomicU64>,
) {
    let now = current_time_nanos();
    let position = risk.position_qty(symbol);
    let signal = signal.lock().map(|s| *s).unwrap_or_default();

    let decision = {
        let Ok(mut quoter) = quoter.lock() else {
            return;
        };
        quoter.compute_quotes(book, position, &signal, now)
    };
    if !decision.should_quote {
        stats.quote_suppressed();
        return;
    }

    let reference = book.nbbo().map(|nbbo| nbbo.mid_price());
    let sides: [(Side, _, _); 2] = [
        (Side::Buy, decision.bid_price, decision.bid_size),
        (Side::Sell, decision.ask_price, decision.ask_size),
    ];

    for (side, price, size) in sides {
        let (price, size) = align_to_instrument(price, size, side, trading);
        if !size.is_positive() || !price.is_positive() || size < trading.min_qty {
            continue;
        }
        let order_id = next_order_id.fetch_add(1, Ordering::Relaxed);
        let order = Order::limit(
            order_id,
            symbol,
            quote_venue,
            side,
            price,
            size,
            TimeInForce::Gtx,
            now,
        );

        let verdict = risk.check_order(&order, reference, now);
        if !verdict.passed {
            emit(publish, EngineEvent::OrderRejected {
                order_id,
                violation: verdict.violation,
                message: verdict.message,
            });
            continue;
        }

        risk.order_accepted();
        if orders.try_push(OrderCommand::Place(order)).is_err() {
            stats.queue_dropped();
            risk.order_closed();
            continue;
        }
        if let Ok(mut quoter) = quoter.lock() {
            quoter.note_quote_accepted(side, order_id);
        }
        stats.quote_emitted();
        emit(publish, EngineEvent::QuotePlaced {
            order_id,
            side,
            price,
            size,
        });
    }
}

fn handle_command(
    command: OrderCommand,
    adapters: &[Arc<dyn VenueAdapter>],
    paper_trading: bool,
    risk: &Arc<RiskGate>,
    quoter: &Arc<Mutex<Quoter>>,
    stats: &Arc<EngineStats>,
) {
    match command {
        OrderCommand::Place(order) => {
            if paper_trading {
                stats.order_sent();
                return;
            }
            let Some(adapter) = adapters.iter().find(|a| a.venue() == order.venue) else {
                warn!("no adapter for {}; dropping order {}", order.venue, order.id);
                stats.order_send_failed();
                risk.order_closed();
                return;
            };
            if adapter.send_order(&order) == 0 {
                stats.order_send_failed();
                risk.order_closed();
                if let Ok(mut quoter) = quoter.lock() {
                    quoter.on_reject(order.id, "venue send failure");
                }
            } else {
                stats.order_sent();
            }
        }
        OrderCommand::Cancel {
            order_id,
            symbol,
            venue,
        } => {
            if paper_trading {
                return;
            }
            if let Some(adapter) = adapters.iter().find(|a| a.venue() == venue) {
                adapter.cancel_order(order_id, symbol);
            }
        }
    }
}

fn handle_event(
    event: VenueEvent,
    risk: &Arc<RiskGate>,
    quoter: &Arc<Mutex<Quoter>>,
    stats: &Arc<EngineStats>,
    publish: &EventPublisher,
) {
    match event {
        VenueEvent::Tick(_) => {
            // Ticks belong on the per-venue rings; tolerate and drop.
        }
        VenueEvent::Fill(fill) => {
            apply_fill(&fill, risk, quoter);
            stats.fill_processed();
        }
        VenueEvent::OrderUpdate(order) => {
            if order.status.is_terminal() {
                risk.order_closed();
            }
            if let Ok(mut quoter) = quoter.lock() {
                match order.status {
                    OrderStatus::Canceled | OrderStatus::Expired => quoter.on_cancel(order.id),
                    OrderStatus::Rejected => quoter.on_reject(order.id, "venue reject"),
                    _ => {}
                }
            }
        }
        VenueEvent::Connected(venue) => {
            emit(publish, EngineEvent::VenueConnected(venue));
        }
        VenueEvent::Disconnected(venue) => {
            warn!("venue {} disconnected", venue);
            emit(publish, EngineEvent::VenueDisconnected(venue));
        }
        VenueEvent::VenueError { venue, message } => {
            error!("venue {} error: {}", venue, message);
        }
    }
}

fn apply_fill(fill: &Fill, risk: &Arc<RiskGate>, quoter: &Arc<Mutex<Quoter>>) {
    risk.on_fill(
        fill.symbol,
        fill.side,
        fill.quantity,
        fill.price,
        fill.timestamp,
    );
    risk.update_mark_price(fill.symbol, fill.price, fill.timestamp);
    if let Ok(mut quoter) = quoter.lock() {
        quoter.on_fill(fill.order_id, fill.side, fill.quantity, fill.price);
    }
}
