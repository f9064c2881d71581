//! Pre-trade checks, position map, and drawdown watch.

use super::kill_switch::KillSwitch;
use super::position::Position;
use super::snapshot::{PositionSnapshot, RiskSnapshot};
use crate::types::{FIXED_SCALE, Order, Price, Qty, Side, Symbol, TimestampNs, notional};
use crossbeam::atomic::AtomicCell;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::sync::RwLock;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use tracing::warn;

/// The reason a pre-trade check failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RiskViolation {
    KillSwitchActive,
    SymbolDisabled,
    PositionLimit,
    OrderSizeLimit,
    OrderValueLimit,
    RateLimit,
    OpenOrdersLimit,
    DailyLossLimit,
    PriceDeviation,
}

impl RiskViolation {
    /// All violation kinds, for per-kind counter wiring.
    pub const ALL: [RiskViolation; 9] = [
        RiskViolation::KillSwitchActive,
        RiskViolation::SymbolDisabled,
        RiskViolation::PositionLimit,
        RiskViolation::OrderSizeLimit,
        RiskViolation::OrderValueLimit,
        RiskViolation::RateLimit,
        RiskViolation::OpenOrdersLimit,
        RiskViolation::DailyLossLimit,
        RiskViolation::PriceDeviation,
    ];

    /// Dense index for counter arrays.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for RiskViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RiskViolation::KillSwitchActive => "KILL_SWITCH_ACTIVE",
            RiskViolation::SymbolDisabled => "SYMBOL_DISABLED",
            RiskViolation::PositionLimit => "POSITION_LIMIT",
            RiskViolation::OrderSizeLimit => "ORDER_SIZE_LIMIT",
            RiskViolation::OrderValueLimit => "ORDER_VALUE_LIMIT",
            RiskViolation::RateLimit => "RATE_LIMIT",
            RiskViolation::OpenOrdersLimit => "OPEN_ORDERS_LIMIT",
            RiskViolation::DailyLossLimit => "DAILY_LOSS_LIMIT",
            RiskViolation::PriceDeviation => "PRICE_DEVIATION",
        };
        f.write_str(name)
    }
}

/// Structured verdict from [`RiskGate::check_order`].
#[derive(Debug, Clone, Serialize)]
pub struct RiskCheckResult {
    pub passed: bool,
    pub violation: Option<RiskViolation>,
    pub message: String,
}

impl RiskCheckResult {
    #[must_use]
    pub fn pass() -> Self {
        Self {
            passed: true,
            violation: None,
            message: String::new(),
        }
    }

    #[must_use]
    pub fn fail(violation: RiskViolation, message: String) -> Self {
        Self {
            passed: false,
            violation: Some(violation),
            message,
        }
    }
}

/// Configured risk limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskLimits {
    pub max_position_qty: Qty,
    pub max_order_qty: Qty,
    /// Maximum order notional in quote units.
    pub max_order_value: f64,
    pub max_orders_per_second: u32,
    pub max_open_orders: u32,
    /// Daily realized loss that trips the kill switch, in quote units.
    pub max_daily_loss: f64,
    /// Peak-to-current equity drop that trips the kill switch.
    pub max_drawdown: f64,
    /// Maximum allowed deviation of an order price from the reference.
    pub max_deviation_bps: i64,
    /// Cumulative rejects that trip the kill switch.
    pub reject_threshold: u32,
    /// Whether breaches may engage the kill switch at all.
    pub kill_switch_enabled: bool,
}

impl Default for RiskLimits {
    fn default() -> Self {
        Self {
            max_position_qty: Qty::from_f64(1.0),
            max_order_qty: Qty::from_f64(0.5),
            max_order_value: 100_000.0,
            max_orders_per_second: 10,
            max_open_orders: 16,
            max_daily_loss: 1_000.0,
            max_drawdown: 2_000.0,
            max_deviation_bps: 100,
            reject_threshold: 50,
            kill_switch_enabled: true,
        }
    }
}

/// Synchronous pre-trade checker and position keeper.
///
/// Checks run in a fixed order and short-circuit on the first failure:
/// kill switch, symbol enabled, position limit, order size, order value,
/// rate limit, open orders, daily loss, price deviation. Every verdict is
/// structured; the gate never panics on the order path.
pub struct RiskGate {
    limits: RwLock<RiskLimits>,
    kill_switch: Arc<KillSwitch>,
    positions: DashMap<Symbol, Position>,
    disabled_symbols: DashMap<Symbol, ()>,
    open_orders: AtomicU32,
    /// Realized P&L since the last daily reset, stored as `f64` bits so
    /// concurrent fills can accumulate with a CAS loop.
    daily_realized: AtomicU64,
    peak_equity: AtomicCell<f64>,
    /// Wall-clock second the rate window is counting, advanced by CAS.
    rate_second: AtomicU64,
    rate_count: AtomicU32,
    rejects: AtomicU32,
    orders_checked: AtomicU64,
    orders_rejected: AtomicU64,
    rejected_by_kind: [AtomicU64; RiskViolation::ALL.len()],
}

impl RiskGate {
    #[must_use]
    pub fn new(limits: RiskLimits) -> Self {
        Self {
            limits: RwLock::new(limits),
            kill_switch: Arc::new(KillSwitch::new()),
            positions: DashMap::new(),
            disabled_symbols: DashMap::new(),
            open_orders: AtomicU32::new(0),
            daily_realized: AtomicU64::new(0f64.to_bits()),
            peak_equity: AtomicCell::new(0.0),
            rate_second: AtomicU64::new(0),
            rate_count: AtomicU32::new(0),
            rejects: AtomicU32::new(0),
            orders_checked: AtomicU64::new(0),
            orders_rejected: AtomicU64::new(0),
            rejected_by_kind: std::array::from_fn(|_| AtomicU64::new(0)),
        }
    }

    /// Shared handle to the gate's kill switch.
    #[must_use]
    pub fn kill_switch(&self) -> Arc<KillSwitch> {
        Arc::clone(&self.kill_switch)
    }

    /// Replace the configured limits.
    pub fn update_limits(&self, limits: RiskLimits) {
        if let Ok(mut slot) = self.limits.write() {
            *slot = limits;
        }
    }

    pub fn disable_symbol(&self, symbol: Symbol) {
        self.disabled_symbols.insert(symbol, ());
    }

    pub fn enable_symbol(&self, symbol: Symbol) {
        self.disabled_symbols.remove(&symbol);
    }

    /// Run the full pre-trade check sequence against `order`.
    ///
    /// `reference_price` (typically the consolidated mid) enables the
    /// price-deviation check; pass `None` when no reference exists yet.
    /// `now` drives the rate-limit window.
    pub fn check_order(
        &self,
        order: &Order,
        reference_price: Option<Price>,
        now: TimestampNs,
    ) -> RiskCheckResult {
        self.orders_checked.fetch_add(1, Ordering::Relaxed);
        let limits = self
            .limits
            .read()
            .expect("risk limits lock poisoned")
            .clone();

        // 1. Kill switch.
        if self.kill_switch.is_active() {
            return self.reject(
                RiskViolation::KillSwitchActive,
                "kill switch is active".to_string(),
                &limits,
            );
        }

        // 2. Symbol enabled.
        if self.disabled_symbols.contains_key(&order.symbol) {
            return self.reject(
                RiskViolation::SymbolDisabled,
                format!("symbol {} is disabled", order.symbol),
                &limits,
            );
        }

        // 3. Position limit on the potential post-fill position.
        let current = self.position_qty(order.symbol);
        let potential = match order.side {
            Side::Buy => current.saturating_add(order.quantity),
            Side::Sell => current.saturating_sub(order.quantity),
        };
        if potential.abs() > limits.max_position_qty {
            return self.reject(
                RiskViolation::PositionLimit,
                format!(
                    "potential position {} exceeds limit {}",
                    potential, limits.max_position_qty
                ),
                &limits,
            );
        }

        // 4. Order size and notional value.
        if order.quantity > limits.max_order_qty {
            return self.reject(
                RiskViolation::OrderSizeLimit,
                format!(
                    "order quantity {} exceeds limit {}",
                    order.quantity, limits.max_order_qty
                ),
                &limits,
            );
        }
        let order_value = notional(order.price, order.quantity) as f64 / FIXED_SCALE as f64;
        if order_value > limits.max_order_value {
            return self.reject(
                RiskViolation::OrderValueLimit,
                format!(
                    "order value {:.2} exceeds limit {:.2}",
                    order_value, limits.max_order_value
                ),
                &limits,
            );
        }

        // 5. Per-second rate limit. The second boundary advances by CAS so
        // concurrent callers consistently either reset or count against
        // the previous window; a burst racing the reset may be admitted,
        // which keeps this limiter approximate by design.
        let second = now / 1_000_000_000;
        let window = self.rate_second.load(Ordering::Acquire);
        if second != window
            && self
                .rate_second
                .compare_exchange(window, second, Ordering::AcqRel, Ordering::Relaxed)
                .is_ok()
        {
            self.rate_count.store(0, Ordering::Release);
        }
        let sent_this_second = self.rate_count.fetch_add(1, Ordering::AcqRel);
        if sent_this_second >= limits.max_orders_per_second {
            return self.reject(
                RiskViolation::RateLimit,
                format!(
                    "{} orders already sent this second (limit {})",
                    sent_this_second, limits.max_orders_per_second
                ),
                &limits,
            );
        }

        // 6. Open orders.
        let open = self.open_orders.load(Ordering::Acquire);
        if open >= limits.max_open_orders {
            return self.reject(
                RiskViolation::OpenOrdersLimit,
                format!("{} open orders at limit {}", open, limits.max_open_orders),
                &limits,
            );
        }

        // 7. Daily loss.
        let daily = f64::from_bits(self.daily_realized.load(Ordering::Acquire));
        if -daily >= limits.max_daily_loss {
            if limits.kill_switch_enabled {
                self.kill_switch.activate(&format!(
                    "daily loss {:.2} breached limit {:.2}",
                    -daily, limits.max_daily_loss
                ));
            }
            return self.reject(
                RiskViolation::DailyLossLimit,
                format!(
                    "daily realized loss {:.2} at limit {:.2}",
                    -daily, limits.max_daily_loss
                ),
                &limits,
            );
        }

        // 8. Price deviation from reference.
        if let Some(reference) = reference_price {
            if reference.is_positive() {
                let deviation_bps = order
                    .price
                    .saturating_sub(reference)
                    .abs()
                    .as_bps_of(reference);
                if deviation_bps > limits.max_deviation_bps {
                    return self.reject(
                        RiskViolation::PriceDeviation,
                        format!(
                            "price {} deviates {} bps from reference {} (limit {})",
                            order.price, deviation_bps, reference, limits.max_deviation_bps
                        ),
                        &limits,
                    );
                }
            }
        }

        RiskCheckResult::pass()
    }

    fn reject(
        &self,
        violation: RiskViolation,
        message: String,
        limits: &RiskLimits,
    ) -> RiskCheckResult {
        self.orders_rejected.fetch_add(1, Ordering::Relaxed);
        self.rejected_by_kind[violation.index()].fetch_add(1, Ordering::Relaxed);
        warn!("order rejected: {} ({})", violation, message);

        let rejects = self.rejects.fetch_add(1, Ordering::AcqRel) + 1;
        if limits.kill_switch_enabled
            && violation != RiskViolation::KillSwitchActive
            && rejects > limits.reject_threshold
        {
            self.kill_switch
                .activate(&format!("{rejects} cumulative rejects"));
        }

        RiskCheckResult::fail(violation, message)
    }

    /// Record a fill: updates the position book and the daily realized
    /// P&L, then re-evaluates the drawdown watch.
    pub fn on_fill(
        &self,
        symbol: Symbol,
        side: Side,
        qty: Qty,
        price: Price,
        timestamp: TimestampNs,
    ) {
        let realized = {
            let mut position = self
                .positions
                .entry(symbol)
                .or_insert_with(|| Position::flat(symbol));
            position.apply_fill(side, qty, price, timestamp)
        };
        add_f64_bits(&self.daily_realized, realized);
        self.check_drawdown();
    }

    /// Re-mark a symbol's position and re-evaluate the drawdown watch.
    pub fn update_mark_price(&self, symbol: Symbol, mark: Price, timestamp: TimestampNs) {
        if let Some(mut position) = self.positions.get_mut(&symbol) {
            position.mark(mark, timestamp);
        }
        self.check_drawdown();
    }

    fn check_drawdown(&self) {
        let limits = self.limits.read().expect("risk limits lock poisoned");
        let total = self.total_equity();

        // Running maximum; racing stores can only under-report the peak
        // briefly, never inflate it.
        let peak = self.peak_equity.load();
        if total > peak {
            self.peak_equity.store(total);
            return;
        }

        if limits.kill_switch_enabled
            && limits.max_drawdown > 0.0
            && peak - total > limits.max_drawdown
        {
            self.kill_switch.activate(&format!(
                "drawdown {:.2} exceeds limit {:.2}",
                peak - total,
                limits.max_drawdown
            ));
        }
    }

    /// Sum of realized and unrealized P&L across all positions.
    #[must_use]
    pub fn total_equity(&self) -> f64 {
        self.positions
            .iter()
            .map(|entry| entry.value().total_pnl())
            .sum()
    }

    /// Current position for `symbol`, flat if never traded.
    #[must_use]
    pub fn position(&self, symbol: Symbol) -> Position {
        self.positions
            .get(&symbol)
            .map(|entry| *entry.value())
            .unwrap_or_else(|| Position::flat(symbol))
    }

    /// Signed net quantity for `symbol`.
    #[must_use]
    pub fn position_qty(&self, symbol: Symbol) -> Qty {
        self.positions
            .get(&symbol)
            .map(|entry| entry.value().quantity)
            .unwrap_or(Qty::ZERO)
    }

    /// Count an accepted order as open.
    pub fn order_accepted(&self) {
        self.open_orders.fetch_add(1, Ordering::AcqRel);
    }

    /// Count a terminal order as closed. Saturates at zero so a stray
    /// duplicate report cannot wrap the gauge.
    pub fn order_closed(&self) {
        let _ = self
            .open_orders
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |count| {
                count.checked_sub(1)
            });
    }

    #[must_use]
    pub fn open_order_count(&self) -> u32 {
        self.open_orders.load(Ordering::Acquire)
    }

    /// Realized P&L accumulated since the last daily reset.
    #[must_use]
    pub fn daily_realized_pnl(&self) -> f64 {
        f64::from_bits(self.daily_realized.load(Ordering::Acquire))
    }

    /// Force the daily realized P&L, for session restore.
    pub fn set_daily_realized_pnl(&self, value: f64) {
        self.daily_realized.store(value.to_bits(), Ordering::Release);
    }

    #[must_use]
    pub fn peak_equity(&self) -> f64 {
        self.peak_equity.load()
    }

    /// Zero the daily realized P&L, reseat the equity peak at the current
    /// total, and clear the reject counter.
    pub fn reset_daily_stats(&self) {
        self.daily_realized.store(0f64.to_bits(), Ordering::Release);
        self.peak_equity.store(self.total_equity());
        self.rejects.store(0, Ordering::Release);
    }

    /// Clear the kill switch and the reject counter; positions are
    /// untouched.
    pub fn deactivate_kill_switch(&self) {
        self.kill_switch.deactivate();
        self.rejects.store(0, Ordering::Release);
    }

    #[must_use]
    pub fn orders_checked(&self) -> u64 {
        self.orders_checked.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn orders_rejected(&self) -> u64 {
        self.orders_rejected.load(Ordering::Relaxed)
    }

    /// Rejections recorded for one violation kind.
    #[must_use]
    pub fn rejected_count(&self, violation: RiskViolation) -> u64 {
        self.rejected_by_kind[violation.index()].load(Ordering::Relaxed)
    }

    /// Position snapshots for persistence.
    #[must_use]
    pub fn position_snapshots(&self) -> Vec<PositionSnapshot> {
        self.positions
            .iter()
            .map(|entry| {
                let p = entry.value();
                PositionSnapshot {
                    symbol: p.symbol,
                    quantity: p.quantity,
                    avg_entry: p.avg_entry,
                    realized_pnl: p.realized_pnl,
                }
            })
            .collect()
    }

    /// Restore positions and the equity peak from a snapshot.
    pub fn restore(&self, snapshot: &RiskSnapshot) {
        for persisted in &snapshot.positions {
            let mut position = Position::flat(persisted.symbol);
            position.quantity = persisted.quantity;
            position.avg_entry = persisted.avg_entry;
            position.realized_pnl = persisted.realized_pnl;
            self.positions.insert(persisted.symbol, position);
        }
        self.peak_equity.store(snapshot.day_peak_equity);
    }
}

/// Accumulate into an `f64` stored as bits in an `AtomicU64`; there is no
/// native floating-point fetch_add.
fn add_f64_bits(cell: &AtomicU64, delta: f64) {
    let mut current = cell.load(Ordering::Acquire);
    loop {
        let next = (f64::from_bits(current) + delta).to_bits();
        match cell.compare_exchange_weak(current, next, Ordering::AcqRel, Ordering::Acquire) {
            Ok(_) => return,
            Err(observed) => current = observed,
        }
    }
}
