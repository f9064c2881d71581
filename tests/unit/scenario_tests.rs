//! End-to-end scenarios over synthetic events.

use marketmaker_rs::book::ConsolidatedBook;
use marketmaker_rs::risk::{RiskGate, RiskLimits, RiskViolation};
use marketmaker_rs::strategy::{
    BasicQuoter, MarketMakerParams, MarketSignal, QuoteReason, Quoter,
};
use marketmaker_rs::types::{
    Order, Price, Qty, Side, Symbol, Tick, TimeInForce, Venue,
};

fn symbol() -> Symbol {
    Symbol::new("BTCUSDT")
}

fn symmetric_book() -> ConsolidatedBook {
    let book = ConsolidatedBook::new(symbol());
    book.apply_tick(&Tick::quote(
        Venue::Binance,
        Price::from_f64(10_000.0),
        Qty::from_f64(1.0),
        Price::from_f64(10_001.0),
        Qty::from_f64(1.0),
        1,
        1,
        1,
    ));
    book
}

fn scenario_params() -> MarketMakerParams {
    MarketMakerParams {
        target_spread_bps: 10,
        min_spread_bps: 5,
        max_spread_bps: 50,
        default_order_size: Qty::from_f64(0.1),
        max_position: Qty::from_f64(1.0),
        min_quote_life_us: 50_000,
        ..MarketMakerParams::default()
    }
}

#[test]
fn single_venue_quoting_with_symmetric_book() {
    let book = symmetric_book();
    let mut quoter = Quoter::Basic(BasicQuoter::new(scenario_params()));

    let decision = quoter.compute_quotes(&book, Qty::ZERO, &MarketSignal::flat(), 1_000);
    assert!(decision.should_quote);

    // Mid 10_000.5; half-spread = 5 bps of mid = 5.00025.
    let mid = Price::from_f64(10_000.5);
    let half = mid.mul_bps(5);
    assert_eq!(half, Price::from_f64(5.00025));
    assert_eq!(decision.bid_price, mid.saturating_sub(half));
    assert_eq!(decision.ask_price, mid.saturating_add(half));
    assert_eq!(decision.bid_size, Qty::from_f64(0.1));
    assert_eq!(decision.ask_size, Qty::from_f64(0.1));
}

#[test]
fn hysteresis_suppresses_second_identical_quote() {
    let book = symmetric_book();
    let mut quoter = Quoter::Basic(BasicQuoter::new(scenario_params()));

    let first = quoter.compute_quotes(&book, Qty::ZERO, &MarketSignal::flat(), 1_000);
    assert!(first.should_quote);

    // Identical book well inside min_quote_life (50 ms).
    let second = quoter.compute_quotes(&book, Qty::ZERO, &MarketSignal::flat(), 2_000_000);
    assert!(!second.should_quote);
    assert_eq!(second.reason, QuoteReason::PricesUnchanged);
    assert_eq!(second.reason.to_string(), "Prices unchanged");
}

#[test]
fn position_limit_rejects_extending_buy() {
    let gate = RiskGate::new(RiskLimits {
        max_position_qty: Qty::from_f64(1.0),
        ..RiskLimits::default()
    });
    gate.on_fill(
        symbol(),
        Side::Buy,
        Qty::from_f64(0.9),
        Price::from_f64(10_000.0),
        1,
    );

    let order = Order::limit(
        1,
        symbol(),
        Venue::Binance,
        Side::Buy,
        Price::from_f64(10_000.0),
        Qty::from_f64(0.2),
        TimeInForce::Gtc,
        1,
    );
    let verdict = gate.check_order(&order, None, 1_000_000_000);
    assert!(!verdict.passed);
    assert_eq!(verdict.violation, Some(RiskViolation::PositionLimit));
}

#[test]
fn nbbo_and_arbitrage_across_two_venues() {
    let book = ConsolidatedBook::new(symbol());
    // Venue X: 9_999 / 10_000. Venue Y: 10_002 / 10_003.
    book.apply_tick(&Tick::quote(
        Venue::Binance,
        Price::from_f64(9_999.0),
        Qty::from_f64(1.0),
        Price::from_f64(10_000.0),
        Qty::from_f64(1.0),
        1,
        1,
        1,
    ));
    book.apply_tick(&Tick::quote(
        Venue::Kraken,
        Price::from_f64(10_002.0),
        Qty::from_f64(1.0),
        Price::from_f64(10_003.0),
        Qty::from_f64(1.0),
        1,
        1,
        1,
    ));

    let nbbo = book.nbbo().unwrap();
    assert_eq!(nbbo.best_bid, Price::from_f64(10_002.0));
    assert_eq!(nbbo.bid_venue, Venue::Kraken);
    assert_eq!(nbbo.best_ask, Price::from_f64(10_000.0));
    assert_eq!(nbbo.ask_venue, Venue::Binance);

    let opportunity = book.find_arbitrage().expect("venues are crossed");
    assert_eq!(opportunity.buy_venue, Venue::Binance);
    assert_eq!(opportunity.sell_venue, Venue::Kraken);
    assert_eq!(opportunity.quantity, Qty::from_f64(1.0));
    assert_eq!(opportunity.profit_bps, 20);
}

#[test]
fn daily_loss_engages_kill_switch_until_deactivated() {
    let gate = RiskGate::new(RiskLimits {
        max_daily_loss: 100.0,
        ..RiskLimits::default()
    });
    gate.set_daily_realized_pnl(-101.0);

    let order = Order::limit(
        1,
        symbol(),
        Venue::Binance,
        Side::Buy,
        Price::from_f64(10_000.0),
        Qty::from_f64(0.01),
        TimeInForce::Gtc,
        1,
    );

    let first = gate.check_order(&order, None, 1_000_000_000);
    assert_eq!(first.violation, Some(RiskViolation::DailyLossLimit));
    assert!(gate.kill_switch().is_active());

    for _ in 0..3 {
        let verdict = gate.check_order(&order, None, 2_000_000_000);
        assert_eq!(verdict.violation, Some(RiskViolation::KillSwitchActive));
    }

    gate.deactivate_kill_switch();
    gate.reset_daily_stats();
    assert!(gate.check_order(&order, None, 3_000_000_000).passed);
}
