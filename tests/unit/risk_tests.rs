use marketmaker_rs::risk::{
    RiskGate, RiskLimits, RiskSnapshot, RiskSnapshotPackage, RiskViolation,
};
use marketmaker_rs::types::{Order, Price, Qty, Side, Symbol, TimeInForce, Venue};
use std::io::Write;

fn symbol() -> Symbol {
    Symbol::new("BTCUSDT")
}

fn order(id: u64, side: Side, price: f64, qty: f64) -> Order {
    Order::limit(
        id,
        symbol(),
        Venue::Binance,
        side,
        Price::from_f64(price),
        Qty::from_f64(qty),
        TimeInForce::Gtc,
        0,
    )
}

#[test]
fn rate_limit_admits_at_most_n_per_second() {
    let gate = RiskGate::new(RiskLimits {
        max_orders_per_second: 5,
        ..RiskLimits::default()
    });

    // Aligned one-second window starting at t = 7s.
    let window = 7_000_000_000u64;
    let mut passes = 0;
    for i in 0..20 {
        let t = window + i * 10_000_000; // spread inside the same second
        if gate.check_order(&order(i, Side::Buy, 10_000.0, 0.01), None, t).passed {
            passes += 1;
        }
    }
    assert_eq!(passes, 5);

    // The next aligned window admits again.
    assert!(
        gate.check_order(&order(99, Side::Buy, 10_000.0, 0.01), None, window + 1_000_000_000)
            .passed
    );
}

#[test]
fn kill_switch_is_sticky_until_explicit_deactivation() {
    let gate = RiskGate::new(RiskLimits::default());
    gate.kill_switch().activate("manual halt");

    for i in 0..5 {
        let verdict = gate.check_order(&order(i, Side::Buy, 10_000.0, 0.01), None, 1_000_000_000);
        assert_eq!(verdict.violation, Some(RiskViolation::KillSwitchActive));
    }
    assert_eq!(gate.rejected_count(RiskViolation::KillSwitchActive), 5);

    gate.deactivate_kill_switch();
    assert!(
        gate.check_order(&order(9, Side::Buy, 10_000.0, 0.01), None, 1_000_000_000)
            .passed
    );
}

#[test]
fn fills_drive_realized_and_unrealized_pnl() {
    let gate = RiskGate::new(RiskLimits {
        // Wide limits so bookkeeping, not checks, is under test.
        max_position_qty: Qty::from_f64(100.0),
        max_daily_loss: 1_000_000.0,
        max_drawdown: 1_000_000.0,
        ..RiskLimits::default()
    });

    gate.on_fill(symbol(), Side::Buy, Qty::from_f64(2.0), Price::from_f64(100.0), 1);
    gate.on_fill(symbol(), Side::Sell, Qty::from_f64(1.0), Price::from_f64(110.0), 2);

    let position = gate.position(symbol());
    assert_eq!(position.quantity, Qty::from_f64(1.0));
    assert!((gate.daily_realized_pnl() - 10.0).abs() < 1e-9);

    gate.update_mark_price(symbol(), Price::from_f64(120.0), 3);
    let marked = gate.position(symbol());
    assert!((marked.unrealized_pnl - 20.0).abs() < 1e-9);
    assert!((gate.total_equity() - 30.0).abs() < 1e-9);
}

#[test]
fn counters_track_checked_and_rejected() {
    let gate = RiskGate::new(RiskLimits {
        max_order_qty: Qty::from_f64(0.1),
        ..RiskLimits::default()
    });

    assert!(gate.check_order(&order(1, Side::Buy, 10_000.0, 0.05), None, 1_000_000_000).passed);
    assert!(!gate.check_order(&order(2, Side::Buy, 10_000.0, 0.2), None, 1_000_000_000).passed);

    assert_eq!(gate.orders_checked(), 2);
    assert_eq!(gate.orders_rejected(), 1);
    assert_eq!(gate.rejected_count(RiskViolation::OrderSizeLimit), 1);
}

#[test]
fn snapshot_round_trips_through_file() {
    let gate = RiskGate::new(RiskLimits::default());
    gate.on_fill(symbol(), Side::Buy, Qty::from_f64(0.5), Price::from_f64(10_000.0), 1);
    gate.on_fill(symbol(), Side::Sell, Qty::from_f64(0.2), Price::from_f64(10_050.0), 2);

    let package = RiskSnapshotPackage::new(RiskSnapshot::capture(&gate)).unwrap();
    let json = package.to_json().unwrap();

    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(json.as_bytes()).unwrap();
    let restored_json = std::fs::read_to_string(file.path()).unwrap();

    let restored = RiskSnapshotPackage::from_json(&restored_json).unwrap();
    restored.validate().unwrap();
    let snapshot = restored.into_snapshot().unwrap();

    let fresh = RiskGate::new(RiskLimits::default());
    fresh.restore(&snapshot);

    let position = fresh.position(symbol());
    assert_eq!(position.quantity, Qty::from_f64(0.3));
    assert_eq!(position.avg_entry, Price::from_f64(10_000.0));
    assert!((position.realized_pnl - 10.0).abs() < 1e-9);
}

#[test]
fn tampered_snapshot_fails_checksum() {
    let gate = RiskGate::new(RiskLimits::default());
    gate.on_fill(symbol(), Side::Buy, Qty::from_f64(0.5), Price::from_f64(10_000.0), 1);

    let mut package = RiskSnapshotPackage::new(RiskSnapshot::capture(&gate)).unwrap();
    package.snapshot.day_peak_equity = 9_999.0;
    assert!(package.validate().is_err());
}
