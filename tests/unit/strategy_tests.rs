use marketmaker_rs::book::ConsolidatedBook;
use marketmaker_rs::strategy::{
    AsParams, AsQuoter, BasicQuoter, InventoryQuoter, MarketMakerParams, MarketSignal,
    QuoteReason, Quoter,
};
use marketmaker_rs::types::{Price, Qty, Symbol, Tick, Venue};

fn one_venue_book(bid: f64, ask: f64) -> ConsolidatedBook {
    let book = ConsolidatedBook::new(Symbol::new("BTCUSDT"));
    book.apply_tick(&Tick::quote(
        Venue::Binance,
        Price::from_f64(bid),
        Qty::from_f64(1.0),
        Price::from_f64(ask),
        Qty::from_f64(1.0),
        1,
        1,
        1,
    ));
    book
}

fn params() -> MarketMakerParams {
    MarketMakerParams {
        target_spread_bps: 10,
        min_spread_bps: 5,
        max_spread_bps: 50,
        default_order_size: Qty::from_f64(0.1),
        max_position: Qty::from_f64(1.0),
        ..MarketMakerParams::default()
    }
}

#[test]
fn basic_quotes_straddle_mid_within_spread_band() {
    let book = one_venue_book(10_000.0, 10_001.0);
    let mut quoter = Quoter::Basic(BasicQuoter::new(params()));

    let decision = quoter.compute_quotes(&book, Qty::ZERO, &MarketSignal::flat(), 1_000);
    assert!(decision.should_quote);

    let mid = book.nbbo().unwrap().mid_price();
    assert!(decision.bid_price < mid);
    assert!(mid < decision.ask_price);

    let quoted_spread_bps = decision
        .ask_price
        .saturating_sub(decision.bid_price)
        .as_bps_of(mid);
    assert!((5..=50).contains(&quoted_spread_bps));
}

#[test]
fn crossed_book_refuses_to_quote() {
    let book = ConsolidatedBook::new(Symbol::new("BTCUSDT"));
    // Two venues crossing each other make the NBBO invalid.
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

    let mut quoter = Quoter::Basic(BasicQuoter::new(params()));
    let decision = quoter.compute_quotes(&book, Qty::ZERO, &MarketSignal::flat(), 1_000);
    assert!(!decision.should_quote);
    assert_eq!(decision.reason, QuoteReason::InvalidBook);
}

#[test]
fn volatility_widens_the_spread() {
    let book = one_venue_book(10_000.0, 10_001.0);
    let mut quoter = Quoter::Basic(BasicQuoter::new(params()));
    let calm = quoter.compute_quotes(&book, Qty::ZERO, &MarketSignal::flat(), 1_000);

    let mut stressed = Quoter::Basic(BasicQuoter::new(params()));
    let wild = stressed.compute_quotes(
        &book,
        Qty::ZERO,
        &MarketSignal { volatility: 2.0 },
        1_000,
    );

    let calm_spread = calm.ask_price.saturating_sub(calm.bid_price);
    let wild_spread = wild.ask_price.saturating_sub(wild.bid_price);
    assert!(wild_spread > calm_spread);
}

#[test]
fn linear_skew_is_monotone_in_position() {
    // Increasing long position must never raise the bid above the quote
    // produced at a smaller position.
    let book = one_venue_book(10_000.0, 10_001.0);
    let mut last_bid = Price::from_raw(i64::MAX);

    for step in 0..=4 {
        let position = Qty::from_f64(step as f64 * 0.25);
        let mut quoter = Quoter::Basic(BasicQuoter::new(params()));
        let decision = quoter.compute_quotes(&book, position, &MarketSignal::flat(), 1_000);
        if decision.should_quote {
            assert!(
                decision.bid_price <= last_bid,
                "bid rose as position grew at step {step}"
            );
            last_bid = decision.bid_price;
        }
    }
}

#[test]
fn inventory_adjusted_skew_stays_bounded() {
    let book = one_venue_book(10_000.0, 10_001.0);

    // Even at 3x the position bound, the sigmoid caps the shift at the
    // configured skew factor in bps of fair.
    let mut quoter = Quoter::InventoryAdjusted(InventoryQuoter::new(params(), 1.0));
    let extreme = quoter.compute_quotes(
        &book,
        Qty::from_f64(3.0),
        &MarketSignal::flat(),
        1_000,
    );

    let mid = book.nbbo().unwrap().mid_price();
    let max_shift = mid.mul_bps(params().inventory_skew_factor);
    let observed_shift = mid
        .saturating_sub(extreme.bid_price.midpoint(extreme.ask_price))
        .abs();
    assert!(observed_shift <= max_shift);
}

#[test]
fn avellaneda_reservation_matches_mid_at_zero_position() {
    let book = one_venue_book(10_000.0, 10_001.0);
    let quoter = AsQuoter::new(params(), AsParams::default(), 0);

    let mid = book.nbbo().unwrap().mid_price();
    assert_eq!(quoter.reservation_price(mid, Qty::ZERO, 1.0), mid);
}

#[test]
fn avellaneda_quotes_center_on_reservation() {
    let book = one_venue_book(10_000.0, 10_001.0);
    let mut quoter = Quoter::AvellanedaStoikov(AsQuoter::new(params(), AsParams::default(), 0));

    let decision = quoter.compute_quotes(
        &book,
        Qty::from_f64(0.5),
        &MarketSignal::flat(),
        1_000,
    );
    assert!(decision.should_quote);

    let mid = book.nbbo().unwrap().mid_price();
    let center = decision.bid_price.midpoint(decision.ask_price);
    // Long inventory pushes the quote center below the mid.
    assert!(center < mid);
    assert!(decision.bid_price < decision.ask_price);
}

#[test]
fn disabled_strategy_reports_reason() {
    let book = one_venue_book(10_000.0, 10_001.0);
    let mut quoter = Quoter::Basic(BasicQuoter::new(params()));
    quoter.set_enabled(false);

    let decision = quoter.compute_quotes(&book, Qty::ZERO, &MarketSignal::flat(), 1_000);
    assert!(!decision.should_quote);
    assert_eq!(decision.reason, QuoteReason::Disabled);
    assert_eq!(decision.reason.to_string(), "Strategy disabled");

    quoter.set_enabled(true);
    assert!(
        quoter
            .compute_quotes(&book, Qty::ZERO, &MarketSignal::flat(), 1_000)
            .should_quote
    );
}

#[test]
fn fill_hooks_accumulate_bought_and_sold() {
    let book = one_venue_book(10_000.0, 10_001.0);
    let mut quoter = Quoter::Basic(BasicQuoter::new(params()));
    let _ = quoter.compute_quotes(&book, Qty::ZERO, &MarketSignal::flat(), 1_000);

    quoter.on_fill(
        1,
        marketmaker_rs::types::Side::Buy,
        Qty::from_f64(0.1),
        Price::from_f64(10_000.0),
    );
    quoter.on_fill(
        2,
        marketmaker_rs::types::Side::Sell,
        Qty::from_f64(0.04),
        Price::from_f64(10_001.0),
    );

    assert_eq!(quoter.total_bought(), Qty::from_f64(0.1));
    assert_eq!(quoter.total_sold(), Qty::from_f64(0.04));
}
