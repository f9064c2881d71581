//! Property tests over the book, position accounting, and the queues.

use marketmaker_rs::book::VenueBook;
use marketmaker_rs::queue::SpscQueue;
use marketmaker_rs::risk::Position;
use marketmaker_rs::types::{Price, Qty, Side, Symbol, Venue};
use proptest::prelude::*;
use std::collections::VecDeque;

#[derive(Debug, Clone)]
enum BookOp {
    Bid { price: i64, qty: i64 },
    Ask { price: i64, qty: i64 },
}

fn book_op() -> impl Strategy<Value = BookOp> {
    // Prices on a coarse grid so removals actually hit existing levels.
    let price = (1i64..=50).prop_map(|p| p * 100_000_000);
    let qty = 0i64..=300_000_000;
    prop_oneof![
        (price.clone(), qty.clone()).prop_map(|(price, qty)| BookOp::Bid { price, qty }),
        (price, qty).prop_map(|(price, qty)| BookOp::Ask { price, qty }),
    ]
}

proptest! {
    #[test]
    fn book_sides_stay_ordered_and_positive(ops in proptest::collection::vec(book_op(), 1..200)) {
        let book = VenueBook::new(Symbol::new("PROPUSDT"), Venue::Binance);
        for op in &ops {
            match *op {
                BookOp::Bid { price, qty } => {
                    book.update_bid(Price::from_raw(price), Qty::from_raw(qty));
                }
                BookOp::Ask { price, qty } => {
                    book.update_ask(Price::from_raw(price), Qty::from_raw(qty));
                }
            }
        }

        // Every surviving level has positive quantity.
        for i in 0..32 {
            if let Some(level) = book.bid_level(i) {
                prop_assert!(level.total_quantity.is_positive());
            }
            if let Some(level) = book.ask_level(i) {
                prop_assert!(level.total_quantity.is_positive());
            }
        }

        // Validity implies uncrossed; crossed implies invalid.
        match (book.best_bid(), book.best_ask()) {
            (Some(bid), Some(ask)) => {
                if bid >= ask {
                    prop_assert!(!book.is_valid());
                } else {
                    prop_assert!(book.is_valid());
                    let spread = ask.saturating_sub(bid);
                    let mid = book.mid_price();
                    prop_assert_eq!(book.spread_bps(), Some(spread.as_bps_of(mid)));
                }
            }
            _ => prop_assert!(!book.is_valid()),
        }
    }

    #[test]
    fn vwap_is_monotone_over_quantity(
        levels in proptest::collection::btree_map(1i64..=40, 1i64..=500_000_000, 1..10),
    ) {
        let book = VenueBook::new(Symbol::new("PROPUSDT"), Venue::Binance);
        for (&price_units, &qty_raw) in &levels {
            book.update_ask(
                Price::from_raw(price_units * 100_000_000),
                Qty::from_raw(qty_raw),
            );
        }

        let mut last = Price::ZERO;
        for step in 1i64..=12 {
            let vwap = book.vwap(Side::Buy, Qty::from_raw(step * 50_000_000));
            prop_assert!(vwap >= last, "ask-side VWAP decreased");
            last = vwap;
        }
    }

    #[test]
    fn position_pnl_matches_trade_log(
        fills in proptest::collection::vec(
            (proptest::bool::ANY, 1i64..=200_000_000, 90i64..=110),
            1..30,
        ),
        mark_units in 90i64..=110,
    ) {
        let mut position = Position::flat(Symbol::new("PROPUSDT"));
        let mut cash = 0f64;
        let mut net = 0f64;

        for (i, &(is_buy, qty_raw, price_units)) in fills.iter().enumerate() {
            let qty = Qty::from_raw(qty_raw);
            let price = Price::from_raw(price_units * 100_000_000);
            let side = if is_buy { Side::Buy } else { Side::Sell };
            position.apply_fill(side, qty, price, i as u64);

            let signed = if is_buy { qty.to_f64() } else { -qty.to_f64() };
            cash -= signed * price.to_f64();
            net += signed;
        }

        let mark = Price::from_raw(mark_units * 100_000_000);
        position.mark(mark, 999);

        let expected = cash + net * mark.to_f64();
        prop_assert!(
            (position.total_pnl() - expected).abs() < 1e-4,
            "pnl {} vs closed form {}",
            position.total_pnl(),
            expected
        );
        prop_assert!((position.quantity.to_f64() - net).abs() < 1e-9);
    }

    #[test]
    fn spsc_matches_fifo_model(ops in proptest::collection::vec(proptest::bool::ANY, 1..400)) {
        let queue: SpscQueue<u32, 16> = SpscQueue::new();
        let mut model: VecDeque<u32> = VecDeque::new();
        let mut next = 0u32;

        for push in ops {
            if push {
                let accepted = queue.try_push(next).is_ok();
                if model.len() < 16 {
                    prop_assert!(accepted);
                    model.push_back(next);
                } else {
                    prop_assert!(!accepted);
                }
                next += 1;
            } else {
                prop_assert_eq!(queue.try_pop(), model.pop_front());
            }
            prop_assert_eq!(queue.len(), model.len());
        }
    }
}
