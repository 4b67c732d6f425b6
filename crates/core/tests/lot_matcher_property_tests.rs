//! Property-based integration tests for FIFO lot matching.
//!
//! These tests verify that universal properties hold across all valid inputs,
//! using the `proptest` crate for random test case generation. A naive
//! integer-arithmetic reference implementation acts as the oracle.

use std::collections::{HashMap, HashSet, VecDeque};

use chrono::{Duration, NaiveDate};
use proptest::prelude::*;
use rust_decimal::Decimal;

use lotfolio_core::{compute_holdings, Transaction, TransactionSide};

// =============================================================================
// Generators
// =============================================================================

fn base_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

fn arb_symbol() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("AAPL".to_string()),
        Just("MSFT".to_string()),
        Just("GOOG".to_string()),
    ]
}

fn arb_side() -> impl Strategy<Value = TransactionSide> {
    prop_oneof![Just(TransactionSide::Buy), Just(TransactionSide::Sell)]
}

/// Generates a random transaction history with integer quantities and prices
/// so the oracle can use exact `i64` arithmetic. Dates may repeat.
fn arb_transactions(max_count: usize) -> impl Strategy<Value = Vec<Transaction>> {
    proptest::collection::vec(
        (arb_symbol(), arb_side(), 1i64..=100, 1i64..=500, 0i64..=60),
        0..=max_count,
    )
    .prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(i, (symbol, side, quantity, price, day))| Transaction {
                id: format!("t{}", i),
                side,
                symbol,
                quantity: Decimal::from(quantity),
                price_per_share: Decimal::from(price),
                date: base_date() + Duration::days(day),
            })
            .collect()
    })
}

/// Like [`arb_transactions`] but every transaction gets a unique date, so
/// the matching order is fully determined by dates alone.
fn arb_distinct_date_transactions(max_count: usize) -> impl Strategy<Value = Vec<Transaction>> {
    proptest::collection::vec((arb_symbol(), arb_side(), 1i64..=100, 1i64..=500), 1..=max_count)
        .prop_map(|rows| {
            rows.into_iter()
                .enumerate()
                .map(|(i, (symbol, side, quantity, price))| Transaction {
                    id: format!("t{}", i),
                    side,
                    symbol,
                    quantity: Decimal::from(quantity),
                    price_per_share: Decimal::from(price),
                    date: base_date() + Duration::days(i as i64),
                })
                .collect()
        })
}

// =============================================================================
// Reference implementation (oracle)
// =============================================================================

fn matching_rank(side: TransactionSide) -> u8 {
    match side {
        TransactionSide::Buy => 0,
        TransactionSide::Sell => 1,
    }
}

/// Straight-line FIFO replay over `i64` quantities: buys queue lots, sells
/// consume from the front, an oversized sell drops the symbol's queue and
/// counts one warning. Returns per-symbol `(quantity, total_cost)` for
/// non-empty positions plus the warning count.
fn reference_fifo(transactions: &[Transaction]) -> (HashMap<String, (i64, i64)>, usize) {
    let mut sorted = transactions.to_vec();
    sorted.sort_by(|a, b| {
        a.date
            .cmp(&b.date)
            .then_with(|| matching_rank(a.side).cmp(&matching_rank(b.side)))
    });

    let mut lots: HashMap<String, VecDeque<(i64, i64)>> = HashMap::new();
    let mut warning_count = 0usize;

    for transaction in &sorted {
        let quantity = i64::try_from(transaction.quantity).unwrap();
        let price = i64::try_from(transaction.price_per_share).unwrap();
        let queue = lots.entry(transaction.symbol.clone()).or_default();

        match transaction.side {
            TransactionSide::Buy => queue.push_back((quantity, price)),
            TransactionSide::Sell => {
                let available: i64 = queue.iter().map(|(q, _)| q).sum();
                if available < quantity {
                    warning_count += 1;
                    queue.clear();
                    continue;
                }
                let mut remaining = quantity;
                while remaining > 0 {
                    let front = queue.front_mut().unwrap();
                    let consumed = remaining.min(front.0);
                    front.0 -= consumed;
                    remaining -= consumed;
                    if front.0 == 0 {
                        queue.pop_front();
                    }
                }
            }
        }
    }

    let mut positions = HashMap::new();
    for (symbol, queue) in lots {
        let quantity: i64 = queue.iter().map(|(q, _)| q).sum();
        if quantity > 0 {
            let cost: i64 = queue.iter().map(|(q, p)| q * p).sum();
            positions.insert(symbol, (quantity, cost));
        }
    }
    (positions, warning_count)
}

// =============================================================================
// Property Tests
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// **Feature: lot-matching, Property 1: Agreement with the reference replay**
    ///
    /// On integer inputs the production matcher must produce exactly the
    /// positions and warning count of the naive i64 reference.
    #[test]
    fn prop_matches_the_reference_replay(
        transactions in arb_transactions(40)
    ) {
        let result = compute_holdings(&transactions);
        let (expected, expected_warnings) = reference_fifo(&transactions);

        prop_assert_eq!(result.warnings.len(), expected_warnings);
        prop_assert_eq!(result.holdings.len(), expected.len());
        for (symbol, (quantity, cost)) in expected {
            let holding = result.holdings.get(&symbol).unwrap();
            prop_assert_eq!(holding.quantity, Decimal::from(quantity));
            prop_assert_eq!(holding.total_cost, Decimal::from(cost));
        }
    }

    /// **Feature: lot-matching, Property 2: Buys accumulate without loss**
    ///
    /// With no sells in the history, every share bought is still held, one
    /// lot per buy, and the cost basis is the exact sum paid.
    #[test]
    fn prop_buys_only_accumulate_everything(
        transactions in arb_transactions(40).prop_map(|mut txs| {
            for tx in &mut txs {
                tx.side = TransactionSide::Buy;
            }
            txs
        })
    ) {
        let result = compute_holdings(&transactions);
        prop_assert!(result.warnings.is_empty());

        let mut expected_qty: HashMap<&str, Decimal> = HashMap::new();
        let mut expected_cost: HashMap<&str, Decimal> = HashMap::new();
        let mut expected_lots: HashMap<&str, usize> = HashMap::new();
        for tx in &transactions {
            *expected_qty.entry(&tx.symbol).or_default() += tx.quantity;
            *expected_cost.entry(&tx.symbol).or_default() += tx.quantity * tx.price_per_share;
            *expected_lots.entry(&tx.symbol).or_default() += 1;
        }

        prop_assert_eq!(result.holdings.len(), expected_qty.len());
        for (symbol, quantity) in expected_qty {
            let holding = result.holdings.get(symbol).unwrap();
            prop_assert_eq!(holding.quantity, quantity);
            prop_assert_eq!(holding.total_cost, expected_cost[symbol]);
            prop_assert_eq!(holding.lots.len(), expected_lots[symbol]);
        }
    }

    /// **Feature: lot-matching, Property 3: Unwarned symbols net out exactly**
    ///
    /// For every symbol that never oversold, the held quantity equals the
    /// sum of its buys minus the sum of its sells, and is never negative.
    #[test]
    fn prop_unwarned_symbols_net_buys_minus_sells(
        transactions in arb_transactions(40)
    ) {
        let result = compute_holdings(&transactions);
        let warned: HashSet<&str> = result
            .warnings
            .iter()
            .map(|warning| warning.symbol.as_str())
            .collect();

        let mut net: HashMap<&str, Decimal> = HashMap::new();
        for tx in &transactions {
            let entry = net.entry(&tx.symbol).or_default();
            match tx.side {
                TransactionSide::Buy => *entry += tx.quantity,
                TransactionSide::Sell => *entry -= tx.quantity,
            }
        }

        for (symbol, expected) in net {
            if warned.contains(symbol) {
                continue;
            }
            prop_assert!(expected >= Decimal::ZERO);
            match result.holdings.get(symbol) {
                Some(holding) => prop_assert_eq!(holding.quantity, expected),
                None => prop_assert_eq!(expected, Decimal::ZERO),
            }
        }
    }

    /// **Feature: lot-matching, Property 4: Replay is deterministic**
    ///
    /// Computing the same ledger twice yields identical holdings and
    /// warnings; the matcher keeps no hidden state between runs.
    #[test]
    fn prop_replay_is_deterministic(
        transactions in arb_transactions(40)
    ) {
        prop_assert_eq!(
            compute_holdings(&transactions),
            compute_holdings(&transactions)
        );
    }

    /// **Feature: lot-matching, Property 5: Input order never matters**
    ///
    /// With unique dates the matching order is fully determined by the
    /// dates, so any permutation of the input produces the same result.
    #[test]
    fn prop_input_order_never_matters_on_distinct_dates(
        (original, shuffled) in arb_distinct_date_transactions(24).prop_flat_map(|txs| {
            (Just(txs.clone()), Just(txs).prop_shuffle())
        })
    ) {
        prop_assert_eq!(compute_holdings(&original), compute_holdings(&shuffled));
    }

    /// **Feature: lot-matching, Property 6: Quantities never go negative**
    ///
    /// Whatever the history throws at it, the matcher never emits a holding
    /// or a lot with a non-positive quantity, and cost fields stay
    /// non-negative.
    #[test]
    fn prop_quantities_never_negative(
        transactions in arb_transactions(40)
    ) {
        let result = compute_holdings(&transactions);
        for holding in result.holdings.values() {
            prop_assert!(holding.quantity > Decimal::ZERO);
            prop_assert!(holding.total_cost >= Decimal::ZERO);
            prop_assert!(holding.average_cost >= Decimal::ZERO);
            for lot in &holding.lots {
                prop_assert!(lot.quantity > Decimal::ZERO);
            }
        }
    }

    /// **Feature: lot-matching, Property 7: Holdings are consistent with their lots**
    ///
    /// A holding's quantity and total cost must always equal the sums over
    /// its surviving lots.
    #[test]
    fn prop_holdings_agree_with_their_lots(
        transactions in arb_transactions(40)
    ) {
        let result = compute_holdings(&transactions);
        for holding in result.holdings.values() {
            let lot_quantity: Decimal = holding.lots.iter().map(|lot| lot.quantity).sum();
            let lot_cost: Decimal = holding
                .lots
                .iter()
                .map(|lot| lot.quantity * lot.cost_per_share)
                .sum();
            prop_assert_eq!(holding.quantity, lot_quantity);
            prop_assert_eq!(holding.total_cost, lot_cost);
        }
    }
}
