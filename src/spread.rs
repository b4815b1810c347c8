//! Spread Calculator
//!
//! Pure functions over one tick's quotes:
//! - Pairwise: each exchange against the reference (first-listed) exchange
//! - Triangular: start → first → second → start round trip on one exchange
//!
//! Sign convention for pairwise spread: positive means the reference
//! exchange is more expensive than the other exchange.
//!
//! Triangular legs pay the ask on the two buys and hit the bid on the
//! final sell. Only strictly profitable cycles produce an opportunity.
//!
//! Author: AI-Generated
//! Created: 2026-10-14

use crate::types::{
    ExchangePrice, ExchangeSpread, PairwiseSpreadSample, PriceQuote, TriangleQuotes,
    TrianglePath, TriangularOpportunity,
};
use chrono::{DateTime, Utc};

/// Percentage by which `reference` exceeds `price`
pub fn spread_percent(reference: f64, price: f64) -> f64 {
    (reference - price) / price * 100.0
}

/// Build the pairwise sample for one tick.
///
/// `quotes` must hold one quote per configured exchange in configured
/// order; the first quote is the reference. Returns `None` for an empty
/// slice.
pub fn pairwise_spread(
    timestamp: DateTime<Utc>,
    quotes: &[PriceQuote],
) -> Option<PairwiseSpreadSample> {
    let (reference, others) = quotes.split_first()?;

    let prices = quotes
        .iter()
        .map(|q| ExchangePrice {
            exchange: q.exchange.clone(),
            price: q.last_price,
        })
        .collect();

    let spreads = others
        .iter()
        .map(|q| ExchangeSpread {
            exchange: q.exchange.clone(),
            spread_percent: spread_percent(reference.last_price, q.last_price),
        })
        .collect();

    Some(PairwiseSpreadSample {
        timestamp,
        reference: reference.exchange.clone(),
        reference_price: reference.last_price,
        prices,
        spreads,
    })
}

/// Amount of `start` currency after running the full cycle
pub fn triangle_final_amount(start_amount: f64, quotes: &TriangleQuotes) -> f64 {
    let first_amount = start_amount / quotes.entry.ask;
    let second_amount = first_amount / quotes.cross.ask;
    second_amount * quotes.exit.bid
}

/// Evaluate the triangle; `Some` only when the cycle ends above `start_amount`
pub fn triangular_opportunity(
    timestamp: DateTime<Utc>,
    start_amount: f64,
    path: &TrianglePath,
    quotes: &TriangleQuotes,
) -> Option<TriangularOpportunity> {
    let final_amount = triangle_final_amount(start_amount, quotes);
    if !final_amount.is_finite() {
        return None;
    }

    let profit = final_amount - start_amount;
    if profit <= 0.0 {
        return None;
    }

    Some(TriangularOpportunity {
        timestamp,
        exchange: quotes.exchange.clone(),
        starting_amount: start_amount,
        final_amount,
        profit,
        profit_percent: profit / start_amount * 100.0,
        path: path.describe(),
    })
}
