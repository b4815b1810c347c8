//! Spread History
//!
//! Append-only, in-process record of every complete pairwise sample.
//! Feeds the chart each tick and the run summary at shutdown.
//! No eviction: grows for the lifetime of the run.
//!
//! Author: AI-Generated
//! Created: 2026-10-14

use crate::types::PairwiseSpreadSample;
use std::collections::HashMap;

/// Ordered sequence of pairwise samples
#[derive(Debug, Default)]
pub struct SpreadHistory {
    samples: Vec<PairwiseSpreadSample>,
}

/// Spread statistics for one non-reference exchange
#[derive(Debug, Clone, PartialEq)]
pub struct SpreadStats {
    pub exchange: String,
    pub samples: usize,
    pub min_spread: f64,
    pub max_spread: f64,
    pub mean_spread: f64,
}

impl SpreadHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, sample: PairwiseSpreadSample) {
        self.samples.push(sample);
    }

    /// The history as of the current tick
    pub fn samples(&self) -> &[PairwiseSpreadSample] {
        &self.samples
    }

    pub fn latest(&self) -> Option<&PairwiseSpreadSample> {
        self.samples.last()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Per-exchange spread statistics, in first-seen order
    pub fn summary(&self) -> Vec<SpreadStats> {
        let mut order: Vec<String> = Vec::new();
        let mut acc: HashMap<String, (usize, f64, f64, f64)> = HashMap::new();

        for sample in &self.samples {
            for spread in &sample.spreads {
                let v = spread.spread_percent;
                let entry = acc.entry(spread.exchange.clone()).or_insert_with(|| {
                    order.push(spread.exchange.clone());
                    (0, f64::INFINITY, f64::NEG_INFINITY, 0.0)
                });
                entry.0 += 1;
                entry.1 = entry.1.min(v);
                entry.2 = entry.2.max(v);
                entry.3 += v;
            }
        }

        order
            .into_iter()
            .filter_map(|exchange| {
                let (count, min, max, sum) = acc.remove(&exchange)?;
                Some(SpreadStats {
                    exchange,
                    samples: count,
                    min_spread: min,
                    max_spread: max,
                    mean_spread: sum / count as f64,
                })
            })
            .collect()
    }
}
