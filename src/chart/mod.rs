//! Live Spread Chart
//!
//! Presentation sink fed with the full history every tick.
//! Upper panel: spread % per non-reference exchange over elapsed time.
//! Lower panel: reference exchange raw price on its own scale.
//!
//! Axis bounds come from data min/max plus padding. Narrow ranges get an
//! absolute padding floor so a flat series does not fill the panel edge
//! to edge; wider ranges get a fractional padding.
//!
//! Author: AI-Generated
//! Created: 2026-10-14

pub mod terminal;

pub use terminal::TerminalChart;

use crate::types::PairwiseSpreadSample;
use anyhow::Result;

/// Padding policy for one axis
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisPadding {
    /// Ranges narrower than this get `floor` padding
    pub threshold: f64,
    /// Absolute padding for narrow ranges
    pub floor: f64,
    /// Fraction of the range used as padding otherwise
    pub fraction: f64,
}

impl AxisPadding {
    /// Spread axis, in percentage points
    pub const SPREAD: AxisPadding = AxisPadding {
        threshold: 0.1,
        floor: 0.1,
        fraction: 0.1,
    };

    /// Reference price axis, in quote currency
    pub const PRICE: AxisPadding = AxisPadding {
        threshold: 1.0,
        floor: 1.0,
        fraction: 0.1,
    };

    pub fn padding_for(&self, range: f64) -> f64 {
        if range < self.threshold {
            self.floor
        } else {
            range * self.fraction
        }
    }
}

/// `[min - pad, max + pad]` over `values`; `[-floor, floor]` when empty
pub fn axis_bounds<I>(values: I, padding: AxisPadding) -> [f64; 2]
where
    I: IntoIterator<Item = f64>,
{
    let (min, max) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });

    if min > max {
        return [-padding.floor, padding.floor];
    }

    let pad = padding.padding_for(max - min);
    [min - pad, max + pad]
}

/// One plotted line: (elapsed seconds, value) points
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub name: String,
    pub points: Vec<(f64, f64)>,
}

/// Spread series per non-reference exchange, in first-seen order
pub fn spread_series(history: &[PairwiseSpreadSample]) -> Vec<Series> {
    let Some(origin) = history.first().map(|s| s.timestamp) else {
        return Vec::new();
    };

    let mut series: Vec<Series> = Vec::new();
    for sample in history {
        let x = elapsed_secs(origin, sample);
        for spread in &sample.spreads {
            match series.iter_mut().find(|s| s.name == spread.exchange) {
                Some(s) => s.points.push((x, spread.spread_percent)),
                None => series.push(Series {
                    name: spread.exchange.clone(),
                    points: vec![(x, spread.spread_percent)],
                }),
            }
        }
    }
    series
}

/// Reference exchange raw price over time
pub fn reference_series(history: &[PairwiseSpreadSample]) -> Option<Series> {
    let first = history.first()?;
    let origin = first.timestamp;
    Some(Series {
        name: format!("{} price", first.reference),
        points: history
            .iter()
            .map(|s| (elapsed_secs(origin, s), s.reference_price))
            .collect(),
    })
}

fn elapsed_secs(origin: chrono::DateTime<chrono::Utc>, sample: &PairwiseSpreadSample) -> f64 {
    (sample.timestamp - origin).num_milliseconds() as f64 / 1000.0
}

/// Receives the history as of the current tick
pub trait ChartSink: Send {
    fn render(&mut self, history: &[PairwiseSpreadSample]) -> Result<()>;
}
