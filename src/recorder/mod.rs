//! Recorder Module
//!
//! Persistence sinks for the tick loop. The monitor hands each complete
//! pairwise sample and each triangular opportunity to a sink; how and
//! where it is stored is the sink's business. Sink errors are reported
//! back to the caller, which logs them and carries on.
//!
//! Author: AI-Generated
//! Created: 2026-10-14

pub mod csv_logger;

pub use csv_logger::{OpportunityCsvLogger, SpreadCsvLogger};

use crate::types::{PairwiseSpreadSample, TriangularOpportunity};
use anyhow::Result;

/// Accepts complete pairwise samples
pub trait SampleSink: Send {
    fn record_sample(&mut self, sample: &PairwiseSpreadSample) -> Result<()>;
}

/// Accepts profitable triangular opportunities
pub trait OpportunitySink: Send {
    fn record_opportunity(&mut self, opportunity: &TriangularOpportunity) -> Result<()>;
}
