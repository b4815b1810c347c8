//! CSV Spread Loggers
//!
//! Append-only CSV files for spread samples and triangular opportunities.
//! The header is written once, before the first row of a new or empty
//! file; reopening a file appends rows without a second header. A file
//! whose header does not match the configured columns is refused.
//!
//! Files:
//!   spreads.csv     timestamp, <ex>_price..., <ex>_spread_pct... (non-reference)
//!   triangular.csv  timestamp, exchange, path, starting_amount, final_amount,
//!                   profit, profit_percent
//!
//! Author: AI-Generated
//! Created: 2026-10-14

use super::{OpportunitySink, SampleSink};
use crate::types::{PairwiseSpreadSample, TriangularOpportunity};
use anyhow::{bail, Context, Result};
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const SPREAD_FILE: &str = "spreads.csv";
pub const TRIANGULAR_FILE: &str = "triangular.csv";

/// Append-mode CSV file with a one-time header
struct CsvFile {
    path: PathBuf,
    header: String,
    headers_written: bool,
}

impl CsvFile {
    fn new(path: PathBuf, header: String) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create data directory: {:?}", parent))?;
        }

        let existing = if path.exists() {
            read_first_line(&path)?
        } else {
            None
        };
        let headers_written = match existing {
            Some(existing) if existing != header => bail!(
                "{} has a different header (found: {}, expected: {}); \
                 move it aside or use another data directory",
                path.display(),
                existing,
                header
            ),
            Some(_) => {
                info!("CSV logger: appending to existing {}", path.display());
                true
            }
            None => {
                info!("CSV logger: will write header to {}", path.display());
                false
            }
        };

        Ok(Self {
            path,
            header,
            headers_written,
        })
    }

    fn append(&mut self, fields: &[String]) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open CSV file: {:?}", self.path))?;

        if !self.headers_written {
            writeln!(file, "{}", self.header)?;
            self.headers_written = true;
        }

        let line = fields
            .iter()
            .map(|f| escape_csv_field(f))
            .collect::<Vec<_>>()
            .join(",");
        writeln!(file, "{}", line)?;
        file.flush()?;

        debug!("CSV row appended to {}", self.path.display());
        Ok(())
    }

    fn record_count(&self) -> Result<usize> {
        count_records(&self.path)
    }
}

fn read_first_line(path: &Path) -> Result<Option<String>> {
    let file = File::open(path).with_context(|| format!("Failed to read {:?}", path))?;
    let mut line = String::new();
    let n = BufReader::new(file).read_line(&mut line)?;
    if n == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim_end().to_string()))
}

/// Data rows in a CSV file (header excluded)
fn count_records(path: &Path) -> Result<usize> {
    if !path.exists() {
        return Ok(0);
    }
    let content = fs::read_to_string(path)?;
    Ok(content.lines().count().saturating_sub(1))
}

/// Escape a CSV field that may contain special characters
fn escape_csv_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Logs complete pairwise samples, one row per tick
pub struct SpreadCsvLogger {
    exchanges: Vec<String>,
    file: CsvFile,
}

impl SpreadCsvLogger {
    /// `exchanges` in configured order; the first is the reference
    pub fn new<P: AsRef<Path>>(data_dir: P, exchanges: &[String]) -> Result<Self> {
        if exchanges.len() < 2 {
            bail!("Spread logger needs at least two exchanges");
        }
        let header = Self::header(exchanges);
        let file = CsvFile::new(data_dir.as_ref().join(SPREAD_FILE), header)?;
        Ok(Self {
            exchanges: exchanges.to_vec(),
            file,
        })
    }

    fn header(exchanges: &[String]) -> String {
        let mut columns = vec!["timestamp".to_string()];
        columns.extend(exchanges.iter().map(|e| format!("{}_price", e)));
        columns.extend(exchanges[1..].iter().map(|e| format!("{}_spread_pct", e)));
        columns.join(",")
    }

    pub fn path(&self) -> &Path {
        &self.file.path
    }

    pub fn record_count(&self) -> Result<usize> {
        self.file.record_count()
    }
}

impl SampleSink for SpreadCsvLogger {
    fn record_sample(&mut self, sample: &PairwiseSpreadSample) -> Result<()> {
        let mut fields = vec![sample.timestamp.to_rfc3339()];

        for exchange in &self.exchanges {
            let price = sample
                .price_of(exchange)
                .with_context(|| format!("Sample has no price for {}", exchange))?;
            fields.push(price.to_string());
        }
        for exchange in &self.exchanges[1..] {
            let spread = sample
                .spread_of(exchange)
                .with_context(|| format!("Sample has no spread for {}", exchange))?;
            fields.push(format!("{:.6}", spread));
        }

        self.file.append(&fields)
    }
}

/// Logs profitable triangular opportunities, one row each
pub struct OpportunityCsvLogger {
    file: CsvFile,
}

impl OpportunityCsvLogger {
    const HEADERS: &'static [&'static str] = &[
        "timestamp",
        "exchange",
        "path",
        "starting_amount",
        "final_amount",
        "profit",
        "profit_percent",
    ];

    pub fn new<P: AsRef<Path>>(data_dir: P) -> Result<Self> {
        let file = CsvFile::new(
            data_dir.as_ref().join(TRIANGULAR_FILE),
            Self::HEADERS.join(","),
        )?;
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        &self.file.path
    }

    pub fn record_count(&self) -> Result<usize> {
        self.file.record_count()
    }
}

impl OpportunitySink for OpportunityCsvLogger {
    fn record_opportunity(&mut self, opp: &TriangularOpportunity) -> Result<()> {
        let fields = vec![
            opp.timestamp.to_rfc3339(),
            opp.exchange.clone(),
            opp.path.clone(),
            opp.starting_amount.to_string(),
            format!("{:.8}", opp.final_amount),
            format!("{:.8}", opp.profit),
            format!("{:.4}", opp.profit_percent),
        ];
        self.file.append(&fields)
    }
}
