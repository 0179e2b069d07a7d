//! Response log persistence
//!
//! Features:
//! - One `ResponseRecord` per scored trial, written as it happens
//! - CSV file with a fixed header, flushed after every record
//! - In-memory sink for headless runs and tests

use std::fs::File;
use std::io::Write;
use std::path::Path;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::settings::SessionInfo;
use crate::sim::TrialOutcome;

/// Header row of the response log
pub const HEADER: [&str; 3] = ["response_time", "response_score", "timed_out"];

/// Written in place of latency and score when a trial timed out
pub const TIMED_OUT_SENTINEL: &str = "timed out";

#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("response log already closed")]
    Closed,
}

/// Persisted outcome of one scored trial
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResponseRecord {
    /// Seconds from end of animation to submission (`None` when timed out)
    pub latency_secs: Option<f64>,
    /// Targets correctly selected (`None` when timed out)
    pub score: Option<usize>,
    pub timed_out: bool,
}

impl ResponseRecord {
    pub fn submitted(latency_secs: f64, score: usize) -> Self {
        Self {
            latency_secs: Some(latency_secs),
            score: Some(score),
            timed_out: false,
        }
    }

    pub fn timed_out() -> Self {
        Self {
            latency_secs: None,
            score: None,
            timed_out: true,
        }
    }

    /// Text fields in header order
    pub fn fields(&self) -> [String; 3] {
        let latency = self
            .latency_secs
            .map_or_else(|| TIMED_OUT_SENTINEL.to_string(), |l| l.to_string());
        let score = self
            .score
            .map_or_else(|| TIMED_OUT_SENTINEL.to_string(), |s| s.to_string());
        let timed_out = if self.timed_out { "True" } else { "False" };
        [latency, score, timed_out.to_string()]
    }
}

impl From<&TrialOutcome> for ResponseRecord {
    fn from(outcome: &TrialOutcome) -> Self {
        match *outcome {
            TrialOutcome::Submitted {
                score, latency_secs, ..
            } => Self::submitted(latency_secs, score),
            TrialOutcome::TimedOut => Self::timed_out(),
        }
    }
}

/// Append-only destination for scored trial records
pub trait PersistenceSink {
    fn append(&mut self, record: &ResponseRecord) -> Result<(), PersistenceError>;

    /// Flush and release the destination; later appends fail.
    /// Closing twice is a no-op.
    fn close(&mut self) -> Result<(), PersistenceError>;
}

/// CSV response log
pub struct CsvSink<W: Write = File> {
    writer: Option<csv::Writer<W>>,
}

impl CsvSink<File> {
    /// Create (truncate) the log file and write the header
    pub fn create(path: &Path) -> Result<Self, PersistenceError> {
        let file = File::create(path)?;
        log::info!("Writing responses to {}", path.display());
        Self::from_writer(file)
    }
}

impl<W: Write> CsvSink<W> {
    pub fn from_writer(inner: W) -> Result<Self, PersistenceError> {
        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(inner);
        writer.write_record(HEADER)?;
        writer.flush()?;
        Ok(Self {
            writer: Some(writer),
        })
    }
}

impl<W: Write> PersistenceSink for CsvSink<W> {
    fn append(&mut self, record: &ResponseRecord) -> Result<(), PersistenceError> {
        let writer = self.writer.as_mut().ok_or(PersistenceError::Closed)?;
        writer.write_record(record.fields())?;
        writer.flush()?;
        Ok(())
    }

    fn close(&mut self) -> Result<(), PersistenceError> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
            log::info!("Response log closed");
        }
        Ok(())
    }
}

/// Keeps records in memory
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    pub records: Vec<ResponseRecord>,
    pub closed: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PersistenceSink for MemorySink {
    fn append(&mut self, record: &ResponseRecord) -> Result<(), PersistenceError> {
        if self.closed {
            return Err(PersistenceError::Closed);
        }
        self.records.push(*record);
        Ok(())
    }

    fn close(&mut self) -> Result<(), PersistenceError> {
        self.closed = true;
        Ok(())
    }
}

/// Log file name: `<Mon>_<DD>_<HHMM> pcpnt_<participant>_obsvr_<observer>.csv`
pub fn log_file_name(info: &SessionInfo, at: NaiveDateTime) -> String {
    format!(
        "{} pcpnt_{}_obsvr_{}.csv",
        at.format("%b_%d_%H%M"),
        info.participant,
        info.observer
    )
}
