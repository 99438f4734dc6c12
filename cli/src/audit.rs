//! JSONL audit trail logging.
//!
//! Each CLI run appends events to an audit file, one JSON object per line
//! (the same layout basketbook uses for persisted records).

use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use basketbook::{Attribution, RebalanceBooking};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::Result;

/// An audit event written to the JSONL trail.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEvent {
    pub event: &'static str,
    pub ts: DateTime<Utc>,
    #[serde(flatten)]
    pub data: serde_json::Value,
}

/// Append-only audit logger.
pub struct AuditLog {
    writer: BufWriter<std::fs::File>,
}

impl AuditLog {
    /// Open (or create) the audit log file for appending.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            writer: BufWriter::new(file),
        })
    }

    /// Log an event with arbitrary JSON data.
    pub fn log(&mut self, event: &'static str, data: serde_json::Value) -> Result<()> {
        let entry = AuditEvent {
            event,
            ts: Utc::now(),
            data,
        };
        let json = serde_json::to_string(&entry)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        writeln!(self.writer, "{json}")?;
        self.writer.flush()?;
        Ok(())
    }

    /// Log a simple event with no additional data.
    pub fn log_simple(&mut self, event: &'static str) -> Result<()> {
        self.log(event, serde_json::json!({}))
    }
}

/// Log the inputs of a run.
pub fn log_run_started(
    audit: &mut AuditLog,
    prices_file: &str,
    schedule_file: Option<&str>,
    symbols: usize,
    dates: usize,
) -> Result<()> {
    audit.log(
        "run_started",
        serde_json::json!({
            "prices_file": prices_file,
            "schedule_file": schedule_file,
            "symbols": symbols,
            "dates": dates,
        }),
    )
}

/// Log one booked rebalance.
pub fn log_rebalance(audit: &mut AuditLog, booking: &RebalanceBooking) -> Result<()> {
    audit.log(
        "rebalance_booked",
        serde_json::json!({
            "date": booking.date.to_string(),
            "turnover": booking.turnover,
            "cost": booking.cost,
            "reference_nav": booking.reference_nav,
        }),
    )
}

/// Log the outcome of a completed run.
pub fn log_run_completed(audit: &mut AuditLog, attribution: &Attribution) -> Result<()> {
    audit.log(
        "run_completed",
        serde_json::json!({
            "initial_nav": attribution.initial_nav,
            "final_nav": attribution.final_nav,
            "total_return": attribution.total_return,
            "pnl": attribution.per_unit,
        }),
    )
}

/// Log a failed run.
pub fn log_run_failed(audit: &mut AuditLog, error: &str) -> Result<()> {
    audit.log("run_failed", serde_json::json!({ "error": error }))
}
