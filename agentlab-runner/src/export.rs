//! Reporting and export: JSON report, CSV trade tape, bar files and agent
//! parameter blobs.
//!
//! Persisted reports carry a `schemaVersion` field. Unknown versions are
//! rejected on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::DateTime;

use agentlab_core::agent::ParamBlob;
use agentlab_core::domain::Trade;
use agentlab_core::feed::PriceBar;

use crate::runner::{RunReport, SCHEMA_VERSION};

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize a `RunReport` to pretty JSON.
pub fn export_json(report: &RunReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("failed to serialize RunReport to JSON")
}

/// Deserialize a `RunReport` from JSON, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<RunReport> {
    let report: RunReport =
        serde_json::from_str(json).context("failed to deserialize RunReport from JSON")?;
    if report.schema_version == 0 || report.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (supported: 1..={})",
            report.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(report)
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Export a trade log as CSV.
///
/// Columns: timestamp, time (UTC RFC 3339), kind, amount, price, equity_after.
/// `amount` is empty when the policy used the default sizing.
pub fn export_trades_csv(trades: &[Trade]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["timestamp", "time", "kind", "amount", "price", "equity_after"])?;

    for t in trades {
        let time = DateTime::from_timestamp_millis(t.timestamp)
            .map(|dt| dt.to_rfc3339())
            .unwrap_or_default();
        let amount = t
            .action
            .amount
            .map(|a| format!("{a:.6}"))
            .unwrap_or_default();
        wtr.write_record([
            t.timestamp.to_string().as_str(),
            time.as_str(),
            t.action.kind.as_str(),
            amount.as_str(),
            format!("{:.6}", t.price).as_str(),
            format!("{:.2}", t.equity_after).as_str(),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Export bars in the `timestamp,close,volume` layout the loader reads.
pub fn export_bars_csv(bars: &[PriceBar]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    for bar in bars {
        wtr.serialize(bar)?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the artifact set for one run under `<output_dir>/<run_id>/`:
/// - `report.json`: the full `RunReport`
/// - `trades.csv`: trade tape
///
/// Returns the path to the run directory.
pub fn save_artifacts(report: &RunReport, output_dir: &Path) -> Result<PathBuf> {
    let run_dir = output_dir.join(&report.run_id);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    let json = export_json(report)?;
    std::fs::write(run_dir.join("report.json"), &json)?;

    let trades_csv = export_trades_csv(&report.result.trades)?;
    std::fs::write(run_dir.join("trades.csv"), &trades_csv)?;

    Ok(run_dir)
}

/// Load a `RunReport` from an artifact directory's report.json.
pub fn load_artifacts(dir: &Path) -> Result<RunReport> {
    let path = dir.join("report.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json)
}

// ─── Agent parameters ───────────────────────────────────────────────

/// Write a parameter blob as little-endian f64 bytes.
pub fn save_params(blob: &ParamBlob, path: &Path) -> Result<()> {
    std::fs::write(path, blob.to_bytes())
        .with_context(|| format!("failed to write parameters to {}", path.display()))
}

pub fn load_params(path: &Path) -> Result<ParamBlob> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("failed to read parameters from {}", path.display()))?;
    ParamBlob::from_bytes(&bytes)
        .with_context(|| format!("malformed parameter file {}", path.display()))
}
