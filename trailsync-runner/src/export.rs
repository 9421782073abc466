//! Result export: JSON and CSV artifact generation.
//!
//! - **JSON**: full round-trip serialization of a `SessionResult` with schema versioning
//! - **CSV**: trade tape for external analysis tools
//!
//! Unknown schema versions are rejected on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use trailsync_core::domain::TradeRecord;

use crate::runner::{SessionResult, SCHEMA_VERSION};

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize a `SessionResult` to pretty JSON.
pub fn export_json(result: &SessionResult) -> Result<String> {
    serde_json::to_string_pretty(result).context("failed to serialize SessionResult to JSON")
}

/// Deserialize a `SessionResult` from JSON, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<SessionResult> {
    let result: SessionResult =
        serde_json::from_str(json).context("failed to deserialize SessionResult from JSON")?;
    if result.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            result.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(result)
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Export a trade list as CSV.
///
/// Columns: trade, side, entry_time, entry_price, exit_time, exit_price,
/// quantity, realized_pnl
pub fn export_trades_csv(trades: &[TradeRecord]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "trade",
        "side",
        "entry_time",
        "entry_price",
        "exit_time",
        "exit_price",
        "quantity",
        "realized_pnl",
    ])?;

    for t in trades {
        wtr.write_record([
            &t.trade_number.to_string(),
            &t.side.to_string(),
            &t.entry_time.to_rfc3339(),
            &format!("{:.6}", t.entry_price),
            &t.exit_time.to_rfc3339(),
            &format!("{:.6}", t.exit_price),
            &t.quantity.to_string(),
            &format!("{:.2}", t.realized_pnl),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the artifact set for a single session.
///
/// Creates a directory named `{name}_{run_id prefix}/` under `output_dir`
/// containing:
/// - `result.json`: the full `SessionResult`
/// - `trades.csv`: trade tape
///
/// Returns the path to the created directory.
pub fn save_artifacts(result: &SessionResult, output_dir: &Path) -> Result<PathBuf> {
    let short_id: String = result.run_id.chars().take(12).collect();
    let run_dir = output_dir.join(format!("{}_{}", result.config.name, short_id));
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    let json = export_json(result)?;
    std::fs::write(run_dir.join("result.json"), &json)?;

    let trades_csv = export_trades_csv(&result.trades)?;
    std::fs::write(run_dir.join("trades.csv"), &trades_csv)?;

    Ok(run_dir)
}

/// Load a `SessionResult` from an artifact directory's result.json.
pub fn load_artifacts(dir: &Path) -> Result<SessionResult> {
    let path = dir.join("result.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json)
}
