//! Trailsync CLI: replay, sweep, and config checking commands.
//!
//! Commands:
//! - `run`: replay a bar file through one session config and save artifacts
//! - `sweep`: grid-search the stop parameters over one bar file
//! - `check-config`: parse and validate a session config, print its run id

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use trailsync_runner::{
    load_bars, run_session_from_file, save_artifacts, ParamGrid, ParamSweep, SessionConfig,
    SessionResult,
};

#[derive(Parser)]
#[command(
    name = "trailsync",
    about = "Trailsync CLI: position reconciliation and adaptive trailing stops"
)]
struct Cli {
    /// Log level used when RUST_LOG is not set.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a bar file through a session config.
    Run {
        /// Path to a TOML session config.
        #[arg(long)]
        config: PathBuf,

        /// CSV bar file with indicator columns.
        #[arg(long)]
        bars: PathBuf,

        /// Output directory for result.json and trades.csv.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,
    },
    /// Sweep the stop parameters over a bar file.
    Sweep {
        /// Path to the base TOML session config.
        #[arg(long)]
        config: PathBuf,

        /// CSV bar file with indicator columns.
        #[arg(long)]
        bars: PathBuf,

        /// Trailing distances in ticks (e.g., 12,16,20).
        #[arg(long, value_delimiter = ',')]
        trailing: Option<Vec<f64>>,

        /// Volatility multipliers (e.g., 1.5,2.5).
        #[arg(long, value_delimiter = ',')]
        atr: Option<Vec<f64>>,

        /// Profit triggers in ticks.
        #[arg(long, value_delimiter = ',')]
        trigger: Option<Vec<f64>>,

        /// Tightening rates.
        #[arg(long, value_delimiter = ',')]
        tightening: Option<Vec<f64>>,

        /// Number of results to print.
        #[arg(long, default_value_t = 5)]
        top: usize,

        /// Run combinations one at a time.
        #[arg(long, default_value_t = false)]
        sequential: bool,
    },
    /// Validate a session config and print its run id.
    CheckConfig {
        /// Path to a TOML session config.
        #[arg(long)]
        config: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level)?;

    match cli.command {
        Commands::Run {
            config,
            bars,
            output_dir,
        } => run_cmd(config, bars, output_dir),
        Commands::Sweep {
            config,
            bars,
            trailing,
            atr,
            trigger,
            tightening,
            top,
            sequential,
        } => {
            let defaults = ParamGrid::stop_default();
            let grid = ParamGrid {
                trailing_stop_points: trailing.unwrap_or(defaults.trailing_stop_points),
                atr_multipliers: atr.unwrap_or(defaults.atr_multipliers),
                profit_trigger_points: trigger.unwrap_or(defaults.profit_trigger_points),
                tightening_rates: tightening.unwrap_or(defaults.tightening_rates),
            };
            sweep_cmd(config, bars, grid, top, sequential)
        }
        Commands::CheckConfig { config } => check_config_cmd(config),
    }
}

fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {e}"))
}

fn run_cmd(config_path: PathBuf, bars_path: PathBuf, output_dir: PathBuf) -> Result<()> {
    let config = SessionConfig::load(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;
    let result = run_session_from_file(&config, &bars_path)?;

    print_summary(&result);

    let run_dir = save_artifacts(&result, &output_dir)?;
    println!("Artifacts saved to: {}", run_dir.display());
    Ok(())
}

fn sweep_cmd(
    config_path: PathBuf,
    bars_path: PathBuf,
    grid: ParamGrid,
    top: usize,
    sequential: bool,
) -> Result<()> {
    if grid.size() == 0 {
        bail!("sweep grid is empty: every parameter list needs at least one value");
    }
    let base = SessionConfig::load(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;
    let bars = load_bars(&bars_path)?;

    let results = ParamSweep::new()
        .with_parallelism(!sequential)
        .sweep(&grid, &base, &bars)?;
    info!(combinations = grid.size(), valid = results.len(), "sweep finished");

    println!();
    println!("=== Sweep: {} of {} combinations ===", results.len(), grid.size());
    println!(
        "{:<4} {:>8} {:>6} {:>8} {:>6} {:>7} {:>10} {:>8} {:>8}",
        "#", "trail", "atr", "trigger", "rate", "trades", "pnl", "win%", "maxdd"
    );
    for (rank, result) in results.ranked_by_pnl().into_iter().take(top).enumerate() {
        let s = &result.config.strategy;
        println!(
            "{:<4} {:>8.1} {:>6.2} {:>8.1} {:>6.2} {:>7} {:>10.2} {:>8.1} {:>8.2}",
            rank + 1,
            s.trailing_stop_points,
            s.atr_multiplier,
            s.profit_trigger_points,
            s.progressive_tightening_rate,
            result.summary.trade_count,
            result.summary.total_pnl,
            result.summary.win_rate,
            result.summary.max_drawdown,
        );
    }
    Ok(())
}

fn check_config_cmd(config_path: PathBuf) -> Result<()> {
    let config = SessionConfig::load(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;
    println!("{}", serde_json::to_string_pretty(&config)?);
    println!("run_id: {}", config.run_id());
    Ok(())
}

fn print_summary(result: &SessionResult) {
    let m = &result.summary;
    println!();
    println!("=== Session Result ===");
    println!("Session:        {}", result.config.name);
    println!("Symbol:         {}", result.config.symbol);
    println!("Bars:           {}", result.bar_count);
    println!(
        "Intents:        {} entries, {} stop exits, {} signal exits, {} session exits",
        result.entries, result.stop_exits, result.signal_exits, result.session_exits
    );
    println!("Trades:         {}", m.trade_count);
    println!();
    println!("--- Performance ---");
    println!("Total P&L:      {:.2}", m.total_pnl);
    println!("Long / Short:   {:.2} / {:.2}", m.long_pnl, m.short_pnl);
    println!("Win Rate:       {:.1}%", m.win_rate);
    println!("Profit Factor:  {:.2}", m.profit_factor);
    println!("Avg Win/Loss:   {:.2} / {:.2}", m.average_win, m.average_loss);
    println!("Largest W/L:    {:.2} / {:.2}", m.largest_win, m.largest_loss);
    println!("Max Drawdown:   {:.2}", m.max_drawdown);
    println!("Max Consec Win: {}", m.max_consecutive_wins);
    println!("Max Consec Loss:{}", m.max_consecutive_losses);
    println!();
    println!("--- Last {} trades ---", result.recent.count);
    println!(
        "P&L {:.2}, {} W / {} L ({:.1}%)",
        result.recent.total_pnl, result.recent.wins, result.recent.losses, result.recent.win_rate
    );
    println!();
    println!("--- Synchronization ---");
    println!(
        "Reports:        {} debounced, {} in sync, {} corrected",
        result.reports.debounced, result.reports.in_sync, result.reports.corrected
    );
    println!("Forced resyncs: {}", result.forced_resyncs);
    for (label, count) in &result.rejections {
        println!("Rejected:       {label} x{count}");
    }
    if !result.final_local.is_flat() {
        println!();
        println!("WARNING: session ended with an open position ({})", result.final_local);
    }
}
