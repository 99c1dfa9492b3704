//! SwarmDesk CLI: run the agent desk, inspect one symbol, close positions.
//!
//! Commands:
//! - `run`: tick the desk, optionally resuming from and saving a snapshot
//! - `scan`: every persona's decision on one symbol, nothing opened
//! - `personas`: the configured roster and its risk presets
//! - `close`: manually close a position inside a saved snapshot

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use swarmdesk_core::domain::{Agent, AgentId, PositionId};
use swarmdesk_runner::{DataMode, Desk, DeskConfig, DeskSnapshot, TickReport};
use tracing::info;

#[derive(Parser)]
#[command(
    name = "swarmdesk",
    about = "SwarmDesk CLI: autonomous persona trading agents on a simulated desk"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Flags shared by every command that builds a desk.
#[derive(clap::Args)]
struct DeskArgs {
    /// Path to a TOML desk config. Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the master seed.
    #[arg(long)]
    seed: Option<u64>,

    /// Offline mode: seeded synthetic prices, no network access.
    #[arg(long, default_value_t = false)]
    offline: bool,

    /// Replay candles from a CSV directory instead of live data.
    #[arg(long, conflicts_with = "offline")]
    csv_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the desk for a number of ticks.
    Run {
        #[command(flatten)]
        desk: DeskArgs,

        /// Number of ticks to run.
        #[arg(long, default_value_t = 100)]
        ticks: u64,

        /// Milliseconds between ticks. Defaults to the config value.
        #[arg(long)]
        tick_ms: Option<u64>,

        /// Resume from a snapshot written by a previous run.
        #[arg(long)]
        resume: Option<PathBuf>,

        /// Write the final desk snapshot here.
        #[arg(long)]
        snapshot: Option<PathBuf>,

        /// Export settled trades to this CSV file.
        #[arg(long)]
        trades_csv: Option<PathBuf>,
    },
    /// Show every persona's decision on one symbol.
    Scan {
        #[command(flatten)]
        desk: DeskArgs,

        /// Symbol to evaluate (e.g., BTCUSDT).
        symbol: String,
    },
    /// List the configured personas.
    Personas {
        /// Path to a TOML desk config.
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Close an open position in a saved snapshot and write it back.
    Close {
        /// Snapshot file to edit.
        #[arg(long)]
        snapshot: PathBuf,

        /// Agent id (e.g., scalper).
        #[arg(long)]
        agent: String,

        /// Position id (e.g., scalper-3).
        #[arg(long)]
        position: String,

        /// Exit price. The position's entry price when omitted.
        #[arg(long)]
        price: Option<f64>,

        /// Path to the TOML desk config the snapshot was taken with.
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            desk,
            ticks,
            tick_ms,
            resume,
            snapshot,
            trades_csv,
        } => run_desk(desk, ticks, tick_ms, resume, snapshot, trades_csv),
        Commands::Scan { desk, symbol } => run_scan(desk, &symbol),
        Commands::Personas { config } => run_personas(config.as_deref()),
        Commands::Close {
            snapshot,
            agent,
            position,
            price,
            config,
        } => run_close(&snapshot, &agent, &position, price, config.as_deref()),
    }
}

fn load_config(path: Option<&Path>) -> Result<DeskConfig> {
    match path {
        Some(path) => DeskConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Ok(DeskConfig::default()),
    }
}

fn build_config(args: &DeskArgs) -> Result<DeskConfig> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(seed) = args.seed {
        config.desk.seed = seed;
    }
    if args.offline {
        config.data.mode = DataMode::Synthetic;
    }
    if let Some(dir) = &args.csv_dir {
        config.data.mode = DataMode::Csv;
        config.data.csv_dir = Some(dir.clone());
    }
    Ok(config)
}

fn run_desk(
    args: DeskArgs,
    ticks: u64,
    tick_ms: Option<u64>,
    resume: Option<PathBuf>,
    snapshot_path: Option<PathBuf>,
    trades_csv: Option<PathBuf>,
) -> Result<()> {
    let mut config = build_config(&args)?;
    if let Some(ms) = tick_ms {
        config.desk.tick_ms = ms;
    }
    if config.desk.tick_ms == 0 {
        bail!("--tick-ms must be positive");
    }
    let interval = Duration::from_millis(config.desk.tick_ms);
    let desk = Desk::from_config(config)?;

    if let Some(path) = &resume {
        let snapshot = DeskSnapshot::load(path)
            .with_context(|| format!("failed to load snapshot {}", path.display()))?;
        let restored = desk.restore(snapshot)?;
        println!("Resumed {restored} agent(s) from {}", path.display());
    }

    let mut settled = 0usize;
    let mut opened = 0usize;
    let mut offline_ticks = 0u64;
    for i in 0..ticks {
        let started = Instant::now();
        let report = desk.tick()?;
        print_tick(&report);
        settled += report.settlements.len();
        opened += report.opened.len();
        if !report.online {
            offline_ticks += 1;
        }
        if i + 1 < ticks {
            if let Some(rest) = interval.checked_sub(started.elapsed()) {
                std::thread::sleep(rest);
            }
        }
    }
    // Scans launched on the last tick report only once they finish.
    let last = desk.finish();
    print_tick(&last);
    opened += last.opened.len();
    info!(ticks, opened, settled, offline_ticks, "run complete");

    print_agents(&desk.agents());
    println!("Ticks: {ticks} ({offline_ticks} offline)   Opened: {opened}   Settled: {settled}");

    if let Some(path) = &snapshot_path {
        desk.snapshot()
            .save(path)
            .with_context(|| format!("failed to save snapshot {}", path.display()))?;
        println!("Snapshot saved to: {}", path.display());
    }
    if let Some(path) = &trades_csv {
        desk.journal().export_trades_csv(path)?;
        println!("Trades exported to: {}", path.display());
    }
    Ok(())
}

fn print_tick(report: &TickReport) {
    for (_, message) in &report.opened {
        println!("[{:>5}] OPEN  {message}", report.tick);
    }
    for s in &report.settlements {
        println!(
            "[{:>5}] {:<5} {} {} {} @ {} ({:+.2})",
            report.tick,
            s.outcome.to_string(),
            s.agent,
            s.reason,
            s.symbol,
            s.exit_price,
            s.pnl
        );
    }
    if let Some(news) = &report.rotated_news {
        println!("[{:>5}] NEWS  {} ({} {})", report.tick, news.headline, news.symbol, news.bias);
    }
}

fn run_scan(args: DeskArgs, symbol: &str) -> Result<()> {
    let desk = Desk::from_config(build_config(&args)?)?;
    // Synthetic and CSV sources anchor candles on the latest price.
    desk.feed().refresh_prices()?;
    let symbol = symbol.to_uppercase();
    let evaluations = desk.evaluate(&symbol)?;

    println!();
    println!("=== {symbol} ===");
    if let Some(news) = desk.active_news() {
        println!("Active news: {} ({} {})", news.headline, news.symbol, news.bias);
    }
    println!();
    println!(
        "{:<16} {:<5} {:>14} {:>12} {:<5} {:>4}  Rationale",
        "Agent", "TF", "Price", "ATR", "Side", "Conf"
    );
    println!("{}", "-".repeat(72));
    for e in &evaluations {
        println!(
            "{:<16} {:<5} {:>14.6} {:>12.6} {:<5} {:>4}  {}",
            e.agent.as_str(),
            e.interval.code(),
            e.price,
            e.atr,
            e.decision.action.to_string(),
            e.decision.confidence,
            e.decision.rationale
        );
    }
    Ok(())
}

fn run_personas(config: Option<&Path>) -> Result<()> {
    let config = load_config(config)?;
    println!(
        "{:<16} {:<20} {:<5} {:>4} {:>6} {:>6} {:>11} {:>11}",
        "Name", "Strategy", "TF", "Lev", "Risk×", "R", "Stop %", "TP/SL %"
    );
    println!("{}", "-".repeat(86));
    for p in config.personas() {
        let r = &p.risk;
        println!(
            "{:<16} {:<20} {:<5} {:>3}x {:>6.1} {:>6.1} {:>5.1}-{:<5.1} {:>5.1}-{:<5.1}",
            p.name,
            format!("{:?}", p.kind),
            p.interval.code(),
            p.leverage,
            r.risk_multiplier,
            r.reward_ratio,
            r.min_stop_pct * 100.0,
            r.max_stop_pct * 100.0,
            r.min_tp_pct * 100.0,
            r.max_tp_pct * 100.0
        );
    }
    Ok(())
}

fn run_close(
    snapshot_path: &Path,
    agent: &str,
    position: &str,
    price: Option<f64>,
    config: Option<&Path>,
) -> Result<()> {
    let mut config = load_config(config)?;
    // Replaying a snapshot never touches the network.
    config.data.mode = DataMode::Synthetic;
    let desk = Desk::from_config(config)?;

    let snapshot = DeskSnapshot::load(snapshot_path)
        .with_context(|| format!("failed to load snapshot {}", snapshot_path.display()))?;
    if desk.restore(snapshot)? == 0 {
        bail!("snapshot has no agent matching the configured roster");
    }

    let settlement = desk.force_close_at(&AgentId::new(agent), &PositionId::from(position), price)?;
    desk.snapshot().save(snapshot_path)?;

    println!(
        "Closed {} {} {} @ {}: PnL {:+.2} ({})",
        settlement.position_id,
        settlement.side,
        settlement.symbol,
        settlement.exit_price,
        settlement.pnl,
        settlement.outcome
    );
    println!("Snapshot updated: {}", snapshot_path.display());
    Ok(())
}

fn print_agents(agents: &[Agent]) {
    println!();
    println!("=== Desk ===");
    println!(
        "{:<16} {:>10} {:>10} {:>5} {:>5} {:>5} {:>8}  Status",
        "Agent", "Balance", "Net", "Win", "Loss", "Liq", "WinRate"
    );
    println!("{}", "-".repeat(78));
    for a in agents {
        let win_rate = a
            .counters
            .win_rate()
            .map_or_else(|| "-".to_string(), |w| format!("{w:.1}%"));
        println!(
            "{:<16} {:>10.2} {:>+10.2} {:>5} {:>5} {:>5} {:>8}  {}",
            a.id.as_str(),
            a.balance,
            a.counters.net(),
            a.counters.wins,
            a.counters.losses,
            a.counters.liquidations,
            win_rate,
            a.status
        );
        for p in &a.positions {
            println!(
                "    {} {} {} entry {} TP {} SL {} margin {:.2} {}x{}",
                p.id,
                p.side,
                p.symbol,
                p.entry_price,
                p.take_profit,
                p.stop_loss,
                p.margin,
                p.leverage,
                if p.is_trailing { " trailing" } else { "" }
            );
        }
    }
    println!();
}
