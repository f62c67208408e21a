// Engine main entry point
use anyhow::{Context, Result};
use clap::Parser;
use engine::config::EngineSettings;
use engine::data::{CandleSource, CsvCandleSource, YahooCandleSource};
use engine::services::{ConsoleReporter, ReportFormat, Scheduler, SignalEngine};
use shared::models::{LookbackWindow, TimeFrame};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Watches one instrument and prints an EMA + Bollinger breakout signal every poll.
#[derive(Parser, Debug)]
#[command(name = "signal-engine", version)]
struct Cli {
    /// JSON settings file; flags below override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Instrument identifier (e.g. NQ=F, MNQ=F).
    #[arg(long)]
    symbol: Option<String>,

    /// Bar interval: 1m, 2m, 5m, 15m, 30m, 60m, 90m, 1d.
    #[arg(long)]
    interval: Option<TimeFrame>,

    /// Lookback window: 1d, 5d, 1mo, 3mo, 6mo, 1y, 2y, 5y, max.
    #[arg(long)]
    lookback: Option<LookbackWindow>,

    #[arg(long)]
    ema_length: Option<usize>,

    #[arg(long)]
    bb_length: Option<usize>,

    /// Bollinger standard-deviation multiplier.
    #[arg(long)]
    bb_std: Option<f64>,

    /// Seconds between scans.
    #[arg(long)]
    poll_secs: Option<u64>,

    /// Advisory stop-loss distance in price units.
    #[arg(long)]
    stop_offset: Option<f64>,

    /// Replay candles from a CSV file instead of fetching them.
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Emit one JSON object per cycle instead of the text report.
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Run a single cycle and exit.
    #[arg(long, default_value_t = false)]
    once: bool,
}

impl Cli {
    fn settings(&self) -> Result<EngineSettings> {
        let mut settings = match &self.config {
            Some(path) => EngineSettings::from_json_file(path)?,
            None => EngineSettings::default(),
        };

        if let Some(symbol) = &self.symbol {
            settings.symbol = symbol.clone();
        }
        if let Some(interval) = self.interval {
            settings.interval = interval;
        }
        if let Some(lookback) = self.lookback {
            settings.lookback = lookback;
        }
        if let Some(v) = self.ema_length {
            settings.ema_length = v;
        }
        if let Some(v) = self.bb_length {
            settings.bb_length = v;
        }
        if let Some(v) = self.bb_std {
            settings.bb_std_multiplier = v;
        }
        if let Some(v) = self.poll_secs {
            settings.poll_interval_secs = v;
        }
        if let Some(v) = self.stop_offset {
            settings.stop_loss_offset = v;
        }
        if let Some(path) = &self.csv {
            settings.csv_path = Some(path.clone());
        }

        settings.validate()?;
        Ok(settings)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs on stderr so stdout carries only the report
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = match cli.settings() {
        Ok(settings) => settings,
        Err(e) => {
            error!("Invalid configuration: {:#}", e);
            return Err(e);
        }
    };
    info!(?settings, "Starting signal engine");

    let source: Arc<dyn CandleSource> = match &settings.csv_path {
        Some(path) => Arc::new(CsvCandleSource::new(path)),
        None => Arc::new(YahooCandleSource::new().context("Failed to build HTTP client")?),
    };

    let engine = SignalEngine::new(settings, source)?;
    let mut scheduler = Scheduler::new(engine);
    if cli.once {
        scheduler = scheduler.with_max_cycles(1);
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Interrupt received, shutting down");
                let _ = shutdown_tx.send(true);
            }
            Err(e) => error!(error = %e, "Failed to listen for Ctrl-C"),
        }
    });

    let format = if cli.json { ReportFormat::Json } else { ReportFormat::Text };
    let mut reporter = ConsoleReporter::stdout(format);
    let cycles = scheduler.run(&mut reporter, shutdown_rx).await;
    info!(cycles, "Signal engine stopped");

    Ok(())
}
