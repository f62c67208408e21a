// Per-cycle report surface. Logs go to stderr through tracing; this writes the
// human (or JSON) report to stdout.
use crate::config::EngineSettings;
use crate::services::signal_engine::CycleOutcome;
use shared::models::Signal;
use shared::utils::format_price;
use std::io::Write;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Interrupted,
    CycleLimit,
}

pub trait CycleReporter: Send {
    fn started(&mut self, _settings: &EngineSettings) {}
    fn report(&mut self, outcome: &CycleOutcome);
    fn waiting(&mut self, _interval: Duration) {}
    fn stopped(&mut self, _reason: StopReason) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    #[default]
    Text,
    /// One JSON object per cycle, nothing else on the stream
    Json,
}

pub struct ConsoleReporter<W: Write + Send> {
    out: W,
    format: ReportFormat,
    ema_length: usize,
}

impl ConsoleReporter<std::io::Stdout> {
    pub fn stdout(format: ReportFormat) -> Self {
        Self::new(std::io::stdout(), format)
    }
}

impl<W: Write + Send> ConsoleReporter<W> {
    pub fn new(out: W, format: ReportFormat) -> Self {
        Self {
            out,
            format,
            ema_length: EngineSettings::default().ema_length,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, text: &str) {
        if let Err(e) = writeln!(self.out, "{}", text).and_then(|_| self.out.flush()) {
            tracing::warn!(error = %e, "Failed to write report");
        }
    }

    fn render_text(&self, outcome: &CycleOutcome) -> String {
        match outcome {
            CycleOutcome::Signal(eval) => {
                let p = &eval.indicators;
                let mut lines = vec![
                    format!(
                        "--- {} analysis ({}) ---",
                        eval.symbol,
                        eval.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
                    ),
                    format!("Close: {:.2} | Live: {:.2}", eval.close, eval.live_price),
                    format!(
                        "BB upper: {} | BB mid: {} | BB lower: {} | EMA {}: {}",
                        format_price(p.bb_upper),
                        format_price(p.bb_mid),
                        format_price(p.bb_lower),
                        self.ema_length,
                        format_price(p.ema)
                    ),
                ];
                lines.push(match eval.signal {
                    Signal::Long => format!(
                        "LONG signal (buy): enter long, advisory stop-loss at {}",
                        format_price(eval.stop_loss)
                    ),
                    Signal::Short => format!(
                        "SHORT signal (sell): enter short, advisory stop-loss at {}",
                        format_price(eval.stop_loss)
                    ),
                    Signal::Neutral => {
                        "NEUTRAL: market ranging, waiting for a breakout".to_string()
                    }
                });
                lines.join("\n")
            }
            CycleOutcome::InsufficientHistory { required, available } => format!(
                "Not enough data yet: {} of {} candles, skipping this cycle",
                available, required
            ),
            CycleOutcome::DataUnavailable { reason } => {
                format!("Data unavailable ({}), skipping this cycle", reason)
            }
        }
    }
}

impl<W: Write + Send> CycleReporter for ConsoleReporter<W> {
    fn started(&mut self, settings: &EngineSettings) {
        self.ema_length = settings.ema_length;
        if self.format == ReportFormat::Text {
            let banner = format!(
                "=== Breakout signal engine started ===\nWatching {} | interval {} | lookback {}",
                settings.symbol, settings.interval, settings.lookback
            );
            self.emit(&banner);
        }
    }

    fn report(&mut self, outcome: &CycleOutcome) {
        let text = match self.format {
            ReportFormat::Text => self.render_text(outcome),
            ReportFormat::Json => match serde_json::to_string(outcome) {
                Ok(json) => json,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to serialize cycle outcome");
                    return;
                }
            },
        };
        self.emit(&text);
    }

    fn waiting(&mut self, interval: Duration) {
        if self.format == ReportFormat::Text {
            let notice = format!("Waiting {} seconds before the next scan...", interval.as_secs());
            self.emit(&notice);
        }
    }

    fn stopped(&mut self, reason: StopReason) {
        if self.format == ReportFormat::Text && reason == StopReason::Interrupted {
            self.emit("Stopped manually.");
        }
    }
}
