// Engine settings: built-in defaults, optionally overlaid by a JSON file and CLI flags
use crate::error::EngineError;
use crate::indicators::IndicatorParams;
use serde::Deserialize;
use shared::models::{LookbackWindow, TimeFrame};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct EngineSettings {
    pub symbol: String,
    pub interval: TimeFrame,
    pub lookback: LookbackWindow,
    pub ema_length: usize,
    pub bb_length: usize,
    pub bb_std_multiplier: f64,
    pub poll_interval_secs: u64,
    pub stop_loss_offset: f64,
    /// Replay candles from this CSV file instead of the chart API.
    pub csv_path: Option<PathBuf>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        // NQ=F is the E-mini Nasdaq-100 future
        EngineSettings {
            symbol: "NQ=F".to_string(),
            interval: TimeFrame::Minute5,
            lookback: LookbackWindow::Day1,
            ema_length: 50,
            bb_length: 20,
            bb_std_multiplier: 2.3,
            poll_interval_secs: 60,
            stop_loss_offset: 40.0,
            csv_path: None,
        }
    }
}

impl EngineSettings {
    /// Partial documents are fine: missing keys keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, EngineError> {
        serde_json::from_str(json)
            .map_err(|e| EngineError::ConfigError(format!("Invalid settings JSON: {}", e)))
    }

    pub fn from_json_file(path: &Path) -> Result<Self, EngineError> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            EngineError::ConfigError(format!(
                "Failed to read settings file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json_str(&contents)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.symbol.trim().is_empty() {
            return Err(EngineError::ConfigError("symbol must not be empty".to_string()));
        }
        if self.ema_length == 0 {
            return Err(EngineError::ConfigError("ema_length must be greater than 0".to_string()));
        }
        if self.bb_length == 0 {
            return Err(EngineError::ConfigError("bb_length must be greater than 0".to_string()));
        }
        if !self.bb_std_multiplier.is_finite() || self.bb_std_multiplier <= 0.0 {
            return Err(EngineError::ConfigError(format!(
                "bb_std_multiplier must be a positive number, got {}",
                self.bb_std_multiplier
            )));
        }
        if self.poll_interval_secs == 0 {
            return Err(EngineError::ConfigError(
                "poll_interval_secs must be greater than 0".to_string(),
            ));
        }
        if !self.stop_loss_offset.is_finite() || self.stop_loss_offset < 0.0 {
            return Err(EngineError::ConfigError(format!(
                "stop_loss_offset must be a non-negative number, got {}",
                self.stop_loss_offset
            )));
        }
        Ok(())
    }

    pub fn indicator_params(&self) -> IndicatorParams {
        IndicatorParams {
            ema_length: self.ema_length,
            bb_length: self.bb_length,
            bb_std_multiplier: self.bb_std_multiplier,
        }
    }

    /// The EMA warm-up window on closed candles, plus the still-forming bar.
    /// A longer band window only leaves the bands undefined, which classifies as NEUTRAL.
    pub fn required_history(&self) -> usize {
        self.ema_length + 1
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}
