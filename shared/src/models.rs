use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// One OHLC bucket of price history. Only `close` drives the signal engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub symbol: String,
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseModelError {
    #[error("unsupported bar interval '{0}' (expected one of 1m, 2m, 5m, 15m, 30m, 60m, 1h, 90m, 1d)")]
    TimeFrame(String),
    #[error("unsupported lookback window '{0}' (expected one of 1d, 5d, 1mo, 3mo, 6mo, 1y, 2y, 5y, max)")]
    Lookback(String),
}

/// Bar interval. String forms follow the chart API conventions ("5m", "1d", ...).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub enum TimeFrame {
    Minute1,
    Minute2,
    Minute5,
    Minute15,
    Minute30,
    Hour1,
    Minute90,
    Day1,
}

impl TimeFrame {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeFrame::Minute1 => "1m",
            TimeFrame::Minute2 => "2m",
            TimeFrame::Minute5 => "5m",
            TimeFrame::Minute15 => "15m",
            TimeFrame::Minute30 => "30m",
            TimeFrame::Hour1 => "60m",
            TimeFrame::Minute90 => "90m",
            TimeFrame::Day1 => "1d",
        }
    }

    /// Length of one bucket.
    pub fn duration(&self) -> Duration {
        match self {
            TimeFrame::Minute1 => Duration::minutes(1),
            TimeFrame::Minute2 => Duration::minutes(2),
            TimeFrame::Minute5 => Duration::minutes(5),
            TimeFrame::Minute15 => Duration::minutes(15),
            TimeFrame::Minute30 => Duration::minutes(30),
            TimeFrame::Hour1 => Duration::hours(1),
            TimeFrame::Minute90 => Duration::minutes(90),
            TimeFrame::Day1 => Duration::days(1),
        }
    }
}

impl FromStr for TimeFrame {
    type Err = ParseModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1m" => Ok(TimeFrame::Minute1),
            "2m" => Ok(TimeFrame::Minute2),
            "5m" => Ok(TimeFrame::Minute5),
            "15m" => Ok(TimeFrame::Minute15),
            "30m" => Ok(TimeFrame::Minute30),
            "60m" | "1h" => Ok(TimeFrame::Hour1),
            "90m" => Ok(TimeFrame::Minute90),
            "1d" => Ok(TimeFrame::Day1),
            _ => Err(ParseModelError::TimeFrame(s.to_string())),
        }
    }
}

impl TryFrom<String> for TimeFrame {
    type Error = ParseModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimeFrame> for String {
    fn from(tf: TimeFrame) -> Self {
        tf.as_str().to_string()
    }
}

impl fmt::Display for TimeFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How far back each fetch reaches.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub enum LookbackWindow {
    Day1,
    Day5,
    Month1,
    Month3,
    Month6,
    Year1,
    Year2,
    Year5,
    Max,
}

impl LookbackWindow {
    pub fn as_str(&self) -> &'static str {
        match self {
            LookbackWindow::Day1 => "1d",
            LookbackWindow::Day5 => "5d",
            LookbackWindow::Month1 => "1mo",
            LookbackWindow::Month3 => "3mo",
            LookbackWindow::Month6 => "6mo",
            LookbackWindow::Year1 => "1y",
            LookbackWindow::Year2 => "2y",
            LookbackWindow::Year5 => "5y",
            LookbackWindow::Max => "max",
        }
    }
}

impl FromStr for LookbackWindow {
    type Err = ParseModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1d" => Ok(LookbackWindow::Day1),
            "5d" => Ok(LookbackWindow::Day5),
            "1mo" => Ok(LookbackWindow::Month1),
            "3mo" => Ok(LookbackWindow::Month3),
            "6mo" => Ok(LookbackWindow::Month6),
            "1y" => Ok(LookbackWindow::Year1),
            "2y" => Ok(LookbackWindow::Year2),
            "5y" => Ok(LookbackWindow::Year5),
            "max" => Ok(LookbackWindow::Max),
            _ => Err(ParseModelError::Lookback(s.to_string())),
        }
    }
}

impl TryFrom<String> for LookbackWindow {
    type Error = ParseModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<LookbackWindow> for String {
    fn from(lb: LookbackWindow) -> Self {
        lb.as_str().to_string()
    }
}

impl fmt::Display for LookbackWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Indicator values attached to one candle. `None` marks the warm-up period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct IndicatorPoint {
    pub ema: Option<f64>,
    pub bb_upper: Option<f64>,
    pub bb_mid: Option<f64>,
    pub bb_lower: Option<f64>,
}

impl IndicatorPoint {
    pub fn is_complete(&self) -> bool {
        self.ema.is_some()
            && self.bb_upper.is_some()
            && self.bb_mid.is_some()
            && self.bb_lower.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Signal {
    Long,
    Short,
    Neutral,
}

impl Signal {
    /// Fixed-offset advisory stop. Not a risk model: the offset is a tuning knob.
    pub fn stop_loss(&self, close: f64, offset: f64) -> Option<f64> {
        match self {
            Signal::Long => Some(close - offset),
            Signal::Short => Some(close + offset),
            Signal::Neutral => None,
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Signal::Long => "LONG",
            Signal::Short => "SHORT",
            Signal::Neutral => "NEUTRAL",
        };
        f.write_str(label)
    }
}
