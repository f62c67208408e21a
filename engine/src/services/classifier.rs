//! Breakout classification on the last *closed* candle.
//!
//! The final element of every fetched sequence is the bar still forming; its
//! close keeps moving until the bucket ends, so it is only reported as the live
//! price. The decision always comes from the element before it.

use crate::config::EngineSettings;
use crate::error::EngineError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use shared::models::{Candle, IndicatorPoint, Signal};

/// Everything one cycle reports about the candle it evaluated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    pub symbol: String,
    pub timestamp: DateTime<Utc>,
    pub close: f64,
    pub live_price: f64,
    pub indicators: IndicatorPoint,
    pub signal: Signal,
    pub stop_loss: Option<f64>,
}

/// LONG above the upper band and the trend, SHORT below the lower band and the
/// trend, NEUTRAL otherwise. Comparisons are strict and an undefined value
/// never satisfies one.
pub fn classify_point(close: f64, point: &IndicatorPoint) -> Signal {
    let above = |level: Option<f64>| level.map_or(false, |v| close > v);
    let below = |level: Option<f64>| level.map_or(false, |v| close < v);

    if above(point.bb_upper) && above(point.ema) {
        Signal::Long
    } else if below(point.bb_lower) && below(point.ema) {
        Signal::Short
    } else {
        Signal::Neutral
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalClassifier {
    required_history: usize,
    stop_loss_offset: f64,
}

impl SignalClassifier {
    /// `required_history` counts the forming bar; anything below 2 is raised to 2.
    pub fn new(required_history: usize, stop_loss_offset: f64) -> Self {
        Self {
            required_history: required_history.max(2),
            stop_loss_offset,
        }
    }

    pub fn from_settings(settings: &EngineSettings) -> Self {
        Self::new(settings.required_history(), settings.stop_loss_offset)
    }

    pub fn required_history(&self) -> usize {
        self.required_history
    }

    pub fn classify(
        &self,
        candles: &[Candle],
        series: &[IndicatorPoint],
    ) -> Result<Evaluation, EngineError> {
        if candles.len() < self.required_history {
            return Err(EngineError::InsufficientHistory {
                required: self.required_history,
                available: candles.len(),
            });
        }
        if series.len() != candles.len() {
            return Err(EngineError::IndicatorError(format!(
                "indicator series has {} entries for {} candles",
                series.len(),
                candles.len()
            )));
        }

        let idx = candles.len() - 2;
        let closed = &candles[idx];
        let point = series[idx];
        let live_price = candles[candles.len() - 1].close;

        let signal = classify_point(closed.close, &point);
        Ok(Evaluation {
            symbol: closed.symbol.clone(),
            timestamp: closed.timestamp,
            close: closed.close,
            live_price,
            indicators: point,
            signal,
            stop_loss: signal.stop_loss(closed.close, self.stop_loss_offset),
        })
    }
}
