// Technical indicators module
pub mod bollinger;
pub mod ema;
pub mod sma;

pub use bollinger::{Bollinger, BollingerBands};
pub use ema::Ema;
pub use sma::Sma;

use crate::error::EngineError;
use serde_json::Value;
use shared::models::{Candle, IndicatorPoint};

// Common trait for all indicators
pub trait IndicatorCalculator: Send + Sync {
    fn name(&self) -> &str;
    fn parameters(&self) -> Value; // Parameters used for this indicator instance
    // None until the warm-up window is full
    fn calculate(&self, data: &[Candle]) -> Vec<Option<f64>>;
}

/// Window lengths and band width for one engine instance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorParams {
    pub ema_length: usize,
    pub bb_length: usize,
    pub bb_std_multiplier: f64,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            ema_length: 50,
            bb_length: 20,
            bb_std_multiplier: 2.3,
        }
    }
}

/// Computes the trend filter and the volatility band for a candle sequence.
///
/// Stateless between calls: every cycle hands in a fresh snapshot and gets a
/// fresh series back, aligned index-for-index with the input.
pub struct IndicatorEngine {
    ema: Ema,
    bollinger: Bollinger,
}

impl IndicatorEngine {
    pub fn new(params: IndicatorParams) -> Result<Self, EngineError> {
        if params.ema_length == 0 || params.bb_length == 0 {
            return Err(EngineError::IndicatorError("Indicator period cannot be 0".to_string()));
        }
        if !params.bb_std_multiplier.is_finite() || params.bb_std_multiplier <= 0.0 {
            return Err(EngineError::IndicatorError(format!(
                "Bollinger multiplier must be positive, got {}",
                params.bb_std_multiplier
            )));
        }

        let engine = Self {
            ema: Ema::new(params.ema_length),
            bollinger: Bollinger::new(params.bb_length, params.bb_std_multiplier),
        };
        tracing::debug!(
            ema = %engine.ema.parameters(),
            bollinger = %engine.bollinger.parameters(),
            "Indicator engine configured"
        );
        Ok(engine)
    }

    pub fn compute(&self, candles: &[Candle]) -> Vec<IndicatorPoint> {
        let ema = self.ema.calculate(candles);
        let bands = self.bollinger.bands(candles);

        ema.into_iter()
            .zip(bands)
            .map(|(ema, band)| IndicatorPoint {
                ema,
                bb_upper: band.map(|b| b.upper),
                bb_mid: band.map(|b| b.mid),
                bb_lower: band.map(|b| b.lower),
            })
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::{Duration, TimeZone, Utc};
    use shared::models::Candle;

    pub const EPSILON: f64 = 1e-9;

    /// Five-minute candles with flat OHLC at each close.
    pub fn make_candles(closes: &[f64]) -> Vec<Candle> {
        let start = Utc.with_ymd_and_hms(2025, 3, 3, 14, 30, 0).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Candle {
                symbol: "TEST".to_string(),
                timestamp: start + Duration::minutes(5 * i as i64),
                open: close,
                high: close,
                low: close,
                close,
                volume: 0.0,
            })
            .collect()
    }

    pub fn assert_approx(actual: f64, expected: f64, eps: f64) {
        assert!(
            (actual - expected).abs() < eps,
            "expected {expected}, got {actual}"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn test_engine_rejects_zero_period() {
        let params = IndicatorParams { ema_length: 0, ..IndicatorParams::default() };
        assert!(matches!(IndicatorEngine::new(params), Err(EngineError::IndicatorError(_))));
    }

    #[test]
    fn test_engine_rejects_non_positive_multiplier() {
        let params = IndicatorParams { bb_std_multiplier: 0.0, ..IndicatorParams::default() };
        assert!(IndicatorEngine::new(params).is_err());
    }

    #[test]
    fn test_series_aligned_with_input() {
        let candles = make_candles(&(0..30).map(|i| 100.0 + i as f64).collect::<Vec<_>>());
        let engine = IndicatorEngine::new(IndicatorParams {
            ema_length: 10,
            bb_length: 5,
            bb_std_multiplier: 2.0,
        })
        .unwrap();
        let series = engine.compute(&candles);

        assert_eq!(series.len(), candles.len());
        assert!(series[3].bb_mid.is_none());
        assert!(series[4].bb_mid.is_some());
        assert!(series[8].ema.is_none());
        assert!(series[9].ema.is_some());
        assert!(series[29].is_complete());
    }

    #[test]
    fn test_short_input_is_all_undefined() {
        let candles = make_candles(&[1.0, 2.0, 3.0]);
        let engine = IndicatorEngine::new(IndicatorParams::default()).unwrap();
        let series = engine.compute(&candles);
        assert_eq!(series, vec![IndicatorPoint::default(); 3]);
    }

    #[test]
    fn test_compute_is_deterministic() {
        let closes: Vec<f64> = (0..80).map(|i| 4500.0 + ((i * 37) % 23) as f64 - 11.0).collect();
        let candles = make_candles(&closes);
        let engine = IndicatorEngine::new(IndicatorParams::default()).unwrap();
        assert_eq!(engine.compute(&candles), engine.compute(&candles));
    }
}
