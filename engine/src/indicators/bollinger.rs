//! Bollinger Bands: SMA of close plus/minus a multiple of the trailing
//! standard deviation.
//!
//! The deviation is the *population* figure (divide by the window length).
//! Band width, and therefore signal sensitivity, depends on that choice.

use super::{IndicatorCalculator, Sma};
use serde_json::Value;
use shared::models::Candle;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BollingerBands {
    pub upper: f64,
    pub mid: f64,
    pub lower: f64,
}

pub struct Bollinger {
    name: String,
    period: usize,
    multiplier: f64,
    mid: Sma,
}

impl Bollinger {
    pub fn new(period: usize, multiplier: f64) -> Self {
        Self {
            name: format!("BB({},{})", period, multiplier),
            period,
            multiplier,
            mid: Sma::new(period),
        }
    }

    /// Full band triple per candle, `None` until `period` closes are available.
    pub fn bands(&self, data: &[Candle]) -> Vec<Option<BollingerBands>> {
        let mids = self.mid.calculate(data);

        mids.iter()
            .enumerate()
            .map(|(i, mid)| {
                let mid = (*mid)?;
                let window = &data[i + 1 - self.period..=i];
                let variance = window
                    .iter()
                    .map(|c| {
                        let diff = c.close - mid;
                        diff * diff
                    })
                    .sum::<f64>()
                    / self.period as f64;
                let width = self.multiplier * variance.sqrt();
                Some(BollingerBands {
                    upper: mid + width,
                    mid,
                    lower: mid - width,
                })
            })
            .collect()
    }
}

impl IndicatorCalculator for Bollinger {
    fn name(&self) -> &str {
        &self.name
    }

    fn parameters(&self) -> Value {
        serde_json::json!({ "period": self.period, "std_multiplier": self.multiplier })
    }

    /// Mid band only; use [`Bollinger::bands`] for the envelope.
    fn calculate(&self, data: &[Candle]) -> Vec<Option<f64>> {
        self.mid.calculate(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::test_support::{assert_approx, make_candles, EPSILON};

    #[test]
    fn test_mid_band_is_sma() {
        let candles = make_candles(&[10.0, 11.0, 12.0, 13.0, 14.0]);
        let bands = Bollinger::new(3, 2.0).bands(&candles);
        assert!(bands[0].is_none());
        assert!(bands[1].is_none());
        assert_approx(bands[2].unwrap().mid, 11.0, EPSILON);
        assert_approx(bands[3].unwrap().mid, 12.0, EPSILON);
    }

    #[test]
    fn test_population_std_dev() {
        // Window 2,4,4,4,5,5,7,9: mean 5, population std 2 (sample std would be ~2.138)
        let candles = make_candles(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        let band = Bollinger::new(8, 2.3).bands(&candles)[7].unwrap();
        assert_approx(band.mid, 5.0, EPSILON);
        assert_approx(band.upper, 5.0 + 2.3 * 2.0, EPSILON);
        assert_approx(band.lower, 5.0 - 2.3 * 2.0, EPSILON);
    }

    #[test]
    fn test_bands_ordered_and_symmetric() {
        let closes: Vec<f64> = (0..120)
            .map(|i| 4500.0 + (i as f64 * 0.7).sin() * 35.0 + (i % 7) as f64)
            .collect();
        let candles = make_candles(&closes);
        let bands = Bollinger::new(20, 2.3).bands(&candles);

        for band in bands.iter().flatten() {
            assert!(band.lower < band.mid, "{band:?}");
            assert!(band.mid < band.upper, "{band:?}");
            assert_approx(band.upper - band.mid, band.mid - band.lower, 1e-6);
        }
        assert_eq!(bands.iter().flatten().count(), 101);
    }

    #[test]
    fn test_constant_window_collapses_bands() {
        let candles = make_candles(&[100.0; 25]);
        for band in Bollinger::new(20, 2.3).bands(&candles).iter().flatten() {
            assert_eq!(band.upper, 100.0);
            assert_eq!(band.mid, 100.0);
            assert_eq!(band.lower, 100.0);
        }
    }

    #[test]
    fn test_warm_up_boundary() {
        let closes: Vec<f64> = (1..=20).map(|i| i as f64).collect();
        let bollinger = Bollinger::new(20, 2.3);

        let short = bollinger.bands(&make_candles(&closes[..19]));
        assert!(short.iter().all(Option::is_none));

        let full = bollinger.bands(&make_candles(&closes));
        assert!(full[..19].iter().all(Option::is_none));
        assert_approx(full[19].unwrap().mid, 10.5, EPSILON);
    }

    #[test]
    fn test_calculate_returns_mid_band() {
        let candles = make_candles(&[1.0, 2.0, 3.0]);
        let bollinger = Bollinger::new(2, 2.0);
        assert_eq!(bollinger.calculate(&candles), vec![None, Some(1.5), Some(2.5)]);
        assert_eq!(bollinger.name(), "BB(2,2)");
        assert_eq!(bollinger.parameters()["std_multiplier"], 2.0);
    }
}
