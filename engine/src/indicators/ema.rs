// Exponential Moving Average (EMA) indicator implementation
use super::IndicatorCalculator;
use shared::models::Candle;
use serde_json::Value;

pub struct Ema {
    name: String,
    period: usize,
}

impl Ema {
    pub fn new(period: usize) -> Self {
        Self {
            name: format!("EMA({})", period),
            period,
        }
    }

    /// Smoothing factor `2 / (period + 1)`.
    pub fn multiplier(&self) -> f64 {
        2.0 / (self.period as f64 + 1.0)
    }
}

impl IndicatorCalculator for Ema {
    fn name(&self) -> &str {
        &self.name
    }

    fn parameters(&self) -> Value {
        serde_json::json!({ "period": self.period })
    }

    fn calculate(&self, data: &[Candle]) -> Vec<Option<f64>> {
        if self.period == 0 || data.len() < self.period {
            return vec![None; data.len()];
        }

        let mut results = Vec::with_capacity(data.len());
        results.resize(self.period - 1, None);
        let multiplier = self.multiplier();

        // Seed with the SMA of the first window
        let initial_sum: f64 = data.iter().take(self.period).map(|c| c.close).sum();
        let mut previous_ema = initial_sum / self.period as f64;
        results.push(Some(previous_ema));

        for candle in data.iter().skip(self.period) {
            // Same as a*close + (1-a)*prev, but a flat series stays exactly flat
            let ema = (candle.close - previous_ema) * multiplier + previous_ema;
            results.push(Some(ema));
            previous_ema = ema;
        }
        results
    }
}
