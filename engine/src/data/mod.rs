// Market data acquisition: where each cycle's candle snapshot comes from.
pub mod csv_parser;
pub mod yahoo;

pub use csv_parser::CsvCandleSource;
pub use yahoo::YahooCandleSource;

use crate::error::EngineError;
use async_trait::async_trait;
use shared::models::{Candle, LookbackWindow, TimeFrame};

/// Supplies an ordered candle sequence for one instrument.
///
/// The last element of a successful fetch is the still-forming bar. An empty
/// result must be reported as `EngineError::DataUnavailable`, never as `Ok(vec![])`.
#[async_trait]
pub trait CandleSource: Send + Sync {
    fn name(&self) -> &str;

    async fn fetch_candles(
        &self,
        symbol: &str,
        interval: TimeFrame,
        lookback: LookbackWindow,
    ) -> Result<Vec<Candle>, EngineError>;
}

/// Sorts by timestamp and drops duplicate timestamps (first occurrence wins).
pub fn normalize_candles(mut candles: Vec<Candle>) -> Vec<Candle> {
    candles.sort_by_key(|c| c.timestamp);
    candles.dedup_by_key(|c| c.timestamp);
    candles
}
