//! Yahoo Finance chart source.
//!
//! Pulls intraday OHLCV from the public v8 chart endpoint using the
//! interval/range form of the request. The endpoint is unofficial and may
//! change shape without notice; every parse failure surfaces as
//! `DataUnavailable` so the scheduler simply skips the cycle.

use super::{normalize_candles, CandleSource};
use crate::error::EngineError;
use async_trait::async_trait;
use chrono::DateTime;
use serde::Deserialize;
use shared::models::{Candle, LookbackWindow, TimeFrame};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

pub struct YahooCandleSource {
    base_url: String,
    client: reqwest::Client,
}

impl YahooCandleSource {
    pub fn new() -> Result<Self, EngineError> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, EngineError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(20))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    fn chart_url(&self, symbol: &str, interval: TimeFrame, lookback: LookbackWindow) -> String {
        format!(
            "{}/v8/finance/chart/{}?interval={}&range={}",
            self.base_url, symbol, interval, lookback
        )
    }
}

/// Turns a chart payload into candles. Bars without a close are dropped;
/// missing open/high/low fall back to the close.
fn parse_chart_response(symbol: &str, body: &str) -> Result<Vec<Candle>, EngineError> {
    let response: ChartResponse = serde_json::from_str(body).map_err(|e| {
        EngineError::DataUnavailable(format!("unexpected chart payload for {}: {}", symbol, e))
    })?;

    if let Some(err) = response.chart.error {
        return Err(EngineError::DataUnavailable(format!(
            "{} for {}: {}",
            err.code, symbol, err.description
        )));
    }

    let data = response
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| EngineError::DataUnavailable(format!("empty chart result for {}", symbol)))?;

    let timestamps = data.timestamp.unwrap_or_default();
    let quote = data
        .indicators
        .quote
        .into_iter()
        .next()
        .ok_or_else(|| EngineError::DataUnavailable(format!("no quote data for {}", symbol)))?;

    let mut candles = Vec::with_capacity(timestamps.len());
    for (i, &ts) in timestamps.iter().enumerate() {
        let Some(close) = quote.close.get(i).copied().flatten() else {
            continue;
        };
        let timestamp = DateTime::from_timestamp(ts, 0).ok_or_else(|| {
            EngineError::DataUnavailable(format!("invalid timestamp {} for {}", ts, symbol))
        })?;

        candles.push(Candle {
            symbol: symbol.to_string(),
            timestamp,
            open: quote.open.get(i).copied().flatten().unwrap_or(close),
            high: quote.high.get(i).copied().flatten().unwrap_or(close),
            low: quote.low.get(i).copied().flatten().unwrap_or(close),
            close,
            volume: quote.volume.get(i).copied().flatten().unwrap_or(0.0),
        });
    }

    if candles.is_empty() {
        return Err(EngineError::DataUnavailable(format!(
            "no candles returned for {}",
            symbol
        )));
    }
    Ok(normalize_candles(candles))
}

#[async_trait]
impl CandleSource for YahooCandleSource {
    fn name(&self) -> &str {
        "yahoo"
    }

    async fn fetch_candles(
        &self,
        symbol: &str,
        interval: TimeFrame,
        lookback: LookbackWindow,
    ) -> Result<Vec<Candle>, EngineError> {
        let url = self.chart_url(symbol, interval, lookback);
        tracing::debug!(%url, "Requesting chart data");

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            // Error payloads carry a code and description
            let detail = serde_json::from_str::<ChartResponse>(&body)
                .ok()
                .and_then(|r| r.chart.error)
                .map(|e| format!("{}: {}", e.code, e.description))
                .unwrap_or_else(|| "no error detail".to_string());
            return Err(EngineError::DataUnavailable(format!(
                "HTTP {} for {} ({})",
                status, symbol, detail
            )));
        }

        let candles = parse_chart_response(symbol, &body)?;
        tracing::debug!(symbol, count = candles.len(), "Parsed chart data");
        Ok(candles)
    }
}
