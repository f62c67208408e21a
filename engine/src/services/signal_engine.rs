// One evaluation cycle: fetch -> indicators -> classify. No state survives between cycles.
use crate::config::EngineSettings;
use crate::data::CandleSource;
use crate::error::EngineError;
use crate::indicators::IndicatorEngine;
use crate::services::classifier::{Evaluation, SignalClassifier};
use chrono::Utc;
use serde::Serialize;
use shared::models::Candle;
use std::sync::Arc;

/// Result of a single cycle. The two skip variants stay distinct from a NEUTRAL signal.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CycleOutcome {
    Signal(Evaluation),
    InsufficientHistory { required: usize, available: usize },
    DataUnavailable { reason: String },
}

pub struct SignalEngine {
    settings: EngineSettings,
    source: Arc<dyn CandleSource>,
    indicators: IndicatorEngine,
    classifier: SignalClassifier,
}

impl SignalEngine {
    pub fn new(
        settings: EngineSettings,
        source: Arc<dyn CandleSource>,
    ) -> Result<Self, EngineError> {
        settings.validate()?;
        let indicators = IndicatorEngine::new(settings.indicator_params())?;
        let classifier = SignalClassifier::from_settings(&settings);
        Ok(Self {
            settings,
            source,
            indicators,
            classifier,
        })
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    /// Pure part of the cycle, usable on any snapshot.
    pub fn evaluate(&self, candles: &[Candle]) -> Result<Evaluation, EngineError> {
        if candles.len() < self.classifier.required_history() {
            return Err(EngineError::InsufficientHistory {
                required: self.classifier.required_history(),
                available: candles.len(),
            });
        }
        let series = self.indicators.compute(candles);
        self.classifier.classify(candles, &series)
    }

    pub async fn run_cycle(&self) -> CycleOutcome {
        let symbol = &self.settings.symbol;
        tracing::debug!(%symbol, source = self.source.name(), "Fetching candles");

        let candles = match self
            .source
            .fetch_candles(symbol, self.settings.interval, self.settings.lookback)
            .await
        {
            Ok(candles) if candles.is_empty() => {
                let err =
                    EngineError::DataUnavailable(format!("no candles returned for {}", symbol));
                return self.unavailable(err);
            }
            Ok(candles) => candles,
            Err(e) => return self.unavailable(e),
        };

        match self.evaluate(&candles) {
            Ok(evaluation) => {
                let age = Utc::now() - evaluation.timestamp;
                if age > self.settings.interval.duration() * 3 {
                    tracing::debug!(
                        %symbol,
                        age_secs = age.num_seconds(),
                        "Last closed candle is stale, market may be closed"
                    );
                }
                if !evaluation.indicators.is_complete() {
                    tracing::debug!(
                        %symbol,
                        indicators = ?evaluation.indicators,
                        "Indicators still warming up on the closed candle"
                    );
                }
                tracing::info!(
                    %symbol,
                    candle = %evaluation.timestamp,
                    close = evaluation.close,
                    live = evaluation.live_price,
                    signal = %evaluation.signal,
                    "Cycle evaluated"
                );
                CycleOutcome::Signal(evaluation)
            }
            Err(EngineError::InsufficientHistory { required, available }) => {
                tracing::warn!(
                    %symbol,
                    required,
                    available,
                    "Not enough candles yet, skipping cycle"
                );
                CycleOutcome::InsufficientHistory { required, available }
            }
            Err(e) => self.unavailable(e),
        }
    }

    fn unavailable(&self, err: EngineError) -> CycleOutcome {
        let symbol = &self.settings.symbol;
        if err.is_data_unavailable() {
            tracing::warn!(%symbol, error = %err, "Market data unavailable, skipping cycle");
        } else {
            tracing::error!(%symbol, error = %err, "Cycle failed, skipping");
        }
        CycleOutcome::DataUnavailable { reason: err.to_string() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::test_support::make_candles;
    use async_trait::async_trait;
    use shared::models::{LookbackWindow, Signal, TimeFrame};

    struct FixedSource(Result<Vec<Candle>, String>);

    #[async_trait]
    impl CandleSource for FixedSource {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn fetch_candles(
            &self,
            _: &str,
            _: TimeFrame,
            _: LookbackWindow,
        ) -> Result<Vec<Candle>, EngineError> {
            self.0.clone().map_err(EngineError::DataUnavailable)
        }
    }

    fn small_settings() -> EngineSettings {
        EngineSettings {
            ema_length: 5,
            bb_length: 5,
            bb_std_multiplier: 1.5,
            ..EngineSettings::default()
        }
    }

    fn engine_with(result: Result<Vec<Candle>, String>) -> SignalEngine {
        SignalEngine::new(small_settings(), Arc::new(FixedSource(result))).unwrap()
    }

    #[tokio::test]
    async fn test_breakout_cycle() {
        let candles = make_candles(&[100.0, 100.0, 100.0, 100.0, 100.0, 100.0, 120.0, 121.0]);
        let outcome = engine_with(Ok(candles)).run_cycle().await;
        match outcome {
            CycleOutcome::Signal(eval) => {
                assert_eq!(eval.signal, Signal::Long);
                assert_eq!(eval.close, 120.0);
                assert_eq!(eval.live_price, 121.0);
                assert_eq!(eval.stop_loss, Some(80.0));
            }
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_short_history_is_distinct_outcome() {
        let outcome = engine_with(Ok(make_candles(&[100.0; 5]))).run_cycle().await;
        assert_eq!(outcome, CycleOutcome::InsufficientHistory { required: 6, available: 5 });
    }

    #[tokio::test]
    async fn test_source_failure_is_unavailable() {
        let outcome = engine_with(Err("connection reset".into())).run_cycle().await;
        assert!(matches!(
            outcome,
            CycleOutcome::DataUnavailable { reason } if reason.contains("connection reset")
        ));
    }

    #[tokio::test]
    async fn test_empty_fetch_is_unavailable() {
        let outcome = engine_with(Ok(Vec::new())).run_cycle().await;
        assert!(matches!(outcome, CycleOutcome::DataUnavailable { .. }));
    }

    #[test]
    fn test_new_rejects_invalid_settings() {
        let settings = EngineSettings { bb_length: 0, ..EngineSettings::default() };
        let result = SignalEngine::new(settings, Arc::new(FixedSource(Ok(Vec::new()))));
        assert!(matches!(result, Err(EngineError::ConfigError(_))));
    }

    #[test]
    fn test_outcome_json_shape() {
        let outcome = CycleOutcome::InsufficientHistory { required: 51, available: 12 };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["outcome"], "insufficient_history");
        assert_eq!(json["required"], 51);
    }
}
