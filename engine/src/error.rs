use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Market data unavailable: {0}")]
    DataUnavailable(String),

    #[error("HTTP transport error: {source}")]
    Http {
        #[from]
        source: reqwest::Error,
    },

    #[error("CSV parsing system error: {source}")]
    CsvSystemError {
        #[from]
        source: csv::Error,
    },

    #[error("I/O error: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },

    #[error("CSV data format error: {0}")]
    CsvDataFormatError(String),

    #[error("Not enough data yet: need {required} candles, have {available}")]
    InsufficientHistory { required: usize, available: usize },

    #[error("Indicator calculation error: {0}")]
    IndicatorError(String),
}

impl EngineError {
    /// True for every fault the scheduler reports as "data unavailable".
    pub fn is_data_unavailable(&self) -> bool {
        matches!(
            self,
            EngineError::DataUnavailable(_)
                | EngineError::Http { .. }
                | EngineError::CsvSystemError { .. }
                | EngineError::IoError { .. }
                | EngineError::CsvDataFormatError(_)
        )
    }
}

impl From<shared::models::ParseModelError> for EngineError {
    fn from(err: shared::models::ParseModelError) -> Self {
        EngineError::ConfigError(err.to_string())
    }
}
