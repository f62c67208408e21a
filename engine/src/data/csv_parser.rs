// Offline candle source: replays a CSV export instead of calling the network.
use super::{normalize_candles, CandleSource};
use crate::error::EngineError;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use csv::{ReaderBuilder, StringRecord};
use shared::models::{Candle, LookbackWindow, TimeFrame};
use std::path::PathBuf;

// Accepts RFC 3339, "YYYY-MM-DD HH:MM:SS" (taken as UTC) or Unix seconds
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, String> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Ok(naive.and_utc());
    }
    s.parse::<i64>()
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .ok_or_else(|| format!("Failed to parse timestamp '{}'", s))
}

/// CSV header: `timestamp,open,high,low,close[,volume][,symbol]`.
/// Header names are case-insensitive.
/// Rows come back in file order.
pub fn load_candles_from_reader<R: std::io::Read>(
    reader: R,
    default_symbol: &str,
) -> Result<Vec<Candle>, EngineError> {
    let mut rdr = ReaderBuilder::new().has_headers(true).trim(csv::Trim::All).from_reader(reader);
    let headers = rdr.headers()?.clone();

    let mut candles = Vec::new();
    for (idx, result) in rdr.records().enumerate() {
        let line = idx + 2;
        let record = result?;

        let timestamp = parse_timestamp(required_field(&record, &headers, "timestamp", line)?)
            .map_err(|e| EngineError::CsvDataFormatError(format!("{} at line {}", e, line)))?;
        let volume = match get_field(&record, &headers, "volume") {
            Some(raw) if !raw.is_empty() => raw.parse::<f64>().map_err(|_| {
                EngineError::CsvDataFormatError(format!(
                    "Error parsing 'volume' at line {}: invalid number '{}'",
                    line, raw
                ))
            })?,
            _ => 0.0,
        };
        let symbol = get_field(&record, &headers, "symbol")
            .filter(|s| !s.is_empty())
            .unwrap_or(default_symbol);

        candles.push(Candle {
            symbol: symbol.to_string(),
            timestamp,
            open: parse_price(&record, &headers, "open", line)?,
            high: parse_price(&record, &headers, "high", line)?,
            low: parse_price(&record, &headers, "low", line)?,
            close: parse_price(&record, &headers, "close", line)?,
            volume,
        });
    }
    Ok(candles)
}

fn required_field<'a>(
    record: &'a StringRecord,
    headers: &StringRecord,
    name: &str,
    line: usize,
) -> Result<&'a str, EngineError> {
    get_field(record, headers, name).ok_or_else(|| {
        EngineError::CsvDataFormatError(format!("Missing '{}' field at line {}", name, line))
    })
}

fn parse_price(
    record: &StringRecord,
    headers: &StringRecord,
    name: &str,
    line: usize,
) -> Result<f64, EngineError> {
    let raw = required_field(record, headers, name, line)?;
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| {
            EngineError::CsvDataFormatError(format!(
                "Error parsing '{}' at line {}: invalid number '{}'",
                name, line, raw
            ))
        })
}

fn get_field<'a>(record: &'a StringRecord, headers: &StringRecord, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .position(|header| header.eq_ignore_ascii_case(name))
        .and_then(|pos| record.get(pos))
}

pub struct CsvCandleSource {
    path: PathBuf,
}

impl CsvCandleSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CandleSource for CsvCandleSource {
    fn name(&self) -> &str {
        "csv"
    }

    /// The file is re-read every cycle, so an external process can keep appending bars.
    /// Interval and lookback are whatever the file holds; rows for other symbols are skipped.
    async fn fetch_candles(
        &self,
        symbol: &str,
        _interval: TimeFrame,
        _lookback: LookbackWindow,
    ) -> Result<Vec<Candle>, EngineError> {
        let bytes = tokio::fs::read(&self.path).await?;
        let candles = normalize_candles(
            load_candles_from_reader(bytes.as_slice(), symbol)?
                .into_iter()
                .filter(|c| c.symbol == symbol)
                .collect(),
        );

        if candles.is_empty() {
            return Err(EngineError::DataUnavailable(format!(
                "no rows for {} in {}",
                symbol,
                self.path.display()
            )));
        }
        tracing::debug!(
            path = %self.path.display(),
            count = candles.len(),
            "Loaded candles from CSV"
        );
        Ok(candles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_test_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}", content).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = parse_timestamp("2025-03-03T14:30:00Z").unwrap();
        assert_eq!(parse_timestamp("2025-03-03 14:30:00").unwrap(), expected);
        assert_eq!(parse_timestamp("2025-03-03T09:30:00-05:00").unwrap(), expected);
        assert_eq!(parse_timestamp(&expected.timestamp().to_string()).unwrap(), expected);
        assert!(parse_timestamp("03/03/2025").is_err());
    }

    #[test]
    fn test_load_valid_rows() {
        let content = "\
timestamp,open,high,low,close,volume
2025-03-03T14:35:00Z,21004.25,21009,21001,21008,1304
2025-03-03T14:30:00Z,21000,21006,20998.5,21004.25,1520";
        let candles = load_candles_from_reader(content.as_bytes(), "NQ=F").unwrap();
        assert_eq!(candles.len(), 2);
        assert_eq!(candles[0].close, 21008.0);
        assert_eq!(candles[1].close, 21004.25);
        assert_eq!(candles[0].symbol, "NQ=F");
        assert_eq!(candles[1].volume, 1520.0);
    }

    #[test]
    fn test_volume_and_symbol_are_optional() {
        let content = "Timestamp,Open,High,Low,Close\n1741012200,1,2,0.5,1.5";
        let candles = load_candles_from_reader(content.as_bytes(), "ES=F").unwrap();
        assert_eq!(candles[0].volume, 0.0);
        assert_eq!(candles[0].symbol, "ES=F");
    }

    #[test]
    fn test_missing_close_column() {
        let content = "timestamp,open,high,low\n2025-03-03T14:30:00Z,1,2,0.5";
        let err = load_candles_from_reader(content.as_bytes(), "NQ=F").unwrap_err();
        assert!(err.to_string().contains("Missing 'close' field at line 2"));
    }

    #[test]
    fn test_invalid_number_reports_line() {
        let content = "\
timestamp,open,high,low,close
2025-03-03T14:30:00Z,1,2,0.5,1.5
2025-03-03T14:35:00Z,1,2,0.5,NOT_A_NUMBER";
        let err = load_candles_from_reader(content.as_bytes(), "NQ=F").unwrap_err();
        assert!(matches!(err, EngineError::CsvDataFormatError(_)));
        assert!(err.to_string().contains("Error parsing 'close' at line 3"));
    }

    #[tokio::test]
    async fn test_source_filters_by_symbol() {
        let file = create_test_csv(
            "\
timestamp,open,high,low,close,volume,symbol
2025-03-03T14:35:00Z,3,3,3,3,0,NQ=F
2025-03-03T14:30:00Z,2,2,2,2,0,ES=F
2025-03-03T14:30:00Z,1,1,1,1,0,NQ=F",
        );
        let source = CsvCandleSource::new(file.path());
        let candles = source
            .fetch_candles("NQ=F", TimeFrame::Minute5, LookbackWindow::Day1)
            .await
            .unwrap();
        assert_eq!(candles.len(), 2);
        assert!(candles.iter().all(|c| c.symbol == "NQ=F"));
        assert_eq!(candles[0].close, 1.0);
        assert_eq!(candles[1].close, 3.0);
    }

    #[tokio::test]
    async fn test_header_only_file_is_unavailable() {
        let file = create_test_csv("timestamp,open,high,low,close");
        let source = CsvCandleSource::new(file.path());
        let err = source
            .fetch_candles("NQ=F", TimeFrame::Minute5, LookbackWindow::Day1)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::DataUnavailable(_)));
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let source = CsvCandleSource::new("definitely/not/here.csv");
        let err = source
            .fetch_candles("NQ=F", TimeFrame::Minute5, LookbackWindow::Day1)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::IoError { .. }));
        assert!(err.is_data_unavailable());
    }
}
