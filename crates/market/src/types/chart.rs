//! Wire types for the `v8/finance/chart` endpoint.

use chrono::DateTime;
use serde::Deserialize;

use crate::{DailyBar, MarketError, MarketResult};

const NOT_FOUND: &str = "Not Found";

#[derive(Debug, Deserialize)]
pub struct ChartResponse {
    pub chart: Chart,
}

#[derive(Debug, Deserialize)]
pub struct Chart {
    pub result: Option<Vec<ChartResult>>,
    pub error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
pub struct ChartError {
    pub code: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChartResult {
    /// Missing entirely when the range holds no sessions.
    #[serde(default)]
    pub timestamp: Vec<i64>,
    pub indicators: Indicators,
}

#[derive(Debug, Deserialize)]
pub struct Indicators {
    #[serde(default)]
    pub quote: Vec<QuoteBlock>,
}

#[derive(Debug, Default, Deserialize)]
pub struct QuoteBlock {
    #[serde(default)]
    pub close: Vec<Option<f64>>,
    #[serde(default)]
    pub volume: Vec<Option<f64>>,
}

impl ChartResponse {
    /// Flattens the columnar payload into bars, oldest first.
    ///
    /// Sessions with a null close (halted or still open) are dropped. A
    /// `Not Found` error is reported as an empty history.
    pub fn into_bars(self) -> MarketResult<Vec<DailyBar>> {
        if let Some(error) = self.chart.error {
            if error.code == NOT_FOUND {
                return Ok(Vec::new());
            }
            return Err(MarketError::Custom(format!(
                "{}: {}",
                error.code,
                error.description.unwrap_or_default()
            )));
        }

        let Some(result) = self.chart.result.and_then(|r| r.into_iter().next()) else {
            return Ok(Vec::new());
        };
        if result.timestamp.is_empty() {
            return Ok(Vec::new());
        }

        let quote = result
            .indicators
            .quote
            .into_iter()
            .next()
            .ok_or_else(|| MarketError::Malformed("missing quote block".into()))?;

        if quote.close.len() != result.timestamp.len() {
            return Err(MarketError::Malformed(format!(
                "{} timestamps but {} closes",
                result.timestamp.len(),
                quote.close.len()
            )));
        }

        let mut bars = Vec::with_capacity(result.timestamp.len());
        for (i, ts) in result.timestamp.iter().enumerate() {
            let Some(close) = quote.close[i] else { continue };
            if !close.is_finite() || close < 0.0 {
                return Err(MarketError::Malformed(format!("invalid close {close} at {ts}")));
            }
            let ts = DateTime::from_timestamp(*ts, 0)
                .ok_or_else(|| MarketError::Malformed(format!("invalid timestamp {ts}")))?;
            let volume = quote.volume.get(i).copied().flatten().unwrap_or(0.0).max(0.0) as u64;
            bars.push(DailyBar { ts, close, volume });
        }

        Ok(bars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> MarketResult<Vec<DailyBar>> {
        serde_json::from_str::<ChartResponse>(raw)?.into_bars()
    }

    #[test]
    fn test_parse_five_day_window() {
        let raw = r#"{"chart":{"result":[{
            "meta":{"symbol":"PCTY","currency":"USD"},
            "timestamp":[1717075800,1717162200,1717421400],
            "indicators":{"quote":[{
                "open":[150.1,151.0,149.2],
                "close":[151.22,null,148.73],
                "volume":[412300,380100,501234]
            }]}
        }],"error":null}}"#;

        let bars = parse(raw).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].close, 151.22);
        assert_eq!(bars[1].close, 148.73);
        assert_eq!(bars[1].volume, 501234);
        assert!(bars[0].ts < bars[1].ts);
    }

    #[test]
    fn test_not_found_is_empty_history() {
        let raw = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
        assert!(parse(raw).unwrap().is_empty());
    }

    #[test]
    fn test_missing_timestamps_is_empty_history() {
        let raw = r#"{"chart":{"result":[{"meta":{},"indicators":{"quote":[{}]}}],"error":null}}"#;
        assert!(parse(raw).unwrap().is_empty());
    }

    #[test]
    fn test_other_chart_errors_are_transient() {
        let raw = r#"{"chart":{"result":null,"error":{"code":"Internal Server Error","description":"try later"}}}"#;
        let err = parse(raw).unwrap_err();
        assert!(err.is_transient());
    }

    #[test]
    fn test_misaligned_columns_are_malformed() {
        let raw = r#"{"chart":{"result":[{
            "timestamp":[1717075800,1717162200],
            "indicators":{"quote":[{"close":[151.22],"volume":[1,2]}]}
        }],"error":null}}"#;
        let err = parse(raw).unwrap_err();
        assert!(matches!(err, MarketError::Malformed(_)));
        assert!(!err.is_transient());
    }

    #[test]
    fn test_unexpected_shape_is_malformed() {
        let err = parse(r#"{"finance":{"result":null}}"#).unwrap_err();
        assert!(!err.is_transient());
    }
}
