use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Non-seasonal ARIMA order (p, d, q)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelOrder {
    pub p: usize,
    pub d: usize,
    pub q: usize,
}

impl ModelOrder {
    pub const fn new(p: usize, d: usize, q: usize) -> Self {
        Self { p, d, q }
    }
}

impl fmt::Display for ModelOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.p, self.d, self.q)
    }
}

/// Parses "p,d,q".
impl FromStr for ModelOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = parse_components(s)?;
        match parts.as_slice() {
            [p, d, q] => Ok(ModelOrder::new(*p, *d, *q)),
            _ => Err(format!("expected 'p,d,q', got '{}'", s)),
        }
    }
}

/// Seasonal order (P, D, Q, s). A period of 0 disables the seasonal part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonalOrder {
    pub p: usize,
    pub d: usize,
    pub q: usize,
    pub period: usize,
}

impl SeasonalOrder {
    pub const NONE: SeasonalOrder = SeasonalOrder { p: 0, d: 0, q: 0, period: 0 };

    pub fn is_none(&self) -> bool {
        self.period == 0 || (self.p == 0 && self.d == 0 && self.q == 0)
    }
}

impl fmt::Display for SeasonalOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {}, {})", self.p, self.d, self.q, self.period)
    }
}

/// Parses "P,D,Q,s".
impl FromStr for SeasonalOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = parse_components(s)?;
        match parts.as_slice() {
            [p, d, q, period] => {
                let order = SeasonalOrder { p: *p, d: *d, q: *q, period: *period };
                if *period == 1 && (*p > 0 || *d > 0 || *q > 0) {
                    return Err("seasonal period must be 0 or at least 2".to_string());
                }
                Ok(order)
            }
            _ => Err(format!("expected 'P,D,Q,s', got '{}'", s)),
        }
    }
}

fn parse_components(s: &str) -> Result<Vec<usize>, String> {
    s.trim()
        .trim_start_matches('(')
        .trim_end_matches(')')
        .split(',')
        .map(|part| {
            part.trim()
                .parse::<usize>()
                .map_err(|e| format!("invalid order component '{}': {}", part.trim(), e))
        })
        .collect()
}

/// Model family used for a forecast
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    Sarimax,
    Arima,
}

impl ModelKind {
    pub fn label(&self) -> &'static str {
        match self {
            ModelKind::Sarimax => "sarimax",
            ModelKind::Arima => "arima",
        }
    }
}

/// Accuracy of a forecast against the held-out test values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorMetrics {
    pub mae: f64,
    pub rmse: f64,
    /// None when every actual value is zero
    pub mape: Option<f64>,
}

/// Point forecasts of one model, positioned at `start_index` of the full series
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelForecast {
    pub model: ModelKind,
    pub order: ModelOrder,
    pub seasonal_order: SeasonalOrder,
    pub start_index: usize,
    pub predictions: Vec<f64>,
    pub lower_bound: Vec<f64>,
    pub upper_bound: Vec<f64>,
    pub confidence_level: f64,
    pub sigma2: f64,
    pub aic: Option<f64>,
    pub metrics: ErrorMetrics,
}

impl ModelForecast {
    /// (position, value) pairs on the full-series index
    pub fn indexed(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.predictions
            .iter()
            .enumerate()
            .map(move |(i, v)| (self.start_index + i, *v))
    }
}

/// Both model forecasts for one asset with the history they were fitted on
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastComparison {
    pub asset: String,
    pub dates: Vec<NaiveDate>,
    pub actual_open: Vec<f64>,
    pub train_size: usize,
    pub sarimax: ModelForecast,
    pub arima: ModelForecast,
    pub generated_at: DateTime<Utc>,
}

impl ForecastComparison {
    pub fn test_size(&self) -> usize {
        self.dates.len() - self.train_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_model_order() {
        assert_eq!("3,2,3".parse::<ModelOrder>().unwrap(), ModelOrder::new(3, 2, 3));
        assert_eq!("(4, 1, 3)".parse::<ModelOrder>().unwrap(), ModelOrder::new(4, 1, 3));
        assert!("4,1".parse::<ModelOrder>().is_err());
        assert!("a,b,c".parse::<ModelOrder>().is_err());
    }

    #[test]
    fn test_parse_seasonal_order() {
        let order = "1,0,1,7".parse::<SeasonalOrder>().unwrap();
        assert_eq!(order.period, 7);
        assert!(!order.is_none());
        assert!("0,0,0,0".parse::<SeasonalOrder>().unwrap().is_none());
        assert!("1,0,0,1".parse::<SeasonalOrder>().is_err());
    }

    #[test]
    fn test_display_round_trips_through_parser() {
        let order = ModelOrder::new(4, 1, 3);
        assert_eq!(order.to_string().parse::<ModelOrder>().unwrap(), order);
    }
}
