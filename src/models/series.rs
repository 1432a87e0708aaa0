use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Document as stored for one asset. Extra fields in the store are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDocument {
    pub date: String,
    pub open: f64,
    pub marketcap: f64,
    pub volume: f64,
}

/// One parsed observation of an asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesRecord {
    pub date: NaiveDate,
    pub open: f64,
    pub marketcap: f64,
    pub volume: f64,
}

impl SeriesRecord {
    pub fn value(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Open => self.open,
            Metric::MarketCap => self.marketcap,
            Metric::Volume => self.volume,
        }
    }
}

/// Metrics plotted on the browsing page, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Open,
    MarketCap,
    Volume,
}

impl Metric {
    pub const ALL: [Metric; 3] = [Metric::Open, Metric::MarketCap, Metric::Volume];

    pub fn field(&self) -> &'static str {
        match self {
            Metric::Open => "open",
            Metric::MarketCap => "marketcap",
            Metric::Volume => "volume",
        }
    }
}

/// Ascending series of one asset split into a train prefix and a test suffix.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreparedSeries {
    pub asset: String,
    pub records: Vec<SeriesRecord>,
    pub train_size: usize,
}

impl PreparedSeries {
    pub fn train(&self) -> &[SeriesRecord] {
        &self.records[..self.train_size]
    }

    pub fn test(&self) -> &[SeriesRecord] {
        &self.records[self.train_size..]
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.records.iter().map(|r| r.date).collect()
    }

    pub fn open_values(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.open).collect()
    }

    pub fn train_open(&self) -> Vec<f64> {
        self.train().iter().map(|r| r.open).collect()
    }

    pub fn test_open(&self) -> Vec<f64> {
        self.test().iter().map(|r| r.open).collect()
    }
}
