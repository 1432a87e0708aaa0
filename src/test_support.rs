//! Fixtures shared by unit tests.

use chrono::{Duration, NaiveDate};

use crate::models::RawDocument;

/// `n` consecutive daily documents starting at 2021-01-01, stored newest-first
/// the way the collector writes them. `open` is computed from the day index.
pub fn daily_documents<F: Fn(usize) -> f64>(n: usize, open: F) -> Vec<RawDocument> {
    let start = NaiveDate::from_ymd_opt(2021, 1, 1).expect("valid date");
    let mut docs: Vec<RawDocument> = (0..n)
        .map(|i| {
            let value = open(i);
            RawDocument {
                date: (start + Duration::days(i as i64)).format("%Y-%m-%d").to_string(),
                open: value,
                marketcap: value * 19_000_000.0,
                volume: 1_000_000.0 + (i % 7) as f64 * 25_000.0,
            }
        })
        .collect();
    docs.reverse();
    docs
}

/// Trending series with a deterministic wiggle, enough texture for the models.
pub fn wavy_open(i: usize) -> f64 {
    let t = i as f64;
    30_000.0 + 45.0 * t + 900.0 * (t / 5.0).sin() + 250.0 * (t / 1.7).cos()
}
