use chrono::NaiveDate;
use tracing::{debug, info};

use crate::config::SplitConfig;
use crate::errors::AppError;
use crate::models::{PreparedSeries, RawDocument, SeriesRecord};
use crate::store::SeriesStore;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Full history of an asset in ascending date order
pub async fn load_history(
    store: &dyn SeriesStore,
    asset: &str,
) -> Result<Vec<SeriesRecord>, AppError> {
    let documents = store.find_all(asset).await?;
    info!("Loaded {} documents for {}", documents.len(), asset);
    parse_documents(documents)
}

/// History of an asset split for forecasting
pub async fn load_prepared(
    store: &dyn SeriesStore,
    asset: &str,
    split: &SplitConfig,
) -> Result<PreparedSeries, AppError> {
    let documents = store.find_all(asset).await?;
    prepare_series(asset, documents, split)
}

pub fn prepare_series(
    asset: &str,
    documents: Vec<RawDocument>,
    split: &SplitConfig,
) -> Result<PreparedSeries, AppError> {
    let records = parse_documents(documents)?;
    split_series(asset, records, split)
}

/// Parses stored documents (newest-first) into an ascending series.
pub fn parse_documents(documents: Vec<RawDocument>) -> Result<Vec<SeriesRecord>, AppError> {
    let mut records = documents
        .into_iter()
        .rev()
        .map(parse_document)
        .collect::<Result<Vec<_>, _>>()?;

    ensure_ascending(&mut records)?;
    Ok(records)
}

fn parse_document(doc: RawDocument) -> Result<SeriesRecord, AppError> {
    let date = parse_date(&doc.date)?;
    Ok(SeriesRecord {
        date,
        open: doc.open,
        marketcap: doc.marketcap,
        volume: doc.volume,
    })
}

pub fn parse_date(raw: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .map_err(|e| AppError::Parse(format!("invalid date '{}': {}", raw, e)))
}

/// Sorts out-of-order input and rejects repeated dates. Input that is already
/// ascending is left untouched.
fn ensure_ascending(records: &mut [SeriesRecord]) -> Result<(), AppError> {
    if !records.windows(2).all(|w| w[0].date <= w[1].date) {
        debug!("Series is not in stored order, sorting by date");
        records.sort_by_key(|r| r.date);
    }

    if let Some(w) = records.windows(2).find(|w| w[0].date == w[1].date) {
        return Err(AppError::Parse(format!("duplicate date {}", w[0].date)));
    }
    Ok(())
}

/// `floor(ratio * n)`
pub fn split_point(n: usize, ratio: f64) -> usize {
    (ratio * n as f64).floor() as usize
}

/// Splits an ascending series into train prefix and test suffix. Applying it
/// to the records of an already prepared series reproduces that series.
pub fn split_series(
    asset: &str,
    mut records: Vec<SeriesRecord>,
    split: &SplitConfig,
) -> Result<PreparedSeries, AppError> {
    ensure_ascending(&mut records)?;

    let n = records.len();
    if n < split.min_series_len {
        return Err(AppError::ModelFit(format!(
            "insufficient data for forecasting {}: need at least {} records, got {}",
            asset, split.min_series_len, n
        )));
    }

    let train_size = split_point(n, split.train_ratio);
    if train_size == 0 || train_size >= n {
        return Err(AppError::ModelFit(format!(
            "train ratio {} leaves an empty partition for {} records",
            split.train_ratio, n
        )));
    }

    debug!("Split {} into {} train / {} test", asset, train_size, n - train_size);

    Ok(PreparedSeries {
        asset: asset.to_string(),
        records,
        train_size,
    })
}
