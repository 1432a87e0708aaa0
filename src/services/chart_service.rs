use crate::errors::AppError;
use crate::models::{
    Axis, ChartDocument, Font, ForecastComparison, Layout, Legend, Metric, SeriesRecord, Title,
    Trace,
};
use crate::services::series_service::DATE_FORMAT;

const ACCENT_COLOR: &str = "#E6B11B";
const LABEL_COLOR: &str = "White";
const TRANSPARENT: &str = "rgba(0, 0, 0, 0)";

// train, test, sarimax, arima
const COMPARISON_COLORS: [&str; 4] = ["#636efa", "#EF553B", "#00cc96", "#ab63fa"];

/// One raw metric of an asset over its whole history
pub fn metric_chart(asset: &str, records: &[SeriesRecord], metric: Metric) -> ChartDocument {
    let x = date_axis(records);
    let y = records.iter().map(|r| Some(r.value(metric))).collect();

    ChartDocument {
        data: vec![Trace::line(metric.field(), x, y, ACCENT_COLOR, false)],
        layout: themed_layout(
            &format!("{} value of {}", metric.field(), asset),
            metric.field(),
            "",
        ),
    }
}

/// The three panels of the browsing page: open, marketcap, volume
pub fn raw_metric_charts(asset: &str, records: &[SeriesRecord]) -> [ChartDocument; 3] {
    Metric::ALL.map(|metric| metric_chart(asset, records, metric))
}

/// Train and test actuals plus both model forecasts on one shared date axis.
/// Each trace spans every date; positions outside its range are `null`.
pub fn forecast_chart(comparison: &ForecastComparison) -> ChartDocument {
    let n = comparison.dates.len();
    let x: Vec<String> = comparison
        .dates
        .iter()
        .map(|d| d.format(DATE_FORMAT).to_string())
        .collect();

    let mut train = vec![None; n];
    let mut test = vec![None; n];
    for (i, value) in comparison.actual_open.iter().enumerate() {
        if i < comparison.train_size {
            train[i] = Some(*value);
        } else {
            test[i] = Some(*value);
        }
    }

    let place = |forecast: &crate::models::ModelForecast| {
        let mut y = vec![None; n];
        for (i, value) in forecast.indexed() {
            if i < n {
                y[i] = Some(value);
            }
        }
        y
    };
    let sarimax = place(&comparison.sarimax);
    let arima = place(&comparison.arima);

    let series = [
        ("train", train),
        ("test", test),
        (comparison.sarimax.model.label(), sarimax),
        (comparison.arima.model.label(), arima),
    ];

    let data = series
        .into_iter()
        .zip(COMPARISON_COLORS)
        .map(|((name, y), color)| Trace::line(name, x.clone(), y, color, true))
        .collect();

    ChartDocument {
        data,
        layout: themed_layout(
            &format!(
                "Prediction of {} values with SARIMAX and ARIMA Models",
                comparison.asset.to_uppercase()
            ),
            "value",
            "variable",
        ),
    }
}

pub fn to_json(chart: &ChartDocument) -> Result<String, AppError> {
    Ok(serde_json::to_string(chart)?)
}

fn date_axis(records: &[SeriesRecord]) -> Vec<String> {
    records
        .iter()
        .map(|r| r.date.format(DATE_FORMAT).to_string())
        .collect()
}

fn themed_layout(title: &str, y_title: &str, legend_title: &str) -> Layout {
    let label_font = || Font { color: LABEL_COLOR.to_string() };
    let axis = |text: &str| Axis {
        title: Title { text: text.to_string(), x: None, font: None },
        showgrid: false,
        color: LABEL_COLOR.to_string(),
    };

    Layout {
        title: Title {
            text: title.to_string(),
            x: Some(0.5),
            font: Some(Font { color: ACCENT_COLOR.to_string() }),
        },
        plot_bgcolor: TRANSPARENT.to_string(),
        paper_bgcolor: TRANSPARENT.to_string(),
        legend: Legend {
            font: label_font(),
            title: Title { text: legend_title.to_string(), x: None, font: None },
        },
        xaxis: axis("date"),
        yaxis: axis(y_title),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    use crate::config::{ForecastConfig, SplitConfig};
    use crate::services::forecasting_service::generate_forecast;
    use crate::services::series_service::prepare_series;
    use crate::test_support::{daily_documents, wavy_open};

    #[test]
    fn test_metric_charts_use_accent_theme() {
        let series = prepare_series("bitcoin", daily_documents(12, wavy_open), &SplitConfig::default()).unwrap();
        let charts = raw_metric_charts("bitcoin", &series.records);

        let titles: Vec<&str> = charts.iter().map(|c| c.layout.title.text.as_str()).collect();
        assert_eq!(
            titles,
            vec!["open value of bitcoin", "marketcap value of bitcoin", "volume value of bitcoin"]
        );
        for chart in &charts {
            assert_eq!(chart.data.len(), 1);
            assert_eq!(chart.data[0].line.color, ACCENT_COLOR);
            assert_eq!(chart.data[0].point_count(), 12);
            assert_eq!(chart.layout.plot_bgcolor, TRANSPARENT);
            assert_eq!(chart.layout.paper_bgcolor, TRANSPARENT);
            assert!(!chart.layout.xaxis.showgrid && !chart.layout.yaxis.showgrid);
            assert_eq!(chart.layout.title.x, Some(0.5));
        }
        assert_eq!(charts[2].data[0].y[0], Some(series.records[0].volume));
    }

    #[test]
    fn test_forecast_chart_for_hundred_days() {
        let series = prepare_series("bitcoin", daily_documents(100, wavy_open), &SplitConfig::default()).unwrap();
        let comparison = generate_forecast(&series, &ForecastConfig::default()).unwrap();
        let chart = forecast_chart(&comparison);

        let names: Vec<&str> = chart.data.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["train", "test", "sarimax", "arima"]);

        let mut axis = BTreeSet::new();
        for trace in &chart.data {
            assert!(trace.point_count() <= 100);
            assert_eq!(trace.x.len(), 100);
            axis.extend(trace.x.iter().cloned());
        }
        assert_eq!(axis.len(), 100);
        assert_eq!(axis.first().map(String::as_str), Some("2021-01-01"));

        assert_eq!(chart.trace("train").unwrap().point_count(), 80);
        assert_eq!(chart.trace("test").unwrap().point_count(), 20);
        assert_eq!(chart.trace("sarimax").unwrap().point_count(), 20);
        assert_eq!(chart.trace("arima").unwrap().point_count(), 20);

        // forecasts begin where the train partition ends
        assert!(chart.trace("arima").unwrap().y[79].is_none());
        assert!(chart.trace("arima").unwrap().y[80].is_some());
        assert!(chart.layout.title.text.contains("BITCOIN"));
    }

    #[test]
    fn test_chart_json_shape() {
        let series = prepare_series("ethereum", daily_documents(20, wavy_open), &SplitConfig::default()).unwrap();
        let comparison = generate_forecast(&series, &ForecastConfig::default()).unwrap();
        let json = to_json(&forecast_chart(&comparison)).unwrap();

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["data"].as_array().unwrap().len(), 4);
        assert_eq!(value["data"][0]["type"], "scatter");
        assert!(value["data"][0]["y"][19].is_null());
        assert_eq!(value["layout"]["paper_bgcolor"], TRANSPARENT);
        assert_eq!(value["layout"]["xaxis"]["showgrid"], false);
    }
}
