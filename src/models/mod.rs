mod series;
pub mod chart;
pub mod forecast;

pub use series::{Metric, PreparedSeries, RawDocument, SeriesRecord};
pub use chart::{Axis, ChartDocument, Font, Layout, Legend, Title, Trace};
pub use forecast::{
    ErrorMetrics, ForecastComparison, ModelForecast, ModelKind, ModelOrder, SeasonalOrder,
};
