//! Typed client for the VolatiSense dashboard API.
//!
//! `DashboardClient::load_ticker` mirrors what the browser page does: a 404
//! becomes `TickerView::Missing` (offer "Generate Missing Data", then retry),
//! other failures become `TickerView::Failed` with a displayable message, and
//! a loaded record is turned into a `StatsView` with formatted metrics and
//! `Series::NoData` for empty charts.

pub mod client;
pub mod error;
pub mod view;

pub use client::{
    DashboardClient, GenerateSummary, LoginSession, PipelineProgress, TickerOption,
    UpdateOutcome, UserInfo, RETRY_INSTRUCTION,
};
pub use error::{ClientError, ClientResult};
pub use view::{format_metric, ChartPoint, Series, StatsView, TickerView};
