//! Display model for a loaded ticker.
//!
//! Records come from a loosely typed store, so every field is read
//! defensively: numbers are formatted, strings pass through, and anything
//! missing gets a placeholder rather than an error.

use serde_json::Value;

/// Placeholder for a missing metric.
pub const MISSING: &str = "—";
/// Risk level shown when the record has none.
pub const UNKNOWN_RISK: &str = "Unknown";

/// One chart point.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartPoint {
    /// Date or loss-bucket label.
    pub label: String,
    pub value: f64,
}

/// A chart series. An empty series renders as "no data available".
#[derive(Debug, Clone, PartialEq)]
pub enum Series {
    Points(Vec<ChartPoint>),
    NoData,
}

impl Series {
    fn from_array(value: Option<&Value>, label_key: &str, value_key: &str) -> Self {
        let points: Vec<ChartPoint> = value
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| {
                        Some(ChartPoint {
                            label: label_text(item.get(label_key)?)?,
                            value: item.get(value_key)?.as_f64()?,
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        if points.is_empty() {
            Series::NoData
        } else {
            Series::Points(points)
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Series::NoData)
    }

    pub fn len(&self) -> usize {
        match self {
            Series::Points(points) => points.len(),
            Series::NoData => 0,
        }
    }

    pub fn points(&self) -> &[ChartPoint] {
        match self {
            Series::Points(points) => points,
            Series::NoData => &[],
        }
    }
}

fn label_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Format a VaR-style metric: numbers to two decimals, strings verbatim.
pub fn format_metric(value: Option<&Value>) -> String {
    match value {
        Some(Value::Number(n)) => match n.as_f64() {
            Some(f) => format!("{f:.2}"),
            None => n.to_string(),
        },
        Some(Value::String(s)) => s.clone(),
        _ => MISSING.to_string(),
    }
}

/// Risk statistics prepared for display.
#[derive(Debug, Clone, PartialEq)]
pub struct StatsView {
    pub ticker: String,
    pub var95: String,
    pub var99: String,
    pub cvar: String,
    pub risk_level: String,
    pub accuracy: Option<f64>,
    pub price_history: Series,
    pub volatility: Series,
    pub var_distribution: Series,
    pub fetch_time: Option<String>,
}

impl StatsView {
    /// Build the view from a stats response body.
    pub fn from_json(ticker: &str, body: &Value) -> Self {
        let risk_level = body
            .get("riskLevel")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .unwrap_or(UNKNOWN_RISK)
            .to_string();

        Self {
            ticker: body
                .get("ticker")
                .and_then(Value::as_str)
                .unwrap_or(ticker)
                .to_string(),
            var95: format_metric(body.get("var95")),
            var99: format_metric(body.get("var99")),
            cvar: format_metric(body.get("cvar")),
            risk_level,
            accuracy: body.get("accuracy").and_then(Value::as_f64),
            price_history: Series::from_array(body.get("priceHistory"), "date", "price"),
            volatility: Series::from_array(body.get("volatilityData"), "date", "volatility"),
            var_distribution: Series::from_array(body.get("varData"), "loss", "probability"),
            fetch_time: body
                .get("fetchTime")
                .and_then(Value::as_str)
                .map(str::to_string),
        }
    }

    /// `87.12%`, or the missing placeholder.
    pub fn accuracy_display(&self) -> String {
        match self.accuracy {
            Some(a) => format!("{a:.2}%"),
            None => MISSING.to_string(),
        }
    }
}

/// Result of loading one ticker.
#[derive(Debug, Clone, PartialEq)]
pub enum TickerView {
    Loaded(Box<StatsView>),
    /// No stats yet. Generating missing data and retrying may help.
    Missing { ticker: String, message: String },
    Failed { message: String },
}

impl TickerView {
    /// Whether the "Generate Missing Data" action applies.
    pub fn can_generate(&self) -> bool {
        matches!(self, TickerView::Missing { .. })
    }
}
