//! Stats provider configuration.

use crate::error::{StatsError, StatsResult};
use serde::{Deserialize, Serialize};
use vsense_core::Ticker;

/// A ticker offered on the dashboard and covered by batch generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickerEntry {
    pub symbol: String,
    /// Display name, e.g. "Tata Consultancy Services Ltd.".
    #[serde(default)]
    pub label: String,
}

impl TickerEntry {
    pub fn new(symbol: &str, label: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            label: label.to_string(),
        }
    }
}

/// Stats provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsConfig {
    /// Directory holding one subdirectory per trained ticker.
    #[serde(default = "default_models_root")]
    pub models_root: String,
    /// Tickers covered by batch generation, in order.
    #[serde(default = "default_tickers")]
    pub tickers: Vec<TickerEntry>,
}

fn default_models_root() -> String {
    "model/models".to_string()
}

/// Sensex constituents plus the two foreign listings the dashboard offers.
pub fn default_tickers() -> Vec<TickerEntry> {
    [
        ("RELIANCE.NS", "Reliance Industries Ltd."),
        ("NIITLTD.NS", "NIIT Limited"),
        ("TCS.NS", "Tata Consultancy Services Ltd."),
        ("HDFCBANK.NS", "HDFC Bank Ltd."),
        ("INFY.NS", "Infosys Ltd."),
        ("HINDUNILVR.NS", "Hindustan Unilever Ltd."),
        ("BHARTIARTL.NS", "Bharti Airtel Ltd."),
        ("KOTAKBANK.NS", "Kotak Mahindra Bank Ltd."),
        ("ITC.NS", "ITC Ltd."),
        ("AXISBANK.NS", "Axis Bank Ltd."),
        ("MARUTI.NS", "Maruti Suzuki India Ltd."),
        ("BAJFINANCE.NS", "Bajaj Finance Ltd."),
        ("BAJAJFINSV.NS", "Bajaj Finserv Ltd."),
        ("HCLTECH.NS", "HCL Technologies Ltd."),
        ("LUPIN.NS", "Lupin Ltd."),
        ("ULTRACEMCO.NS", "UltraTech Cement Ltd."),
        ("NTPC.NS", "NTPC Ltd."),
        ("WIPRO.NS", "Wipro Ltd."),
        ("M&M.NS", "Mahindra & Mahindra Ltd."),
        ("POWERGRID.NS", "Power Grid Corp. of India Ltd."),
        ("SBIN.NS", "State Bank of India"),
        ("ASIANPAINT.NS", "Asian Paints Ltd."),
        ("DRREDDY.NS", "Dr. Reddy's Laboratories Ltd."),
        ("BAJAJ-AUTO.NS", "Bajaj Auto Ltd."),
        ("SUNPHARMA.NS", "Sun Pharmaceutical Industries Ltd."),
        ("JSWSTEEL.NS", "JSW Steel Ltd."),
        ("TATAMOTORS.NS", "Tata Motors Ltd."),
        ("TITAN.NS", "Titan Company Ltd."),
        ("HDFCLIFE.NS", "HDFC Life Insurance Co. Ltd."),
        ("INDUSINDBK.NS", "IndusInd Bank Ltd."),
        ("DIVISLAB.NS", "Divi's Laboratories Ltd."),
        ("AAPL", "Apple Inc."),
        ("SMSN.IL", "Samsung Electronics Co., Ltd."),
    ]
    .into_iter()
    .map(|(symbol, label)| TickerEntry::new(symbol, label))
    .collect()
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            models_root: default_models_root(),
            tickers: default_tickers(),
        }
    }
}

impl StatsConfig {
    /// Validated tickers, in configured order, without duplicates.
    pub fn validated_tickers(&self) -> StatsResult<Vec<Ticker>> {
        let mut tickers: Vec<Ticker> = Vec::with_capacity(self.tickers.len());
        for entry in &self.tickers {
            let ticker = Ticker::new(&entry.symbol)
                .map_err(|e| StatsError::InvalidTicker(format!("configured ticker: {e}")))?;
            if !tickers.contains(&ticker) {
                tickers.push(ticker);
            }
        }
        Ok(tickers)
    }

    /// Display label for `symbol`, if configured.
    pub fn label_for(&self, symbol: &str) -> Option<&str> {
        self.tickers
            .iter()
            .find(|e| e.symbol == symbol && !e.label.is_empty())
            .map(|e| e.label.as_str())
    }
}
