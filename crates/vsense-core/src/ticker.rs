//! Ticker identification.
//!
//! Tickers are exchange-qualified symbols such as `RELIANCE.NS`, `M&M.NS`,
//! `^BSESN` or `AAPL`. The format is otherwise unconstrained, but a ticker
//! also names a directory under the models root, so it must never be able to
//! address anything outside that directory.

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum ticker length in bytes.
pub const MAX_TICKER_LEN: usize = 32;

/// Exchange-qualified stock symbol, the primary lookup key for statistics.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Ticker(String);

impl Ticker {
    /// Validate and wrap a ticker symbol.
    ///
    /// Lookups are exact matches, so neither case nor whitespace is
    /// normalized: a symbol with any whitespace is rejected.
    pub fn new(raw: impl AsRef<str>) -> Result<Self> {
        let symbol = raw.as_ref();

        if symbol.is_empty() {
            return Err(CoreError::InvalidTicker("ticker is empty".to_string()));
        }
        if symbol.len() > MAX_TICKER_LEN {
            return Err(CoreError::InvalidTicker(format!(
                "ticker exceeds {MAX_TICKER_LEN} bytes"
            )));
        }
        if symbol == "." || symbol == ".." {
            return Err(CoreError::InvalidTicker(format!("{symbol} is reserved")));
        }
        if symbol
            .chars()
            .any(|c| c == '/' || c == '\\' || c.is_control() || c.is_whitespace())
        {
            return Err(CoreError::InvalidTicker(format!(
                "{symbol} contains a path separator or whitespace"
            )));
        }

        Ok(Self(symbol.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Ticker {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for Ticker {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Ticker> for String {
    fn from(ticker: Ticker) -> Self {
        ticker.0
    }
}

impl AsRef<str> for Ticker {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_exchange_symbols() {
        for symbol in ["AAPL", "RELIANCE.NS", "M&M.NS", "^BSESN", "BAJAJ-AUTO.NS", "SMSN.IL"] {
            let ticker = Ticker::new(symbol).unwrap();
            assert_eq!(ticker.as_str(), symbol);
        }
    }

    #[test]
    fn test_surrounding_whitespace_rejected() {
        assert!(Ticker::new("  TCS.NS ").is_err());
        assert!(Ticker::new(" AAPL").is_err());
        assert!(Ticker::new("AAPL\n").is_err());
        assert!(Ticker::new("tcs.ns").unwrap() != Ticker::new("TCS.NS").unwrap());
    }

    #[test]
    fn test_rejects_path_escapes() {
        assert!(Ticker::new("").is_err());
        assert!(Ticker::new("   ").is_err());
        assert!(Ticker::new(".").is_err());
        assert!(Ticker::new("..").is_err());
        assert!(Ticker::new("../etc").is_err());
        assert!(Ticker::new("a\\b").is_err());
        assert!(Ticker::new("A B").is_err());
        assert!(Ticker::new("X".repeat(MAX_TICKER_LEN + 1)).is_err());
    }

    #[test]
    fn test_serde_is_a_plain_string() {
        let ticker = Ticker::new("INFY.NS").unwrap();
        let json = serde_json::to_string(&ticker).unwrap();
        assert_eq!(json, "\"INFY.NS\"");

        let back: Ticker = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ticker);

        assert!(serde_json::from_str::<Ticker>("\"../x\"").is_err());
    }
}
