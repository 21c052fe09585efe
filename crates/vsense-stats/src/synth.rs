//! Placeholder record synthesis.
//!
//! Produces records with the right shape and plausible magnitudes but no
//! statistical meaning. They stand in until the training pipeline writes
//! real statistics for the ticker.

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use vsense_core::{
    Document, PricePoint, RiskLevel, RiskStatRecord, Ticker, VarBucket, VolatilityPoint,
    HISTORY_DAYS, VAR_BUCKETS,
};

/// Price range for the synthetic history, `[low, high)`.
const PRICE_RANGE: (f64, f64) = (1000.0, 1200.0);
/// Daily volatility range, `[0, 0.05)`.
const MAX_VOLATILITY: f64 = 0.05;
/// Bucket probability range, `[0, 0.1)`.
const MAX_BUCKET_PROBABILITY: f64 = 0.1;
/// VaR/CVaR ranges in cents, inclusive.
const VAR95_CENTS: (i64, i64) = (1_000, 6_000);
const VAR99_CENTS: (i64, i64) = (3_000, 11_000);
const CVAR_CENTS: (i64, i64) = (5_000, 15_000);
/// Accuracy range in percent, inclusive.
const ACCURACY_RANGE: (f64, f64) = (80.0, 95.0);

/// Build one placeholder record for `ticker` as of `now`.
///
/// The history covers the `HISTORY_DAYS` calendar days before `now`'s date,
/// oldest first.
pub fn generate_record<R: Rng + ?Sized>(
    ticker: &Ticker,
    now: DateTime<Utc>,
    rng: &mut R,
) -> RiskStatRecord {
    let today = now.date_naive();

    let price_history: Vec<PricePoint> = (0..HISTORY_DAYS)
        .map(|i| PricePoint {
            date: today - Duration::days((HISTORY_DAYS - i) as i64),
            price: rng.gen_range(PRICE_RANGE.0..PRICE_RANGE.1),
        })
        .collect();

    let volatility_data = price_history
        .iter()
        .map(|p| VolatilityPoint {
            date: p.date,
            volatility: rng.gen_range(0.0..MAX_VOLATILITY),
        })
        .collect();

    let var_data = (0..VAR_BUCKETS)
        .map(|i| VarBucket {
            loss: VarBucket::label_for(i),
            probability: rng.gen_range(0.0..MAX_BUCKET_PROBABILITY),
        })
        .collect();

    RiskStatRecord {
        ticker: ticker.clone(),
        var95: cents(rng, VAR95_CENTS),
        var99: cents(rng, VAR99_CENTS),
        cvar: cents(rng, CVAR_CENTS),
        risk_level: RiskLevel::ALL[rng.gen_range(0..RiskLevel::ALL.len())],
        accuracy: rng.gen_range(ACCURACY_RANGE.0..=ACCURACY_RANGE.1),
        price_history,
        volatility_data,
        var_data,
        created_at: Some(now),
        extra: Document::new(),
    }
}

fn cents<R: Rng + ?Sized>(rng: &mut R, range: (i64, i64)) -> Decimal {
    Decimal::new(rng.gen_range(range.0..=range.1), 2)
}

/// Thread-safe record generator.
pub struct Synthesizer {
    rng: Mutex<StdRng>,
}

impl Synthesizer {
    /// Generator seeded from OS entropy.
    pub fn from_entropy() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Deterministic generator.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    pub fn synthesize(&self, ticker: &Ticker, now: DateTime<Utc>) -> RiskStatRecord {
        let mut rng = self.rng.lock();
        generate_record(ticker, now, &mut *rng)
    }
}

impl Default for Synthesizer {
    fn default() -> Self {
        Self::from_entropy()
    }
}
