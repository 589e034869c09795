use chrono::{DateTime, Utc};

/// Result of the bin analytic engine for one `(symbol, BinDecl, D0)` query.
/// Lifetime bounded to the serving of one request.
#[derive(Debug, Clone, PartialEq)]
pub struct BinResult {
    /// UTC instant corresponding to `D0` at `BinDecl.end_time` in
    /// `BinDecl.timezone`.
    pub close_time: DateTime<Utc>,
    pub trading_day_count: u32,
    pub total_moves: u64,
    pub max_moves: u64,
    pub min_moves: u64,
    pub smallest_moves: u64,
    pub avg_volume: u64,
    pub avg_non_zero_volume: u64,
    /// Percentage changes, already rounded to 6 decimal places
    /// (round-half-up).
    pub pct_change_10_day: f64,
    pub pct_change_15_day: f64,
    pub pct_change_20_day: f64,
    pub pct_change_10_trading_day: f64,
    pub pct_change_15_trading_day: f64,
    pub pct_change_20_trading_day: f64,
    pub is_null: bool,
}

impl BinResult {
    /// The null result for a zero-day-count query: all aggregates zero, no
    /// tick-store queries issued.
    pub fn null(close_time: DateTime<Utc>) -> Self {
        Self {
            close_time,
            trading_day_count: 0,
            total_moves: 0,
            max_moves: 0,
            min_moves: 0,
            smallest_moves: 0,
            avg_volume: 0,
            avg_non_zero_volume: 0,
            pct_change_10_day: 0.0,
            pct_change_15_day: 0.0,
            pct_change_20_day: 0.0,
            pct_change_10_trading_day: 0.0,
            pct_change_15_trading_day: 0.0,
            pct_change_20_trading_day: 0.0,
            is_null: true,
        }
    }
}
