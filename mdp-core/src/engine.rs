//! The bin analytic engine (§4.4): turns a `(symbol, BinDecl, dayOffset,
//! today)` query into a [`BinResult`] by walking business days backward from
//! `today`, querying the tick store for each day's window, and aggregating.

use std::str::FromStr;

use chrono::{DateTime, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use mdp_types::{BinDecl, BinResult, SymbolHandle, Trade};

use crate::{calendar, errors::CoreError, rounding, tick_store::TickStoreAdapter};

/// Compute the [`BinResult`] for `symbol` under `bin_decl`, anchored at
/// `today` (the caller's idea of "now" in `bin_decl`'s time zone, as a
/// calendar date) and shifted back `day_offset` further business days.
///
/// Issues no tick-store queries when `bin_decl.day_count() == 0`; returns
/// [`BinResult::null`] in that case instead (§8 boundary behavior).
pub fn compute(
    adapter: &dyn TickStoreAdapter,
    symbol: SymbolHandle,
    bin_decl: &BinDecl,
    day_offset: u32,
    today: NaiveDate,
) -> Result<BinResult, CoreError> {
    let tz = Tz::from_str(bin_decl.timezone())
        .map_err(|_| CoreError::UnknownTimeZone(bin_decl.timezone().to_string()))?;

    let d0_candidate = calendar::nearest_business_day_on_or_before(adapter, today);
    let d0 = calendar::business_day_offset(adapter, d0_candidate, -(day_offset as i64));

    let close_time = local_to_utc(tz, d0, bin_decl.end_time(), bin_decl.timezone())?;

    let day_count = bin_decl.day_count();
    if day_count == 0 {
        return Ok(BinResult::null(close_time));
    }

    let mut daily_moves = Vec::with_capacity(day_count as usize);
    let mut daily_volume = Vec::with_capacity(day_count as usize);
    let mut daily_pct = Vec::with_capacity(day_count as usize);

    for t in 0..day_count {
        let d_t = calendar::business_day_offset(adapter, d0, -(t as i64));
        let from = local_to_utc(tz, d_t, bin_decl.start_time(), bin_decl.timezone())?;
        let to = local_to_utc(tz, d_t, bin_decl.end_time(), bin_decl.timezone())?;

        let mut open: Option<f64> = None;
        let mut close: Option<f64> = None;
        let mut moves: u64 = 0;
        let mut volume: u64 = 0;

        let mut collect = |trade: Trade| {
            if open.is_none() {
                open = Some(trade.last_price);
            }
            close = Some(trade.last_price);
            moves += 1;
            volume += trade.tick_volume;
        };
        adapter.for_each_trade(symbol, from.timestamp(), to.timestamp(), &mut collect);

        let pc = match open {
            Some(o) if o > 0.0 => 100.0 * (close.unwrap_or(o) - o) / o,
            _ => 0.0,
        };

        daily_moves.push(moves);
        daily_volume.push(volume);
        daily_pct.push(pc);
    }

    let total_moves: u64 = daily_moves.iter().sum();
    let accumulated_volume: u64 = daily_volume.iter().sum();
    let trading_day_count = daily_moves.iter().filter(|&&m| m > 0).count() as u32;
    let max_moves = daily_moves.iter().copied().max().unwrap_or(0);
    let min_moves = daily_moves.iter().copied().min().unwrap_or(0);
    let smallest_moves = daily_moves.iter().copied().filter(|&m| m > 0).min().unwrap_or(0);

    let avg_volume = if accumulated_volume > 0 {
        accumulated_volume / day_count as u64
    } else {
        0
    };
    let avg_non_zero_volume = if trading_day_count > 0 {
        accumulated_volume / trading_day_count as u64
    } else {
        0
    };

    let pct_change = |k: usize| -> f64 {
        let take = k.min(daily_pct.len());
        let sum: f64 = daily_pct[..take].iter().sum();
        rounding::round6(sum / take as f64)
    };
    let pct_change_trading = |k: usize| -> f64 {
        let take = k.min(daily_pct.len());
        let sum: f64 = daily_pct[..take].iter().sum();
        let trading_days_in_first_k = daily_moves[..take].iter().filter(|&&m| m > 0).count().max(1);
        rounding::round6(sum / trading_days_in_first_k as f64)
    };

    Ok(BinResult {
        close_time,
        trading_day_count,
        total_moves,
        max_moves,
        min_moves,
        smallest_moves,
        avg_volume,
        avg_non_zero_volume,
        pct_change_10_day: pct_change(10),
        pct_change_15_day: pct_change(15),
        pct_change_20_day: pct_change(20),
        pct_change_10_trading_day: pct_change_trading(10),
        pct_change_15_trading_day: pct_change_trading(15),
        pct_change_20_trading_day: pct_change_trading(20),
        is_null: false,
    })
}

fn local_to_utc(
    tz: Tz,
    date: NaiveDate,
    time: NaiveTime,
    tz_name: &str,
) -> Result<DateTime<Utc>, CoreError> {
    let naive = NaiveDateTime::new(date, time);
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Ok(dt.with_timezone(&Utc)),
        LocalResult::None => Err(CoreError::NonExistentLocalTime(
            naive.to_string(),
            tz_name.to_string(),
        )),
        LocalResult::Ambiguous(_, _) => Err(CoreError::AmbiguousLocalTime(
            naive.to_string(),
            tz_name.to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct FakeStore {
        trades: HashMap<u64, Vec<(i64, Trade)>>,
    }

    impl TickStoreAdapter for FakeStore {
        fn is_business_day(&self, date: NaiveDate) -> bool {
            use chrono::Datelike;
            !matches!(date.weekday(), chrono::Weekday::Sat | chrono::Weekday::Sun)
        }
        fn symbol_exists(&self, _symbol: &str) -> bool {
            true
        }
        fn symbol_handle(&self, _symbol: &str) -> Option<SymbolHandle> {
            Some(SymbolHandle(1))
        }
        fn for_each_trade(
            &self,
            symbol: SymbolHandle,
            from_unix_sec: i64,
            to_unix_sec: i64,
            callback: &mut dyn FnMut(Trade),
        ) {
            let Some(trades) = self.trades.get(&symbol.0) else {
                return;
            };
            for (ts, trade) in trades {
                if *ts >= from_unix_sec && *ts < to_unix_sec {
                    callback(*trade);
                }
            }
        }
    }

    fn bin() -> BinDecl {
        BinDecl::new(
            "open30",
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
            "America/New_York",
            1,
        )
        .unwrap()
    }

    // spec.md §8 scenario 1.
    #[test]
    fn three_trades_on_one_day_matches_scenario_one() {
        let monday = NaiveDate::from_ymd_opt(2024, 1, 8).unwrap();
        let window_start = chrono_tz::America::New_York
            .from_local_datetime(&NaiveDateTime::new(monday, NaiveTime::from_hms_opt(9, 5, 0).unwrap()))
            .unwrap()
            .with_timezone(&Utc)
            .timestamp();
        let store = FakeStore {
            trades: HashMap::from([(
                1,
                vec![
                    (
                        window_start,
                        Trade {
                            last_price: 100.0,
                            tick_volume: 1,
                        },
                    ),
                    (
                        window_start + 60,
                        Trade {
                            last_price: 101.0,
                            tick_volume: 2,
                        },
                    ),
                    (
                        window_start + 120,
                        Trade {
                            last_price: 102.0,
                            tick_volume: 3,
                        },
                    ),
                ],
            )]),
        };

        let result = compute(&store, SymbolHandle(1), &bin(), 0, monday).unwrap();
        assert_eq!(result.total_moves, 3);
        assert_eq!(result.avg_volume, 6);
        assert_eq!(result.avg_non_zero_volume, 6);
        assert_eq!(result.pct_change_10_day, 2.0);
        assert_eq!(result.pct_change_10_trading_day, 2.0);
        assert!(!result.is_null);
    }

    #[test]
    fn zero_day_count_is_null_and_issues_no_queries() {
        let bin = bin().with_day_count(0, 90);
        let monday = NaiveDate::from_ymd_opt(2024, 1, 8).unwrap();
        let store = FakeStore { trades: HashMap::new() };
        let result = compute(&store, SymbolHandle(1), &bin, 0, monday).unwrap();
        assert!(result.is_null);
        assert_eq!(result.total_moves, 0);
        assert_eq!(result.avg_volume, 0);
    }

    #[test]
    fn all_days_with_zero_trades_avoids_division_by_zero() {
        let bin = bin().with_day_count(3, 90);
        let monday = NaiveDate::from_ymd_opt(2024, 1, 8).unwrap();
        let store = FakeStore { trades: HashMap::new() };
        let result = compute(&store, SymbolHandle(1), &bin, 0, monday).unwrap();
        assert_eq!(result.trading_day_count, 0);
        assert_eq!(result.smallest_moves, 0);
        assert_eq!(result.avg_non_zero_volume, 0);
        assert!(!result.is_null);
    }

    #[test]
    fn unknown_timezone_is_rejected() {
        let bin = BinDecl::new(
            "x",
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
            "Not/AZone",
            1,
        )
        .unwrap();
        let monday = NaiveDate::from_ymd_opt(2024, 1, 8).unwrap();
        let store = FakeStore { trades: HashMap::new() };
        assert!(compute(&store, SymbolHandle(1), &bin, 0, monday).is_err());
    }
}
