//! Business-day calendar arithmetic, driven entirely by a
//! [`TickStoreAdapter::is_business_day`] predicate — this crate has no
//! calendar logic of its own, only the walk.

use chrono::{Duration, NaiveDate};

use crate::tick_store::TickStoreAdapter;

/// The nearest business day on or before `date`, walking backward one day at
/// a time until the adapter's predicate accepts. Used to derive `D0`: "today
/// in `tz`, walked backward to the nearest business day."
pub fn nearest_business_day_on_or_before(
    adapter: &dyn TickStoreAdapter,
    date: NaiveDate,
) -> NaiveDate {
    let mut d = date;
    while !adapter.is_business_day(d) {
        d -= Duration::days(1);
    }
    d
}

/// `date` shifted by `count` business days, in the direction of `count`'s
/// sign. `count == 0` returns `date` unchanged (even if `date` itself is not
/// a business day — callers that need a business day first should call
/// [`nearest_business_day_on_or_before`]).
pub fn business_day_offset(adapter: &dyn TickStoreAdapter, date: NaiveDate, count: i64) -> NaiveDate {
    let mut d = date;
    let step = if count >= 0 { Duration::days(1) } else { -Duration::days(1) };
    let mut remaining = count.unsigned_abs();
    while remaining > 0 {
        d += step;
        while !adapter.is_business_day(d) {
            d += step;
        }
        remaining -= 1;
    }
    d
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    struct WeekdaysOnly;

    impl TickStoreAdapter for WeekdaysOnly {
        fn is_business_day(&self, date: NaiveDate) -> bool {
            use chrono::Datelike;
            !matches!(date.weekday(), chrono::Weekday::Sat | chrono::Weekday::Sun)
        }
        fn symbol_exists(&self, _symbol: &str) -> bool {
            true
        }
        fn symbol_handle(&self, _symbol: &str) -> Option<mdp_types::SymbolHandle> {
            None
        }
        fn for_each_trade(
            &self,
            _symbol: mdp_types::SymbolHandle,
            _from_unix_sec: i64,
            _to_unix_sec: i64,
            _callback: &mut dyn FnMut(mdp_types::Trade),
        ) {
        }
    }

    struct ExceptHoliday(HashSet<NaiveDate>);

    impl TickStoreAdapter for ExceptHoliday {
        fn is_business_day(&self, date: NaiveDate) -> bool {
            use chrono::Datelike;
            !matches!(date.weekday(), chrono::Weekday::Sat | chrono::Weekday::Sun)
                && !self.0.contains(&date)
        }
        fn symbol_exists(&self, _symbol: &str) -> bool {
            true
        }
        fn symbol_handle(&self, _symbol: &str) -> Option<mdp_types::SymbolHandle> {
            None
        }
        fn for_each_trade(
            &self,
            _symbol: mdp_types::SymbolHandle,
            _from_unix_sec: i64,
            _to_unix_sec: i64,
            _callback: &mut dyn FnMut(mdp_types::Trade),
        ) {
        }
    }

    #[test]
    fn saturday_walks_back_to_friday() {
        let saturday = NaiveDate::from_ymd_opt(2024, 1, 6).unwrap();
        let friday = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        assert_eq!(nearest_business_day_on_or_before(&WeekdaysOnly, saturday), friday);
    }

    #[test]
    fn offset_skips_weekends() {
        let friday = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        let monday = NaiveDate::from_ymd_opt(2024, 1, 8).unwrap();
        assert_eq!(business_day_offset(&WeekdaysOnly, friday, 1), monday);
        assert_eq!(business_day_offset(&WeekdaysOnly, monday, -1), friday);
    }

    #[test]
    fn offset_skips_holidays_too() {
        let thursday = NaiveDate::from_ymd_opt(2024, 1, 4).unwrap();
        let monday_holiday = NaiveDate::from_ymd_opt(2024, 1, 8).unwrap();
        let adapter = ExceptHoliday(HashSet::from([monday_holiday]));
        let tuesday = NaiveDate::from_ymd_opt(2024, 1, 9).unwrap();
        assert_eq!(business_day_offset(&adapter, thursday, 1), tuesday);
    }
}
