//! The instrument-identifier grammar a client drives through the item name
//! it subscribes to: `path ["?" query]`, where `path`'s tail names the
//! underlying symbol and `query` carries zero or more bin overrides.

use std::str::FromStr;

use chrono::NaiveTime;
use mdp_types::BinDecl;

/// The non-symbol part of a parsed item name, before it is folded into a
/// concrete [`BinDecl`].
#[derive(Debug, Clone, Copy, Default)]
struct Overrides {
    start_time: Option<NaiveTime>,
    end_time: Option<NaiveTime>,
    day_offset: Option<u32>,
    day_count: Option<u32>,
}

/// Result of parsing one item name against a configured default bin.
#[derive(Debug, Clone)]
pub struct ParsedItemName {
    pub symbol: String,
    pub bin_decl: BinDecl,
    /// Business-day offset applied to today before walking back `dayCount`
    /// further days, capped at 90.
    pub day_offset: u32,
}

/// Parse `item_name` against `default_bin`, applying any recognised query
/// overrides. Unknown keys are ignored; malformed values are ignored and the
/// corresponding field retains `default_bin`'s value. `offset`/`days` are
/// capped at `max_offset_and_days` (90 per the external grammar).
pub fn parse(
    item_name: &str,
    default_bin: &BinDecl,
    timezone_override: Option<String>,
    max_offset_and_days: u32,
) -> ParsedItemName {
    let (path, query) = match item_name.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (item_name, None),
    };
    let symbol = path.trim_start_matches('/').to_string();

    let mut overrides = Overrides::default();
    let mut timezone = timezone_override;

    if let Some(query) = query {
        for pair in query.split('&') {
            let Some((key, value)) = pair.split_once('=') else {
                continue;
            };
            match key {
                "open" => {
                    if let Some(t) = parse_time(value) {
                        overrides.start_time = Some(t);
                    }
                }
                "close" => {
                    if let Some(t) = parse_time(value) {
                        overrides.end_time = Some(t);
                    }
                }
                "tz" => {
                    if chrono_tz::Tz::from_str(value).is_ok() {
                        timezone = Some(value.to_string());
                    }
                }
                "offset" => {
                    if let Ok(v) = value.parse::<u32>() {
                        overrides.day_offset = Some(v.min(max_offset_and_days));
                    }
                }
                "days" => {
                    if let Ok(v) = value.parse::<u32>() {
                        overrides.day_count = Some(v.min(max_offset_and_days));
                    }
                }
                _ => {}
            }
        }
    }

    let mut bin_decl = default_bin.clone();
    if let Some(tz) = timezone {
        bin_decl = bin_decl.with_timezone(tz);
    }
    if let Some(start_time) = overrides.start_time {
        if let Ok(updated) = bin_decl.with_start_time(start_time) {
            bin_decl = updated;
        }
    }
    if let Some(end_time) = overrides.end_time {
        if let Ok(updated) = bin_decl.with_end_time(end_time) {
            bin_decl = updated;
        }
    }
    if let Some(day_count) = overrides.day_count {
        bin_decl = bin_decl.with_day_count(day_count, max_offset_and_days);
    }

    ParsedItemName {
        symbol,
        bin_decl,
        day_offset: overrides.day_offset.unwrap_or(0),
    }
}

fn parse_time(value: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M:%S").or_else(|_| NaiveTime::parse_from_str(value, "%H:%M")).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn default_bin() -> BinDecl {
        BinDecl::new(
            "default",
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
            "America/New_York",
            1,
        )
        .unwrap()
    }

    #[test]
    fn strips_leading_slashes_and_applies_overrides() {
        let parsed = parse("/IBM.N?open=09:00&close=09:30&days=1&offset=0", &default_bin(), None, 90);
        assert_eq!(parsed.symbol, "IBM.N");
        assert_eq!(parsed.bin_decl.day_count(), 1);
        assert_eq!(parsed.day_offset, 0);
    }

    #[test]
    fn caps_offset_and_days_at_ninety() {
        let parsed = parse("IBM.N?offset=500&days=500", &default_bin(), None, 90);
        assert_eq!(parsed.bin_decl.day_count(), 90);
        assert_eq!(parsed.day_offset, 90);
    }

    #[test]
    fn ignores_unknown_keys_and_malformed_values() {
        let parsed = parse("IBM.N?bogus=1&open=garbage", &default_bin(), None, 90);
        assert_eq!(parsed.bin_decl.start_time(), default_bin().start_time());
    }

    #[test]
    fn rejects_unknown_timezone_region() {
        let parsed = parse("IBM.N?tz=Not/A_Zone", &default_bin(), None, 90);
        assert_eq!(parsed.bin_decl.timezone(), default_bin().timezone());
    }
}
