use crate::BinResult;

/// One encoded field in the response field list. `fid` is the configured,
/// numeric RDM-style field identifier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldEntry {
    pub fid: i32,
    pub value: FieldValue,
}

/// A typed field value. Percentages use `Fixed` with `exponent = -6` — the
/// wire encoding transmits a mantissa in units of 10⁻⁶; volumes/counts/dates
/// use `Int64` with an implicit exponent of `10⁰`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue {
    Int64(i64),
    Fixed { mantissa: i64, exponent: i8 },
}

/// Configured field identifiers for one bin's realtime field set, or for
/// the archive field set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FidTable {
    pub timact: i32,
    pub activ_date: i32,
    pub vma: i32,
    pub nzero_vma: i32,
    pub num_moves: i32,
    pub nm_high: i32,
    pub nm_low: i32,
    pub nm_small: i32,
    pub pctchg_10d: i32,
    pub pctchg_15d: i32,
    pub pctchg_20d: i32,
    pub pctchg_10t: i32,
    pub pctchg_15t: i32,
    pub pctchg_20t: i32,
}

impl FidTable {
    /// Encode a `BinResult` into a typed field list using this FID mapping.
    ///
    /// `TIMACT`/`ACTIV_DATE` are derived from `close_time` in UTC:
    /// `ACTIV_DATE` is the count of days since the Unix epoch, `TIMACT` is
    /// the count of seconds since UTC midnight of that day.
    pub fn encode(&self, result: &BinResult) -> Vec<FieldEntry> {
        use chrono::Timelike;

        let epoch = chrono::NaiveDate::from_ymd_opt(1970, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            .and_utc();
        let activ_date = result
            .close_time
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            .and_utc()
            .signed_duration_since(epoch);
        let timact = result.close_time.time().num_seconds_from_midnight() as i64;

        vec![
            FieldEntry {
                fid: self.timact,
                value: FieldValue::Int64(timact),
            },
            FieldEntry {
                fid: self.activ_date,
                value: FieldValue::Int64(activ_date.num_days()),
            },
            FieldEntry {
                fid: self.vma,
                value: FieldValue::Int64(result.avg_volume as i64),
            },
            FieldEntry {
                fid: self.nzero_vma,
                value: FieldValue::Int64(result.avg_non_zero_volume as i64),
            },
            FieldEntry {
                fid: self.num_moves,
                value: FieldValue::Int64(result.total_moves as i64),
            },
            FieldEntry {
                fid: self.nm_high,
                value: FieldValue::Int64(result.max_moves as i64),
            },
            FieldEntry {
                fid: self.nm_low,
                value: FieldValue::Int64(result.min_moves as i64),
            },
            FieldEntry {
                fid: self.nm_small,
                value: FieldValue::Int64(result.smallest_moves as i64),
            },
            pct_field(self.pctchg_10d, result.pct_change_10_day),
            pct_field(self.pctchg_15d, result.pct_change_15_day),
            pct_field(self.pctchg_20d, result.pct_change_20_day),
            pct_field(self.pctchg_10t, result.pct_change_10_trading_day),
            pct_field(self.pctchg_15t, result.pct_change_15_trading_day),
            pct_field(self.pctchg_20t, result.pct_change_20_trading_day),
        ]
    }
}

fn pct_field(fid: i32, value: f64) -> FieldEntry {
    // round-half-up, units of 10^-6. The value arriving here has already
    // been rounded by `mdp_core::rounding::round_half_up`; this just
    // converts to the wire's fixed-point mantissa representation.
    let mantissa = (value * 1_000_000.0).round() as i64;
    FieldEntry {
        fid,
        value: FieldValue::Fixed {
            mantissa,
            exponent: -6,
        },
    }
}
