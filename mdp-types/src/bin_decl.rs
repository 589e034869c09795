use chrono::NaiveTime;

use crate::Error;

/// Describes one analytic window: a time-of-day range, repeated across a
/// sequence of business days, in a given time zone.
///
/// Immutable once constructed. `end_time` must be strictly after
/// `start_time`. Named bin declarations read from server configuration must
/// additionally have `day_count >= 1` (enforced by the config loader, not by
/// this constructor) — but a per-request override via the `days` query key
/// may legitimately drive the effective day count to zero, at which point
/// the engine reports a null result instead of querying the tick store. So
/// `BinDecl` itself only enforces the window ordering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinDecl {
    name: String,
    start_time: NaiveTime,
    end_time: NaiveTime,
    /// IANA time zone name, e.g. `"America/New_York"`.
    timezone: String,
    day_count: u32,
}

impl BinDecl {
    /// Construct a new bin declaration, checking that `end_time` strictly
    /// follows `start_time`.
    pub fn new(
        name: impl Into<String>,
        start_time: NaiveTime,
        end_time: NaiveTime,
        timezone: impl Into<String>,
        day_count: u32,
    ) -> Result<Self, Error> {
        if end_time <= start_time {
            return Err(Error::InvalidBinDecl(
                "end_time must be after start_time".into(),
            ));
        }
        Ok(Self {
            name: name.into(),
            start_time,
            end_time,
            timezone: timezone.into(),
            day_count,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn start_time(&self) -> NaiveTime {
        self.start_time
    }

    pub fn end_time(&self) -> NaiveTime {
        self.end_time
    }

    pub fn timezone(&self) -> &str {
        &self.timezone
    }

    pub fn day_count(&self) -> u32 {
        self.day_count
    }

    /// Return a copy of this declaration with `start_time` replaced.
    pub fn with_start_time(&self, start_time: NaiveTime) -> Result<Self, Error> {
        Self::new(
            self.name.clone(),
            start_time,
            self.end_time,
            self.timezone.clone(),
            self.day_count,
        )
    }

    /// Return a copy of this declaration with `end_time` replaced.
    pub fn with_end_time(&self, end_time: NaiveTime) -> Result<Self, Error> {
        Self::new(
            self.name.clone(),
            self.start_time,
            end_time,
            self.timezone.clone(),
            self.day_count,
        )
    }

    /// Return a copy of this declaration with `timezone` replaced.
    pub fn with_timezone(&self, timezone: impl Into<String>) -> Self {
        Self {
            timezone: timezone.into(),
            ..self.clone()
        }
    }

    /// Return a copy of this declaration with `day_count` replaced, capped
    /// at `max_day_count`. Zero is a valid result.
    pub fn with_day_count(&self, day_count: u32, max_day_count: u32) -> Self {
        Self {
            day_count: day_count.min(max_day_count),
            ..self.clone()
        }
    }
}
