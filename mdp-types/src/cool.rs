use chrono::{DateTime, Utc};

/// Per-registered-login availability bookkeeping record (Client-Outage-
/// Online-Log). Behavior (`OnRecovery`/`OnOutage`, derived metrics) lives in
/// `mdp_core::cool`; this is just the data shape.
#[derive(Debug, Clone, PartialEq)]
pub struct CoolRecord {
    pub online: bool,
    pub failures: u64,
    pub accumulated_outage: chrono::Duration,
    pub recording_start: DateTime<Utc>,
    pub last_transition: DateTime<Utc>,
}

impl CoolRecord {
    /// A freshly pre-registered record, starting offline, with the
    /// recording clock beginning now.
    pub fn new_offline(now: DateTime<Utc>) -> Self {
        Self {
            online: false,
            failures: 0,
            accumulated_outage: chrono::Duration::zero(),
            recording_start: now,
            last_transition: now,
        }
    }
}

/// One transition recorded in a `CoolRecord`'s bounded event ring buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoolEvent {
    pub index: u64,
    pub name: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub was_online: bool,
}
