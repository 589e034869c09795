//! Client-Outage-Online-Log bookkeeping (§4.6).
//!
//! Tracks, per pre-registered login name, whether the binding client session
//! is currently online, a bounded history of past transitions, and the
//! derived availability/MTTR/MTBF metrics of §3. This module holds no lock
//! of its own — `mdp-server` wraps a [`CoolRegistry`] in a
//! `parking_lot::RwLock` per the discipline in spec.md §5.

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Duration, Utc};
use mdp_types::{CoolEvent, CoolRecord};

struct Entry {
    record: CoolRecord,
    events: VecDeque<CoolEvent>,
    next_index: u64,
}

impl Entry {
    fn push_event(
        &mut self,
        history_table_size: usize,
        name: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        was_online: bool,
    ) {
        if history_table_size == 0 {
            return;
        }
        if self.events.len() >= history_table_size {
            self.events.pop_front();
        }
        self.events.push_back(CoolEvent {
            index: self.next_index,
            name: name.to_string(),
            start,
            end,
            was_online,
        });
        self.next_index += 1;
    }
}

/// Availability bookkeeping for every pre-registered login name.
///
/// `historyTableSize` bounds each name's event ring buffer; once full, the
/// oldest event is evicted to make room for the newest (§4.6).
pub struct CoolRegistry {
    history_table_size: usize,
    entries: HashMap<String, Entry>,
}

impl CoolRegistry {
    pub fn new(history_table_size: usize) -> Self {
        Self {
            history_table_size,
            entries: HashMap::new(),
        }
    }

    /// Pre-register `name`, starting offline with the recording clock
    /// beginning at `now`. A no-op if `name` is already registered.
    pub fn register(&mut self, name: impl Into<String>, now: DateTime<Utc>) {
        let name = name.into();
        self.entries.entry(name).or_insert_with(|| Entry {
            record: CoolRecord::new_offline(now),
            events: VecDeque::new(),
            next_index: 0,
        });
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn is_online(&self, name: &str) -> Option<bool> {
        self.entries.get(name).map(|e| e.record.online)
    }

    /// A previously-offline binding has come back online. No-op if `name`
    /// is unregistered or already online (duplicate-login path is handled
    /// by the session layer, which must check [`Self::is_online`] first and
    /// warn rather than calling this twice).
    pub fn on_recovery(&mut self, name: &str, now: DateTime<Utc>) {
        let Some(entry) = self.entries.get_mut(name) else {
            return;
        };
        if entry.record.online {
            return;
        }
        let last_transition = entry.record.last_transition;
        entry.push_event(self.history_table_size, name, last_transition, now, false);
        entry.record.accumulated_outage = entry.record.accumulated_outage + (now - last_transition);
        entry.record.online = true;
        entry.record.failures += 1;
        entry.record.last_transition = now;
    }

    /// An online binding has gone offline (session closed or went
    /// inactive). No-op if `name` is unregistered or already offline.
    pub fn on_outage(&mut self, name: &str, now: DateTime<Utc>) {
        let Some(entry) = self.entries.get_mut(name) else {
            return;
        };
        if !entry.record.online {
            return;
        }
        let last_transition = entry.record.last_transition;
        entry.push_event(self.history_table_size, name, last_transition, now, true);
        entry.record.online = false;
        entry.record.last_transition = now;
    }

    /// Accumulated outage time through `now`, folding in any outage
    /// currently in progress. This is what spec.md §8 scenario 6 calls
    /// "recording from t=0 through current outage" — `CoolRecord`'s stored
    /// field only updates at the close of an outage, but reads should
    /// reflect one still ongoing.
    fn effective_accumulated_outage(record: &CoolRecord, now: DateTime<Utc>) -> Duration {
        if record.online {
            record.accumulated_outage
        } else {
            record.accumulated_outage + (now - record.last_transition)
        }
    }

    /// `1 − AOT/(now − recordingStart)`. `None` if `name` is unregistered
    /// or no time has elapsed since registration.
    pub fn availability(&self, name: &str, now: DateTime<Utc>) -> Option<f64> {
        let record = &self.entries.get(name)?.record;
        let elapsed = (now - record.recording_start).num_milliseconds() as f64;
        if elapsed <= 0.0 {
            return None;
        }
        let aot = Self::effective_accumulated_outage(record, now).num_milliseconds() as f64;
        Some(1.0 - aot / elapsed)
    }

    /// `AOT/failures`. `None` if `name` is unregistered or has never failed.
    pub fn mttr(&self, name: &str, now: DateTime<Utc>) -> Option<Duration> {
        let record = &self.entries.get(name)?.record;
        if record.failures == 0 {
            return None;
        }
        let aot = Self::effective_accumulated_outage(record, now);
        Some(aot / record.failures as i32)
    }

    /// `(now − recordingStart)/failures`. `None` if `name` is unregistered
    /// or has never failed.
    pub fn mtbf(&self, name: &str, now: DateTime<Utc>) -> Option<Duration> {
        let record = &self.entries.get(name)?.record;
        if record.failures == 0 {
            return None;
        }
        Some((now - record.recording_start) / record.failures as i32)
    }

    pub fn record(&self, name: &str) -> Option<&CoolRecord> {
        self.entries.get(name).map(|e| &e.record)
    }

    pub fn events(&self, name: &str) -> impl Iterator<Item = &CoolEvent> {
        self.entries.get(name).into_iter().flat_map(|e| e.events.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    // spec.md §8 scenario 6.
    #[test]
    fn cool_sequence_matches_scenario_six() {
        let mut reg = CoolRegistry::new(16);
        reg.register("alice", at(0));
        reg.on_outage("alice", at(0)); // already offline, no-op
        reg.on_recovery("alice", at(60));
        reg.on_outage("alice", at(180));

        let now = at(240);
        let record = reg.record("alice").unwrap();
        assert_eq!(record.failures, 1);

        let aot = CoolRegistry::effective_accumulated_outage(record, now);
        assert_eq!(aot, Duration::seconds(120));
        assert_eq!(reg.availability("alice", now), Some(0.5));
    }

    #[test]
    fn duplicate_recovery_is_a_no_op() {
        let mut reg = CoolRegistry::new(16);
        reg.register("alice", at(0));
        reg.on_recovery("alice", at(10));
        reg.on_recovery("alice", at(20));
        assert_eq!(reg.record("alice").unwrap().failures, 1);
    }

    #[test]
    fn ring_buffer_evicts_oldest_when_full() {
        let mut reg = CoolRegistry::new(1);
        reg.register("alice", at(0));
        reg.on_recovery("alice", at(10));
        reg.on_outage("alice", at(20));
        reg.on_recovery("alice", at(30));
        let events: Vec<_> = reg.events("alice").collect();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].start, at(20));
    }

    #[test]
    fn unregistered_name_yields_none() {
        let reg = CoolRegistry::new(16);
        assert_eq!(reg.availability("nobody", at(100)), None);
        assert_eq!(reg.is_online("nobody"), None);
    }
}
