//! An in-memory tick-store adapter for manual exercise and tests: a fixed
//! symbol table plus a per-symbol trade tape, with a plain Mon-Fri
//! business-day predicate (no holiday calendar).

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate, Weekday};
use mdp_core::TickStoreAdapter;
use mdp_types::{SymbolHandle, Trade};
use parking_lot::RwLock;

/// One recorded trade, timestamped in unix seconds (UTC).
#[derive(Debug, Clone, Copy)]
pub struct TimedTrade {
    pub unix_sec: i64,
    pub trade: Trade,
}

#[derive(Default)]
struct Inner {
    symbols: HashMap<String, SymbolHandle>,
    tape: HashMap<u64, Vec<TimedTrade>>,
}

/// Holds its symbol table and trade tape behind one lock; cheap enough for a
/// demo where trades are seeded once at startup and never mutated under
/// concurrent load.
pub struct InMemoryTickStore {
    inner: RwLock<Inner>,
    next_handle: std::sync::atomic::AtomicU64,
}

impl InMemoryTickStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            next_handle: std::sync::atomic::AtomicU64::new(1),
        }
    }

    /// Register a symbol if it isn't already known, returning its handle.
    pub fn ensure_symbol(&self, symbol: &str) -> SymbolHandle {
        if let Some(handle) = self.inner.read().symbols.get(symbol).copied() {
            return handle;
        }
        let mut inner = self.inner.write();
        *inner.symbols.entry(symbol.to_string()).or_insert_with(|| {
            SymbolHandle(self.next_handle.fetch_add(1, std::sync::atomic::Ordering::Relaxed))
        })
    }

    /// Append a trade to `symbol`'s tape, registering the symbol first if
    /// needed.
    pub fn record_trade(&self, symbol: &str, unix_sec: i64, trade: Trade) {
        let handle = self.ensure_symbol(symbol);
        self.inner
            .write()
            .tape
            .entry(handle.0)
            .or_default()
            .push(TimedTrade { unix_sec, trade });
    }
}

impl Default for InMemoryTickStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TickStoreAdapter for InMemoryTickStore {
    fn is_business_day(&self, date: NaiveDate) -> bool {
        !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
    }

    fn symbol_exists(&self, symbol: &str) -> bool {
        self.inner.read().symbols.contains_key(symbol)
    }

    fn symbol_handle(&self, symbol: &str) -> Option<SymbolHandle> {
        self.inner.read().symbols.get(symbol).copied()
    }

    fn for_each_trade(
        &self,
        symbol: SymbolHandle,
        from_unix_sec: i64,
        to_unix_sec: i64,
        callback: &mut dyn FnMut(Trade),
    ) {
        let inner = self.inner.read();
        let Some(tape) = inner.tape.get(&symbol.0) else {
            return;
        };
        for entry in tape {
            if entry.unix_sec >= from_unix_sec && entry.unix_sec < to_unix_sec {
                callback(entry.trade);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unregistered_symbol_does_not_exist() {
        let store = InMemoryTickStore::new();
        assert!(!store.symbol_exists("IBM.N"));
        assert!(store.symbol_handle("IBM.N").is_none());
    }

    #[test]
    fn recording_a_trade_registers_the_symbol() {
        let store = InMemoryTickStore::new();
        store.record_trade(
            "IBM.N",
            1_700_000_000,
            Trade {
                last_price: 100.0,
                tick_volume: 5,
            },
        );
        assert!(store.symbol_exists("IBM.N"));
        let handle = store.symbol_handle("IBM.N").unwrap();

        let mut seen = Vec::new();
        store.for_each_trade(handle, 0, i64::MAX, &mut |t| seen.push(t));
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].last_price, 100.0);
    }

    #[test]
    fn weekends_are_not_business_days() {
        let store = InMemoryTickStore::new();
        let saturday = NaiveDate::from_ymd_opt(2024, 1, 6).unwrap();
        let monday = NaiveDate::from_ymd_opt(2024, 1, 8).unwrap();
        assert!(!store.is_business_day(saturday));
        assert!(store.is_business_day(monday));
    }
}
