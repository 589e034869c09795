use chrono::NaiveDate;
use mdp_types::{SymbolHandle, Trade};

/// The historical tick store and local-calendar predicate, consumed as a
/// trait since the concrete store is a proprietary SDK external to this
/// system. A provider wires a concrete implementation at startup; tests use
/// an in-memory one.
pub trait TickStoreAdapter: Send + Sync {
    /// Whether `date` is a trading day under this adapter's local calendar.
    fn is_business_day(&self, date: NaiveDate) -> bool;

    /// Whether `symbol` names an instrument known to the store.
    fn symbol_exists(&self, symbol: &str) -> bool;

    /// Resolve `symbol` to an opaque handle, if known.
    fn symbol_handle(&self, symbol: &str) -> Option<SymbolHandle>;

    /// Invoke `callback` once per trade of `symbol` with a timestamp in
    /// `[from_unix_sec, to_unix_sec)`, in chronological order. No-op if the
    /// symbol has no trades in the window.
    fn for_each_trade(
        &self,
        symbol: SymbolHandle,
        from_unix_sec: i64,
        to_unix_sec: i64,
        callback: &mut dyn FnMut(Trade),
    );
}
