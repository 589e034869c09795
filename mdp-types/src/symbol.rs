/// Opaque tick-store handle for a resolved symbol, returned by
/// `TickStoreAdapter::symbol_handle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolHandle(pub u64);

/// A single recorded trade, as delivered by `TickStoreAdapter::for_each_trade`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trade {
    pub last_price: f64,
    pub tick_volume: u64,
}
