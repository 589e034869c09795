/// Static service capability set, as advertised in `ServiceDirectory`. This
/// provider only ever advertises `MARKET_PRICE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ServiceCapabilities {
    pub market_price: bool,
}

impl ServiceCapabilities {
    pub fn market_price_only() -> Self {
        Self { market_price: true }
    }

    /// Capability name strings, in the shape the directory response's
    /// `SERVICE_INFO` filter entry carries them.
    pub fn names(&self) -> Vec<&'static str> {
        let mut v = Vec::new();
        if self.market_price {
            v.push("MARKET_PRICE");
        }
        v
    }
}

/// `SERVICE_STATE` filter entry: `state=1` means up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceState {
    pub up: bool,
    pub accepting_requests: bool,
}

impl ServiceState {
    pub fn state_code(&self) -> u32 {
        if self.up {
            1
        } else {
            0
        }
    }
}

/// A fully-resolved view of one service entry, ready for directory-response
/// encoding. `dictionaries_used` is fixed to `{RWFFld, RWFEnum}`.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceInfoView {
    pub name: String,
    pub service_id: u32,
    pub capabilities: ServiceCapabilities,
    pub state: ServiceState,
}

impl ServiceInfoView {
    pub fn dictionaries_used(&self) -> &'static [&'static str] {
        &["RWFFld", "RWFEnum"]
    }
}
