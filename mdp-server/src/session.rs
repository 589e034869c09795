//! Per-connection client session state (§4.1): `CONNECTED → LOGGED_IN ↔
//! CLOSING → CLOSED`. The dispatch operations that drive these transitions
//! live in [`crate::handlers`]; this module is just the state shape, kept
//! deliberately free of locking policy so callers choose how to share it
//! (the provider wraps it in `Arc<parking_lot::RwLock<ClientSession>>`).

use mdp_types::RequestToken;

/// Opaque per-connection identifier, assigned by the provider on accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionHandle(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connected,
    LoggedIn,
    Closing,
    Closed,
}

/// Read-only diagnostics counters, grounded in `client_t`'s
/// `cumulative_stats_` array in the original implementation. Not a
/// streaming/metrics feature — just per-session bookkeeping exposed for
/// introspection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClientStats {
    pub events_received: u64,
    pub events_discarded: u64,
    pub login_rejects: u64,
    pub item_rejects: u64,
    pub malformed_requests: u64,
    pub duplicate_snapshots: u64,
}

#[derive(Debug, Clone)]
pub struct ClientSession {
    pub handle: SessionHandle,
    pub address: String,
    pub state: SessionState,
    pub login_token: Option<RequestToken>,
    pub wire_major: u8,
    pub wire_minor: u8,
    pub user_name: Option<String>,
    pub stats: ClientStats,
    /// The `ServiceId` this session learned from its first matching item
    /// request naming the configured service by string (§3 invariant: the
    /// service id is learned at most once per provider, not per session —
    /// session-level tracking here just remembers whether *this* session
    /// has already triggered that learning, so it won't try twice).
    pub has_learned_service_id: bool,
}

impl ClientSession {
    pub fn new(handle: SessionHandle, address: impl Into<String>, wire_major: u8, wire_minor: u8) -> Self {
        Self {
            handle,
            address: address.into(),
            state: SessionState::Connected,
            login_token: None,
            wire_major,
            wire_minor,
            user_name: None,
            stats: ClientStats::default(),
            has_learned_service_id: false,
        }
    }

    pub fn is_logged_in(&self) -> bool {
        matches!(self.state, SessionState::LoggedIn)
    }

    pub fn wire_version_packed(&self) -> u16 {
        (self.wire_major as u16) << 8 | self.wire_minor as u16
    }

    pub fn mark_logged_in(&mut self, login_token: RequestToken, user_name: Option<String>) {
        self.state = SessionState::LoggedIn;
        self.login_token = Some(login_token);
        self.user_name = user_name;
    }

    pub fn mark_closing(&mut self) {
        if self.state != SessionState::Closed {
            self.state = SessionState::Closing;
        }
    }

    pub fn mark_closed(&mut self) {
        self.state = SessionState::Closed;
    }
}
