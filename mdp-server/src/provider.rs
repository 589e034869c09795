//! The provider (§4.5): owns the client registry, the request registry, and
//! the wire submit capability; publishes the service directory; accepts or
//! rejects incoming sessions.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU8, AtomicU32, Ordering};
use std::sync::{Arc, OnceLock, Weak};

use log::{debug, warn};
use mdp_types::{RequestToken, ServiceCapabilities, ServiceInfoView, ServiceState};
use parking_lot::RwLock;

use crate::session::{ClientSession, SessionHandle};
use crate::wire::{WireOutbound, WireSink};

/// Maps a live request token to the (possibly already-gone) session that
/// issued it. A request token is inserted here *before* its envelope is
/// enqueued (§3 invariant); a worker must never submit a response whose
/// token is absent at submit time.
pub struct RequestRegistry {
    entries: HashMap<RequestToken, Weak<RwLock<ClientSession>>>,
}

impl RequestRegistry {
    fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub fn contains(&self, token: RequestToken) -> bool {
        self.entries.contains_key(&token)
    }

    pub fn insert(&mut self, token: RequestToken, session: Weak<RwLock<ClientSession>>) {
        self.entries.insert(token, session);
    }

    pub fn remove(&mut self, token: RequestToken) -> Option<Weak<RwLock<ClientSession>>> {
        self.entries.remove(&token)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry whose weak pointer no longer resolves, or resolves
    /// to `handle` (§4.1: `onInactiveClientSession` drops the closed
    /// session's outstanding tokens).
    fn drop_dead_and_for_session(&mut self, handle: SessionHandle) {
        self.entries.retain(|_, weak| match weak.upgrade() {
            Some(session) => session.read().handle != handle,
            None => false,
        });
    }

    fn clear(&mut self) {
        self.entries.clear();
    }
}

/// The set of live client sessions, keyed by handle, plus the
/// provider-wide minimum negotiated wire version (§3 invariant:
/// monotonically non-increasing as new sessions are accepted).
pub struct ClientRegistry {
    sessions: HashMap<SessionHandle, Arc<RwLock<ClientSession>>>,
}

impl ClientRegistry {
    fn new() -> Self {
        Self {
            sessions: HashMap::new(),
        }
    }

    pub fn get(&self, handle: SessionHandle) -> Option<Arc<RwLock<ClientSession>>> {
        self.sessions.get(&handle).cloned()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn insert(&mut self, session: Arc<RwLock<ClientSession>>) {
        let handle = session.read().handle;
        self.sessions.insert(handle, session);
    }

    fn remove(&mut self, handle: SessionHandle) -> Option<Arc<RwLock<ClientSession>>> {
        self.sessions.remove(&handle)
    }

    fn clear(&mut self) {
        self.sessions.clear();
    }
}

/// Accept policy outcome (§4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceptOutcome {
    Accepted(SessionHandle),
    RejectedNotAccepting,
    RejectedAtCapacity,
}

/// Owns the wire session(s), service-directory publication, client-session
/// registry, request registry, and response submission.
pub struct Provider {
    clients: RwLock<ClientRegistry>,
    requests: RwLock<RequestRegistry>,
    min_wire_version: AtomicU8,
    min_wire_minor: AtomicU8,
    service_id: OnceLock<u32>,
    service_name: String,
    capabilities: ServiceCapabilities,
    accepting_connections: std::sync::atomic::AtomicBool,
    accepting_requests: std::sync::atomic::AtomicBool,
    session_capacity: usize,
    next_handle: AtomicU32,
    sink: Arc<dyn WireSink>,
}

impl Provider {
    pub fn new(service_name: impl Into<String>, session_capacity: usize, sink: Arc<dyn WireSink>) -> Self {
        Self {
            clients: RwLock::new(ClientRegistry::new()),
            requests: RwLock::new(RequestRegistry::new()),
            min_wire_version: AtomicU8::new(u8::MAX),
            min_wire_minor: AtomicU8::new(u8::MAX),
            service_id: OnceLock::new(),
            service_name: service_name.into(),
            capabilities: ServiceCapabilities::market_price_only(),
            accepting_connections: std::sync::atomic::AtomicBool::new(true),
            accepting_requests: std::sync::atomic::AtomicBool::new(true),
            session_capacity,
            next_handle: AtomicU32::new(1),
            sink,
        }
    }

    pub fn clients(&self) -> &RwLock<ClientRegistry> {
        &self.clients
    }

    pub fn requests(&self) -> &RwLock<RequestRegistry> {
        &self.requests
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// The service id advertised in the directory is learned at most once,
    /// from the first item request naming the service by string (§3).
    pub fn learn_service_id(&self, id: u32) {
        let _ = self.service_id.set(id);
    }

    pub fn service_id(&self) -> Option<u32> {
        self.service_id.get().copied()
    }

    pub fn set_accepting_connections(&self, accepting: bool) {
        self.accepting_connections.store(accepting, Ordering::Relaxed);
    }

    pub fn set_accepting_requests(&self, accepting: bool) {
        self.accepting_requests.store(accepting, Ordering::Relaxed);
    }

    pub fn directory_view(&self) -> ServiceInfoView {
        ServiceInfoView {
            name: self.service_name.clone(),
            service_id: self.service_id().unwrap_or(0),
            capabilities: self.capabilities,
            state: ServiceState {
                up: true,
                accepting_requests: self.accepting_requests.load(Ordering::Relaxed),
            },
        }
    }

    /// Accept or reject a new connection (§4.5 accept policy): reject when
    /// `!acceptingConnections` or the registry is already at capacity.
    pub fn accept(&self, address: impl Into<String>, wire_major: u8, wire_minor: u8) -> AcceptOutcome {
        if !self.accepting_connections.load(Ordering::Relaxed) {
            return AcceptOutcome::RejectedNotAccepting;
        }
        let mut clients = self.clients.write();
        if clients.len() >= self.session_capacity {
            return AcceptOutcome::RejectedAtCapacity;
        }
        let handle = SessionHandle(self.next_handle.fetch_add(1, Ordering::Relaxed) as u64);
        let session = Arc::new(RwLock::new(ClientSession::new(handle, address, wire_major, wire_minor)));
        clients.insert(session);
        self.update_min_wire_version(wire_major, wire_minor);
        debug!("accepted session {:?} ({} total)", handle, clients.len());
        AcceptOutcome::Accepted(handle)
    }

    fn update_min_wire_version(&self, major: u8, minor: u8) {
        // Only the accepting path (the event-dispatch task) ever writes
        // these, so a plain read/compare/store is race-free in practice.
        let packed_new = (major as u16) << 8 | minor as u16;
        let cur_major = self.min_wire_version.load(Ordering::Relaxed);
        let cur_minor = self.min_wire_minor.load(Ordering::Relaxed);
        let packed_cur = (cur_major as u16) << 8 | cur_minor as u16;
        if packed_new < packed_cur {
            self.min_wire_version.store(major, Ordering::Relaxed);
            self.min_wire_minor.store(minor, Ordering::Relaxed);
        }
    }

    pub fn min_wire_version(&self) -> (u8, u8) {
        (
            self.min_wire_version.load(Ordering::Relaxed),
            self.min_wire_minor.load(Ordering::Relaxed),
        )
    }

    /// Remove `handle` from the client registry and drop any request
    /// tokens still outstanding for it (§4.1 `onInactiveClientSession`).
    pub fn remove_session(&self, handle: SessionHandle) {
        self.clients.write().remove(handle);
        self.requests.write().drop_dead_and_for_session(handle);
    }

    /// Wrap `message` and forward to the wire layer. Every outbound
    /// response goes through this.
    pub fn submit(&self, session: SessionHandle, message: WireOutbound) {
        self.sink.send(session.0, message);
    }

    /// `submit`, plus erase the token from the registry and drop the weak
    /// session pointer if it no longer resolves (§4.5). Missing weak
    /// pointer is a no-op: the client is already gone.
    pub fn send_reply(&self, token: RequestToken, message: WireOutbound) {
        let session = self.requests.write().remove(token);
        let Some(session) = session.and_then(|weak| weak.upgrade()) else {
            debug!("send_reply: token {:?} has no live session, dropping", token);
            return;
        };
        let handle = session.read().handle;
        self.submit(handle, message);
    }

    /// Release everything held by the provider. Called once during
    /// orchestrator teardown (§4.7); afterward both registries are empty.
    pub fn clear(&self) {
        self.clients.write().clear();
        self.requests.write().clear();
    }
}
