//! Client session, provider, request transport, worker pool, and
//! orchestrator lifecycle for the interactive market-data bin-analytics
//! provider.
//!
//! This crate is the concurrent request/response engine: it depends on
//! `mdp-core` for the bin analytic engine and COOL bookkeeping, and on
//! `mdp-types` for the wire-adjacent data model. It does not speak any
//! concrete wire protocol itself — the wire codec and session transport are
//! external collaborators, consumed only through [`wire::WireSink`].

pub mod config;
pub mod errors;
pub mod handlers;
pub mod orchestrator;
pub mod provider;
pub mod session;
pub mod transport;
pub mod wire;
pub mod worker;

pub use config::ServerConfig;
pub use orchestrator::{Orchestrator, OrchestratorHandle};
pub use provider::{AcceptOutcome, ClientRegistry, Provider, RequestRegistry};
pub use session::{ClientSession, ClientStats, SessionHandle, SessionState};
pub use transport::{RequestReceiver, RequestTransport};
pub use wire::{DirectoryView, WireOutbound, WireSink};
