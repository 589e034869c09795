use thiserror::Error;

/// The provider's error taxonomy (§7): kinds, not ad hoc strings. Each
/// variant is converted to the appropriate wire disposition at the call
/// site that produced it, matching the teacher's pattern of converting
/// `opcua_types::StatusCode` at each service boundary rather than
/// propagating a single generic error type to the edge.
#[derive(Debug, Error)]
pub enum RequestError {
    /// Codec or RDM validation failed — reject the message in kind (login
    /// reject, directory discard, item close).
    #[error("protocol violation: {0}")]
    ProtocolViolation(String),

    /// Unsupported interaction (streaming item request), or an item
    /// request arriving before login completes.
    #[error("not authorized: {0}")]
    NotAuthorized(String),

    /// Unknown symbol, unknown model type, or a malformed item name.
    #[error("not found: {0}")]
    NotFound(String),

    /// The request token was already present in the registry.
    #[error("duplicate request token")]
    DuplicateRequest,

    /// Session count or rate exceeded.
    #[error("capacity exceeded: {0}")]
    Capacity(String),

    /// A submit to the wire framework failed. Counted, never retried at
    /// the application level.
    #[error("transient wire error: {0}")]
    TransientWire(String),

    /// Parse, engine, or encode failure inside a worker. Logged and
    /// counted; the request goes unanswered (§9 known limitation).
    #[error("dispatch error: {0}")]
    Dispatch(#[from] DispatchError),
}

/// The narrower set of failures a worker can hit while serving one
/// envelope, kept distinct from [`RequestError`] so the worker loop can log
/// with detail before folding it into the coarser taxonomy.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("failed to decode request envelope: {0}")]
    EnvelopeDecode(#[from] mdp_types::Error),

    #[error("bin engine failed: {0}")]
    Engine(#[from] mdp_core::CoreError),

    #[error("unknown symbol {0}")]
    UnknownSymbol(String),

    #[error("unsupported model type")]
    UnsupportedModelType,
}

/// Errors raised while validating or applying a [`crate::config::ServerConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required configuration field: {0}")]
    MissingField(&'static str),

    #[error("configuration references unknown bin declaration {0:?} as the default")]
    UnknownDefaultBin(String),

    #[error("invalid bin declaration {0:?}: {1}")]
    InvalidBinDecl(String, mdp_types::Error),

    #[error("worker_count must be at least 1")]
    WorkerCountZero,

    #[error("session_capacity must be at least 1")]
    SessionCapacityZero,
}
