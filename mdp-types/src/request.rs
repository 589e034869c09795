/// Opaque identifier tying a request to its response, provided by the wire
/// framework. Newtype over `u64`, in the same style as `opcua_types::NodeId`
/// wrapping identifiers rather than passing raw integers around.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestToken(pub u64);

/// The message-model type carried by a request, used to dispatch it to the
/// right handler. `Other` preserves the raw discriminant so unknown types
/// can still be counted as discarded rather than dropped silently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelType {
    Login,
    Directory,
    Dictionary,
    MarketPrice,
    Other(u16),
}

impl ModelType {
    pub fn discriminant(self) -> u16 {
        match self {
            ModelType::Login => 1,
            ModelType::Directory => 4,
            ModelType::Dictionary => 5,
            ModelType::MarketPrice => 6,
            ModelType::Other(v) => v,
        }
    }

    pub fn from_discriminant(v: u16) -> Self {
        match v {
            1 => ModelType::Login,
            4 => ModelType::Directory,
            5 => ModelType::Dictionary,
            6 => ModelType::MarketPrice,
            other => ModelType::Other(other),
        }
    }
}

/// Discriminates the two envelope shapes that flow across the request
/// transport. `Abort` carries no payload beyond the discriminant itself —
/// it exists purely to unblock a worker's receive loop during shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Snapshot,
    Abort,
}

/// One unit of work enqueued on the request transport. Ownership: created
/// by the client session, consumed exactly once by a worker.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub kind: RequestKind,
    pub request_token: RequestToken,
    pub service_id: u32,
    pub model_type: ModelType,
    pub item_name: String,
    pub wire_major: u8,
    pub wire_minor: u8,
}

impl Request {
    /// Construct an `Abort` envelope. Only `kind` is meaningful; the other
    /// fields are filled with harmless defaults since a worker must check
    /// `kind` before touching them.
    pub fn abort() -> Self {
        Self {
            kind: RequestKind::Abort,
            request_token: RequestToken(0),
            service_id: 0,
            model_type: ModelType::Other(0),
            item_name: String::new(),
            wire_major: 0,
            wire_minor: 0,
        }
    }

    pub fn snapshot(
        request_token: RequestToken,
        service_id: u32,
        model_type: ModelType,
        item_name: impl Into<String>,
        wire_major: u8,
        wire_minor: u8,
    ) -> Self {
        Self {
            kind: RequestKind::Snapshot,
            request_token,
            service_id,
            model_type,
            item_name: item_name.into(),
            wire_major,
            wire_minor,
        }
    }
}
