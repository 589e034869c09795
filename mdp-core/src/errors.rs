use thiserror::Error;

/// Errors produced by calendar, time-zone, and grammar parsing in this crate.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("unknown IANA time zone: {0}")]
    UnknownTimeZone(String),

    #[error("local time {0} does not exist in time zone {1} (spring-forward gap)")]
    NonExistentLocalTime(String, String),

    #[error("local time {0} is ambiguous in time zone {1} (fall-back overlap)")]
    AmbiguousLocalTime(String, String),

    #[error("malformed bin declaration line: {0}")]
    MalformedBinDeclaration(String),

    #[error(transparent)]
    BinDecl(#[from] mdp_types::Error),
}
