use thiserror::Error;

/// Errors produced while constructing or decoding values from this crate.
///
/// A small enum of kinds, in the style of `opcua_types::errors::OpcUAError`,
/// rather than a string-typed catch-all.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid bin declaration: {0}")]
    InvalidBinDecl(String),

    #[error("envelope truncated while decoding tag {tag}")]
    EnvelopeTruncated { tag: u8 },

    #[error("envelope contained an unknown tag {0}")]
    EnvelopeUnknownTag(u8),

    #[error("envelope field {field} was not valid UTF-8")]
    EnvelopeInvalidUtf8 { field: &'static str },

    #[error("envelope was missing required field {0}")]
    EnvelopeMissingField(&'static str),

    #[error("request transport is closed")]
    TransportClosed,
}
