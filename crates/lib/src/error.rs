//! Error taxonomy for the callback pipeline.
//!
//! Every failure is local to one call: no partial XML is ever returned, and nothing
//! here is retried by the library. The HTTP layer decides how to end the exchange.

/// Failure of a single callback or reply-building call.
#[derive(Debug, thiserror::Error)]
pub enum CallbackError {
    /// Signature mismatch. The caller should answer with an empty body.
    #[error("signature verification failed")]
    Authentication,
    /// Inbound body is not well-formed XML or has no root element.
    #[error("malformed callback xml: {0}")]
    Parse(String),
    /// `MsgType` is not one of the kinds a reply can be built for.
    #[error("unknown reply message kind: {0}")]
    UnknownMessageKind(String),
    /// Reply content does not match the fixed field set of its kind.
    #[error("{kind} reply expects {expected}, got {got} field(s)")]
    ArgumentShape {
        kind: String,
        expected: &'static str,
        got: usize,
    },
    /// Decoded envelope lacks a header field needed to address the reply.
    #[error("callback envelope missing field: {0}")]
    MissingField(&'static str),
    #[error("xml encode failed: {0}")]
    Encode(String),
}

pub type Result<T> = std::result::Result<T, CallbackError>;
