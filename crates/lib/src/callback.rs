//! Request-level flow: authenticate, then either echo the handshake challenge or decode the push.
//!
//! The HTTP layer passes in the query parameters, the raw body and the account token;
//! nothing here touches the network, the clock or any process-wide state.

use crate::error::{CallbackError, Result};
use crate::message::InboundMessage;
use crate::signature;
use serde::Deserialize;

/// Query parameters sent by the platform on every callback.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackQuery {
    #[serde(default)]
    pub signature: String,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub nonce: String,
    /// Present only on the URL-verification handshake.
    #[serde(default)]
    pub echostr: Option<String>,
}

impl CallbackQuery {
    /// True when `signature` matches `(timestamp, nonce, token)`.
    pub fn verify(&self, token: &str) -> bool {
        signature::verify(&self.timestamp, &self.nonce, token, &self.signature)
    }
}

/// Outcome of an authenticated callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Callback {
    /// URL verification: respond with this challenge verbatim.
    Handshake(String),
    /// Message push, decoded.
    Message(InboundMessage),
}

/// Authenticate and classify one callback request.
///
/// Signature failure stops before the body is looked at. A handshake returns `echostr`
/// untouched; otherwise the body is decoded into an [`InboundMessage`].
pub fn handle_callback(query: &CallbackQuery, body: &str, token: &str) -> Result<Callback> {
    if !query.verify(token) {
        log::debug!("callback rejected: signature mismatch (timestamp={})", query.timestamp);
        return Err(CallbackError::Authentication);
    }
    if let Some(ref echostr) = query.echostr {
        log::debug!("callback handshake verified");
        return Ok(Callback::Handshake(echostr.clone()));
    }
    match InboundMessage::from_xml(body) {
        Ok(msg) => Ok(Callback::Message(msg)),
        Err(e) => {
            log::debug!("callback body rejected: {}", e);
            Err(e)
        }
    }
}
