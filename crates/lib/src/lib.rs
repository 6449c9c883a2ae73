//! Callback core for a chat platform's XML webhook: signature check, flat envelope
//! decoding and per-kind reply shaping. Transport, media upload and session state
//! belong to the caller.

pub mod builder;
pub mod callback;
pub mod config;
pub mod error;
pub mod message;
pub mod reply;
pub mod signature;
pub mod xml;

pub use builder::{now_timestamp, ReplyBuilder};
pub use callback::{handle_callback, Callback, CallbackQuery};
pub use error::CallbackError;
pub use message::{EventType, InboundMessage, MsgType};
pub use reply::{Article, Music, Reply, Video};
