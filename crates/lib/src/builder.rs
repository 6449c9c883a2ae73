//! Reply builder: addressing header + shaped body + XML encode.
//!
//! The header swaps the envelope's user names so the reply goes back to the sender.
//! Text and news bodies are merged into the top level next to the header; image, voice,
//! video and music bodies are nested under one element named after the kind
//! (`<Image>`, `<Voice>`, ...). Transfer replies carry only the optional `TransInfo`.

use crate::error::Result;
use crate::message::{InboundMessage, MsgType};
use crate::reply::Reply;
use crate::xml::{self, Value};

/// Current Unix timestamp in seconds, for `CreateTime`.
pub fn now_timestamp() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Builds outbound XML replies. Holds only the sequence item tag; safe to share across requests.
#[derive(Debug, Clone)]
pub struct ReplyBuilder {
    item_tag: String,
}

impl Default for ReplyBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReplyBuilder {
    pub fn new() -> Self {
        Self {
            item_tag: xml::DEFAULT_ITEM_TAG.to_string(),
        }
    }

    /// Use `tag` instead of `item` for sequence entries (news articles).
    pub fn with_item_tag(mut self, tag: impl Into<String>) -> Self {
        self.item_tag = tag.into();
        self
    }

    /// Build the reply document for `envelope`, stamped with `create_time`.
    pub fn build(&self, envelope: &InboundMessage, reply: &Reply, create_time: i64) -> Result<String> {
        let doc = reply_document(envelope, reply, create_time)?;
        xml::encode_with_item_tag(&doc, &self.item_tag)
    }

    /// Build from a kind name and ordered fields (see [`Reply::from_fields`]).
    pub fn build_from_fields(
        &self,
        envelope: &InboundMessage,
        kind: &str,
        fields: &[String],
        create_time: i64,
    ) -> Result<String> {
        let reply = Reply::from_fields(kind, fields)?;
        self.build(envelope, &reply, create_time)
    }

    /// Hand the conversation to customer service, optionally a specific account.
    pub fn build_transfer(
        &self,
        envelope: &InboundMessage,
        kf_account: Option<&str>,
        create_time: i64,
    ) -> Result<String> {
        self.build(envelope, &Reply::transfer(kf_account), create_time)
    }
}

/// Common header: user names swapped relative to the envelope.
fn header(envelope: &InboundMessage, kind: MsgType, create_time: i64) -> Result<Vec<(String, Value)>> {
    let to_user = envelope.require("FromUserName")?;
    let from_user = envelope.require("ToUserName")?;
    Ok(vec![
        ("ToUserName".to_string(), Value::from(to_user)),
        ("FromUserName".to_string(), Value::from(from_user)),
        ("CreateTime".to_string(), Value::Int(create_time)),
        ("MsgType".to_string(), Value::from(kind.as_str())),
    ])
}

/// Full reply structure before encoding.
pub fn reply_document(envelope: &InboundMessage, reply: &Reply, create_time: i64) -> Result<Value> {
    let kind = reply.kind();
    let mut entries = header(envelope, kind, create_time)?;
    if let Some(body) = reply.body() {
        match kind {
            MsgType::Text | MsgType::News | MsgType::TransferCustomerService => {
                if let Value::Map(fields) = body {
                    entries.extend(fields);
                }
            }
            _ => entries.push((capitalize(kind.as_str()), body)),
        }
    }
    Ok(Value::Map(entries))
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
