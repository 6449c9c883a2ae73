//! Message kinds and the decoded inbound envelope.

use crate::error::{CallbackError, Result};
use crate::xml;
use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// `MsgType` values used by the platform, inbound and outbound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MsgType {
    Text,
    Image,
    Voice,
    Video,
    Music,
    News,
    Location,
    Link,
    Event,
    TransferCustomerService,
}

impl MsgType {
    /// Kinds a reply can be built for.
    pub const REPLY_KINDS: [MsgType; 7] = [
        MsgType::Text,
        MsgType::Image,
        MsgType::Voice,
        MsgType::Video,
        MsgType::Music,
        MsgType::News,
        MsgType::TransferCustomerService,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MsgType::Text => "text",
            MsgType::Image => "image",
            MsgType::Voice => "voice",
            MsgType::Video => "video",
            MsgType::Music => "music",
            MsgType::News => "news",
            MsgType::Location => "location",
            MsgType::Link => "link",
            MsgType::Event => "event",
            MsgType::TransferCustomerService => "transfer_customer_service",
        }
    }

    /// True when a reply of this kind can be built.
    pub fn is_reply_kind(&self) -> bool {
        Self::REPLY_KINDS.contains(self)
    }

    /// Parse an outbound kind; inbound-only and unknown kinds are rejected.
    pub fn parse_reply_kind(s: &str) -> Result<Self> {
        match s.parse::<MsgType>() {
            Ok(kind) if kind.is_reply_kind() => Ok(kind),
            _ => Err(CallbackError::UnknownMessageKind(s.to_string())),
        }
    }
}

impl FromStr for MsgType {
    type Err = CallbackError;

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s {
            "text" => MsgType::Text,
            "image" => MsgType::Image,
            "voice" => MsgType::Voice,
            "video" => MsgType::Video,
            "music" => MsgType::Music,
            "news" => MsgType::News,
            "location" => MsgType::Location,
            "link" => MsgType::Link,
            "event" => MsgType::Event,
            "transfer_customer_service" => MsgType::TransferCustomerService,
            other => return Err(CallbackError::UnknownMessageKind(other.to_string())),
        })
    }
}

impl fmt::Display for MsgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `Event` field of an `event` push. Unrecognised events are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventType {
    Subscribe,
    Unsubscribe,
    Scan,
    Location,
    Click,
    MassSendJobFinish,
    TemplateSendJobFinish,
    Other(String),
}

impl EventType {
    pub fn as_str(&self) -> &str {
        match self {
            EventType::Subscribe => "subscribe",
            EventType::Unsubscribe => "unsubscribe",
            EventType::Scan => "SCAN",
            EventType::Location => "LOCATION",
            EventType::Click => "CLICK",
            EventType::MassSendJobFinish => "MASSSENDJOBFINISH",
            EventType::TemplateSendJobFinish => "TEMPLATESENDJOBFINISH",
            EventType::Other(s) => s,
        }
    }
}

impl From<&str> for EventType {
    fn from(s: &str) -> Self {
        match s {
            "subscribe" => EventType::Subscribe,
            "unsubscribe" => EventType::Unsubscribe,
            "SCAN" => EventType::Scan,
            "LOCATION" => EventType::Location,
            "CLICK" => EventType::Click,
            "MASSSENDJOBFINISH" => EventType::MassSendJobFinish,
            "TEMPLATESENDJOBFINISH" => EventType::TemplateSendJobFinish,
            other => EventType::Other(other.to_string()),
        }
    }
}

/// Decoded push: the root's direct children as an ordered field-name → text mapping.
///
/// Built once per request from the raw body; there are no mutators.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct InboundMessage {
    fields: IndexMap<String, String>,
}

impl InboundMessage {
    /// Decode a push body. Malformed or rootless XML is a [`CallbackError::Parse`].
    pub fn from_xml(body: &str) -> Result<Self> {
        let fields = xml::decode(body)?;
        Ok(Self { fields })
    }

    pub fn from_fields(fields: IndexMap<String, String>) -> Self {
        Self { fields }
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    /// Required header field, or [`CallbackError::MissingField`].
    pub fn require(&self, field: &'static str) -> Result<&str> {
        self.get(field).ok_or(CallbackError::MissingField(field))
    }

    /// Account the push was sent to (our side).
    pub fn to_user_name(&self) -> Option<&str> {
        self.get("ToUserName")
    }

    /// Account that sent the push (the user).
    pub fn from_user_name(&self) -> Option<&str> {
        self.get("FromUserName")
    }

    pub fn create_time(&self) -> Option<i64> {
        self.get("CreateTime").and_then(|s| s.trim().parse().ok())
    }

    /// Parsed `MsgType`; an unknown or missing kind is an error.
    pub fn msg_type(&self) -> Result<MsgType> {
        self.require("MsgType")?.parse()
    }

    /// `Event` field, present on `event` pushes.
    pub fn event(&self) -> Option<EventType> {
        self.get("Event").map(EventType::from)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn into_fields(self) -> IndexMap<String, String> {
        self.fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEXT_PUSH: &str = "<xml>\
        <ToUserName><![CDATA[bot1]]></ToUserName>\
        <FromUserName><![CDATA[userA]]></FromUserName>\
        <CreateTime>1400000000</CreateTime>\
        <MsgType><![CDATA[text]]></MsgType>\
        <Content><![CDATA[hi]]></Content>\
        <MsgId>1234567890123456</MsgId>\
        </xml>";

    #[test]
    fn decodes_text_push() {
        let msg = InboundMessage::from_xml(TEXT_PUSH).unwrap();
        assert_eq!(msg.to_user_name(), Some("bot1"));
        assert_eq!(msg.from_user_name(), Some("userA"));
        assert_eq!(msg.create_time(), Some(1400000000));
        assert_eq!(msg.msg_type().unwrap(), MsgType::Text);
        assert_eq!(msg.get("Content"), Some("hi"));
        assert_eq!(msg.len(), 6);
        assert!(msg.event().is_none());
        let keys: Vec<_> = msg.iter().map(|(k, _)| k).collect();
        assert_eq!(keys[0], "ToUserName");
        assert_eq!(keys[5], "MsgId");
    }

    #[test]
    fn decodes_event_push() {
        let msg = InboundMessage::from_xml(
            "<xml><ToUserName>bot1</ToUserName><FromUserName>userA</FromUserName>\
             <CreateTime>1</CreateTime><MsgType>event</MsgType><Event>subscribe</Event></xml>",
        )
        .unwrap();
        assert_eq!(msg.msg_type().unwrap(), MsgType::Event);
        assert_eq!(msg.event(), Some(EventType::Subscribe));
    }

    #[test]
    fn unknown_event_is_preserved() {
        assert_eq!(EventType::from("VIEW"), EventType::Other("VIEW".to_string()));
        assert_eq!(EventType::from("VIEW").as_str(), "VIEW");
        assert_eq!(EventType::from("SCAN"), EventType::Scan);
    }

    #[test]
    fn msg_type_parsing() {
        for kind in MsgType::REPLY_KINDS {
            assert_eq!(kind.as_str().parse::<MsgType>().unwrap(), kind);
            assert_eq!(MsgType::parse_reply_kind(kind.as_str()).unwrap(), kind);
        }
        assert_eq!("link".parse::<MsgType>().unwrap(), MsgType::Link);
        assert!(matches!(
            MsgType::parse_reply_kind("location"),
            Err(CallbackError::UnknownMessageKind(k)) if k == "location"
        ));
        assert!(matches!(
            "shortvideo".parse::<MsgType>(),
            Err(CallbackError::UnknownMessageKind(_))
        ));
    }

    #[test]
    fn missing_fields_are_reported() {
        let msg = InboundMessage::from_xml("<xml><Content>x</Content></xml>").unwrap();
        assert!(matches!(msg.msg_type(), Err(CallbackError::MissingField("MsgType"))));
        assert!(msg.from_user_name().is_none());
        assert!(msg.create_time().is_none());
    }

    #[test]
    fn serializes_as_flat_json_object() {
        let msg = InboundMessage::from_xml(TEXT_PUSH).unwrap();
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.starts_with("{\"ToUserName\":\"bot1\",\"FromUserName\":\"userA\""));
    }

    #[test]
    fn rejects_malformed_body() {
        assert!(matches!(
            InboundMessage::from_xml("<xml><Content>"),
            Err(CallbackError::Parse(_))
        ));
    }
}
