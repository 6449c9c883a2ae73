//! Reply content per message kind and the shapers that turn it into an XML body.
//!
//! Each kind has a fixed field set, so [`Reply`] is a closed enum and shaping is a match.
//! [`Reply::from_fields`] is the untyped entry point (CLI, config-driven replies); it is
//! the only place an argument-shape error can arise.

use crate::error::{CallbackError, Result};
use crate::message::MsgType;
use crate::xml::Value;

/// Most articles a news reply may carry; extras are dropped.
pub const MAX_ARTICLES: usize = 10;

/// One entry of a news reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    pub title: String,
    pub description: String,
    pub url: String,
    pub pic_url: String,
}

impl Article {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        url: impl Into<String>,
        pic_url: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            url: url.into(),
            pic_url: pic_url.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Video {
    pub media_id: String,
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Music {
    pub title: String,
    pub description: String,
    pub music_url: String,
    pub hq_music_url: String,
    pub thumb_media_id: String,
}

/// Outbound reply, one variant per buildable `MsgType`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Text(String),
    Image { media_id: String },
    Voice { media_id: String },
    Video(Video),
    Music(Music),
    News(Vec<Article>),
    /// Hand the conversation to customer service, optionally to a specific account.
    TransferCustomerService { kf_account: Option<String> },
}

impl Reply {
    pub fn text(content: impl Into<String>) -> Self {
        Reply::Text(content.into())
    }

    pub fn image(media_id: impl Into<String>) -> Self {
        Reply::Image {
            media_id: media_id.into(),
        }
    }

    pub fn voice(media_id: impl Into<String>) -> Self {
        Reply::Voice {
            media_id: media_id.into(),
        }
    }

    /// News reply with a single article.
    pub fn news_single(article: Article) -> Self {
        Reply::News(vec![article])
    }

    /// Transfer to customer service; an empty or `"0"` account means "any agent".
    pub fn transfer(kf_account: Option<&str>) -> Self {
        Reply::TransferCustomerService {
            kf_account: kf_account
                .filter(|a| !a.is_empty() && *a != "0")
                .map(str::to_string),
        }
    }

    pub fn kind(&self) -> MsgType {
        match self {
            Reply::Text(_) => MsgType::Text,
            Reply::Image { .. } => MsgType::Image,
            Reply::Voice { .. } => MsgType::Voice,
            Reply::Video(_) => MsgType::Video,
            Reply::Music(_) => MsgType::Music,
            Reply::News(_) => MsgType::News,
            Reply::TransferCustomerService { .. } => MsgType::TransferCustomerService,
        }
    }

    /// Kind-specific body, or `None` when the kind has nothing beyond the header.
    pub fn body(&self) -> Option<Value> {
        Some(match self {
            Reply::Text(content) => shape_text(content),
            Reply::Image { media_id } | Reply::Voice { media_id } => shape_media(media_id),
            Reply::Video(v) => shape_video(v),
            Reply::Music(m) => shape_music(m),
            Reply::News(articles) => shape_news(articles),
            Reply::TransferCustomerService { kf_account } => {
                return kf_account.as_deref().map(shape_trans_info)
            }
        })
    }

    /// Build a reply from a kind name and its ordered fields.
    ///
    /// Field order per kind: text `[content]`; image/voice `[media_id]`; video
    /// `[media_id, title, description]`; music `[title, description, music_url,
    /// hq_music_url, thumb_media_id]`; news `[title, description, url, pic_url]` repeated
    /// once per article; transfer_customer_service `[]` or `[kf_account]`.
    pub fn from_fields(kind: &str, fields: &[String]) -> Result<Self> {
        let kind = MsgType::parse_reply_kind(kind)?;
        let shape_err = |expected: &'static str| CallbackError::ArgumentShape {
            kind: kind.to_string(),
            expected,
            got: fields.len(),
        };
        Ok(match kind {
            MsgType::Text => match fields {
                [content] => Reply::text(content),
                _ => return Err(shape_err("1 field")),
            },
            MsgType::Image | MsgType::Voice => match fields {
                [media_id] if kind == MsgType::Image => Reply::image(media_id),
                [media_id] => Reply::voice(media_id),
                _ => return Err(shape_err("1 field")),
            },
            MsgType::Video => match fields {
                [media_id, title, description] => Reply::Video(Video {
                    media_id: media_id.clone(),
                    title: title.clone(),
                    description: description.clone(),
                }),
                _ => return Err(shape_err("3 fields")),
            },
            MsgType::Music => match fields {
                [title, description, music_url, hq_music_url, thumb_media_id] => Reply::Music(Music {
                    title: title.clone(),
                    description: description.clone(),
                    music_url: music_url.clone(),
                    hq_music_url: hq_music_url.clone(),
                    thumb_media_id: thumb_media_id.clone(),
                }),
                _ => return Err(shape_err("5 fields")),
            },
            MsgType::News => {
                if fields.is_empty() || fields.len() % 4 != 0 {
                    return Err(shape_err("a non-zero multiple of 4 fields"));
                }
                Reply::News(
                    fields
                        .chunks_exact(4)
                        .map(|c| Article::new(&c[0], &c[1], &c[2], &c[3]))
                        .collect(),
                )
            }
            MsgType::TransferCustomerService => match fields {
                [] => Reply::transfer(None),
                [account] => Reply::transfer(Some(account.as_str())),
                _ => return Err(shape_err("0 or 1 field")),
            },
            MsgType::Location | MsgType::Link | MsgType::Event => {
                return Err(CallbackError::UnknownMessageKind(kind.to_string()))
            }
        })
    }
}

fn shape_text(content: &str) -> Value {
    Value::map().with("Content", content)
}

fn shape_media(media_id: &str) -> Value {
    Value::map().with("MediaId", media_id)
}

fn shape_video(v: &Video) -> Value {
    Value::map()
        .with("MediaId", &v.media_id)
        .with("Title", &v.title)
        .with("Description", &v.description)
}

fn shape_music(m: &Music) -> Value {
    Value::map()
        .with("Title", &m.title)
        .with("Description", &m.description)
        .with("MusicUrl", &m.music_url)
        .with("HQMusicUrl", &m.hq_music_url)
        .with("ThumbMediaId", &m.thumb_media_id)
}

fn shape_news(articles: &[Article]) -> Value {
    if articles.len() > MAX_ARTICLES {
        log::warn!(
            "news reply has {} articles; keeping the first {}",
            articles.len(),
            MAX_ARTICLES
        );
    }
    let items: Vec<Value> = articles
        .iter()
        .take(MAX_ARTICLES)
        .map(|a| {
            Value::map()
                .with("Title", &a.title)
                .with("Description", &a.description)
                .with("Url", &a.url)
                .with("PicUrl", &a.pic_url)
        })
        .collect();
    Value::map()
        .with("ArticleCount", items.len())
        .with("Articles", Value::Seq(items))
}

fn shape_trans_info(account: &str) -> Value {
    Value::map().with("TransInfo", Value::map().with("KfAccount", account))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn media_kinds_share_shape() {
        assert_eq!(Reply::image("m1").body(), Reply::voice("m1").body());
        assert_eq!(
            Reply::image("m1").body().unwrap(),
            Value::map().with("MediaId", "m1")
        );
    }

    #[test]
    fn music_field_order() {
        let r = Reply::from_fields("music", &strings(&["t", "d", "u", "hq", "thumb"])).unwrap();
        let Some(Value::Map(entries)) = r.body() else {
            panic!("music body should be a map");
        };
        let keys: Vec<_> = entries.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["Title", "Description", "MusicUrl", "HQMusicUrl", "ThumbMediaId"]);
    }

    #[test]
    fn news_truncates_to_ten() {
        let articles: Vec<_> = (0..11)
            .map(|i| Article::new(format!("t{}", i), "d", "u", "p"))
            .collect();
        let body = Reply::News(articles).body().unwrap();
        assert_eq!(body.get("ArticleCount"), Some(&Value::Int(10)));
        let Some(Value::Seq(items)) = body.get("Articles") else {
            panic!("Articles should be a sequence");
        };
        assert_eq!(items.len(), 10);
        assert_eq!(items[9].get("Title"), Some(&Value::Text("t9".into())));
    }

    #[test]
    fn transfer_body_only_with_account() {
        assert_eq!(Reply::transfer(None).body(), None);
        assert_eq!(Reply::transfer(Some("")).body(), None);
        assert_eq!(Reply::transfer(Some("0")).body(), None);
        assert!(Reply::transfer(Some("00")).body().is_some());
        let body = Reply::transfer(Some("kf2001@svc")).body().unwrap();
        assert_eq!(
            body,
            Value::map().with("TransInfo", Value::map().with("KfAccount", "kf2001@svc"))
        );
    }

    #[test]
    fn from_fields_builds_each_kind() {
        assert_eq!(Reply::from_fields("text", &strings(&["hi"])).unwrap(), Reply::text("hi"));
        assert_eq!(Reply::from_fields("voice", &strings(&["v"])).unwrap(), Reply::voice("v"));
        assert_eq!(Reply::from_fields("image", &strings(&["i"])).unwrap(), Reply::image("i"));
        assert_eq!(
            Reply::from_fields("video", &strings(&["m", "t", "d"])).unwrap().kind(),
            MsgType::Video
        );
        let news = Reply::from_fields("news", &strings(&["a", "b", "c", "d", "e", "f", "g", "h"])).unwrap();
        assert_eq!(
            news,
            Reply::News(vec![Article::new("a", "b", "c", "d"), Article::new("e", "f", "g", "h")])
        );
        assert_eq!(
            Reply::from_fields("transfer_customer_service", &[]).unwrap(),
            Reply::TransferCustomerService { kf_account: None }
        );
    }

    #[test]
    fn from_fields_rejects_wrong_shape() {
        let cases: Vec<(&str, Vec<&str>)> = vec![
            ("text", vec![]),
            ("text", vec!["a", "b"]),
            ("image", vec![]),
            ("video", vec!["m", "t"]),
            ("music", vec!["t", "d", "u", "hq"]),
            ("news", vec![]),
            ("news", vec!["a", "b", "c"]),
            ("transfer_customer_service", vec!["a", "b"]),
        ];
        for (kind, fields) in cases {
            match Reply::from_fields(kind, &strings(&fields)) {
                Err(CallbackError::ArgumentShape { kind: k, got, .. }) => {
                    assert_eq!(k, kind);
                    assert_eq!(got, fields.len());
                }
                other => panic!("{} {:?}: expected shape error, got {:?}", kind, fields, other),
            }
        }
    }

    #[test]
    fn from_fields_rejects_unknown_kind() {
        for kind in ["location", "link", "event", "sticker", ""] {
            assert!(matches!(
                Reply::from_fields(kind, &strings(&["x"])),
                Err(CallbackError::UnknownMessageKind(_))
            ));
        }
    }
}
