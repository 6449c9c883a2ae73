//! Configuration types and loading.
//!
//! Config is loaded from a JSON file (e.g. `~/.wxcallback/config.json`) and environment.
//! The callback core never reads it directly: callers resolve the token here and pass it in.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::xml::DEFAULT_ITEM_TAG;

/// Top-level application config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Callback account settings.
    #[serde(default)]
    pub wechat: WechatConfig,
}

/// Callback account settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WechatConfig {
    /// Token entered in the platform's server configuration. Overridden by WECHAT_TOKEN env.
    pub token: Option<String>,
    /// Element name for sequence entries in replies (default "item").
    pub item_tag: Option<String>,
}

fn non_blank(s: &str) -> Option<String> {
    let t = s.trim();
    if t.is_empty() {
        None
    } else {
        Some(t.to_string())
    }
}

/// Resolve the callback token: env WECHAT_TOKEN overrides config.
pub fn resolve_token(config: &Config) -> Option<String> {
    resolve_token_with(std::env::var("WECHAT_TOKEN").ok(), config)
}

fn resolve_token_with(env: Option<String>, config: &Config) -> Option<String> {
    env.as_deref().and_then(non_blank).or_else(|| {
        config
            .wechat
            .token
            .as_deref()
            .and_then(non_blank)
    })
}

/// Item tag for reply sequences; blank or missing falls back to "item".
pub fn resolve_item_tag(config: &Config) -> String {
    config
        .wechat
        .item_tag
        .as_deref()
        .and_then(non_blank)
        .unwrap_or_else(|| DEFAULT_ITEM_TAG.to_string())
}

/// Resolve config path from env or default.
pub fn default_config_path() -> PathBuf {
    std::env::var("WXCALLBACK_CONFIG_PATH").map(PathBuf::from).unwrap_or_else(|_| {
        dirs::home_dir()
            .map(|h| h.join(".wxcallback").join("config.json"))
            .unwrap_or_else(|| PathBuf::from("config.json"))
    })
}

/// Load config from the given path, or the default path (or WXCALLBACK_CONFIG_PATH).
/// Missing file => default config. Returns the config and the path that was used.
pub fn load_config(path: Option<PathBuf>) -> Result<(Config, PathBuf)> {
    let path = path.unwrap_or_else(default_config_path);
    let config = if !path.exists() {
        log::debug!("config file not found, using defaults: {}", path.display());
        Config::default()
    } else {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        serde_json::from_str(&s)
            .with_context(|| format!("parsing config from {}", path.display()))?
    };
    Ok((config, path))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_token(token: Option<&str>) -> Config {
        let mut config = Config::default();
        config.wechat.token = token.map(str::to_string);
        config
    }

    #[test]
    fn env_token_overrides_config() {
        let config = with_token(Some("from-file"));
        assert_eq!(
            resolve_token_with(Some("from-env".to_string()), &config),
            Some("from-env".to_string())
        );
        assert_eq!(
            resolve_token_with(None, &config),
            Some("from-file".to_string())
        );
    }

    #[test]
    fn blank_tokens_are_unset() {
        assert_eq!(resolve_token_with(Some("  ".to_string()), &with_token(Some(""))), None);
        assert_eq!(
            resolve_token_with(Some("".to_string()), &with_token(Some(" tok "))),
            Some("tok".to_string())
        );
        assert_eq!(resolve_token_with(None, &Config::default()), None);
    }

    #[test]
    fn item_tag_defaults_to_item() {
        let mut config = Config::default();
        assert_eq!(resolve_item_tag(&config), "item");
        config.wechat.item_tag = Some(" ".to_string());
        assert_eq!(resolve_item_tag(&config), "item");
        config.wechat.item_tag = Some("entry".to_string());
        assert_eq!(resolve_item_tag(&config), "entry");
    }

    #[test]
    fn load_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");
        let (config, used) = load_config(Some(path.clone())).unwrap();
        assert_eq!(used, path);
        assert!(config.wechat.token.is_none());
    }

    #[test]
    fn load_reads_camel_case_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"wechat":{"token":"abc","itemTag":"entry"}}"#).unwrap();
        let (config, _) = load_config(Some(path)).unwrap();
        assert_eq!(config.wechat.token.as_deref(), Some("abc"));
        assert_eq!(config.wechat.item_tag.as_deref(), Some("entry"));
    }

    #[test]
    fn load_rejects_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{not json").unwrap();
        let err = load_config(Some(path)).unwrap_err();
        assert!(err.to_string().starts_with("parsing config from"));
    }
}
