//! Site configuration module.
//!
//! Handles loading, validating, and merging `config.toml`. Stock defaults
//! carry the site's constant tables (navigation, social links, icon keys,
//! comment widget ids, presence settings); a user file only needs the keys
//! it wants to change.
//!
//! ## Configuration Options
//!
//! ```toml
//! [site]
//! title = "0xGunn"
//! href = "https://0xGunn.vercel.app"
//! posts_per_page = 3
//!
//! [[nav]]
//! href = "/blog"
//! label = "blog"
//!
//! [[social]]
//! href = "https://github.com/0xGunn"
//! label = "GitHub"
//!
//! [icons]
//! GitHub = "lucide:github"
//!
//! [comment]
//! repo = "0xGunn/0xgunn.github.io"
//!
//! [status]
//! user_id = "1234773099476422682"
//! api_base = "https://api.lanyard.rest"
//! poll_interval_secs = 10
//! ```
//!
//! ## Merging
//!
//! Tables merge key-by-key, so `[icons]` entries add to the stock map.
//! Arrays (`[[nav]]`, `[[social]]`) replace the stock list wholesale.
//! Unknown keys are rejected to catch typos early.

use crate::types::Link;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Site configuration loaded from `config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Site metadata used by page chrome.
    pub site: SiteMeta,
    /// Header navigation links, in display order.
    pub nav: Vec<Link>,
    /// Footer social links, in display order.
    pub social: Vec<Link>,
    /// Social label → icon key (`lucide:*`).
    pub icons: BTreeMap<String, String>,
    /// Ids handed to the embedded comment widget.
    pub comment: CommentConfig,
    /// Live status widget settings.
    pub status: StatusSettings,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            site: SiteMeta::default(),
            nav: vec![
                Link::new("/blog", "blog"),
                Link::new("/tags", "tags"),
                Link::new("/archives", "archives"),
                Link::new("/authors", "authors"),
                Link::new("/about", "about"),
            ],
            social: vec![
                Link::new("https://github.com/0xGunn", "GitHub"),
                Link::new("https://x.com/vieTin_", "Twitter"),
                Link::new("mailto:nviettin48@gmail.com", "Email"),
                Link::new("/rss.xml", "RSS"),
            ],
            icons: default_icons(),
            comment: CommentConfig::default(),
            status: StatusSettings::default(),
        }
    }
}

fn default_icons() -> BTreeMap<String, String> {
    [
        ("Website", "lucide:globe"),
        ("GitHub", "lucide:github"),
        ("LinkedIn", "lucide:linkedin"),
        ("Twitter", "lucide:twitter"),
        ("Email", "lucide:mail"),
        ("RSS", "lucide:rss"),
    ]
    .into_iter()
    .map(|(label, icon)| (label.to_string(), icon.to_string()))
    .collect()
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.site.posts_per_page == 0 {
            return Err(ConfigError::Validation(
                "site.posts_per_page must be non-zero".into(),
            ));
        }
        if self.status.user_id.trim().is_empty() {
            return Err(ConfigError::Validation(
                "status.user_id must not be empty".into(),
            ));
        }
        if !self.status.api_base.starts_with("http") {
            return Err(ConfigError::Validation(
                "status.api_base must be an http(s) URL".into(),
            ));
        }
        if self.status.poll_interval_secs == 0 {
            return Err(ConfigError::Validation(
                "status.poll_interval_secs must be non-zero".into(),
            ));
        }
        if let Some(link) = self
            .social
            .iter()
            .find(|l| !self.icons.contains_key(&l.label))
        {
            return Err(ConfigError::Validation(format!(
                "social link '{}' has no entry in [icons]",
                link.label
            )));
        }
        Ok(())
    }

    /// Icon key for a social link label, if one is configured.
    pub fn icon_for(&self, label: &str) -> Option<&str> {
        self.icons.get(label).map(String::as_str)
    }
}

/// Site metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteMeta {
    pub title: String,
    pub description: String,
    /// Canonical site URL.
    pub href: String,
    pub author: String,
    pub locale: String,
    /// Number of featured posts on the home page.
    pub featured_post_count: u32,
    pub posts_per_page: u32,
}

impl Default for SiteMeta {
    fn default() -> Self {
        Self {
            title: "0xGunn".to_string(),
            description:
                "0xGunn is a blog about security research, programming, and technology."
                    .to_string(),
            href: "https://0xGunn.vercel.app".to_string(),
            author: "jktrn".to_string(),
            locale: "en-US".to_string(),
            featured_post_count: 2,
            posts_per_page: 3,
        }
    }
}

/// Repository and discussion-category ids for the comment widget.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CommentConfig {
    pub repo: String,
    pub repo_id: String,
    pub category: String,
    pub category_id: String,
}

impl Default for CommentConfig {
    fn default() -> Self {
        Self {
            repo: "0xGunn/0xgunn.github.io".to_string(),
            repo_id: "R_kgDORCN8oQ".to_string(),
            category: "Comments".to_string(),
            category_id: "DIC_kwDORCN8oc4C1e84".to_string(),
        }
    }
}

/// Live status widget settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StatusSettings {
    /// Discord user id whose presence is shown.
    pub user_id: String,
    /// Presence API base URL, without trailing slash.
    pub api_base: String,
    /// Seconds between polls.
    pub poll_interval_secs: u64,
}

impl Default for StatusSettings {
    fn default() -> Self {
        Self {
            user_id: "1234773099476422682".to_string(),
            api_base: "https://api.lanyard.rest".to_string(),
            poll_interval_secs: 10,
        }
    }
}

impl StatusSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Presence document URL for the configured user.
    pub fn user_url(&self) -> String {
        format!(
            "{}/v1/users/{}",
            self.api_base.trim_end_matches('/'),
            self.user_id
        )
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(SiteConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay, arrays included, replace base values.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<SiteConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from the given file, falling back to stock defaults when it
/// does not exist.
pub fn load_config(path: &Path) -> Result<SiteConfig, ConfigError> {
    let overlay = load_raw_config(path)?;
    if overlay.is_none() {
        tracing::debug!("no config at {}, using stock defaults", path.display());
    }
    resolve_config(stock_defaults_value(), overlay)
}

/// Returns a fully-commented stock `config.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Blog Widgets Configuration
# ==========================
# All settings are optional. Values shown below are the defaults.
# Tables merge with the defaults; [[nav]] and [[social]] lists replace them.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Site metadata
# ---------------------------------------------------------------------------
[site]
title = "0xGunn"
description = "0xGunn is a blog about security research, programming, and technology."
href = "https://0xGunn.vercel.app"
author = "jktrn"
locale = "en-US"
featured_post_count = 2
posts_per_page = 3

# ---------------------------------------------------------------------------
# Header navigation
# ---------------------------------------------------------------------------
[[nav]]
href = "/blog"
label = "blog"

[[nav]]
href = "/tags"
label = "tags"

[[nav]]
href = "/archives"
label = "archives"

[[nav]]
href = "/authors"
label = "authors"

[[nav]]
href = "/about"
label = "about"

# ---------------------------------------------------------------------------
# Footer social links (every label needs an entry in [icons])
# ---------------------------------------------------------------------------
[[social]]
href = "https://github.com/0xGunn"
label = "GitHub"

[[social]]
href = "https://x.com/vieTin_"
label = "Twitter"

[[social]]
href = "mailto:nviettin48@gmail.com"
label = "Email"

[[social]]
href = "/rss.xml"
label = "RSS"

[icons]
Website = "lucide:globe"
GitHub = "lucide:github"
LinkedIn = "lucide:linkedin"
Twitter = "lucide:twitter"
Email = "lucide:mail"
RSS = "lucide:rss"

# ---------------------------------------------------------------------------
# Comment widget (GitHub Discussions)
# ---------------------------------------------------------------------------
[comment]
repo = "0xGunn/0xgunn.github.io"
repo_id = "R_kgDORCN8oQ"
category = "Comments"
category_id = "DIC_kwDORCN8oc4C1e84"

# ---------------------------------------------------------------------------
# Live status widget (Lanyard presence API)
# ---------------------------------------------------------------------------
[status]
# Discord user id to show. The user must have joined the Lanyard server.
user_id = "1234773099476422682"
api_base = "https://api.lanyard.rest"
# Seconds between polls.
poll_interval_secs = 10
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_has_site_constants() {
        let config = SiteConfig::default();
        assert_eq!(config.site.title, "0xGunn");
        assert_eq!(config.nav.len(), 5);
        assert_eq!(config.nav[0], Link::new("/blog", "blog"));
        assert_eq!(config.social.len(), 4);
        assert_eq!(config.icons.len(), 6);
        assert_eq!(config.comment.category, "Comments");
        assert_eq!(config.status.poll_interval(), Duration::from_secs(10));
    }

    #[test]
    fn validate_default_config_passes() {
        assert!(SiteConfig::default().validate().is_ok());
    }

    #[test]
    fn icon_lookup_is_case_sensitive() {
        let config = SiteConfig::default();
        assert_eq!(config.icon_for("GitHub"), Some("lucide:github"));
        assert_eq!(config.icon_for("github"), None);
    }

    #[test]
    fn user_url_templates_id() {
        let settings = StatusSettings {
            user_id: "42".to_string(),
            api_base: "https://api.lanyard.rest/".to_string(),
            poll_interval_secs: 10,
        };
        assert_eq!(settings.user_url(), "https://api.lanyard.rest/v1/users/42");
    }

    #[test]
    fn merge_toml_scalar_override() {
        let base: toml::Value = toml::from_str(r#"a = 1"#).unwrap();
        let overlay: toml::Value = toml::from_str(r#"a = 2"#).unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged.get("a").unwrap().as_integer(), Some(2));
    }

    #[test]
    fn merge_toml_preserves_base_keys() {
        let base: toml::Value = toml::from_str(
            r#"
            [status]
            user_id = "1"
            poll_interval_secs = 10
            "#,
        )
        .unwrap();
        let overlay: toml::Value = toml::from_str(
            r#"
            [status]
            poll_interval_secs = 30
            "#,
        )
        .unwrap();
        let merged = merge_toml(base, overlay);
        let status = merged.get("status").unwrap();
        assert_eq!(status.get("user_id").unwrap().as_str(), Some("1"));
        assert_eq!(status.get("poll_interval_secs").unwrap().as_integer(), Some(30));
    }

    #[test]
    fn overlay_icons_add_to_stock_map() {
        let overlay: toml::Value = toml::from_str(
            r#"
            [icons]
            Mastodon = "lucide:mastodon"
            "#,
        )
        .unwrap();
        let config = resolve_config(stock_defaults_value(), Some(overlay)).unwrap();
        assert_eq!(config.icon_for("Mastodon"), Some("lucide:mastodon"));
        assert_eq!(config.icon_for("RSS"), Some("lucide:rss"));
    }

    #[test]
    fn overlay_nav_replaces_stock_list() {
        let overlay: toml::Value = toml::from_str(
            r#"
            [[nav]]
            href = "/posts"
            label = "posts"
            "#,
        )
        .unwrap();
        let config = resolve_config(stock_defaults_value(), Some(overlay)).unwrap();
        assert_eq!(config.nav, vec![Link::new("/posts", "posts")]);
    }

    #[test]
    fn unknown_key_rejected() {
        let overlay: toml::Value = toml::from_str(
            r#"
            [status]
            poll_every = 5
            "#,
        )
        .unwrap();
        let result = resolve_config(stock_defaults_value(), Some(overlay));
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn validate_zero_interval() {
        let mut config = SiteConfig::default();
        config.status.poll_interval_secs = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("poll_interval_secs"));
    }

    #[test]
    fn validate_empty_user_id() {
        let mut config = SiteConfig::default();
        config.status.user_id = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_api_base_scheme() {
        let mut config = SiteConfig::default();
        config.status.api_base = "api.lanyard.rest".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_social_link_without_icon() {
        let mut config = SiteConfig::default();
        config.social.push(Link::new("https://example.com", "Bluesky"));
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Bluesky"));
    }

    #[test]
    fn load_config_missing_file_uses_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(&tmp.path().join("config.toml")).unwrap();
        assert_eq!(config.site.posts_per_page, 3);
    }

    #[test]
    fn load_config_applies_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(
            &path,
            r#"
            [status]
            user_id = "999"
            "#,
        )
        .unwrap();
        let config = load_config(&path).unwrap();
        assert_eq!(config.status.user_id, "999");
        assert_eq!(config.status.api_base, "https://api.lanyard.rest");
    }

    #[test]
    fn load_config_validates_values() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, "[site]\nposts_per_page = 0\n").unwrap();
        assert!(matches!(
            load_config(&path),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn load_config_rejects_bad_toml() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, "[site\n").unwrap();
        assert!(matches!(load_config(&path), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn stock_config_toml_roundtrips_to_defaults() {
        let parsed: SiteConfig = toml::from_str(stock_config_toml()).unwrap();
        let defaults = SiteConfig::default();
        assert_eq!(parsed.site.description, defaults.site.description);
        assert_eq!(parsed.nav, defaults.nav);
        assert_eq!(parsed.social, defaults.social);
        assert_eq!(parsed.icons, defaults.icons);
        assert_eq!(parsed.comment.repo_id, defaults.comment.repo_id);
        assert_eq!(parsed.status.user_id, defaults.status.user_id);
        assert_eq!(
            parsed.status.poll_interval_secs,
            defaults.status.poll_interval_secs
        );
    }

    #[test]
    fn stock_defaults_value_has_all_sections() {
        let value = stock_defaults_value();
        for key in ["site", "nav", "social", "icons", "comment", "status"] {
            assert!(value.get(key).is_some(), "missing section {key}");
        }
    }
}
