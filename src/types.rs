//! Shared types used by configuration and page rendering.

use serde::{Deserialize, Serialize};

/// A labelled link, used for both the navigation bar and the social links
/// in the footer.
///
/// Social link labels double as keys into the icon map (`GitHub` →
/// `lucide:github`), so they are matched case-sensitively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Link {
    pub href: String,
    pub label: String,
}

impl Link {
    pub fn new(href: &str, label: &str) -> Self {
        Self {
            href: href.to_string(),
            label: label.to_string(),
        }
    }

    /// Whether the link leaves the site (absolute URL or `mailto:`).
    pub fn is_external(&self) -> bool {
        self.href.starts_with("http://")
            || self.href.starts_with("https://")
            || self.href.starts_with("mailto:")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_links_are_internal() {
        assert!(!Link::new("/blog", "blog").is_external());
        assert!(!Link::new("/rss.xml", "RSS").is_external());
    }

    #[test]
    fn absolute_and_mail_links_are_external() {
        assert!(Link::new("https://github.com/someone", "GitHub").is_external());
        assert!(Link::new("mailto:me@example.com", "Email").is_external());
    }
}
