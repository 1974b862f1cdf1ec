//! Page assembly.
//!
//! Wraps the widgets in a minimal page: document head with the embedded
//! stylesheet, a header with the site navigation, the article column (behind
//! the password gate when one is set), the status card in a side column, the
//! zoom overlay when open, and a footer with the social links.
//!
//! Uses [maud](https://maud.lambda.xyz/) like the widget renderers, so every
//! interpolated value is escaped. Article HTML is the one exception: it comes
//! from the site's own markdown and is inserted pre-escaped.

use crate::config::{CommentConfig, SiteConfig};
use crate::document::Article;
use crate::gate::PasswordGate;
use crate::status::{WidgetState, render_status_card};
use crate::types::Link;
use crate::zoom::ImageZoom;
use maud::{DOCTYPE, Markup, PreEscaped, html};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

const CSS: &str = include_str!("../static/widgets.css");

/// Everything an article page shows.
pub struct ArticlePage<'a> {
    pub title: &'a str,
    /// Path of the page, used to highlight the current nav entry.
    pub path: &'a str,
    pub article: &'a Article,
    pub gate: Option<&'a PasswordGate>,
    pub zoom: &'a ImageZoom,
    pub status: &'a WidgetState,
}

/// Renders the base HTML document structure
fn base_document(config: &SiteConfig, title: &str, content: Markup) -> Markup {
    let full_title = if title.is_empty() {
        config.site.title.clone()
    } else {
        format!("{} | {}", title, config.site.title)
    };

    html! {
        (DOCTYPE)
        html lang=(config.site.locale) {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                meta name="description" content=(config.site.description);
                meta name="author" content=(config.site.author);
                link rel="canonical" href=(config.site.href);
                title { (full_title) }
                style { (PreEscaped(CSS)) }
            }
            body {
                (content)
            }
        }
    }
}

/// Renders the header navigation.
pub fn render_nav(items: &[Link], current_path: &str) -> Markup {
    html! {
        ul {
            @for item in items {
                @let is_current = current_path == item.href
                    || current_path.starts_with(&format!("{}/", item.href));
                li class=[is_current.then_some("current")] {
                    a href=(item.href) { (item.label) }
                }
            }
        }
    }
}

fn site_header(config: &SiteConfig, current_path: &str) -> Markup {
    html! {
        header.site-header {
            a.site-title href="/" { (config.site.title) }
            nav.site-nav {
                (render_nav(&config.nav, current_path))
            }
        }
    }
}

/// Renders the footer social links with their icon keys.
pub fn render_social_links(config: &SiteConfig) -> Markup {
    html! {
        ul.social-links {
            @for link in &config.social {
                li {
                    @if link.is_external() {
                        a href=(link.href) target="_blank" rel="noopener" aria-label=(link.label)
                            data-icon=[config.icon_for(&link.label)] {
                            (link.label)
                        }
                    } @else {
                        a href=(link.href) aria-label=(link.label)
                            data-icon=[config.icon_for(&link.label)] {
                            (link.label)
                        }
                    }
                }
            }
        }
    }
}

fn site_footer(config: &SiteConfig) -> Markup {
    html! {
        footer.site-footer {
            span { "© " (config.site.author) }
            (render_social_links(config))
        }
    }
}

/// Mount point for the comment widget, carrying its repository ids.
pub fn render_comment_mount(comment: &CommentConfig) -> Markup {
    html! {
        section.comments
            data-repo=(comment.repo)
            data-repo-id=(comment.repo_id)
            data-category=(comment.category)
            data-category-id=(comment.category_id) {}
    }
}

/// Renders a full article page.
pub fn render_article_page(config: &SiteConfig, page: &ArticlePage) -> Markup {
    let article = html! {
        article.prose {
            (PreEscaped(page.article.html()))
        }
        (render_comment_mount(&config.comment))
    };
    let body = match page.gate {
        Some(gate) => gate.render(article),
        None => article,
    };
    // Images behind a locked gate are not on the page, so neither is their overlay.
    let shows_article = page.gate.is_none_or(PasswordGate::is_unlocked);

    let content = html! {
        (site_header(config, page.path))
        main.article-page {
            div.article-column { (body) }
            aside.status-column { (render_status_card(page.status)) }
        }
        (site_footer(config))
        @if shows_article {
            @if let Some(overlay) = page.zoom.render() {
                (overlay)
            }
        }
    };

    base_document(config, page.title, content)
}

/// Write rendered markup to `path`, creating parent directories.
pub fn write_page(path: &Path, markup: Markup) -> Result<(), RenderError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, markup.into_string())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::gate::MemorySessionStore;
    use std::time::Instant;
    use tempfile::TempDir;

    const MARKDOWN: &str = "# Hello\n\nSome **text**.\n\n![Chart](/img/chart.png)\n";

    fn page<'a>(
        article: &'a Article,
        gate: Option<&'a PasswordGate>,
        zoom: &'a ImageZoom,
        status: &'a WidgetState,
    ) -> ArticlePage<'a> {
        ArticlePage {
            title: "Hello",
            path: "/blog/hello",
            article,
            gate,
            zoom,
            status,
        }
    }

    #[test]
    fn nav_marks_current_section() {
        let config = SiteConfig::default();
        let html = render_nav(&config.nav, "/blog/hello").into_string();
        assert!(html.contains(r#"<li class="current"><a href="/blog">blog</a></li>"#));
        assert!(html.contains(r#"<li><a href="/tags">tags</a></li>"#));
    }

    #[test]
    fn social_links_carry_icons() {
        let html = render_social_links(&SiteConfig::default()).into_string();
        assert!(html.contains(r#"data-icon="lucide:github""#));
        assert!(html.contains(r#"href="mailto:nviettin48@gmail.com""#));
        // internal links open in place
        assert!(html.contains(r#"<a href="/rss.xml" aria-label="RSS" data-icon="lucide:rss">"#));
    }

    #[test]
    fn comment_mount_has_ids() {
        let html = render_comment_mount(&CommentConfig::default()).into_string();
        assert!(html.contains(r#"data-repo-id="R_kgDORCN8oQ""#));
        assert!(html.contains(r#"data-category-id="DIC_kwDORCN8oc4C1e84""#));
    }

    #[test]
    fn open_article_page() {
        let config = SiteConfig::default();
        let article = Article::from_markdown(MARKDOWN);
        let zoom = ImageZoom::new();
        let status = WidgetState::default();
        let html = render_article_page(&config, &page(&article, None, &zoom, &status))
            .into_string();

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>Hello | 0xGunn</title>"));
        assert!(html.contains(r#"<article class="prose">"#));
        assert!(html.contains("<strong>text</strong>"));
        assert!(html.contains(r#"aria-busy="true""#));
        assert!(!html.contains("Image zoom modal"));
        assert!(!html.contains("Password Protected"));
    }

    #[test]
    fn locked_article_page_hides_content() {
        let config = SiteConfig::default();
        let article = Article::from_markdown(MARKDOWN);
        let zoom = ImageZoom::new();
        let status = WidgetState::default();
        let mut gate = PasswordGate::new("secret", "hello");
        gate.mount(&MemorySessionStore::new());

        let html = render_article_page(&config, &page(&article, Some(&gate), &zoom, &status))
            .into_string();
        assert!(html.contains("Password Protected"));
        assert!(!html.contains("<strong>text</strong>"));
        assert!(!html.contains("data-repo-id"));
    }

    #[test]
    fn page_includes_open_overlay() {
        let config = SiteConfig::default();
        let mut doc = Document::from_article_markdown(MARKDOWN);
        let mut zoom = ImageZoom::new();
        let t0 = Instant::now();
        zoom.mount(&mut doc, t0);
        zoom.advance(&mut doc, t0 + crate::zoom::DISCOVERY_DELAY);
        zoom.click_image(&mut doc, 0);

        let status = WidgetState::default();
        let article = doc.article().unwrap();
        let html = render_article_page(&config, &page(article, None, &zoom, &status))
            .into_string();
        assert!(html.contains(r#"aria-label="Image zoom modal""#));
        assert!(html.contains(r#"alt="Chart""#));
    }

    #[test]
    fn locked_page_omits_open_overlay() {
        let config = SiteConfig::default();
        let mut doc = Document::from_article_markdown("![Secret](/img/secret.png)\n");
        let mut zoom = ImageZoom::new();
        let t0 = Instant::now();
        zoom.mount(&mut doc, t0);
        zoom.advance(&mut doc, t0 + crate::zoom::DISCOVERY_DELAY);
        zoom.click_image(&mut doc, 0);
        assert!(zoom.is_open());

        let mut gate = PasswordGate::new("secret", "hidden");
        gate.mount(&MemorySessionStore::new());
        let status = WidgetState::default();
        let article = doc.article().unwrap();
        let html = render_article_page(&config, &page(article, Some(&gate), &zoom, &status))
            .into_string();
        assert!(html.contains("Password Protected"));
        assert!(!html.contains("/img/secret.png"));
        assert!(!html.contains("Image zoom modal"));
    }

    #[test]
    fn write_page_creates_parents() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("out/hello/index.html");
        write_page(&path, html! { p { "hi" } }).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "<p>hi</p>");
    }
}
