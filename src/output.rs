//! CLI output formatting.
//!
//! Each command has a `format_*` function that returns `Vec<String>` for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.
//!
//! ## Status
//!
//! ```text
//! ● red  Some One
//!     Coding
//!     Avatar: https://cdn.discordapp.com/avatars/42/abc.png?size=128
//!     Playing: Song by Artist
//!         https://open.spotify.com/track/t1
//! ```
//!
//! ## Article
//!
//! ```text
//! Article my-post (locked)
//! Images
//! 001 Sunset over water
//!     Source: /img/sunset.jpg
//! 002 (/img/plain.jpg)
//! Wrote dist/my-post/index.html
//! ```

use crate::config::SiteConfig;
use crate::document::ImageElement;
use crate::status::{StatusView, WidgetState};

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Format an image line: images with alt text show it, others show the
/// source in parens.
fn image_line(index: usize, image: &ImageElement) -> String {
    match image.alt.as_deref() {
        Some(alt) if !alt.is_empty() => format!("{} {}", format_index(index), alt),
        _ => format!("{} ({})", format_index(index), image.src),
    }
}

// ============================================================================
// Status
// ============================================================================

/// Format a status view as a short text card.
pub fn format_status_view(view: &StatusView) -> Vec<String> {
    let mut lines = vec![
        format!("● {}  {}", view.color.name(), view.display_name),
        format!("{}{}", indent(1), view.subtitle),
        format!("{}Avatar: {}", indent(1), view.avatar_url),
    ];
    if let Some(track) = &view.now_playing {
        lines.push(format!(
            "{}Playing: {} by {}",
            indent(1),
            track.title,
            track.artist
        ));
        lines.push(format!("{}{}", indent(2), track.track_url));
    }
    lines
}

/// Format widget state: a loading marker until the first snapshot arrives.
pub fn format_status(state: &WidgetState) -> Vec<String> {
    if state.loading {
        return vec!["… loading".to_string()];
    }
    format_status_view(&state.view())
}

pub fn print_status(state: &WidgetState) {
    for line in format_status(state) {
        println!("{}", line);
    }
}

// ============================================================================
// Article
// ============================================================================

/// Format the article command's summary.
pub fn format_article_output(post_id: &str, locked: bool, images: &[ImageElement]) -> Vec<String> {
    let mut lines = Vec::new();
    if locked {
        lines.push(format!("Article {} (locked)", post_id));
    } else {
        lines.push(format!("Article {}", post_id));
    }

    if images.is_empty() {
        lines.push("No images".to_string());
        return lines;
    }

    lines.push("Images".to_string());
    for (i, image) in images.iter().enumerate() {
        lines.push(image_line(i + 1, image));
        if image.alt.as_deref().is_some_and(|a| !a.is_empty()) {
            lines.push(format!("{}Source: {}", indent(1), image.src));
        }
    }
    lines
}

pub fn print_article_output(post_id: &str, locked: bool, images: &[ImageElement]) {
    for line in format_article_output(post_id, locked, images) {
        println!("{}", line);
    }
}

// ============================================================================
// Config check
// ============================================================================

/// Format a validated config summary.
pub fn format_config_summary(config: &SiteConfig) -> Vec<String> {
    let mut lines = vec![format!("Site {} ({})", config.site.title, config.site.href)];

    lines.push("Navigation".to_string());
    for (i, link) in config.nav.iter().enumerate() {
        lines.push(format!("{} {} → {}", format_index(i + 1), link.label, link.href));
    }

    lines.push("Social".to_string());
    for (i, link) in config.social.iter().enumerate() {
        lines.push(format!("{} {} → {}", format_index(i + 1), link.label, link.href));
        if let Some(icon) = config.icon_for(&link.label) {
            lines.push(format!("{}Icon: {}", indent(1), icon));
        }
    }

    lines.push("Comments".to_string());
    lines.push(format!(
        "{}{} / {}",
        indent(1),
        config.comment.repo,
        config.comment.category
    ));

    lines.push("Status".to_string());
    lines.push(format!("{}{}", indent(1), config.status.user_url()));
    lines.push(format!(
        "{}every {}s",
        indent(1),
        config.status.poll_interval_secs
    ));
    lines
}

pub fn print_config_summary(config: &SiteConfig) {
    for line in format_config_summary(config) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Article;
    use crate::status::{NowPlaying, StatusColor};

    #[test]
    fn format_index_pads() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(42), "042");
    }

    #[test]
    fn status_view_lines() {
        let view = StatusView {
            color: StatusColor::Red,
            display_name: "x".to_string(),
            subtitle: "Coding".to_string(),
            avatar_url: "https://cdn/a.png".to_string(),
            now_playing: Some(NowPlaying {
                title: "Song".to_string(),
                artist: "Artist".to_string(),
                album_art_url: "https://art".to_string(),
                track_url: "https://open.spotify.com/track/t1".to_string(),
            }),
            has_data: true,
        };
        let lines = format_status_view(&view);
        assert_eq!(lines[0], "● red  x");
        assert_eq!(lines[1], "    Coding");
        assert_eq!(lines[3], "    Playing: Song by Artist");
        assert_eq!(lines[4], "        https://open.spotify.com/track/t1");
    }

    #[test]
    fn loading_state_line() {
        assert_eq!(format_status(&WidgetState::default()), vec!["… loading"]);
    }

    #[test]
    fn article_output_lists_images() {
        let article = Article::from_markdown("![Sunset](/a.jpg)\n\n![](/b.jpg)\n");
        let lines = format_article_output("my-post", true, article.images());
        assert_eq!(
            lines,
            vec![
                "Article my-post (locked)",
                "Images",
                "001 Sunset",
                "    Source: /a.jpg",
                "002 (/b.jpg)",
            ]
        );
    }

    #[test]
    fn article_output_without_images() {
        let lines = format_article_output("p", false, &[]);
        assert_eq!(lines, vec!["Article p", "No images"]);
    }

    #[test]
    fn config_summary_sections() {
        let lines = format_config_summary(&SiteConfig::default());
        assert_eq!(lines[0], "Site 0xGunn (https://0xGunn.vercel.app)");
        assert!(lines.contains(&"001 blog → /blog".to_string()));
        assert!(lines.contains(&"    Icon: lucide:github".to_string()));
        assert!(lines.contains(&"    https://api.lanyard.rest/v1/users/1234773099476422682".to_string()));
        assert!(lines.contains(&"    every 10s".to_string()));
    }
}
