//! In-memory page model for the image zoom widget.
//!
//! Stands in for the parts of the browser DOM the widgets touch: the
//! `article.prose` element and the images inside it, document-level event
//! listeners, and the body's `overflow` style. Listener registration is an
//! explicit subscribe/unsubscribe pair returning a [`ListenerId`], so a
//! widget can always remove exactly what it attached.
//!
//! Article content comes from markdown rendered with `pulldown-cmark`; every
//! markdown image becomes an [`ImageElement`] in document order.

use pulldown_cmark::{Event, Parser, Tag, TagEnd, html as md_html};
use std::collections::BTreeMap;

/// Handle for a registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(u64);

/// Document-level events a widget can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentEvent {
    /// Fired after a client-side page transition has swapped the content.
    PageLoad,
    KeyDown,
}

/// An `<img>` inside the article body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageElement {
    pub src: String,
    /// `None` when the image has no alt text at all.
    pub alt: Option<String>,
    /// Inline `cursor` style.
    pub cursor: Option<&'static str>,
    click_listeners: Vec<ListenerId>,
}

impl ImageElement {
    pub fn new(src: impl Into<String>, alt: Option<String>) -> Self {
        Self {
            src: src.into(),
            alt,
            cursor: None,
            click_listeners: Vec::new(),
        }
    }

    pub fn click_listeners(&self) -> &[ListenerId] {
        &self.click_listeners
    }
}

/// The `article.prose` element.
#[derive(Debug, Clone, Default)]
pub struct Article {
    html: String,
    images: Vec<ImageElement>,
}

impl Article {
    /// Render markdown and collect its images.
    pub fn from_markdown(markdown: &str) -> Self {
        let mut images = Vec::new();
        let mut pending: Option<(String, String)> = None;

        for event in Parser::new(markdown) {
            match event {
                Event::Start(Tag::Image { dest_url, .. }) => {
                    pending = Some((dest_url.to_string(), String::new()));
                }
                Event::Text(text) | Event::Code(text) => {
                    if let Some((_, alt)) = pending.as_mut() {
                        alt.push_str(&text);
                    }
                }
                Event::End(TagEnd::Image) => {
                    if let Some((src, alt)) = pending.take() {
                        let alt = (!alt.is_empty()).then_some(alt);
                        images.push(ImageElement::new(src, alt));
                    }
                }
                _ => {}
            }
        }

        let mut html = String::new();
        md_html::push_html(&mut html, Parser::new(markdown));
        Self { html, images }
    }

    pub fn html(&self) -> &str {
        &self.html
    }

    pub fn images(&self) -> &[ImageElement] {
        &self.images
    }
}

/// The page a widget is mounted on.
#[derive(Debug, Default)]
pub struct Document {
    article: Option<Article>,
    listeners: BTreeMap<ListenerId, DocumentEvent>,
    body_overflow: String,
    next_id: u64,
}

impl Document {
    /// A page with no article element.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_article_markdown(markdown: &str) -> Self {
        Self {
            article: Some(Article::from_markdown(markdown)),
            ..Self::default()
        }
    }

    /// Client-side page transition: swap the article and report the
    /// `PageLoad` listeners that fire.
    pub fn navigate(&mut self, markdown: Option<&str>) -> Vec<ListenerId> {
        self.article = markdown.map(Article::from_markdown);
        self.listeners_for(DocumentEvent::PageLoad)
    }

    pub fn article(&self) -> Option<&Article> {
        self.article.as_ref()
    }

    /// All images inside the article, or none when there is no article.
    pub fn article_images(&self) -> &[ImageElement] {
        self.article.as_ref().map(|a| a.images()).unwrap_or_default()
    }

    fn next_listener_id(&mut self) -> ListenerId {
        self.next_id += 1;
        ListenerId(self.next_id)
    }

    pub fn add_listener(&mut self, event: DocumentEvent) -> ListenerId {
        let id = self.next_listener_id();
        self.listeners.insert(id, event);
        id
    }

    pub fn remove_listener(&mut self, id: ListenerId) {
        self.listeners.remove(&id);
    }

    pub fn is_listening(&self, id: ListenerId) -> bool {
        self.listeners.contains_key(&id)
    }

    pub fn listeners_for(&self, event: DocumentEvent) -> Vec<ListenerId> {
        self.listeners
            .iter()
            .filter(|(_, e)| **e == event)
            .map(|(id, _)| *id)
            .collect()
    }

    /// Attach a click listener to the article image at `index`.
    ///
    /// Returns `None` if there is no such image.
    pub fn add_image_listener(&mut self, index: usize) -> Option<ListenerId> {
        let id = self.next_listener_id();
        let image = self.article.as_mut()?.images.get_mut(index)?;
        image.click_listeners.push(id);
        Some(id)
    }

    /// Detach a click listener from whichever image holds it. Images that
    /// were swapped out by navigation are simply gone.
    pub fn remove_image_listener(&mut self, id: ListenerId) {
        if let Some(article) = self.article.as_mut() {
            for image in &mut article.images {
                image.click_listeners.retain(|l| *l != id);
            }
        }
    }

    pub fn set_image_cursor(&mut self, index: usize, cursor: &'static str) {
        if let Some(image) = self
            .article
            .as_mut()
            .and_then(|a| a.images.get_mut(index))
        {
            image.cursor = Some(cursor);
        }
    }

    pub fn body_overflow(&self) -> &str {
        &self.body_overflow
    }

    pub fn set_body_overflow(&mut self, value: &str) {
        self.body_overflow = value.to_string();
    }
}
