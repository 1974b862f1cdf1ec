//! Click-to-zoom overlay for article images.
//!
//! On mount the widget subscribes to page transitions and schedules an image
//! discovery pass [`DISCOVERY_DELAY`] later, giving content rendering time to
//! settle. The delay is a heuristic, not a synchronization point; a page
//! transition ([`DocumentEvent::PageLoad`]) is the explicit "content ready"
//! signal and schedules another pass.
//!
//! A discovery pass first detaches the click handlers from the previous pass,
//! then marks every article image with `cursor: pointer` and attaches a fresh
//! handler. Clicking a handled image opens the overlay; a second click on
//! another image replaces the shown source and alt text in place.
//!
//! While the overlay is open the body's scroll is suppressed and a `keydown`
//! listener is registered; both are undone on close. The overlay closes on
//! Escape, on the close button, and on a click that lands exactly on the
//! backdrop (a click on the enlarged image itself does not bubble to it).

use crate::document::{Document, DocumentEvent, ListenerId};
use maud::{Markup, PreEscaped, html};
use std::time::{Duration, Instant};

/// Wait before scanning for images after mount or navigation.
pub const DISCOVERY_DELAY: Duration = Duration::from_millis(100);

/// What a click inside the overlay landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickTarget {
    Backdrop,
    Image,
}

/// The image currently shown in the overlay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayImage {
    pub src: String,
    pub alt: String,
}

#[derive(Debug, Default)]
pub struct ImageZoom {
    page_load: Option<ListenerId>,
    key_down: Option<ListenerId>,
    image_handlers: Vec<ListenerId>,
    pending: Vec<Instant>,
    overlay: Option<OverlayImage>,
    class_name: String,
}

impl ImageZoom {
    pub fn new() -> Self {
        Self::default()
    }

    /// Extra classes appended to the overlay element.
    pub fn with_class(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = class_name.into();
        self
    }

    /// Subscribe to page transitions and schedule the first discovery pass.
    pub fn mount(&mut self, doc: &mut Document, now: Instant) {
        if self.page_load.is_some() {
            return;
        }
        self.page_load = Some(doc.add_listener(DocumentEvent::PageLoad));
        self.schedule(now);
    }

    pub fn is_mounted(&self) -> bool {
        self.page_load.is_some()
    }

    fn schedule(&mut self, now: Instant) {
        self.pending.push(now + DISCOVERY_DELAY);
    }

    /// Deadline of the earliest scheduled discovery pass.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.iter().min().copied()
    }

    /// Forward the listeners fired by [`Document::navigate`].
    pub fn on_page_load(&mut self, doc: &Document, fired: &[ListenerId], now: Instant) {
        match self.page_load {
            Some(id) if fired.contains(&id) && doc.is_listening(id) => self.schedule(now),
            _ => {}
        }
    }

    /// Run every discovery pass whose deadline is at or before `now`.
    ///
    /// Returns the number of images handled by the last pass that ran.
    pub fn advance(&mut self, doc: &mut Document, now: Instant) -> Option<usize> {
        let due = self.pending.iter().filter(|d| **d <= now).count();
        if due == 0 {
            return None;
        }
        self.pending.retain(|d| *d > now);
        let mut found = 0;
        for _ in 0..due {
            found = self.discover(doc);
        }
        Some(found)
    }

    fn discover(&mut self, doc: &mut Document) -> usize {
        self.detach_images(doc);

        let count = doc.article_images().len();
        for index in 0..count {
            doc.set_image_cursor(index, "pointer");
            if let Some(id) = doc.add_image_listener(index) {
                self.image_handlers.push(id);
            }
        }
        tracing::debug!(images = count, "image zoom discovery pass");
        count
    }

    fn detach_images(&mut self, doc: &mut Document) {
        for id in self.image_handlers.drain(..) {
            doc.remove_image_listener(id);
        }
    }

    /// Click on the article image at `index`.
    ///
    /// Ignored unless this widget's handler is attached to that image.
    pub fn click_image(&mut self, doc: &mut Document, index: usize) {
        let Some(image) = doc.article_images().get(index) else {
            return;
        };
        let handled = image
            .click_listeners()
            .iter()
            .any(|id| self.image_handlers.contains(id));
        if !handled {
            return;
        }

        let overlay = OverlayImage {
            src: image.src.clone(),
            alt: image.alt.clone().unwrap_or_default(),
        };
        let was_open = self.overlay.is_some();
        self.overlay = Some(overlay);
        if !was_open {
            self.on_open(doc);
        }
    }

    /// Click the `n`th article image, counting from 1 as listings do.
    /// There is no image 0.
    pub fn click_nth_image(&mut self, doc: &mut Document, n: usize) {
        if let Some(index) = n.checked_sub(1) {
            self.click_image(doc, index);
        }
    }

    fn on_open(&mut self, doc: &mut Document) {
        doc.set_body_overflow("hidden");
        self.key_down = Some(doc.add_listener(DocumentEvent::KeyDown));
    }

    /// Keyboard input while the overlay listens for it.
    pub fn key_down(&mut self, doc: &mut Document, key: &str) {
        let listening = self.key_down.is_some_and(|id| doc.is_listening(id));
        if listening && key == "Escape" {
            self.close(doc);
        }
    }

    /// Click on the overlay surface.
    pub fn click_backdrop(&mut self, doc: &mut Document, target: ClickTarget) {
        if target == ClickTarget::Backdrop {
            self.close(doc);
        }
    }

    /// Dismiss the overlay. No-op when closed.
    pub fn close(&mut self, doc: &mut Document) {
        if self.overlay.take().is_none() {
            return;
        }
        doc.set_body_overflow("");
        if let Some(id) = self.key_down.take() {
            doc.remove_listener(id);
        }
    }

    pub fn is_open(&self) -> bool {
        self.overlay.is_some()
    }

    pub fn overlay(&self) -> Option<&OverlayImage> {
        self.overlay.as_ref()
    }

    /// Remove everything this widget attached to the document.
    pub fn unmount(&mut self, doc: &mut Document) {
        self.close(doc);
        self.detach_images(doc);
        if let Some(id) = self.page_load.take() {
            doc.remove_listener(id);
        }
        self.pending.clear();
    }

    /// Overlay markup, or `None` while closed.
    pub fn render(&self) -> Option<Markup> {
        let image = self.overlay.as_ref()?;
        let class = if self.class_name.is_empty() {
            "zoom-overlay".to_string()
        } else {
            format!("zoom-overlay {}", self.class_name)
        };

        Some(html! {
            div class=(class) role="dialog" aria-modal="true" aria-label="Image zoom modal" {
                button.zoom-close type="button" aria-label="Close image zoom" {
                    (PreEscaped(CLOSE_ICON))
                }
                div.zoom-frame style="max-height: 90vh; max-width: 90vw" {
                    img src=(image.src) alt=(image.alt)
                        style="max-height: 90vh; max-width: 90vw; object-fit: contain";
                }
            }
        })
    }
}

const CLOSE_ICON: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" width="24" height="24" viewBox="0 0 24 24" fill="none" stroke="currentColor" stroke-width="2" stroke-linecap="round" stroke-linejoin="round"><line x1="18" y1="6" x2="6" y2="18"/><line x1="6" y1="6" x2="18" y2="18"/></svg>"#;
