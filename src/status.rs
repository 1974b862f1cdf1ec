//! Live status card backed by the Lanyard presence API.
//!
//! The widget polls `GET {api_base}/v1/users/{id}` on a fixed interval and
//! renders the latest presence snapshot: a status dot, the Discord avatar and
//! name, a one-line subtitle and, while music is playing, the current track.
//!
//! ## Polling
//!
//! [`StatusWidget::mount`] spawns one tokio task that fetches immediately and
//! then once per interval for the widget's lifetime. Each fetch is raced
//! against a [`CancellationToken`]; [`MountedWidget::unmount`] (or dropping
//! the handle) cancels it, so a request still in flight is discarded rather
//! than applied. There is no retry backoff and no error state: a failed poll
//! is logged and the card keeps showing the last good snapshot, or the
//! loading skeleton if nothing has succeeded yet.
//!
//! State is published on a [`tokio::sync::watch`] channel, which holds at
//! most one snapshot and wakes subscribers only when it actually changes.
//!
//! ## Display rules
//!
//! | Field | Source, first available wins |
//! |-------|------------------------------|
//! | Name | `global_name` → `username` → `"User"` |
//! | Subtitle | first non-Spotify activity's `state` → `discord_status` → `"Offline"` |
//! | Avatar | Discord CDN avatar → default embed avatar |
//! | Now playing | shown only when `listening_to_spotify` and `spotify` is present |

use crate::config::StatusSettings;
use async_trait::async_trait;
use maud::{Markup, html};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

const SPOTIFY_ACTIVITY: &str = "Spotify";
const DEFAULT_AVATAR: &str = "https://cdn.discordapp.com/embed/avatars/0.png";

#[derive(Error, Debug)]
pub enum StatusError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("presence API returned no data for user {user_id}{}", fmt_detail(.detail))]
    Unsuccessful {
        user_id: String,
        detail: Option<String>,
    },
}

fn fmt_detail(detail: &Option<String>) -> String {
    detail
        .as_deref()
        .map(|d| format!(": {d}"))
        .unwrap_or_default()
}

// ============================================================================
// Presence snapshot
// ============================================================================

/// Envelope returned by the presence API.
#[derive(Debug, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    #[serde(default)]
    pub data: Option<Presence>,
    #[serde(default)]
    pub error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
pub struct ApiError {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}

/// Point-in-time presence of one Discord user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Presence {
    pub discord_user: DiscordUser,
    #[serde(default)]
    pub discord_status: String,
    #[serde(default)]
    pub listening_to_spotify: bool,
    #[serde(default)]
    pub spotify: Option<Spotify>,
    #[serde(default)]
    pub activities: Vec<Activity>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscordUser {
    #[serde(default)]
    pub username: String,
    /// Avatar hash; absent for users on a default avatar.
    #[serde(default)]
    pub avatar: Option<String>,
    pub id: String,
    #[serde(default)]
    pub discriminator: Option<String>,
    #[serde(default)]
    pub global_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spotify {
    pub track_id: String,
    #[serde(default)]
    pub timestamps: Option<Timestamps>,
    #[serde(default)]
    pub song: String,
    #[serde(default)]
    pub artist: String,
    #[serde(default)]
    pub album_art_url: String,
    #[serde(default)]
    pub album: String,
}

/// Track start/end, milliseconds since the Unix epoch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timestamps {
    pub start: u64,
    pub end: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub name: String,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub assets: Option<ActivityAssets>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityAssets {
    #[serde(default)]
    pub large_image: Option<String>,
    #[serde(default)]
    pub large_text: Option<String>,
}

/// Decode an API body into a presence snapshot.
///
/// `success: false` and a successful envelope without data are both
/// [`StatusError::Unsuccessful`].
pub fn decode_response(body: &str, user_id: &str) -> Result<Presence, StatusError> {
    let response: ApiResponse = serde_json::from_str(body)?;
    match response {
        ApiResponse {
            success: true,
            data: Some(presence),
            ..
        } => Ok(presence),
        ApiResponse { error, .. } => Err(StatusError::Unsuccessful {
            user_id: user_id.to_string(),
            detail: error.map(|e| format!("{} ({})", e.message, e.code)),
        }),
    }
}

// ============================================================================
// Fetching
// ============================================================================

/// Where presence snapshots come from.
#[async_trait]
pub trait PresenceSource: Send + Sync {
    async fn fetch(&self, user_id: &str) -> Result<Presence, StatusError>;
}

/// [`PresenceSource`] over HTTP against a Lanyard-compatible API.
#[derive(Debug, Clone)]
pub struct LanyardClient {
    http: reqwest::Client,
    api_base: String,
}

impl LanyardClient {
    pub fn new(api_base: &str) -> Result<Self, StatusError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("blog-widgets/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
        })
    }

    pub fn user_url(&self, user_id: &str) -> String {
        format!("{}/v1/users/{}", self.api_base, user_id)
    }
}

#[async_trait]
impl PresenceSource for LanyardClient {
    async fn fetch(&self, user_id: &str) -> Result<Presence, StatusError> {
        let url = self.user_url(user_id);
        tracing::debug!(%url, "fetching presence");
        // Lanyard answers unknown users with a JSON error body, so the HTTP
        // status is not checked; the envelope decides.
        let body = self.http.get(&url).send().await?.text().await?;
        decode_response(&body, user_id)
    }
}

// ============================================================================
// Display mapping
// ============================================================================

/// Color of the status dot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusColor {
    Green,
    Yellow,
    Red,
    Gray,
}

impl StatusColor {
    /// `online`, `idle` and `dnd` have colors; anything else, including no
    /// data at all, is gray.
    pub fn for_status(status: Option<&str>) -> Self {
        match status {
            Some("online") => Self::Green,
            Some("idle") => Self::Yellow,
            Some("dnd") => Self::Red,
            _ => Self::Gray,
        }
    }

    pub fn css_class(self) -> &'static str {
        match self {
            Self::Green => "bg-green-500",
            Self::Yellow => "bg-yellow-500",
            Self::Red => "bg-red-500",
            Self::Gray => "bg-gray-500",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Green => "green",
            Self::Yellow => "yellow",
            Self::Red => "red",
            Self::Gray => "gray",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NowPlaying {
    pub title: String,
    pub artist: String,
    pub album_art_url: String,
    pub track_url: String,
}

/// Everything the card shows, derived from an optional snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusView {
    pub color: StatusColor,
    pub display_name: String,
    pub subtitle: String,
    pub avatar_url: String,
    pub now_playing: Option<NowPlaying>,
    /// Whether the view came from real data (the avatar badge is hidden
    /// otherwise).
    pub has_data: bool,
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

impl StatusView {
    pub fn from_presence(presence: Option<&Presence>) -> Self {
        let status = presence.and_then(|p| non_empty(Some(p.discord_status.as_str())));

        let display_name = presence
            .and_then(|p| {
                non_empty(p.discord_user.global_name.as_deref())
                    .or(non_empty(Some(p.discord_user.username.as_str())))
            })
            .unwrap_or("User")
            .to_string();

        let activity_state = presence.and_then(|p| {
            p.activities
                .iter()
                .find(|a| a.name != SPOTIFY_ACTIVITY)
                .and_then(|a| non_empty(a.state.as_deref()))
        });
        let subtitle = activity_state.or(status).unwrap_or("Offline").to_string();

        let avatar_url = presence
            .and_then(|p| {
                non_empty(p.discord_user.avatar.as_deref()).map(|hash| {
                    format!(
                        "https://cdn.discordapp.com/avatars/{}/{}.png?size=128",
                        p.discord_user.id, hash
                    )
                })
            })
            .unwrap_or_else(|| DEFAULT_AVATAR.to_string());

        let now_playing = presence
            .filter(|p| p.listening_to_spotify)
            .and_then(|p| p.spotify.as_ref())
            .map(|s| NowPlaying {
                title: s.song.clone(),
                artist: s.artist.clone(),
                album_art_url: s.album_art_url.clone(),
                track_url: format!("https://open.spotify.com/track/{}", s.track_id),
            });

        Self {
            color: StatusColor::for_status(status),
            display_name,
            subtitle,
            avatar_url,
            now_playing,
            has_data: presence.is_some(),
        }
    }
}

// ============================================================================
// Widget state
// ============================================================================

/// What the card currently holds.
#[derive(Debug, Clone, PartialEq)]
pub struct WidgetState {
    /// True until the first successful poll.
    pub loading: bool,
    pub data: Option<Presence>,
}

impl Default for WidgetState {
    fn default() -> Self {
        Self {
            loading: true,
            data: None,
        }
    }
}

impl WidgetState {
    /// Fold one poll result into the state.
    ///
    /// Success replaces the snapshot wholesale. Failure is logged and leaves
    /// the state untouched. Returns whether anything changed.
    pub fn apply(&mut self, result: Result<Presence, StatusError>) -> bool {
        match result {
            Ok(presence) => {
                let changed = self.loading || self.data.as_ref() != Some(&presence);
                self.loading = false;
                self.data = Some(presence);
                changed
            }
            Err(e) => {
                tracing::warn!("failed to fetch presence: {e}");
                false
            }
        }
    }

    pub fn view(&self) -> StatusView {
        StatusView::from_presence(self.data.as_ref())
    }
}

// ============================================================================
// Lifecycle
// ============================================================================

pub struct StatusWidget;

impl StatusWidget {
    /// Start polling. Must be called inside a tokio runtime.
    pub fn mount(source: Arc<dyn PresenceSource>, settings: &StatusSettings) -> MountedWidget {
        let (tx, rx) = watch::channel(WidgetState::default());
        let cancel = CancellationToken::new();
        let user_id = settings.user_id.clone();
        let interval = settings.poll_interval();

        let handle = {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                tracing::info!(%user_id, ?interval, "status widget polling started");
                let mut ticker = tokio::time::interval(interval);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                loop {
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = ticker.tick() => {}
                    }
                    let result = tokio::select! {
                        _ = cancel.cancelled() => break,
                        result = source.fetch(&user_id) => result,
                    };
                    tx.send_if_modified(|state| state.apply(result));
                }
                tracing::info!(%user_id, "status widget polling stopped");
            })
        };

        MountedWidget {
            state: rx,
            cancel,
            handle: Some(handle),
        }
    }
}

/// A polling widget. Dropping it stops the poll loop.
pub struct MountedWidget {
    state: watch::Receiver<WidgetState>,
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl MountedWidget {
    /// Snapshot of the current state.
    pub fn current(&self) -> WidgetState {
        self.state.borrow().clone()
    }

    /// A receiver that wakes whenever the state changes.
    pub fn subscribe(&self) -> watch::Receiver<WidgetState> {
        self.state.clone()
    }

    pub fn render(&self) -> Markup {
        render_status_card(&self.state.borrow())
    }

    /// Stop polling and wait for the poll task to finish. A fetch in flight
    /// is dropped without touching the state.
    pub async fn unmount(mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                tracing::warn!("status widget task ended abnormally: {e}");
            }
        }
    }
}

impl Drop for MountedWidget {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

// ============================================================================
// Rendering
// ============================================================================

/// Render the status card for a state: a pulsing skeleton while loading,
/// the card otherwise.
pub fn render_status_card(state: &WidgetState) -> Markup {
    if state.loading {
        return render_skeleton();
    }
    render_view(&state.view())
}

fn render_skeleton() -> Markup {
    html! {
        div.status-card.status-skeleton aria-busy="true" {
            div.skeleton-line.skeleton-title {}
            div.skeleton-row {
                div.skeleton-avatar {}
                div.skeleton-lines {
                    div.skeleton-line.skeleton-short {}
                    div.skeleton-line.skeleton-long {}
                }
            }
        }
    }
}

/// Render the card for a resolved view.
pub fn render_view(view: &StatusView) -> Markup {
    let color = view.color.css_class();
    let badge = if view.has_data { color } else { "hidden" };
    // no presence yet: a lighter header dot
    let dot = if view.has_data { color } else { "bg-gray-400" };

    html! {
        div.status-card {
            h3.status-heading {
                "Live Status"
                span class={ "status-dot " (dot) } data-status=(view.color.name()) {}
            }
            div.status-body {
                div.status-user {
                    div.status-avatar {
                        img src=(view.avatar_url) alt="Discord Avatar";
                        div class={ "status-badge " (badge) } {}
                    }
                    div.status-text {
                        span.status-name { (view.display_name) }
                        span.status-subtitle { (view.subtitle) }
                    }
                }
                @if let Some(track) = &view.now_playing {
                    div.now-playing {
                        div.album-art {
                            img.spin-slow src=(track.album_art_url) alt="Album Art"
                                style="animation-duration: 10s";
                        }
                        div.track-text {
                            a.track-title href=(track.track_url) target="_blank" rel="noopener noreferrer" {
                                (track.title)
                            }
                            span.track-artist { "by " (track.artist) }
                        }
                    }
                }
            }
        }
    }
}
