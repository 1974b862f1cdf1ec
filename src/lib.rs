//! # Blog Widgets
//!
//! The interactive pieces of a personal blog, modelled as small state
//! machines with Maud renderers: a password gate for protected articles, a
//! click-to-zoom overlay for article images, and a live status card that
//! polls a Discord presence API.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`config`] | `config.toml` loading over stock defaults: site metadata, links, icons, comment ids, status settings |
//! | [`types`] | Shared types (`Link`) |
//! | [`gate`] | Password gate and the session store holding unlock flags |
//! | [`document`] | In-memory page model: article images, document listeners, body style |
//! | [`zoom`] | Image discovery and the zoom overlay |
//! | [`status`] | Presence API client, polling lifecycle, status card |
//! | [`render`] | Page assembly around the widgets |
//! | [`output`] | CLI text output |
//!
//! # Design Decisions
//!
//! ## Widgets as State Machines
//!
//! Each widget owns its state exclusively and exposes its lifecycle as
//! methods: `mount`, event handlers, `unmount`. Browser facilities are
//! explicit parameters (a [`gate::SessionStore`], a [`document::Document`],
//! a [`status::PresenceSource`]) so tests drive them without a browser.
//!
//! ## Subscribe/Unsubscribe Pairs
//!
//! Every listener a widget registers returns a [`document::ListenerId`] that
//! the widget keeps and removes on unmount or before re-registering. There is
//! no global listener registry.
//!
//! ## Polling, Not Push
//!
//! The status card polls on a fixed interval instead of holding a socket
//! open. Failures are logged and otherwise ignored; the card keeps the last
//! good snapshot. Polling is tied to the widget's lifetime through a
//! cancellation token, so unmounting also discards a request in flight.

pub mod config;
pub mod document;
pub mod gate;
pub mod output;
pub mod render;
pub mod status;
pub mod types;
pub mod zoom;
