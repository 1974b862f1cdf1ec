//! Password gate for protected articles.
//!
//! A client-side boolean gate in front of arbitrary article markup. The
//! visitor types a password; an exact, case-sensitive match against the
//! configured one unlocks the article and records an unlock flag in session
//! storage under `post-unlocked-{post_id}`. Remounting the gate later in the
//! same session reads the flag and renders the article straight away.
//!
//! This deters casual readers only. The password ships with the page and the
//! comparison happens on the visitor's device.
//!
//! ```text
//! mount ──flag set──────────────────────────► Unlocked
//!   │
//!   └─► Locked ──submit(match)──► Unlocked (flag written)
//!         ▲  │
//!         └──┘ submit(mismatch): error shown, input cleared
//! ```

use maud::{Markup, PreEscaped, html};
use std::collections::HashMap;

/// Message shown after a wrong password.
pub const INCORRECT_PASSWORD: &str = "Incorrect password. Please try again.";

const STORAGE_PREFIX: &str = "post-unlocked-";

/// Session-scoped key/value storage, as `sessionStorage` provides.
pub trait SessionStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str);
}

/// In-memory [`SessionStore`]. Lives as long as the "browsing session" that
/// owns it.
#[derive(Debug, Default, Clone)]
pub struct MemorySessionStore {
    entries: HashMap<String, String>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
    }
}

/// Session storage key for an article's unlock flag.
pub fn storage_key(post_id: &str) -> String {
    format!("{STORAGE_PREFIX}{post_id}")
}

/// Gate state for one protected article.
#[derive(Debug, Clone)]
pub struct PasswordGate {
    password: String,
    post_id: String,
    input: String,
    unlocked: bool,
    error: Option<&'static str>,
    show_password: bool,
}

impl PasswordGate {
    pub fn new(password: impl Into<String>, post_id: impl Into<String>) -> Self {
        Self {
            password: password.into(),
            post_id: post_id.into(),
            input: String::new(),
            unlocked: false,
            error: None,
            show_password: false,
        }
    }

    pub fn post_id(&self) -> &str {
        &self.post_id
    }

    pub fn storage_key(&self) -> String {
        storage_key(&self.post_id)
    }

    /// Read the unlock flag left by an earlier visit this session.
    pub fn mount(&mut self, store: &dyn SessionStore) {
        if store.get(&self.storage_key()).as_deref() == Some("true") {
            tracing::debug!(post_id = %self.post_id, "article already unlocked this session");
            self.unlocked = true;
        }
    }

    /// Replace the typed input. Typing clears a previous error.
    pub fn set_input(&mut self, value: impl Into<String>) {
        self.input = value.into();
        self.error = None;
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    /// Flip between a masked and a plain-text password field.
    pub fn toggle_visibility(&mut self) {
        self.show_password = !self.show_password;
    }

    pub fn is_password_visible(&self) -> bool {
        self.show_password
    }

    /// Compare the typed input with the configured password.
    ///
    /// Returns whether the gate is unlocked afterwards. There is no attempt
    /// counting; a visitor may retry indefinitely.
    pub fn submit(&mut self, store: &mut dyn SessionStore) -> bool {
        if self.input == self.password {
            self.unlocked = true;
            store.set(&self.storage_key(), "true");
            self.error = None;
            tracing::debug!(post_id = %self.post_id, "article unlocked");
        } else {
            self.error = Some(INCORRECT_PASSWORD);
            self.input.clear();
        }
        self.unlocked
    }

    pub fn is_unlocked(&self) -> bool {
        self.unlocked
    }

    pub fn error(&self) -> Option<&str> {
        self.error
    }

    /// Render the protected content when unlocked, or the unlock form.
    pub fn render(&self, children: Markup) -> Markup {
        if self.unlocked {
            return children;
        }
        self.render_form()
    }

    fn render_form(&self) -> Markup {
        let input_type = if self.show_password { "text" } else { "password" };
        let toggle_label = if self.show_password {
            "Hide password"
        } else {
            "Show password"
        };

        html! {
            div.password-gate data-post-id=(self.post_id) {
                div.gate-card {
                    div.gate-heading {
                        div.gate-icon { (PreEscaped(LOCK_ICON)) }
                        h2 { "Password Protected" }
                        p.gate-hint {
                            "This article is password protected. Please enter the password to continue."
                        }
                    }
                    form.gate-form method="post" {
                        div.gate-field {
                            input type=(input_type) name="password" value=(self.input)
                                placeholder="Enter password" autofocus;
                            button.gate-toggle type="button" aria-label=(toggle_label) {
                                (PreEscaped(if self.show_password { EYE_OFF_ICON } else { EYE_ICON }))
                            }
                        }
                        @if let Some(error) = self.error {
                            div.gate-error role="alert" {
                                span { (error) }
                            }
                        }
                        button.gate-submit type="submit" { "Unlock Article" }
                    }
                    p.gate-note {
                        "Your password will be remembered for this browser session"
                    }
                }
            }
        }
    }
}

const LOCK_ICON: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" width="32" height="32" viewBox="0 0 24 24" fill="none" stroke="currentColor" stroke-width="2" stroke-linecap="round" stroke-linejoin="round"><rect width="18" height="11" x="3" y="11" rx="2" ry="2"/><path d="M7 11V7a5 5 0 0 1 10 0v4"/></svg>"#;
const EYE_ICON: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" width="16" height="16" viewBox="0 0 24 24" fill="none" stroke="currentColor" stroke-width="2" stroke-linecap="round" stroke-linejoin="round"><path d="M2 12s3-7 10-7 10 7 10 7-3 7-10 7-10-7-10-7Z"/><circle cx="12" cy="12" r="3"/></svg>"#;
const EYE_OFF_ICON: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" width="16" height="16" viewBox="0 0 24 24" fill="none" stroke="currentColor" stroke-width="2" stroke-linecap="round" stroke-linejoin="round"><path d="M9.88 9.88a3 3 0 1 0 4.24 4.24"/><path d="M10.73 5.08A10.43 10.43 0 0 1 12 5c7 0 10 7 10 7a13.16 13.16 0 0 1-1.67 2.68"/><path d="M6.61 6.61A13.526 13.526 0 0 0 2 12s3 7 10 7a9.74 9.74 0 0 0 5.39-1.61"/><line x1="2" x2="22" y1="2" y2="22"/></svg>"#;

#[cfg(test)]
mod tests {
    use super::*;

    fn secret() -> Markup {
        html! { p.secret { "the hidden article" } }
    }

    #[test]
    fn storage_key_format() {
        assert_eq!(storage_key("my-post"), "post-unlocked-my-post");
        assert_eq!(
            PasswordGate::new("pw", "abc").storage_key(),
            "post-unlocked-abc"
        );
    }

    #[test]
    fn locked_gate_hides_children() {
        let mut store = MemorySessionStore::new();
        let mut gate = PasswordGate::new("hunter2", "post-1");
        gate.mount(&store);

        let html = gate.render(secret()).into_string();
        assert!(!html.contains("the hidden article"));
        assert!(html.contains("Password Protected"));
        assert!(html.contains("Unlock Article"));
        assert!(store.get("post-unlocked-post-1").is_none());

        // nothing typed is still a mismatch
        assert!(!gate.submit(&mut store));
    }

    #[test]
    fn wrong_passwords_never_unlock() {
        let mut store = MemorySessionStore::new();
        let mut gate = PasswordGate::new("hunter2", "post-1");
        gate.mount(&store);

        for attempt in ["", "hunter", "Hunter2", "hunter2 ", " hunter2", "HUNTER2"] {
            gate.set_input(attempt);
            assert!(!gate.submit(&mut store), "{attempt:?} unlocked the gate");
            assert_eq!(gate.error(), Some(INCORRECT_PASSWORD));
            assert_eq!(gate.input(), "");

            let html = gate.render(secret()).into_string();
            assert!(!html.contains("the hidden article"));
            assert!(html.contains(INCORRECT_PASSWORD));
        }
        assert!(store.get(&gate.storage_key()).is_none());
    }

    #[test]
    fn correct_password_unlocks_and_persists() {
        let mut store = MemorySessionStore::new();
        let mut gate = PasswordGate::new("hunter2", "post-1");
        gate.mount(&store);

        gate.set_input("hunter2");
        assert!(gate.submit(&mut store));
        assert!(gate.is_unlocked());
        assert_eq!(gate.error(), None);
        assert_eq!(store.get("post-unlocked-post-1").as_deref(), Some("true"));

        let html = gate.render(secret()).into_string();
        assert!(html.contains("the hidden article"));
        assert!(!html.contains("Password Protected"));
    }

    #[test]
    fn retry_after_mismatch_succeeds() {
        let mut store = MemorySessionStore::new();
        let mut gate = PasswordGate::new("hunter2", "post-1");

        gate.set_input("nope");
        gate.submit(&mut store);
        assert!(gate.error().is_some());

        gate.set_input("hunter2");
        assert!(gate.submit(&mut store));
    }

    #[test]
    fn typing_clears_error() {
        let mut store = MemorySessionStore::new();
        let mut gate = PasswordGate::new("hunter2", "post-1");
        gate.set_input("nope");
        gate.submit(&mut store);
        assert!(gate.error().is_some());

        gate.set_input("h");
        assert_eq!(gate.error(), None);
    }

    #[test]
    fn remount_with_flag_renders_children() {
        let mut store = MemorySessionStore::new();
        let mut first = PasswordGate::new("hunter2", "post-1");
        first.set_input("hunter2");
        first.submit(&mut store);

        let mut second = PasswordGate::new("hunter2", "post-1");
        second.mount(&store);
        assert!(second.is_unlocked());
        assert!(second.render(secret()).into_string().contains("the hidden article"));
    }

    #[test]
    fn flag_is_per_article() {
        let mut store = MemorySessionStore::new();
        let mut first = PasswordGate::new("hunter2", "post-1");
        first.set_input("hunter2");
        first.submit(&mut store);

        let mut other = PasswordGate::new("hunter2", "post-2");
        other.mount(&store);
        assert!(!other.is_unlocked());
    }

    #[test]
    fn only_exact_true_flag_counts() {
        let mut store = MemorySessionStore::new();
        store.set("post-unlocked-post-1", "TRUE");
        let mut gate = PasswordGate::new("hunter2", "post-1");
        gate.mount(&store);
        assert!(!gate.is_unlocked());
    }

    #[test]
    fn visibility_toggle_switches_input_type() {
        let mut gate = PasswordGate::new("hunter2", "post-1");
        let html = gate.render(secret()).into_string();
        assert!(html.contains(r#"type="password""#));
        assert!(html.contains("Show password"));

        gate.toggle_visibility();
        assert!(gate.is_password_visible());
        let html = gate.render(secret()).into_string();
        assert!(html.contains(r#"type="text""#));
        assert!(html.contains("Hide password"));
    }

    #[test]
    fn typed_input_is_escaped() {
        let mut gate = PasswordGate::new("pw", "post-1");
        gate.set_input(r#""><script>x</script>"#);
        let html = gate.render(secret()).into_string();
        assert!(!html.contains("<script>x"));
    }
}
