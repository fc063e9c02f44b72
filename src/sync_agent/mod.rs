//! Client-side sync core for the editable page text.
//!
//! One [`ElementEditor`] per bound text region, coordinated by a
//! [`SyncAgent`] that loads the snapshot, writes edits through the Text API
//! and auto-reverts everything after an idle window. Live updates arriving
//! over the push channel are fed in through [`SyncAgent::on_update`]; an
//! element being edited locally never gets clobbered by them.
//!
//! The transport is a trait so tests run against an in-memory fake;
//! [`HttpTransport`] talks to the real HTTP surface. If the push channel
//! drops, the embedder reconnects after [`RECONNECT_DELAY`], indefinitely,
//! with no backoff growth.

mod element;

pub use element::{EditPhase, ElementEditor};

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use thiserror::Error;

/// Fixed delay between push-channel reconnection attempts.
pub const RECONNECT_DELAY: Duration = Duration::from_secs(3);

/// How long a blur waits before it counts as a submit, so that e.g. an
/// Escape keypress right after focus loss still wins.
pub const BLUR_DEBOUNCE: Duration = Duration::from_millis(100);

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a client error, e.g. an empty value.
    #[error("server rejected the write: {0}")]
    Rejected(String),
}

/// Server side of the sync agent, abstracted for tests.
#[allow(async_fn_in_trait)]
pub trait TextTransport {
    async fn get_all(&self) -> Result<BTreeMap<String, String>, TransportError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), TransportError>;
    async fn reset_all(&self) -> Result<(), TransportError>;
}

/// When to auto-revert and when to surface the countdown.
#[derive(Debug, Clone, Copy)]
pub struct IdleResetPolicy {
    /// Idle window after the last successful save.
    pub window: Duration,
    /// How long before expiry the countdown indicator becomes visible.
    pub countdown_lead: Duration,
}

impl Default for IdleResetPolicy {
    fn default() -> Self {
        Self {
            window: Duration::from_secs(60),
            countdown_lead: Duration::from_secs(30),
        }
    }
}

/// Result of [`SyncAgent::commit_edit`].
#[derive(Debug)]
pub enum SaveOutcome {
    /// Nothing was sent: no such element, empty buffer, or unchanged text.
    NotSaved,
    /// Committed and broadcast; the idle-reset deadline was re-armed.
    Saved,
    /// Transport failed; the element rolled back to its pre-edit text. The
    /// embedder should alert the visitor.
    Failed(TransportError),
}

/// Coordinates every editable region of one page.
pub struct SyncAgent<T> {
    transport: T,
    policy: IdleResetPolicy,
    elements: BTreeMap<String, ElementEditor>,
    /// Single idle-reset timer handle, re-armed atomically on every
    /// successful save, never left dangling across reloads.
    reset_deadline: Option<Instant>,
}

impl<T: TextTransport> SyncAgent<T> {
    pub fn new(transport: T) -> Self {
        Self::with_policy(transport, IdleResetPolicy::default())
    }

    pub fn with_policy(transport: T, policy: IdleResetPolicy) -> Self {
        Self {
            transport,
            policy,
            elements: BTreeMap::new(),
            reset_deadline: None,
        }
    }

    /// Fetch the current snapshot and bind one editor per known key.
    ///
    /// On a reload, elements currently being edited keep their buffer; the
    /// mid-edit drop rule applies to snapshot values just like to pushes.
    pub async fn load(&mut self) -> Result<(), TransportError> {
        let snapshot = self.transport.get_all().await?;

        for (key, value) in snapshot {
            match self.elements.get_mut(&key) {
                Some(el) => {
                    el.apply_remote(&value);
                }
                None => {
                    self.elements
                        .insert(key.clone(), ElementEditor::new(key, value));
                }
            }
        }
        Ok(())
    }

    pub fn element(&self, key: &str) -> Option<&ElementEditor> {
        self.elements.get(key)
    }

    pub fn elements(&self) -> impl Iterator<Item = &ElementEditor> {
        self.elements.values()
    }

    /// Click on a bound element: enter edit mode.
    pub fn begin_edit(&mut self, key: &str) -> bool {
        self.elements.get_mut(key).is_some_and(|el| el.click())
    }

    /// The visitor typed into an element being edited.
    pub fn edit_input(&mut self, key: &str, text: &str) {
        if let Some(el) = self.elements.get_mut(key) {
            el.input(text);
        }
    }

    /// Escape: discard the edit.
    pub fn cancel_edit(&mut self, key: &str) {
        if let Some(el) = self.elements.get_mut(key) {
            el.cancel();
        }
    }

    /// Enter (or blur, after [`BLUR_DEBOUNCE`]): push the element through
    /// `Saving` and write the edit to the server.
    pub async fn commit_edit(&mut self, key: &str, now: Instant) -> SaveOutcome {
        let value = match self.elements.get_mut(key).and_then(ElementEditor::submit) {
            Some(value) => value,
            None => return SaveOutcome::NotSaved,
        };

        let result = self.transport.set(key, &value).await;
        let Some(el) = self.elements.get_mut(key) else {
            return SaveOutcome::NotSaved;
        };

        match result {
            Ok(()) => {
                el.save_succeeded();
                self.reset_deadline = Some(now + self.policy.window);
                SaveOutcome::Saved
            }
            Err(e) => {
                el.save_failed();
                SaveOutcome::Failed(e)
            }
        }
    }

    /// Feed in one push-channel `update` event.
    ///
    /// Returns whether it was applied (dropped while that element is being
    /// edited locally).
    pub fn on_update(&mut self, key: &str, value: &str) -> bool {
        self.elements
            .get_mut(key)
            .is_some_and(|el| el.apply_remote(value))
    }

    /// Remaining time to display once the countdown lead window is reached.
    pub fn countdown(&self, now: Instant) -> Option<Duration> {
        let deadline = self.reset_deadline?;
        let remaining = deadline.saturating_duration_since(now);
        (remaining <= self.policy.countdown_lead).then_some(remaining)
    }

    /// Drive the idle-reset policy; call on a timer tick.
    ///
    /// When the window has expired this fires `ResetAll` exactly once,
    /// reloads the snapshot and disarms. Returns whether the reset fired.
    pub async fn poll_idle(&mut self, now: Instant) -> Result<bool, TransportError> {
        match self.reset_deadline {
            Some(deadline) if now >= deadline => {}
            _ => return Ok(false),
        }

        // Disarm before awaiting so a slow reset cannot fire twice.
        self.reset_deadline = None;

        self.transport.reset_all().await?;
        self.load().await?;
        Ok(true)
    }
}

/// [`TextTransport`] over the real HTTP surface, for headless embedders.
pub struct HttpTransport {
    base_url: String,
    client: reqwest::Client,
}

impl HttpTransport {
    /// `base_url` without a trailing slash, e.g. `http://localhost:3000`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
        }
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, TransportError> {
        if response.status().is_client_error() {
            let body: serde_json::Value = response.json().await.unwrap_or_default();
            let msg = body
                .get("error")
                .and_then(|v| v.as_str())
                .unwrap_or("invalid input")
                .to_string();
            return Err(TransportError::Rejected(msg));
        }
        Ok(response.error_for_status()?)
    }
}

impl TextTransport for HttpTransport {
    async fn get_all(&self) -> Result<BTreeMap<String, String>, TransportError> {
        let url = format!("{}/api/text", self.base_url);
        let response = Self::check(self.client.get(&url).send().await?).await?;
        Ok(response.json().await?)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), TransportError> {
        let url = format!("{}/api/text/{key}", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({ "value": value }))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn reset_all(&self) -> Result<(), TransportError> {
        let url = format!("{}/api/text/reset-all", self.base_url);
        Self::check(self.client.post(&url).send().await?).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::DEFAULT_TEXTS;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// In-memory stand-in for the server.
    #[derive(Clone)]
    struct FakeTransport {
        texts: Arc<Mutex<BTreeMap<String, String>>>,
        resets: Arc<AtomicUsize>,
        fail_writes: Arc<AtomicBool>,
    }

    impl FakeTransport {
        fn new() -> Self {
            let texts = DEFAULT_TEXTS
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect();
            Self {
                texts: Arc::new(Mutex::new(texts)),
                resets: Arc::new(AtomicUsize::new(0)),
                fail_writes: Arc::new(AtomicBool::new(false)),
            }
        }

        fn stored(&self, key: &str) -> Option<String> {
            self.texts.lock().unwrap().get(key).cloned()
        }
    }

    impl TextTransport for FakeTransport {
        async fn get_all(&self) -> Result<BTreeMap<String, String>, TransportError> {
            Ok(self.texts.lock().unwrap().clone())
        }

        async fn set(&self, key: &str, value: &str) -> Result<(), TransportError> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(TransportError::Rejected("store unavailable".into()));
            }
            self.texts
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_string());
            Ok(())
        }

        async fn reset_all(&self) -> Result<(), TransportError> {
            self.resets.fetch_add(1, Ordering::SeqCst);
            *self.texts.lock().unwrap() = DEFAULT_TEXTS
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect();
            Ok(())
        }
    }

    async fn loaded_agent() -> (SyncAgent<FakeTransport>, FakeTransport) {
        let transport = FakeTransport::new();
        let mut agent = SyncAgent::new(transport.clone());
        agent.load().await.unwrap();
        (agent, transport)
    }

    #[tokio::test]
    async fn load_binds_an_editor_per_known_key() {
        let (agent, _) = loaded_agent().await;

        assert_eq!(agent.elements().count(), DEFAULT_TEXTS.len());
        assert_eq!(
            agent.element("main_header").unwrap().text(),
            "SAY GUGNAG"
        );
    }

    #[tokio::test]
    async fn commit_writes_through_and_retains_text() {
        let (mut agent, transport) = loaded_agent().await;
        let now = Instant::now();

        assert!(agent.begin_edit("button_text"));
        agent.edit_input("button_text", "CLICK");

        let outcome = agent.commit_edit("button_text", now).await;
        assert!(matches!(outcome, SaveOutcome::Saved));
        assert_eq!(agent.element("button_text").unwrap().text(), "CLICK");
        assert_eq!(transport.stored("button_text").as_deref(), Some("CLICK"));
    }

    #[tokio::test]
    async fn failed_save_alerts_and_rolls_back() {
        let (mut agent, transport) = loaded_agent().await;
        transport.fail_writes.store(true, Ordering::SeqCst);

        agent.begin_edit("main_header");
        agent.edit_input("main_header", "DOOMED");

        let outcome = agent.commit_edit("main_header", Instant::now()).await;
        assert!(matches!(outcome, SaveOutcome::Failed(_)));
        assert_eq!(agent.element("main_header").unwrap().text(), "SAY GUGNAG");

        // A failed save must not arm the reset timer.
        assert!(!agent.poll_idle(Instant::now() + Duration::from_secs(3600))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn push_update_mid_edit_leaves_the_buffer_alone() {
        let (mut agent, _) = loaded_agent().await;

        agent.begin_edit("badge1");
        agent.edit_input("badge1", "MY EDIT");

        assert!(!agent.on_update("badge1", "REMOTE"));
        assert_eq!(agent.element("badge1").unwrap().text(), "MY EDIT");

        // Other elements still take updates live.
        assert!(agent.on_update("badge2", "REMOTE"));
        assert_eq!(agent.element("badge2").unwrap().text(), "REMOTE");
    }

    #[tokio::test]
    async fn idle_window_fires_reset_exactly_once() {
        let (mut agent, transport) = loaded_agent().await;
        let t0 = Instant::now();

        agent.begin_edit("main_header");
        agent.edit_input("main_header", "TEMPORARY");
        agent.commit_edit("main_header", t0).await;

        // Before the window: nothing fires, no countdown yet.
        let early = t0 + Duration::from_secs(20);
        assert!(!agent.poll_idle(early).await.unwrap());
        assert_eq!(agent.countdown(early), None);

        // Inside the countdown lead.
        let late = t0 + Duration::from_secs(40);
        assert!(agent.countdown(late).is_some());
        assert!(agent.countdown(late).unwrap() <= Duration::from_secs(30));

        // Past the window: one reset, defaults restored, timer disarmed.
        let expired = t0 + Duration::from_secs(61);
        assert!(agent.poll_idle(expired).await.unwrap());
        assert_eq!(transport.resets.load(Ordering::SeqCst), 1);
        assert_eq!(agent.element("main_header").unwrap().text(), "SAY GUGNAG");

        assert!(!agent.poll_idle(expired + Duration::from_secs(120)).await.unwrap());
        assert_eq!(transport.resets.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn every_save_restarts_the_idle_window() {
        let (mut agent, transport) = loaded_agent().await;
        let t0 = Instant::now();

        agent.begin_edit("badge1");
        agent.edit_input("badge1", "FIRST");
        agent.commit_edit("badge1", t0).await;

        // A second save 40 s in pushes the deadline to t0 + 100 s.
        agent.begin_edit("badge1");
        agent.edit_input("badge1", "SECOND");
        agent.commit_edit("badge1", t0 + Duration::from_secs(40)).await;

        assert!(!agent
            .poll_idle(t0 + Duration::from_secs(70))
            .await
            .unwrap());
        assert!(agent
            .poll_idle(t0 + Duration::from_secs(101))
            .await
            .unwrap());
        assert_eq!(transport.resets.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn empty_or_unchanged_edits_send_nothing() {
        let (mut agent, transport) = loaded_agent().await;

        agent.begin_edit("badge3");
        agent.edit_input("badge3", "   ");
        let outcome = agent.commit_edit("badge3", Instant::now()).await;
        assert!(matches!(outcome, SaveOutcome::NotSaved));
        assert_eq!(
            transport.stored("badge3").as_deref(),
            Some("🔥 UNDER CONSTRUCTION 🔥")
        );

        // No save means no armed timer either.
        assert!(!agent
            .poll_idle(Instant::now() + Duration::from_secs(3600))
            .await
            .unwrap());
    }
}
