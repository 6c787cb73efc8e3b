//! The chat session: one request/response turn at a time against a
//! [`ChatEndpoint`], rendered into a [`TranscriptSurface`].

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::constants;
use crate::endpoint::ChatEndpoint;
use crate::error::TurnError;
use crate::input::InputBuffer;
use crate::pending::PendingTurn;
use crate::reply::InboundReply;
use crate::transcript::TranscriptSurface;
use crate::turn::Turn;

/// Per-turn lifecycle. `Rendered` and `Failed` are immediately followed by
/// `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    Idle,
    Sending,
    AwaitingReply,
    Rendered,
    Failed,
}

pub struct ChatSession<E, S> {
    endpoint: Arc<E>,
    surface: Arc<Mutex<S>>,
    // At most one placeholder; owned here instead of page-wide state.
    pending: Arc<Mutex<Option<PendingTurn>>>,
    state_tx: Arc<watch::Sender<TurnState>>,
    pending_interval: Duration,
}

impl<E, S> Clone for ChatSession<E, S> {
    fn clone(&self) -> Self {
        Self {
            endpoint: self.endpoint.clone(),
            surface: self.surface.clone(),
            pending: self.pending.clone(),
            state_tx: self.state_tx.clone(),
            pending_interval: self.pending_interval,
        }
    }
}

impl<E: ChatEndpoint, S: TranscriptSurface> ChatSession<E, S> {
    pub fn new(endpoint: E, surface: Arc<Mutex<S>>) -> Self {
        let (state_tx, _) = watch::channel(TurnState::Idle);
        Self {
            endpoint: Arc::new(endpoint),
            surface,
            pending: Arc::new(Mutex::new(None)),
            state_tx: Arc::new(state_tx),
            pending_interval: Duration::from_millis(*constants::PENDING_INTERVAL_MS),
        }
    }

    pub fn with_pending_interval(mut self, interval: Duration) -> Self {
        self.pending_interval = interval;
        self
    }

    pub fn surface(&self) -> Arc<Mutex<S>> {
        self.surface.clone()
    }

    pub fn state(&self) -> TurnState {
        *self.state_tx.borrow()
    }

    /// Receiver observing every state transition.
    pub fn subscribe(&self) -> watch::Receiver<TurnState> {
        self.state_tx.subscribe()
    }

    /// Waits until no turn is in flight.
    pub async fn wait_idle(&self) {
        let mut rx = self.state_tx.subscribe();
        // The sender lives as long as `self`, so this cannot fail.
        let _ = rx.wait_for(|state| *state == TurnState::Idle).await;
    }

    /// Starts a turn with `raw_text`.
    ///
    /// Returns `false` without touching the transcript when the trimmed text
    /// is empty or another turn is still in flight. Otherwise appends the
    /// user turn, shows the pending placeholder, dispatches the request and
    /// returns `true` without waiting for the reply. Must be called from
    /// within a tokio runtime.
    pub fn submit(&self, raw_text: &str) -> bool {
        let message = raw_text.trim();
        if message.is_empty() {
            debug!("Ignoring empty submission");
            return false;
        }

        let claimed = self.state_tx.send_if_modified(|state| {
            if *state == TurnState::Idle {
                *state = TurnState::Sending;
                true
            } else {
                false
            }
        });
        if !claimed {
            warn!(state = ?self.state(), "Rejecting submission while a turn is in flight");
            return false;
        }

        info!(chars = message.len(), "Submitting chat message");
        self.lock_surface().append(Turn::user(message).render());

        let pending = PendingTurn::start(self.surface.clone(), self.pending_interval);
        *lock(&self.pending) = Some(pending);
        self.transition(TurnState::AwaitingReply);

        let endpoint = self.endpoint.clone();
        let message = message.to_string();
        let request = tokio::spawn(async move { endpoint.send(&message).await });

        // Settles even when the request task panics or is aborted.
        let session = self.clone();
        tokio::spawn(async move {
            let outcome = request.await.unwrap_or_else(|join_err| {
                error!(error = %join_err, "Chat request task failed");
                Err(TurnError::Transport(format!("request task failed: {join_err}")))
            });
            session.settle(outcome);
        });

        true
    }

    /// Submits the buffer's text and clears it when the turn was started.
    pub fn submit_input(&self, input: &mut InputBuffer) -> bool {
        let started = self.submit(input.text());
        if started {
            input.clear();
        }
        started
    }

    fn settle(&self, outcome: Result<InboundReply, TurnError>) {
        // The placeholder goes before the terminal turn is shown.
        self.finish_pending();

        let (turn, state) = match outcome {
            Ok(reply) => {
                let turn = Turn::assistant(reply.primary_text(), reply.auxiliary());
                debug!(has_auxiliary = turn.auxiliary.is_some(), "Rendering reply");
                (turn, TurnState::Rendered)
            }
            Err(err) => {
                warn!(error = %err, "Chat turn failed");
                (Turn::system_error(err.to_string()), TurnState::Failed)
            }
        };

        self.lock_surface().append(turn.render());
        self.transition(state);
        self.transition(TurnState::Idle);
    }

    fn finish_pending(&self) {
        if let Some(mut pending) = lock(&self.pending).take() {
            pending.cancel();
        }
        self.lock_surface().remove_pending();
    }

    fn transition(&self, next: TurnState) {
        let prev = self.state_tx.send_replace(next);
        debug!(?prev, ?next, "Turn state transition");
    }

    fn lock_surface(&self) -> MutexGuard<'_, S> {
        lock(&self.surface)
    }
}

// A poisoned lock still guards consistent data here: every critical
// section is a single append or slot swap.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::Transcript;
    use async_trait::async_trait;

    struct Echo;

    #[async_trait]
    impl ChatEndpoint for Echo {
        async fn send(&self, message: &str) -> Result<InboundReply, TurnError> {
            Ok(InboundReply {
                response: Some(serde_json::Value::String(format!("echo: {message}"))),
                ..Default::default()
            })
        }
    }

    struct Panicking;

    #[async_trait]
    impl ChatEndpoint for Panicking {
        async fn send(&self, _message: &str) -> Result<InboundReply, TurnError> {
            panic!("endpoint blew up");
        }
    }

    fn session() -> ChatSession<Echo, Transcript> {
        ChatSession::new(Echo, Arc::new(Mutex::new(Transcript::new())))
            .with_pending_interval(Duration::from_millis(50))
    }

    #[tokio::test]
    async fn test_whitespace_submission_is_ignored() {
        let session = session();
        for raw in ["", " ", "\n\t  "] {
            assert!(!session.submit(raw));
        }
        assert_eq!(session.state(), TurnState::Idle);
        assert!(session.surface().lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_submit_trims_and_renders_reply() {
        let session = session();
        assert!(session.submit("  hello  "));
        session.wait_idle().await;

        let surface = session.surface();
        let transcript = surface.lock().unwrap();
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript.entries()[0].text, "hello");
        assert_eq!(transcript.entries()[1].text, "echo: hello");
        assert_eq!(transcript.pending(), None);
    }

    #[tokio::test]
    async fn test_panicking_endpoint_still_settles_turn() {
        let session = ChatSession::new(Panicking, Arc::new(Mutex::new(Transcript::new())))
            .with_pending_interval(Duration::from_millis(50));
        assert!(session.submit("hello"));

        tokio::time::timeout(Duration::from_secs(5), session.wait_idle())
            .await
            .expect("turn never settled");

        let surface = session.surface();
        let transcript = surface.lock().unwrap();
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript.pending(), None);
        assert_eq!(transcript.entries()[1].role, crate::turn::Role::SystemError);
        assert!(transcript.entries()[1].text.starts_with("Network error: request task failed"));
        drop(transcript);

        // The session accepts a new turn afterwards.
        assert_eq!(session.state(), TurnState::Idle);
    }

    #[tokio::test]
    async fn test_submit_input_clears_buffer_only_when_started() {
        let session = session();
        let mut input = InputBuffer::new();

        input.feed_line("   ");
        assert!(!session.submit_input(&mut input));
        assert_eq!(input.text(), "   ");

        input.clear();
        input.feed_line("hi");
        assert!(session.submit_input(&mut input));
        assert_eq!(input.text(), "");
        session.wait_idle().await;
    }
}
