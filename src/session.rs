//! Chat session lifecycle controller.
//!
//! A [`ChatSession`] owns everything a chat needs: the active provider, the
//! in-memory credential, the transcript, and the phase.  It moves between two
//! phases — configuring (pick a provider, supply a key) and chatting (one
//! turn at a time against the backend) — and exposes a [`RenderState`]
//! snapshot after every mutation so any front end can redraw without poking
//! at internals.

use strum::Display;
use thiserror::Error;
use tracing::{debug, info};

use crate::backend::{BackendError, ChatBackend, ChatReply, ChatTurnRequest};
use crate::credentials::CredentialStore;
use crate::providers;
use crate::transcript::{Role, Transcript, TranscriptEntry};

/// Which half of the UI is live.  Exactly one phase is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum SessionPhase {
    Configuring,
    Chatting,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("an API key is required for {0}")]
    MissingCredential(String),
    #[error("unknown provider: {0}")]
    UnknownProvider(String),
    #[error("not available in the current phase")]
    WrongPhase,
    #[error("a chat turn is already in flight")]
    TurnInFlight,
}

/// Everything a presentation layer needs to redraw after a mutation.
pub struct RenderState<'a> {
    pub phase: SessionPhase,
    pub transcript: &'a [TranscriptEntry],
    /// Whether a credential input should be shown right now.
    pub credential_input_visible: bool,
    /// Previously stored key for the active provider, offered as a pre-fill.
    pub credential_prefill: Option<&'a str>,
}

/// Token for an outstanding chat turn.  Obtained from [`ChatSession::begin_turn`]
/// and consumed by [`ChatSession::finish_turn`]; holding one means a user
/// entry has been appended and the in-flight flag is set.
#[must_use]
#[derive(Debug)]
pub struct TurnTicket {
    pub request: ChatTurnRequest,
    /// Which chatting phase this turn belongs to.  Results from a phase that
    /// has since been abandoned are dropped on arrival.
    generation: u64,
}

pub struct ChatSession<S: CredentialStore> {
    store: S,
    phase: SessionPhase,
    provider: &'static providers::ProviderDef,
    /// Stored key offered as a pre-fill while configuring.
    credential_prefill: Option<String>,
    /// Key in effect for the current chatting phase.
    current_credential: Option<String>,
    transcript: Transcript,
    in_flight: bool,
    /// Bumped on every return to configuration; stale turn results carry the
    /// old value and are discarded.
    generation: u64,
}

impl<S: CredentialStore> ChatSession<S> {
    /// Create a session in the configuring phase with the first catalogue
    /// provider preselected.
    pub fn new(store: S) -> Self {
        let provider = &providers::PROVIDERS[0];
        let mut session = Self {
            store,
            phase: SessionPhase::Configuring,
            provider,
            credential_prefill: None,
            current_credential: None,
            transcript: Transcript::new(),
            in_flight: false,
            generation: 0,
        };
        session.refresh_prefill();
        session
    }

    // ── Model selection ─────────────────────────────────────────────────────

    /// Record the active provider and look up any stored key for it as a
    /// pre-fill suggestion.  Only valid while configuring; never touches the
    /// transcript or another provider's stored key.
    pub fn select_provider(&mut self, id: &str) -> Result<(), SessionError> {
        if self.phase != SessionPhase::Configuring {
            return Err(SessionError::WrongPhase);
        }
        let def = providers::provider_by_id(id)
            .ok_or_else(|| SessionError::UnknownProvider(id.to_string()))?;
        self.provider = def;
        self.refresh_prefill();
        debug!(provider = def.id, "provider selected");
        Ok(())
    }

    fn refresh_prefill(&mut self) {
        self.credential_prefill = if providers::requires_credential(self.provider.id) {
            self.store.load(self.provider.id)
        } else {
            None
        };
    }

    // ── Phase transitions ───────────────────────────────────────────────────

    /// Configuring → Chatting.  When the provider requires a key, the trimmed
    /// input must be non-empty; otherwise the transition is rejected with no
    /// state change.  On success the key is persisted and a welcome entry is
    /// appended if the transcript is empty.
    pub fn start_chat(&mut self, credential_input: &str) -> Result<(), SessionError> {
        if self.phase != SessionPhase::Configuring {
            return Err(SessionError::WrongPhase);
        }
        let key = credential_input.trim();
        if providers::requires_credential(self.provider.id) {
            if key.is_empty() {
                return Err(SessionError::MissingCredential(
                    self.provider.display.to_string(),
                ));
            }
            self.store.save(self.provider.id, key);
            self.current_credential = Some(key.to_string());
        } else {
            self.current_credential = None;
        }

        self.phase = SessionPhase::Chatting;
        if self.transcript.is_empty() {
            self.transcript.push(
                Role::System,
                format!(
                    "Connected to {}. Ask your first question.",
                    self.provider.display
                ),
            );
        }
        info!(provider = self.provider.id, "chat started");
        Ok(())
    }

    /// Chatting → Configuring.  Always succeeds: drops the in-memory key,
    /// discards the transcript, and re-offers the stored key for the
    /// still-selected provider.
    pub fn change_model(&mut self) {
        self.phase = SessionPhase::Configuring;
        self.current_credential = None;
        self.transcript.clear();
        self.in_flight = false;
        self.generation += 1;
        self.refresh_prefill();
        info!("returned to configuration");
    }

    // ── Request dispatch ────────────────────────────────────────────────────

    /// First half of a chat turn: validate, append the user entry, and mark
    /// the turn in flight.  Returns `Ok(None)` for empty/whitespace questions
    /// (a silent no-op).  A second call while a turn is outstanding is
    /// rejected with [`SessionError::TurnInFlight`].
    pub fn begin_turn(&mut self, question: &str) -> Result<Option<TurnTicket>, SessionError> {
        if self.phase != SessionPhase::Chatting {
            return Err(SessionError::WrongPhase);
        }
        let question = question.trim();
        if question.is_empty() {
            return Ok(None);
        }
        if self.in_flight {
            return Err(SessionError::TurnInFlight);
        }

        self.transcript.push(Role::User, question);
        self.in_flight = true;
        Ok(Some(TurnTicket {
            request: ChatTurnRequest {
                question: question.to_string(),
                provider: self.provider.id.to_string(),
                credential: self.current_credential.clone(),
            },
            generation: self.generation,
        }))
    }

    /// Second half of a chat turn: record the outcome and clear the in-flight
    /// flag.  Failures become a bot entry; they never escape the session.
    /// A result whose turn began before the last [`change_model`](Self::change_model)
    /// is dropped without touching the session — the transcript it belonged
    /// to is already gone, and a newer turn may be outstanding.
    pub fn finish_turn(&mut self, ticket: TurnTicket, result: Result<ChatReply, BackendError>) {
        if ticket.generation != self.generation {
            debug!("turn resolved after a phase change; dropping stale result");
            return;
        }
        self.in_flight = false;
        match result {
            Ok(reply) => {
                self.transcript.push(Role::Bot, reply.text);
            }
            Err(err) => {
                self.transcript.push(Role::Bot, format!("Error: {err}"));
            }
        }
    }

    /// Run one full chat turn against the backend.  Convenience wrapper
    /// around [`begin_turn`](Self::begin_turn) / [`finish_turn`](Self::finish_turn)
    /// for callers that can await the response inline.
    pub async fn send<B: ChatBackend + Sync>(
        &mut self,
        question: &str,
        backend: &B,
    ) -> Result<(), SessionError> {
        let Some(ticket) = self.begin_turn(question)? else {
            return Ok(());
        };
        let result = backend.chat(&ticket.request).await;
        self.finish_turn(ticket, result);
        Ok(())
    }

    // ── Observable state ────────────────────────────────────────────────────

    pub fn render_state(&self) -> RenderState<'_> {
        RenderState {
            phase: self.phase,
            transcript: self.transcript.entries(),
            credential_input_visible: self.phase == SessionPhase::Configuring
                && providers::requires_credential(self.provider.id),
            credential_prefill: self.credential_prefill.as_deref(),
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn provider(&self) -> &'static providers::ProviderDef {
        self.provider
    }

    pub fn transcript(&self) -> &[TranscriptEntry] {
        self.transcript.entries()
    }

    pub fn credential_prefill(&self) -> Option<&str> {
        self.credential_prefill.as_deref()
    }

    /// The injected store (mainly for inspection in tests).
    pub fn credential_store(&self) -> &S {
        &self.store
    }
}
