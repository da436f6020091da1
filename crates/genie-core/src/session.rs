//! Session orchestration: submissions and gestures in, registry mutations out.
//!
//! Every flow is a two-phase commit over the token registry. Phase one runs
//! synchronously when the flow starts: it validates, detects the gesture,
//! removes consumed tokens, and raises the `loading` / `input_locked` flags.
//! Phase two runs after the oracle answers: it adds the new token or sets
//! the aura, or raises a notice on failure. Consumed tokens are never
//! restored.
//!
//! # Concurrency
//!
//! All mutable state lives in one [`Mutex`] that is never held across an
//! `.await`. Any number of flows may be in flight; they complete in
//! whatever order the oracle answers. Flags are released by guards, so a
//! flow whose future is dropped mid-call still unlocks. Callers that may
//! disappear mid-flow (an HTTP request, say) use [`Session::spawn_drag_end`]
//! and [`Session::spawn_submit_word`] so the second phase always runs.
//!
//! A view is published on [`Session::subscribe`] after every change;
//! refused requests change nothing and publish nothing.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use genie_oracle::{Oracle, OracleError, validate_word};
use genie_types::{
    AuraState, Classification, EmotionToken, InteractionEvent, NoticeKind, NoticeView, Position,
    SessionView, TokenId,
};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::GenieConfig;
use crate::detector::{self, Thresholds};
use crate::registry::{NewToken, TokenRegistry};

/// Capacity of the session change channel.
///
/// A subscriber that falls behind by more than this many views receives
/// [`broadcast::error::RecvError::Lagged`] and skips to the newest one.
const BROADCAST_CAPACITY: usize = 64;

/// Fixed parameters of a session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSettings {
    /// Center of the materialize zone.
    pub center: Position,
    /// Where classified words appear.
    pub spawn_point: Position,
    /// Detector radii.
    pub thresholds: Thresholds,
    /// How long a notice stays visible.
    pub notice_ttl: Duration,
}

impl SessionSettings {
    /// Derive settings from the loaded configuration.
    pub fn from_config(config: &GenieConfig) -> Self {
        Self {
            center: config.surface.center(),
            spawn_point: config.surface.spawn_point(),
            thresholds: config.surface.thresholds(),
            notice_ttl: config.notices.ttl(),
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self::from_config(&GenieConfig::default())
    }
}

/// Requests the session refuses outright, without touching any state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// The submitted text is not a single word.
    #[error("invalid word: {0}")]
    InvalidWord(String),

    /// A classification or fusion is still in flight.
    #[error("input is locked while the oracle is busy")]
    InputLocked,

    /// The dragged token is not (or no longer) on the surface.
    #[error("unknown token: {0}")]
    UnknownToken(TokenId),

    /// The drop position is not a finite point.
    #[error("drop position must be finite")]
    InvalidPosition,
}

/// How a word submission ended.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// The word is an emotion; its token now sits at the spawn point.
    Added(EmotionToken),
    /// The oracle says the word is not an emotion.
    Rejected {
        /// The normalized word that was rejected.
        word: String,
    },
    /// The oracle call failed.
    Failed(OracleError),
}

/// How a drag end ended.
#[derive(Debug, Clone, PartialEq)]
pub enum DragOutcome {
    /// The token was repositioned.
    Moved(EmotionToken),
    /// The token was consumed and its aura now fills the materialized slot.
    Materialized(AuraState),
    /// Two tokens were consumed and replaced by their fusion.
    Fused {
        /// The dragged token and the one it landed on.
        consumed: [TokenId; 2],
        /// The new token, placed at the drop point.
        token: EmotionToken,
    },
    /// Tokens were consumed but the oracle failed; they are gone for good.
    Lost {
        /// The tokens that were removed.
        consumed: Vec<TokenId>,
        /// Why the oracle call failed.
        error: OracleError,
    },
}

/// The ephemeral message slot.
#[derive(Debug, Clone)]
struct Notice {
    kind: NoticeKind,
    message: String,
    issued_at: DateTime<Utc>,
    expires_at: Instant,
}

/// Flags released by [`HoldGuard`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Hold {
    /// Word submission is refused while any input hold is outstanding.
    Input,
    /// The UI shows the loading state while any materialization is pending.
    Loading,
}

/// Everything guarded by the session mutex.
#[derive(Debug, Default)]
struct SessionState {
    registry: TokenRegistry,
    notice: Option<Notice>,
    input_holds: usize,
    pending_materializations: usize,
}

impl SessionState {
    fn acquire(&mut self, hold: Hold) {
        match hold {
            Hold::Input => self.input_holds = self.input_holds.saturating_add(1),
            Hold::Loading => {
                self.pending_materializations = self.pending_materializations.saturating_add(1);
            }
        }
    }

    fn release(&mut self, hold: Hold) {
        match hold {
            Hold::Input => self.input_holds = self.input_holds.saturating_sub(1),
            Hold::Loading => {
                self.pending_materializations = self.pending_materializations.saturating_sub(1);
            }
        }
    }

    fn raise(&mut self, kind: NoticeKind, message: String, ttl: Duration) {
        let now = Instant::now();
        self.notice = Some(Notice {
            kind,
            message,
            issued_at: Utc::now(),
            expires_at: now.checked_add(ttl).unwrap_or(now),
        });
    }

    fn view(&self, now: Instant) -> SessionView {
        let notice = self
            .notice
            .as_ref()
            .filter(|n| now < n.expires_at)
            .map(|n| NoticeView {
                kind: n.kind,
                message: n.message.clone(),
                issued_at: n.issued_at,
                expires_in_ms: u64::try_from(n.expires_at.duration_since(now).as_millis())
                    .unwrap_or(u64::MAX),
            });

        SessionView {
            tokens: self.registry.all().to_vec(),
            aura: self.registry.materialized().cloned(),
            loading: self.pending_materializations > 0,
            input_locked: self.input_holds > 0,
            notice,
        }
    }
}

/// Releases one hold when dropped.
struct HoldGuard<'a, O> {
    session: &'a Session<O>,
    hold: Hold,
}

impl<O> Drop for HoldGuard<'_, O> {
    fn drop(&mut self) {
        let hold = self.hold;
        self.session.mutate(|state| state.release(hold));
    }
}

/// Phase-one result of a drag end.
enum DragPlan {
    Moved(EmotionToken),
    Materialize(EmotionToken),
    Fuse(EmotionToken, EmotionToken, Position),
}

/// One user's token surface and its in-flight oracle work.
pub struct Session<O> {
    oracle: O,
    settings: SessionSettings,
    state: Mutex<SessionState>,
    changes: broadcast::Sender<SessionView>,
}

impl<O> Session<O> {
    /// Create an empty session.
    pub fn new(oracle: O, settings: SessionSettings) -> Self {
        let (changes, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            oracle,
            settings,
            state: Mutex::new(SessionState::default()),
            changes,
        }
    }

    /// The oracle this session consults.
    pub const fn oracle(&self) -> &O {
        &self.oracle
    }

    /// The session's fixed parameters.
    pub const fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    /// A consistent snapshot of everything the UI renders.
    pub fn view(&self) -> SessionView {
        self.lock().view(Instant::now())
    }

    /// Subscribe to the view published after every state change.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionView> {
        self.changes.subscribe()
    }

    /// Dismiss the materialized aura, returning it.
    pub fn clear_aura(&self) -> Option<AuraState> {
        let cleared = self.mutate_if(|state| {
            let cleared = state.registry.set_materialized(None);
            let changed = cleared.is_some();
            (cleared, changed)
        });
        if let Some(aura) = &cleared {
            info!(emotion = %aura.source_emotion, "aura cleared");
        }
        cleared
    }

    /// Dismiss the current notice. Returns whether one was showing.
    pub fn dismiss_notice(&self) -> bool {
        let now = Instant::now();
        self.mutate_if(|state| {
            let visible = state
                .notice
                .take()
                .is_some_and(|notice| now < notice.expires_at);
            (visible, visible)
        })
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run one atomic mutation and publish the resulting view.
    fn mutate<R>(&self, f: impl FnOnce(&mut SessionState) -> R) -> R {
        self.mutate_if(|state| (f(state), true))
    }

    /// Run one atomic step; publish a view only if it reports a change.
    fn mutate_if<R>(&self, f: impl FnOnce(&mut SessionState) -> (R, bool)) -> R {
        let (result, view) = {
            let mut state = self.lock();
            let (result, changed) = f(&mut state);
            (result, changed.then(|| state.view(Instant::now())))
        };
        if let Some(view) = view {
            // Err only means nobody is subscribed.
            let _ = self.changes.send(view);
        }
        result
    }

    /// Like [`Self::mutate`], but a refusal leaves subscribers undisturbed.
    fn try_mutate<R>(
        &self,
        f: impl FnOnce(&mut SessionState) -> Result<R, SessionError>,
    ) -> Result<R, SessionError> {
        self.mutate_if(|state| {
            let result = f(state);
            let changed = result.is_ok();
            (result, changed)
        })
    }

    /// Adopt a hold that was acquired inside a [`Self::mutate`] call.
    const fn guard(&self, hold: Hold) -> HoldGuard<'_, O> {
        HoldGuard {
            session: self,
            hold,
        }
    }

    fn raise_failure(&self, error: &OracleError) {
        let kind = error.notice_kind();
        let ttl = self.settings.notice_ttl;
        self.mutate(|state| state.raise(kind, failure_message(kind), ttl));
    }
}

impl<O: Oracle> Session<O> {
    /// Submit a word for classification.
    ///
    /// Locks input for the duration of the oracle call and clears any
    /// showing notice. A valid emotion becomes a token at the spawn point;
    /// a rejection or failure raises a notice.
    ///
    /// # Errors
    ///
    /// [`SessionError::InvalidWord`] for empty or multi-word text and
    /// [`SessionError::InputLocked`] while another classification or a
    /// fusion is in flight. Neither calls the oracle.
    pub async fn submit_word(&self, text: &str) -> Result<SubmitOutcome, SessionError> {
        let word = validate_word(text).map_err(|e| SessionError::InvalidWord(e.to_string()))?;

        self.try_mutate(|state| {
            if state.input_holds > 0 {
                return Err(SessionError::InputLocked);
            }
            state.acquire(Hold::Input);
            state.notice = None;
            Ok(())
        })?;
        let _input = self.guard(Hold::Input);

        debug!(word = %word, "classifying word");
        let outcome = match self.oracle.classify(&word).await {
            Ok(Classification::Valid {
                label,
                emoji,
                color_hex,
            }) => {
                let spawn = self.settings.spawn_point;
                let token = self.mutate(|state| {
                    state.registry.add(NewToken {
                        id: None,
                        label,
                        emoji,
                        color_hex,
                        position: spawn,
                    })
                });
                info!(token = %token.id, label = %token.label, "token added");
                SubmitOutcome::Added(token)
            }
            Ok(Classification::Rejected) => {
                let ttl = self.settings.notice_ttl;
                let message = format!("\"{word}\" doesn't look like an emotional essence.");
                self.mutate(|state| state.raise(NoticeKind::ValidationRejected, message, ttl));
                info!(word = %word, "word rejected by oracle");
                SubmitOutcome::Rejected { word }
            }
            Err(error) => {
                warn!(word = %word, error = %error, "classification failed");
                self.raise_failure(&error);
                SubmitOutcome::Failed(error)
            }
        };
        Ok(outcome)
    }

    /// Handle the end of a drag of `token_id` at `drop`.
    ///
    /// # Errors
    ///
    /// [`SessionError::UnknownToken`] if the token is not live and
    /// [`SessionError::InvalidPosition`] for a non-finite drop point.
    /// Neither changes any state.
    pub async fn drag_end(
        &self,
        token_id: TokenId,
        drop: Position,
    ) -> Result<DragOutcome, SessionError> {
        if !drop.is_finite() {
            return Err(SessionError::InvalidPosition);
        }

        let center = self.settings.center;
        let thresholds = self.settings.thresholds;
        let plan = self.try_mutate(|state| plan_drag(state, token_id, drop, center, thresholds))?;

        match plan {
            DragPlan::Moved(token) => Ok(DragOutcome::Moved(token)),
            DragPlan::Materialize(token) => Ok(self.materialize(token).await),
            DragPlan::Fuse(a, b, at) => Ok(self.fuse(a, b, at).await),
        }
    }

    async fn materialize(&self, token: EmotionToken) -> DragOutcome {
        let _loading = self.guard(Hold::Loading);

        match self.oracle.materialize(&token.label).await {
            Ok(aura) => {
                let stored = aura.clone();
                self.mutate(|state| state.registry.set_materialized(Some(stored)));
                info!(emotion = %aura.source_emotion, speed = aura.speed, chaotic = aura.chaotic, "aura materialized");
                DragOutcome::Materialized(aura)
            }
            Err(error) => {
                warn!(token = %token.id, label = %token.label, error = %error, "materialization failed, token lost");
                self.raise_failure(&error);
                DragOutcome::Lost {
                    consumed: vec![token.id],
                    error,
                }
            }
        }
    }

    async fn fuse(&self, a: EmotionToken, b: EmotionToken, at: Position) -> DragOutcome {
        let _input = self.guard(Hold::Input);

        match self.oracle.fuse(&a.label, &b.label).await {
            Ok(fusion) => {
                let token = self.mutate(|state| {
                    state.registry.add(NewToken {
                        id: None,
                        label: fusion.label,
                        emoji: fusion.emoji,
                        color_hex: fusion.color_hex,
                        position: at,
                    })
                });
                info!(from_a = %a.label, from_b = %b.label, label = %token.label, "tokens fused");
                DragOutcome::Fused {
                    consumed: [a.id, b.id],
                    token,
                }
            }
            Err(error) => {
                warn!(from_a = %a.label, from_b = %b.label, error = %error, "fusion failed, tokens lost");
                self.raise_failure(&error);
                DragOutcome::Lost {
                    consumed: vec![a.id, b.id],
                    error,
                }
            }
        }
    }
}

impl<O: Oracle + 'static> Session<O> {
    /// Run [`Self::submit_word`] on its own task.
    ///
    /// The flow completes even if the handle is dropped, so a caller that
    /// goes away never cancels an oracle call in flight.
    pub fn spawn_submit_word(
        self: &Arc<Self>,
        text: String,
    ) -> JoinHandle<Result<SubmitOutcome, SessionError>> {
        let session = Arc::clone(self);
        tokio::spawn(async move { session.submit_word(&text).await })
    }

    /// Run [`Self::drag_end`] on its own task.
    ///
    /// Tokens consumed in the first phase are always followed by the second
    /// phase, whether or not anyone still awaits the handle.
    pub fn spawn_drag_end(
        self: &Arc<Self>,
        token_id: TokenId,
        drop: Position,
    ) -> JoinHandle<Result<DragOutcome, SessionError>> {
        let session = Arc::clone(self);
        tokio::spawn(async move { session.drag_end(token_id, drop).await })
    }
}

/// Phase one of a drag: detect the gesture and apply its synchronous part.
fn plan_drag(
    state: &mut SessionState,
    token_id: TokenId,
    drop: Position,
    center: Position,
    thresholds: Thresholds,
) -> Result<DragPlan, SessionError> {
    if !state.registry.contains(token_id) {
        return Err(SessionError::UnknownToken(token_id));
    }

    let event = detector::classify(token_id, drop, state.registry.all(), center, thresholds);
    debug!(token = %token_id, event = event.name(), "drag classified");

    match event {
        InteractionEvent::Move { new_pos, .. } => {
            state.registry.update_position(token_id, new_pos);
            state
                .registry
                .get(token_id)
                .cloned()
                .map(DragPlan::Moved)
                .ok_or(SessionError::UnknownToken(token_id))
        }
        InteractionEvent::Materialize { .. } => {
            let token = take(state, token_id)?;
            state.acquire(Hold::Loading);
            Ok(DragPlan::Materialize(token))
        }
        InteractionEvent::Fuse { token_a, token_b } => {
            let a = take(state, token_a)?;
            let b = take(state, token_b)?;
            state.acquire(Hold::Input);
            Ok(DragPlan::Fuse(a, b, drop))
        }
    }
}

fn take(state: &mut SessionState, id: TokenId) -> Result<EmotionToken, SessionError> {
    state
        .registry
        .remove(id)
        .ok_or(SessionError::UnknownToken(id))
}

/// User-facing text for an oracle failure.
fn failure_message(kind: NoticeKind) -> String {
    match kind {
        NoticeKind::OracleUnreachable => "The connection to the genie failed.",
        NoticeKind::MalformedResponse => "The genie answered with something unreadable.",
        NoticeKind::ValidationRejected => "That doesn't look like an emotional essence.",
    }
    .to_owned()
}
