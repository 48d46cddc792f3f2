//! Labelling session controller (image mode)
//!
//! Explicit state machine owning the context window and selection state.
//! It consumes user actions and network results as events and emits
//! effects (fetch window / submit / fetch stats) for the UI layer to run;
//! it performs no I/O itself, so every transition and guard is unit
//! testable. Transitions are the only mutation points.

use crate::api::{ApiError, ContextWindow, MoreMessages, SaveExampleRequest, Stats, WriteAck};
use crate::candidates::{filter_candidates, Candidate, Role, SelectionState};
use crate::draft::{assemble, ExampleDraft};

/// Controller phase. `Submitting` is exclusive: no second write request
/// can be issued while one is outstanding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase<A> {
    Loading,
    Ready,
    Submitting(A),
    /// Terminal: no more items to label. All action controls disabled.
    Completed,
}

/// The three transactional write actions of image mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitAction {
    Accept,
    Skip,
    Undo,
}

impl SubmitAction {
    pub fn name(self) -> &'static str {
        match self {
            SubmitAction::Accept => "accept",
            SubmitAction::Skip => "skip",
            SubmitAction::Undo => "undo",
        }
    }
}

/// Which side of the window a load-more widens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Before,
    After,
}

/// I/O the UI layer must perform on the controller's behalf. Requests are
/// tagged with the epoch/seq they belong to so late responses for a
/// superseded window (or an older stats poll) can be discarded.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    FetchWindow { epoch: u64 },
    SaveExample { epoch: u64, request: SaveExampleRequest },
    SkipImage { epoch: u64 },
    Undo { epoch: u64 },
    FetchStats { seq: u64 },
    LoadMore { epoch: u64, side: Side },
}

/// Network results flowing back into the controller.
#[derive(Debug)]
pub enum SessionEvent {
    Window {
        epoch: u64,
        result: Result<ContextWindow, ApiError>,
    },
    Submitted {
        epoch: u64,
        action: SubmitAction,
        result: Result<WriteAck, ApiError>,
    },
    Stats {
        seq: u64,
        result: Result<Stats, ApiError>,
    },
    Widened {
        epoch: u64,
        side: Side,
        result: Result<MoreMessages, ApiError>,
    },
}

/// Monotonic sequence numbers for the stats poller: a slow, stale response
/// arriving after a newer one must not un-update displayed counters.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatsGuard {
    issued: u64,
    applied: u64,
}

impl StatsGuard {
    /// Issue the next poll's sequence number.
    pub fn next(&mut self) -> u64 {
        self.issued += 1;
        self.issued
    }

    /// True if a response with `seq` is newer than anything applied yet;
    /// records it as applied.
    pub fn admit(&mut self, seq: u64) -> bool {
        if seq > self.applied {
            self.applied = seq;
            true
        } else {
            false
        }
    }
}

/// The image-mode labelling session.
pub struct LabelSession {
    phase: Phase<SubmitAction>,
    window: Option<ContextWindow>,
    user_candidates: Vec<Candidate>,
    assistant_candidates: Vec<Candidate>,
    pub selection: SelectionState,
    epoch: u64,
    stats_guard: StatsGuard,
    stats: Option<Stats>,
    status: Option<String>,
}

impl LabelSession {
    /// Start a session: first window fetch plus an initial stats poll.
    pub fn start() -> (Self, Vec<Effect>) {
        let mut session = Self {
            phase: Phase::Loading,
            window: None,
            user_candidates: Vec::new(),
            assistant_candidates: Vec::new(),
            selection: SelectionState::default(),
            epoch: 1,
            stats_guard: StatsGuard::default(),
            stats: None,
            status: None,
        };
        let effects = vec![
            Effect::FetchWindow { epoch: session.epoch },
            session.poll_stats(),
        ];
        (session, effects)
    }

    pub fn phase(&self) -> Phase<SubmitAction> {
        self.phase
    }

    pub fn window(&self) -> Option<&ContextWindow> {
        self.window.as_ref()
    }

    pub fn stats(&self) -> Option<&Stats> {
        self.stats.as_ref()
    }

    /// Last surfaced message (validation, logical or transport failure).
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn candidates(&self, role: Role) -> &[Candidate] {
        match role {
            Role::User => &self.user_candidates,
            Role::Assistant => &self.assistant_candidates,
        }
    }

    /// Current draft of the example that would be persisted on accept.
    pub fn draft(&self) -> ExampleDraft {
        match &self.window {
            Some(w) => assemble(
                w,
                &self.user_candidates,
                &self.assistant_candidates,
                &self.selection,
            ),
            None => ExampleDraft::default(),
        }
    }

    /// Next stats poll effect. Safe in any phase; the poller runs on its
    /// own interval and never interferes with the labelling cycle.
    pub fn poll_stats(&mut self) -> Effect {
        Effect::FetchStats {
            seq: self.stats_guard.next(),
        }
    }

    // ── User actions ───────────────────────────────────────────

    /// Select a candidate for a role. Only meaningful while `Ready`.
    pub fn select_candidate(&mut self, role: Role, index: usize) -> bool {
        if self.phase != Phase::Ready {
            return false;
        }
        let len = self.candidates(role).len();
        self.selection.select_candidate(role, index, len)
    }

    pub fn toggle_override(&mut self, role: Role) -> bool {
        if self.phase != Phase::Ready {
            return false;
        }
        self.selection.toggle_override(role)
    }

    /// Accept the current draft. Rejected locally (no effect, no network
    /// call) unless the session is `Ready` and both role slots resolve to
    /// non-empty text.
    pub fn accept(&mut self) -> Option<Effect> {
        if self.phase != Phase::Ready {
            return None;
        }
        let request = match self.draft().to_save_request() {
            Some(r) => r,
            None => {
                self.status =
                    Some("Both a user and an assistant turn are required before accepting".into());
                return None;
            }
        };
        self.phase = Phase::Submitting(SubmitAction::Accept);
        self.status = None;
        Some(Effect::SaveExample {
            epoch: self.epoch,
            request,
        })
    }

    /// Skip the current anchor without saving.
    pub fn skip(&mut self) -> Option<Effect> {
        if self.phase != Phase::Ready {
            return None;
        }
        self.phase = Phase::Submitting(SubmitAction::Skip);
        self.status = None;
        Some(Effect::SkipImage { epoch: self.epoch })
    }

    /// Request a rollback of the most recently accepted example. Never
    /// pre-validated client-side; the server decides whether there is
    /// anything to undo.
    pub fn undo(&mut self) -> Option<Effect> {
        if self.phase != Phase::Ready {
            return None;
        }
        self.phase = Phase::Submitting(SubmitAction::Undo);
        self.status = None;
        Some(Effect::Undo { epoch: self.epoch })
    }

    /// Widen the window with earlier/later messages. Counts as a reload:
    /// the merged window replaces the old one and selections reset.
    pub fn load_more(&mut self, side: Side) -> Option<Effect> {
        if self.phase != Phase::Ready {
            return None;
        }
        Some(Effect::LoadMore {
            epoch: self.epoch,
            side,
        })
    }

    // ── Network results ────────────────────────────────────────

    /// Apply a network result; returns follow-up effects.
    pub fn handle(&mut self, event: SessionEvent) -> Vec<Effect> {
        match event {
            SessionEvent::Window { epoch, result } => self.on_window(epoch, result),
            SessionEvent::Submitted {
                epoch,
                action,
                result,
            } => self.on_submitted(epoch, action, result),
            SessionEvent::Stats { seq, result } => {
                if let Ok(stats) = result {
                    if self.stats_guard.admit(seq) {
                        self.stats = Some(stats);
                    }
                }
                // Poll failures are skipped silently; they do not affect
                // the labelling cycle.
                Vec::new()
            }
            SessionEvent::Widened {
                epoch,
                side,
                result,
            } => self.on_widened(epoch, side, result),
        }
    }

    fn on_window(&mut self, epoch: u64, result: Result<ContextWindow, ApiError>) -> Vec<Effect> {
        if epoch != self.epoch {
            // Late response for a superseded window
            return Vec::new();
        }
        match result {
            Ok(window) => {
                self.install_window(window);
                self.phase = Phase::Ready;
            }
            Err(err) => {
                // Exhaustion and fetch errors both end the session; there
                // is nothing to label without a window.
                self.phase = Phase::Completed;
                self.status = match err {
                    ApiError::Exhausted => Some("All items labeled".into()),
                    other => Some(format!("Session ended: {}", other)),
                };
            }
        }
        Vec::new()
    }

    fn on_submitted(
        &mut self,
        epoch: u64,
        action: SubmitAction,
        result: Result<WriteAck, ApiError>,
    ) -> Vec<Effect> {
        if epoch != self.epoch || self.phase != Phase::Submitting(action) {
            return Vec::new();
        }
        match result {
            Ok(_) => {
                // Success: reset selections, advance the epoch and reload.
                self.selection.reset();
                self.epoch += 1;
                self.phase = Phase::Loading;
                self.status = None;
                vec![
                    Effect::FetchWindow { epoch: self.epoch },
                    self.poll_stats(),
                ]
            }
            Err(err) => {
                // Failure: prior window and selections stay intact so the
                // user can correct and retry. Stats still refresh.
                self.phase = Phase::Ready;
                self.status = Some(match err {
                    ApiError::Logical(msg) => msg,
                    other => format!("{} failed: {}", action.name(), other),
                });
                vec![self.poll_stats()]
            }
        }
    }

    fn on_widened(
        &mut self,
        epoch: u64,
        side: Side,
        result: Result<MoreMessages, ApiError>,
    ) -> Vec<Effect> {
        if epoch != self.epoch || self.phase != Phase::Ready {
            return Vec::new();
        }
        match result {
            Ok(more) => {
                if let Some(window) = self.window.take() {
                    let mut merged = window;
                    match side {
                        Side::Before if !more.preceding.is_empty() => {
                            merged.preceding = more.preceding;
                        }
                        Side::After if !more.following.is_empty() => {
                            merged.following = more.following;
                        }
                        _ => {}
                    }
                    self.install_window(merged);
                }
            }
            Err(err) => {
                self.status = Some(format!("Could not load more context: {}", err));
            }
        }
        Vec::new()
    }

    /// Replace the window wholesale: re-derive both candidate lists and
    /// clear all selections and overrides.
    fn install_window(&mut self, window: ContextWindow) {
        self.user_candidates = filter_candidates(&window.preceding, Role::User, Role::User);
        self.assistant_candidates =
            filter_candidates(&window.following, Role::Assistant, Role::Assistant);
        self.window = Some(window);
        self.selection.reset();
    }

    /// Progress pair for display, from the window when fresh or the last
    /// stats copy otherwise. Display only, never gates correctness.
    pub fn progress(&self) -> (Option<u64>, Option<u64>) {
        if let Some(w) = &self.window {
            if w.current_index.is_some() || w.total_images.is_some() {
                return (w.current_index, w.total_images);
            }
        }
        match &self.stats {
            Some(s) => (Some(s.current_index), s.total()),
            None => (None, None),
        }
    }

}
