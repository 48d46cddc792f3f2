//! Conversation labelling controller (text-only mode)
//!
//! Second instantiation of the session controller shape: steps through
//! messages one at a time, accumulating a conversation server-side via
//! add/skip/undo/end. Same phase guard, epoch guard and failure semantics
//! as the image-mode controller.

use crate::api::{ApiError, MessageBody, NextMessage, Stats, WriteAck};
use crate::session::{Phase, StatsGuard};

/// The four transactional write actions of conversation mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvoAction {
    Add,
    Skip,
    Undo,
    End,
}

impl ConvoAction {
    pub fn name(self) -> &'static str {
        match self {
            ConvoAction::Add => "add",
            ConvoAction::Skip => "skip",
            ConvoAction::Undo => "undo",
            ConvoAction::End => "end",
        }
    }
}

/// I/O for the UI layer to run, tagged with epoch/seq guards.
#[derive(Debug, Clone, PartialEq)]
pub enum ConvoEffect {
    FetchNext { epoch: u64 },
    Submit { epoch: u64, action: ConvoAction },
    FetchStats { seq: u64 },
}

/// Network results flowing back into the controller.
#[derive(Debug)]
pub enum ConvoEvent {
    Next {
        epoch: u64,
        result: Result<NextMessage, ApiError>,
    },
    Submitted {
        epoch: u64,
        action: ConvoAction,
        result: Result<WriteAck, ApiError>,
    },
    Stats {
        seq: u64,
        result: Result<Stats, ApiError>,
    },
}

/// The conversation-mode labelling session.
pub struct ConvoSession {
    phase: Phase<ConvoAction>,
    current: Option<NextMessage>,
    epoch: u64,
    stats_guard: StatsGuard,
    stats: Option<Stats>,
    status: Option<String>,
    /// Size of the in-progress conversation, from the last server ack.
    conversation_size: u64,
}

impl ConvoSession {
    /// Start a session: first message fetch plus an initial stats poll.
    pub fn start() -> (Self, Vec<ConvoEffect>) {
        let mut session = Self {
            phase: Phase::Loading,
            current: None,
            epoch: 1,
            stats_guard: StatsGuard::default(),
            stats: None,
            status: None,
            conversation_size: 0,
        };
        let effects = vec![
            ConvoEffect::FetchNext { epoch: session.epoch },
            session.poll_stats(),
        ];
        (session, effects)
    }

    pub fn phase(&self) -> Phase<ConvoAction> {
        self.phase
    }

    pub fn stats(&self) -> Option<&Stats> {
        self.stats.as_ref()
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    /// The message currently offered for a decision.
    pub fn current_message(&self) -> Option<&MessageBody> {
        self.current.as_ref().and_then(|n| n.body())
    }

    pub fn current(&self) -> Option<&NextMessage> {
        self.current.as_ref()
    }

    pub fn conversation_size(&self) -> u64 {
        self.conversation_size
    }

    pub fn poll_stats(&mut self) -> ConvoEffect {
        ConvoEffect::FetchStats {
            seq: self.stats_guard.next(),
        }
    }

    // ── User actions ───────────────────────────────────────────

    /// Add the current message to the in-progress conversation.
    pub fn add(&mut self) -> Option<ConvoEffect> {
        self.submit(ConvoAction::Add)
    }

    /// Skip the current message.
    pub fn skip(&mut self) -> Option<ConvoEffect> {
        self.submit(ConvoAction::Skip)
    }

    /// Undo the last addition. Not pre-validated; "Nothing to undo" comes
    /// back from the server as a logical failure.
    pub fn undo(&mut self) -> Option<ConvoEffect> {
        self.submit(ConvoAction::Undo)
    }

    /// End and persist the in-progress conversation.
    pub fn end(&mut self) -> Option<ConvoEffect> {
        self.submit(ConvoAction::End)
    }

    fn submit(&mut self, action: ConvoAction) -> Option<ConvoEffect> {
        if self.phase != Phase::Ready {
            return None;
        }
        self.phase = Phase::Submitting(action);
        self.status = None;
        Some(ConvoEffect::Submit {
            epoch: self.epoch,
            action,
        })
    }

    // ── Network results ────────────────────────────────────────

    /// Apply a network result; returns follow-up effects.
    pub fn handle(&mut self, event: ConvoEvent) -> Vec<ConvoEffect> {
        match event {
            ConvoEvent::Next { epoch, result } => self.on_next(epoch, result),
            ConvoEvent::Submitted {
                epoch,
                action,
                result,
            } => self.on_submitted(epoch, action, result),
            ConvoEvent::Stats { seq, result } => {
                if let Ok(stats) = result {
                    if self.stats_guard.admit(seq) {
                        self.stats = Some(stats);
                    }
                }
                Vec::new()
            }
        }
    }

    fn on_next(&mut self, epoch: u64, result: Result<NextMessage, ApiError>) -> Vec<ConvoEffect> {
        if epoch != self.epoch {
            return Vec::new();
        }
        match result {
            Ok(next) if next.done => {
                self.phase = Phase::Completed;
                self.status = Some("All messages labeled".into());
                self.current = Some(next);
            }
            Ok(next) => {
                if let Some(size) = next.conversation_size {
                    // next-message reports size-if-added; the running
                    // conversation is one shorter.
                    self.conversation_size = size.saturating_sub(1);
                }
                self.current = Some(next);
                self.phase = Phase::Ready;
            }
            Err(err) => {
                self.phase = Phase::Completed;
                self.status = match err {
                    ApiError::Exhausted => Some("All messages labeled".into()),
                    other => Some(format!("Session ended: {}", other)),
                };
            }
        }
        Vec::new()
    }

    fn on_submitted(
        &mut self,
        epoch: u64,
        action: ConvoAction,
        result: Result<WriteAck, ApiError>,
    ) -> Vec<ConvoEffect> {
        if epoch != self.epoch || self.phase != Phase::Submitting(action) {
            return Vec::new();
        }
        match result {
            Ok(ack) => {
                if let Some(size) = ack.conversation_size {
                    self.conversation_size = size;
                } else if action == ConvoAction::End {
                    self.conversation_size = 0;
                }
                self.epoch += 1;
                self.phase = Phase::Loading;
                self.status = None;
                vec![
                    ConvoEffect::FetchNext { epoch: self.epoch },
                    self.poll_stats(),
                ]
            }
            Err(err) => {
                self.phase = Phase::Ready;
                self.status = Some(match err {
                    ApiError::Logical(msg) => msg,
                    other => format!("{} failed: {}", action.name(), other),
                });
                vec![self.poll_stats()]
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn next_msg(content: &str, conversation_size: u64) -> NextMessage {
        serde_json::from_value(serde_json::json!({
            "done": false,
            "index": 3,
            "total": 100,
            "message": {"timestamp": "t", "sender": "Ana", "content": content},
            "conversation_size": conversation_size,
            "labeled_count": 2
        }))
        .unwrap()
    }

    fn ok_ack(conversation_size: Option<u64>) -> Result<WriteAck, ApiError> {
        Ok(WriteAck {
            success: true,
            conversation_size,
            ..Default::default()
        })
    }

    fn ready_session() -> ConvoSession {
        let (mut s, effects) = ConvoSession::start();
        assert_eq!(effects[0], ConvoEffect::FetchNext { epoch: 1 });
        s.handle(ConvoEvent::Next {
            epoch: 1,
            result: Ok(next_msg("hey", 1)),
        });
        assert_eq!(s.phase(), Phase::Ready);
        s
    }

    #[test]
    fn test_add_cycle_reloads_next_message() {
        let mut s = ready_session();
        assert_eq!(s.current_message().unwrap().content.as_deref(), Some("hey"));
        assert_eq!(s.conversation_size(), 0);

        let effect = s.add().unwrap();
        assert_eq!(
            effect,
            ConvoEffect::Submit {
                epoch: 1,
                action: ConvoAction::Add
            }
        );
        assert_eq!(s.phase(), Phase::Submitting(ConvoAction::Add));

        let effects = s.handle(ConvoEvent::Submitted {
            epoch: 1,
            action: ConvoAction::Add,
            result: ok_ack(Some(1)),
        });
        assert_eq!(s.conversation_size(), 1);
        assert_eq!(s.phase(), Phase::Loading);
        assert!(matches!(effects[0], ConvoEffect::FetchNext { epoch: 2 }));
        assert!(matches!(effects[1], ConvoEffect::FetchStats { .. }));
    }

    #[test]
    fn test_submitting_is_exclusive() {
        let mut s = ready_session();
        assert!(s.add().is_some());
        assert!(s.add().is_none());
        assert!(s.skip().is_none());
        assert!(s.undo().is_none());
        assert!(s.end().is_none());
    }

    #[test]
    fn test_failed_end_preserves_current_message() {
        let mut s = ready_session();
        s.end().unwrap();
        let effects = s.handle(ConvoEvent::Submitted {
            epoch: 1,
            action: ConvoAction::End,
            result: Err(ApiError::Logical("No messages in conversation".into())),
        });
        assert_eq!(s.phase(), Phase::Ready);
        assert_eq!(s.status(), Some("No messages in conversation"));
        assert!(s.current_message().is_some());
        assert!(!effects
            .iter()
            .any(|e| matches!(e, ConvoEffect::FetchNext { .. })));
    }

    #[test]
    fn test_end_resets_conversation_size() {
        let mut s = ready_session();
        s.add().unwrap();
        s.handle(ConvoEvent::Submitted {
            epoch: 1,
            action: ConvoAction::Add,
            result: ok_ack(Some(3)),
        });
        s.handle(ConvoEvent::Next {
            epoch: 2,
            result: Ok(next_msg("more", 4)),
        });

        s.end().unwrap();
        s.handle(ConvoEvent::Submitted {
            epoch: 2,
            action: ConvoAction::End,
            result: ok_ack(None),
        });
        assert_eq!(s.conversation_size(), 0);
    }

    #[test]
    fn test_done_response_completes() {
        let (mut s, _) = ConvoSession::start();
        let done: NextMessage = serde_json::from_value(serde_json::json!({
            "done": true,
            "message": "All messages labeled!",
            "total_labeled": 42
        }))
        .unwrap();
        s.handle(ConvoEvent::Next {
            epoch: 1,
            result: Ok(done),
        });
        assert_eq!(s.phase(), Phase::Completed);
        assert!(s.add().is_none());
        assert!(s.end().is_none());
        assert_eq!(s.current().unwrap().total_labeled, Some(42));
    }

    #[test]
    fn test_stale_next_response_ignored() {
        let mut s = ready_session();
        s.skip().unwrap();
        s.handle(ConvoEvent::Submitted {
            epoch: 1,
            action: ConvoAction::Skip,
            result: ok_ack(None),
        });
        // Old-epoch response arrives late
        s.handle(ConvoEvent::Next {
            epoch: 1,
            result: Ok(next_msg("stale", 1)),
        });
        assert_eq!(s.phase(), Phase::Loading);
    }

    #[test]
    fn test_stats_last_write_wins() {
        let mut s = ready_session();
        let seq1 = match s.poll_stats() {
            ConvoEffect::FetchStats { seq } => seq,
            _ => unreachable!(),
        };
        let seq2 = match s.poll_stats() {
            ConvoEffect::FetchStats { seq } => seq,
            _ => unreachable!(),
        };
        s.handle(ConvoEvent::Stats {
            seq: seq2,
            result: Ok(Stats {
                labeled_conversations: 8,
                ..Default::default()
            }),
        });
        s.handle(ConvoEvent::Stats {
            seq: seq1,
            result: Ok(Stats {
                labeled_conversations: 7,
                ..Default::default()
            }),
        });
        assert_eq!(s.stats().unwrap().labeled_conversations, 8);
    }
}
