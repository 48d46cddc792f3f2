//! Labelling Workflow Integration Tests
//!
//! These tests trace complete labelling workflows with logging to verify
//! the controllers behave correctly from the operator's perspective.
//!
//! Each test represents a real user story:
//! - "As a labeller, I want to..."
//! - Tests drive the pure controllers with synthetic server responses
//! - Logs are captured for debugging

use serde_json::{json, Value};

use labelcli::api::{ApiError, ContextWindow, NextMessage, Stats, WriteAck};
use labelcli::candidates::Role;
use labelcli::convo::{ConvoAction, ConvoEffect, ConvoEvent, ConvoSession};
use labelcli::session::{Effect, LabelSession, Phase, SessionEvent, SubmitAction};

/// Test helper to capture and display trace logs
struct TestTracer {
    name: String,
    logs: Vec<String>,
}

impl TestTracer {
    fn new(name: &str) -> Self {
        eprintln!("\n╔═══════════════════════════════════════════════════════════════");
        eprintln!("║ USER STORY: {}", name);
        eprintln!("╚═══════════════════════════════════════════════════════════════\n");
        Self {
            name: name.to_string(),
            logs: vec![],
        }
    }

    fn step(&mut self, description: &str) {
        let msg = format!("  → {}", description);
        eprintln!("{}", msg);
        self.logs.push(msg);
    }

    fn expect(&mut self, condition: bool, description: &str) {
        let status = if condition { "✓" } else { "✗" };
        let msg = format!("    {} {}", status, description);
        eprintln!("{}", msg);
        self.logs.push(msg);
        assert!(condition, "FAILED: {}", description);
    }

    fn done(&self) {
        eprintln!("\n  ══════════════════════════════════════════════════════");
        eprintln!("  ✓ Story completed: {}", self.name);
        eprintln!();
    }
}

fn window_from(json: Value) -> ContextWindow {
    serde_json::from_value(json).unwrap()
}

fn sample_window() -> ContextWindow {
    window_from(json!({
        "image_message": {"image": "a.png", "timestamp": "2023-05-01 10:00"},
        "preceding": [{"role": "user", "content": "hi"}],
        "following": [{"role": "assistant", "content": "hello!"}]
    }))
}

fn ok_ack() -> Result<WriteAck, ApiError> {
    Ok(WriteAck {
        success: true,
        ..Default::default()
    })
}

fn ready_image_session(window: ContextWindow) -> LabelSession {
    let (mut session, effects) = LabelSession::start();
    assert!(matches!(effects[0], Effect::FetchWindow { epoch: 1 }));
    session.handle(SessionEvent::Window {
        epoch: 1,
        result: Ok(window),
    });
    assert_eq!(session.phase(), Phase::Ready);
    session
}

// ═══════════════════════════════════════════════════════════════
// STORY: Labeller accepts an example from two selections
// ═══════════════════════════════════════════════════════════════

#[test]
fn story_accept_builds_exact_save_request() {
    let mut t = TestTracer::new("Accepting two selections produces the exact wire shape");

    t.step("Given a window with one user and one assistant candidate");
    let mut session = ready_image_session(sample_window());
    t.expect(
        session.candidates(Role::User).len() == 1,
        "One user candidate derived",
    );
    t.expect(
        session.candidates(Role::Assistant).len() == 1,
        "One assistant candidate derived",
    );

    t.step("When both candidates are selected and accept is pressed");
    session.select_candidate(Role::User, 0);
    session.select_candidate(Role::Assistant, 0);
    let effect = session.accept().expect("accept should proceed");

    t.step("Then the save request carries the fixed three-turn ordering");
    let request = match effect {
        Effect::SaveExample { request, .. } => request,
        other => panic!("unexpected effect: {:?}", other),
    };
    let got = serde_json::to_value(&request.messages).unwrap();
    let want = json!([
        {"role": "user", "content": [{"type": "text", "text": "hi"}]},
        {"role": "user", "content": [{"type": "image", "image": "a.png"}]},
        {"role": "assistant", "content": [{"type": "text", "text": "hello!"}]}
    ]);
    t.expect(got == want, "Message array matches the expected shape exactly");
    t.expect(
        request.images == vec!["a.png".to_string()],
        "Anchor image listed in images",
    );
    t.expect(
        request.timestamp == Value::from("2023-05-01 10:00"),
        "Anchor timestamp carried as correlation key",
    );

    t.step("And the session is submitting exclusively");
    t.expect(
        session.phase() == Phase::Submitting(SubmitAction::Accept),
        "Phase is Submitting(Accept)",
    );
    t.expect(session.skip().is_none(), "No second write can be issued");

    t.step("When the server confirms, the session reloads");
    let effects = session.handle(SessionEvent::Submitted {
        epoch: 1,
        action: SubmitAction::Accept,
        result: ok_ack(),
    });
    t.expect(session.phase() == Phase::Loading, "Back to Loading");
    t.expect(
        matches!(effects[0], Effect::FetchWindow { epoch: 2 }),
        "A fresh window is fetched under a new epoch",
    );
    t.expect(
        matches!(effects[1], Effect::FetchStats { .. }),
        "Stats refresh follows the write",
    );

    t.done();
}

// ═══════════════════════════════════════════════════════════════
// STORY: Labeller types a custom user turn
// ═══════════════════════════════════════════════════════════════

#[test]
fn story_override_takes_precedence_over_candidates() {
    let mut t = TestTracer::new("A typed override replaces the candidate selection");

    t.step("Given a ready session");
    let mut session = ready_image_session(sample_window());

    t.step("When the user enables the override and types a custom turn");
    session.toggle_override(Role::User);
    for c in "custom hi".chars() {
        session.selection.push_override_char(Role::User, c);
    }
    session.select_candidate(Role::Assistant, 0);

    t.step("Then no user candidate shows as selected");
    t.expect(
        session.selection.choice(Role::User).selected().is_none(),
        "No candidate in the selected state",
    );

    t.step("And the outbound user turn carries the override text");
    let effect = session.accept().expect("accept should proceed");
    let request = match effect {
        Effect::SaveExample { request, .. } => request,
        other => panic!("unexpected effect: {:?}", other),
    };
    let user_turn = serde_json::to_value(&request.messages[0]).unwrap();
    t.expect(
        user_turn == json!({"role": "user", "content": [{"type": "text", "text": "custom hi"}]}),
        "User turn is the typed override",
    );

    t.done();
}

// ═══════════════════════════════════════════════════════════════
// STORY: Accept is blocked until the example is complete
// ═══════════════════════════════════════════════════════════════

#[test]
fn story_incomplete_example_never_hits_the_network() {
    let mut t = TestTracer::new("Incomplete examples are rejected locally");

    t.step("Given a ready session with nothing chosen");
    let mut session = ready_image_session(sample_window());

    t.step("When accept is pressed");
    let effect = session.accept();
    t.expect(effect.is_none(), "No effect emitted, no request sent");
    t.expect(session.status().is_some(), "The user is notified locally");
    t.expect(session.phase() == Phase::Ready, "Session stays Ready");

    t.step("When only the user turn is chosen");
    session.select_candidate(Role::User, 0);
    t.expect(session.accept().is_none(), "Still rejected");

    t.step("When both turns are chosen");
    session.select_candidate(Role::Assistant, 0);
    t.expect(session.accept().is_some(), "Accept proceeds");

    t.done();
}

// ═══════════════════════════════════════════════════════════════
// STORY: Failed undo leaves everything in place
// ═══════════════════════════════════════════════════════════════

#[test]
fn story_failed_undo_preserves_state() {
    let mut t = TestTracer::new("A failed undo surfaces the message and changes nothing");

    t.step("Given a ready session with a user candidate selected");
    let mut session = ready_image_session(sample_window());
    session.select_candidate(Role::User, 0);

    t.step("When undo is requested and the server says there is nothing to undo");
    session.undo().expect("undo is requestable without pre-validation");
    let effects = session.handle(SessionEvent::Submitted {
        epoch: 1,
        action: SubmitAction::Undo,
        result: Err(ApiError::Logical("Nothing to undo".into())),
    });

    t.step("Then the message is surfaced verbatim");
    t.expect(
        session.status() == Some("Nothing to undo"),
        "Server message shown verbatim",
    );

    t.step("And no window reload happens; selections survive");
    t.expect(
        !effects.iter().any(|e| matches!(e, Effect::FetchWindow { .. })),
        "No window reload as a side effect of the failed undo",
    );
    t.expect(
        effects.iter().any(|e| matches!(e, Effect::FetchStats { .. })),
        "A stats refresh may still occur",
    );
    t.expect(
        session.selection.choice(Role::User).selected() == Some(0),
        "Selection intact",
    );
    t.expect(session.window().is_some(), "Window intact");

    t.done();
}

// ═══════════════════════════════════════════════════════════════
// STORY: Out-of-order stats responses
// ═══════════════════════════════════════════════════════════════

#[test]
fn story_stale_stats_response_discarded() {
    let mut t = TestTracer::new("A slow stats response never un-updates the counters");

    t.step("Given two stats polls in flight");
    let mut session = ready_image_session(sample_window());
    let seq1 = match session.poll_stats() {
        Effect::FetchStats { seq } => seq,
        _ => unreachable!(),
    };
    let seq2 = match session.poll_stats() {
        Effect::FetchStats { seq } => seq,
        _ => unreachable!(),
    };

    t.step("When request #2 resolves before request #1");
    session.handle(SessionEvent::Stats {
        seq: seq2,
        result: Ok(Stats {
            current_index: 21,
            labeled_conversations: 6,
            ..Default::default()
        }),
    });
    session.handle(SessionEvent::Stats {
        seq: seq1,
        result: Ok(Stats {
            current_index: 20,
            labeled_conversations: 5,
            ..Default::default()
        }),
    });

    t.step("Then the displayed counters reflect request #2");
    let stats = session.stats().unwrap();
    t.expect(stats.current_index == 21, "current_index from request #2");
    t.expect(
        stats.labeled_conversations == 6,
        "labeled count from request #2",
    );

    t.done();
}

// ═══════════════════════════════════════════════════════════════
// STORY: Session completes when items run out
// ═══════════════════════════════════════════════════════════════

#[test]
fn story_exhaustion_is_terminal_not_an_error() {
    let mut t = TestTracer::new("Running out of items completes the session");

    t.step("Given a session whose accept succeeded");
    let mut session = ready_image_session(sample_window());
    session.select_candidate(Role::User, 0);
    session.select_candidate(Role::Assistant, 0);
    session.accept().unwrap();
    session.handle(SessionEvent::Submitted {
        epoch: 1,
        action: SubmitAction::Accept,
        result: ok_ack(),
    });

    t.step("When the next window fetch reports exhaustion");
    session.handle(SessionEvent::Window {
        epoch: 2,
        result: Err(ApiError::Exhausted),
    });

    t.step("Then the session is Completed and all actions are disabled");
    t.expect(session.phase() == Phase::Completed, "Phase is Completed");
    t.expect(session.accept().is_none(), "accept disabled");
    t.expect(session.skip().is_none(), "skip disabled");
    t.expect(session.undo().is_none(), "undo disabled");

    t.done();
}

// ═══════════════════════════════════════════════════════════════
// STORY: Conversation mode accumulates and saves
// ═══════════════════════════════════════════════════════════════

#[test]
fn story_conversation_add_add_end_cycle() {
    let mut t = TestTracer::new("Conversation mode accumulates messages and saves on end");

    fn next(content: &str, size_if_added: u64) -> NextMessage {
        serde_json::from_value(json!({
            "done": false,
            "index": 1,
            "total": 10,
            "message": {"timestamp": "t", "sender": "Ana", "content": content},
            "conversation_size": size_if_added
        }))
        .unwrap()
    }

    t.step("Given a conversation session with a first message");
    let (mut session, effects) = ConvoSession::start();
    assert!(matches!(effects[0], ConvoEffect::FetchNext { epoch: 1 }));
    session.handle(ConvoEvent::Next {
        epoch: 1,
        result: Ok(next("hey", 1)),
    });
    t.expect(
        session.current_message().unwrap().content.as_deref() == Some("hey"),
        "First message displayed",
    );

    t.step("When the message is added");
    session.add().unwrap();
    session.handle(ConvoEvent::Submitted {
        epoch: 1,
        action: ConvoAction::Add,
        result: Ok(WriteAck {
            success: true,
            conversation_size: Some(1),
            ..Default::default()
        }),
    });
    t.expect(session.conversation_size() == 1, "Conversation holds 1 message");

    t.step("And a second message is added");
    session.handle(ConvoEvent::Next {
        epoch: 2,
        result: Ok(next("how are you", 2)),
    });
    session.add().unwrap();
    session.handle(ConvoEvent::Submitted {
        epoch: 2,
        action: ConvoAction::Add,
        result: Ok(WriteAck {
            success: true,
            conversation_size: Some(2),
            ..Default::default()
        }),
    });
    t.expect(session.conversation_size() == 2, "Conversation holds 2 messages");

    t.step("When the conversation is ended");
    session.handle(ConvoEvent::Next {
        epoch: 3,
        result: Ok(next("unrelated", 3)),
    });
    session.end().unwrap();
    let effects = session.handle(ConvoEvent::Submitted {
        epoch: 3,
        action: ConvoAction::End,
        result: Ok(WriteAck {
            success: true,
            labeled_count: Some(1),
            ..Default::default()
        }),
    });
    t.expect(session.conversation_size() == 0, "Accumulator reset after save");
    t.expect(
        matches!(effects[0], ConvoEffect::FetchNext { epoch: 4 }),
        "Next message fetched after the save",
    );

    t.done();
}

// ═══════════════════════════════════════════════════════════════
// STORY: Reload always clears selections
// ═══════════════════════════════════════════════════════════════

#[test]
fn story_every_reload_clears_both_roles() {
    let mut t = TestTracer::new("Selections never survive a context reload");

    t.step("Given a session with a selection and an override");
    let mut session = ready_image_session(sample_window());
    session.select_candidate(Role::User, 0);
    session.toggle_override(Role::Assistant);
    for c in "typed".chars() {
        session.selection.push_override_char(Role::Assistant, c);
    }

    t.step("When a skip succeeds and a new window arrives");
    session.skip().unwrap();
    session.handle(SessionEvent::Submitted {
        epoch: 1,
        action: SubmitAction::Skip,
        result: ok_ack(),
    });
    session.handle(SessionEvent::Window {
        epoch: 2,
        result: Ok(window_from(json!({
            "image_message": {"image": "b.png", "timestamp": "t2"},
            "preceding": [{"role": "user", "content": "next one"}],
            "following": [{"role": "assistant", "content": "sure"}]
        }))),
    });

    t.step("Then both roles are back to no selection, no override");
    t.expect(
        session.selection.choice(Role::User).selected().is_none(),
        "User selection cleared",
    );
    t.expect(
        !session.selection.choice(Role::Assistant).override_on(),
        "Assistant override disabled",
    );
    t.expect(
        session.selection.choice(Role::Assistant).override_text().is_empty(),
        "Assistant override text cleared",
    );
    t.expect(session.draft().is_empty(), "Draft back to the empty state");

    t.done();
}
