//! Example draft assembly
//!
//! Pure view of the current selections plus the anchor message, in the
//! exact shape that will be persisted. Assembly never mutates selection
//! state; completeness gates the accept action.

use serde_json::Value;

use crate::api::{ContentPart, ContextWindow, ExampleMessage, SaveExampleRequest};
use crate::candidates::{Candidate, Role, SelectionState};

/// Derived, never stored. A role slot is `None` when nothing has been
/// chosen for it; a chosen-but-empty slot is impossible by construction
/// (override text is trim-checked before it counts as chosen).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExampleDraft {
    pub user_text: Option<String>,
    pub anchor_image: Option<String>,
    pub anchor_text: Option<String>,
    pub timestamp: Value,
    pub assistant_text: Option<String>,
}

impl ExampleDraft {
    /// Neither role has been chosen yet (the empty-state indicator).
    pub fn is_empty(&self) -> bool {
        self.user_text.is_none() && self.assistant_text.is_none()
    }

    /// Both role slots resolved to non-empty text. Gates accept.
    pub fn is_complete(&self) -> bool {
        self.user_text.is_some() && self.assistant_text.is_some()
    }

    /// Build the outbound save request. Message ordering is fixed: user
    /// text turn, image turn (image part then text part, or a single empty
    /// text part when the anchor has neither - never an empty content
    /// array), assistant text turn. `None` while the draft is incomplete.
    pub fn to_save_request(&self) -> Option<SaveExampleRequest> {
        let user_text = self.user_text.as_ref()?;
        let assistant_text = self.assistant_text.as_ref()?;

        let mut anchor_parts = Vec::new();
        if let Some(image) = &self.anchor_image {
            anchor_parts.push(ContentPart::image(image.clone()));
        }
        match &self.anchor_text {
            Some(text) => anchor_parts.push(ContentPart::text(text.clone())),
            None if anchor_parts.is_empty() => anchor_parts.push(ContentPart::text("")),
            None => {}
        }

        let messages = vec![
            ExampleMessage {
                role: Role::User.name().to_string(),
                content: vec![ContentPart::text(user_text.clone())],
            },
            ExampleMessage {
                role: Role::User.name().to_string(),
                content: anchor_parts,
            },
            ExampleMessage {
                role: Role::Assistant.name().to_string(),
                content: vec![ContentPart::text(assistant_text.clone())],
            },
        ];

        Some(SaveExampleRequest {
            images: self.anchor_image.iter().cloned().collect(),
            messages,
            timestamp: self.timestamp.clone(),
        })
    }
}

/// Assemble the current draft from the window, the two candidate lists and
/// the selection state. Pure; omits a role slot entirely when neither a
/// selection nor a non-empty override exists for it.
pub fn assemble(
    window: &ContextWindow,
    user_candidates: &[Candidate],
    assistant_candidates: &[Candidate],
    selection: &SelectionState,
) -> ExampleDraft {
    let anchor_text = window
        .image_message
        .content
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from);

    ExampleDraft {
        user_text: selection
            .resolved_text(Role::User, user_candidates)
            .map(String::from),
        anchor_image: window.image_message.image.clone(),
        anchor_text,
        timestamp: window.image_message.timestamp.clone(),
        assistant_text: selection
            .resolved_text(Role::Assistant, assistant_candidates)
            .map(String::from),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{AnchorMessage, ContextMessage};
    use crate::candidates::filter_candidates;

    fn window(image: Option<&str>, text: Option<&str>) -> ContextWindow {
        ContextWindow {
            image_message: AnchorMessage {
                image: image.map(String::from),
                content: text.map(String::from),
                timestamp: Value::from("2023-01-01 12:00"),
            },
            preceding: vec![ContextMessage {
                role: Some("user".into()),
                content: Some("hi".into()),
                ..Default::default()
            }],
            following: vec![ContextMessage {
                role: Some("assistant".into()),
                content: Some("hello!".into()),
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    fn lists(w: &ContextWindow) -> (Vec<Candidate>, Vec<Candidate>) {
        (
            filter_candidates(&w.preceding, Role::User, Role::User),
            filter_candidates(&w.following, Role::Assistant, Role::Assistant),
        )
    }

    #[test]
    fn test_empty_state_when_nothing_chosen() {
        let w = window(Some("a.png"), None);
        let (users, assistants) = lists(&w);
        let draft = assemble(&w, &users, &assistants, &SelectionState::default());
        assert!(draft.is_empty());
        assert!(!draft.is_complete());
        assert!(draft.to_save_request().is_none());
    }

    #[test]
    fn test_one_role_resolved_is_partial() {
        let w = window(Some("a.png"), None);
        let (users, assistants) = lists(&w);
        let mut sel = SelectionState::default();
        sel.select_candidate(Role::User, 0, users.len());

        let draft = assemble(&w, &users, &assistants, &sel);
        assert!(!draft.is_empty());
        assert!(!draft.is_complete());
        assert_eq!(draft.user_text.as_deref(), Some("hi"));
        assert!(draft.assistant_text.is_none());
        assert_eq!(draft.anchor_image.as_deref(), Some("a.png"));
    }

    #[test]
    fn test_save_request_exact_shape() {
        let w = window(Some("a.png"), None);
        let (users, assistants) = lists(&w);
        let mut sel = SelectionState::default();
        sel.select_candidate(Role::User, 0, users.len());
        sel.select_candidate(Role::Assistant, 0, assistants.len());

        let draft = assemble(&w, &users, &assistants, &sel);
        let req = draft.to_save_request().unwrap();

        let got = serde_json::to_value(&req.messages).unwrap();
        let want = serde_json::json!([
            {"role": "user", "content": [{"type": "text", "text": "hi"}]},
            {"role": "user", "content": [{"type": "image", "image": "a.png"}]},
            {"role": "assistant", "content": [{"type": "text", "text": "hello!"}]}
        ]);
        assert_eq!(got, want);
        assert_eq!(req.images, vec!["a.png".to_string()]);
        assert_eq!(req.timestamp, Value::from("2023-01-01 12:00"));
    }

    #[test]
    fn test_override_text_in_save_request() {
        let w = window(Some("a.png"), None);
        let (users, assistants) = lists(&w);
        let mut sel = SelectionState::default();
        sel.toggle_override(Role::User);
        for c in "custom hi".chars() {
            sel.push_override_char(Role::User, c);
        }
        sel.select_candidate(Role::Assistant, 0, assistants.len());

        let draft = assemble(&w, &users, &assistants, &sel);
        let req = draft.to_save_request().unwrap();
        assert_eq!(
            req.messages[0].content,
            vec![ContentPart::text("custom hi")]
        );
    }

    #[test]
    fn test_anchor_with_image_and_text() {
        let w = window(Some("a.png"), Some("check this out"));
        let (users, assistants) = lists(&w);
        let mut sel = SelectionState::default();
        sel.select_candidate(Role::User, 0, users.len());
        sel.select_candidate(Role::Assistant, 0, assistants.len());

        let req = assemble(&w, &users, &assistants, &sel)
            .to_save_request()
            .unwrap();
        assert_eq!(
            req.messages[1].content,
            vec![
                ContentPart::image("a.png"),
                ContentPart::text("check this out"),
            ]
        );
    }

    #[test]
    fn test_anchor_without_image_or_text_gets_empty_text_part() {
        let w = window(None, None);
        let (users, assistants) = lists(&w);
        let mut sel = SelectionState::default();
        sel.select_candidate(Role::User, 0, users.len());
        sel.select_candidate(Role::Assistant, 0, assistants.len());

        let req = assemble(&w, &users, &assistants, &sel)
            .to_save_request()
            .unwrap();
        // Never an empty content array
        assert_eq!(req.messages[1].content, vec![ContentPart::text("")]);
        assert!(req.images.is_empty());
    }

    #[test]
    fn test_assemble_does_not_mutate_inputs() {
        let w = window(Some("a.png"), None);
        let (users, assistants) = lists(&w);
        let mut sel = SelectionState::default();
        sel.select_candidate(Role::User, 0, users.len());
        let before = sel.clone();
        let _ = assemble(&w, &users, &assistants, &sel);
        assert_eq!(sel, before);
    }
}
