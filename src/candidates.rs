//! Candidate filtering and per-role selection state
//!
//! A candidate is a message eligible to become the user or assistant turn
//! of a training example. Candidate positions are the sole addressing
//! scheme used by selection, so filtering must be deterministic and
//! order-preserving, and lists are only re-derived on a context reload.

use serde::{Deserialize, Serialize};

use crate::api::ContextMessage;

/// The two selectable roles of a training example.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn name(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }

    /// Resolve a raw role string. Absent or blank falls back to the
    /// context-relative default; unknown strings match neither role.
    fn resolve(raw: Option<&str>, default: Role) -> Option<Role> {
        let raw = raw.map(str::trim).unwrap_or("");
        if raw.is_empty() {
            return Some(default);
        }
        if raw.eq_ignore_ascii_case("user") {
            Some(Role::User)
        } else if raw.eq_ignore_ascii_case("assistant") {
            Some(Role::Assistant)
        } else {
            None
        }
    }
}

/// One selectable message, with its position in the source sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Index into the window's preceding/following slice this came from.
    pub source_index: usize,
    pub text: String,
}

/// Filter a raw message sequence down to the candidates for `target`.
///
/// Keeps messages whose resolved role equals `target` and whose trimmed
/// content is non-empty, preserving input order. `default` is the role a
/// message without one resolves to (preceding lists default to user,
/// following lists to assistant).
pub fn filter_candidates(
    messages: &[ContextMessage],
    target: Role,
    default: Role,
) -> Vec<Candidate> {
    messages
        .iter()
        .enumerate()
        .filter(|(_, m)| Role::resolve(m.role.as_deref(), default) == Some(target))
        .filter_map(|(i, m)| {
            let text = m.content.as_deref().unwrap_or("");
            if text.trim().is_empty() {
                None
            } else {
                Some(Candidate {
                    source_index: i,
                    text: text.to_string(),
                })
            }
        })
        .collect()
}

/// Per-role choice: at most one of {candidate index, non-empty override}
/// is authoritative at any time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleChoice {
    selected: Option<usize>,
    override_on: bool,
    override_text: String,
}

impl RoleChoice {
    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn override_on(&self) -> bool {
        self.override_on
    }

    pub fn override_text(&self) -> &str {
        &self.override_text
    }
}

/// Selection state for both roles, cleared wholesale on every reload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionState {
    user: RoleChoice,
    assistant: RoleChoice,
}

impl SelectionState {
    pub fn choice(&self, role: Role) -> &RoleChoice {
        match role {
            Role::User => &self.user,
            Role::Assistant => &self.assistant,
        }
    }

    fn choice_mut(&mut self, role: Role) -> &mut RoleChoice {
        match role {
            Role::User => &mut self.user,
            Role::Assistant => &mut self.assistant,
        }
    }

    /// Select a candidate by list position. Clears any override for the
    /// same role; the other role is untouched. Out-of-bounds indices are
    /// rejected.
    pub fn select_candidate(&mut self, role: Role, index: usize, list_len: usize) -> bool {
        if index >= list_len {
            return false;
        }
        let choice = self.choice_mut(role);
        choice.selected = Some(index);
        choice.override_on = false;
        choice.override_text.clear();
        true
    }

    /// Toggle the free-text override for a role. Enabling clears that
    /// role's candidate selection; disabling clears the override text.
    /// Returns whether the override is now enabled.
    pub fn toggle_override(&mut self, role: Role) -> bool {
        let choice = self.choice_mut(role);
        if choice.override_on {
            choice.override_on = false;
            choice.override_text.clear();
        } else {
            choice.override_on = true;
            choice.selected = None;
        }
        choice.override_on
    }

    /// Append a typed character to an enabled override. No-op otherwise.
    pub fn push_override_char(&mut self, role: Role, c: char) {
        let choice = self.choice_mut(role);
        if choice.override_on {
            choice.override_text.push(c);
        }
    }

    /// Delete the last character of an enabled override.
    pub fn pop_override_char(&mut self, role: Role) {
        let choice = self.choice_mut(role);
        if choice.override_on {
            choice.override_text.pop();
        }
    }

    /// Resolve the authoritative text for a role: a non-empty trimmed
    /// override wins, otherwise the selected candidate. `None` means the
    /// role has not been chosen yet.
    pub fn resolved_text<'a>(&'a self, role: Role, candidates: &'a [Candidate]) -> Option<&'a str> {
        let choice = self.choice(role);
        let trimmed = choice.override_text.trim();
        if choice.override_on && !trimmed.is_empty() {
            return Some(trimmed);
        }
        choice
            .selected
            .and_then(|i| candidates.get(i))
            .map(|c| c.text.as_str())
    }

    /// Clear both roles' selection and override. Invoked on every context
    /// reload and on every successful accept/skip/undo.
    pub fn reset(&mut self) {
        self.user = RoleChoice::default();
        self.assistant = RoleChoice::default();
    }
}
