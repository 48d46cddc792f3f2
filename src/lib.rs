//! labelcli - terminal client for the chat-transcript labelling server
//!
//! The server holds the cursor and the persisted example corpus; this
//! crate is the interactive client: candidate filtering, per-role
//! selection state, example assembly, and the transactional
//! accept/skip/undo session controllers.

pub mod api;
pub mod candidates;
pub mod config;
pub mod convo;
pub mod draft;
pub mod session;
pub mod ui;
