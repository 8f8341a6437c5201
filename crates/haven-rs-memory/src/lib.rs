//! Conversation memory for Haven.
//!
//! Holds the per-session turn list and renders it into the history slot of the
//! prompt. Nothing here is persisted.

pub mod format;
pub mod model;
pub mod policy;

/// History rendering.
pub use format::{NO_HISTORY, format, format_with_window};
/// Turn and conversation state models.
pub use model::{ConversationState, Turn};
/// Rendering window for history.
pub use policy::HistoryWindow;
