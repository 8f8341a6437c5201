//! History window policy.

/// Bounds on how much history is rendered into a prompt.
///
/// `None` on either field means unbounded. The window only limits what is
/// rendered; the conversation state is kept whole.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HistoryWindow {
    /// Most recent turns to keep.
    pub max_turns: Option<usize>,
    /// Character budget for the rendered text.
    pub max_chars: Option<usize>,
}

impl HistoryWindow {
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn new(max_turns: Option<usize>, max_chars: Option<usize>) -> Self {
        Self {
            max_turns,
            max_chars,
        }
    }
}
