//! Rendering conversation history into prompt text.

use crate::model::Turn;
use crate::policy::HistoryWindow;
use log::debug;

/// Rendered history when there are no turns.
pub const NO_HISTORY: &str = "No previous conversation.";

/// Render every turn as a `User:` line followed by a `Chatbot:` line.
pub fn format(turns: &[Turn]) -> String {
    format_with_window(turns, &HistoryWindow::unbounded())
}

/// Render the most recent turns that fit `window`.
///
/// `max_turns` is applied first, then the oldest remaining turns are dropped
/// until the text fits `max_chars`. If no turn fits, the sentinel is returned.
pub fn format_with_window(turns: &[Turn], window: &HistoryWindow) -> String {
    let start = window
        .max_turns
        .map_or(0, |max| turns.len().saturating_sub(max));
    let rendered: Vec<String> = turns[start..].iter().map(render_turn).collect();

    let mut first = 0;
    if let Some(budget) = window.max_chars {
        // Joined length is the sum of parts plus one newline between each.
        let mut total: usize = rendered.iter().map(|part| part.chars().count()).sum::<usize>()
            + rendered.len().saturating_sub(1);
        while first < rendered.len() && total > budget {
            total = total.saturating_sub(rendered[first].chars().count() + 1);
            first += 1;
        }
    }

    let kept = &rendered[first..];
    if kept.len() < turns.len() {
        debug!(
            "history windowed (turns={}, rendered={})",
            turns.len(),
            kept.len()
        );
    }
    if kept.is_empty() {
        return NO_HISTORY.to_string();
    }
    kept.join("\n")
}

fn render_turn(turn: &Turn) -> String {
    format!("User: {}\nChatbot: {}", turn.user, turn.response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn turns(n: usize) -> Vec<Turn> {
        (1..=n)
            .map(|i| Turn::new(format!("q{i}"), format!("a{i}")))
            .collect()
    }

    #[test]
    fn empty_history_renders_sentinel() {
        assert_eq!(format(&[]), "No previous conversation.");
    }

    #[test]
    fn turns_render_in_chronological_order() {
        let text = format(&[
            Turn::new("I feel anxious", "That sounds hard."),
            Turn::new("What helps?", "Slow breathing can help."),
        ]);
        assert_eq!(
            text,
            "User: I feel anxious\nChatbot: That sounds hard.\nUser: What helps?\nChatbot: Slow breathing can help."
        );
    }

    #[test]
    fn window_keeps_most_recent_turns() {
        let window = HistoryWindow::new(Some(2), None);
        assert_eq!(
            format_with_window(&turns(4), &window),
            "User: q3\nChatbot: a3\nUser: q4\nChatbot: a4"
        );
    }

    #[test]
    fn char_budget_drops_oldest_turns() {
        let one = "User: q3\nChatbot: a3".chars().count();
        let window = HistoryWindow::new(None, Some(one));
        assert_eq!(
            format_with_window(&turns(3), &window),
            "User: q3\nChatbot: a3"
        );
    }

    #[test]
    fn budget_smaller_than_one_turn_renders_sentinel() {
        let window = HistoryWindow::new(None, Some(5));
        assert_eq!(format_with_window(&turns(2), &window), NO_HISTORY);
    }

    #[test]
    fn zero_turn_window_renders_sentinel() {
        let window = HistoryWindow::new(Some(0), None);
        assert_eq!(format_with_window(&turns(2), &window), NO_HISTORY);
    }
}
