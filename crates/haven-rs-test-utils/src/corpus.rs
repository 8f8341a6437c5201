//! A tiny markdown corpus for end-to-end tests.

use std::path::Path;

pub const BREATHING_TEXT: &str = "Box breathing for anxiety: breathe in slowly for four counts, \
hold your breath for four counts, breathe out for four counts and hold again. \
Slow breathing calms the nervous system when you feel anxious or panicked.";

const SLEEP_TEXT: &str = "Sleep hygiene: keep a regular bedtime, dim screens an hour \
before bed and keep the bedroom cool and dark. A short wind-down routine helps the \
body expect rest.";

const JOURNALING_TEXT: &str = "Journaling prompts: write down three things that went \
well today, name one feeling you noticed and where you felt it in your body.";

/// Write three short markdown documents into `dir`, one chunk each at the default chunk size.
pub fn seed_corpus(dir: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(dir)?;
    std::fs::write(dir.join("breathing.md"), BREATHING_TEXT)?;
    std::fs::write(dir.join("journaling.md"), JOURNALING_TEXT)?;
    std::fs::write(dir.join("sleep.md"), SLEEP_TEXT)?;
    Ok(())
}

/// The passage a "How can I calm down?" query should surface.
pub const CALMING_TEXT: &str = "Breathing exercises can help reduce anxiety.";

const SUPPORT_DOCS: &[(&str, &str)] = &[
    ("breathing.md", CALMING_TEXT),
    (
        "down-days.md",
        "How I handle down days: I let myself rest, text a friend and go for a short walk.",
    ),
    (
        "friends.md",
        "How to talk to a friend who is struggling: listen first and ask what would help.",
    ),
    (
        "grounding.md",
        "Grounding: name five things I can see, four I can touch and three I can hear.",
    ),
    (
        "exams.md",
        "Study plans work better with short sessions, breaks and enough sleep before exams.",
    ),
    (
        "budget.md",
        "Student budgets: track rent, groceries and transport costs each month.",
    ),
    (
        "campus.md",
        "The campus library opens at eight and the counselling office is on the second floor.",
    ),
];

/// Write seven one-line markdown documents into `dir`; only one is about calming down.
pub fn seed_support_corpus(dir: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(dir)?;
    for (name, text) in SUPPORT_DOCS {
        std::fs::write(dir.join(name), text)?;
    }
    Ok(())
}
