//! Test helpers shared across Haven crates.

pub mod audio;
pub mod corpus;
pub mod llm;
pub mod speech;

pub use audio::{write_silence, write_tone};
pub use corpus::{BREATHING_TEXT, CALMING_TEXT, seed_corpus, seed_support_corpus};
pub use llm::{FailingLLM, FixedChatResponse, FixedLLM, RecordingChatLLM, SlowLLM};
pub use speech::{StubRecognizer, StubSynthesizer};
