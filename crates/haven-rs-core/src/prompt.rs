//! Prompt assembly: persona, history, retrieved context and the question.

use haven_rs_config::PromptConfig;
use haven_rs_rag::RetrievedChunk;
use thiserror::Error;
use uuid::Uuid;

/// Built-in persona for the support companion.
pub const DEFAULT_PERSONA: &str = "You are a mental health support chatbot.
Your role is to provide emotional support, validation, and gentle guidance.
You are not a therapist or doctor.

Rules:
- Respond in a calm, warm, and empathetic tone.
- Keep answers short: maximum 2-4 sentences.
- Use simple, conversational language.
- Do not lecture or over-explain.
- Do not give medical or diagnostic advice.
- Avoid lists unless absolutely necessary.
- If the user is distressed, validate their feelings first before responding.
- Encourage gentle reflection, not solutions.

If the user asks something outside mental health support, answer briefly and steer back to emotional well-being.
If you do not know something, say so gently.";

const HISTORY_HEADER: &str = "Conversation so far:";
const CONTEXT_HEADER: &str = "Context:";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PromptError {
    #[error("question is empty")]
    EmptyQuestion,
}

/// A fully rendered prompt plus the chunks that grounded it.
#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    pub text: String,
    pub chunk_ids: Vec<Uuid>,
}

/// Deterministic four-slot template.
#[derive(Debug, Clone)]
pub struct PromptAssembler {
    persona: String,
}

impl Default for PromptAssembler {
    fn default() -> Self {
        Self {
            persona: DEFAULT_PERSONA.to_string(),
        }
    }
}

impl PromptAssembler {
    pub fn new(persona: impl Into<String>) -> Self {
        Self {
            persona: persona.into(),
        }
    }

    /// Persona override first, then any additional instructions appended under their own heading.
    pub fn from_config(config: &PromptConfig) -> Self {
        let mut persona = config
            .persona
            .as_deref()
            .map(str::trim)
            .filter(|persona| !persona.is_empty())
            .unwrap_or(DEFAULT_PERSONA)
            .to_string();
        if let Some(extra) = config
            .additional_instructions
            .as_deref()
            .map(str::trim)
            .filter(|extra| !extra.is_empty())
        {
            persona.push_str("\n\nAdditional instructions:\n");
            persona.push_str(extra);
        }
        Self { persona }
    }

    pub fn persona(&self) -> &str {
        &self.persona
    }

    pub fn assemble(
        &self,
        question: &str,
        chunks: &[RetrievedChunk],
        history: &str,
    ) -> Result<Prompt, PromptError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(PromptError::EmptyQuestion);
        }
        let context = chunks
            .iter()
            .map(|retrieved| retrieved.chunk.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");
        let text = format!(
            "{persona}\n\n{HISTORY_HEADER}\n{history}\n\n{CONTEXT_HEADER}\n{context}\n\nUser: {question}\nChatbot:",
            persona = self.persona,
        );
        Ok(Prompt {
            text,
            chunk_ids: chunks.iter().map(|retrieved| retrieved.chunk.id).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use haven_rs_rag::{Chunk, DocumentMetadata};
    use pretty_assertions::assert_eq;

    fn retrieved(text: &str, ordinal: usize) -> RetrievedChunk {
        RetrievedChunk {
            chunk: Chunk::new(
                text.to_string(),
                DocumentMetadata {
                    source: "guide.pdf".to_string(),
                    page: Some(0),
                },
                ordinal,
            ),
            score: 1.0,
        }
    }

    #[test]
    fn slots_appear_in_fixed_order() {
        let chunks = vec![retrieved("first chunk", 0), retrieved("second chunk", 1)];
        let prompt = PromptAssembler::new("PERSONA")
            .assemble(
                "How can I relax?",
                &chunks,
                "User: hi\nChatbot: hello",
            )
            .expect("prompt");
        assert_eq!(
            prompt.text,
            "PERSONA\n\nConversation so far:\nUser: hi\nChatbot: hello\n\nContext:\nfirst chunk\n\nsecond chunk\n\nUser: How can I relax?\nChatbot:"
        );
        assert_eq!(
            prompt.chunk_ids,
            vec![chunks[0].chunk.id, chunks[1].chunk.id]
        );
    }

    #[test]
    fn identical_inputs_give_identical_prompts() {
        let chunks = vec![retrieved("breathe slowly", 0)];
        let assembler = PromptAssembler::default();
        let a = assembler.assemble("q", &chunks, "h").expect("a");
        let b = assembler.assemble("q", &chunks, "h").expect("b");
        assert_eq!(a, b);
        assert!(a.text.starts_with("You are a mental health support chatbot."));
    }

    #[test]
    fn blank_question_is_rejected() {
        let err = PromptAssembler::default()
            .assemble(" \t", &[], "")
            .unwrap_err();
        assert_eq!(err, PromptError::EmptyQuestion);
    }

    #[test]
    fn config_can_extend_the_persona() {
        let assembler = PromptAssembler::from_config(&PromptConfig {
            persona: None,
            additional_instructions: Some("Answer in Spanish.".to_string()),
        });
        assert!(assembler.persona().starts_with(DEFAULT_PERSONA));
        assert!(assembler.persona().ends_with("Answer in Spanish."));

        let replaced = PromptAssembler::from_config(&PromptConfig {
            persona: Some("Be brief.".to_string()),
            additional_instructions: None,
        });
        assert_eq!(replaced.persona(), "Be brief.");
    }
}
