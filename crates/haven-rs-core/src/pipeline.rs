//! The answer pipeline as an ordered list of named stages.

use crate::error::HavenCoreError;
use crate::generator::Generator;
use crate::prompt::{Prompt, PromptAssembler, PromptError};
use haven_rs_memory::{ConversationState, HistoryWindow, Turn, format_with_window};
use haven_rs_rag::{RetrievedChunk, VectorIndex};
use log::debug;
use std::fmt;
use std::sync::Arc;

/// Stages of one answer, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Validate,
    Retrieve,
    RecallHistory,
    Assemble,
    Generate,
    Record,
}

impl Stage {
    pub const ALL: [Stage; 6] = [
        Stage::Validate,
        Stage::Retrieve,
        Stage::RecallHistory,
        Stage::Assemble,
        Stage::Generate,
        Stage::Record,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Validate => "validate",
            Stage::Retrieve => "retrieve",
            Stage::RecallHistory => "recall_history",
            Stage::Assemble => "assemble",
            Stage::Generate => "generate",
            Stage::Record => "record",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything one run produced. `state` already contains the new turn.
#[derive(Debug, Clone)]
pub struct AnswerOutcome {
    pub answer: String,
    pub state: ConversationState,
    pub prompt: Prompt,
    pub retrieved: Vec<RetrievedChunk>,
}

/// Validate, Retrieve, RecallHistory, Assemble, Generate, Record.
#[derive(Debug, Clone)]
pub struct AnswerPipeline {
    index: Arc<VectorIndex>,
    k: usize,
    window: HistoryWindow,
    assembler: PromptAssembler,
    generator: Generator,
}

impl AnswerPipeline {
    pub fn new(
        index: Arc<VectorIndex>,
        k: usize,
        window: HistoryWindow,
        assembler: PromptAssembler,
        generator: Generator,
    ) -> Self {
        Self {
            index,
            k,
            window,
            assembler,
            generator,
        }
    }

    /// Run every stage in [`Stage::ALL`] order. The caller's state is only
    /// replaced on success.
    pub async fn run(
        &self,
        question: &str,
        mut state: ConversationState,
    ) -> Result<AnswerOutcome, HavenCoreError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(PromptError::EmptyQuestion.into());
        }
        stage_complete(Stage::Validate, &state);

        let retrieved = self.index.query(question, self.k).await?;
        stage_complete(Stage::Retrieve, &state);

        let history = format_with_window(state.turns(), &self.window);
        stage_complete(Stage::RecallHistory, &state);

        let prompt = self.assembler.assemble(question, &retrieved, &history)?;
        stage_complete(Stage::Assemble, &state);

        let answer = self.generator.generate(&prompt).await?;
        stage_complete(Stage::Generate, &state);

        state.push(Turn::new(question, answer.clone()));
        stage_complete(Stage::Record, &state);

        Ok(AnswerOutcome {
            answer,
            state,
            prompt,
            retrieved,
        })
    }
}

fn stage_complete(stage: Stage, state: &ConversationState) {
    debug!(
        "pipeline stage complete (stage={}, session_id={})",
        stage, state.session_id
    );
}
