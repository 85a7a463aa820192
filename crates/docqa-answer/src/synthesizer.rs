use std::sync::Arc;

use tracing::{debug, warn};

use docqa_core::error::Result;
use docqa_core::traits::Generator;
use docqa_core::types::{Answer, RetrievalResult};

use crate::prompt::PromptBuilder;

/// Turns a question plus retrieved context into an answer by delegating to
/// the external generation capability.
///
/// An empty retrieval result is a soft signal, not a failure: the
/// synthesizer still asks the model, but flags the answer as ungrounded so
/// the caller never mistakes it for document-derived content. Generation
/// failures propagate unmodified; retry policy, if any, belongs to the
/// caller.
pub struct Synthesizer {
    generator: Arc<dyn Generator>,
    prompt: PromptBuilder,
}

impl Synthesizer {
    pub fn new(generator: Arc<dyn Generator>, prompt: PromptBuilder) -> Self {
        Self { generator, prompt }
    }

    pub async fn synthesize(&self, question: &str, context: &RetrievalResult) -> Result<Answer> {
        let grounded = !context.is_empty();
        if !grounded {
            warn!("no grounding context retrieved; answer will be flagged");
        }
        let prompt = self.prompt.build(question, context);
        debug!(prompt_chars = prompt.len(), segments = context.len(), "prompt assembled");
        let text = self.generator.generate(&prompt).await?;
        Ok(Answer { text, grounded })
    }
}
