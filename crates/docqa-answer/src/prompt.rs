//! Prompt assembly under a bounded character budget.

use docqa_core::types::RetrievalResult;

const INSTRUCTION: &str =
    "Answer using only the provided context. If the context is insufficient, say you don't know.";
const NO_CONTEXT_NOTE: &str = "(no relevant context was found)";
const SEPARATOR: &str = "\n\n";

pub struct PromptBuilder {
    budget_chars: usize,
}

impl PromptBuilder {
    pub fn new(budget_chars: usize) -> Self {
        Self { budget_chars: budget_chars.max(1) }
    }

    /// Assemble the final prompt. Context goes in retrieval order; once the
    /// budget runs out the first overflowing segment is truncated and the
    /// rest are dropped, so the lowest-ranked context always gives way first.
    pub fn build(&self, question: &str, context: &RetrievalResult) -> String {
        let context_block = if context.is_empty() {
            NO_CONTEXT_NOTE.to_string()
        } else {
            self.assemble_context(context)
        };
        format!(
            "{INSTRUCTION}\n\nContext:\n{context_block}\n\nQuestion: {question}\nAnswer:"
        )
    }

    fn assemble_context(&self, context: &RetrievalResult) -> String {
        let mut block = String::new();
        let mut remaining = self.budget_chars;
        for (rank, hit) in context.iter().enumerate() {
            // Separators between segments count against the budget too.
            let sep = if rank > 0 { SEPARATOR.chars().count() } else { 0 };
            if remaining <= sep {
                break;
            }
            let text = hit.segment.text.as_str();
            let take = text.chars().count().min(remaining - sep);
            if rank > 0 {
                block.push_str(SEPARATOR);
            }
            if take == text.chars().count() {
                block.push_str(text);
            } else {
                block.extend(text.chars().take(take));
            }
            remaining -= sep + take;
        }
        block
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docqa_core::types::{Meta, ScoredSegment, Segment};

    fn hit(id: usize, text: &str, score: f32) -> ScoredSegment {
        ScoredSegment {
            segment: Segment {
                id,
                text: text.to_string(),
                span: 0..text.len(),
                meta: Meta::new(),
            },
            score,
        }
    }

    #[test]
    fn prompt_contains_instruction_context_and_question() {
        let builder = PromptBuilder::new(1000);
        let context = vec![hit(0, "The capital of France is Paris.", 0.9)];
        let prompt = builder.build("What is the capital of France?", &context);
        assert!(prompt.contains(INSTRUCTION));
        assert!(prompt.contains("The capital of France is Paris."));
        assert!(prompt.contains("Question: What is the capital of France?"));
    }

    #[test]
    fn empty_context_gets_an_explicit_note() {
        let prompt = PromptBuilder::new(1000).build("anything?", &Vec::new());
        assert!(prompt.contains(NO_CONTEXT_NOTE));
    }

    #[test]
    fn context_appears_in_retrieval_order() {
        let builder = PromptBuilder::new(1000);
        let context = vec![hit(0, "first block", 0.9), hit(1, "second block", 0.5)];
        let prompt = builder.build("q", &context);
        let first = prompt.find("first block").expect("first present");
        let second = prompt.find("second block").expect("second present");
        assert!(first < second);
    }

    #[test]
    fn budget_truncates_lowest_ranked_first() {
        let builder = PromptBuilder::new(12);
        let context = vec![hit(0, "12345678", 0.9), hit(1, "abcdefgh", 0.5)];
        let prompt = builder.build("q", &context);
        assert!(prompt.contains("12345678"), "top hit survives whole");
        assert!(prompt.contains("ab"), "second hit is truncated to the leftover budget");
        assert!(!prompt.contains("abc"));
    }

    #[test]
    fn separators_are_charged_against_the_budget() {
        let builder = PromptBuilder::new(20);
        let context = vec![
            hit(0, "aaaaaaaa", 0.9),
            hit(1, "bbbbbbbb", 0.5),
            hit(2, "cccccccc", 0.1),
        ];
        // 8 + 2 (separator) + 8 = 18 chars; the third segment no longer fits.
        let block = builder.assemble_context(&context);
        assert!(block.chars().count() <= 20);
        assert_eq!(block, "aaaaaaaa\n\nbbbbbbbb");
    }

    #[test]
    fn exhausted_budget_drops_later_segments_entirely() {
        let builder = PromptBuilder::new(5);
        let context = vec![hit(0, "aaaaa", 0.9), hit(1, "bbbbb", 0.5), hit(2, "ccccc", 0.1)];
        let prompt = builder.build("q", &context);
        assert!(prompt.contains("aaaaa"));
        assert!(!prompt.contains('b'));
        assert!(!prompt.contains("ccccc"));
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let builder = PromptBuilder::new(3);
        let context = vec![hit(0, "ééééé", 0.9)];
        let prompt = builder.build("q", &context);
        assert!(prompt.contains("ééé"));
        assert!(!prompt.contains("éééé"));
    }
}
