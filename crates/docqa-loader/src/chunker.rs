//! Bounded-length windowing over extracted document text.
//!
//! Each segment targets `max_chars` characters and shares `overlap_chars`
//! with its predecessor so retrieval does not lose context at the seams.
//! Cuts prefer a paragraph break, then a sentence break, in the tail half
//! of the window; only when neither exists does the window hard-cut.

use docqa_core::config::ChunkingSettings;
use docqa_core::types::{Meta, Segment};

const PARAGRAPH_BREAK: &str = "\n\n";
const SENTENCE_BREAKS: [&str; 6] = [". ", ".\n", "? ", "?\n", "! ", "!\n"];

pub struct Chunker {
    max_chars: usize,
    overlap_chars: usize,
}

impl Chunker {
    pub fn new(settings: ChunkingSettings) -> Self {
        let max_chars = settings.max_chars.max(1);
        // Overlap must leave room to advance.
        let overlap_chars = settings.overlap_chars.min(max_chars - 1);
        Self { max_chars, overlap_chars }
    }

    /// Split `text` into overlapping segments. Always produces at least one
    /// segment for non-empty text; spans are byte ranges into `text` and
    /// never split a UTF-8 character.
    pub fn split(&self, text: &str) -> Vec<Segment> {
        // Byte offset of every char position, plus an end sentinel, so the
        // window arithmetic runs in char space while spans stay byte ranges.
        let offsets: Vec<usize> = text
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(text.len()))
            .collect();
        let n_chars = offsets.len() - 1;

        let mut segments: Vec<Segment> = Vec::new();
        let mut start = 0usize;
        while start < n_chars {
            let window_end = (start + self.max_chars).min(n_chars);
            let cut = if window_end == n_chars {
                n_chars
            } else {
                self.pick_cut(text, &offsets, start, window_end)
            };

            let span = offsets[start]..offsets[cut];
            let id = segments.len();
            let mut meta = Meta::new();
            meta.insert("chunk_index".to_string(), id.to_string());
            segments.push(Segment { id, text: text[span.clone()].to_string(), span, meta });

            if cut >= n_chars {
                break;
            }
            start = cut.saturating_sub(self.overlap_chars).max(start + 1);
        }
        segments
    }

    /// Choose a cut position (in chars) for a full window. Looks for the
    /// last paragraph break, then the last sentence break, within the tail
    /// half of the window; falls back to a hard cut at `window_end`.
    fn pick_cut(&self, text: &str, offsets: &[usize], start: usize, window_end: usize) -> usize {
        let tail_start = start + (window_end - start) / 2;
        let haystack = &text[offsets[tail_start]..offsets[window_end]];

        let break_at = |byte_in_tail: usize| -> Option<usize> {
            let absolute = offsets[tail_start] + byte_in_tail;
            offsets.binary_search(&absolute).ok()
        };

        if let Some(pos) = haystack.rfind(PARAGRAPH_BREAK) {
            if let Some(cut) = break_at(pos + PARAGRAPH_BREAK.len()) {
                return cut;
            }
        }

        let sentence_cut = SENTENCE_BREAKS
            .iter()
            .filter_map(|pat| haystack.rfind(pat).map(|pos| pos + pat.len()))
            .max();
        if let Some(pos) = sentence_cut {
            if let Some(cut) = break_at(pos) {
                return cut;
            }
        }

        window_end
    }
}
