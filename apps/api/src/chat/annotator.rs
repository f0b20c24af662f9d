//! Stream Annotator: folds the two-channel event sequence into one output
//! text with at most one thought block open at a time.
//!
//! States: `Idle` → `ThoughtOpen` on the first non-empty reasoning, →
//! `Answering` on the first answer delta. `finish` closes an open block, so
//! every block opened is closed no matter how the source ended.
//!
//! Pure: no I/O, no clocks. The async driver lives in `chat::stream`.

use crate::chat::sanitizer::{sanitize, split_partial_indicator, SanitizeMode};
use crate::llm_client::{EventKind, GenerationEvent};
use crate::markup::tokenizer::split_unterminated_tail;
use crate::markup::{THOUGHT_CLOSE, THOUGHT_OPEN};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotatorState {
    Idle,
    ThoughtOpen,
    Answering,
}

/// Trailing text that the next delta of the same kind may turn into markup or
/// an indicator: an unterminated `<...`, or a partial "thinking...".
fn split_pending(text: &str) -> (&str, &str) {
    match split_unterminated_tail(text) {
        (ready, "") => split_partial_indicator(ready),
        split => split,
    }
}

/// One instance per turn. Never reused across requests.
#[derive(Debug)]
pub struct StreamAnnotator {
    state: AnnotatorState,
    /// Trailing unterminated `<...` waiting for the rest of its tag.
    pending: String,
    pending_kind: Option<EventKind>,
    finished: bool,
}

impl Default for StreamAnnotator {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamAnnotator {
    pub fn new() -> Self {
        Self {
            state: AnnotatorState::Idle,
            pending: String::new(),
            pending_kind: None,
            finished: false,
        }
    }

    pub fn state(&self) -> AnnotatorState {
        self.state
    }

    /// Consumes one event, appending whatever it produces to `sink`.
    /// Events after `finish` are ignored.
    pub fn push(&mut self, event: &GenerationEvent, sink: &mut String) {
        if self.finished {
            return;
        }

        if self.pending_kind.is_some_and(|k| k != event.kind) {
            self.flush_pending(sink);
        }

        let mut text = std::mem::take(&mut self.pending);
        text.push_str(&event.text_delta);

        let (ready, tail) = split_pending(&text);
        if tail.is_empty() {
            self.pending_kind = None;
        } else {
            self.pending = tail.to_string();
            self.pending_kind = Some(event.kind);
        }

        self.emit(event.kind, ready, sink);
    }

    /// The stream-end transition. Flushes held-back text and closes an open
    /// thought block. Used for normal end, upstream failure, timeout and
    /// cancellation alike. Calling it again is a no-op.
    pub fn finish(&mut self, sink: &mut String) {
        if self.finished {
            return;
        }
        self.flush_pending(sink);
        if self.state == AnnotatorState::ThoughtOpen {
            sink.push_str(THOUGHT_CLOSE);
            self.state = AnnotatorState::Answering;
        }
        self.finished = true;
    }

    fn flush_pending(&mut self, sink: &mut String) {
        if let Some(kind) = self.pending_kind.take() {
            let text = std::mem::take(&mut self.pending);
            self.emit(kind, &text, sink);
        }
    }

    fn emit(&mut self, kind: EventKind, text: &str, sink: &mut String) {
        match kind {
            EventKind::Reasoning => {
                let clean = sanitize(text, SanitizeMode::Reasoning);
                if clean.is_empty() {
                    return;
                }
                if self.state != AnnotatorState::ThoughtOpen {
                    // Reasoning after answer text starts a new block; the
                    // finished message is merged back to one block later.
                    sink.push_str(THOUGHT_OPEN);
                    self.state = AnnotatorState::ThoughtOpen;
                }
                sink.push_str(&clean);
            }
            EventKind::Answer => {
                if self.state == AnnotatorState::ThoughtOpen {
                    sink.push_str(THOUGHT_CLOSE);
                }
                self.state = AnnotatorState::Answering;
                sink.push_str(&sanitize(text, SanitizeMode::General));
            }
        }
    }
}
