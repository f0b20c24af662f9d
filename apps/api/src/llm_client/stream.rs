//! Decoding of streamed chat-completion chunks into generation events.

use serde::Deserialize;

use super::{GenerationEvent, LlmError};

/// SSE payload signalling the end of the stream.
pub const DONE_MARKER: &str = "[DONE]";

#[derive(Debug, Deserialize)]
struct ChatCompletionChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
    error: Option<ChunkError>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: ChunkDelta,
}

#[derive(Debug, Default, Deserialize)]
struct ChunkDelta {
    reasoning_content: Option<String>,
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChunkError {
    message: String,
    #[serde(default)]
    code: Option<u16>,
}

/// Parses one SSE `data:` payload. A chunk may carry reasoning and answer text
/// at once; reasoning is emitted first. Empty deltas are dropped.
pub fn parse_chunk(data: &str) -> Result<Vec<GenerationEvent>, LlmError> {
    let chunk: ChatCompletionChunk = serde_json::from_str(data)?;

    if let Some(error) = chunk.error {
        return Err(LlmError::Api {
            status: error.code.unwrap_or(500),
            message: error.message,
        });
    }

    let mut events = Vec::new();
    for choice in chunk.choices {
        if let Some(text) = choice.delta.reasoning_content.filter(|t| !t.is_empty()) {
            events.push(GenerationEvent::reasoning(text));
        }
        if let Some(text) = choice.delta.content.filter(|t| !t.is_empty()) {
            events.push(GenerationEvent::answer(text));
        }
    }
    Ok(events)
}
