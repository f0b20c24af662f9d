//! Async driver: pulls generation events one at a time and feeds the annotator.
//!
//! Single consumer, single suspension point (`next()` on the event source).
//! The output is pull-based too: nothing is read from upstream until the
//! response body asks for the next chunk, so a slow client pauses generation
//! instead of growing a buffer. Dropping the returned stream drops the event
//! source, which closes the upstream connection.

use futures::{Stream, StreamExt};
use tokio::time::{timeout_at, Instant};
use tracing::{info, warn};
use uuid::Uuid;

use crate::chat::annotator::StreamAnnotator;
use crate::llm_client::EventStream;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    Completed,
    TimedOut,
    UpstreamFailed,
}

/// Logs how a turn ended. If the stream is dropped before an outcome is
/// recorded, the client went away.
struct TurnGuard {
    turn_id: Uuid,
    outcome: Option<TurnOutcome>,
    bytes_out: usize,
}

impl Drop for TurnGuard {
    fn drop(&mut self) {
        match self.outcome {
            Some(outcome) => info!(
                turn_id = %self.turn_id,
                ?outcome,
                bytes_out = self.bytes_out,
                "Chat turn finished"
            ),
            None => info!(
                turn_id = %self.turn_id,
                bytes_out = self.bytes_out,
                "Client disconnected; generation cancelled"
            ),
        }
    }
}

/// Turns an event stream into output text chunks. Every way the source can
/// end (normal end, error, deadline) goes through `StreamAnnotator::finish`.
pub fn annotate_stream(
    events: EventStream,
    deadline: Instant,
    turn_id: Uuid,
) -> impl Stream<Item = String> + Send {
    async_stream::stream! {
        let mut events = events;
        let mut annotator = StreamAnnotator::new();
        let mut guard = TurnGuard {
            turn_id,
            outcome: None,
            bytes_out: 0,
        };

        loop {
            let mut chunk = String::new();
            let outcome = match timeout_at(deadline, events.next()).await {
                Ok(Some(Ok(event))) => {
                    annotator.push(&event, &mut chunk);
                    None
                }
                Ok(Some(Err(e))) => {
                    warn!(turn_id = %turn_id, "Generation failed mid-stream: {e}");
                    Some(TurnOutcome::UpstreamFailed)
                }
                Ok(None) => Some(TurnOutcome::Completed),
                Err(_) => {
                    warn!(
                        turn_id = %turn_id,
                        state = ?annotator.state(),
                        "Turn deadline reached; ending stream"
                    );
                    Some(TurnOutcome::TimedOut)
                }
            };

            if outcome.is_some() {
                annotator.finish(&mut chunk);
                guard.outcome = outcome;
            }

            if !chunk.is_empty() {
                guard.bytes_out += chunk.len();
                yield chunk;
            }

            if outcome.is_some() {
                break;
            }
        }
    }
}

/// Drives a whole turn to completion and returns the concatenated output.
pub async fn collect_turn(events: EventStream, deadline: Instant, turn_id: Uuid) -> String {
    annotate_stream(events, deadline, turn_id)
        .collect::<Vec<_>>()
        .await
        .concat()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use futures::stream;

    use super::*;
    use crate::llm_client::{GenerationEvent, LlmError};

    fn events(items: Vec<Result<GenerationEvent, LlmError>>) -> EventStream {
        Box::pin(stream::iter(items))
    }

    fn far_deadline() -> Instant {
        Instant::now() + Duration::from_secs(60)
    }

    #[tokio::test]
    async fn test_normal_end() {
        let out = collect_turn(
            events(vec![
                Ok(GenerationEvent::reasoning("Hello")),
                Ok(GenerationEvent::reasoning(" world")),
                Ok(GenerationEvent::answer("Done.")),
            ]),
            far_deadline(),
            Uuid::new_v4(),
        )
        .await;
        assert_eq!(out, "<think>Hello world</think>Done.");
    }

    #[tokio::test]
    async fn test_mid_stream_error_closes_block_and_keeps_prior_output() {
        let out = collect_turn(
            events(vec![
                Ok(GenerationEvent::reasoning("partial")),
                Err(LlmError::Stream("connection reset".to_string())),
                Ok(GenerationEvent::answer("never seen")),
            ]),
            far_deadline(),
            Uuid::new_v4(),
        )
        .await;
        assert_eq!(out, "<think>partial</think>");
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_closes_open_block() {
        let source = stream::iter(vec![Ok(GenerationEvent::reasoning("slow"))])
            .chain(stream::pending());
        let deadline = Instant::now() + Duration::from_secs(5);
        let out = collect_turn(Box::pin(source), deadline, Uuid::new_v4()).await;
        assert_eq!(out, "<think>slow</think>");
    }

    #[tokio::test]
    async fn test_chunks_follow_event_order() {
        let chunks: Vec<String> = annotate_stream(
            events(vec![
                Ok(GenerationEvent::reasoning("a")),
                Ok(GenerationEvent::answer("b")),
                Ok(GenerationEvent::answer("c")),
            ]),
            far_deadline(),
            Uuid::new_v4(),
        )
        .collect()
        .await;
        assert_eq!(chunks, vec!["<think>a", "</think>b", "c"]);
    }
}
