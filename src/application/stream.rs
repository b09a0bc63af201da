//! # Stream Reassembly
//!
//! Turns a sequence of raw chunks into live fragments plus one final document.
//!
//! A chunk is either a JSON record (`{"response": "...", "done": false}`, with
//! `delta` / `text` accepted as the partial-text field) or a line of raw text.
//! Each chunk is interpreted on its own by [`interpret`]; the results are folded
//! into a [`Reassembly`], which yields the immutable [`Reassembled`] at the end.

use futures::{Stream, StreamExt};
use serde::Deserialize;
use serde_json::Value;

use crate::domain::error::StreamError;
use crate::domain::signal::AbortSignal;
use crate::domain::types::{Reassembled, ResponseMetrics};

/// Wire shape of a structured chunk. Every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct StreamRecord {
    response: Option<String>,
    delta: Option<String>,
    text: Option<String>,
    done: Option<bool>,
    error: Option<Value>,
    total_duration: Option<u64>,
    load_duration: Option<u64>,
    prompt_eval_count: Option<u64>,
    prompt_eval_duration: Option<u64>,
    eval_count: Option<u64>,
    eval_duration: Option<u64>,
    context: Option<Vec<Value>>,
}

impl StreamRecord {
    fn fragment(&self) -> Option<&str> {
        [&self.response, &self.delta, &self.text]
            .into_iter()
            .filter_map(|f| f.as_deref())
            .find(|s| !s.is_empty())
    }

    fn error_message(&self) -> Option<String> {
        match self.error.as_ref()? {
            Value::Null => None,
            Value::String(s) if s.is_empty() => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    fn metrics(&self) -> Option<ResponseMetrics> {
        let metrics = ResponseMetrics {
            total_duration: self.total_duration,
            load_duration: self.load_duration,
            prompt_eval_count: self.prompt_eval_count,
            prompt_eval_duration: self.prompt_eval_duration,
            eval_count: self.eval_count,
            eval_duration: self.eval_duration,
            context_tokens: self.context.as_ref().map(Vec::len),
        };
        (!metrics.is_empty()).then_some(metrics)
    }
}

/// What a single chunk contributes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Step {
    pub fragment: Option<String>,
    /// The backend marked the response complete; stop reading.
    pub done: bool,
    pub metrics: Option<ResponseMetrics>,
}

/// Interprets one chunk. An explicit error field is a protocol error.
pub fn interpret(chunk: &str) -> Result<Step, StreamError> {
    let trimmed = chunk.trim();
    if trimmed.starts_with('{') {
        if let Ok(record) = serde_json::from_str::<StreamRecord>(trimmed) {
            if let Some(message) = record.error_message() {
                return Err(StreamError::Protocol(message));
            }
            return Ok(Step {
                fragment: record.fragment().map(str::to_string),
                done: record.done.unwrap_or(false),
                metrics: record.metrics(),
            });
        }
    }

    Ok(Step {
        fragment: (!trimmed.is_empty()).then(|| chunk.to_string()),
        ..Step::default()
    })
}

/// Accumulator for the fold over chunks.
#[derive(Debug, Default)]
pub struct Reassembly {
    text: String,
    metrics: Option<ResponseMetrics>,
}

impl Reassembly {
    /// Folds one chunk in and returns what it contributed.
    pub fn apply(&mut self, chunk: &str) -> Result<Step, StreamError> {
        let step = interpret(chunk)?;
        if let Some(fragment) = &step.fragment {
            self.text.push_str(fragment);
        }
        if step.metrics.is_some() {
            self.metrics = step.metrics.clone();
        }
        Ok(step)
    }

    pub fn finish(self) -> Reassembled {
        Reassembled {
            text: self.text,
            metrics: self.metrics,
        }
    }
}

/// Consumes `chunks` in arrival order, handing every fragment to `on_fragment`
/// as soon as it is read.
///
/// Stops at the first `done` record, the end of the stream, an error chunk, a
/// source error, a sink error, or an abort. An abort observed while waiting
/// for the next chunk wins over a chunk that is ready at the same time.
pub async fn reassemble<S, F>(
    mut chunks: S,
    abort: &mut AbortSignal,
    mut on_fragment: F,
) -> Result<Reassembled, StreamError>
where
    S: Stream<Item = anyhow::Result<String>> + Unpin,
    F: FnMut(&str) -> anyhow::Result<()>,
{
    let mut reassembly = Reassembly::default();
    let mut received = 0usize;

    loop {
        if abort.is_aborted() {
            tracing::debug!(received, "Stream cancelled");
            return Err(StreamError::Cancelled);
        }

        let next = tokio::select! {
            biased;
            _ = abort.aborted() => {
                tracing::debug!(received, "Stream cancelled while waiting");
                return Err(StreamError::Cancelled);
            }
            item = chunks.next() => item,
        };

        let Some(item) = next else {
            tracing::debug!(received, "Stream ended without done marker");
            break;
        };
        received += 1;

        let chunk = item.map_err(StreamError::Source)?;
        let step = reassembly.apply(&chunk)?;
        if let Some(fragment) = &step.fragment {
            on_fragment(fragment).map_err(StreamError::Sink)?;
        }
        if step.done {
            break;
        }
    }

    let reassembled = reassembly.finish();
    tracing::debug!(received, chars = reassembled.text.len(), "Stream reassembled");
    Ok(reassembled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::signal::abort_channel;
    use futures::stream;
    use std::time::Duration;
    use tokio::sync::mpsc;
    use tokio_stream::wrappers::ReceiverStream;

    fn chunks(lines: &[&str]) -> impl Stream<Item = anyhow::Result<String>> + Unpin {
        stream::iter(
            lines
                .iter()
                .map(|l| Ok(l.to_string()))
                .collect::<Vec<anyhow::Result<String>>>(),
        )
    }

    #[test]
    fn test_interpret_record_and_raw() {
        let step = interpret(r#"{"response":"Hel","done":false}"#).unwrap();
        assert_eq!(step.fragment.as_deref(), Some("Hel"));
        assert!(!step.done);

        let step = interpret(r#"{"delta":"lo"}"#).unwrap();
        assert_eq!(step.fragment.as_deref(), Some("lo"));

        let step = interpret(r#"{"text":"!","done":true}"#).unwrap();
        assert_eq!(step.fragment.as_deref(), Some("!"));
        assert!(step.done);

        let step = interpret("plain words").unwrap();
        assert_eq!(step.fragment.as_deref(), Some("plain words"));

        let step = interpret("{not json").unwrap();
        assert_eq!(step.fragment.as_deref(), Some("{not json"));

        assert_eq!(interpret("   ").unwrap(), Step::default());
    }

    #[test]
    fn test_fold_keeps_last_metrics() {
        let mut reassembly = Reassembly::default();
        reassembly.apply(r#"{"response":"x","eval_count":1}"#).unwrap();
        reassembly.apply("y").unwrap();
        reassembly.apply(r#"{"done":true,"eval_count":9}"#).unwrap();

        let out = reassembly.finish();
        assert_eq!(out.text, "xy");
        assert_eq!(out.metrics.and_then(|m| m.eval_count), Some(9));
    }

    #[test]
    fn test_interpret_error_record() {
        let err = interpret(r#"{"error":"model 'x' not found"}"#).unwrap_err();
        assert!(matches!(err, StreamError::Protocol(ref m) if m == "model 'x' not found"));

        // Empty error field is not an error.
        let step = interpret(r#"{"response":"ok","error":""}"#).unwrap();
        assert_eq!(step.fragment.as_deref(), Some("ok"));
    }

    #[tokio::test]
    async fn test_reassemble_mixed_chunks() {
        let mut seen = Vec::new();
        let out = reassemble(
            chunks(&[
                r#"{"response":"Hello","done":false}"#,
                "raw line",
                r#"{"response":"","done":false}"#,
                r#"{"response":" world","done":false}"#,
            ]),
            &mut AbortSignal::never(),
            |f| {
                seen.push(f.to_string());
                Ok(())
            },
        )
        .await
        .unwrap();

        assert_eq!(seen, vec!["Hello", "raw line", " world"]);
        assert_eq!(out.text, "Helloraw line world");
        assert_eq!(out.metrics, None);
    }

    #[tokio::test]
    async fn test_done_stops_reading_and_keeps_metrics() {
        let mut seen = Vec::new();
        let out = reassemble(
            chunks(&[
                r#"{"response":"a"}"#,
                r#"{"response":"b","done":true,"total_duration":2000000,"eval_count":7,"context":[1,2,3]}"#,
                r#"{"response":"never"}"#,
            ]),
            &mut AbortSignal::never(),
            |f| {
                seen.push(f.to_string());
                Ok(())
            },
        )
        .await
        .unwrap();

        assert_eq!(seen, vec!["a", "b"]);
        assert_eq!(out.text, "ab");
        let metrics = out.metrics.unwrap();
        assert_eq!(metrics.total_duration, Some(2_000_000));
        assert_eq!(metrics.eval_count, Some(7));
        assert_eq!(metrics.context_tokens, Some(3));
    }

    #[tokio::test]
    async fn test_error_chunk_aborts() {
        let mut seen = Vec::new();
        let err = reassemble(
            chunks(&[r#"{"response":"a"}"#, r#"{"error":"overloaded"}"#, "later"]),
            &mut AbortSignal::never(),
            |f| {
                seen.push(f.to_string());
                Ok(())
            },
        )
        .await
        .unwrap_err();

        assert!(matches!(err, StreamError::Protocol(_)));
        assert_eq!(seen, vec!["a"]);
    }

    #[tokio::test]
    async fn test_sink_error_is_not_stream_error() {
        let mut calls = 0;
        let err = reassemble(
            chunks(&["one", "two", "three"]),
            &mut AbortSignal::never(),
            |_| {
                calls += 1;
                if calls == 2 {
                    anyhow::bail!("terminal closed");
                }
                Ok(())
            },
        )
        .await
        .unwrap_err();

        assert!(matches!(err, StreamError::Sink(_)));
        assert_eq!(err.to_string(), "terminal closed");
        assert_eq!(calls, 2);
    }

    #[tokio::test]
    async fn test_source_error() {
        let source = stream::iter(vec![
            Ok("fine".to_string()),
            Err(anyhow::anyhow!("connection reset")),
        ]);
        let err = reassemble(source, &mut AbortSignal::never(), |_| Ok(()))
            .await
            .unwrap_err();
        assert!(matches!(err, StreamError::Source(_)));
        assert!(err.is_interruption());
    }

    #[tokio::test]
    async fn test_cancel_while_waiting() {
        let (tx, rx) = mpsc::channel::<anyhow::Result<String>>(4);
        let (handle, mut signal) = abort_channel();
        tx.send(Ok("first".into())).await.unwrap();

        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(30)).await;
            handle.abort();
            // Delivered after the abort; must never reach the callback.
            let _ = tx.send(Ok("second".into())).await;
        });

        let mut seen = Vec::new();
        let err = reassemble(ReceiverStream::new(rx), &mut signal, |f| {
            seen.push(f.to_string());
            Ok(())
        })
        .await
        .unwrap_err();
        canceller.await.unwrap();

        assert!(matches!(err, StreamError::Cancelled));
        assert!(!matches!(err, StreamError::Protocol(_)));
        assert_eq!(seen, vec!["first"]);
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let (handle, mut signal) = abort_channel();
        handle.abort();

        let mut calls = 0;
        let err = reassemble(chunks(&["ready"]), &mut signal, |_| {
            calls += 1;
            Ok(())
        })
        .await
        .unwrap_err();

        assert!(matches!(err, StreamError::Cancelled));
        assert_eq!(calls, 0);
    }
}
