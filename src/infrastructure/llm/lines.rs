//! Splits an HTTP body into trimmed, non-empty text lines.

use anyhow::Context;
use bytes::{Bytes, BytesMut};
use futures::{Stream, StreamExt};

/// Lines are cut at `\n` on the byte level, so a multi-byte character split
/// across two network reads is decoded intact. A trailing line without a
/// newline is still yielded when the body ends.
pub fn lines<S, E>(body: S) -> impl Stream<Item = anyhow::Result<String>> + Send + 'static
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: std::error::Error + Send + Sync + 'static,
{
    async_stream::try_stream! {
        let mut body = Box::pin(body);
        let mut buffer = BytesMut::new();

        while let Some(chunk) = body.next().await {
            let chunk = chunk.context("Failed to read response body")?;
            buffer.extend_from_slice(&chunk);

            while let Some(end) = buffer.iter().position(|b| *b == b'\n') {
                let line = buffer.split_to(end + 1);
                if let Some(text) = decode(&line)? {
                    yield text;
                }
            }
        }

        if let Some(text) = decode(&buffer)? {
            yield text;
        }
    }
}

fn decode(raw: &[u8]) -> anyhow::Result<Option<String>> {
    let text = std::str::from_utf8(raw).context("Response line is not valid UTF-8")?;
    let text = text.trim();
    Ok((!text.is_empty()).then(|| text.to_string()))
}
