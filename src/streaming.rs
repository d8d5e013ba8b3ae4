use crate::backend::{ChatBackend, ChatRequest};
use crate::conversation::ConversationId;
use crate::events::StreamEvent;
use futures::StreamExt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

const EVENT_BUFFER: usize = 256;

/// Incremental UTF-8 decoder for a byte stream.
///
/// A multi-byte character split across chunks is held back until its
/// remaining bytes arrive. Invalid sequences decode to U+FFFD.
#[derive(Debug, Default, Clone)]
pub struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode as much of `bytes` (plus any held-back tail) as possible
    pub fn decode(&mut self, bytes: &[u8]) -> String {
        self.pending.extend_from_slice(bytes);
        let mut out = String::new();

        loop {
            match std::str::from_utf8(&self.pending) {
                Ok(text) => {
                    out.push_str(text);
                    self.pending.clear();
                    break;
                }
                Err(err) => {
                    let valid = err.valid_up_to();
                    out.push_str(&String::from_utf8_lossy(&self.pending[..valid]));
                    match err.error_len() {
                        // Truncated sequence at the end: wait for more bytes
                        None => {
                            self.pending.drain(..valid);
                            break;
                        }
                        Some(len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            self.pending.drain(..valid + len);
                        }
                    }
                }
            }
        }

        out
    }

    /// Flush whatever is still held back once the stream has ended
    pub fn finish(&mut self) -> String {
        let tail = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        tail
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}

/// Accumulated reply text for the message under construction
#[derive(Debug, Default, Clone)]
pub struct ReplyAccumulator {
    text: String,
    chunks: usize,
}

impl ReplyAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and return the full text so far
    pub fn push(&mut self, chunk: &str) -> &str {
        self.text.push_str(chunk);
        self.chunks += 1;
        &self.text
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks
    }
}

/// Handle to a spawned reply stream.
///
/// Events arrive in stream order and end with either `Closed` or `Failed`.
/// Dropping the handle does not stop the task; call `abort` for that.
pub struct PendingReply {
    conversation_id: ConversationId,
    events: mpsc::Receiver<StreamEvent>,
    handle: JoinHandle<()>,
}

impl PendingReply {
    pub fn conversation_id(&self) -> &ConversationId {
        &self.conversation_id
    }

    /// Next event, or `None` once the task has finished and the channel is drained
    pub async fn next_event(&mut self) -> Option<StreamEvent> {
        self.events.recv().await
    }

    pub fn abort(&self) {
        self.handle.abort();
    }
}

/// Start streaming the reply to `request` on a background task
pub fn spawn_reply(
    backend: Arc<dyn ChatBackend>,
    request: ChatRequest,
    conversation_id: ConversationId,
) -> PendingReply {
    let (tx, rx) = mpsc::channel(EVENT_BUFFER);
    let handle = tokio::spawn(run_reply(backend, request, tx));

    PendingReply {
        conversation_id,
        events: rx,
        handle,
    }
}

async fn run_reply(
    backend: Arc<dyn ChatBackend>,
    request: ChatRequest,
    tx: mpsc::Sender<StreamEvent>,
) {
    let mut stream = match backend.chat_stream(&request).await {
        Ok(stream) => stream,
        Err(err) => {
            tracing::warn!(error = %err, "chat stream request failed");
            let _ = tx.send(StreamEvent::Failed(err.to_string())).await;
            return;
        }
    };

    if tx.send(StreamEvent::Opened).await.is_err() {
        return;
    }

    let mut decoder = Utf8Decoder::new();
    let mut received = 0usize;

    while let Some(chunk) = stream.next().await {
        match chunk {
            Ok(bytes) => {
                received += bytes.len();
                let text = decoder.decode(&bytes);
                if !text.is_empty() && tx.send(StreamEvent::Chunk(text)).await.is_err() {
                    tracing::debug!("reply receiver dropped mid-stream");
                    return;
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, received, "chat stream broke mid-body");
                let _ = tx.send(StreamEvent::Failed(err.to_string())).await;
                return;
            }
        }
    }

    let tail = decoder.finish();
    if !tail.is_empty() {
        let _ = tx.send(StreamEvent::Chunk(tail)).await;
    }

    tracing::debug!(received, "chat stream closed");
    let _ = tx.send(StreamEvent::Closed).await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_split_multibyte_characters() {
        let bytes = "café ☕".as_bytes();
        // split inside the three-byte cup
        let (head, tail) = bytes.split_at(bytes.len() - 2);

        let mut decoder = Utf8Decoder::new();
        assert_eq!(decoder.decode(head), "café ");
        assert!(decoder.has_pending());
        assert_eq!(decoder.decode(tail), "☕");
        assert!(!decoder.has_pending());
    }

    #[test]
    fn replaces_invalid_bytes_and_continues() {
        let mut decoder = Utf8Decoder::new();
        assert_eq!(decoder.decode(b"ok\xFFgo"), "ok\u{FFFD}go");
    }

    #[test]
    fn finish_flushes_truncated_tail() {
        let mut decoder = Utf8Decoder::new();
        assert_eq!(decoder.decode(&[b'a', 0xE2, 0x98]), "a");
        assert_eq!(decoder.finish(), "\u{FFFD}");
        assert!(!decoder.has_pending());
    }

    #[test]
    fn accumulator_returns_running_text() {
        let mut acc = ReplyAccumulator::new();
        assert_eq!(acc.push("Hello"), "Hello");
        assert_eq!(acc.push(" world"), "Hello world");
        assert_eq!(acc.chunk_count(), 2);
        assert_eq!(acc.text(), "Hello world");
    }
}
