//! Reader Backend
//!
//! Streams a response from any byte source (a file with a recorded response,
//! stdin, a pipe from another process). Reads happen in fixed-size chunks, so
//! a multi-byte character may be cut in half; the incomplete tail is carried
//! into the next read so every fragment is whole UTF-8 text.

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc;
use tracing::debug;

use super::traits::{ItineraryBackend, ItineraryRequest, StreamingToken};

/// Default read size in bytes
pub const DEFAULT_CHUNK_SIZE: usize = 4096;

/// Single-use backend over an async byte reader
pub struct ReaderBackend<R> {
    reader: Mutex<Option<R>>,
    chunk_size: usize,
    capacity: usize,
}

impl<R> ReaderBackend<R>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    /// Wrap a reader
    pub fn new(reader: R) -> Self {
        Self {
            reader: Mutex::new(Some(reader)),
            chunk_size: DEFAULT_CHUNK_SIZE,
            capacity: 100,
        }
    }

    /// Bytes per read
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Channel capacity
    #[must_use]
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }
}

#[async_trait]
impl<R> ItineraryBackend for ReaderBackend<R>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    fn name(&self) -> &'static str {
        "Reader"
    }

    async fn send_streaming(
        &self,
        _request: &ItineraryRequest,
    ) -> anyhow::Result<mpsc::Receiver<StreamingToken>> {
        let Some(mut reader) = self.reader.lock().take() else {
            anyhow::bail!("Reader backend already consumed");
        };

        let (tx, rx) = mpsc::channel(self.capacity);
        let chunk_size = self.chunk_size;

        tokio::spawn(async move {
            let mut buf = vec![0u8; chunk_size];
            let mut carry: Vec<u8> = Vec::new();
            let mut full_response = String::new();

            loop {
                let read = match reader.read(&mut buf).await {
                    Ok(0) => break,
                    Ok(n) => n,
                    Err(e) => {
                        let _ = tx.send(StreamingToken::Error(e.to_string())).await;
                        return;
                    }
                };

                carry.extend_from_slice(&buf[..read]);
                let text = take_complete_utf8(&mut carry);
                if text.is_empty() {
                    continue;
                }

                full_response.push_str(&text);
                if tx.send(StreamingToken::Token(text)).await.is_err() {
                    // Receiver dropped, stop reading
                    return;
                }
            }

            if !carry.is_empty() {
                let tail = String::from_utf8_lossy(&carry).into_owned();
                full_response.push_str(&tail);
                if tx.send(StreamingToken::Token(tail)).await.is_err() {
                    return;
                }
            }

            debug!(bytes = full_response.len(), "Reader reached end of input");
            let _ = tx
                .send(StreamingToken::Complete {
                    message: full_response,
                })
                .await;
        });

        Ok(rx)
    }
}

/// Decode the longest valid prefix of `bytes`, leaving an incomplete trailing
/// sequence in place
///
/// Invalid sequences become U+FFFD.
fn take_complete_utf8(bytes: &mut Vec<u8>) -> String {
    let mut out = String::with_capacity(bytes.len());
    let mut start = 0;

    loop {
        match std::str::from_utf8(&bytes[start..]) {
            Ok(valid) => {
                out.push_str(valid);
                start = bytes.len();
                break;
            }
            Err(e) => {
                let valid_end = start + e.valid_up_to();
                out.push_str(&String::from_utf8_lossy(&bytes[start..valid_end]));
                match e.error_len() {
                    Some(bad) => {
                        out.push(char::REPLACEMENT_CHARACTER);
                        start = valid_end + bad;
                    }
                    None => {
                        // Incomplete sequence at the end: wait for more bytes
                        start = valid_end;
                        break;
                    }
                }
            }
        }
    }

    bytes.drain(..start);
    out
}
