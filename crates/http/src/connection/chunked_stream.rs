//! Streaming engine for chunked responses.
//!
//! The engine pulls one chunk at a time and never asks for the next chunk
//! before the previous one was completely written, so a slow peer slows the
//! generator down:
//!
//! ```text
//! AwaitChunk --chunk written--> ChunkSent --> AwaitChunk --> ... --terminal chunk--> Done
//! ```
//!
//! Chunks queued by the application after it started the stream are written
//! first, in the order they were queued. The generator is polled after that,
//! and a zero-length chunk or the end of the generator finishes the stream with
//! the terminal `0\r\n\r\n` frame. The generator is never polled again once it
//! has finished.

use std::collections::VecDeque;

use bytes::{Bytes, BytesMut};
use futures::StreamExt;
use futures::stream::BoxStream;
use tokio::io::AsyncWrite;
use tokio_util::codec::Encoder;
use tracing::{debug, trace};

use crate::codec::ChunkedEncoder;
use crate::connection::MessageWriter;
use crate::protocol::{PayloadItem, SendError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StreamState {
    AwaitChunk,
    ChunkSent,
    Done,
}

pub struct ChunkedStream {
    generator: BoxStream<'static, Bytes>,
    queued: VecDeque<Bytes>,
    encoder: ChunkedEncoder,
    state: StreamState,
    chunks: usize,
}

impl ChunkedStream {
    pub fn new(generator: BoxStream<'static, Bytes>, queued: VecDeque<Bytes>) -> Self {
        Self { generator, queued, encoder: ChunkedEncoder::new(), state: StreamState::AwaitChunk, chunks: 0 }
    }

    /// Writes every chunk and the terminal chunk. Returns the number of
    /// non-terminal chunks written.
    pub async fn send<W>(mut self, writer: &mut MessageWriter<W>) -> Result<usize, SendError>
    where
        W: AsyncWrite + Unpin,
    {
        let mut frame = BytesMut::new();

        loop {
            match self.state {
                StreamState::AwaitChunk => {
                    let item = self.next_item().await;
                    self.encoder.encode(item, &mut frame)?;
                    writer.write(frame.split().freeze()).await?;
                    self.state = if self.encoder.is_finish() { StreamState::Done } else { StreamState::ChunkSent };
                }
                StreamState::ChunkSent => {
                    self.chunks += 1;
                    trace!(chunks = self.chunks, "chunk written, asking for the next one");
                    self.state = StreamState::AwaitChunk;
                }
                StreamState::Done => {
                    debug!(chunks = self.chunks, bytes = self.encoder.sent_size(), "chunked response finished");
                    return Ok(self.chunks);
                }
            }
        }
    }

    async fn next_item(&mut self) -> PayloadItem {
        if let Some(chunk) = self.queued.pop_front() {
            return PayloadItem::Chunk(chunk);
        }

        match self.generator.next().await {
            Some(chunk) if !chunk.is_empty() => PayloadItem::Chunk(chunk),
            _ => PayloadItem::Eof,
        }
    }
}

impl std::fmt::Debug for ChunkedStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkedStream")
            .field("queued", &self.queued.len())
            .field("state", &self.state)
            .field("chunks", &self.chunks)
            .finish_non_exhaustive()
    }
}
