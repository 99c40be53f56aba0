use crate::protocol::{PayloadItem, SendError};
use crate::utils::FastWrite;
use bytes::{Buf, BytesMut};
use std::io::Write;

use tokio_util::codec::Encoder;
use tracing::{trace, warn};

/// Frames payload items with chunked transfer encoding.
///
/// A chunk of `n` bytes is written as `<n in hex>\r\n<bytes>\r\n`. Both
/// [`PayloadItem::Eof`] and an empty chunk produce the terminal frame
/// `0\r\n\r\n`, after which the encoder refuses further items.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkedEncoder {
    eof: bool,
    sent_size: u64,
}

impl ChunkedEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the terminal chunk has been written.
    pub fn is_finish(&self) -> bool {
        self.eof
    }

    /// Total payload bytes framed so far, excluding framing overhead.
    pub fn sent_size(&self) -> u64 {
        self.sent_size
    }
}

impl<D: Buf> Encoder<PayloadItem<D>> for ChunkedEncoder {
    type Error = SendError;

    fn encode(&mut self, item: PayloadItem<D>, dst: &mut BytesMut) -> Result<(), Self::Error> {
        if self.eof {
            warn!("encode payload item after the terminal chunk, ignored");
            return Ok(());
        }

        match item {
            PayloadItem::Chunk(mut bytes) if bytes.has_remaining() => {
                let len = bytes.remaining();
                trace!(len, "encode chunk");
                write!(FastWrite(dst), "{len:X}\r\n")?;
                dst.reserve(len + 2);
                while bytes.has_remaining() {
                    let chunk = bytes.chunk();
                    let n = chunk.len();
                    dst.extend_from_slice(chunk);
                    bytes.advance(n);
                }
                dst.extend_from_slice(b"\r\n");
                self.sent_size += len as u64;
                Ok(())
            }
            PayloadItem::Chunk(_) | PayloadItem::Eof => {
                trace!(sent_size = self.sent_size, "encode terminal chunk");
                self.eof = true;
                dst.extend_from_slice(b"0\r\n\r\n");
                Ok(())
            }
        }
    }
}
