//! Decoder for chunked transfer encoded request bodies
//! ([RFC 9112 Section 7.1](https://www.rfc-editor.org/rfc/rfc9112#section-7.1)).
//!
//! Chunk extensions and trailer fields are validated for framing only and
//! then dropped.

use crate::protocol::{ParseError, PayloadItem};
use bytes::{Buf, BytesMut};
use tokio_util::codec::Decoder;
use tracing::trace;
use ChunkedState::*;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkedDecoder {
    state: ChunkedState,
    remaining_size: u64,
    has_size: bool,
}

impl ChunkedDecoder {
    pub fn new() -> Self {
        Self { state: Size, remaining_size: 0, has_size: false }
    }
}

impl Default for ChunkedDecoder {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChunkedState {
    /// Read the chunk size in hex
    Size,
    /// Whitespace after the size
    SizeLws,
    /// Skip chunk extensions
    Extension,
    /// LF closing the size line
    SizeLf,
    /// Chunk data
    Body,
    /// CR after chunk data
    BodyCr,
    /// LF after chunk data
    BodyLf,
    /// Trailer field line, skipped
    Trailer,
    /// LF after a trailer field
    TrailerLf,
    /// CR of the final empty line
    EndCr,
    /// LF of the final empty line
    EndLf,
    End,
}

impl Decoder for ChunkedDecoder {
    type Item = PayloadItem;
    type Error = ParseError;

    /// Returns a chunk as soon as any of its bytes are buffered, `Eof` after
    /// the final empty line and `None` when more input is needed.
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            match self.state {
                End => {
                    trace!("finished reading chunked data");
                    return Ok(Some(PayloadItem::Eof));
                }
                Body => {
                    if src.is_empty() {
                        return Ok(None);
                    }

                    let read_size = usize::try_from(self.remaining_size).unwrap_or(usize::MAX).min(src.len());
                    self.remaining_size -= read_size as u64;
                    if self.remaining_size == 0 {
                        self.state = BodyCr;
                    }

                    trace!(len = read_size, "read chunked bytes");
                    return Ok(Some(PayloadItem::Chunk(src.split_to(read_size).freeze())));
                }
                _ => {
                    if src.is_empty() {
                        return Ok(None);
                    }
                    let byte = src.get_u8();
                    self.state = self.step(byte)?;
                }
            }
        }
    }
}

impl ChunkedDecoder {
    fn step(&mut self, byte: u8) -> Result<ChunkedState, ParseError> {
        let next = match (self.state, byte) {
            (Size, b) if b.is_ascii_hexdigit() => {
                // to_digit cannot fail on an ascii hex digit
                let digit = u64::from((b as char).to_digit(16).unwrap_or_default());
                self.remaining_size = self
                    .remaining_size
                    .checked_mul(16)
                    .and_then(|size| size.checked_add(digit))
                    .ok_or_else(|| ParseError::invalid_body("invalid overflow chunked length"))?;
                self.has_size = true;
                return Ok(Size);
            }
            (Size | SizeLws, b'\t' | b' ') => SizeLws,
            (Size | SizeLws, b';') => Extension,
            (Size | SizeLws | Extension, b'\r') => SizeLf,
            (Extension, b'\n') => return Err(ParseError::invalid_body("invalid chunk extension contains newline")),
            (Extension, _) => Extension,
            (SizeLf, b'\n') if self.remaining_size == 0 => EndCr,
            (SizeLf, b'\n') => Body,
            (BodyCr, b'\r') => BodyLf,
            (BodyLf, b'\n') => {
                self.has_size = false;
                Size
            }
            (Trailer, b'\r') => TrailerLf,
            (Trailer, _) => Trailer,
            (TrailerLf, b'\n') => EndCr,
            (EndCr, b'\r') => EndLf,
            (EndCr, _) => Trailer,
            (EndLf, b'\n') => End,
            (state, byte) => {
                return Err(ParseError::invalid_body(format!("unexpected byte {byte:#04x} in chunked state {state:?}")));
            }
        };

        if self.state == Size && !self.has_size {
            return Err(ParseError::invalid_body("invalid chunk size line: missing size"));
        }

        Ok(next)
    }
}
