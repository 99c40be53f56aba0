//! Response staging and composition.
//!
//! The application fills a [`ResponseState`] through an
//! [`Exchange`](crate::connection::Exchange). Once the handler is done the
//! connection turns it into an [`Outgoing`] response: the serialized head plus
//! either the buffered body or the streaming engine.

use std::collections::VecDeque;
use std::fmt::{self, Display};
use std::io::Write;

use bytes::{Bytes, BytesMut};
use futures::stream::BoxStream;
use http::{HeaderName, HeaderValue, Method};
use tokio_util::codec::Encoder;
use tracing::warn;

use crate::codec::{HeaderEncoder, ResponseHead};
use crate::connection::ChunkedStream;
use crate::protocol::{PayloadSize, Request, SendError};
use crate::utils::FastWrite;

enum Phase {
    Open,
    Ended,
    Streaming { generator: BoxStream<'static, Bytes>, queued: VecDeque<Bytes> },
}

pub struct ResponseState {
    status: u16,
    headers: BytesMut,
    body: BytesMut,
    phase: Phase,
}

/// A composed response, ready to be handed to the writer.
#[derive(Debug)]
pub enum Outgoing {
    Buffered { head: Bytes, body: Bytes },
    Streaming { head: Bytes, stream: ChunkedStream },
}

impl ResponseState {
    pub fn new() -> Self {
        Self { status: 200, headers: BytesMut::new(), body: BytesMut::new(), phase: Phase::Open }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn is_ended(&self) -> bool {
        matches!(self.phase, Phase::Ended)
    }

    pub fn is_streaming(&self) -> bool {
        matches!(self.phase, Phase::Streaming { .. })
    }

    pub fn set_status(&mut self, status: u16) {
        if !matches!(self.phase, Phase::Open) {
            warn!(status, "status set after the response was finalized, ignored");
            return;
        }
        self.status = status;
    }

    pub fn append_header(&mut self, name: &str, value: impl Display) {
        if !matches!(self.phase, Phase::Open) {
            warn!(name, "header written after the response was finalized, ignored");
            return;
        }

        if name.eq_ignore_ascii_case("content-length") || name.eq_ignore_ascii_case("transfer-encoding") {
            warn!(name, "framing headers are computed by the server, ignored");
            return;
        }

        let value = value.to_string();
        if HeaderName::from_bytes(name.as_bytes()).is_err() || HeaderValue::from_str(&value).is_err() {
            warn!(name, "invalid header name or value, ignored");
            return;
        }

        self.headers.reserve(name.len() + value.len() + 4);
        self.headers.extend_from_slice(name.as_bytes());
        self.headers.extend_from_slice(b": ");
        self.headers.extend_from_slice(value.as_bytes());
        self.headers.extend_from_slice(b"\r\n");
    }

    pub fn append_body(&mut self, data: &[u8]) {
        match &mut self.phase {
            Phase::Open => self.body.extend_from_slice(data),
            Phase::Streaming { queued, .. } => {
                // an empty chunk would end the stream early
                if !data.is_empty() {
                    queued.push_back(Bytes::copy_from_slice(data));
                }
            }
            Phase::Ended => warn!(len = data.len(), "body written after end, ignored"),
        }
    }

    pub fn append_fmt(&mut self, args: fmt::Arguments<'_>) {
        match &mut self.phase {
            Phase::Open => {
                // formatting into a BytesMut cannot fail
                let _ = FastWrite(&mut self.body).write_fmt(args);
            }
            _ => self.append_body(args.to_string().as_bytes()),
        }
    }

    pub fn end(&mut self) {
        match self.phase {
            Phase::Open => self.phase = Phase::Ended,
            _ => warn!("response already finalized, end ignored"),
        }
    }

    pub fn stream(&mut self, generator: BoxStream<'static, Bytes>) {
        if !matches!(self.phase, Phase::Open) {
            warn!("response already finalized, stream ignored");
            return;
        }

        // the buffered body is never sent once streaming starts
        self.body = BytesMut::new();
        self.phase = Phase::Streaming { generator, queued: VecDeque::new() };
    }

    /// Composes the response for `request`, ending it if the application did not.
    pub fn compose(mut self, request: &Request) -> Result<Outgoing, SendError> {
        let is_head = *request.method() == Method::HEAD;
        let phase = std::mem::replace(&mut self.phase, Phase::Ended);

        let payload = match phase {
            Phase::Streaming { .. } => PayloadSize::Chunked,
            _ if self.body.is_empty() => PayloadSize::Empty,
            _ => PayloadSize::Length(self.body.len() as u64),
        };

        let head = ResponseHead {
            version: request.version(),
            status: self.status,
            headers: &self.headers,
            payload,
            keep_alive: request.is_keepalive(),
        };
        let mut head_buf = BytesMut::new();
        HeaderEncoder.encode(head, &mut head_buf)?;
        let head = head_buf.freeze();

        Ok(match phase {
            Phase::Streaming { generator, queued } if !is_head => {
                Outgoing::Streaming { head, stream: ChunkedStream::new(generator, queued) }
            }
            Phase::Streaming { .. } => Outgoing::Buffered { head, body: Bytes::new() },
            _ if is_head => Outgoing::Buffered { head, body: Bytes::new() },
            _ => Outgoing::Buffered { head, body: self.body.freeze() },
        })
    }
}

impl Default for ResponseState {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ResponseState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let phase = match self.phase {
            Phase::Open => "open",
            Phase::Ended => "ended",
            Phase::Streaming { .. } => "streaming",
        };
        f.debug_struct("ResponseState")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .field("body_len", &self.body.len())
            .field("phase", &phase)
            .finish()
    }
}
