//! Builds a [`Request`] out of the parser's callback events.

use bytes::BytesMut;
use http::Method;
use tracing::trace;

use crate::codec::{HeaderAccumulator, MessageHead, ParseCallbacks};
use crate::protocol::{Request, Url};

/// Per-connection request state, reused across keep-alive cycles.
///
/// Every message starts from a clean slate: the previous request's buffers are
/// dropped when the parser reports the beginning of the next message.
#[derive(Debug, Default)]
pub struct RequestAssembler {
    headers: HeaderAccumulator,
    url: BytesMut,
    request: Request,
    complete: bool,
}

impl RequestAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hands out the assembled request once the message is complete.
    pub fn take_request(&mut self) -> Option<Request> {
        if !self.complete {
            return None;
        }
        self.complete = false;
        Some(std::mem::take(&mut self.request))
    }

    pub fn reset(&mut self) {
        self.headers.reset();
        self.url = BytesMut::new();
        self.request = Request::default();
        self.complete = false;
    }
}

impl ParseCallbacks for RequestAssembler {
    fn on_message_begin(&mut self) {
        self.reset();
    }

    fn on_url(&mut self, fragment: &[u8]) {
        self.url.extend_from_slice(fragment);
    }

    fn on_header_field(&mut self, fragment: &[u8]) {
        self.headers.on_field(fragment);
    }

    fn on_header_value(&mut self, fragment: &[u8]) {
        self.headers.on_value(fragment);
    }

    fn on_headers_complete(&mut self, head: &MessageHead) {
        self.headers.finish();
        self.request.headers = self.headers.take();
        self.request.url = Url::parse(self.url.split().freeze(), head.method == Method::CONNECT);
    }

    fn on_body(&mut self, fragment: &[u8]) {
        self.request.body.extend_from_slice(fragment);
    }

    fn on_message_complete(&mut self, head: &MessageHead) {
        self.request.method = head.method.clone();
        self.request.version = head.version;
        self.request.keepalive = head.keep_alive;
        self.complete = true;
        trace!(body_len = self.request.content_length(), "request assembled");
    }
}
