//! Incremental HTTP/1.x request parser that reports a message as a series of
//! callback events.
//!
//! Bytes are fed with [`RequestParser::execute`] as they arrive. The parser
//! buffers them, tokenizes the head with `httparse` once it is complete, picks
//! a body decoder from the head and reports, in protocol order:
//!
//! 1. [`on_message_begin`](ParseCallbacks::on_message_begin)
//! 2. [`on_url`](ParseCallbacks::on_url), one or more fragments
//! 3. [`on_header_field`](ParseCallbacks::on_header_field) /
//!    [`on_header_value`](ParseCallbacks::on_header_value), one or more fragments each
//! 4. [`on_headers_complete`](ParseCallbacks::on_headers_complete)
//! 5. [`on_body`](ParseCallbacks::on_body), once per decoded piece
//! 6. [`on_message_complete`](ParseCallbacks::on_message_complete)
//!
//! Tokens are reported split wherever the boundary between two `execute`
//! calls fell inside them, the same fragments a byte-at-a-time tokenizer
//! would produce. After a complete message the parser pauses: bytes of the
//! next message stay buffered until `execute` is called again.
//!
//! # Example
//!
//! ```
//! use micro_h1::codec::{ParseCallbacks, ParseStatus, RequestParser};
//!
//! #[derive(Default)]
//! struct Url(Vec<u8>);
//!
//! impl ParseCallbacks for Url {
//!     fn on_url(&mut self, fragment: &[u8]) {
//!         self.0.extend_from_slice(fragment);
//!     }
//! }
//!
//! let mut parser = RequestParser::default();
//! let mut url = Url::default();
//!
//! assert_eq!(parser.execute(b"GET /in", &mut url).unwrap(), ParseStatus::Partial);
//! assert_eq!(parser.execute(b"dex HTTP/1.1\r\n\r\n", &mut url).unwrap(), ParseStatus::MessageComplete);
//! assert_eq!(url.0, b"/index");
//! ```

use std::ops::Range;

use bytes::{Buf, BytesMut};
use http::{Method, Version};
use httparse::Status;
use tokio_util::codec::Decoder;
use tracing::{debug, trace};

use crate::codec::body::PayloadDecoder;
use crate::ensure;
use crate::protocol::{ParseError, PayloadItem, PayloadSize};

/// Receives the parse events of [`RequestParser`]. Every method defaults to
/// doing nothing.
pub trait ParseCallbacks {
    fn on_message_begin(&mut self) {}

    fn on_url(&mut self, _fragment: &[u8]) {}

    fn on_header_field(&mut self, _fragment: &[u8]) {}

    fn on_header_value(&mut self, _fragment: &[u8]) {}

    fn on_headers_complete(&mut self, _head: &MessageHead) {}

    fn on_body(&mut self, _fragment: &[u8]) {}

    fn on_message_complete(&mut self, _head: &MessageHead) {}
}

/// Outcome of a successful [`RequestParser::execute`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseStatus {
    /// All buffered bytes were consumed, more input is needed.
    Partial,
    /// A message finished. Following bytes stay buffered.
    MessageComplete,
}

/// What the parser learned from a request head.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageHead {
    pub method: Method,
    pub version: Version,
    pub keep_alive: bool,
    pub payload: PayloadSize,
}

/// Bounds enforced while parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserLimits {
    pub max_header_bytes: usize,
    pub max_headers: usize,
    pub max_body_bytes: u64,
}

impl Default for ParserLimits {
    fn default() -> Self {
        Self { max_header_bytes: 8 * 1024, max_headers: 64, max_body_bytes: 8 * 1024 * 1024 }
    }
}

#[derive(Debug)]
enum State {
    Head,
    Body(PayloadDecoder),
}

#[derive(Debug)]
pub struct RequestParser {
    state: State,
    buf: BytesMut,
    /// Offsets in `buf` where the bytes of a later `execute` call start.
    boundaries: Vec<usize>,
    head: Option<MessageHead>,
    body_read: u64,
    limits: ParserLimits,
}

impl RequestParser {
    pub fn new(limits: ParserLimits) -> Self {
        Self { state: State::Head, buf: BytesMut::new(), boundaries: Vec::new(), head: None, body_read: 0, limits }
    }

    /// Feeds `data` and processes as much of the buffered input as possible.
    ///
    /// An empty `data` resumes on bytes left over from a previous call.
    pub fn execute<C: ParseCallbacks>(&mut self, data: &[u8], callbacks: &mut C) -> Result<ParseStatus, ParseError> {
        if !data.is_empty() {
            if !self.buf.is_empty() {
                self.boundaries.push(self.buf.len());
            }
            self.buf.extend_from_slice(data);
        }

        loop {
            let decoded = match &mut self.state {
                State::Head => {
                    if !self.parse_head(callbacks)? {
                        return Ok(ParseStatus::Partial);
                    }
                    continue;
                }
                State::Body(decoder) => {
                    let before = self.buf.len();
                    let item = decoder.decode(&mut self.buf)?;
                    shift_boundaries(&mut self.boundaries, before - self.buf.len());
                    item
                }
            };

            match decoded {
                None => return Ok(ParseStatus::Partial),
                Some(PayloadItem::Chunk(bytes)) => {
                    self.body_read += bytes.len() as u64;
                    ensure!(
                        self.body_read <= self.limits.max_body_bytes,
                        ParseError::too_large_body(self.body_read, self.limits.max_body_bytes)
                    );
                    trace!(len = bytes.len(), "body fragment");
                    callbacks.on_body(&bytes);
                }
                Some(PayloadItem::Eof) => {
                    self.state = State::Head;
                    if let Some(head) = &self.head {
                        debug!(method = %head.method, keep_alive = head.keep_alive, "message complete");
                        callbacks.on_message_complete(head);
                    }
                    return Ok(ParseStatus::MessageComplete);
                }
            }
        }
    }

    /// Signals the end of the input stream.
    ///
    /// A message completed by the buffered bytes is still reported. A message
    /// cut off by the end of stream is [`ParseError::Incomplete`].
    pub fn finish<C: ParseCallbacks>(&mut self, callbacks: &mut C) -> Result<ParseStatus, ParseError> {
        let status = self.execute(&[], callbacks)?;
        if status == ParseStatus::MessageComplete {
            return Ok(status);
        }

        let in_body = matches!(self.state, State::Body(_));
        let pending = self.buf.iter().any(|b| !matches!(b, b'\r' | b'\n'));
        ensure!(!in_body && !pending, ParseError::Incomplete);
        Ok(ParseStatus::Partial)
    }

    /// Method of the current or last message, `GET` before any head was parsed.
    pub fn method(&self) -> Method {
        self.head.as_ref().map_or(Method::GET, |head| head.method.clone())
    }

    pub fn version(&self) -> Version {
        self.head.as_ref().map_or(Version::HTTP_11, |head| head.version)
    }

    /// Whether the connection may carry another message after the current one.
    pub fn should_keep_alive(&self) -> bool {
        self.head.as_ref().is_some_and(|head| head.keep_alive)
    }

    /// Number of input bytes buffered but not yet consumed.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Tokenizes the head if it is complete and reports it. Returns `false`
    /// when more input is needed.
    fn parse_head<C: ParseCallbacks>(&mut self, callbacks: &mut C) -> Result<bool, ParseError> {
        if self.buf.is_empty() {
            return Ok(false);
        }

        let Some(raw) = RawHead::parse(&self.buf, &self.limits)? else {
            ensure!(
                self.buf.len() <= self.limits.max_header_bytes,
                ParseError::too_large_header(self.buf.len(), self.limits.max_header_bytes)
            );
            return Ok(false);
        };

        trace!(head_size = raw.len, headers = raw.headers.len(), "parsed request head");

        callbacks.on_message_begin();
        emit_split(&self.buf, &self.boundaries, raw.url, |fragment| callbacks.on_url(fragment));
        for (name, value) in raw.headers {
            emit_split(&self.buf, &self.boundaries, name, |fragment| callbacks.on_header_field(fragment));
            emit_split(&self.buf, &self.boundaries, value, |fragment| callbacks.on_header_value(fragment));
        }

        let head = raw.head;
        callbacks.on_headers_complete(&head);

        self.buf.advance(raw.len);
        shift_boundaries(&mut self.boundaries, raw.len);
        self.body_read = 0;
        self.state = State::Body(head.payload.into());
        self.head = Some(head);
        Ok(true)
    }
}

impl Default for RequestParser {
    fn default() -> Self {
        Self::new(ParserLimits::default())
    }
}

/// A tokenized head, with its tokens recorded as ranges of the input buffer.
struct RawHead {
    head: MessageHead,
    url: Range<usize>,
    headers: Vec<(Range<usize>, Range<usize>)>,
    len: usize,
}

impl RawHead {
    fn parse(buf: &[u8], limits: &ParserLimits) -> Result<Option<Self>, ParseError> {
        let mut headers = vec![httparse::EMPTY_HEADER; limits.max_headers];
        let mut req = httparse::Request::new(&mut headers);

        let len = match req.parse(buf).map_err(|e| match e {
            httparse::Error::TooManyHeaders => ParseError::too_many_headers(limits.max_headers),
            httparse::Error::Version => ParseError::InvalidVersion(None),
            httparse::Error::Token => ParseError::InvalidMethod,
            e => ParseError::invalid_header(e),
        })? {
            Status::Complete(len) => len,
            Status::Partial => return Ok(None),
        };
        ensure!(len <= limits.max_header_bytes, ParseError::too_large_header(len, limits.max_header_bytes));

        let method = req.method.ok_or(ParseError::InvalidMethod)?;
        let method = Method::from_bytes(method.as_bytes()).ok().ok_or(ParseError::InvalidMethod)?;
        let path = req.path.ok_or(ParseError::InvalidUri)?;
        let version = match req.version {
            Some(0) => Version::HTTP_10,
            Some(1) => Version::HTTP_11,
            v => return Err(ParseError::InvalidVersion(v)),
        };

        let keep_alive = keep_alive(version, req.headers);
        let payload = payload_size(req.headers, limits)?;

        let headers = req
            .headers
            .iter()
            .map(|header| (range_of(buf, header.name.as_bytes()), range_of(buf, header.value)))
            .collect();

        Ok(Some(Self {
            head: MessageHead { method, version, keep_alive, payload },
            url: range_of(buf, path.as_bytes()),
            headers,
            len,
        }))
    }
}

/// Position of `part` inside `base`. `part` must borrow from `base`.
fn range_of(base: &[u8], part: &[u8]) -> Range<usize> {
    if part.is_empty() {
        return 0..0;
    }
    let start = part.as_ptr() as usize - base.as_ptr() as usize;
    start..start + part.len()
}

/// Calls `f` with `buf[range]`, split at every boundary falling inside it.
/// An empty range is reported as one empty fragment.
fn emit_split(buf: &[u8], boundaries: &[usize], range: Range<usize>, mut f: impl FnMut(&[u8])) {
    let mut start = range.start;
    for &boundary in boundaries.iter().filter(|b| range.start < **b && **b < range.end) {
        f(&buf[start..boundary]);
        start = boundary;
    }
    f(&buf[start..range.end]);
}

/// Accounts for `consumed` bytes removed from the front of the buffer.
fn shift_boundaries(boundaries: &mut Vec<usize>, consumed: usize) {
    if consumed == 0 {
        return;
    }
    boundaries.retain_mut(|boundary| {
        if *boundary <= consumed {
            return false;
        }
        *boundary -= consumed;
        true
    });
}

fn has_token(value: &[u8], token: &str) -> bool {
    value.split(|b| *b == b',').any(|t| t.trim_ascii().eq_ignore_ascii_case(token.as_bytes()))
}

/// HTTP/1.1 persists unless `Connection: close`; HTTP/1.0 only with `Connection: keep-alive`.
fn keep_alive(version: Version, headers: &[httparse::Header<'_>]) -> bool {
    let connection = |token| headers.iter().any(|h| h.name.eq_ignore_ascii_case("connection") && has_token(h.value, token));
    match version {
        Version::HTTP_11 => !connection("close"),
        _ => connection("keep-alive") && !connection("close"),
    }
}

/// Picks the body framing, see [RFC 9112 Section 6.3](https://www.rfc-editor.org/rfc/rfc9112#section-6.3).
fn payload_size(headers: &[httparse::Header<'_>], limits: &ParserLimits) -> Result<PayloadSize, ParseError> {
    let mut transfer_encoding = None;
    let mut content_length = None;

    for header in headers {
        if header.name.eq_ignore_ascii_case("transfer-encoding") {
            transfer_encoding = Some(header.value);
        } else if header.name.eq_ignore_ascii_case("content-length") {
            let length = parse_content_length(header.value)?;
            ensure!(
                content_length.is_none_or(|previous| previous == length),
                ParseError::invalid_content_length("conflicting content-length values")
            );
            content_length = Some(length);
        }
    }

    match (transfer_encoding, content_length) {
        (None, None) => Ok(PayloadSize::Empty),
        (Some(te), None) => {
            let last = te.rsplit(|b| *b == b',').next().unwrap_or_default();
            ensure!(last.trim_ascii().eq_ignore_ascii_case(b"chunked"), ParseError::invalid_header("transfer-encoding must end with chunked"));
            Ok(PayloadSize::Chunked)
        }
        (None, Some(length)) => {
            ensure!(length <= limits.max_body_bytes, ParseError::too_large_body(length, limits.max_body_bytes));
            Ok(PayloadSize::Length(length))
        }
        (Some(_), Some(_)) => Err(ParseError::invalid_content_length("transfer-encoding and content-length both present")),
    }
}

fn parse_content_length(value: &[u8]) -> Result<u64, ParseError> {
    let value = value.trim_ascii();
    ensure!(!value.is_empty() && value.iter().all(u8::is_ascii_digit), ParseError::invalid_content_length("value is not a number"));
    std::str::from_utf8(value)
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .ok_or_else(|| ParseError::invalid_content_length("value overflows u64"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Event {
        Begin,
        Url(Vec<u8>),
        Field(Vec<u8>),
        Value(Vec<u8>),
        HeadersComplete(Method),
        Body(Vec<u8>),
        Complete(bool),
    }

    #[derive(Default)]
    struct Recorder(Vec<Event>);

    impl ParseCallbacks for Recorder {
        fn on_message_begin(&mut self) {
            self.0.push(Event::Begin);
        }

        fn on_url(&mut self, fragment: &[u8]) {
            self.0.push(Event::Url(fragment.to_vec()));
        }

        fn on_header_field(&mut self, fragment: &[u8]) {
            self.0.push(Event::Field(fragment.to_vec()));
        }

        fn on_header_value(&mut self, fragment: &[u8]) {
            self.0.push(Event::Value(fragment.to_vec()));
        }

        fn on_headers_complete(&mut self, head: &MessageHead) {
            self.0.push(Event::HeadersComplete(head.method.clone()));
        }

        fn on_body(&mut self, fragment: &[u8]) {
            self.0.push(Event::Body(fragment.to_vec()));
        }

        fn on_message_complete(&mut self, head: &MessageHead) {
            self.0.push(Event::Complete(head.keep_alive));
        }
    }

    fn bytes(s: &str) -> Vec<u8> {
        s.as_bytes().to_vec()
    }

    #[test]
    fn simple_get() {
        let mut parser = RequestParser::default();
        let mut recorder = Recorder::default();

        let status = parser.execute(b"GET /x?y=1 HTTP/1.1\r\nHost: h\r\n\r\n", &mut recorder).unwrap();

        assert_eq!(status, ParseStatus::MessageComplete);
        assert_eq!(
            recorder.0,
            vec![
                Event::Begin,
                Event::Url(bytes("/x?y=1")),
                Event::Field(bytes("Host")),
                Event::Value(bytes("h")),
                Event::HeadersComplete(Method::GET),
                Event::Complete(true),
            ]
        );
        assert_eq!(parser.method(), Method::GET);
        assert_eq!(parser.version(), Version::HTTP_11);
        assert!(parser.should_keep_alive());
        assert_eq!(parser.buffered(), 0);
    }

    #[test]
    fn tokens_split_at_read_boundaries() {
        let mut parser = RequestParser::default();
        let mut recorder = Recorder::default();

        assert_eq!(parser.execute(b"GET /pa", &mut recorder).unwrap(), ParseStatus::Partial);
        assert_eq!(parser.execute(b"th HTTP/1.1\r\nX-Na", &mut recorder).unwrap(), ParseStatus::Partial);
        assert_eq!(parser.execute(b"me: val", &mut recorder).unwrap(), ParseStatus::Partial);
        assert_eq!(parser.execute(b"ue\r\n\r\n", &mut recorder).unwrap(), ParseStatus::MessageComplete);

        assert_eq!(
            recorder.0,
            vec![
                Event::Begin,
                Event::Url(bytes("/pa")),
                Event::Url(bytes("th")),
                Event::Field(bytes("X-Na")),
                Event::Field(bytes("me")),
                Event::Value(bytes("val")),
                Event::Value(bytes("ue")),
                Event::HeadersComplete(Method::GET),
                Event::Complete(true),
            ]
        );
    }

    #[test]
    fn byte_at_a_time() {
        let request = indoc! {"
            POST /submit HTTP/1.1\r
            Host: example.com\r
            Content-Length: 5\r
            \r
            hello"};

        let mut parser = RequestParser::default();
        let mut recorder = Recorder::default();
        let mut last = ParseStatus::Partial;
        for byte in request.as_bytes() {
            last = parser.execute(std::slice::from_ref(byte), &mut recorder).unwrap();
        }
        assert_eq!(last, ParseStatus::MessageComplete);

        let join = |pick: fn(&Event) -> Option<&Vec<u8>>| -> Vec<u8> { recorder.0.iter().filter_map(pick).flatten().copied().collect() };
        assert_eq!(join(|e| if let Event::Url(v) = e { Some(v) } else { None }), b"/submit");
        assert_eq!(join(|e| if let Event::Body(v) = e { Some(v) } else { None }), b"hello");
        assert_eq!(recorder.0.iter().filter(|e| matches!(e, Event::Url(_))).count(), "/submit".len());
    }

    #[test]
    fn empty_header_value_is_reported() {
        let mut parser = RequestParser::default();
        let mut recorder = Recorder::default();

        parser.execute(b"GET / HTTP/1.1\r\nX-Empty:\r\n\r\n", &mut recorder).unwrap();

        assert!(recorder.0.contains(&Event::Field(bytes("X-Empty"))));
        assert!(recorder.0.contains(&Event::Value(Vec::new())));
    }

    #[test]
    fn chunked_body() {
        let request = indoc! {"
            POST /upload HTTP/1.1\r
            Transfer-Encoding: gzip, chunked\r
            \r
            3\r
            abc\r
            2\r
            de\r
            0\r
            \r
        "};

        let mut parser = RequestParser::default();
        let mut recorder = Recorder::default();
        assert_eq!(parser.execute(request.as_bytes(), &mut recorder).unwrap(), ParseStatus::MessageComplete);

        let body: Vec<u8> =
            recorder.0.iter().filter_map(|e| if let Event::Body(v) = e { Some(v.clone()) } else { None }).flatten().collect();
        assert_eq!(body, b"abcde");
    }

    #[test]
    fn pipelined_messages_pause_between() {
        let mut parser = RequestParser::default();
        let mut recorder = Recorder::default();

        let status = parser.execute(b"GET /a HTTP/1.1\r\n\r\nGET /b HTTP/1.1\r\n\r\n", &mut recorder).unwrap();
        assert_eq!(status, ParseStatus::MessageComplete);
        assert!(recorder.0.contains(&Event::Url(bytes("/a"))));
        assert!(!recorder.0.contains(&Event::Url(bytes("/b"))));
        assert_eq!(parser.buffered(), "GET /b HTTP/1.1\r\n\r\n".len());

        let status = parser.execute(&[], &mut recorder).unwrap();
        assert_eq!(status, ParseStatus::MessageComplete);
        assert!(recorder.0.contains(&Event::Url(bytes("/b"))));

        assert_eq!(parser.execute(&[], &mut recorder).unwrap(), ParseStatus::Partial);
    }

    #[test]
    fn keep_alive_rules() {
        let cases: [(&[u8], bool); 5] = [
            (b"GET / HTTP/1.1\r\n\r\n", true),
            (b"GET / HTTP/1.1\r\nConnection: close\r\n\r\n", false),
            (b"GET / HTTP/1.0\r\n\r\n", false),
            (b"GET / HTTP/1.0\r\nConnection: Keep-Alive\r\n\r\n", true),
            (b"GET / HTTP/1.1\r\nConnection: upgrade, Close\r\n\r\n", false),
        ];

        for (request, expected) in cases {
            let mut parser = RequestParser::default();
            parser.execute(request, &mut Recorder::default()).unwrap();
            assert_eq!(parser.should_keep_alive(), expected, "{}", String::from_utf8_lossy(request));
        }
    }

    #[test]
    fn invalid_requests() {
        let cases: [&[u8]; 6] = [
            b"GET / HTTP/2.0\r\n\r\n",
            b"G@T / HTTP/1.1\r\n\r\n",
            b"POST / HTTP/1.1\r\nContent-Length: abc\r\n\r\n",
            b"POST / HTTP/1.1\r\nContent-Length: 1\r\nContent-Length: 2\r\n\r\n",
            b"POST / HTTP/1.1\r\nContent-Length: 1\r\nTransfer-Encoding: chunked\r\n\r\n",
            b"POST / HTTP/1.1\r\nTransfer-Encoding: gzip\r\n\r\n",
        ];

        for request in cases {
            let mut recorder = Recorder::default();
            let result = RequestParser::default().execute(request, &mut recorder);
            assert!(result.is_err(), "{}", String::from_utf8_lossy(request));
            assert!(!recorder.0.contains(&Event::Begin));
        }
    }

    #[test]
    fn limits_are_enforced() {
        let limits = ParserLimits { max_header_bytes: 64, max_headers: 2, max_body_bytes: 4 };

        let long_target = format!("GET /{}", "a".repeat(80));
        let result = RequestParser::new(limits).execute(long_target.as_bytes(), &mut Recorder::default());
        assert!(matches!(result, Err(ParseError::TooLargeHeader { .. })));

        let result = RequestParser::new(limits).execute(b"GET / HTTP/1.1\r\nA: 1\r\nB: 2\r\nC: 3\r\n\r\n", &mut Recorder::default());
        assert!(matches!(result, Err(ParseError::TooManyHeaders { .. })));

        let result = RequestParser::new(limits).execute(b"POST / HTTP/1.1\r\nContent-Length: 5\r\n\r\n", &mut Recorder::default());
        assert!(matches!(result, Err(ParseError::TooLargeBody { .. })));

        let result = RequestParser::new(limits)
            .execute(b"POST / HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\n5\r\nabcde\r\n0\r\n\r\n", &mut Recorder::default());
        assert!(matches!(result, Err(ParseError::TooLargeBody { .. })));
    }

    #[test]
    fn finish_reports_cut_off_messages() {
        let mut parser = RequestParser::default();
        let mut recorder = Recorder::default();
        parser.execute(b"POST / HTTP/1.1\r\nContent-Length: 10\r\n\r\nabc", &mut recorder).unwrap();
        assert!(matches!(parser.finish(&mut recorder), Err(ParseError::Incomplete)));

        let mut parser = RequestParser::default();
        parser.execute(b"GET / HT", &mut recorder).unwrap();
        assert!(matches!(parser.finish(&mut recorder), Err(ParseError::Incomplete)));

        let mut parser = RequestParser::default();
        assert_eq!(parser.finish(&mut recorder).unwrap(), ParseStatus::Partial);
    }

    #[test]
    fn finish_flushes_a_complete_buffered_message() {
        let mut parser = RequestParser::default();
        let mut recorder = Recorder::default();

        let status = parser.execute(b"GET /a HTTP/1.1\r\n\r\nGET /b HTTP/1.1\r\n\r\n", &mut recorder).unwrap();
        assert_eq!(status, ParseStatus::MessageComplete);

        assert_eq!(parser.finish(&mut recorder).unwrap(), ParseStatus::MessageComplete);
        assert_eq!(parser.finish(&mut recorder).unwrap(), ParseStatus::Partial);
        assert_eq!(recorder.0.iter().filter(|e| matches!(e, Event::Complete(_))).count(), 2);
    }
}
