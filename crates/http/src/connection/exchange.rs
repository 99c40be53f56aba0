use std::fmt::{self, Display};

use bytes::Bytes;
use futures::{Stream, StreamExt};

use crate::connection::ResponseState;
use crate::protocol::Request;

/// One request/response exchange, handed to the application handler.
///
/// The handler reads the assembled [`Request`] and builds the response. A
/// response is either buffered, finished with [`end`](Exchange::end), or
/// streamed with chunked encoding, started with [`stream`](Exchange::stream).
/// A handler that returns without calling either gets an implicit `end`.
///
/// Nothing is written to the peer before the handler returns.
///
/// ```
/// use micro_h1::connection::Exchange;
///
/// fn hello(exchange: &mut Exchange<'_>) {
///     let name = exchange.request().url().query().unwrap_or(&b"world"[..]).to_vec();
///
///     exchange.write_status(200);
///     exchange.write_header("Content-Type", "text/plain");
///     exchange.write("hello, ");
///     exchange.write(name);
///     exchange.end();
/// }
/// ```
#[derive(Debug)]
pub struct Exchange<'a> {
    request: &'a Request,
    response: &'a mut ResponseState,
}

impl<'a> Exchange<'a> {
    pub fn new(request: &'a Request, response: &'a mut ResponseState) -> Self {
        Self { request, response }
    }

    pub fn request(&self) -> &'a Request {
        self.request
    }

    /// Value of the first request header named `name`, ignoring ASCII case.
    pub fn get_header(&self, name: &str) -> Option<&'a [u8]> {
        self.request.header(name)
    }

    /// Sets the status code, `200` unless called.
    pub fn write_status(&mut self, code: u16) {
        self.response.set_status(code);
    }

    /// Appends a response header. Repeated names are sent as separate lines.
    ///
    /// `Content-Length` and `Transfer-Encoding` are always computed by the
    /// server and are ignored here, as is anything written once the response
    /// was finalized.
    pub fn write_header<V: Display>(&mut self, name: &str, value: V) {
        self.response.append_header(name, value);
    }

    /// Appends body bytes.
    ///
    /// After [`stream`](Exchange::stream) the bytes are sent as a chunk of
    /// their own, ahead of anything the generator produces.
    pub fn write<B: AsRef<[u8]>>(&mut self, data: B) {
        self.response.append_body(data.as_ref());
    }

    /// Appends formatted body text, so `write!(exchange, ...)` works.
    pub fn write_fmt(&mut self, args: fmt::Arguments<'_>) {
        self.response.append_fmt(args);
    }

    /// Finalizes a buffered response.
    pub fn end(&mut self) {
        self.response.end();
    }

    /// Switches to a chunked response produced by `generator`.
    ///
    /// Headers must be written before this call. Anything written to the body
    /// so far is discarded. The generator is polled once per chunk, only after
    /// the previous chunk reached the socket, and a zero-length chunk or the end
    /// of the stream finishes the response.
    ///
    /// The response always uses `Transfer-Encoding: chunked`, including for
    /// HTTP/1.0 requests. Those connections close after the terminal chunk,
    /// but an HTTP/1.0 client that does not understand chunked framing will
    /// see the chunk sizes in the body.
    pub fn stream<S>(&mut self, generator: S)
    where
        S: Stream<Item = Bytes> + Send + 'static,
    {
        self.response.stream(generator.boxed());
    }

    pub fn is_ended(&self) -> bool {
        self.response.is_ended()
    }

    pub fn is_streaming(&self) -> bool {
        self.response.is_streaming()
    }
}
