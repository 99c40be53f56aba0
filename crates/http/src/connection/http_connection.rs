use std::sync::Arc;

use bytes::BytesMut;
use http::Version;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};
use tokio_util::codec::Encoder;
use tracing::{debug, error, trace};

use crate::codec::{HeaderEncoder, ParseStatus, RequestParser, ResponseHead};
use crate::connection::{Exchange, MessageWriter, Outgoing, RequestAssembler, ResponseState};
use crate::handler::Handler;
use crate::protocol::{HttpError, ParseError, PayloadSize};
use crate::server::ServerConfig;

/// One accepted connection and everything it owns.
///
/// `HttpConnection` drives the whole life of a connection on the task that
/// runs [`process`](HttpConnection::process):
/// - reads bytes and feeds them to the request parser
/// - invokes the handler once per complete request
/// - writes the buffered or streamed response
/// - resets for the next request on keep-alive, or closes the connection
///
/// Socket halves, parser state and response staging are dropped together when
/// `process` returns, whichever way it returns.
///
/// # Type Parameters
///
/// * `R`: The async readable stream type
/// * `W`: The async writable stream type
#[derive(Debug)]
pub struct HttpConnection<R, W> {
    reader: R,
    writer: MessageWriter<W>,
    read_buf: BytesMut,
    parser: RequestParser,
    assembler: RequestAssembler,
    config: Arc<ServerConfig>,
}

impl<R, W> HttpConnection<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(reader: R, writer: W, config: Arc<ServerConfig>) -> Self {
        Self {
            reader,
            writer: MessageWriter::new(writer),
            read_buf: BytesMut::with_capacity(config.read_buffer_size()),
            parser: RequestParser::new(config.parser_limits()),
            assembler: RequestAssembler::new(),
            config,
        }
    }

    /// Serves requests until the peer leaves, a non keep-alive response was
    /// sent, or an error ends the connection.
    pub async fn process<H>(mut self, handler: Arc<H>) -> Result<(), HttpError>
    where
        H: Handler,
    {
        loop {
            let status = match self.parser.execute(&self.read_buf, &mut self.assembler) {
                Ok(status) => status,
                Err(e) => return self.reject(e).await,
            };
            self.read_buf.clear();

            if status == ParseStatus::MessageComplete {
                if !self.respond(handler.as_ref()).await? {
                    return self.close().await;
                }
                // pipelined bytes may already hold the next message
                continue;
            }

            match self.fill_buf().await {
                Ok(true) => {}
                Ok(false) => return self.on_eof(handler.as_ref()).await,
                Err(e) => {
                    self.shutdown().await;
                    return Err(e);
                }
            }
        }
    }

    /// Reads more bytes. Returns `false` at end of stream.
    async fn fill_buf(&mut self) -> Result<bool, HttpError> {
        self.read_buf.reserve(self.config.read_buffer_size());
        let read = self.reader.read_buf(&mut self.read_buf);

        let n = match self.config.read_timeout() {
            Some(timeout) => tokio::time::timeout(timeout, read).await.map_err(|elapsed| {
                debug!(cause = %elapsed, "connection idle, closing");
                HttpError::Timeout
            })?,
            None => read.await,
        }
        .map_err(ParseError::io)?;

        trace!(n, "read from connection");
        Ok(n > 0)
    }

    /// Runs the handler for the assembled request and writes its response.
    /// Returns whether the connection stays open.
    async fn respond<H>(&mut self, handler: &H) -> Result<bool, HttpError>
    where
        H: Handler,
    {
        let Some(request) = self.assembler.take_request() else {
            return Ok(true);
        };

        let mut response = ResponseState::new();
        handler.call(&mut Exchange::new(&request, &mut response)).await;

        let keep_alive = self.parser.should_keep_alive();
        match response.compose(&request)? {
            Outgoing::Buffered { head, body } => {
                self.writer.write(head).await?;
                self.writer.write(body).await?;
            }
            Outgoing::Streaming { head, stream } => {
                self.writer.write(head).await?;
                stream.send(&mut self.writer).await?;
            }
        }
        self.writer.flush().await?;

        debug!(method = %self.parser.method(), version = ?self.parser.version(), keep_alive, "response sent");
        Ok(keep_alive)
    }

    async fn on_eof<H>(mut self, handler: &H) -> Result<(), HttpError>
    where
        H: Handler,
    {
        loop {
            match self.parser.finish(&mut self.assembler) {
                Ok(ParseStatus::MessageComplete) => {
                    if !self.respond(handler).await? {
                        break;
                    }
                }
                Ok(ParseStatus::Partial) => {
                    debug!("peer closed the connection");
                    break;
                }
                Err(ParseError::Incomplete) => {
                    debug!(buffered = self.parser.buffered(), "connection closed in the middle of a message");
                    break;
                }
                Err(e) => return self.reject(e).await,
            }
        }
        self.close().await
    }

    async fn reject(mut self, e: ParseError) -> Result<(), HttpError> {
        error!(cause = %e, "failed to parse request, closing connection");

        if self.config.reply_bad_request() {
            let head = ResponseHead {
                version: Version::HTTP_11,
                status: 400,
                headers: b"",
                payload: PayloadSize::Empty,
                keep_alive: false,
            };
            let mut buf = BytesMut::new();
            HeaderEncoder.encode(head, &mut buf)?;
            if let Err(write_error) = self.writer.write(buf.freeze()).await {
                debug!(cause = %write_error, "failed to send bad request response");
            }
        }

        self.shutdown().await;
        Err(e.into())
    }

    async fn close(mut self) -> Result<(), HttpError> {
        self.shutdown().await;
        Ok(())
    }

    async fn shutdown(&mut self) {
        if let Err(e) = self.writer.shutdown().await {
            debug!(cause = %e, "failed to shut the connection down");
        }
        debug!(written = self.writer.written(), "connection closed");
    }
}
