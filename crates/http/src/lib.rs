//! An embeddable asynchronous HTTP/1.x server core.
//!
//! The crate turns accepted TCP connections into structured requests and turns
//! the responses an application builds, buffered or streamed, back into
//! correctly framed HTTP/1.x bytes. It runs on tokio, one task per connection.
//!
//! # Features
//!
//! - HTTP/1.0 and HTTP/1.1 requests, `Content-Length` and chunked request bodies
//! - Keep-alive connections, including pipelined requests
//! - Buffered responses with a computed `Content-Length`
//! - Chunked streaming responses pulled from a generator, one chunk per
//!   completed write
//! - Graceful stop: the listener is drained and closed, open connections finish
//!
//! # Example
//!
//! ```no_run
//! use micro_h1::connection::Exchange;
//! use micro_h1::handler::make_handler;
//! use micro_h1::server::Server;
//! use tracing::{Level, info};
//! use tracing_subscriber::FmtSubscriber;
//!
//! #[tokio::main]
//! async fn main() {
//!     let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
//!     tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");
//!
//!     let mut server = Server::new(make_handler(hello_world));
//!     let addr = server.listen("127.0.0.1:8080").await.expect("bind server error");
//!     info!(%addr, "serving");
//!
//!     tokio::signal::ctrl_c().await.expect("failed to listen for ctrl-c");
//!     server.stop();
//!     server.stopped().await;
//! }
//!
//! fn hello_world(exchange: &mut Exchange<'_>) {
//!     let path = String::from_utf8_lossy(exchange.request().url().path().unwrap_or(&b"/"[..])).into_owned();
//!     info!(%path, "request received");
//!
//!     exchange.write_header("Content-Type", "text/plain");
//!     write!(exchange, "Hello World from {path}!\r\n");
//!     exchange.end();
//! }
//! ```
//!
//! # Architecture
//!
//! - [`server`]: listening socket, stop/drain and per-connection configuration
//! - [`connection`]: connection lifecycle, request assembly, response staging,
//!   ordered writes and the chunked streaming engine
//! - [`handler`]: the application handler trait and its helpers
//! - [`codec`]: the incremental request parser, header folding, request-target
//!   parsing and response framing
//! - [`protocol`]: requests, URLs, status reasons and error types
//!
//! # Error Handling
//!
//! - [`protocol::ParseError`]: malformed or oversized requests
//! - [`protocol::SendError`]: failures while writing a response
//! - [`protocol::HttpError`]: why a connection ended abnormally
//! - [`protocol::ServerError`]: failures to start listening
//!
//! A malformed request closes its connection without invoking the handler;
//! errors never leave the connection they happened on.
//!
//! # Limitations
//!
//! - No TLS, HTTP/2 or HTTP/3
//! - No `100-continue`, range requests or trailers (request trailers are skipped)

pub mod codec;
pub mod connection;
pub mod handler;
pub mod protocol;
pub mod server;

mod utils;
pub(crate) use utils::ensure;
