//! Connection lifecycle, from accepted socket to teardown.
//!
//! - [`HttpConnection`]: reads and parses requests, runs the handler, writes
//!   responses and decides between keep-alive reuse and closing
//! - [`RequestAssembler`]: folds parser events into a [`Request`](crate::protocol::Request)
//! - [`Exchange`]: the handler's view of one request/response cycle
//! - [`ResponseState`]: response staging, composed into an [`Outgoing`] response
//! - [`MessageWriter`]: ordered writes that own each buffer until it is written
//! - [`ChunkedStream`]: backpressured chunked streaming driven by a generator

mod chunked_stream;
mod exchange;
mod http_connection;
mod message_writer;
mod request_assembler;
mod response;

pub use chunked_stream::ChunkedStream;
pub use exchange::Exchange;
pub use http_connection::HttpConnection;
pub use message_writer::MessageWriter;
pub use request_assembler::RequestAssembler;
pub use response::{Outgoing, ResponseState};
