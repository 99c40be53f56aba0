//! Wire-level encoding and decoding of HTTP/1.x messages.
//!
//! - Request side:
//!   - [`RequestParser`]: incremental parser reporting a request through
//!     [`ParseCallbacks`] events
//!   - [`HeaderAccumulator`]: folds header fragments back into entries
//!   - [`parse_url`]: request-target field table
//!   - body decoders for `Content-Length` and chunked bodies (private)
//!
//! - Response side:
//!   - [`HeaderEncoder`]: status line and header block of a response
//!   - [`ChunkedEncoder`]: chunk framing of streamed bodies

mod body;
mod header;
mod request_parser;
mod url;

pub use body::ChunkedEncoder;
pub use header::{HeaderAccumulator, HeaderEncoder, ResponseHead};
pub use request_parser::{MessageHead, ParseCallbacks, ParseStatus, ParserLimits, RequestParser};
pub use url::{UrlField, UrlFields, parse_url};
