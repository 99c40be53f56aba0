//! HTTP body codecs.
//!
//! ## Decoders
//! - [`ChunkedDecoder`]: chunked transfer encoded request bodies
//! - [`LengthDecoder`]: `Content-Length` delimited request bodies
//! - [`PayloadDecoder`]: picks one of the above from the request head
//!
//! ## Encoders
//! - [`ChunkedEncoder`]: frames response chunks for the streaming engine

mod chunked_decoder;
mod chunked_encoder;
mod length_decoder;
mod payload_decoder;

pub use chunked_decoder::ChunkedDecoder;
pub use chunked_encoder::ChunkedEncoder;
pub use length_decoder::LengthDecoder;
pub use payload_decoder::PayloadDecoder;
