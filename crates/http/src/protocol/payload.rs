use bytes::{Buf, Bytes};

/// Represents an item in the HTTP message payload stream.
///
/// Produced by the body decoders while reading a request and consumed by the
/// chunk encoder while streaming a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadItem<Data: Buf = Bytes> {
    /// A chunk of payload data
    Chunk(Data),
    /// Marks the end of the payload stream
    Eof,
}

/// How the body of a message is delimited on the wire.
///
/// - Known length: read exactly that many bytes
/// - Chunked: read using chunked transfer encoding
/// - Empty: the message has no body
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PayloadSize {
    /// Payload with known length in bytes
    Length(u64),
    /// Payload using chunked transfer encoding
    Chunked,
    /// Empty payload (no body)
    Empty,
}
