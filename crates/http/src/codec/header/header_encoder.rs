//! Serializes the head of a response: status line, application headers and
//! the framing headers the server owns.
//!
//! Everything up to and including the blank line is written into a single
//! buffer, so a response head always reaches the socket as one write.

use bytes::{BufMut, BytesMut};
use http::Version;
use std::io::Write;
use tokio_util::codec::Encoder;

use crate::protocol::{PayloadSize, SendError, status_reason, version_str};
use crate::utils::FastWrite;

/// Initial buffer size reserved for a response head
const INIT_HEADER_SIZE: usize = 256;

/// Everything needed to write a response head.
///
/// `headers` holds the application headers already serialized as
/// `name: value\r\n` lines.
#[derive(Debug, Clone, Copy)]
pub struct ResponseHead<'a> {
    pub version: Version,
    pub status: u16,
    pub headers: &'a [u8],
    pub payload: PayloadSize,
    pub keep_alive: bool,
}

#[derive(Debug, Default)]
pub struct HeaderEncoder;

impl Encoder<ResponseHead<'_>> for HeaderEncoder {
    type Error = SendError;

    fn encode(&mut self, head: ResponseHead<'_>, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.reserve(INIT_HEADER_SIZE + head.headers.len());

        // unknown codes keep the separator and get an empty reason
        let reason = status_reason(head.status).unwrap_or("");
        write!(FastWrite(dst), "{} {} {}\r\n", version_str(head.version), head.status, reason)?;

        dst.put_slice(head.headers);

        match head.payload {
            PayloadSize::Length(n) => write!(FastWrite(dst), "Content-Length: {n}\r\n")?,
            PayloadSize::Chunked => dst.put_slice(b"Transfer-Encoding: chunked\r\n"),
            PayloadSize::Empty => dst.put_slice(b"Content-Length: 0\r\n"),
        }

        if !head.keep_alive {
            dst.put_slice(b"Connection: close\r\n");
        }

        dst.put_slice(b"\r\n");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    fn encode(head: ResponseHead<'_>) -> String {
        let mut dst = BytesMut::new();
        HeaderEncoder.encode(head, &mut dst).unwrap();
        String::from_utf8(dst.to_vec()).unwrap()
    }

    fn head(status: u16, payload: PayloadSize, keep_alive: bool) -> ResponseHead<'static> {
        ResponseHead { version: Version::HTTP_11, status, headers: b"", payload, keep_alive }
    }

    #[test]
    fn buffered_keepalive_head() {
        let head = ResponseHead { headers: b"X-A: 1\r\nX-A: 2\r\n", ..head(404, PayloadSize::Length(5), true) };

        let expected = indoc! {"
            HTTP/1.1 404 Not Found\r
            X-A: 1\r
            X-A: 2\r
            Content-Length: 5\r
            \r
        "};
        assert_eq!(encode(head), expected);
    }

    #[test]
    fn chunked_close_head() {
        let expected = "HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\nConnection: close\r\n\r\n";
        assert_eq!(encode(head(200, PayloadSize::Chunked, false)), expected);
    }

    #[test]
    fn unknown_status_gets_empty_reason() {
        assert_eq!(encode(head(599, PayloadSize::Empty, true)), "HTTP/1.1 599 \r\nContent-Length: 0\r\n\r\n");
    }

    #[test]
    fn echoes_http_10() {
        let head = ResponseHead { version: Version::HTTP_10, ..head(204, PayloadSize::Empty, false) };
        assert!(encode(head).starts_with("HTTP/1.0 204 No Content\r\n"));
    }
}
