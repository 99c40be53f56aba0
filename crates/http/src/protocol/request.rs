//! The structured request handed to application handlers.
//!
//! A [`Request`] is assembled by the connection from parser fragments. Header
//! entries are kept in arrival order exactly as received (names keep their
//! case, repeated names stay separate entries), which is why they are stored
//! as a list rather than in an `http::HeaderMap`.

use bytes::{Bytes, BytesMut};
use http::{Method, Version};

use crate::protocol::Url;

/// One `name: value` line of the request head.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderEntry {
    name: Bytes,
    value: Bytes,
}

impl HeaderEntry {
    pub fn new(name: impl Into<Bytes>, value: impl Into<Bytes>) -> Self {
        Self { name: name.into(), value: value.into() }
    }

    pub fn name(&self) -> &[u8] {
        &self.name
    }

    pub fn value(&self) -> &[u8] {
        &self.value
    }

    /// Compares the header name ignoring ASCII case.
    #[inline]
    pub fn is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name.as_bytes())
    }
}

#[derive(Debug, Default)]
pub struct Request {
    pub(crate) method: Method,
    pub(crate) version: Version,
    pub(crate) url: Url,
    pub(crate) headers: Vec<HeaderEntry>,
    pub(crate) body: BytesMut,
    pub(crate) keepalive: bool,
}

impl Request {
    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn version(&self) -> Version {
        self.version
    }

    /// The protocol version as it appears on the wire, e.g. `HTTP/1.1`.
    pub fn version_str(&self) -> &'static str {
        version_str(self.version)
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// All header entries in the order they were received.
    pub fn headers(&self) -> &[HeaderEntry] {
        &self.headers
    }

    /// Returns the value of the first header named `name`, ignoring ASCII case.
    pub fn header(&self, name: &str) -> Option<&[u8]> {
        self.headers.iter().find(|entry| entry.is(name)).map(HeaderEntry::value)
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn content_length(&self) -> usize {
        self.body.len()
    }

    /// Whether the connection will be reused once this request is answered.
    pub fn is_keepalive(&self) -> bool {
        self.keepalive
    }
}

pub(crate) fn version_str(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "HTTP/0.9",
        Version::HTTP_10 => "HTTP/1.0",
        Version::HTTP_2 => "HTTP/2.0",
        Version::HTTP_3 => "HTTP/3.0",
        _ => "HTTP/1.1",
    }
}
