//! Decomposed request-target.
//!
//! A [`Url`] keeps the raw request-target exactly as it was received together
//! with every component the URL parser reported. Components are independent
//! [`Bytes`] slices of the raw target, and a component that does not occur in
//! the target is `None` rather than empty.

use bytes::Bytes;
use tracing::debug;

use crate::codec::{parse_url, UrlField, UrlFields};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Url {
    full: Bytes,
    scheme: Option<Bytes>,
    host: Option<Bytes>,
    port: Option<Bytes>,
    path: Option<Bytes>,
    query: Option<Bytes>,
    fragment: Option<Bytes>,
    userinfo: Option<Bytes>,
}

impl Url {
    /// Parses `full` and decomposes it.
    ///
    /// A target the URL parser rejects keeps its raw bytes but has no
    /// components at all.
    pub fn parse(full: Bytes, is_connect: bool) -> Self {
        match parse_url(&full, is_connect) {
            Ok(fields) => Self::decompose(full, &fields),
            Err(e) => {
                debug!(cause = %e, "request target is not decomposable");
                Self { full, ..Self::default() }
            }
        }
    }

    /// Extracts every component `fields` reports as present.
    pub fn decompose(full: Bytes, fields: &UrlFields) -> Self {
        let extract = |field| fields.get(field).map(|range| full.slice(range));

        Self {
            scheme: extract(UrlField::Schema),
            host: extract(UrlField::Host),
            port: extract(UrlField::Port),
            path: extract(UrlField::Path),
            query: extract(UrlField::Query),
            fragment: extract(UrlField::Fragment),
            userinfo: extract(UrlField::UserInfo),
            full,
        }
    }

    /// The raw request-target.
    pub fn full(&self) -> &[u8] {
        &self.full
    }

    pub fn scheme(&self) -> Option<&[u8]> {
        self.scheme.as_deref()
    }

    pub fn host(&self) -> Option<&[u8]> {
        self.host.as_deref()
    }

    pub fn port(&self) -> Option<&[u8]> {
        self.port.as_deref()
    }

    /// The port as a number, the URL parser guarantees it fits in `u16`.
    pub fn port_u16(&self) -> Option<u16> {
        self.port().and_then(|port| std::str::from_utf8(port).ok()).and_then(|port| port.parse().ok())
    }

    pub fn path(&self) -> Option<&[u8]> {
        self.path.as_deref()
    }

    pub fn query(&self) -> Option<&[u8]> {
        self.query.as_deref()
    }

    pub fn fragment(&self) -> Option<&[u8]> {
        self.fragment.as_deref()
    }

    pub fn userinfo(&self) -> Option<&[u8]> {
        self.userinfo.as_deref()
    }
}
