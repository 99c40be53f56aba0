//! Request-target field parser.
//!
//! [`parse_url`] does not copy anything: it reports, for every URL component
//! present in the target, the byte range it occupies. The decomposition into
//! owned components happens in [`Url::decompose`](crate::protocol::Url::decompose).
//!
//! Supported forms ([RFC 9112 Section 3.2](https://www.rfc-editor.org/rfc/rfc9112#section-3.2)):
//!
//! - origin form: `/path[?query][#fragment]`
//! - asterisk form: `*`
//! - absolute form: `scheme://[userinfo@]host[:port][/path][?query][#fragment]`
//! - authority form, only for `CONNECT`: `host:port`

use std::ops::Range;

use crate::ensure;
use crate::protocol::ParseError;

/// A component of a request-target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlField {
    Schema,
    Host,
    Port,
    Path,
    Query,
    Fragment,
    UserInfo,
}

const FIELD_COUNT: usize = 7;

impl UrlField {
    #[inline]
    const fn index(self) -> usize {
        self as usize
    }
}

/// Byte ranges of the components present in a request-target.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlFields {
    fields: [Option<Range<usize>>; FIELD_COUNT],
}

impl UrlFields {
    /// Range of `field` in the parsed target, `None` when the field is absent.
    pub fn get(&self, field: UrlField) -> Option<Range<usize>> {
        self.fields[field.index()].clone()
    }

    pub fn is_set(&self, field: UrlField) -> bool {
        self.fields[field.index()].is_some()
    }

    fn set(&mut self, field: UrlField, range: Range<usize>) {
        self.fields[field.index()] = Some(range);
    }

    fn set_non_empty(&mut self, field: UrlField, range: Range<usize>) {
        if !range.is_empty() {
            self.set(field, range);
        }
    }
}

/// Computes the field table of `url`.
///
/// `is_connect` selects the authority form used by `CONNECT` requests, where
/// both host and port are mandatory.
pub fn parse_url(url: &[u8], is_connect: bool) -> Result<UrlFields, ParseError> {
    ensure!(!url.is_empty(), ParseError::InvalidUri);
    ensure!(url.iter().all(|b| b.is_ascii_graphic()), ParseError::InvalidUri);

    let mut fields = UrlFields::default();

    if is_connect {
        parse_authority(url, 0..url.len(), &mut fields, false)?;
        ensure!(fields.is_set(UrlField::Port), ParseError::InvalidUri);
        return Ok(fields);
    }

    let path_start = match url[0] {
        b'/' => 0,
        b'*' => {
            ensure!(url.len() == 1, ParseError::InvalidUri);
            fields.set(UrlField::Path, 0..1);
            return Ok(fields);
        }
        b if b.is_ascii_alphabetic() => parse_scheme_and_authority(url, &mut fields)?,
        _ => return Err(ParseError::InvalidUri),
    };

    parse_path_query_fragment(url, path_start, &mut fields);
    Ok(fields)
}

/// Parses `scheme://authority` and returns where the path starts.
fn parse_scheme_and_authority(url: &[u8], fields: &mut UrlFields) -> Result<usize, ParseError> {
    let colon = url.iter().position(|b| *b == b':').ok_or(ParseError::InvalidUri)?;
    ensure!(url[..colon].iter().all(|b| is_scheme_char(*b)), ParseError::InvalidUri);
    ensure!(url[colon + 1..].starts_with(b"//"), ParseError::InvalidUri);
    fields.set(UrlField::Schema, 0..colon);

    let authority_start = colon + 3;
    let authority_end = url[authority_start..]
        .iter()
        .position(|b| matches!(b, b'/' | b'?' | b'#'))
        .map_or(url.len(), |offset| authority_start + offset);

    parse_authority(url, authority_start..authority_end, fields, true)?;
    Ok(authority_end)
}

fn parse_authority(
    url: &[u8],
    authority: Range<usize>,
    fields: &mut UrlFields,
    allow_userinfo: bool,
) -> Result<(), ParseError> {
    let mut host_start = authority.start;

    if let Some(at) = url[authority.clone()].iter().rposition(|b| *b == b'@') {
        ensure!(allow_userinfo, ParseError::InvalidUri);
        let at = authority.start + at;
        ensure!(url[authority.start..at].iter().all(|b| is_userinfo_char(*b)), ParseError::InvalidUri);
        fields.set_non_empty(UrlField::UserInfo, authority.start..at);
        host_start = at + 1;
    }

    let port_start = if url.get(host_start) == Some(&b'[') {
        // ip literal, the brackets are not part of the host
        let close = url[host_start..authority.end]
            .iter()
            .position(|b| *b == b']')
            .map(|offset| host_start + offset)
            .ok_or(ParseError::InvalidUri)?;
        ensure!(close > host_start + 1, ParseError::InvalidUri);
        ensure!(url[host_start + 1..close].iter().all(|b| is_ip_literal_char(*b)), ParseError::InvalidUri);
        fields.set(UrlField::Host, host_start + 1..close);

        match url.get(close + 1) {
            _ if close + 1 == authority.end => None,
            Some(b':') => Some(close + 2),
            _ => return Err(ParseError::InvalidUri),
        }
    } else {
        let colon = url[host_start..authority.end].iter().position(|b| *b == b':').map(|offset| host_start + offset);
        let host_end = colon.unwrap_or(authority.end);
        ensure!(host_end > host_start, ParseError::InvalidUri);
        ensure!(url[host_start..host_end].iter().all(|b| is_host_char(*b)), ParseError::InvalidUri);
        fields.set(UrlField::Host, host_start..host_end);
        colon.map(|colon| colon + 1)
    };

    if let Some(port_start) = port_start {
        let port = &url[port_start..authority.end];
        ensure!(!port.is_empty() && port.len() <= 5, ParseError::InvalidUri);
        ensure!(port.iter().all(u8::is_ascii_digit), ParseError::InvalidUri);
        let value = port.iter().fold(0u32, |acc, b| acc * 10 + u32::from(b - b'0'));
        ensure!(value <= u32::from(u16::MAX), ParseError::InvalidUri);
        fields.set(UrlField::Port, port_start..authority.end);
    }

    Ok(())
}

fn parse_path_query_fragment(url: &[u8], start: usize, fields: &mut UrlFields) {
    let fragment_mark = url[start..].iter().position(|b| *b == b'#').map(|offset| start + offset);
    let before_fragment = fragment_mark.unwrap_or(url.len());
    let query_mark = url[start..before_fragment].iter().position(|b| *b == b'?').map(|offset| start + offset);
    let path_end = query_mark.unwrap_or(before_fragment);

    fields.set_non_empty(UrlField::Path, start..path_end);
    if let Some(query_mark) = query_mark {
        fields.set_non_empty(UrlField::Query, query_mark + 1..before_fragment);
    }
    if let Some(fragment_mark) = fragment_mark {
        fields.set_non_empty(UrlField::Fragment, fragment_mark + 1..url.len());
    }
}

#[inline]
fn is_scheme_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'+' | b'-' | b'.')
}

#[inline]
fn is_host_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~' | b'%' | b'!' | b'$' | b'&' | b'\'' | b'(' | b')' | b'*' | b'+' | b',' | b';' | b'=')
}

#[inline]
fn is_userinfo_char(b: u8) -> bool {
    is_host_char(b) || b == b':'
}

#[inline]
fn is_ip_literal_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b':' | b'.' | b'%')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field<'a>(url: &'a [u8], fields: &UrlFields, field: UrlField) -> Option<&'a [u8]> {
        fields.get(field).map(|range| &url[range])
    }

    #[test]
    fn origin_form() {
        let url = b"/index/?a=1&b=2#frag";
        let fields = parse_url(url, false).unwrap();

        assert_eq!(field(url, &fields, UrlField::Path), Some(&b"/index/"[..]));
        assert_eq!(field(url, &fields, UrlField::Query), Some(&b"a=1&b=2"[..]));
        assert_eq!(field(url, &fields, UrlField::Fragment), Some(&b"frag"[..]));
        assert!(!fields.is_set(UrlField::Schema));
        assert!(!fields.is_set(UrlField::Host));
        assert!(!fields.is_set(UrlField::Port));
        assert!(!fields.is_set(UrlField::UserInfo));
    }

    #[test]
    fn empty_query_and_fragment_are_absent() {
        let url = b"/x?#";
        let fields = parse_url(url, false).unwrap();

        assert_eq!(field(url, &fields, UrlField::Path), Some(&b"/x"[..]));
        assert!(!fields.is_set(UrlField::Query));
        assert!(!fields.is_set(UrlField::Fragment));
    }

    #[test]
    fn question_mark_inside_fragment() {
        let url = b"/p#a?b";
        let fields = parse_url(url, false).unwrap();

        assert_eq!(field(url, &fields, UrlField::Path), Some(&b"/p"[..]));
        assert!(!fields.is_set(UrlField::Query));
        assert_eq!(field(url, &fields, UrlField::Fragment), Some(&b"a?b"[..]));
    }

    #[test]
    fn asterisk_form() {
        let fields = parse_url(b"*", false).unwrap();
        assert_eq!(fields.get(UrlField::Path), Some(0..1));
        assert!(parse_url(b"*x", false).is_err());
    }

    #[test]
    fn absolute_form() {
        let url = b"https://alice@example.com:443/a?b#c";
        let fields = parse_url(url, false).unwrap();

        assert_eq!(field(url, &fields, UrlField::Schema), Some(&b"https"[..]));
        assert_eq!(field(url, &fields, UrlField::UserInfo), Some(&b"alice"[..]));
        assert_eq!(field(url, &fields, UrlField::Host), Some(&b"example.com"[..]));
        assert_eq!(field(url, &fields, UrlField::Port), Some(&b"443"[..]));
        assert_eq!(field(url, &fields, UrlField::Path), Some(&b"/a"[..]));
        assert_eq!(field(url, &fields, UrlField::Query), Some(&b"b"[..]));
        assert_eq!(field(url, &fields, UrlField::Fragment), Some(&b"c"[..]));
    }

    #[test]
    fn absolute_form_without_path() {
        let url = b"http://example.com?q";
        let fields = parse_url(url, false).unwrap();

        assert_eq!(field(url, &fields, UrlField::Host), Some(&b"example.com"[..]));
        assert!(!fields.is_set(UrlField::Path));
        assert_eq!(field(url, &fields, UrlField::Query), Some(&b"q"[..]));
    }

    #[test]
    fn ipv6_host() {
        let url = b"http://[::1]:8080/";
        let fields = parse_url(url, false).unwrap();

        assert_eq!(field(url, &fields, UrlField::Host), Some(&b"::1"[..]));
        assert_eq!(field(url, &fields, UrlField::Port), Some(&b"8080"[..]));
        assert_eq!(field(url, &fields, UrlField::Path), Some(&b"/"[..]));
    }

    #[test]
    fn connect_authority_form() {
        let url = b"example.com:443";
        let fields = parse_url(url, true).unwrap();

        assert_eq!(field(url, &fields, UrlField::Host), Some(&b"example.com"[..]));
        assert_eq!(field(url, &fields, UrlField::Port), Some(&b"443"[..]));
        assert!(!fields.is_set(UrlField::Path));

        assert!(parse_url(b"example.com", true).is_err());
        assert!(parse_url(b"user@example.com:443", true).is_err());
    }

    #[test]
    fn rejects_malformed_targets() {
        assert!(parse_url(b"", false).is_err());
        assert!(parse_url(b"http:/x", false).is_err());
        assert!(parse_url(b"http://:80/", false).is_err());
        assert!(parse_url(b"http://host:99999/", false).is_err());
        assert!(parse_url(b"http://host:8a/", false).is_err());
        assert!(parse_url(b"http://[::1/", false).is_err());
        assert!(parse_url(b"?q", false).is_err());
        assert!(parse_url(b"/a b", false).is_err());
    }
}
