//! Status-code to reason-phrase table used when serializing status lines.

use http::StatusCode;

/// Returns the canonical reason phrase for `code`.
///
/// Codes that are not registered (or that fall outside `100..=999`) have no
/// reason phrase and are serialized with an empty one.
///
/// ```
/// use micro_h1::protocol::status_reason;
///
/// assert_eq!(status_reason(200), Some("OK"));
/// assert_eq!(status_reason(404), Some("Not Found"));
/// assert_eq!(status_reason(599), None);
/// assert_eq!(status_reason(42), None);
/// ```
pub fn status_reason(code: u16) -> Option<&'static str> {
    StatusCode::from_u16(code).ok().and_then(|status| status.canonical_reason())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_codes() {
        assert_eq!(status_reason(100), Some("Continue"));
        assert_eq!(status_reason(201), Some("Created"));
        assert_eq!(status_reason(301), Some("Moved Permanently"));
        assert_eq!(status_reason(500), Some("Internal Server Error"));
    }

    #[test]
    fn unknown_codes_have_no_reason() {
        assert_eq!(status_reason(0), None);
        assert_eq!(status_reason(299), None);
        assert_eq!(status_reason(1000), None);
    }
}
