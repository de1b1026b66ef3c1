use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

use crate::identifier::QrId;

/// Page the QR code points phones at.
pub const DEFAULT_BASE_URL: &str = "https://enrrimendoza.github.io/Api-QR-generator/";

/// Everything except RFC 3986 unreserved characters is escaped.
const QUERY_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Builds `{base_url}?qr_id=..&session_id=..`, appending to an existing query if present.
pub fn pairing_url(base_url: &str, qr_id: QrId, session_id: &str) -> String {
    let separator = match base_url.find('?') {
        None => "?",
        Some(_) if base_url.ends_with('?') || base_url.ends_with('&') => "",
        Some(_) => "&",
    };
    format!(
        "{base_url}{separator}qr_id={qr_id}&session_id={}",
        utf8_percent_encode(session_id, QUERY_VALUE)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_token_appears_literally() {
        let url = pairing_url(DEFAULT_BASE_URL, QrId::new(123456), "sess-01_a.b~c");
        assert_eq!(
            url,
            "https://enrrimendoza.github.io/Api-QR-generator/?qr_id=123456&session_id=sess-01_a.b~c"
        );
    }

    #[test]
    fn reserved_characters_are_escaped() {
        let url = pairing_url("https://x.test/p", QrId::new(9), "a&qr_id=1 é");
        assert_eq!(
            url,
            "https://x.test/p?qr_id=9&session_id=a%26qr_id%3D1%20%C3%A9"
        );
        assert_eq!(url.matches("qr_id=").count(), 1);
    }

    #[test]
    fn existing_query_is_extended() {
        assert_eq!(
            pairing_url("https://x.test/?lang=es", QrId::new(5), "s"),
            "https://x.test/?lang=es&qr_id=5&session_id=s"
        );
        assert_eq!(
            pairing_url("https://x.test/?", QrId::new(5), "s"),
            "https://x.test/?qr_id=5&session_id=s"
        );
    }
}
