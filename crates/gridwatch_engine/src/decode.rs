use chardetng::EncodingDetector;
use encoding_rs::Encoding;

use crate::{FailureKind, FetchError};

/// Search page text plus the encoding it was decoded with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedPage {
    pub html: String,
    pub encoding: &'static str,
}

/// Decodes a search page body. Order of trust: byte order mark, then the
/// `charset` parameter of the Content-Type header, then chardetng's guess.
pub fn decode_page(bytes: &[u8], content_type: Option<&str>) -> Result<DecodedPage, FetchError> {
    if let Some((encoding, _)) = Encoding::for_bom(bytes) {
        return decode_with(bytes, encoding);
    }

    let declared = content_type
        .and_then(charset_param)
        .and_then(|label| Encoding::for_label(label.as_bytes()));
    if let Some(encoding) = declared {
        return decode_with(bytes, encoding);
    }

    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    decode_with(bytes, detector.guess(None, true))
}

fn charset_param(content_type: &str) -> Option<String> {
    content_type.split(';').skip(1).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        key.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches(['"', '\'']).to_string())
    })
}

fn decode_with(bytes: &[u8], encoding: &'static Encoding) -> Result<DecodedPage, FetchError> {
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        return Err(FetchError::new(
            FailureKind::Decode,
            format!("malformed {} byte sequence", encoding.name()),
        ));
    }
    Ok(DecodedPage {
        html: text.into_owned(),
        encoding: encoding.name(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_charset_is_honoured() {
        let page = decode_page(b"caf\xe9", Some("text/html; Charset=\"ISO-8859-1\"")).unwrap();
        assert_eq!(page.html, "caf\u{e9}");
        assert_eq!(page.encoding, "windows-1252");
    }

    #[test]
    fn bom_wins_over_header() {
        let page = decode_page(b"\xEF\xBB\xBFok", Some("text/html; charset=ISO-8859-1")).unwrap();
        assert_eq!(page.html, "ok");
        assert_eq!(page.encoding, "UTF-8");
    }

    #[test]
    fn invalid_utf8_is_a_decode_failure() {
        let err = decode_page(b"ab\xffcd", Some("text/html; charset=utf-8")).unwrap_err();
        assert_eq!(err.kind, FailureKind::Decode);
    }
}
