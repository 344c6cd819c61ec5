use chardetng::EncodingDetector;
use encoding_rs::Encoding;
use watch_logging::watch_debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedPage {
    pub html: String,
    pub encoding_label: String,
}

/// Decodes a response body to UTF-8. Order: BOM, then the Content-Type charset,
/// then chardetng. Malformed sequences become U+FFFD; a listing page with one
/// bad byte is still worth scanning.
pub fn decode_page(bytes: &[u8], content_type: Option<&str>) -> DecodedPage {
    let encoding = Encoding::for_bom(bytes)
        .map(|(enc, _)| enc)
        .or_else(|| {
            content_type
                .and_then(charset_label)
                .and_then(|label| Encoding::for_label(label.as_bytes()))
        })
        .unwrap_or_else(|| {
            let mut detector = EncodingDetector::new();
            detector.feed(bytes, true);
            detector.guess(None, true)
        });

    let (text, used, had_errors) = encoding.decode(bytes);
    if had_errors {
        watch_debug!("page body had invalid {} sequences", used.name());
    }
    DecodedPage {
        html: text.into_owned(),
        encoding_label: used.name().to_string(),
    }
}

fn charset_label(content_type: &str) -> Option<String> {
    content_type.split(';').find_map(|part| {
        let (key, value) = part.split_once('=')?;
        if key.trim().eq_ignore_ascii_case("charset") {
            Some(value.trim().trim_matches(['"', '\'']).to_string())
        } else {
            None
        }
    })
}
