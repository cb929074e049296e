// src/page/charset.rs
// =============================================================================
// Normalizes response bodies to UTF-8.
//
// Detection order:
// 1. a byte order mark
// 2. the `charset` parameter of the Content-Type header
// 3. a <meta charset=...> or <meta http-equiv ... content="...charset=...">
//    declaration within the first 1024 bytes
//
// If none of these names a known encoding, a body that is already valid UTF-8
// is passed through untouched. Anything else is read as windows-1252, which
// maps every byte to a character, so no byte of the page is lost.
// =============================================================================

use std::sync::LazyLock;

use encoding_rs::Encoding;
use regex::bytes::Regex;

const PRESCAN_LIMIT: usize = 1024;

static META_CHARSET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i-u)<meta[^>]+charset\s*=\s*["']?\s*([a-z0-9_:.\-]+)"#)
        .expect("static pattern compiles")
});

pub fn detect(body: &[u8], content_type: Option<&str>) -> Option<&'static Encoding> {
    if let Some((encoding, _)) = Encoding::for_bom(body) {
        return Some(encoding);
    }

    if let Some(encoding) = content_type.and_then(charset_param).and_then(|label| {
        Encoding::for_label(label.as_bytes())
    }) {
        return Some(encoding);
    }

    let head = &body[..body.len().min(PRESCAN_LIMIT)];
    META_CHARSET
        .captures(head)
        .and_then(|caps| caps.get(1))
        .and_then(|label| Encoding::for_label(label.as_bytes()))
}

// Decodes `body` to a String using the detected encoding.
//
// Parameters:
//   body: the raw response bytes
//   content_type: the Content-Type header value, if the server sent one
//
// Returns: the page text; never fails
//
// Example:
//   body = b"caf\xE9", content_type = Some("text/html")
//   result = "café" (no charset named, not UTF-8, read as windows-1252)
pub fn to_utf8(body: &[u8], content_type: Option<&str>) -> String {
    if let Some(encoding) = detect(body, content_type) {
        let (text, _, _) = encoding.decode(body);
        return text.into_owned();
    }

    match std::str::from_utf8(body) {
        Ok(text) => text.to_owned(),
        Err(_) => {
            let (text, _, _) = encoding_rs::WINDOWS_1252.decode(body);
            text.into_owned()
        }
    }
}

fn charset_param(content_type: &str) -> Option<&str> {
    content_type
        .split(';')
        .map(str::trim)
        .find_map(|part| {
            let (key, value) = part.split_once('=')?;
            key.trim()
                .eq_ignore_ascii_case("charset")
                .then(|| value.trim().trim_matches(|c| c == '"' || c == '\''))
        })
}
