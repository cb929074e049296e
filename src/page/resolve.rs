// src/page/resolve.rs
// =============================================================================
// Turns a link found on a page into an absolute URL.
//
// Examples:
//   base = "http://localhost/index.html"
//   "test2/test2.html"          -> "http://localhost/test2/test2.html"
//   "//www.baidu.com/help.html" -> "http://www.baidu.com/help.html"
//   "/docs"                     -> "http://localhost/docs"
//
// The url crate quietly strips leading and trailing spaces, and tabs or
// newlines anywhere, from whatever it parses. That is fine for the link itself
// (we trim it anyway), but a base URL padded with whitespace or carrying
// control characters means the caller handed us something broken, so it is
// rejected instead of resolved. Spaces inside a base are accepted and come out
// percent-encoded.
// =============================================================================

use url::Url;

use crate::error::ResolveError;

// Resolves `relative` against the page URL `base`
//
// Parameters:
//   relative: the raw attribute value (surrounding whitespace is ignored)
//   base: the absolute URL of the page the link was found on
//
// Returns: the absolute URL, or a ResolveError naming what failed to parse
//
// Examples:
//   base = "http://a.test/my dir/index.html"
//   relative = "b.html" -> Ok("http://a.test/my%20dir/b.html")
//   base = " http://a.test/" -> Err(IllegalBase)
pub fn resolve(relative: &str, base: &str) -> Result<String, ResolveError> {
    if base.trim() != base || base.chars().any(char::is_control) {
        return Err(ResolveError::IllegalBase(base.to_string()));
    }

    let base_url = Url::parse(base).map_err(|source| ResolveError::Base {
        base: base.to_string(),
        source,
    })?;

    let reference = relative.trim();
    let absolute = base_url
        .join(reference)
        .map_err(|source| ResolveError::Reference {
            reference: reference.to_string(),
            base: base.to_string(),
            source,
        })?;

    Ok(absolute.to_string())
}
