// src/page/links.rs
// =============================================================================
// Extracts the links worth following from a parsed HTML page.
//
// For every element, in document order, the `href` and `src` attributes are
// inspected. A value is kept when:
// - it is not a `javascript:location` pseudo-link
// - it matches the target pattern (checked on the raw attribute value)
// - it resolves to an absolute URL against the page URL
//
// Duplicates are kept. Deciding whether a URL is worth visiting twice is the
// dispatcher's job, not the extractor's.
//
// The walk is iterative (`descendants()` is a pre-order iterator), so deeply
// nested documents cannot overflow the stack.
// =============================================================================

use std::sync::LazyLock;

use regex::Regex;
use scraper::ElementRef;
use tracing::warn;

use super::resolve::resolve;

const LINK_ATTRIBUTES: [&str; 2] = ["href", "src"];

static SCRIPT_NAVIGATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("javascript:location").expect("static pattern compiles"));

// Collects the followable links under `root`
//
// Parameters:
//   root: the element to walk (usually the document root)
//   base_url: the URL of the page, for resolving relative links
//   pattern: the target pattern each raw attribute value must match
//
// Returns: absolute URLs in document order, duplicates included
//
// Example:
//   html = "<a href='test2/test2.html'>t</a><img src='logo.png'>"
//   base_url = "http://localhost/index.html", pattern = ".*.(htm|html)$"
//   result = ["http://localhost/test2/test2.html"]
pub fn extract_links(root: ElementRef<'_>, base_url: &str, pattern: &Regex) -> Vec<String> {
    let mut links = Vec::new();

    for node in root.descendants() {
        let Some(element) = node.value().as_element() else {
            continue;
        };

        for (name, value) in element.attrs() {
            if !LINK_ATTRIBUTES.contains(&name) {
                continue;
            }
            if SCRIPT_NAVIGATION.is_match(value) || !pattern.is_match(value) {
                continue;
            }

            match resolve(value, base_url) {
                Ok(url) => links.push(url),
                Err(e) => warn!(link = value, page = base_url, error = %e, "dropping unresolvable link"),
            }
        }
    }

    links
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why match the pattern on the raw value?
//    - The pattern is written against what page authors put in attributes,
//      e.g. ".*.(htm|html)$" also accepts "test2/test2.html"
//    - Resolving first would make every kept URL absolute and change what
//      anchors like "^http" mean
//
// 2. Why both href and src?
//    - Frames and iframes carry their pages in `src`, so an <a>-only walk
//      misses them. Images usually fail the pattern and fall out anyway
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    const PAGE: &str = r#"<!DOCTYPE html>
<html>
    <head>
        <meta charset=utf8>
        <title>TestParseHTML</title>
    </head>
    <body>
        <ul>
            <li><a href=test1.html>test1</a></li>
            <li><a href='test2/test2.html'>test2</a></li>
            <li><a href='javascript:location.href="test3.html"'>test3</a></li>
        </ul>
    </body>
</html>
"#;

    fn html_pattern() -> Regex {
        Regex::new(r".*.(htm|html)$").unwrap()
    }

    fn links_of(html: &str, base: &str, pattern: &Regex) -> Vec<String> {
        let document = Html::parse_document(html);
        extract_links(document.root_element(), base, pattern)
    }

    #[test]
    fn test_extract_matching_links() {
        let links = links_of(PAGE, "http://localhost/index.html", &html_pattern());

        assert_eq!(
            links,
            vec![
                "http://localhost/test1.html",
                "http://localhost/test2/test2.html",
            ]
        );
    }

    #[test]
    fn test_skip_script_navigation_even_when_it_matches() {
        let html = r#"
            <a href="javascript:location.assign(next);go.html">go</a>
            <a href="next.html">next</a>
        "#;
        let links = links_of(html, "http://localhost/", &html_pattern());

        assert_eq!(links, vec!["http://localhost/next.html"]);
    }

    #[test]
    fn test_no_match_returns_nothing() {
        let pattern = Regex::new(r"\.pdf$").unwrap();
        let links = links_of(PAGE, "http://localhost/index.html", &pattern);

        assert!(links.is_empty());
    }

    #[test]
    fn test_duplicates_and_document_order() {
        let html = r#"
            <img src="/img/logo.htm">
            <a href="b.html">b</a>
            <a href="a.html">a</a>
            <a href="b.html">b again</a>
        "#;
        let links = links_of(html, "http://localhost/dir/", &html_pattern());

        assert_eq!(
            links,
            vec![
                "http://localhost/img/logo.htm",
                "http://localhost/dir/b.html",
                "http://localhost/dir/a.html",
                "http://localhost/dir/b.html",
            ]
        );
    }

    #[test]
    fn test_unresolvable_link_dropped() {
        let html = r#"
            <a href="http://[::1/broken.html">broken</a>
            <a href="fine.html">fine</a>
        "#;
        let links = links_of(html, "http://localhost/", &html_pattern());

        assert_eq!(links, vec!["http://localhost/fine.html"]);
    }

    #[test]
    fn test_bad_base_drops_everything() {
        let links = links_of(PAGE, " http://localhost/index.html", &html_pattern());
        assert!(links.is_empty());
    }
}
