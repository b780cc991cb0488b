//! Anchor-link extraction and classification for directory-listing pages.
//!
//! Static dataset hosts expose their file trees as `index.html` pages whose
//! anchor tags enumerate files and subdirectories. This module is the
//! link-extraction capability behind the mirror driver: pull ordered `href`
//! values out of a page, decide which ones are sub-indexes to recurse into
//! and which are terminal files, and rewrite relative hrefs against the
//! page URL. No DOM traversal beyond anchor tags.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

/// Default base URL of the Massachusetts roads dataset host.
pub const DEFAULT_MIRROR_BASE_URL: &str = "https://www.cs.toronto.edu/~vmnih/data/";

/// Default seed paths mirrored when none are given on the command line:
/// the six tile index pages plus the roads shapefile.
pub const DEFAULT_MIRROR_SEEDS: [&str; 7] = [
    "mass_roads/train/sat/index.html",
    "mass_roads/train/map/index.html",
    "mass_roads/valid/sat/index.html",
    "mass_roads/valid/map/index.html",
    "mass_roads/test/sat/index.html",
    "mass_roads/test/map/index.html",
    "mass_roads/massachusetts_roads_shape.zip",
];

/// Matches anchor tags and captures the href value; both quote styles.
#[allow(clippy::expect_used)]
static HREF_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<a\s[^>]*?href\s*=\s*["']([^"']+)["']"#).expect("href regex is valid") // Static pattern, safe to panic
});

/// Classification of a followable link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    /// A sub-index page to recurse into.
    Index,
    /// A terminal file to download directly.
    File,
}

/// Extracts anchor `href` values from an HTML document, in document order.
#[must_use]
pub fn extract_hrefs(html: &str) -> Vec<String> {
    HREF_PATTERN
        .captures_iter(html)
        .map(|caps| caps[1].to_string())
        .collect()
}

/// Classifies an href, or returns `None` for links the mirror does not
/// follow.
///
/// Not followed: empty hrefs, fragments, bare query strings, rooted paths
/// (`/...`), parent traversals (`..`), and non-HTTP schemes - these would
/// escape the mirrored tree or loop back up it. Everything else is either
/// an [`LinkKind::Index`] (final path segment `index.html`, or a trailing
/// slash) or a [`LinkKind::File`].
///
/// Scheme-qualified `http(s)` hrefs are classified by shape; the driver
/// still enforces that the resolved URL stays under the configured base.
#[must_use]
pub fn classify_link(href: &str) -> Option<LinkKind> {
    let href = href.trim();
    if href.is_empty()
        || href.starts_with('#')
        || href.starts_with('?')
        || href.starts_with('/')
    {
        return None;
    }
    if let Some((scheme, _)) = href.split_once(':') {
        if scheme != "http" && scheme != "https" {
            return None;
        }
    }

    // Strip query/fragment before inspecting the path shape.
    let path = href.split(['?', '#']).next().unwrap_or(href);
    if path.split('/').any(|segment| segment == "..") {
        return None;
    }

    if path.ends_with('/') {
        return Some(LinkKind::Index);
    }
    let last_segment = path.rsplit('/').next().unwrap_or(path);
    if last_segment == "index.html" {
        Some(LinkKind::Index)
    } else {
        Some(LinkKind::File)
    }
}

/// Rewrites an href against the URL of the page it appeared on.
///
/// Relative hrefs resolve the way a browser would; absolute hrefs pass
/// through unchanged.
///
/// # Errors
///
/// Returns the underlying parse error for hrefs that cannot form a URL.
pub fn resolve_href(page_url: &Url, href: &str) -> Result<Url, url::ParseError> {
    page_url.join(href)
}

/// The local sub-path an index href maps to: the href's path with the
/// trailing `index.html` removed.
///
/// `sub/index.html` maps to `sub`; `sub/` maps to `sub`.
#[must_use]
pub fn index_subpath(href: &str) -> &str {
    let path = href.split(['?', '#']).next().unwrap_or(href);
    path.trim_end_matches("index.html").trim_end_matches('/')
}
