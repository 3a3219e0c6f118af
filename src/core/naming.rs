//! core::naming
//!
//! Page naming rules: title to URL token, URL token back to a safe page
//! name, and page name to file name.
//!
//! # Security
//!
//! [`to_page_name`] is the only way a caller-supplied title becomes part of
//! a filesystem path. Its output never contains a `..` segment, a leading
//! separator, or any separator at all, so `<name>.md` always stays a direct
//! child of the working copy root.
//!
//! The transform is lossy for titles containing separators: `a/b` and
//! `a b` map to the same page name.

use percent_encoding::percent_decode_str;
use url::form_urlencoded;

/// File extension of every page file.
pub const PAGE_EXTENSION: &str = "md";

/// Encode a page title for embedding in a URL.
///
/// Uses form encoding, so spaces become `+`.
///
/// # Example
///
/// ```
/// use wikistore::core::naming::to_page_url;
///
/// assert_eq!(to_page_url("Getting Started"), "Getting+Started");
/// assert_eq!(to_page_url("a/b?c"), "a%2Fb%3Fc");
/// ```
pub fn to_page_url(title: &str) -> String {
    form_urlencoded::byte_serialize(title.as_bytes()).collect()
}

/// Decode a URL token into a page name that is safe to use as a file stem.
///
/// The token is form-decoded, then cleaned as an absolute path rooted at
/// `/`; the leading separator is stripped and remaining separators become
/// spaces.
///
/// # Example
///
/// ```
/// use wikistore::core::naming::to_page_name;
///
/// assert_eq!(to_page_name("Getting+Started"), "Getting Started");
/// assert_eq!(to_page_name("..%2F..%2Fetc%2Fpasswd"), "etc passwd");
/// assert_eq!(to_page_name("docs/./intro"), "docs intro");
/// ```
pub fn to_page_name(token: &str) -> String {
    let plus_decoded = token.replace('+', " ");
    let decoded = percent_decode_str(&plus_decoded).decode_utf8_lossy();
    // Backslash is a separator on some platforms; treat it as one everywhere.
    let unified = decoded.replace('\\', "/");
    clean_absolute(&unified).join(" ")
}

/// Lexically clean `/<path>` and return the surviving segments.
///
/// `..` at the root stays at the root, so no segment can escape.
fn clean_absolute(path: &str) -> Vec<&str> {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    segments
}

/// File name of the page with the given (already sanitized) name.
///
/// # Example
///
/// ```
/// use wikistore::core::naming::page_file_name;
///
/// assert_eq!(page_file_name("Home"), "Home.md");
/// ```
pub fn page_file_name(name: &str) -> String {
    format!("{}.{}", name, PAGE_EXTENSION)
}

/// Recover a page name from a file name found in the tree.
///
/// Returns `None` for anything that is not a page file.
pub fn page_name_from_file(file_name: &str) -> Option<&str> {
    file_name
        .strip_suffix(PAGE_EXTENSION)
        .and_then(|stem| stem.strip_suffix('.'))
        .filter(|stem| !stem.is_empty())
}
