//! Listing-page parsing: extracts a directory's children from the HTML
//! index page the server generates for it.
//!
//! Server index pages (Apache, nginx autoindex) enumerate children as
//! anchors. A name ending in `/` is a subdirectory, anything else is a
//! file. The parent-directory link and the column-sorting links the
//! server adds are chrome, not children, and are skipped.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;
use tracing::trace;

/// Regex pattern for anchors on a listing page.
/// Captures the href value and the link text.
#[allow(clippy::expect_used)]
static ANCHOR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<a\s[^>]*href\s*=\s*"([^"]*)"[^>]*>(.*?)</a>"#)
        .expect("anchor regex is valid") // Static pattern, safe to panic
});

/// Parse errors for listing pages.
#[derive(Debug, Error)]
pub enum ListingError {
    /// The page contains no anchors at all; it is not an index page.
    #[error("listing page has no entries (not an index page?)")]
    NoEntries,
}

/// Immediate children of one remote directory, in document order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Listing {
    /// File names relative to the directory.
    pub files: Vec<String>,
    /// Subdirectory names relative to the directory, each ending in `/`.
    pub dirs: Vec<String>,
}

impl Listing {
    /// True if the directory has no children.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.dirs.is_empty()
    }
}

/// Parses one listing page into its file and subdirectory names.
///
/// # Errors
///
/// Returns [`ListingError::NoEntries`] if the page contains no anchors;
/// an empty directory still carries the parent-directory link, so a page
/// with none is not a listing at all.
pub fn parse(html: &str) -> Result<Listing, ListingError> {
    let mut listing = Listing::default();
    let mut saw_anchor = false;

    for capture in ANCHOR_PATTERN.captures_iter(html) {
        saw_anchor = true;
        let href = &capture[1];
        let text = capture[2].trim();

        if !is_child_entry(href, text) {
            trace!(href = %href, "skipping non-child anchor");
            continue;
        }

        if href.ends_with('/') {
            listing.dirs.push(href.to_string());
        } else {
            listing.files.push(href.to_string());
        }
    }

    if !saw_anchor {
        return Err(ListingError::NoEntries);
    }

    Ok(listing)
}

/// True if an anchor names an immediate child of the directory.
///
/// Rejects the parent-directory link, server sort links (`?C=N;O=D`),
/// and absolute or scheme-qualified hrefs that point outside the
/// directory.
fn is_child_entry(href: &str, text: &str) -> bool {
    if href.is_empty() || text == "Parent Directory" {
        return false;
    }
    if href == "../" || href == ".." || href == "./" {
        return false;
    }
    if href.starts_with('?') || href.starts_with('#') || href.starts_with('/') {
        return false;
    }
    if href.contains("://") {
        return false;
    }
    true
}
