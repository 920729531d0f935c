//! Field and image extraction from rendered record pages
//!
//! Record pages list student details as two-cell table rows. Two layouts are
//! in use: a data table (primary) and a plain key/value table (fallback). The
//! profile image is set as an inline `background-image` style.

use crate::identifier::Identifier;
use crate::record::{Record, IDENTIFIER_FIELD, IMAGE_PATH_FIELD};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Rows of the primary data-table layout
pub const PRIMARY_ROW_SELECTOR: &str = ".v-data-table table tbody tr";

/// Rows of the fallback key/value layout
pub const SECONDARY_ROW_SELECTOR: &str = ".key-value-table tr";

/// Present once either layout has rendered at least one row
pub const MARKER_SELECTOR: &str = ".v-data-table table tbody tr, .key-value-table tr";

const STYLED_ELEMENT_SELECTOR: &str = r#"[style*="background-image"]"#;
const STYLE_URL_PATTERN: &str = r#"url\(\s*["']?(.*?)["']?\s*\)"#;

/// Returns true when the content marker is present
pub fn has_marker(html: &str) -> bool {
    let Ok(selector) = Selector::parse(MARKER_SELECTOR) else {
        return false;
    };
    let document = Html::parse_document(html);
    let found = document.select(&selector).next().is_some();
    found
}

/// Builds a record from every two-cell row on the page
///
/// The primary layout is tried first; the fallback layout is only used when
/// the primary one yields no rows. A page without rows produces a record that
/// holds only the identifier. Rows keyed like the identifier or image path
/// fields are skipped so the page cannot overwrite them.
///
/// # Example
///
/// ```
/// use roster_harvest::harvester::extract_record;
/// use roster_harvest::Identifier;
///
/// let html = r#"<table class="key-value-table"><tr><td>Name</td><td>Dara</td></tr></table>"#;
/// let record = extract_record(html, &Identifier::new("22", "01", "01", 1));
/// assert_eq!(record.get("Name"), Some("Dara"));
/// ```
pub fn extract_record(html: &str, identifier: &Identifier) -> Record {
    let document = Html::parse_document(html);
    let mut record = Record::new(identifier);

    let mut rows = select_rows(&document, PRIMARY_ROW_SELECTOR);
    if rows.is_empty() {
        rows = select_rows(&document, SECONDARY_ROW_SELECTOR);
    }

    let Ok(cell_selector) = Selector::parse("td") else {
        return record;
    };

    for row in rows {
        let cells: Vec<ElementRef> = row.select(&cell_selector).collect();
        if cells.len() != 2 {
            continue;
        }

        let key = cell_text(&cells[0]);
        if key == IDENTIFIER_FIELD || key == IMAGE_PATH_FIELD {
            tracing::debug!("Skipping reserved field '{}' for {}", key, identifier);
            continue;
        }

        let value = cell_text(&cells[1]);
        record.insert(key, value);
    }

    record
}

fn select_rows<'a>(document: &'a Html, selector: &str) -> Vec<ElementRef<'a>> {
    let Ok(selector) = Selector::parse(selector) else {
        return Vec::new();
    };
    let rows = document.select(&selector).collect();
    rows
}

fn cell_text(cell: &ElementRef) -> String {
    cell.text().collect::<String>().trim().to_string()
}

/// Finds the raw profile image reference, exactly as written in the style
pub fn find_asset_reference(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(STYLED_ELEMENT_SELECTOR).ok()?;
    let pattern = Regex::new(STYLE_URL_PATTERN).ok()?;

    let reference = document
        .select(&selector)
        .filter_map(|element| element.value().attr("style"))
        .filter(|style| style.contains("background-image"))
        .find_map(|style| {
            pattern
                .captures(style)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().trim().to_string())
                .filter(|url| !url.is_empty())
        });
    reference
}

/// Finds the profile image URL, resolved against the page URL
///
/// # Example
///
/// ```
/// use roster_harvest::harvester::find_asset_url;
/// use url::Url;
///
/// let html = r#"<div style="background-image: url('/img/x.jpg')"></div>"#;
/// let base = Url::parse("https://h/qr?student_id=220101001").unwrap();
/// assert_eq!(find_asset_url(html, &base).unwrap().as_str(), "https://h/img/x.jpg");
/// ```
pub fn find_asset_url(html: &str, page_url: &Url) -> Option<Url> {
    let reference = find_asset_reference(html)?;
    match page_url.join(&reference) {
        Ok(url) => Some(url),
        Err(e) => {
            tracing::debug!("Unresolvable image reference '{}': {}", reference, e);
            None
        }
    }
}
