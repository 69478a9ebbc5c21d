//! Utility functions and helpers.

pub mod http;

use scraper::Html;
use unicode_segmentation::UnicodeSegmentation;
use url::Url;

/// Last path segment of a URL, or an empty string when there is none.
///
/// Query and fragment are ignored. A trailing slash yields an empty segment.
pub fn last_path_segment(link: &str) -> String {
    if let Ok(url) = Url::parse(link) {
        return url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .unwrap_or("")
            .to_string();
    }

    // Not an absolute URL: fall back to plain string splitting.
    let path = link.split(['?', '#']).next().unwrap_or("");
    path.rsplit('/').next().unwrap_or("").to_string()
}

/// Collapse runs of whitespace into single spaces.
pub fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Extract the text content of an HTML fragment.
pub fn strip_html(html: &str) -> String {
    if !html.contains('<') && !html.contains('&') {
        return html.trim().to_string();
    }
    let fragment = Html::parse_fragment(html);
    let text: String = fragment.root_element().text().collect();
    text.trim().to_string()
}

/// Cut `s` to at most `max` grapheme clusters, appending an ellipsis when cut.
pub fn truncate_graphemes(s: &str, max: usize) -> String {
    let mut graphemes = s.grapheme_indices(true);
    match graphemes.nth(max) {
        Some((idx, _)) if max > 0 => format!("{}…", s[..idx].trim_end()),
        Some(_) => String::new(),
        None => s.to_string(),
    }
}
