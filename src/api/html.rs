//! Icon discovery in a site's landing page.

use scraper::{Html, Selector};
use url::Url;

/// `rel` values that point at a usable icon, most preferred first.
pub const ICON_RELS: &[&str] = &["icon", "shortcut icon", "apple-touch-icon"];

/// Every icon `href` in the page, ordered by [`ICON_RELS`] priority and then
/// by position in the document.
pub fn find_icon_hrefs(html: &str) -> Vec<String> {
    let Ok(selector) = Selector::parse("link[rel][href]") else {
        return Vec::new();
    };
    let document = Html::parse_document(html);

    let links: Vec<(&str, &str)> = document
        .select(&selector)
        .filter_map(|el| {
            let value = el.value();
            Some((value.attr("rel")?.trim(), value.attr("href")?.trim()))
        })
        .filter(|(_, href)| !href.is_empty())
        .collect();

    ICON_RELS
        .iter()
        .flat_map(|wanted| {
            links
                .iter()
                .filter(move |(rel, _)| rel.eq_ignore_ascii_case(wanted))
                .map(|(_, href)| href.to_string())
        })
        .collect()
}

/// Resolve an icon `href` found on `page`.
///
/// Protocol-relative refs get `https:`, root-relative refs hang off the page
/// origin, and bare relative refs are taken from the site root. `data:` refs
/// are not fetchable and yield `None`.
pub fn resolve_icon_href(page: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    let lower = href.to_ascii_lowercase();

    if lower.starts_with("data:") {
        return None;
    }
    if href.starts_with("//") {
        return Some(format!("https:{href}"));
    }
    if lower.starts_with("http://") || lower.starts_with("https://") {
        return Some(href.to_string());
    }

    let origin = page.origin();
    if !origin.is_tuple() {
        return None;
    }
    let origin = origin.ascii_serialization();
    if href.starts_with('/') {
        Some(format!("{origin}{href}"))
    } else {
        Some(format!("{origin}/{href}"))
    }
}
