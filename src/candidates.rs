use std::path::Path;

use crate::catalog::{Catalog, Link, LinkId};

/// Values hand-edited catalogs leave behind when a logo was never filled in.
const PLACEHOLDER_LOGOS: &[&str] = &["''", "\"\""];

/// A link that needs a logo, captured for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub id: LinkId,
    pub url: String,
    pub title: String,
    pub previous_logo: Option<String>,
}

/// Links whose logo is missing, in document order.
pub fn collect_candidates(catalog: &Catalog, logos_dir: &Path) -> Vec<Candidate> {
    catalog
        .links()
        .filter(|link| needs_logo(link, logos_dir))
        .map(|link| Candidate {
            id: link.id,
            url: link.url.clone(),
            title: link.title.clone(),
            previous_logo: link.logo.clone(),
        })
        .collect()
}

/// The URL is never looked at here: a bad URL still gets a fetch attempt.
pub fn needs_logo(link: &Link, logos_dir: &Path) -> bool {
    match link.logo.as_deref().map(str::trim) {
        None => true,
        Some(logo) if is_placeholder(logo) => true,
        Some(logo) => !logos_dir.join(logo).is_file(),
    }
}

pub(crate) fn is_placeholder(logo: &str) -> bool {
    logo.is_empty() || PLACEHOLDER_LOGOS.contains(&logo)
}
