//! Icon acquisition: an ordered list of sources, first success wins.

use std::fmt;
use std::future::Future;

use tracing::debug;
use url::Url;

use crate::api::html::{find_icon_hrefs, resolve_icon_href};
use crate::api::Fetch;
use crate::error::{AcquireError, AcquireResult};

/// Favicon lookup services, most reliable first. `{domain}` is replaced
/// with the bare host of the site.
pub const LOOKUP_SERVICES: &[&str] = &[
    "https://www.google.com/s2/favicons?domain={domain}&sz=128",
    "https://favicon.io/api/get?url={domain}",
    "https://{domain}/favicon.ico",
];

/// Some sites only serve their real page to browsers.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Strategy {
    /// GET a lookup-service URL built from the domain.
    LookupService(String),
    /// Read the site's landing page and follow its `<link rel="icon">`.
    PageIcon,
    /// GET `/favicon.ico` at the site root.
    DefaultPath,
}

impl Strategy {
    pub fn default_order() -> Vec<Strategy> {
        LOOKUP_SERVICES
            .iter()
            .map(|template| Strategy::LookupService(template.to_string()))
            .chain([Strategy::PageIcon, Strategy::DefaultPath])
            .collect()
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::LookupService(template) => write!(f, "lookup {}", template),
            Strategy::PageIcon => write!(f, "page icon"),
            Strategy::DefaultPath => write!(f, "/favicon.ico"),
        }
    }
}

/// Run `attempt` over `items` in order and return the first success.
/// Failures are logged and never stop the remaining attempts.
pub async fn first_success<'a, S, T, F, Fut>(items: &'a [S], mut attempt: F) -> AcquireResult<T>
where
    S: fmt::Display,
    F: FnMut(&'a S) -> Fut,
    Fut: Future<Output = AcquireResult<T>>,
{
    for item in items {
        match attempt(item).await {
            Ok(value) => {
                debug!(source = %item, "icon source succeeded");
                return Ok(value);
            }
            Err(e) => debug!(source = %item, error = %e, "icon source failed"),
        }
    }
    Err(AcquireError::Exhausted)
}

pub struct IconAcquirer<F> {
    fetcher: F,
    strategies: Vec<Strategy>,
}

impl<F: Fetch> IconAcquirer<F> {
    pub fn new(fetcher: F) -> Self {
        Self::with_strategies(fetcher, Strategy::default_order())
    }

    pub fn with_strategies(fetcher: F, strategies: Vec<Strategy>) -> Self {
        Self {
            fetcher,
            strategies,
        }
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Raw bytes of a valid image for the site at `url`.
    pub async fn acquire(&self, url: &str) -> AcquireResult<Vec<u8>> {
        let domain = extract_domain(url);
        let attempts = first_success(&self.strategies, |s| self.attempt(s, url, &domain));
        attempts.await
    }

    async fn attempt(
        &self,
        strategy: &Strategy,
        url: &str,
        domain: &str,
    ) -> AcquireResult<Vec<u8>> {
        match strategy {
            Strategy::LookupService(template) => {
                let service_url = template.replace("{domain}", domain);
                self.fetcher.get_image(&service_url, None).await
            }
            Strategy::PageIcon => self.page_icon(url).await,
            Strategy::DefaultPath => {
                let page = site_url(url)?;
                let favicon = page
                    .join("/favicon.ico")
                    .map_err(|e| AcquireError::invalid_url(url, e))?;
                self.fetcher.get_image(favicon.as_str(), None).await
            }
        }
    }

    async fn page_icon(&self, url: &str) -> AcquireResult<Vec<u8>> {
        let page = site_url(url)?;
        let response = self
            .fetcher
            .get(page.as_str(), Some(BROWSER_USER_AGENT))
            .await?;
        if !response.is_success() {
            return Err(AcquireError::Status(response.status));
        }

        let html = String::from_utf8_lossy(&response.body);
        let icon_urls: Vec<String> = find_icon_hrefs(&html)
            .iter()
            .filter_map(|href| resolve_icon_href(&page, href))
            .collect();

        let mut last_error = AcquireError::NoIconLink;
        for icon_url in &icon_urls {
            match self.fetcher.get_image(icon_url, None).await {
                Ok(bytes) => return Ok(bytes),
                Err(e) => {
                    debug!(url = %icon_url, error = %e, "page icon rejected");
                    last_error = e;
                }
            }
        }
        Err(last_error)
    }
}

/// Bare host of a catalog URL: scheme, path, query and port are dropped.
/// Never fails; a malformed URL gives back whatever is left.
pub fn extract_domain(url: &str) -> String {
    let rest = strip_scheme(url.trim());
    let host = rest.split(['/', '?', '#']).next().unwrap_or_default();
    host.split(':').next().unwrap_or_default().to_string()
}

/// The URL of the site's landing page, `https://` assumed when no scheme is given.
pub fn site_url(url: &str) -> AcquireResult<Url> {
    let trimmed = url.trim();
    let full = if strip_scheme(trimmed).len() == trimmed.len() {
        format!("https://{trimmed}")
    } else {
        trimmed.to_string()
    };

    let parsed = Url::parse(&full).map_err(|e| AcquireError::invalid_url(url, e))?;
    if parsed.host_str().is_none() {
        return Err(AcquireError::invalid_url(url, "no host"));
    }
    Ok(parsed)
}

fn strip_scheme(url: &str) -> &str {
    for scheme in ["https://", "http://"] {
        let matches = url
            .get(..scheme.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme));
        if matches {
            return &url[scheme.len()..];
        }
    }
    url
}
