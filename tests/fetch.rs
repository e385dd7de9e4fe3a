mod common;

use std::path::{Path, PathBuf};

use common::{direct, google_lookup, grouped, png_bytes, FakeFetcher};
use webstack_logos::acquire::IconAcquirer;
use webstack_logos::api::{Fetch, FetchResponse};
use webstack_logos::catalog::{Catalog, LinkId};
use webstack_logos::commands::fetch::{execute, fetch_missing, FetchOptions, FetchOutcome};
use webstack_logos::config::Settings;
use webstack_logos::error::AcquireResult;

const EXAMPLE_SITE: &str = r#"---

- taxonomy: Tools
  links:
    - title: Example
      url: https://example.com
      description: An example site
"#;

struct Site {
    _dir: tempfile::TempDir,
    catalog: PathBuf,
    logos: PathBuf,
}

fn site(catalog: &str) -> Site {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("data");
    std::fs::create_dir_all(&data).unwrap();
    let catalog_path = data.join("webstack.yml");
    std::fs::write(&catalog_path, catalog).unwrap();
    let logos = dir.path().join("static/assets/images/logos");
    Site {
        catalog: catalog_path,
        logos,
        _dir: dir,
    }
}

fn logo_of(catalog_path: &Path, id: LinkId) -> Option<String> {
    Catalog::load(catalog_path)
        .unwrap()
        .link(id)
        .unwrap()
        .logo
        .clone()
}

fn example_fetcher() -> FakeFetcher {
    let icon = png_bytes(256, 256);
    FakeFetcher::new().serve(&google_lookup("example.com"), 200, icon)
}

async fn outcome_of<F: Fetch>(
    acquirer: &IconAcquirer<F>,
    site: &Site,
    settings: Settings,
    options: FetchOptions,
) -> FetchOutcome {
    execute(acquirer, settings, options, &site.catalog, &site.logos)
        .await
        .unwrap()
}

/// Deletes the catalog's directory on every request, so the final catalog
/// write has nowhere to go.
struct CatalogDirVanishes {
    inner: FakeFetcher,
    dir: PathBuf,
}

impl Fetch for CatalogDirVanishes {
    async fn get(&self, url: &str, user_agent: Option<&str>) -> AcquireResult<FetchResponse> {
        let _ = std::fs::remove_dir_all(&self.dir);
        self.inner.get(url, user_agent).await
    }
}

#[tokio::test]
async fn fetched_logo_is_saved_and_recorded() {
    let site = site(EXAMPLE_SITE);
    let acquirer = IconAcquirer::new(example_fetcher());

    let report = fetch_missing(&acquirer, &site.catalog, &site.logos)
        .await
        .unwrap();

    assert_eq!(report.total, 1);
    assert_eq!(report.saved.len(), 1);
    assert!(report.failed.is_empty());
    assert!(report.catalog_written);
    assert!(report.write_error.is_none());

    let logo = logo_of(&site.catalog, direct(0, 0)).unwrap();
    assert_eq!(logo, "Example.webp");
    assert!(site.logos.join(&logo).is_file());

    let text = std::fs::read_to_string(&site.catalog).unwrap();
    assert!(text.starts_with("---\n\n"));
    assert!(text.contains("description: An example site"));
}

#[tokio::test]
async fn failed_fetch_leaves_catalog_untouched() {
    let original = r#"---

- taxonomy: Tools
  links:
    - title: Gone
      url: https://gone.example
      logo: gone.png
"#;
    let site = site(original);
    let acquirer = IconAcquirer::new(FakeFetcher::new());

    let report = fetch_missing(&acquirer, &site.catalog, &site.logos)
        .await
        .unwrap();

    assert_eq!(report.total, 1);
    assert!(report.saved.is_empty());
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].title, "Gone");
    assert_eq!(report.failed[0].url, "https://gone.example");
    assert!(!report.catalog_written);

    assert_eq!(std::fs::read_to_string(&site.catalog).unwrap(), original);
}

#[tokio::test]
async fn one_failure_does_not_stop_the_rest() {
    let site = site(
        r#"- taxonomy: Mixed
  links:
    - title: Broken
      url: not a url
      logo: "''"
  list:
    - term: Dev
      links:
        - title: Rust
          url: https://www.rust-lang.org
"#,
    );
    let icon = png_bytes(32, 32);
    let fetcher = FakeFetcher::new().serve(&google_lookup("www.rust-lang.org"), 200, icon);
    let acquirer = IconAcquirer::new(fetcher);

    let report = fetch_missing(&acquirer, &site.catalog, &site.logos)
        .await
        .unwrap();

    assert_eq!(report.total, 2);
    assert_eq!(report.saved.len(), 1);
    assert_eq!(report.saved[0].1, "Rust.webp");
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].title, "Broken");
    assert!(report.catalog_written);

    let broken = logo_of(&site.catalog, direct(0, 0));
    let rust = logo_of(&site.catalog, grouped(0, 0, 0));
    assert_eq!(broken.as_deref(), Some("''"));
    assert_eq!(rust.as_deref(), Some("Rust.webp"));
}

#[tokio::test]
async fn nothing_to_do_makes_no_requests() {
    let site = site(
        r#"- taxonomy: Done
  links:
    - title: Has logo
      url: https://has.example
      logo: has.png
"#,
    );
    std::fs::create_dir_all(&site.logos).unwrap();
    std::fs::write(site.logos.join("has.png"), png_bytes(8, 8)).unwrap();
    let acquirer = IconAcquirer::new(FakeFetcher::new());

    let report = fetch_missing(&acquirer, &site.catalog, &site.logos)
        .await
        .unwrap();

    assert_eq!(report.total, 0);
    assert!(!report.catalog_written);
    assert!(acquirer.fetcher().requested_urls().is_empty());
}

#[tokio::test]
async fn unreadable_catalog_aborts_before_any_request() {
    let site = site("- taxonomy: [broken\n");
    let acquirer = IconAcquirer::new(FakeFetcher::new());

    let broken = fetch_missing(&acquirer, &site.catalog, &site.logos).await;
    assert!(broken.is_err());
    assert!(acquirer.fetcher().requested_urls().is_empty());

    let missing = site.catalog.with_file_name("missing.yml");
    let absent = fetch_missing(&acquirer, &missing, &site.logos).await;
    assert!(absent.is_err());
    assert!(acquirer.fetcher().requested_urls().is_empty());
}

#[tokio::test]
async fn failed_catalog_write_keeps_saved_logos() {
    let site = site(EXAMPLE_SITE);
    let fetcher = CatalogDirVanishes {
        inner: example_fetcher(),
        dir: site.catalog.parent().unwrap().to_path_buf(),
    };
    let acquirer = IconAcquirer::new(fetcher);

    let report = fetch_missing(&acquirer, &site.catalog, &site.logos)
        .await
        .unwrap();

    assert_eq!(report.total, 1);
    assert_eq!(report.saved.len(), 1);
    assert!(!report.catalog_written);
    assert!(report.write_error.is_some());
    assert!(site.logos.join(&report.saved[0].1).is_file());
}

#[tokio::test]
async fn disabled_setting_skips_everything() {
    let site = site(EXAMPLE_SITE);
    let acquirer = IconAcquirer::new(example_fetcher());
    let disabled = Settings::parse("autoFetchLogos = false").unwrap();

    let outcome = outcome_of(&acquirer, &site, disabled, FetchOptions::default()).await;

    assert!(matches!(outcome, FetchOutcome::Disabled));
    assert!(acquirer.fetcher().requested_urls().is_empty());
    assert!(!site.logos.exists());
    let text = std::fs::read_to_string(&site.catalog).unwrap();
    assert_eq!(text, EXAMPLE_SITE);
}

#[tokio::test]
async fn force_overrides_disabled_setting() {
    let site = site(EXAMPLE_SITE);
    let acquirer = IconAcquirer::new(example_fetcher());
    let disabled = Settings::parse("[params]\nautoFetchLogos = false\n").unwrap();
    let options = FetchOptions {
        force: true,
        ..Default::default()
    };

    let report = match outcome_of(&acquirer, &site, disabled, options).await {
        FetchOutcome::Fetched(report) => report,
        other => panic!("expected a fetch, got {other:?}"),
    };

    assert_eq!(report.saved.len(), 1);
    assert!(report.catalog_written);
    let logo = logo_of(&site.catalog, direct(0, 0));
    assert_eq!(logo.as_deref(), Some("Example.webp"));
}

#[tokio::test]
async fn dry_run_lists_without_fetching_or_writing() {
    let site = site(EXAMPLE_SITE);
    let acquirer = IconAcquirer::new(example_fetcher());
    let options = FetchOptions {
        dry_run: true,
        ..Default::default()
    };

    let candidates = match outcome_of(&acquirer, &site, Settings::default(), options).await {
        FetchOutcome::DryRun(candidates) => candidates,
        other => panic!("expected a dry run, got {other:?}"),
    };

    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].title, "Example");
    assert!(acquirer.fetcher().requested_urls().is_empty());
    assert!(!site.logos.exists());
    let text = std::fs::read_to_string(&site.catalog).unwrap();
    assert_eq!(text, EXAMPLE_SITE);
}
