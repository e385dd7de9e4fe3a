use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use colored::Colorize;

use crate::acquire::{extract_domain, IconAcquirer};
use crate::api::{Fetch, HttpClient};
use crate::candidates::{collect_candidates, Candidate};
use crate::catalog::Catalog;
use crate::cli::Cli;
use crate::config::{Settings, AUTO_FETCH_KEY};
use crate::icon;

#[derive(Debug, Clone, PartialEq)]
pub struct FailedSite {
    pub title: String,
    pub url: String,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct FetchReport {
    /// Number of links that needed a logo.
    pub total: usize,
    /// `(title, saved file name)` for every logo written.
    pub saved: Vec<(String, String)>,
    pub failed: Vec<FailedSite>,
    pub catalog_written: bool,
    pub write_error: Option<String>,
}

/// What one `fetch` invocation ended up doing.
#[derive(Debug)]
pub enum FetchOutcome {
    /// `autoFetchLogos` is off and `--force` was not given.
    Disabled,
    /// `--dry-run`: the sites that would have been fetched.
    DryRun(Vec<Candidate>),
    Fetched(FetchReport),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FetchOptions {
    pub force: bool,
    pub dry_run: bool,
}

pub async fn run(cli: &Cli, force: bool, dry_run: bool, timeout: u64) -> Result<()> {
    let settings = Settings::load_or_default(&cli.config_path());
    let catalog_path = cli.catalog_path();
    let logos_dir = cli.logos_dir();

    let acquirer = IconAcquirer::new(HttpClient::new(Duration::from_secs(timeout))?);
    let options = FetchOptions { force, dry_run };
    let outcome = execute(&acquirer, settings, options, &catalog_path, &logos_dir);

    match outcome.await? {
        FetchOutcome::Disabled => {
            println!(
                "{} {} is false, logo fetching is disabled.",
                "ℹ".blue(),
                AUTO_FETCH_KEY
            );
            println!(
                "  Set {} = true in {} or pass --force to run anyway.",
                AUTO_FETCH_KEY,
                cli.config_path().display()
            );
        }
        FetchOutcome::DryRun(candidates) => {
            print_candidates(&candidates);
            println!("\n{} Dry run, nothing fetched.", "ℹ".blue());
        }
        FetchOutcome::Fetched(report) => print_report(&report, &catalog_path, &logos_dir),
    }
    Ok(())
}

/// Apply the `autoFetchLogos` switch and the command flags, then either list
/// or fetch the missing logos. A dry run makes no requests and writes nothing.
pub async fn execute<F: Fetch>(
    acquirer: &IconAcquirer<F>,
    settings: Settings,
    options: FetchOptions,
    catalog_path: &Path,
    logos_dir: &Path,
) -> Result<FetchOutcome> {
    if !settings.auto_fetch_logos && !options.force {
        return Ok(FetchOutcome::Disabled);
    }

    if options.dry_run {
        let catalog = Catalog::load(catalog_path)?;
        let candidates = collect_candidates(&catalog, logos_dir);
        return Ok(FetchOutcome::DryRun(candidates));
    }

    let report = fetch_missing(acquirer, catalog_path, logos_dir).await?;
    Ok(FetchOutcome::Fetched(report))
}

/// Fetch a logo for every link that lacks one, then rewrite the catalog once
/// if anything was saved. Only a catalog that cannot be loaded is an error;
/// per-site failures end up in the report.
pub async fn fetch_missing<F: Fetch>(
    acquirer: &IconAcquirer<F>,
    catalog_path: &Path,
    logos_dir: &Path,
) -> Result<FetchReport> {
    let mut catalog = Catalog::load(catalog_path)?;
    let candidates = collect_candidates(&catalog, logos_dir);

    let mut report = FetchReport {
        total: candidates.len(),
        ..Default::default()
    };

    if candidates.is_empty() {
        println!("{} Every site already has a logo.", "✓".green());
        return Ok(report);
    }

    println!("Found {} sites without a logo:\n", candidates.len());

    for candidate in &candidates {
        let domain = extract_domain(&candidate.url);
        println!(
            "  {} Fetching {} ({})...",
            "↓".cyan(),
            candidate.title,
            domain
        );

        let saved = match acquirer.acquire(&candidate.url).await {
            Ok(bytes) => save_and_record(&mut catalog, candidate, &bytes, &domain, logos_dir),
            Err(e) => Err(e.into()),
        };

        match saved {
            Ok(file_name) => {
                println!("    {} Saved {}", "✓".green(), file_name);
                report.saved.push((candidate.title.clone(), file_name));
            }
            Err(e) => {
                println!("    {} {:#}", "✗".red(), e);
                report.failed.push(FailedSite {
                    title: candidate.title.clone(),
                    url: candidate.url.clone(),
                    reason: format!("{e:#}"),
                });
            }
        }
    }

    if !report.saved.is_empty() {
        match catalog.save(catalog_path) {
            Ok(()) => {
                println!("\n{} Updated {}", "✓".green(), catalog_path.display());
                report.catalog_written = true;
            }
            Err(e) => report.write_error = Some(format!("{e:#}")),
        }
    }

    Ok(report)
}

fn save_and_record(
    catalog: &mut Catalog,
    candidate: &Candidate,
    bytes: &[u8],
    domain: &str,
    logos_dir: &Path,
) -> Result<String> {
    let file_name = icon::save_logo(bytes, &candidate.title, domain, logos_dir)?;
    catalog.set_logo(candidate.id, &file_name)?;
    Ok(file_name)
}

fn print_candidates(candidates: &[Candidate]) {
    if candidates.is_empty() {
        println!("{} Every site already has a logo.", "✓".green());
        return;
    }
    println!("{} sites without a logo:\n", candidates.len());
    for candidate in candidates {
        println!(
            "  {} {} ({})",
            "·".dimmed(),
            candidate.title,
            extract_domain(&candidate.url)
        );
    }
}

pub fn print_report(report: &FetchReport, catalog_path: &Path, logos_dir: &Path) {
    if report.total == 0 {
        return;
    }

    println!();
    println!("Done: {}/{}", report.saved.len(), report.total);

    if let Some(error) = &report.write_error {
        println!(
            "{} Could not update {}: {}",
            "✗".red(),
            catalog_path.display(),
            error
        );
        println!("  Saved logo files were kept in {}", logos_dir.display());
    }

    if report.failed.is_empty() {
        return;
    }

    println!(
        "\n{} {} sites need a logo added by hand:",
        "!".yellow(),
        report.failed.len()
    );
    for site in &report.failed {
        println!("  - {}: {}", site.title, site.url);
    }
    println!("\nPut the logo files in {}", logos_dir.display());
    println!(
        "then set the logo field of each entry in {}",
        catalog_path.display()
    );
}
