use anyhow::Result;
use colored::Colorize;

use crate::candidates::{collect_candidates, is_placeholder, Candidate};
use crate::catalog::Catalog;
use crate::cli::Cli;
use crate::config::{Settings, AUTO_FETCH_KEY};

pub fn run(cli: &Cli) -> Result<()> {
    let settings = Settings::load_or_default(&cli.config_path());
    if settings.auto_fetch_logos {
        println!("{} {} is enabled", "✓".green(), AUTO_FETCH_KEY);
    } else {
        println!("{} {} is disabled", "!".yellow(), AUTO_FETCH_KEY);
    }

    let catalog_path = cli.catalog_path();
    let catalog = Catalog::load(&catalog_path)?;
    let link_count = catalog.links().count();
    println!(
        "{} Catalog is valid ({}): {} categories, {} links",
        "✓".green(),
        catalog_path.display(),
        catalog.categories().len(),
        link_count
    );

    let logos_dir = cli.logos_dir();
    if !logos_dir.is_dir() {
        println!(
            "{} Logo directory {} does not exist yet",
            "!".yellow(),
            logos_dir.display()
        );
    }

    let candidates = collect_candidates(&catalog, &logos_dir);
    if candidates.is_empty() {
        println!("{} Every site has a logo.", "✓".green());
        return Ok(());
    }

    for candidate in &candidates {
        let reason = missing_reason(candidate);
        println!(
            "  {} {} ({})",
            "·".dimmed(),
            candidate.title,
            reason.dimmed()
        );
    }
    println!(
        "{} {} of {} links need a logo. Run `webstack-logos fetch` to fetch them.",
        "!".yellow(),
        candidates.len(),
        link_count
    );

    Ok(())
}

/// Why a candidate is listed: no usable value, or a file that isn't there.
pub fn missing_reason(candidate: &Candidate) -> String {
    match candidate.previous_logo.as_deref().map(str::trim) {
        Some(logo) if !is_placeholder(logo) => format!("{} not found", logo),
        _ => "no logo".to_string(),
    }
}
