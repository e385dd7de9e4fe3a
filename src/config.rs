use std::path::Path;

use anyhow::{bail, Context, Result};
use colored::Colorize;
use toml::{Table, Value};
use tracing::warn;

pub const AUTO_FETCH_KEY: &str = "autoFetchLogos";

/// Site-level switches read from the Hugo `config.toml`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    pub auto_fetch_logos: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            auto_fetch_logos: true,
        }
    }
}

impl Settings {
    /// Strict load: a missing file, bad TOML, or a non-boolean
    /// `autoFetchLogos` is an error. An absent key is the default, with a warning.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let table: Table = toml::from_str(content)?;

        match find_key(&table, AUTO_FETCH_KEY) {
            None => {
                warn!("{} is not set, logo fetching stays enabled", AUTO_FETCH_KEY);
                Ok(Self::default())
            }
            Some(Value::Boolean(enabled)) => Ok(Self {
                auto_fetch_logos: *enabled,
            }),
            Some(other) => bail!(
                "{} must be true or false, found {}",
                AUTO_FETCH_KEY,
                other.type_str()
            ),
        }
    }

    /// Never fails: anything wrong with the file leaves fetching enabled.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            println!(
                "{} Config file {} not found, using defaults",
                "!".yellow(),
                path.display()
            );
            return Self::default();
        }

        match Self::load(path) {
            Ok(settings) => settings,
            Err(e) => {
                println!("{} {:#}, using defaults", "!".yellow(), e);
                Self::default()
            }
        }
    }
}

/// Top-level key first, then nested tables (Hugo keeps site params under `[params]`).
fn find_key<'a>(table: &'a Table, key: &str) -> Option<&'a Value> {
    if let Some(value) = table.get(key) {
        return Some(value);
    }
    table.values().find_map(|value| match value {
        Value::Table(inner) => find_key(inner, key),
        _ => None,
    })
}
