use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "webstack-logos",
    about = "Fetch missing site logos for a WebStack link directory"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Site root that relative paths are resolved against
    #[arg(long, global = true, default_value = ".")]
    pub root: PathBuf,

    /// Path to the site config file
    #[arg(long, global = true, default_value = "config.toml")]
    pub config: PathBuf,

    /// Path to the link catalog
    #[arg(long, global = true, default_value = "data/webstack.yml")]
    pub catalog: PathBuf,

    /// Directory that holds logo images
    #[arg(long, global = true, default_value = "static/assets/images/logos")]
    pub logos_dir: PathBuf,

    /// Print per-source diagnostics while fetching
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch missing logos and update the catalog (default)
    Fetch {
        /// Run even when autoFetchLogos = false
        #[arg(long)]
        force: bool,

        /// List the sites that need a logo without fetching anything
        #[arg(long)]
        dry_run: bool,

        /// Per-request timeout in seconds
        #[arg(long, default_value_t = 10)]
        timeout: u64,
    },

    /// Check the catalog and count links with missing logos
    Check,
}

impl Default for Commands {
    fn default() -> Self {
        Commands::Fetch {
            force: false,
            dry_run: false,
            timeout: 10,
        }
    }
}

impl Cli {
    pub fn config_path(&self) -> PathBuf {
        self.resolve(&self.config)
    }

    pub fn catalog_path(&self) -> PathBuf {
        self.resolve(&self.catalog)
    }

    pub fn logos_dir(&self) -> PathBuf {
        self.resolve(&self.logos_dir)
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}
