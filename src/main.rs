use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use webstack_logos::cli::{Cli, Commands};
use webstack_logos::{commands, logging};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let default_command = Commands::default();
    let command = cli.command.as_ref().unwrap_or(&default_command);

    let work = async {
        match command {
            Commands::Fetch {
                force,
                dry_run,
                timeout,
            } => commands::fetch::run(&cli, *force, *dry_run, *timeout).await,
            Commands::Check => commands::check::run(&cli),
        }
    };

    // The catalog is only written at the very end, so stopping early leaves it as it was.
    tokio::select! {
        result = work => result,
        _ = tokio::signal::ctrl_c() => {
            eprintln!("\n{} Interrupted", "✗".red());
            std::process::exit(130);
        }
    }
}
