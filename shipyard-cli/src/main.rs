//! shipyard: GitHub issue management and PyPI release automation

mod commands;
mod output;

use clap::{Parser, Subcommand};
use shipyard_core::Secrets;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use commands::{IssueKind, ReleaseArgs};
use output::Output;

#[derive(Parser)]
#[command(
    name = "shipyard",
    about = "GitHub issue management and PyPI release automation",
    version
)]
struct Cli {
    /// Enable verbose output
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List open issues for the current repository
    List,

    /// File a bug report
    Bug,

    /// File a task
    Task,

    /// File an idea
    Idea,

    /// Close one or more issues
    Resolve {
        /// Issue numbers to close
        #[arg(required = true)]
        numbers: Vec<u64>,
    },

    /// Permanently delete one or more issues
    Delete {
        /// Issue numbers to delete
        #[arg(required = true)]
        numbers: Vec<u64>,
    },

    /// Publish a new release to PyPI
    Release(ReleaseArgs),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let out = Output::new(cli.verbose);

    if let Err(e) = run(cli, &out).await {
        out.error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

async fn run(cli: Cli, out: &Output) -> anyhow::Result<()> {
    let secrets = Secrets::load(std::env::current_dir()?)?;

    match cli.command {
        Commands::List => commands::issue::list(&secrets, out).await,
        Commands::Bug => commands::issue::create(IssueKind::Bug, &secrets, out).await,
        Commands::Task => commands::issue::create(IssueKind::Task, &secrets, out).await,
        Commands::Idea => commands::issue::create(IssueKind::Idea, &secrets, out).await,
        Commands::Resolve { numbers } => commands::issue::resolve(&numbers, &secrets, out).await,
        Commands::Delete { numbers } => commands::issue::delete(&numbers, &secrets, out).await,
        Commands::Release(args) => args.execute(&secrets, out).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parses() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_resolve_requires_numbers() {
        let result = Cli::try_parse_from(["shipyard", "resolve"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_release_accepts_bump_and_flags() {
        let cli = Cli::try_parse_from(["shipyard", "release", "patch", "--dry-run"]).unwrap();
        assert!(matches!(cli.command, Commands::Release(_)));
    }

    #[test]
    fn test_verbose_is_global() {
        let cli = Cli::try_parse_from(["shipyard", "list", "--verbose"]).unwrap();
        assert!(cli.verbose);
    }
}
