mod cmd;
mod config;
mod context;
mod domain;
mod error;
mod infra;
mod services;
mod telemetry;
#[cfg(test)]
mod test_support;
mod workflow;

use std::sync::Arc;

use clap::{Args, Parser, Subcommand};

use crate::cmd::config::{self as config_cmd, ConfigArgs};
use crate::cmd::rewrite::RewriteArgs;
use crate::cmd::{browse, rewrite, session};
use crate::config::AppConfig;
use crate::context::AppContext;
use crate::error::AppResult;
use crate::infra::http::HttpBackend;

#[derive(Parser)]
#[command(
    name = "reword",
    author,
    version,
    about = "Review and apply AI rewrites of issue-tracker tickets"
)]
struct Cli {
    /// Base URL of the rewrite backend.
    #[arg(long, global = true)]
    api_url: Option<String>,
    /// Log requests and state changes to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the projects the backend can see.
    Projects,
    /// List the tickets of a project.
    Tickets(ProjectArgs),
    /// Rewrite tickets and optionally push the result back.
    Rewrite(RewriteArgs),
    /// Open an interactive workspace.
    Session(SessionArgs),
    /// Manage CLI configuration.
    Config(ConfigArgs),
}

#[derive(Args)]
struct ProjectArgs {
    /// Project key; falls back to the configured default project.
    project: Option<String>,
}

#[derive(Args)]
struct SessionArgs {
    /// Project to open on start; falls back to the configured default project.
    #[arg(short, long)]
    project: Option<String>,
}

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> AppResult<()> {
    let cli = Cli::parse();
    telemetry::init_tracing(cli.verbose);

    match cli.command {
        Commands::Config(args) => config_cmd::run(args.command),
        Commands::Projects => browse::run_projects(&build_context(cli.api_url)?).await,
        Commands::Tickets(args) => {
            browse::run_tickets(&build_context(cli.api_url)?, args.project).await
        }
        Commands::Rewrite(args) => rewrite::run(&build_context(cli.api_url)?, args).await,
        Commands::Session(args) => {
            session::run(&build_context(cli.api_url)?, args.project).await
        }
    }
}

fn build_context(api_url: Option<String>) -> AppResult<AppContext> {
    let config = AppConfig::load(api_url)?;
    tracing::debug!(api_url = %config.api_url, "using rewrite backend");
    let backend = Arc::new(HttpBackend::new(&config.api_url, config.request_timeout)?);
    Ok(AppContext::new(config, backend))
}
