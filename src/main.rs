//! Binary entry point for tracecontext.
//!
//! This binary provides the CLI for the TraceContext orchestrator.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print_stderr in main binary for CLI output
#![allow(clippy::print_stderr)]
#![allow(clippy::print_stdout)]
// Allow multiple crate versions from transitive dependencies
#![allow(clippy::multiple_crate_versions)]

use anyhow::Context;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;
use std::process::ExitCode;
use tracecontext::TraceContextConfig;
use tracecontext::cli;
use tracecontext::client::OrchestratorClient;
use tracecontext::mcp::McpServer;
use tracecontext::observability;

/// TraceContext - persistent architectural context for AI coding assistants.
#[derive(Parser)]
#[command(name = "tracecontext")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file.
    #[arg(short, long, global = true, env = "TRACECONTEXT_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Run the orchestrator HTTP API.
    Serve {
        /// Address to bind.
        #[arg(long)]
        host: Option<String>,

        /// Port to bind.
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Install the git post-commit hook in a repository.
    Init {
        /// Repository path (default: current directory).
        #[arg(short, long)]
        repo: Option<PathBuf>,

        /// Replace an existing hook not written by TraceContext.
        #[arg(long)]
        force: bool,
    },

    /// Check whether the orchestrator is running.
    Status,

    /// Search the context store.
    Search {
        /// Keywords or a question.
        query: String,
    },

    /// Clear the context store.
    Reset,

    /// Run the MCP server on stdio.
    Mcp,

    /// Git hook entry points.
    Hook {
        /// Hook event.
        #[command(subcommand)]
        event: HookEvent,
    },

    /// Print the effective configuration.
    Config,

    /// Generate shell completions.
    Completions {
        /// Target shell.
        shell: Shell,
    },
}

/// Git hook events.
#[derive(Subcommand)]
enum HookEvent {
    /// Forward the new HEAD commit.
    PostCommit {
        /// Repository path (default: current directory).
        #[arg(short, long)]
        repo: Option<PathBuf>,
    },
}

/// Main entry point.
fn main() -> ExitCode {
    // A missing .env is not an error.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let is_hook = matches!(cli.command, Commands::Hook { .. });

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if is_hook => {
            // Never fail the commit.
            tracing::warn!(error = %format!("{e:#}"), "post-commit hook failed");
            ExitCode::SUCCESS
        },
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        },
    }
}

/// Runs the selected command.
fn run(cli: Cli) -> anyhow::Result<()> {
    if let Commands::Completions { shell } = cli.command {
        clap_complete::generate(
            shell,
            &mut Cli::command(),
            "tracecontext",
            &mut std::io::stdout(),
        );
        return Ok(());
    }

    let mut config =
        TraceContextConfig::load(cli.config.as_deref()).context("failed to load configuration")?;

    observability::init(&config, cli.verbose).context("failed to initialize observability")?;

    let mut stdout = std::io::stdout();
    let api = OrchestratorClient::from_config(&config.client);

    match cli.command {
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            cli::cmd_serve(&config)?;
        },
        Commands::Init { repo, force } => {
            let repo = repo_or_cwd(repo)?;
            cli::cmd_init(&repo, force, &mut stdout)?;
        },
        Commands::Status => cli::cmd_status(&api, &mut stdout)?,
        Commands::Search { query } => cli::cmd_search(&api, &query, &mut stdout)?,
        Commands::Reset => cli::cmd_reset(&api, &mut stdout)?,
        Commands::Mcp => McpServer::new(api).run_stdio()?,
        Commands::Hook {
            event: HookEvent::PostCommit { repo },
        } => {
            let repo = repo_or_cwd(repo)?;
            cli::cmd_hook_post_commit(&api, &repo)?;
        },
        Commands::Config => cli::cmd_config(&config, &mut stdout)?,
        Commands::Completions { .. } => {},
    }

    Ok(())
}

fn repo_or_cwd(repo: Option<PathBuf>) -> anyhow::Result<PathBuf> {
    match repo {
        Some(path) => Ok(path),
        None => std::env::current_dir().context("failed to read current directory"),
    }
}
