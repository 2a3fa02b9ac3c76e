use anyhow::Result;
use aspect_xref::app::config::EngineConfig;
use aspect_xref::app::engine::XrefEngine;
use aspect_xref::cli;
use aspect_xref::server::{http, mcp::XrefMcpServer};
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "xreftool",
    version,
    about = "Incremental aspect cross-reference model and diagnostics"
)]
struct Cli {
    /// Engine configuration (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging for this crate
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Rebuild changed files and print edges and diagnostics
    Build {
        /// Workspace description (JSON)
        workspace: PathBuf,
        #[arg(long)]
        project: String,
        /// Changed files; every configuration of the project when omitted
        #[arg(long, num_args = 1..)]
        files: Vec<String>,
        #[arg(long)]
        json: bool,
    },
    /// Print the cross-reference graph of a project as DOT
    Graph {
        workspace: PathBuf,
        #[arg(long)]
        project: String,
    },
    /// Serve the HTTP API
    Serve {
        workspace: PathBuf,
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        #[arg(long, default_value_t = 8787)]
        port: u16,
    },
    /// Serve MCP tools over stdio
    Mcp { workspace: PathBuf },
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "aspect_xref=debug"
    } else {
        "aspect_xref=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let config = EngineConfig::load(cli.config.as_deref())?;

    match cli.command {
        Command::Build {
            workspace,
            project,
            files,
            json,
        } => {
            let engine = XrefEngine::load_from_json(&workspace, config)?;
            cli::run_build(&engine, &project, files, json).await
        }
        Command::Graph { workspace, project } => {
            let engine = XrefEngine::load_from_json(&workspace, config)?;
            cli::print_graph(&engine, &project).await
        }
        Command::Serve {
            workspace,
            host,
            port,
        } => {
            let engine = XrefEngine::load_from_json(&workspace, config)?;
            let addr: SocketAddr = format!("{host}:{port}").parse()?;
            tracing::info!(%addr, "serving HTTP");
            http::serve(engine, addr).await
        }
        Command::Mcp { workspace } => {
            let engine = XrefEngine::load_from_json(&workspace, config)?;
            XrefMcpServer::new(engine).serve_stdio().await
        }
    }
}
