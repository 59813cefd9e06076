//! ctxwarden CLI — the main entry point.
//!
//! Commands:
//! - `init`     — Write a default `.ctxwarden/config.toml`
//! - `add`      — Admit a file into the working set
//! - `remove`   — Drop a file from the working set
//! - `optimize` — Rescore for a task and prune low-relevance items
//! - `relevant` — List the items most relevant to a task
//! - `report`   — Usage report with the top-ranked items
//! - `status`   — One-line usage summary

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "ctxwarden",
    about = "ctxwarden — bounded context working set for AI-assisted development",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Project root; sources and `.ctxwarden/` resolve against it
    #[arg(long, global = true, env = "CTXWARDEN_PROJECT_ROOT", default_value = ".")]
    project_root: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the default configuration file
    Init,

    /// Add a file to the working set
    Add {
        /// File path, relative to the project root
        path: String,

        /// Category label (specs, standards, product, code, ...)
        #[arg(short, long, default_value = "unknown")]
        category: String,

        /// Current task, used for keyword relevance
        #[arg(short, long, default_value = "")]
        task: String,
    },

    /// Remove a file from the working set
    Remove {
        path: String,
    },

    /// Rescore every item and prune low-relevance ones when near the limit
    Optimize {
        #[arg(short, long, default_value = "")]
        task: String,
    },

    /// Show the items most relevant to a task
    Relevant {
        #[arg(short, long)]
        task: String,

        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },

    /// Print the context usage report
    Report {
        /// Number of top items to list (defaults to context.report_top_n)
        #[arg(long)]
        top: Option<usize>,

        /// Print the report as JSON instead of Markdown
        #[arg(long)]
        json: bool,
    },

    /// Show a one-line usage summary
    Status,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "warn" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));
    if cli.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }

    let root = cli.project_root;
    match cli.command {
        Commands::Init => commands::init::run(&root).await?,
        Commands::Add {
            path,
            category,
            task,
        } => commands::add::run(&root, &path, &category, &task).await?,
        Commands::Remove { path } => commands::remove::run(&root, &path).await?,
        Commands::Optimize { task } => commands::optimize::run(&root, &task).await?,
        Commands::Relevant { task, limit } => commands::relevant::run(&root, &task, limit).await?,
        Commands::Report { top, json } => commands::report::run(&root, top, json).await?,
        Commands::Status => commands::status::run(&root).await?,
    }

    Ok(())
}
