mod cmd;
mod output;

use anyhow::Context;
use clap::{Parser, Subcommand};
use cmd::{
    list::ListSubcommand, new::NewSubcommand, phase::PhaseSubcommand,
    progress::ProgressSubcommand, status::StatusSubcommand,
};
use pm_core::config::{Config, Overrides};
use pm_core::WorkItemService;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "pm",
    about = "Documentation-driven work item tracking for humans and agents",
    version,
    propagate_version = true
)]
struct Cli {
    /// Base directory for work items (default: repository root)
    #[arg(long, global = true)]
    base_dir: Option<PathBuf>,

    /// Create git branches for new items and phase changes
    #[arg(long, global = true)]
    enable_git: bool,

    /// Use ./wiki instead of searching upward for a repository root
    #[arg(long, global = true)]
    no_auto_detect_repo_root: bool,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    /// Log progress to stderr
    #[arg(long, global = true, short = 'v')]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new work item
    New {
        #[command(subcommand)]
        subcommand: NewSubcommand,
    },

    /// List work items by status
    List {
        #[command(subcommand)]
        subcommand: ListSubcommand,
    },

    /// Show or override work item status
    Status {
        #[command(subcommand)]
        subcommand: StatusSubcommand,
    },

    /// Advance phases and work through phase tasks
    Phase {
        #[command(subcommand)]
        subcommand: PhaseSubcommand,
    },

    /// Track work item progress
    Progress {
        #[command(subcommand)]
        subcommand: ProgressSubcommand,
    },

    /// Assign a work item to a human or agent
    Assign { name: String, assignee: String },

    /// Move a work item to the completed store and add a postmortem
    Archive { name: String },

    /// Print guidelines for contributors and agents
    Instructions,

    /// Print version information
    Version,
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        tracing::Level::INFO
    } else {
        tracing::Level::WARN
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli) {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    if let Commands::Version = cli.command {
        return cmd::version::run(cli.json);
    }

    let cwd = std::env::current_dir().context("cannot determine working directory")?;
    let overrides = Overrides {
        base_dir: cli.base_dir,
        enable_git: cli.enable_git.then_some(true),
        auto_detect_repo_root: cli.no_auto_detect_repo_root.then_some(false),
    };
    let config = Config::load(&cwd, &overrides).context("failed to load configuration")?;
    tracing::debug!(base_dir = %config.base_dir().display(), "configuration loaded");

    let service = WorkItemService::open(config);
    let json = cli.json;

    match cli.command {
        Commands::New { subcommand } => cmd::new::run(&service, subcommand, json),
        Commands::List { subcommand } => cmd::list::run(&service, subcommand, json),
        Commands::Status { subcommand } => cmd::status::run(&service, subcommand, json),
        Commands::Phase { subcommand } => cmd::phase::run(&service, subcommand, json),
        Commands::Progress { subcommand } => cmd::progress::run(&service, subcommand, json),
        Commands::Assign { name, assignee } => cmd::assign::run(&service, &name, &assignee, json),
        Commands::Archive { name } => cmd::archive::run(&service, &name, json),
        Commands::Instructions => cmd::instructions::run(service.config(), json),
        Commands::Version => cmd::version::run(json),
    }
}
