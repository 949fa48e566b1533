#![forbid(unsafe_code)]

mod cmd;
mod config;
mod output;
mod workspace;

use clap::{Parser, Subcommand};
use output::OutputMode;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "flux: work tracking, quoting, and outbound webhooks",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    /// Derive the output mode from flags.
    fn output_mode(&self) -> OutputMode {
        if self.json {
            OutputMode::Json
        } else {
            OutputMode::Human
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Initialize a flux workspace in the current directory.
    Init,

    /// Manage projects.
    #[command(subcommand)]
    Project(cmd::project::ProjectCmd),

    /// Manage epics within a project.
    #[command(subcommand)]
    Epic(cmd::epic::EpicCmd),

    /// Manage tasks, dependencies, and status.
    #[command(subcommand)]
    Task(cmd::task::TaskCmd),

    /// Manage the product catalog.
    #[command(subcommand)]
    Product(cmd::product::ProductCmd),

    /// Manage the customer registry.
    #[command(subcommand)]
    Customer(cmd::customer::CustomerCmd),

    /// Create and manage sales quotes.
    #[command(subcommand)]
    Quote(cmd::quote::QuoteCmd),

    /// Manage webhook subscriptions and deliveries.
    #[command(subcommand)]
    Webhook(cmd::webhook::WebhookCmd),

    /// Archive done tasks and delete empty epics in a project.
    Cleanup(cmd::cleanup::CleanupArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let mode = cli.output_mode();
    match cli.command {
        Commands::Init => cmd::init::run(mode),
        Commands::Project(command) => cmd::project::run(command, mode),
        Commands::Epic(command) => cmd::epic::run(command, mode),
        Commands::Task(command) => cmd::task::run(command, mode),
        Commands::Product(command) => cmd::product::run(command, mode),
        Commands::Customer(command) => cmd::customer::run(command, mode),
        Commands::Quote(command) => cmd::quote::run(command, mode),
        Commands::Webhook(command) => cmd::webhook::run(command, mode),
        Commands::Cleanup(args) => cmd::cleanup::run(args, mode),
    }
}
