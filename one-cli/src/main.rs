//! one: ticket-driven branch and pull request workflow CLI.
//!
//! # Usage
//!
//! ```text
//! one init --name <project> [--path <dir>] [--provider github|gitlab|bitbucket]
//! one start <TICKET-ID> [--description <text>]
//! one pr [--title <t>] [--description <d>] [--no-browser] [--no-device-flow]
//! one ticket <TICKET-ID>
//! one auth login|logout|status [--provider <kind>]
//! one config list|show
//! ```

mod browser;
mod commands;
mod reporter;
mod signal;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{
    auth::AuthCommand, config::ConfigCommand, init::InitArgs, pr::PrArgs, start::StartArgs,
    ticket::TicketArgs,
};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "one",
    version,
    about = "One workflow for tickets, branches and pull requests across projects",
    long_about = None,
)]
struct Cli {
    /// Log debug detail to stderr (RUST_LOG overrides).
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a project profile from the current repository.
    Init(InitArgs),

    /// Branch off the up-to-date base branch for a ticket.
    Start(StartArgs),

    /// Run hooks, push the current branch and open a pull request.
    Pr(PrArgs),

    /// Open a ticket in the browser.
    Ticket(TicketArgs),

    /// Manage stored provider credentials.
    Auth {
        #[command(subcommand)]
        command: AuthCommand,
    },

    /// Inspect project profiles.
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let interrupts = signal::Interrupts::install()?;
    match cli.command {
        Commands::Init(args) => args.run(),
        Commands::Start(args) => args.run(),
        Commands::Pr(args) => args.run(&interrupts),
        Commands::Ticket(args) => args.run(),
        Commands::Auth { command } => commands::auth::run(command, &interrupts),
        Commands::Config { command } => commands::config::run(command),
    }
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let fallback = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
