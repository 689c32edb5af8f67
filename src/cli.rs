use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "ecprofile",
    about = "Inspect NAS enclosure EC profiles - fan masks, controller-driven LEDs/buttons and disk bay wiring",
    version,
    args_conflicts_with_subcommands = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Profile files, or directories of *.conf profiles
    pub paths: Vec<PathBuf>,

    /// Output as JSON instead of formatted tables
    #[arg(long)]
    pub json: bool,

    /// Print a driver model table entry for each supported profile
    #[arg(long, conflicts_with = "json")]
    pub driver: bool,

    /// Expected SIO_DEVICE value (default: it8528)
    #[arg(long, value_name = "ID")]
    pub controller: Option<String>,

    /// Treat fan collisions and undeclared disk sections as failures
    #[arg(long)]
    pub strict: bool,

    /// Load configuration from this file only
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Exit status when there is nothing to inspect. Per-file failures never set one.
    pub fn usage_exit_code(&self) -> Option<i32> {
        (self.command.is_none() && self.paths.is_empty()).then_some(1)
    }
}

#[derive(Subcommand)]
pub enum Command {
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for (auto-detected if omitted)
        shell: Option<Shell>,
    },
}

/// Print shell completions to stdout.
pub fn print_completions(shell: Option<Shell>) {
    let shell = shell.or_else(Shell::from_env).unwrap_or_else(|| {
        eprintln!(
            "Could not detect shell. Specify one: ecprofile completions bash|zsh|fish|elvish|powershell"
        );
        std::process::exit(1);
    });
    clap_complete::generate(
        shell,
        &mut Cli::command(),
        "ecprofile",
        &mut std::io::stdout(),
    );
}

/// Print usage to stderr.
pub fn print_usage() {
    eprintln!("{}", Cli::command().render_usage());
}
