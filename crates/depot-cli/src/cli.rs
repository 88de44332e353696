use clap::{CommandFactory, Parser, Subcommand, ValueEnum, ValueHint};
use clap_complete::Shell;
use depot_algo::TierActivation;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "depot", author, version, about = "Cost-minimizing distribution planning", long_about = None)]
pub struct Cli {
    /// Set the logging level
    #[arg(long, default_value = "info")]
    pub log_level: tracing::Level,

    /// Configuration file (defaults to <config dir>/depot/config.toml)
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build and solve the distribution model of a network
    Solve {
        /// Network description (JSON)
        #[arg(value_hint = ValueHint::FilePath)]
        network: PathBuf,
        /// Write the solution document to this file
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        out: Option<PathBuf>,
        /// MILP backend (microlp, or highs when compiled in)
        #[arg(long)]
        solver: Option<String>,
        /// How warehouse tier-activation binaries enter the model
        #[arg(long, value_enum)]
        tier_activation: Option<TierActivationArg>,
        /// Fail if the returned values break any constraint
        #[arg(long)]
        verify: bool,
    },
    /// Check a network description for schema and configuration errors
    Validate {
        /// Network description (JSON)
        #[arg(value_hint = ValueHint::FilePath)]
        network: PathBuf,
    },
    /// Build the model without solving and print its size
    Inspect {
        /// Network description (JSON)
        #[arg(value_hint = ValueHint::FilePath)]
        network: PathBuf,
        /// How warehouse tier-activation binaries enter the model
        #[arg(long, value_enum)]
        tier_activation: Option<TierActivationArg>,
    },
    /// Generate shell completion scripts
    Completions {
        /// Shell type
        #[arg(value_enum)]
        shell: Shell,
        /// Write output to a file instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TierActivationArg {
    Omit,
    Declare,
    EnforceOrder,
}

impl From<TierActivationArg> for TierActivation {
    fn from(arg: TierActivationArg) -> Self {
        match arg {
            TierActivationArg::Omit => TierActivation::Omit,
            TierActivationArg::Declare => TierActivation::Declare,
            TierActivationArg::EnforceOrder => TierActivation::EnforceOrder,
        }
    }
}

pub fn build_cli_command() -> clap::Command {
    Cli::command()
}
