use std::process::ExitCode;

use clap::Parser;
use depot_cli::{Cli, Commands, DepotConfig};
use tracing_subscriber::FmtSubscriber;

mod commands;

use commands::solve::SolveArgs;

fn run(cli: &Cli) -> anyhow::Result<ExitCode> {
    match &cli.command {
        Commands::Solve {
            network,
            out,
            solver,
            tier_activation,
            verify,
        } => {
            let config = DepotConfig::load(cli.config.as_deref())?;
            commands::solve::handle(
                &config,
                SolveArgs {
                    network,
                    out: out.as_deref(),
                    solver: solver.as_deref(),
                    tier_activation: tier_activation.map(Into::into),
                    verify: *verify,
                },
            )
        }
        Commands::Validate { network } => {
            commands::validate::handle(network)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Inspect {
            network,
            tier_activation,
        } => {
            let config = DepotConfig::load(cli.config.as_deref())?;
            commands::inspect::handle(&config, network, tier_activation.map(Into::into))?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Completions { shell, out } => {
            commands::completions::handle(*shell, out.as_deref())?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(cli.log_level)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
