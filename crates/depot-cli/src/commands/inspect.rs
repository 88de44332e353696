use std::path::Path;

use anyhow::{Context, Result};
use depot_algo::{formulate, TierActivation};
use depot_io::importers;

use depot_cli::DepotConfig;

pub fn handle(
    config: &DepotConfig,
    network_path: &Path,
    tier_activation: Option<TierActivation>,
) -> Result<()> {
    let options = config.formulation_options(tier_activation);
    let network = importers::load_network(network_path)
        .with_context(|| format!("loading network {}", network_path.display()))?
        .network;
    let formulation = formulate(&network, &options).context("building distribution model")?;
    let stats = formulation.model.stats();

    println!("Model for {}:", network_path.display());
    println!("  Tier activation : {}", options.tier_activation);
    println!(
        "  Variables       : {} ({} continuous, {} integer, {} binary)",
        stats.variables(),
        stats.continuous,
        stats.integer,
        stats.binary
    );
    println!("  Constraints     : {}", stats.total_constraints());
    for (family, count) in &stats.constraints {
        if *count > 0 {
            println!("    {:<18} {}", family.as_str(), count);
        }
    }
    Ok(())
}
