use std::path::Path;

use anyhow::{Context, Result};
use depot_io::importers;

pub fn handle(network_path: &Path) -> Result<()> {
    let imported = importers::load_network(network_path)
        .with_context(|| format!("validating {}", network_path.display()))?;

    let stats = imported.network.stats();
    println!("Network is valid");
    println!("  Products    : {}", stats.products);
    println!("  Factories   : {}", stats.factories);
    println!("  Warehouses  : {}", stats.warehouses);
    println!("  Stores      : {}", stats.stores);
    println!("  Routes      : {}", stats.routes);
    println!("  Truck types : {}", stats.truck_types);
    println!("  Truck/route pairs: {}", stats.truck_route_pairs);

    let diagnostics = &imported.diagnostics;
    if diagnostics.issues.is_empty() {
        return Ok(());
    }
    println!("\n{}", diagnostics.summary());
    for issue in &diagnostics.issues {
        println!("  {}", issue);
    }
    Ok(())
}
