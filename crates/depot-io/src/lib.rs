//! # depot-io: Network Import & Solution Export
//!
//! Reads the JSON network document (products, factories, warehouses,
//! stores, trucks, routes) into a validated [`depot_core::SupplyNetwork`]
//! and writes solved plans back out as JSON.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use depot_io::importers::load_network;
//!
//! fn main() -> anyhow::Result<()> {
//!     let result = load_network("demos/network.json")?;
//!     println!("{} routes", result.network.stats().routes);
//!     println!("{:?}", result.diagnostics);
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`importers`] - network document parsing and schema checks
//! - [`exporters`] - solution document serialization

pub mod exporters;
pub mod importers;

pub use exporters::{read_solution, write_solution, CostBreakdownDocument, SolutionDocument};
pub use importers::{load_network, parse_network, ImportResult};
