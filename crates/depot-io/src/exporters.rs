//! Solution document exporter
//!
//! A solution document maps every declared variable name to its solved
//! value and records the objective. It is only ever produced for a solved
//! model; infeasible or unbounded outcomes have no document.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use depot_core::{DepotError, DepotResult};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Objective value split by cost component
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostBreakdownDocument {
    pub truck_rental: f64,
    pub transport: f64,
    pub warehouse_usage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolutionDocument {
    /// Solver status, always "optimal" for a written document
    pub status: String,
    /// Identifier of the engine that produced the solution
    pub solver: String,
    pub objective_value: f64,
    pub cost_breakdown: CostBreakdownDocument,
    /// Every declared variable by name
    pub variables: BTreeMap<String, f64>,
}

/// Write a solution document as pretty-printed JSON, creating parent
/// directories as needed.
pub fn write_solution(path: impl AsRef<Path>, document: &SolutionDocument) -> DepotResult<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let json = serde_json::to_string_pretty(document)
        .map_err(|e| DepotError::Other(format!("serializing solution: {e}")))?;
    fs::write(path, json)?;
    info!(
        path = %path.display(),
        variables = document.variables.len(),
        "wrote solution"
    );
    Ok(())
}

/// Read back a solution document.
pub fn read_solution(path: impl AsRef<Path>) -> DepotResult<SolutionDocument> {
    let text = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document() -> SolutionDocument {
        let mut variables = BTreeMap::new();
        variables.insert("flow[A,R1]".to_string(), 10.0);
        variables.insert("trucks[T1,R1]".to_string(), 1.0);
        SolutionDocument {
            status: "optimal".into(),
            solver: "microlp".into(),
            objective_value: 25.0,
            cost_breakdown: CostBreakdownDocument {
                truck_rental: 5.0,
                transport: 20.0,
                warehouse_usage: 0.0,
            },
            variables,
        }
    }

    #[test]
    fn test_write_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("solution.json");
        write_solution(&path, &document()).unwrap();

        let back = read_solution(&path).unwrap();
        assert_eq!(back, document());
    }

    #[test]
    fn test_field_names_are_camel_case() {
        let json = serde_json::to_value(document()).unwrap();
        assert_eq!(json["objectiveValue"], 25.0);
        assert_eq!(json["costBreakdown"]["truckRental"], 5.0);
        assert_eq!(json["variables"]["flow[A,R1]"], 10.0);
    }
}
