//! Network document importer
//!
//! The document is a single JSON object:
//!
//! ```json
//! {
//!   "products": ["A"],
//!   "factories":  { "F1": { "productOutputs": { "A": 10 } } },
//!   "warehouses": { "W1": { "tiers": [ { "capacity": 50, "cost": 1.5 } ] } },
//!   "stores":     { "S1": { "productInputs": { "A": 10 } } },
//!   "trucks":     { "T1": { "capacity": 20, "dayCost": 5, "possibleRoutes": ["R1"] } },
//!   "routes":     { "R1": { "start": "F1", "end": "S1", "costPerUnit": 2 } }
//! }
//! ```
//!
//! Every top-level mapping is required (possibly empty), no object may
//! contain unknown fields and no mapping may repeat a key. Structural
//! problems surface as [`DepotError::Schema`]; malformed JSON as
//! [`DepotError::Parse`].

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs;
use std::marker::PhantomData;
use std::path::Path;

use depot_core::{
    DepotError, DepotResult, Diagnostics, Point, PointId, PointKind, ProductId, Route, RouteId,
    SupplyNetwork, TruckType, TruckTypeId, WarehouseTier,
};
use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use serde_json::error::Category;
use tracing::{debug, info};

/// A validated network together with its non-fatal findings
#[derive(Debug)]
pub struct ImportResult {
    pub network: SupplyNetwork,
    pub diagnostics: Diagnostics,
}

/// serde keeps the last of two equal JSON keys; ids must be unique instead.
fn unique_keys<'de, D, K, V>(deserializer: D) -> Result<BTreeMap<K, V>, D::Error>
where
    D: Deserializer<'de>,
    K: Deserialize<'de> + Ord + fmt::Display,
    V: Deserialize<'de>,
{
    struct UniqueKeys<K, V>(PhantomData<(K, V)>);

    impl<'de, K, V> Visitor<'de> for UniqueKeys<K, V>
    where
        K: Deserialize<'de> + Ord + fmt::Display,
        V: Deserialize<'de>,
    {
        type Value = BTreeMap<K, V>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("an object with unique keys")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
            let mut map = BTreeMap::new();
            while let Some((key, value)) = access.next_entry::<K, V>()? {
                if map.contains_key(&key) {
                    return Err(de::Error::custom(format_args!("duplicate key '{}'", key)));
                }
                map.insert(key, value);
            }
            Ok(map)
        }
    }

    deserializer.deserialize_map(UniqueKeys(PhantomData))
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct NetworkDocument {
    products: Vec<ProductId>,
    #[serde(deserialize_with = "unique_keys")]
    factories: BTreeMap<PointId, FactoryDocument>,
    #[serde(deserialize_with = "unique_keys")]
    warehouses: BTreeMap<PointId, WarehouseDocument>,
    #[serde(deserialize_with = "unique_keys")]
    stores: BTreeMap<PointId, StoreDocument>,
    #[serde(deserialize_with = "unique_keys")]
    trucks: BTreeMap<TruckTypeId, TruckDocument>,
    #[serde(deserialize_with = "unique_keys")]
    routes: BTreeMap<RouteId, RouteDocument>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct FactoryDocument {
    #[serde(deserialize_with = "unique_keys")]
    product_outputs: BTreeMap<ProductId, f64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct WarehouseDocument {
    tiers: Vec<WarehouseTier>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct StoreDocument {
    #[serde(deserialize_with = "unique_keys")]
    product_inputs: BTreeMap<ProductId, f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct TruckDocument {
    capacity: f64,
    day_cost: f64,
    possible_routes: BTreeSet<RouteId>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RouteDocument {
    start: PointId,
    end: PointId,
    cost_per_unit: f64,
}

impl NetworkDocument {
    fn into_network(self) -> DepotResult<(SupplyNetwork, Diagnostics)> {
        let mut points = Vec::with_capacity(
            self.factories.len() + self.warehouses.len() + self.stores.len(),
        );
        points.extend(self.factories.into_iter().map(|(id, doc)| Point {
            id,
            kind: PointKind::Factory {
                product_outputs: doc.product_outputs,
            },
        }));
        points.extend(self.warehouses.into_iter().map(|(id, doc)| Point {
            id,
            kind: PointKind::Warehouse { tiers: doc.tiers },
        }));
        points.extend(self.stores.into_iter().map(|(id, doc)| Point {
            id,
            kind: PointKind::Store {
                product_inputs: doc.product_inputs,
            },
        }));

        let trucks = self
            .trucks
            .into_iter()
            .map(|(id, doc)| TruckType {
                id,
                capacity: doc.capacity,
                day_cost: doc.day_cost,
                possible_routes: doc.possible_routes,
            })
            .collect();

        let routes = self
            .routes
            .into_iter()
            .map(|(id, doc)| Route {
                id,
                start: doc.start,
                end: doc.end,
                cost_per_unit: doc.cost_per_unit,
            })
            .collect();

        SupplyNetwork::from_parts(self.products, points, trucks, routes)
    }
}

fn classify(err: serde_json::Error) -> DepotError {
    match err.classify() {
        Category::Data => DepotError::Schema(err.to_string()),
        Category::Io => DepotError::Io(err.into()),
        Category::Syntax | Category::Eof => DepotError::Parse(err.to_string()),
    }
}

/// Parse and validate a network document held in memory.
pub fn parse_network(text: &str) -> DepotResult<ImportResult> {
    let document: NetworkDocument = serde_json::from_str(text).map_err(classify)?;
    let (network, diagnostics) = document.into_network()?;
    debug!(stats = ?network.stats(), "parsed network document");
    Ok(ImportResult {
        network,
        diagnostics,
    })
}

/// Read, parse and validate a network document from disk.
pub fn load_network(path: impl AsRef<Path>) -> DepotResult<ImportResult> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)?;
    let result = parse_network(&text)?;
    info!(
        path = %path.display(),
        points = result.network.points.len(),
        routes = result.network.routes.len(),
        "loaded network"
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const DIRECT: &str = r#"{
        "products": ["A"],
        "factories": { "F1": { "productOutputs": { "A": 10 } } },
        "warehouses": {},
        "stores": { "S1": { "productInputs": { "A": 10 } } },
        "trucks": { "T1": { "capacity": 20, "dayCost": 5, "possibleRoutes": ["R1"] } },
        "routes": { "R1": { "start": "F1", "end": "S1", "costPerUnit": 2 } }
    }"#;

    #[test]
    fn test_parse_direct_network() {
        let result = parse_network(DIRECT).unwrap();
        let network = result.network;
        assert_eq!(network.products, vec![ProductId::new("A")]);
        let route = network.route(&RouteId::new("R1")).unwrap();
        assert_eq!(route.start, PointId::new("F1"));
        assert_eq!(route.cost_per_unit, 2.0);
        let truck = network.truck(&TruckTypeId::new("T1")).unwrap();
        assert_eq!(truck.capacity, 20.0);
        assert_eq!(truck.day_cost, 5.0);
        assert!(result.diagnostics.issues.is_empty());
    }

    #[test]
    fn test_parse_warehouse_tiers() {
        let text = DIRECT.replace(
            r#""warehouses": {}"#,
            r#""warehouses": { "W1": { "tiers": [ {"capacity": 5, "cost": 1}, {"capacity": 20, "cost": 3} ] } }"#,
        );
        let network = parse_network(&text).unwrap().network;
        let (_, tiers) = network.warehouses().next().unwrap();
        assert_eq!(tiers.len(), 2);
        assert_eq!(tiers[1], WarehouseTier::new(20.0, 3.0));
    }

    #[test]
    fn test_missing_mapping_is_schema_violation() {
        let text = DIRECT.replace(r#""warehouses": {},"#, "");
        let err = parse_network(&text).unwrap_err();
        assert!(matches!(err, DepotError::Schema(_)), "{err}");
        assert!(err.to_string().contains("warehouses"));
    }

    #[test]
    fn test_missing_attribute_is_schema_violation() {
        let text = DIRECT.replace(r#""dayCost": 5, "#, "");
        let err = parse_network(&text).unwrap_err();
        assert!(matches!(err, DepotError::Schema(_)));
        assert!(err.to_string().contains("dayCost"));
    }

    #[test]
    fn test_unknown_attribute_rejected() {
        let text = DIRECT.replace(r#""costPerUnit": 2"#, r#""costPerUnit": 2, "cost": 3"#);
        assert!(matches!(
            parse_network(&text).unwrap_err(),
            DepotError::Schema(_)
        ));
    }

    #[test]
    fn test_duplicate_route_id_rejected() {
        let text = DIRECT.replace(
            r#""routes": { "R1": { "start": "F1", "end": "S1", "costPerUnit": 2 } }"#,
            r#""routes": {
                "R1": { "start": "F1", "end": "S1", "costPerUnit": 2 },
                "R1": { "start": "F1", "end": "S1", "costPerUnit": 99 }
            }"#,
        );
        let err = parse_network(&text).unwrap_err();
        assert!(matches!(err, DepotError::Schema(_)), "{err}");
        assert!(err.to_string().contains("duplicate key 'R1'"));
    }

    #[test]
    fn test_duplicate_point_and_product_entries_rejected() {
        let text = DIRECT.replace(
            r#""stores": { "S1": { "productInputs": { "A": 10 } } }"#,
            r#""stores": { "S1": { "productInputs": { "A": 10 } }, "S1": { "productInputs": { "A": 1 } } }"#,
        );
        assert!(matches!(
            parse_network(&text).unwrap_err(),
            DepotError::Schema(_)
        ));

        let text = DIRECT.replace(r#"{ "A": 10 } } }"#, r#"{ "A": 10, "A": 3 } } }"#);
        let err = parse_network(&text).unwrap_err();
        assert!(err.to_string().contains("duplicate key 'A'"), "{err}");
    }

    #[test]
    fn test_unknown_top_level_key_rejected() {
        let text = DIRECT.replace(r#""warehouses": {},"#, r#""warehouses": {}, "warehouse": {},"#);
        let err = parse_network(&text).unwrap_err();
        assert!(matches!(err, DepotError::Schema(_)), "{err}");
        assert!(err.to_string().contains("unknown field `warehouse`"), "{err}");
    }

    #[test]
    fn test_unknown_tier_field_rejected() {
        let text = DIRECT.replace(
            r#""warehouses": {}"#,
            r#""warehouses": { "W1": { "tiers": [ {"capacity": 5, "cost": 1, "costs": 2} ] } }"#,
        );
        assert!(matches!(
            parse_network(&text).unwrap_err(),
            DepotError::Schema(_)
        ));
    }

    #[test]
    fn test_dangling_endpoint_rejected() {
        let text = DIRECT.replace(r#""end": "S1""#, r#""end": "S9""#);
        let err = parse_network(&text).unwrap_err();
        assert!(matches!(err, DepotError::Schema(_)));
    }

    #[test]
    fn test_truncated_document_is_parse_error() {
        let err = parse_network(&DIRECT[..40]).unwrap_err();
        assert!(matches!(err, DepotError::Parse(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(DIRECT.as_bytes()).unwrap();
        let result = load_network(file.path()).unwrap();
        assert_eq!(result.network.stats().stores, 1);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_network("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, DepotError::Io(_)));
    }
}
