//! Composition of the formulation steps into one immutable model.

use depot_core::SupplyNetwork;
use tracing::{debug, info};

use crate::combinations::Combinations;
use crate::constraints::ConstraintBuilder;
use crate::cost::{CostExpressionBuilder, CostExpressions};
use crate::error::FormulationError;
use crate::model::{MilpModel, ModelBuilder, ObjectiveSense, OptimizationModel};
use crate::topology::TopologyIndex;
use crate::variables::{DecisionVariables, TierActivation, VariableFactory};

/// Knobs that change the shape of the model
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FormulationOptions {
    pub tier_activation: TierActivation,
}

impl FormulationOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tier_activation(mut self, activation: TierActivation) -> Self {
        self.tier_activation = activation;
        self
    }
}

/// A built model plus the handles needed to read a solution back
#[derive(Debug, Clone)]
pub struct Formulation {
    pub model: MilpModel,
    pub combinations: Combinations,
    pub variables: DecisionVariables,
    pub costs: CostExpressions,
}

pub struct ModelAssembler<'a> {
    network: &'a SupplyNetwork,
    options: FormulationOptions,
}

impl<'a> ModelAssembler<'a> {
    pub fn new(network: &'a SupplyNetwork) -> Self {
        Self {
            network,
            options: FormulationOptions::default(),
        }
    }

    pub fn with_options(mut self, options: FormulationOptions) -> Self {
        self.options = options;
        self
    }

    /// Validate the network and build the minimization model.
    ///
    /// Schema and configuration defects fail here, before any variable is
    /// declared, so no partial model ever reaches a solver.
    pub fn assemble(&self) -> Result<Formulation, FormulationError> {
        self.network.validate()?;

        let topology = TopologyIndex::build(self.network);
        let combinations = Combinations::generate(self.network);
        debug!(
            truck_routes = combinations.truck_routes.len(),
            product_routes = combinations.product_routes.len(),
            "generated combinations"
        );

        let mut builder = ModelBuilder::new("distribution");
        let variables = VariableFactory::declare(
            &mut builder,
            self.network,
            &combinations,
            self.options.tier_activation,
        )?;

        let costs = CostExpressionBuilder::new(
            self.network,
            &topology,
            &combinations,
            &variables,
            self.options.tier_activation,
        )
        .build(&mut builder)?;

        ConstraintBuilder::new(self.network, &topology, &combinations, &variables)
            .build(&mut builder)?;

        builder.set_objective(ObjectiveSense::Minimize, costs.total());
        let model = builder.build()?;

        let stats = model.stats();
        info!(
            variables = stats.variables(),
            continuous = stats.continuous,
            integer = stats.integer,
            binary = stats.binary,
            constraints = stats.total_constraints(),
            tier_activation = %self.options.tier_activation,
            "assembled distribution model"
        );
        for (family, count) in &stats.constraints {
            debug!(family = %family, count, "constraint family");
        }

        Ok(Formulation {
            model,
            combinations,
            variables,
            costs,
        })
    }
}

/// Build the distribution model for `network` with the given options.
pub fn formulate(
    network: &SupplyNetwork,
    options: &FormulationOptions,
) -> Result<Formulation, FormulationError> {
    ModelAssembler::new(network).with_options(*options).assemble()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ConstraintFamily;
    use depot_core::{DepotError, SupplyNetworkBuilder, WarehouseTier};

    fn network() -> SupplyNetwork {
        SupplyNetworkBuilder::new()
            .product("A")
            .factory("F1", [("A", 10.0)])
            .store("S1", [("A", 10.0)])
            .route("R1", "F1", "S1", 2.0)
            .truck("T1", 20.0, 5.0, ["R1"])
            .build()
            .unwrap()
    }

    #[test]
    fn test_direct_network_shape() {
        let formulation = formulate(&network(), &FormulationOptions::default()).unwrap();
        let stats = formulation.model.stats();
        assert_eq!(stats.continuous, 1);
        assert_eq!(stats.integer, 1);
        assert_eq!(stats.binary, 0);
        assert_eq!(stats.constraints_in(ConstraintFamily::FactoryOutput), 1);
        assert_eq!(stats.constraints_in(ConstraintFamily::StoreDemand), 1);
        assert_eq!(stats.constraints_in(ConstraintFamily::TruckCapacity), 1);
        assert_eq!(stats.constraints_in(ConstraintFamily::WarehouseBalance), 0);

        // objective 2·flow + 5·trucks
        let mut values = vec![0.0; 2];
        values[formulation.model.find_variable("flow[A,R1]").unwrap().index()] = 10.0;
        values[formulation.model.find_variable("trucks[T1,R1]").unwrap().index()] = 1.0;
        assert_eq!(formulation.model.objective_value(&values), 25.0);
    }

    #[test]
    fn test_invalid_network_fails_before_construction() {
        let mut network = network();
        network.routes.values_mut().for_each(|r| r.end = "GHOST".into());
        let err = formulate(&network, &FormulationOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            FormulationError::Input(DepotError::Schema(_))
        ));
    }

    #[test]
    fn test_tier_activation_option_adds_binaries() {
        let network = SupplyNetworkBuilder::new()
            .product("A")
            .factory("F", [("A", 10.0)])
            .warehouse(
                "W",
                vec![WarehouseTier::new(5.0, 1.0), WarehouseTier::new(20.0, 2.0)],
            )
            .store("S", [("A", 10.0)])
            .route("R1", "F", "W", 1.0)
            .route("R2", "W", "S", 1.0)
            .truck("T", 20.0, 5.0, ["R1", "R2"])
            .build()
            .unwrap();

        let plain = formulate(&network, &FormulationOptions::default()).unwrap();
        assert_eq!(plain.model.stats().binary, 0);

        let options = FormulationOptions::new().with_tier_activation(TierActivation::Declare);
        let declared = formulate(&network, &options).unwrap();
        assert_eq!(declared.model.stats().binary, 2);
        assert_eq!(
            declared.model.stats().total_constraints(),
            plain.model.stats().total_constraints()
        );
    }
}
