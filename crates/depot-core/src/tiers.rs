//! Warehouse capacity tiers and the piecewise usage cost curve.
//!
//! A warehouse declares an ordered list of tiers, each with a cumulative
//! capacity and a marginal unit cost. Throughput between the previous
//! tier's capacity (0 for the first tier) and this tier's capacity is
//! charged at this tier's cost:
//!
//! ```text
//!  cost
//!   │                    ╱
//!   │                  ╱   c₂
//!   │          ______╱
//!   │   c₁ ___╱  c₁'
//!   │  ___╱
//!   └──────┬──────┬──────┬──▶ throughput
//!          k₀     k₁     k₂
//! ```
//!
//! The curve is zero at zero throughput and non-decreasing. It is convex
//! exactly when marginal costs are non-decreasing across tiers.

use serde::{Deserialize, Serialize};

use crate::{DepotError, DepotResult};

/// One capacity tier of a warehouse
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WarehouseTier {
    /// Cumulative capacity reached at the end of this tier
    pub capacity: f64,
    /// Marginal cost per unit of throughput within this tier
    pub cost: f64,
}

impl WarehouseTier {
    pub fn new(capacity: f64, cost: f64) -> Self {
        Self { capacity, cost }
    }
}

/// A single linear piece of the cost curve
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TierSegment {
    /// Position of the tier in the warehouse's tier list
    pub index: usize,
    pub lower: f64,
    pub upper: f64,
    pub marginal_cost: f64,
}

impl TierSegment {
    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }
}

/// Validated piecewise-linear usage cost of one warehouse
#[derive(Debug, Clone, PartialEq)]
pub struct WarehouseCostCurve {
    segments: Vec<TierSegment>,
}

impl WarehouseCostCurve {
    /// Build the curve, rejecting tier lists that leave it undefined.
    pub fn new(tiers: &[WarehouseTier]) -> DepotResult<Self> {
        if tiers.is_empty() {
            return Err(DepotError::Config(
                "warehouse must declare at least one tier".into(),
            ));
        }

        let mut segments = Vec::with_capacity(tiers.len());
        let mut lower = 0.0;
        for (index, tier) in tiers.iter().enumerate() {
            if !tier.capacity.is_finite() || !tier.cost.is_finite() {
                return Err(DepotError::Config(format!(
                    "tier {} has a non-finite capacity or cost",
                    index
                )));
            }
            if tier.capacity <= lower {
                return Err(DepotError::Config(format!(
                    "tier capacities must be positive and strictly increasing: tier {} has capacity {} after {}",
                    index, tier.capacity, lower
                )));
            }
            if tier.cost < 0.0 {
                return Err(DepotError::Config(format!(
                    "tier {} has negative cost {}",
                    index, tier.cost
                )));
            }
            segments.push(TierSegment {
                index,
                lower,
                upper: tier.capacity,
                marginal_cost: tier.cost,
            });
            lower = tier.capacity;
        }

        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[TierSegment] {
        &self.segments
    }

    /// Capacity of the last tier, the hard throughput limit
    pub fn max_capacity(&self) -> f64 {
        self.segments.last().map(|s| s.upper).unwrap_or(0.0)
    }

    /// Whether marginal costs never decrease from one tier to the next.
    ///
    /// Only convex curves can be linearized without ordering binaries.
    pub fn is_convex(&self) -> bool {
        self.segments
            .windows(2)
            .all(|pair| pair[1].marginal_cost >= pair[0].marginal_cost)
    }

    /// Usage cost at the given throughput.
    ///
    /// Negative throughput is treated as zero and throughput beyond the
    /// last tier is charged only up to the last tier's capacity.
    pub fn evaluate(&self, throughput: f64) -> f64 {
        let x = throughput.max(0.0);
        self.segments
            .iter()
            .map(|s| (x - s.lower).clamp(0.0, s.width()) * s.marginal_cost)
            .sum()
    }
}
