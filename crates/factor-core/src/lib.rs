#![deny(warnings)]

//! Core domain models and invariants for the factor allocation game.
//!
//! This crate defines the serializable types shared by the engine crates
//! (resources, sectors, pools, market state, round results) together with
//! the allocation validator that guards every round.

pub mod config;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub use config::{validate_config, EventTuning, GameConfig};

/// Hard ceiling on the capital stock.
pub const CAPITAL_CAP: f64 = 5000.0;

/// Share of each stock that may be committed in a single round.
pub const USAGE_CAP_RATIO: f64 = 0.9;

/// The three factors of production.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    /// Workforce units.
    Labor,
    /// Money; also the unit production income is credited in.
    Capital,
    /// Land units.
    Land,
}

impl Resource {
    /// All resources in display order.
    pub const ALL: [Resource; 3] = [Resource::Labor, Resource::Capital, Resource::Land];

    /// Lowercase identifier used in messages.
    pub fn name(self) -> &'static str {
        match self {
            Resource::Labor => "labor",
            Resource::Capital => "capital",
            Resource::Land => "land",
        }
    }

    /// Whether the Market Desk sells this resource.
    pub fn is_purchasable(self) -> bool {
        matches!(self, Resource::Labor | Resource::Land)
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Production sectors. The discriminant doubles as the index into per-sector arrays.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sector {
    Agriculture = 0,
    Industry = 1,
    Technology = 2,
}

impl Sector {
    /// Number of sectors.
    pub const COUNT: usize = 3;
    /// All sectors in display order.
    pub const ALL: [Sector; Sector::COUNT] =
        [Sector::Agriculture, Sector::Industry, Sector::Technology];

    /// Position in per-sector arrays.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Human-readable sector name.
    pub fn name(self) -> &'static str {
        match self {
            Sector::Agriculture => "Agriculture",
            Sector::Industry => "Industry",
            Sector::Technology => "Technology",
        }
    }
}

impl fmt::Display for Sector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Resources committed to a single sector for one round.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SectorInputs {
    /// Labor units (>= 0).
    pub labor: f64,
    /// Capital spent (>= 0).
    pub capital: f64,
    /// Land units (>= 0).
    pub land: f64,
}

impl SectorInputs {
    pub fn new(labor: f64, capital: f64, land: f64) -> Self {
        Self {
            labor,
            capital,
            land,
        }
    }

    /// Amount of `resource` in this bundle.
    pub fn get(&self, resource: Resource) -> f64 {
        match resource {
            Resource::Labor => self.labor,
            Resource::Capital => self.capital,
            Resource::Land => self.land,
        }
    }

    /// True when any of the three inputs is exactly zero; such a sector yields nothing.
    pub fn has_zero_input(&self) -> bool {
        Resource::ALL.iter().any(|&r| self.get(r) == 0.0)
    }
}

/// A per-round assignment of resources to every sector.
///
/// Backed by a fixed array indexed by [`Sector::index`], so an allocation can
/// never be missing a sector.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    sectors: [SectorInputs; Sector::COUNT],
}

impl Allocation {
    /// An all-zero allocation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter.
    pub fn with(mut self, sector: Sector, inputs: SectorInputs) -> Self {
        self.set(sector, inputs);
        self
    }

    pub fn set(&mut self, sector: Sector, inputs: SectorInputs) {
        self.sectors[sector.index()] = inputs;
    }

    pub fn get(&self, sector: Sector) -> &SectorInputs {
        &self.sectors[sector.index()]
    }

    /// Sum of `resource` across all sectors.
    pub fn total(&self, resource: Resource) -> f64 {
        self.sectors.iter().map(|s| s.get(resource)).sum()
    }

    /// Iterate `(sector, inputs)` pairs in sector order.
    pub fn iter(&self) -> impl Iterator<Item = (Sector, &SectorInputs)> {
        Sector::ALL.iter().map(move |&s| (s, self.get(s)))
    }
}

/// Current stocks of the three resources.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResourcePool {
    /// Labor on hand (>= 0).
    pub labor: f64,
    /// Always within `[0, capital cap]`.
    pub capital: f64,
    /// Land on hand (>= 0).
    pub land: f64,
}

impl Default for ResourcePool {
    fn default() -> Self {
        Self {
            labor: 100.0,
            capital: 1000.0,
            land: 100.0,
        }
    }
}

impl ResourcePool {
    pub fn new(labor: f64, capital: f64, land: f64) -> Self {
        Self {
            labor,
            capital,
            land,
        }
    }

    pub fn get(&self, resource: Resource) -> f64 {
        match resource {
            Resource::Labor => self.labor,
            Resource::Capital => self.capital,
            Resource::Land => self.land,
        }
    }

    pub fn get_mut(&mut self, resource: Resource) -> &mut f64 {
        match resource {
            Resource::Labor => &mut self.labor,
            Resource::Capital => &mut self.capital,
            Resource::Land => &mut self.land,
        }
    }

    /// Largest amount of `resource` a single round may commit.
    pub fn usage_cap(&self, resource: Resource, ratio: f64) -> f64 {
        self.get(resource) * ratio
    }
}

/// Unit prices of the purchasable resources.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Prices {
    /// Capital per labor unit; never below the labor floor.
    pub labor: f64,
    /// Capital per land unit; never below the land floor.
    pub land: f64,
}

impl Default for Prices {
    fn default() -> Self {
        Self {
            labor: 50.0,
            land: 100.0,
        }
    }
}

/// Prices plus per-sector efficiency multipliers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarketState {
    /// Current unit prices.
    pub prices: Prices,
    /// Indexed by [`Sector::index`]; every entry is strictly positive.
    pub efficiency: [f64; Sector::COUNT],
}

impl Default for MarketState {
    fn default() -> Self {
        Self::new(Prices::default())
    }
}

impl MarketState {
    /// Market with the given prices and neutral efficiency everywhere.
    pub fn new(prices: Prices) -> Self {
        Self {
            prices,
            efficiency: [1.0; Sector::COUNT],
        }
    }

    /// Unit price of `resource`, or `None` when the resource is not traded.
    pub fn price(&self, resource: Resource) -> Option<f64> {
        match resource {
            Resource::Labor => Some(self.prices.labor),
            Resource::Land => Some(self.prices.land),
            Resource::Capital => None,
        }
    }

    /// Overwrite the price of a traded resource. Returns false for capital.
    pub fn set_price(&mut self, resource: Resource, price: f64) -> bool {
        match resource {
            Resource::Labor => self.prices.labor = price,
            Resource::Land => self.prices.land = price,
            Resource::Capital => return false,
        }
        true
    }

    pub fn efficiency(&self, sector: Sector) -> f64 {
        self.efficiency[sector.index()]
    }

    pub fn set_efficiency(&mut self, sector: Sector, value: f64) {
        self.efficiency[sector.index()] = value;
    }
}

/// One resource over its per-round usage cap.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    pub resource: Resource,
    /// Total allocated across sectors.
    pub used: f64,
    /// Usage cap for the round.
    pub cap: f64,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} over cap ({:.2} > {:.2})",
            self.resource, self.used, self.cap
        )
    }
}

/// Errors surfaced by engine operations. None of them leave partial state behind.
#[derive(Debug, Error, PartialEq)]
pub enum EngineError {
    /// One or more resources exceed the per-round usage cap.
    #[error("allocation exceeds usage cap: {}", join_violations(.0))]
    AllocationViolation(Vec<Violation>),
    /// Negative or non-finite quantity.
    #[error("invalid amount {amount} for {context}")]
    InvalidAmount { context: String, amount: f64 },
    /// Purchase cost exceeds available capital.
    #[error("insufficient capital: cost {cost:.2} exceeds available {available:.2}")]
    InsufficientCapital { cost: f64, available: f64 },
    /// The Market Desk does not sell this resource.
    #[error("{0} cannot be purchased")]
    NotPurchasable(Resource),
    /// Configuration value out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

fn join_violations(v: &[Violation]) -> String {
    v.iter()
        .map(|x| x.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Check that a quantity is finite and non-negative.
pub fn check_amount(context: impl Into<String>, amount: f64) -> Result<(), EngineError> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(EngineError::InvalidAmount {
            context: context.into(),
            amount,
        });
    }
    Ok(())
}

/// Validate an allocation against the pool using the standard 90% usage cap.
///
/// Pure function of its inputs: amounts are checked first (any negative or
/// non-finite value is an [`EngineError::InvalidAmount`]), then every
/// resource total is compared against its cap and all violations are
/// reported together.
pub fn validate_allocation(allocation: &Allocation, pool: &ResourcePool) -> Result<(), EngineError> {
    validate_allocation_with(allocation, pool, USAGE_CAP_RATIO)
}

/// [`validate_allocation`] with an explicit cap ratio.
pub fn validate_allocation_with(
    allocation: &Allocation,
    pool: &ResourcePool,
    cap_ratio: f64,
) -> Result<(), EngineError> {
    for (sector, inputs) in allocation.iter() {
        for resource in Resource::ALL {
            check_amount(format!("{sector} {resource}"), inputs.get(resource))?;
        }
    }
    let violations: Vec<Violation> = usage_report(allocation, pool, cap_ratio)
        .lines
        .into_iter()
        .filter(|l| l.over)
        .map(|l| Violation {
            resource: l.resource,
            used: l.used,
            cap: l.cap,
        })
        .collect();
    if violations.is_empty() {
        Ok(())
    } else {
        Err(EngineError::AllocationViolation(violations))
    }
}

/// Usage of one resource against its cap.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UsageLine {
    pub resource: Resource,
    pub used: f64,
    pub cap: f64,
    /// `cap - used`; negative when over.
    pub remaining: f64,
    /// Over the cap, or not a finite total.
    pub over: bool,
}

/// Per-resource usage of a proposed allocation, for live "used/cap" displays.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UsageReport {
    pub lines: Vec<UsageLine>,
}

impl UsageReport {
    pub fn within_caps(&self) -> bool {
        self.lines.iter().all(|l| !l.over)
    }

    pub fn line(&self, resource: Resource) -> Option<&UsageLine> {
        self.lines.iter().find(|l| l.resource == resource)
    }
}

/// Summarize how much of each capped stock an allocation would use.
pub fn usage_report(allocation: &Allocation, pool: &ResourcePool, cap_ratio: f64) -> UsageReport {
    let lines = Resource::ALL
        .iter()
        .map(|&resource| {
            let used = allocation.total(resource);
            let cap = pool.usage_cap(resource, cap_ratio);
            UsageLine {
                resource,
                used,
                cap,
                remaining: cap - used,
                over: !used.is_finite() || used > cap,
            }
        })
        .collect();
    UsageReport { lines }
}

/// Category tag attached to log entries for presentation styling.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventTag {
    Price,
    Tech,
    Bonus,
}

/// Structured before/after data of an applied market event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    PriceShock {
        resource: Resource,
        /// Sampled relative change, e.g. `0.12` for +12%.
        change: f64,
        before: f64,
        after: f64,
    },
    EfficiencyShock {
        sector: Sector,
        multiplier: f64,
        before: f64,
        after: f64,
    },
    Subsidy {
        factor: f64,
        before: [f64; Sector::COUNT],
        after: [f64; Sector::COUNT],
    },
}

impl EventKind {
    pub fn tag(&self) -> EventTag {
        match self {
            EventKind::PriceShock { .. } => EventTag::Price,
            EventKind::EfficiencyShock { .. } => EventTag::Tech,
            EventKind::Subsidy { .. } => EventTag::Bonus,
        }
    }
}

/// A market event that was applied during a round.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AppliedEvent {
    pub kind: EventKind,
    pub description: String,
}

impl AppliedEvent {
    pub fn tag(&self) -> EventTag {
        self.kind.tag()
    }
}

/// Immutable record of a completed round.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoundResult {
    pub round_number: u32,
    pub allocation: Allocation,
    /// Output per sector, indexed by [`Sector::index`].
    pub outputs: [f64; Sector::COUNT],
    /// Efficiency used for production, taken before the round's event fired.
    pub efficiency_snapshot: [f64; Sector::COUNT],
    pub total_income: f64,
    /// Event applied at the end of the round, if any.
    pub event: Option<AppliedEvent>,
}

impl RoundResult {
    pub fn output(&self, sector: Sector) -> f64 {
        self.outputs[sector.index()]
    }

    /// One line per sector, e.g. `Agriculture: 562.50 (efficiency x1.00)`.
    pub fn detail_lines(&self) -> Vec<String> {
        Sector::ALL
            .iter()
            .map(|&s| {
                let out = self.output(s);
                if out > 0.0 {
                    format!(
                        "{s}: {out:.2} (efficiency x{:.2})",
                        self.efficiency_snapshot[s.index()]
                    )
                } else {
                    format!("{s}: no output (missing inputs)")
                }
            })
            .collect()
    }
}

/// Round to two decimals, half-to-even on the exact binary value.
pub fn round_cents(value: f64) -> f64 {
    Decimal::from_f64_retain(value)
        .map(|d| d.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven))
        .and_then(|d| d.to_f64())
        .unwrap_or(value)
}
