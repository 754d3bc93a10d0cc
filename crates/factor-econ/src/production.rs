//! Sector formula table and the production step.

use factor_core::{Allocation, MarketState, Resource, ResourcePool, Sector};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// An input that one sector reads from another sector's allocation in the same round.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CrossTerm {
    pub source: Sector,
    pub resource: Resource,
    pub coef: f64,
}

/// Coefficients of one sector's production function:
///
/// `(wL·L + wC·C + wD·Ld) · (base + bonus·C + cross) · scale · eff`
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SectorFormula {
    pub sector: Sector,
    pub labor_weight: f64,
    pub capital_weight: f64,
    pub land_weight: f64,
    pub base_factor: f64,
    /// Productivity bonus per unit of the sector's own capital.
    pub capital_bonus: f64,
    pub cross: Option<CrossTerm>,
    pub scale: f64,
}

impl SectorFormula {
    /// Output of this sector for `allocation` at efficiency `eff`.
    ///
    /// Any zero input yields exactly zero.
    pub fn evaluate(&self, allocation: &Allocation, eff: f64) -> f64 {
        let own = allocation.get(self.sector);
        if own.has_zero_input() {
            return 0.0;
        }
        let base = self.labor_weight * own.labor
            + self.capital_weight * own.capital
            + self.land_weight * own.land;
        let cross = self
            .cross
            .map(|c| c.coef * allocation.get(c.source).get(c.resource))
            .unwrap_or(0.0);
        let factor = self.base_factor + self.capital_bonus * own.capital + cross;
        base * factor * self.scale * eff
    }
}

/// Production functions keyed by sector.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FormulaTable {
    formulas: [SectorFormula; Sector::COUNT],
}

impl Default for FormulaTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl FormulaTable {
    /// The standard ruleset: agriculture favours land and labour, industry
    /// feeds on technology's capital, technology has the steepest scale.
    pub fn standard() -> Self {
        Self {
            formulas: [
                SectorFormula {
                    sector: Sector::Agriculture,
                    labor_weight: 0.6,
                    capital_weight: 0.0,
                    land_weight: 1.2,
                    base_factor: 1.0,
                    capital_bonus: 0.015,
                    cross: None,
                    scale: 2.5,
                },
                SectorFormula {
                    sector: Sector::Industry,
                    labor_weight: 0.8,
                    capital_weight: 0.8,
                    land_weight: 0.0,
                    base_factor: 1.25,
                    capital_bonus: 0.0,
                    cross: Some(CrossTerm {
                        source: Sector::Technology,
                        resource: Resource::Capital,
                        coef: 0.03,
                    }),
                    scale: 3.2,
                },
                SectorFormula {
                    sector: Sector::Technology,
                    labor_weight: 0.5,
                    capital_weight: 1.1,
                    land_weight: 0.0,
                    base_factor: 1.0,
                    capital_bonus: 0.0,
                    cross: None,
                    scale: 1.8 * 6.0,
                },
            ],
        }
    }

    pub fn formula(&self, sector: Sector) -> &SectorFormula {
        &self.formulas[sector.index()]
    }

    /// Replace one sector's formula.
    pub fn set(&mut self, formula: SectorFormula) {
        self.formulas[formula.sector.index()] = formula;
    }
}

/// Outputs of one production step, computed before anything is consumed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProductionReport {
    pub outputs: [f64; Sector::COUNT],
    pub total_income: f64,
}

impl ProductionReport {
    /// Only producing sectors are charged for their inputs.
    pub fn consumes(&self, sector: Sector) -> bool {
        self.outputs[sector.index()] > 0.0
    }
}

/// Computes sector outputs and settles them against the pool.
#[derive(Clone, Debug)]
pub struct ProductionEngine {
    table: FormulaTable,
    capital_cap: f64,
}

impl ProductionEngine {
    pub fn new(capital_cap: f64) -> Self {
        Self::with_table(FormulaTable::standard(), capital_cap)
    }

    pub fn with_table(table: FormulaTable, capital_cap: f64) -> Self {
        Self { table, capital_cap }
    }

    pub fn table(&self) -> &FormulaTable {
        &self.table
    }

    /// Pure output computation. Every formula reads the same allocation
    /// snapshot, so cross-sector terms see pre-consumption values.
    pub fn compute(&self, allocation: &Allocation, market: &MarketState) -> ProductionReport {
        let mut outputs = [0.0; Sector::COUNT];
        for sector in Sector::ALL {
            let out = self
                .table
                .formula(sector)
                .evaluate(allocation, market.efficiency(sector));
            debug!(%sector, output = out, "sector output");
            outputs[sector.index()] = out;
        }
        let total_income = outputs.iter().sum();
        ProductionReport {
            outputs,
            total_income,
        }
    }

    /// Charge producing sectors for their inputs, credit income, clamp capital.
    ///
    /// `allocation` must already have passed validation against `pool`.
    pub fn settle(&self, allocation: &Allocation, report: &ProductionReport, pool: &mut ResourcePool) {
        for (sector, inputs) in allocation.iter() {
            if !report.consumes(sector) {
                continue;
            }
            for resource in Resource::ALL {
                *pool.get_mut(resource) -= inputs.get(resource);
            }
        }
        debug_assert!(pool.labor >= 0.0 && pool.land >= 0.0 && pool.capital >= 0.0);
        pool.capital = (pool.capital + report.total_income).min(self.capital_cap);
    }

    /// [`compute`](Self::compute) followed by [`settle`](Self::settle).
    pub fn run(
        &self,
        allocation: &Allocation,
        market: &MarketState,
        pool: &mut ResourcePool,
    ) -> ProductionReport {
        let report = self.compute(allocation, market);
        self.settle(allocation, &report, pool);
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use factor_core::{SectorInputs, CAPITAL_CAP};
    use proptest::prelude::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn engine() -> ProductionEngine {
        ProductionEngine::new(CAPITAL_CAP)
    }

    #[test]
    fn agriculture_scenario() {
        let mut pool = ResourcePool::new(100.0, 1000.0, 100.0);
        let alloc =
            Allocation::new().with(Sector::Agriculture, SectorInputs::new(50.0, 100.0, 50.0));
        let report = engine().run(&alloc, &MarketState::default(), &mut pool);
        // (0.6*50 + 1.2*50) * (1 + 0.015*100) * 2.5
        assert!(close(report.outputs[0], 562.5));
        assert_eq!(report.outputs[1], 0.0);
        assert_eq!(report.outputs[2], 0.0);
        assert!(close(pool.labor, 50.0));
        assert!(close(pool.land, 50.0));
        assert!(close(pool.capital, 1462.5));
    }

    #[test]
    fn retuning_a_sector_is_a_table_edit() {
        let mut table = FormulaTable::standard();
        let mut ag = *table.formula(Sector::Agriculture);
        ag.scale *= 2.0;
        ag.cross = Some(CrossTerm {
            source: Sector::Industry,
            resource: Resource::Land,
            coef: 0.1,
        });
        table.set(ag);
        let tuned = ProductionEngine::with_table(table, CAPITAL_CAP);
        assert_eq!(tuned.table().formula(Sector::Agriculture).scale, 5.0);
        assert_eq!(tuned.table().formula(Sector::Industry), engine().table().formula(Sector::Industry));

        let alloc = Allocation::new()
            .with(Sector::Agriculture, SectorInputs::new(50.0, 100.0, 50.0))
            .with(Sector::Industry, SectorInputs::new(10.0, 10.0, 10.0));
        let m = MarketState::default();
        let before = engine().compute(&alloc, &m);
        let after = tuned.compute(&alloc, &m);
        // 90 * (2.5 + 0.1*10) * 5.0
        assert!(close(after.outputs[0], 90.0 * 3.5 * 5.0));
        assert!(close(before.outputs[0], 562.5));
        assert_eq!(after.outputs[1], before.outputs[1]);
    }

    #[test]
    fn zero_labor_means_no_output_and_no_charge() {
        let mut pool = ResourcePool::new(100.0, 1000.0, 100.0);
        let alloc =
            Allocation::new().with(Sector::Agriculture, SectorInputs::new(0.0, 100.0, 50.0));
        let report = engine().run(&alloc, &MarketState::default(), &mut pool);
        assert_eq!(report.total_income, 0.0);
        assert_eq!(pool, ResourcePool::new(100.0, 1000.0, 100.0));
    }

    #[test]
    fn industry_reads_technology_capital() {
        let ind = SectorInputs::new(10.0, 10.0, 1.0);
        let alone = Allocation::new().with(Sector::Industry, ind);
        let coupled = alone
            .clone()
            .with(Sector::Technology, SectorInputs::new(5.0, 20.0, 1.0));
        let m = MarketState::default();
        let e = engine();
        let base = e.compute(&alone, &m).outputs[Sector::Industry.index()];
        let boosted = e.compute(&coupled, &m).outputs[Sector::Industry.index()];
        assert!(close(base, 16.0 * 1.25 * 3.2));
        assert!(close(boosted, 16.0 * (1.25 + 0.6) * 3.2));
    }

    #[test]
    fn industry_bonus_applies_even_when_technology_idles() {
        // Technology has no land so it produces nothing, but its capital
        // allocation still lifts industry and is not charged.
        let alloc = Allocation::new()
            .with(Sector::Industry, SectorInputs::new(10.0, 10.0, 1.0))
            .with(Sector::Technology, SectorInputs::new(5.0, 20.0, 0.0));
        let mut pool = ResourcePool::new(100.0, 1000.0, 100.0);
        let report = engine().run(&alloc, &MarketState::default(), &mut pool);
        assert_eq!(report.outputs[Sector::Technology.index()], 0.0);
        assert!(close(report.outputs[Sector::Industry.index()], 16.0 * 1.85 * 3.2));
        assert!(close(pool.labor, 90.0));
        assert!(close(pool.land, 99.0));
    }

    #[test]
    fn technology_formula_uses_efficiency() {
        let mut m = MarketState::default();
        m.set_efficiency(Sector::Technology, 1.5);
        let alloc = Allocation::new().with(Sector::Technology, SectorInputs::new(10.0, 10.0, 1.0));
        let out = engine().compute(&alloc, &m).outputs[Sector::Technology.index()];
        assert!(close(out, (5.0 + 11.0) * 10.8 * 1.5));
    }

    #[test]
    fn capital_is_clamped_after_credit() {
        let mut pool = ResourcePool::new(1000.0, 4900.0, 1000.0);
        let alloc = Allocation::new().with(Sector::Technology, SectorInputs::new(100.0, 100.0, 10.0));
        let report = engine().run(&alloc, &MarketState::default(), &mut pool);
        assert!(report.total_income > 200.0);
        assert_eq!(pool.capital, CAPITAL_CAP);
    }

    proptest! {
        #[test]
        fn capital_conservation(
            l in 0.0f64..30.0, c in 0.0f64..300.0, d in 0.0f64..30.0,
            l2 in 0.0f64..30.0, c2 in 0.0f64..300.0,
        ) {
            let before = ResourcePool::new(100.0, 1000.0, 100.0);
            let alloc = Allocation::new()
                .with(Sector::Agriculture, SectorInputs::new(l, c, d))
                .with(Sector::Technology, SectorInputs::new(l2, c2, 1.0));
            let mut pool = before;
            let report = engine().run(&alloc, &MarketState::default(), &mut pool);
            let consumed: f64 = alloc
                .iter()
                .filter(|(s, _)| report.consumes(*s))
                .map(|(_, i)| i.capital)
                .sum();
            let expected = (before.capital - consumed + report.total_income).min(CAPITAL_CAP);
            prop_assert!((pool.capital - expected).abs() < 1e-6);
            prop_assert!(report.outputs.iter().all(|&o| o >= 0.0));
        }

        #[test]
        fn any_zero_input_gives_zero(l in 0.0f64..50.0, c in 0.0f64..50.0, which in 0usize..3) {
            let mut inputs = SectorInputs::new(l + 1.0, c + 1.0, 5.0);
            match which {
                0 => inputs.labor = 0.0,
                1 => inputs.capital = 0.0,
                _ => inputs.land = 0.0,
            }
            for sector in Sector::ALL {
                let alloc = Allocation::new().with(sector, inputs);
                let mut pool = ResourcePool::new(100.0, 1000.0, 100.0);
                let report = engine().run(&alloc, &MarketState::default(), &mut pool);
                prop_assert_eq!(report.outputs[sector.index()], 0.0);
                prop_assert_eq!(pool, ResourcePool::new(100.0, 1000.0, 100.0));
            }
        }
    }
}
