//! Random market events: price shocks, efficiency shocks and subsidies.
//!
//! Each round every category is rolled independently. When several fire,
//! one of them is picked uniformly and the rest are dropped, so the market
//! changes at most once per round.

use factor_core::{
    round_cents, AppliedEvent, EventKind, EventTuning, MarketState, Resource, Sector,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::debug;

/// Efficiency never drops below this after rounding.
pub const MIN_EFFICIENCY: f64 = 0.01;

const TRADED: [Resource; 2] = [Resource::Labor, Resource::Land];

/// Seeded source of market events.
#[derive(Clone, Debug)]
pub struct EventGenerator {
    rng: ChaCha8Rng,
    tuning: EventTuning,
}

impl EventGenerator {
    pub fn new(seed: u64, tuning: EventTuning) -> Self {
        Self::from_rng(ChaCha8Rng::seed_from_u64(seed), tuning)
    }

    pub fn from_rng(rng: ChaCha8Rng, tuning: EventTuning) -> Self {
        Self { rng, tuning }
    }

    pub fn tuning(&self) -> &EventTuning {
        &self.tuning
    }

    fn fires(&mut self, p: f64) -> bool {
        self.rng.gen::<f64>() < p
    }

    fn floor(&self, resource: Resource) -> f64 {
        match resource {
            Resource::Land => self.tuning.land_price_floor,
            _ => self.tuning.labor_price_floor,
        }
    }

    /// Roll every category against `market` and pick at most one event.
    ///
    /// The returned event carries its before/after values but has not been
    /// applied yet.
    pub fn roll(&mut self, market: &MarketState) -> Option<EventKind> {
        let mut fired = Vec::with_capacity(3);

        if self.fires(self.tuning.price_shock_prob) {
            let resource = TRADED[self.rng.gen_range(0..TRADED.len())];
            let (lo, hi) = self.tuning.price_change_range;
            let change = self.rng.gen_range(lo..=hi);
            let before = market.price(resource).unwrap_or_default();
            let after = round_cents((before * (1.0 + change)).max(self.floor(resource)));
            fired.push(EventKind::PriceShock {
                resource,
                change,
                before,
                after,
            });
        }

        if self.fires(self.tuning.efficiency_shock_prob) {
            let sector = Sector::ALL[self.rng.gen_range(0..Sector::COUNT)];
            let (lo, hi) = self.tuning.efficiency_multiplier_range;
            let multiplier = self.rng.gen_range(lo..=hi);
            let before = market.efficiency(sector);
            fired.push(EventKind::EfficiencyShock {
                sector,
                multiplier,
                before,
                after: scale_efficiency(before, multiplier),
            });
        }

        if self.fires(self.tuning.subsidy_prob) {
            let factor = self.tuning.subsidy_factor;
            let before = market.efficiency;
            let after = before.map(|e| scale_efficiency(e, factor));
            fired.push(EventKind::Subsidy {
                factor,
                before,
                after,
            });
        }

        debug!(fired = fired.len(), "event roll");
        if fired.is_empty() {
            return None;
        }
        let pick = self.rng.gen_range(0..fired.len());
        Some(fired.swap_remove(pick))
    }

    /// Roll and apply in one step.
    pub fn generate(&mut self, market: &mut MarketState) -> Option<AppliedEvent> {
        let kind = self.roll(market)?;
        apply_event(&kind, market);
        Some(AppliedEvent {
            description: describe(&kind),
            kind,
        })
    }
}

fn scale_efficiency(value: f64, multiplier: f64) -> f64 {
    round_cents(value * multiplier).max(MIN_EFFICIENCY)
}

/// Write an event's after-values into the market.
pub fn apply_event(kind: &EventKind, market: &mut MarketState) {
    match kind {
        EventKind::PriceShock {
            resource, after, ..
        } => {
            market.set_price(*resource, *after);
        }
        EventKind::EfficiencyShock { sector, after, .. } => {
            market.set_efficiency(*sector, *after);
        }
        EventKind::Subsidy { after, .. } => market.efficiency = *after,
    }
}

fn signed_pct(frac: f64) -> String {
    let sign = if frac > 0.0 { "+" } else { "" };
    format!("{sign}{:.2}%", frac * 100.0)
}

/// Human-readable log line for an event.
pub fn describe(kind: &EventKind) -> String {
    match kind {
        EventKind::PriceShock {
            resource,
            change,
            after,
            ..
        } => {
            let name = match resource {
                Resource::Land => "Land",
                _ => "Labor",
            };
            format!(
                "Market price swing! {name} price {} -> {after:.2}",
                signed_pct(*change)
            )
        }
        EventKind::EfficiencyShock {
            sector, multiplier, ..
        } => format!(
            "Technology shift! {sector} efficiency {}",
            signed_pct(multiplier - 1.0)
        ),
        EventKind::Subsidy { factor, .. } => format!(
            "Government subsidy! All sectors +{:.0}% output",
            (factor - 1.0) * 100.0
        ),
    }
}
