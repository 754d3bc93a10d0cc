#![deny(warnings)]

//! Round runtime: resolves rounds atomically and keeps the game's history.
//!
//! [`resolve_round`] is the stateless core: it validates, produces, settles
//! and rolls the market event on copies of the inputs. [`RoundController`]
//! wraps it with the round counter, the history and the event log, and is
//! the only writer of any of them.

pub mod history;

use factor_core::{
    validate_allocation_with, validate_config, usage_report, Allocation, EngineError, EventTag,
    GameConfig, MarketState, Resource, ResourcePool, RoundResult, UsageReport,
};
use factor_econ::{purchase_order, EventGenerator, ProductionEngine, PurchaseOrder, PurchaseReceipt};
use tracing::{debug, info, warn};

pub use history::{EventLog, History, LogEntry, RoundSummary};

/// Rounds covered by the periodic summary.
pub const SUMMARY_WINDOW: usize = 5;

/// Fixed rules a round is resolved under.
#[derive(Clone, Debug)]
pub struct RoundRules {
    pub production: ProductionEngine,
    pub usage_cap_ratio: f64,
}

impl RoundRules {
    pub fn from_config(cfg: &GameConfig) -> Self {
        Self {
            production: ProductionEngine::new(cfg.capital_cap),
            usage_cap_ratio: cfg.usage_cap_ratio,
        }
    }
}

impl Default for RoundRules {
    fn default() -> Self {
        Self::from_config(&GameConfig::default())
    }
}

/// Post-round state produced by [`resolve_round`].
#[derive(Clone, Debug, PartialEq)]
pub struct Resolved {
    pub result: RoundResult,
    pub pool: ResourcePool,
    pub market: MarketState,
}

/// Resolve one round without touching the caller's state.
///
/// Validation happens before any computation or random draw, so a rejected
/// allocation leaves `events` untouched as well.
pub fn resolve_round(
    round_number: u32,
    allocation: &Allocation,
    pool: &ResourcePool,
    market: &MarketState,
    rules: &RoundRules,
    events: &mut EventGenerator,
) -> Result<Resolved, EngineError> {
    validate_allocation_with(allocation, pool, rules.usage_cap_ratio)?;

    let mut pool = *pool;
    let mut market = market.clone();
    let efficiency_snapshot = market.efficiency;
    let report = rules.production.run(allocation, &market, &mut pool);
    let event = events.generate(&mut market);
    if let Some(ev) = &event {
        debug!(round = round_number, tag = ?ev.tag(), "{}", ev.description);
    }

    Ok(Resolved {
        result: RoundResult {
            round_number,
            allocation: allocation.clone(),
            outputs: report.outputs,
            efficiency_snapshot,
            total_income: report.total_income,
            event,
        },
        pool,
        market,
    })
}

/// Owns the game state and advances it one round at a time.
#[derive(Clone, Debug)]
pub struct RoundController {
    round: u32,
    pool: ResourcePool,
    market: MarketState,
    rules: RoundRules,
    events: EventGenerator,
    history: History,
    log: EventLog,
}

impl RoundController {
    /// Start a session at round 1 from a validated configuration.
    pub fn new(cfg: &GameConfig) -> Result<Self, EngineError> {
        validate_config(cfg)?;
        Ok(Self::with_parts(
            cfg.initial_pool,
            MarketState::new(cfg.initial_prices),
            RoundRules::from_config(cfg),
            EventGenerator::new(cfg.rng_seed, cfg.events.clone()),
        ))
    }

    /// Start a session at round 1 from explicit parts.
    pub fn with_parts(
        pool: ResourcePool,
        market: MarketState,
        rules: RoundRules,
        events: EventGenerator,
    ) -> Self {
        Self {
            round: 1,
            pool,
            market,
            rules,
            events,
            history: History::default(),
            log: EventLog::default(),
        }
    }

    /// Number of the next round to be played.
    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn pool(&self) -> &ResourcePool {
        &self.pool
    }

    pub fn market(&self) -> &MarketState {
        &self.market
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn log(&self) -> &EventLog {
        &self.log
    }

    pub fn rules(&self) -> &RoundRules {
        &self.rules
    }

    /// Live usage of a draft allocation against the current caps.
    pub fn usage(&self, allocation: &Allocation) -> UsageReport {
        usage_report(allocation, &self.pool, self.rules.usage_cap_ratio)
    }

    /// Check a draft allocation without playing it.
    pub fn validate(&self, allocation: &Allocation) -> Result<(), EngineError> {
        validate_allocation_with(allocation, &self.pool, self.rules.usage_cap_ratio)
    }

    /// Play one round. On error nothing changes; on success the new state,
    /// history entry, log line and round counter are committed together.
    pub fn resolve_round(&mut self, allocation: &Allocation) -> Result<RoundResult, EngineError> {
        let round = self.round;
        let resolved = match resolve_round(
            round,
            allocation,
            &self.pool,
            &self.market,
            &self.rules,
            &mut self.events,
        ) {
            Ok(r) => r,
            Err(err) => {
                warn!(round, %err, "round rejected");
                return Err(err);
            }
        };

        self.pool = resolved.pool;
        self.market = resolved.market;
        self.history.push(resolved.result.clone());
        self.round += 1;
        // The event shapes the market the next round is played in.
        if let Some(ev) = &resolved.result.event {
            self.log.record(self.round, ev.tag(), ev.description.clone());
        }
        info!(
            round,
            income = resolved.result.total_income,
            capital = self.pool.capital,
            "round resolved"
        );
        Ok(resolved.result)
    }

    /// Buy one resource at current prices.
    pub fn purchase(&mut self, resource: Resource, amount: f64) -> Result<PurchaseReceipt, EngineError> {
        let order = PurchaseOrder::single(resource, amount)?;
        self.purchase_order(&order)
    }

    /// Buy labor and land together; rejected as a whole if unaffordable.
    pub fn purchase_order(&mut self, order: &PurchaseOrder) -> Result<PurchaseReceipt, EngineError> {
        let (pool, receipt) = match purchase_order(order, &self.pool, &self.market) {
            Ok(ok) => ok,
            Err(err) => {
                warn!(round = self.round, %err, "purchase rejected");
                return Err(err);
            }
        };
        self.pool = pool;
        self.log.record(self.round, EventTag::Bonus, receipt.describe());
        info!(round = self.round, cost = receipt.cost, "purchase filled");
        Ok(receipt)
    }

    /// Summary of the last five rounds, due after every fifth completed round.
    pub fn summary_due(&self) -> Option<RoundSummary> {
        if self.round == 1 || self.round % SUMMARY_WINDOW as u32 != 1 {
            return None;
        }
        self.history.summary(SUMMARY_WINDOW)
    }
}
