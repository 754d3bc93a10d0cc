#![deny(warnings)]

//! Headless CLI that plays a scripted session against the round engine.

use anyhow::{Context, Result};
use factor_core::{Allocation, GameConfig, ResourcePool, RoundResult, Sector, SectorInputs};
use factor_econ::PurchaseOrder;
use factor_runtime::{LogEntry, RoundController, RoundSummary};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Default)]
struct Args {
    config: Option<PathBuf>,
    rounds: Option<u32>,
    seed: Option<u64>,
    buy: bool,
    json: bool,
}

fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Args {
    let mut out = Args::default();
    let mut it = args.into_iter();
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--config" => out.config = it.next().map(PathBuf::from),
            "--rounds" => out.rounds = it.next().and_then(|s| s.parse().ok()),
            "--seed" => out.seed = it.next().and_then(|s| s.parse().ok()),
            "--buy" => out.buy = true,
            "--json" => out.json = true,
            _ => {}
        }
    }
    out
}

fn load_config(path: Option<&PathBuf>) -> Result<GameConfig> {
    match path {
        Some(p) => {
            let text = std::fs::read_to_string(p)
                .with_context(|| format!("reading config {}", p.display()))?;
            serde_yaml::from_str(&text).with_context(|| format!("parsing config {}", p.display()))
        }
        None => Ok(GameConfig::default()),
    }
}

/// Fraction of every stock the scripted player commits each round.
const STOCK_USAGE: f64 = 0.6;

/// Share of each stock committed per sector: (labor, capital, land).
const SHARES: [(Sector, [f64; 3]); 3] = [
    (Sector::Agriculture, [0.40, 0.30, 0.70]),
    (Sector::Industry, [0.35, 0.35, 0.15]),
    (Sector::Technology, [0.25, 0.35, 0.15]),
];

/// Commit a fixed proportion of every stock, spread by [`SHARES`].
fn proportional_allocation(pool: &ResourcePool, usage: f64) -> Allocation {
    SHARES
        .iter()
        .fold(Allocation::new(), |alloc, (sector, [l, c, d])| {
            alloc.with(
                *sector,
                SectorInputs::new(
                    pool.labor * usage * l,
                    pool.capital * usage * c,
                    pool.land * usage * d,
                ),
            )
        })
}

/// Spend a tenth of capital on labor and land once capital is comfortable.
fn restock_order(ctl: &RoundController) -> Option<PurchaseOrder> {
    let capital = ctl.pool().capital;
    if capital < 2000.0 {
        return None;
    }
    let budget = capital * 0.1;
    let prices = ctl.market().prices;
    Some(PurchaseOrder {
        labor: (budget * 0.5 / prices.labor).floor(),
        land: (budget * 0.5 / prices.land).floor(),
    })
}

#[derive(Serialize)]
struct SessionReport<'a> {
    rounds: &'a [RoundResult],
    pool: &'a ResourcePool,
    log: &'a [LogEntry],
    summaries: Vec<RoundSummary>,
}

fn main() -> Result<()> {
    // Logging setup
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .init();

    let args = parse_args(std::env::args().skip(1));
    let mut cfg = load_config(args.config.as_ref())?;
    if let Some(seed) = args.seed {
        cfg.rng_seed = seed;
    }
    let rounds = args.rounds.unwrap_or(10);
    info!(config = ?args.config, rounds, seed = cfg.rng_seed, "starting session");

    let mut ctl = RoundController::new(&cfg)?;
    let mut summaries = Vec::new();
    for _ in 0..rounds {
        if args.buy {
            if let Some(order) = restock_order(&ctl) {
                if let Err(err) = ctl.purchase_order(&order) {
                    warn!(%err, "restock skipped");
                }
            }
        }
        let alloc = proportional_allocation(ctl.pool(), STOCK_USAGE);
        let result = ctl.resolve_round(&alloc)?;
        if !args.json {
            println!("Round {}", result.round_number);
            for line in result.detail_lines() {
                println!("  {line}");
            }
            if let Some(ev) = &result.event {
                println!("  event: {}", ev.description);
            }
        }
        if let Some(summary) = ctl.summary_due() {
            if !args.json {
                println!(
                    "Summary rounds {}-{} | income: {:.2} | avg: {:.2} | leader: {}",
                    summary.first_round,
                    summary.last_round,
                    summary.total_income,
                    summary.average_income(),
                    summary
                        .leading_sector
                        .map(|s| s.name())
                        .unwrap_or("none"),
                );
            }
            summaries.push(summary);
        }
    }

    if args.json {
        let rounds: Vec<RoundResult> = ctl.history().iter().cloned().collect();
        let report = SessionReport {
            rounds: &rounds,
            pool: ctl.pool(),
            log: ctl.log().entries(),
            summaries,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        let p = ctl.pool();
        let m = ctl.market();
        println!(
            "KPI | rounds: {} | labor: {:.2} | capital: {:.2} | land: {:.2} | prices: labor {:.2} land {:.2} | events: {}",
            ctl.history().len(),
            p.labor,
            p.capital,
            p.land,
            m.prices.labor,
            m.prices.land,
            ctl.log().len()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use factor_core::validate_allocation;

    #[test]
    fn parses_flags() {
        let args = parse_args(
            ["--rounds", "7", "--seed", "3", "--json", "--buy", "--config", "x.yaml"]
                .map(String::from),
        );
        assert_eq!(args.rounds, Some(7));
        assert_eq!(args.seed, Some(3));
        assert!(args.json && args.buy);
        assert_eq!(args.config, Some(PathBuf::from("x.yaml")));
    }

    #[test]
    fn proportional_allocation_respects_caps() {
        let pool = ResourcePool::default();
        let alloc = proportional_allocation(&pool, STOCK_USAGE);
        assert!(validate_allocation(&alloc, &pool).is_ok());
        assert!(!alloc.get(Sector::Industry).has_zero_input());
    }

    #[test]
    fn bundled_config_matches_defaults() {
        let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../configs/default.yaml");
        let cfg = load_config(Some(&path)).unwrap();
        assert_eq!(cfg, GameConfig::default());
    }

    #[test]
    fn scripted_session_runs() {
        let mut ctl = RoundController::new(&GameConfig::default()).unwrap();
        for _ in 0..10 {
            let alloc = proportional_allocation(ctl.pool(), STOCK_USAGE);
            ctl.resolve_round(&alloc).unwrap();
        }
        assert_eq!(ctl.round(), 11);
    }
}
