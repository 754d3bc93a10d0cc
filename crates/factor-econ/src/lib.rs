#![deny(warnings)]

//! Economic rules for the factor allocation game.
//!
//! This crate provides:
//! - The per-sector production formula table and the production step
//! - The seeded market event generator
//! - The Market Desk for buying labor and land

pub mod desk;
pub mod events;
pub mod production;

pub use desk::{purchase, purchase_order, quote, PurchaseOrder, PurchaseReceipt};
pub use events::{apply_event, describe, EventGenerator, MIN_EFFICIENCY};
pub use production::{CrossTerm, FormulaTable, ProductionEngine, ProductionReport, SectorFormula};
