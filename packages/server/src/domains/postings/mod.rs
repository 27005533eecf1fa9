//! Postings domain - the production ledger of extracted job postings.

pub mod ledger;
pub mod models;

pub use ledger::{LedgerError, PersistSummary, PgProductionLedger, ProductionLedger};
pub use models::{NewProductionJob, ProductionJob};
