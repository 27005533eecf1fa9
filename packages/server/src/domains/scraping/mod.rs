//! Scraping domain - work-item dispatch.
//!
//! Each work item (one company, one careers page) runs through
//! RESOLVE_TARGET -> EXTRACT -> [BACKFILL_CANONICAL] -> [SELF_HEAL] |
//! PERSIST -> ACK, or RETRY on a transient failure. The transitions are
//! decided by `machines::ScrapeMachine`; `activities::dispatch` does the IO.

pub mod activities;
pub mod error;
pub mod machines;
pub mod models;
pub mod restate;

pub use activities::{dispatch_work_item, DispatchResult};
pub use error::ScrapeError;
pub use machines::{ScrapeEvent, ScrapeMachine, ScrapeStage};
pub use models::{DispatchStatus, RawWorkItem, ScrapeOutcome, ScrapeWorkItem};
pub use restate::{ScrapeService, ScrapeServiceClient, ScrapeServiceImpl};
