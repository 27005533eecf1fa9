//! Self-heal domain - recovers a working selector set for a company after
//! an extraction returned zero postings.
//!
//! Flow (SelfHealWorkflow, one journaled step each):
//! 1. dispatch-command  - ask the capture agent for fresh HTML
//! 2. await-capture     - single read of the capture slot, else extraction HTML
//! 3. suggest-selectors - model suggestion, else existing, else default
//! 4. persist-selectors - write through SelectorStore (cache + relational)

pub mod activities;
pub mod restate;
pub mod types;

pub use restate::{SelfHealWorkflow, SelfHealWorkflowClient, SelfHealWorkflowImpl};
pub use types::{
    CaptureSource, HealingHtml, SelectorSource, SelfHealRequest, SelfHealResult,
    SuggestedSelectors,
};
