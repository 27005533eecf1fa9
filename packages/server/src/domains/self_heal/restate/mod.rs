pub mod workflows;

pub use workflows::self_heal::{SelfHealWorkflow, SelfHealWorkflowClient, SelfHealWorkflowImpl};
