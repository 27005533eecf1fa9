pub mod steps;

pub use steps::{await_capture, dispatch_capture_command, persist_selectors, run_self_heal, suggest_selectors};
