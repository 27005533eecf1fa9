//! Kernel module - server infrastructure and dependencies.

pub mod ai;
pub mod cache;
pub mod deps;
pub mod renderer;
pub mod test_dependencies;
pub mod traits;

pub use ai::OpenAIClient;
pub use cache::RedisCache;
pub use deps::ServerDeps;
pub use renderer::{BrowserlessError, BrowserlessRenderer};
pub use test_dependencies::TestDependencies;
pub use traits::*;
