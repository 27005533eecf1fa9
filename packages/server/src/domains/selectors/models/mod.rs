pub mod company_config;
pub mod selector_config;

pub use company_config::*;
pub use selector_config::*;
