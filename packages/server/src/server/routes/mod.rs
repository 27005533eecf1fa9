// HTTP routes
pub mod extension;
pub mod selectors;

pub use extension::*;
pub use selectors::*;
