// HTTP server setup (Axum): extension mediator + manual selector overrides
pub mod app;
pub mod error;
pub mod routes;

pub use app::*;
pub use error::{ApiError, ApiResult};
