pub mod production_job;

pub use production_job::*;
