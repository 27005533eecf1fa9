pub mod dispatch;

pub use dispatch::{dispatch_work_item, DispatchResult};
