pub mod outcome;
pub mod work_item;

pub use outcome::*;
pub use work_item::*;
