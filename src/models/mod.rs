pub mod catalog;
pub mod category;

pub use catalog::*;
pub use category::*;
