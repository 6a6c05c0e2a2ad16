mod core;
mod executor;

pub use self::core::*;
pub use self::executor::{execute, Committed};
