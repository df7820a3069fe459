pub mod ast;
pub mod classify;
pub mod error;
pub mod imports;
pub mod normalize;
pub mod patch;

pub use error::{Result, TangleError};
