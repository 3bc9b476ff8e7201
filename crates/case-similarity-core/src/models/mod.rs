//! Domain models for the case library.

mod case;
mod similarity;

pub use case::*;
pub use similarity::*;
