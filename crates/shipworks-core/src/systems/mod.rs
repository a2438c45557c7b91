//! Systems - logic that operates on building components

mod life_support;
mod magazine;

pub use life_support::*;
pub use magazine::*;
