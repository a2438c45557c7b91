//! Component definitions for building entities.
//!
//! Plain data attached to `hecs` entities. The magazine itself lives in
//! `shipworks-logic` and is attached to launchers as-is.

mod building;
mod life_support;

pub use building::*;
pub use life_support::*;
pub use shipworks_logic::magazine::ShellMagazine;
