//! Engine constants organized by domain.
//!
//! Centralizing magic numbers makes tuning easier and documents intent.
//! Values the combat engine reads at runtime are defaults for `CombatConfig`.

mod area;
mod combat;
mod gameplay;
mod time;

pub use area::*;
pub use combat::*;
pub use gameplay::*;
pub use time::*;
