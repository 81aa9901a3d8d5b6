//! Per-frame systems that are not part of the combat engine.
//!
//! - `actions`: drives the head of every creature's action queue
//! - `effects`: damage effects and how they land on a creature

pub mod actions;
pub mod effects;

pub use actions::execute_actions;
pub use effects::{apply_effect, DamageEffect, DamageType};
