//! Frame-driven runtime for a 3D role-playing game area: real-time combat,
//! per-creature action queues, walkmesh queries, triggers and room visibility.
//!
//! Everything lives in an [`area::Area`], which owns a `hecs::World` and is
//! advanced with [`area::Area::update`] once per frame.

pub mod actions;
pub mod area;
pub mod combat;
pub mod components;
pub mod constants;
pub mod error;
pub mod events;
pub mod faction;
pub mod party;
pub mod queries;
pub mod scenario;
pub mod spawning;
pub mod systems;
pub mod timer_queue;
