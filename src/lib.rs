//! Pattern Engine — composable procedural generation of spawn schedules
//! and projectile volleys for games.
//!
//! Authored generators produce lazy, possibly infinite sequences together
//! with a declared count. Composites merge several bounded child schedules
//! into one time-ordered schedule that is computed once and cached.

pub mod core;
pub mod schema;
