//! Generators, composition and the authored pattern library.

pub mod composite;
pub mod firing;
pub mod library;
pub mod sequence;
pub mod spawn;
