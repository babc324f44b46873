//! Authored data types shared by every generator: trajectories, targets,
//! prefab handles and the spawn event record.

pub mod event;
pub mod target;
pub mod trajectory;
