use glam::{Quat, Vec3};
use std::sync::Arc;

use super::target::{PrefabId, TargetKind};
use super::trajectory::TrajectoryRef;

/// One scheduled appearance: what spawns, when, where, and whom it targets.
///
/// Produced as a single record so the six per-event fields can never drift
/// out of step with one another.
#[derive(Debug, Clone)]
pub struct SpawnEvent {
    pub time: f32,
    pub prefab: PrefabId,
    pub trajectory_offset: Vec3,
    pub trajectory_rotation: Quat,
    pub trajectory: TrajectoryRef,
    pub target: TargetKind,
}

impl SpawnEvent {
    /// World-space position of the spawned object at schedule time `now`.
    ///
    /// Elapsed time is clamped to the trajectory's duration, so the object
    /// rests at its spawn point before `time` and at the path end after it.
    pub fn position_at(&self, now: f32) -> Vec3 {
        let elapsed = (now - self.time).clamp(0.0, self.trajectory.duration().max(0.0));
        self.trajectory_offset + self.trajectory_rotation * self.trajectory.position(elapsed)
    }

    /// Absolute time at which the object reaches the end of its trajectory.
    pub fn end_time(&self) -> f32 {
        self.time + self.trajectory.duration().max(0.0)
    }

    /// Field-wise identity, comparing floats by bit pattern and the
    /// trajectory by reference.
    pub fn same_as(&self, other: &SpawnEvent) -> bool {
        self.time.to_bits() == other.time.to_bits()
            && self.prefab == other.prefab
            && self.trajectory_offset.to_array().map(f32::to_bits)
                == other.trajectory_offset.to_array().map(f32::to_bits)
            && self.trajectory_rotation.to_array().map(f32::to_bits)
                == other.trajectory_rotation.to_array().map(f32::to_bits)
            && Arc::ptr_eq(&self.trajectory, &other.trajectory)
            && self.target == other.target
    }
}
