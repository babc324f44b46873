/// Spawn patterns — generators of timed spawn events.
///
/// Every pattern exposes a declared count and six index-aligned sequences.
/// Consumers should go through [`collect_events`], which truncates each
/// sequence with [`take_exact`] and zips them into [`SpawnEvent`] records.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;
use std::fmt;

use crate::core::sequence::{
    self, identity_rotations, no_targets, take_exact, unit_fraction, zero_offsets, PatternError,
    Repeated, Sequence,
};
use crate::schema::event::SpawnEvent;
use crate::schema::target::{PrefabId, TargetKind};
use crate::schema::trajectory::TrajectoryRef;

/// An authored generator of spawn events.
///
/// All sequence accessors must yield at least `spawn_count()` items and may
/// be infinite. Implementations that do not customise a field return the
/// shared defaults from [`sequence`] (`zero_offsets`, `identity_rotations`,
/// `no_targets`).
pub trait SpawnPattern: fmt::Debug + Send + Sync {
    fn spawn_count(&self) -> Result<usize, PatternError>;
    fn spawn_times(&self) -> Sequence<'_, f32>;
    fn prefabs(&self) -> Sequence<'_, PrefabId>;
    fn trajectory_offsets(&self) -> Sequence<'_, Vec3>;
    fn trajectory_rotations(&self) -> Sequence<'_, Quat>;
    fn trajectories(&self) -> Sequence<'_, TrajectoryRef>;
    fn targets(&self) -> Sequence<'_, TargetKind>;
}

/// Materialise a pattern's full schedule as event records, in index order.
pub fn collect_events(pattern: &dyn SpawnPattern) -> Result<Vec<SpawnEvent>, PatternError> {
    let count = pattern.spawn_count()?;
    collect_counted(pattern, count)
}

/// Like [`collect_events`], for callers that already hold the count.
pub(crate) fn collect_counted(
    pattern: &dyn SpawnPattern,
    count: usize,
) -> Result<Vec<SpawnEvent>, PatternError> {
    if count == 0 {
        return Ok(Vec::new());
    }

    let times = take_exact(pattern.spawn_times(), count, "spawn time")?;
    let prefabs = take_exact(pattern.prefabs(), count, "prefab")?;
    let offsets = take_exact(pattern.trajectory_offsets(), count, "trajectory offset")?;
    let rotations = take_exact(pattern.trajectory_rotations(), count, "trajectory rotation")?;
    let trajectories = take_exact(pattern.trajectories(), count, "trajectory")?;
    let targets = take_exact(pattern.targets(), count, "target")?;

    let events = times
        .into_iter()
        .zip(prefabs)
        .zip(offsets)
        .zip(rotations)
        .zip(trajectories)
        .zip(targets)
        .map(
            |(((((time, prefab), trajectory_offset), trajectory_rotation), trajectory), target)| {
                SpawnEvent {
                    time,
                    prefab,
                    trajectory_offset,
                    trajectory_rotation,
                    trajectory,
                    target,
                }
            },
        )
        .collect();
    Ok(events)
}

/// Prefab and target tables cycled with per-entry repeat counts.
///
/// Both sequences are infinite; the owning pattern's count bounds them. An
/// empty target table falls back to [`TargetKind::None`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PeriodicPrefabs {
    pub prefabs: Vec<Repeated<PrefabId>>,
    #[serde(default)]
    pub targets: Vec<Repeated<TargetKind>>,
}

impl PeriodicPrefabs {
    /// Every prefab repeated `prefab_repeat` times, no targets.
    pub fn uniform(prefabs: &[PrefabId], prefab_repeat: u32) -> Self {
        Self {
            prefabs: prefabs
                .iter()
                .map(|id| Repeated::new(*id, prefab_repeat))
                .collect(),
            targets: Vec::new(),
        }
    }

    /// Replace the target table, every target repeated `target_repeat` times.
    pub fn with_targets(mut self, targets: &[TargetKind], target_repeat: u32) -> Self {
        self.targets = targets
            .iter()
            .map(|t| Repeated::new(*t, target_repeat))
            .collect();
        self
    }

    pub fn prefabs(&self) -> Sequence<'_, PrefabId> {
        sequence::periodic(&self.prefabs)
    }

    pub fn targets(&self) -> Sequence<'_, TargetKind> {
        if self.targets.is_empty() {
            return no_targets();
        }
        sequence::periodic(&self.targets)
    }
}

/// Exactly one spawn at `delay`, with an explicit placement.
#[derive(Debug, Clone)]
pub struct SingleSpawnPattern {
    pub periodic: PeriodicPrefabs,
    pub delay: f32,
    pub offset: Vec3,
    pub rotation: Quat,
    pub trajectory: TrajectoryRef,
}

impl SingleSpawnPattern {
    pub fn new(periodic: PeriodicPrefabs, trajectory: TrajectoryRef) -> Self {
        Self {
            periodic,
            delay: 0.0,
            offset: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            trajectory,
        }
    }

    pub fn with_delay(mut self, delay: f32) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_placement(mut self, offset: Vec3, rotation: Quat) -> Self {
        self.offset = offset;
        self.rotation = rotation;
        self
    }
}

impl SpawnPattern for SingleSpawnPattern {
    fn spawn_count(&self) -> Result<usize, PatternError> {
        check_time_gap("single", self.delay)?;
        Ok(1)
    }

    fn spawn_times(&self) -> Sequence<'_, f32> {
        sequence::constant(self.delay)
    }

    fn prefabs(&self) -> Sequence<'_, PrefabId> {
        self.periodic.prefabs()
    }

    fn trajectory_offsets(&self) -> Sequence<'_, Vec3> {
        sequence::constant(self.offset)
    }

    fn trajectory_rotations(&self) -> Sequence<'_, Quat> {
        sequence::constant(self.rotation)
    }

    fn trajectories(&self) -> Sequence<'_, TrajectoryRef> {
        sequence::constant(self.trajectory.clone())
    }

    fn targets(&self) -> Sequence<'_, TargetKind> {
        self.periodic.targets()
    }
}

/// `count` spawns `time_gap` seconds apart, spread evenly along a line.
///
/// Offsets run from `start_point` to `end_point` inclusive; a single spawn
/// sits at `start_point`.
#[derive(Debug, Clone)]
pub struct LinearSpawnPattern {
    pub periodic: PeriodicPrefabs,
    pub count: usize,
    pub time_gap: f32,
    pub start_point: Vec3,
    pub end_point: Vec3,
    pub rotation: Quat,
    pub trajectory: TrajectoryRef,
}

impl LinearSpawnPattern {
    pub fn new(
        periodic: PeriodicPrefabs,
        count: usize,
        time_gap: f32,
        start_point: Vec3,
        end_point: Vec3,
        trajectory: TrajectoryRef,
    ) -> Self {
        Self {
            periodic,
            count,
            time_gap,
            start_point,
            end_point,
            rotation: Quat::IDENTITY,
            trajectory,
        }
    }

    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }
}

impl SpawnPattern for LinearSpawnPattern {
    fn spawn_count(&self) -> Result<usize, PatternError> {
        check_time_gap("linear", self.time_gap)?;
        Ok(self.count)
    }

    fn spawn_times(&self) -> Sequence<'_, f32> {
        let gap = self.time_gap;
        Box::new((0..self.count).map(move |i| i as f32 * gap))
    }

    fn prefabs(&self) -> Sequence<'_, PrefabId> {
        self.periodic.prefabs()
    }

    fn trajectory_offsets(&self) -> Sequence<'_, Vec3> {
        let count = self.count;
        Box::new(
            (0..count)
                .map(move |i| self.start_point.lerp(self.end_point, unit_fraction(i, count))),
        )
    }

    fn trajectory_rotations(&self) -> Sequence<'_, Quat> {
        sequence::constant(self.rotation)
    }

    fn trajectories(&self) -> Sequence<'_, TrajectoryRef> {
        sequence::constant(self.trajectory.clone())
    }

    fn targets(&self) -> Sequence<'_, TargetKind> {
        self.periodic.targets()
    }
}

/// `count` spawns `time_gap` seconds apart, evenly around a horizontal
/// circle. Each spawn is yawed to face the centre.
#[derive(Debug, Clone)]
pub struct RingSpawnPattern {
    pub periodic: PeriodicPrefabs,
    pub count: usize,
    pub time_gap: f32,
    pub center: Vec3,
    pub radius: f32,
    /// Angle of the first spawn, in degrees about +Y from +Z.
    pub start_angle: f32,
    pub trajectory: TrajectoryRef,
}

impl RingSpawnPattern {
    pub fn new(
        periodic: PeriodicPrefabs,
        count: usize,
        time_gap: f32,
        center: Vec3,
        radius: f32,
        trajectory: TrajectoryRef,
    ) -> Self {
        Self {
            periodic,
            count,
            time_gap,
            center,
            radius,
            start_angle: 0.0,
            trajectory,
        }
    }

    /// Rotate the whole ring so the first spawn sits at `degrees`.
    pub fn with_start_angle(mut self, degrees: f32) -> Self {
        self.start_angle = degrees;
        self
    }

    fn angle(&self, index: usize) -> f32 {
        self.start_angle.to_radians() + TAU * index as f32 / self.count.max(1) as f32
    }
}

impl SpawnPattern for RingSpawnPattern {
    fn spawn_count(&self) -> Result<usize, PatternError> {
        check_time_gap("ring", self.time_gap)?;
        Ok(self.count)
    }

    fn spawn_times(&self) -> Sequence<'_, f32> {
        let gap = self.time_gap;
        Box::new((0..self.count).map(move |i| i as f32 * gap))
    }

    fn prefabs(&self) -> Sequence<'_, PrefabId> {
        self.periodic.prefabs()
    }

    fn trajectory_offsets(&self) -> Sequence<'_, Vec3> {
        Box::new((0..self.count).map(move |i| {
            let (sin, cos) = self.angle(i).sin_cos();
            self.center + Vec3::new(sin, 0.0, cos) * self.radius
        }))
    }

    fn trajectory_rotations(&self) -> Sequence<'_, Quat> {
        // Facing inward: local +Z points back at the centre.
        Box::new(
            (0..self.count).map(move |i| Quat::from_rotation_y(self.angle(i) + std::f32::consts::PI)),
        )
    }

    fn trajectories(&self) -> Sequence<'_, TrajectoryRef> {
        sequence::constant(self.trajectory.clone())
    }

    fn targets(&self) -> Sequence<'_, TargetKind> {
        self.periodic.targets()
    }
}

/// `count` simultaneous spawns at time zero from the pattern origin.
#[derive(Debug, Clone)]
pub struct BurstSpawnPattern {
    pub periodic: PeriodicPrefabs,
    pub count: usize,
    pub trajectory: TrajectoryRef,
}

impl BurstSpawnPattern {
    pub fn new(periodic: PeriodicPrefabs, count: usize, trajectory: TrajectoryRef) -> Self {
        Self {
            periodic,
            count,
            trajectory,
        }
    }
}

impl SpawnPattern for BurstSpawnPattern {
    fn spawn_count(&self) -> Result<usize, PatternError> {
        Ok(self.count)
    }

    fn spawn_times(&self) -> Sequence<'_, f32> {
        sequence::constant(0.0)
    }

    fn prefabs(&self) -> Sequence<'_, PrefabId> {
        self.periodic.prefabs()
    }

    fn trajectory_offsets(&self) -> Sequence<'_, Vec3> {
        zero_offsets()
    }

    fn trajectory_rotations(&self) -> Sequence<'_, Quat> {
        identity_rotations()
    }

    fn trajectories(&self) -> Sequence<'_, TrajectoryRef> {
        sequence::constant(self.trajectory.clone())
    }

    fn targets(&self) -> Sequence<'_, TargetKind> {
        self.periodic.targets()
    }
}

fn check_time_gap(pattern: &'static str, time_gap: f32) -> Result<(), PatternError> {
    if !time_gap.is_finite() {
        return Err(PatternError::InvalidParameter {
            pattern,
            reason: format!("time gap must be finite, got {}", time_gap),
        });
    }
    Ok(())
}
