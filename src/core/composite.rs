/// Composite spawn patterns — several child schedules merged into one.
///
/// Each child contributes exactly `spawn_count()` events, shifted by its
/// authored start time. The union is stably sorted by time and cached the
/// first time any accessor is called.

use glam::{Quat, Vec3};
use log::{debug, warn};
use std::sync::{Arc, OnceLock};

use crate::core::sequence::{PatternError, Sequence};
use crate::core::spawn::{collect_counted, SpawnPattern};
use crate::schema::event::SpawnEvent;
use crate::schema::target::{PrefabId, TargetKind};
use crate::schema::trajectory::TrajectoryRef;

/// A child pattern and the time its schedule starts at.
#[derive(Debug, Clone)]
pub struct CompositeChild {
    pub pattern: Arc<dyn SpawnPattern>,
    pub start_time: f32,
}

/// A spawn pattern built from other spawn patterns, composites included.
///
/// The composite shares its children and never mutates them. The merged
/// schedule lives in a [`OnceLock`], so concurrent first calls still read
/// each child exactly once.
#[derive(Debug, Default)]
pub struct CompositeSpawnPattern {
    children: Vec<CompositeChild>,
    merged: OnceLock<Result<Vec<SpawnEvent>, PatternError>>,
}

impl CompositeSpawnPattern {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_children(children: Vec<CompositeChild>) -> Self {
        Self {
            children,
            merged: OnceLock::new(),
        }
    }

    /// Append a child. Discards any schedule merged so far.
    pub fn with_child(mut self, pattern: Arc<dyn SpawnPattern>, start_time: f32) -> Self {
        self.children.push(CompositeChild {
            pattern,
            start_time,
        });
        self.merged = OnceLock::new();
        self
    }

    pub fn children(&self) -> &[CompositeChild] {
        &self.children
    }

    /// The merged, time-ordered schedule. Computed on first call.
    pub fn schedule(&self) -> Result<&[SpawnEvent], PatternError> {
        match self.merged.get_or_init(|| merge(&self.children)) {
            Ok(events) => Ok(events.as_slice()),
            Err(e) => Err(e.clone()),
        }
    }

    /// Cached events, or nothing if the merge failed. The failure is logged
    /// here and returned by `spawn_count` and `schedule`.
    fn events(&self) -> &[SpawnEvent] {
        match self.schedule() {
            Ok(events) => events,
            Err(e) => {
                warn!("composite spawn pattern yields no spawns: {}", e);
                &[]
            }
        }
    }
}

impl SpawnPattern for CompositeSpawnPattern {
    fn spawn_count(&self) -> Result<usize, PatternError> {
        Ok(self.schedule()?.len())
    }

    fn spawn_times(&self) -> Sequence<'_, f32> {
        Box::new(self.events().iter().map(|e| e.time))
    }

    fn prefabs(&self) -> Sequence<'_, PrefabId> {
        Box::new(self.events().iter().map(|e| e.prefab))
    }

    fn trajectory_offsets(&self) -> Sequence<'_, Vec3> {
        Box::new(self.events().iter().map(|e| e.trajectory_offset))
    }

    fn trajectory_rotations(&self) -> Sequence<'_, Quat> {
        Box::new(self.events().iter().map(|e| e.trajectory_rotation))
    }

    fn trajectories(&self) -> Sequence<'_, TrajectoryRef> {
        Box::new(self.events().iter().map(|e| e.trajectory.clone()))
    }

    fn targets(&self) -> Sequence<'_, TargetKind> {
        Box::new(self.events().iter().map(|e| e.target))
    }
}

fn merge(children: &[CompositeChild]) -> Result<Vec<SpawnEvent>, PatternError> {
    if children.is_empty() {
        warn!("composite spawn pattern has no children");
        return Ok(Vec::new());
    }

    let mut working = Vec::new();
    for child in children {
        let count = child.pattern.spawn_count()?;
        let mut events = collect_counted(child.pattern.as_ref(), count)?;
        for event in &mut events {
            event.time += child.start_time;
        }
        working.append(&mut events);
    }

    if let Some((index, event)) = working
        .iter()
        .enumerate()
        .find(|(_, e)| !e.time.is_finite())
    {
        return Err(PatternError::NonFiniteTime {
            index,
            time: event.time,
        });
    }

    // Stable: equal times keep child order, then within-child order.
    working.sort_by(|a, b| a.time.total_cmp(&b.time));

    debug!(
        "merged {} spawn events from {} children",
        working.len(),
        children.len()
    );
    Ok(working)
}
