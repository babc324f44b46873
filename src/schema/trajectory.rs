/// Trajectories: time-parameterised paths that spawned objects follow.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// A pure mapping from elapsed time to a position, with a fixed duration.
///
/// `position` must be continuous over `[0, duration]`. Callers compute `t`
/// by subtracting the spawn time from the schedule time and are expected to
/// clamp it; out-of-range values never panic.
pub trait Trajectory: fmt::Debug + Send + Sync {
    fn duration(&self) -> f32;
    fn position(&self, t: f32) -> Vec3;
}

/// Shared, read-only handle to an authored trajectory.
pub type TrajectoryRef = Arc<dyn Trajectory>;

/// Straight line from `start` to `end` over `duration` seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearTrajectory {
    pub start: Vec3,
    pub end: Vec3,
    pub duration: f32,
}

impl LinearTrajectory {
    pub fn new(start: Vec3, end: Vec3, duration: f32) -> Self {
        Self {
            start,
            end,
            duration,
        }
    }
}

impl Trajectory for LinearTrajectory {
    fn duration(&self) -> f32 {
        self.duration
    }

    /// Extrapolates linearly outside `[0, duration]`. A non-positive duration
    /// pins the object to `start`.
    fn position(&self, t: f32) -> Vec3 {
        let fraction = if self.duration > 0.0 {
            t / self.duration
        } else {
            0.0
        };
        self.start.lerp(self.end, fraction)
    }
}

/// Piecewise-linear path through `waypoints`, traversed at constant speed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolylineTrajectory {
    pub waypoints: Vec<Vec3>,
    pub duration: f32,
}

impl PolylineTrajectory {
    pub fn new(waypoints: Vec<Vec3>, duration: f32) -> Self {
        Self {
            waypoints,
            duration,
        }
    }

    /// Total arc length of the path.
    pub fn length(&self) -> f32 {
        self.waypoints
            .windows(2)
            .map(|pair| pair[0].distance(pair[1]))
            .sum()
    }
}

impl Trajectory for PolylineTrajectory {
    fn duration(&self) -> f32 {
        self.duration
    }

    /// Clamps to the first/last waypoint outside `[0, duration]`.
    fn position(&self, t: f32) -> Vec3 {
        let Some(first) = self.waypoints.first() else {
            return Vec3::ZERO;
        };
        let total = self.length();
        if self.duration <= 0.0 || total <= 0.0 {
            return *first;
        }

        let mut remaining = (t / self.duration).clamp(0.0, 1.0) * total;
        for pair in self.waypoints.windows(2) {
            let segment = pair[0].distance(pair[1]);
            if remaining <= segment {
                if segment <= 0.0 {
                    return pair[0];
                }
                return pair[0].lerp(pair[1], remaining / segment);
            }
            remaining -= segment;
        }

        self.waypoints.last().copied().unwrap_or(*first)
    }
}
