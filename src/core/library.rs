/// Pattern library — named trajectories and patterns authored in RON.
///
/// Spawn patterns refer to trajectories and to other spawn patterns by
/// name. Names are resolved once at load time into shared handles, so a
/// pattern used by several composites is built a single time.

use glam::{EulerRot, Quat, Vec3};
use log::{debug, warn};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use crate::core::composite::{CompositeChild, CompositeSpawnPattern};
use crate::core::firing::{
    FanFiringPattern, FiringPattern, MirroredCutFiringPattern, PyramidFiringPattern,
    RingFiringPattern, ScatterFiringPattern,
};
use crate::core::sequence::{PatternError, Repeated};
use crate::core::spawn::{
    collect_events, BurstSpawnPattern, LinearSpawnPattern, PeriodicPrefabs, RingSpawnPattern,
    SingleSpawnPattern, SpawnPattern,
};
use crate::schema::target::{PrefabId, TargetKind};
use crate::schema::trajectory::{LinearTrajectory, PolylineTrajectory, TrajectoryRef};

#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("spawn pattern '{pattern}' references unknown trajectory '{trajectory}'")]
    UnknownTrajectory { pattern: String, trajectory: String },
    #[error("composite '{pattern}' references unknown spawn pattern '{child}'")]
    UnknownPattern { pattern: String, child: String },
    #[error("spawn pattern '{0}' contains itself")]
    CompositeCycle(String),
    #[error("pattern error: {0}")]
    Pattern(#[from] PatternError),
}

/// Authored trajectory shapes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TrajectoryConfig {
    Linear {
        start: Vec3,
        end: Vec3,
        duration: f32,
    },
    Polyline {
        waypoints: Vec<Vec3>,
        duration: f32,
    },
}

impl TrajectoryConfig {
    fn build(&self) -> TrajectoryRef {
        match self {
            Self::Linear {
                start,
                end,
                duration,
            } => Arc::new(LinearTrajectory::new(*start, *end, *duration)),
            Self::Polyline {
                waypoints,
                duration,
            } => Arc::new(PolylineTrajectory::new(waypoints.clone(), *duration)),
        }
    }
}

/// A child entry of an authored composite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChildConfig {
    pub pattern: String,
    #[serde(default)]
    pub start_time: f32,
}

/// Authored spawn patterns. Rotations are Euler angles in degrees
/// (pitch, yaw, roll).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SpawnPatternConfig {
    Single {
        prefabs: Vec<Repeated<PrefabId>>,
        #[serde(default)]
        targets: Vec<Repeated<TargetKind>>,
        #[serde(default)]
        delay: f32,
        #[serde(default)]
        offset: Vec3,
        #[serde(default)]
        rotation: Vec3,
        trajectory: String,
    },
    Linear {
        prefabs: Vec<Repeated<PrefabId>>,
        #[serde(default)]
        targets: Vec<Repeated<TargetKind>>,
        count: usize,
        time_gap: f32,
        start: Vec3,
        end: Vec3,
        #[serde(default)]
        rotation: Vec3,
        trajectory: String,
    },
    Ring {
        prefabs: Vec<Repeated<PrefabId>>,
        #[serde(default)]
        targets: Vec<Repeated<TargetKind>>,
        count: usize,
        time_gap: f32,
        #[serde(default)]
        center: Vec3,
        radius: f32,
        #[serde(default)]
        start_angle: f32,
        trajectory: String,
    },
    Burst {
        prefabs: Vec<Repeated<PrefabId>>,
        #[serde(default)]
        targets: Vec<Repeated<TargetKind>>,
        count: usize,
        trajectory: String,
    },
    Composite {
        children: Vec<ChildConfig>,
    },
}

/// Authored firing patterns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum FiringPatternConfig {
    Fan(FanFiringPattern),
    Ring(RingFiringPattern),
    MirroredCut(MirroredCutFiringPattern),
    Pyramid(PyramidFiringPattern),
    Scatter(ScatterFiringPattern),
}

impl FiringPatternConfig {
    fn build(self) -> Arc<dyn FiringPattern> {
        match self {
            Self::Fan(p) => Arc::new(p),
            Self::Ring(p) => Arc::new(p),
            Self::MirroredCut(p) => Arc::new(p),
            Self::Pyramid(p) => Arc::new(p),
            Self::Scatter(p) => Arc::new(p),
        }
    }
}

/// On-disk shape of a library file.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct LibraryConfig {
    #[serde(default)]
    pub trajectories: HashMap<String, TrajectoryConfig>,
    #[serde(default)]
    pub spawn_patterns: HashMap<String, SpawnPatternConfig>,
    #[serde(default)]
    pub firing_patterns: HashMap<String, FiringPatternConfig>,
}

/// A problem found while exercising every pattern in a library.
#[derive(Debug, Clone, PartialEq)]
pub struct LintIssue {
    pub pattern: String,
    pub combo: Option<u32>,
    pub error: PatternError,
}

/// Resolved, shareable patterns keyed by name.
#[derive(Debug, Clone, Default)]
pub struct PatternLibrary {
    trajectories: FxHashMap<String, TrajectoryRef>,
    spawn_patterns: FxHashMap<String, Arc<dyn SpawnPattern>>,
    firing_patterns: FxHashMap<String, Arc<dyn FiringPattern>>,
}

impl PatternLibrary {
    /// Load a pattern library from a RON file.
    pub fn load_from_ron(path: &Path) -> Result<PatternLibrary, LibraryError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    /// Parse a pattern library from a RON string.
    pub fn parse_ron(input: &str) -> Result<PatternLibrary, LibraryError> {
        let config: LibraryConfig = ron::from_str(input)?;
        Self::from_config(config)
    }

    /// Resolve every name reference in `config`.
    pub fn from_config(config: LibraryConfig) -> Result<PatternLibrary, LibraryError> {
        let trajectories: FxHashMap<String, TrajectoryRef> = config
            .trajectories
            .iter()
            .map(|(name, t)| (name.clone(), t.build()))
            .collect();

        let mut resolver = Resolver {
            configs: &config.spawn_patterns,
            trajectories: &trajectories,
            built: FxHashMap::default(),
            in_progress: FxHashSet::default(),
        };
        let mut names: Vec<&String> = config.spawn_patterns.keys().collect();
        names.sort();
        for name in names {
            resolver.resolve(name)?;
        }
        let spawn_patterns = resolver.built;

        let firing_patterns: FxHashMap<String, Arc<dyn FiringPattern>> = config
            .firing_patterns
            .into_iter()
            .map(|(name, p)| (name, p.build()))
            .collect();

        debug!(
            "loaded pattern library: {} trajectories, {} spawn patterns, {} firing patterns",
            trajectories.len(),
            spawn_patterns.len(),
            firing_patterns.len()
        );

        Ok(PatternLibrary {
            trajectories,
            spawn_patterns,
            firing_patterns,
        })
    }

    /// Merge another library into this one. Entries from `other` override
    /// entries in `self` with the same name. Composites already resolved
    /// keep the children they were built with.
    pub fn merge(&mut self, other: PatternLibrary) {
        self.trajectories.extend(other.trajectories);
        self.spawn_patterns.extend(other.spawn_patterns);
        self.firing_patterns.extend(other.firing_patterns);
    }

    pub fn trajectory(&self, name: &str) -> Option<&TrajectoryRef> {
        self.trajectories.get(name)
    }

    pub fn spawn_pattern(&self, name: &str) -> Option<&Arc<dyn SpawnPattern>> {
        self.spawn_patterns.get(name)
    }

    pub fn firing_pattern(&self, name: &str) -> Option<&Arc<dyn FiringPattern>> {
        self.firing_patterns.get(name)
    }

    /// Spawn pattern names, sorted.
    pub fn spawn_pattern_names(&self) -> Vec<&str> {
        sorted_keys(&self.spawn_patterns)
    }

    /// Firing pattern names, sorted.
    pub fn firing_pattern_names(&self) -> Vec<&str> {
        sorted_keys(&self.firing_patterns)
    }

    /// Trajectory names, sorted.
    pub fn trajectory_names(&self) -> Vec<&str> {
        sorted_keys(&self.trajectories)
    }

    /// Build every spawn schedule and every volley for combos `0..combos`,
    /// collecting the failures.
    pub fn lint(&self, combos: u32) -> Vec<LintIssue> {
        let mut issues = Vec::new();

        for name in self.spawn_pattern_names() {
            if let Err(error) = collect_events(self.spawn_patterns[name].as_ref()) {
                issues.push(LintIssue {
                    pattern: name.to_string(),
                    combo: None,
                    error,
                });
            }
        }

        for name in self.firing_pattern_names() {
            let pattern = &self.firing_patterns[name];
            for combo in 0..combos {
                if let Err(error) = pattern.volley(combo) {
                    issues.push(LintIssue {
                        pattern: name.to_string(),
                        combo: Some(combo),
                        error,
                    });
                }
            }
        }

        issues
    }
}

fn sorted_keys<V>(map: &FxHashMap<String, V>) -> Vec<&str> {
    let mut names: Vec<&str> = map.keys().map(String::as_str).collect();
    names.sort_unstable();
    names
}

fn euler_degrees(rotation: Vec3) -> Quat {
    Quat::from_euler(
        EulerRot::YXZ,
        rotation.y.to_radians(),
        rotation.x.to_radians(),
        rotation.z.to_radians(),
    )
}

fn periodic(prefabs: &[Repeated<PrefabId>], targets: &[Repeated<TargetKind>]) -> PeriodicPrefabs {
    PeriodicPrefabs {
        prefabs: prefabs.to_vec(),
        targets: targets.to_vec(),
    }
}

struct Resolver<'a> {
    configs: &'a HashMap<String, SpawnPatternConfig>,
    trajectories: &'a FxHashMap<String, TrajectoryRef>,
    built: FxHashMap<String, Arc<dyn SpawnPattern>>,
    in_progress: FxHashSet<String>,
}

impl Resolver<'_> {
    fn resolve(&mut self, name: &str) -> Result<Arc<dyn SpawnPattern>, LibraryError> {
        if let Some(pattern) = self.built.get(name) {
            return Ok(pattern.clone());
        }
        if !self.in_progress.insert(name.to_string()) {
            return Err(LibraryError::CompositeCycle(name.to_string()));
        }

        let configs = self.configs;
        let pattern = self.build(name, &configs[name])?;

        self.in_progress.remove(name);
        self.built.insert(name.to_string(), pattern.clone());
        Ok(pattern)
    }

    fn trajectory(&self, pattern: &str, trajectory: &str) -> Result<TrajectoryRef, LibraryError> {
        self.trajectories
            .get(trajectory)
            .cloned()
            .ok_or_else(|| LibraryError::UnknownTrajectory {
                pattern: pattern.to_string(),
                trajectory: trajectory.to_string(),
            })
    }

    fn build(
        &mut self,
        name: &str,
        config: &SpawnPatternConfig,
    ) -> Result<Arc<dyn SpawnPattern>, LibraryError> {
        let pattern: Arc<dyn SpawnPattern> = match config {
            SpawnPatternConfig::Single {
                prefabs,
                targets,
                delay,
                offset,
                rotation,
                trajectory,
            } => {
                let trajectory = self.trajectory(name, trajectory)?;
                Arc::new(
                    SingleSpawnPattern::new(periodic(prefabs, targets), trajectory)
                        .with_delay(*delay)
                        .with_placement(*offset, euler_degrees(*rotation)),
                )
            }
            SpawnPatternConfig::Linear {
                prefabs,
                targets,
                count,
                time_gap,
                start,
                end,
                rotation,
                trajectory,
            } => Arc::new(
                LinearSpawnPattern::new(
                    periodic(prefabs, targets),
                    *count,
                    *time_gap,
                    *start,
                    *end,
                    self.trajectory(name, trajectory)?,
                )
                .with_rotation(euler_degrees(*rotation)),
            ),
            SpawnPatternConfig::Ring {
                prefabs,
                targets,
                count,
                time_gap,
                center,
                radius,
                start_angle,
                trajectory,
            } => Arc::new(
                RingSpawnPattern::new(
                    periodic(prefabs, targets),
                    *count,
                    *time_gap,
                    *center,
                    *radius,
                    self.trajectory(name, trajectory)?,
                )
                .with_start_angle(*start_angle),
            ),
            SpawnPatternConfig::Burst {
                prefabs,
                targets,
                count,
                trajectory,
            } => Arc::new(BurstSpawnPattern::new(
                periodic(prefabs, targets),
                *count,
                self.trajectory(name, trajectory)?,
            )),
            SpawnPatternConfig::Composite { children } => {
                if children.is_empty() {
                    warn!("composite '{}' has no children", name);
                }
                let mut resolved = Vec::with_capacity(children.len());
                for child in children {
                    if !self.configs.contains_key(&child.pattern) {
                        return Err(LibraryError::UnknownPattern {
                            pattern: name.to_string(),
                            child: child.pattern.clone(),
                        });
                    }
                    resolved.push(CompositeChild {
                        pattern: self.resolve(&child.pattern)?,
                        start_time: child.start_time,
                    });
                }
                Arc::new(CompositeSpawnPattern::from_children(resolved))
            }
        };

        if let Some(prefabs) = prefab_table(config) {
            if !prefabs.is_empty() && prefabs.iter().all(|p| p.repeat == 0) {
                warn!("spawn pattern '{}' repeats every prefab zero times", name);
            }
        }

        Ok(pattern)
    }
}

fn prefab_table(config: &SpawnPatternConfig) -> Option<&[Repeated<PrefabId>]> {
    match config {
        SpawnPatternConfig::Single { prefabs, .. }
        | SpawnPatternConfig::Linear { prefabs, .. }
        | SpawnPatternConfig::Ring { prefabs, .. }
        | SpawnPatternConfig::Burst { prefabs, .. } => Some(prefabs.as_slice()),
        SpawnPatternConfig::Composite { .. } => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SMALL_LIBRARY: &str = r#"
(
    trajectories: {
        "drop": Linear(start: (0.0, 4.0, 0.0), end: (0.0, 0.0, 0.0), duration: 2.0),
    },
    spawn_patterns: {
        "pair": Linear(
            prefabs: [(value: 1, repeat: 1), (value: 2)],
            count: 2,
            time_gap: 1.0,
            start: (-1.0, 0.0, 0.0),
            end: (1.0, 0.0, 0.0),
            trajectory: "drop",
        ),
        "solo": Single(prefabs: [(value: 9)], delay: 0.5, trajectory: "drop"),
        "both": Composite(children: [
            (pattern: "pair", start_time: 1.0),
            (pattern: "solo"),
        ]),
    },
    firing_patterns: {
        "spread": Fan((count: 3, width: 40.0, speed: 5.0)),
    },
)
"#;

    #[test]
    fn parses_and_resolves_names() {
        let library = PatternLibrary::parse_ron(SMALL_LIBRARY).unwrap();
        assert_eq!(library.spawn_pattern_names(), vec!["both", "pair", "solo"]);
        assert_eq!(library.firing_pattern_names(), vec!["spread"]);
        assert_eq!(library.trajectory_names(), vec!["drop"]);

        let both = library.spawn_pattern("both").unwrap();
        let events = collect_events(both.as_ref()).unwrap();
        let times: Vec<f32> = events.iter().map(|e| e.time).collect();
        assert_eq!(times, vec![0.5, 1.0, 2.0]);
        let shared = library.trajectory("drop").unwrap();
        assert!(events.iter().all(|e| Arc::ptr_eq(&e.trajectory, shared)));
    }

    #[test]
    fn shared_children_are_built_once() {
        let input = r#"
(
    trajectories: { "t": Linear(start: (0.0, 0.0, 0.0), end: (1.0, 0.0, 0.0), duration: 1.0) },
    spawn_patterns: {
        "leaf": Single(prefabs: [(value: 1)], trajectory: "t"),
        "a": Composite(children: [(pattern: "leaf")]),
        "b": Composite(children: [(pattern: "leaf", start_time: 2.0)]),
    },
)
"#;
        let library = PatternLibrary::parse_ron(input).unwrap();
        let leaf = library.spawn_pattern("leaf").unwrap();
        // Two composites plus the library itself hold the leaf.
        assert_eq!(Arc::strong_count(leaf), 3);
    }

    #[test]
    fn unknown_trajectory_is_reported() {
        let input = r#"(spawn_patterns: { "x": Single(prefabs: [(value: 1)], trajectory: "nope") })"#;
        let err = PatternLibrary::parse_ron(input).unwrap_err();
        assert!(
            matches!(err, LibraryError::UnknownTrajectory { ref trajectory, .. } if trajectory == "nope")
        );
    }

    #[test]
    fn unknown_child_is_reported() {
        let input = r#"(spawn_patterns: { "x": Composite(children: [(pattern: "ghost")]) })"#;
        let err = PatternLibrary::parse_ron(input).unwrap_err();
        assert!(matches!(err, LibraryError::UnknownPattern { ref child, .. } if child == "ghost"));
    }

    #[test]
    fn cycles_are_rejected() {
        let input = r#"
(
    spawn_patterns: {
        "a": Composite(children: [(pattern: "b")]),
        "b": Composite(children: [(pattern: "a")]),
    },
)
"#;
        let err = PatternLibrary::parse_ron(input).unwrap_err();
        assert!(matches!(err, LibraryError::CompositeCycle(_)));
    }

    #[test]
    fn euler_rotation_is_in_degrees() {
        let q = euler_degrees(Vec3::new(0.0, 90.0, 0.0));
        assert!((q * Vec3::Z).abs_diff_eq(Vec3::X, 1e-5));
    }

    #[test]
    fn merge_overrides_by_name() {
        let mut base = PatternLibrary::parse_ron(SMALL_LIBRARY).unwrap();
        let other = PatternLibrary::parse_ron(
            r#"(firing_patterns: { "spread": Fan((count: 7, width: 10.0, speed: 1.0)) })"#,
        )
        .unwrap();
        base.merge(other);
        assert_eq!(base.firing_pattern("spread").unwrap().projectile_count(0), 7);
        assert!(base.spawn_pattern("pair").is_some());
    }

    #[test]
    fn lint_reports_broken_patterns() {
        let input = r#"
(
    trajectories: { "t": Linear(start: (0.0, 0.0, 0.0), end: (1.0, 0.0, 0.0), duration: 1.0) },
    spawn_patterns: {
        "empty_table": Linear(prefabs: [], count: 3, time_gap: 1.0,
            start: (0.0, 0.0, 0.0), end: (1.0, 0.0, 0.0), trajectory: "t"),
        "fine": Single(prefabs: [(value: 1)], trajectory: "t"),
    },
)
"#;
        let library = PatternLibrary::parse_ron(input).unwrap();
        let issues = library.lint(4);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].pattern, "empty_table");
        assert_eq!(issues[0].combo, None);
    }

    #[test]
    fn lint_reports_non_finite_scatter_bounds() {
        let input = r#"
(
    firing_patterns: {
        "wild": Scatter((count: 2, spread: 10.0, min_speed: 1.0, max_speed: inf)),
        "blurry": Scatter((count: 2, spread: NaN, min_speed: 1.0, max_speed: 2.0)),
        "tame": Scatter((count: 2, spread: 10.0, min_speed: 1.0, max_speed: 2.0)),
    },
)
"#;
        let library = PatternLibrary::parse_ron(input).unwrap();
        let issues = library.lint(1);
        let flagged: Vec<&str> = issues.iter().map(|i| i.pattern.as_str()).collect();
        assert_eq!(flagged, vec!["blurry", "wild"]);
        assert!(issues.iter().all(|i| i.combo == Some(0)
            && matches!(
                i.error,
                PatternError::InvalidParameter {
                    pattern: "scatter",
                    ..
                }
            )));
    }
}
