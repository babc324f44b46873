/// Firing patterns — stateless generators of projectile volleys.
///
/// Directions are expressed in the shooter's local frame: +Z is forward,
/// +Y is up and +X is right. The host rotates the volley into world space.

use glam::{Quat, Vec3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;
use std::fmt;

use crate::core::sequence::{take_exact, unit_fraction, zero_offsets, PatternError, Sequence};

/// One projectile of a volley.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projectile {
    pub origin: Vec3,
    pub velocity: Vec3,
}

/// A generator of projectile origins and velocities for a given combo.
///
/// Both sequences must yield at least `projectile_count(combo)` items and
/// may be infinite. Nothing is cached; every call recomputes.
pub trait FiringPattern: fmt::Debug + Send + Sync {
    fn projectile_count(&self, combo: u32) -> usize;
    fn projectile_origins(&self, combo: u32) -> Sequence<'_, Vec3>;
    fn projectile_velocities(&self, combo: u32) -> Sequence<'_, Vec3>;

    /// Reject authored parameters the generator cannot work with.
    fn validate(&self) -> Result<(), PatternError> {
        Ok(())
    }

    /// Origins and velocities truncated to the declared count and paired.
    fn volley(&self, combo: u32) -> Result<Vec<Projectile>, PatternError> {
        self.validate()?;
        let count = self.projectile_count(combo);
        let origins = take_exact(self.projectile_origins(combo), count, "projectile origin")?;
        let velocities = take_exact(
            self.projectile_velocities(combo),
            count,
            "projectile velocity",
        )?;
        Ok(origins
            .into_iter()
            .zip(velocities)
            .map(|(origin, velocity)| Projectile { origin, velocity })
            .collect())
    }
}

/// Forward direction yawed by `yaw` and pitched up by `pitch` (radians).
fn aim(yaw: f32, pitch: f32) -> Vec3 {
    Quat::from_rotation_y(yaw) * Quat::from_rotation_x(-pitch) * Vec3::Z
}

/// Yaw of sample `index` in a fan of `count` spanning `width` radians,
/// centred on forward.
fn fan_yaw(index: usize, count: usize, width: f32) -> f32 {
    if count == 1 {
        return 0.0;
    }
    (unit_fraction(index, count) - 0.5) * width
}

/// A flat horizontal fan, rolled about forward a little more each combo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FanFiringPattern {
    pub count: usize,
    /// Total fan width in degrees.
    pub width: f32,
    pub speed: f32,
    /// Degrees of roll added per combo.
    #[serde(default)]
    pub roll_per_combo: f32,
}

impl FiringPattern for FanFiringPattern {
    fn projectile_count(&self, _combo: u32) -> usize {
        self.count
    }

    fn projectile_origins(&self, _combo: u32) -> Sequence<'_, Vec3> {
        zero_offsets()
    }

    fn projectile_velocities(&self, combo: u32) -> Sequence<'_, Vec3> {
        let roll = Quat::from_rotation_z((combo as f32 * self.roll_per_combo).to_radians());
        let width = self.width.to_radians();
        let count = self.count;
        let speed = self.speed;
        Box::new((0..count).map(move |i| roll * aim(fan_yaw(i, count, width), 0.0) * speed))
    }
}

/// A cone of projectiles spaced evenly around forward, starting on a ring of
/// `radius` and phased further each combo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RingFiringPattern {
    pub count: usize,
    pub speed: f32,
    #[serde(default)]
    pub radius: f32,
    /// Angle between forward and each projectile, in degrees. 90 is a flat ring.
    pub cone: f32,
    /// Degrees of phase added per combo.
    #[serde(default)]
    pub rotation_per_combo: f32,
}

impl RingFiringPattern {
    fn azimuth(&self, index: usize, combo: u32) -> f32 {
        TAU * index as f32 / self.count.max(1) as f32
            + (combo as f32 * self.rotation_per_combo).to_radians()
    }
}

impl FiringPattern for RingFiringPattern {
    fn projectile_count(&self, _combo: u32) -> usize {
        self.count
    }

    fn projectile_origins(&self, combo: u32) -> Sequence<'_, Vec3> {
        Box::new((0..self.count).map(move |i| {
            let (sin, cos) = self.azimuth(i, combo).sin_cos();
            Vec3::new(cos, sin, 0.0) * self.radius
        }))
    }

    fn projectile_velocities(&self, combo: u32) -> Sequence<'_, Vec3> {
        let (cone_sin, cone_cos) = self.cone.to_radians().sin_cos();
        Box::new((0..self.count).map(move |i| {
            let (sin, cos) = self.azimuth(i, combo).sin_cos();
            Vec3::new(cone_sin * cos, cone_sin * sin, cone_cos) * self.speed
        }))
    }
}

/// Pairs of fans mirrored about the centreline ("cuts"). Each cut is a line
/// of `per_cut` projectiles along one heading with speeds ramping from
/// `min_speed` to `max_speed`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MirroredCutFiringPattern {
    /// Number of mirrored pairs.
    pub cuts: usize,
    pub per_cut: usize,
    /// Degrees between neighbouring cuts.
    pub cut_angle: f32,
    /// Degrees each cut opens further per combo.
    #[serde(default)]
    pub twist_per_combo: f32,
    pub min_speed: f32,
    pub max_speed: f32,
    #[serde(default)]
    pub center_cut: bool,
}

impl MirroredCutFiringPattern {
    /// Headings in emission order: centre first, then each pair right/left.
    fn headings(&self, combo: u32) -> Vec<f32> {
        let twist = combo as f32 * self.twist_per_combo;
        let mut headings = Vec::with_capacity(self.cuts * 2 + 1);
        if self.center_cut {
            headings.push(0.0);
        }
        for k in 0..self.cuts {
            let yaw = ((k + 1) as f32 * self.cut_angle + twist).to_radians();
            headings.push(yaw);
            headings.push(-yaw);
        }
        headings
    }
}

impl FiringPattern for MirroredCutFiringPattern {
    fn projectile_count(&self, _combo: u32) -> usize {
        (2 * self.cuts + usize::from(self.center_cut)) * self.per_cut
    }

    fn projectile_origins(&self, _combo: u32) -> Sequence<'_, Vec3> {
        zero_offsets()
    }

    fn projectile_velocities(&self, combo: u32) -> Sequence<'_, Vec3> {
        let per_cut = self.per_cut;
        Box::new(self.headings(combo).into_iter().flat_map(move |yaw| {
            let dir = aim(yaw, 0.0);
            (0..per_cut).map(move |j| {
                let ramp = unit_fraction(j, per_cut);
                dir * (self.min_speed + (self.max_speed - self.min_speed) * ramp)
            })
        }))
    }
}

/// Stacked fans: level `l` holds `l * dense_factor + 1` projectiles spread
/// over `l * level_spread` degrees and pitched up by `l * level_pitch`.
/// Higher combos unlock more levels, up to `max_levels`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PyramidFiringPattern {
    pub base_levels: usize,
    #[serde(default)]
    pub levels_per_combo: usize,
    pub max_levels: usize,
    pub dense_factor: usize,
    pub level_spread: f32,
    #[serde(default)]
    pub level_pitch: f32,
    pub speed: f32,
}

impl PyramidFiringPattern {
    pub fn levels(&self, combo: u32) -> usize {
        self.levels_per_combo
            .saturating_mul(combo as usize)
            .saturating_add(self.base_levels)
            .min(self.max_levels)
    }

    fn level_size(&self, level: usize) -> usize {
        level * self.dense_factor + 1
    }
}

impl FiringPattern for PyramidFiringPattern {
    fn projectile_count(&self, combo: u32) -> usize {
        let levels = self.levels(combo);
        if levels == 0 {
            return 0;
        }
        levels + self.dense_factor * levels * (levels - 1) / 2
    }

    fn projectile_origins(&self, _combo: u32) -> Sequence<'_, Vec3> {
        zero_offsets()
    }

    fn projectile_velocities(&self, combo: u32) -> Sequence<'_, Vec3> {
        Box::new((0..self.levels(combo)).flat_map(move |level| {
            let size = self.level_size(level);
            let width = (level as f32 * self.level_spread).to_radians();
            let pitch = (level as f32 * self.level_pitch).to_radians();
            (0..size).map(move |i| aim(fan_yaw(i, size, width), pitch) * self.speed)
        }))
    }
}

/// Random spray inside a cone, reproducible per `(seed, combo)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScatterFiringPattern {
    pub count: usize,
    /// Full cone angle in degrees.
    pub spread: f32,
    pub min_speed: f32,
    pub max_speed: f32,
    #[serde(default)]
    pub seed: u64,
}

impl ScatterFiringPattern {
    fn speed_range(&self) -> (f32, f32) {
        if self.min_speed <= self.max_speed {
            (self.min_speed, self.max_speed)
        } else {
            (self.max_speed, self.min_speed)
        }
    }

    fn rng(&self, combo: u32) -> StdRng {
        StdRng::seed_from_u64(
            self.seed
                .wrapping_add((combo as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)),
        )
    }
}

impl FiringPattern for ScatterFiringPattern {
    fn projectile_count(&self, _combo: u32) -> usize {
        self.count
    }

    fn validate(&self) -> Result<(), PatternError> {
        let invalid = |reason: String| PatternError::InvalidParameter {
            pattern: "scatter",
            reason,
        };
        if !self.spread.is_finite() {
            return Err(invalid(format!("spread must be finite, got {}", self.spread)));
        }
        if !self.min_speed.is_finite() || !self.max_speed.is_finite() {
            return Err(invalid(format!(
                "speeds must be finite, got {}..{}",
                self.min_speed, self.max_speed
            )));
        }
        let (low, high) = self.speed_range();
        if !(high - low).is_finite() {
            return Err(invalid(format!("speed range {}..{} overflows", low, high)));
        }
        Ok(())
    }

    fn projectile_origins(&self, _combo: u32) -> Sequence<'_, Vec3> {
        zero_offsets()
    }

    fn projectile_velocities(&self, combo: u32) -> Sequence<'_, Vec3> {
        // Out-of-range bounds would panic inside rand; `volley` reports why.
        if self.validate().is_err() {
            return Box::new(std::iter::empty());
        }
        let mut rng = self.rng(combo);
        let half_spread = (self.spread.abs() * 0.5).to_radians();
        let (low, high) = self.speed_range();
        Box::new((0..self.count).map(move |_| {
            let azimuth = rng.gen_range(0.0..TAU);
            let polar = rng.gen_range(0.0..=half_spread);
            let speed = rng.gen_range(low..=high);
            let (polar_sin, polar_cos) = polar.sin_cos();
            let (sin, cos) = azimuth.sin_cos();
            Vec3::new(polar_sin * cos, polar_sin * sin, polar_cos) * speed
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn assert_counts_agree(pattern: &dyn FiringPattern, combos: std::ops::Range<u32>) {
        for combo in combos {
            let count = pattern.projectile_count(combo);
            let velocities: Vec<Vec3> = pattern.projectile_velocities(combo).take(count + 1).collect();
            assert_eq!(velocities.len(), count, "velocity count, combo {}", combo);
            let origins: Vec<Vec3> = pattern.projectile_origins(combo).take(count).collect();
            assert_eq!(origins.len(), count, "origin count, combo {}", combo);
            assert_eq!(pattern.volley(combo).unwrap().len(), count);
        }
    }

    #[test]
    fn fan_single_projectile_is_centerline() {
        let fan = FanFiringPattern {
            count: 1,
            width: 90.0,
            speed: 4.0,
            roll_per_combo: 30.0,
        };
        for combo in 0..4 {
            let volley = fan.volley(combo).unwrap();
            assert_eq!(volley.len(), 1);
            assert!(volley[0].velocity.is_finite());
            assert!(volley[0].velocity.abs_diff_eq(Vec3::new(0.0, 0.0, 4.0), 1e-5));
            assert_eq!(volley[0].origin, Vec3::ZERO);
        }
    }

    #[test]
    fn fan_spans_its_width() {
        let fan = FanFiringPattern {
            count: 3,
            width: 90.0,
            speed: 1.0,
            roll_per_combo: 0.0,
        };
        let v: Vec<Vec3> = fan.projectile_velocities(0).collect();
        assert_eq!(v.len(), 3);
        let half = std::f32::consts::FRAC_1_SQRT_2;
        assert!(v[0].abs_diff_eq(Vec3::new(-half, 0.0, half), 1e-5), "{:?}", v[0]);
        assert!(v[1].abs_diff_eq(Vec3::Z, 1e-5));
        assert!(v[2].abs_diff_eq(Vec3::new(half, 0.0, half), 1e-5));
    }

    #[test]
    fn fan_rolls_with_combo() {
        let fan = FanFiringPattern {
            count: 2,
            width: 180.0,
            speed: 1.0,
            roll_per_combo: 90.0,
        };
        let v: Vec<Vec3> = fan.projectile_velocities(1).collect();
        // The horizontal fan becomes vertical after a quarter roll.
        assert_approx_eq!(v[0].x, 0.0, 1e-5);
        assert_approx_eq!(v[0].y.abs(), 1.0, 1e-5);
        assert_counts_agree(&fan, 0..5);
    }

    #[test]
    fn ring_is_balanced_and_offset() {
        let ring = RingFiringPattern {
            count: 6,
            speed: 2.0,
            radius: 0.5,
            cone: 90.0,
            rotation_per_combo: 15.0,
        };
        for combo in 0..3 {
            let volley = ring.volley(combo).unwrap();
            let sum: Vec3 = volley.iter().map(|p| p.velocity).sum();
            assert!(sum.abs_diff_eq(Vec3::ZERO, 1e-4), "{:?}", sum);
            for p in &volley {
                assert_approx_eq!(p.origin.length(), 0.5, 1e-5);
                assert_approx_eq!(p.velocity.length(), 2.0, 1e-5);
                assert_approx_eq!(p.velocity.normalize().dot(p.origin.normalize()), 1.0, 1e-5);
            }
        }
        assert_counts_agree(&ring, 0..4);
    }

    #[test]
    fn ring_phase_advances_per_combo() {
        let ring = RingFiringPattern {
            count: 4,
            speed: 1.0,
            radius: 1.0,
            cone: 90.0,
            rotation_per_combo: 45.0,
        };
        let first = ring.projectile_origins(1).next().unwrap();
        let half = std::f32::consts::FRAC_1_SQRT_2;
        assert!(first.abs_diff_eq(Vec3::new(half, half, 0.0), 1e-5));
    }

    #[test]
    fn mirrored_cuts_are_symmetric() {
        let cuts = MirroredCutFiringPattern {
            cuts: 2,
            per_cut: 3,
            cut_angle: 20.0,
            twist_per_combo: 5.0,
            min_speed: 2.0,
            max_speed: 4.0,
            center_cut: true,
        };
        assert_eq!(cuts.projectile_count(0), 15);
        for combo in 0..4 {
            let v: Vec<Vec3> = cuts.projectile_velocities(combo).collect();
            let lateral: f32 = v.iter().map(|v| v.x).sum();
            assert_approx_eq!(lateral, 0.0, 1e-4);
        }
        let v: Vec<Vec3> = cuts.projectile_velocities(0).collect();
        assert_approx_eq!(v[0].length(), 2.0, 1e-5);
        assert_approx_eq!(v[1].length(), 3.0, 1e-5);
        assert_approx_eq!(v[2].length(), 4.0, 1e-5);
        assert_counts_agree(&cuts, 0..6);
    }

    #[test]
    fn mirrored_single_per_cut_uses_min_speed() {
        let cuts = MirroredCutFiringPattern {
            cuts: 1,
            per_cut: 1,
            cut_angle: 30.0,
            twist_per_combo: 0.0,
            min_speed: 3.0,
            max_speed: 9.0,
            center_cut: false,
        };
        let v: Vec<Vec3> = cuts.projectile_velocities(0).collect();
        assert_eq!(v.len(), 2);
        assert!(v.iter().all(|v| (v.length() - 3.0).abs() < 1e-5));
        assert_approx_eq!(v[0].x, -v[1].x, 1e-6);
    }

    #[test]
    fn pyramid_count_matches_levels() {
        let pyramid = PyramidFiringPattern {
            base_levels: 2,
            levels_per_combo: 1,
            max_levels: 5,
            dense_factor: 2,
            level_spread: 15.0,
            level_pitch: 5.0,
            speed: 6.0,
        };
        // Levels 0..2 hold 1 + 3 projectiles.
        assert_eq!(pyramid.projectile_count(0), 4);
        // Levels 0..3 hold 1 + 3 + 5.
        assert_eq!(pyramid.projectile_count(1), 9);
        assert_eq!(pyramid.levels(10), 5);
        assert_eq!(pyramid.projectile_count(10), 25);
        assert_counts_agree(&pyramid, 0..8);
    }

    #[test]
    fn pyramid_apex_is_forward() {
        let pyramid = PyramidFiringPattern {
            base_levels: 3,
            levels_per_combo: 0,
            max_levels: 3,
            dense_factor: 0,
            level_spread: 10.0,
            level_pitch: 10.0,
            speed: 1.0,
        };
        let v: Vec<Vec3> = pyramid.projectile_velocities(0).collect();
        assert_eq!(v.len(), 3);
        assert!(v[0].abs_diff_eq(Vec3::Z, 1e-5));
        // Single-projectile levels stay centred but climb.
        assert_approx_eq!(v[2].x, 0.0, 1e-6);
        assert!(v[2].y > v[1].y && v[1].y > 0.0);
    }

    #[test]
    fn pyramid_with_no_levels_is_empty() {
        let pyramid = PyramidFiringPattern {
            base_levels: 0,
            levels_per_combo: 0,
            max_levels: 4,
            dense_factor: 3,
            level_spread: 10.0,
            level_pitch: 0.0,
            speed: 1.0,
        };
        assert_eq!(pyramid.projectile_count(0), 0);
        assert!(pyramid.volley(0).unwrap().is_empty());
    }

    #[test]
    fn scatter_is_deterministic_per_combo() {
        let scatter = ScatterFiringPattern {
            count: 8,
            spread: 30.0,
            min_speed: 2.0,
            max_speed: 3.0,
            seed: 42,
        };
        let a = scatter.volley(3).unwrap();
        let b = scatter.volley(3).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, scatter.volley(4).unwrap());
        for p in &a {
            let speed = p.velocity.length();
            assert!((2.0 - 1e-4..=3.0 + 1e-4).contains(&speed));
            let angle = p.velocity.normalize().dot(Vec3::Z).clamp(-1.0, 1.0).acos();
            assert!(angle <= 15f32.to_radians() + 1e-4);
        }
        assert_counts_agree(&scatter, 0..4);
    }

    #[test]
    fn scatter_rejects_unusable_bounds() {
        let base = ScatterFiringPattern {
            count: 2,
            spread: 10.0,
            min_speed: 1.0,
            max_speed: 2.0,
            seed: 0,
        };
        let broken = [
            ScatterFiringPattern {
                max_speed: f32::INFINITY,
                ..base.clone()
            },
            ScatterFiringPattern {
                spread: f32::NAN,
                ..base.clone()
            },
            ScatterFiringPattern {
                min_speed: -3.0e38,
                max_speed: 3.0e38,
                ..base.clone()
            },
        ];
        for scatter in &broken {
            assert!(matches!(
                scatter.volley(0),
                Err(PatternError::InvalidParameter {
                    pattern: "scatter",
                    ..
                })
            ));
            assert_eq!(scatter.projectile_velocities(0).count(), 0);
        }
        assert_eq!(base.volley(0).unwrap().len(), 2);
    }

    #[derive(Debug)]
    struct Miscounted;

    impl FiringPattern for Miscounted {
        fn projectile_count(&self, _combo: u32) -> usize {
            3
        }

        fn projectile_origins(&self, _combo: u32) -> Sequence<'_, Vec3> {
            zero_offsets()
        }

        fn projectile_velocities(&self, _combo: u32) -> Sequence<'_, Vec3> {
            Box::new(std::iter::repeat(Vec3::Z).take(2))
        }
    }

    #[test]
    fn short_velocity_sequence_fails_loudly() {
        assert_eq!(
            Miscounted.volley(0).unwrap_err(),
            PatternError::SequenceExhausted {
                sequence: "projectile velocity",
                expected: 3,
                produced: 2,
            }
        );
    }
}
