//! Ballpark layout: base positions, fence, backstop and play area.
//!
//! ```text
//!                 +Z (center field)
//!                  ▲
//!                  │      fence (fence_distance from home)
//!                 2B
//!               ╱    ╲
//!            3B        1B  ──▶ +X
//!               ╲    ╱
//!                 HP  (origin)
//!             ═══════════ backstop net
//! ```

use serde::{Deserialize, Serialize};

use crate::types::{Obstacle, SurfaceKind, Vec3};

/// Distance between consecutive bases (90 ft)
pub const BASE_DISTANCE: f64 = 27.432;

/// Distance from home plate to the pitcher's rubber (60.5 ft)
pub const PITCHING_DISTANCE: f64 = 18.44;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldGeometry {
    pub home: Vec3,
    pub first: Vec3,
    pub second: Vec3,
    pub third: Vec3,
    pub mound: Vec3,
    /// Horizontal distance from home beyond which the ball lands in the stands
    pub fence_distance: f64,
    /// Balls landing closer than this to home are infield plays
    pub infield_radius: f64,
    /// Half-angle of fair territory, measured from the +Z axis (degrees)
    pub fair_angle_deg: f64,
    /// Landings with z below this line come down on the backstop netting
    pub backstop_z: f64,
    /// Play area; a ball leaving it ends the simulation
    pub bounds_min: Vec3,
    pub bounds_max: Vec3,
    pub obstacles: Vec<Obstacle>,
}

impl FieldGeometry {
    pub fn standard() -> Self {
        let half = BASE_DISTANCE / std::f64::consts::SQRT_2;
        let fence_distance = 110.0;
        Self {
            home: Vec3::ZERO,
            first: Vec3::new(half, 0.0, half),
            second: Vec3::new(0.0, 0.0, 2.0 * half),
            third: Vec3::new(-half, 0.0, half),
            mound: Vec3::new(0.0, 0.0, PITCHING_DISTANCE),
            fence_distance,
            infield_radius: 29.0,
            fair_angle_deg: 45.0,
            backstop_z: -18.0,
            bounds_min: Vec3::new(-160.0, -5.0, -25.0),
            bounds_max: Vec3::new(160.0, 80.0, 160.0),
            obstacles: vec![
                Obstacle::new(
                    Vec3::new(-30.0, 0.0, -19.0),
                    Vec3::new(30.0, 12.0, -18.0),
                    SurfaceKind::Net,
                ),
                Obstacle::new(
                    Vec3::new(-35.0, 0.0, fence_distance),
                    Vec3::new(35.0, 3.0, fence_distance + 1.0),
                    SurfaceKind::Wall,
                ),
            ],
        }
    }

    /// Surface the ball lands on at a ground-level point.
    pub fn surface_at(&self, point: &Vec3) -> SurfaceKind {
        if point.z < self.backstop_z {
            SurfaceKind::Net
        } else if point.horizontal_distance(&self.home) > self.fence_distance {
            SurfaceKind::Stands
        } else {
            SurfaceKind::Ground
        }
    }

    pub fn is_infield(&self, point: &Vec3) -> bool {
        point.horizontal_distance(&self.home) <= self.infield_radius
    }

    pub fn in_bounds(&self, point: &Vec3) -> bool {
        point.x >= self.bounds_min.x
            && point.x <= self.bounds_max.x
            && point.y >= self.bounds_min.y
            && point.y <= self.bounds_max.y
            && point.z >= self.bounds_min.z
            && point.z <= self.bounds_max.z
    }

    /// Horizontal spray angle of `point` seen from `origin`, in degrees.
    /// Zero is straight to center field, positive toward first base.
    pub fn spray_angle_deg(origin: &Vec3, point: &Vec3) -> f64 {
        let d = *point - *origin;
        d.x.atan2(d.z).to_degrees()
    }

    pub fn is_fair_direction(&self, origin: &Vec3, point: &Vec3) -> bool {
        let d = *point - *origin;
        d.z >= 0.0 && Self::spray_angle_deg(origin, point).abs() <= self.fair_angle_deg
    }
}

impl Default for FieldGeometry {
    fn default() -> Self {
        Self::standard()
    }
}
