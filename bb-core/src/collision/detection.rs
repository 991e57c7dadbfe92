//! Swept-segment contact detection.
//!
//! Each simulator step moves the ball along a straight segment from `from`
//! to `to`. Contacts are reported as a fraction along that segment so the
//! caller can interpolate the exact point.

use crate::types::{constants, Obstacle, SurfaceKind, Vec3};

/// What a step segment ran into.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CollisionTarget {
    TargetPlane,
    Ground,
    Obstacle(SurfaceKind),
    /// Edge of the play area
    Bounds,
}

/// Detailed contact information.
#[derive(Debug, Clone, Copy)]
pub struct CollisionInfo {
    pub target: CollisionTarget,
    /// Position along the segment in [0, 1]
    pub fraction: f64,
    pub point: Vec3,
    /// Unit surface normal pointing back toward the ball
    pub normal: Vec3,
}

pub struct CollisionDetector;

impl CollisionDetector {
    /// Crossing of the plane `z = plane_z`, from either side.
    pub fn detect_target_plane(from: &Vec3, to: &Vec3, plane_z: f64) -> Option<CollisionInfo> {
        let d0 = from.z - plane_z;
        let d1 = to.z - plane_z;
        if d0 * d1 > 0.0 || (d0 - d1).abs() < constants::EPSILON {
            return None;
        }

        let fraction = (d0 / (d0 - d1)).clamp(0.0, 1.0);
        let mut point = from.lerp(to, fraction);
        point.z = plane_z;

        Some(CollisionInfo {
            target: CollisionTarget::TargetPlane,
            fraction,
            point,
            normal: Vec3::new(0.0, 0.0, -(d0.signum())),
        })
    }

    /// Downward crossing of the horizontal plane `y = ground_y`.
    pub fn detect_ground(from: &Vec3, to: &Vec3, ground_y: f64) -> Option<CollisionInfo> {
        if to.y > ground_y || from.y < ground_y {
            return None;
        }

        // A ball starting on the ground skims the whole step, so a low
        // re-bounce still carries its horizontal travel.
        let height = from.y - ground_y;
        let fraction = if height <= constants::EPSILON {
            1.0
        } else {
            (height / (from.y - to.y)).clamp(0.0, 1.0)
        };
        let mut point = from.lerp(to, fraction);
        point.y = ground_y;

        Some(CollisionInfo {
            target: CollisionTarget::Ground,
            fraction,
            point,
            normal: Vec3::UP,
        })
    }

    /// Where a segment starting inside the box `[min, max]` leaves it.
    ///
    /// # Arguments
    /// * `from` - Segment start, inside the box
    /// * `to` - Segment end
    /// * `min`, `max` - Box corners
    ///
    /// # Returns
    /// The exit point on the first face crossed, or `None` if `to` is inside.
    pub fn detect_exit(from: &Vec3, to: &Vec3, min: &Vec3, max: &Vec3) -> Option<CollisionInfo> {
        let origin = [from.x, from.y, from.z];
        let end = [to.x, to.y, to.z];
        let lo = [min.x, min.y, min.z];
        let hi = [max.x, max.y, max.z];

        // (fraction, axis, face coordinate, outward sign)
        let mut exit: Option<(f64, usize, f64, f64)> = None;
        for axis in 0..3 {
            let (face, sign) = if end[axis] > hi[axis] {
                (hi[axis], 1.0)
            } else if end[axis] < lo[axis] {
                (lo[axis], -1.0)
            } else {
                continue;
            };
            let delta = end[axis] - origin[axis];
            let fraction = if delta.abs() < constants::EPSILON {
                0.0
            } else {
                ((face - origin[axis]) / delta).clamp(0.0, 1.0)
            };
            if exit.map_or(true, |(f, ..)| fraction < f) {
                exit = Some((fraction, axis, face, sign));
            }
        }

        let (fraction, axis, face, sign) = exit?;
        let mut point = from.lerp(to, fraction);
        let normal = match axis {
            0 => {
                point.x = face;
                Vec3::new(-sign, 0.0, 0.0)
            }
            1 => {
                point.y = face;
                Vec3::new(0.0, -sign, 0.0)
            }
            _ => {
                point.z = face;
                Vec3::new(0.0, 0.0, -sign)
            }
        };

        Some(CollisionInfo {
            target: CollisionTarget::Bounds,
            fraction,
            point,
            normal,
        })
    }

    /// Nearest obstacle face hit by the segment (slab ray test).
    ///
    /// Segments starting inside a box are ignored so a ball that was just
    /// nudged off a face cannot re-trigger on it.
    pub fn detect_obstacle(from: &Vec3, to: &Vec3, obstacles: &[Obstacle]) -> Option<CollisionInfo> {
        let mut nearest: Option<CollisionInfo> = None;

        for obstacle in obstacles {
            if obstacle.contains(from) {
                continue;
            }
            if let Some(hit) = Self::ray_box(from, to, obstacle) {
                if nearest.map_or(true, |n| hit.fraction < n.fraction) {
                    nearest = Some(hit);
                }
            }
        }

        nearest
    }

    fn ray_box(from: &Vec3, to: &Vec3, obstacle: &Obstacle) -> Option<CollisionInfo> {
        let dir = *to - *from;
        let origin = [from.x, from.y, from.z];
        let delta = [dir.x, dir.y, dir.z];
        let lo = [obstacle.min.x, obstacle.min.y, obstacle.min.z];
        let hi = [obstacle.max.x, obstacle.max.y, obstacle.max.z];

        let mut t_near = f64::NEG_INFINITY;
        let mut t_far = f64::INFINITY;
        let mut near_axis = 0;

        for axis in 0..3 {
            if delta[axis].abs() < constants::EPSILON {
                if origin[axis] < lo[axis] || origin[axis] > hi[axis] {
                    return None;
                }
                continue;
            }
            let t1 = (lo[axis] - origin[axis]) / delta[axis];
            let t2 = (hi[axis] - origin[axis]) / delta[axis];
            let (t_enter, t_exit) = if t1 < t2 { (t1, t2) } else { (t2, t1) };
            if t_enter > t_near {
                t_near = t_enter;
                near_axis = axis;
            }
            t_far = t_far.min(t_exit);
        }

        if t_near > t_far || !(0.0..=1.0).contains(&t_near) {
            return None;
        }

        let mut normal = [0.0; 3];
        normal[near_axis] = if delta[near_axis] > 0.0 { -1.0 } else { 1.0 };

        Some(CollisionInfo {
            target: CollisionTarget::Obstacle(obstacle.kind),
            fraction: t_near,
            point: from.lerp(to, t_near),
            normal: Vec3::new(normal[0], normal[1], normal[2]),
        })
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn fence() -> Obstacle {
        Obstacle::new(
            Vec3::new(-10.0, 0.0, 100.0),
            Vec3::new(10.0, 3.0, 101.0),
            SurfaceKind::Wall,
        )
    }

    #[test]
    fn test_target_plane_crossing_interpolates() {
        let from = Vec3::new(0.0, 1.0, 0.5);
        let to = Vec3::new(0.0, 0.8, -0.5);

        let info = CollisionDetector::detect_target_plane(&from, &to, 0.0)
            .expect("segment crosses z=0");

        assert!((info.fraction - 0.5).abs() < 1e-12);
        assert!((info.point.y - 0.9).abs() < 1e-12);
        assert_eq!(info.point.z, 0.0);
    }

    #[test]
    fn test_target_plane_not_reached() {
        let from = Vec3::new(0.0, 1.0, 2.0);
        let to = Vec3::new(0.0, 1.0, 1.0);
        assert!(CollisionDetector::detect_target_plane(&from, &to, 0.0).is_none());
    }

    #[test]
    fn test_ground_contact() {
        let from = Vec3::new(0.0, 0.2, 10.0);
        let to = Vec3::new(0.0, -0.2, 11.0);

        let info = CollisionDetector::detect_ground(&from, &to, 0.0).expect("lands");

        assert_eq!(info.target, CollisionTarget::Ground);
        assert!((info.point.z - 10.5).abs() < 1e-12);
        assert_eq!(info.point.y, 0.0);
    }

    #[test]
    fn test_ground_skim_keeps_horizontal_travel() {
        // Starts on the ground and dips below it within the step
        let from = Vec3::new(0.0, 0.0, 10.0);
        let to = Vec3::new(0.5, -0.001, 10.3);

        let info = CollisionDetector::detect_ground(&from, &to, 0.0).expect("contact");

        assert_eq!(info.fraction, 1.0);
        assert_eq!(info.point, Vec3::new(0.5, 0.0, 10.3));
    }

    #[test]
    fn test_exit_point_lies_on_face() {
        let min = Vec3::new(-160.0, -5.0, -25.0);
        let max = Vec3::new(160.0, 80.0, 160.0);
        let from = Vec3::new(-159.9, 2.0, 50.0);
        let to = Vec3::new(-160.1, 1.0, 50.4);

        let info = CollisionDetector::detect_exit(&from, &to, &min, &max).expect("leaves");

        assert_eq!(info.target, CollisionTarget::Bounds);
        assert!((info.fraction - 0.5).abs() < 1e-9);
        assert_eq!(info.point.x, -160.0);
        assert!((info.point.z - 50.2).abs() < 1e-9);
        assert_eq!(info.normal, Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_exit_takes_first_face_crossed() {
        let min = Vec3::new(0.0, 0.0, 0.0);
        let max = Vec3::new(10.0, 10.0, 10.0);
        // Crosses z=10 at 1/4 of the step, x=10 at 1/2
        let from = Vec3::new(8.0, 5.0, 9.0);
        let to = Vec3::new(12.0, 5.0, 13.0);

        let info = CollisionDetector::detect_exit(&from, &to, &min, &max).expect("leaves");

        assert!((info.fraction - 0.25).abs() < 1e-9);
        assert_eq!(info.point.z, 10.0);
        assert!(CollisionDetector::detect_exit(&from, &from, &min, &max).is_none());
    }

    #[test]
    fn test_rising_ball_does_not_land() {
        let from = Vec3::new(0.0, 0.1, 10.0);
        let to = Vec3::new(0.0, 0.3, 11.0);
        assert!(CollisionDetector::detect_ground(&from, &to, 0.0).is_none());
    }

    #[test]
    fn test_fence_hit_face_normal() {
        let from = Vec3::new(0.0, 1.5, 99.0);
        let to = Vec3::new(0.0, 1.5, 100.5);

        let info = CollisionDetector::detect_obstacle(&from, &to, &[fence()]).expect("hits fence");

        assert_eq!(info.target, CollisionTarget::Obstacle(SurfaceKind::Wall));
        assert!((info.point.z - 100.0).abs() < 1e-9);
        assert_eq!(info.normal, Vec3::new(0.0, 0.0, -1.0));
    }

    #[test]
    fn test_ball_over_fence() {
        let from = Vec3::new(0.0, 5.0, 99.0);
        let to = Vec3::new(0.0, 4.5, 102.0);
        assert!(CollisionDetector::detect_obstacle(&from, &to, &[fence()]).is_none());
    }

    #[test]
    fn test_nearest_obstacle_wins() {
        let near = Obstacle::new(
            Vec3::new(-10.0, 0.0, 50.0),
            Vec3::new(10.0, 3.0, 51.0),
            SurfaceKind::Net,
        );
        let from = Vec3::new(0.0, 1.0, 40.0);
        let to = Vec3::new(0.0, 1.0, 105.0);

        let info = CollisionDetector::detect_obstacle(&from, &to, &[fence(), near])
            .expect("hits something");

        assert_eq!(info.target, CollisionTarget::Obstacle(SurfaceKind::Net));
    }
}
