//! Stateless vector and quaternion helpers shared by the camera operations.

use bevy_math::{Quat, Ray3d, Vec3};
use bevy_transform::prelude::*;

/// Rays whose direction is closer than this to parallel with a plane do not intersect it.
pub const PARALLEL_EPSILON: f32 = 1e-6;

/// Intersect a ray with the plane through `plane_point` with normal `plane_normal`.
///
/// Returns `None` when the ray runs parallel to the plane, or when the plane lies behind the ray
/// origin.
pub fn intersect_ray_with_plane(ray: Ray3d, plane_point: Vec3, plane_normal: Vec3) -> Option<Vec3> {
    let direction = ray.direction.as_vec3();
    let denominator = plane_normal.dot(direction);
    if denominator.abs() < PARALLEL_EPSILON {
        return None;
    }
    let t = plane_normal.dot(plane_point - ray.origin) / denominator;
    if t < 0.0 || !t.is_finite() {
        return None;
    }
    Some(ray.origin + direction * t)
}

/// Turntable orbit rotation: yaw about the world `up` axis, then pitch about the camera's right
/// axis *after* the yaw has been applied to `orientation`.
///
/// Returns the combined world space rotation, `pitch * yaw`, to pre-multiply onto the camera.
pub fn turntable_rotation(orientation: Quat, up: Vec3, yaw_angle: f32, pitch_angle: f32) -> Quat {
    let yaw = Quat::from_axis_angle(up.normalize_or(Vec3::Y), yaw_angle);
    let right = (yaw * orientation) * Vec3::X;
    let pitch = Quat::from_axis_angle(right.normalize_or(Vec3::X), pitch_angle);
    pitch * yaw
}

/// Rotates a transform around a point, renormalizing the resulting orientation.
pub fn rotate_around(transform: &mut Transform, point: Vec3, rotation: Quat) {
    transform.translation = point + rotation * (transform.translation - point);
    transform.rotation = (rotation * transform.rotation).normalize();
}

/// Rescale the offset from `pivot` to `position` so its length lies within `min..=max`, keeping
/// its direction.
pub fn clamp_distance(position: Vec3, pivot: Vec3, min: f32, max: f32) -> Vec3 {
    let offset = position - pivot;
    let distance = offset.length();
    let clamped = distance.clamp(min, max.max(min));
    if distance <= f32::EPSILON || clamped == distance {
        return position;
    }
    pivot + offset * (clamped / distance)
}

#[cfg(test)]
mod tests {
    use std::f32::consts::FRAC_PI_2;

    use approx::assert_relative_eq;
    use bevy_math::Dir3;

    use super::*;

    fn ray(origin: Vec3, direction: Vec3) -> Ray3d {
        Ray3d {
            origin,
            direction: Dir3::new(direction).unwrap(),
        }
    }

    #[test]
    fn ray_hits_plane_in_front() {
        let hit = intersect_ray_with_plane(
            ray(Vec3::new(1.0, 2.0, 10.0), Vec3::NEG_Z),
            Vec3::ZERO,
            Vec3::Z,
        );
        assert_eq!(hit, Some(Vec3::new(1.0, 2.0, 0.0)));
    }

    #[test]
    fn parallel_ray_misses() {
        let hit = intersect_ray_with_plane(ray(Vec3::Z, Vec3::X), Vec3::ZERO, Vec3::Z);
        assert_eq!(hit, None);
    }

    #[test]
    fn plane_behind_origin_misses() {
        let hit = intersect_ray_with_plane(ray(Vec3::Z, Vec3::Z), Vec3::ZERO, Vec3::Z);
        assert_eq!(hit, None);
    }

    #[test]
    fn yaw_happens_before_pitch() {
        // Looking down -Z; a quarter yaw turns the camera to look down -X, so the pitch axis must
        // be the yawed right vector (-Z), not the original +X.
        let rotation = turntable_rotation(Quat::IDENTITY, Vec3::Y, FRAC_PI_2, 0.1);
        let right = rotation * Vec3::X;
        assert!(right.abs_diff_eq(Vec3::NEG_Z, 1e-5), "{right}");
        let up = rotation * Vec3::Y;
        assert_relative_eq!(up.dot(Vec3::Y), 0.1f32.cos(), epsilon = 1e-5);
    }

    #[test]
    fn rotating_around_keeps_distance() {
        let mut transform = Transform::from_xyz(0.0, 3.0, 4.0);
        let pivot = Vec3::new(0.0, 3.0, 0.0);
        rotate_around(&mut transform, pivot, Quat::from_rotation_y(1.3));
        assert_relative_eq!(transform.translation.distance(pivot), 4.0, epsilon = 1e-5);
    }

    #[test]
    fn distance_clamp_rescales_offset() {
        let pivot = Vec3::new(1.0, 1.0, 1.0);
        let clamped = clamp_distance(pivot + Vec3::new(0.0, 0.0, 0.5), pivot, 2.0, 10.0);
        assert!(clamped.abs_diff_eq(pivot + Vec3::new(0.0, 0.0, 2.0), 1e-6));
        let clamped = clamp_distance(pivot + Vec3::new(30.0, 40.0, 0.0), pivot, 2.0, 10.0);
        assert!(clamped.abs_diff_eq(pivot + Vec3::new(6.0, 8.0, 0.0), 1e-5));
        let untouched = pivot + Vec3::new(0.0, 5.0, 0.0);
        assert_eq!(clamp_distance(untouched, pivot, 2.0, 10.0), untouched);
    }
}
