//! The camera operations: orbit about the pivot, pan, dolly, orthographic zoom, and field of view
//! zoom.
//!
//! Each operation reads the camera fresh, writes the new pose or projection in place, and returns
//! whether anything changed. None of them keep state between calls.

use bevy_log::prelude::*;
use bevy_math::{Vec2, Vec3};

use super::{
    geometry::{clamp_distance, intersect_ray_with_plane, rotate_around, turntable_rotation},
    zoom::{ZoomLimits, ZoomMode},
};
use crate::camera::{Projection, ViewCamera};

/// Orbit the camera about `pivot` by a screen space `delta` in pixels. Horizontal motion yaws about
/// `up`, vertical motion pitches about the camera's right axis. The distance to the pivot is
/// unchanged.
pub fn rotate<C: ViewCamera + ?Sized>(
    camera: &mut C,
    pivot: Vec3,
    up: Vec3,
    rotate_speed: f32,
    delta: Vec2,
) -> bool {
    if delta == Vec2::ZERO || !delta.is_finite() {
        return false;
    }
    let transform = camera.transform_mut();
    let rotation = turntable_rotation(
        transform.rotation,
        up,
        -delta.x * rotate_speed,
        -delta.y * rotate_speed,
    );
    rotate_around(transform, pivot, rotation);
    camera.transform_changed();
    true
}

/// World units moved per pixel of pan input.
pub fn pan_world_per_pixel<C: ViewCamera + ?Sized>(
    camera: &C,
    pivot: Vec3,
    pan_speed: f32,
    zoom_mode: ZoomMode,
) -> f32 {
    let distance = camera.transform().translation.distance(pivot);
    match camera.projection() {
        Projection::Orthographic(ortho) => pan_speed / ortho.zoom,
        // Follow the frustum height so apparent pan speed is independent of the field of view.
        Projection::Perspective(perspective) if zoom_mode.uses_fov() => {
            2.0 * distance * (perspective.fov_radians() * 0.5).tan() * pan_speed
        }
        Projection::Perspective(_) => distance * pan_speed,
    }
}

/// Translate the camera parallel to its view plane by a screen space `delta` in pixels. The
/// orientation and the pivot are unchanged.
pub fn pan<C: ViewCamera + ?Sized>(
    camera: &mut C,
    pivot: Vec3,
    pan_speed: f32,
    zoom_mode: ZoomMode,
    delta: Vec2,
) -> bool {
    if delta == Vec2::ZERO || !delta.is_finite() {
        return false;
    }
    let world_per_pixel = pan_world_per_pixel(camera, pivot, pan_speed, zoom_mode);
    if !world_per_pixel.is_finite() {
        error_once!("Cannot pan a camera with a non-finite view size");
        return false;
    }
    let transform = camera.transform_mut();
    let movement = (transform.right().as_vec3() * -delta.x + transform.up().as_vec3() * delta.y)
        * world_per_pixel;
    transform.translation += movement;
    camera.transform_changed();
    true
}

/// Move a perspective camera `step` world units forward, keeping the point under `anchor` (in
/// normalized device coordinates) fixed on screen, then clamp the distance to the pivot.
///
/// The anchored point is found on the plane through the pivot facing the camera. If the anchor ray
/// misses that plane the camera moves straight along the anchor ray instead. Orthographic cameras
/// are left untouched.
pub fn dolly<C: ViewCamera + ?Sized>(
    camera: &mut C,
    pivot: Vec3,
    step: f32,
    anchor: Vec2,
    limits: &ZoomLimits,
) -> bool {
    if !matches!(camera.projection(), Projection::Perspective(_))
        || step == 0.0
        || !step.is_finite()
    {
        return false;
    }

    let forward = camera.forward();
    let position = camera.transform().translation;
    let ray = camera.viewport_ray(anchor);
    let before = ray.and_then(|ray| intersect_ray_with_plane(ray, pivot, forward));

    let naive = position + forward * step;
    camera.transform_mut().translation = naive;
    camera.transform_changed();
    let after = camera
        .viewport_ray(anchor)
        .and_then(|ray| intersect_ray_with_plane(ray, pivot, forward));

    let moved = match (before, after) {
        (Some(before), Some(after)) => naive + (before - after),
        _ => {
            debug!("Dolly anchor missed the pivot plane, moving along the anchor ray");
            let direction = ray.map_or(forward, |ray| ray.direction.as_vec3());
            position + direction * step
        }
    };

    camera.transform_mut().translation =
        clamp_distance(moved, pivot, limits.min_distance, limits.max_distance);
    camera.transform_changed();
    true
}

/// Multiply the zoom of an orthographic camera by `factor`, clamped to the zoom limits, and shift
/// the camera so the point under `anchor` stays fixed on screen. Perspective cameras are left
/// untouched.
pub fn zoom_orthographic<C: ViewCamera + ?Sized>(
    camera: &mut C,
    factor: f32,
    anchor: Vec2,
    limits: &ZoomLimits,
) -> bool {
    let Projection::Orthographic(ortho) = camera.projection() else {
        return false;
    };
    let zoom = (ortho.zoom * factor).clamp(limits.min_zoom, limits.max_zoom.max(limits.min_zoom));
    if zoom == ortho.zoom || !zoom.is_finite() || zoom <= 0.0 {
        return false;
    }

    let before = camera.viewport_ray(anchor).map(|ray| ray.origin);
    if let Projection::Orthographic(ortho) = camera.projection_mut() {
        ortho.zoom = zoom;
    }
    camera.projection_changed();
    let after = camera.viewport_ray(anchor).map(|ray| ray.origin);

    if let (Some(before), Some(after)) = (before, after) {
        camera.transform_mut().translation += before - after;
        camera.transform_changed();
    }
    true
}

/// Divide the field of view of a perspective camera by `factor`, clamped to
/// `limits.min_fov..=max_fov`, and shift the camera parallel to the pivot plane so the point under
/// `anchor` stays fixed on screen.
///
/// `max_fov` is usually [`ZoomLimits::max_fov`], but is lowered to the base field of view while
/// auto zoom widens back out. Orthographic cameras are left untouched.
pub fn zoom_fov<C: ViewCamera + ?Sized>(
    camera: &mut C,
    pivot: Vec3,
    factor: f32,
    max_fov: f32,
    anchor: Vec2,
    limits: &ZoomLimits,
) -> bool {
    let Projection::Perspective(perspective) = camera.projection() else {
        return false;
    };
    let fov = (perspective.fov / factor).clamp(limits.min_fov, max_fov.max(limits.min_fov));
    if fov == perspective.fov || !fov.is_finite() {
        return false;
    }

    let forward = camera.forward();
    let before = camera
        .viewport_ray(anchor)
        .and_then(|ray| intersect_ray_with_plane(ray, pivot, forward));
    if let Projection::Perspective(perspective) = camera.projection_mut() {
        perspective.fov = fov;
    }
    camera.projection_changed();
    let after = camera
        .viewport_ray(anchor)
        .and_then(|ray| intersect_ray_with_plane(ray, pivot, forward));

    match (before, after) {
        (Some(before), Some(after)) => {
            camera.transform_mut().translation += before - after;
            camera.transform_changed();
        }
        _ => debug!("Field of view anchor missed the pivot plane, skipping anchor correction"),
    }
    true
}
