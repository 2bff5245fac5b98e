//! The camera collaborator moved by the controller: a [`Transform`] for its pose, and a
//! [`Projection`] describing how view space maps onto the screen.
//!
//! Hosts with their own camera type implement [`ViewCamera`] for it. [`Camera`] is a ready-made
//! implementation for hosts that only need to hand matrices to a renderer.

use bevy_math::{Dir3, Mat4, Ray3d, Rect, Vec2, Vec3};
use bevy_reflect::prelude::*;
use bevy_transform::prelude::*;

/// A camera that can be driven by a [`PivotCam`](crate::controller::component::PivotCam).
///
/// The controller never caches anything read through this trait across events, so a host may
/// freely move the camera between calls.
pub trait ViewCamera {
    /// The camera pose. The rotation must stay unit length.
    fn transform(&self) -> &Transform;
    /// Mutable access to the camera pose.
    fn transform_mut(&mut self) -> &mut Transform;
    /// The current projection.
    fn projection(&self) -> &Projection;
    /// Mutable access to the projection, used to change the field of view or orthographic zoom.
    fn projection_mut(&mut self) -> &mut Projection;

    /// Called after the controller wrote a new pose, before it casts any further rays. Implement
    /// this to refresh cached world matrices.
    fn transform_changed(&mut self) {}

    /// Called after the controller changed the projection, before it casts any further rays.
    /// Implement this to refresh cached projection matrices.
    fn projection_changed(&mut self) {}

    /// The direction the camera is looking in, in world space.
    fn forward(&self) -> Vec3 {
        self.transform().forward().as_vec3()
    }

    /// Cast a world space ray through a point on the viewport, given in normalized device
    /// coordinates (x right, y up, both in `-1..=1`).
    ///
    /// Returns `None` if the projection or pose is malformed.
    fn viewport_ray(&self, ndc: Vec2) -> Option<Ray3d> {
        let (origin, direction) = self.projection().view_ray(ndc)?;
        let transform = self.transform();
        let origin = transform.translation + transform.rotation * origin;
        let direction = Dir3::new(transform.rotation * direction).ok()?;
        origin.is_finite().then_some(Ray3d { origin, direction })
    }
}

/// How view space is projected onto the screen.
#[derive(Debug, Clone, PartialEq, Reflect)]
pub enum Projection {
    /// A perspective projection, moved with dolly and field of view zoom.
    Perspective(PerspectiveProjection),
    /// An orthographic projection, zoomed by scaling its visible area.
    Orthographic(OrthographicProjection),
}

impl Default for Projection {
    fn default() -> Self {
        Self::Perspective(PerspectiveProjection::default())
    }
}

impl Projection {
    /// The matrix mapping view space to clip space, right handed with a `0..=1` depth range.
    pub fn clip_from_view(&self) -> Mat4 {
        match self {
            Projection::Perspective(perspective) => perspective.clip_from_view(),
            Projection::Orthographic(ortho) => ortho.clip_from_view(),
        }
    }

    /// The origin and (unnormalized) direction of the view space ray through `ndc`.
    pub fn view_ray(&self, ndc: Vec2) -> Option<(Vec3, Vec3)> {
        match self {
            Projection::Perspective(perspective) => perspective.view_ray(ndc),
            Projection::Orthographic(ortho) => ortho.view_ray(ndc),
        }
    }
}

/// A perspective projection. The field of view is vertical and measured in degrees.
#[derive(Debug, Clone, PartialEq, Reflect)]
pub struct PerspectiveProjection {
    /// Vertical field of view in degrees.
    pub fov: f32,
    /// Width divided by height of the viewport.
    pub aspect_ratio: f32,
    /// Distance to the near clipping plane.
    pub near: f32,
    /// Distance to the far clipping plane.
    pub far: f32,
}

impl Default for PerspectiveProjection {
    fn default() -> Self {
        Self {
            fov: 50.0,
            aspect_ratio: 1.0,
            near: 0.1,
            far: 2000.0,
        }
    }
}

impl PerspectiveProjection {
    /// Vertical field of view in radians.
    pub fn fov_radians(&self) -> f32 {
        self.fov.to_radians()
    }

    /// See [`Projection::clip_from_view`].
    pub fn clip_from_view(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_radians(), self.aspect_ratio, self.near, self.far)
    }

    fn view_ray(&self, ndc: Vec2) -> Option<(Vec3, Vec3)> {
        let half_height = (self.fov_radians() * 0.5).tan();
        let direction = Vec3::new(
            ndc.x * half_height * self.aspect_ratio,
            ndc.y * half_height,
            -1.0,
        );
        direction.is_finite().then_some((Vec3::ZERO, direction))
    }
}

/// An orthographic projection. `area` is the visible region of the view plane at a zoom of `1.0`;
/// larger zoom values show a proportionally smaller region around its center.
#[derive(Debug, Clone, PartialEq, Reflect)]
pub struct OrthographicProjection {
    /// Left, bottom (`min`) and right, top (`max`) extents of the frustum at unit zoom.
    pub area: Rect,
    /// Magnification of the frustum.
    pub zoom: f32,
    /// Distance to the near clipping plane.
    pub near: f32,
    /// Distance to the far clipping plane.
    pub far: f32,
}

impl Default for OrthographicProjection {
    fn default() -> Self {
        Self {
            area: Rect::new(-1.0, -1.0, 1.0, 1.0),
            zoom: 1.0,
            near: 0.1,
            far: 2000.0,
        }
    }
}

impl OrthographicProjection {
    /// The region of the view plane currently on screen, after applying `zoom`.
    pub fn visible_area(&self) -> Rect {
        let center = self.area.center();
        let half_size = self.area.half_size() / self.zoom;
        Rect::from_center_half_size(center, half_size)
    }

    /// See [`Projection::clip_from_view`].
    pub fn clip_from_view(&self) -> Mat4 {
        let visible = self.visible_area();
        Mat4::orthographic_rh(
            visible.min.x,
            visible.max.x,
            visible.min.y,
            visible.max.y,
            self.near,
            self.far,
        )
    }

    fn view_ray(&self, ndc: Vec2) -> Option<(Vec3, Vec3)> {
        if self.zoom <= 0.0 || !self.zoom.is_finite() {
            return None;
        }
        let visible = self.visible_area();
        let origin = (visible.center() + ndc * visible.half_size()).extend(0.0);
        origin.is_finite().then_some((origin, Vec3::NEG_Z))
    }
}

/// A plain camera: a pose and a projection, with no cached matrices.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Camera {
    /// Position and orientation.
    pub transform: Transform,
    /// Perspective or orthographic projection.
    pub projection: Projection,
}

impl Camera {
    /// A perspective camera at the origin looking down `-Z`.
    pub fn perspective(fov_degrees: f32, aspect_ratio: f32) -> Self {
        Self {
            transform: Transform::IDENTITY,
            projection: Projection::Perspective(PerspectiveProjection {
                fov: fov_degrees,
                aspect_ratio,
                ..Default::default()
            }),
        }
    }

    /// An orthographic camera at the origin looking down `-Z`, showing `area` at unit zoom.
    pub fn orthographic(area: Rect) -> Self {
        Self {
            transform: Transform::IDENTITY,
            projection: Projection::Orthographic(OrthographicProjection {
                area,
                ..Default::default()
            }),
        }
    }

    /// Replace the pose of this camera.
    pub fn with_transform(self, transform: Transform) -> Self {
        Self { transform, ..self }
    }

    /// The combined clip-from-world matrix, for handing to a renderer.
    pub fn clip_from_world(&self) -> Mat4 {
        self.projection.clip_from_view() * self.transform.compute_matrix().inverse()
    }
}

impl ViewCamera for Camera {
    fn transform(&self) -> &Transform {
        &self.transform
    }

    fn transform_mut(&mut self) -> &mut Transform {
        &mut self.transform
    }

    fn projection(&self) -> &Projection {
        &self.projection
    }

    fn projection_mut(&mut self) -> &mut Projection {
        &mut self.projection
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn looking_at_origin(camera: Camera) -> Camera {
        camera.with_transform(Transform::from_xyz(3.0, 4.0, 12.0).looking_at(Vec3::ZERO, Vec3::Y))
    }

    #[test]
    fn center_ray_follows_forward() {
        for camera in [
            looking_at_origin(Camera::perspective(60.0, 1.5)),
            looking_at_origin(Camera::orthographic(Rect::new(-4.0, -3.0, 4.0, 3.0))),
        ] {
            let ray = camera.viewport_ray(Vec2::ZERO).unwrap();
            assert!(ray.origin.abs_diff_eq(camera.transform.translation, 1e-4));
            assert!(ray.direction.as_vec3().abs_diff_eq(camera.forward(), 1e-5));
        }
    }

    #[test]
    fn rays_reproject_to_their_ndc() {
        let projections = [
            Projection::Perspective(PerspectiveProjection {
                fov: 40.0,
                aspect_ratio: 16.0 / 9.0,
                ..Default::default()
            }),
            Projection::Orthographic(OrthographicProjection {
                area: Rect::new(-8.0, -5.0, 8.0, 5.0),
                zoom: 2.5,
                ..Default::default()
            }),
        ];
        for projection in projections {
            for ndc in [Vec2::new(0.5, -0.25), Vec2::new(-0.9, 0.8), Vec2::ZERO] {
                let (origin, direction) = projection.view_ray(ndc).unwrap();
                let point = origin + direction.normalize() * 10.0;
                let clip = projection.clip_from_view().project_point3(point);
                assert!(clip.truncate().abs_diff_eq(ndc, 1e-4), "{clip} vs {ndc}");
            }
        }
    }

    #[test]
    fn orthographic_zoom_shrinks_visible_area() {
        let mut ortho = OrthographicProjection {
            area: Rect::new(-10.0, -6.0, 10.0, 6.0),
            ..Default::default()
        };
        ortho.zoom = 4.0;
        let visible = ortho.visible_area();
        assert_eq!(visible.width(), 5.0);
        assert_eq!(visible.height(), 3.0);
        assert_eq!(visible.center(), Vec2::ZERO);
    }

    #[test]
    fn malformed_orthographic_zoom_has_no_ray() {
        let camera = Camera::orthographic(Rect::new(-1.0, -1.0, 1.0, 1.0));
        let mut camera = camera;
        if let Projection::Orthographic(ortho) = &mut camera.projection {
            ortho.zoom = 0.0;
        }
        assert!(camera.viewport_ray(Vec2::ZERO).is_none());
    }
}
