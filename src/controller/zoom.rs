//! Provides [`ZoomLimits`] and [`ZoomMode`] settings, and [`plan_zoom`], which decides whether a
//! zoom tick dollies the camera or changes its field of view.

use bevy_math::Vec2;
use bevy_reflect::prelude::*;

use crate::input::{WheelDeltaMode, WheelInput};

/// Every zoom tick scales by a power of this base.
pub const ZOOM_BASE: f32 = 0.95;

/// Wheel or pinch pixels that make up one unit of zoom input.
pub const PIXELS_PER_ZOOM_STEP: f32 = 100.0;

/// Pixels per wheel line.
pub const PIXELS_PER_LINE: f32 = 16.0;

/// In [`ZoomMode::Auto`], zooming in switches from dolly to field of view once the camera is
/// within this distance of [`ZoomLimits::min_distance`]. Measured in world units, so revisit it
/// for scenes with unusual scale.
pub const AUTO_DISTANCE_BUFFER: f32 = 1.0;

/// In [`ZoomMode::Auto`], zooming out widens the field of view until it is within this many
/// degrees of the base field of view, then resumes dollying.
pub const FOV_REVERSAL_EPSILON: f32 = 1e-3;

/// Bounds on camera distance, orthographic zoom, and field of view.
#[derive(Debug, Clone, PartialEq, Reflect)]
pub struct ZoomLimits {
    /// Closest the camera may dolly to the pivot.
    pub min_distance: f32,
    /// Farthest the camera may dolly from the pivot.
    pub max_distance: f32,
    /// Smallest orthographic zoom.
    pub min_zoom: f32,
    /// Largest orthographic zoom.
    pub max_zoom: f32,
    /// Narrowest field of view, in degrees.
    pub min_fov: f32,
    /// Widest field of view, in degrees.
    pub max_fov: f32,
}

impl Default for ZoomLimits {
    fn default() -> Self {
        Self {
            min_distance: 0.0,
            max_distance: f32::INFINITY,
            min_zoom: 0.0,
            max_zoom: f32::INFINITY,
            min_fov: 1.0,
            max_fov: 120.0,
        }
    }
}

/// How perspective cameras zoom. Orthographic cameras always scale their zoom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Reflect)]
pub enum ZoomMode {
    /// Move the camera toward or away from the pivot.
    #[default]
    Dolly,
    /// Narrow or widen the field of view, keeping the camera in place.
    Fov,
    /// Dolly until the camera reaches its minimum distance, then narrow the field of view. Zooming
    /// out widens the field of view back to its base value before dollying out again.
    Auto,
}

impl ZoomMode {
    /// Does this mode change the field of view?
    pub fn uses_fov(&self) -> bool {
        matches!(self, ZoomMode::Fov | ZoomMode::Auto)
    }
}

/// Which way a zoom tick goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub enum ZoomDirection {
    /// Toward the scene.
    In,
    /// Away from the scene.
    Out,
}

impl ZoomDirection {
    /// `1.0` for [`ZoomDirection::In`], `-1.0` for [`ZoomDirection::Out`].
    pub fn sign(&self) -> f32 {
        match self {
            ZoomDirection::In => 1.0,
            ZoomDirection::Out => -1.0,
        }
    }
}

/// A single zoom tick from the wheel, a pinch, or a key.
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct ZoomIntent {
    /// Zoom in or out.
    pub direction: ZoomDirection,
    /// Size of the input, normalized so a typical wheel notch is about `1.0`.
    pub magnitude: f32,
    /// Source specific multiplier, such as the pinch or key zoom speed.
    pub scale_factor: f32,
    /// The point that stays fixed on screen, in normalized device coordinates.
    pub anchor: Vec2,
}

impl ZoomIntent {
    /// Build a tick from a scroll event. Returns `None` when it did not scroll.
    pub fn from_wheel(wheel: &WheelInput, anchor: Vec2, page_height: f32) -> Option<Self> {
        let pixels = match wheel.delta_mode {
            WheelDeltaMode::Pixel => wheel.delta_y,
            WheelDeltaMode::Line => wheel.delta_y * PIXELS_PER_LINE,
            WheelDeltaMode::Page => wheel.delta_y * page_height,
        };
        if pixels == 0.0 || !pixels.is_finite() {
            return None;
        }
        Some(Self {
            direction: if pixels < 0.0 {
                ZoomDirection::In
            } else {
                ZoomDirection::Out
            },
            magnitude: pixels.abs() / PIXELS_PER_ZOOM_STEP,
            scale_factor: 1.0,
            anchor,
        })
    }

    /// The multiplicative scale of this tick: below one when zooming in, above one when zooming
    /// out.
    pub fn scale(&self, zoom_speed: f32, damping_adjustment: f32) -> f32 {
        let exponent = zoom_speed * self.magnitude * self.scale_factor * damping_adjustment;
        ZOOM_BASE.powf(self.direction.sign() * exponent)
    }
}

/// The state of the camera a zoom decision depends on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ZoomView {
    /// A perspective camera.
    Perspective {
        /// Distance from the camera to the pivot.
        distance: f32,
        /// Current field of view in degrees.
        fov: f32,
        /// Field of view captured as the auto mode baseline.
        base_fov: f32,
    },
    /// An orthographic camera.
    Orthographic,
}

/// How a zoom tick moves the camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ZoomStep {
    /// Dolly forward by `step` world units; negative values move back.
    Dolly {
        /// Signed distance along the view direction.
        step: f32,
    },
    /// Divide the field of view by `factor`, bounded above by `max_fov`.
    Fov {
        /// Above one narrows the field of view.
        factor: f32,
        /// Widest field of view this step may reach.
        max_fov: f32,
    },
    /// Multiply the orthographic zoom by `factor`.
    Orthographic {
        /// Above one zooms in.
        factor: f32,
    },
}

/// Decide how a tick with the given `direction` and `scale` (see [`ZoomIntent::scale`]) moves the
/// camera. The decision only depends on the current camera state, so no mode flag is kept between
/// ticks.
pub fn plan_zoom(
    mode: ZoomMode,
    limits: &ZoomLimits,
    view: ZoomView,
    direction: ZoomDirection,
    scale: f32,
) -> ZoomStep {
    let factor = scale.recip();
    let ZoomView::Perspective {
        distance,
        fov,
        base_fov,
    } = view
    else {
        return ZoomStep::Orthographic { factor };
    };

    let dolly = ZoomStep::Dolly {
        step: distance * (1.0 - scale),
    };
    let fov_step = ZoomStep::Fov {
        factor,
        max_fov: limits.max_fov,
    };

    match mode {
        ZoomMode::Dolly => dolly,
        ZoomMode::Fov => fov_step,
        ZoomMode::Auto => match direction {
            ZoomDirection::In if distance <= limits.min_distance + AUTO_DISTANCE_BUFFER => fov_step,
            ZoomDirection::Out if fov < base_fov - FOV_REVERSAL_EPSILON => ZoomStep::Fov {
                factor,
                max_fov: base_fov.min(limits.max_fov),
            },
            _ => dolly,
        },
    }
}
