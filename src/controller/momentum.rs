//! Provides [`Damping`] settings and [`Velocity`], the inertia left behind by the last gesture.
//!
//! Velocities are stored per 60 Hz frame. Each damped frame hands out its share of the remaining
//! motion and decays what is left, both computed from the real frame time so that the distance
//! covered over a given wall clock interval does not depend on the frame rate.

use std::time::Duration;

use bevy_math::Vec2;
use bevy_reflect::prelude::*;

/// Velocities are expressed per frame at this rate.
pub const REFERENCE_FRAME_RATE: f32 = 60.0;

/// Frame steps are clamped to at least this fraction of a reference frame.
pub const MIN_FRAME_STEPS: f32 = 0.001;

/// Rotate and pan velocities below this many pixels per frame stop.
pub const SCREEN_STOP_EPSILON: f32 = 1e-3;

/// Dolly and zoom factors within this distance of one, in log space, stop.
pub const FACTOR_STOP_EPSILON: f32 = 1e-6;

/// Amount of camera momentum after inputs have stopped.
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct Damping {
    /// Should motion continue after the input that caused it ends?
    pub enabled: bool,
    /// Fraction of velocity lost every reference frame, in `0..1`. Smaller values glide longer.
    pub factor: f32,
}

impl Default for Damping {
    fn default() -> Self {
        Self {
            enabled: true,
            factor: 0.05,
        }
    }
}

impl Damping {
    fn clamped_factor(&self) -> f32 {
        self.factor.clamp(1e-4, 1.0)
    }

    /// Fraction of velocity kept every reference frame.
    pub fn retention(&self) -> f32 {
        1.0 - self.clamped_factor()
    }

    /// Scale applied to the immediate part of discrete inputs like wheel ticks. With damping on,
    /// the inertial tail supplies most of the motion, so the immediate step is reduced to match an
    /// undamped tick.
    pub fn adjustment(&self) -> f32 {
        if self.enabled {
            self.clamped_factor()
        } else {
            1.0
        }
    }

    /// Decay and gain for a frame lasting `delta_time`.
    pub fn frame(&self, delta_time: Duration) -> FrameDecay {
        let retention = self.retention();
        let steps = (delta_time.as_secs_f32() * REFERENCE_FRAME_RATE).max(MIN_FRAME_STEPS);
        let decay = retention.powf(steps);
        FrameDecay {
            decay,
            gain: (1.0 - decay) / (1.0 - retention),
        }
    }
}

/// How a single frame integrates velocity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameDecay {
    /// Multiplier applied to velocities at the end of the frame.
    pub decay: f32,
    /// Multiplier turning a per-frame velocity into this frame's displacement. Exactly one for a
    /// reference frame.
    pub gain: f32,
}

/// The velocity of every motion channel. Screen space channels are in pixels per reference frame.
/// The other channels are multiplicative factors per reference frame, at rest when equal to one.
/// Dolly scales the distance to the pivot, so its tail can shrink that distance but never cross it.
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct Velocity {
    /// Orbit velocity.
    pub rotate: Vec2,
    /// Pan velocity.
    pub pan: Vec2,
    /// Pivot distance factor.
    pub dolly: f32,
    /// Orthographic zoom factor.
    pub zoom: f32,
    /// Field of view zoom factor.
    pub fov: f32,
    /// Anchor of the zoom channels, in normalized device coordinates.
    pub zoom_anchor: Vec2,
    /// Widest field of view the field of view channel may reach.
    pub max_fov: f32,
}

impl Default for Velocity {
    fn default() -> Self {
        Self {
            rotate: Vec2::ZERO,
            pan: Vec2::ZERO,
            dolly: 1.0,
            zoom: 1.0,
            fov: 1.0,
            zoom_anchor: Vec2::ZERO,
            max_fov: f32::INFINITY,
        }
    }
}

/// The displacement of each channel for one frame; `None` for channels at rest.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MomentumStep {
    /// Pixels to orbit by.
    pub rotate: Option<Vec2>,
    /// Pixels to pan by.
    pub pan: Option<Vec2>,
    /// Factor to scale the pivot distance by.
    pub dolly: Option<f32>,
    /// Orthographic zoom factor.
    pub zoom: Option<f32>,
    /// Field of view zoom factor.
    pub fov: Option<f32>,
}

impl MomentumStep {
    /// Does any channel move?
    pub fn is_moving(&self) -> bool {
        self.rotate.is_some()
            || self.pan.is_some()
            || self.dolly.is_some()
            || self.zoom.is_some()
            || self.fov.is_some()
    }
}

impl Velocity {
    /// Stop every channel.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Stop the dolly and zoom channels, leaving orbit and pan untouched.
    pub fn reset_zoom(&mut self) {
        let defaults = Self::default();
        self.dolly = defaults.dolly;
        self.zoom = defaults.zoom;
        self.fov = defaults.fov;
        self.max_fov = defaults.max_fov;
    }

    /// Is every channel at rest?
    pub fn is_at_rest(&self) -> bool {
        self.rotate == Vec2::ZERO
            && self.pan == Vec2::ZERO
            && self.dolly == 1.0
            && self.zoom == 1.0
            && self.fov == 1.0
    }

    /// Take this frame's displacement from every channel and decay it. Channels that fell below
    /// their stop threshold are snapped to rest and report `None`.
    ///
    /// Orbit and pan are skipped while `screen_space` is false, which is the case while a drag is
    /// in progress.
    pub fn step(&mut self, frame: FrameDecay, screen_space: bool) -> MomentumStep {
        let mut step = MomentumStep::default();
        if screen_space {
            step.rotate = take_screen_space(&mut self.rotate, frame);
            step.pan = take_screen_space(&mut self.pan, frame);
        }

        step.dolly = take_factor(&mut self.dolly, frame);
        step.zoom = take_factor(&mut self.zoom, frame);
        step.fov = take_factor(&mut self.fov, frame);
        step
    }
}

fn take_screen_space(velocity: &mut Vec2, frame: FrameDecay) -> Option<Vec2> {
    if velocity.length() < SCREEN_STOP_EPSILON || !velocity.is_finite() {
        *velocity = Vec2::ZERO;
        return None;
    }
    let displacement = *velocity * frame.gain;
    *velocity *= frame.decay;
    Some(displacement)
}

fn take_factor(factor: &mut f32, frame: FrameDecay) -> Option<f32> {
    let log = factor.ln();
    if log.abs() < FACTOR_STOP_EPSILON || !log.is_finite() {
        *factor = 1.0;
        return None;
    }
    let displacement = (log * frame.gain).exp();
    *factor = (log * frame.decay).exp();
    Some(displacement)
}
