//! The controller, [`PivotCam`], and its settings.

use std::time::Duration;

use bevy_log::prelude::*;
use bevy_math::prelude::*;
use bevy_reflect::prelude::*;

use super::{
    events::{ControlEvent, ListenerId, Listeners},
    momentum::{Damping, Velocity, REFERENCE_FRAME_RATE},
    motion::{CurrentMotion, DragMode},
    operations,
    zoom::{plan_zoom, ZoomIntent, ZoomLimits, ZoomMode, ZoomStep, ZoomView},
};
use crate::{
    camera::{Camera, Projection, ViewCamera},
    input::{
        bindings::{InputBindings, KeyMap, KeyboardBindings, TouchBindings},
        gesture::{Gesture, GestureConfig, GestureRecognizer},
        EventResponse, InputEvent, InputSurface,
    },
};

/// Field of view used as the auto zoom baseline for cameras that start orthographic.
const FALLBACK_BASE_FOV: f32 = 50.0;

/// Orbits, pans, and zooms a camera about a fixed pivot point.
///
/// The controller owns its camera. Read it back with [`PivotCam::camera`] to render, or take it
/// back with [`PivotCam::dispose`].
///
/// # Driving the Controller
///
/// 1. Attach an [`InputSurface`] with [`PivotCam::connect`], and call
///    [`PivotCam::listen_to_key_events`] if the keyboard should move the camera.
/// 2. Forward every platform event to [`PivotCam::handle_event`], and suppress the platform's
///    default action when the returned [`EventResponse`] asks for it.
/// 3. Call [`PivotCam::update`] once per rendered frame so momentum keeps the camera moving after
///    input stops.
/// 4. Redraw when [`ControlEvent::Change`] is emitted, see [`PivotCam::subscribe`].
///
/// Every public field may be changed at any time. Mouse and keyboard bindings are validated when
/// they are built, so they are only reachable through setters.
pub struct PivotCam<C: ViewCamera = Camera> {
    /// When false, input events are ignored apart from releases ending a drag. Momentum still
    /// plays out.
    pub enabled: bool,
    /// What input motions are currently allowed?
    pub enabled_motion: EnabledMotion,
    /// Amount of camera momentum after inputs have stopped.
    pub damping: Damping,
    /// The point the camera orbits. Only ever changed by the host.
    pub pivot: Vec3,
    /// The world up axis that horizontal rotation yaws about.
    pub up: Vec3,
    /// Input sensitivity of the camera.
    pub speeds: Speeds,
    /// Bounds on distance, orthographic zoom, and field of view.
    pub limits: ZoomLimits,
    /// How perspective cameras zoom.
    pub zoom_mode: ZoomMode,
    /// Should the platform context menu be suppressed over the surface?
    pub prevent_context_menu: bool,
    /// Should key events move the camera while listening?
    pub enable_keyboard: bool,
    /// The four movement keys.
    pub keys: KeyMap,
    /// Gestures of one and two fingers.
    pub touch_bindings: TouchBindings,
    input_bindings: InputBindings,
    keyboard_bindings: KeyboardBindings,
    camera: C,
    base_fov: f32,
    velocity: Velocity,
    recognizer: GestureRecognizer,
    listeners: Listeners,
    surface: Option<Box<dyn InputSurface>>,
    connected: bool,
    listening_keys: bool,
}

impl<C: ViewCamera + std::fmt::Debug> std::fmt::Debug for PivotCam<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PivotCam")
            .field("enabled", &self.enabled)
            .field("enabled_motion", &self.enabled_motion)
            .field("damping", &self.damping)
            .field("pivot", &self.pivot)
            .field("up", &self.up)
            .field("speeds", &self.speeds)
            .field("limits", &self.limits)
            .field("zoom_mode", &self.zoom_mode)
            .field("input_bindings", &self.input_bindings)
            .field("keyboard_bindings", &self.keyboard_bindings)
            .field("camera", &self.camera)
            .field("base_fov", &self.base_fov)
            .field("velocity", &self.velocity)
            .field("motion", self.recognizer.motion())
            .field("listeners", &self.listeners)
            .field("connected", &self.connected)
            .field("listening_keys", &self.listening_keys)
            .finish_non_exhaustive()
    }
}

impl<C: ViewCamera> PivotCam<C> {
    /// Create a controller for `camera`, orbiting the origin. It stays inert until connected to a
    /// surface.
    pub fn new(camera: C) -> Self {
        let base_fov = current_fov(&camera).unwrap_or(FALLBACK_BASE_FOV);
        Self {
            enabled: true,
            enabled_motion: EnabledMotion::default(),
            damping: Damping::default(),
            pivot: Vec3::ZERO,
            up: Vec3::Y,
            speeds: Speeds::default(),
            limits: ZoomLimits::default(),
            zoom_mode: ZoomMode::default(),
            prevent_context_menu: true,
            enable_keyboard: true,
            keys: KeyMap::default(),
            touch_bindings: TouchBindings::default(),
            input_bindings: InputBindings::default(),
            keyboard_bindings: KeyboardBindings::default(),
            camera,
            base_fov,
            velocity: Velocity::default(),
            recognizer: GestureRecognizer::default(),
            listeners: Listeners::default(),
            surface: None,
            connected: false,
            listening_keys: false,
        }
    }

    /// Create a controller for `camera` and connect it to `surface`.
    pub fn with_surface(camera: C, surface: impl InputSurface + 'static) -> Self {
        let mut controller = Self::new(camera);
        controller.connect(Some(Box::new(surface)));
        controller
    }

    /// Set the pivot the camera orbits.
    pub fn with_pivot(self, pivot: Vec3) -> Self {
        Self { pivot, ..self }
    }

    /// Start handling pointer and wheel events from `surface`. Passing `None` reconnects the
    /// surface used last. Connecting while connected disconnects first.
    ///
    /// Returns false if there is no surface to connect to.
    pub fn connect(&mut self, surface: Option<Box<dyn InputSurface>>) -> bool {
        if self.connected {
            self.disconnect();
        }
        if let Some(surface) = surface {
            self.surface = Some(surface);
        }
        if self.surface.is_none() {
            warn!("Cannot connect the camera controller without an input surface");
            return false;
        }
        self.connected = true;
        debug!("Camera controller connected");
        true
    }

    /// Stop handling pointer and wheel events. A drag in progress is abandoned: its pointers are
    /// released and [`ControlEvent::End`] is emitted. Does nothing when already disconnected.
    pub fn disconnect(&mut self) {
        if !self.connected {
            return;
        }
        let mut gestures = Vec::new();
        self.recognizer.cancel(&mut gestures);
        self.apply(gestures);
        self.connected = false;
        debug!("Camera controller disconnected");
    }

    /// Is the controller receiving pointer and wheel events?
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Start handling key events. Independent of [`PivotCam::connect`].
    pub fn listen_to_key_events(&mut self) {
        self.listening_keys = true;
    }

    /// Stop handling key events.
    pub fn stop_listen_to_key_events(&mut self) {
        self.listening_keys = false;
    }

    /// Is the controller receiving key events?
    pub fn is_listening_to_key_events(&self) -> bool {
        self.listening_keys
    }

    /// Disconnect everything, drop all listeners, and hand the camera back.
    pub fn dispose(mut self) -> C {
        self.disconnect();
        self.stop_listen_to_key_events();
        self.listeners.clear();
        self.velocity.reset();
        self.camera
    }

    /// The camera being controlled.
    pub fn camera(&self) -> &C {
        &self.camera
    }

    /// Mutable access to the camera. Call [`PivotCam::reset_base_fov`] after changing its field of
    /// view.
    pub fn camera_mut(&mut self) -> &mut C {
        &mut self.camera
    }

    /// The attached surface, if any.
    pub fn surface(&self) -> Option<&dyn InputSurface> {
        self.surface.as_deref()
    }

    /// Mouse button bindings.
    pub fn input_bindings(&self) -> &InputBindings {
        &self.input_bindings
    }

    /// Replace the mouse bindings. Takes effect on the next pointer press.
    pub fn set_input_bindings(&mut self, bindings: InputBindings) {
        debug!("Mouse bindings changed to {bindings:?}");
        self.input_bindings = bindings;
    }

    /// Keyboard modifier bindings.
    pub fn keyboard_bindings(&self) -> &KeyboardBindings {
        &self.keyboard_bindings
    }

    /// Replace the keyboard bindings.
    pub fn set_keyboard_bindings(&mut self, bindings: KeyboardBindings) {
        debug!("Keyboard bindings changed to {bindings:?}");
        self.keyboard_bindings = bindings;
    }

    /// The field of view auto zoom widens back to.
    pub fn base_fov(&self) -> f32 {
        self.base_fov
    }

    /// Capture the camera's current field of view as the auto zoom baseline. Call this after
    /// changing the field of view outside of the controller.
    pub fn reset_base_fov(&mut self) {
        if let Some(fov) = current_fov(&self.camera) {
            self.base_fov = fov;
        }
    }

    /// Distance from the camera to the pivot.
    pub fn distance_to_pivot(&self) -> f32 {
        self.camera.transform().translation.distance(self.pivot)
    }

    /// The drag in progress.
    pub fn motion(&self) -> &CurrentMotion {
        self.recognizer.motion()
    }

    /// The momentum left to play out.
    pub fn velocity(&self) -> &Velocity {
        &self.velocity
    }

    /// Is the camera being dragged, or still moving under momentum?
    pub fn is_actively_controlled(&self) -> bool {
        self.recognizer.motion().is_dragging() || !self.velocity.is_at_rest()
    }

    /// Call `callback` every time `event` is emitted.
    pub fn subscribe(&mut self, event: ControlEvent, callback: impl FnMut() + 'static) -> ListenerId {
        self.listeners.subscribe(event, callback)
    }

    /// Remove a listener added with [`PivotCam::subscribe`].
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.listeners.unsubscribe(id)
    }

    /// Handle a platform event, moving the camera immediately if it is part of an interaction.
    pub fn handle_event(&mut self, event: &InputEvent) -> EventResponse {
        let accepting = match event {
            InputEvent::KeyDown(_) => self.listening_keys && self.enable_keyboard,
            _ => self.connected,
        };
        // Releases still reach the recognizer while disabled so a drag can never outlive its button.
        let releasing = matches!(
            event,
            InputEvent::PointerUp(_) | InputEvent::PointerCancel(_)
        );
        if !accepting || !(self.enabled || releasing) {
            return EventResponse::IGNORED;
        }

        let surface = self
            .surface
            .as_ref()
            .map_or(Rect::default(), |surface| surface.bounding_rect());
        let config = GestureConfig {
            mouse: &self.input_bindings,
            touch: &self.touch_bindings,
            keyboard: &self.keyboard_bindings,
            keys: &self.keys,
            enabled_motion: &self.enabled_motion,
            speeds: &self.speeds,
            surface,
        };

        let mut gestures = Vec::new();
        let response = match event {
            InputEvent::PointerDown(input) => {
                self.recognizer.pointer_down(input, &config, &mut gestures);
                EventResponse::HANDLED
            }
            InputEvent::PointerMove(input) => {
                self.recognizer.pointer_move(input, &config, &mut gestures);
                EventResponse::HANDLED
            }
            InputEvent::PointerUp(input) => {
                self.recognizer.pointer_up(input, false, &config, &mut gestures);
                EventResponse::HANDLED
            }
            InputEvent::PointerCancel(input) => {
                self.recognizer.pointer_up(input, true, &config, &mut gestures);
                EventResponse::HANDLED
            }
            InputEvent::Wheel(wheel) => {
                if self.recognizer.wheel(wheel, &config, &mut gestures) {
                    EventResponse::PREVENT_DEFAULT
                } else {
                    EventResponse::IGNORED
                }
            }
            InputEvent::KeyDown(key) => {
                if self.recognizer.key_down(key, &config, &mut gestures) {
                    EventResponse::PREVENT_DEFAULT
                } else {
                    EventResponse::IGNORED
                }
            }
            InputEvent::ContextMenu => {
                if self.prevent_context_menu {
                    EventResponse::PREVENT_DEFAULT
                } else {
                    EventResponse::IGNORED
                }
            }
        };

        if response == EventResponse::HANDLED && gestures.is_empty() {
            return EventResponse::IGNORED;
        }
        self.apply(gestures);
        response
    }

    /// Advance momentum by `delta_time`, moving the camera. Returns whether the camera moved.
    ///
    /// Call this once per rendered frame. If it is not called, momentum freezes.
    pub fn update(&mut self, delta_time: Duration) -> bool {
        if !self.damping.enabled {
            self.velocity.reset();
            return false;
        }
        let frame = self.damping.frame(delta_time);
        let screen_space = !self.recognizer.motion().is_dragging();
        let step = self.velocity.step(frame, screen_space);
        if !step.is_moving() {
            return false;
        }

        let anchor = self.velocity.zoom_anchor;
        let mut moved = false;
        if let Some(delta) = step.rotate {
            moved |= self.rotate(delta);
        }
        if let Some(delta) = step.pan {
            moved |= self.pan(delta);
        }
        if let Some(scale) = step.dolly {
            let step = self.distance_to_pivot() * (1.0 - scale);
            moved |= operations::dolly(&mut self.camera, self.pivot, step, anchor, &self.limits);
        }
        if let Some(factor) = step.zoom {
            moved |= operations::zoom_orthographic(&mut self.camera, factor, anchor, &self.limits);
        }
        if let Some(factor) = step.fov {
            let max_fov = self.velocity.max_fov.min(self.limits.max_fov);
            moved |= operations::zoom_fov(
                &mut self.camera,
                self.pivot,
                factor,
                max_fov,
                anchor,
                &self.limits,
            );
        }

        if moved {
            self.listeners.notify(ControlEvent::Change);
        }
        moved
    }

    /// [`PivotCam::update`] with a frame at the reference rate of 60 Hz.
    pub fn update_frame(&mut self) -> bool {
        self.update(Duration::from_secs_f32(REFERENCE_FRAME_RATE.recip()))
    }

    /// Apply recognized gestures in order. A change is emitted at most once per batch, before any
    /// end of interaction.
    fn apply(&mut self, gestures: Vec<Gesture>) {
        let mut changed = false;
        for gesture in gestures {
            match gesture {
                Gesture::Capture(pointer) => {
                    if let Some(surface) = self.surface.as_mut() {
                        surface.set_pointer_capture(pointer);
                    }
                }
                Gesture::Release(pointer) => {
                    if let Some(surface) = self.surface.as_mut() {
                        surface.release_pointer_capture(pointer);
                    }
                }
                Gesture::Start { cancel_momentum } => {
                    if cancel_momentum {
                        self.velocity.reset();
                    }
                    trace!("Camera interaction started");
                    self.listeners.notify(ControlEvent::Start);
                }
                Gesture::Drag { mode, delta } => {
                    if !self.enabled_motion.allows(mode) {
                        continue;
                    }
                    let moved = match mode {
                        DragMode::Rotate => self.rotate(delta),
                        DragMode::Pan => self.pan(delta),
                    };
                    if self.damping.enabled {
                        match mode {
                            DragMode::Rotate => self.velocity.rotate = delta,
                            DragMode::Pan => self.velocity.pan = delta,
                        }
                    }
                    changed |= moved;
                }
                Gesture::Zoom(intent) => {
                    changed |= self.zoom(intent);
                }
                Gesture::End => {
                    if std::mem::take(&mut changed) {
                        self.listeners.notify(ControlEvent::Change);
                    }
                    trace!("Camera interaction ended");
                    self.listeners.notify(ControlEvent::End);
                }
            }
        }
        if changed {
            self.listeners.notify(ControlEvent::Change);
        }
    }

    fn rotate(&mut self, delta: Vec2) -> bool {
        operations::rotate(
            &mut self.camera,
            self.pivot,
            self.up,
            self.speeds.rotate,
            delta,
        )
    }

    fn pan(&mut self, delta: Vec2) -> bool {
        operations::pan(
            &mut self.camera,
            self.pivot,
            self.speeds.pan,
            self.zoom_mode,
            delta,
        )
    }

    /// Apply one zoom tick immediately, and seed the zoom momentum with it.
    fn zoom(&mut self, intent: ZoomIntent) -> bool {
        if !self.enabled_motion.zoom {
            return false;
        }
        let scale = intent.scale(self.speeds.zoom, self.damping.adjustment());
        let view = match self.camera.projection() {
            Projection::Perspective(perspective) => ZoomView::Perspective {
                distance: self.distance_to_pivot(),
                fov: perspective.fov,
                base_fov: self.base_fov,
            },
            Projection::Orthographic(_) => ZoomView::Orthographic,
        };
        let step = plan_zoom(self.zoom_mode, &self.limits, view, intent.direction, scale);

        // Only the latest tick carries momentum, so a reversal never fights an old tail.
        self.velocity.reset_zoom();
        self.velocity.zoom_anchor = intent.anchor;
        let seed = self.damping.enabled;
        match step {
            ZoomStep::Dolly { step } => {
                if seed {
                    self.velocity.dolly = scale;
                }
                operations::dolly(
                    &mut self.camera,
                    self.pivot,
                    step,
                    intent.anchor,
                    &self.limits,
                )
            }
            ZoomStep::Fov { factor, max_fov } => {
                if seed {
                    self.velocity.fov = factor;
                    self.velocity.max_fov = max_fov;
                }
                operations::zoom_fov(
                    &mut self.camera,
                    self.pivot,
                    factor,
                    max_fov,
                    intent.anchor,
                    &self.limits,
                )
            }
            ZoomStep::Orthographic { factor } => {
                if seed {
                    self.velocity.zoom = factor;
                }
                operations::zoom_orthographic(&mut self.camera, factor, intent.anchor, &self.limits)
            }
        }
    }
}

fn current_fov<C: ViewCamera + ?Sized>(camera: &C) -> Option<f32> {
    match camera.projection() {
        Projection::Perspective(perspective) => Some(perspective.fov),
        Projection::Orthographic(_) => None,
    }
}

/// Input sensitivity of the camera.
#[derive(Debug, Clone, PartialEq, Reflect)]
pub struct Speeds {
    /// Radians of orbit per pixel of drag.
    pub rotate: f32,
    /// Pan sensitivity. For perspective cameras in dolly mode this is the fraction of the pivot
    /// distance moved per pixel; in field of view modes, the fraction of the frustum height.
    pub pan: f32,
    /// Exponent applied to every zoom tick.
    pub zoom: f32,
    /// Turns per surface height moved by one rotate key press.
    pub key_rotate: f32,
    /// Pixels panned by one pan key press.
    pub key_pan: f32,
    /// Zoom ticks applied by one zoom key press.
    pub key_zoom: f32,
    /// Multiplier on pinch zoom.
    pub pinch: f32,
}

impl Default for Speeds {
    fn default() -> Self {
        Self {
            rotate: 0.005,
            pan: 0.001,
            zoom: 1.0,
            key_rotate: 1.0,
            key_pan: 7.0,
            key_zoom: 1.0,
            pinch: 3.0,
        }
    }
}

/// Controls what kinds of motions are allowed to initiate. Does not affect momentum.
#[derive(Debug, Clone, PartialEq, Reflect)]
pub struct EnabledMotion {
    /// Should rotate be enabled?
    pub rotate: bool,
    /// Should pan be enabled?
    pub pan: bool,
    /// Should zoom be enabled?
    pub zoom: bool,
}

impl Default for EnabledMotion {
    fn default() -> Self {
        Self {
            rotate: true,
            pan: true,
            zoom: true,
        }
    }
}

impl EnabledMotion {
    /// Is a drag in `mode` allowed?
    pub fn allows(&self, mode: DragMode) -> bool {
        match mode {
            DragMode::Rotate => self.rotate,
            DragMode::Pan => self.pan,
        }
    }
}
