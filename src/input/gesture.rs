//! The gesture recognizer: turns mouse, touch and keyboard events into [`Gesture`]s.
//!
//! The recognizer owns the drag state and the set of pressed fingers. It never touches the camera;
//! the controller applies the gestures it emits.

use std::f32::consts::TAU;

use bevy_log::prelude::*;
use bevy_math::{Rect, Vec2};

use super::{
    bindings::{InputBindings, KeyCommand, KeyMap, KeyboardBindings, MovementKey, TouchBindings},
    client_to_ndc, KeyInput, PointerId, PointerInput, PointerKind, WheelInput,
};
use crate::controller::{
    component::{EnabledMotion, Speeds},
    motion::{CurrentMotion, DragMode, DragSource, PointerSet},
    zoom::{ZoomDirection, ZoomIntent, PIXELS_PER_ZOOM_STEP},
};

/// A normalized interaction step, in the order it must be applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Gesture {
    /// Capture this pointer on the surface.
    Capture(PointerId),
    /// Release a previously captured pointer.
    Release(PointerId),
    /// An interaction began.
    Start {
        /// Should inertia from earlier gestures be stopped? True for drags and keys, false for
        /// wheel ticks.
        cancel_momentum: bool,
    },
    /// Rotate or pan by a screen space delta in pixels.
    Drag {
        /// What the delta does.
        mode: DragMode,
        /// Pixels moved since the previous event.
        delta: Vec2,
    },
    /// A single zoom tick.
    Zoom(ZoomIntent),
    /// An interaction ended.
    End,
}

/// Everything the recognizer needs to know about the controller's configuration.
#[derive(Debug, Clone, Copy)]
pub struct GestureConfig<'a> {
    /// Mouse button bindings.
    pub mouse: &'a InputBindings,
    /// Touch bindings.
    pub touch: &'a TouchBindings,
    /// Keyboard modifier bindings.
    pub keyboard: &'a KeyboardBindings,
    /// The movement keys.
    pub keys: &'a KeyMap,
    /// Which motions may start.
    pub enabled_motion: &'a EnabledMotion,
    /// Speeds used to convert keys and pinches into motion.
    pub speeds: &'a Speeds,
    /// Bounding rectangle of the surface, in client pixels.
    pub surface: Rect,
}

impl GestureConfig<'_> {
    fn anchor(&self, position: Vec2) -> Vec2 {
        client_to_ndc(position, self.surface).unwrap_or_else(|| {
            warn_once!("Input surface has an empty bounding rectangle, anchoring at its center");
            Vec2::ZERO
        })
    }
}

/// Drag and multi-touch state.
#[derive(Debug, Clone, Default)]
pub struct GestureRecognizer {
    motion: CurrentMotion,
    pointers: PointerSet,
    last_spread: Option<f32>,
}

impl GestureRecognizer {
    /// The drag in progress.
    pub fn motion(&self) -> &CurrentMotion {
        &self.motion
    }

    /// The fingers currently pressed.
    pub fn pointers(&self) -> &PointerSet {
        &self.pointers
    }

    /// A pointer was pressed.
    pub fn pointer_down(&mut self, input: &PointerInput, config: &GestureConfig, out: &mut Vec<Gesture>) {
        match input.pointer_kind {
            PointerKind::Touch => self.touch_down(input, config, out),
            PointerKind::Mouse | PointerKind::Pen => self.mouse_down(input, config, out),
        }
    }

    /// A pointer moved.
    pub fn pointer_move(&mut self, input: &PointerInput, config: &GestureConfig, out: &mut Vec<Gesture>) {
        match input.pointer_kind {
            PointerKind::Touch => self.touch_move(input, config, out),
            PointerKind::Mouse | PointerKind::Pen => self.mouse_move(input, out),
        }
    }

    /// A pointer was released, or cancelled by the platform if `cancelled`.
    pub fn pointer_up(
        &mut self,
        input: &PointerInput,
        cancelled: bool,
        config: &GestureConfig,
        out: &mut Vec<Gesture>,
    ) {
        match input.pointer_kind {
            PointerKind::Touch => self.touch_up(input, config, out),
            PointerKind::Mouse | PointerKind::Pen => self.mouse_up(input, cancelled, out),
        }
    }

    /// A scroll event. Returns whether the event was taken as a zoom.
    pub fn wheel(&mut self, wheel: &WheelInput, config: &GestureConfig, out: &mut Vec<Gesture>) -> bool {
        if !config.enabled_motion.zoom {
            return false;
        }
        let anchor = config.anchor(wheel.position);
        let Some(intent) = ZoomIntent::from_wheel(wheel, anchor, config.surface.height()) else {
            return false;
        };
        out.extend([
            Gesture::Start {
                cancel_momentum: false,
            },
            Gesture::Zoom(intent),
            Gesture::End,
        ]);
        true
    }

    /// A key press. Returns whether the key triggered an action.
    pub fn key_down(&mut self, key: &KeyInput, config: &GestureConfig, out: &mut Vec<Gesture>) -> bool {
        let Some(movement) = config.keys.lookup(key.code) else {
            return false;
        };
        let Some(command) = config.keyboard.resolve(key.modifiers) else {
            return false;
        };

        let gesture = match command {
            KeyCommand::Zoom => {
                let direction = match movement {
                    MovementKey::Up => ZoomDirection::In,
                    MovementKey::Bottom => ZoomDirection::Out,
                    MovementKey::Left | MovementKey::Right => return false,
                };
                if !config.enabled_motion.zoom {
                    return false;
                }
                Gesture::Zoom(ZoomIntent {
                    direction,
                    magnitude: 1.0,
                    scale_factor: config.speeds.key_zoom,
                    anchor: Vec2::ZERO,
                })
            }
            KeyCommand::Rotate => {
                let height = config.surface.height();
                if !config.enabled_motion.rotate || height <= 0.0 || config.speeds.rotate <= 0.0 {
                    return false;
                }
                // An angle, expressed in the pixels a drag would need to produce it.
                let pixels = TAU * config.speeds.key_rotate / height / config.speeds.rotate;
                Gesture::Drag {
                    mode: DragMode::Rotate,
                    delta: key_direction(movement) * pixels,
                }
            }
            KeyCommand::Pan => {
                if !config.enabled_motion.pan {
                    return false;
                }
                Gesture::Drag {
                    mode: DragMode::Pan,
                    delta: key_direction(movement) * config.speeds.key_pan,
                }
            }
        };

        out.extend([
            Gesture::Start {
                cancel_momentum: true,
            },
            gesture,
            Gesture::End,
        ]);
        true
    }

    /// Abandon the drag in progress, releasing every captured pointer.
    pub fn cancel(&mut self, out: &mut Vec<Gesture>) {
        match self.motion {
            CurrentMotion::Stationary => return,
            CurrentMotion::Dragging {
                source: DragSource::Mouse { pointer, .. },
                ..
            } => out.push(Gesture::Release(pointer)),
            CurrentMotion::Dragging {
                source: DragSource::Touch,
                ..
            } => out.extend(self.pointers.iter().map(|point| Gesture::Release(point.id))),
        }
        out.push(Gesture::End);
        self.motion = CurrentMotion::Stationary;
        self.pointers.clear();
        self.last_spread = None;
    }

    fn mouse_down(&mut self, input: &PointerInput, config: &GestureConfig, out: &mut Vec<Gesture>) {
        if self.motion.is_dragging() {
            return;
        }
        let Some(mode) = config.mouse.resolve(input.button, input.modifiers) else {
            return;
        };
        if !config.enabled_motion.allows(mode) {
            return;
        }
        self.motion = CurrentMotion::Dragging {
            source: DragSource::Mouse {
                pointer: input.pointer_id,
                button: input.button,
            },
            mode,
            last: input.position,
        };
        out.extend([
            Gesture::Capture(input.pointer_id),
            Gesture::Start {
                cancel_momentum: true,
            },
        ]);
    }

    fn mouse_move(&mut self, input: &PointerInput, out: &mut Vec<Gesture>) {
        let CurrentMotion::Dragging {
            source: DragSource::Mouse { pointer, .. },
            mode,
            last,
        } = &mut self.motion
        else {
            return;
        };
        if *pointer != input.pointer_id {
            return;
        }
        let delta = input.position - *last;
        *last = input.position;
        if delta != Vec2::ZERO {
            out.push(Gesture::Drag { mode: *mode, delta });
        }
    }

    fn mouse_up(&mut self, input: &PointerInput, cancelled: bool, out: &mut Vec<Gesture>) {
        let CurrentMotion::Dragging {
            source: DragSource::Mouse { pointer, button },
            ..
        } = self.motion
        else {
            return;
        };
        // The button that started the drag ends it, whatever the bindings are now.
        if pointer != input.pointer_id || !(cancelled || input.button == button) {
            return;
        }
        self.motion = CurrentMotion::Stationary;
        out.extend([Gesture::Release(pointer), Gesture::End]);
    }

    fn touch_down(&mut self, input: &PointerInput, config: &GestureConfig, out: &mut Vec<Gesture>) {
        if self.motion.is_dragging() && !self.motion.is_touch() {
            return;
        }
        if !self.pointers.press(input.pointer_id, input.position) {
            return;
        }
        out.push(Gesture::Capture(input.pointer_id));

        match self.pointers.pinch() {
            None => {
                self.motion = CurrentMotion::Dragging {
                    source: DragSource::Touch,
                    mode: config.touch.one,
                    last: input.position,
                };
                out.push(Gesture::Start {
                    cancel_momentum: true,
                });
            }
            // The second finger upgrades the drag in place, without a new start.
            Some((midpoint, spread)) => {
                self.motion = CurrentMotion::Dragging {
                    source: DragSource::Touch,
                    mode: config.touch.two,
                    last: midpoint,
                };
                self.last_spread = Some(spread);
            }
        }
    }

    fn touch_move(&mut self, input: &PointerInput, config: &GestureConfig, out: &mut Vec<Gesture>) {
        if !self.pointers.update(input.pointer_id, input.position) {
            return;
        }
        let CurrentMotion::Dragging {
            source: DragSource::Touch,
            mode,
            last,
        } = &mut self.motion
        else {
            return;
        };

        let Some((midpoint, spread)) = self.pointers.pinch() else {
            let delta = input.position - *last;
            *last = input.position;
            if delta != Vec2::ZERO {
                out.push(Gesture::Drag { mode: *mode, delta });
            }
            return;
        };

        let delta = midpoint - *last;
        *last = midpoint;
        if delta != Vec2::ZERO {
            out.push(Gesture::Drag { mode: *mode, delta });
        }

        if config.touch.pinch && config.enabled_motion.zoom {
            let change = self.last_spread.map_or(0.0, |last_spread| spread - last_spread);
            if change != 0.0 {
                out.push(Gesture::Zoom(ZoomIntent {
                    direction: if change > 0.0 {
                        ZoomDirection::In
                    } else {
                        ZoomDirection::Out
                    },
                    magnitude: change.abs() / PIXELS_PER_ZOOM_STEP,
                    scale_factor: config.speeds.pinch,
                    anchor: config.anchor(midpoint),
                }));
            }
        }
        self.last_spread = Some(spread);
    }

    fn touch_up(&mut self, input: &PointerInput, config: &GestureConfig, out: &mut Vec<Gesture>) {
        if !self.pointers.release(input.pointer_id) {
            return;
        }
        out.push(Gesture::Release(input.pointer_id));
        self.last_spread = None;

        match self.pointers.as_slice() {
            [] => {
                self.motion = CurrentMotion::Stationary;
                out.push(Gesture::End);
            }
            [remaining] => {
                if let CurrentMotion::Dragging { mode, last, .. } = &mut self.motion {
                    *mode = config.touch.one;
                    *last = remaining.position;
                }
            }
            _ => {}
        }
    }
}

/// The screen space direction a movement key pushes the camera in, matching a drag in the same
/// direction.
fn key_direction(key: MovementKey) -> Vec2 {
    match key {
        MovementKey::Left => Vec2::X,
        MovementKey::Right => Vec2::NEG_X,
        MovementKey::Up => Vec2::Y,
        MovementKey::Bottom => Vec2::NEG_Y,
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use bevy_input::{keyboard::KeyCode, mouse::MouseButton};

    use super::*;
    use crate::input::{ModifierKey, Modifiers};

    #[derive(Default)]
    struct Fixture {
        mouse: InputBindings,
        touch: TouchBindings,
        keyboard: KeyboardBindings,
        keys: KeyMap,
        enabled_motion: EnabledMotion,
        speeds: Speeds,
    }

    impl Fixture {
        fn config(&self) -> GestureConfig<'_> {
            GestureConfig {
                mouse: &self.mouse,
                touch: &self.touch,
                keyboard: &self.keyboard,
                keys: &self.keys,
                enabled_motion: &self.enabled_motion,
                speeds: &self.speeds,
                surface: Rect::new(0.0, 0.0, 800.0, 600.0),
            }
        }
    }

    fn mouse(button: MouseButton, x: f32, y: f32) -> PointerInput {
        PointerInput::mouse(button, Vec2::new(x, y))
    }

    #[test]
    fn mouse_drag_lifecycle() {
        let fixture = Fixture::default();
        let config = fixture.config();
        let mut recognizer = GestureRecognizer::default();
        let mut out = Vec::new();

        recognizer.pointer_down(&mouse(MouseButton::Left, 10.0, 10.0), &config, &mut out);
        recognizer.pointer_move(&mouse(MouseButton::Left, 15.0, 7.0), &config, &mut out);
        recognizer.pointer_move(&mouse(MouseButton::Left, 15.0, 7.0), &config, &mut out);
        recognizer.pointer_up(&mouse(MouseButton::Left, 15.0, 7.0), false, &config, &mut out);

        assert_eq!(
            out,
            [
                Gesture::Capture(1),
                Gesture::Start {
                    cancel_momentum: true
                },
                Gesture::Drag {
                    mode: DragMode::Rotate,
                    delta: Vec2::new(5.0, -3.0)
                },
                Gesture::Release(1),
                Gesture::End,
            ]
        );
        assert!(!recognizer.motion().is_dragging());
    }

    #[test]
    fn unbound_buttons_are_ignored() {
        let fixture = Fixture::default();
        let mut recognizer = GestureRecognizer::default();
        let mut out = Vec::new();
        recognizer.pointer_down(&mouse(MouseButton::Middle, 0.0, 0.0), &fixture.config(), &mut out);
        assert!(out.is_empty());
        assert!(!recognizer.motion().is_dragging());
    }

    #[test]
    fn drag_ends_on_its_own_button_after_rebinding() {
        let fixture = Fixture::default();
        let mut recognizer = GestureRecognizer::default();
        let mut out = Vec::new();
        recognizer.pointer_down(&mouse(MouseButton::Left, 0.0, 0.0), &fixture.config(), &mut out);

        let rebound = Fixture {
            mouse: InputBindings::same_button(MouseButton::Right, ModifierKey::Alt).unwrap(),
            ..Default::default()
        };
        out.clear();
        recognizer.pointer_up(&mouse(MouseButton::Right, 0.0, 0.0), false, &rebound.config(), &mut out);
        assert!(out.is_empty());
        assert!(recognizer.motion().is_dragging());

        recognizer.pointer_up(&mouse(MouseButton::Left, 0.0, 0.0), false, &rebound.config(), &mut out);
        assert_eq!(out, [Gesture::Release(1), Gesture::End]);
        assert!(!recognizer.motion().is_dragging());
    }

    #[test]
    fn modifier_selects_pan_on_shared_button() {
        let fixture = Fixture {
            mouse: InputBindings::same_button(MouseButton::Right, ModifierKey::Alt).unwrap(),
            ..Default::default()
        };
        let config = fixture.config();
        for (modifiers, expected) in [
            (Modifiers::NONE, DragMode::Rotate),
            (Modifiers::only(ModifierKey::Alt), DragMode::Pan),
        ] {
            let mut recognizer = GestureRecognizer::default();
            let mut out = Vec::new();
            let down = mouse(MouseButton::Right, 0.0, 0.0).with_modifiers(modifiers);
            recognizer.pointer_down(&down, &config, &mut out);
            assert_eq!(recognizer.motion().mode(), Some(expected));
        }
    }

    #[test]
    fn disabled_motion_does_not_start() {
        let fixture = Fixture {
            enabled_motion: EnabledMotion {
                rotate: false,
                ..Default::default()
            },
            ..Default::default()
        };
        let mut recognizer = GestureRecognizer::default();
        let mut out = Vec::new();
        recognizer.pointer_down(&mouse(MouseButton::Left, 0.0, 0.0), &fixture.config(), &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn second_finger_upgrades_without_start() {
        let fixture = Fixture::default();
        let config = fixture.config();
        let mut recognizer = GestureRecognizer::default();
        let mut out = Vec::new();

        recognizer.pointer_down(&PointerInput::touch(1, Vec2::new(100.0, 100.0)), &config, &mut out);
        recognizer.pointer_down(&PointerInput::touch(2, Vec2::new(200.0, 100.0)), &config, &mut out);
        assert_eq!(
            out,
            [
                Gesture::Capture(1),
                Gesture::Start {
                    cancel_momentum: true
                },
                Gesture::Capture(2),
            ]
        );
        assert_eq!(recognizer.motion().mode(), Some(DragMode::Pan));

        // Spread the second finger: the midpoint moves 20px right, the spread grows by 40px.
        out.clear();
        recognizer.pointer_move(&PointerInput::touch(2, Vec2::new(240.0, 100.0)), &config, &mut out);
        assert_eq!(
            out[0],
            Gesture::Drag {
                mode: DragMode::Pan,
                delta: Vec2::new(20.0, 0.0)
            }
        );
        let Gesture::Zoom(intent) = out[1] else {
            panic!("expected a pinch zoom, got {:?}", out[1]);
        };
        assert_eq!(intent.direction, ZoomDirection::In);
        assert_relative_eq!(intent.magnitude, 0.4);
        assert_relative_eq!(intent.scale_factor, fixture.speeds.pinch);
        // Midpoint (170, 100) on an 800x600 surface.
        assert!(intent.anchor.abs_diff_eq(Vec2::new(-0.575, 2.0 / 3.0), 1e-5));
    }

    #[test]
    fn losing_a_finger_downgrades_then_ends() {
        let fixture = Fixture::default();
        let config = fixture.config();
        let mut recognizer = GestureRecognizer::default();
        let mut out = Vec::new();

        recognizer.pointer_down(&PointerInput::touch(1, Vec2::new(100.0, 100.0)), &config, &mut out);
        recognizer.pointer_down(&PointerInput::touch(2, Vec2::new(200.0, 100.0)), &config, &mut out);
        recognizer.pointer_up(&PointerInput::touch(1, Vec2::new(100.0, 100.0)), false, &config, &mut out);
        assert_eq!(recognizer.motion().mode(), Some(DragMode::Rotate));
        assert_eq!(recognizer.pointers().len(), 1);

        // The remaining finger is the new reference, so its next move is a plain delta.
        out.clear();
        recognizer.pointer_move(&PointerInput::touch(2, Vec2::new(203.0, 96.0)), &config, &mut out);
        assert_eq!(
            out,
            [Gesture::Drag {
                mode: DragMode::Rotate,
                delta: Vec2::new(3.0, -4.0)
            }]
        );

        out.clear();
        recognizer.pointer_up(&PointerInput::touch(2, Vec2::new(203.0, 96.0)), false, &config, &mut out);
        assert_eq!(out, [Gesture::Release(2), Gesture::End]);
        assert!(!recognizer.motion().is_dragging());
    }

    #[test]
    fn wheel_is_a_momentary_zoom() {
        let fixture = Fixture::default();
        let mut recognizer = GestureRecognizer::default();
        let mut out = Vec::new();
        let wheel = WheelInput::pixels(-100.0, Vec2::new(400.0, 300.0));
        assert!(recognizer.wheel(&wheel, &fixture.config(), &mut out));
        assert_eq!(
            out[0],
            Gesture::Start {
                cancel_momentum: false
            }
        );
        assert!(matches!(out[1], Gesture::Zoom(ZoomIntent { direction: ZoomDirection::In, anchor, .. }) if anchor == Vec2::ZERO));
        assert_eq!(out[2], Gesture::End);
    }

    #[test]
    fn empty_wheel_is_not_taken() {
        let fixture = Fixture::default();
        let mut recognizer = GestureRecognizer::default();
        let mut out = Vec::new();
        let wheel = WheelInput::pixels(0.0, Vec2::new(400.0, 300.0));
        assert!(!recognizer.wheel(&wheel, &fixture.config(), &mut out));
        assert!(out.is_empty());
    }

    #[test]
    fn key_rotate_converts_angle_to_pixels() {
        let fixture = Fixture::default();
        let mut recognizer = GestureRecognizer::default();
        let mut out = Vec::new();
        let key = KeyInput::new(KeyCode::ArrowLeft, Modifiers::only(ModifierKey::Shift));
        assert!(recognizer.key_down(&key, &fixture.config(), &mut out));
        let Gesture::Drag { mode, delta } = out[1] else {
            panic!("expected a drag, got {:?}", out[1]);
        };
        assert_eq!(mode, DragMode::Rotate);
        // Applying the pixels at the rotate speed turns by exactly the key angle.
        assert_relative_eq!(
            delta.x * fixture.speeds.rotate,
            TAU * fixture.speeds.key_rotate / 600.0,
            epsilon = 1e-6
        );
        assert_eq!(out[2], Gesture::End);
    }

    #[test]
    fn key_pan_uses_fixed_pixels() {
        let fixture = Fixture::default();
        let mut recognizer = GestureRecognizer::default();
        let mut out = Vec::new();
        let key = KeyInput::new(KeyCode::ArrowDown, Modifiers::NONE);
        assert!(recognizer.key_down(&key, &fixture.config(), &mut out));
        assert_eq!(
            out[1],
            Gesture::Drag {
                mode: DragMode::Pan,
                delta: Vec2::new(0.0, -fixture.speeds.key_pan)
            }
        );
    }

    #[test]
    fn horizontal_keys_do_not_zoom() {
        let fixture = Fixture::default();
        let mut recognizer = GestureRecognizer::default();
        let mut out = Vec::new();
        let ctrl = Modifiers::only(ModifierKey::Ctrl);
        assert!(!recognizer.key_down(&KeyInput::new(KeyCode::ArrowLeft, ctrl), &fixture.config(), &mut out));
        assert!(out.is_empty());
        assert!(recognizer.key_down(&KeyInput::new(KeyCode::ArrowUp, ctrl), &fixture.config(), &mut out));
        assert!(matches!(out[1], Gesture::Zoom(ZoomIntent { direction: ZoomDirection::In, .. })));
    }

    #[test]
    fn unmapped_keys_are_ignored() {
        let fixture = Fixture::default();
        let mut recognizer = GestureRecognizer::default();
        let mut out = Vec::new();
        let key = KeyInput::new(KeyCode::KeyQ, Modifiers::NONE);
        assert!(!recognizer.key_down(&key, &fixture.config(), &mut out));
        let alt = KeyInput::new(KeyCode::ArrowUp, Modifiers::only(ModifierKey::Alt));
        assert!(!recognizer.key_down(&alt, &fixture.config(), &mut out));
        assert!(out.is_empty());
    }

    #[test]
    fn cancel_releases_touches() {
        let fixture = Fixture::default();
        let config = fixture.config();
        let mut recognizer = GestureRecognizer::default();
        let mut out = Vec::new();
        recognizer.pointer_down(&PointerInput::touch(4, Vec2::ZERO), &config, &mut out);
        recognizer.pointer_down(&PointerInput::touch(5, Vec2::ONE), &config, &mut out);
        out.clear();
        recognizer.cancel(&mut out);
        assert_eq!(out, [Gesture::Release(4), Gesture::Release(5), Gesture::End]);
        assert!(recognizer.pointers().is_empty());
    }
}
