//! Raw input delivered by the host's windowing layer, and the surface the controller is attached
//! to.
//!
//! Hosts translate their platform events into [`InputEvent`]s and pass them to
//! [`PivotCam::handle_event`](crate::controller::component::PivotCam::handle_event). The returned
//! [`EventResponse`] says whether the platform's default action should be suppressed.

use bevy_input::{keyboard::KeyCode, mouse::MouseButton};
use bevy_math::{Rect, Vec2};
use bevy_reflect::prelude::*;

pub mod bindings;
pub mod gesture;

/// Platform assigned pointer identifier.
pub type PointerId = u64;

/// An input event, mirroring the pointer, wheel and keyboard events of a browser element.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// A button was pressed or a finger touched the surface.
    PointerDown(PointerInput),
    /// A pointer moved.
    PointerMove(PointerInput),
    /// A button was released or a finger lifted.
    PointerUp(PointerInput),
    /// The platform cancelled a pointer, for example when a touch turned into a system gesture.
    PointerCancel(PointerInput),
    /// The scroll wheel or touchpad scrolled.
    Wheel(WheelInput),
    /// A key was pressed.
    KeyDown(KeyInput),
    /// The platform is about to show a context menu.
    ContextMenu,
}

/// The kind of device that produced a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect)]
pub enum PointerKind {
    /// A mouse. Buttons and modifiers select the motion.
    Mouse,
    /// A finger on a touch screen.
    Touch,
    /// A stylus, handled like a mouse.
    Pen,
}

/// A pointer event.
#[derive(Debug, Clone, PartialEq)]
pub struct PointerInput {
    /// Identifies the pointer across down, move and up events.
    pub pointer_id: PointerId,
    /// The device behind the pointer.
    pub pointer_kind: PointerKind,
    /// The button that changed state. Ignored for moves and touches.
    pub button: MouseButton,
    /// Position in client (window) pixels, y down.
    pub position: Vec2,
    /// Modifier keys held at the time of the event.
    pub modifiers: Modifiers,
}

impl PointerInput {
    /// A mouse event for `button` at `position`.
    pub fn mouse(button: MouseButton, position: Vec2) -> Self {
        Self {
            pointer_id: 1,
            pointer_kind: PointerKind::Mouse,
            button,
            position,
            modifiers: Modifiers::NONE,
        }
    }

    /// A touch event for the finger `pointer_id` at `position`.
    pub fn touch(pointer_id: PointerId, position: Vec2) -> Self {
        Self {
            pointer_id,
            pointer_kind: PointerKind::Touch,
            button: MouseButton::Left,
            position,
            modifiers: Modifiers::NONE,
        }
    }

    /// Replace the held modifiers.
    pub fn with_modifiers(self, modifiers: Modifiers) -> Self {
        Self { modifiers, ..self }
    }
}

/// Unit of a wheel delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Reflect)]
pub enum WheelDeltaMode {
    /// Smooth scrolling devices like touchpads report pixels.
    #[default]
    Pixel,
    /// Notched wheels on desktop mice usually report lines.
    Line,
    /// Whole pages, rare in practice.
    Page,
}

/// A scroll event.
#[derive(Debug, Clone, PartialEq)]
pub struct WheelInput {
    /// Vertical scroll amount; negative values scroll up, which zooms in.
    pub delta_y: f32,
    /// Unit of `delta_y`.
    pub delta_mode: WheelDeltaMode,
    /// Pointer position in client pixels, used as the zoom anchor.
    pub position: Vec2,
    /// Modifier keys held at the time of the event.
    pub modifiers: Modifiers,
}

impl WheelInput {
    /// A pixel-mode scroll at `position`.
    pub fn pixels(delta_y: f32, position: Vec2) -> Self {
        Self {
            delta_y,
            delta_mode: WheelDeltaMode::Pixel,
            position,
            modifiers: Modifiers::NONE,
        }
    }
}

/// A key press.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyInput {
    /// The physical key.
    pub code: KeyCode,
    /// Modifier keys held at the time of the event.
    pub modifiers: Modifiers,
}

impl KeyInput {
    /// A key press with the given modifiers held.
    pub fn new(code: KeyCode, modifiers: Modifiers) -> Self {
        Self { code, modifiers }
    }
}

/// A single modifier key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect)]
pub enum ModifierKey {
    /// Either shift key.
    Shift,
    /// Either control key.
    Ctrl,
    /// Either alt (option) key.
    Alt,
    /// Either meta (command, windows) key.
    Meta,
}

/// The set of modifier keys held during an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Reflect)]
pub struct Modifiers {
    /// Shift is held.
    pub shift: bool,
    /// Control is held.
    pub ctrl: bool,
    /// Alt is held.
    pub alt: bool,
    /// Meta is held.
    pub meta: bool,
}

impl Modifiers {
    /// No modifiers held.
    pub const NONE: Self = Self {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    /// Only `key` held.
    pub fn only(key: ModifierKey) -> Self {
        let mut modifiers = Self::NONE;
        match key {
            ModifierKey::Shift => modifiers.shift = true,
            ModifierKey::Ctrl => modifiers.ctrl = true,
            ModifierKey::Alt => modifiers.alt = true,
            ModifierKey::Meta => modifiers.meta = true,
        }
        modifiers
    }

    /// Is `key` held?
    pub fn holds(&self, key: ModifierKey) -> bool {
        match key {
            ModifierKey::Shift => self.shift,
            ModifierKey::Ctrl => self.ctrl,
            ModifierKey::Alt => self.alt,
            ModifierKey::Meta => self.meta,
        }
    }

    /// Is no modifier held?
    pub fn is_empty(&self) -> bool {
        *self == Self::NONE
    }
}

impl From<ModifierKey> for Modifiers {
    fn from(key: ModifierKey) -> Self {
        Self::only(key)
    }
}

/// What the host should do with an event after the controller has seen it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[must_use]
pub struct EventResponse {
    /// The controller acted on the event.
    pub handled: bool,
    /// The platform default action (scrolling the page, the context menu, caret movement) should
    /// be suppressed.
    pub prevent_default: bool,
}

impl EventResponse {
    /// The event was not for the controller.
    pub const IGNORED: Self = Self {
        handled: false,
        prevent_default: false,
    };
    /// The event was consumed, but the default action may still run.
    pub const HANDLED: Self = Self {
        handled: true,
        prevent_default: false,
    };
    /// The event was consumed and the default action must be suppressed.
    pub const PREVENT_DEFAULT: Self = Self {
        handled: true,
        prevent_default: true,
    };
}

/// The element the controller listens on.
pub trait InputSurface {
    /// The surface's bounding rectangle in client pixels, used to convert pointer positions to
    /// normalized device coordinates.
    fn bounding_rect(&self) -> Rect;

    /// Route all further events of `pointer` to this surface until released.
    fn set_pointer_capture(&mut self, _pointer: PointerId) {}

    /// Release a capture taken with [`InputSurface::set_pointer_capture`].
    fn release_pointer_capture(&mut self, _pointer: PointerId) {}
}

/// A fixed rectangle without pointer capture.
impl InputSurface for Rect {
    fn bounding_rect(&self) -> Rect {
        *self
    }
}

/// Convert a client pixel position to normalized device coordinates (x right, y up, `-1..=1`)
/// relative to `rect`.
///
/// Returns `None` for an empty rectangle.
pub fn client_to_ndc(position: Vec2, rect: Rect) -> Option<Vec2> {
    let size = rect.size();
    if size.x <= 0.0 || size.y <= 0.0 {
        return None;
    }
    let normalized = (position - rect.min) / size;
    Some(Vec2::new(normalized.x * 2.0 - 1.0, 1.0 - normalized.y * 2.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ndc_is_y_up() {
        let rect = Rect::new(100.0, 50.0, 500.0, 350.0);
        assert_eq!(client_to_ndc(Vec2::new(300.0, 200.0), rect), Some(Vec2::ZERO));
        assert_eq!(
            client_to_ndc(Vec2::new(100.0, 50.0), rect),
            Some(Vec2::new(-1.0, 1.0))
        );
        assert_eq!(
            client_to_ndc(Vec2::new(500.0, 350.0), rect),
            Some(Vec2::new(1.0, -1.0))
        );
    }

    #[test]
    fn empty_rect_has_no_ndc() {
        assert_eq!(client_to_ndc(Vec2::ZERO, Rect::default()), None);
    }

    #[test]
    fn modifier_sets() {
        let shift = Modifiers::only(ModifierKey::Shift);
        assert!(shift.holds(ModifierKey::Shift));
        assert!(!shift.holds(ModifierKey::Alt));
        assert!(!shift.is_empty());
        assert!(Modifiers::default().is_empty());
        assert_eq!(Modifiers::from(ModifierKey::Meta), Modifiers::only(ModifierKey::Meta));
    }
}
