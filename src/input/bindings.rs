//! Maps from mouse buttons, touch gestures and keys to camera motions.
//!
//! Mouse and keyboard bindings are validated when they are built, so a controller can never hold
//! an ambiguous configuration. Construction fails with a [`BindingError`] naming the problem.

use bevy_input::{keyboard::KeyCode, mouse::MouseButton};
use bevy_reflect::prelude::*;
use thiserror::Error;

use super::{ModifierKey, Modifiers};
use crate::controller::motion::DragMode;

/// A binding that cannot be resolved unambiguously.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BindingError {
    /// Rotate and pan share a button, but pan has no modifier to tell them apart.
    #[error("rotate and pan both use {0:?}, so pan requires a modifier")]
    SameButtonWithoutModifier(MouseButton),
    /// Rotate and pan share a button and the same modifier.
    #[error("rotate and pan both use {0:?} with the same modifier")]
    ConflictingMouseModifiers(MouseButton),
    /// Two keyboard actions use the same modifier.
    #[error("more than one keyboard action uses the {0:?} modifier")]
    DuplicateModifier(ModifierKey),
    /// More than one keyboard action is bound without a modifier.
    #[error("at most one keyboard action may be bound without a modifier")]
    MultipleBareActions,
    /// Every keyboard action is disabled.
    #[error("at least one keyboard action must be enabled")]
    NoActiveActions,
}

/// A mouse button, optionally combined with a modifier key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub struct ButtonBinding {
    /// The button that must be pressed.
    pub button: MouseButton,
    /// A modifier that must be held. `None` matches regardless of modifiers.
    pub modifier: Option<ModifierKey>,
}

impl ButtonBinding {
    /// Does a press of `button` while holding `modifiers` match this binding?
    pub fn matches(&self, button: MouseButton, modifiers: Modifiers) -> bool {
        self.button == button && self.modifier.is_none_or(|key| modifiers.holds(key))
    }
}

/// Which mouse buttons rotate and pan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub struct InputBindings {
    rotate: ButtonBinding,
    pan: ButtonBinding,
}

impl Default for InputBindings {
    fn default() -> Self {
        Self {
            rotate: ButtonBinding {
                button: MouseButton::Left,
                modifier: None,
            },
            pan: ButtonBinding {
                button: MouseButton::Right,
                modifier: None,
            },
        }
    }
}

impl InputBindings {
    /// Validate an arbitrary pair of bindings. When both share a button, pan must carry a
    /// modifier different from rotate's.
    pub fn new(rotate: ButtonBinding, pan: ButtonBinding) -> Result<Self, BindingError> {
        if rotate.button == pan.button {
            match pan.modifier {
                None => return Err(BindingError::SameButtonWithoutModifier(pan.button)),
                Some(modifier) if rotate.modifier == Some(modifier) => {
                    return Err(BindingError::ConflictingMouseModifiers(pan.button))
                }
                Some(_) => {}
            }
        }
        Ok(Self { rotate, pan })
    }

    /// Rotate and pan on different buttons. The optional modifier is required for panning.
    pub fn different_buttons(
        rotate: MouseButton,
        pan: MouseButton,
        pan_modifier: Option<ModifierKey>,
    ) -> Result<Self, BindingError> {
        Self::new(
            ButtonBinding {
                button: rotate,
                modifier: None,
            },
            ButtonBinding {
                button: pan,
                modifier: pan_modifier,
            },
        )
    }

    /// Rotate and pan on one button; holding `pan_modifier` pans instead of rotating.
    pub fn same_button(button: MouseButton, pan_modifier: ModifierKey) -> Result<Self, BindingError> {
        Self::different_buttons(button, button, Some(pan_modifier))
    }

    /// The rotate binding.
    pub fn rotate(&self) -> ButtonBinding {
        self.rotate
    }

    /// The pan binding.
    pub fn pan(&self) -> ButtonBinding {
        self.pan
    }

    /// Pick the drag started by pressing `button` with `modifiers` held. Pan wins when both match.
    pub fn resolve(&self, button: MouseButton, modifiers: Modifiers) -> Option<DragMode> {
        if self.pan.matches(button, modifiers) {
            Some(DragMode::Pan)
        } else if self.rotate.matches(button, modifiers) {
            Some(DragMode::Rotate)
        } else {
            None
        }
    }

    /// Is `button` used by either binding?
    pub fn uses(&self, button: MouseButton) -> bool {
        self.rotate.button == button || self.pan.button == button
    }
}

/// What one and two fingers do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub struct TouchBindings {
    /// Motion driven by a single finger.
    pub one: DragMode,
    /// Motion driven by the midpoint of two fingers.
    pub two: DragMode,
    /// Should changing the distance between two fingers zoom?
    pub pinch: bool,
}

impl Default for TouchBindings {
    fn default() -> Self {
        Self {
            one: DragMode::Rotate,
            two: DragMode::Pan,
            pinch: true,
        }
    }
}

/// How a keyboard action is triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub enum KeyboardAction {
    /// Triggered by a movement key while this modifier is held.
    WithModifier(ModifierKey),
    /// Triggered by a movement key with no modifier held.
    Bare,
    /// Never triggered.
    Disabled,
}

impl KeyboardAction {
    /// Does a key press with `modifiers` held trigger this action?
    pub fn matches(&self, modifiers: Modifiers) -> bool {
        match self {
            KeyboardAction::WithModifier(key) => modifiers.holds(*key),
            KeyboardAction::Bare => modifiers.is_empty(),
            KeyboardAction::Disabled => false,
        }
    }
}

/// A keyboard action selected by [`KeyboardBindings::resolve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub enum KeyCommand {
    /// Orbit the camera.
    Rotate,
    /// Pan the camera.
    Pan,
    /// Zoom at the viewport center.
    Zoom,
}

/// Which modifiers turn the movement keys into rotate, pan or zoom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub struct KeyboardBindings {
    rotate: KeyboardAction,
    pan: KeyboardAction,
    zoom: KeyboardAction,
}

impl Default for KeyboardBindings {
    fn default() -> Self {
        Self {
            rotate: KeyboardAction::WithModifier(ModifierKey::Shift),
            pan: KeyboardAction::Bare,
            zoom: KeyboardAction::WithModifier(ModifierKey::Ctrl),
        }
    }
}

impl KeyboardBindings {
    /// Validate a keyboard configuration: at most one bare action, no shared modifiers, and at
    /// least one action enabled.
    pub fn new(
        rotate: KeyboardAction,
        pan: KeyboardAction,
        zoom: KeyboardAction,
    ) -> Result<Self, BindingError> {
        let actions = [rotate, pan, zoom];

        let bare = actions
            .iter()
            .filter(|action| matches!(action, KeyboardAction::Bare))
            .count();
        if bare > 1 {
            return Err(BindingError::MultipleBareActions);
        }

        let mut seen: Vec<ModifierKey> = Vec::with_capacity(actions.len());
        for action in actions {
            if let KeyboardAction::WithModifier(key) = action {
                if seen.contains(&key) {
                    return Err(BindingError::DuplicateModifier(key));
                }
                seen.push(key);
            }
        }

        if actions
            .iter()
            .all(|action| matches!(action, KeyboardAction::Disabled))
        {
            return Err(BindingError::NoActiveActions);
        }

        Ok(Self { rotate, pan, zoom })
    }

    /// The rotate action.
    pub fn rotate(&self) -> KeyboardAction {
        self.rotate
    }

    /// The pan action.
    pub fn pan(&self) -> KeyboardAction {
        self.pan
    }

    /// The zoom action.
    pub fn zoom(&self) -> KeyboardAction {
        self.zoom
    }

    /// Pick the command for a key press with `modifiers` held. Zoom is checked first, then rotate,
    /// then pan.
    pub fn resolve(&self, modifiers: Modifiers) -> Option<KeyCommand> {
        [
            (self.zoom, KeyCommand::Zoom),
            (self.rotate, KeyCommand::Rotate),
            (self.pan, KeyCommand::Pan),
        ]
        .into_iter()
        .find(|(action, _)| action.matches(modifiers))
        .map(|(_, command)| command)
    }
}

/// The four movement keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub struct KeyMap {
    /// Rotates or pans left.
    pub left: KeyCode,
    /// Rotates or pans up, or zooms in.
    pub up: KeyCode,
    /// Rotates or pans right.
    pub right: KeyCode,
    /// Rotates or pans down, or zooms out.
    pub bottom: KeyCode,
}

impl Default for KeyMap {
    fn default() -> Self {
        Self {
            left: KeyCode::ArrowLeft,
            up: KeyCode::ArrowUp,
            right: KeyCode::ArrowRight,
            bottom: KeyCode::ArrowDown,
        }
    }
}

/// One of the four movement keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub enum MovementKey {
    /// See [`KeyMap::left`].
    Left,
    /// See [`KeyMap::up`].
    Up,
    /// See [`KeyMap::right`].
    Right,
    /// See [`KeyMap::bottom`].
    Bottom,
}

impl KeyMap {
    /// Which movement key, if any, `code` is.
    pub fn lookup(&self, code: KeyCode) -> Option<MovementKey> {
        if code == self.left {
            Some(MovementKey::Left)
        } else if code == self.up {
            Some(MovementKey::Up)
        } else if code == self.right {
            Some(MovementKey::Right)
        } else if code == self.bottom {
            Some(MovementKey::Bottom)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use KeyboardAction::*;
    use ModifierKey::*;

    #[test]
    fn same_button_requires_modifier() {
        assert_eq!(
            InputBindings::new(
                ButtonBinding {
                    button: MouseButton::Right,
                    modifier: None,
                },
                ButtonBinding {
                    button: MouseButton::Right,
                    modifier: None,
                },
            ),
            Err(BindingError::SameButtonWithoutModifier(MouseButton::Right))
        );
        assert!(InputBindings::same_button(MouseButton::Right, Alt).is_ok());
    }

    #[test]
    fn same_button_modifiers_must_differ() {
        let binding = ButtonBinding {
            button: MouseButton::Left,
            modifier: Some(Ctrl),
        };
        assert_eq!(
            InputBindings::new(binding, binding),
            Err(BindingError::ConflictingMouseModifiers(MouseButton::Left))
        );
    }

    #[test]
    fn different_buttons_allow_optional_modifier() {
        assert!(InputBindings::different_buttons(MouseButton::Left, MouseButton::Middle, None).is_ok());
        assert!(
            InputBindings::different_buttons(MouseButton::Left, MouseButton::Middle, Some(Shift))
                .is_ok()
        );
    }

    #[test]
    fn pan_wins_on_shared_button() {
        let bindings = InputBindings::same_button(MouseButton::Right, Alt).unwrap();
        assert_eq!(
            bindings.resolve(MouseButton::Right, Modifiers::NONE),
            Some(DragMode::Rotate)
        );
        assert_eq!(
            bindings.resolve(MouseButton::Right, Modifiers::only(Alt)),
            Some(DragMode::Pan)
        );
        assert_eq!(bindings.resolve(MouseButton::Left, Modifiers::NONE), None);
    }

    #[test]
    fn pan_modifier_is_required_on_its_own_button() {
        let bindings =
            InputBindings::different_buttons(MouseButton::Left, MouseButton::Middle, Some(Shift))
                .unwrap();
        assert_eq!(bindings.resolve(MouseButton::Middle, Modifiers::NONE), None);
        assert_eq!(
            bindings.resolve(MouseButton::Middle, Modifiers::only(Shift)),
            Some(DragMode::Pan)
        );
        assert!(bindings.uses(MouseButton::Middle));
        assert!(!bindings.uses(MouseButton::Right));
    }

    #[test]
    fn keyboard_validation_faults() {
        assert_eq!(
            KeyboardBindings::new(Bare, Bare, WithModifier(Ctrl)),
            Err(BindingError::MultipleBareActions)
        );
        assert_eq!(
            KeyboardBindings::new(WithModifier(Shift), Bare, WithModifier(Shift)),
            Err(BindingError::DuplicateModifier(Shift))
        );
        assert_eq!(
            KeyboardBindings::new(Disabled, Disabled, Disabled),
            Err(BindingError::NoActiveActions)
        );
        assert!(KeyboardBindings::new(WithModifier(Shift), Bare, WithModifier(Ctrl)).is_ok());
        assert!(KeyboardBindings::new(Disabled, Bare, Disabled).is_ok());
    }

    #[test]
    fn keyboard_zoom_is_checked_first() {
        let bindings = KeyboardBindings::new(WithModifier(Shift), Bare, WithModifier(Ctrl)).unwrap();
        let ctrl_shift = Modifiers {
            ctrl: true,
            shift: true,
            ..Modifiers::NONE
        };
        assert_eq!(bindings.resolve(ctrl_shift), Some(KeyCommand::Zoom));
        assert_eq!(
            bindings.resolve(Modifiers::only(Shift)),
            Some(KeyCommand::Rotate)
        );
        assert_eq!(bindings.resolve(Modifiers::NONE), Some(KeyCommand::Pan));
        assert_eq!(bindings.resolve(Modifiers::only(Alt)), None);
    }

    #[test]
    fn key_map_lookup() {
        let keys = KeyMap::default();
        assert_eq!(keys.lookup(KeyCode::ArrowDown), Some(MovementKey::Bottom));
        assert_eq!(keys.lookup(KeyCode::KeyW), None);
    }
}
