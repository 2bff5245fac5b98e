//! Provides [`CurrentMotion`], the drag state of the controller.

use bevy_derive::{Deref, DerefMut};
use bevy_input::mouse::MouseButton;
use bevy_math::Vec2;
use bevy_reflect::prelude::*;

use crate::input::PointerId;

/// The motion a screen space drag is interpreted as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect)]
pub enum DragMode {
    /// Orbit the camera about the pivot.
    Rotate,
    /// Translate the camera parallel to the view plane.
    Pan,
}

/// Which device is driving the current drag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub enum DragSource {
    /// A mouse or pen, captured on `pointer` and released with `button`.
    Mouse {
        /// The captured pointer.
        pointer: PointerId,
        /// The button that started the drag.
        button: MouseButton,
    },
    /// One or two fingers; see [`PointerSet`].
    Touch,
}

/// The drag in progress, if any. At most one drag is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Default, Reflect)]
pub enum CurrentMotion {
    /// No drag is active.
    #[default]
    Stationary,
    /// A pointer is dragging the camera.
    Dragging {
        /// The device driving the drag.
        source: DragSource,
        /// What the drag does.
        mode: DragMode,
        /// Where the drag was on the previous event, in client pixels. For two finger touches
        /// this is their midpoint.
        last: Vec2,
    },
}

impl CurrentMotion {
    /// Is a drag in progress?
    pub fn is_dragging(&self) -> bool {
        matches!(self, Self::Dragging { .. })
    }

    /// The mode of the drag in progress.
    pub fn mode(&self) -> Option<DragMode> {
        match self {
            Self::Stationary => None,
            Self::Dragging { mode, .. } => Some(*mode),
        }
    }

    /// Is the current drag driven by touches?
    pub fn is_touch(&self) -> bool {
        matches!(
            self,
            Self::Dragging {
                source: DragSource::Touch,
                ..
            }
        )
    }
}

/// A finger on the surface.
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct TouchPoint {
    /// Platform identifier of the finger.
    pub id: PointerId,
    /// Latest position in client pixels.
    pub position: Vec2,
}

/// The fingers currently pressed, in the order they touched down. Holds at most two.
#[derive(Debug, Clone, Default, PartialEq, Deref, DerefMut, Reflect)]
pub struct PointerSet(pub Vec<TouchPoint>);

impl PointerSet {
    /// The most fingers tracked at once; further touches are ignored.
    pub const CAPACITY: usize = 2;

    /// Track a new finger. Returns `false` if the set is full or already holds `id`.
    pub fn press(&mut self, id: PointerId, position: Vec2) -> bool {
        if self.len() >= Self::CAPACITY || self.contains_id(id) {
            return false;
        }
        self.push(TouchPoint { id, position });
        true
    }

    /// Update the position of a tracked finger. Returns `false` if `id` is not tracked.
    pub fn update(&mut self, id: PointerId, position: Vec2) -> bool {
        match self.iter_mut().find(|point| point.id == id) {
            Some(point) => {
                point.position = position;
                true
            }
            None => false,
        }
    }

    /// Stop tracking a finger. Returns `false` if `id` was not tracked.
    pub fn release(&mut self, id: PointerId) -> bool {
        let before = self.len();
        self.retain(|point| point.id != id);
        self.len() != before
    }

    /// Is `id` tracked?
    pub fn contains_id(&self, id: PointerId) -> bool {
        self.iter().any(|point| point.id == id)
    }

    /// Midpoint and spread of a two finger touch.
    pub fn pinch(&self) -> Option<(Vec2, f32)> {
        match self.as_slice() {
            [a, b] => Some((
                (a.position + b.position) * 0.5,
                a.position.distance(b.position),
            )),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pointer_set_holds_two_fingers() {
        let mut set = PointerSet::default();
        assert!(set.press(7, Vec2::new(0.0, 0.0)));
        assert!(!set.press(7, Vec2::new(1.0, 0.0)));
        assert!(set.press(9, Vec2::new(10.0, 0.0)));
        assert!(!set.press(11, Vec2::new(5.0, 5.0)));
        assert_eq!(set.pinch(), Some((Vec2::new(5.0, 0.0), 10.0)));

        assert!(set.update(9, Vec2::new(20.0, 0.0)));
        assert!(!set.update(11, Vec2::ZERO));
        assert_eq!(set.pinch(), Some((Vec2::new(10.0, 0.0), 20.0)));

        assert!(set.release(7));
        assert!(!set.release(7));
        assert_eq!(set.pinch(), None);
        assert_eq!(set[0].id, 9);
    }

    #[test]
    fn motion_queries() {
        let motion = CurrentMotion::Dragging {
            source: DragSource::Touch,
            mode: DragMode::Pan,
            last: Vec2::ZERO,
        };
        assert!(motion.is_dragging());
        assert!(motion.is_touch());
        assert_eq!(motion.mode(), Some(DragMode::Pan));
        assert_eq!(CurrentMotion::Stationary.mode(), None);
    }
}
