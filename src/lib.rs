//! A fixed-pivot camera controller for 3D editors and CAD viewers.
//!
//! Rotation always orbits a configurable pivot, panning translates the camera without moving the
//! pivot, and zooming (dolly, field of view, or orthographic scale) keeps the point under the
//! cursor fixed on screen. Motion continues under frame-rate independent momentum after input
//! stops.
//!
//! The host owns the event loop: it forwards platform events to
//! [`PivotCam::handle_event`](controller::component::PivotCam::handle_event), calls
//! [`PivotCam::update`](controller::component::PivotCam::update) every frame, and redraws on
//! [`ControlEvent::Change`](controller::events::ControlEvent::Change).
//!
//! ```
//! use bevy_input::mouse::MouseButton;
//! use bevy_math::{Rect, Vec2, Vec3};
//! use bevy_transform::prelude::Transform;
//! use pivot_cam::prelude::*;
//!
//! let camera = Camera::perspective(50.0, 16.0 / 9.0)
//!     .with_transform(Transform::from_xyz(0.0, 0.0, 10.0).looking_at(Vec3::ZERO, Vec3::Y));
//! let mut controller = PivotCam::with_surface(camera, Rect::new(0.0, 0.0, 1600.0, 900.0));
//!
//! let press = PointerInput::mouse(MouseButton::Left, Vec2::new(800.0, 450.0));
//! let drag = PointerInput::mouse(MouseButton::Left, Vec2::new(900.0, 450.0));
//! let _ = controller.handle_event(&InputEvent::PointerDown(press));
//! let _ = controller.handle_event(&InputEvent::PointerMove(drag.clone()));
//! let _ = controller.handle_event(&InputEvent::PointerUp(drag));
//!
//! while controller.update_frame() {}
//! assert!((controller.distance_to_pivot() - 10.0).abs() < 1e-3);
//! ```

#![warn(missing_docs)]

pub mod camera;
pub mod controller;
pub mod input;

/// Common imports.
pub mod prelude {
    pub use crate::{
        camera::{
            Camera, OrthographicProjection, PerspectiveProjection, Projection, ViewCamera,
        },
        controller::{
            component::{EnabledMotion, PivotCam, Speeds},
            events::{ControlEvent, ListenerId},
            momentum::Damping,
            motion::DragMode,
            zoom::{ZoomLimits, ZoomMode},
        },
        input::{
            bindings::{
                BindingError, ButtonBinding, InputBindings, KeyMap, KeyboardAction,
                KeyboardBindings, TouchBindings,
            },
            EventResponse, InputEvent, InputSurface, KeyInput, ModifierKey, Modifiers,
            PointerInput, PointerKind, WheelDeltaMode, WheelInput,
        },
    };
}
