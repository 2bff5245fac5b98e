//! The camera controller: [`component::PivotCam`] and the parts it is built from.

pub mod component;
pub mod events;
pub mod geometry;
pub mod momentum;
pub mod motion;
pub mod operations;
pub mod zoom;
