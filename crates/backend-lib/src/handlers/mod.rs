//! HTTP handlers for the room and metadata surfaces.

pub mod metadata;
pub mod rooms;
