//! Per-quantity extraction of forcing fields.

pub mod extract;
pub mod fields;

pub use extract::{unstagger, ExtractedGrid, GridProcessor, LandMask, DEFAULT_MESH_MASK};
pub use fields::{FieldDescriptor, FieldKind};
