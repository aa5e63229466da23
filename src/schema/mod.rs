//! Declarative wizard description: steps, field groups and fields.
//!
//! Everything here is pure data. Renderers and the session read it; nothing
//! mutates it once a session has started.

pub mod field;
pub mod group;
pub mod step;

pub use field::{FieldDescriptor, FieldValue, InputKind, Normalizer, Scalar, ValidationRule};
pub use group::{FieldGroup, GroupKind};
pub use step::{StepDescriptor, StepKind};
