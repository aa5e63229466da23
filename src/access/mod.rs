//! Data-access wizards built on the engine, with the transforms that turn
//! their answers into domain payloads.

pub mod columns;
pub mod principal;
pub mod request;

pub use columns::{DataAccessConfiguration, SchemaField, SchemaFieldAccessConfig, StoredFieldAccess};
pub use principal::{PrincipalId, PrincipalType};
pub use request::{DataAccessRequest, TargetView};
