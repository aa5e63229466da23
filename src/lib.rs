//! Access Wizard: a configuration-driven multi-step wizard engine, plus the
//! data-access wizards built on it.

pub mod access;
pub mod config;
pub mod error;
pub mod schema;
pub mod script;
pub mod wizard;
