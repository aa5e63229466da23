//! Wizard engine: drives a user through declared steps and hands the
//! collected answers to a completion sink.
//!
//! ## Architecture
//!
//! ```text
//! WizardSession
//!   ├── StepDataTree (answers: step index → group → field)
//!   ├── GatePhase    (displaying / intent pending / accepted / rejected)
//!   ├── StepRenderer (per StepKind: evaluate intent, build confirmation)
//!   └── CompletionSink (transform + publish on "Done")
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! let mut session = WizardSession::open(&source, &config).await?;
//! session.update_field(0, "columns", "email", false.into())?;
//! session.advance()?;
//! if let Some(view) = session.confirmation() {
//!     println!("{}", view.to_text());
//!     session.complete(&sink).await?;
//! }
//! ```

pub mod gate;
pub mod renderer;
pub mod session;
pub mod sink;
pub mod source;
pub mod tree;

pub use gate::{GateDecision, GatePhase, Intent, NavigationOutcome};
pub use renderer::{
    ConfirmationEntry, ConfirmationGroup, ConfirmationSection, ConfirmationView, FormFields,
    SelectableTable, StepRenderer,
};
pub use session::{SessionStatus, WizardSession};
pub use sink::{CompletionSink, MemoryPublisher, PayloadPublisher, TransformSink, tree_payload};
pub use source::{ConfigurationSource, PriorAnswers, StaticSource, WizardDefinition};
pub use tree::{GroupData, StepData, StepDataTree};
