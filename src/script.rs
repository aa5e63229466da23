//! Headless replay of a wizard session from a JSON script.
//!
//! A script picks one of the built-in wizards and lists the events a user
//! would produce: field edits, navigation and the final "Done". Events are
//! applied in order; rejected edits and failed hand-offs are recorded in the
//! report rather than aborting the run.
//!
//! ```json
//! {
//!   "wizard": { "kind": "column_visibility", "columns": [{"fieldPath": "id", "type": "NUMBER"}] },
//!   "events": [
//!     { "action": "set_field", "step": 0, "group": "columns", "field": "id", "value": false },
//!     { "action": "advance" },
//!     { "action": "done" }
//!   ]
//! }
//! ```

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::access::{DataAccessConfiguration, DataAccessRequest, SchemaField, StoredFieldAccess};
use crate::access::{columns, request};
use crate::config::WizardConfig;
use crate::error::{ConfigError, Result, ScriptError};
use crate::schema::FieldValue;
use crate::wizard::{
    CompletionSink, ConfirmationView, GroupData, MemoryPublisher, NavigationOutcome,
    PayloadPublisher, SessionStatus, WizardDefinition, WizardSession,
};

/// Which built-in wizard a script drives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WizardChoice {
    ColumnVisibility {
        columns: Vec<SchemaField>,
        #[serde(default)]
        stored: Vec<StoredFieldAccess>,
    },
    AccessRequest,
}

/// One user action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ScriptEvent {
    SetField {
        step: usize,
        group: String,
        field: String,
        value: FieldValue,
    },
    SetGroup {
        step: usize,
        group: String,
        values: GroupData,
    },
    Advance,
    Retreat,
    Done,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Script {
    pub wizard: WizardChoice,
    #[serde(default)]
    pub events: Vec<ScriptEvent>,
}

impl Script {
    pub fn from_json(raw: &str) -> std::result::Result<Self, ConfigError> {
        serde_json::from_str(raw).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    pub async fn from_path(path: impl AsRef<Path>) -> std::result::Result<Self, ConfigError> {
        let raw = tokio::fs::read_to_string(path.as_ref()).await?;
        Self::from_json(&raw)
    }
}

/// What happened for one event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventOutcome {
    Updated,
    UpdateRejected { message: String },
    Navigation(NavigationOutcome),
    Completed,
    CompletionFailed { message: String },
}

/// Result of replaying a script.
#[derive(Debug, Clone, Serialize)]
pub struct ScriptReport {
    pub session: Uuid,
    pub title: String,
    pub steps: Vec<String>,
    pub outcomes: Vec<EventOutcome>,
    pub final_index: usize,
    pub status: SessionStatus,
    pub confirmation: Option<ConfirmationView>,
    pub payload: Option<serde_json::Value>,
}

/// Replay `script` against a fresh session of the chosen wizard.
pub async fn run_script(script: Script, config: &WizardConfig) -> Result<ScriptReport> {
    match script.wizard {
        WizardChoice::ColumnVisibility {
            columns: fields,
            stored,
        } => {
            let definition = columns::definition(&fields, &stored);
            let publisher = MemoryPublisher::<DataAccessConfiguration>::new();
            let sink = columns::sink(
                fields,
                publisher.clone() as Arc<dyn PayloadPublisher<DataAccessConfiguration>>,
            );
            replay(definition, &sink, &publisher, &script.events, config).await
        }
        WizardChoice::AccessRequest => {
            let definition = request::definition().map_err(ScriptError::from)?;
            let publisher = MemoryPublisher::<DataAccessRequest>::new();
            let sink =
                request::sink(publisher.clone() as Arc<dyn PayloadPublisher<DataAccessRequest>>);
            replay(definition, &sink, &publisher, &script.events, config).await
        }
    }
}

async fn replay<P>(
    definition: WizardDefinition,
    sink: &dyn CompletionSink,
    publisher: &MemoryPublisher<P>,
    events: &[ScriptEvent],
    config: &WizardConfig,
) -> Result<ScriptReport>
where
    P: Serialize + Clone + Send + Sync,
{
    let mut session = WizardSession::new(definition, config)?;
    let mut outcomes = Vec::with_capacity(events.len());

    for event in events {
        debug!(session = %session.id(), ?event, "Replaying event");
        let outcome = match event {
            ScriptEvent::SetField {
                step,
                group,
                field,
                value,
            } => edit(session.update_field(*step, group, field, value.clone())),
            ScriptEvent::SetGroup {
                step,
                group,
                values,
            } => edit(session.update_group_data(*step, group, values.clone())),
            ScriptEvent::Advance => EventOutcome::Navigation(session.advance()?),
            ScriptEvent::Retreat => EventOutcome::Navigation(session.retreat()?),
            ScriptEvent::Done => match session.complete(sink).await {
                Ok(()) => EventOutcome::Completed,
                Err(e) => EventOutcome::CompletionFailed {
                    message: e.to_string(),
                },
            },
        };
        outcomes.push(outcome);
    }

    let payload = match publisher.last().await {
        Some(payload) => Some(serde_json::to_value(payload).map_err(ScriptError::from)?),
        None => None,
    };

    let report = ScriptReport {
        session: session.id(),
        title: session.title().to_string(),
        steps: session.step_titles().into_iter().map(str::to_string).collect(),
        outcomes,
        final_index: session.current_index(),
        status: session.status().clone(),
        confirmation: session.confirmation(),
        payload,
    };

    info!(
        session = %report.session,
        events = events.len(),
        final_index = report.final_index,
        published = report.payload.is_some(),
        "Script replay finished"
    );
    session.close();
    Ok(report)
}

fn edit(result: Result<()>) -> EventOutcome {
    match result {
        Ok(()) => EventOutcome::Updated,
        Err(e) => EventOutcome::UpdateRejected {
            message: e.to_string(),
        },
    }
}
