//! Column-visibility wizard: choose which schema fields of a dataset are
//! exposed through data access.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::CompletionError;
use crate::schema::{FieldDescriptor, FieldGroup, GroupKind, InputKind, StepDescriptor, StepKind};
use crate::wizard::{
    CompletionSink, PayloadPublisher, PriorAnswers, StepDataTree, TransformSink,
    WizardDefinition,
};

pub const TITLE: &str = "Set up Access configuration";
pub const STEP_KEY: &str = "columns";
pub const GROUP: &str = "columns";

/// A column of the dataset schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaField {
    pub field_path: String,
    #[serde(rename = "type")]
    pub field_type: String,
}

impl SchemaField {
    pub fn new(field_path: impl Into<String>, field_type: impl Into<String>) -> Self {
        Self {
            field_path: field_path.into(),
            field_type: field_type.into(),
        }
    }
}

/// A previously saved per-column access setting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredFieldAccess {
    pub field_path: String,
    #[serde(default)]
    pub visible: bool,
    #[serde(default)]
    pub nda_required: bool,
}

/// Per-column access setting sent on completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaFieldAccessConfig {
    pub field_path: String,
    pub nda_required: bool,
    pub visible: bool,
    #[serde(rename = "type")]
    pub field_type: String,
}

/// The dataset's access configuration produced by the wizard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataAccessConfiguration {
    pub purpose_required: bool,
    pub field_access_config: Vec<SchemaFieldAccessConfig>,
}

impl DataAccessConfiguration {
    /// Map the wizard answers onto the schema, in schema order.
    pub fn from_tree(fields: &[SchemaField], tree: &StepDataTree) -> Result<Self, CompletionError> {
        let columns = tree
            .group(0, GROUP)
            .ok_or_else(|| CompletionError::transform("answers carry no column group"))?;

        let field_access_config = unique_fields(fields)
            .map(|field| {
                let visible = columns
                    .get(&field.field_path)
                    .and_then(|v| v.as_bool())
                    .ok_or_else(|| {
                        CompletionError::transform(format!(
                            "no visibility answer for {}",
                            field.field_path
                        ))
                    })?;
                Ok(SchemaFieldAccessConfig {
                    field_path: field.field_path.clone(),
                    nda_required: false,
                    visible,
                    field_type: field.field_type.clone(),
                })
            })
            .collect::<Result<Vec<_>, CompletionError>>()?;

        Ok(Self {
            purpose_required: true,
            field_access_config,
        })
    }
}

fn unique_fields(fields: &[SchemaField]) -> impl Iterator<Item = &SchemaField> {
    let mut seen = HashSet::new();
    fields.iter().filter(move |f| {
        let fresh = seen.insert(f.field_path.as_str());
        if !fresh {
            debug!(field = %f.field_path, "Duplicate schema field path, keeping first");
        }
        fresh
    })
}

/// Stored settings as prior answers. Columns without a stored entry keep
/// the default of visible.
pub fn prior_from_stored(stored: &[StoredFieldAccess]) -> PriorAnswers {
    let mut prior = PriorAnswers::default();
    for entry in stored {
        prior.insert(STEP_KEY, GROUP, entry.field_path.clone(), entry.visible.into());
    }
    prior
}

/// One selectable step listing every schema field, visible by default.
pub fn definition(fields: &[SchemaField], stored: &[StoredFieldAccess]) -> WizardDefinition {
    let group = unique_fields(fields).fold(
        FieldGroup::new("Fields accessibility", GroupKind::SelectableTable),
        |group, field| {
            group.with_field(
                field.field_path.clone(),
                FieldDescriptor::single(true, InputKind::SelectableCell),
            )
        },
    );

    let step = StepDescriptor::new(STEP_KEY, "Columns visibility", StepKind::SelectableTable)
        .with_group(GROUP, group);

    WizardDefinition::new(vec![step])
        .with_title(TITLE)
        .with_prior(prior_from_stored(stored))
}

/// Sink that turns the answers into a [`DataAccessConfiguration`] and
/// publishes it.
pub fn sink(
    fields: Vec<SchemaField>,
    publisher: Arc<dyn PayloadPublisher<DataAccessConfiguration>>,
) -> impl CompletionSink {
    TransformSink::new(
        move |tree: &StepDataTree| DataAccessConfiguration::from_tree(&fields, tree),
        publisher,
    )
}
