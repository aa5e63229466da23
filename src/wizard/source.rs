//! Inbound configuration: step descriptors plus stored prior answers.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::tree::StepData;
use crate::error::SourceError;
use crate::schema::StepDescriptor;

/// Everything a session needs to start.
#[derive(Debug, Clone, Default)]
pub struct WizardDefinition {
    pub title: Option<String>,
    pub steps: Vec<StepDescriptor>,
    pub prior: PriorAnswers,
}

impl WizardDefinition {
    pub fn new(steps: Vec<StepDescriptor>) -> Self {
        Self {
            title: None,
            steps,
            prior: PriorAnswers::default(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_prior(mut self, prior: PriorAnswers) -> Self {
        self.prior = prior;
        self
    }
}

/// Source of wizard definitions, e.g. a schema lookup or a stored config.
#[async_trait]
pub trait ConfigurationSource: Send + Sync {
    async fn load(&self) -> Result<WizardDefinition, SourceError>;
}

/// A source that always yields the same definition.
#[derive(Debug, Clone)]
pub struct StaticSource {
    definition: WizardDefinition,
}

impl StaticSource {
    pub fn new(definition: WizardDefinition) -> Self {
        Self { definition }
    }
}

#[async_trait]
impl ConfigurationSource for StaticSource {
    async fn load(&self) -> Result<WizardDefinition, SourceError> {
        Ok(self.definition.clone())
    }
}

/// Previously stored answers, keyed by step key, group and field.
///
/// Only used to seed field defaults: a field present here starts with the
/// stored value, every other field keeps its declared default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PriorAnswers {
    steps: BTreeMap<String, StepData>,
}

impl PriorAnswers {
    pub fn from_json(raw: &str) -> Result<Self, SourceError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Record a stored value for one field.
    pub fn insert(
        &mut self,
        step_key: impl Into<String>,
        group: impl Into<String>,
        field: impl Into<String>,
        value: crate::schema::FieldValue,
    ) {
        self.steps
            .entry(step_key.into())
            .or_default()
            .entry(group.into())
            .or_default()
            .insert(field.into(), value);
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Overwrite the default of every declared field that has a stored value.
    /// Returns how many fields were seeded.
    pub fn seed(&self, steps: &mut [StepDescriptor]) -> usize {
        let mut seeded = 0;
        for (step_key, groups) in &self.steps {
            let Some(step) = steps.iter_mut().find(|s| &s.key == step_key) else {
                debug!(step = %step_key, "Stored answers for unknown step, skipping");
                continue;
            };
            for (group_name, fields) in groups {
                let Some(group) = step.group_mut(group_name) else {
                    debug!(
                        step = %step_key,
                        group = %group_name,
                        "Stored answers for unknown group, skipping"
                    );
                    continue;
                };
                for (field_name, value) in fields {
                    let Some(field) = group.field_mut(field_name) else {
                        debug!(
                            step = %step_key,
                            group = %group_name,
                            field = %field_name,
                            "Stored answer for unknown field, skipping"
                        );
                        continue;
                    };
                    if !field.accepts_shape(value) {
                        warn!(
                            step = %step_key,
                            group = %group_name,
                            field = %field_name,
                            "Stored value shape disagrees with declaration, keeping default"
                        );
                        continue;
                    }
                    field.default_value = value.clone();
                    seeded += 1;
                }
            }
        }
        seeded
    }
}
