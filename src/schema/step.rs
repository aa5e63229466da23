//! Step descriptors: one wizard screen each.

use serde::{Deserialize, Serialize};

use super::group::FieldGroup;

/// Closed set of renderer variants. The tag picks both the content renderer
/// and the confirmation renderer for a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    /// Selection tables; advancing needs a selection in every table.
    SelectableTable,
    /// Generic form; advancing needs every field to validate.
    Form,
}

/// Declarative description of one wizard screen.
#[derive(Debug, Clone)]
pub struct StepDescriptor {
    pub title: String,
    /// Unique and stable across renders.
    pub key: String,
    pub kind: StepKind,
    groups: Vec<(String, FieldGroup)>,
}

impl StepDescriptor {
    pub fn new(key: impl Into<String>, title: impl Into<String>, kind: StepKind) -> Self {
        Self {
            title: title.into(),
            key: key.into(),
            kind,
            groups: Vec::new(),
        }
    }

    pub fn with_group(mut self, name: impl Into<String>, group: FieldGroup) -> Self {
        self.groups.push((name.into(), group));
        self
    }

    pub fn groups(&self) -> impl Iterator<Item = (&str, &FieldGroup)> {
        self.groups.iter().map(|(name, group)| (name.as_str(), group))
    }

    pub fn group(&self, name: &str) -> Option<&FieldGroup> {
        self.groups
            .iter()
            .find(|(group_name, _)| group_name == name)
            .map(|(_, group)| group)
    }

    pub(crate) fn group_mut(&mut self, name: &str) -> Option<&mut FieldGroup> {
        self.groups
            .iter_mut()
            .find(|(group_name, _)| group_name == name)
            .map(|(_, group)| group)
    }

    pub fn group_names(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|(name, _)| name.as_str())
    }

    pub fn has_groups(&self) -> bool {
        !self.groups.is_empty()
    }
}
