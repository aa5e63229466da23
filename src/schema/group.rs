//! Field groups: named clusters of fields sharing one rendering strategy.

use serde::{Deserialize, Serialize};

use super::field::FieldDescriptor;

/// How a group is rendered and aggregated. Fixed at declaration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GroupKind {
    /// A table of rows the user selects or deselects.
    SelectableTable,
    /// A form of free-form input fields.
    FieldsGroup,
}

impl std::fmt::Display for GroupKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SelectableTable => write!(f, "selectable-table"),
            Self::FieldsGroup => write!(f, "fields-group"),
        }
    }
}

/// A labeled collection of fields, kept in declaration order.
#[derive(Debug, Clone)]
pub struct FieldGroup {
    pub label: String,
    pub kind: GroupKind,
    fields: Vec<(String, FieldDescriptor)>,
}

impl FieldGroup {
    pub fn new(label: impl Into<String>, kind: GroupKind) -> Self {
        Self {
            label: label.into(),
            kind,
            fields: Vec::new(),
        }
    }

    /// Append a field. Duplicate names are caught when the data tree is built.
    pub fn with_field(mut self, name: impl Into<String>, field: FieldDescriptor) -> Self {
        self.fields.push((name.into(), field));
        self
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldDescriptor)> {
        self.fields.iter().map(|(name, field)| (name.as_str(), field))
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields
            .iter()
            .find(|(field_name, _)| field_name == name)
            .map(|(_, field)| field)
    }

    pub(crate) fn field_mut(&mut self, name: &str) -> Option<&mut FieldDescriptor> {
        self.fields
            .iter_mut()
            .find(|(field_name, _)| field_name == name)
            .map(|(_, field)| field)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
