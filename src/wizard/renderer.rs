//! Step renderers: the two capabilities the engine needs from a step:
//! answering a pending navigation intent, and building a read-only
//! confirmation section.
//!
//! The set of renderers is closed. A step's [`StepKind`] tag selects one.

use serde::Serialize;

use super::gate::{GateDecision, Intent};
use super::tree::{GroupData, StepData};
use crate::schema::{FieldValue, GroupKind, StepDescriptor, StepKind};

/// Capability interface implemented by every renderer variant.
pub trait StepRenderer: Send + Sync {
    /// Decide a pending intent from the step's current data alone.
    fn evaluate(&self, step: &StepDescriptor, data: &StepData, intent: Intent) -> GateDecision;

    /// Project the step's data into a display-only summary.
    fn confirm(&self, step: &StepDescriptor, data: &StepData) -> ConfirmationSection;

    /// Whether groups of `kind` can be rendered, gated and confirmed by this
    /// renderer. Declarations using any other kind are rejected up front.
    fn handles(&self, kind: GroupKind) -> bool;
}

impl StepKind {
    pub fn renderer(&self) -> &'static dyn StepRenderer {
        match self {
            Self::SelectableTable => &SelectableTable,
            Self::Form => &FormFields,
        }
    }
}

/// Renders `selectable-table` groups as row selections.
#[derive(Debug, Clone, Copy, Default)]
pub struct SelectableTable;

impl StepRenderer for SelectableTable {
    fn evaluate(&self, step: &StepDescriptor, data: &StepData, intent: Intent) -> GateDecision {
        if intent != Intent::Advance {
            return GateDecision::accept();
        }

        let reasons: Vec<String> = step
            .groups()
            .filter(|(name, _)| {
                !data
                    .get(*name)
                    .is_some_and(|values| values.values().any(FieldValue::is_truthy))
            })
            .map(|(_, group)| format!("Select at least one entry in {}", group.label))
            .collect();

        if reasons.is_empty() {
            GateDecision::accept()
        } else {
            GateDecision::reject(reasons)
        }
    }

    fn confirm(&self, step: &StepDescriptor, data: &StepData) -> ConfirmationSection {
        let groups = step
            .groups()
            .map(|(name, group)| ConfirmationGroup {
                name: name.to_string(),
                label: group.label.clone(),
                entries: group
                    .field_names()
                    .filter_map(|field| {
                        let value = data.get(name)?.get(field)?;
                        Some(ConfirmationEntry {
                            field: field.to_string(),
                            label: field.to_string(),
                            value: value.clone(),
                        })
                    })
                    .collect(),
            })
            .collect();

        ConfirmationSection::new(step, groups)
    }

    fn handles(&self, kind: GroupKind) -> bool {
        kind == GroupKind::SelectableTable
    }
}

/// Renders `fields-group` groups as a validated form.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormFields;

impl StepRenderer for FormFields {
    fn evaluate(&self, step: &StepDescriptor, data: &StepData, intent: Intent) -> GateDecision {
        if intent != Intent::Advance {
            return GateDecision::accept();
        }

        let mut sanitized = StepData::new();
        let mut reasons = Vec::new();

        for (group_name, group) in step.groups() {
            let Some(current) = data.get(group_name) else {
                reasons.push(format!("{} has no data", group.label));
                continue;
            };

            let mut values = GroupData::new();
            for (name, field) in group.fields() {
                let Some(value) = current.get(name) else {
                    reasons.push(format!("{} is missing", field.display_label(name)));
                    continue;
                };
                let normalized = field.normalized(value);
                reasons.extend(field.validate(name, &normalized));
                values.insert(name.to_string(), normalized);
            }
            sanitized.insert(group_name.to_string(), values);
        }

        if !reasons.is_empty() {
            return GateDecision::reject(reasons);
        }
        if sanitized.is_empty() {
            GateDecision::accept()
        } else {
            GateDecision::accept_with(sanitized)
        }
    }

    fn confirm(&self, step: &StepDescriptor, data: &StepData) -> ConfirmationSection {
        let groups = step
            .groups()
            .map(|(name, group)| ConfirmationGroup {
                name: name.to_string(),
                label: group.label.clone(),
                entries: group
                    .fields()
                    .filter_map(|(field_name, field)| {
                        let value = data.get(name)?.get(field_name)?;
                        Some(ConfirmationEntry {
                            field: field_name.to_string(),
                            label: field.display_label(field_name).to_string(),
                            value: value.clone(),
                        })
                    })
                    .collect(),
            })
            .collect();

        ConfirmationSection::new(step, groups)
    }

    fn handles(&self, kind: GroupKind) -> bool {
        kind == GroupKind::FieldsGroup
    }
}

/// One label/value pair in the review.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfirmationEntry {
    pub field: String,
    pub label: String,
    pub value: FieldValue,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfirmationGroup {
    pub name: String,
    pub label: String,
    pub entries: Vec<ConfirmationEntry>,
}

/// The review of one step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfirmationSection {
    pub step_key: String,
    pub title: String,
    pub groups: Vec<ConfirmationGroup>,
}

impl ConfirmationSection {
    fn new(step: &StepDescriptor, groups: Vec<ConfirmationGroup>) -> Self {
        Self {
            step_key: step.key.clone(),
            title: step.title.clone(),
            groups,
        }
    }

    /// Look up an entry's value by group and field name.
    pub fn value(&self, group: &str, field: &str) -> Option<&FieldValue> {
        self.groups
            .iter()
            .find(|g| g.name == group)?
            .entries
            .iter()
            .find(|e| e.field == field)
            .map(|e| &e.value)
    }
}

/// The full read-only review shown at the confirmation position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfirmationView {
    pub sections: Vec<ConfirmationSection>,
}

impl ConfirmationView {
    /// Render the review as plain text, one `label: value` line per entry.
    pub fn to_text(&self) -> String {
        let mut lines = vec!["Summary".to_string()];
        for section in &self.sections {
            lines.push(format!("## {}", section.title));
            for group in &section.groups {
                lines.push(format!("### {}", group.label));
                for entry in &group.entries {
                    lines.push(format!("- {}: {}", entry.label, entry.value));
                }
            }
        }
        lines.join("\n")
    }
}
