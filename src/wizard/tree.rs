//! Step data tree: accumulated answers keyed by step index, group, field.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::ShapeError;
use crate::schema::{FieldValue, StepDescriptor};

/// Field name → value for one group.
pub type GroupData = BTreeMap<String, FieldValue>;

/// Group name → group data for one step.
pub type StepData = BTreeMap<String, GroupData>;

/// The answers of a whole session.
///
/// Its shape always equals the declared shape: every declared group and
/// field is present for every step, and nothing else is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepDataTree {
    steps: Vec<StepData>,
}

impl StepDataTree {
    /// Build the tree from declared defaults. Pure: the same descriptors
    /// always yield the same tree.
    pub fn initialize(steps: &[StepDescriptor]) -> Result<Self, ShapeError> {
        check_declarations(steps)?;

        let steps = steps
            .iter()
            .map(|step| {
                step.groups()
                    .map(|(group_name, group)| {
                        let fields = group
                            .fields()
                            .map(|(name, field)| (name.to_string(), field.default_value.clone()))
                            .collect();
                        (group_name.to_string(), fields)
                    })
                    .collect()
            })
            .collect();

        Ok(Self { steps })
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn step(&self, index: usize) -> Option<&StepData> {
        self.steps.get(index)
    }

    pub fn group(&self, index: usize, group: &str) -> Option<&GroupData> {
        self.steps.get(index)?.get(group)
    }

    pub fn value(&self, index: usize, group: &str, field: &str) -> Option<&FieldValue> {
        self.group(index, group)?.get(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &StepData)> {
        self.steps.iter().enumerate()
    }

    /// Replace one group of one step. The new values must carry exactly the
    /// declared fields with the declared shapes; other steps and groups are
    /// left untouched.
    pub fn update_group(
        &mut self,
        steps: &[StepDescriptor],
        index: usize,
        group: &str,
        values: GroupData,
    ) -> Result<(), ShapeError> {
        let step = descriptor_at(steps, index)?;
        check_group(step, index, group, &values)?;

        let slot = self
            .steps
            .get_mut(index)
            .and_then(|data| data.get_mut(group))
            .ok_or_else(|| ShapeError::UnknownGroup {
                step: index,
                group: group.to_string(),
            })?;
        *slot = values;
        Ok(())
    }

    /// Replace every group present in `payload`. All groups are checked
    /// before any is written, so a bad payload leaves the tree unchanged.
    pub fn merge_step(
        &mut self,
        steps: &[StepDescriptor],
        index: usize,
        payload: StepData,
    ) -> Result<(), ShapeError> {
        let step = descriptor_at(steps, index)?;
        for (group, values) in &payload {
            check_group(step, index, group, values)?;
        }

        let Some(data) = self.steps.get_mut(index) else {
            return Err(ShapeError::UnknownStep {
                index,
                count: self.steps.len(),
            });
        };
        for (group, values) in payload {
            data.insert(group, values);
        }
        Ok(())
    }

    /// Whether this tree carries exactly the shape `steps` declares.
    pub fn conforms_to(&self, steps: &[StepDescriptor]) -> bool {
        self.steps.len() == steps.len()
            && steps.iter().zip(&self.steps).enumerate().all(|(index, (step, data))| {
                data.len() == step.groups().count()
                    && step.group_names().all(|group| {
                        data.get(group)
                            .is_some_and(|values| check_group(step, index, group, values).is_ok())
                    })
            })
    }
}

fn descriptor_at(steps: &[StepDescriptor], index: usize) -> Result<&StepDescriptor, ShapeError> {
    steps.get(index).ok_or(ShapeError::UnknownStep {
        index,
        count: steps.len(),
    })
}

/// Reject declarations with duplicate step keys, group names, field names,
/// group kinds the step's renderer cannot handle, or defaults whose shape
/// disagrees with `multi_value`.
pub fn check_declarations(steps: &[StepDescriptor]) -> Result<(), ShapeError> {
    let mut keys = HashSet::new();
    for (index, step) in steps.iter().enumerate() {
        if !keys.insert(step.key.as_str()) {
            return Err(ShapeError::DuplicateStepKey {
                key: step.key.clone(),
            });
        }

        let renderer = step.kind.renderer();
        let mut group_names = HashSet::new();
        for (group_name, group) in step.groups() {
            if !group_names.insert(group_name) {
                return Err(ShapeError::DuplicateGroup {
                    step: step.key.clone(),
                    group: group_name.to_string(),
                });
            }
            if !renderer.handles(group.kind) {
                return Err(ShapeError::UnsupportedGroupKind {
                    step: step.key.clone(),
                    group: group_name.to_string(),
                    kind: group.kind,
                });
            }

            let mut field_names = HashSet::new();
            for (name, field) in group.fields() {
                if !field_names.insert(name) {
                    return Err(ShapeError::DuplicateField {
                        group: group_name.to_string(),
                        field: name.to_string(),
                    });
                }
                if !field.accepts_shape(&field.default_value) {
                    return Err(ShapeError::ValueShape {
                        step: index,
                        group: group_name.to_string(),
                        field: name.to_string(),
                        expected: FieldValue::shape_name(field.multi_value),
                    });
                }
            }
        }
    }
    Ok(())
}

/// Check that `values` carries exactly the fields `group` declares on `step`,
/// each with the declared shape.
pub fn check_group(
    step: &StepDescriptor,
    index: usize,
    group: &str,
    values: &GroupData,
) -> Result<(), ShapeError> {
    let declared = step.group(group).ok_or_else(|| ShapeError::UnknownGroup {
        step: index,
        group: group.to_string(),
    })?;

    for (name, field) in declared.fields() {
        let Some(value) = values.get(name) else {
            return Err(ShapeError::MissingField {
                step: index,
                group: group.to_string(),
                field: name.to_string(),
            });
        };
        if !field.accepts_shape(value) {
            return Err(ShapeError::ValueShape {
                step: index,
                group: group.to_string(),
                field: name.to_string(),
                expected: FieldValue::shape_name(field.multi_value),
            });
        }
    }

    if let Some(extra) = values.keys().find(|name| declared.field(name).is_none()) {
        return Err(ShapeError::UnexpectedField {
            step: index,
            group: group.to_string(),
            field: extra.clone(),
        });
    }
    Ok(())
}
