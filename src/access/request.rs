//! Data-access-request wizard: why the data is needed, where it should be
//! provisioned, and who should get it.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::principal::PrincipalId;
use crate::error::CompletionError;
use crate::schema::{
    FieldDescriptor, FieldGroup, GroupKind, InputKind, Normalizer, StepDescriptor, StepKind,
    ValidationRule,
};
use crate::wizard::{
    CompletionSink, PayloadPublisher, StepDataTree, TransformSink, WizardDefinition,
};

pub const TITLE: &str = "Create a data access request";

const PROJECT_PATTERN: &str = r"^[a-z][-a-z0-9]{4,28}[a-z0-9]$";
const DATASET_PATTERN: &str = r"^[a-zA-Z0-9_]*$";
const VIEW_PATTERN: &str = r"^[\p{L}\p{M}\p{N}\p{Pc}\p{Pd}\p{Zs}]+$";
const PRINCIPAL_PATTERN: &str =
    r"^(serviceAccount|group):[a-z]([-a-z0-9]*[a-z0-9])?@([a-z](?:[-a-z0-9]*[a-z0-9])?\.)+[a-z]{2,}$";

/// Where the requested view is provisioned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetView {
    pub project: String,
    pub dataset: String,
    pub view: String,
}

/// A request for data access produced by the wizard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataAccessRequest {
    pub purpose: String,
    pub target: TargetView,
    pub principal: PrincipalId,
}

impl DataAccessRequest {
    pub fn from_tree(tree: &StepDataTree) -> Result<Self, CompletionError> {
        let principal = text(tree, 1, "principal", "principalId")?
            .parse::<PrincipalId>()
            .map_err(CompletionError::transform)?;

        Ok(Self {
            purpose: text(tree, 0, "purpose", "purpose")?,
            target: TargetView {
                project: text(tree, 1, "target", "project")?,
                dataset: text(tree, 1, "target", "datasetName")?,
                view: text(tree, 1, "target", "view")?,
            },
            principal,
        })
    }
}

fn text(
    tree: &StepDataTree,
    step: usize,
    group: &str,
    field: &str,
) -> Result<String, CompletionError> {
    tree.value(step, group, field)
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| CompletionError::transform(format!("missing text answer {group}.{field}")))
}

/// The two-step request form.
pub fn definition() -> Result<WizardDefinition, regex::Error> {
    let purpose = FieldGroup::new("Purpose of access", GroupKind::FieldsGroup).with_field(
        "purpose",
        FieldDescriptor::single("", InputKind::TextArea)
            .label("Purpose of access")
            .help("How/why do you intend to use the data?")
            .required(),
    );
    let requirements = StepDescriptor::new("requirements", "Requirements", StepKind::Form)
        .with_group("purpose", purpose);

    let target = FieldGroup::new("Data view to be provisioned", GroupKind::FieldsGroup)
        .with_field(
            "project",
            FieldDescriptor::single("", InputKind::TextField)
                .label("Project ID")
                .required()
                .normalize(Normalizer::Trim)
                .rule(ValidationRule::pattern(PROJECT_PATTERN, "Project Id is not valid")?)
                .tooltip(
                    "Should start with a lowercase letter, contain lowercase letters, \
                     numbers and hyphens, be 6 to 30 characters long and end with a \
                     letter or number.",
                ),
        )
        .with_field(
            "datasetName",
            FieldDescriptor::single("", InputKind::TextField)
                .label("Dataset Name")
                .required()
                .normalize(Normalizer::Trim)
                .rule(ValidationRule::max_length(
                    1024,
                    "Dataset name can contain up to 1024 characters",
                ))
                .rule(ValidationRule::pattern(
                    DATASET_PATTERN,
                    "Dataset name cannot contain spaces or special characters such as -, &, @, or %.",
                )?)
                .tooltip("The dataset must exist in the same project as specified above."),
        )
        .with_field(
            "view",
            FieldDescriptor::single("", InputKind::TextField)
                .label("View Name")
                .required()
                .rule(ValidationRule::pattern(
                    VIEW_PATTERN,
                    "View name cannot contain special characters such as &, @, or %.",
                )?),
        );

    let principal = FieldGroup::new("Authorized principal", GroupKind::FieldsGroup).with_field(
        "principalId",
        FieldDescriptor::single("", InputKind::PrincipalId)
            .label("Principal Identifier")
            .required()
            .rule(ValidationRule::pattern(
                PRINCIPAL_PATTERN,
                "Principal identifier is not valid",
            )?),
    );

    let target_step = StepDescriptor::new("target", "Target", StepKind::Form)
        .with_group("target", target)
        .with_group("principal", principal);

    Ok(WizardDefinition::new(vec![requirements, target_step]).with_title(TITLE))
}

/// Sink that turns the answers into a [`DataAccessRequest`] and publishes it.
pub fn sink(publisher: Arc<dyn PayloadPublisher<DataAccessRequest>>) -> impl CompletionSink {
    TransformSink::new(DataAccessRequest::from_tree, publisher)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WizardConfig;
    use crate::wizard::{NavigationOutcome, WizardSession};

    fn session() -> WizardSession {
        WizardSession::new(definition().unwrap(), &WizardConfig::default()).unwrap()
    }

    fn fill_target(session: &mut WizardSession, project: &str, principal: &str) {
        session.update_field(1, "target", "project", project.into()).unwrap();
        session.update_field(1, "target", "datasetName", "sales_eu".into()).unwrap();
        session.update_field(1, "target", "view", "Quarterly view".into()).unwrap();
        session
            .update_field(1, "principal", "principalId", principal.into())
            .unwrap();
    }

    #[test]
    fn patterns_compile() {
        assert!(definition().is_ok());
    }

    #[test]
    fn purpose_is_required() {
        let mut session = session();
        let outcome = session.advance().unwrap();
        assert_eq!(
            outcome,
            NavigationOutcome::Rejected {
                index: 0,
                reasons: vec!["Purpose of access is required".to_string()],
            }
        );
    }

    #[test]
    fn target_rules_reject_bad_values() {
        let mut session = session();
        session.update_field(0, "purpose", "purpose", "Churn analysis".into()).unwrap();
        session.advance().unwrap();

        fill_target(&mut session, "Bad Project", "robot:nobody");
        let outcome = session.advance().unwrap();
        let NavigationOutcome::Rejected { reasons, .. } = outcome else {
            panic!("expected the target step to reject");
        };
        assert!(reasons.contains(&"Project Id is not valid".to_string()));
        assert!(reasons.contains(&"Principal identifier is not valid".to_string()));
        assert_eq!(session.current_index(), 1);
    }

    #[test]
    fn accepted_target_is_trimmed_and_transformed() {
        let mut session = session();
        session.update_field(0, "purpose", "purpose", "Churn analysis".into()).unwrap();
        session.advance().unwrap();

        fill_target(&mut session, "  analytics-prod ", "group:analysts@example.com");
        assert!(session.advance().unwrap().moved());
        assert!(session.is_confirming());

        let request = DataAccessRequest::from_tree(session.tree()).unwrap();
        assert_eq!(request.target.project, "analytics-prod");
        assert_eq!(request.target.dataset, "sales_eu");
        assert_eq!(request.principal.to_string(), "group:analysts@example.com");
        assert_eq!(request.purpose, "Churn analysis");
    }
}
