//! End-to-end wizard flows: initialization, gating, confirmation and the
//! completion hand-off, driven through the public session API.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use access_wizard::config::WizardConfig;
use access_wizard::error::{CompletionError, Error, ShapeError, SourceError};
use access_wizard::schema::{
    FieldDescriptor, FieldGroup, FieldValue, GroupKind, InputKind, Normalizer, StepDescriptor,
    StepKind,
};
use access_wizard::wizard::{
    CompletionSink, ConfigurationSource, MemoryPublisher, NavigationOutcome, PayloadPublisher,
    PriorAnswers, SessionStatus, StaticSource, StepDataTree, TransformSink, WizardDefinition,
    WizardSession, tree_payload,
};

fn three_field_step() -> StepDescriptor {
    StepDescriptor::new("columns", "Columns", StepKind::SelectableTable).with_group(
        "columns",
        FieldGroup::new("Columns", GroupKind::SelectableTable)
            .with_field("a", FieldDescriptor::single(true, InputKind::SelectableCell))
            .with_field("b", FieldDescriptor::single(false, InputKind::SelectableCell))
            .with_field("c", FieldDescriptor::single(true, InputKind::SelectableCell)),
    )
}

fn required_text_step() -> StepDescriptor {
    StepDescriptor::new("purpose", "Purpose", StepKind::Form).with_group(
        "purpose",
        FieldGroup::new("Purpose", GroupKind::FieldsGroup).with_field(
            "text",
            FieldDescriptor::single("", InputKind::TextArea)
                .label("Purpose")
                .required()
                .normalize(Normalizer::Trim),
        ),
    )
}

fn notes_step() -> StepDescriptor {
    StepDescriptor::new("notes", "Notes", StepKind::Form).with_group(
        "notes",
        FieldGroup::new("Notes", GroupKind::FieldsGroup)
            .with_field("comment", FieldDescriptor::single("", InputKind::TextField))
            .with_field(
                "tags",
                FieldDescriptor::multi(vec!["x".into()], InputKind::Radio),
            ),
    )
}

fn open(steps: Vec<StepDescriptor>) -> WizardSession {
    WizardSession::new(WizardDefinition::new(steps), &WizardConfig::default()).unwrap()
}

fn key_sets(tree: &StepDataTree) -> Vec<BTreeMap<String, Vec<String>>> {
    tree.iter()
        .map(|(_, step)| {
            step.iter()
                .map(|(group, fields)| (group.clone(), fields.keys().cloned().collect()))
                .collect()
        })
        .collect()
}

fn tree_publisher() -> (Arc<MemoryPublisher<StepDataTree>>, impl CompletionSink) {
    let publisher = MemoryPublisher::<StepDataTree>::new();
    let sink = TransformSink::new(
        tree_payload,
        publisher.clone() as Arc<dyn PayloadPublisher<StepDataTree>>,
    );
    (publisher, sink)
}

struct FailingSource;

#[async_trait]
impl ConfigurationSource for FailingSource {
    async fn load(&self) -> Result<WizardDefinition, SourceError> {
        Err(SourceError::Unavailable("schema service down".into()))
    }
}

struct SlowSink;

#[async_trait]
impl CompletionSink for SlowSink {
    async fn complete(&self, _tree: &StepDataTree) -> Result<(), CompletionError> {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok(())
    }
}

#[test]
fn initialized_tree_matches_declared_shape() {
    let session = open(vec![three_field_step(), required_text_step(), notes_step()]);
    let tree = session.tree();

    assert_eq!(tree.len(), 3);
    assert!(tree.conforms_to(session.steps()));
    assert_eq!(
        tree.value(0, "columns", "b"),
        Some(&FieldValue::from(false))
    );
    assert_eq!(tree.value(1, "purpose", "text"), Some(&FieldValue::from("")));
    assert_eq!(
        tree.value(2, "notes", "tags"),
        Some(&FieldValue::Many(vec!["x".into()]))
    );

    let again = StepDataTree::initialize(session.steps()).unwrap();
    assert_eq!(&again, tree);
}

#[test]
fn mixed_kind_step_is_refused_at_open() {
    let mixed = StepDescriptor::new("purpose", "Purpose", StepKind::Form)
        .with_group(
            "purpose",
            FieldGroup::new("Purpose", GroupKind::FieldsGroup)
                .with_field("text", FieldDescriptor::single("", InputKind::TextArea)),
        )
        .with_group(
            "columns",
            FieldGroup::new("Columns", GroupKind::SelectableTable)
                .with_field("a", FieldDescriptor::single(false, InputKind::SelectableCell)),
        );

    let result = WizardSession::new(
        WizardDefinition::new(vec![mixed, three_field_step()]),
        &WizardConfig::default(),
    );
    assert!(matches!(
        result,
        Err(Error::Shape(ShapeError::UnsupportedGroupKind { ref group, .. })) if group == "columns"
    ));
}

#[test]
fn group_update_is_idempotent_and_isolated() {
    let mut session = open(vec![three_field_step(), notes_step()]);
    let before_notes = session.tree().step(1).cloned();

    let values: BTreeMap<String, FieldValue> = [
        ("a".to_string(), false.into()),
        ("b".to_string(), true.into()),
        ("c".to_string(), true.into()),
    ]
    .into_iter()
    .collect();

    session.update_group_data(0, "columns", values.clone()).unwrap();
    let once = session.tree().clone();
    session.update_group_data(0, "columns", values).unwrap();

    assert_eq!(session.tree(), &once);
    assert_eq!(session.tree().step(1).cloned(), before_notes);
}

#[test]
fn partial_group_update_is_rejected_without_change() {
    let mut session = open(vec![three_field_step()]);
    let before = session.tree().clone();

    let partial: BTreeMap<String, FieldValue> =
        [("a".to_string(), false.into())].into_iter().collect();
    let err = session.update_group_data(0, "columns", partial).unwrap_err();

    assert!(matches!(err, Error::Shape(_)));
    assert_eq!(session.tree(), &before);
}

#[test]
fn rejected_advance_keeps_index_and_tree() {
    let mut session = open(vec![three_field_step(), required_text_step()]);
    for field in ["a", "c"] {
        session.update_field(0, "columns", field, false.into()).unwrap();
    }
    let before = session.tree().clone();

    let outcome = session.advance().unwrap();
    assert!(matches!(outcome, NavigationOutcome::Rejected { index: 0, .. }));
    assert_eq!(session.current_index(), 0);
    assert_eq!(session.tree(), &before);
}

#[test]
fn accepted_advance_merges_sanitized_payload() {
    let mut session = open(vec![required_text_step(), three_field_step()]);
    session
        .update_field(0, "purpose", "text", "  quarterly audit  ".into())
        .unwrap();

    let outcome = session.advance().unwrap();
    assert_eq!(outcome, NavigationOutcome::Moved { from: 0, to: 1 });
    assert_eq!(
        session.tree().value(0, "purpose", "text"),
        Some(&FieldValue::from("quarterly audit"))
    );
}

#[test]
fn retreat_from_first_step_stays_put() {
    let mut session = open(vec![three_field_step(), required_text_step()]);
    session.retreat().unwrap();
    session.retreat().unwrap();
    assert_eq!(session.current_index(), 0);
}

#[test]
fn confirmation_does_not_touch_the_tree() {
    let mut session = open(vec![three_field_step()]);
    session.advance().unwrap();
    assert!(session.is_confirming());

    let before = session.tree().clone();
    let view = session.confirmation().unwrap();
    let _ = view.to_text();
    let again = session.confirmation().unwrap();

    assert_eq!(session.tree(), &before);
    assert_eq!(view, again);
}

#[tokio::test]
async fn three_field_scenario_delivers_the_confirmed_tree() {
    let mut session = open(vec![three_field_step()]);
    let initial_shape = key_sets(session.tree());

    session.update_field(0, "columns", "a", false.into()).unwrap();
    assert!(session.advance().unwrap().moved());

    let view = session.confirmation().unwrap();
    let section = &view.sections[0];
    assert_eq!(section.value("columns", "a"), Some(&FieldValue::from(false)));
    assert_eq!(section.value("columns", "b"), Some(&FieldValue::from(false)));
    assert_eq!(section.value("columns", "c"), Some(&FieldValue::from(true)));

    let (publisher, sink) = tree_publisher();
    session.complete(&sink).await.unwrap();

    let delivered = publisher.last().await.unwrap();
    assert_eq!(&delivered, session.tree());
    assert_eq!(key_sets(&delivered), initial_shape);
    assert_eq!(delivered.value(0, "columns", "a"), Some(&FieldValue::from(false)));
    assert_eq!(session.status(), &SessionStatus::Completed);
}

#[test]
fn required_text_gates_the_first_step() {
    let mut session = open(vec![required_text_step(), three_field_step()]);

    let outcome = session.advance().unwrap();
    assert_eq!(
        outcome,
        NavigationOutcome::Rejected {
            index: 0,
            reasons: vec!["Purpose is required".to_string()],
        }
    );
    assert_eq!(session.current_index(), 0);

    session.update_field(0, "purpose", "text", "   ".into()).unwrap();
    assert!(!session.advance().unwrap().moved());

    session.update_field(0, "purpose", "text", "audit".into()).unwrap();
    assert!(session.advance().unwrap().moved());
    assert_eq!(session.current_index(), 1);
}

#[tokio::test]
async fn prior_answers_seed_defaults_on_reopen() {
    let mut prior = PriorAnswers::default();
    prior.insert("columns", "columns", "b", true.into());
    let definition = WizardDefinition::new(vec![three_field_step()]).with_prior(prior);
    let source = StaticSource::new(definition);

    let session = WizardSession::open(&source, &WizardConfig::default())
        .await
        .unwrap();

    assert_eq!(session.tree().value(0, "columns", "b"), Some(&FieldValue::from(true)));
    assert_eq!(session.tree().value(0, "columns", "a"), Some(&FieldValue::from(true)));
    let declared = session.steps()[0].group("columns").unwrap().field("b").unwrap();
    assert_eq!(declared.default_value, FieldValue::from(true));
}

#[tokio::test]
async fn failing_source_creates_no_session() {
    let result = WizardSession::open(&FailingSource, &WizardConfig::default()).await;
    assert!(matches!(
        result,
        Err(Error::Source(SourceError::Unavailable(_)))
    ));
}

#[tokio::test]
async fn completion_failure_is_recoverable() {
    let mut session = open(vec![three_field_step()]);
    session.advance().unwrap();

    let (publisher, sink) = tree_publisher();
    publisher.fail_next(1);

    let err = session.complete(&sink).await.unwrap_err();
    assert!(matches!(err, Error::Completion(CompletionError::Rejected { .. })));
    assert!(session.is_confirming());
    assert!(matches!(session.status(), SessionStatus::Failed { .. }));
    assert!(publisher.is_empty().await);

    session.complete(&sink).await.unwrap();
    assert_eq!(publisher.len().await, 1);
    assert!(session.completed_at().is_some());
}

#[tokio::test]
async fn slow_sink_times_out() {
    let config = WizardConfig {
        completion_timeout: Duration::from_millis(50),
        ..WizardConfig::default()
    };
    let mut session =
        WizardSession::new(WizardDefinition::new(vec![three_field_step()]), &config).unwrap();
    session.advance().unwrap();

    let err = session.complete(&SlowSink).await.unwrap_err();
    assert!(matches!(err, Error::Completion(CompletionError::TimedOut(_))));
    assert!(matches!(session.status(), SessionStatus::Failed { .. }));
}
