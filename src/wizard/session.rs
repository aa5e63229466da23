//! WizardSession: single owner of the step index, the navigation gate and
//! the step data tree.
//!
//! Renderers never touch the tree directly. They request changes through
//! [`WizardSession::update_group_data`] and answer navigation intents
//! through their [`StepRenderer`](super::renderer::StepRenderer) capability.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::gate::{GateDecision, GatePhase, Intent, NavigationOutcome};
use super::renderer::ConfirmationView;
use super::sink::CompletionSink;
use super::source::{ConfigurationSource, WizardDefinition};
use super::tree::{GroupData, StepData, StepDataTree};
use crate::config::WizardConfig;
use crate::error::{CompletionError, ConfigError, Error, Result, SessionError, ShapeError};
use crate::schema::{FieldValue, StepDescriptor};

/// Title of the terminal review position in progress labels.
pub const CONFIRMATION_TITLE: &str = "Confirmation";

/// Lifecycle of a session with respect to the completion hand-off.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SessionStatus {
    /// Accepting edits and navigation.
    Ready,
    /// A completion hand-off is in flight; navigation is ignored.
    Submitting,
    /// The last hand-off failed. The user may retry.
    Failed { message: String },
    /// The hand-off succeeded.
    Completed,
}

impl SessionStatus {
    fn accepts_navigation(&self) -> bool {
        matches!(self, Self::Ready | Self::Failed { .. })
    }
}

/// One run of a wizard, from mount to close.
pub struct WizardSession {
    id: Uuid,
    title: String,
    steps: Vec<StepDescriptor>,
    tree: StepDataTree,
    current: usize,
    gate: GatePhase,
    status: SessionStatus,
    completion_timeout: Duration,
    completed_at: Option<DateTime<Utc>>,
}

impl WizardSession {
    /// Start a session from a loaded definition. Stored prior answers seed
    /// field defaults before the tree is built.
    pub fn new(definition: WizardDefinition, config: &WizardConfig) -> Result<Self> {
        let WizardDefinition {
            title,
            mut steps,
            prior,
        } = definition;

        if steps.is_empty() {
            return Err(ConfigError::NoSteps.into());
        }

        let seeded = prior.seed(&mut steps);
        let tree = StepDataTree::initialize(&steps)?;
        let id = Uuid::new_v4();
        let title = title.unwrap_or_else(|| config.default_title.clone());

        info!(
            session = %id,
            title = %title,
            steps = steps.len(),
            seeded,
            "Wizard session opened"
        );

        Ok(Self {
            id,
            title,
            steps,
            tree,
            current: 0,
            gate: GatePhase::Displaying,
            status: SessionStatus::Ready,
            completion_timeout: config.completion_timeout,
            completed_at: None,
        })
    }

    /// Load a definition from `source` and start a session from it. A source
    /// failure is fatal: no session is created.
    pub async fn open(source: &dyn ConfigurationSource, config: &WizardConfig) -> Result<Self> {
        let definition = source.load().await.map_err(|e| {
            warn!("Failed to load wizard configuration: {}", e);
            e
        })?;
        Self::new(definition, config)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn steps(&self) -> &[StepDescriptor] {
        &self.steps
    }

    /// Number of real steps; also the index of the confirmation position.
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn is_confirming(&self) -> bool {
        self.current == self.steps.len()
    }

    /// The active step, or `None` at the confirmation position.
    pub fn current_step(&self) -> Option<&StepDescriptor> {
        self.steps.get(self.current)
    }

    pub fn current_data(&self) -> Option<&StepData> {
        self.tree.step(self.current)
    }

    pub fn tree(&self) -> &StepDataTree {
        &self.tree
    }

    pub fn phase(&self) -> GatePhase {
        self.gate
    }

    pub fn pending_intent(&self) -> Intent {
        self.gate.pending()
    }

    pub fn status(&self) -> &SessionStatus {
        &self.status
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Progress labels: every step title, then the confirmation position.
    pub fn step_titles(&self) -> Vec<&str> {
        self.steps
            .iter()
            .map(|s| s.title.as_str())
            .chain(std::iter::once(CONFIRMATION_TITLE))
            .collect()
    }

    /// Replace one group of one step. The values must carry every declared
    /// field of the group; a partial or mis-shaped update is rejected and
    /// leaves the tree unchanged.
    pub fn update_group_data(
        &mut self,
        step_index: usize,
        group: &str,
        values: GroupData,
    ) -> Result<()> {
        self.tree
            .update_group(&self.steps, step_index, group, values)
            .map_err(|e| {
                warn!(
                    session = %self.id,
                    step = step_index,
                    group = %group,
                    "Rejected group update: {}",
                    e
                );
                e
            })?;
        debug!(session = %self.id, step = step_index, group = %group, "Group data updated");
        Ok(())
    }

    /// Change one field, carrying the group's other fields forward.
    pub fn update_field(
        &mut self,
        step_index: usize,
        group: &str,
        field: &str,
        value: FieldValue,
    ) -> Result<()> {
        let mut values = self
            .tree
            .group(step_index, group)
            .cloned()
            .ok_or_else(|| {
                if step_index >= self.steps.len() {
                    ShapeError::UnknownStep {
                        index: step_index,
                        count: self.steps.len(),
                    }
                } else {
                    ShapeError::UnknownGroup {
                        step: step_index,
                        group: group.to_string(),
                    }
                }
            })?;
        values.insert(field.to_string(), value);
        self.update_group_data(step_index, group, values)
    }

    /// Put an intent in front of the active step. Returns `false` when the
    /// intent is not accepted for evaluation (empty intent, another intent
    /// already pending, or the session is busy or finished).
    pub fn request(&mut self, intent: Intent) -> bool {
        if !self.status.accepts_navigation() {
            debug!(
                session = %self.id,
                status = ?self.status,
                %intent,
                "Ignoring intent while not ready"
            );
            return false;
        }
        let target = GatePhase::IntentPending(intent);
        if !self.gate.can_transition_to(target) {
            debug!(session = %self.id, phase = %self.gate, %intent, "Ignoring intent");
            return false;
        }
        self.gate = target;
        true
    }

    /// Evaluate the pending intent. Updates issued before this call are
    /// always visible to the step's decision.
    pub fn resolve(&mut self) -> Result<NavigationOutcome> {
        let intent = self.gate.pending();
        if intent == Intent::None {
            return Ok(self.ignored("no pending intent"));
        }
        if !self.status.accepts_navigation() {
            self.gate = GatePhase::Displaying;
            return Ok(self.ignored("session is busy"));
        }

        let decision = match self.decide(intent) {
            Ok(decision) => decision,
            Err(outcome) => {
                self.gate = GatePhase::Displaying;
                return Ok(outcome);
            }
        };

        match decision {
            GateDecision::Accept { sanitized } => {
                if let (Intent::Advance, Some(payload)) = (intent, sanitized) {
                    if let Err(e) = self.tree.merge_step(&self.steps, self.current, payload) {
                        warn!(
                            session = %self.id,
                            step = self.current,
                            "Step returned a mis-shaped payload: {}",
                            e
                        );
                        self.gate = GatePhase::Displaying;
                        return Err(e.into());
                    }
                }
                self.gate = GatePhase::Accepted(intent);

                let from = self.current;
                self.current = from.saturating_add_signed(intent.offset());
                self.gate = GatePhase::Displaying;
                if matches!(self.status, SessionStatus::Failed { .. }) {
                    self.status = SessionStatus::Ready;
                }

                debug!(session = %self.id, from, to = self.current, %intent, "Navigation accepted");
                Ok(NavigationOutcome::Moved {
                    from,
                    to: self.current,
                })
            }
            GateDecision::Reject { reasons } => {
                self.gate = GatePhase::Rejected(intent);
                debug!(
                    session = %self.id,
                    step = self.current,
                    ?reasons,
                    %intent,
                    "Navigation rejected"
                );
                self.gate = GatePhase::Displaying;
                Ok(NavigationOutcome::Rejected {
                    index: self.current,
                    reasons,
                })
            }
        }
    }

    /// Ask for the active step's decision, or short-circuit at the ends.
    fn decide(&self, intent: Intent) -> std::result::Result<GateDecision, NavigationOutcome> {
        match (intent, self.current_step()) {
            (Intent::Retreat, _) if self.current == 0 => Ok(GateDecision::reject(vec![
                "Already at first step".to_string(),
            ])),
            (Intent::Advance, None) => Err(self.ignored("no further steps")),
            (Intent::Retreat, None) => Ok(GateDecision::accept()),
            (_, Some(step)) => {
                let data = self.tree.step(self.current).cloned().unwrap_or_default();
                Ok(step.kind.renderer().evaluate(step, &data, intent))
            }
            (Intent::None, None) => Err(self.ignored("no pending intent")),
        }
    }

    fn ignored(&self, reason: &str) -> NavigationOutcome {
        NavigationOutcome::Ignored {
            index: self.current,
            reason: reason.to_string(),
        }
    }

    /// Request and resolve a forward move.
    pub fn advance(&mut self) -> Result<NavigationOutcome> {
        self.navigate(Intent::Advance)
    }

    /// Request and resolve a backward move.
    pub fn retreat(&mut self) -> Result<NavigationOutcome> {
        self.navigate(Intent::Retreat)
    }

    fn navigate(&mut self, intent: Intent) -> Result<NavigationOutcome> {
        if !self.request(intent) {
            return Ok(self.ignored("intent not accepted in current state"));
        }
        self.resolve()
    }

    /// Build the read-only review. Only available at the confirmation position.
    pub fn confirmation(&self) -> Option<ConfirmationView> {
        if !self.is_confirming() {
            return None;
        }
        let sections = self
            .steps
            .iter()
            .enumerate()
            .map(|(index, step)| {
                let data = self.tree.step(index).cloned().unwrap_or_default();
                step.kind.renderer().confirm(step, &data)
            })
            .collect();
        Some(ConfirmationView { sections })
    }

    /// Enter the submitting state and return the tree to hand off. For
    /// drivers that await the sink outside the session.
    pub fn begin_completion(&mut self) -> Result<StepDataTree> {
        match self.status {
            SessionStatus::Completed => {
                return Err(SessionError::AlreadyCompleted { id: self.id }.into());
            }
            SessionStatus::Submitting => return Err(SessionError::Busy.into()),
            SessionStatus::Ready | SessionStatus::Failed { .. } => {}
        }
        if !self.is_confirming() {
            return Err(SessionError::NotAtConfirmation {
                index: self.current,
            }
            .into());
        }
        debug_assert!(self.tree.conforms_to(&self.steps));

        self.status = SessionStatus::Submitting;
        self.gate = GatePhase::Displaying;
        info!(session = %self.id, "Completion hand-off started");
        Ok(self.tree.clone())
    }

    /// Record the outcome of a hand-off started with [`Self::begin_completion`].
    pub fn finish_completion(
        &mut self,
        result: std::result::Result<(), CompletionError>,
    ) -> Result<()> {
        if self.status != SessionStatus::Submitting {
            return Err(SessionError::NothingPending.into());
        }
        match result {
            Ok(()) => {
                let now = Utc::now();
                self.status = SessionStatus::Completed;
                self.completed_at = Some(now);
                info!(session = %self.id, completed_at = %now, "Wizard completed");
                Ok(())
            }
            Err(e) => {
                warn!(session = %self.id, "Completion failed: {}", e);
                self.status = SessionStatus::Failed {
                    message: e.to_string(),
                };
                Err(Error::Completion(e))
            }
        }
    }

    /// Hand the whole tree to `sink`. On failure the session stays open at
    /// the confirmation position and may be completed again.
    pub async fn complete(&mut self, sink: &dyn CompletionSink) -> Result<()> {
        let tree = self.begin_completion()?;
        let result = match tokio::time::timeout(self.completion_timeout, sink.complete(&tree)).await
        {
            Ok(result) => result,
            Err(_) => Err(CompletionError::TimedOut(self.completion_timeout)),
        };
        self.finish_completion(result)
    }

    /// Close the session, discarding all in-memory answers.
    pub fn close(self) {
        info!(
            session = %self.id,
            completed = self.status == SessionStatus::Completed,
            "Wizard session closed"
        );
    }
}
