//! Navigation gate: the accept/reject protocol guarding movement between steps.

use serde::{Deserialize, Serialize};

use super::tree::StepData;

/// A requested movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Advance,
    Retreat,
    #[default]
    None,
}

impl Intent {
    /// Index offset applied when this intent is accepted.
    pub fn offset(&self) -> isize {
        match self {
            Self::Advance => 1,
            Self::Retreat => -1,
            Self::None => 0,
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Advance => "advance",
            Self::Retreat => "retreat",
            Self::None => "none",
        };
        write!(f, "{s}")
    }
}

/// Where the gate of the active step stands.
///
/// Cycles Displaying → IntentPending → Accepted | Rejected → Displaying.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "phase", content = "intent", rename_all = "snake_case")]
pub enum GatePhase {
    #[default]
    Displaying,
    IntentPending(Intent),
    Accepted(Intent),
    Rejected(Intent),
}

impl GatePhase {
    /// Check if a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: GatePhase) -> bool {
        use GatePhase::*;
        match (self, target) {
            (Displaying, IntentPending(intent)) => intent != Intent::None,
            (IntentPending(pending), Accepted(intent) | Rejected(intent)) => *pending == intent,
            (Accepted(_) | Rejected(_), Displaying) => true,
            _ => false,
        }
    }

    /// The intent waiting for a decision, if any.
    pub fn pending(&self) -> Intent {
        match self {
            Self::IntentPending(intent) => *intent,
            _ => Intent::None,
        }
    }
}

impl std::fmt::Display for GatePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Displaying => write!(f, "displaying"),
            Self::IntentPending(intent) => write!(f, "intent_pending({intent})"),
            Self::Accepted(intent) => write!(f, "accepted({intent})"),
            Self::Rejected(intent) => write!(f, "rejected({intent})"),
        }
    }
}

/// A step's answer to a pending intent.
#[derive(Debug, Clone, PartialEq)]
pub enum GateDecision {
    /// Move. On advance the step may hand back sanitized group values to
    /// write before moving.
    Accept { sanitized: Option<StepData> },
    /// Stay. The reasons are for display only.
    Reject { reasons: Vec<String> },
}

impl GateDecision {
    pub fn accept() -> Self {
        Self::Accept { sanitized: None }
    }

    pub fn accept_with(sanitized: StepData) -> Self {
        Self::Accept {
            sanitized: Some(sanitized),
        }
    }

    pub fn reject(reasons: Vec<String>) -> Self {
        Self::Reject { reasons }
    }

    pub fn is_accept(&self) -> bool {
        matches!(self, Self::Accept { .. })
    }
}

/// Result of resolving a navigation intent.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum NavigationOutcome {
    /// The intent was accepted and the index moved.
    Moved { from: usize, to: usize },
    /// The active step rejected the intent; nothing changed.
    Rejected { index: usize, reasons: Vec<String> },
    /// The intent is not offered at this position or in this state.
    Ignored { index: usize, reason: String },
}

impl NavigationOutcome {
    pub fn moved(&self) -> bool {
        matches!(self, Self::Moved { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_transitions() {
        use GatePhase::*;
        let transitions = [
            (Displaying, IntentPending(Intent::Advance)),
            (Displaying, IntentPending(Intent::Retreat)),
            (IntentPending(Intent::Advance), Accepted(Intent::Advance)),
            (IntentPending(Intent::Advance), Rejected(Intent::Advance)),
            (Accepted(Intent::Retreat), Displaying),
            (Rejected(Intent::Advance), Displaying),
        ];
        for (from, to) in transitions {
            assert!(from.can_transition_to(to), "{from} should transition to {to}");
        }
    }

    #[test]
    fn invalid_transitions() {
        use GatePhase::*;
        // No empty intent
        assert!(!Displaying.can_transition_to(IntentPending(Intent::None)));
        // Decision must match the pending intent
        assert!(!IntentPending(Intent::Advance).can_transition_to(Accepted(Intent::Retreat)));
        // Skip the decision
        assert!(!Displaying.can_transition_to(Accepted(Intent::Advance)));
        // Stack intents
        assert!(
            !IntentPending(Intent::Advance).can_transition_to(IntentPending(Intent::Retreat))
        );
    }

    #[test]
    fn pending_only_in_intent_pending() {
        assert_eq!(GatePhase::Displaying.pending(), Intent::None);
        assert_eq!(
            GatePhase::IntentPending(Intent::Retreat).pending(),
            Intent::Retreat
        );
        assert_eq!(GatePhase::Accepted(Intent::Advance).pending(), Intent::None);
    }

    #[test]
    fn intent_display_matches_serde() {
        for intent in [Intent::Advance, Intent::Retreat, Intent::None] {
            let json = serde_json::to_string(&intent).unwrap();
            assert_eq!(format!("\"{intent}\""), json);
        }
    }

    #[test]
    fn outcome_serializes_with_tag() {
        let outcome = NavigationOutcome::Moved { from: 0, to: 1 };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["outcome"], "moved");
        assert_eq!(json["to"], 1);
    }
}
