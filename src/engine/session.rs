//! Validation session: the state machine the rest of the game talks to.
//!
//! The grid layer pushes a fresh snapshot whenever its settled tiles change;
//! the session gates on tile count, asks the matcher when the count is right
//! and tells listeners about the outcome. Re-validation only happens when the
//! snapshot fingerprint changes or a new template is activated, so polling
//! every frame costs one string build and never repeats notifications.

use std::sync::Arc;

use serde::Serialize;

use crate::engine::matcher::{match_snapshot, MatchReport};
use crate::engine::models::PlacementSnapshot;
use crate::engine::symmetry::Transform;
use crate::engine::template::Template;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationState {
    /// No active template.
    #[default]
    Empty,
    /// Fewer tiles placed than the template needs.
    Incomplete,
    /// More tiles placed than the template needs; never valid.
    Overfull,
    /// Exact count, but no transform matched.
    Invalid,
    Valid,
}

impl ValidationState {
    pub fn is_valid(self) -> bool {
        self == ValidationState::Valid
    }

    pub fn is_complete(self) -> bool {
        matches!(
            self,
            ValidationState::Overfull | ValidationState::Invalid | ValidationState::Valid
        )
    }

    /// The `(valid, complete)` pair reported to collaborators.
    pub fn verdict(self) -> (bool, bool) {
        (self.is_valid(), self.is_complete())
    }
}

/// Payload of the "became valid" edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoundCompleted {
    pub round_id: u64,
    pub template_id: String,
    pub transform: Option<Transform>,
}

/// Collaborators (deck, timer, rewards, effects) subscribe through this.
pub trait ValidationListener: Send + Sync {
    /// Called whenever the `(valid, complete)` pair changes.
    fn on_verdict_changed(&self, _valid: bool, _complete: bool) {}

    /// Called once per transition into `Valid`.
    fn on_became_valid(&self, event: &RoundCompleted);
}

pub struct ValidationSession {
    active: Option<Arc<Template>>,
    last_snapshot: PlacementSnapshot,
    last_fingerprint: Option<String>,
    state: ValidationState,
    last_report: Option<MatchReport>,
    round_id: u64,
    evaluations: u64,
    listeners: Vec<Box<dyn ValidationListener>>,
}

impl Default for ValidationSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ValidationSession {
    pub fn new() -> Self {
        Self {
            active: None,
            last_snapshot: PlacementSnapshot::new(),
            last_fingerprint: None,
            state: ValidationState::Empty,
            last_report: None,
            round_id: 0,
            evaluations: 0,
            listeners: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, listener: Box<dyn ValidationListener>) {
        self.listeners.push(listener);
    }

    pub fn state(&self) -> ValidationState {
        self.state
    }

    pub fn is_valid(&self) -> bool {
        self.state.is_valid()
    }

    pub fn is_complete(&self) -> bool {
        self.state.is_complete()
    }

    /// Number of completed rounds so far; also the id of the latest one.
    pub fn round_id(&self) -> u64 {
        self.round_id
    }

    /// How many times the snapshot was actually evaluated (debounced calls excluded).
    pub fn evaluations(&self) -> u64 {
        self.evaluations
    }

    pub fn active_template(&self) -> Option<&Arc<Template>> {
        self.active.as_ref()
    }

    /// Matcher output from the last evaluation that reached it.
    pub fn last_report(&self) -> Option<&MatchReport> {
        self.last_report.as_ref()
    }

    /// Replace the active template and re-check the last snapshot right away.
    ///
    /// A template without cells is treated as no template.
    pub fn activate(&mut self, template: Option<Arc<Template>>) -> ValidationState {
        let template = match template {
            Some(t) if !t.is_playable() => {
                tracing::warn!(template = %t.id, "template has no cells, treating as no active template");
                None
            }
            other => other,
        };

        match &template {
            Some(t) => {
                tracing::info!(
                    template = %t.id,
                    tiles = t.required_tiles(),
                    require_rotation = t.rules.require_rotation,
                    allow_global_rotation = t.rules.allow_global_rotation,
                    ignore_rotation_on_face_a = t.rules.ignore_rotation_on_face_a,
                    accept_half_turn = t.rules.accept_half_turn,
                    "template activated"
                );
                if t.rules.requests_mirroring() {
                    tracing::warn!(template = %t.id, "mirror flags are reserved and ignored by matching");
                }
            }
            None => tracing::info!("active template cleared"),
        }

        self.active = template;
        self.last_fingerprint = Some(self.fingerprint(&self.last_snapshot));
        self.evaluate()
    }

    /// Feed the current settled tiles. Does nothing if they are structurally
    /// identical to the previous snapshot under the same template.
    pub fn submit(&mut self, snapshot: PlacementSnapshot) -> ValidationState {
        let fingerprint = self.fingerprint(&snapshot);
        if self.last_fingerprint.as_deref() == Some(fingerprint.as_str()) {
            return self.state;
        }
        self.last_fingerprint = Some(fingerprint);
        self.last_snapshot = snapshot;
        self.evaluate()
    }

    /// Re-evaluate the last snapshot even though nothing structural changed.
    pub fn force_revalidate(&mut self) -> ValidationState {
        self.evaluate()
    }

    /// Template identity plus the canonical snapshot text.
    fn fingerprint(&self, snapshot: &PlacementSnapshot) -> String {
        match &self.active {
            Some(t) => format!("{}|{}", t.id, snapshot.canonical_key()),
            None => snapshot.canonical_key(),
        }
    }

    fn evaluate(&mut self) -> ValidationState {
        self.evaluations += 1;

        let Some(template) = self.active.clone() else {
            self.signal(ValidationState::Empty, None);
            return self.state;
        };

        let required = template.required_tiles();
        let placed = self.last_snapshot.len();
        tracing::debug!(template = %template.id, placed, required, "validating placement");

        if placed < required {
            self.signal(ValidationState::Incomplete, None);
        } else if placed > required {
            self.signal(ValidationState::Overfull, None);
        } else {
            let report = match_snapshot(&self.last_snapshot, &template);
            tracing::debug!(template = %template.id, matched = report.matched, detail = %report, "match attempt");
            let next = if report.matched {
                ValidationState::Valid
            } else {
                ValidationState::Invalid
            };
            self.signal(next, Some(report));
        }
        self.state
    }

    fn signal(&mut self, next: ValidationState, report: Option<MatchReport>) {
        let previous = self.state;
        self.state = next;
        let transform = report.as_ref().and_then(|r| r.transform());
        self.last_report = report;

        if previous.verdict() != next.verdict() {
            let (valid, complete) = next.verdict();
            for listener in &self.listeners {
                listener.on_verdict_changed(valid, complete);
            }
        }

        if next.is_valid() && !previous.is_valid() {
            self.round_id += 1;
            let event = RoundCompleted {
                round_id: self.round_id,
                template_id: self
                    .active
                    .as_ref()
                    .map(|t| t.id.clone())
                    .unwrap_or_default(),
                transform,
            };
            tracing::info!(round = event.round_id, template = %event.template_id, "pattern completed");
            for listener in &self.listeners {
                listener.on_became_valid(&event);
            }
        }
    }
}

/// "Once per round" latch for effects that should play a single time per
/// completed round, keyed by the session's `round_id`.
#[derive(Debug, Clone, Default)]
pub struct RoundGate {
    last_round: Option<u64>,
}

impl RoundGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// True the first time it is called for a given round.
    pub fn try_enter(&mut self, round_id: u64) -> bool {
        if self.last_round == Some(round_id) {
            return false;
        }
        self.last_round = Some(round_id);
        true
    }

    pub fn reset(&mut self) {
        self.last_round = None;
    }
}
