//! Stuck detection - heuristics for "the player cannot currently progress".

use game_rules::{ActionRecord, GameState};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::EngineConfig;
use crate::engine::can_enter_node;
use crate::quest_graph::QuestGraph;

/// What happened during one resolved turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct TurnRecord {
    /// The node that was active during the turn.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,

    /// Actions that changed the state during the turn.
    #[serde(default)]
    pub actions: Vec<ActionRecord>,
}

impl TurnRecord {
    pub fn new(node_id: impl Into<String>) -> Self {
        Self {
            node_id: Some(node_id.into()),
            actions: Vec::new(),
        }
    }

    pub fn with_action(mut self, action: ActionRecord) -> Self {
        self.actions.push(action);
        self
    }

    /// Whether an objective completed or a flag turned on during the turn.
    pub fn made_progress(&self, completed_status: &str) -> bool {
        self.actions
            .iter()
            .any(|record| record.to_action().is_progress(completed_status))
    }
}

/// Why a game is considered stuck, in priority order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum StuckReason {
    NoProgress,
    PreconditionsNotMet { node_id: String },
    ResourcesDepleted { resources: Vec<String> },
    MaxRetriesExceeded { retries: u32 },
}

impl StuckReason {
    fn suggestions(&self) -> Vec<String> {
        let lines: &[&str] = match self {
            StuckReason::NoProgress => &[
                "Offer a clue pointing at the current objective",
                "Introduce an NPC or event that opens a new lead",
                "Remind the player of unexplored options",
            ],
            StuckReason::PreconditionsNotMet { .. } => &[
                "Revisit an earlier scene to regain what was lost",
                "Offer an alternative route around this gate",
            ],
            StuckReason::ResourcesDepleted { .. } => &[
                "Offer a chance to rest or recover",
                "Introduce a merchant, healer or supply cache",
            ],
            StuckReason::MaxRetriesExceeded { .. } => &[
                "Lower the difficulty of the current challenge",
                "Provide a different approach to the obstacle",
                "Let the story move on with a partial success",
            ],
        };
        lines.iter().map(|s| s.to_string()).collect()
    }
}

impl std::fmt::Display for StuckReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StuckReason::NoProgress => write!(f, "No objective progress in recent turns"),
            StuckReason::PreconditionsNotMet { node_id } => {
                write!(f, "Preconditions for current node '{}' are no longer met", node_id)
            }
            StuckReason::ResourcesDepleted { resources } => {
                write!(f, "Critical resources depleted: {}", resources.join(", "))
            }
            StuckReason::MaxRetriesExceeded { retries } => {
                write!(f, "Maximum retries exceeded ({} attempts)", retries)
            }
        }
    }
}

/// Outcome of stuck detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StuckDiagnosis {
    pub is_stuck: bool,
    pub reason: Option<StuckReason>,
    pub suggestions: Vec<String>,
}

impl StuckDiagnosis {
    pub fn not_stuck() -> Self {
        Self {
            is_stuck: false,
            reason: None,
            suggestions: Vec::new(),
        }
    }

    fn stuck(reason: StuckReason) -> Self {
        Self {
            is_stuck: true,
            suggestions: reason.suggestions(),
            reason: Some(reason),
        }
    }

    /// Human-readable reason, if stuck.
    pub fn reason_text(&self) -> Option<String> {
        self.reason.as_ref().map(|r| r.to_string())
    }
}

/// Diagnose whether a game is stuck. Checks run in priority order and the
/// first one that fires wins:
///
/// 1. No progress in the last `max_stuck_turns` turns
/// 2. The current node's `enterIf` no longer holds
/// 3. A critical resource is at or below zero
/// 4. `retries >= max_retries`
///
/// The progress check only runs once the history covers a full window.
pub fn detect_stuck_conditions(
    state: &GameState,
    graph: &QuestGraph,
    turn_history: &[TurnRecord],
    config: &EngineConfig,
) -> StuckDiagnosis {
    let window = config.max_stuck_turns;
    if window > 0 && turn_history.len() >= window {
        let recent = &turn_history[turn_history.len() - window..];
        if !recent
            .iter()
            .any(|turn| turn.made_progress(&config.completed_status))
        {
            return report(StuckReason::NoProgress);
        }
    }

    if let Some(node) = state.current_node_id.as_deref().and_then(|id| graph.node(id)) {
        if !can_enter_node(node, state) {
            return report(StuckReason::PreconditionsNotMet {
                node_id: node.id.clone(),
            });
        }
    }

    let depleted: Vec<String> = config
        .critical_resources
        .iter()
        .filter(|key| state.resource(key).is_some_and(|level| level <= 0.0))
        .cloned()
        .collect();
    if !depleted.is_empty() {
        return report(StuckReason::ResourcesDepleted { resources: depleted });
    }

    if state.retries >= config.max_retries {
        return report(StuckReason::MaxRetriesExceeded {
            retries: state.retries,
        });
    }

    StuckDiagnosis::not_stuck()
}

fn report(reason: StuckReason) -> StuckDiagnosis {
    debug!(reason = %reason, "game is stuck");
    StuckDiagnosis::stuck(reason)
}
