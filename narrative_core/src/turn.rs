//! Turn resolution - one full engine pass over a turn's acts.

use game_rules::{ActionRecord, GameState};
use tracing::debug;

use crate::engine::{apply_outcome, eligible_neighbors, select_active_node, OutcomeBranch};
use crate::hash::{seeded_index, selection_seed};
use crate::quest_graph::QuestGraph;
use crate::stuck::TurnRecord;

/// Everything a caller needs to persist after a turn.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnResolution {
    /// The node the turn was played on, `None` on a dead end.
    pub active_node_id: Option<String>,
    pub branch: Option<OutcomeBranch>,
    pub new_game_state: GameState,
    /// Entry for the stuck-detection history. Holds only the actions that
    /// changed the state.
    pub record: TurnRecord,
}

impl TurnResolution {
    pub fn is_dead_end(&self) -> bool {
        self.active_node_id.is_none()
    }
}

/// Resolve a turn: select the active node, fold the acts into the state,
/// update progress bookkeeping and advance into the frontier on success.
///
/// - success resets `retries` and moves to a frontier node picked with the
///   same seeded rule as [`select_active_node`], staying put if the frontier is empty
/// - failure appends the node to `failures` and bumps `retries`
/// - no match leaves the position unchanged
pub fn resolve_turn(state: &GameState, graph: &QuestGraph, acts: &[ActionRecord]) -> TurnResolution {
    let Some(active) = select_active_node(state, graph) else {
        debug!(graph_id = %graph.graph_id, "turn resolved on a dead end");
        return TurnResolution {
            active_node_id: None,
            branch: None,
            new_game_state: state.clone(),
            record: TurnRecord::default(),
        };
    };

    let outcome = apply_outcome(active, acts, state);
    let mut next = outcome.new_game_state;

    next.current_node_id = Some(active.id.clone());
    if next.visited.last() != Some(&active.id) {
        next.visited.push(active.id.clone());
    }

    match outcome.branch {
        Some(OutcomeBranch::Success) => {
            next.retries = 0;
            let frontier = eligible_neighbors(active, graph, &next);
            if !frontier.is_empty() {
                let target = frontier[seeded_index(selection_seed(&active.id), frontier.len())];
                debug!(from = %active.id, to = %target.id, "advancing along frontier");
                next.current_node_id = Some(target.id.clone());
            }
        }
        Some(OutcomeBranch::Failure) => {
            next.failures.push(active.id.clone());
            next.retries += 1;
        }
        None => {}
    }

    TurnResolution {
        active_node_id: Some(active.id.clone()),
        branch: outcome.branch,
        new_game_state: next,
        record: TurnRecord {
            node_id: Some(active.id.clone()),
            actions: outcome.effective_actions,
        },
    }
}
