//! Graph engine - node selection, frontier computation and outcome folding.
//!
//! Every operation is a pure function of its arguments:
//! 1. **Entry**: a node may be entered when its `enterIf` conjunction holds
//! 2. **Selection**: stay on the current node while it remains enterable,
//!    otherwise pick deterministically among all enterable nodes
//! 3. **Frontier**: outgoing edges whose guard holds and whose target is enterable
//! 4. **Outcome**: fold a turn's acts into a new state via `onSuccess`/`onFail`

use game_rules::{evaluate_all, ActionRecord, GameState, GuardContext};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::hash::{seeded_index, selection_seed};
use crate::quest_graph::{GraphEdge, GraphNode, QuestGraph};

/// Seed key used when the state has no previous node.
pub const START_SEED_KEY: &str = "start";

/// Whether `node` may be entered given `state`.
pub fn can_enter_node(node: &GraphNode, state: &GameState) -> bool {
    can_enter_with(node, &state.guard_context())
}

pub(crate) fn can_enter_with(node: &GraphNode, ctx: &GuardContext) -> bool {
    evaluate_all(&node.enter_if, ctx)
}

/// Decide which node is active this turn.
///
/// Returns `None` when no node in the graph is enterable; the caller should
/// treat that as a dead end. Selection among candidates depends only on the
/// previous node id and the graph's node order.
pub fn select_active_node<'g>(state: &GameState, graph: &'g QuestGraph) -> Option<&'g GraphNode> {
    let ctx = state.guard_context();

    if let Some(current) = state.current_node_id.as_deref().and_then(|id| graph.node(id)) {
        if can_enter_with(current, &ctx) {
            trace!(node_id = %current.id, "staying on current node");
            return Some(current);
        }
    }

    let eligible: Vec<&GraphNode> = graph
        .nodes
        .iter()
        .filter(|node| can_enter_with(node, &ctx))
        .collect();

    if eligible.is_empty() {
        debug!(graph_id = %graph.graph_id, "no enterable node in graph");
        return None;
    }

    let seed_key = state.current_node_id.as_deref().unwrap_or(START_SEED_KEY);
    let seed = selection_seed(seed_key);
    let chosen = eligible[seeded_index(seed, eligible.len())];
    debug!(
        node_id = %chosen.id,
        previous = seed_key,
        candidates = eligible.len(),
        "selected active node"
    );
    Some(chosen)
}

/// Outgoing transitions of `node` that may be taken, paired with their targets.
pub(crate) fn eligible_transitions<'g>(
    node: &GraphNode,
    graph: &'g QuestGraph,
    ctx: &GuardContext,
) -> Vec<(&'g GraphEdge, &'g GraphNode)> {
    graph
        .outgoing(&node.id)
        .filter_map(|edge| graph.node(&edge.to).map(|target| (edge, target)))
        .filter(|(edge, target)| can_enter_with(target, ctx) && evaluate_all(&edge.guard, ctx))
        .collect()
}

/// The frontier: nodes reachable from `node` right now, in edge declaration order.
pub fn eligible_neighbors<'g>(node: &GraphNode, graph: &'g QuestGraph, state: &GameState) -> Vec<&'g GraphNode> {
    eligible_transitions(node, graph, &state.guard_context())
        .into_iter()
        .map(|(_, target)| target)
        .collect()
}

/// Which outcome branch a turn's acts selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeBranch {
    Success,
    Failure,
}

/// Result of folding a turn's acts into the game state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeResult {
    pub success: bool,
    /// `None` when no act matched either template list.
    pub branch: Option<OutcomeBranch>,
    pub new_game_state: GameState,
    /// The templates that were applied.
    pub applied_actions: Vec<ActionRecord>,
    /// The applied templates that actually changed the state.
    pub effective_actions: Vec<ActionRecord>,
}

fn first_match(acts: &[ActionRecord], templates: &[ActionRecord]) -> bool {
    acts.iter()
        .any(|act| templates.iter().any(|template| act.matches_template(template)))
}

/// Fold the acts emitted this turn into a copy of `state`.
///
/// The first act matching any `onSuccess` template applies every `onSuccess`
/// action. Failing that, the same rule is tried against `onFail`. At most one
/// branch is ever applied.
pub fn apply_outcome(node: &GraphNode, acts: &[ActionRecord], state: &GameState) -> OutcomeResult {
    let branch = if first_match(acts, &node.on_success) {
        Some(OutcomeBranch::Success)
    } else if first_match(acts, &node.on_fail) {
        Some(OutcomeBranch::Failure)
    } else {
        None
    };

    let templates: &[ActionRecord] = match branch {
        Some(OutcomeBranch::Success) => &node.on_success,
        Some(OutcomeBranch::Failure) => &node.on_fail,
        None => &[],
    };

    let mut new_game_state = state.clone();
    let mut effective_actions = Vec::new();
    for template in templates {
        if new_game_state.apply_action(&template.to_action()) {
            effective_actions.push(template.clone());
        }
    }

    debug!(node_id = %node.id, ?branch, applied = templates.len(), "applied outcome");

    OutcomeResult {
        success: branch == Some(OutcomeBranch::Success),
        branch,
        new_game_state,
        applied_actions: templates.to_vec(),
        effective_actions,
    }
}
