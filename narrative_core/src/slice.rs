//! Graph slices - the read-only view of the graph handed to the model.

use game_rules::{summarize_guards, GameState, GuardExpression};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::engine::eligible_transitions;
use crate::error::{GraphError, GraphIntegrityError, GraphResult};
use crate::hash::stable_hash;
use crate::quest_graph::{GraphEdge, GraphNode, NodeType, QuestGraph};

/// Short description of a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeSummary {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub synopsis: String,
}

impl From<&GraphNode> for NodeSummary {
    fn from(node: &GraphNode) -> Self {
        Self {
            id: node.id.clone(),
            node_type: node.node_type,
            synopsis: node.synopsis.clone(),
        }
    }
}

/// A reachable next node, with what gates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrontierEntry {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub synopsis: String,
    pub hint: Option<String>,
    /// Edge guard and target entry conditions, rendered.
    pub guard_summary: Option<String>,
}

/// Active node, frontier and graph fingerprint for the next prompt.
///
/// Never authoritative: callers must not feed a slice back as state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphSlice {
    pub active_node: NodeSummary,
    pub frontier: Vec<FrontierEntry>,
    pub hash: String,
}

/// Build the slice for the state's current node.
///
/// Unlike the rest of the engine this does not degrade: a current node that
/// is missing from the graph means the state is corrupt, and is reported as
/// [`GraphError::Integrity`].
pub fn generate_graph_slice(state: &GameState, graph: &QuestGraph) -> GraphResult<GraphSlice> {
    let node_id = state
        .current_node_id
        .as_deref()
        .ok_or(GraphIntegrityError::MissingCurrentNode)?;

    let Some(active) = graph.node(node_id) else {
        warn!(node_id, graph_id = %graph.graph_id, "current node missing from graph");
        return Err(GraphIntegrityError::DanglingCurrentNode {
            node_id: node_id.to_string(),
            graph_id: graph.graph_id.clone(),
        }
        .into());
    };

    let ctx = state.guard_context();
    let frontier = eligible_transitions(active, graph, &ctx)
        .into_iter()
        .map(|(edge, target)| FrontierEntry {
            id: target.id.clone(),
            node_type: target.node_type,
            synopsis: target.synopsis.clone(),
            hint: target.hint.clone(),
            guard_summary: summarize_guards(gating_guards(edge, target)),
        })
        .collect();

    Ok(GraphSlice {
        active_node: NodeSummary::from(active),
        frontier,
        hash: graph_hash(graph)?,
    })
}

/// Edge guards followed by the target's entry guards, without repeats.
fn gating_guards<'a>(edge: &'a GraphEdge, target: &'a GraphNode) -> Vec<&'a GuardExpression> {
    let mut guards: Vec<&GuardExpression> = edge.guard.iter().collect();
    for guard in &target.enter_if {
        if !guards.contains(&guard) {
            guards.push(guard);
        }
    }
    guards
}

/// Fingerprint of the whole graph. Object keys are serialized sorted, so the
/// hash only changes when content does.
///
/// Sorting comes from `serde_json::Value` objects being `BTreeMap`s, which
/// holds only while serde_json's `preserve_order` feature is off.
pub fn graph_hash(graph: &QuestGraph) -> GraphResult<String> {
    let canonical = serde_json::to_value(graph).map_err(GraphError::Fingerprint)?;
    Ok(format!("{:08x}", stable_hash(&canonical.to_string()) as u32))
}
