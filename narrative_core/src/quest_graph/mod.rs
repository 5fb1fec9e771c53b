//! Quest Graph - the authored narrative structure a game moves through.
//!
//! A graph consists of:
//! - **Nodes**: beats, objectives, gates and setpieces, each optionally gated by `enterIf`
//! - **Edges**: directed transitions, each optionally gated by `guard`
//!
//! Graphs are loaded once per turn and never mutated by the engine.

use game_rules::{ActionRecord, GuardExpression};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::{GraphError, GraphResult};

/// Kinds of narrative nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    Beat,
    Objective,
    Gate,
    Setpiece,
}

impl std::fmt::Display for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            NodeType::Beat => "beat",
            NodeType::Objective => "objective",
            NodeType::Gate => "gate",
            NodeType::Setpiece => "setpiece",
        };
        write!(f, "{}", name)
    }
}

/// A node in the quest graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
    pub id: String,

    #[serde(rename = "type")]
    pub node_type: NodeType,

    pub synopsis: String,

    /// Conjunction of guards that must hold to enter the node.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub enter_if: Vec<GuardExpression>,

    /// Action templates marking and applying success.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub on_success: Vec<ActionRecord>,

    /// Action templates marking and applying failure.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub on_fail: Vec<ActionRecord>,

    /// Author guidance surfaced to the model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl GraphNode {
    /// Create a node with no guards or outcomes.
    pub fn new(id: impl Into<String>, node_type: NodeType, synopsis: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            node_type,
            synopsis: synopsis.into(),
            enter_if: Vec::new(),
            on_success: Vec::new(),
            on_fail: Vec::new(),
            hint: None,
        }
    }

    pub fn with_enter_if(mut self, guard: GuardExpression) -> Self {
        self.enter_if.push(guard);
        self
    }

    pub fn with_on_success(mut self, action: ActionRecord) -> Self {
        self.on_success.push(action);
        self
    }

    pub fn with_on_fail(mut self, action: ActionRecord) -> Self {
        self.on_fail.push(action);
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// A directed, optionally guarded transition between two nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub from: String,
    pub to: String,

    /// Conjunction of guards that must hold to traverse the edge.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub guard: Vec<GuardExpression>,
}

impl GraphEdge {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            guard: Vec::new(),
        }
    }

    pub fn with_guard(mut self, guard: GuardExpression) -> Self {
        self.guard.push(guard);
        self
    }
}

/// The authored quest graph. Node and edge order is significant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestGraph {
    pub graph_id: String,
    pub start: String,
    #[serde(default)]
    pub nodes: Vec<GraphNode>,
    #[serde(default)]
    pub edges: Vec<GraphEdge>,
}

impl QuestGraph {
    /// Create an empty graph.
    pub fn new(graph_id: impl Into<String>, start: impl Into<String>) -> Self {
        Self {
            graph_id: graph_id.into(),
            start: start.into(),
            nodes: Vec::new(),
            edges: Vec::new(),
        }
    }

    pub fn with_node(mut self, node: GraphNode) -> Self {
        self.nodes.push(node);
        self
    }

    pub fn with_edge(mut self, edge: GraphEdge) -> Self {
        self.edges.push(edge);
        self
    }

    /// Parse a graph document and check it for structural consistency.
    pub fn from_json(json: &str) -> GraphResult<Self> {
        let graph: QuestGraph = serde_json::from_str(json)?;
        graph.validate()?;
        Ok(graph)
    }

    /// Check node ids are unique and every reference points at a node.
    pub fn validate(&self) -> GraphResult<()> {
        let mut ids = HashSet::new();
        for node in &self.nodes {
            if !ids.insert(node.id.as_str()) {
                return Err(GraphError::DuplicateNode {
                    graph_id: self.graph_id.clone(),
                    node_id: node.id.clone(),
                });
            }
        }

        if !ids.contains(self.start.as_str()) {
            return Err(GraphError::UnknownStart {
                graph_id: self.graph_id.clone(),
                node_id: self.start.clone(),
            });
        }

        for edge in &self.edges {
            let missing = [&edge.from, &edge.to]
                .into_iter()
                .find(|id| !ids.contains(id.as_str()));
            if let Some(missing) = missing {
                return Err(GraphError::DanglingEdge {
                    graph_id: self.graph_id.clone(),
                    from: edge.from.clone(),
                    to: edge.to.clone(),
                    missing: missing.clone(),
                });
            }
        }

        Ok(())
    }

    /// Look up a node by id.
    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Edges leaving `id`, in declaration order.
    pub fn outgoing<'a, 'b>(&'a self, id: &'b str) -> impl Iterator<Item = &'a GraphEdge> + 'b
    where
        'a: 'b,
    {
        self.edges.iter().filter(move |e| e.from == id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CAVE_GRAPH: &str = r#"{
        "graphId": "cave-escape",
        "start": "intro",
        "nodes": [
            {"id": "intro", "type": "beat", "synopsis": "You wake in a cave."},
            {
                "id": "guide",
                "type": "objective",
                "synopsis": "Find the guide.",
                "enterIf": [{"gte": ["rel.kiera.trust", 2]}],
                "onSuccess": [{"type": "OBJECTIVE_UPDATE", "id": "find_guide", "status": "complete"}],
                "hint": "Kiera hides near the river."
            },
            {"id": "exit", "type": "setpiece", "synopsis": "Daylight."}
        ],
        "edges": [
            {"from": "intro", "to": "guide"},
            {"from": "guide", "to": "exit", "guard": [{"flag": ["story", "met_guide", true]}]}
        ]
    }"#;

    #[test]
    fn test_parse_graph() {
        let graph = QuestGraph::from_json(CAVE_GRAPH).unwrap();

        assert_eq!(graph.graph_id, "cave-escape");
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 2);

        let guide = graph.node("guide").unwrap();
        assert_eq!(guide.node_type, NodeType::Objective);
        assert_eq!(guide.enter_if, vec![GuardExpression::gte("rel.kiera.trust", 2)]);
        assert_eq!(guide.on_success[0].id.as_deref(), Some("find_guide"));
        assert_eq!(guide.hint.as_deref(), Some("Kiera hides near the river."));

        let exit_edge = graph.outgoing("guide").next().unwrap();
        assert_eq!(exit_edge.to, "exit");
        assert_eq!(exit_edge.guard.len(), 1);
    }

    #[test]
    fn test_outgoing_preserves_order() {
        let graph = QuestGraph::new("g", "a")
            .with_node(GraphNode::new("a", NodeType::Beat, "A"))
            .with_node(GraphNode::new("b", NodeType::Beat, "B"))
            .with_node(GraphNode::new("c", NodeType::Beat, "C"))
            .with_edge(GraphEdge::new("a", "c"))
            .with_edge(GraphEdge::new("b", "a"))
            .with_edge(GraphEdge::new("a", "b"));

        let targets: Vec<_> = graph.outgoing("a").map(|e| e.to.as_str()).collect();
        assert_eq!(targets, vec!["c", "b"]);
    }

    #[test]
    fn test_outgoing_edges_outlive_lookup_key() {
        let graph = QuestGraph::new("g", "a")
            .with_node(GraphNode::new("a", NodeType::Beat, "A"))
            .with_node(GraphNode::new("b", NodeType::Beat, "B"))
            .with_edge(GraphEdge::new("a", "b"));

        let edges: Vec<&GraphEdge> = {
            let key = String::from("a");
            graph.outgoing(&key).collect()
        };
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].to, "b");
    }

    #[test]
    fn test_rejects_unknown_node_type() {
        let json = r#"{"graphId": "g", "start": "a", "nodes": [{"id": "a", "type": "cutscene", "synopsis": ""}]}"#;
        assert!(matches!(QuestGraph::from_json(json), Err(GraphError::Parse(_))));
    }

    #[test]
    fn test_rejects_bad_guard_shape() {
        let json = r#"{
            "graphId": "g", "start": "a",
            "nodes": [{"id": "a", "type": "beat", "synopsis": "", "enterIf": [{"between": ["rel.a.b", 1, 2]}]}]
        }"#;
        assert!(matches!(QuestGraph::from_json(json), Err(GraphError::Parse(_))));
    }

    #[test]
    fn test_validate_duplicate_node() {
        let graph = QuestGraph::new("g", "a")
            .with_node(GraphNode::new("a", NodeType::Beat, "A"))
            .with_node(GraphNode::new("a", NodeType::Gate, "A again"));
        assert!(matches!(
            graph.validate(),
            Err(GraphError::DuplicateNode { node_id, .. }) if node_id == "a"
        ));
    }

    #[test]
    fn test_validate_unknown_start() {
        let graph = QuestGraph::new("g", "missing").with_node(GraphNode::new("a", NodeType::Beat, "A"));
        assert!(matches!(graph.validate(), Err(GraphError::UnknownStart { .. })));
    }

    #[test]
    fn test_validate_dangling_edge() {
        let graph = QuestGraph::new("g", "a")
            .with_node(GraphNode::new("a", NodeType::Beat, "A"))
            .with_edge(GraphEdge::new("a", "nowhere"));
        assert!(matches!(
            graph.validate(),
            Err(GraphError::DanglingEdge { missing, .. }) if missing == "nowhere"
        ));
    }

    #[test]
    fn test_node_type_display() {
        assert_eq!(NodeType::Setpiece.to_string(), "setpiece");
        assert_eq!(serde_json::to_value(NodeType::Gate).unwrap(), "gate");
    }
}
