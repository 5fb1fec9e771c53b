//! Game state - the per-game snapshot rewritten once per turn.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;
use uuid::Uuid;

use crate::actions::Action;
use crate::guards::{GuardContext, GuardValue, ItemStack, NestedMap};

/// Namespace for flag keys written without one.
pub const GLOBAL_FLAG_NAMESPACE: &str = "global";

/// Unique identifier for a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GameId(pub Uuid);

impl GameId {
    /// Create a new random game ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// The placeholder ID of a state that was never spawned.
    pub fn nil() -> Self {
        Self(Uuid::nil())
    }

    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }
}

/// Defaults to the nil ID so that decoding a snapshot is deterministic.
impl Default for GameId {
    fn default() -> Self {
        Self::nil()
    }
}

impl std::fmt::Display for GameId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Split a flag key into `(namespace, name)` at the first dot.
pub fn split_flag_key(key: &str) -> (&str, &str) {
    key.split_once('.').unwrap_or((GLOBAL_FLAG_NAMESPACE, key))
}

/// The mutable state of a single game.
///
/// The engine never holds on to a `GameState`: each turn receives a snapshot
/// and hands back a full replacement. Callers must serialize turns per game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct GameState {
    pub game_id: GameId,

    pub current_node_id: Option<String>,

    /// Node ids in the order they were visited.
    pub visited: Vec<String>,

    /// Node ids whose fail branch fired, in order.
    pub failures: Vec<String>,

    pub retries: u32,

    /// Flags keyed `namespace.name`.
    pub flags: BTreeMap<String, bool>,

    /// Objective id -> status.
    pub objectives: BTreeMap<String, String>,

    /// Resource id -> level.
    pub resources: BTreeMap<String, f64>,

    /// Entity -> relationship stat -> value.
    pub relationships: NestedMap<i64>,

    /// Owner -> item -> stack.
    pub inventory: NestedMap<ItemStack>,

    /// Owner -> currency -> balance.
    pub currency: NestedMap<i64>,
}

impl GameState {
    /// Spawn a fresh game positioned at `start_node`, with a new random ID.
    pub fn new(start_node: impl Into<String>) -> Self {
        Self {
            game_id: GameId::new(),
            current_node_id: Some(start_node.into()),
            ..Self::default()
        }
    }

    pub fn with_flag(mut self, key: impl Into<String>, value: bool) -> Self {
        self.flags.insert(key.into(), value);
        self
    }

    pub fn with_objective(mut self, id: impl Into<String>, status: impl Into<String>) -> Self {
        self.objectives.insert(id.into(), status.into());
        self
    }

    pub fn with_resource(mut self, key: impl Into<String>, level: f64) -> Self {
        self.resources.insert(key.into(), level);
        self
    }

    pub fn with_relationship(mut self, entity: impl Into<String>, stat: impl Into<String>, value: i64) -> Self {
        self.relationships
            .entry(entity.into())
            .or_default()
            .insert(stat.into(), value);
        self
    }

    pub fn flag(&self, key: &str) -> bool {
        self.flags.get(key).copied().unwrap_or(false)
    }

    pub fn objective_status(&self, id: &str) -> Option<&str> {
        self.objectives.get(id).map(|s| s.as_str())
    }

    pub fn resource(&self, key: &str) -> Option<f64> {
        self.resources.get(key).copied()
    }

    /// Apply a single action. Returns whether any observable value changed;
    /// re-setting a flag or objective to its current value does not count.
    pub fn apply_action(&mut self, action: &Action) -> bool {
        match action {
            Action::ObjectiveUpdate { id, status } => {
                let previous = self.objectives.insert(id.clone(), status.clone());
                previous.as_deref() != Some(status.as_str())
            }
            Action::FlagSet { key, value } => {
                let changed = self.flag(key) != *value;
                self.flags.insert(key.clone(), *value);
                changed
            }
            Action::ResourceUpdate { key, delta } => {
                *self.resources.entry(key.clone()).or_insert(0.0) += delta;
                *delta != 0.0
            }
            Action::Malformed { kind, reason } => {
                debug!(kind = %kind, reason, "ignoring malformed action");
                false
            }
            Action::Unrecognized { kind } => {
                debug!(kind = %kind, "ignoring unrecognized action");
                false
            }
        }
    }

    /// Build the read-only snapshot guards evaluate against.
    ///
    /// Besides the relationship, inventory and currency maps, the `state`
    /// category exposes `objectives.<id>`, `resources.<id>`,
    /// `progress.retries` and `progress.currentNodeId`.
    pub fn guard_context(&self) -> GuardContext {
        let mut ctx = GuardContext {
            rel: self.relationships.clone(),
            inv: self.inventory.clone(),
            currency: self.currency.clone(),
            ..GuardContext::default()
        };

        for (key, value) in &self.flags {
            let (namespace, name) = split_flag_key(key);
            ctx.flag
                .entry(namespace.to_string())
                .or_default()
                .insert(name.to_string(), *value);
        }

        let objectives = ctx.state.entry("objectives".to_string()).or_default();
        for (id, status) in &self.objectives {
            objectives.insert(id.clone(), GuardValue::Text(status.clone()));
        }

        let resources = ctx.state.entry("resources".to_string()).or_default();
        for (id, level) in &self.resources {
            resources.insert(id.clone(), GuardValue::Float(*level));
        }

        let progress = ctx.state.entry("progress".to_string()).or_default();
        progress.insert("retries".to_string(), GuardValue::Int(self.retries.into()));
        if let Some(node_id) = &self.current_node_id {
            progress.insert("currentNodeId".to_string(), GuardValue::Text(node_id.clone()));
        }

        ctx
    }
}
