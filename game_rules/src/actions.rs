//! AWF action vocabulary - the state-changing acts a turn can emit.

use serde::{Deserialize, Serialize};

/// Wire kind for objective status changes.
pub const OBJECTIVE_UPDATE: &str = "OBJECTIVE_UPDATE";
/// Wire kind for flag assignments.
pub const FLAG_SET: &str = "FLAG_SET";
/// Wire kind for resource deltas.
pub const RESOURCE_UPDATE: &str = "RESOURCE_UPDATE";

/// An action record as emitted by the model or authored as a node template.
///
/// Templates and emitted acts share this shape. A template matches an act when
/// the kinds agree and, if the template names an `id`, the ids agree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRecord {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub val: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta: Option<f64>,
}

impl ActionRecord {
    /// Create a bare record of the given kind.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id: None,
            key: None,
            val: None,
            status: None,
            delta: None,
        }
    }

    pub fn objective_update(id: impl Into<String>, status: impl Into<String>) -> Self {
        Self::new(OBJECTIVE_UPDATE).with_id(id).with_status(status)
    }

    pub fn flag_set(key: impl Into<String>, value: bool) -> Self {
        Self::new(FLAG_SET).with_key(key).with_val(serde_json::Value::Bool(value))
    }

    pub fn resource_update(key: impl Into<String>, delta: f64) -> Self {
        let mut record = Self::new(RESOURCE_UPDATE).with_key(key);
        record.delta = Some(delta);
        record
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_val(mut self, val: serde_json::Value) -> Self {
        self.val = Some(val);
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    /// Whether this act satisfies the given template.
    pub fn matches_template(&self, template: &ActionRecord) -> bool {
        if self.kind != template.kind {
            return false;
        }
        match &template.id {
            Some(id) => self.id.as_ref() == Some(id),
            None => true,
        }
    }

    fn target_key(&self) -> Option<String> {
        self.key.clone().or_else(|| self.id.clone())
    }

    /// Interpret the record as a typed action.
    pub fn to_action(&self) -> Action {
        match self.kind.as_str() {
            OBJECTIVE_UPDATE => match (&self.id, &self.status) {
                (Some(id), Some(status)) => Action::ObjectiveUpdate {
                    id: id.clone(),
                    status: status.clone(),
                },
                _ => self.malformed("objective update needs an id and a status"),
            },
            FLAG_SET => match (self.target_key(), self.val.as_ref().and_then(|v| v.as_bool())) {
                (Some(key), Some(value)) => Action::FlagSet { key, value },
                _ => self.malformed("flag set needs a key and a boolean val"),
            },
            RESOURCE_UPDATE => {
                let delta = self
                    .delta
                    .or_else(|| self.val.as_ref().and_then(|v| v.as_f64()));
                match (self.target_key(), delta) {
                    (Some(key), Some(delta)) => Action::ResourceUpdate { key, delta },
                    _ => self.malformed("resource update needs a key and a numeric delta"),
                }
            }
            other => Action::Unrecognized {
                kind: other.to_string(),
            },
        }
    }

    fn malformed(&self, reason: &'static str) -> Action {
        Action::Malformed {
            kind: self.kind.clone(),
            reason,
        }
    }
}

/// A typed action, ready to be applied to game state.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Set `objectives[id] = status`.
    ObjectiveUpdate { id: String, status: String },
    /// Set `flags[key] = value`.
    FlagSet { key: String, value: bool },
    /// Add `delta` to `resources[key]`. Unclamped.
    ResourceUpdate { key: String, delta: f64 },
    /// A known kind missing the fields it needs.
    Malformed { kind: String, reason: &'static str },
    /// A kind this engine does not apply.
    Unrecognized { kind: String },
}

impl Action {
    /// Whether this action counts as narrative progress, assuming it changed
    /// the state it was applied to.
    pub fn is_progress(&self, completed_status: &str) -> bool {
        match self {
            Action::ObjectiveUpdate { status, .. } => status == completed_status,
            Action::FlagSet { value, .. } => *value,
            Action::ResourceUpdate { .. } | Action::Malformed { .. } | Action::Unrecognized { .. } => {
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_template_matching() {
        let act = ActionRecord::objective_update("find_guide", "complete");

        assert!(act.matches_template(&ActionRecord::new(OBJECTIVE_UPDATE)));
        assert!(act.matches_template(&ActionRecord::new(OBJECTIVE_UPDATE).with_id("find_guide")));
        assert!(!act.matches_template(&ActionRecord::new(OBJECTIVE_UPDATE).with_id("escape")));
        assert!(!act.matches_template(&ActionRecord::new(FLAG_SET)));
    }

    #[test]
    fn test_template_with_id_rejects_act_without_id() {
        let act = ActionRecord::new("SCENE_END");
        assert!(!act.matches_template(&ActionRecord::new("SCENE_END").with_id("finale")));
    }

    #[test]
    fn test_parse_records() {
        let acts: Vec<ActionRecord> = serde_json::from_value(json!([
            {"type": "OBJECTIVE_UPDATE", "id": "find_guide", "status": "complete"},
            {"type": "FLAG_SET", "key": "story.met_guide", "val": true},
            {"type": "RESOURCE_UPDATE", "key": "health", "val": -3},
            {"type": "MOVE", "id": "north"}
        ]))
        .unwrap();

        assert_eq!(
            acts[0].to_action(),
            Action::ObjectiveUpdate {
                id: "find_guide".to_string(),
                status: "complete".to_string()
            }
        );
        assert_eq!(
            acts[1].to_action(),
            Action::FlagSet {
                key: "story.met_guide".to_string(),
                value: true
            }
        );
        assert_eq!(
            acts[2].to_action(),
            Action::ResourceUpdate {
                key: "health".to_string(),
                delta: -3.0
            }
        );
        assert_eq!(
            acts[3].to_action(),
            Action::Unrecognized {
                kind: "MOVE".to_string()
            }
        );
    }

    #[test]
    fn test_key_falls_back_to_id() {
        let record = ActionRecord::new(RESOURCE_UPDATE).with_id("mana");
        let record = ActionRecord {
            delta: Some(2.0),
            ..record
        };
        assert_eq!(
            record.to_action(),
            Action::ResourceUpdate {
                key: "mana".to_string(),
                delta: 2.0
            }
        );
    }

    #[test]
    fn test_malformed_records() {
        let missing_status = ActionRecord::new(OBJECTIVE_UPDATE).with_id("escape");
        assert!(matches!(missing_status.to_action(), Action::Malformed { .. }));

        let non_bool = ActionRecord::new(FLAG_SET).with_key("story.x").with_val(json!("yes"));
        assert!(matches!(non_bool.to_action(), Action::Malformed { .. }));

        let no_delta = ActionRecord::new(RESOURCE_UPDATE).with_key("health");
        assert!(matches!(no_delta.to_action(), Action::Malformed { .. }));
    }

    #[test]
    fn test_progress_detection() {
        assert!(ActionRecord::objective_update("a", "complete").to_action().is_progress("complete"));
        assert!(!ActionRecord::objective_update("a", "active").to_action().is_progress("complete"));
        assert!(ActionRecord::flag_set("story.x", true).to_action().is_progress("complete"));
        assert!(!ActionRecord::flag_set("story.x", false).to_action().is_progress("complete"));
        assert!(!ActionRecord::resource_update("health", 5.0).to_action().is_progress("complete"));
    }

    #[test]
    fn test_serialize_skips_empty_fields() {
        let value = serde_json::to_value(ActionRecord::flag_set("story.met_guide", true)).unwrap();
        assert_eq!(value, json!({"type": "FLAG_SET", "key": "story.met_guide", "val": true}));
    }
}
