//! Guard DSL - boolean expressions gating node entry and edge traversal.
//!
//! Guards are authored as JSON and parsed once into [`GuardExpression`]:
//! - **Comparisons**: `{"gte": ["rel.kiera.trust", 8]}` (`eq`, `ne`, `gt`, `lt`, `gte`, `lte`)
//! - **Membership**: `{"in": ["state.objectives.find_guide", ["active", "complete"]]}`
//! - **Flag test**: `{"flag": ["story", "met_guide", true]}`
//! - **Combinators**: `{"all": [...]}`, `{"any": [...]}`, `{"not": {...}}`
//!
//! Unknown operators and malformed shapes are rejected at parse time. Evaluation
//! itself never fails: see [`evaluate`].

mod context;
mod eval;

pub use context::*;
pub use eval::*;

use serde::{Deserialize, Serialize};

/// A scalar literal or resolved value in a guard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GuardValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl GuardValue {
    /// Numeric view of the value, if it is a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            GuardValue::Int(i) => Some(*i as f64),
            GuardValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Strict equality: numbers compare numerically, everything else must share a type.
    pub fn strict_eq(&self, other: &GuardValue) -> bool {
        match (self.as_f64(), other.as_f64()) {
            (Some(a), Some(b)) => a == b,
            _ => match (self, other) {
                (GuardValue::Bool(a), GuardValue::Bool(b)) => a == b,
                (GuardValue::Text(a), GuardValue::Text(b)) => a == b,
                _ => false,
            },
        }
    }
}

impl From<bool> for GuardValue {
    fn from(value: bool) -> Self {
        GuardValue::Bool(value)
    }
}

impl From<i64> for GuardValue {
    fn from(value: i64) -> Self {
        GuardValue::Int(value)
    }
}

impl From<i32> for GuardValue {
    fn from(value: i32) -> Self {
        GuardValue::Int(value.into())
    }
}

impl From<f64> for GuardValue {
    fn from(value: f64) -> Self {
        GuardValue::Float(value)
    }
}

impl From<&str> for GuardValue {
    fn from(value: &str) -> Self {
        GuardValue::Text(value.to_string())
    }
}

impl From<String> for GuardValue {
    fn from(value: String) -> Self {
        GuardValue::Text(value)
    }
}

impl std::fmt::Display for GuardValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GuardValue::Bool(b) => write!(f, "{}", b),
            GuardValue::Int(i) => write!(f, "{}", i),
            GuardValue::Float(x) => write!(f, "{}", x),
            GuardValue::Text(s) => write!(f, "\"{}\"", s),
        }
    }
}

/// A guard expression in the DSL.
///
/// The serde representation is externally tagged, so each variant is a
/// single-key JSON object whose key is the operator name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GuardExpression {
    Eq(String, GuardValue),
    Ne(String, GuardValue),
    Gt(String, GuardValue),
    Lt(String, GuardValue),
    Gte(String, GuardValue),
    Lte(String, GuardValue),
    In(String, Vec<GuardValue>),
    /// `[namespace, name, expected]`.
    Flag(String, String, bool),
    All(Vec<GuardExpression>),
    Any(Vec<GuardExpression>),
    Not(Box<GuardExpression>),
}

impl GuardExpression {
    pub fn eq(path: impl Into<String>, value: impl Into<GuardValue>) -> Self {
        GuardExpression::Eq(path.into(), value.into())
    }

    pub fn ne(path: impl Into<String>, value: impl Into<GuardValue>) -> Self {
        GuardExpression::Ne(path.into(), value.into())
    }

    pub fn gt(path: impl Into<String>, value: impl Into<GuardValue>) -> Self {
        GuardExpression::Gt(path.into(), value.into())
    }

    pub fn lt(path: impl Into<String>, value: impl Into<GuardValue>) -> Self {
        GuardExpression::Lt(path.into(), value.into())
    }

    pub fn gte(path: impl Into<String>, value: impl Into<GuardValue>) -> Self {
        GuardExpression::Gte(path.into(), value.into())
    }

    pub fn lte(path: impl Into<String>, value: impl Into<GuardValue>) -> Self {
        GuardExpression::Lte(path.into(), value.into())
    }

    pub fn one_of(path: impl Into<String>, values: impl IntoIterator<Item = GuardValue>) -> Self {
        GuardExpression::In(path.into(), values.into_iter().collect())
    }

    pub fn flag(namespace: impl Into<String>, name: impl Into<String>, expected: bool) -> Self {
        GuardExpression::Flag(namespace.into(), name.into(), expected)
    }

    pub fn all(exprs: impl IntoIterator<Item = GuardExpression>) -> Self {
        GuardExpression::All(exprs.into_iter().collect())
    }

    pub fn any(exprs: impl IntoIterator<Item = GuardExpression>) -> Self {
        GuardExpression::Any(exprs.into_iter().collect())
    }

    pub fn negate(expr: GuardExpression) -> Self {
        GuardExpression::Not(Box::new(expr))
    }

    /// Parse a single guard from its JSON form.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Operator name as it appears on the wire.
    pub fn operator(&self) -> &'static str {
        match self {
            GuardExpression::Eq(..) => "eq",
            GuardExpression::Ne(..) => "ne",
            GuardExpression::Gt(..) => "gt",
            GuardExpression::Lt(..) => "lt",
            GuardExpression::Gte(..) => "gte",
            GuardExpression::Lte(..) => "lte",
            GuardExpression::In(..) => "in",
            GuardExpression::Flag(..) => "flag",
            GuardExpression::All(_) => "all",
            GuardExpression::Any(_) => "any",
            GuardExpression::Not(_) => "not",
        }
    }
}

impl GuardExpression {
    /// Write this expression at nesting `depth`. Subtrees past
    /// [`MAX_GUARD_DEPTH`] are elided as `...`, mirroring where evaluation
    /// gives up.
    fn render(&self, f: &mut std::fmt::Formatter<'_>, depth: usize) -> std::fmt::Result {
        if depth > MAX_GUARD_DEPTH {
            return write!(f, "...");
        }

        match self {
            GuardExpression::Eq(p, v) => write!(f, "{} == {}", p, v),
            GuardExpression::Ne(p, v) => write!(f, "{} != {}", p, v),
            GuardExpression::Gt(p, v) => write!(f, "{} > {}", p, v),
            GuardExpression::Lt(p, v) => write!(f, "{} < {}", p, v),
            GuardExpression::Gte(p, v) => write!(f, "{} >= {}", p, v),
            GuardExpression::Lte(p, v) => write!(f, "{} <= {}", p, v),
            GuardExpression::In(p, values) => {
                let list: Vec<_> = values.iter().map(|v| v.to_string()).collect();
                write!(f, "{} in [{}]", p, list.join(", "))
            }
            GuardExpression::Flag(ns, name, expected) => {
                write!(f, "flag {}.{} == {}", ns, name, expected)
            }
            GuardExpression::All(exprs) => render_list(f, "all", exprs, depth),
            GuardExpression::Any(exprs) => render_list(f, "any", exprs, depth),
            GuardExpression::Not(inner) => {
                write!(f, "not(")?;
                inner.render(f, depth + 1)?;
                write!(f, ")")
            }
        }
    }
}

fn render_list(
    f: &mut std::fmt::Formatter<'_>,
    name: &str,
    exprs: &[GuardExpression],
    depth: usize,
) -> std::fmt::Result {
    write!(f, "{}(", name)?;
    for (i, expr) in exprs.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        expr.render(f, depth + 1)?;
    }
    write!(f, ")")
}

impl std::fmt::Display for GuardExpression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.render(f, 0)
    }
}

/// Render a conjunction of guards, `None` when there is nothing to render.
pub fn summarize_guards<'a>(guards: impl IntoIterator<Item = &'a GuardExpression>) -> Option<String> {
    let parts: Vec<_> = guards.into_iter().map(|g| g.to_string()).collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" and "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_comparison() {
        let expr = GuardExpression::from_json(r#"{"gte": ["rel.kiera.trust", 8]}"#).unwrap();
        assert_eq!(expr, GuardExpression::gte("rel.kiera.trust", 8));
    }

    #[test]
    fn test_parse_nested_combinators() {
        let json = r#"{
            "all": [
                {"flag": ["story", "met_guide", true]},
                {"not": {"in": ["state.objectives.escape", ["failed", "complete"]]}},
                {"any": [{"gt": ["currency.player.gold", 10]}, {"eq": ["state.progress.currentNodeId", "gate"]}]}
            ]
        }"#;
        let expr = GuardExpression::from_json(json).unwrap();

        match expr {
            GuardExpression::All(items) => {
                assert_eq!(items.len(), 3);
                assert_eq!(items[0], GuardExpression::flag("story", "met_guide", true));
                assert!(matches!(items[1], GuardExpression::Not(_)));
                assert_eq!(items[2].operator(), "any");
            }
            other => panic!("expected all, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_rejects_unknown_operator() {
        assert!(GuardExpression::from_json(r#"{"xor": []}"#).is_err());
        assert!(GuardExpression::from_json(r#"{"eq": ["a.b.c", 1], "ne": ["a.b.c", 2]}"#).is_err());
        assert!(GuardExpression::from_json(r#"{"eq": ["rel.a.b", null]}"#).is_err());
        assert!(GuardExpression::from_json(r#"{"flag": ["story", "met_guide", "yes"]}"#).is_err());
    }

    #[test]
    fn test_literal_types() {
        let expr = GuardExpression::from_json(r#"{"in": ["state.x.y", [1, 2.5, "a", false]]}"#).unwrap();
        assert_eq!(
            expr,
            GuardExpression::one_of(
                "state.x.y",
                vec![
                    GuardValue::Int(1),
                    GuardValue::Float(2.5),
                    GuardValue::from("a"),
                    GuardValue::Bool(false),
                ]
            )
        );
    }

    #[test]
    fn test_strict_eq() {
        assert!(GuardValue::Int(3).strict_eq(&GuardValue::Float(3.0)));
        assert!(!GuardValue::Int(1).strict_eq(&GuardValue::Bool(true)));
        assert!(!GuardValue::from("1").strict_eq(&GuardValue::Int(1)));
        assert!(GuardValue::from("done").strict_eq(&GuardValue::from("done")));
    }

    #[test]
    fn test_display() {
        let expr = GuardExpression::all(vec![
            GuardExpression::gte("rel.kiera.trust", 8),
            GuardExpression::negate(GuardExpression::flag("story", "betrayed", true)),
        ]);
        assert_eq!(
            expr.to_string(),
            "all(rel.kiera.trust >= 8, not(flag story.betrayed == true))"
        );
    }

    #[test]
    fn test_display_elides_past_depth_bound() {
        let deep = (0..4).fold(GuardExpression::eq("rel.kiera.trust", 8), |inner, _| {
            GuardExpression::all(vec![inner])
        });
        assert_eq!(deep.to_string(), "all(all(all(all(...))))");

        let shallow = (0..3).fold(GuardExpression::eq("rel.kiera.trust", 8), |inner, _| {
            GuardExpression::negate(inner)
        });
        assert_eq!(shallow.to_string(), "not(not(not(rel.kiera.trust == 8)))");

        let huge = (0..100_000).fold(GuardExpression::flag("story", "x", true), |inner, _| {
            GuardExpression::negate(inner)
        });
        assert_eq!(huge.to_string(), "not(not(not(not(...))))");
        // Dropping a box chain this long recurses as deep as it is nested.
        std::mem::forget(huge);
    }

    #[test]
    fn test_summarize_guards() {
        let guards = vec![
            GuardExpression::eq("state.objectives.find_guide", "complete"),
            GuardExpression::lt("inv.player.torch", 1),
        ];
        assert_eq!(
            summarize_guards(&guards).unwrap(),
            "state.objectives.find_guide == \"complete\" and inv.player.torch < 1"
        );
        assert!(summarize_guards(std::iter::empty()).is_none());
    }
}
