//! Read-only snapshot guards are evaluated against.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::GuardValue;

/// Nested `outer -> inner -> value` map used by every context category.
pub type NestedMap<T> = HashMap<String, HashMap<String, T>>;

/// A stack of items held by an owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ItemStack {
    pub qty: i64,
}

impl ItemStack {
    pub fn new(qty: i64) -> Self {
        Self { qty }
    }
}

/// Snapshot of game data visible to guards.
///
/// Paths are dotted: `category.key1.key2`. Categories:
/// - `rel.<entity>.<stat>` - relationship stats (missing = `0`)
/// - `inv.<owner>.<item>[.qty]` - item quantities (missing = `0`)
/// - `currency.<owner>.<name>` - balances (missing = `0`)
/// - `flag.<namespace>.<name>` - booleans (missing = `false`)
/// - `state.<namespace>.<key>` - arbitrary scalars (missing = no value)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GuardContext {
    pub rel: NestedMap<i64>,
    pub inv: NestedMap<ItemStack>,
    pub currency: NestedMap<i64>,
    pub flag: NestedMap<bool>,
    pub state: NestedMap<GuardValue>,
}

fn insert_nested<T>(map: &mut NestedMap<T>, outer: impl Into<String>, inner: impl Into<String>, value: T) {
    map.entry(outer.into()).or_default().insert(inner.into(), value);
}

fn lookup<'a, T>(map: &'a NestedMap<T>, outer: &str, inner: &str) -> Option<&'a T> {
    map.get(outer)?.get(inner)
}

impl GuardContext {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rel(mut self, entity: impl Into<String>, stat: impl Into<String>, value: i64) -> Self {
        insert_nested(&mut self.rel, entity, stat, value);
        self
    }

    pub fn with_item(mut self, owner: impl Into<String>, item: impl Into<String>, qty: i64) -> Self {
        insert_nested(&mut self.inv, owner, item, ItemStack::new(qty));
        self
    }

    pub fn with_currency(mut self, owner: impl Into<String>, name: impl Into<String>, amount: i64) -> Self {
        insert_nested(&mut self.currency, owner, name, amount);
        self
    }

    pub fn with_flag(mut self, namespace: impl Into<String>, name: impl Into<String>, value: bool) -> Self {
        insert_nested(&mut self.flag, namespace, name, value);
        self
    }

    pub fn with_state(
        mut self,
        namespace: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<GuardValue>,
    ) -> Self {
        insert_nested(&mut self.state, namespace, key, value.into());
        self
    }

    /// Value of a flag, `false` when absent.
    pub fn flag_value(&self, namespace: &str, name: &str) -> bool {
        lookup(&self.flag, namespace, name).copied().unwrap_or(false)
    }

    /// Resolve a dotted path to a value.
    ///
    /// Numeric categories and flags never come back empty: absent data resolves
    /// to the category's zero value. `None` is only returned for `state` paths
    /// with no value and for unknown categories or malformed paths.
    pub fn resolve_path(&self, path: &str) -> Option<GuardValue> {
        let mut segments = path.split('.');
        let category = segments.next()?;
        let rest: Vec<&str> = segments.collect();

        match category {
            "rel" => Some(GuardValue::Int(Self::numeric(&self.rel, &rest))),
            "currency" => Some(GuardValue::Int(Self::numeric(&self.currency, &rest))),
            "inv" => {
                let qty = match rest.as_slice() {
                    [owner, item] | [owner, item, "qty"] => {
                        lookup(&self.inv, owner, item).map(|stack| stack.qty)
                    }
                    _ => None,
                };
                Some(GuardValue::Int(qty.unwrap_or(0)))
            }
            "flag" => {
                let value = match rest.as_slice() {
                    [namespace, name] => self.flag_value(namespace, name),
                    _ => false,
                };
                Some(GuardValue::Bool(value))
            }
            "state" => match rest.as_slice() {
                [namespace, key] => lookup(&self.state, namespace, key).cloned(),
                _ => None,
            },
            _ => None,
        }
    }

    fn numeric(map: &NestedMap<i64>, rest: &[&str]) -> i64 {
        match rest {
            [outer, inner] => lookup(map, outer, inner).copied().unwrap_or(0),
            _ => 0,
        }
    }
}
