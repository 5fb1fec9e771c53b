//! Guard evaluation.
//!
//! Evaluation is total: unresolvable paths, type mismatches and nesting
//! beyond [`MAX_GUARD_DEPTH`] all evaluate to `false`. Guards fail closed.

use tracing::trace;

use super::{GuardContext, GuardExpression, GuardValue};

/// Deepest combinator nesting a guard may use. Four nested combinators fail.
pub const MAX_GUARD_DEPTH: usize = 3;

/// Depth bound hit somewhere below the current expression.
struct DepthExceeded;

type Eval = Result<bool, DepthExceeded>;

#[derive(Debug, Clone, Copy)]
enum Comparison {
    Eq,
    Ne,
    Gt,
    Lt,
    Gte,
    Lte,
}

/// Evaluate a guard against a context.
pub fn evaluate(expr: &GuardExpression, ctx: &GuardContext) -> bool {
    match evaluate_at(expr, ctx, 0) {
        Ok(result) => result,
        Err(DepthExceeded) => {
            trace!(operator = expr.operator(), "guard nesting too deep, failing closed");
            false
        }
    }
}

/// Evaluate a conjunction of guards. An empty list holds.
pub fn evaluate_all(guards: &[GuardExpression], ctx: &GuardContext) -> bool {
    guards.iter().all(|guard| evaluate(guard, ctx))
}

fn evaluate_at(expr: &GuardExpression, ctx: &GuardContext, depth: usize) -> Eval {
    if depth > MAX_GUARD_DEPTH {
        return Err(DepthExceeded);
    }

    let result = match expr {
        GuardExpression::Eq(path, lit) => compare(ctx, path, Comparison::Eq, lit),
        GuardExpression::Ne(path, lit) => compare(ctx, path, Comparison::Ne, lit),
        GuardExpression::Gt(path, lit) => compare(ctx, path, Comparison::Gt, lit),
        GuardExpression::Lt(path, lit) => compare(ctx, path, Comparison::Lt, lit),
        GuardExpression::Gte(path, lit) => compare(ctx, path, Comparison::Gte, lit),
        GuardExpression::Lte(path, lit) => compare(ctx, path, Comparison::Lte, lit),
        GuardExpression::In(path, candidates) => match ctx.resolve_path(path) {
            Some(value) => candidates.iter().any(|c| value.strict_eq(c)),
            None => false,
        },
        GuardExpression::Flag(namespace, name, expected) => {
            ctx.flag_value(namespace, name) == *expected
        }
        GuardExpression::All(exprs) => {
            for e in exprs {
                if !evaluate_at(e, ctx, depth + 1)? {
                    return Ok(false);
                }
            }
            true
        }
        GuardExpression::Any(exprs) => {
            for e in exprs {
                if evaluate_at(e, ctx, depth + 1)? {
                    return Ok(true);
                }
            }
            false
        }
        GuardExpression::Not(inner) => !evaluate_at(inner, ctx, depth + 1)?,
    };

    Ok(result)
}

fn compare(ctx: &GuardContext, path: &str, op: Comparison, literal: &GuardValue) -> bool {
    // Absent values never satisfy a comparison, `ne` included.
    let Some(value) = ctx.resolve_path(path) else {
        return false;
    };

    match op {
        Comparison::Eq => value.strict_eq(literal),
        Comparison::Ne => !value.strict_eq(literal),
        ordered => {
            let (Some(left), Some(right)) = (value.as_f64(), literal.as_f64()) else {
                return false;
            };
            match ordered {
                Comparison::Gt => left > right,
                Comparison::Lt => left < right,
                Comparison::Gte => left >= right,
                Comparison::Lte => left <= right,
                Comparison::Eq | Comparison::Ne => false,
            }
        }
    }
}
