// invoice-design-service/src/template/evaluator.rs

//! Interprets a parsed [`Template`] against a substitution set.
//!
//! Output is accumulated into a local buffer and only handed back once the
//! whole tree has been walked, so callers never observe partial HTML.

use super::ast::{CompareOp, Conditional, Expr, Loop, Node, Placeholder};
use super::error::RenderResult;
use super::parser::Template;
use crate::substitution::{LineItemContext, LineItemRow, SubstitutionSet};
use serde::Serialize;
use std::borrow::Cow;
use std::cmp::Ordering;
use std::collections::BTreeSet;
use tracing::debug;

/// Final HTML for one render, plus the placeholders nothing could resolve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedDocument {
    pub html: String,
    pub unresolved: BTreeSet<String>,
}

impl Template {
    /// Render with the given substitutions and line items.
    ///
    /// Unresolved placeholders become empty strings and are listed in
    /// [`RenderedDocument::unresolved`].
    pub fn render(
        &self,
        substitutions: &SubstitutionSet,
        line_items: &LineItemContext,
    ) -> RenderResult<RenderedDocument> {
        let mut ctx = EvalContext {
            substitutions,
            line_items,
            frames: Vec::new(),
            unresolved: BTreeSet::new(),
        };
        let mut html = String::new();
        evaluate(&self.nodes, &mut ctx, &mut html)?;

        if !ctx.unresolved.is_empty() {
            debug!(
                unresolved = ?ctx.unresolved,
                "Rendered template with unresolved placeholders"
            );
        }

        Ok(RenderedDocument {
            html,
            unresolved: ctx.unresolved,
        })
    }
}

/// One active `@foreach` iteration.
struct Frame<'a> {
    binding: &'a str,
    row: &'a LineItemRow,
    index: usize,
    count: usize,
}

struct EvalContext<'a> {
    substitutions: &'a SubstitutionSet,
    line_items: &'a LineItemContext,
    frames: Vec<Frame<'a>>,
    unresolved: BTreeSet<String>,
}

impl<'a> EvalContext<'a> {
    fn lookup(&mut self, placeholder: &Placeholder) -> Cow<'a, str> {
        if let Some(found) = self.lookup_scoped(placeholder) {
            return found;
        }
        let substitutions = self.substitutions;
        match substitutions.get(&placeholder.key()) {
            Some(value) => Cow::Borrowed(value),
            None => {
                self.unresolved.insert(placeholder.key());
                Cow::Borrowed("")
            }
        }
    }

    /// Loop-bound names shadow the substitution set, innermost first.
    fn lookup_scoped(&mut self, placeholder: &Placeholder) -> Option<Cow<'a, str>> {
        let head = placeholder.head();
        let field = placeholder.path.get(1).map(String::as_str);

        if head == "loop" {
            let frame = self.frames.last()?;
            let value = match (field, placeholder.path.len()) {
                (Some("index"), 2) => frame.index.to_string(),
                (Some("iteration"), 2) => (frame.index + 1).to_string(),
                (Some("first"), 2) => (frame.index == 0).to_string(),
                (Some("last"), 2) => (frame.index + 1 == frame.count).to_string(),
                (Some("count"), 2) => frame.count.to_string(),
                _ => {
                    self.unresolved.insert(placeholder.key());
                    String::new()
                }
            };
            return Some(Cow::Owned(value));
        }

        let row = self.frames.iter().rev().find(|f| f.binding == head)?.row;
        let value = match field {
            Some(field) if placeholder.path.len() == 2 => row.get(field),
            _ => None,
        };
        Some(match value {
            Some(value) => Cow::Borrowed(value),
            None => {
                self.unresolved.insert(placeholder.key());
                Cow::Borrowed("")
            }
        })
    }
}

fn evaluate<'a>(nodes: &'a [Node], ctx: &mut EvalContext<'a>, out: &mut String) -> RenderResult<()> {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Placeholder(placeholder) => {
                let value = ctx.lookup(placeholder);
                out.push_str(&value);
            }
            Node::Conditional(conditional) => evaluate_conditional(conditional, ctx, out)?,
            Node::Loop(lp) => evaluate_loop(lp, ctx, out)?,
        }
    }
    Ok(())
}

fn evaluate_conditional<'a>(
    conditional: &'a Conditional,
    ctx: &mut EvalContext<'a>,
    out: &mut String,
) -> RenderResult<()> {
    for (condition, body) in &conditional.branches {
        if truthy(&eval_expr(condition, ctx)) {
            return evaluate(body, ctx, out);
        }
    }
    match &conditional.else_branch {
        Some(body) => evaluate(body, ctx, out),
        None => Ok(()),
    }
}

fn evaluate_loop<'a>(lp: &'a Loop, ctx: &mut EvalContext<'a>, out: &mut String) -> RenderResult<()> {
    // The parser only admits `line_items`.
    let line_items = ctx.line_items;
    let rows = line_items.rows();
    let count = rows.len();

    for (index, row) in rows.iter().enumerate() {
        ctx.frames.push(Frame {
            binding: &lp.binding,
            row,
            index,
            count,
        });
        let result = evaluate(&lp.body, ctx, out);
        ctx.frames.pop();
        result?;
    }
    Ok(())
}

/// Result of evaluating an expression operand.
#[derive(Debug, Clone, PartialEq)]
enum Scalar<'a> {
    Text(Cow<'a, str>),
    Number(f64),
    Bool(bool),
}

impl Scalar<'_> {
    fn as_number(&self) -> Option<f64> {
        match self {
            Scalar::Number(n) => Some(*n),
            Scalar::Text(text) => text.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            Scalar::Bool(_) => None,
        }
    }

    fn as_text(&self) -> Cow<'_, str> {
        match self {
            Scalar::Text(text) => Cow::Borrowed(text.as_ref()),
            Scalar::Number(n) => Cow::Owned(n.to_string()),
            Scalar::Bool(b) => Cow::Owned(b.to_string()),
        }
    }
}

/// Empty text, `0` and `false` are false; everything else is true.
fn truthy(value: &Scalar<'_>) -> bool {
    match value {
        Scalar::Bool(b) => *b,
        Scalar::Number(n) => *n != 0.0,
        Scalar::Text(text) => {
            let text = text.trim();
            !(text.is_empty() || text == "false" || text.parse::<f64>().map(|n| n == 0.0).unwrap_or(false))
        }
    }
}

fn eval_expr<'a>(expr: &'a Expr, ctx: &mut EvalContext<'a>) -> Scalar<'a> {
    match expr {
        Expr::Placeholder(placeholder) => Scalar::Text(ctx.lookup(placeholder)),
        Expr::Str(text) => Scalar::Text(Cow::Borrowed(text)),
        Expr::Number(n) => Scalar::Number(*n),
        Expr::Bool(b) => Scalar::Bool(*b),
        Expr::Not(inner) => Scalar::Bool(!truthy(&eval_expr(inner, ctx))),
        Expr::And(lhs, rhs) => {
            Scalar::Bool(truthy(&eval_expr(lhs, ctx)) && truthy(&eval_expr(rhs, ctx)))
        }
        Expr::Or(lhs, rhs) => {
            Scalar::Bool(truthy(&eval_expr(lhs, ctx)) || truthy(&eval_expr(rhs, ctx)))
        }
        Expr::Compare(lhs, op, rhs) => {
            let lhs = eval_expr(lhs, ctx);
            let rhs = eval_expr(rhs, ctx);
            Scalar::Bool(compare(&lhs, *op, &rhs))
        }
    }
}

/// Numeric when both sides parse as numbers, textual otherwise.
fn compare(lhs: &Scalar<'_>, op: CompareOp, rhs: &Scalar<'_>) -> bool {
    let ordering = match (lhs.as_number(), rhs.as_number()) {
        (Some(a), Some(b)) => a.partial_cmp(&b),
        _ => match (lhs, rhs) {
            (Scalar::Bool(a), other) | (other, Scalar::Bool(a)) => {
                // Booleans compare by truthiness against anything.
                let b = truthy(other);
                return match op {
                    CompareOp::Eq => *a == b,
                    CompareOp::Ne => *a != b,
                    _ => false,
                };
            }
            _ => Some(lhs.as_text().cmp(&rhs.as_text())),
        },
    };

    let Some(ordering) = ordering else {
        return false;
    };
    match op {
        CompareOp::Eq => ordering == Ordering::Equal,
        CompareOp::Ne => ordering != Ordering::Equal,
        CompareOp::Lt => ordering == Ordering::Less,
        CompareOp::Le => ordering != Ordering::Greater,
        CompareOp::Gt => ordering == Ordering::Greater,
        CompareOp::Ge => ordering != Ordering::Less,
    }
}
