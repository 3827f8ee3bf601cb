// invoice-design-service/src/template/mod.rs

//! Safe renderer for design templates.
//!
//! Templates are parsed into a small tree and interpreted; nothing in a
//! template is ever executed. Supported syntax:
//!
//! - `$name`, `$object.field`: placeholder lookup. A placeholder ends at the
//!   first character outside `[A-Za-z0-9_]`, so `$total` never matches
//!   inside `$total_tax`.
//! - `@if(expr)`, `@elseif(expr)`, `@else`, `@endif`
//! - `@foreach($line_items as $item)`, `@endforeach`, with `$item.field` and
//!   `$loop.index`/`iteration`/`first`/`last`/`count` inside the body.
//! - `@@` for a literal `@`.
//!
//! Substituted values are emitted verbatim and never re-scanned.

mod ast;
mod error;
mod evaluator;
mod expr;
mod parser;

pub use ast::{CompareOp, Conditional, Expr, Loop, Node, Placeholder};
pub use error::{Position, RenderError, RenderResult};
pub use evaluator::RenderedDocument;
pub use parser::{Template, ITERABLE_COLLECTIONS};

use crate::substitution::{LineItemContext, SubstitutionSet};

/// Parse and render `source` in one step.
pub fn render(
    source: &str,
    substitutions: &SubstitutionSet,
    line_items: &LineItemContext,
) -> RenderResult<RenderedDocument> {
    Template::parse(source)?.render(substitutions, line_items)
}
