// invoice-design-service/src/template/expr.rs

//! Parser for the condition grammar used by `@if` and `@elseif`.
//!
//! ```text
//! or      := and (("||" | "or") and)*
//! and     := unary (("&&" | "and") unary)*
//! unary   := ("!" | "not") unary | compare
//! compare := operand (("==" | "!=" | "<" | "<=" | ">" | ">=") operand)?
//! operand := placeholder | string | number | "true" | "false" | "(" or ")"
//! ```
//!
//! Anything else (function calls, assignment, arithmetic) is rejected.
//! Parentheses and negations nest at most [`MAX_NESTING`] levels deep.

use super::ast::{CompareOp, Expr, Placeholder};
use super::error::{Position, RenderError, RenderResult};
use super::parser::{is_ident_continue, is_ident_start, MAX_NESTING};
use winnow::ascii::digit1;
use winnow::combinator::{alt, cut_err, delimited, fail, not, opt, preceded, repeat, terminated};
use winnow::error::{ContextError, ErrMode, StrContext, StrContextValue};
use winnow::prelude::*;
use winnow::token::{one_of, take_till, take_while};

const NESTING_LABEL: &str = "nesting";

/// Where the condition text sits inside the template, so placeholder
/// offsets point into the whole source.
#[derive(Debug, Clone, Copy)]
struct Origin {
    base: usize,
    len: usize,
}

impl Origin {
    fn offset(self, input: &str) -> usize {
        self.base + self.len - input.len()
    }
}

/// Parse `text`, which starts at byte `base` of `source`.
pub(crate) fn parse_expression(source: &str, text: &str, base: usize) -> RenderResult<Expr> {
    if text.trim().is_empty() {
        return Err(RenderError::InvalidExpression {
            message: "empty condition".to_string(),
            at: Position::at(source, base),
        });
    }

    let origin = Origin {
        base,
        len: text.len(),
    };
    let result = terminated(|i: &mut &str| or_expr(i, origin, 0), ws)
        .parse(text)
        .map_err(|e| RenderError::InvalidExpression {
            message: describe(e.inner()),
            at: Position::at(source, base + e.offset()),
        });
    result
}

/// Human-readable summary of a failed parse.
pub(crate) fn describe(error: &ContextError) -> String {
    if is_too_deep(error) {
        return format!("nested deeper than {} levels", MAX_NESTING);
    }
    let expected: Vec<String> = error
        .context()
        .filter_map(|c| match c {
            StrContext::Expected(value) => Some(value.to_string()),
            _ => None,
        })
        .collect();
    if expected.is_empty() {
        "unexpected input".to_string()
    } else {
        format!("expected {}", expected.join(" or "))
    }
}

pub(crate) fn is_too_deep(error: &ContextError) -> bool {
    error
        .context()
        .any(|c| matches!(c, StrContext::Label(NESTING_LABEL)))
}

/// Always fails, uncatchably, with the nesting label.
pub(crate) fn too_deep<O>(input: &mut &str) -> ModalResult<O> {
    cut_err(fail::<_, O, _>)
        .context(StrContext::Label(NESTING_LABEL))
        .parse_next(input)
}

fn deeper(input: &mut &str, depth: usize) -> ModalResult<usize> {
    if depth >= MAX_NESTING {
        return too_deep(input);
    }
    Ok(depth + 1)
}

fn ws(input: &mut &str) -> ModalResult<()> {
    take_while(0.., |c: char| c.is_whitespace())
        .void()
        .parse_next(input)
}

pub(crate) fn identifier<'s>(input: &mut &'s str) -> ModalResult<&'s str> {
    (one_of(is_ident_start), take_while(0.., is_ident_continue))
        .take()
        .parse_next(input)
}

/// `ident(.ident)*`. A dot only continues the path when an identifier
/// follows it, so a trailing `.` is left in the input.
pub(crate) fn path(input: &mut &str) -> ModalResult<Vec<String>> {
    (identifier, repeat(0.., preceded('.', identifier)))
        .map(|(head, rest): (&str, Vec<&str>)| {
            std::iter::once(head)
                .chain(rest)
                .map(str::to_string)
                .collect()
        })
        .parse_next(input)
}

/// `'...'` or `"..."`, without escapes.
pub(crate) fn quoted<'s>(input: &mut &'s str) -> ModalResult<&'s str> {
    alt((
        delimited('\'', take_till(0.., '\''), '\''),
        delimited('"', take_till(0.., '"'), '"'),
    ))
    .parse_next(input)
}

fn keyword<'s>(word: &'static str) -> impl Parser<&'s str, &'s str, ErrMode<ContextError>> {
    terminated(word, not(one_of(is_ident_continue)))
}

fn number(input: &mut &str) -> ModalResult<f64> {
    (opt('-'), digit1, opt(('.', digit1)))
        .take()
        .try_map(str::parse::<f64>)
        .parse_next(input)
}

fn or_expr(input: &mut &str, origin: Origin, depth: usize) -> ModalResult<Expr> {
    let first = and_expr(input, origin, depth)?;
    let rest: Vec<Expr> = repeat(
        0..,
        preceded(
            (ws, alt(("||", keyword("or")))),
            cut_err(|i: &mut &str| and_expr(i, origin, depth)),
        ),
    )
    .parse_next(input)?;
    Ok(rest
        .into_iter()
        .fold(first, |lhs, rhs| Expr::Or(Box::new(lhs), Box::new(rhs))))
}

fn and_expr(input: &mut &str, origin: Origin, depth: usize) -> ModalResult<Expr> {
    let first = unary(input, origin, depth)?;
    let rest: Vec<Expr> = repeat(
        0..,
        preceded(
            (ws, alt(("&&", keyword("and")))),
            cut_err(|i: &mut &str| unary(i, origin, depth)),
        ),
    )
    .parse_next(input)?;
    Ok(rest
        .into_iter()
        .fold(first, |lhs, rhs| Expr::And(Box::new(lhs), Box::new(rhs))))
}

fn unary(input: &mut &str, origin: Origin, depth: usize) -> ModalResult<Expr> {
    let negation = opt(preceded(ws, alt((terminated("!", not('=')), keyword("not")))))
        .parse_next(input)?;
    if negation.is_none() {
        return compare(input, origin, depth);
    }

    let depth = deeper(input, depth)?;
    let inner = cut_err(|i: &mut &str| unary(i, origin, depth)).parse_next(input)?;
    Ok(Expr::Not(Box::new(inner)))
}

fn compare(input: &mut &str, origin: Origin, depth: usize) -> ModalResult<Expr> {
    let lhs = operand(input, origin, depth)?;
    let rhs = opt((
        preceded(ws, compare_op),
        cut_err(|i: &mut &str| operand(i, origin, depth)),
    ))
    .parse_next(input)?;

    Ok(match rhs {
        Some((op, rhs)) => Expr::Compare(Box::new(lhs), op, Box::new(rhs)),
        None => lhs,
    })
}

fn compare_op(input: &mut &str) -> ModalResult<CompareOp> {
    alt((
        "==".value(CompareOp::Eq),
        "!=".value(CompareOp::Ne),
        "<=".value(CompareOp::Le),
        ">=".value(CompareOp::Ge),
        "<".value(CompareOp::Lt),
        ">".value(CompareOp::Gt),
    ))
    .parse_next(input)
}

fn operand(input: &mut &str, origin: Origin, depth: usize) -> ModalResult<Expr> {
    ws(input)?;

    let open: ModalResult<Option<char>> = opt('(').parse_next(input);
    if open?.is_some() {
        let depth = deeper(input, depth)?;
        let inner = cut_err(|i: &mut &str| or_expr(i, origin, depth)).parse_next(input)?;
        cut_err(preceded(ws, ')'))
            .context(StrContext::Expected(StrContextValue::CharLiteral(')')))
            .parse_next(input)?;
        return Ok(inner);
    }

    let offset = origin.offset(*input);
    let result = alt((
        preceded('$', path).map(|path| Expr::Placeholder(Placeholder { path, offset })),
        quoted.map(|text: &str| Expr::Str(text.to_string())),
        number.map(Expr::Number),
        keyword("true").value(Expr::Bool(true)),
        keyword("false").value(Expr::Bool(false)),
    ))
    .context(StrContext::Expected(StrContextValue::Description("a value")))
    .parse_next(input);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> RenderResult<Expr> {
        parse_expression(text, text, 0)
    }

    fn ph(path: &[&str], offset: usize) -> Expr {
        Expr::Placeholder(Placeholder {
            path: path.iter().map(|s| s.to_string()).collect(),
            offset,
        })
    }

    #[test]
    fn parses_single_placeholder() {
        assert_eq!(parse("$entity.public_notes").unwrap(), ph(&["entity", "public_notes"], 0));
    }

    #[test]
    fn and_binds_tighter_than_or() {
        let expr = parse("$a || $b && $c").unwrap();
        assert_eq!(
            expr,
            Expr::Or(
                Box::new(ph(&["a"], 0)),
                Box::new(Expr::And(Box::new(ph(&["b"], 6)), Box::new(ph(&["c"], 12)))),
            )
        );
    }

    #[test]
    fn offsets_are_relative_to_the_whole_source() {
        let source = "<p>@if($a)";
        assert_eq!(parse_expression(source, "$a", 7).unwrap(), ph(&["a"], 7));
    }

    #[test]
    fn parses_comparison_with_number() {
        let expr = parse("$entity.discount > 0").unwrap();
        assert_eq!(
            expr,
            Expr::Compare(
                Box::new(ph(&["entity", "discount"], 0)),
                CompareOp::Gt,
                Box::new(Expr::Number(0.0)),
            )
        );
    }

    #[test]
    fn parses_negative_and_fractional_numbers() {
        let expr = parse("$x >= -2.5").unwrap();
        assert_eq!(
            expr,
            Expr::Compare(Box::new(ph(&["x"], 0)), CompareOp::Ge, Box::new(Expr::Number(-2.5)))
        );
    }

    #[test]
    fn parses_word_operators_and_parentheses() {
        let expr = parse("not ($a == 'x' or $b != \"y\")").unwrap();
        assert!(matches!(expr, Expr::Not(_)));
    }

    #[test]
    fn word_operators_need_a_word_boundary() {
        assert!(parse("$a order").is_err());
        assert!(parse("notable").is_err());
    }

    #[test]
    fn rejects_function_calls() {
        let err = parse("strlen($terms) > 0").unwrap_err();
        assert!(matches!(err, RenderError::InvalidExpression { .. }));
    }

    #[test]
    fn rejects_assignment() {
        assert!(parse("$a = 1").is_err());
    }

    #[test]
    fn rejects_unbalanced_parentheses() {
        assert!(parse("($a && $b").is_err());
        assert!(parse("$a)").is_err());
    }

    #[test]
    fn rejects_empty_condition() {
        assert!(parse("   ").is_err());
    }

    #[test]
    fn nesting_is_limited() {
        let ok = format!("{}$a{}", "(".repeat(MAX_NESTING), ")".repeat(MAX_NESTING));
        assert!(parse(&ok).is_ok());

        let deep = format!("{}$a{}", "(".repeat(200_000), ")".repeat(200_000));
        match parse(&deep).unwrap_err() {
            RenderError::InvalidExpression { message, .. } => assert!(message.contains("nested")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn negation_chains_are_limited() {
        let deep = format!("{}$a", "!".repeat(100_000));
        assert!(matches!(
            parse(&deep).unwrap_err(),
            RenderError::InvalidExpression { ref message, .. } if message.contains("nested")
        ));
        let words = "not ".repeat(MAX_NESTING + 1) + "$a";
        assert!(parse(&words).is_err());
    }

    #[test]
    fn path_stops_at_trailing_dot() {
        let mut input = "total.";
        assert_eq!(path(&mut input).unwrap(), vec!["total".to_string()]);
        assert_eq!(input, ".");

        let mut input = "company.name<";
        assert_eq!(
            path(&mut input).unwrap(),
            vec!["company".to_string(), "name".to_string()]
        );
        assert_eq!(input, "<");

        assert!(path(&mut "5").is_err());
    }
}
