// invoice-design-service/src/template/parser.rs

//! Parser for design templates, built from `winnow` combinators.
//!
//! The grammar is deliberately small: literal markup, `$placeholder`
//! references, `@if`/`@elseif`/`@else`/`@endif` blocks and
//! `@foreach($line_items as $row)`/`@endforeach` loops. Constructs from
//! general-purpose template languages are rejected rather than passed
//! through, so stored designs can never smuggle executable code.
//!
//! An `@word` glued to a letter, digit or `.` of literal text is prose (an
//! email address such as `billing@else.example`), never a directive.
//! Directives may still follow a placeholder or another directive directly.

use super::ast::{Conditional, Loop, Node, Placeholder};
use super::error::{Position, RenderError, RenderResult};
use super::expr::{identifier, parse_expression, path, quoted, too_deep};
use winnow::ascii::{multispace0, multispace1};
use winnow::combinator::{alt, delimited, opt, preceded, repeat, terminated};
use winnow::error::ErrMode;
use winnow::prelude::*;
use winnow::Parser as _;
use winnow::token::{any, take_till, take_while};

/// Collections a `@foreach` may iterate.
pub const ITERABLE_COLLECTIONS: &[&str] = &["line_items"];

/// Deepest nesting accepted for blocks, parentheses and negations.
pub(crate) const MAX_NESTING: usize = 64;

/// Directives from other template languages that must never reach output.
const REJECTED_DIRECTIVES: &[&str] = &[
    "php", "endphp", "include", "extends", "section", "endsection", "yield", "while",
    "endwhile", "for", "endfor", "switch", "endswitch", "unless", "endunless", "isset",
    "endisset", "each", "inject", "json", "eval", "verbatim",
];

pub(crate) fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

pub(crate) fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// A parsed template, ready to be rendered any number of times.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    pub(crate) nodes: Vec<Node>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Terminator {
    ElseIf,
    Else,
    EndIf,
    EndForeach,
}

impl Terminator {
    fn from_word(word: &str) -> Option<Self> {
        match word {
            "elseif" => Some(Terminator::ElseIf),
            "else" => Some(Terminator::Else),
            "endif" => Some(Terminator::EndIf),
            "endforeach" => Some(Terminator::EndForeach),
            _ => None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Terminator::ElseIf => "elseif",
            Terminator::Else => "else",
            Terminator::EndIf => "endif",
            Terminator::EndForeach => "endforeach",
        }
    }
}

/// One step of the template scanner.
#[derive(Debug, Clone, PartialEq)]
enum Lexeme<'s> {
    Text(&'s str),
    /// `@@`
    EscapedAt,
    Placeholder(Vec<String>),
    /// `@word`, without the `@`.
    Directive(&'s str),
    Rejected(&'static str),
}

fn lexeme<'s>(input: &mut &'s str) -> ModalResult<Lexeme<'s>> {
    alt((
        "@@".value(Lexeme::EscapedAt),
        alt((
            "{!!".value("{!! !!}"),
            "{{".value("{{ }}"),
            "<?".value("<?"),
        ))
        .map(Lexeme::Rejected),
        preceded('$', path).map(Lexeme::Placeholder),
        preceded('@', identifier).map(Lexeme::Directive),
        take_till(1.., ['$', '@', '{', '<']).map(Lexeme::Text),
        // A lone `$`, `@`, `{` or `<` is ordinary markup.
        any.take().map(Lexeme::Text),
    ))
    .parse_next(input)
}

fn blank<'s>(input: &mut &'s str) -> ModalResult<&'s str> {
    take_while(0.., [' ', '\t']).parse_next(input)
}

/// Argument text up to the matching `)`, skipping quoted strings.
fn balanced<'s>(input: &mut &'s str) -> ModalResult<&'s str> {
    group_contents(input, 0)
}

fn group_contents<'s>(input: &mut &'s str, depth: usize) -> ModalResult<&'s str> {
    repeat::<_, _, (), _, _>(
        0..,
        alt((
            take_till(1.., ['(', ')', '\'', '"']).void(),
            quoted.void(),
            |i: &mut &'s str| nested_group(i, depth),
        )),
    )
    .take()
    .parse_next(input)
}

fn nested_group<'s>(input: &mut &'s str, depth: usize) -> ModalResult<()> {
    if depth >= MAX_NESTING {
        return too_deep(input);
    }
    delimited('(', |i: &mut &'s str| group_contents(i, depth + 1), ')')
        .void()
        .parse_next(input)
}

/// `$line_items as $item`
fn loop_header<'s>(input: &mut &'s str) -> ModalResult<(&'s str, &'s str)> {
    (
        delimited(multispace0, preceded('$', identifier), multispace1),
        "as",
        delimited(multispace1, preceded('$', identifier), multispace0),
    )
        .map(|(collection, _, binding)| (collection, binding))
        .parse_next(input)
}

impl Template {
    /// Parse template source. Fails on the first malformed or unsupported
    /// construct.
    pub fn parse(source: &str) -> RenderResult<Self> {
        let mut parser = Parser {
            source,
            input: source,
        };
        let (nodes, terminator) = parser.parse_nodes(&[], 0)?;
        debug_assert!(terminator.is_none());
        Ok(Self { nodes })
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }
}

struct Parser<'s> {
    source: &'s str,
    /// Unconsumed tail of `source`.
    input: &'s str,
}

impl<'s> Parser<'s> {
    fn offset(&self) -> usize {
        self.source.len() - self.input.len()
    }

    fn position(&self, offset: usize) -> Position {
        Position::at(self.source, offset)
    }

    /// Parse nodes until one of `allowed` terminators (consumed) or end of
    /// input. A terminator outside `allowed` is an error.
    fn parse_nodes(
        &mut self,
        allowed: &[Terminator],
        depth: usize,
    ) -> RenderResult<(Vec<Node>, Option<(Terminator, usize)>)> {
        let mut nodes = Vec::new();
        let mut text = String::new();
        // Literal text so far ends in a letter, digit or `.`.
        let mut glued = false;

        while !self.input.is_empty() {
            let start = self.offset();
            let Ok(token) = lexeme.parse_next(&mut self.input) else {
                break;
            };

            let follows_prose = std::mem::take(&mut glued);
            match token {
                Lexeme::Text(chunk) => {
                    text.push_str(chunk);
                    glued = chunk.ends_with(|c: char| c.is_alphanumeric() || c == '.');
                }
                Lexeme::EscapedAt => text.push('@'),
                Lexeme::Rejected(construct) => {
                    return Err(RenderError::UnsupportedConstruct {
                        construct: construct.to_string(),
                        at: self.position(start),
                    });
                }
                Lexeme::Placeholder(path) => {
                    flush(&mut text, &mut nodes);
                    nodes.push(Node::Placeholder(Placeholder {
                        path,
                        offset: start,
                    }));
                }
                // Email addresses and similar prose.
                Lexeme::Directive(word) if follows_prose => {
                    text.push('@');
                    text.push_str(word);
                    glued = true;
                }
                Lexeme::Directive(word) => {
                    if let Some(terminator) = Terminator::from_word(word) {
                        if !allowed.contains(&terminator) {
                            return Err(RenderError::UnexpectedDirective {
                                directive: terminator.name().to_string(),
                                at: self.position(start),
                            });
                        }
                        flush(&mut text, &mut nodes);
                        return Ok((nodes, Some((terminator, start))));
                    }

                    match word {
                        "if" | "foreach" => {
                            if depth >= MAX_NESTING {
                                return Err(RenderError::UnsupportedConstruct {
                                    construct: format!(
                                        "@{} nested deeper than {} levels",
                                        word, MAX_NESTING
                                    ),
                                    at: self.position(start),
                                });
                            }
                            flush(&mut text, &mut nodes);
                            let node = if word == "if" {
                                Node::Conditional(self.parse_conditional(start, depth + 1)?)
                            } else {
                                Node::Loop(self.parse_loop(start, depth + 1)?)
                            };
                            nodes.push(node);
                        }
                        w if REJECTED_DIRECTIVES.contains(&w) => {
                            return Err(RenderError::UnsupportedConstruct {
                                construct: format!("@{}", w),
                                at: self.position(start),
                            });
                        }
                        // CSS at-rules (`@media`, `@page`) and other prose.
                        _ => {
                            text.push('@');
                            text.push_str(word);
                            glued = true;
                        }
                    }
                }
            }
        }

        flush(&mut text, &mut nodes);
        Ok((nodes, None))
    }

    /// Read a parenthesised argument list directly after a directive name.
    /// Returns the inner text and its byte offset.
    fn parse_arguments(
        &mut self,
        directive: &str,
        directive_start: usize,
    ) -> RenderResult<(&'s str, usize)> {
        let open = (blank, opt('(')).parse_next(&mut self.input);
        if !matches!(open, Ok((_, Some(_)))) {
            return Err(RenderError::InvalidExpression {
                message: format!("expected `(` after @{}", directive),
                at: self.position(self.offset()),
            });
        }

        let inner_start = self.offset();
        match terminated(balanced, ')').parse_next(&mut self.input) {
            Ok(inner) => Ok((inner, inner_start)),
            Err(ErrMode::Cut(_)) => Err(RenderError::InvalidExpression {
                message: format!("nested deeper than {} levels", MAX_NESTING),
                at: self.position(inner_start),
            }),
            Err(_) => Err(RenderError::UnterminatedBlock {
                directive: format!("{}(", directive),
                at: self.position(directive_start),
            }),
        }
    }

    fn parse_conditional(&mut self, start: usize, depth: usize) -> RenderResult<Conditional> {
        let mut branches = Vec::new();
        let mut else_branch = None;

        let (text, offset) = self.parse_arguments("if", start)?;
        let mut condition = parse_expression(self.source, text, offset)?;

        loop {
            let (body, terminator) = self.parse_nodes(
                &[Terminator::ElseIf, Terminator::Else, Terminator::EndIf],
                depth,
            )?;
            branches.push((condition, body));

            match terminator {
                Some((Terminator::ElseIf, at)) => {
                    let (text, offset) = self.parse_arguments("elseif", at)?;
                    condition = parse_expression(self.source, text, offset)?;
                }
                Some((Terminator::Else, _)) => {
                    let (body, terminator) = self.parse_nodes(&[Terminator::EndIf], depth)?;
                    if terminator.is_none() {
                        return Err(self.unterminated("if", start));
                    }
                    else_branch = Some(body);
                    break;
                }
                Some((Terminator::EndIf, _)) => break,
                Some((Terminator::EndForeach, _)) | None => {
                    return Err(self.unterminated("if", start));
                }
            }
        }

        Ok(Conditional {
            branches,
            else_branch,
        })
    }

    fn parse_loop(&mut self, start: usize, depth: usize) -> RenderResult<Loop> {
        let (text, offset) = self.parse_arguments("foreach", start)?;
        let (collection, binding) = self.parse_loop_header(text, offset)?;

        let (body, terminator) = self.parse_nodes(&[Terminator::EndForeach], depth)?;
        if terminator.is_none() {
            return Err(self.unterminated("foreach", start));
        }

        Ok(Loop {
            collection,
            binding,
            body,
        })
    }

    fn parse_loop_header(&self, text: &str, offset: usize) -> RenderResult<(String, String)> {
        let (collection, binding) =
            loop_header
                .parse(text)
                .map_err(|_| RenderError::InvalidExpression {
                    message: "expected `$collection as $name`".to_string(),
                    at: self.position(offset),
                })?;

        if !ITERABLE_COLLECTIONS.contains(&collection) {
            return Err(RenderError::UnknownCollection {
                name: collection.to_string(),
                at: self.position(offset),
            });
        }
        if binding == "loop" {
            return Err(RenderError::InvalidExpression {
                message: "`$loop` is reserved".to_string(),
                at: self.position(offset),
            });
        }

        Ok((collection.to_string(), binding.to_string()))
    }

    fn unterminated(&self, directive: &str, start: usize) -> RenderError {
        RenderError::UnterminatedBlock {
            directive: directive.to_string(),
            at: self.position(start),
        }
    }
}

fn flush(text: &mut String, nodes: &mut Vec<Node>) {
    if !text.is_empty() {
        nodes.push(Node::Text(std::mem::take(text)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::ast::Expr;

    fn text(s: &str) -> Node {
        Node::Text(s.to_string())
    }

    fn ph(path: &[&str], offset: usize) -> Node {
        Node::Placeholder(Placeholder {
            path: path.iter().map(|s| s.to_string()).collect(),
            offset,
        })
    }

    #[test]
    fn splits_text_and_placeholders() {
        let template = Template::parse("<h1>$company.name</h1>").unwrap();
        assert_eq!(
            template.nodes(),
            &[text("<h1>"), ph(&["company", "name"], 4), text("</h1>")]
        );
    }

    #[test]
    fn placeholder_stops_at_identifier_boundary() {
        let template = Template::parse("$total_tax $total.").unwrap();
        assert_eq!(
            template.nodes(),
            &[ph(&["total_tax"], 0), text(" "), ph(&["total"], 11), text(".")]
        );
    }

    #[test]
    fn dollar_without_identifier_is_literal() {
        let template = Template::parse("costs $5 or $ 6").unwrap();
        assert_eq!(template.nodes(), &[text("costs $5 or $ 6")]);
    }

    #[test]
    fn css_at_rules_and_emails_are_literal() {
        let source = "@media print { a{color:red} } mail billing@acme.test";
        let template = Template::parse(source).unwrap();
        assert_eq!(template.nodes(), &[text(source)]);
    }

    #[test]
    fn double_at_escapes_directive() {
        let template = Template::parse("@@if").unwrap();
        assert_eq!(template.nodes(), &[text("@if")]);
    }

    #[test]
    fn parses_if_elseif_else() {
        let template = Template::parse("@if($a)<a>@elseif($b)<b>@else <c>@endif").unwrap();
        let [Node::Conditional(cond)] = template.nodes() else {
            panic!("expected a single conditional, got {:?}", template.nodes());
        };
        assert_eq!(cond.branches.len(), 2);
        assert_eq!(cond.branches[0].1, vec![text("<a>")]);
        assert_eq!(cond.branches[1].1, vec![text("<b>")]);
        assert_eq!(cond.else_branch, Some(vec![text(" <c>")]));
    }

    #[test]
    fn email_like_words_are_literal() {
        let source = "ops@php.net or sales@include.test";
        let template = Template::parse(source).unwrap();
        assert_eq!(template.nodes(), &[text(source)]);
    }

    #[test]
    fn directives_after_markup_are_recognized() {
        let template = Template::parse("@if($a)<b>yes</b>@else <i>no</i>@endif").unwrap();
        let [Node::Conditional(cond)] = template.nodes() else {
            panic!("expected a single conditional, got {:?}", template.nodes());
        };
        assert_eq!(cond.branches[0].1, vec![text("<b>yes</b>")]);
        assert_eq!(cond.else_branch, Some(vec![text(" <i>no</i>")]));
    }

    #[test]
    fn directives_may_follow_placeholders_and_directives() {
        let template =
            Template::parse("@foreach($line_items as $i)@if($a)$i.cost@endif@endforeach").unwrap();
        let [Node::Loop(lp)] = template.nodes() else {
            panic!("expected a single loop, got {:?}", template.nodes());
        };
        assert!(matches!(lp.body.as_slice(), [Node::Conditional(_)]));
    }

    #[test]
    fn email_with_directive_word_is_literal() {
        let source = "<p>Write to billing@else.example or ops@endif.test</p>";
        let template = Template::parse(source).unwrap();
        assert_eq!(template.nodes(), &[text(source)]);

        let template = Template::parse("@if($a)x @else mail sales@if.example @endif").unwrap();
        let [Node::Conditional(cond)] = template.nodes() else {
            panic!("expected a single conditional");
        };
        assert_eq!(cond.else_branch, Some(vec![text(" mail sales@if.example ")]));
    }

    #[test]
    fn parses_foreach_over_line_items() {
        let template =
            Template::parse("@foreach($line_items as $item)<td>$item.cost</td>@endforeach").unwrap();
        let [Node::Loop(lp)] = template.nodes() else {
            panic!("expected a single loop");
        };
        assert_eq!(lp.collection, "line_items");
        assert_eq!(lp.binding, "item");
        assert_eq!(lp.body.len(), 3);
    }

    #[test]
    fn condition_may_contain_nested_parentheses_and_quotes() {
        let template = Template::parse("@if(($a == ')') && $b)<x>@endif").unwrap();
        let [Node::Conditional(cond)] = template.nodes() else {
            panic!("expected a single conditional");
        };
        assert!(matches!(cond.branches[0].0, Expr::And(_, _)));
    }

    #[test]
    fn unterminated_if_is_an_error() {
        let err = Template::parse("<p>\n@if($terms)\n$terms").unwrap_err();
        assert_eq!(
            err,
            RenderError::UnterminatedBlock {
                directive: "if".to_string(),
                at: Position { line: 2, column: 1 },
            }
        );
    }

    #[test]
    fn unterminated_foreach_is_an_error() {
        let err = Template::parse("@foreach($line_items as $item)<tr></tr>").unwrap_err();
        assert!(matches!(err, RenderError::UnterminatedBlock { ref directive, .. } if directive == "foreach"));
    }

    #[test]
    fn else_without_endif_is_an_error() {
        assert!(matches!(
            Template::parse("@if($a)x @else y").unwrap_err(),
            RenderError::UnterminatedBlock { .. }
        ));
    }

    #[test]
    fn unclosed_condition_is_an_error() {
        assert!(matches!(
            Template::parse("@if($a && $b <p>").unwrap_err(),
            RenderError::UnterminatedBlock { .. }
        ));
    }

    #[test]
    fn stray_closing_directive_is_an_error() {
        assert!(matches!(
            Template::parse("text @endif").unwrap_err(),
            RenderError::UnexpectedDirective { .. }
        ));
        assert!(matches!(
            Template::parse("@if($a)@endforeach@endif").unwrap_err(),
            RenderError::UnexpectedDirective { .. }
        ));
    }

    #[test]
    fn rejects_code_constructs() {
        for source in [
            "{{ $invoice->delete() }}",
            "{!! $html !!}",
            "<?php system('id'); ?>",
            "@php echo 1; @endphp",
            "@include('partials.x')",
        ] {
            let err = Template::parse(source).unwrap_err();
            assert!(
                matches!(err, RenderError::UnsupportedConstruct { .. }),
                "{} -> {:?}",
                source,
                err
            );
        }
    }

    #[test]
    fn rejects_unknown_collections() {
        let err = Template::parse("@foreach($users as $u)x@endforeach").unwrap_err();
        assert!(matches!(err, RenderError::UnknownCollection { ref name, .. } if name == "users"));
    }

    #[test]
    fn rejects_malformed_loop_header() {
        assert!(Template::parse("@foreach($line_items)x@endforeach").is_err());
        assert!(Template::parse("@foreach($line_items as $loop)x@endforeach").is_err());
    }

    #[test]
    fn nested_blocks_within_the_limit_parse() {
        let source = format!(
            "{}<x>{}",
            "@if($a)".repeat(MAX_NESTING),
            "@endif".repeat(MAX_NESTING)
        );
        assert!(Template::parse(&source).is_ok());
    }

    #[test]
    fn deeply_nested_blocks_are_rejected() {
        let source = format!("{}<x>{}", "@if($a)".repeat(50_000), "@endif".repeat(50_000));
        let err = Template::parse(&source).unwrap_err();
        assert!(
            matches!(err, RenderError::UnsupportedConstruct { ref construct, .. } if construct.contains("nested")),
            "{:?}",
            err
        );

        let loops = "@foreach($line_items as $item)".repeat(MAX_NESTING + 1);
        assert!(matches!(
            Template::parse(&loops).unwrap_err(),
            RenderError::UnsupportedConstruct { .. }
        ));
    }

    #[test]
    fn deeply_nested_condition_is_rejected() {
        let source = format!(
            "@if({}$a{})x @endif",
            "(".repeat(200_000),
            ")".repeat(200_000)
        );
        match Template::parse(&source).unwrap_err() {
            RenderError::InvalidExpression { message, at } => {
                assert!(message.contains("nested"), "{}", message);
                assert_eq!(at, Position { line: 1, column: 5 });
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn placeholder_offsets_survive_conditions() {
        let template = Template::parse("ab @if($x)$y@endif").unwrap();
        let [_, Node::Conditional(cond)] = template.nodes() else {
            panic!("expected text then a conditional");
        };
        assert_eq!(
            cond.branches[0].0,
            Expr::Placeholder(Placeholder {
                path: vec!["x".to_string()],
                offset: 7,
            })
        );
        assert_eq!(cond.branches[0].1, vec![ph(&["y"], 10)]);
    }
}
