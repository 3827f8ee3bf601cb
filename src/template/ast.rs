// invoice-design-service/src/template/ast.rs

//! Syntax tree for parsed design templates.

/// A node in the template tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Markup emitted as-is.
    Text(String),

    /// `$name` or `$object.field`
    Placeholder(Placeholder),

    /// `@if(expr) ... @elseif(expr) ... @else ... @endif`
    Conditional(Conditional),

    /// `@foreach($line_items as $item) ... @endforeach`
    Loop(Loop),
}

/// A placeholder reference such as `$company.name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    /// Path segments without the leading `$`.
    pub path: Vec<String>,
    /// Byte offset of the `$` in the template source.
    pub offset: usize,
}

impl Placeholder {
    /// The lookup key, e.g. `$company.name`.
    pub fn key(&self) -> String {
        format!("${}", self.path.join("."))
    }

    pub fn head(&self) -> &str {
        self.path.first().map(String::as_str).unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Conditional {
    /// `@if` and `@elseif` branches, in source order.
    pub branches: Vec<(Expr, Vec<Node>)>,
    pub else_branch: Option<Vec<Node>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Loop {
    /// Collection being iterated. Only `line_items` passes the parser.
    pub collection: String,
    /// Name bound to the current row, without the `$`.
    pub binding: String,
    pub body: Vec<Node>,
}

/// Boolean/comparison expression accepted inside `@if(...)`.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Placeholder(Placeholder),
    Str(String),
    Number(f64),
    Bool(bool),
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Compare(Box<Expr>, CompareOp, Box<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}
