use crate::primitives::PrimitiveFunc;
use crate::source::Span;
use crate::token::{Keyword, Token};
use std::fmt; // For custom display formatting

#[derive(Debug, Clone)]
pub struct Node {
    pub kind: Expr, // The expression itself
    pub span: Span, // The source span it covers
}

impl Node {
    pub fn new(kind: Expr, span: Span) -> Self {
        Node { kind, span }
    }

    pub fn atom(token: Token, span: Span) -> Self {
        Node::new(Expr::Atom(token), span)
    }

    pub fn list(nodes: Vec<Node>, span: Span) -> Self {
        Node::new(Expr::List(nodes), span)
    }

    pub fn as_identifier(&self) -> Option<&str> {
        match &self.kind {
            Expr::Atom(Token::Identifier(name)) => Some(name),
            _ => None,
        }
    }

    /// Nesting depth: atoms are 0, `()` and lists of atoms are 1.
    pub fn depth(&self) -> usize {
        match &self.kind {
            Expr::Atom(_) => 0,
            Expr::List(nodes) => 1 + nodes.iter().map(Node::depth).max().unwrap_or(0),
        }
    }
}

// Spans are diagnostics only; two nodes are equal when their expressions are.
impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)
    }
}

/// An expression: a classified atom or a parenthesized list of expressions.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Atom(Token),
    List(Vec<Node>),
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Atom(token) => write!(f, "{}", token),
            Expr::List(list) => {
                write!(f, "(")?;
                let mut first = true;
                for node in list {
                    if !first {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", node)?;
                    first = false;
                }
                write!(f, ")")
            }
        }
    }
}

/// A user procedure: parameter tokens and a body, with no captured environment.
/// Free identifiers in the body resolve through the global environment at call
/// time; parameters are substituted into a copy of the body.
///
/// Parameters are usually identifiers, but substitution into a nested lambda
/// can leave any atom there, e.g. `(lambda (3) (* 3 2))`.
#[derive(Debug, Clone)]
pub struct Lambda {
    pub params: Vec<Token>,
    pub body: Node,
    pub span: Span,
}

impl PartialEq for Lambda {
    fn eq(&self, other: &Self) -> bool {
        self.params == other.params && self.body == other.body
    }
}

impl Lambda {
    /// The `(lambda (params...) body)` expression this procedure came from.
    /// Evaluating it yields an equal procedure.
    pub fn to_node(&self) -> Node {
        let params = self
            .params
            .iter()
            .map(|param| Node::atom(param.clone(), self.span))
            .collect();
        Node::list(
            vec![
                Node::atom(Token::Keyword(Keyword::Lambda), self.span),
                Node::list(params, self.span),
                self.body.clone(),
            ],
            self.span,
        )
    }
}

impl fmt::Display for Lambda {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_node())
    }
}

#[derive(Clone)]
pub struct Primitive {
    pub keyword: Keyword,
    pub func: PrimitiveFunc,
}

impl fmt::Debug for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Primitive({})", self.keyword)
    }
}

// Function pointers don't compare meaningfully, so primitives are equal by name.
impl PartialEq for Primitive {
    fn eq(&self, other: &Self) -> bool {
        self.keyword == other.keyword
    }
}

/// The result of evaluating an expression, and what environment bindings hold.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Atom(Token),
    Lambda(Lambda),
    /// Produced by `define` and `set!`; never printed.
    Void,
}

impl Value {
    pub fn is_void(&self) -> bool {
        matches!(self, Value::Void)
    }

    pub fn as_token(&self) -> Option<&Token> {
        match self {
            Value::Atom(token) => Some(token),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Atom(token) => token.type_name(),
            Value::Lambda(_) => "procedure",
            Value::Void => "void",
        }
    }

    /// Expression form of the value, for substitution into a procedure body.
    /// `None` for values with no source form.
    pub fn to_node(&self, span: Span) -> Option<Node> {
        match self {
            Value::Atom(token) => Some(Node::atom(token.clone(), span)),
            Value::Lambda(lambda) => Some(lambda.to_node()),
            Value::Void => None,
        }
    }
}

impl From<Token> for Value {
    fn from(token: Token) -> Self {
        Value::Atom(token)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Atom(token) => write!(f, "{}", token),
            Value::Lambda(lambda) => write!(f, "{}", lambda),
            Value::Void => Ok(()),
        }
    }
}
