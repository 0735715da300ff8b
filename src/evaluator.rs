use crate::environment::{EnvError, Environment};
use crate::primitives::PrimitiveError;
use crate::source::Span;
use crate::token::{Keyword, Token};
use crate::types::{Expr, Lambda, Node, Value};
use tracing::debug;

// --- Evaluation Error ---
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvalError {
    #[error(transparent)]
    EnvError(#[from] EnvError), // Unbound identifier or `set!` target
    #[error("ill-formed definition: {0}")]
    MalformedDefinition(String, Span),
    #[error("ill-formed special form: {0}")]
    InvalidSpecialForm(String, Span),
    #[error("function expects {expected} arguments, got {found} instead")]
    ArityMismatch {
        expected: usize,
        found: usize,
        span: Span,
    },
    #[error("attempt to call a non procedure: {0}")]
    NotCallable(String, Span),
    #[error("{name}: {source}")]
    ProcedureError {
        name: Keyword,
        source: PrimitiveError,
        span: Span,
    },
}

impl EvalError {
    pub fn span(&self) -> Span {
        match self {
            EvalError::EnvError(EnvError::UnboundVariable(_, span))
            | EvalError::MalformedDefinition(_, span)
            | EvalError::InvalidSpecialForm(_, span)
            | EvalError::NotCallable(_, span) => *span,
            EvalError::ArityMismatch { span, .. } | EvalError::ProcedureError { span, .. } => *span,
        }
    }
}

fn malformed(message: &str, span: Span) -> EvalError {
    EvalError::MalformedDefinition(message.to_string(), span)
}

// Result type alias for convenience
pub type EvalResult<T = Value> = Result<T, EvalError>;

// --- Evaluate Function ---

/// Evaluates a node against the environment.
///
/// There is no tail-call optimization: every procedure call recurses.
pub fn evaluate(node: &Node, env: &mut Environment) -> EvalResult {
    match &node.kind {
        // 1. Identifiers: look up in the environment
        Expr::Atom(Token::Identifier(name)) => Ok(env.get(name, node.span)?.clone()),

        // 2. Every other atom evaluates to itself, keywords included
        Expr::Atom(token) => Ok(Value::Atom(token.clone())),

        // 3. Lists: special forms, builtin calls or procedure application
        Expr::List(elements) => match elements.split_first() {
            Some((operator, operands)) => evaluate_combination(operator, operands, env, node.span),
            None => Err(EvalError::NotCallable("()".to_string(), node.span)),
        },
    }
}

fn evaluate_combination(
    operator: &Node,
    operands: &[Node],
    env: &mut Environment,
    span: Span,
) -> EvalResult {
    // The operator position is evaluated like any other expression, so an
    // identifier bound to a keyword or a procedure dispatches the same way.
    match evaluate(operator, env)? {
        Value::Atom(Token::Keyword(keyword)) => match keyword {
            Keyword::If => evaluate_if(operands, env, span),
            Keyword::Define => evaluate_define(operands, env, span),
            Keyword::Set => evaluate_set(operands, env, span),
            Keyword::Lambda => Ok(Value::Lambda(make_lambda(operands, span)?)),
            Keyword::Begin => evaluate_begin(operands, env),
            builtin => apply_primitive(builtin, operands, env, span),
        },
        Value::Lambda(lambda) => apply_lambda(&lambda, operands, env, span),
        Value::Void => Err(EvalError::NotCallable("void".to_string(), operator.span)),
        other @ Value::Atom(_) => Err(EvalError::NotCallable(
            format!("{} ({})", other, other.type_name()),
            operator.span,
        )),
    }
}

/// Evaluates operands left to right. Values without a result (`define`,
/// `set!`) are dropped from the argument list.
fn evaluate_arguments(operands: &[Node], env: &mut Environment) -> EvalResult<Vec<Value>> {
    let mut evaluated_args = Vec::with_capacity(operands.len());
    for operand in operands {
        let value = evaluate(operand, env)?;
        if !value.is_void() {
            evaluated_args.push(value);
        }
    }
    Ok(evaluated_args)
}

fn apply_primitive(
    keyword: Keyword,
    operands: &[Node],
    env: &mut Environment,
    span: Span,
) -> EvalResult {
    let func = match env.get_primitive(keyword) {
        Some(primitive) => primitive.func,
        None => return Err(EvalError::NotCallable(keyword.to_string(), span)),
    };
    let evaluated_args = evaluate_arguments(operands, env)?;

    // Failures inside the builtin are converted here and nowhere else
    func(&evaluated_args)
        .map(Value::Atom)
        .map_err(|source| EvalError::ProcedureError {
            name: keyword,
            source,
            span,
        })
}

fn apply_lambda(lambda: &Lambda, operands: &[Node], env: &mut Environment, span: Span) -> EvalResult {
    let evaluated_args = evaluate_arguments(operands, env)?;
    if evaluated_args.len() != lambda.params.len() {
        return Err(EvalError::ArityMismatch {
            expected: lambda.params.len(),
            found: evaluated_args.len(),
            span,
        });
    }

    debug!(procedure = %lambda, args = evaluated_args.len(), "apply");

    // Substitute into a private copy so the stored definition is never
    // touched, even when the procedure recurses into itself.
    let mut body = lambda.body.clone();
    // One parameter at a time, so a later parameter is also replaced inside
    // arguments substituted for earlier ones. With duplicated names the
    // first parameter consumes every occurrence.
    for (param, arg) in lambda.params.iter().zip(&evaluated_args) {
        substitute(&mut body, param, arg);
    }
    evaluate(&body, env)
}

/// Replaces every leaf equal to `param` with the argument's expression form.
///
/// This is textual: it descends into nested lambdas too, including their
/// parameter lists, so an inner lambda reusing an outer parameter name has
/// that name replaced as well. A replaced leaf is not searched again.
fn substitute(node: &mut Node, param: &Token, arg: &Value) {
    if let Expr::List(children) = &mut node.kind {
        for child in children.iter_mut() {
            substitute(child, param, arg);
        }
        return;
    }
    if matches!(&node.kind, Expr::Atom(token) if token == param) {
        if let Some(replacement) = arg.to_node(node.span) {
            *node = replacement;
        }
    }
}

fn evaluate_if(operands: &[Node], env: &mut Environment, span: Span) -> EvalResult {
    let (condition, consequent, alternate) = match operands {
        [condition, consequent] => (condition, consequent, None),
        [condition, consequent, alternate] => (condition, consequent, Some(alternate)),
        _ => {
            return Err(EvalError::InvalidSpecialForm(
                "if expects a test, a consequent and an optional alternative".to_string(),
                span,
            ));
        }
    };

    // Only #t selects the consequent; every other value selects the alternative.
    // The branch not taken is never evaluated.
    if matches!(evaluate(condition, env)?, Value::Atom(Token::Boolean(true))) {
        evaluate(consequent, env)
    } else {
        match alternate {
            Some(alternate) => evaluate(alternate, env),
            None => Ok(Value::Void),
        }
    }
}

fn evaluate_begin(operands: &[Node], env: &mut Environment) -> EvalResult {
    let mut result = Value::Void;
    for operand in operands {
        result = evaluate(operand, env)?;
    }
    Ok(result)
}

// Several body expressions run in sequence, as if wrapped in `begin`
fn sequence_body(body: &[Node], span: Span) -> Node {
    match body {
        [single] => single.clone(),
        _ => {
            let mut sequence = Vec::with_capacity(body.len() + 1);
            sequence.push(Node::atom(Token::Keyword(Keyword::Begin), span));
            sequence.extend_from_slice(body);
            Node::list(sequence, span)
        }
    }
}

// Parameters of a `(lambda ...)` form. Any atom is kept as written, since
// substitution into an enclosing body may have replaced an identifier.
fn parameter_tokens(nodes: &[Node]) -> EvalResult<Vec<Token>> {
    nodes
        .iter()
        .map(|param| match &param.kind {
            Expr::Atom(token) => Ok(token.clone()),
            Expr::List(_) => Err(malformed(&format!("parameter {} is a list", param), param.span)),
        })
        .collect()
}

// Parameters of the `(define (name params...) ...)` shorthand must be identifiers
fn parameter_names(nodes: &[Node]) -> EvalResult<Vec<Token>> {
    nodes
        .iter()
        .map(|param| match &param.kind {
            Expr::Atom(token @ Token::Identifier(_)) => Ok(token.clone()),
            _ => Err(malformed(&format!("parameter {} is not an identifier", param), param.span)),
        })
        .collect()
}

fn make_lambda(operands: &[Node], span: Span) -> EvalResult<Lambda> {
    match operands {
        [
            Node {
                kind: Expr::List(params),
                ..
            },
            body @ ..,
        ] if !body.is_empty() => Ok(Lambda {
            params: parameter_tokens(params)?,
            body: sequence_body(body, span),
            span,
        }),
        _ => Err(malformed("lambda expects a parameter list and a body", span)),
    }
}

// The value of a binding form must produce something to bind
fn evaluate_binding_value(value_node: &Node, env: &mut Environment) -> EvalResult {
    match evaluate(value_node, env)? {
        Value::Void => Err(malformed("value expression has no value", value_node.span)),
        value => Ok(value),
    }
}

fn evaluate_define(operands: &[Node], env: &mut Environment, span: Span) -> EvalResult {
    let Some((target, rest)) = operands.split_first() else {
        return Err(malformed("define expects a name and a value", span));
    };

    match &target.kind {
        // (define name value)
        Expr::Atom(Token::Identifier(name)) => {
            let [value_node] = rest else {
                return Err(malformed("define expects a name and a value", span));
            };
            let value = evaluate_binding_value(value_node, env)?;
            debug!(name = %name, value = %value, "define");
            env.define(name.clone(), value);
            Ok(Value::Void)
        }
        // (define (name params...) body...) is (define name (lambda (params...) body...))
        Expr::List(signature) => {
            let Some((name, params)) = signature
                .split_first()
                .and_then(|(name, params)| Some((name.as_identifier()?, params)))
            else {
                return Err(malformed("procedure name must be an identifier", target.span));
            };
            if rest.is_empty() {
                return Err(malformed("procedure definition has no body", span));
            }
            let lambda = Lambda {
                params: parameter_names(params)?,
                body: sequence_body(rest, span),
                span,
            };
            debug!(name = %name, procedure = %lambda, "define");
            env.define(name.to_string(), Value::Lambda(lambda));
            Ok(Value::Void)
        }
        Expr::Atom(_) => Err(malformed(
            &format!("cannot define {}", target),
            target.span,
        )),
    }
}

fn evaluate_set(operands: &[Node], env: &mut Environment, span: Span) -> EvalResult {
    let [target, value_node] = operands else {
        return Err(malformed("set! expects a name and a value", span));
    };
    let Some(name) = target.as_identifier() else {
        return Err(malformed(&format!("cannot set! {}", target), target.span));
    };

    let value = evaluate_binding_value(value_node, env)?;
    debug!(name = %name, value = %value, "set!");
    env.set(name, value, target.span)?;
    Ok(Value::Void)
}
