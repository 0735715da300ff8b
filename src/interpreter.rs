use crate::environment::{EnvError, Environment};
use crate::evaluator::{EvalError, evaluate};
use crate::parser::{ParseError, parse_str};
use crate::source::Span;
use crate::types::Value;
use std::fmt;
use tracing::trace;

/// Any failure of [`Interpreter::interpret`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Eval(#[from] EvalError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MalformedInput,
    MalformedDefinition,
    InvalidSpecialForm,
    UndefinedVariable,
    ArityMismatch,
    NotCallable,
    ProcedureError,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::MalformedInput => "malformed input",
            ErrorKind::MalformedDefinition => "malformed definition",
            ErrorKind::InvalidSpecialForm => "invalid special form",
            ErrorKind::UndefinedVariable => "undefined variable",
            ErrorKind::ArityMismatch => "arity mismatch",
            ErrorKind::NotCallable => "not callable",
            ErrorKind::ProcedureError => "procedure error",
        };
        write!(f, "{}", name)
    }
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Parse(_) => ErrorKind::MalformedInput,
            Error::Eval(EvalError::EnvError(EnvError::UnboundVariable(..))) => {
                ErrorKind::UndefinedVariable
            }
            Error::Eval(EvalError::MalformedDefinition(..)) => ErrorKind::MalformedDefinition,
            Error::Eval(EvalError::InvalidSpecialForm(..)) => ErrorKind::InvalidSpecialForm,
            Error::Eval(EvalError::ArityMismatch { .. }) => ErrorKind::ArityMismatch,
            Error::Eval(EvalError::NotCallable(..)) => ErrorKind::NotCallable,
            Error::Eval(EvalError::ProcedureError { .. }) => ErrorKind::ProcedureError,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Error::Parse(err) => err.span(),
            Error::Eval(err) => err.span(),
        }
    }
}

/// One interpreter session. Bindings made by earlier calls to
/// [`interpret`](Interpreter::interpret) stay visible to later ones.
#[derive(Debug, Clone)]
pub struct Interpreter {
    env: Environment,
}

impl Default for Interpreter {
    fn default() -> Self {
        Interpreter::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        Interpreter::with_environment(Environment::new_global_populated())
    }

    pub fn with_environment(env: Environment) -> Self {
        Interpreter { env }
    }

    pub fn environment(&self) -> &Environment {
        &self.env
    }

    /// Parses `input` and evaluates each top-level form in order, returning the
    /// results of the forms that produce a value.
    ///
    /// A parse error evaluates nothing. An evaluation error stops at the
    /// failing form; bindings made by the forms before it are kept.
    pub fn interpret(&mut self, input: &str) -> Result<Vec<Value>, Error> {
        let program = parse_str(input)?;
        let mut results = Vec::new();
        for node in &program {
            trace!(form = %node, "evaluate");
            let value = evaluate(node, &mut self.env)?;
            if !value.is_void() {
                results.push(value);
            }
        }
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Runs the input in the given session and joins the printed results
    fn run(interpreter: &mut Interpreter, input: &str) -> String {
        match interpreter.interpret(input) {
            Ok(values) => values
                .iter()
                .map(Value::to_string)
                .collect::<Vec<_>>()
                .join(" "),
            Err(e) => panic!("Interpretation failed for input '{}': {}", input, e),
        }
    }

    fn assert_interpret(input: &str, expected: &str) {
        assert_eq!(run(&mut Interpreter::new(), input), expected, "Input: '{}'", input);
    }

    fn assert_error_kind(input: &str, expected: ErrorKind) {
        match Interpreter::new().interpret(input) {
            Ok(values) => panic!(
                "Expected '{}' to fail, but got: {:?}",
                input, values
            ),
            Err(e) => assert_eq!(e.kind(), expected, "Input: '{}', got: {}", input, e),
        }
    }

    #[test]
    fn test_basics() {
        assert_interpret("42", "42");
        assert_interpret("#t", "#t");
        assert_interpret("'abcd'", "'abcd'");
        assert_interpret("", "");
        assert_interpret("; just a comment", "");
    }

    #[test]
    fn test_arithmetic() {
        assert_interpret("(+ 1 2 3 4 5)", "15");
        assert_interpret("(- 2 14)", "-12");
        assert_interpret("(* 1 2 3 4 5)", "120");
        assert_interpret("(/ 2 18)", "1/9");
        assert_interpret("(/ 8.8 2.2)", "4");
        assert_interpret("(abs -35)", "35");
        assert_interpret("(sqrt (* 4 4))", "4");
        assert_interpret("(min 1 2 3 4 (max -98 -96 -12 -4))", "-4");
    }

    #[test]
    fn test_rounding() {
        assert_interpret("(ceiling 13.92)", "14");
        assert_interpret("(ceiling (/ 2 18))", "1");
        assert_interpret("(ceiling (/ 934.2 2.45))", "382");
        assert_interpret("(floor 13.92)", "13");
        assert_interpret("(floor (/ 2 18))", "0");
        assert_interpret("(floor (/ 934.2 2.45))", "381");
        assert_interpret("(round (/ 15 4))", "4");
    }

    #[test]
    fn test_comparisons() {
        assert_interpret("(= (+ 2 2) (* 2 2))", "#t");
        assert_interpret("(>= 4 4)", "#t");
        assert_interpret("(<= 18 18)", "#t");
        assert_interpret("(> 1 2)", "#f");
    }

    #[test]
    fn test_multi_form_input() {
        assert_interpret("(define f 10) (set! f (+ f f 6)) f", "26");
        assert_interpret(
            "(define x (if (< 2 4) (+ 2 (* 4 8)) (if #t 'if' 'else')))\nx",
            "34",
        );
        assert_interpret("1 (define y 2) y (+ y 1)", "1 2 3");
    }

    #[test]
    fn test_session_persists_between_calls() {
        let mut interpreter = Interpreter::new();
        assert_eq!(run(&mut interpreter, "(define f 10)"), "");
        assert_eq!(run(&mut interpreter, "(set! f (+ f f 6))"), "");
        assert_eq!(run(&mut interpreter, "f"), "26");
        assert_eq!(run(&mut interpreter, "f"), "26");
    }

    #[test]
    fn test_closures_end_to_end() {
        assert_interpret(
            "(define (make-multiplier bynum) (lambda (x) (* x bynum)))
             (define m4 (make-multiplier 4))
             (define m2 (make-multiplier 2))
             (m4 5)
             (m2 5)",
            "20 10",
        );
    }

    #[test]
    fn test_shadowed_parameter_is_substituted() {
        assert_interpret("(define (f x) (lambda (x) (* x 2))) ((f 3) 4)", "8");
    }

    #[test]
    fn test_huge_float_rounding_error_message() {
        let err = Interpreter::new().interpret("(floor 1e300)").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ProcedureError);
        assert_eq!(err.to_string(), "floor: 1e300 is out of integer range");
    }

    #[test]
    fn test_recursion() {
        assert_interpret(
            "(define (fib n) (if (< n 2) n (+ (fib (- n 1)) (fib (- n 2)))))
             (fib 15)",
            "610",
        );
    }

    #[test]
    fn test_error_kinds() {
        assert_error_kind("(+ 1 2", ErrorKind::MalformedInput);
        assert_error_kind(")", ErrorKind::MalformedInput);
        assert_error_kind("(define 1 2)", ErrorKind::MalformedDefinition);
        assert_error_kind("(set! name 'siddharth')", ErrorKind::UndefinedVariable);
        assert_error_kind("unknown", ErrorKind::UndefinedVariable);
        assert_error_kind("((lambda (x) x))", ErrorKind::ArityMismatch);
        assert_error_kind("(5 5)", ErrorKind::NotCallable);
        assert_error_kind("(/ 1 0)", ErrorKind::ProcedureError);
        assert_error_kind("(if)", ErrorKind::InvalidSpecialForm);
    }

    #[test]
    fn test_error_messages() {
        let mut interpreter = Interpreter::new();
        let message = |interpreter: &mut Interpreter, input: &str| {
            interpreter.interpret(input).unwrap_err().to_string()
        };
        assert_eq!(message(&mut interpreter, "(set! name 1)"), "undefined variable name");
        assert_eq!(message(&mut interpreter, "(1 2"), "expected closing parenthesis");
        assert_eq!(message(&mut interpreter, "1)"), "unexpected closing parenthesis");
        assert_eq!(
            message(&mut interpreter, "((lambda (a b) a) 1)"),
            "function expects 2 arguments, got 1 instead"
        );
    }

    #[test]
    fn test_error_aborts_remaining_forms_without_rollback() {
        let mut interpreter = Interpreter::new();
        let err = interpreter
            .interpret("(define a 1) (set! b 2) (define c 3)")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UndefinedVariable);
        assert_eq!(err.span(), Span::new(19, 20));
        assert_eq!(run(&mut interpreter, "a"), "1");
        assert_eq!(
            interpreter.interpret("c").unwrap_err().kind(),
            ErrorKind::UndefinedVariable
        );
    }

    #[test]
    fn test_parse_error_evaluates_nothing() {
        let mut interpreter = Interpreter::new();
        assert!(interpreter.interpret("(define a 1) (").is_err());
        assert_eq!(
            interpreter.interpret("a").unwrap_err().kind(),
            ErrorKind::UndefinedVariable
        );
    }
}
