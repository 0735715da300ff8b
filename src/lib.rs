//! A small Scheme-family interpreter over exact rationals and floats.
//!
//! Procedures are applied by substitution: a call copies the procedure body,
//! writes the argument values in place of the parameter names and evaluates
//! the copy against one flat global environment. There are no closures; a
//! procedure sees outer variables only through that global table.
//!
//! ```
//! use subscheme::Interpreter;
//!
//! let mut interpreter = Interpreter::new();
//! let results = interpreter
//!     .interpret("(define (square n) (* n n)) (square 13) (/ 2 18)")
//!     .unwrap();
//! let printed: Vec<String> = results.iter().map(|v| v.to_string()).collect();
//! assert_eq!(printed, ["169", "1/9"]);
//! ```

pub mod environment;
pub mod evaluator;
pub mod interpreter;
pub mod lexer;
pub mod number;
pub mod parser;
pub mod pretty_print;
pub mod primitives;
pub mod source;
pub mod token;
pub mod types;

pub use environment::{EnvError, Environment};
pub use evaluator::{EvalError, EvalResult, evaluate};
pub use interpreter::{Error, ErrorKind, Interpreter};
pub use lexer::{Lexeme, LexemeKind, LexerError, tokenize};
pub use number::{ArithmeticError, Number, Rational};
pub use parser::{ParseError, Parser, parse_str};
pub use source::Span;
pub use token::{Keyword, Token};
pub use types::{Expr, Lambda, Node, Value};

/// File suffix the batch runner accepts.
pub const SOURCE_FILE_EXTENSION: &str = "scm";
