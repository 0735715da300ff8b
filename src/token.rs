use crate::number::{Number, Rational};
use std::fmt;

/// Reserved words. The first group are builtin procedures bound in the global
/// environment; the second are special forms handled by the evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Add,
    Subtract,
    Multiply,
    Divide,
    Greater,
    Less,
    GreaterEqual,
    LessEqual,
    Equal,
    Sqrt,
    Floor,
    Ceiling,
    Round,
    Max,
    Min,
    Abs,
    // --- Special forms ---
    If,
    Define,
    Set,
    Lambda,
    Begin,
}

// Adding a keyword means adding it here and handling it in the environment
// (builtins) or the evaluator (special forms).
const KEYWORDS: [(&str, Keyword); 21] = [
    ("+", Keyword::Add),
    ("-", Keyword::Subtract),
    ("*", Keyword::Multiply),
    ("/", Keyword::Divide),
    (">", Keyword::Greater),
    ("<", Keyword::Less),
    (">=", Keyword::GreaterEqual),
    ("<=", Keyword::LessEqual),
    ("=", Keyword::Equal),
    ("sqrt", Keyword::Sqrt),
    ("floor", Keyword::Floor),
    ("ceiling", Keyword::Ceiling),
    ("round", Keyword::Round),
    ("max", Keyword::Max),
    ("min", Keyword::Min),
    ("abs", Keyword::Abs),
    ("if", Keyword::If),
    ("define", Keyword::Define),
    ("set!", Keyword::Set),
    ("lambda", Keyword::Lambda),
    ("begin", Keyword::Begin),
];

impl Keyword {
    pub fn from_lexeme(lexeme: &str) -> Option<Keyword> {
        KEYWORDS
            .iter()
            .find(|(text, _)| *text == lexeme)
            .map(|(_, keyword)| *keyword)
    }

    pub fn as_str(self) -> &'static str {
        KEYWORDS
            .iter()
            .find(|(_, keyword)| *keyword == self)
            .map(|(text, _)| *text)
            .unwrap_or_default()
    }

    pub fn is_special_form(self) -> bool {
        matches!(
            self,
            Keyword::If | Keyword::Define | Keyword::Set | Keyword::Lambda | Keyword::Begin
        )
    }

    pub fn all() -> impl Iterator<Item = Keyword> {
        KEYWORDS.iter().map(|(_, keyword)| *keyword)
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A classified atom.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Integer(i64),
    Rational(Rational),
    Float(f64),
    String(String), // Verbatim lexeme, opening quote included
    Boolean(bool),
    Identifier(String),
    Keyword(Keyword),
}

impl Token {
    /// Classifies a raw atom lexeme. Never fails: anything unrecognised is an
    /// identifier.
    pub fn classify(lexeme: &str) -> Token {
        if let Some(number) = parse_number(lexeme) {
            return Token::from(number);
        }
        if let Some(keyword) = Keyword::from_lexeme(lexeme) {
            return Token::Keyword(keyword);
        }
        match lexeme {
            "#t" => Token::Boolean(true),
            "#f" => Token::Boolean(false),
            _ if lexeme.starts_with(['\'', '"']) => Token::String(lexeme.to_string()),
            _ => Token::Identifier(lexeme.to_string()),
        }
    }

    pub fn as_number(&self) -> Option<Number> {
        match self {
            Token::Integer(n) => Some(Number::Integer(*n)),
            Token::Rational(r) => Some(Number::Rational(*r)),
            Token::Float(n) => Some(Number::Float(*n)),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Token::Integer(_) => "integer",
            Token::Rational(_) => "rational",
            Token::Float(_) => "float",
            Token::String(_) => "string",
            Token::Boolean(_) => "boolean",
            Token::Identifier(_) => "identifier",
            Token::Keyword(keyword) if keyword.is_special_form() => "special form",
            Token::Keyword(_) => "builtin",
        }
    }
}

// Integer, then `n/d` rational, then float. The digit check keeps `inf` and
// `nan` out of the float parse so they stay identifiers.
fn parse_number(lexeme: &str) -> Option<Number> {
    if let Ok(n) = lexeme.parse::<i64>() {
        return Some(Number::Integer(n));
    }
    if let Some((numer, denom)) = lexeme.split_once('/') {
        if let (Ok(numer), Ok(denom)) = (numer.parse::<i64>(), denom.parse::<i64>()) {
            return Rational::reduce(numer as i128, denom as i128).ok();
        }
    }
    if lexeme.bytes().any(|b| b.is_ascii_digit()) {
        return lexeme.parse::<f64>().ok().map(Number::Float);
    }
    None
}

impl From<Number> for Token {
    fn from(number: Number) -> Self {
        match number {
            Number::Integer(n) => Token::Integer(n),
            Number::Rational(r) => Token::Rational(r),
            Number::Float(n) => Token::Float(n),
        }
    }
}

impl From<bool> for Token {
    fn from(b: bool) -> Self {
        Token::Boolean(b)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Integer(n) => write!(f, "{}", n),
            Token::Rational(r) => write!(f, "{}", r),
            Token::Float(n) => write!(f, "{}", n),
            Token::String(s) => write!(f, "{}", s),
            Token::Boolean(b) => write!(f, "{}", if *b { "#t" } else { "#f" }),
            Token::Identifier(s) => write!(f, "{}", s),
            Token::Keyword(keyword) => write!(f, "{}", keyword),
        }
    }
}
