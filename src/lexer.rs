use logos::Logos;
use std::fmt;

use crate::Span;

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\n\r\f]+")] // Skip whitespace
#[logos(skip r";[^\n]*")] // A `;` starting a lexeme comments out the rest of the line
#[logos(error = LexerErrorKind)]
pub enum LexemeKind {
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    // Everything else up to whitespace or a paren. Classification happens later,
    // so strings, numbers and symbols all arrive here verbatim.
    #[regex(r"[^ \t\n\r\f();][^ \t\n\r\f()]*", |lex| lex.slice().to_string())]
    Atom(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Lexeme {
    pub kind: LexemeKind,
    pub span: Span,
}

impl fmt::Display for LexemeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LexemeKind::LParen => write!(f, "("),
            LexemeKind::RParen => write!(f, ")"),
            LexemeKind::Atom(s) => write!(f, "{}", s),
        }
    }
}

#[derive(Default, Debug, Clone, PartialEq, thiserror::Error)]
pub enum LexerErrorKind {
    #[default]
    #[error("Invalid Token")]
    InvalidToken,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{error}")]
pub struct LexerError {
    pub error: LexerErrorKind,
    pub span: Span,
}

// Result type alias for convenience
type LexerResult<T> = Result<T, LexerError>;

/// Splits program text into parens and atoms, dropping whitespace and comments.
pub fn tokenize(input: &str) -> LexerResult<Vec<Lexeme>> {
    LexemeKind::lexer(input)
        .spanned()
        .map(|(result, range)| match result {
            Ok(kind) => Ok(Lexeme {
                kind,
                span: range.into(),
            }),
            Err(error) => Err(LexerError {
                error,
                span: range.into(),
            }),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    // Helper to simplify testing lexeme sequences
    fn assert_lexemes(input: &str, expected: Vec<LexemeKind>) {
        match tokenize(input) {
            Ok(lexemes) => {
                let kinds: Vec<LexemeKind> = lexemes.into_iter().map(|l| l.kind).collect();
                assert_eq!(kinds, expected, "Input: '{}'", input);
            }
            Err(e) => panic!("Lexing failed for input '{}': {}", input, e),
        }
    }

    fn atom(s: &str) -> LexemeKind {
        LexemeKind::Atom(s.to_string())
    }

    #[test]
    fn test_empty_input() {
        assert_lexemes("", vec![]);
        assert_lexemes("   \n\t ", vec![]);
    }

    #[test]
    fn test_parentheses_need_no_whitespace() {
        assert_lexemes("()", vec![LexemeKind::LParen, LexemeKind::RParen]);
        assert_lexemes(
            "(+(* 2 3)x)",
            vec![
                LexemeKind::LParen,
                atom("+"),
                LexemeKind::LParen,
                atom("*"),
                atom("2"),
                atom("3"),
                LexemeKind::RParen,
                atom("x"),
                LexemeKind::RParen,
            ],
        );
    }

    #[test]
    fn test_atoms_are_verbatim() {
        assert_lexemes(
            "42 -4.5 #t 'abcd' \"hi set! 1/9",
            vec![
                atom("42"),
                atom("-4.5"),
                atom("#t"),
                atom("'abcd'"),
                atom("\"hi"),
                atom("set!"),
                atom("1/9"),
            ],
        );
    }

    #[test]
    fn test_comments() {
        let input = "
            ; leading comment line
            (define x 10) ; trailing comment
              ;; indented comment
            x";
        assert_lexemes(
            input,
            vec![
                LexemeKind::LParen,
                atom("define"),
                atom("x"),
                atom("10"),
                LexemeKind::RParen,
                atom("x"),
            ],
        );
        assert_lexemes("; only comment", vec![]);
        assert_lexemes(";", vec![]);
    }

    #[test]
    fn test_semicolon_inside_atom() {
        // Only a lexeme-initial `;` opens a comment.
        assert_lexemes("a;b c", vec![atom("a;b"), atom("c")]);
    }

    #[test]
    fn test_tokenize_spans() {
        let lexemes = tokenize("(+ 12)").expect("Should tokenize successfully");

        assert_eq!(lexemes.len(), 4);
        assert_eq!(lexemes[0].span, Span::new(0, 1));
        assert_eq!(lexemes[1].span, Span::new(1, 2));
        assert_eq!(lexemes[2].span, Span::new(3, 5));
        assert_eq!(lexemes[3].span, Span::new(5, 6));
    }
}
