use crate::Span;
use crate::lexer::{Lexeme, LexemeKind, LexerError};
use crate::token::Token;
use crate::types::Node;
use std::iter::Peekable;
use std::vec::IntoIter; // To iterate over Vec<Lexeme>

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("unexpected closing parenthesis")]
    UnexpectedClosingParen(Span),
    #[error("expected closing parenthesis")]
    MissingClosingParen(Span), // Span of the unmatched opener
    #[error("unexpected end of input")]
    UnexpectedEof(Span),
    #[error(transparent)]
    LexerError(#[from] LexerError),
}

impl ParseError {
    pub fn span(&self) -> Span {
        match self {
            ParseError::UnexpectedClosingParen(span)
            | ParseError::MissingClosingParen(span)
            | ParseError::UnexpectedEof(span) => *span,
            ParseError::LexerError(lex_err) => lex_err.span,
        }
    }
}

// Result type alias for convenience
type ParseResult<T> = Result<T, ParseError>;

pub struct Parser {
    // Lexemes are consumed from the front as the tree is built.
    lexemes: Peekable<IntoIter<Lexeme>>,
    end: usize,
}

impl Parser {
    pub fn new(lexemes: Vec<Lexeme>) -> Self {
        let end = lexemes.last().map_or(0, |lexeme| lexeme.span.end);
        Parser {
            lexemes: lexemes.into_iter().peekable(),
            end,
        }
    }

    fn next_lexeme(&mut self) -> Option<Lexeme> {
        self.lexemes.next()
    }

    /// Parses a single expression from the front of the lexeme stream.
    pub fn parse_expr(&mut self) -> ParseResult<Node> {
        match self.next_lexeme() {
            Some(lexeme) => self.parse_expr_with_lexeme(lexeme),
            None => Err(ParseError::UnexpectedEof(Span::new(self.end, self.end))),
        }
    }

    fn parse_expr_with_lexeme(&mut self, lexeme: Lexeme) -> ParseResult<Node> {
        match lexeme.kind {
            LexemeKind::LParen => self.parse_list(lexeme.span),
            LexemeKind::RParen => Err(ParseError::UnexpectedClosingParen(lexeme.span)),
            LexemeKind::Atom(text) => Ok(Node::atom(Token::classify(&text), lexeme.span)),
        }
    }

    /// Parses list elements up to the `)` matching the opener at `open`.
    fn parse_list(&mut self, open: Span) -> ParseResult<Node> {
        let mut elements = Vec::new();
        loop {
            match self.next_lexeme() {
                Some(Lexeme {
                    kind: LexemeKind::RParen,
                    span,
                }) => return Ok(Node::list(elements, open.merge(span))),
                Some(lexeme) => elements.push(self.parse_expr_with_lexeme(lexeme)?),
                None => return Err(ParseError::MissingClosingParen(open)),
            }
        }
    }

    /// Parses every top-level expression. Any failure aborts the whole parse.
    pub fn parse_program(mut self) -> ParseResult<Vec<Node>> {
        let mut program = Vec::new();
        while self.lexemes.peek().is_some() {
            program.push(self.parse_expr()?);
        }
        Ok(program)
    }
}

// Helper function to lex and parse a string directly (useful for tests and the REPL)
pub fn parse_str(input: &str) -> ParseResult<Vec<Node>> {
    let lexemes = crate::lexer::tokenize(input)?;
    Parser::new(lexemes).parse_program()
}
