use crate::interpreter::{Error, ErrorKind};
use crate::parser::ParseError;
use ariadne::{Config, Label, Report, ReportKind, Source};
use std::io;
use std::ops::Range;

pub type SourceSpan<'a> = (&'a str, Range<usize>);

impl Error {
    // Short description of the offending source span
    fn label_message(&self) -> &'static str {
        match self {
            Error::Parse(ParseError::MissingClosingParen(_)) => "This parenthesis is never closed",
            Error::Parse(ParseError::UnexpectedClosingParen(_)) => "This parenthesis closes nothing",
            Error::Parse(_) => "Input ends here",
            Error::Eval(_) => match self.kind() {
                ErrorKind::UndefinedVariable => "This name is not defined",
                ErrorKind::MalformedDefinition => "This definition is malformed",
                ErrorKind::InvalidSpecialForm => "This special form is malformed or incomplete",
                ErrorKind::ArityMismatch => "Called with the wrong number of arguments",
                ErrorKind::NotCallable => "This expression cannot be called as a procedure",
                ErrorKind::ProcedureError | ErrorKind::MalformedInput => "Raised by this call",
            },
        }
    }

    /// Builds a diagnostic labelled at the error's span in `source_name`.
    pub fn report<'a>(&self, source_name: &'a str, colored: bool) -> Report<'a, SourceSpan<'a>> {
        let range = self.span().to_range();
        Report::build(ReportKind::Error, (source_name, range.clone()))
            .with_config(Config::default().with_color(colored))
            .with_message(self.to_string())
            .with_label(Label::new((source_name, range)).with_message(self.label_message()))
            .with_note(format!("error kind: {}", self.kind()))
            .finish()
    }

    /// Prints the diagnostic for `input` to stderr.
    pub fn eprint(&self, source_name: &str, input: &str) -> io::Result<()> {
        self.report(source_name, true)
            .eprint((source_name, Source::from(input)))
    }
}

#[cfg(test)]
mod tests {
    use crate::Interpreter;

    fn render(input: &str) -> String {
        let err = Interpreter::new()
            .interpret(input)
            .expect_err("input should fail");
        let mut buffer = Vec::new();
        err.report("test.scm", false)
            .write(("test.scm", ariadne::Source::from(input)), &mut buffer)
            .expect("report should render");
        String::from_utf8(buffer).expect("report is utf-8")
    }

    #[test]
    fn test_report_names_kind_and_message() {
        let output = render("(+ 1 undefined-name)");
        assert!(output.contains("undefined variable undefined-name"));
        assert!(output.contains("error kind: undefined variable"));
        assert!(output.contains("This name is not defined"));
        assert!(output.contains("test.scm"));
    }

    #[test]
    fn test_report_for_parse_error() {
        let output = render("(define (f x)\n  (* x x)");
        assert!(output.contains("expected closing parenthesis"));
        assert!(output.contains("error kind: malformed input"));
        assert!(output.contains("This parenthesis is never closed"));
    }

    #[test]
    fn test_report_for_procedure_error() {
        let output = render("(/ 1 0)");
        assert!(output.contains("/: division by zero"));
        assert!(output.contains("error kind: procedure error"));
    }
}
