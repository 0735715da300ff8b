use std::borrow::Cow;
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use rustyline::config::Config;
use rustyline::error::ReadlineError;
use rustyline::highlight::{CmdKind, Highlighter};
use rustyline::history::DefaultHistory;
use rustyline::validate::{ValidationContext, ValidationResult, Validator};
use rustyline::{Cmd, Context, EditMode, Editor, EventHandler, KeyCode, KeyEvent, Modifiers};
use rustyline::{Completer, Helper, Highlighter, Hinter, Validator};
use subscheme::{Interpreter, Keyword, Lexeme, LexemeKind, tokenize};
use tracing::{debug, warn};

const PROMPT: &str = "subscheme> ";
const SOURCE_NAME: &str = "REPL";

/// Line-editor settings taken from the command line.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplConfig {
    /// `None` disables loading and saving history.
    pub history: Option<PathBuf>,
    pub vi_mode: bool,
}

impl ReplConfig {
    pub fn editor_config(&self) -> rustyline::Result<Config> {
        let edit_mode = if self.vi_mode {
            EditMode::Vi
        } else {
            EditMode::Emacs
        };
        Ok(Config::builder()
            .edit_mode(edit_mode)
            .auto_add_history(false)
            .history_ignore_dups(true)?
            .history_ignore_space(true)
            .build())
    }
}

struct SubschemeCompleter {
    interpreter: Rc<RefCell<Interpreter>>,
}

impl SubschemeCompleter {
    fn new(interpreter: Rc<RefCell<Interpreter>>) -> Self {
        SubschemeCompleter { interpreter }
    }

    // Suffixes completing `prefix` to a bound name or keyword, sorted
    fn candidates(&self, prefix: &str) -> Vec<String> {
        let mut names = self.interpreter.borrow().environment().get_identifiers();
        names.extend(Keyword::all().map(|k| k.as_str().to_string()));
        let mut candidates: Vec<String> = names
            .into_iter()
            .filter(|name| name.starts_with(prefix) && name.len() > prefix.len())
            .map(|name| name[prefix.len()..].to_string())
            .collect();
        candidates.sort();
        candidates
    }
}

impl rustyline::completion::Completer for SubschemeCompleter {
    type Candidate = String;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<String>)> {
        let candidates = match tokenize(&line[..pos]) {
            Ok(lexemes) => match lexemes.last() {
                // Only complete an atom the cursor is still touching
                Some(Lexeme {
                    kind: LexemeKind::Atom(prefix),
                    span,
                }) if span.end == pos => self.candidates(prefix),
                _ => vec![],
            },
            Err(_) => vec![],
        };
        Ok((pos, candidates))
    }
}

#[derive(Completer, Helper, Highlighter, Hinter, Validator)]
struct ReplHelper {
    #[rustyline(Validator)]
    validator: ParenValidator,
    #[rustyline(Highlighter)]
    highlighter: ParenHighlighter,
    #[rustyline(Completer)]
    completer: SubschemeCompleter,
}

/// Keeps reading lines until the parentheses balance. Parens inside comments
/// are ignored because the lexer drops comments.
struct ParenValidator;

impl Validator for ParenValidator {
    fn validate(&self, ctx: &mut ValidationContext) -> rustyline::Result<ValidationResult> {
        Ok(paren_balance(ctx.input()))
    }
}

fn paren_balance(input: &str) -> ValidationResult {
    let Ok(lexemes) = tokenize(input) else {
        // Let the interpreter report it
        return ValidationResult::Valid(None);
    };
    let mut depth = 0usize;
    for lexeme in &lexemes {
        match lexeme.kind {
            LexemeKind::LParen => depth += 1,
            LexemeKind::RParen if depth == 0 => {
                return ValidationResult::Invalid(Some(format!(
                    "  - Unmatched ')' at position {}",
                    lexeme.span.start
                )));
            }
            LexemeKind::RParen => depth -= 1,
            LexemeKind::Atom(_) => {}
        }
    }
    if depth > 0 {
        ValidationResult::Incomplete
    } else {
        ValidationResult::Valid(None)
    }
}

/// Highlights the paren under (or just before) the cursor together with its
/// partner, and marks stray closing parens red.
struct ParenHighlighter;

#[derive(Debug, Default, PartialEq)]
struct ParenMarks {
    matched: Option<(usize, usize)>,
    unmatched: Vec<usize>,
}

fn paren_marks(line: &str, pos: usize) -> ParenMarks {
    let mut marks = ParenMarks::default();
    let Ok(lexemes) = tokenize(line) else {
        return marks;
    };
    let mut open: Vec<usize> = Vec::new();
    let touches_cursor = |offset: usize| offset == pos || offset + 1 == pos;
    for lexeme in &lexemes {
        let offset = lexeme.span.start;
        match lexeme.kind {
            LexemeKind::LParen => open.push(offset),
            LexemeKind::RParen => match open.pop() {
                Some(opening) if touches_cursor(opening) || touches_cursor(offset) => {
                    marks.matched = Some((opening, offset));
                }
                Some(_) => {}
                None => marks.unmatched.push(offset),
            },
            LexemeKind::Atom(_) => {}
        }
    }
    marks
}

impl Highlighter for ParenHighlighter {
    fn highlight<'l>(&self, line: &'l str, pos: usize) -> Cow<'l, str> {
        let marks = paren_marks(line, pos);
        if marks.matched.is_none() && marks.unmatched.is_empty() {
            return Cow::Borrowed(line);
        }
        let mut highlighted = String::with_capacity(line.len() + 16);
        for (i, c) in line.char_indices() {
            match marks.matched {
                Some((opening, closing)) if i == opening || i == closing => {
                    highlighted.push_str(&format!("\x1b[1;34m{}\x1b[0m", c)); // Blue for matching parens
                    continue;
                }
                _ => {}
            }
            if marks.unmatched.contains(&i) {
                highlighted.push_str(&format!("\x1b[1;31m{}\x1b[0m", c)); // Red for stray closers
            } else {
                highlighted.push(c);
            }
        }
        Cow::Owned(highlighted)
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _kind: CmdKind) -> bool {
        true
    }
}

pub fn run(config: ReplConfig) -> rustyline::Result<()> {
    println!("subscheme REPL v{}", env!("CARGO_PKG_VERSION"));
    println!("Type 'exit' or press Ctrl-D to quit.");

    let interpreter = Rc::new(RefCell::new(Interpreter::new()));
    let helper = ReplHelper {
        validator: ParenValidator,
        highlighter: ParenHighlighter,
        completer: SubschemeCompleter::new(Rc::clone(&interpreter)),
    };
    let mut rl: Editor<ReplHelper, DefaultHistory> =
        Editor::with_config(config.editor_config()?)?;
    rl.set_helper(Some(helper));
    // Ctrl-S inserts a line break without submitting
    rl.bind_sequence(
        KeyEvent(KeyCode::Char('s'), Modifiers::CTRL),
        EventHandler::Simple(Cmd::Newline),
    );
    if let Some(path) = &config.history {
        if let Err(e) = rl.load_history(path) {
            debug!(path = %path.display(), error = %e, "no previous history");
        }
    }

    loop {
        match rl.readline(PROMPT) {
            Ok(line) => {
                let input = line.trim();
                if input.is_empty() {
                    continue;
                }
                rl.add_history_entry(input)?;
                if input.eq_ignore_ascii_case("exit") {
                    break;
                }
                match interpreter.borrow_mut().interpret(input) {
                    Ok(values) => {
                        for value in values {
                            println!("{value}");
                        }
                    }
                    Err(err) => {
                        if let Err(io_err) = err.eprint(SOURCE_NAME, input) {
                            eprintln!("error: {err} ({io_err})");
                        }
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                // Ctrl-C drops the current line only
                println!("Interrupted. Type 'exit' or Ctrl-D to quit.");
            }
            Err(ReadlineError::Eof) => {
                println!("\nExiting.");
                break;
            }
            Err(err) => {
                warn!(error = %err, "readline failed");
                return Err(err);
            }
        }
    }

    if let Some(path) = &config.history {
        rl.save_history(path)?;
    }
    Ok(())
}
