//! GCode Parser
//!
//! Lexing and line parsing. The [`Parser`] pulls tokens from a [`Lexer`] one
//! logical line at a time and yields either a [`Statement`] or the reason the
//! line was rejected. A rejected line never stops the stream: parsing resumes
//! at the next line boundary.

pub mod lexer;
pub mod statement;

pub use lexer::{LexError, LexErrorKind, Lexer, Location, Token, TokenKind};
pub use statement::{ParseError, Statement, Word};

use crate::command::is_primary_letter;
use crate::diagnostics::{LineError, RejectedLine};

/// Pull-driven statement stream over a program text
#[derive(Debug, Clone)]
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Statement,
    started: bool,
    line_number_at: Option<Location>,
    error: Option<LineError>,
    last_line: usize,
}

impl<'a> Parser<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            lexer: Lexer::new(src),
            current: Statement::default(),
            started: false,
            line_number_at: None,
            error: None,
            last_line: 0,
        }
    }

    /// Last physical line reached so far; the line count once exhausted
    pub fn last_line(&self) -> usize {
        self.last_line
    }

    fn begin(&mut self, location: Location) {
        if !self.started {
            self.started = true;
            self.current.line = location.line;
        }
    }

    /// Only the first error of a line is kept
    fn reject(&mut self, error: LineError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    fn push_word(&mut self, letter: char, value: f64, location: Location) {
        if !is_primary_letter(letter) {
            if let Some(first) = self.current.word(letter) {
                let first = first.location;
                self.reject(
                    ParseError::DuplicateWord {
                        letter,
                        first,
                        second: location,
                    }
                    .into(),
                );
                return;
            }
        }
        self.current.words.push(Word {
            letter,
            value,
            location,
        });
    }

    fn set_line_number(&mut self, number: u32, location: Location) {
        match self.line_number_at {
            Some(first) => self.reject(
                ParseError::DuplicateLineNumber {
                    first,
                    second: location,
                }
                .into(),
            ),
            None if !self.current.words.is_empty() => {
                self.reject(ParseError::MisplacedLineNumber { location }.into())
            }
            None => {
                self.line_number_at = Some(location);
                self.current.line_number = Some(number);
            }
        }
    }

    /// Close the current logical line
    fn finish_line(&mut self) -> Option<Result<Statement, RejectedLine>> {
        let statement = std::mem::take(&mut self.current);
        self.started = false;
        self.line_number_at = None;

        if let Some(error) = self.error.take() {
            return Some(Err(RejectedLine {
                line: statement.line,
                error,
            }));
        }
        if statement.is_empty() {
            None
        } else {
            Some(Ok(statement))
        }
    }
}

impl Iterator for Parser<'_> {
    type Item = Result<Statement, RejectedLine>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let token = match self.lexer.next()? {
                Ok(token) => token,
                Err(err) => {
                    self.begin(err.location);
                    let error = match err.kind {
                        LexErrorKind::DanglingContinuation => ParseError::TruncatedLine {
                            location: err.location,
                        }
                        .into(),
                        _ => err.into(),
                    };
                    self.reject(error);
                    continue;
                }
            };

            self.last_line = match token.kind {
                // A trailing line break does not open another physical line
                TokenKind::EndOfInput if token.location.column == 1 && token.location.line > 1 => {
                    token.location.line - 1
                }
                _ => token.location.line,
            };
            self.begin(token.location);

            match token.kind {
                TokenKind::NewLine | TokenKind::EndOfInput => {
                    if let Some(result) = self.finish_line() {
                        return Some(result);
                    }
                }
                _ if self.error.is_some() => continue,
                TokenKind::Word { letter, value } => self.push_word(letter, value, token.location),
                TokenKind::LineNumber(number) => self.set_line_number(number, token.location),
                TokenKind::Comment(text) => self.current.add_comment(text),
            }
        }
    }
}

/// Parse the first logical line of `line`
///
/// Returns `None` for blank input.
pub fn parse_line(line: &str) -> Option<Result<Statement, RejectedLine>> {
    Parser::new(line).next()
}
