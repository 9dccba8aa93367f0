//! Statements
//!
//! One logical G-code line: its words, optional block number and comment.
//! Pure data plus the per-line parse errors; grouping tokens into statements
//! happens in [`crate::parser::Parser`].

use serde::Serialize;
use thiserror::Error;

use crate::parser::lexer::Location;

/// A letter/value pair like "X10.5"
#[derive(Debug, Clone, PartialEq)]
pub struct Word {
    /// Uppercase letter
    pub letter: char,
    pub value: f64,
    pub location: Location,
}

/// A parsed logical line of G-code
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Statement {
    /// Physical line the statement starts on (1-based)
    pub line: usize,
    /// Block number from an "N" word
    pub line_number: Option<u32>,
    /// Words in source order
    pub words: Vec<Word>,
    /// Comment text without delimiters; several comments are joined by a space
    pub comment: Option<String>,
}

impl Statement {
    /// True when the line carried nothing at all (blank line)
    pub fn is_empty(&self) -> bool {
        self.words.is_empty() && self.line_number.is_none() && self.comment.is_none()
    }

    /// First word with the given letter
    pub fn word(&self, letter: char) -> Option<&Word> {
        self.words.iter().find(|w| w.letter == letter)
    }

    pub(crate) fn add_comment(&mut self, text: String) {
        match &mut self.comment {
            Some(existing) => {
                existing.push(' ');
                existing.push_str(&text);
            }
            None => self.comment = Some(text),
        }
    }
}

/// Structural errors within one statement
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
pub enum ParseError {
    #[error("duplicate line number at {second} (first at {first})")]
    DuplicateLineNumber { first: Location, second: Location },
    #[error("duplicate word '{letter}' at {second} (first at {first})")]
    DuplicateWord {
        letter: char,
        first: Location,
        second: Location,
    },
    #[error("line continuation at {location} reaches end of input")]
    TruncatedLine { location: Location },
    #[error("line number at {location} does not start the line")]
    MisplacedLineNumber { location: Location },
}
