//! GCode Lexer
//!
//! Single-pass, per-character tokenization of G-code program text.
//! The lexer is a lazy iterator: nothing past the current token is examined,
//! and a lexer can be cloned or restarted to replay the same token stream.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// A 1-based line and column in the program text
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

impl Location {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Token types in GCode
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// A letter/number pair like "G1" or "X-10.5"; the letter is uppercase
    Word { letter: char, value: f64 },
    /// An "N" block number
    LineNumber(u32),
    /// Comment text without its delimiters
    Comment(String),
    NewLine,
    EndOfInput,
}

/// A token with the location of its first character
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub location: Location,
}

/// A lexical error; the rest of the offending line is skipped
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[error("{kind} at {location}")]
pub struct LexError {
    pub kind: LexErrorKind,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq, Error, Serialize)]
pub enum LexErrorKind {
    #[error("unterminated comment")]
    UnterminatedComment,
    #[error("malformed number '{text}'")]
    MalformedNumber { text: String },
    #[error("word '{letter}' has no value")]
    MissingValue { letter: char },
    #[error("invalid line number '{text}'")]
    InvalidLineNumber { text: String },
    #[error("unexpected character '{0}'")]
    UnexpectedCharacter(char),
    #[error("line continuation at end of input")]
    DanglingContinuation,
}

/// Lazy token stream over a program text
#[derive(Debug, Clone)]
pub struct Lexer<'a> {
    src: &'a str,
    pos: usize,
    line: usize,
    column: usize,
    finished: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            line: 1,
            column: 1,
            finished: false,
        }
    }

    /// Rewind to the start of the text
    pub fn restart(&mut self) {
        *self = Self::new(self.src);
    }

    /// Location of the next unread character
    pub fn location(&self) -> Location {
        Location::new(self.line, self.column)
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn skip_blanks(&mut self) {
        while let Some(' ' | '\t' | '\r') = self.peek() {
            self.bump();
        }
    }

    /// Error recovery: drop everything up to (not including) the next line break
    fn skip_to_line_end(&mut self) {
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            self.bump();
        }
    }

    /// Error recovery across continuations: a skipped segment ending in `\`
    /// pulls the next physical line into the same rejected statement
    fn skip_to_logical_line_end(&mut self) {
        loop {
            let start = self.pos;
            self.skip_to_line_end();
            let skipped = self.src[start..self.pos].trim_end_matches([' ', '\t', '\r']);
            if !skipped.ends_with('\\') || self.peek().is_none() {
                break;
            }
            self.bump();
        }
    }

    fn fail(&mut self, kind: LexErrorKind, location: Location) -> LexError {
        self.skip_to_logical_line_end();
        LexError { kind, location }
    }

    fn lex_semicolon_comment(&mut self) -> TokenKind {
        let start = self.pos;
        self.skip_to_line_end();
        let text = self.src[start..self.pos].trim_end_matches('\r');
        TokenKind::Comment(text.to_string())
    }

    fn lex_paren_comment(&mut self, location: Location) -> Result<TokenKind, LexError> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            match c {
                ')' => {
                    let text = self.src[start..self.pos].to_string();
                    self.bump();
                    return Ok(TokenKind::Comment(text));
                }
                '\n' => break,
                _ => {
                    self.bump();
                }
            }
        }
        Err(self.fail(LexErrorKind::UnterminatedComment, location))
    }

    fn lex_word(&mut self, letter: char, location: Location) -> Result<TokenKind, LexError> {
        self.skip_blanks();
        let number_at = self.location();
        let start = self.pos;

        if let Some('+' | '-') = self.peek() {
            self.bump();
        }
        let mut digits = 0;
        let mut points = 0;
        while let Some(c) = self.peek() {
            match c {
                '0'..='9' => digits += 1,
                '.' => points += 1,
                _ => break,
            }
            self.bump();
        }

        let text = &self.src[start..self.pos];
        if text.is_empty() {
            return Err(self.fail(LexErrorKind::MissingValue { letter }, location));
        }

        if letter == 'N' {
            return match text.parse::<u32>() {
                Ok(n) if text.bytes().all(|b| b.is_ascii_digit()) => Ok(TokenKind::LineNumber(n)),
                _ => {
                    let text = text.to_string();
                    Err(self.fail(LexErrorKind::InvalidLineNumber { text }, number_at))
                }
            };
        }

        if digits == 0 || points > 1 {
            let text = text.to_string();
            return Err(self.fail(LexErrorKind::MalformedNumber { text }, number_at));
        }
        match text.parse::<f64>() {
            Ok(value) => Ok(TokenKind::Word { letter, value }),
            Err(_) => {
                let text = text.to_string();
                Err(self.fail(LexErrorKind::MalformedNumber { text }, number_at))
            }
        }
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<Token, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let location = self.location();
            let Some(ch) = self.peek() else {
                if self.finished {
                    return None;
                }
                self.finished = true;
                return Some(Ok(Token {
                    kind: TokenKind::EndOfInput,
                    location,
                }));
            };

            let kind = match ch {
                // '%' marks the start/end of a program tape
                ' ' | '\t' | '\r' | '%' => {
                    self.bump();
                    continue;
                }
                '\n' => {
                    self.bump();
                    Ok(TokenKind::NewLine)
                }
                ';' => {
                    self.bump();
                    Ok(self.lex_semicolon_comment())
                }
                '(' => {
                    self.bump();
                    self.lex_paren_comment(location)
                }
                '\\' => {
                    self.bump();
                    self.skip_blanks();
                    match self.peek() {
                        Some('\n') => {
                            self.bump();
                            continue;
                        }
                        None => Err(LexError {
                            kind: LexErrorKind::DanglingContinuation,
                            location,
                        }),
                        Some(_) => Err(self.fail(LexErrorKind::UnexpectedCharacter('\\'), location)),
                    }
                }
                c if c.is_ascii_alphabetic() => {
                    self.bump();
                    self.lex_word(c.to_ascii_uppercase(), location)
                }
                c => {
                    self.bump();
                    Err(self.fail(LexErrorKind::UnexpectedCharacter(c), location))
                }
            };

            return Some(kind.map(|kind| Token { kind, location }));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        Lexer::new(src)
            .filter_map(Result::ok)
            .map(|t| t.kind)
            .collect()
    }

    fn word(letter: char, value: f64) -> TokenKind {
        TokenKind::Word { letter, value }
    }

    #[test]
    fn test_tokenize_simple_command() {
        let tokens = kinds("G1 X10 Y20\n");
        assert_eq!(
            tokens,
            vec![
                word('G', 1.0),
                word('X', 10.0),
                word('Y', 20.0),
                TokenKind::NewLine,
                TokenKind::EndOfInput,
            ]
        );
    }

    #[test]
    fn test_lowercase_and_packed_words() {
        let tokens = kinds("g01x-1.5y+.25");
        assert_eq!(
            tokens,
            vec![
                word('G', 1.0),
                word('X', -1.5),
                word('Y', 0.25),
                TokenKind::EndOfInput,
            ]
        );
    }

    #[test]
    fn test_blank_between_letter_and_value() {
        let tokens = kinds("G 1 X 2.");
        assert_eq!(tokens[0], word('G', 1.0));
        assert_eq!(tokens[1], word('X', 2.0));
    }

    #[test]
    fn test_tokenize_with_semicolon_comment() {
        let tokens = kinds("G1 X10 ; move to X10\r\nM2");
        assert_eq!(tokens[2], TokenKind::Comment(" move to X10".to_string()));
        assert_eq!(tokens[3], TokenKind::NewLine);
        assert_eq!(tokens[4], word('M', 2.0));
    }

    #[test]
    fn test_tokenize_paren_comment() {
        let tokens = kinds("G1 (rapid move) X10");
        assert_eq!(tokens[1], TokenKind::Comment("rapid move".to_string()));
        assert_eq!(tokens[2], word('X', 10.0));
    }

    #[test]
    fn test_line_number() {
        let tokens = kinds("N120 G0 X1");
        assert_eq!(tokens[0], TokenKind::LineNumber(120));
    }

    #[test]
    fn test_invalid_line_number() {
        let err = Lexer::new("N1.5 G0").find_map(Result::err).unwrap();
        assert_eq!(
            err.kind,
            LexErrorKind::InvalidLineNumber {
                text: "1.5".to_string()
            }
        );
    }

    #[test]
    fn test_malformed_number_reports_location() {
        let mut lexer = Lexer::new("G0\nG1 X1.2.3 Y4\nG1 Y5");
        let results: Vec<_> = lexer.by_ref().collect();
        let err = results.iter().find_map(|r| r.clone().err()).unwrap();
        assert_eq!(
            err.kind,
            LexErrorKind::MalformedNumber {
                text: "1.2.3".to_string()
            }
        );
        assert_eq!(err.location, Location::new(2, 5));

        // Y4 on the bad line is skipped, the following line is intact
        let words: Vec<_> = results
            .into_iter()
            .filter_map(Result::ok)
            .map(|t| t.kind)
            .collect();
        assert!(!words.contains(&word('Y', 4.0)));
        assert!(words.contains(&word('Y', 5.0)));
    }

    #[test]
    fn test_number_without_digits() {
        let err = Lexer::new("X-.").find_map(Result::err).unwrap();
        assert!(matches!(err.kind, LexErrorKind::MalformedNumber { .. }));
    }

    #[test]
    fn test_missing_value() {
        let err = Lexer::new("G1 X Y2").find_map(Result::err).unwrap();
        assert_eq!(err.kind, LexErrorKind::MissingValue { letter: 'X' });
        assert_eq!(err.location, Location::new(1, 4));
    }

    #[test]
    fn test_unterminated_comment_resumes_next_line() {
        let results: Vec<_> = Lexer::new("G1 (oops X1\nG0 X2").collect();
        let err = results.iter().find_map(|r| r.clone().err()).unwrap();
        assert_eq!(err.kind, LexErrorKind::UnterminatedComment);
        assert_eq!(err.location, Location::new(1, 4));

        let tokens: Vec<_> = results.into_iter().filter_map(Result::ok).collect();
        assert!(tokens.iter().any(|t| t.kind == word('X', 2.0)));
        assert!(tokens.iter().any(|t| t.kind == TokenKind::NewLine));
    }

    #[test]
    fn test_line_continuation() {
        let tokens = kinds("G1 X1 \\\n Y2\nM2");
        assert_eq!(
            tokens,
            vec![
                word('G', 1.0),
                word('X', 1.0),
                word('Y', 2.0),
                TokenKind::NewLine,
                word('M', 2.0),
                TokenKind::EndOfInput,
            ]
        );
    }

    #[test]
    fn test_dangling_continuation() {
        let results: Vec<_> = Lexer::new("G1 X1 \\").collect();
        let err = results.iter().find_map(|r| r.clone().err()).unwrap();
        assert_eq!(err.kind, LexErrorKind::DanglingContinuation);
        assert!(matches!(
            results.last(),
            Some(Ok(Token {
                kind: TokenKind::EndOfInput,
                ..
            }))
        ));
    }

    #[test]
    fn test_error_recovery_follows_continuation() {
        let tokens = kinds("G1 X1.2.3 \\\n Y7\nM2");
        assert_eq!(
            tokens,
            vec![
                word('G', 1.0),
                TokenKind::NewLine,
                word('M', 2.0),
                TokenKind::EndOfInput,
            ]
        );
    }

    #[test]
    fn test_end_of_input_emitted_once() {
        let mut lexer = Lexer::new("");
        assert_eq!(lexer.next().unwrap().unwrap().kind, TokenKind::EndOfInput);
        assert!(lexer.next().is_none());
    }

    #[test]
    fn test_restart_replays_stream() {
        let mut lexer = Lexer::new("%\nG0 X1\n%");
        let first: Vec<_> = lexer.by_ref().collect();
        lexer.restart();
        let second: Vec<_> = lexer.collect();
        assert_eq!(first, second);
    }
}
