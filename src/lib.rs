//! G-code Toolkit
//!
//! Lexing, parsing and modal interpretation of G-code programs.
//!
//! This library provides:
//! - A lazy lexer and line parser with per-line error recovery
//! - Classification of statements against a recognized-code table
//! - A modal state tracker and an interpreter producing resolved events
//! - Extent, translate and mirror utilities

pub mod codes;
pub mod command;
pub mod config;
pub mod diagnostics;
pub mod interpreter;
pub mod parser;
pub mod tools;

// Re-exports for the common entry points
pub use codes::{CodeRegistry, CodeTable};
pub use command::{classify, Code, Command};
pub use config::Config;
pub use diagnostics::{Diagnostic, Diagnostics, ErrorKind, SemanticWarning};
pub use interpreter::{
    interpret, EventKind, Interpretation, InterpretedEvent, Interpreter, InterpreterOptions,
    ModalState,
};
pub use parser::{parse_line, Parser, Statement};
