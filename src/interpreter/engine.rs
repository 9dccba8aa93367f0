//! Program Interpreter
//!
//! Drives parser, classifier and modal state over a whole program. Events
//! are produced lazily: pulling the next event processes at most one more
//! line.

use std::collections::VecDeque;

use super::event::{EventKind, InterpretedEvent};
use super::state::ModalState;
use crate::codes::CodeTable;
use crate::command::classify;
use crate::diagnostics::{Diagnostics, RejectedLine, SemanticWarning};
use crate::parser::{Parser, Statement};

/// Caller-supplied starting conditions
#[derive(Debug, Clone, Default)]
pub struct InterpreterOptions {
    pub initial_state: ModalState,
    pub table: CodeTable,
}

impl InterpreterOptions {
    pub fn with_table(table: CodeTable) -> Self {
        Self {
            table,
            ..Self::default()
        }
    }
}

/// Pull-driven event stream over one program
#[derive(Debug)]
pub struct Interpreter<'a> {
    parser: Parser<'a>,
    table: &'a CodeTable,
    state: ModalState,
    diagnostics: Diagnostics,
    pending: VecDeque<InterpretedEvent>,
    ended: bool,
    finished: bool,
}

impl<'a> Interpreter<'a> {
    pub fn new(src: &'a str, options: &'a InterpreterOptions) -> Self {
        Self {
            parser: Parser::new(src),
            table: &options.table,
            state: options.initial_state.clone(),
            diagnostics: Diagnostics::new(),
            pending: VecDeque::new(),
            ended: false,
            finished: false,
        }
    }

    /// Modal state after the lines processed so far
    pub fn state(&self) -> &ModalState {
        &self.state
    }

    /// Diagnostics of the lines processed so far
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn into_parts(self) -> (ModalState, Diagnostics) {
        (self.state, self.diagnostics)
    }

    fn reject(&mut self, rejected: RejectedLine) {
        log::debug!("Rejected {}", rejected);
        self.diagnostics.push_rejected(rejected);
    }

    fn process(&mut self, statement: Statement) {
        let line = statement.line;
        let command = match classify(statement, self.table) {
            Ok(command) => command,
            Err(error) => {
                self.reject(RejectedLine {
                    line,
                    error: error.into(),
                });
                return;
            }
        };
        log::trace!("line {}: {}", line, command);

        let mut warnings = Vec::new();
        if self.ended && !command.is_inert() {
            warnings.push(SemanticWarning::AfterProgramEnd);
        }
        warnings.extend(self.table.check_parameters(&command));

        let outcome = self.state.apply(&command);
        warnings.extend(outcome.warnings);
        if outcome.events.contains(&EventKind::ProgramEnd) {
            self.ended = true;
        }

        for warning in &warnings {
            self.diagnostics.push_warning(line, warning.clone());
        }
        self.pending
            .extend(outcome.events.into_iter().map(|kind| InterpretedEvent {
                line,
                line_number: command.line_number,
                kind,
                warnings: warnings.clone(),
            }));
    }

    /// End of input: close a program that never reached M2/M30
    fn finish(&mut self) {
        self.finished = true;
        if self.ended {
            return;
        }

        let line = self.parser.last_line();
        log::debug!("No program end before line {}", line);
        self.diagnostics
            .push_warning(line, SemanticWarning::MissingProgramEnd);
        self.pending.push_back(InterpretedEvent {
            line,
            line_number: None,
            kind: EventKind::ProgramEnd,
            warnings: vec![SemanticWarning::MissingProgramEnd],
        });
    }
}

impl Iterator for Interpreter<'_> {
    type Item = InterpretedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Some(event);
            }
            if self.finished {
                return None;
            }
            match self.parser.next() {
                Some(Ok(statement)) => self.process(statement),
                Some(Err(rejected)) => self.reject(rejected),
                None => self.finish(),
            }
        }
    }
}

/// Result of interpreting a whole program
#[derive(Debug, Clone, PartialEq)]
pub struct Interpretation {
    pub events: Vec<InterpretedEvent>,
    pub diagnostics: Diagnostics,
    pub final_state: ModalState,
}

/// Interpret `src` to completion
pub fn interpret(src: &str, options: &InterpreterOptions) -> Interpretation {
    let mut interpreter = Interpreter::new(src, options);
    let events: Vec<_> = interpreter.by_ref().collect();
    let (final_state, diagnostics) = interpreter.into_parts();
    log::debug!(
        "Interpreted {} events with {} diagnostics",
        events.len(),
        diagnostics.len()
    );
    Interpretation {
        events,
        diagnostics,
        final_state,
    }
}
