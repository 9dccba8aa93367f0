//! Coordinate rewrites
//!
//! Each statement is classified and rewritten with the modal state of the
//! original program at that point, then rendered back to text. Rejected
//! lines are reported and left out of the output.

use crate::command::{classify, Code, Command};
use crate::diagnostics::{Diagnostics, RejectedLine};
use crate::interpreter::{Axis, DistanceMode, InterpreterOptions, ModalState, Position};
use crate::parser::Parser;

/// Rendered program text plus the lines that could not be carried over
#[derive(Debug, Clone, PartialEq)]
pub struct Rendered {
    pub text: String,
    pub diagnostics: Diagnostics,
}

/// Drop float noise such as 0.30000000000000004
fn round(value: f64) -> f64 {
    let rounded = (value * 1e6).round() / 1e6;
    if rounded == 0.0 { 0.0 } else { rounded }
}

fn rewrite<F>(src: &str, options: &InterpreterOptions, mut edit: F) -> Rendered
where
    F: FnMut(&ModalState, &mut Command),
{
    let mut state = options.initial_state.clone();
    let mut diagnostics = Diagnostics::new();
    let mut text = String::new();

    for result in Parser::new(src) {
        let statement = match result {
            Ok(statement) => statement,
            Err(rejected) => {
                diagnostics.push_rejected(rejected);
                continue;
            }
        };
        let line = statement.line;
        let command = match classify(statement, &options.table) {
            Ok(command) => command,
            Err(error) => {
                diagnostics.push_rejected(RejectedLine {
                    line,
                    error: error.into(),
                });
                continue;
            }
        };

        let mut rewritten = command.clone();
        edit(&state, &mut rewritten);
        state.apply(&command);

        text.push_str(&rewritten.to_string());
        text.push('\n');
    }

    Rendered { text, diagnostics }
}

/// Whether the command's axis words are work-frame motion coordinates
fn moves_in_work_frame(state: &ModalState, command: &Command) -> bool {
    state.effective_motion(command).is_some()
        && command.g_code() != Some(Code::MachineCoordinates)
}

/// Shift absolute motion coordinates by `offset`
///
/// Incremental coordinates, arc centre offsets and G53 lines are unchanged.
pub fn translate(src: &str, options: &InterpreterOptions, offset: Position) -> Rendered {
    rewrite(src, options, |state, command| {
        if !moves_in_work_frame(state, command)
            || state.effective_distance(command) == DistanceMode::Incremental
        {
            return;
        }
        for axis in Axis::ALL {
            if let Some(value) = command.parameters.get(axis.letter()) {
                command
                    .parameters
                    .set(axis.letter(), round(value + offset[axis]));
            }
        }
    })
}

/// Reflect motion about the plane `axis = value`
///
/// Arcs whose plane contains `axis` change direction.
pub fn mirror(src: &str, options: &InterpreterOptions, axis: Axis, value: f64) -> Rendered {
    rewrite(src, options, |state, command| {
        let Some(kind) = state.effective_motion(command) else {
            return;
        };
        if command.g_code() == Some(Code::MachineCoordinates) {
            return;
        }

        if let Some(c) = command.parameters.get(axis.letter()) {
            let mirrored = match state.effective_distance(command) {
                DistanceMode::Absolute => 2.0 * value - c,
                DistanceMode::Incremental => -c,
            };
            command.parameters.set(axis.letter(), round(mirrored));
        }

        if kind.is_arc() {
            if let Some(offset) = command.parameters.get(axis.offset_letter()) {
                command.parameters.set(axis.offset_letter(), round(-offset));
            }
            if state.plane.contains(axis) {
                for code in &mut command.codes {
                    *code = match *code {
                        Code::ArcClockwise => Code::ArcCounterClockwise,
                        Code::ArcCounterClockwise => Code::ArcClockwise,
                        other => other,
                    };
                }
            }
        }
    })
}
