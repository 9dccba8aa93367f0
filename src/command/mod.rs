//! Command Model
//!
//! A classified statement: its G/M codes as a tagged enum and the remaining
//! words as an ordered parameter map. Codes without built-in semantics keep
//! their letter and number in [`Code::Unrecognized`] or [`Code::Ignored`],
//! so nothing from the source is lost and rendering reproduces it.

pub mod classify;

pub use classify::{classify, may_coexist, ClassifyError};

use std::fmt;

use serde::Serialize;

/// Letters that name a statement's principal action
pub fn is_primary_letter(letter: char) -> bool {
    matches!(letter, 'G' | 'M')
}

/// Canonical code name: "G1", "G59.1", "M30"
pub fn code_name(letter: char, number: f64) -> String {
    match split_number(number) {
        Some((major, 0)) => format!("{letter}{major}"),
        Some((major, minor)) => format!("{letter}{major}.{minor}"),
        None => format!("{letter}{number}"),
    }
}

/// Split a code number into its integer part and tenths digit
fn split_number(number: f64) -> Option<(u32, u32)> {
    let tenths = (number * 10.0).round();
    if number < 0.0 || (number * 10.0 - tenths).abs() > 1e-6 || tenths > f64::from(u32::MAX) {
        return None;
    }
    let tenths = tenths as u32;
    Some((tenths / 10, tenths % 10))
}

/// A G or M code with its meaning
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum Code {
    /// G0
    Rapid,
    /// G1
    Linear,
    /// G2
    ArcClockwise,
    /// G3
    ArcCounterClockwise,
    /// G4
    Dwell,
    /// G10 (L2 form)
    SetWorkOffset,
    /// G17
    PlaneXY,
    /// G18
    PlaneZX,
    /// G19
    PlaneYZ,
    /// G20
    Inches,
    /// G21
    Millimeters,
    /// G53, one-shot machine coordinates
    MachineCoordinates,
    /// G54-G59 (slots 1-6), G59.1-G59.3 (slots 7-9)
    WorkCoordinates(u8),
    /// G80
    CancelMotion,
    /// G90
    Absolute,
    /// G91
    Incremental,
    /// M0
    Stop,
    /// M1
    OptionalStop,
    /// M2
    End,
    /// M30
    EndRewind,
    /// M3
    SpindleClockwise,
    /// M4
    SpindleCounterClockwise,
    /// M5
    SpindleStop,
    /// M6
    ToolChange,
    /// Listed by the active code table but without modal effect
    Ignored { letter: char, number: f64 },
    /// Not listed by the active code table
    Unrecognized { letter: char, number: f64 },
}

impl Code {
    /// Built-in meaning of a G/M word, `Unrecognized` when there is none
    pub fn from_word(letter: char, number: f64) -> Code {
        let unrecognized = Code::Unrecognized { letter, number };
        let Some(split) = split_number(number) else {
            return unrecognized;
        };
        match (letter, split) {
            ('G', (0, 0)) => Code::Rapid,
            ('G', (1, 0)) => Code::Linear,
            ('G', (2, 0)) => Code::ArcClockwise,
            ('G', (3, 0)) => Code::ArcCounterClockwise,
            ('G', (4, 0)) => Code::Dwell,
            ('G', (10, 0)) => Code::SetWorkOffset,
            ('G', (17, 0)) => Code::PlaneXY,
            ('G', (18, 0)) => Code::PlaneZX,
            ('G', (19, 0)) => Code::PlaneYZ,
            ('G', (20, 0)) => Code::Inches,
            ('G', (21, 0)) => Code::Millimeters,
            ('G', (53, 0)) => Code::MachineCoordinates,
            ('G', (major @ 54..=59, 0)) => Code::WorkCoordinates((major - 53) as u8),
            ('G', (59, minor @ 1..=3)) => Code::WorkCoordinates(6 + minor as u8),
            ('G', (80, 0)) => Code::CancelMotion,
            ('G', (90, 0)) => Code::Absolute,
            ('G', (91, 0)) => Code::Incremental,
            ('M', (0, 0)) => Code::Stop,
            ('M', (1, 0)) => Code::OptionalStop,
            ('M', (2, 0)) => Code::End,
            ('M', (3, 0)) => Code::SpindleClockwise,
            ('M', (4, 0)) => Code::SpindleCounterClockwise,
            ('M', (5, 0)) => Code::SpindleStop,
            ('M', (6, 0)) => Code::ToolChange,
            ('M', (30, 0)) => Code::EndRewind,
            _ => unrecognized,
        }
    }

    pub fn letter(&self) -> char {
        match self {
            Code::Ignored { letter, .. } | Code::Unrecognized { letter, .. } => *letter,
            Code::Stop
            | Code::OptionalStop
            | Code::End
            | Code::EndRewind
            | Code::SpindleClockwise
            | Code::SpindleCounterClockwise
            | Code::SpindleStop
            | Code::ToolChange => 'M',
            _ => 'G',
        }
    }

    pub fn number(&self) -> f64 {
        match *self {
            Code::Rapid | Code::Stop => 0.0,
            Code::Linear | Code::OptionalStop => 1.0,
            Code::ArcClockwise | Code::End => 2.0,
            Code::ArcCounterClockwise | Code::SpindleClockwise => 3.0,
            Code::Dwell | Code::SpindleCounterClockwise => 4.0,
            Code::SpindleStop => 5.0,
            Code::ToolChange => 6.0,
            Code::SetWorkOffset => 10.0,
            Code::PlaneXY => 17.0,
            Code::PlaneZX => 18.0,
            Code::PlaneYZ => 19.0,
            Code::Inches => 20.0,
            Code::Millimeters => 21.0,
            Code::EndRewind => 30.0,
            Code::MachineCoordinates => 53.0,
            Code::WorkCoordinates(slot @ 1..=6) => 53.0 + f64::from(slot),
            Code::WorkCoordinates(slot) => 59.0 + f64::from(slot.saturating_sub(6)) / 10.0,
            Code::CancelMotion => 80.0,
            Code::Absolute => 90.0,
            Code::Incremental => 91.0,
            Code::Ignored { number, .. } | Code::Unrecognized { number, .. } => number,
        }
    }

    pub fn name(&self) -> String {
        code_name(self.letter(), self.number())
    }

    pub fn is_motion(&self) -> bool {
        matches!(
            self,
            Code::Rapid | Code::Linear | Code::ArcClockwise | Code::ArcCounterClockwise
        )
    }

    pub fn is_program_end(&self) -> bool {
        matches!(self, Code::End | Code::EndRewind)
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// Parameter words of a command in source order; letters are unique
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Parameters(Vec<(char, f64)>);

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, letter: char) -> Option<f64> {
        self.0.iter().find(|(l, _)| *l == letter).map(|(_, v)| *v)
    }

    pub fn contains(&self, letter: char) -> bool {
        self.get(letter).is_some()
    }

    /// Replace the value of `letter`, appending it when absent
    pub fn set(&mut self, letter: char, value: f64) {
        match self.0.iter_mut().find(|(l, _)| *l == letter) {
            Some(entry) => entry.1 = value,
            None => self.0.push((letter, value)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (char, f64)> + '_ {
        self.0.iter().copied()
    }

    pub fn has_axis_words(&self) -> bool {
        self.0.iter().any(|(l, _)| matches!(l, 'X' | 'Y' | 'Z'))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(char, f64)> for Parameters {
    fn from_iter<I: IntoIterator<Item = (char, f64)>>(iter: I) -> Self {
        let mut parameters = Parameters::new();
        for (letter, value) in iter {
            parameters.set(letter, value);
        }
        parameters
    }
}

/// A classified G-code statement
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Command {
    /// Physical line the statement starts on
    pub line: usize,
    pub line_number: Option<u32>,
    /// At most one G and one M code, in source order
    pub codes: Vec<Code>,
    pub parameters: Parameters,
    pub comment: Option<String>,
}

impl Command {
    /// The statement's principal code, preferring the G code
    pub fn primary(&self) -> Option<Code> {
        self.g_code().or_else(|| self.m_code())
    }

    pub fn g_code(&self) -> Option<Code> {
        self.codes.iter().copied().find(|c| c.letter() == 'G')
    }

    pub fn m_code(&self) -> Option<Code> {
        self.codes.iter().copied().find(|c| c.letter() == 'M')
    }

    /// Nothing to execute: comment or block number only
    pub fn is_inert(&self) -> bool {
        self.codes.is_empty() && self.parameters.is_empty()
    }
}

/// Renders the command as one line of G-code
///
/// Values use the shortest representation that parses back to the same
/// number, so lexing the output reproduces the command.
impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(number) = self.line_number {
            parts.push(format!("N{number}"));
        }
        parts.extend(self.codes.iter().map(Code::name));
        parts.extend(
            self.parameters
                .iter()
                .map(|(letter, value)| format!("{letter}{value}")),
        );
        if let Some(comment) = &self.comment {
            parts.push(format!(";{comment}"));
        }
        f.write_str(&parts.join(" "))
    }
}
