//! Interpreted events
//!
//! The normalized output of interpretation: one event per machine action,
//! with targets already resolved to absolute coordinates.

use serde::Serialize;

use super::state::{MotionKind, Plane, Position, SpindleDirection, Units};
use crate::diagnostics::SemanticWarning;

/// Arc parameters of a G2/G3 move
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArcGeometry {
    /// Absent when the centre could not be resolved
    pub center: Option<Position>,
    pub plane: Plane,
}

/// A resolved motion
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Move {
    pub kind: MotionKind,
    /// End point in machine coordinates
    pub target: Position,
    /// Feed per minute; `None` for rapids
    pub feed: Option<f64>,
    /// Units of `target`, `feed` and the arc centre
    pub units: Units,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arc: Option<ArcGeometry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EventKind {
    Move(Move),
    SpindleChange {
        speed: f64,
        direction: SpindleDirection,
    },
    ToolChange {
        tool: u32,
    },
    Dwell {
        seconds: f64,
    },
    Pause {
        optional: bool,
    },
    ProgramEnd,
}

/// An event with the line that produced it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InterpretedEvent {
    /// Physical line the statement starts on
    pub line: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_number: Option<u32>,
    #[serde(flatten)]
    pub kind: EventKind,
    /// Warnings raised by the producing line
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<SemanticWarning>,
}

impl InterpretedEvent {
    pub fn as_move(&self) -> Option<&Move> {
        match &self.kind {
            EventKind::Move(m) => Some(m),
            _ => None,
        }
    }

    pub fn is_program_end(&self) -> bool {
        matches!(self.kind, EventKind::ProgramEnd)
    }
}
