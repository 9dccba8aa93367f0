//! Modal State Tracker
//!
//! Machine configuration that persists from line to line. Units, distance
//! mode, plane, motion mode and coordinate system are independent modal
//! groups, each changed only by its own codes. Positions and offsets are
//! kept in millimetres and machine coordinates; events are reported in the
//! active units.

use std::fmt;
use std::ops::{Index, IndexMut};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::event::{ArcGeometry, EventKind, Move};
use crate::command::{Code, Command, Parameters};
use crate::diagnostics::SemanticWarning;

const MM_PER_INCH: f64 = 25.4;

/// Smallest length treated as non-zero, in millimetres
const LENGTH_EPSILON: f64 = 1e-6;

/// Number of work coordinate systems (G54..G59.3)
pub const WORK_SLOTS: usize = 9;

/// Error for modal values given as text
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {group} '{value}'")]
pub struct ParseModalError {
    group: &'static str,
    value: String,
}

impl ParseModalError {
    fn new(group: &'static str, value: &str) -> Self {
        Self {
            group,
            value: value.to_string(),
        }
    }
}

/// Length units (G20/G21)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    #[serde(alias = "mm")]
    Millimeters,
    #[serde(alias = "in")]
    Inches,
}

impl Units {
    pub fn to_mm(self, value: f64) -> f64 {
        match self {
            Units::Millimeters => value,
            Units::Inches => value * MM_PER_INCH,
        }
    }

    pub fn from_mm(self, value: f64) -> f64 {
        match self {
            Units::Millimeters => value,
            Units::Inches => value / MM_PER_INCH,
        }
    }

    /// Convert `value` given in `from` units into these units
    pub fn convert(self, value: f64, from: Units) -> f64 {
        if self == from {
            value
        } else {
            self.from_mm(from.to_mm(value))
        }
    }
}

impl FromStr for Units {
    type Err = ParseModalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mm" | "millimeters" | "millimetres" | "g21" => Ok(Units::Millimeters),
            "in" | "inch" | "inches" | "g20" => Ok(Units::Inches),
            _ => Err(ParseModalError::new("units", s)),
        }
    }
}

/// Distance mode (G90/G91)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMode {
    #[default]
    Absolute,
    Incremental,
}

impl FromStr for DistanceMode {
    type Err = ParseModalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "absolute" | "abs" | "g90" => Ok(DistanceMode::Absolute),
            "incremental" | "relative" | "inc" | "g91" => Ok(DistanceMode::Incremental),
            _ => Err(ParseModalError::new("distance mode", s)),
        }
    }
}

/// Linear axes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    pub fn letter(self) -> char {
        match self {
            Axis::X => 'X',
            Axis::Y => 'Y',
            Axis::Z => 'Z',
        }
    }

    /// Letter of the arc centre offset along this axis
    pub fn offset_letter(self) -> char {
        match self {
            Axis::X => 'I',
            Axis::Y => 'J',
            Axis::Z => 'K',
        }
    }
}

/// Arc plane (G17/G18/G19)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plane {
    #[default]
    XY,
    ZX,
    YZ,
}

impl Plane {
    /// The plane's two axes, ordered so that G3 turns counter-clockwise
    pub fn axes(self) -> (Axis, Axis) {
        match self {
            Plane::XY => (Axis::X, Axis::Y),
            Plane::ZX => (Axis::Z, Axis::X),
            Plane::YZ => (Axis::Y, Axis::Z),
        }
    }

    pub fn contains(self, axis: Axis) -> bool {
        let (a, b) = self.axes();
        axis == a || axis == b
    }
}

impl FromStr for Plane {
    type Err = ParseModalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "xy" | "g17" => Ok(Plane::XY),
            "zx" | "xz" | "g18" => Ok(Plane::ZX),
            "yz" | "g19" => Ok(Plane::YZ),
            _ => Err(ParseModalError::new("plane", s)),
        }
    }
}

/// Motion modes (G0-G3)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MotionKind {
    Rapid,
    Linear,
    ArcClockwise,
    ArcCounterClockwise,
}

impl MotionKind {
    pub fn from_code(code: Code) -> Option<MotionKind> {
        match code {
            Code::Rapid => Some(MotionKind::Rapid),
            Code::Linear => Some(MotionKind::Linear),
            Code::ArcClockwise => Some(MotionKind::ArcClockwise),
            Code::ArcCounterClockwise => Some(MotionKind::ArcCounterClockwise),
            _ => None,
        }
    }

    pub fn code(self) -> Code {
        match self {
            MotionKind::Rapid => Code::Rapid,
            MotionKind::Linear => Code::Linear,
            MotionKind::ArcClockwise => Code::ArcClockwise,
            MotionKind::ArcCounterClockwise => Code::ArcCounterClockwise,
        }
    }

    pub fn is_arc(self) -> bool {
        matches!(
            self,
            MotionKind::ArcClockwise | MotionKind::ArcCounterClockwise
        )
    }
}

/// Active coordinate frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordinateSystem {
    /// Machine coordinates, no offset
    Machine,
    /// Work slot 1..=9 (G54..G59.3)
    Work(u8),
}

impl Default for CoordinateSystem {
    fn default() -> Self {
        CoordinateSystem::Work(1)
    }
}

impl fmt::Display for CoordinateSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoordinateSystem::Machine => f.write_str("G53"),
            CoordinateSystem::Work(slot) => write!(f, "{}", Code::WorkCoordinates(*slot)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SpindleDirection {
    Clockwise,
    CounterClockwise,
    #[default]
    Stopped,
}

/// A point in X/Y/Z
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn map(self, f: impl Fn(f64) -> f64) -> Self {
        Self::new(f(self.x), f(self.y), f(self.z))
    }
}

impl Index<Axis> for Position {
    type Output = f64;

    fn index(&self, axis: Axis) -> &f64 {
        match axis {
            Axis::X => &self.x,
            Axis::Y => &self.y,
            Axis::Z => &self.z,
        }
    }
}

impl IndexMut<Axis> for Position {
    fn index_mut(&mut self, axis: Axis) -> &mut f64 {
        match axis {
            Axis::X => &mut self.x,
            Axis::Y => &mut self.y,
            Axis::Z => &mut self.z,
        }
    }
}

/// Feed rate per minute, in the units it was programmed in
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct FeedRate {
    pub value: f64,
    pub units: Units,
}

impl FeedRate {
    /// The feed expressed in `units`
    pub fn in_units(&self, units: Units) -> f64 {
        units.convert(self.value, self.units)
    }
}

/// Result of applying one command
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Outcome {
    pub events: Vec<EventKind>,
    pub warnings: Vec<SemanticWarning>,
}

/// Persistent machine state for one interpretation pass
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModalState {
    pub units: Units,
    pub distance: DistanceMode,
    pub plane: Plane,
    /// `None` until a motion code is seen, and after G80
    pub motion: Option<MotionKind>,
    pub coordinate_system: CoordinateSystem,
    pub feed: FeedRate,
    pub spindle_speed: f64,
    pub spindle: SpindleDirection,
    /// Tool selected by the last T word
    pub tool: Option<u32>,
    /// Current position, machine coordinates in millimetres
    pub position: Position,
    /// Work offsets for slots 1..=9, millimetres
    pub offsets: [Position; WORK_SLOTS],
}

impl Default for ModalState {
    fn default() -> Self {
        Self {
            units: Units::default(),
            distance: DistanceMode::default(),
            plane: Plane::default(),
            motion: None,
            coordinate_system: CoordinateSystem::default(),
            feed: FeedRate::default(),
            spindle_speed: 0.0,
            spindle: SpindleDirection::default(),
            tool: None,
            position: Position::default(),
            offsets: [Position::default(); WORK_SLOTS],
        }
    }
}

impl ModalState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offset of `frame` from machine zero, millimetres
    pub fn frame_offset(&self, frame: CoordinateSystem) -> Position {
        match frame {
            CoordinateSystem::Machine => Position::default(),
            CoordinateSystem::Work(slot) => usize::from(slot)
                .checked_sub(1)
                .and_then(|i| self.offsets.get(i))
                .copied()
                .unwrap_or_default(),
        }
    }

    /// Current position in the active work frame and units
    pub fn work_position(&self) -> Position {
        let offset = self.frame_offset(self.coordinate_system);
        Position::new(
            self.position.x - offset.x,
            self.position.y - offset.y,
            self.position.z - offset.z,
        )
        .map(|v| self.units.from_mm(v))
    }

    /// The motion mode a command runs under, if it moves at all
    ///
    /// Explicit motion codes win; otherwise axis words reuse the sticky mode,
    /// unless a G code without built-in semantics owns them.
    pub fn effective_motion(&self, command: &Command) -> Option<MotionKind> {
        match command.g_code() {
            Some(code) if code.is_motion() => MotionKind::from_code(code),
            Some(Code::MachineCoordinates) if command.parameters.has_axis_words() => self.motion,
            Some(code) if !consumes_axis_words(code) && command.parameters.has_axis_words() => {
                self.motion
            }
            None if command.parameters.has_axis_words() => self.motion,
            _ => None,
        }
    }

    /// Distance mode in force for `command`, after its own G90/G91
    pub fn effective_distance(&self, command: &Command) -> DistanceMode {
        match command.g_code() {
            Some(Code::Absolute) => DistanceMode::Absolute,
            Some(Code::Incremental) => DistanceMode::Incremental,
            _ => self.distance,
        }
    }

    /// Apply `command`, returning the events it produced
    ///
    /// Words run in a fixed order: F, S and T first, then M codes other
    /// than program end, then the G code, then sticky motion for axis words
    /// no code consumed, and program end last.
    pub fn apply(&mut self, command: &Command) -> Outcome {
        let mut out = Outcome::default();
        let params = &command.parameters;
        let m_code = command.m_code();
        let g_code = command.g_code();

        let spindle_code = matches!(
            m_code,
            Some(Code::SpindleClockwise | Code::SpindleCounterClockwise | Code::SpindleStop)
        );
        self.apply_modal_words(params, spindle_code, &mut out);

        if let Some(code) = m_code.filter(|c| !c.is_program_end()) {
            self.apply_m_code(code, &mut out);
        }

        let mut axis_words_consumed = false;
        if let Some(code) = g_code {
            axis_words_consumed = consumes_axis_words(code);
            self.apply_g_code(code, params, &mut out);
        }

        if !axis_words_consumed && params.has_axis_words() {
            match self.motion {
                Some(kind) => self.execute_motion(kind, params, self.coordinate_system, &mut out),
                None => out.warnings.push(SemanticWarning::NoActiveMotion),
            }
        }

        if m_code.is_some_and(|c| c.is_program_end()) {
            out.events.push(EventKind::ProgramEnd);
        }

        out
    }

    fn apply_modal_words(&mut self, params: &Parameters, spindle_code: bool, out: &mut Outcome) {
        if let Some(value) = params.get('F') {
            if value < 0.0 {
                out.warnings.push(SemanticWarning::NegativeFeedRate { value });
            } else {
                self.feed = FeedRate {
                    value,
                    units: self.units,
                };
            }
        }

        if let Some(value) = params.get('S') {
            if value < 0.0 {
                out.warnings
                    .push(SemanticWarning::NegativeSpindleSpeed { value });
            } else {
                self.spindle_speed = value;
                if !spindle_code && self.spindle != SpindleDirection::Stopped {
                    out.events.push(self.spindle_event());
                }
            }
        }

        if let Some(value) = params.get('T') {
            if value < 0.0 || value.fract() != 0.0 || value > f64::from(u32::MAX) {
                out.warnings
                    .push(SemanticWarning::InvalidToolNumber { value });
            } else {
                self.tool = Some(value as u32);
            }
        }
    }

    fn spindle_event(&self) -> EventKind {
        let speed = match self.spindle {
            SpindleDirection::Stopped => 0.0,
            _ => self.spindle_speed,
        };
        EventKind::SpindleChange {
            speed,
            direction: self.spindle,
        }
    }

    fn apply_m_code(&mut self, code: Code, out: &mut Outcome) {
        match code {
            Code::Stop => out.events.push(EventKind::Pause { optional: false }),
            Code::OptionalStop => out.events.push(EventKind::Pause { optional: true }),
            Code::SpindleClockwise => {
                self.spindle = SpindleDirection::Clockwise;
                out.events.push(self.spindle_event());
            }
            Code::SpindleCounterClockwise => {
                self.spindle = SpindleDirection::CounterClockwise;
                out.events.push(self.spindle_event());
            }
            Code::SpindleStop => {
                self.spindle = SpindleDirection::Stopped;
                out.events.push(self.spindle_event());
            }
            Code::ToolChange => out.events.push(EventKind::ToolChange {
                tool: self.tool.unwrap_or(0),
            }),
            Code::Unrecognized { .. } => out.warnings.push(SemanticWarning::UnrecognizedCode {
                code: code.name(),
            }),
            _ => {}
        }
    }

    fn apply_g_code(&mut self, code: Code, params: &Parameters, out: &mut Outcome) {
        match code {
            Code::Rapid | Code::Linear | Code::ArcClockwise | Code::ArcCounterClockwise => {
                if let Some(kind) = MotionKind::from_code(code) {
                    self.motion = Some(kind);
                    if params.has_axis_words() {
                        self.execute_motion(kind, params, self.coordinate_system, out);
                    }
                }
            }
            Code::Dwell => match params.get('P') {
                Some(seconds) if seconds >= 0.0 => out.events.push(EventKind::Dwell { seconds }),
                _ => out.warnings.push(SemanticWarning::MissingDwellTime),
            },
            Code::SetWorkOffset => self.set_work_offset(params, out),
            Code::PlaneXY => self.plane = Plane::XY,
            Code::PlaneZX => self.plane = Plane::ZX,
            Code::PlaneYZ => self.plane = Plane::YZ,
            Code::Inches => self.units = Units::Inches,
            Code::Millimeters => self.units = Units::Millimeters,
            Code::MachineCoordinates => {
                if params.has_axis_words() {
                    match self.motion {
                        Some(kind) => {
                            self.execute_motion(kind, params, CoordinateSystem::Machine, out)
                        }
                        None => out.warnings.push(SemanticWarning::NoActiveMotion),
                    }
                }
            }
            Code::WorkCoordinates(slot) => self.coordinate_system = CoordinateSystem::Work(slot),
            Code::CancelMotion => self.motion = None,
            Code::Absolute => self.distance = DistanceMode::Absolute,
            Code::Incremental => self.distance = DistanceMode::Incremental,
            Code::Unrecognized { .. } => out.warnings.push(SemanticWarning::UnrecognizedCode {
                code: code.name(),
            }),
            _ => {}
        }
    }

    /// G10 L2 P<slot>: store work offsets, P0 meaning the active slot
    fn set_work_offset(&mut self, params: &Parameters, out: &mut Outcome) {
        if params.get('L') != Some(2.0) {
            out.warnings.push(SemanticWarning::UnsupportedOffsetMode);
            return;
        }

        let requested = params.get('P').unwrap_or(0.0);
        let slot = match (requested, self.coordinate_system) {
            (p, CoordinateSystem::Work(active)) if p == 0.0 => Some(usize::from(active)),
            (p, _) if p.fract() == 0.0 && (1.0..=WORK_SLOTS as f64).contains(&p) => {
                Some(p as usize)
            }
            _ => None,
        };
        let Some(offset) = slot
            .and_then(|s| s.checked_sub(1))
            .and_then(|i| self.offsets.get_mut(i))
        else {
            out.warnings.push(SemanticWarning::InvalidOffsetSlot);
            return;
        };

        for axis in Axis::ALL {
            if let Some(value) = params.get(axis.letter()) {
                offset[axis] = self.units.to_mm(value);
            }
        }
    }

    fn execute_motion(
        &mut self,
        kind: MotionKind,
        params: &Parameters,
        frame: CoordinateSystem,
        out: &mut Outcome,
    ) {
        let offset = self.frame_offset(frame);
        let start = self.position;
        let mut target = start;
        for axis in Axis::ALL {
            if let Some(value) = params.get(axis.letter()) {
                let value = self.units.to_mm(value);
                target[axis] = match self.distance {
                    DistanceMode::Absolute => value + offset[axis],
                    DistanceMode::Incremental => start[axis] + value,
                };
            }
        }

        let feed = match kind {
            MotionKind::Rapid => None,
            _ => {
                if self.feed.value == 0.0 {
                    out.warnings.push(SemanticWarning::ZeroFeedRate);
                }
                Some(self.feed.in_units(self.units))
            }
        };

        let arc = kind.is_arc().then(|| ArcGeometry {
            center: self
                .arc_center(kind, start, target, params, out)
                .map(|c| c.map(|v| self.units.from_mm(v))),
            plane: self.plane,
        });

        self.position = target;
        out.events.push(EventKind::Move(Move {
            kind,
            target: target.map(|v| self.units.from_mm(v)),
            feed,
            units: self.units,
            arc,
        }));
    }

    /// Arc centre in machine millimetres, from I/J/K offsets or an R radius
    fn arc_center(
        &self,
        kind: MotionKind,
        start: Position,
        target: Position,
        params: &Parameters,
        out: &mut Outcome,
    ) -> Option<Position> {
        let (a, b) = self.plane.axes();
        let offset_a = params.get(a.offset_letter());
        let offset_b = params.get(b.offset_letter());

        let mut center = start;
        if offset_a.is_some() || offset_b.is_some() {
            center[a] += self.units.to_mm(offset_a.unwrap_or(0.0));
            center[b] += self.units.to_mm(offset_b.unwrap_or(0.0));
            return Some(center);
        }

        let Some(r) = params.get('R') else {
            out.warnings.push(SemanticWarning::ArcWithoutCenter);
            return None;
        };

        let r = self.units.to_mm(r);
        let da = target[a] - start[a];
        let db = target[b] - start[b];
        let chord = da.hypot(db);
        if chord < LENGTH_EPSILON {
            out.warnings.push(SemanticWarning::DegenerateArc);
            return None;
        }

        let half = chord / 2.0;
        let radius = r.abs();
        let h = if radius + LENGTH_EPSILON < half {
            out.warnings.push(SemanticWarning::ArcRadiusTooSmall {
                radius: self.units.from_mm(radius),
                chord: self.units.from_mm(chord),
            });
            0.0
        } else {
            (radius * radius - half * half).max(0.0).sqrt()
        };

        // Centre lies left of the chord for G3 short arcs, right for G2;
        // a negative radius selects the long way round
        let mut side = match kind {
            MotionKind::ArcClockwise => -1.0,
            _ => 1.0,
        };
        if r < 0.0 {
            side = -side;
        }
        center[a] = start[a] + da / 2.0 - side * h * db / chord;
        center[b] = start[b] + db / 2.0 + side * h * da / chord;
        Some(center)
    }
}

/// G codes that take the line's axis words for themselves
fn consumes_axis_words(code: Code) -> bool {
    code.is_motion()
        || matches!(
            code,
            Code::SetWorkOffset
                | Code::MachineCoordinates
                | Code::Ignored { .. }
                | Code::Unrecognized { .. }
        )
}
