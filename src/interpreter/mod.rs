//! Modal state and program interpretation

pub mod engine;
pub mod event;
pub mod state;

pub use engine::{interpret, Interpretation, Interpreter, InterpreterOptions};
pub use event::{ArcGeometry, EventKind, InterpretedEvent, Move};
pub use state::{
    Axis, CoordinateSystem, DistanceMode, FeedRate, ModalState, MotionKind, Outcome,
    ParseModalError, Plane, Position, SpindleDirection, Units, WORK_SLOTS,
};
