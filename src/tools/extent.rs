use serde::{Deserialize, Serialize};

use super::ToolError;
use crate::interpreter::{InterpretedEvent, Units};

/// XY bounding box of a program's move targets
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Extent {
    fn point(x: f64, y: f64) -> Self {
        Self {
            min_x: x,
            min_y: y,
            max_x: x,
            max_y: y,
        }
    }

    fn include(&mut self, x: f64, y: f64) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }
}

/// Extent of all move targets, expressed in `units`
///
/// Arc end points are included; the bulge of an arc between them is not.
pub fn extent<'a, I>(events: I, units: Units) -> Result<Extent, ToolError>
where
    I: IntoIterator<Item = &'a InterpretedEvent>,
{
    events
        .into_iter()
        .filter_map(InterpretedEvent::as_move)
        .map(|m| {
            (
                units.convert(m.target.x, m.units),
                units.convert(m.target.y, m.units),
            )
        })
        .fold(None, |acc: Option<Extent>, (x, y)| match acc {
            Some(mut extent) => {
                extent.include(x, y);
                Some(extent)
            }
            None => Some(Extent::point(x, y)),
        })
        .ok_or(ToolError::EmptyExtent)
}
