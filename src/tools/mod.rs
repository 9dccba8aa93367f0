//! Program utilities built on the interpreter
//!
//! XY extent of a program, and text rewrites that translate or mirror its
//! motion coordinates.

pub mod extent;
pub mod transform;

pub use extent::{extent, Extent};
pub use transform::{mirror, translate, Rendered};

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ToolError {
    #[error("Found empty extent (program contains no moves)")]
    EmptyExtent,
}
