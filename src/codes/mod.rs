//! Recognized-code tables
//!
//! A code table lists the G/M codes a program may use and the parameters
//! each one accepts. Tables are TOML files; the `core` table is embedded.

pub mod registry;
pub mod schema;
pub mod validate;

pub use registry::{CodeRegistry, LoadedTable, TablePriority};
pub use schema::{
    normalize_code_name, CodeDef, CodeTable, CodeTableFile, ParameterConstraints, ParameterDef,
    ParameterType, TableMeta,
};
