//! Input/output helpers.
//!
//! - record JSON export/import (`export`)
//! - chart raster output (`export`)

pub mod export;

pub use export::*;
