//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - query descriptors (`QueryKey`, `QuerySpec`, `DateWindow`)
//! - the merged page record (`MergedRecord`, `DailyViews`)
//! - chart inputs (`SeriesPoint`, `ChartConfig`)

pub mod types;

pub use types::*;
