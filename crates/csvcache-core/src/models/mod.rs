//! Data models for csvcache.
//!
//! - `TabularDataset`: parsed header + rows, the unit that gets cached
//! - `ViewOptions`, `ViewMode`: typed per-request view configuration
//! - `HiddenColumns`, `TimelineColumns`: the two mode-specific parameter sets

pub mod dataset;
pub mod view;

pub use dataset::TabularDataset;
pub use view::{
    HiddenColumns, TimelineColumns, ViewMode, ViewOptions, ATTR_GROUPED_TIMELINE, ATTR_HIDE, ATTR_URL,
};
