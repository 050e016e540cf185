//! View rendering.
//!
//! Each view is split into a pure view model (`TableView`, `GroupedSeries`)
//! and a thin HTML serialiser. The serialised widgets are self-contained:
//! data is inline, and sorting, paging and tab switching run client-side.

pub mod assets;
pub mod html;
pub mod table;
pub mod timeline;

pub use html::{escape, placeholder};
pub use table::{compare_cells, Pagination, SortDirection, SortState, TableView};
pub use timeline::{ChartState, GroupedSeries, SeriesGroup, SeriesPoint, TimelineWidget};
