//! Core library for csvcache.
//!
//! Fetches a remote CSV file, keeps it in a TTL cache that is refreshed at
//! most once a day after a fixed cutoff, and renders it either as a sortable,
//! paginated table or as a grouped timeline with per-group charts.
//!
//! Modules, leaves first:
//! - `security`: SSRF guard for target URLs
//! - `csv`: header + row matrix parsing with malformed-row rejection
//! - `freshness`: daily cutoff refresh decision
//! - `fetch`, `cache`: injected HTTP, TTL cache and option store collaborators
//! - `source`: the fetch-cache orchestrator
//! - `render`: table and timeline view models and their HTML
//! - `service`: option parsing, orchestration and error placeholders
//! - `config`, `update`: on-disk settings and the release check

pub mod cache;
pub mod config;
pub mod csv;
pub mod error;
pub mod fetch;
pub mod freshness;
pub mod models;
pub mod render;
pub mod security;
pub mod service;
pub mod source;
pub mod update;

pub use config::Config;
pub use error::CsvCacheError;
pub use freshness::FreshnessWindow;
pub use models::{TabularDataset, ViewMode, ViewOptions};
pub use service::CsvView;
pub use source::DataSource;
