//! Render entry point.
//!
//! Turns loose view attributes into a rendered widget. Failures never
//! escape: they are logged and replaced by an inert HTML comment.

use std::collections::HashMap;

use anyhow::Result;
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::cache::{self, FileCache, FileOptionStore, OptionStore, TtlCache};
use crate::config::Config;
use crate::error::CsvCacheError;
use crate::fetch::{HttpFetch, ReqwestFetcher};
use crate::models::{ViewMode, ViewOptions};
use crate::render::table::{render_table, TableView};
use crate::render::timeline::{render_timeline, GroupedSeries};
use crate::render::placeholder;
use crate::source::DataSource;

/// DOM id for the widget built from `options`.
///
/// Derived from the source and the full view mode, so different views of one
/// source can share a page while re-rendering the same view keeps its id.
pub fn widget_id(options: &ViewOptions) -> String {
    let kind = match options.mode {
        ViewMode::Table { .. } => "table",
        ViewMode::Timeline(_) => "timeline",
    };
    let digest = cache::fingerprint(&format!("{}\n{:?}", options.url, options.mode));
    format!("csvcache-{}-{}", kind, &digest[..12])
}

/// Build the production view from `config` and render `attrs` with it.
///
/// Like [`CsvView::render_view`] this never fails: a setup error, such as an
/// invalid refresh window, is logged and rendered as a placeholder.
pub async fn render_configured(config: &Config, attrs: &HashMap<String, String>) -> String {
    match CsvView::from_config(config) {
        Ok(view) => view.render_view(attrs).await,
        Err(e) => {
            let err = setup_failure(e);
            warn!(error = %err, code = err.code(), "Could not set up view");
            placeholder(&err)
        }
    }
}

fn setup_failure(e: anyhow::Error) -> CsvCacheError {
    match e.downcast::<CsvCacheError>() {
        Ok(err) => err,
        Err(other) => CsvCacheError::SetupError(format!("{:#}", other)),
    }
}

/// Subdirectory of the cache dir holding dataset entries.
const DATA_DIR: &str = "data";

/// Option store file inside the cache dir.
const OPTIONS_FILE: &str = "options.json";

pub struct CsvView<F, C, S> {
    source: DataSource<F, C, S>,
    default_url: String,
}

impl CsvView<ReqwestFetcher, FileCache, FileOptionStore> {
    /// Production wiring: reqwest fetcher and file stores under the cache dir.
    pub fn from_config(config: &Config) -> Result<Self> {
        // validated before anything touches the disk
        let window = config.window()?;
        let cache_dir = config.cache_dir()?;
        let source = DataSource::new(
            ReqwestFetcher::new()?,
            FileCache::new(cache_dir.join(DATA_DIR))?,
            FileOptionStore::new(cache_dir.join(OPTIONS_FILE))?,
        )
        .with_window(window)
        .with_max_rows(config.max_rows)
        .with_timeout(config.request_timeout());

        Ok(Self::new(source, &config.default_url))
    }
}

impl<F, C, S> CsvView<F, C, S>
where
    F: HttpFetch,
    C: TtlCache,
    S: OptionStore,
{
    pub fn new(source: DataSource<F, C, S>, default_url: &str) -> Self {
        Self {
            source,
            default_url: default_url.to_string(),
        }
    }

    pub fn source(&self) -> &DataSource<F, C, S> {
        &self.source
    }

    pub fn default_url(&self) -> &str {
        &self.default_url
    }

    /// Render the view described by `attrs`, or a placeholder on failure.
    pub async fn render_view(&self, attrs: &HashMap<String, String>) -> String {
        match self.try_render_view(attrs, Utc::now()).await {
            Ok(html) => html,
            Err(e) => {
                warn!(error = %e, code = e.code(), "Render failed");
                placeholder(&e)
            }
        }
    }

    /// Render the view described by `attrs` as of `now`.
    pub async fn try_render_view(
        &self,
        attrs: &HashMap<String, String>,
        now: DateTime<Utc>,
    ) -> Result<String, CsvCacheError> {
        let options = ViewOptions::from_attrs(attrs, &self.default_url)?;
        let dataset = self.source.load(&options.url, now).await?;

        let id = widget_id(&options);

        let html = match &options.mode {
            ViewMode::Table { hidden } => {
                let view = TableView::build(&dataset, hidden);
                debug!(columns = view.header().len(), rows = view.rows().len(), "Rendering table");
                render_table(&view, &id)
            }
            ViewMode::Timeline(columns) => {
                let series = GroupedSeries::build(&dataset, columns)?;
                debug!(groups = series.groups().len(), "Rendering timeline");
                render_timeline(&series, &id)
            }
        };
        Ok(html)
    }
}
