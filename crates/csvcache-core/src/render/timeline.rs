//! Grouped timeline view.
//!
//! Rows are grouped by an id column. Each group shows its latest value and a
//! line chart of the most recent records. Only one group is visible at a
//! time and a group's chart is built the first time it is shown.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, warn};

use super::assets::{TIMELINE_SCRIPT, WIDGET_STYLE};
use super::html::{json_for_script, Html};
use crate::error::CsvCacheError;
use crate::models::{TabularDataset, TimelineColumns};

/// Records shown in each group's chart.
pub const HISTORY_LEN: usize = 7;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub date: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeriesGroup {
    pub key: String,
    pub label: String,
    pub unit: String,
    /// Newest first.
    pub records: Vec<SeriesPoint>,
}

impl SeriesGroup {
    pub fn latest(&self) -> Option<&SeriesPoint> {
        self.records.first()
    }

    /// The newest [`HISTORY_LEN`] records, oldest first.
    pub fn recent_history(&self) -> Vec<SeriesPoint> {
        let mut history: Vec<SeriesPoint> =
            self.records.iter().take(HISTORY_LEN).cloned().collect();
        history.reverse();
        history
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct GroupedSeries {
    groups: Vec<SeriesGroup>,
}

fn resolve(dataset: &TabularDataset, name: &str) -> Result<usize, CsvCacheError> {
    dataset
        .column_index(name)
        .ok_or_else(|| CsvCacheError::UnknownColumn(name.to_string()))
}

impl GroupedSeries {
    /// Group `dataset` rows by `columns.id`, in first-seen order.
    ///
    /// The first column is taken as the row's ISO date. Label and unit come
    /// from each group's first row; later rows are not checked against them.
    /// Rows whose value is not a finite number are left out of the series.
    pub fn build(dataset: &TabularDataset, columns: &TimelineColumns) -> Result<Self, CsvCacheError> {
        let id_col = resolve(dataset, &columns.id)?;
        let label_col = resolve(dataset, &columns.label)?;
        let value_col = resolve(dataset, &columns.value)?;
        let unit_col = resolve(dataset, &columns.unit)?;

        let mut groups: Vec<SeriesGroup> = Vec::new();
        let mut index: HashMap<&str, usize> = HashMap::new();
        let mut skipped = 0usize;

        for row in dataset.rows() {
            let key = row[id_col].as_str();
            let slot = *index.entry(key).or_insert_with(|| {
                groups.push(SeriesGroup {
                    key: key.to_string(),
                    label: row[label_col].clone(),
                    unit: row[unit_col].clone(),
                    records: Vec::new(),
                });
                groups.len() - 1
            });

            match row[value_col].trim().parse::<f64>() {
                Ok(value) if value.is_finite() => groups[slot].records.push(SeriesPoint {
                    date: row[0].trim().to_string(),
                    value,
                }),
                _ => skipped += 1,
            }
        }

        for group in &mut groups {
            group.records.sort_by(|a, b| b.date.cmp(&a.date));
        }

        debug!(groups = groups.len(), skipped, "Grouped timeline rows");
        Ok(Self { groups })
    }

    pub fn groups(&self) -> &[SeriesGroup] {
        &self.groups
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChartState {
    #[default]
    Uninitialized,
    Initialized,
}

/// Tab selection and lazy chart initialisation for one timeline widget.
///
/// The inline script in [`TIMELINE_SCRIPT`] follows the same state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineWidget {
    active: Option<usize>,
    charts: Vec<ChartState>,
}

impl TimelineWidget {
    /// A widget on page load: the first group is active and its chart built.
    pub fn new(group_count: usize) -> Self {
        let mut widget = Self {
            active: None,
            charts: vec![ChartState::Uninitialized; group_count],
        };
        widget.activate(0);
        widget
    }

    /// Make group `index` active. Returns true if its chart was built by
    /// this call; re-activating a group never rebuilds it.
    pub fn activate(&mut self, index: usize) -> bool {
        let Some(chart) = self.charts.get_mut(index) else {
            return false;
        };
        self.active = Some(index);
        if *chart == ChartState::Uninitialized {
            *chart = ChartState::Initialized;
            true
        } else {
            false
        }
    }

    pub fn active(&self) -> Option<usize> {
        self.active
    }

    pub fn chart_state(&self, index: usize) -> Option<ChartState> {
        self.charts.get(index).copied()
    }
}

/// Chart payload for one group.
#[derive(Serialize)]
struct ChartSeries<'a> {
    label: &'a str,
    unit: &'a str,
    history: Vec<SeriesPoint>,
}

/// Serialise grouped series as a tabbed chart widget.
pub fn render_timeline(series: &GroupedSeries, widget_id: &str) -> String {
    let widget = TimelineWidget::new(series.groups().len());
    let mut w = Html::new();

    w.push("<div class=\"csvcache csvcache-timeline\" id=\"");
    w.text(widget_id);
    w.push("\">");

    w.push("<div class=\"csvcache-tabs\" role=\"tablist\">");
    for (i, group) in series.groups().iter().enumerate() {
        let active = widget.active() == Some(i);
        w.push(format!(
            "<button type=\"button\" role=\"tab\" aria-selected=\"{}\"{}>",
            active,
            if active { " class=\"active\"" } else { "" }
        ));
        w.text(&group.label);
        w.push("</button>");
    }
    w.push("</div>");

    for (i, group) in series.groups().iter().enumerate() {
        let hidden = if widget.active() == Some(i) { "" } else { " hidden" };
        w.push(format!("<div class=\"csvcache-panel\" role=\"tabpanel\"{hidden}>"));
        w.push("<div class=\"csvcache-latest\">");
        match group.latest() {
            Some(latest) => {
                w.push("<span class=\"csvcache-value\">");
                w.text(latest.value.to_string());
                w.push("</span> <span class=\"csvcache-unit\">");
                w.text(&group.unit);
                w.push("</span> <span class=\"csvcache-date\">");
                w.text(&latest.date);
                w.push("</span>");
            }
            None => w.push("<span class=\"csvcache-empty\">No data</span>"),
        }
        w.push("</div><canvas width=\"600\" height=\"240\"></canvas></div>");
    }

    let payload: Vec<ChartSeries> = series
        .groups()
        .iter()
        .map(|g| ChartSeries {
            label: &g.label,
            unit: &g.unit,
            history: g.recent_history(),
        })
        .collect();
    let json = json_for_script(&payload).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to serialise timeline series");
        "[]".to_string()
    });
    w.push("<script type=\"application/json\" class=\"csvcache-series\">");
    w.push(json);
    w.push("</script></div>");

    w.push("<style>");
    w.push(WIDGET_STYLE);
    w.push("</style><script>");
    w.push(TIMELINE_SCRIPT);
    w.push("</script>");

    w.finish()
}
