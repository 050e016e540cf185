use std::collections::HashMap;

use crate::error::CsvCacheError;

/// Attribute selecting the CSV source.
pub const ATTR_URL: &str = "url";

/// Comma-separated column names to hide in table mode.
pub const ATTR_HIDE: &str = "hide";

/// Four comma-separated column names; presence switches to timeline mode.
pub const ATTR_GROUPED_TIMELINE: &str = "grouped-timeline";

/// Column names hidden from the table view, matched case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HiddenColumns {
    names: Vec<String>,
}

impl HiddenColumns {
    pub fn parse(list: &str) -> Self {
        let names = list
            .split(',')
            .map(|name| name.trim().to_lowercase())
            .filter(|name| !name.is_empty())
            .collect();
        Self { names }
    }

    pub fn contains(&self, column: &str) -> bool {
        let column = column.trim().to_lowercase();
        self.names.iter().any(|n| *n == column)
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Column references for the grouped timeline view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineColumns {
    pub id: String,
    pub label: String,
    pub value: String,
    pub unit: String,
}

impl TimelineColumns {
    /// Parses `"id,label,value,unit"`. Anything but four non-empty names fails.
    pub fn parse(list: &str) -> Result<Self, CsvCacheError> {
        let parts: Vec<&str> = list.split(',').map(str::trim).collect();
        match parts.as_slice() {
            [id, label, value, unit] if parts.iter().all(|p| !p.is_empty()) => Ok(Self {
                id: id.to_string(),
                label: label.to_string(),
                value: value.to_string(),
                unit: unit.to_string(),
            }),
            _ => Err(CsvCacheError::InvalidTimelineParams),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewMode {
    Table { hidden: HiddenColumns },
    Timeline(TimelineColumns),
}

/// Validated view configuration for one render request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewOptions {
    pub url: String,
    pub mode: ViewMode,
}

impl ViewOptions {
    /// Builds options from loose `key=value` attributes.
    ///
    /// Keys are case-insensitive and unknown keys are ignored. A missing or
    /// blank `url` falls back to `default_url`.
    pub fn from_attrs(
        attrs: &HashMap<String, String>,
        default_url: &str,
    ) -> Result<Self, CsvCacheError> {
        let attr = |key: &str| {
            attrs
                .iter()
                .find(|(k, _)| k.trim().eq_ignore_ascii_case(key))
                .map(|(_, v)| v.as_str())
        };

        let url = attr(ATTR_URL)
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .unwrap_or(default_url)
            .to_string();

        let mode = match attr(ATTR_GROUPED_TIMELINE) {
            Some(list) => ViewMode::Timeline(TimelineColumns::parse(list)?),
            None => ViewMode::Table {
                hidden: HiddenColumns::parse(attr(ATTR_HIDE).unwrap_or("")),
            },
        };

        Ok(Self { url, mode })
    }
}
