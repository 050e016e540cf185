use serde::{Deserialize, Serialize};

/// A parsed CSV file: a header and rows of exactly header width.
///
/// Built once by the parser and never mutated; a refresh replaces it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawDataset")]
pub struct TabularDataset {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

#[derive(Deserialize)]
struct RawDataset {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl TryFrom<RawDataset> for TabularDataset {
    type Error = String;

    fn try_from(raw: RawDataset) -> Result<Self, Self::Error> {
        TabularDataset::new(raw.header, raw.rows)
            .ok_or_else(|| "row width does not match header width".to_string())
    }
}

impl TabularDataset {
    /// Returns `None` if any row's width differs from the header's.
    pub fn new(header: Vec<String>, rows: Vec<Vec<String>>) -> Option<Self> {
        if rows.iter().any(|row| row.len() != header.len()) {
            return None;
        }
        Some(Self { header, rows })
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn width(&self) -> usize {
        self.header.len()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of the first header cell equal to `name` (both sides trimmed).
    pub fn column_index(&self, name: &str) -> Option<usize> {
        let name = name.trim();
        self.header.iter().position(|h| h.trim() == name)
    }
}
