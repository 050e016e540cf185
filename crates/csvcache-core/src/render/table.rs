//! Sortable, paginated table view.
//!
//! `TableView` is the server-side projection. `SortState`, `compare_cells`
//! and `Pagination` describe the client behaviour; the inline script in
//! [`super::assets::TABLE_SCRIPT`] implements the same rules.

use std::cmp::Ordering;
use std::ops::Range;

use super::assets::{TABLE_SCRIPT, WIDGET_STYLE};
use super::html::Html;
use crate::models::{HiddenColumns, TabularDataset};

/// Page sizes offered in the page-size selector.
pub const PAGE_SIZES: [usize; 4] = [15, 25, 50, 100];

pub const DEFAULT_PAGE_SIZE: usize = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Unsorted,
    Ascending,
    Descending,
}

impl SortDirection {
    /// Next state on a header click: unsorted, then ascending and descending
    /// alternately. There is no way back to unsorted.
    pub fn next(&self) -> Self {
        match self {
            SortDirection::Unsorted => SortDirection::Ascending,
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

/// Which column is sorted, and how.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SortState {
    column: Option<usize>,
    direction: SortDirection,
}

impl SortState {
    /// Clicking the sorted column flips it; any other column starts ascending.
    pub fn click(&mut self, column: usize) {
        if self.column == Some(column) {
            self.direction = self.direction.next();
        } else {
            self.column = Some(column);
            self.direction = SortDirection::Unsorted.next();
        }
    }

    pub fn column(&self) -> Option<usize> {
        self.column
    }

    pub fn direction(&self) -> SortDirection {
        self.direction
    }
}

fn parse_number(cell: &str) -> Option<f64> {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Numeric order when both cells are finite numbers, raw string order otherwise.
pub fn compare_cells(a: &str, b: &str) -> Ordering {
    match (parse_number(a), parse_number(b)) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        _ => a.cmp(b),
    }
}

/// Client-side page position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    page_size: usize,
    page: usize,
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl Pagination {
    /// Sizes outside [`PAGE_SIZES`] fall back to the default.
    pub fn new(page_size: usize) -> Self {
        let page_size = if PAGE_SIZES.contains(&page_size) {
            page_size
        } else {
            DEFAULT_PAGE_SIZE
        };
        Self { page_size, page: 0 }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn page(&self) -> usize {
        self.page
    }

    /// At least one page, even for an empty table.
    pub fn page_count(&self, total: usize) -> usize {
        total.div_ceil(self.page_size).max(1)
    }

    pub fn set_page(&mut self, page: usize, total: usize) {
        self.page = page.min(self.page_count(total) - 1);
    }

    pub fn next(&mut self, total: usize) {
        self.set_page(self.page + 1, total);
    }

    pub fn prev(&mut self) {
        self.page = self.page.saturating_sub(1);
    }

    /// Row indices shown on the current page.
    pub fn range(&self, total: usize) -> Range<usize> {
        let start = (self.page * self.page_size).min(total);
        let end = (start + self.page_size).min(total);
        start..end
    }
}

/// The table after hidden columns are projected away.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableView {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl TableView {
    pub fn build(dataset: &TabularDataset, hidden: &HiddenColumns) -> Self {
        let keep: Vec<usize> = dataset
            .header()
            .iter()
            .enumerate()
            .filter(|(_, name)| !hidden.contains(name))
            .map(|(i, _)| i)
            .collect();

        let project = |row: &[String]| keep.iter().map(|&i| row[i].clone()).collect::<Vec<_>>();

        Self {
            header: project(dataset.header()),
            rows: dataset.rows().iter().map(|row| project(row.as_slice())).collect(),
        }
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Rows in display order for `state`. Stable, so ties keep source order.
    pub fn sorted(&self, state: &SortState) -> Vec<&[String]> {
        let mut rows: Vec<&[String]> = self.rows.iter().map(|r| r.as_slice()).collect();
        let Some(column) = state.column().filter(|&c| c < self.header.len()) else {
            return rows;
        };
        match state.direction() {
            SortDirection::Unsorted => {}
            SortDirection::Ascending => rows.sort_by(|a, b| compare_cells(&a[column], &b[column])),
            SortDirection::Descending => rows.sort_by(|a, b| compare_cells(&b[column], &a[column])),
        }
        rows
    }
}

/// Serialise a table view as a self-contained widget.
pub fn render_table(view: &TableView, widget_id: &str) -> String {
    let mut w = Html::new();

    w.push("<div class=\"csvcache csvcache-table\" id=\"");
    w.text(widget_id);
    w.push("\">");

    w.push("<div class=\"csvcache-controls\"><label>Rows per page <select class=\"csvcache-page-size\">");
    for size in PAGE_SIZES {
        let selected = if size == DEFAULT_PAGE_SIZE { " selected" } else { "" };
        w.push(format!("<option value=\"{size}\"{selected}>{size}</option>"));
    }
    w.push("</select></label>");
    w.push(format!(
        "<span class=\"csvcache-count\">{} rows</span></div>",
        view.rows().len()
    ));

    w.push("<div class=\"csvcache-scroll\"><table><thead><tr>");
    for (i, name) in view.header().iter().enumerate() {
        w.push(format!("<th data-col=\"{i}\" aria-sort=\"none\" tabindex=\"0\">"));
        w.text(name);
        w.push("</th>");
    }
    w.push("</tr></thead><tbody>");
    for row in view.rows() {
        w.push("<tr>");
        for cell in row {
            w.push("<td>");
            w.text(cell);
            w.push("</td>");
        }
        w.push("</tr>");
    }
    w.push("</tbody></table></div>");

    w.push(
        "<div class=\"csvcache-pager\">\
         <button type=\"button\" class=\"csvcache-prev\">Previous</button>\
         <span class=\"csvcache-page-info\"></span>\
         <button type=\"button\" class=\"csvcache-next\">Next</button>\
         </div></div>",
    );

    w.push("<style>");
    w.push(WIDGET_STYLE);
    w.push("</style><script>");
    w.push(TABLE_SCRIPT);
    w.push("</script>");

    w.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset() -> TabularDataset {
        let s = |cells: &[&str]| cells.iter().map(|c| c.to_string()).collect::<Vec<_>>();
        TabularDataset::new(
            s(&["Item", "Price", "Qty", "Note"]),
            vec![
                s(&["Rice", "10", "3", "a"]),
                s(&["Oil", "9", "12", "b"]),
                s(&["Salt", "100", "1", "c"]),
            ],
        )
        .unwrap()
    }

    fn column(rows: &[&[String]], i: usize) -> Vec<String> {
        rows.iter().map(|r| r[i].clone()).collect()
    }

    #[test]
    fn test_hide_column_case_insensitive() {
        let view = TableView::build(&dataset(), &HiddenColumns::parse("price"));
        assert_eq!(view.header(), &["Item", "Qty", "Note"]);
        assert_eq!(view.rows()[0], vec!["Rice", "3", "a"]);
        assert!(view.rows().iter().all(|r| r.len() == 3));
    }

    #[test]
    fn test_hide_nothing_and_unknown() {
        let all = TableView::build(&dataset(), &HiddenColumns::default());
        assert_eq!(all.header().len(), 4);
        let unknown = TableView::build(&dataset(), &HiddenColumns::parse("Colour"));
        assert_eq!(unknown, all);
    }

    #[test]
    fn test_sort_direction_cycle() {
        let mut state = SortState::default();
        assert_eq!(state.direction(), SortDirection::Unsorted);
        state.click(1);
        assert_eq!(state.direction(), SortDirection::Ascending);
        state.click(1);
        assert_eq!(state.direction(), SortDirection::Descending);
        state.click(1);
        assert_eq!(state.direction(), SortDirection::Ascending);
        state.click(2);
        assert_eq!((state.column(), state.direction()), (Some(2), SortDirection::Ascending));
    }

    #[test]
    fn test_compare_cells_numeric_or_lexicographic() {
        assert_eq!(compare_cells("9", "10"), Ordering::Less);
        assert_eq!(compare_cells(" 2.5 ", "-1"), Ordering::Greater);
        assert_eq!(compare_cells("9", "10a"), Ordering::Greater);
        assert_eq!(compare_cells("", "1"), Ordering::Less);
        assert_eq!(compare_cells("NaN", "1"), Ordering::Greater);
        assert_eq!(compare_cells("+1.5e1", "9"), Ordering::Greater);
        assert_eq!(compare_cells(".5", "1."), Ordering::Less);
    }

    #[test]
    fn test_compare_cells_radix_literals_are_text() {
        // numerically 16 > 9, as text "0x10" < "9"
        assert_eq!(compare_cells("0x10", "9"), Ordering::Less);
        assert_eq!(compare_cells("0b1", "0"), Ordering::Greater);
        assert_eq!(compare_cells("0o7", "10"), Ordering::Less);
    }

    #[test]
    fn test_sorted_numeric_column() {
        let view = TableView::build(&dataset(), &HiddenColumns::default());
        let mut state = SortState::default();
        state.click(1);
        assert_eq!(column(&view.sorted(&state), 1), vec!["9", "10", "100"]);
        state.click(1);
        assert_eq!(column(&view.sorted(&state), 1), vec!["100", "10", "9"]);
    }

    #[test]
    fn test_descending_reverses_ascending_for_distinct_keys() {
        let view = TableView::build(&dataset(), &HiddenColumns::default());
        let mut state = SortState::default();
        state.click(0);
        let asc = view.sorted(&state);
        state.click(0);
        let mut desc = view.sorted(&state);
        desc.reverse();
        assert_eq!(asc, desc);

        // sorting twice the same way is idempotent
        state.click(0);
        assert_eq!(view.sorted(&state), asc);
    }

    #[test]
    fn test_unsorted_keeps_source_order() {
        let view = TableView::build(&dataset(), &HiddenColumns::default());
        let rows = view.sorted(&SortState::default());
        assert_eq!(column(&rows, 0), vec!["Rice", "Oil", "Salt"]);
    }

    #[test]
    fn test_pagination() {
        let mut p = Pagination::default();
        assert_eq!(p.page_size(), 15);
        assert_eq!(p.page_count(0), 1);
        assert_eq!(p.page_count(31), 3);
        assert_eq!(p.range(31), 0..15);
        p.next(31);
        p.next(31);
        assert_eq!(p.range(31), 30..31);
        p.next(31);
        assert_eq!(p.page(), 2);
        p.prev();
        assert_eq!(p.page(), 1);
        p.set_page(99, 31);
        assert_eq!(p.page(), 2);

        assert_eq!(Pagination::new(50).page_size(), 50);
        assert_eq!(Pagination::new(7).page_size(), 15);
    }

    #[test]
    fn test_render_escapes_cells() {
        let ds = TabularDataset::new(
            vec!["<b>Name</b>".into()],
            vec![vec!["<script>alert(1)</script>".into()]],
        )
        .unwrap();
        let html = render_table(&TableView::build(&ds, &HiddenColumns::default()), "t1");
        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
        assert!(html.contains("&lt;b&gt;Name&lt;/b&gt;"));
        assert!(!html.contains("<script>alert"));
        assert!(html.contains("<option value=\"15\" selected>15</option>"));
        assert!(html.contains("<option value=\"100\">100</option>"));
        assert!(html.contains("id=\"t1\""));
    }
}
