//! CSV text to [`TabularDataset`].
//!
//! Comma-separated fields with double-quote quoting only. Rows whose width
//! differs from the header are dropped, not reported.

use ::csv::{ReaderBuilder, StringRecord};
use tracing::debug;

use crate::error::CsvCacheError;
use crate::models::TabularDataset;

/// Maximum number of data rows kept from one body.
/// The tail is kept, since sources append rows chronologically.
pub const MAX_ROWS: usize = 1500;

/// Parse a fetched body into a dataset, keeping at most `max_rows` rows.
pub fn parse_csv(body: &str, max_rows: usize) -> Result<TabularDataset, CsvCacheError> {
    let body = body.trim_start_matches('\u{feff}').trim();

    let mut lines = body
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .filter(|line| !line.trim().is_empty());

    let header: Vec<String> = match lines.next() {
        Some(line) => read_fields(line)
            .ok_or(CsvCacheError::MalformedCsv)?
            .into_iter()
            .map(|h| h.trim().to_string())
            .collect(),
        None => return Err(CsvCacheError::MalformedCsv),
    };
    if header.iter().all(|h| h.is_empty()) {
        return Err(CsvCacheError::MalformedCsv);
    }

    let candidates: Vec<&str> = lines.collect();
    let skip = candidates.len().saturating_sub(max_rows);

    let mut dropped = 0usize;
    let rows: Vec<Vec<String>> = candidates[skip..]
        .iter()
        .filter_map(|line| match read_fields(line) {
            Some(fields) if fields.len() == header.len() => Some(fields),
            _ => {
                dropped += 1;
                None
            }
        })
        .collect();

    debug!(
        candidates = candidates.len(),
        truncated = skip,
        dropped,
        kept = rows.len(),
        "Parsed CSV body"
    );

    if rows.is_empty() {
        return Err(CsvCacheError::MalformedCsv);
    }

    TabularDataset::new(header, rows).ok_or(CsvCacheError::MalformedCsv)
}

/// Fields of one line, or `None` if the line is not a readable record.
///
/// Double-quote quoting applies, with `""` as a literal quote inside a
/// quoted field. Field counts are not checked here.
fn read_fields(line: &str) -> Option<Vec<String>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(line.as_bytes());

    let mut record = StringRecord::new();
    match rdr.read_record(&mut record) {
        Ok(true) => Some(record.iter().map(str::to_string).collect()),
        Ok(false) => None,
        Err(e) => {
            debug!(error = %e, "Unreadable CSV line");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_fields_quotes() {
        assert_eq!(read_fields("a,b,c").unwrap(), vec!["a", "b", "c"]);
        assert_eq!(read_fields(r#""a,b",c"#).unwrap(), vec!["a,b", "c"]);
        assert_eq!(read_fields(r#""say ""hi""",x"#).unwrap(), vec![r#"say "hi""#, "x"]);
        assert_eq!(read_fields("a,,").unwrap(), vec!["a", "", ""]);
    }

    #[test]
    fn test_parse_quoted_fields() {
        let body = "name,note\n\"Oil, olive\",\"said \"\"hi\"\"\"\nSalt,plain\n";
        let ds = parse_csv(body, MAX_ROWS).unwrap();
        assert_eq!(ds.rows()[0], vec!["Oil, olive", r#"said "hi""#]);
        assert_eq!(ds.rows()[1], vec!["Salt", "plain"]);
    }

    #[test]
    fn test_parse_drops_wrong_width_rows() {
        let body = "date,name,price\n2024-01-01,Rice,100\n2024-01-02,Rice\n2024-01-03,\"Oil, olive\",200\n1,2,3,4\n";
        let ds = parse_csv(body, MAX_ROWS).unwrap();
        assert_eq!(ds.header(), &["date", "name", "price"]);
        assert_eq!(ds.len(), 2);
        assert!(ds.rows().iter().all(|r| r.len() == 3));
        assert_eq!(ds.rows()[1][1], "Oil, olive");
    }

    #[test]
    fn test_parse_skips_blank_lines_and_crlf() {
        let body = "\r\n\na,b\r\n\r\n1,2\r\n   \r\n3,4\r\n";
        let ds = parse_csv(body, MAX_ROWS).unwrap();
        assert_eq!(ds.header(), &["a", "b"]);
        assert_eq!(ds.rows(), &[vec!["1", "2"], vec!["3", "4"]]);
    }

    #[test]
    fn test_parse_keeps_last_rows_over_cap() {
        let mut body = String::from("n,v\n");
        for i in 0..2000 {
            body.push_str(&format!("{},x\n", i));
        }
        let ds = parse_csv(&body, MAX_ROWS).unwrap();
        assert_eq!(ds.len(), 1500);
        assert_eq!(ds.rows()[0][0], "500");
        assert_eq!(ds.rows()[1499][0], "1999");
    }

    #[test]
    fn test_parse_cap_applies_before_width_filter() {
        let body = "a,b\n1,2\n3,4\nbad\n";
        let ds = parse_csv(body, 2).unwrap();
        assert_eq!(ds.rows(), &[vec!["3", "4"]]);
    }

    #[test]
    fn test_parse_failures() {
        assert_eq!(parse_csv("", MAX_ROWS), Err(CsvCacheError::MalformedCsv));
        assert_eq!(parse_csv("a,b\n", MAX_ROWS), Err(CsvCacheError::MalformedCsv));
        assert_eq!(parse_csv("a,b\n1\n2,3,4", MAX_ROWS), Err(CsvCacheError::MalformedCsv));
        assert_eq!(parse_csv(" , \n1,2", MAX_ROWS), Err(CsvCacheError::MalformedCsv));
    }

    #[test]
    fn test_parse_strips_bom() {
        let ds = parse_csv("\u{feff}date,v\n2024-01-01,1", MAX_ROWS).unwrap();
        assert_eq!(ds.header()[0], "date");
    }
}
