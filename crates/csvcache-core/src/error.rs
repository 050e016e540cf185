use thiserror::Error;

/// Failures a render request can end in.
///
/// Display strings are shown in logs only. Viewers get the inert
/// placeholder built from [`CsvCacheError::code`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CsvCacheError {
    #[error("URL rejected by safety check")]
    UnsafeUrl,

    #[error("Clock or timezone error: {0}")]
    TimeError(String),

    #[error("Could not fetch CSV source")]
    FetchError,

    #[error("CSV source returned an empty body")]
    EmptyBody,

    #[error("CSV data is malformed")]
    MalformedCsv,

    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    #[error("grouped-timeline needs exactly 4 comma-separated column names")]
    InvalidTimelineParams,

    #[error("Could not set up the view: {0}")]
    SetupError(String),
}

impl CsvCacheError {
    pub fn time(detail: impl Into<String>) -> Self {
        CsvCacheError::TimeError(detail.into())
    }

    /// Short fixed tag, safe to embed in page output.
    pub fn code(&self) -> &'static str {
        match self {
            CsvCacheError::UnsafeUrl => "unsafe_url",
            CsvCacheError::TimeError(_) => "time_error",
            CsvCacheError::FetchError => "fetch_error",
            CsvCacheError::EmptyBody => "empty_body",
            CsvCacheError::MalformedCsv => "malformed_csv",
            CsvCacheError::UnknownColumn(_) => "unknown_column",
            CsvCacheError::InvalidTimelineParams => "invalid_timeline_params",
            CsvCacheError::SetupError(_) => "setup_error",
        }
    }
}
