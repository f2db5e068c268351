use thiserror::Error;

/// Everything that can abort a report run.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// EDGAR answered, but not with a 2xx.
    #[error("Request to {url} failed [CODE: {status}]")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("Filing list for CIK {cik} has {found} 13F reports, need at least 2")]
    MissingFilings { cik: String, found: usize },

    #[error("No XML document at link position {position} in {url}")]
    MissingXmlLink { url: String, position: usize },

    #[error("Invalid request header: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),

    #[error("Invalid CSS selector: {0}")]
    Selector(String),

    #[error("Field '{field}' is not a number: {value:?}")]
    InvalidNumber { field: &'static str, value: String },

    #[error("Duplicate holding key {0} in one quarter")]
    DuplicateKey(String),

    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] rust_xlsxwriter::XlsxError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ReportError>;
