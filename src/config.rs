use std::path::PathBuf;

pub const SEC_URL: &str = "https://www.sec.gov";
pub const SEC_HOST: &str = "www.sec.gov";
// EDGAR rejects requests without a browser-like agent
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/97.0.4692.99 Safari/537.36";
pub const OUTPUT_FILE: &str = "13F-data.xlsx";
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Zero-based position of the information table among the XML links of a
/// filing index page.
pub const XML_LINK_POSITION: usize = 3;

/// Settings shared by the fetcher and the writer. Built from the constants
/// above; there is no file or flag that overrides them.
#[derive(Debug, Clone)]
pub struct ReportConfig {
    pub base_url: String,
    pub host: String,
    pub user_agent: String,
    pub xml_link_position: usize,
    pub output_path: PathBuf,
}

impl Default for ReportConfig {
    fn default() -> Self {
        ReportConfig {
            base_url: SEC_URL.to_string(),
            host: SEC_HOST.to_string(),
            user_agent: USER_AGENT.to_string(),
            xml_link_position: XML_LINK_POSITION,
            output_path: PathBuf::from(OUTPUT_FILE),
        }
    }
}

impl ReportConfig {
    /// Join an href scraped from an EDGAR page onto the base URL.
    pub fn absolute_url(&self, href: &str) -> String {
        if href.starts_with("http://") || href.starts_with("https://") {
            href.to_string()
        } else if href.starts_with('/') {
            format!("{}{}", self.base_url, href)
        } else {
            format!("{}/{}", self.base_url, href)
        }
    }
}
