//! EDGAR filing retrieval
//!
//! This module handles:
//! - Building the 13F-HR filing list URL for a CIK
//! - Picking the two most recent filing index pages
//! - Locating and downloading each filing's information table XML

use crate::config::ReportConfig;
use crate::error::{ReportError, Result};
use crate::holdings::{extract_holdings, HoldingsTable};
use reqwest::header::{HeaderMap, HeaderValue, HOST, USER_AGENT};
use scraper::{Html, Selector};
use tracing::{debug, info, warn};

pub fn company_filings_url(config: &ReportConfig, cik: &str) -> String {
    format!(
        "{}/cgi-bin/browse-edgar?CIK={}&owner=exclude&action=getcompany&type=13F-HR",
        config.base_url, cik
    )
}

fn select(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| ReportError::Selector(e.to_string()))
}

/// Hrefs of the "Documents" buttons on a filing list page, newest first.
pub fn filing_index_links(page: &str) -> Result<Vec<String>> {
    let html = Html::parse_document(page);
    let buttons = select("a#documentsbutton")?;
    Ok(html
        .select(&buttons)
        .filter_map(|a| a.value().attr("href"))
        .map(str::to_string)
        .collect())
}

/// Href of the `position`-th XML link (zero-based) on a filing index page.
pub fn information_table_link(page: &str, position: usize) -> Result<Option<String>> {
    let html = Html::parse_document(page);
    let anchors = select("a[href]")?;
    Ok(html
        .select(&anchors)
        .filter_map(|a| a.value().attr("href"))
        .filter(|href| href.contains("xml"))
        .nth(position)
        .map(str::to_string))
}

pub struct EdgarClient {
    client: reqwest::Client,
    config: ReportConfig,
}

impl EdgarClient {
    pub fn new(config: &ReportConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_str(&config.user_agent)?);
        headers.insert(HOST, HeaderValue::from_str(&config.host)?);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(EdgarClient {
            client,
            config: config.clone(),
        })
    }

    async fn send_get_request(&self, url: &str) -> Result<String> {
        debug!("GET {}", url);
        let resp = self.client.get(url).send().await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ReportError::HttpStatus {
                url: url.to_string(),
                status,
            });
        }
        Ok(resp.text().await?)
    }

    /// Fetch and parse the latest and the previous 13F report for `cik`.
    /// Returns `(current, prior)`.
    pub async fn fetch_latest_quarters(&self, cik: &str) -> Result<(HoldingsTable, HoldingsTable)> {
        let listing = self
            .send_get_request(&company_filings_url(&self.config, cik))
            .await?;
        let links = filing_index_links(&listing)?;
        if links.len() < 2 {
            return Err(ReportError::MissingFilings {
                cik: cik.to_string(),
                found: links.len(),
            });
        }

        let last_report = self.config.absolute_url(&links[0]);
        let previous_report = self.config.absolute_url(&links[1]);

        info!("Latest 13F report: {}", last_report);
        let current = self.fetch_report(&last_report).await?;
        info!("Previous 13F report: {}", previous_report);
        let prior = self.fetch_report(&previous_report).await?;

        Ok((current, prior))
    }

    async fn fetch_report(&self, index_url: &str) -> Result<HoldingsTable> {
        let index_page = self.send_get_request(index_url).await?;
        let position = self.config.xml_link_position;
        let href = information_table_link(&index_page, position)?.ok_or_else(|| {
            ReportError::MissingXmlLink {
                url: index_url.to_string(),
                position,
            }
        })?;

        let xml = self.send_get_request(&self.config.absolute_url(&href)).await?;
        parse_information_table(&xml, &href)
    }
}

/// Extract one quarter's holdings from its information table. An empty
/// quarter is not an error, but it makes every position look bought or sold.
fn parse_information_table(xml: &str, source: &str) -> Result<HoldingsTable> {
    let table = extract_holdings(xml)?;
    if table.is_empty() {
        warn!("No holdings found in {}", source);
    } else {
        info!(
            "Parsed {} holdings (total value {}) from {}",
            table.len(),
            table.total_value(),
            source
        );
    }
    Ok(table)
}
