//! Quarterly holdings snapshots
//!
//! This module handles:
//! - The `Holding` row and its composite identity key
//! - Materializing a table with derived holding percentages
//! - Extracting holdings from a 13F information table document

use crate::error::{ReportError, Result};
use scraper::{ElementRef, Html};
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, warn};

const ISSUER_TAG: &str = "nameofissuer";
const CUSIP_TAG: &str = "cusip";
const VALUE_TAG: &str = "value";
const SHARES_TAG: &str = "sshprnamt";
const DISCRETION_TAG: &str = "investmentdiscretion";

#[derive(Debug, Clone, PartialEq)]
pub struct Holding {
    pub issuer_name: String,
    pub identifier: String,
    pub discretion_code: String,
    pub value: u64,
    pub shares: u64,
    /// Share of the table's total value, filled in by `HoldingsTable`.
    pub holding_percentage: f64,
}

/// `(identifier, discretion_code)`: identifies one holding line per quarter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CompositeKey<'a> {
    pub identifier: &'a str,
    pub discretion_code: &'a str,
}

impl fmt::Display for CompositeKey<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.identifier, self.discretion_code)
    }
}

impl Holding {
    pub fn new(
        issuer_name: impl Into<String>,
        identifier: impl Into<String>,
        discretion_code: impl Into<String>,
        value: u64,
        shares: u64,
    ) -> Self {
        Holding {
            issuer_name: issuer_name.into(),
            identifier: identifier.into(),
            discretion_code: discretion_code.into(),
            value,
            shares,
            holding_percentage: 0.0,
        }
    }

    pub fn key(&self) -> CompositeKey<'_> {
        CompositeKey {
            identifier: &self.identifier,
            discretion_code: &self.discretion_code,
        }
    }
}

/// One quarter's holdings, in filing order, with unique composite keys.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HoldingsTable {
    rows: Vec<Holding>,
}

impl HoldingsTable {
    /// Materialize a table from collected rows.
    ///
    /// Rejects duplicate composite keys and recomputes every row's
    /// `holding_percentage` against the total value. When the total is zero
    /// all percentages are zero.
    pub fn from_holdings(mut rows: Vec<Holding>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(rows.len());
        for row in &rows {
            if !seen.insert(row.key()) {
                return Err(ReportError::DuplicateKey(row.key().to_string()));
            }
        }

        let total: u64 = rows.iter().map(|h| h.value).sum();
        for row in rows.iter_mut() {
            row.holding_percentage = if total > 0 {
                row.value as f64 / total as f64
            } else {
                0.0
            };
        }

        Ok(HoldingsTable { rows })
    }

    pub fn rows(&self) -> &[Holding] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn total_value(&self) -> u64 {
        self.rows.iter().map(|h| h.value).sum()
    }

    pub fn keys(&self) -> HashSet<CompositeKey<'_>> {
        self.rows.iter().map(Holding::key).collect()
    }
}

/// Parse a 13F information table and zip its five field sequences into rows.
///
/// Tag names are matched case-insensitively with any namespace prefix
/// dropped, so both `<nameOfIssuer>` and `<ns1:nameOfIssuer>` count. If the
/// sequences differ in length the extra entries are dropped.
pub fn extract_holdings(document: &str) -> Result<HoldingsTable> {
    let html = Html::parse_document(document);

    let mut issuers = Vec::new();
    let mut cusips = Vec::new();
    let mut values = Vec::new();
    let mut shares = Vec::new();
    let mut discretions = Vec::new();

    for element in html.root_element().descendants().filter_map(ElementRef::wrap) {
        let sequence = match local_name(element.value().name()).as_str() {
            ISSUER_TAG => &mut issuers,
            CUSIP_TAG => &mut cusips,
            VALUE_TAG => &mut values,
            SHARES_TAG => &mut shares,
            DISCRETION_TAG => &mut discretions,
            _ => continue,
        };
        sequence.push(element.text().collect::<String>().trim().to_string());
    }

    let counts = [
        issuers.len(),
        cusips.len(),
        values.len(),
        shares.len(),
        discretions.len(),
    ];
    let row_count = counts.iter().copied().min().unwrap_or(0);
    if counts.iter().any(|&c| c != row_count) {
        warn!(
            "Field counts differ (issuers={}, cusips={}, values={}, shares={}, discretions={}); keeping {} rows",
            counts[0], counts[1], counts[2], counts[3], counts[4], row_count
        );
    }

    let mut rows = Vec::with_capacity(row_count);
    for ((((issuer, cusip), value), share_count), discretion) in issuers
        .into_iter()
        .zip(cusips)
        .zip(values)
        .zip(shares)
        .zip(discretions)
    {
        let value = parse_amount(VALUE_TAG, &value)?;
        let share_count = parse_amount(SHARES_TAG, &share_count)?;
        rows.push(Holding::new(issuer, cusip, discretion, value, share_count));
    }

    debug!("Extracted {} holdings", rows.len());
    HoldingsTable::from_holdings(rows)
}

fn local_name(tag: &str) -> String {
    tag.rsplit(':').next().unwrap_or(tag).to_ascii_lowercase()
}

fn parse_amount(field: &'static str, text: &str) -> Result<u64> {
    text.parse().map_err(|_| ReportError::InvalidNumber {
        field,
        value: text.to_string(),
    })
}
