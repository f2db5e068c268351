//! Spreadsheet output
//!
//! Lays the three report views out as worksheets: a merged title row, a bold
//! header row, then one row per record. Only the quarter comparison sheet
//! gets coloured change columns.

use crate::compare::{ComparisonRow, Delta, ExclusiveRow, QuarterReport};
use crate::error::Result;
use rust_xlsxwriter::{Color, Format, FormatAlign, Workbook, Worksheet};
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

const RED: u32 = 0xFF0000;
const GREEN: u32 = 0x00FF00;
const PERCENT_FORMAT: &str = "0.00%";

const TITLE_ROW: u32 = 0;
const HEADER_ROW: u32 = 1;
const FIRST_DATA_ROW: u32 = 2;

const QUARTER_HEADERS: &[&str] = &[
    "Name of Issuer",
    "CUSIP",
    "Investment Discretion",
    "Shares Q1",
    "Shares Q2",
    "Shares Difference %",
    "Value Q1",
    "Value Q2",
    "Value Difference %",
    "Percentage Of holdings Q2",
    "Percentage Of holdings Q1",
];

const EXCLUSIVE_HEADERS: &[&str] = &[
    "Name of Issuer",
    "CUSIP",
    "Value",
    "Shares",
    "Investment Discretion",
    "Percentage Of holdings",
    "type",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetKind {
    ByQuarters,
    Bought,
    Sold,
}

impl SheetKind {
    pub const ALL: [SheetKind; 3] = [SheetKind::ByQuarters, SheetKind::Bought, SheetKind::Sold];

    pub fn name(&self) -> &'static str {
        match self {
            SheetKind::ByQuarters => "Stocks By Quarters",
            SheetKind::Bought => "Bought Stocks",
            SheetKind::Sold => "Sold Stocks",
        }
    }

    pub fn headers(&self) -> &'static [&'static str] {
        match self {
            SheetKind::ByQuarters => QUARTER_HEADERS,
            SheetKind::Bought | SheetKind::Sold => EXCLUSIVE_HEADERS,
        }
    }

    /// The title cell spans every header column.
    fn title_last_col(&self) -> u16 {
        (self.headers().len() - 1) as u16
    }

    /// Title span in A1 notation: `A1:K1` for the comparison, `A1:G1` otherwise.
    pub fn title_range(&self) -> String {
        format!("A1:{}1", column_letter(self.title_last_col()))
    }
}

fn column_letter(col: u16) -> char {
    // Sheets stay well under 26 columns
    (b'A' + col as u8) as char
}

/// One spreadsheet cell before formatting.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Count(u64),
    /// Fraction of the portfolio, shown as a percentage.
    Share(f64),
    /// Quarter-over-quarter change, coloured by sign.
    Change(Delta),
}

fn comparison_cells(row: &ComparisonRow) -> Vec<Cell> {
    vec![
        Cell::Text(row.issuer_name.clone()),
        Cell::Text(row.identifier.clone()),
        Cell::Text(row.discretion_code.clone()),
        Cell::Count(row.shares_q1),
        Cell::Count(row.shares_q2),
        Cell::Change(row.shares_difference_pct),
        Cell::Count(row.value_q1),
        Cell::Count(row.value_q2),
        Cell::Change(row.value_difference_pct),
        Cell::Share(row.holding_percentage_q2),
        Cell::Share(row.holding_percentage_q1),
    ]
}

fn exclusive_cells(row: &ExclusiveRow) -> Vec<Cell> {
    let h = &row.holding;
    vec![
        Cell::Text(h.issuer_name.clone()),
        Cell::Text(h.identifier.clone()),
        Cell::Count(h.value),
        Cell::Count(h.shares),
        Cell::Text(h.discretion_code.clone()),
        Cell::Share(h.holding_percentage),
        Cell::Text(row.change.to_string()),
    ]
}

pub fn sheet_rows(kind: SheetKind, report: &QuarterReport) -> Vec<Vec<Cell>> {
    match kind {
        SheetKind::ByQuarters => report.by_quarters.iter().map(comparison_cells).collect(),
        SheetKind::Bought => report.bought.iter().map(exclusive_cells).collect(),
        SheetKind::Sold => report.sold.iter().map(exclusive_cells).collect(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Tint {
    Red,
    Green,
}

impl Tint {
    fn rgb(&self) -> u32 {
        match self {
            Tint::Red => RED,
            Tint::Green => GREEN,
        }
    }
}

/// Magnitude in percent (two decimals) and the colour carrying the sign.
/// An undefined change has nothing to colour.
pub fn color_change(delta: Delta) -> Option<(f64, Tint)> {
    let ratio = delta.ratio()?;
    let percent = (ratio.abs() * 100.0 * 100.0).round() / 100.0;
    let tint = if ratio < 0.0 { Tint::Red } else { Tint::Green };
    Some((percent, tint))
}

/// What ends up in a worksheet cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Written {
    Text(String),
    Number(f64),
    Percent(f64),
    Tinted(f64, Tint),
}

/// Resolve a cell to its written form. Undefined changes cannot be coloured;
/// they are logged and written as `N/A` so the rest of the sheet still goes out.
pub fn render_cell(kind: SheetKind, row: u32, col: u16, cell: &Cell) -> Written {
    match cell {
        Cell::Text(text) => Written::Text(text.clone()),
        Cell::Count(n) => Written::Number(*n as f64),
        Cell::Share(share) => Written::Percent(*share),
        Cell::Change(delta) => match color_change(*delta) {
            Some((percent, tint)) => Written::Tinted(percent, tint),
            None => {
                warn!(
                    "Cannot colour {} cell {}{}: change is undefined",
                    kind.name(),
                    column_letter(col),
                    row + 1
                );
                Written::Text("N/A".to_string())
            }
        },
    }
}

/// Every data row of a sheet as written, starting at the first data row.
pub fn render_rows(kind: SheetKind, report: &QuarterReport) -> Vec<Vec<Written>> {
    sheet_rows(kind, report)
        .iter()
        .enumerate()
        .map(|(i, cells)| {
            let row = FIRST_DATA_ROW + i as u32;
            cells
                .iter()
                .enumerate()
                .map(|(col, cell)| render_cell(kind, row, col as u16, cell))
                .collect()
        })
        .collect()
}

struct Formats {
    title: Format,
    header: Format,
    share: Format,
    red: Format,
    green: Format,
}

impl Formats {
    fn new() -> Self {
        Formats {
            title: Format::new().set_bold().set_align(FormatAlign::Center),
            header: Format::new().set_bold().set_align(FormatAlign::Center),
            share: Format::new().set_num_format(PERCENT_FORMAT),
            red: Format::new().set_font_color(Color::RGB(Tint::Red.rgb())),
            green: Format::new().set_font_color(Color::RGB(Tint::Green.rgb())),
        }
    }

    fn tint(&self, tint: Tint) -> &Format {
        match tint {
            Tint::Red => &self.red,
            Tint::Green => &self.green,
        }
    }
}

fn write_sheet(
    worksheet: &mut Worksheet,
    kind: SheetKind,
    rows: &[Vec<Written>],
    formats: &Formats,
) -> Result<()> {
    debug!("Writing {} rows to {} (title {})", rows.len(), kind.name(), kind.title_range());
    worksheet.set_name(kind.name())?;
    worksheet.merge_range(
        TITLE_ROW,
        0,
        TITLE_ROW,
        kind.title_last_col(),
        kind.name(),
        &formats.title,
    )?;

    for (col, header) in kind.headers().iter().enumerate() {
        worksheet.write_string_with_format(HEADER_ROW, col as u16, *header, &formats.header)?;
    }

    for (i, cells) in rows.iter().enumerate() {
        let row = FIRST_DATA_ROW + i as u32;
        for (col, written) in cells.iter().enumerate() {
            let col = col as u16;
            match written {
                Written::Text(text) => {
                    worksheet.write_string(row, col, text.as_str())?;
                }
                Written::Number(n) => {
                    worksheet.write_number(row, col, *n)?;
                }
                Written::Percent(share) => {
                    worksheet.write_number_with_format(row, col, *share, &formats.share)?;
                }
                Written::Tinted(percent, tint) => {
                    worksheet.write_number_with_format(row, col, *percent, formats.tint(*tint))?;
                }
            }
        }
    }

    Ok(())
}

/// Build the workbook with all three sheets, in order.
pub fn build_workbook(report: &QuarterReport) -> Result<Workbook> {
    let mut workbook = Workbook::new();
    let formats = Formats::new();

    for kind in SheetKind::ALL {
        let rows = render_rows(kind, report);
        let worksheet = workbook.add_worksheet();
        write_sheet(worksheet, kind, &rows, &formats)?;
    }

    Ok(workbook)
}

/// Render the report and write it to `path`.
///
/// The workbook is serialized in memory and written through a temporary
/// sibling file, so a failed run never leaves a partial report behind.
pub fn write_report(report: &QuarterReport, path: &Path) -> Result<()> {
    let mut workbook = build_workbook(report)?;
    let buffer = workbook.save_to_buffer()?;

    let tmp_path = path.with_extension("xlsx.tmp");
    if let Err(e) = fs::write(&tmp_path, &buffer).and_then(|_| fs::rename(&tmp_path, path)) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e.into());
    }

    info!(
        "Wrote {} ({} compared, {} bought, {} sold)",
        path.display(),
        report.by_quarters.len(),
        report.bought.len(),
        report.sold.len()
    );
    Ok(())
}
