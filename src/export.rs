//! Spreadsheet export
//!
//! One "Summary" sheet followed by one sheet per network (sorted by name), each with a
//! header row and one row per application in table order.

use crate::error::AppError;
use crate::models::{ApplicationUsage, UsageReport, UsageTable};
use rust_xlsxwriter::{DocProperties, Format, Workbook};
use std::collections::HashSet;
use tracing::info;

pub const WORKBOOK_FILE_NAME: &str = "meraki_client_app_usage.xlsx";
pub const WORKBOOK_TITLE: &str = "Meraki App Usage";
pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const HEADER_ROW: [&str; 3] = ["Application", "Received (kilobytes)", "Sent (kilobytes)"];
pub const SUMMARY_SHEET: &str = "Summary";

const MAX_SHEET_NAME_LEN: usize = 31;
const INVALID_SHEET_CHARS: [char; 7] = ['[', ']', ':', '*', '?', '/', '\\'];

/// Contents of one worksheet before encoding.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetData {
    pub name: String,
    pub rows: Vec<(String, ApplicationUsage)>,
}

/// Lay out the report as worksheets with valid, unique names.
pub fn sheets(report: &UsageReport) -> Vec<SheetData> {
    let mut used = HashSet::new();
    let mut sheets = vec![SheetData {
        name: unique_sheet_name(SUMMARY_SHEET, &mut used),
        rows: rows(&report.summary),
    }];

    for name in report.sorted_network_names() {
        if let Some(table) = report.table(name) {
            sheets.push(SheetData {
                name: unique_sheet_name(name, &mut used),
                rows: rows(table),
            });
        }
    }

    sheets
}

fn rows(table: &UsageTable) -> Vec<(String, ApplicationUsage)> {
    table
        .iter()
        .map(|(name, usage)| (name.to_string(), *usage))
        .collect()
}

/// Encode the report as an `.xlsx` workbook.
pub fn build_workbook(report: &UsageReport) -> Result<Vec<u8>, AppError> {
    let mut workbook = Workbook::new();
    let properties = DocProperties::new().set_title(WORKBOOK_TITLE);
    workbook.set_properties(&properties);
    let header_format = Format::new().set_bold();

    let sheets = sheets(report);
    for sheet in &sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(&sheet.name)?;

        for (col, title) in HEADER_ROW.iter().enumerate() {
            worksheet.write_string_with_format(0, col as u16, *title, &header_format)?;
        }

        for (index, (application, usage)) in sheet.rows.iter().enumerate() {
            let row = index as u32 + 1;
            worksheet.write_string(row, 0, application.as_str())?;
            worksheet.write_number(row, 1, usage.received)?;
            worksheet.write_number(row, 2, usage.sent)?;
        }
    }

    let bytes = workbook.save_to_buffer()?;
    info!(sheets = sheets.len(), bytes = bytes.len(), "Built usage workbook");
    Ok(bytes)
}

/// Excel sheet names: at most 31 characters, none of `[]:*?/\`, no leading or trailing
/// apostrophe, unique ignoring case.
fn unique_sheet_name(raw: &str, used: &mut HashSet<String>) -> String {
    let cleaned: String = raw
        .chars()
        .map(|c| if INVALID_SHEET_CHARS.contains(&c) { '_' } else { c })
        .collect();
    let cleaned = cleaned.trim().trim_matches('\'');
    let base = if cleaned.is_empty() { "Network" } else { cleaned };

    let mut candidate = truncate(base, MAX_SHEET_NAME_LEN);
    let mut counter = 2;
    while used.contains(&candidate.to_lowercase()) {
        let suffix = format!(" ({})", counter);
        candidate = format!(
            "{}{}",
            truncate(base, MAX_SHEET_NAME_LEN - suffix.chars().count()),
            suffix
        );
        counter += 1;
    }

    used.insert(candidate.to_lowercase());
    candidate
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
