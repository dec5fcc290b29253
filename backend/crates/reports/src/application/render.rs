//! CSV and XLSX rendering
//!
//! Both formats share one cell representation: every row is serialised
//! through the CSV writer, so XLSX cells are the same strings a CSV
//! download would contain.

use std::collections::BTreeMap;

use rust_xlsxwriter::{Workbook, Worksheet};
use serde::Serialize;

use crate::domain::file::CsvRows;
use crate::domain::report::{Columns, FinancialReport, SpinReport};
use crate::error::{ReportError, ReportResult};

pub const TOTAL_SHEET: &str = "total";

/// Excel limit on sheet name length
const SHEET_NAME_MAX: usize = 31;

/// Blank rows between the financial summary and the spin table
const SEPARATOR_ROWS: u32 = 3;

fn writer_bytes(writer: csv::Writer<Vec<u8>>) -> ReportResult<Vec<u8>> {
    writer
        .into_inner()
        .map_err(|e| ReportError::Csv(csv::Error::from(e.into_error())))
}

fn serialize_rows<T: Serialize>(rows: &[T], header: Option<&[&str]>) -> ReportResult<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    if let Some(header) = header {
        writer.write_record(header)?;
    }
    for row in rows {
        writer.serialize(row)?;
    }
    writer_bytes(writer)
}

/// Header plus rows, in order
pub fn csv_table<T: Serialize + Columns>(rows: &[T]) -> ReportResult<Vec<u8>> {
    serialize_rows(rows, Some(T::COLUMNS))
}

pub fn render_csv(rows: &CsvRows) -> ReportResult<Vec<u8>> {
    match rows {
        CsvRows::Financial(r) => csv_table(r),
        CsvRows::Spin(r) => csv_table(r),
        CsvRows::GamingSession(r) => csv_table(r),
        CsvRows::AggregatedByGame(r) | CsvRows::AggregatedByCountry(r) => csv_table(r),
    }
}

/// Rows as string cells, without header
fn cells<T: Serialize>(rows: &[T]) -> ReportResult<Vec<Vec<String>>> {
    let bytes = serialize_rows(rows, None)?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes.as_slice());
    let mut table = Vec::with_capacity(rows.len());
    for record in reader.records() {
        table.push(record?.iter().map(str::to_string).collect());
    }
    Ok(table)
}

fn write_row<S: AsRef<str>>(sheet: &mut Worksheet, row: u32, values: &[S]) -> ReportResult<()> {
    for (col, value) in values.iter().enumerate() {
        let col = u16::try_from(col)
            .map_err(|_| ReportError::Internal("too many columns for a sheet".to_string()))?;
        sheet.write_string(row, col, value.as_ref())?;
    }
    Ok(())
}

/// Header at `start`, rows below; returns the next free row
fn write_table<T: Serialize + Columns>(
    sheet: &mut Worksheet,
    start: u32,
    rows: &[T],
) -> ReportResult<u32> {
    write_row(sheet, start, T::COLUMNS)?;
    let mut row = start + 1;
    for values in cells(rows)? {
        write_row(sheet, row, &values)?;
        row += 1;
    }
    Ok(row)
}

/// Single default sheet
pub fn render_workbook<T: Serialize + Columns>(rows: &[T]) -> ReportResult<Vec<u8>> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    write_table(sheet, 0, rows)?;
    Ok(workbook.save_to_buffer()?)
}

/// `total` sheet, then one sheet of spins per game
///
/// `total` holds the exchange currency, the financial summary as header
/// and value rows, three blank rows, then every spin.
pub fn render_financial_workbook(
    currency: &str,
    report: &FinancialReport,
    spins: &[SpinReport],
) -> ReportResult<Vec<u8>> {
    let mut workbook = Workbook::new();

    let total = workbook.add_worksheet();
    total.set_name(TOTAL_SHEET)?;
    write_row(total, 0, &["exchange_currency", currency])?;
    let next = write_table(total, 1, std::slice::from_ref(report))?;
    write_table(total, next + SEPARATOR_ROWS, spins)?;

    let mut by_game: BTreeMap<&str, Vec<SpinReport>> = BTreeMap::new();
    for spin in spins {
        by_game.entry(spin.game.as_str()).or_default().push(spin.clone());
    }
    let mut taken = vec![TOTAL_SHEET.to_string()];
    for (game, rows) in by_game {
        let name = sheet_name(game, &taken);
        let sheet = workbook.add_worksheet();
        sheet.set_name(&name)?;
        write_table(sheet, 0, &rows)?;
        taken.push(name);
    }

    Ok(workbook.save_to_buffer()?)
}

/// Valid, unique (case-insensitive) sheet name derived from `raw`
fn sheet_name(raw: &str, taken: &[String]) -> String {
    let cleaned: String = raw
        .chars()
        .map(|c| match c {
            '[' | ']' | ':' | '*' | '?' | '/' | '\\' => '_',
            other => other,
        })
        .collect();
    let cleaned = cleaned.trim_matches('\'').trim();
    let base: String = if cleaned.is_empty() {
        "game".to_string()
    } else {
        cleaned.chars().take(SHEET_NAME_MAX).collect()
    };

    let is_taken = |name: &str| taken.iter().any(|t| t.eq_ignore_ascii_case(name));
    if !is_taken(&base) {
        return base;
    }
    (2..)
        .map(|n| {
            let suffix = format!(" ({})", n);
            let keep = SHEET_NAME_MAX.saturating_sub(suffix.len());
            format!("{}{}", base.chars().take(keep).collect::<String>(), suffix)
        })
        .find(|candidate| !is_taken(candidate))
        .unwrap_or(base)
}
