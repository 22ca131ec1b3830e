//! Spreadsheet reports.
//!
//! One header row taken from the first record's keys, one row per record,
//! every column sized to its longest value.

use std::path::{Path, PathBuf};

use rust_xlsxwriter::{Workbook, Worksheet};
use serde_json::{Map, Value};
use tracing::debug;

use crate::{domain::Expense, errors::Error, utils::json_value_to_display, Result};

pub type ReportRow = Map<String, Value>;

/// Label used in the file name when a range bound is absent.
pub const OPEN_BOUND_LABEL: &str = "all";

const WIDTH_PADDING: usize = 2;

pub fn report_file_name(start: Option<&str>, end: Option<&str>) -> String {
    format!(
        "expenses_{}-{}.xlsx",
        start.unwrap_or(OPEN_BOUND_LABEL),
        end.unwrap_or(OPEN_BOUND_LABEL)
    )
}

/// Convert records into field → value rows, keeping the wire field order.
pub fn expenses_to_rows(expenses: &[Expense]) -> Result<Vec<ReportRow>> {
    expenses
        .iter()
        .map(|e| match serde_json::to_value(e)? {
            Value::Object(map) => Ok(map),
            other => Err(Error::Report(format!("expense is not an object: {other}"))),
        })
        .collect()
}

/// Write `rows` to `dir/expenses_{start}-{end}.xlsx` and return the path.
///
/// `dir` must already exist. Every row is read with the first row's keys;
/// a missing key renders as an empty cell.
pub fn render_report(
    rows: &[ReportRow],
    dir: &Path,
    start: Option<&str>,
    end: Option<&str>,
) -> Result<PathBuf> {
    let Some(first) = rows.first() else {
        return Err(Error::EmptyReport);
    };
    let headers: Vec<&String> = first.keys().collect();

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();

    for (col, header) in headers.iter().enumerate() {
        sheet.write_string(0, col_num(col)?, header.as_str())?;
    }

    for (i, row) in rows.iter().enumerate() {
        let row_num = u32::try_from(i + 1)
            .map_err(|_| Error::Report("too many rows for one sheet".to_string()))?;
        for (col, key) in headers.iter().enumerate() {
            if let Some(value) = row.get(key.as_str()) {
                write_cell(sheet, row_num, col_num(col)?, value)?;
            }
        }
    }

    for (col, width) in column_widths(&headers, rows).into_iter().enumerate() {
        sheet.set_column_width(col_num(col)?, width as f64)?;
    }

    let path = dir.join(report_file_name(start, end));
    workbook.save(&path)?;
    debug!(path = %path.display(), rows = rows.len(), "report written");
    Ok(path)
}

/// Longest stringified value per column plus padding. Header text is not
/// part of the measurement.
fn column_widths(headers: &[&String], rows: &[ReportRow]) -> Vec<usize> {
    headers
        .iter()
        .map(|key| {
            let longest = rows
                .iter()
                .filter_map(|row| row.get(key.as_str()))
                .map(|v| json_value_to_display(v).chars().count())
                .max()
                .unwrap_or(0);
            longest + WIDTH_PADDING
        })
        .collect()
}

fn write_cell(sheet: &mut Worksheet, row: u32, col: u16, value: &Value) -> Result<()> {
    match value {
        Value::Null => {}
        Value::Bool(b) => {
            sheet.write_boolean(row, col, *b)?;
        }
        Value::Number(n) => match n.as_f64() {
            Some(f) => {
                sheet.write_number(row, col, f)?;
            }
            None => {
                sheet.write_string(row, col, n.to_string())?;
            }
        },
        other => {
            sheet.write_string(row, col, json_value_to_display(other))?;
        }
    }
    Ok(())
}

fn col_num(col: usize) -> Result<u16> {
    u16::try_from(col).map_err(|_| Error::Report("too many columns for one sheet".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::{collections::BTreeMap, io::Read};
    use rust_decimal::Decimal;
    use serde_json::json;

    fn expense(id: &str, description: &str) -> Expense {
        Expense {
            id: id.to_string(),
            owner_id: "42".to_string(),
            amount_primary: Decimal::new(10050, 2),
            amount_secondary: Decimal::new(243, 2),
            description: description.to_string(),
            expense_date: NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
        }
    }

    #[test]
    fn file_name_marks_open_bounds() {
        assert_eq!(
            report_file_name(Some("2024-03-01"), Some("2024-03-31")),
            "expenses_2024-03-01-2024-03-31.xlsx"
        );
        assert_eq!(report_file_name(None, None), "expenses_all-all.xlsx");
    }

    #[test]
    fn empty_input_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = render_report(&[], dir.path(), None, None).unwrap_err();
        assert!(matches!(err, Error::EmptyReport));
    }

    #[test]
    fn widths_ignore_header_length() {
        let rows = expenses_to_rows(&[expense("a", "tea"), expense("b", "groceries")]).unwrap();
        let headers: Vec<&String> = rows[0].keys().collect();
        let widths = column_widths(&headers, &rows);
        // id, telegram_user_id, amount_in_uah, amount_in_usd, description, expense_date
        assert_eq!(widths, vec![3, 4, 8, 6, 11, 12]);
    }

    #[test]
    fn mixed_scalars_are_written() {
        let dir = tempfile::tempdir().unwrap();
        let rows: Vec<ReportRow> = vec![
            json!({"name": "a", "n": 1.5, "ok": true, "none": null})
                .as_object()
                .unwrap()
                .clone(),
            json!({"name": "bb", "n": 2, "ok": false})
                .as_object()
                .unwrap()
                .clone(),
        ];
        let path = render_report(&rows, dir.path(), Some("x"), None).unwrap();
        assert!(path.ends_with("expenses_x-all.xlsx"));
        assert!(path.exists());
    }

    #[test]
    fn writes_expense_report_into_dir() {
        let dir = tempfile::tempdir().unwrap();
        let rows = expenses_to_rows(&[expense("a", "tea")]).unwrap();
        let path =
            render_report(&rows, dir.path(), Some("2024-03-01"), Some("2024-03-31")).unwrap();
        assert_eq!(path.parent().unwrap(), dir.path());
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
    }

    /// Cell reference → displayed value, read back from the saved workbook.
    fn read_cells(path: &Path) -> BTreeMap<String, String> {
        let file = std::fs::File::open(path).unwrap();
        let mut archive = zip::ZipArchive::new(file).unwrap();
        let mut part = |name: &str| {
            let mut xml = String::new();
            if let Ok(mut entry) = archive.by_name(name) {
                entry.read_to_string(&mut xml).unwrap();
            }
            xml
        };
        let shared = part("xl/sharedStrings.xml");
        let sheet = part("xl/worksheets/sheet1.xml");

        let strings: Vec<String> = shared
            .split("<si>")
            .skip(1)
            .map(|si| {
                let open = si.find("<t").unwrap();
                let start = open + si[open..].find('>').unwrap() + 1;
                let end = si.find("</t>").unwrap();
                si[start..end].to_string()
            })
            .collect();

        let data = &sheet[sheet.find("<sheetData").unwrap()..];
        let mut cells = BTreeMap::new();
        for chunk in data.split("<c ").skip(1) {
            let tag = &chunk[..chunk.find('>').unwrap()];
            if tag.ends_with('/') {
                continue;
            }
            let attr = |name: &str| {
                let key = format!(" {name}=\"");
                let padded = format!(" {tag}");
                padded.find(&key).map(|i| {
                    let rest = &padded[i + key.len()..];
                    rest[..rest.find('"').unwrap()].to_string()
                })
            };
            let (Some(r), Some(v_start)) = (attr("r"), chunk.find("<v>")) else {
                continue;
            };
            let raw = &chunk[v_start + 3..chunk.find("</v>").unwrap()];
            let value = match attr("t").as_deref() {
                Some("s") => strings[raw.parse::<usize>().unwrap()].clone(),
                _ => raw.to_string(),
            };
            cells.insert(r, value);
        }
        cells
    }

    #[test]
    fn saved_sheet_keeps_header_and_row_order() {
        let dir = tempfile::tempdir().unwrap();
        let rows = expenses_to_rows(&[expense("a", "tea"), expense("b", "groceries")]).unwrap();
        let path = render_report(&rows, dir.path(), None, None).unwrap();
        let cells = read_cells(&path);

        let header: Vec<&str> = ["A1", "B1", "C1", "D1", "E1", "F1"]
            .iter()
            .map(|r| cells[*r].as_str())
            .collect();
        assert_eq!(
            header,
            vec![
                "id",
                "telegram_user_id",
                "amount_in_uah",
                "amount_in_usd",
                "description",
                "expense_date"
            ]
        );

        assert_eq!(cells["A2"], "a");
        assert_eq!(cells["B2"], "42");
        assert_eq!(cells["C2"], "100.50");
        assert_eq!(cells["D2"], "2.43");
        assert_eq!(cells["E2"], "tea");
        assert_eq!(cells["F2"], "05.03.2024");
        assert_eq!(cells["A3"], "b");
        assert_eq!(cells["E3"], "groceries");
        assert!(!cells.contains_key("A4"));
        assert!(!cells.contains_key("G1"));
    }

    #[test]
    fn saved_sheet_types_scalars_and_leaves_gaps_empty() {
        let dir = tempfile::tempdir().unwrap();
        let rows: Vec<ReportRow> = vec![
            json!({"name": "a", "n": 1.5, "ok": true, "none": null})
                .as_object()
                .unwrap()
                .clone(),
            json!({"name": "bb", "n": 2, "ok": false, "extra": "dropped"})
                .as_object()
                .unwrap()
                .clone(),
        ];
        let path = render_report(&rows, dir.path(), None, None).unwrap();
        let cells = read_cells(&path);

        assert_eq!(cells["A1"], "name");
        assert_eq!(cells["B1"], "n");
        assert_eq!(cells["C1"], "ok");
        assert_eq!(cells["D1"], "none");
        assert_eq!(cells["B2"], "1.5");
        assert_eq!(cells["C2"], "1");
        assert_eq!(cells["C3"], "0");
        assert_eq!(cells["A3"], "bb");
        // null and missing keys stay empty; keys absent from the header are ignored
        assert!(!cells.contains_key("D2"));
        assert!(!cells.contains_key("D3"));
        assert!(!cells.contains_key("E3"));
        assert!(!cells.values().any(|v| v == "dropped"));
    }
}
