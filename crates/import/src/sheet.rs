use std::io::Cursor;

use calamine::{Data, Reader};

use crate::error::ImportError;

/// A worksheet flattened to text cells. Rows may be ragged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sheet {
    pub name: String,
    rows: Vec<Vec<String>>,
}

impl Sheet {
    pub fn new(name: impl Into<String>, rows: Vec<Vec<String>>) -> Self {
        Sheet { name: name.into(), rows }
    }

    /// Convenience for building sheets from string literals.
    pub fn from_rows<R, C>(name: &str, rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        Sheet::new(
            name,
            rows.into_iter()
                .map(|row| row.into_iter().map(Into::into).collect())
                .collect(),
        )
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of cells declared in `row`; 0 past the last row.
    pub fn width(&self, row: usize) -> usize {
        self.rows.get(row).map_or(0, Vec::len)
    }

    /// Trimmed cell text, or `""` when the row or column does not exist.
    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map_or("", |c| c.trim())
    }

    /// Like [`Sheet::cell`] for an optional column index.
    pub fn cell_at(&self, row: usize, col: Option<usize>) -> &str {
        col.map_or("", |c| self.cell(row, c))
    }
}

/// All worksheets of a spreadsheet document, in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn new(sheets: Vec<Sheet>) -> Self {
        Workbook { sheets }
    }

    /// Open `.xls`, `.xlsx`, `.xlsb` or `.ods` bytes. The format is sniffed
    /// from the content, not from a file name.
    pub fn from_bytes(data: &[u8]) -> Result<Self, ImportError> {
        let mut workbook = calamine::open_workbook_auto_from_rs(Cursor::new(data.to_vec()))
            .map_err(|e| ImportError::Format(e.to_string()))?;

        let sheets: Vec<Sheet> = workbook
            .worksheets()
            .into_iter()
            .map(|(name, range)| {
                let rows = range
                    .rows()
                    .map(|row| row.iter().map(cell_text).collect())
                    .collect();
                Sheet::new(name, rows)
            })
            .collect();

        tracing::debug!("opened workbook with {} sheet(s)", sheets.len());
        Ok(Workbook { sheets })
    }
}

/// Render a cell the way the statement exports show it. Date cells become
/// their serial number so the date normalizer handles them like numeric
/// dates.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt.as_f64().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_beyond_bounds_is_empty() {
        let sheet = Sheet::from_rows("s", vec![vec!["a", "b"], vec!["c"]]);
        assert_eq!(sheet.cell(0, 1), "b");
        assert_eq!(sheet.cell(1, 1), "");
        assert_eq!(sheet.cell(7, 0), "");
        assert_eq!(sheet.cell_at(0, None), "");
    }

    #[test]
    fn cells_are_trimmed() {
        let sheet = Sheet::from_rows("s", vec![vec!["  Fecha  "]]);
        assert_eq!(sheet.cell(0, 0), "Fecha");
    }

    #[test]
    fn width_of_ragged_rows() {
        let sheet = Sheet::from_rows("s", vec![vec!["a", "b", "c"], vec![]]);
        assert_eq!(sheet.width(0), 3);
        assert_eq!(sheet.width(1), 0);
        assert_eq!(sheet.width(2), 0);
    }

    #[test]
    fn numeric_cells_render_without_trailing_zeroes() {
        assert_eq!(cell_text(&Data::Float(45361.0)), "45361");
        assert_eq!(cell_text(&Data::Float(1234.5)), "1234.5");
        assert_eq!(cell_text(&Data::Empty), "");
    }

    #[test]
    fn garbage_bytes_are_a_format_error() {
        let err = Workbook::from_bytes(b"definitely not a spreadsheet").unwrap_err();
        assert!(matches!(err, ImportError::Format(_)));
    }
}
