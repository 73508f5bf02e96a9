use crate::utils::{parse_amount, parse_fiscal_year};
use serde::{Deserialize, Serialize};

/// A grid of text cells exactly as the tabular reader produced it.
/// Rows may be ragged; blank cells are empty strings.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawTable {
    rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }

    pub fn from_rows<R, C, S>(rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            rows: rows
                .into_iter()
                .map(|row| row.into_iter().map(Into::into).collect())
                .collect(),
        }
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A cell after numeric coercion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    Number(f64),
    Text(String),
    Empty,
}

impl CellValue {
    pub fn coerce(raw: &str) -> Self {
        if raw.trim().is_empty() {
            return CellValue::Empty;
        }
        match parse_amount(raw) {
            Some(value) => CellValue::Number(value),
            None => CellValue::Text(raw.trim().to_string()),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(value) => Some(*value),
            _ => None,
        }
    }
}

/// The label of one reporting period and the fiscal year it resolves to, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodLabel {
    pub label: String,
    pub fiscal_year: Option<i32>,
}

impl PeriodLabel {
    pub fn parse(label: &str) -> Self {
        Self {
            label: label.trim().to_string(),
            fiscal_year: parse_fiscal_year(label),
        }
    }
}

/// A table with a promoted header row where every data row is one reporting period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedTable {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
    period_column: Option<usize>,
}

impl NormalizedTable {
    /// Rows shorter than the header are padded with blanks and longer rows are
    /// truncated, so every row has exactly one cell per column.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>, period_column: Option<usize>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();

        Self {
            columns,
            rows,
            period_column: period_column.filter(|&idx| idx < width),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn period_column(&self) -> Option<usize> {
        self.period_column
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .map(String::as_str)
    }

    pub fn period(&self, row: usize) -> Option<PeriodLabel> {
        let column = self.period_column?;
        self.cell(row, column).map(PeriodLabel::parse)
    }

    /// Data row indices in reporting order: ascending fiscal year when every
    /// row carries a parseable year, table order otherwise.
    pub fn period_order(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.rows.len()).collect();

        let years: Option<Vec<i32>> = (0..self.rows.len())
            .map(|row| self.period(row).and_then(|p| p.fiscal_year))
            .collect();

        if let Some(years) = years {
            order.sort_by_key(|&row| years[row]);
        }

        order
    }

    pub fn latest_row(&self) -> Option<usize> {
        self.period_order().last().copied()
    }

    /// The header followed by the data rows, i.e. the table as a raw grid again.
    pub fn to_raw(&self) -> RawTable {
        let mut rows = Vec::with_capacity(self.rows.len() + 1);
        rows.push(self.columns.clone());
        rows.extend(self.rows.iter().cloned());
        RawTable::new(rows)
    }
}
