use crate::error::{ReconciliationError, Result};
use crate::schema::ReconciliationConfig;
use crate::table::{NormalizedTable, RawTable};
use crate::utils::{contains_any_keyword, is_period_header, normalize_label, parse_fiscal_year};
use log::debug;

pub const FISCAL_YEAR_LABEL: &str = "Fiscal Year";

/// Extra words that mark a cell as a line-item label when deciding orientation.
const LINE_ITEM_KEYWORDS: [&str; 6] = ["revenue", "sales", "profit", "earnings", "income", "capital"];

pub struct HeaderNormalizer<'a> {
    config: &'a ReconciliationConfig,
    item_keywords: Vec<String>,
    concept_labels: Vec<String>,
}

impl<'a> HeaderNormalizer<'a> {
    pub fn new(config: &'a ReconciliationConfig) -> Self {
        let item_keywords = config
            .header_keywords
            .iter()
            .cloned()
            .chain(LINE_ITEM_KEYWORDS.iter().map(|k| k.to_string()))
            .collect();

        let concept_labels = config
            .catalogue
            .entries
            .iter()
            .flat_map(|entry| entry.synonyms.iter())
            .map(|synonym| normalize_label(synonym))
            .filter(|label| !label.is_empty())
            .collect();

        Self {
            config,
            item_keywords,
            concept_labels,
        }
    }

    pub fn normalize(&self, raw: &RawTable) -> Result<NormalizedTable> {
        if raw.is_empty() {
            return Err(ReconciliationError::EmptyInput);
        }

        let width = raw.column_count();
        if width == 0 {
            return Err(ReconciliationError::NoColumns);
        }

        let grid: Vec<Vec<String>> = drop_blank_rows(raw.rows().iter().map(|row| {
            let mut row = row.clone();
            row.resize(width, String::new());
            row
        }));

        if grid.is_empty() {
            return Err(ReconciliationError::EmptyInput);
        }

        let grid = if self.should_transpose(&grid) {
            debug!(
                "Transposing {}x{} table so that periods become rows",
                grid.len(),
                width
            );
            drop_blank_rows(transpose(&drop_label_only_rows(grid)))
        } else {
            grid
        };

        let header_idx = self.detect_header_row(&grid);
        debug!("Using row {} as the header row", header_idx);

        let mut columns = grid[header_idx].clone();
        let rows: Vec<Vec<String>> = grid[header_idx + 1..].to_vec();

        let period_column = if self.is_period_column(&columns, &rows) {
            if !is_period_header(&columns[0]) {
                debug!(
                    "Renaming first column '{}' to '{}'",
                    columns[0], FISCAL_YEAR_LABEL
                );
                columns[0] = FISCAL_YEAR_LABEL.to_string();
            }
            Some(0)
        } else {
            None
        };

        Ok(NormalizedTable::new(columns, rows, period_column))
    }

    /// Selects the first of the leading rows that mentions a structural
    /// keyword, falling back to row 0.
    pub fn detect_header_row(&self, grid: &[Vec<String>]) -> usize {
        grid.iter()
            .take(self.scan_rows())
            .position(|row| contains_any_keyword(&row.join(" "), &self.config.header_keywords))
            .unwrap_or(0)
    }

    /// Periods must end up as rows. Period-like labels decide first, then
    /// line-item keywords, and only without either is a wide table flipped.
    pub fn should_transpose(&self, grid: &[Vec<String>]) -> bool {
        let scanned = &grid[..grid.len().min(self.scan_rows())];

        let row_periods = scanned
            .iter()
            .map(|row| {
                row.iter()
                    .skip(1)
                    .filter(|cell| parse_fiscal_year(cell).is_some())
                    .count()
            })
            .max()
            .unwrap_or(0);
        let column_periods = grid
            .iter()
            .filter(|row| row.first().is_some_and(|cell| parse_fiscal_year(cell).is_some()))
            .count();

        if row_periods != column_periods {
            return row_periods > column_periods;
        }
        if row_periods > 0 {
            return false;
        }

        let row_items = scanned
            .iter()
            .map(|row| {
                row.iter()
                    .skip(1)
                    .filter(|cell| contains_any_keyword(cell, &self.item_keywords))
                    .count()
            })
            .max()
            .unwrap_or(0);
        let column_items = grid
            .iter()
            .skip(1)
            .filter(|row| {
                row.first()
                    .is_some_and(|cell| contains_any_keyword(cell, &self.item_keywords))
            })
            .count();

        if row_items != column_items {
            return column_items > row_items;
        }
        if row_items > 0 {
            return false;
        }

        let width = grid.first().map(Vec::len).unwrap_or(0);
        grid.len() < width
    }

    /// Column 0 carries the period when its header says so, when it has no
    /// header at all, or when its data cells all read as fiscal periods. A
    /// header naming a line item keeps the column a line item even if its
    /// amounts happen to look like years.
    fn is_period_column(&self, columns: &[String], rows: &[Vec<String>]) -> bool {
        let Some(header) = columns.first() else {
            return false;
        };

        if is_period_header(header) || header.trim().is_empty() {
            return true;
        }
        if self.names_line_item(header) {
            return false;
        }

        let mut labels = rows
            .iter()
            .filter_map(|row| row.first())
            .filter(|cell| !cell.trim().is_empty())
            .peekable();

        labels.peek().is_some() && labels.all(|cell| parse_fiscal_year(cell).is_some())
    }

    fn names_line_item(&self, header: &str) -> bool {
        let label = normalize_label(header);
        contains_any_keyword(header, &self.item_keywords)
            || self.concept_labels.iter().any(|c| label.contains(c.as_str()))
    }

    fn scan_rows(&self) -> usize {
        self.config.header_scan_rows.max(1)
    }
}

fn drop_blank_rows(rows: impl IntoIterator<Item = Vec<String>>) -> Vec<Vec<String>> {
    rows.into_iter()
        .filter(|row| row.iter().any(|cell| !cell.trim().is_empty()))
        .collect()
}

/// Titles and section headings ("Liabilities") only fill the first cell.
/// They carry no per-period figures and would become empty columns once transposed.
fn drop_label_only_rows(grid: Vec<Vec<String>>) -> Vec<Vec<String>> {
    let kept: Vec<Vec<String>> = grid
        .iter()
        .filter(|row| row.iter().skip(1).any(|cell| !cell.trim().is_empty()))
        .cloned()
        .collect();

    if kept.is_empty() {
        grid
    } else {
        kept
    }
}

fn transpose(grid: &[Vec<String>]) -> Vec<Vec<String>> {
    let width = grid.first().map(Vec::len).unwrap_or(0);
    (0..width)
        .map(|col| grid.iter().map(|row| row[col].clone()).collect())
        .collect()
}

pub fn normalize_table(raw: &RawTable, config: &ReconciliationConfig) -> Result<NormalizedTable> {
    HeaderNormalizer::new(config).normalize(raw)
}
