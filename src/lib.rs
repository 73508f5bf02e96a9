//! # Balance Sheet Reconciler
//!
//! A library for turning loosely-structured financial statement tables (exported from
//! heterogeneous accounting systems) into a canonical balance sheet summary.
//!
//! ## Core Concepts
//!
//! - **Raw Table**: A grid of text cells as read from a spreadsheet or CSV, with no guaranteed orientation
//! - **Normalized Table**: A promoted header row plus one data row per reporting period
//! - **Canonical Concepts**: The fixed line items (liabilities, equity, retained earnings, ...) located by synonym
//!   and approximate label matching
//! - **Summary**: Six derived balance sheet categories that satisfy the accounting identities exactly,
//!   plus structured warnings for anything that could not be found or did not add up
//!
//! Data-quality problems never abort a run: unmatched or non-numeric items become zeros with a warning.
//! Only an empty table is a hard error.
//!
//! ## Example
//!
//! ```rust,ignore
//! use balance_sheet_reconciler::*;
//!
//! let raw = RawTable::from_rows(vec![
//!     vec!["Fiscal Year", "Current Liabilities", "Non-Current Liabilities", "Total Equity", "Retained Earnings"],
//!     vec!["2023", "500", "300", "800", "200"],
//! ]);
//!
//! let summary = reconcile_balance_sheet(&raw).unwrap();
//! assert_eq!(summary.owners_investment, 600.0);
//! assert_eq!(summary.total_liabilities_and_equity, 1600.0);
//! assert!(summary.warnings.is_empty());
//! ```

pub mod audit;
pub mod benchmarks;
pub mod engine;
pub mod error;
pub mod ingestion;
pub mod matcher;
pub mod ratios;
pub mod schema;
pub mod summary;
pub mod table;
pub mod utils;

pub use audit::{check_line_item, check_stated_total, verify_identities};
pub use benchmarks::{detect_industry, BenchmarkComparison, BenchmarkTable, Industry, Standing};
pub use engine::Reconciler;
pub use error::{ReconciliationError, Result};
pub use ingestion::{normalize_table, HeaderNormalizer, FISCAL_YEAR_LABEL};
pub use matcher::{
    FieldMatcher, JaroWinkler, MatchFailure, MatchOutcome, MatchResult, NormalizedLevenshtein,
    Similarity,
};
pub use ratios::{FinancialRatios, RatioKind};
pub use schema::*;
pub use summary::{
    BalanceSheetCategory, BalanceSheetSummary, ReconciliationWarning, SummaryBuilder,
};
pub use table::{CellValue, NormalizedTable, PeriodLabel, RawTable};

/// Reconciles the most recent period with the default configuration.
pub fn reconcile_balance_sheet(raw: &RawTable) -> Result<BalanceSheetSummary> {
    let reconciler: Reconciler = Reconciler::default();
    reconciler.reconcile(raw)
}

/// Reconciles every period with the default configuration.
pub fn reconcile_balance_sheet_trend(raw: &RawTable) -> Result<Vec<BalanceSheetSummary>> {
    let reconciler: Reconciler = Reconciler::default();
    reconciler.reconcile_trend(raw)
}
