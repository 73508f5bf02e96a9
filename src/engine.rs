use crate::audit::verify_identities;
use crate::error::{ReconciliationError, Result};
use crate::ingestion::HeaderNormalizer;
use crate::matcher::{
    ColumnMap, CompiledCatalogue, FieldMatcher, MatchResult, NormalizedLevenshtein, Similarity,
};
use crate::schema::ReconciliationConfig;
use crate::summary::{BalanceSheetSummary, SummaryBuilder};
use crate::table::{NormalizedTable, RawTable};
use log::{debug, info};

/// Runs the whole pipeline: raw grid, normalized table, per-concept matches,
/// derived totals. Holds only read-only configuration, so one instance can
/// serve concurrent reconciliations.
pub struct Reconciler<S: Similarity = NormalizedLevenshtein> {
    config: ReconciliationConfig,
    catalogue: CompiledCatalogue,
    similarity: S,
}

impl Reconciler<NormalizedLevenshtein> {
    pub fn new(config: ReconciliationConfig) -> Result<Self> {
        Self::with_similarity(config, NormalizedLevenshtein)
    }
}

impl Default for Reconciler<NormalizedLevenshtein> {
    fn default() -> Self {
        let config = ReconciliationConfig::default();
        Self {
            catalogue: CompiledCatalogue::compile(&config),
            config,
            similarity: NormalizedLevenshtein,
        }
    }
}

impl<S: Similarity> Reconciler<S> {
    pub fn with_similarity(config: ReconciliationConfig, similarity: S) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            catalogue: CompiledCatalogue::compile(&config),
            config,
            similarity,
        })
    }

    pub fn config(&self) -> &ReconciliationConfig {
        &self.config
    }

    pub fn normalize(&self, raw: &RawTable) -> Result<NormalizedTable> {
        HeaderNormalizer::new(&self.config).normalize(raw)
    }

    fn matcher(&self) -> FieldMatcher<'_, S> {
        FieldMatcher::new(&self.catalogue, &self.similarity, self.config.similarity_threshold)
    }

    /// One match per catalogue concept for the given data row.
    pub fn match_period(&self, table: &NormalizedTable, row: usize) -> Result<Vec<MatchResult>> {
        check_row(table, row)?;
        let matcher = self.matcher();
        let map = matcher.resolve_columns(table);
        Ok(matcher.match_row(table, &map, row))
    }

    /// Summary of the most recent period.
    pub fn reconcile(&self, raw: &RawTable) -> Result<BalanceSheetSummary> {
        self.reconcile_with_stated_total(raw, None)
    }

    /// Like [`Reconciler::reconcile`], auditing against `stated_total` when
    /// given instead of any total column found in the table.
    pub fn reconcile_with_stated_total(
        &self,
        raw: &RawTable,
        stated_total: Option<f64>,
    ) -> Result<BalanceSheetSummary> {
        let table = self.normalize(raw)?;
        info!(
            "Reconciling latest period of a {}-column table with {} data rows",
            table.columns().len(),
            table.row_count()
        );

        let matcher = self.matcher();
        let map = matcher.resolve_columns(&table);

        match table.latest_row() {
            Some(row) => Ok(self.summarize(&matcher, &table, &map, row, stated_total)),
            None => {
                debug!("Header-only table: every concept is unmatched");
                Ok(SummaryBuilder::new(self.config.total_tolerance).build(&[], None, stated_total))
            }
        }
    }

    /// One summary per period, oldest first when the periods carry fiscal years.
    pub fn reconcile_trend(&self, raw: &RawTable) -> Result<Vec<BalanceSheetSummary>> {
        let table = self.normalize(raw)?;
        info!(
            "Reconciling {} periods of a {}-column table",
            table.row_count(),
            table.columns().len()
        );

        let matcher = self.matcher();
        let map = matcher.resolve_columns(&table);

        Ok(table
            .period_order()
            .into_iter()
            .map(|row| self.summarize(&matcher, &table, &map, row, None))
            .collect())
    }

    /// Summary of a specific data row of an already normalized table.
    pub fn reconcile_row(&self, table: &NormalizedTable, row: usize) -> Result<BalanceSheetSummary> {
        check_row(table, row)?;
        let matcher = self.matcher();
        let map = matcher.resolve_columns(table);
        Ok(self.summarize(&matcher, table, &map, row, None))
    }

    fn summarize(
        &self,
        matcher: &FieldMatcher<'_, S>,
        table: &NormalizedTable,
        map: &ColumnMap,
        row: usize,
        stated_total: Option<f64>,
    ) -> BalanceSheetSummary {
        let matches = matcher.match_row(table, map, row);
        let stated_total = stated_total.or_else(|| matcher.stated_total(table, map, row));

        let summary = SummaryBuilder::new(self.config.total_tolerance).build(
            &matches,
            table.period(row),
            stated_total,
        );

        debug_assert!(verify_identities(&summary));
        for warning in &summary.warnings {
            debug!("Row {}: {}", row, warning);
        }

        summary
    }
}

fn check_row(table: &NormalizedTable, row: usize) -> Result<()> {
    if row >= table.row_count() {
        return Err(ReconciliationError::InvalidPeriodRow {
            row,
            rows: table.row_count(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::CanonicalConcept;
    use crate::summary::ReconciliationWarning;

    fn raw(rows: Vec<Vec<&str>>) -> RawTable {
        RawTable::from_rows(rows)
    }

    #[test]
    fn test_latest_period_selected_by_year() {
        let reconciler: Reconciler = Reconciler::default();
        let summary = reconciler
            .reconcile(&raw(vec![
                vec!["Fiscal Year", "Current Liabilities", "Non-Current Liabilities", "Total Equity", "Retained Earnings"],
                vec!["2023", "500", "300", "800", "200"],
                vec!["2021", "100", "100", "100", "100"],
            ]))
            .unwrap();

        assert_eq!(summary.period.as_ref().and_then(|p| p.fiscal_year), Some(2023));
        assert_eq!(summary.total_liabilities_and_equity, 1600.0);
    }

    #[test]
    fn test_header_only_table_yields_zero_summary() {
        let reconciler: Reconciler = Reconciler::default();
        let summary = reconciler
            .reconcile(&raw(vec![vec!["Fiscal Year", "Current Liabilities", "Total Equity"]]))
            .unwrap();

        assert_eq!(summary.total_liabilities_and_equity, 0.0);
        assert_eq!(summary.period, None);
        let unmatched: Vec<CanonicalConcept> = summary
            .warnings
            .iter()
            .filter_map(|w| match w {
                ReconciliationWarning::UnmatchedConcept { concept } => Some(*concept),
                _ => None,
            })
            .collect();
        assert_eq!(
            unmatched,
            vec![
                CanonicalConcept::ShortTermLiabilities,
                CanonicalConcept::LongTermLiabilities,
                CanonicalConcept::RetainedEarnings,
                CanonicalConcept::TotalOwnersEquity,
            ]
        );

        assert!(reconciler
            .reconcile_trend(&raw(vec![vec!["Fiscal Year", "Total Equity"]]))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_explicit_stated_total_overrides_column() {
        let reconciler: Reconciler = Reconciler::default();
        let table = raw(vec![
            vec!["Fiscal Year", "Current Liabilities", "Total Equity", "Total Liabilities and Equity"],
            vec!["2023", "200", "300", "500"],
        ]);

        assert!(reconciler.reconcile(&table).unwrap().warnings.iter().all(|w| !matches!(
            w,
            ReconciliationWarning::InconsistentTotals { .. }
        )));

        let summary = reconciler.reconcile_with_stated_total(&table, Some(900.0)).unwrap();
        assert!(summary.warnings.iter().any(|w| matches!(
            w,
            ReconciliationWarning::InconsistentTotals { stated, .. } if *stated == 900.0
        )));
    }

    #[test]
    fn test_match_period_row_bounds() {
        let reconciler: Reconciler = Reconciler::default();
        let table = reconciler
            .normalize(&raw(vec![vec!["Fiscal Year", "Revenue"], vec!["2023", "10"]]))
            .unwrap();

        let matches = reconciler.match_period(&table, 0).unwrap();
        assert_eq!(matches.len(), CanonicalConcept::ALL.len());
        assert!(matches!(
            reconciler.match_period(&table, 1),
            Err(ReconciliationError::InvalidPeriodRow { row: 1, rows: 1 })
        ));
        assert!(reconciler.reconcile_row(&table, 5).is_err());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = ReconciliationConfig {
            total_tolerance: -1.0,
            ..Default::default()
        };
        assert!(matches!(
            Reconciler::new(config),
            Err(ReconciliationError::InvalidTolerance(_))
        ));
    }

    #[test]
    fn test_reconciler_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Reconciler>();
    }
}
