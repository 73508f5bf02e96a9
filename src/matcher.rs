use crate::schema::{CanonicalConcept, ReconciliationConfig};
use crate::table::{CellValue, NormalizedTable};
use crate::utils::normalize_label;
use log::debug;
use serde::{Deserialize, Serialize};

/// Reverse containment (column label inside a pattern) only counts when the
/// column covers at least this share of the pattern, so a bare "Total" column
/// is not taken for "Total Equity".
const MIN_REVERSE_COVERAGE: f64 = 0.5;

/// String similarity on a 0.0-1.0 scale, 1.0 meaning identical.
pub trait Similarity: Send + Sync {
    fn similarity(&self, a: &str, b: &str) -> f64;
}

/// Levenshtein distance scaled by the longer string's length.
#[derive(Debug, Clone, Copy, Default)]
pub struct NormalizedLevenshtein;

impl Similarity for NormalizedLevenshtein {
    fn similarity(&self, a: &str, b: &str) -> f64 {
        strsim::normalized_levenshtein(a, b)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct JaroWinkler;

impl Similarity for JaroWinkler {
    fn similarity(&self, a: &str, b: &str) -> f64 {
        strsim::jaro_winkler(a, b)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchOutcome {
    /// A synonym and the column label contain one another.
    Exact,
    /// Closest label above the similarity threshold.
    Fuzzy,
    Unmatched,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum MatchFailure {
    NoCandidate,
    /// The matched cell was blank or not a number.
    NotNumeric { row: usize, raw: String },
}

/// One concept's value for one period row. `value` is 0.0 whenever
/// `outcome` is `Unmatched`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub concept: CanonicalConcept,
    pub column: Option<String>,
    pub value: f64,
    pub outcome: MatchOutcome,
    pub failure: Option<MatchFailure>,
}

impl MatchResult {
    pub fn unmatched(concept: CanonicalConcept) -> Self {
        Self {
            concept,
            column: None,
            value: 0.0,
            outcome: MatchOutcome::Unmatched,
            failure: Some(MatchFailure::NoCandidate),
        }
    }

    pub fn is_matched(&self) -> bool {
        self.outcome != MatchOutcome::Unmatched
    }

    /// The value if the concept was found and numeric.
    pub fn amount(&self) -> Option<f64> {
        self.is_matched().then_some(self.value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConceptPatterns {
    pub concept: CanonicalConcept,
    pub patterns: Vec<String>,
    pub exclusions: Vec<String>,
}

impl ConceptPatterns {
    fn excludes(&self, column: &str) -> bool {
        self.exclusions.iter().any(|e| column.contains(e.as_str()))
    }
}

/// The synonym catalogue with every pattern pre-normalized. Built once from
/// the configuration and shared read-only by every reconciliation.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledCatalogue {
    pub concepts: Vec<ConceptPatterns>,
    pub stated_total: Vec<String>,
}

impl CompiledCatalogue {
    pub fn compile(config: &ReconciliationConfig) -> Self {
        let concepts = config
            .catalogue
            .entries
            .iter()
            .map(|entry| ConceptPatterns {
                concept: entry.concept,
                patterns: normalize_all(&entry.synonyms),
                exclusions: normalize_all(&entry.exclusions),
            })
            .collect();

        Self {
            concepts,
            stated_total: normalize_all(&config.stated_total_synonyms),
        }
    }
}

fn normalize_all(labels: &[String]) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::with_capacity(labels.len());
    for label in labels {
        let label = normalize_label(label);
        if !label.is_empty() && !normalized.contains(&label) {
            normalized.push(label);
        }
    }
    normalized
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnAssignment {
    pub concept: CanonicalConcept,
    pub column: Option<usize>,
    pub outcome: MatchOutcome,
    pub score: f64,
}

/// Which column, if any, each concept reads from. Column choice depends only
/// on the header, so one map serves every period row of a table.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnMap {
    pub assignments: Vec<ColumnAssignment>,
    pub stated_total: Option<usize>,
}

impl ColumnMap {
    pub fn assignment(&self, concept: CanonicalConcept) -> Option<&ColumnAssignment> {
        self.assignments.iter().find(|a| a.concept == concept)
    }
}

pub struct FieldMatcher<'a, S: Similarity> {
    catalogue: &'a CompiledCatalogue,
    similarity: &'a S,
    threshold: f64,
}

impl<'a, S: Similarity> FieldMatcher<'a, S> {
    pub fn new(catalogue: &'a CompiledCatalogue, similarity: &'a S, threshold: f64) -> Self {
        Self {
            catalogue,
            similarity,
            threshold,
        }
    }

    /// Assigns columns to concepts. Containment hits for every concept are
    /// taken before any fuzzy match, and a column serves at most one concept.
    pub fn resolve_columns(&self, table: &NormalizedTable) -> ColumnMap {
        let normalized: Vec<String> = table.columns().iter().map(|c| normalize_label(c)).collect();

        let mut claimed: Vec<bool> = normalized.iter().map(String::is_empty).collect();
        if let Some(period) = table.period_column() {
            claimed[period] = true;
        }

        let stated_total = find_containment(&self.catalogue.stated_total, &[], &normalized, &claimed, false);
        if let Some(idx) = stated_total {
            claimed[idx] = true;
        }

        let mut assignments: Vec<ColumnAssignment> = Vec::with_capacity(self.catalogue.concepts.len());

        for entry in &self.catalogue.concepts {
            let hit = find_containment(&entry.patterns, &entry.exclusions, &normalized, &claimed, true);
            if let Some(idx) = hit {
                claimed[idx] = true;
            }
            assignments.push(ColumnAssignment {
                concept: entry.concept,
                column: hit,
                outcome: if hit.is_some() {
                    MatchOutcome::Exact
                } else {
                    MatchOutcome::Unmatched
                },
                score: if hit.is_some() { 1.0 } else { 0.0 },
            });
        }

        for (entry, assignment) in self.catalogue.concepts.iter().zip(assignments.iter_mut()) {
            if assignment.column.is_some() {
                continue;
            }
            if let Some((idx, score)) = self.find_fuzzy(entry, &normalized, &claimed) {
                claimed[idx] = true;
                assignment.column = Some(idx);
                assignment.outcome = MatchOutcome::Fuzzy;
                assignment.score = score;
            }
        }

        for assignment in &assignments {
            match assignment.column {
                Some(idx) => debug!(
                    "{} -> column '{}' ({:?}, score {:.3})",
                    assignment.concept,
                    table.columns()[idx],
                    assignment.outcome,
                    assignment.score
                ),
                None => debug!("{} -> no matching column", assignment.concept),
            }
        }

        ColumnMap {
            assignments,
            stated_total,
        }
    }

    /// The first pattern, in priority order, whose closest unclaimed column
    /// clears the threshold wins. Equal scores keep the earlier column.
    fn find_fuzzy(
        &self,
        entry: &ConceptPatterns,
        normalized: &[String],
        claimed: &[bool],
    ) -> Option<(usize, f64)> {
        for pattern in &entry.patterns {
            let mut best: Option<(usize, f64)> = None;

            for (idx, column) in normalized.iter().enumerate() {
                if claimed[idx] || entry.excludes(column) {
                    continue;
                }
                let score = self.similarity.similarity(pattern, column);
                if best.map_or(true, |(_, top)| score > top) {
                    best = Some((idx, score));
                }
            }

            if let Some((idx, score)) = best {
                if score > self.threshold {
                    return Some((idx, score));
                }
            }
        }

        None
    }

    /// Reads and coerces every concept's cell in one data row.
    pub fn match_row(&self, table: &NormalizedTable, map: &ColumnMap, row: usize) -> Vec<MatchResult> {
        map.assignments
            .iter()
            .map(|assignment| {
                let Some(idx) = assignment.column else {
                    return MatchResult::unmatched(assignment.concept);
                };

                let column = table.columns()[idx].clone();
                let raw = table.cell(row, idx).unwrap_or_default();

                match CellValue::coerce(raw) {
                    CellValue::Number(value) => MatchResult {
                        concept: assignment.concept,
                        column: Some(column),
                        value,
                        outcome: assignment.outcome,
                        failure: None,
                    },
                    CellValue::Text(_) | CellValue::Empty => MatchResult {
                        concept: assignment.concept,
                        column: Some(column),
                        value: 0.0,
                        outcome: MatchOutcome::Unmatched,
                        failure: Some(MatchFailure::NotNumeric {
                            row,
                            raw: raw.trim().to_string(),
                        }),
                    },
                }
            })
            .collect()
    }

    pub fn stated_total(&self, table: &NormalizedTable, map: &ColumnMap, row: usize) -> Option<f64> {
        let idx = map.stated_total?;
        table.cell(row, idx).and_then(|raw| CellValue::coerce(raw).as_number())
    }
}

/// For each pattern in priority order: an identical column first, then the
/// first column in table order that contains the pattern, or with `reverse`
/// is contained by it.
///
/// Stated totals never match in reverse: "Total Equity" and "Total Liabilities"
/// are both fragments of "Total Equity & Liabilities".
fn find_containment(
    patterns: &[String],
    exclusions: &[String],
    normalized: &[String],
    claimed: &[bool],
    reverse: bool,
) -> Option<usize> {
    let available = |idx: usize| {
        !claimed[idx] && !exclusions.iter().any(|e| normalized[idx].contains(e.as_str()))
    };

    for pattern in patterns {
        if let Some(idx) = (0..normalized.len()).find(|&idx| available(idx) && normalized[idx] == *pattern) {
            return Some(idx);
        }

        let contained = (0..normalized.len()).find(|&idx| {
            if !available(idx) {
                return false;
            }
            let column = &normalized[idx];
            column.contains(pattern.as_str())
                || (reverse
                    && pattern.contains(column.as_str())
                    && column.len() as f64 >= pattern.len() as f64 * MIN_REVERSE_COVERAGE)
        });
        if contained.is_some() {
            return contained;
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(columns: &[&str], rows: &[&[&str]]) -> NormalizedTable {
        NormalizedTable::new(
            columns.iter().map(|c| c.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
            Some(0),
        )
    }

    fn resolve(table: &NormalizedTable) -> ColumnMap {
        let catalogue = CompiledCatalogue::compile(&ReconciliationConfig::default());
        FieldMatcher::new(&catalogue, &NormalizedLevenshtein, 0.6).resolve_columns(table)
    }

    fn column_of(map: &ColumnMap, concept: CanonicalConcept) -> Option<usize> {
        map.assignment(concept).and_then(|a| a.column)
    }

    #[test]
    fn test_matching_ignores_case_and_punctuation() {
        for label in ["Short-Term Liabilities", "short term liabilities", "SHORTTERMLIABILITIES", "short_term_liabilities "] {
            let map = resolve(&table(&["Fiscal Year", label], &[]));
            let assignment = map.assignment(CanonicalConcept::ShortTermLiabilities).unwrap();
            assert_eq!(assignment.column, Some(1), "label {:?}", label);
            assert_eq!(assignment.outcome, MatchOutcome::Exact);
        }
    }

    #[test]
    fn test_non_current_not_taken_for_current() {
        let map = resolve(&table(
            &["Fiscal Year", "Non-Current Liabilities", "Current Liabilities"],
            &[],
        ));
        assert_eq!(column_of(&map, CanonicalConcept::ShortTermLiabilities), Some(2));
        assert_eq!(column_of(&map, CanonicalConcept::LongTermLiabilities), Some(1));
    }

    #[test]
    fn test_more_specific_pattern_wins() {
        let map = resolve(&table(
            &["Fiscal Year", "Current Liabilities", "Total Short-Term Liabilities"],
            &[],
        ));
        assert_eq!(column_of(&map, CanonicalConcept::ShortTermLiabilities), Some(2));
    }

    #[test]
    fn test_first_column_wins_ties() {
        let map = resolve(&table(
            &["Fiscal Year", "Revenue (Domestic)", "Revenue (Export)"],
            &[],
        ));
        assert_eq!(column_of(&map, CanonicalConcept::Revenue), Some(1));
    }

    #[test]
    fn test_fuzzy_recovery_and_unrelated_labels() {
        let t = table(
            &["Fiscal Year", "Curr Liab.", "Marketing Spend"],
            &[&["2023", "500", "75"]],
        );
        let map = resolve(&t);

        let short_term = map.assignment(CanonicalConcept::ShortTermLiabilities).unwrap();
        assert_eq!(short_term.column, Some(1));
        assert_eq!(short_term.outcome, MatchOutcome::Fuzzy);
        assert!(short_term.score > 0.6);

        assert!(map.assignments.iter().all(|a| a.column != Some(2)));
    }

    #[test]
    fn test_bare_total_column_not_reverse_matched() {
        let map = resolve(&table(&["Fiscal Year", "Total"], &[]));
        assert!(map.assignments.iter().all(|a| a.column.is_none()));
        assert_eq!(map.stated_total, None);
    }

    #[test]
    fn test_accumulated_depreciation_is_not_retained_earnings() {
        let map = resolve(&table(
            &["Fiscal Year", "Accumulated Depreciation", "Accumulated Profits"],
            &[],
        ));
        assert_eq!(column_of(&map, CanonicalConcept::RetainedEarnings), Some(2));
    }

    #[test]
    fn test_stated_total_claimed_before_equity() {
        let map = resolve(&table(
            &["Fiscal Year", "Total Liabilities & Equity", "Equity"],
            &[],
        ));
        assert_eq!(map.stated_total, Some(1));
        assert_eq!(column_of(&map, CanonicalConcept::TotalOwnersEquity), Some(2));
    }

    #[test]
    fn test_equity_and_liability_subtotals_are_not_stated_totals() {
        let map = resolve(&table(
            &["Fiscal Year", "Current Liabilities", "Non-Current Liabilities", "Total Liabilities", "Total Equity"],
            &[],
        ));
        assert_eq!(map.stated_total, None);
        assert_eq!(column_of(&map, CanonicalConcept::TotalOwnersEquity), Some(4));

        let map = resolve(&table(&["Fiscal Year", "Total Equity", "Total Equity and Liabilities"], &[]));
        assert_eq!(map.stated_total, Some(2));
        assert_eq!(column_of(&map, CanonicalConcept::TotalOwnersEquity), Some(1));
    }

    #[test]
    fn test_short_and_long_term_assets_are_not_liabilities() {
        let map = resolve(&table(
            &["Fiscal Year", "Short-Term Investments", "Long-Term Investments", "Long-Term Receivables", "Short-Term Assets"],
            &[],
        ));
        assert_eq!(column_of(&map, CanonicalConcept::ShortTermLiabilities), None);
        assert_eq!(column_of(&map, CanonicalConcept::LongTermLiabilities), None);
    }

    #[test]
    fn test_period_column_never_matches() {
        let t = NormalizedTable::new(vec!["Net Worth".into()], vec![vec!["2023".into()]], Some(0));
        let map = resolve(&t);
        assert!(map.assignments.iter().all(|a| a.column.is_none()));
    }

    #[test]
    fn test_match_row_coercion() {
        let t = table(
            &["Fiscal Year", "Current Liabilities", "Total Equity", "Revenue", "Net Profit"],
            &[&["2023", "1,500", "n/a", "", "(20)"]],
        );
        let catalogue = CompiledCatalogue::compile(&ReconciliationConfig::default());
        let matcher = FieldMatcher::new(&catalogue, &NormalizedLevenshtein, 0.6);
        let map = matcher.resolve_columns(&t);
        let results = matcher.match_row(&t, &map, 0);

        let find = |concept: CanonicalConcept| results.iter().find(|r| r.concept == concept).unwrap();

        let short_term = find(CanonicalConcept::ShortTermLiabilities);
        assert_eq!(short_term.value, 1500.0);
        assert_eq!(short_term.amount(), Some(1500.0));

        let equity = find(CanonicalConcept::TotalOwnersEquity);
        assert_eq!(equity.outcome, MatchOutcome::Unmatched);
        assert_eq!(equity.value, 0.0);
        assert_eq!(equity.column.as_deref(), Some("Total Equity"));
        assert_eq!(
            equity.failure,
            Some(MatchFailure::NotNumeric {
                row: 0,
                raw: "n/a".to_string()
            })
        );

        let revenue = find(CanonicalConcept::Revenue);
        assert_eq!(revenue.amount(), None);
        assert!(matches!(revenue.failure, Some(MatchFailure::NotNumeric { .. })));

        assert_eq!(find(CanonicalConcept::NetProfit).amount(), Some(-20.0));

        let assets = find(CanonicalConcept::CurrentAssets);
        assert_eq!(assets, &MatchResult::unmatched(CanonicalConcept::CurrentAssets));
        assert!(results.iter().filter(|r| !r.is_matched()).all(|r| r.value == 0.0));
    }

    #[test]
    fn test_similarity_is_pluggable() {
        struct Never;
        impl Similarity for Never {
            fn similarity(&self, _a: &str, _b: &str) -> f64 {
                0.0
            }
        }

        let t = table(&["Fiscal Year", "Curr Liab."], &[]);
        let catalogue = CompiledCatalogue::compile(&ReconciliationConfig::default());
        let map = FieldMatcher::new(&catalogue, &Never, 0.6).resolve_columns(&t);
        assert_eq!(column_of(&map, CanonicalConcept::ShortTermLiabilities), None);

        let map = FieldMatcher::new(&catalogue, &JaroWinkler, 0.6).resolve_columns(&t);
        assert_eq!(column_of(&map, CanonicalConcept::ShortTermLiabilities), Some(1));
    }
}
