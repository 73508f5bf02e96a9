use crate::audit;
use crate::matcher::{MatchFailure, MatchResult};
use crate::schema::CanonicalConcept;
use crate::table::PeriodLabel;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const OWNERS_INVESTMENT_LABEL: &str = "Owner's Investment";
pub const TOTAL_LIABILITIES_AND_EQUITY_LABEL: &str = "Total Liabilities & Equity";

/// A non-fatal data-quality finding attached to a summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReconciliationWarning {
    UnmatchedConcept {
        concept: CanonicalConcept,
    },
    CoercionFailure {
        concept: CanonicalConcept,
        row: usize,
        column: String,
        raw: String,
    },
    NegativeInvestment {
        equity: f64,
        retained_earnings: f64,
    },
    InconsistentTotals {
        item: String,
        stated: f64,
        computed: f64,
        difference: f64,
    },
}

impl fmt::Display for ReconciliationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReconciliationWarning::UnmatchedConcept { concept } => {
                write!(f, "no match found for {}", concept)
            }
            ReconciliationWarning::CoercionFailure {
                concept,
                row,
                column,
                raw,
            } => {
                if raw.is_empty() {
                    write!(f, "{} in row {}: column '{}' is blank", concept, row, column)
                } else {
                    write!(
                        f,
                        "{} in row {}: column '{}' holds '{}', which is not a number",
                        concept, row, column, raw
                    )
                }
            }
            ReconciliationWarning::NegativeInvestment {
                equity,
                retained_earnings,
            } => write!(
                f,
                "{} would be negative (equity {:.2} less retained earnings {:.2}); floored at 0",
                OWNERS_INVESTMENT_LABEL, equity, retained_earnings
            ),
            ReconciliationWarning::InconsistentTotals {
                item,
                stated,
                computed,
                difference,
            } => write!(
                f,
                "{} computed as {:.2} but the source states {:.2} (difference {:.2})",
                item, computed, stated, difference
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BalanceSheetCategory {
    ShortTermLiabilities,
    LongTermLiabilities,
    OwnersInvestment,
    RetainedEarnings,
    TotalOwnersEquity,
    TotalLiabilitiesAndEquity,
}

impl BalanceSheetCategory {
    pub const ALL: [BalanceSheetCategory; 6] = [
        BalanceSheetCategory::ShortTermLiabilities,
        BalanceSheetCategory::LongTermLiabilities,
        BalanceSheetCategory::OwnersInvestment,
        BalanceSheetCategory::RetainedEarnings,
        BalanceSheetCategory::TotalOwnersEquity,
        BalanceSheetCategory::TotalLiabilitiesAndEquity,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            BalanceSheetCategory::ShortTermLiabilities => "Short-Term Liabilities",
            BalanceSheetCategory::LongTermLiabilities => "Long-Term Liabilities",
            BalanceSheetCategory::OwnersInvestment => OWNERS_INVESTMENT_LABEL,
            BalanceSheetCategory::RetainedEarnings => "Retained Earnings",
            BalanceSheetCategory::TotalOwnersEquity => "Total Owner's Equity",
            BalanceSheetCategory::TotalLiabilitiesAndEquity => TOTAL_LIABILITIES_AND_EQUITY_LABEL,
        }
    }
}

/// The canonical balance sheet for one reporting period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceSheetSummary {
    /// The period label, when the table has a period column.
    pub period: Option<PeriodLabel>,

    #[serde(rename = "Short-Term Liabilities")]
    pub short_term_liabilities: f64,

    #[serde(rename = "Long-Term Liabilities")]
    pub long_term_liabilities: f64,

    #[serde(rename = "Owner's Investment")]
    pub owners_investment: f64,

    #[serde(rename = "Retained Earnings")]
    pub retained_earnings: f64,

    #[serde(rename = "Total Owner's Equity")]
    pub total_owners_equity: f64,

    #[serde(rename = "Total Liabilities & Equity")]
    pub total_liabilities_and_equity: f64,

    /// Income statement and asset figures for ratio consumers. `None` when unmatched.
    pub revenue: Option<f64>,
    pub net_profit: Option<f64>,
    pub current_assets: Option<f64>,

    pub warnings: Vec<ReconciliationWarning>,
}

impl BalanceSheetSummary {
    pub fn amount(&self, category: BalanceSheetCategory) -> f64 {
        match category {
            BalanceSheetCategory::ShortTermLiabilities => self.short_term_liabilities,
            BalanceSheetCategory::LongTermLiabilities => self.long_term_liabilities,
            BalanceSheetCategory::OwnersInvestment => self.owners_investment,
            BalanceSheetCategory::RetainedEarnings => self.retained_earnings,
            BalanceSheetCategory::TotalOwnersEquity => self.total_owners_equity,
            BalanceSheetCategory::TotalLiabilitiesAndEquity => self.total_liabilities_and_equity,
        }
    }

    pub fn categories(&self) -> Vec<(BalanceSheetCategory, f64)> {
        BalanceSheetCategory::ALL
            .iter()
            .map(|&category| (category, self.amount(category)))
            .collect()
    }

    pub fn total_liabilities(&self) -> f64 {
        self.short_term_liabilities + self.long_term_liabilities
    }

    pub fn warning_messages(&self) -> Vec<String> {
        self.warnings.iter().map(ToString::to_string).collect()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

pub struct SummaryBuilder {
    tolerance: f64,
}

impl SummaryBuilder {
    pub fn new(tolerance: f64) -> Self {
        Self { tolerance }
    }

    /// Derives the canonical balance sheet from one period's matches. Never fails:
    /// missing inputs become zeros plus warnings.
    pub fn build(
        &self,
        matches: &[MatchResult],
        period: Option<PeriodLabel>,
        stated_total: Option<f64>,
    ) -> BalanceSheetSummary {
        let find = |concept: CanonicalConcept| matches.iter().find(|m| m.concept == concept);
        let amount = |concept: CanonicalConcept| find(concept).and_then(MatchResult::amount);

        let mut warnings = Vec::new();

        for concept in CanonicalConcept::ALL {
            match find(concept) {
                Some(result) => match &result.failure {
                    Some(MatchFailure::NotNumeric { row, raw }) => {
                        warnings.push(ReconciliationWarning::CoercionFailure {
                            concept,
                            row: *row,
                            column: result.column.clone().unwrap_or_default(),
                            raw: raw.clone(),
                        });
                    }
                    Some(MatchFailure::NoCandidate) if concept.is_required() => {
                        warnings.push(ReconciliationWarning::UnmatchedConcept { concept });
                    }
                    _ => {}
                },
                None if concept.is_required() => {
                    warnings.push(ReconciliationWarning::UnmatchedConcept { concept });
                }
                None => {}
            }
        }

        let short_term = amount(CanonicalConcept::ShortTermLiabilities).unwrap_or(0.0);
        let long_term = amount(CanonicalConcept::LongTermLiabilities).unwrap_or(0.0);

        let equity = amount(CanonicalConcept::TotalOwnersEquity);
        let retained = amount(CanonicalConcept::RetainedEarnings);

        let (investment, retained_earnings) = match (equity, retained) {
            (Some(equity), Some(retained)) => {
                let investment = equity - retained;
                if investment < 0.0 {
                    debug!(
                        "Negative owner's investment ({} - {}), flooring at zero",
                        equity, retained
                    );
                    warnings.push(ReconciliationWarning::NegativeInvestment {
                        equity,
                        retained_earnings: retained,
                    });
                    (0.0, retained)
                } else {
                    if let Some(stated) = amount(CanonicalConcept::OwnersInvestment) {
                        warnings.extend(audit::check_line_item(
                            OWNERS_INVESTMENT_LABEL,
                            stated,
                            investment,
                            self.tolerance,
                        ));
                    }
                    (investment, retained)
                }
            }
            (Some(equity), None) => (equity, 0.0),
            (None, _) => (0.0, 0.0),
        };

        let total_owners_equity = investment + retained_earnings;
        let total_liabilities_and_equity = short_term + long_term + total_owners_equity;

        let mut summary = BalanceSheetSummary {
            period,
            short_term_liabilities: short_term,
            long_term_liabilities: long_term,
            owners_investment: investment,
            retained_earnings,
            total_owners_equity,
            total_liabilities_and_equity,
            revenue: amount(CanonicalConcept::Revenue),
            net_profit: amount(CanonicalConcept::NetProfit),
            current_assets: amount(CanonicalConcept::CurrentAssets),
            warnings,
        };

        if let Some(stated) = stated_total {
            if let Some(warning) = audit::check_stated_total(&summary, stated, self.tolerance) {
                summary.warnings.push(warning);
            }
        }

        summary
    }
}
