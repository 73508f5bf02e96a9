use crate::summary::{BalanceSheetSummary, ReconciliationWarning, TOTAL_LIABILITIES_AND_EQUITY_LABEL};

/// Compares a computed figure with one stated in the source. Differences up
/// to `tolerance` are rounding noise.
pub fn check_line_item(
    item: &str,
    stated: f64,
    computed: f64,
    tolerance: f64,
) -> Option<ReconciliationWarning> {
    let difference = (stated - computed).abs();

    if difference > tolerance {
        Some(ReconciliationWarning::InconsistentTotals {
            item: item.to_string(),
            stated,
            computed,
            difference,
        })
    } else {
        None
    }
}

/// Checks the computed total liabilities and equity against a total stated
/// in the source document. The summary keeps its computed figures either way.
pub fn check_stated_total(
    summary: &BalanceSheetSummary,
    stated: f64,
    tolerance: f64,
) -> Option<ReconciliationWarning> {
    check_line_item(
        TOTAL_LIABILITIES_AND_EQUITY_LABEL,
        stated,
        summary.total_liabilities_and_equity,
        tolerance,
    )
}

/// Whether the summary's totals are exactly the sums of their parts.
pub fn verify_identities(summary: &BalanceSheetSummary) -> bool {
    summary.total_owners_equity == summary.owners_investment + summary.retained_earnings
        && summary.total_liabilities_and_equity
            == summary.short_term_liabilities
                + summary.long_term_liabilities
                + summary.total_owners_equity
}
