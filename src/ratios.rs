use crate::summary::BalanceSheetSummary;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
pub enum RatioKind {
    DebtToEquity,
    EquityRatio,
    CurrentRatio,
    ReturnOnEquity,
    NetProfitMargin,
}

impl RatioKind {
    pub const ALL: [RatioKind; 5] = [
        RatioKind::DebtToEquity,
        RatioKind::EquityRatio,
        RatioKind::CurrentRatio,
        RatioKind::ReturnOnEquity,
        RatioKind::NetProfitMargin,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            RatioKind::DebtToEquity => "Debt-to-Equity Ratio",
            RatioKind::EquityRatio => "Equity Ratio",
            RatioKind::CurrentRatio => "Current Ratio",
            RatioKind::ReturnOnEquity => "ROE",
            RatioKind::NetProfitMargin => "Net Profit Margin",
        }
    }
}

impl fmt::Display for RatioKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Standard ratios over one summary. A ratio is `None` when an input was not
/// found in the source or its denominator is zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialRatios {
    pub total_liabilities: f64,
    pub debt_to_equity: Option<f64>,
    pub equity_ratio: Option<f64>,
    pub current_ratio: Option<f64>,
    pub return_on_equity: Option<f64>,
    pub net_profit_margin: Option<f64>,
}

impl FinancialRatios {
    pub fn from_summary(summary: &BalanceSheetSummary) -> Self {
        let total_liabilities = summary.total_liabilities();
        let equity = summary.total_owners_equity;

        Self {
            total_liabilities,
            debt_to_equity: safe_ratio(total_liabilities, equity),
            equity_ratio: safe_ratio(equity, total_liabilities + equity),
            current_ratio: summary
                .current_assets
                .and_then(|assets| safe_ratio(assets, summary.short_term_liabilities)),
            return_on_equity: summary
                .net_profit
                .and_then(|profit| safe_ratio(profit, equity)),
            net_profit_margin: summary
                .net_profit
                .zip(summary.revenue)
                .and_then(|(profit, revenue)| safe_ratio(profit, revenue)),
        }
    }

    pub fn get(&self, kind: RatioKind) -> Option<f64> {
        match kind {
            RatioKind::DebtToEquity => self.debt_to_equity,
            RatioKind::EquityRatio => self.equity_ratio,
            RatioKind::CurrentRatio => self.current_ratio,
            RatioKind::ReturnOnEquity => self.return_on_equity,
            RatioKind::NetProfitMargin => self.net_profit_margin,
        }
    }
}

fn safe_ratio(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator == 0.0 {
        return None;
    }
    let ratio = numerator / denominator;
    ratio.is_finite().then_some(ratio)
}
