use crate::error::Result;
use crate::ratios::{FinancialRatios, RatioKind};
use log::debug;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Share of the benchmark within which a firm counts as in line with its industry.
pub const IN_LINE_BAND: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
pub enum Industry {
    Dairy,
    Tech,
    Unknown,
}

impl fmt::Display for Industry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Industry::Dairy => "Dairy",
            Industry::Tech => "Tech",
            Industry::Unknown => "Unknown",
        };
        f.write_str(name)
    }
}

/// Guesses the industry from a company or document name.
pub fn detect_industry(name: &str) -> Industry {
    let name = name.to_lowercase();

    let industry = if ["fonterra", "milk", "dairy"].iter().any(|k| name.contains(k)) {
        Industry::Dairy
    } else if name.contains("tech") {
        Industry::Tech
    } else {
        Industry::Unknown
    };

    debug!("Detected industry {} from '{}'", industry, name);
    industry
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Standing {
    Above,
    Below,
    InLine,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkComparison {
    pub ratio: RatioKind,
    pub firm: f64,
    pub benchmark: f64,
    pub standing: Standing,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BenchmarkTable {
    #[schemars(description = "Typical ratio values per industry")]
    pub industries: BTreeMap<Industry, BTreeMap<RatioKind, f64>>,
}

impl Default for BenchmarkTable {
    fn default() -> Self {
        let dairy = [
            (RatioKind::DebtToEquity, 1.20),
            (RatioKind::EquityRatio, 0.45),
            (RatioKind::CurrentRatio, 1.80),
            (RatioKind::ReturnOnEquity, 0.12),
            (RatioKind::NetProfitMargin, 0.08),
        ];
        let tech = [
            (RatioKind::DebtToEquity, 0.50),
            (RatioKind::EquityRatio, 0.70),
            (RatioKind::CurrentRatio, 2.50),
            (RatioKind::ReturnOnEquity, 0.15),
            (RatioKind::NetProfitMargin, 0.20),
        ];

        let mut industries = BTreeMap::new();
        industries.insert(Industry::Dairy, dairy.into_iter().collect());
        industries.insert(Industry::Tech, tech.into_iter().collect());

        Self { industries }
    }
}

impl BenchmarkTable {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn benchmark(&self, industry: Industry, ratio: RatioKind) -> Option<f64> {
        self.industries
            .get(&industry)
            .and_then(|ratios| ratios.get(&ratio))
            .copied()
    }

    /// Compares every ratio that both the firm and the industry table have.
    pub fn compare(&self, industry: Industry, ratios: &FinancialRatios) -> Vec<BenchmarkComparison> {
        RatioKind::ALL
            .iter()
            .filter_map(|&ratio| {
                let firm = ratios.get(ratio)?;
                let benchmark = self.benchmark(industry, ratio)?;
                Some(BenchmarkComparison {
                    ratio,
                    firm,
                    benchmark,
                    standing: standing(firm, benchmark),
                })
            })
            .collect()
    }
}

fn standing(firm: f64, benchmark: f64) -> Standing {
    if (firm - benchmark).abs() <= IN_LINE_BAND * benchmark.abs() {
        Standing::InLine
    } else if firm > benchmark {
        Standing::Above
    } else {
        Standing::Below
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_industry() {
        assert_eq!(detect_industry("Fonterra_2023.xlsx"), Industry::Dairy);
        assert_eq!(detect_industry("Milk Co annual.csv"), Industry::Dairy);
        assert_eq!(detect_industry("BigTech Ltd.csv"), Industry::Tech);
        assert_eq!(detect_industry("Hardware Store.csv"), Industry::Unknown);
    }

    #[test]
    fn test_compare_against_dairy() {
        let ratios = FinancialRatios {
            total_liabilities: 800.0,
            debt_to_equity: Some(1.0),
            equity_ratio: Some(0.46),
            current_ratio: Some(2.0),
            return_on_equity: None,
            net_profit_margin: Some(0.08),
        };

        let comparisons = BenchmarkTable::default().compare(Industry::Dairy, &ratios);
        let standings: Vec<(RatioKind, Standing)> =
            comparisons.iter().map(|c| (c.ratio, c.standing)).collect();

        assert_eq!(
            standings,
            vec![
                (RatioKind::DebtToEquity, Standing::Below),
                (RatioKind::EquityRatio, Standing::InLine),
                (RatioKind::CurrentRatio, Standing::Above),
                (RatioKind::NetProfitMargin, Standing::InLine),
            ]
        );
    }

    #[test]
    fn test_unknown_industry_has_no_benchmarks() {
        let ratios = FinancialRatios {
            total_liabilities: 1.0,
            debt_to_equity: Some(1.0),
            equity_ratio: None,
            current_ratio: None,
            return_on_equity: None,
            net_profit_margin: None,
        };
        assert!(BenchmarkTable::default().compare(Industry::Unknown, &ratios).is_empty());
    }

    #[test]
    fn test_custom_table_from_json() {
        let table = BenchmarkTable::from_json(
            r#"{ "industries": { "Tech": { "CurrentRatio": 3.0, "EquityRatio": 0.5 } } }"#,
        )
        .unwrap();

        assert_eq!(table.benchmark(Industry::Tech, RatioKind::CurrentRatio), Some(3.0));
        assert_eq!(table.benchmark(Industry::Tech, RatioKind::DebtToEquity), None);
        assert_eq!(table.benchmark(Industry::Dairy, RatioKind::EquityRatio), None);
    }
}
