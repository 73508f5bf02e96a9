use crate::error::{ReconciliationError, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.6;
pub const DEFAULT_TOTAL_TOLERANCE: f64 = 0.01;
pub const DEFAULT_HEADER_SCAN_ROWS: usize = 10;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub enum CanonicalConcept {
    #[schemars(description = "Obligations due within one year (Balance Sheet, credit balance)")]
    ShortTermLiabilities,

    #[schemars(description = "Obligations due after more than one year (Balance Sheet, credit balance)")]
    LongTermLiabilities,

    #[schemars(description = "Capital contributed by the owners: share capital, paid-in capital")]
    OwnersInvestment,

    #[schemars(description = "Accumulated profits kept in the business")]
    RetainedEarnings,

    #[schemars(description = "Owner's residual interest: investment plus retained earnings")]
    TotalOwnersEquity,

    #[schemars(description = "Income from sales of goods or services (Income Statement)")]
    Revenue,

    #[schemars(description = "Bottom-line profit after all expenses and tax (Income Statement)")]
    NetProfit,

    #[schemars(description = "Assets expected to be realised within one year (Balance Sheet)")]
    CurrentAssets,
}

impl CanonicalConcept {
    pub const ALL: [CanonicalConcept; 8] = [
        CanonicalConcept::ShortTermLiabilities,
        CanonicalConcept::LongTermLiabilities,
        CanonicalConcept::OwnersInvestment,
        CanonicalConcept::RetainedEarnings,
        CanonicalConcept::TotalOwnersEquity,
        CanonicalConcept::Revenue,
        CanonicalConcept::NetProfit,
        CanonicalConcept::CurrentAssets,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            CanonicalConcept::ShortTermLiabilities => "Short-Term Liabilities",
            CanonicalConcept::LongTermLiabilities => "Long-Term Liabilities",
            CanonicalConcept::OwnersInvestment => "Owner's Investment",
            CanonicalConcept::RetainedEarnings => "Retained Earnings",
            CanonicalConcept::TotalOwnersEquity => "Total Owner's Equity",
            CanonicalConcept::Revenue => "Revenue",
            CanonicalConcept::NetProfit => "Net Profit",
            CanonicalConcept::CurrentAssets => "Current Assets",
        }
    }

    /// Concepts the balance sheet derivation reads directly. A miss on one of
    /// these is reported; the others are supplementary.
    pub fn is_required(&self) -> bool {
        matches!(
            self,
            CanonicalConcept::ShortTermLiabilities
                | CanonicalConcept::LongTermLiabilities
                | CanonicalConcept::RetainedEarnings
                | CanonicalConcept::TotalOwnersEquity
        )
    }
}

impl fmt::Display for CanonicalConcept {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct ConceptEntry {
    #[schemars(description = "The canonical line item this entry locates")]
    pub concept: CanonicalConcept,

    #[schemars(
        description = "Candidate source labels, most specific first. Case, spacing and punctuation are ignored when matching."
    )]
    pub synonyms: Vec<String>,

    #[serde(default)]
    #[schemars(
        description = "Label fragments that disqualify a column for this concept (e.g. 'non-current' for short-term liabilities)."
    )]
    pub exclusions: Vec<String>,
}

impl ConceptEntry {
    pub fn new(concept: CanonicalConcept, synonyms: &[&str], exclusions: &[&str]) -> Self {
        Self {
            concept,
            synonyms: synonyms.iter().map(|s| s.to_string()).collect(),
            exclusions: exclusions.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct ConceptCatalogue {
    #[schemars(description = "One entry per canonical concept, in matching order")]
    pub entries: Vec<ConceptEntry>,
}

impl ConceptCatalogue {
    pub fn entry(&self, concept: CanonicalConcept) -> Option<&ConceptEntry> {
        self.entries.iter().find(|e| e.concept == concept)
    }
}

impl Default for ConceptCatalogue {
    fn default() -> Self {
        use CanonicalConcept::*;

        Self {
            entries: vec![
                ConceptEntry::new(
                    ShortTermLiabilities,
                    &[
                        "Short-Term Liabilities",
                        "Current Liabilities",
                        "Short-Term Debt",
                        "Short-Term",
                        "Current Liab",
                    ],
                    &["non-current", "long-term", "assets", "investments", "receivable"],
                ),
                ConceptEntry::new(
                    LongTermLiabilities,
                    &[
                        "Long-Term Liabilities",
                        "Non-Current Liabilities",
                        "Long-Term Debt",
                        "Long-Term",
                        "Non-Current Liab",
                    ],
                    &["assets", "investments", "receivable"],
                ),
                ConceptEntry::new(
                    OwnersInvestment,
                    &[
                        "Owner's Investment",
                        "Owner's Capital",
                        "Share Capital",
                        "Paid-In Capital",
                        "Contributed Capital",
                        "Capital Stock",
                        "Common Stock",
                    ],
                    &[],
                ),
                ConceptEntry::new(
                    RetainedEarnings,
                    &[
                        "Retained Earnings",
                        "Retained Profits",
                        "Accumulated Earnings",
                        "Accumulated Profits",
                        "Accumulated Surplus",
                        "Accumulated",
                    ],
                    &["depreciation", "amortisation", "amortization"],
                ),
                ConceptEntry::new(
                    TotalOwnersEquity,
                    &[
                        "Total Owner's Equity",
                        "Total Equity",
                        "Owner's Equity",
                        "Shareholders' Equity",
                        "Stockholders' Equity",
                        "Net Worth",
                        "Net Assets",
                        "Equity",
                    ],
                    &["liabilities"],
                ),
                ConceptEntry::new(
                    Revenue,
                    &[
                        "Total Revenue",
                        "Operating Revenue",
                        "Revenue",
                        "Net Sales",
                        "Sales",
                        "Turnover",
                    ],
                    &["cost", "deferred", "unearned"],
                ),
                ConceptEntry::new(
                    NetProfit,
                    &[
                        "Net Profit",
                        "Net Income",
                        "Profit After Tax",
                        "Net Earnings",
                        "Profit for the Year",
                    ],
                    &[],
                ),
                ConceptEntry::new(
                    CurrentAssets,
                    &["Total Current Assets", "Current Assets", "Short-Term Assets"],
                    &["non-current"],
                ),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct ReconciliationConfig {
    #[serde(default = "default_similarity_threshold")]
    #[schemars(
        description = "Minimum similarity (exclusive, 0.0-1.0) for an approximate label match to be accepted. Defaults to 0.6."
    )]
    pub similarity_threshold: f64,

    #[serde(default = "default_total_tolerance")]
    #[schemars(
        description = "Largest absolute difference between a computed and a stated total that is still treated as consistent. Defaults to 0.01."
    )]
    pub total_tolerance: f64,

    #[serde(default = "default_header_scan_rows")]
    #[schemars(description = "How many leading rows are searched for the header row. Defaults to 10.")]
    pub header_scan_rows: usize,

    #[serde(default = "default_header_keywords")]
    #[schemars(
        description = "Structural keywords that identify a header row. Compared against the row's letters only, lowercased."
    )]
    pub header_keywords: Vec<String>,

    #[serde(default)]
    #[schemars(description = "Synonym catalogue for every canonical concept")]
    pub catalogue: ConceptCatalogue,

    #[serde(default = "default_stated_total_synonyms")]
    #[schemars(
        description = "Labels of an independently stated 'total liabilities and equity' figure. Matched by containment only."
    )]
    pub stated_total_synonyms: Vec<String>,
}

fn default_similarity_threshold() -> f64 {
    DEFAULT_SIMILARITY_THRESHOLD
}

fn default_total_tolerance() -> f64 {
    DEFAULT_TOTAL_TOLERANCE
}

fn default_header_scan_rows() -> usize {
    DEFAULT_HEADER_SCAN_ROWS
}

fn default_header_keywords() -> Vec<String> {
    ["assets", "liabilities", "equity", "net worth", "fiscal"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_stated_total_synonyms() -> Vec<String> {
    [
        "Total Liabilities & Equity",
        "Total Liabilities and Equity",
        "Total Liabilities & Owner's Equity",
        "Total Liabilities and Owner's Equity",
        "Total Equity and Liabilities",
        "Total Equity & Liabilities",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Default for ReconciliationConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            total_tolerance: DEFAULT_TOTAL_TOLERANCE,
            header_scan_rows: DEFAULT_HEADER_SCAN_ROWS,
            header_keywords: default_header_keywords(),
            catalogue: ConceptCatalogue::default(),
            stated_total_synonyms: default_stated_total_synonyms(),
        }
    }
}

impl ReconciliationConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.similarity_threshold.is_finite()
            || self.similarity_threshold <= 0.0
            || self.similarity_threshold > 1.0
        {
            return Err(ReconciliationError::InvalidThreshold(
                self.similarity_threshold,
            ));
        }

        if !self.total_tolerance.is_finite() || self.total_tolerance < 0.0 {
            return Err(ReconciliationError::InvalidTolerance(self.total_tolerance));
        }

        for (idx, entry) in self.catalogue.entries.iter().enumerate() {
            if self.catalogue.entries[..idx]
                .iter()
                .any(|e| e.concept == entry.concept)
            {
                return Err(ReconciliationError::DuplicateConcept(entry.concept));
            }

            let usable = entry
                .synonyms
                .iter()
                .any(|s| !crate::utils::normalize_label(s).is_empty());
            if !usable {
                return Err(ReconciliationError::EmptySynonyms(entry.concept));
            }
        }

        Ok(())
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(ReconciliationConfig)
    }

    pub fn schema_as_json() -> std::result::Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }
}
