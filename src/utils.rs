use chrono::{Datelike, NaiveDate, NaiveDateTime};

const MIN_PERIOD_YEAR: i32 = 1900;
const MAX_PERIOD_YEAR: i32 = 2100;

const PERIOD_HEADER_KEYWORDS: [&str; 4] = ["year", "fiscal", "period", "date"];

const DATE_FORMATS: [&str; 6] = [
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%d %b %Y",
    "%d-%b-%Y",
];

const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Lowercases and keeps only alphanumeric characters, so that
/// "Short-Term Liabilities" and "short_term liabilities " compare equal.
pub fn normalize_label(label: &str) -> String {
    label
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(|c| c.to_lowercase())
        .collect()
}

/// Lowercased letters only. Used for keyword detection, where digits in a
/// header ("FY2023 Assets") are noise.
pub fn letters_only(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_alphabetic())
        .flat_map(|c| c.to_lowercase())
        .collect()
}

pub fn contains_any_keyword(text: &str, keywords: &[String]) -> bool {
    let folded = letters_only(text);
    if folded.is_empty() {
        return false;
    }
    keywords.iter().any(|k| {
        let keyword = letters_only(k);
        !keyword.is_empty() && folded.contains(&keyword)
    })
}

/// Whether a column header names the reporting period ("Fiscal Year", "FY", "Period End").
pub fn is_period_header(header: &str) -> bool {
    let folded = letters_only(header);
    folded == "fy" || PERIOD_HEADER_KEYWORDS.iter().any(|k| folded.contains(k))
}

/// Parses a period label into the fiscal year it closes.
///
/// Accepts plain years (`2023`, `2023.0`), `FY2023`/`FY 23`, split years
/// (`2022/23`, `2022-2023`) and full dates. Returns `None` for anything else.
pub fn parse_fiscal_year(label: &str) -> Option<i32> {
    let trimmed = label.trim();
    if trimmed.is_empty() {
        return None;
    }

    let year = parse_fy_prefixed(trimmed)
        .or_else(|| parse_plain_year(trimmed))
        .or_else(|| parse_split_year(trimmed))
        .or_else(|| parse_date_year(trimmed))?;

    if (MIN_PERIOD_YEAR..=MAX_PERIOD_YEAR).contains(&year) {
        Some(year)
    } else {
        None
    }
}

fn parse_fy_prefixed(text: &str) -> Option<i32> {
    let prefix = text.get(..2)?;
    if !prefix.eq_ignore_ascii_case("fy") {
        return None;
    }
    let rest = text[2..].trim();
    if !rest.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    match rest.len() {
        2 => rest.parse::<i32>().ok().map(|y| 2000 + y),
        4 => rest.parse().ok(),
        _ => None,
    }
}

fn parse_plain_year(text: &str) -> Option<i32> {
    let value: f64 = text.parse().ok()?;
    if value.fract() != 0.0 || !value.is_finite() {
        return None;
    }
    let year = value as i32;
    if (MIN_PERIOD_YEAR..=MAX_PERIOD_YEAR).contains(&year) {
        Some(year)
    } else {
        None
    }
}

fn parse_split_year(text: &str) -> Option<i32> {
    let (start, end) = text.split_once(['/', '-'])?;
    let (start, end) = (start.trim(), end.trim());
    if start.len() != 4
        || !start.chars().all(|c| c.is_ascii_digit())
        || !end.chars().all(|c| c.is_ascii_digit())
    {
        return None;
    }
    let start_year: i32 = start.parse().ok()?;
    let end_year = match end.len() {
        2 => {
            let short: i32 = end.parse().ok()?;
            let mut year = start_year - start_year % 100 + short;
            if year <= start_year {
                year += 100;
            }
            year
        }
        4 => end.parse().ok()?,
        _ => return None,
    };

    if end_year == start_year + 1 {
        Some(end_year)
    } else {
        None
    }
}

fn parse_date_year(text: &str) -> Option<i32> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
                .map(|dt| dt.date())
        })
        .map(|date| date.year())
}

/// Parses a monetary amount: surrounding whitespace and thousands separators
/// are dropped, and accounting negatives like `(1,200)` are honoured.
/// Anything else left over makes the cell non-numeric.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    let (negative, body) = match trimmed.strip_prefix('(').and_then(|s| s.strip_suffix(')')) {
        Some(inner) => (true, inner.trim()),
        None => (false, trimmed),
    };

    let cleaned: String = body.chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return None;
    }

    let value: f64 = cleaned.parse().ok()?;
    if !value.is_finite() {
        return None;
    }

    Some(if negative { -value } else { value })
}
