use crate::common::error::Result;
use crate::common::types::NormalizedRecord;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

static DIGIT_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").expect("valid digit regex"));

/// Derive a business name from a combined "owner and premises" text field.
///
/// Drops any `DBA: ` marker, turns digit runs (the embedded street number)
/// into commas, keeps the text before the first comma, collapses repeated
/// tokens in first-seen order, then removes `LLC`.
pub fn clean_owner_name(text: &str) -> String {
    let without_dba = text.replace("DBA: ", "");
    let separated = DIGIT_RUN.replace_all(&without_dba, ",");
    let candidate = separated.split(',').next().unwrap_or("");

    let mut seen: Vec<&str> = Vec::new();
    for token in candidate.split_whitespace() {
        if !seen.contains(&token) {
            seen.push(token);
        }
    }

    seen.join(" ")
        .replace("LLC", "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Split a free-text street into Address1/Address2 at the first comma
pub fn split_street(text: &str) -> (String, Option<String>) {
    match text.split_once(',') {
        Some((street, rest)) => {
            let rest = rest.trim();
            (
                street.trim().to_string(),
                (!rest.is_empty()).then(|| rest.to_string()),
            )
        }
        None => (text.trim().to_string(), None),
    }
}

/// Normalize a postal code to its string form; float renderings such as
/// `32801.0` lose the fractional part.
pub fn normalize_zip(text: &str) -> String {
    let trimmed = text.trim();
    match trimmed.split_once('.') {
        Some((whole, frac)) if !whole.is_empty() && frac.chars().all(|c| c == '0') => whole.to_string(),
        _ => trimmed.to_string(),
    }
}

/// Keep the rows that satisfy the canonical-schema invariants, logging the rest.
pub fn collect_valid<I>(source_name: &str, rows: I) -> Vec<NormalizedRecord>
where
    I: IntoIterator<Item = Result<NormalizedRecord>>,
{
    let mut records = Vec::new();
    let mut skipped = 0usize;

    for (i, row) in rows.into_iter().enumerate() {
        match row {
            Ok(record) => records.push(record),
            Err(e) => {
                skipped += 1;
                debug!("{}: skipping row {}: {}", source_name, i, e);
            }
        }
    }

    if skipped > 0 {
        debug!("{}: {} rows skipped for missing required columns", source_name, skipped);
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::error::ScraperError;

    #[test]
    fn test_clean_owner_name_strips_dba_digits_and_duplicates() {
        assert_eq!(clean_owner_name("DBA: Joe's Tavern123 Joe's Tavern LLC"), "Joe's Tavern");
    }

    #[test]
    fn test_clean_owner_name_dedupes_tokens() {
        assert_eq!(clean_owner_name("DBA: Blue Blue Moon Moon Bar 55 Elm St"), "Blue Moon Bar");
    }

    #[test]
    fn test_clean_owner_name_removes_llc() {
        assert_eq!(clean_owner_name("Sunset Grill LLC 900 Ocean Ave"), "Sunset Grill");
        assert_eq!(clean_owner_name("Plain Name"), "Plain Name");
    }

    #[test]
    fn test_split_street() {
        assert_eq!(
            split_street("100 Main St, Suite 4"),
            ("100 Main St".to_string(), Some("Suite 4".to_string()))
        );
        assert_eq!(split_street("100 Main St"), ("100 Main St".to_string(), None));
        assert_eq!(
            split_street("1 A St, Unit 2, Rear"),
            ("1 A St".to_string(), Some("Unit 2, Rear".to_string()))
        );
        assert_eq!(split_street("1 A St,"), ("1 A St".to_string(), None));
    }

    #[test]
    fn test_normalize_zip() {
        assert_eq!(normalize_zip("32801.0"), "32801");
        assert_eq!(normalize_zip(" 90210 "), "90210");
        assert_eq!(normalize_zip("90210-1234"), "90210-1234");
    }

    #[test]
    fn test_collect_valid_skips_errors() {
        let rows = vec![
            NormalizedRecord::from_fields(
                Some("A".into()),
                Some("1 St".into()),
                None,
                Some("Town".into()),
                Some("NY".into()),
                None,
            ),
            Err(ScraperError::MissingField("City".into())),
        ];
        assert_eq!(collect_valid("test", rows).len(), 1);
    }
}
