use crate::common::types::NormalizedRecord;

/// Concatenate per-source record sets in the order given.
/// Empty contributions add nothing; position carries no other meaning.
pub fn aggregate<I>(contributions: I) -> Vec<NormalizedRecord>
where
    I: IntoIterator<Item = Vec<NormalizedRecord>>,
{
    contributions.into_iter().flatten().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(prefix: &str, n: usize) -> Vec<NormalizedRecord> {
        (0..n)
            .map(|i| {
                NormalizedRecord::from_fields(
                    Some(format!("{prefix}{i}")),
                    Some("1 St".into()),
                    None,
                    Some("Town".into()),
                    Some("NY".into()),
                    None,
                )
                .unwrap()
            })
            .collect()
    }

    #[test]
    fn test_aggregate_preserves_source_order() {
        let combined = aggregate(vec![records("a", 2), records("b", 0), records("c", 3)]);
        let names: Vec<&str> = combined.iter().map(|r| r.company.as_str()).collect();
        assert_eq!(names, vec!["a0", "a1", "c0", "c1", "c2"]);
    }

    #[test]
    fn test_aggregate_empty() {
        assert!(aggregate(Vec::<Vec<NormalizedRecord>>::new()).is_empty());
    }
}
