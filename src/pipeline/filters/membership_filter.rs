use crate::data_model::{MembershipSet, Record};

/// A predicate deciding whether a record survives a stage.
pub trait RecordFilter {
    fn name(&self) -> &'static str; // For logging/error reporting

    fn keep(&self, record: &Record) -> bool;
}

/// Keeps records whose key column holds one of the codes of interest.
///
/// A record that lacks the key column never matches.
pub struct MembershipFilter<'a> {
    key_column: &'a str,
    codes: &'a MembershipSet,
}

impl<'a> MembershipFilter<'a> {
    pub fn new(key_column: &'a str, codes: &'a MembershipSet) -> Self {
        MembershipFilter { key_column, codes }
    }
}

impl RecordFilter for MembershipFilter<'_> {
    fn name(&self) -> &'static str {
        "MembershipFilter"
    }

    fn keep(&self, record: &Record) -> bool {
        record
            .get(self.key_column)
            .is_some_and(|code| self.codes.contains(code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_model::FieldSchema;
    use std::sync::Arc;

    fn record(values: &[&str]) -> Record {
        let schema = Arc::new(FieldSchema::new(vec!["id".into(), "name".into()]));
        Record::new(schema, values.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_matches_on_key_column() {
        let codes: MembershipSet = ["1", "3"].into_iter().collect();
        let filter = MembershipFilter::new("id", &codes);
        assert!(filter.keep(&record(&["1", "alice"])));
        assert!(!filter.keep(&record(&["2", "bob"])));
    }

    #[test]
    fn test_absent_key_never_matches() {
        let codes: MembershipSet = ["", "alice"].into_iter().collect();
        let by_name = MembershipFilter::new("name", &codes);
        assert!(!by_name.keep(&record(&["1"])));

        let by_unknown = MembershipFilter::new("region", &codes);
        assert!(!by_unknown.keep(&record(&["1", "alice"])));
    }

    #[test]
    fn test_empty_set_matches_nothing() {
        let codes = MembershipSet::new();
        let filter = MembershipFilter::new("id", &codes);
        assert!(!filter.keep(&record(&["1", "alice"])));
    }
}
