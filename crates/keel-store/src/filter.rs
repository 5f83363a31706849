use std::cmp::Ordering;

use serde_json::Value;

use crate::envelope::RecordEnvelope;

#[derive(Clone, Debug, PartialEq)]
enum Cond {
    Eq(Value),
    /// Numeric greater-or-equal; matches only unsigned-integer fields.
    Gte(u64),
    /// Numeric less-or-equal; matches only unsigned-integer fields.
    Lte(u64),
}

/// Conjunction of per-field conditions over a record's payload.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Filter {
    clauses: Vec<(String, Cond)>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `field == value`.
    pub fn eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.clauses.push((field.to_owned(), Cond::Eq(value.into())));
        self
    }

    /// Require `field >= bound` (unsigned-integer fields only).
    pub fn gte(mut self, field: &str, bound: u64) -> Self {
        self.clauses.push((field.to_owned(), Cond::Gte(bound)));
        self
    }

    /// Require `field <= bound` (unsigned-integer fields only).
    pub fn lte(mut self, field: &str, bound: u64) -> Self {
        self.clauses.push((field.to_owned(), Cond::Lte(bound)));
        self
    }

    /// Returns `true` when every clause holds for the record's payload.
    pub fn matches(&self, record: &RecordEnvelope) -> bool {
        self.clauses.iter().all(|(field, cond)| {
            let Some(actual) = record.payload.get(field) else {
                return false;
            };
            match cond {
                Cond::Eq(expected) => actual == expected,
                Cond::Gte(bound) => actual.as_u64().is_some_and(|n| n >= *bound),
                Cond::Lte(bound) => actual.as_u64().is_some_and(|n| n <= *bound),
            }
        })
    }
}

/// Sort order over one payload field.
#[derive(Clone, Debug, PartialEq)]
pub struct Sort {
    pub field: String,
    pub ascending: bool,
}

impl Sort {
    pub fn ascending(field: &str) -> Self {
        Self {
            field: field.to_owned(),
            ascending: true,
        }
    }

    pub fn descending(field: &str) -> Self {
        Self {
            field: field.to_owned(),
            ascending: false,
        }
    }

    /// Compare two records on the sort field. Unsigned integers order
    /// numerically, strings lexicographically; anything else compares
    /// equal.
    pub fn compare(&self, a: &RecordEnvelope, b: &RecordEnvelope) -> Ordering {
        let ordering = compare_values(a.payload.get(&self.field), b.payload.get(&self.field));
        if self.ascending {
            ordering
        } else {
            ordering.reverse()
        }
    }
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => {
            if let (Some(a), Some(b)) = (a.as_u64(), b.as_u64()) {
                a.cmp(&b)
            } else if let (Some(a), Some(b)) = (a.as_str(), b.as_str()) {
                a.cmp(b)
            } else {
                Ordering::Equal
            }
        }
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => Ordering::Equal,
    }
}

/// Index specification for a collection.
///
/// Backends that support indexing build one per spec; the in-memory
/// backend records them for inspection only.
#[derive(Clone, Debug, PartialEq)]
pub struct IndexSpec {
    pub name: String,
    pub fields: Vec<String>,
    pub unique: bool,
}

impl IndexSpec {
    pub fn new(name: &str, fields: &[&str]) -> Self {
        Self {
            name: name.to_owned(),
            fields: fields.iter().map(|f| (*f).to_owned()).collect(),
            unique: false,
        }
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(height: u64, key: &str) -> RecordEnvelope {
        RecordEnvelope::rich("test", &json!({"height": height, "key": key})).unwrap()
    }

    #[test]
    fn eq_matches_exact_fields() {
        let filter = Filter::new().eq("height", 5).eq("key", "a");
        assert!(filter.matches(&record(5, "a")));
        assert!(!filter.matches(&record(5, "b")));
        assert!(!filter.matches(&record(6, "a")));
    }

    #[test]
    fn missing_field_never_matches() {
        let filter = Filter::new().eq("absent", 1);
        assert!(!filter.matches(&record(1, "a")));
    }

    #[test]
    fn gte_and_lte_bound_heights() {
        let filter = Filter::new().gte("height", 3).lte("height", 5);
        assert!(!filter.matches(&record(2, "a")));
        assert!(filter.matches(&record(3, "a")));
        assert!(filter.matches(&record(5, "a")));
        assert!(!filter.matches(&record(6, "a")));
    }

    #[test]
    fn empty_filter_matches_everything() {
        assert!(Filter::new().matches(&record(1, "a")));
    }

    #[test]
    fn sort_orders_numerically() {
        let mut records = vec![record(5, "a"), record(2, "b"), record(9, "c")];
        let sort = Sort::ascending("height");
        records.sort_by(|a, b| sort.compare(a, b));
        let heights: Vec<u64> = records
            .iter()
            .map(|r| r.payload["height"].as_u64().unwrap())
            .collect();
        assert_eq!(heights, vec![2, 5, 9]);
    }

    #[test]
    fn descending_reverses() {
        let sort = Sort::descending("height");
        assert_eq!(
            sort.compare(&record(2, "a"), &record(9, "b")),
            Ordering::Greater
        );
    }
}
