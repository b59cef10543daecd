use std::cmp::Ordering;

use crate::core::{Document, Result, Value};

/// Document predicate evaluated by `find`, `count` and `Match` stages.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Matches every document.
    All,
    Eq { field: String, value: Value },
    /// Inclusive on both bounds; a missing bound is unbounded.
    Range {
        field: String,
        gte: Option<Value>,
        lte: Option<Value>,
    },
    And(Vec<Filter>),
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Eq {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn between(
        field: impl Into<String>,
        gte: impl Into<Value>,
        lte: impl Into<Value>,
    ) -> Self {
        Self::Range {
            field: field.into(),
            gte: Some(gte.into()),
            lte: Some(lte.into()),
        }
    }

    pub fn and(self, other: Filter) -> Self {
        match (self, other) {
            (Self::All, other) | (other, Self::All) => other,
            (Self::And(mut left), Self::And(right)) => {
                left.extend(right);
                Self::And(left)
            }
            (Self::And(mut left), other) => {
                left.push(other);
                Self::And(left)
            }
            (this, other) => Self::And(vec![this, other]),
        }
    }

    /// A document lacking the filtered field never matches. Comparing
    /// values of different types is an error rather than a silent miss.
    pub fn matches(&self, doc: &Document) -> Result<bool> {
        match self {
            Self::All => Ok(true),
            Self::Eq { field, value } => match doc.get(field) {
                Some(actual) => Ok(actual.compare(value)? == Ordering::Equal),
                None => Ok(false),
            },
            Self::Range { field, gte, lte } => {
                let Some(actual) = doc.get(field) else {
                    return Ok(false);
                };
                if actual.is_null() {
                    return Ok(false);
                }
                if let Some(low) = gte
                    && actual.compare(low)? == Ordering::Less
                {
                    return Ok(false);
                }
                if let Some(high) = lte
                    && actual.compare(high)? == Ordering::Greater
                {
                    return Ok(false);
                }
                Ok(true)
            }
            Self::And(filters) => {
                for filter in filters {
                    if !filter.matches(doc)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
        }
    }

    /// Equality terms an index lookup can serve, outermost first.
    pub fn equality_terms(&self) -> Vec<(&str, &Value)> {
        match self {
            Self::Eq { field, value } => vec![(field.as_str(), value)],
            Self::And(filters) => filters.iter().flat_map(Filter::equality_terms).collect(),
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::StoreError;

    fn doc(points: i64) -> Document {
        Document::new().with("points", points).with("kind", "ranked")
    }

    #[test]
    fn range_is_inclusive_on_both_bounds() {
        let filter = Filter::between("points", 10i64, 20i64);
        assert!(filter.matches(&doc(10)).unwrap());
        assert!(filter.matches(&doc(20)).unwrap());
        assert!(!filter.matches(&doc(9)).unwrap());
        assert!(!filter.matches(&doc(21)).unwrap());
    }

    #[test]
    fn missing_field_does_not_match() {
        assert!(!Filter::eq("absent", 1i64).matches(&doc(1)).unwrap());
        assert!(
            !Filter::between("absent", 1i64, 2i64)
                .matches(&doc(1))
                .unwrap()
        );
    }

    #[test]
    fn conjunction_requires_every_term() {
        let filter = Filter::eq("kind", "ranked").and(Filter::between("points", 0i64, 5i64));
        assert!(filter.matches(&doc(3)).unwrap());
        assert!(!filter.matches(&doc(7)).unwrap());
        assert_eq!(filter.equality_terms().len(), 1);
    }

    #[test]
    fn mixed_types_are_an_error() {
        let err = Filter::eq("points", "ten").matches(&doc(10)).unwrap_err();
        assert!(matches!(err, StoreError::TypeMismatch(_)));
    }
}
