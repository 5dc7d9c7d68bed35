//! Filtered, optionally ordered queries over one collection.

use std::cmp::Ordering;

use serde_json::Value;

use crate::document::Document;

/// Field filter against a top-level document field.
///
/// A document with the field missing never matches. Values of different
/// JSON types never match an ordering filter.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Eq { field: String, value: Value },
    Lt { field: String, value: Value },
    Le { field: String, value: Value },
    Gt { field: String, value: Value },
    Ge { field: String, value: Value },
    In { field: String, values: Vec<Value> },
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: Value) -> Self {
        Filter::Eq {
            field: field.into(),
            value,
        }
    }

    pub fn lt(field: impl Into<String>, value: Value) -> Self {
        Filter::Lt {
            field: field.into(),
            value,
        }
    }

    pub fn le(field: impl Into<String>, value: Value) -> Self {
        Filter::Le {
            field: field.into(),
            value,
        }
    }

    pub fn gt(field: impl Into<String>, value: Value) -> Self {
        Filter::Gt {
            field: field.into(),
            value,
        }
    }

    pub fn ge(field: impl Into<String>, value: Value) -> Self {
        Filter::Ge {
            field: field.into(),
            value,
        }
    }

    pub fn is_in(field: impl Into<String>, values: Vec<Value>) -> Self {
        Filter::In {
            field: field.into(),
            values,
        }
    }

    fn matches(&self, doc: &Document) -> bool {
        match self {
            Filter::Eq { field, value } => doc.field(field) == Some(value),
            Filter::Lt { field, value } => ordered(doc, field, value, Ordering::is_lt),
            Filter::Le { field, value } => ordered(doc, field, value, Ordering::is_le),
            Filter::Gt { field, value } => ordered(doc, field, value, Ordering::is_gt),
            Filter::Ge { field, value } => ordered(doc, field, value, Ordering::is_ge),
            Filter::In { field, values } => doc
                .field(field)
                .map(|v| values.contains(v))
                .unwrap_or(false),
        }
    }
}

fn ordered(doc: &Document, field: &str, value: &Value, pred: fn(Ordering) -> bool) -> bool {
    doc.field(field)
        .and_then(|v| compare_values(v, value))
        .map(pred)
        .unwrap_or(false)
}

/// Compare two JSON scalars of the same type. Numbers compare numerically,
/// strings lexically. Mixed or non-scalar types do not compare.
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => match (a.as_i64(), b.as_i64()) {
            (Some(a), Some(b)) => Some(a.cmp(&b)),
            _ => a.as_f64().partial_cmp(&b.as_f64()),
        },
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// A filtered query over one collection, also usable as a subscription key.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub collection: String,
    pub filters: Vec<Filter>,
    pub order_by: Option<(String, Direction)>,
}

impl Query {
    pub fn collection(name: impl Into<String>) -> Self {
        Self {
            collection: name.into(),
            filters: Vec::new(),
            order_by: None,
        }
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order_by = Some((field.into(), direction));
        self
    }

    /// Whether a document of this query's collection matches every filter.
    pub fn matches(&self, doc: &Document) -> bool {
        self.filters.iter().all(|f| f.matches(doc))
    }

    /// Apply this query's ordering. Stable: unordered documents keep their
    /// relative positions, and missing fields sort last.
    pub fn sort(&self, docs: &mut [Document]) {
        let Some((field, direction)) = &self.order_by else {
            return;
        };
        docs.sort_by(|a, b| {
            let ord = match (a.field(field), b.field(field)) {
                (Some(a), Some(b)) => compare_values(a, b).unwrap_or(Ordering::Equal),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            };
            match direction {
                Direction::Ascending => ord,
                Direction::Descending => ord.reverse(),
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DocRef;
    use serde_json::json;

    fn doc(id: &str, data: Value) -> Document {
        Document {
            doc_ref: DocRef::new("shifts", id),
            data,
        }
    }

    #[test]
    fn test_eq_filter_matches() {
        let q = Query::collection("shifts").filter(Filter::eq("status", json!("Pending")));
        assert!(q.matches(&doc("a", json!({"status": "Pending"}))));
        assert!(!q.matches(&doc("b", json!({"status": "Accepted"}))));
        assert!(!q.matches(&doc("c", json!({"title": "no status"}))));
    }

    #[test]
    fn test_ordering_filters_compare_numbers() {
        let q = Query::collection("shifts").filter(Filter::lt("service_date", json!(100)));
        assert!(q.matches(&doc("a", json!({"service_date": 50}))));
        assert!(!q.matches(&doc("b", json!({"service_date": 100}))));
        assert!(!q.matches(&doc("c", json!({"service_date": 150}))));

        let at_boundary = doc("d", json!({"service_date": 100}));
        assert!(Query::collection("shifts")
            .filter(Filter::le("service_date", json!(100)))
            .matches(&at_boundary));
        assert!(Query::collection("shifts")
            .filter(Filter::ge("service_date", json!(100)))
            .matches(&at_boundary));
    }

    #[test]
    fn test_in_filter() {
        let q = Query::collection("shifts").filter(Filter::is_in(
            "status",
            vec![json!("Accepted"), json!("Rejected")],
        ));
        assert!(q.matches(&doc("a", json!({"status": "Rejected"}))));
        assert!(!q.matches(&doc("b", json!({"status": "Pending"}))));
    }

    #[test]
    fn test_mixed_types_do_not_compare() {
        let q = Query::collection("shifts").filter(Filter::gt("slots", json!("three")));
        assert!(!q.matches(&doc("a", json!({"slots": 4}))));
    }

    #[test]
    fn test_sort_ascending_and_descending() {
        let mut docs = vec![
            doc("a", json!({"at": 30})),
            doc("b", json!({"at": 10})),
            doc("c", json!({"at": 20})),
        ];
        Query::collection("shifts")
            .order_by("at", Direction::Ascending)
            .sort(&mut docs);
        let ids: Vec<&str> = docs.iter().map(|d| d.doc_ref.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);

        Query::collection("shifts")
            .order_by("at", Direction::Descending)
            .sort(&mut docs);
        let ids: Vec<&str> = docs.iter().map(|d| d.doc_ref.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c", "b"]);
    }

    #[test]
    fn test_sort_missing_field_goes_last() {
        let mut docs = vec![doc("a", json!({})), doc("b", json!({"at": 10}))];
        Query::collection("shifts")
            .order_by("at", Direction::Ascending)
            .sort(&mut docs);
        assert_eq!(docs[0].doc_ref.id, "b");
    }
}
