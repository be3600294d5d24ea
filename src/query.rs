//! Backend-neutral filter and sort descriptions.
//!
//! Handlers build a [`Filter`] tree and a [`Sort`] without knowing which
//! store serves them. The in-memory backend evaluates them against the
//! serialized form of each document; the MongoDB backend translates them
//! into filter/sort documents.

use std::cmp::Ordering;

use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Matches every document.
    All,
    Eq(String, Value),
    Ne(String, Value),
    In(String, Vec<Value>),
    NotIn(String, Vec<Value>),
    /// Inclusive bounds; a missing bound is open.
    Range { field: String, min: Option<Value>, max: Option<Value> },
    /// Case-insensitive substring match on a string field (or any string
    /// element of an array field).
    Contains(String, String),
    /// Case-insensitive exact phrase over the collection's text-indexed fields.
    Phrase(String),
    And(Vec<Filter>),
    Or(Vec<Filter>),
}

impl Filter {
    pub fn eq(field: &str, value: impl Into<Value>) -> Self {
        Filter::Eq(field.to_string(), value.into())
    }

    pub fn ne(field: &str, value: impl Into<Value>) -> Self {
        Filter::Ne(field.to_string(), value.into())
    }

    pub fn is_in<V: Into<Value>>(field: &str, values: impl IntoIterator<Item = V>) -> Self {
        Filter::In(field.to_string(), values.into_iter().map(Into::into).collect())
    }

    pub fn not_in<V: Into<Value>>(field: &str, values: impl IntoIterator<Item = V>) -> Self {
        Filter::NotIn(field.to_string(), values.into_iter().map(Into::into).collect())
    }

    pub fn range(field: &str, min: Option<impl Into<Value>>, max: Option<impl Into<Value>>) -> Self {
        Filter::Range { field: field.to_string(), min: min.map(Into::into), max: max.map(Into::into) }
    }

    pub fn contains(field: &str, needle: &str) -> Self {
        Filter::Contains(field.to_string(), needle.to_string())
    }

    /// Evaluate against a serialized document. `text_fields` backs `Phrase`.
    pub fn matches(&self, doc: &Value, text_fields: &[&str]) -> bool {
        match self {
            Filter::All => true,
            Filter::Eq(field, want) => eq_matches(doc, field, want),
            Filter::Ne(field, want) => !eq_matches(doc, field, want),
            Filter::In(field, set) => in_matches(doc, field, set),
            Filter::NotIn(field, set) => !in_matches(doc, field, set),
            Filter::Range { field, min, max } => values_at(doc, field).into_iter().any(|v| {
                min.as_ref().map_or(true, |m| compare_same_type(v, m).is_some_and(Ordering::is_ge))
                    && max.as_ref().map_or(true, |m| compare_same_type(v, m).is_some_and(Ordering::is_le))
            }),
            Filter::Contains(field, needle) => {
                let needle = needle.to_lowercase();
                values_at(doc, field)
                    .into_iter()
                    .filter_map(Value::as_str)
                    .any(|s| s.to_lowercase().contains(&needle))
            }
            Filter::Phrase(phrase) => {
                let phrase = phrase.to_lowercase();
                text_fields.iter().any(|field| {
                    values_at(doc, field)
                        .into_iter()
                        .filter_map(Value::as_str)
                        .any(|s| s.to_lowercase().contains(&phrase))
                })
            }
            Filter::And(all) => all.iter().all(|f| f.matches(doc, text_fields)),
            Filter::Or(any) => any.iter().any(|f| f.matches(doc, text_fields)),
        }
    }
}

/// Accumulates optional clauses; parameters that were not supplied simply
/// contribute nothing.
#[derive(Debug, Default)]
pub struct FilterBuilder(Vec<Filter>);

impl FilterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn and(mut self, clause: Filter) -> Self {
        self.0.push(clause);
        self
    }

    pub fn and_opt(self, clause: Option<Filter>) -> Self {
        match clause {
            Some(c) => self.and(c),
            None => self,
        }
    }

    pub fn build(mut self) -> Filter {
        match self.0.len() {
            0 => Filter::All,
            1 => self.0.remove(0),
            _ => Filter::And(self.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

/// Ordered sort keys. Missing and null values sort lowest.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sort(pub Vec<(String, Direction)>);

impl Sort {
    pub fn asc(field: &str) -> Self {
        Sort(vec![(field.to_string(), Direction::Asc)])
    }

    pub fn desc(field: &str) -> Self {
        Sort(vec![(field.to_string(), Direction::Desc)])
    }

    pub fn then_asc(mut self, field: &str) -> Self {
        self.0.push((field.to_string(), Direction::Asc));
        self
    }

    pub fn then_desc(mut self, field: &str) -> Self {
        self.0.push((field.to_string(), Direction::Desc));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn compare(&self, a: &Value, b: &Value) -> Ordering {
        for (field, dir) in &self.0 {
            let ord = order_values(lookup(a, field), lookup(b, field));
            let ord = match dir {
                Direction::Asc => ord,
                Direction::Desc => ord.reverse(),
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filter: Option<Filter>,
    pub sort: Sort,
}

impl Query {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn filter(filter: Filter) -> Self {
        Query { filter: Some(filter), sort: Sort::default() }
    }

    pub fn sorted(mut self, sort: Sort) -> Self {
        self.sort = sort;
        self
    }

    pub fn predicate(&self) -> &Filter {
        self.filter.as_ref().unwrap_or(&Filter::All)
    }
}

/// `skip`/`limit` window applied after filtering and sorting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Window {
    pub skip: u64,
    pub limit: Option<u64>,
}

impl Window {
    pub fn new(skip: u64, limit: u64) -> Self {
        Window { skip, limit: Some(limit) }
    }

    pub fn first(limit: u64) -> Self {
        Window { skip: 0, limit: Some(limit) }
    }

    pub fn apply<T>(&self, items: Vec<T>) -> Vec<T> {
        let skip = usize::try_from(self.skip).unwrap_or(usize::MAX);
        let take = self.limit.map_or(usize::MAX, |l| usize::try_from(l).unwrap_or(usize::MAX));
        items.into_iter().skip(skip).take(take).collect()
    }
}

/// First value at a dot path, without fanning out over arrays.
pub fn lookup<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(doc, |v, key| v.get(key))
}

/// Every value reachable at `path`, descending into arrays along the way
/// and flattening a terminal array into its elements.
pub fn values_at<'a>(doc: &'a Value, path: &str) -> Vec<&'a Value> {
    let mut current = vec![doc];
    for key in path.split('.') {
        let mut next = Vec::new();
        for v in current {
            match v {
                Value::Array(items) => next.extend(items.iter().filter_map(|i| i.get(key))),
                other => next.extend(other.get(key)),
            }
        }
        current = next;
    }
    current
        .into_iter()
        .flat_map(|v| match v {
            Value::Array(items) => items.iter().collect::<Vec<_>>(),
            other => vec![other],
        })
        .collect()
}

fn values_eq(a: &Value, b: &Value) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) if a.is_number() && b.is_number() => x == y,
        _ => a == b,
    }
}

fn eq_matches(doc: &Value, field: &str, want: &Value) -> bool {
    let found = values_at(doc, field);
    if want.is_null() {
        return found.is_empty() || found.iter().any(|v| v.is_null());
    }
    found.iter().any(|v| values_eq(v, want))
}

fn in_matches(doc: &Value, field: &str, set: &[Value]) -> bool {
    values_at(doc, field)
        .into_iter()
        .any(|v| set.iter().any(|w| values_eq(v, w)))
}

fn compare_same_type(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

fn type_rank(v: Option<&Value>) -> u8 {
    match v {
        None | Some(Value::Null) => 0,
        Some(Value::Number(_)) => 1,
        Some(Value::String(_)) => 2,
        Some(Value::Object(_)) => 3,
        Some(Value::Array(_)) => 4,
        Some(Value::Bool(_)) => 5,
    }
}

fn order_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => compare_same_type(x, y).unwrap_or_else(|| type_rank(a).cmp(&type_rank(b))),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn movie() -> Value {
        json!({
            "title": "The Thing",
            "genre": ["Horror", "Sci-Fi"],
            "averageRating": 4.2,
            "releaseDate": "1982-06-25",
            "country": null,
            "synopsis": "Research team in Antarctica",
            "reviews": [{ "user": "u1", "rating": 5 }, { "user": "u2", "rating": 3 }]
        })
    }

    #[test]
    fn equality_reaches_into_arrays() {
        let m = movie();
        assert!(Filter::eq("genre", "Horror").matches(&m, &[]));
        assert!(!Filter::eq("genre", "Drama").matches(&m, &[]));
        assert!(Filter::eq("reviews.user", "u2").matches(&m, &[]));
        assert!(Filter::is_in("genre", ["Drama", "Sci-Fi"]).matches(&m, &[]));
        assert!(Filter::not_in("genre", ["Drama"]).matches(&m, &[]));
    }

    #[test]
    fn null_matches_missing_and_null() {
        let m = movie();
        assert!(Filter::Eq("country".into(), Value::Null).matches(&m, &[]));
        assert!(Filter::Eq("language".into(), Value::Null).matches(&m, &[]));
        assert!(!Filter::Eq("title".into(), Value::Null).matches(&m, &[]));
    }

    #[test]
    fn ranges_compare_numbers_and_dates() {
        let m = movie();
        assert!(Filter::range("averageRating", Some(4), Some(5)).matches(&m, &[]));
        assert!(!Filter::range("averageRating", Some(4.5), None::<f64>).matches(&m, &[]));
        assert!(Filter::range("releaseDate", Some("1980-01-01"), Some("1989-12-31")).matches(&m, &[]));
        assert!(!Filter::range("releaseDate", Some("1990-01-01"), None::<&str>).matches(&m, &[]));
        // a string bound never matches a numeric field
        assert!(!Filter::range("averageRating", Some("1"), None::<&str>).matches(&m, &[]));
    }

    #[test]
    fn text_matching_is_case_insensitive() {
        let m = movie();
        assert!(Filter::contains("title", "thing").matches(&m, &[]));
        assert!(Filter::contains("genre", "sci").matches(&m, &[]));
        assert!(Filter::Phrase("in antarctica".into()).matches(&m, &["title", "synopsis"]));
        assert!(!Filter::Phrase("antarctica team".into()).matches(&m, &["title", "synopsis"]));
    }

    #[test]
    fn builder_collapses_clauses() {
        assert_eq!(FilterBuilder::new().and_opt(None).build(), Filter::All);
        let single = FilterBuilder::new().and(Filter::eq("a", 1)).build();
        assert_eq!(single, Filter::eq("a", 1));
        let both = FilterBuilder::new().and(Filter::eq("a", 1)).and(Filter::eq("b", 2)).build();
        assert!(matches!(both, Filter::And(ref v) if v.len() == 2));
    }

    #[test]
    fn sort_puts_missing_values_lowest() {
        let mut docs = vec![
            json!({ "n": "b", "score": 2 }),
            json!({ "n": "a" }),
            json!({ "n": "c", "score": 2, "rating": 5 }),
            json!({ "n": "d", "score": 9 }),
        ];
        let sort = Sort::desc("score").then_desc("rating");
        docs.sort_by(|a, b| sort.compare(a, b));
        let names: Vec<_> = docs.iter().map(|d| d["n"].as_str().unwrap()).collect();
        assert_eq!(names, ["d", "c", "b", "a"]);
    }

    #[test]
    fn window_slices() {
        let items: Vec<u32> = (1..=25).collect();
        assert_eq!(Window::new(20, 10).apply(items.clone()), vec![21, 22, 23, 24, 25]);
        assert!(Window::new(30, 10).apply(items.clone()).is_empty());
        assert_eq!(Window::default().apply(items).len(), 25);
    }
}
