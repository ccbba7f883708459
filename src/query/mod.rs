//! CouchDB-style rich queries.
//!
//! A query document looks like
//!
//! ```json
//! {"selector": {"make": "SAMSUNG", "status": {"$gte": 1}}, "sort": [{"ID": "desc"}], "limit": 10}
//! ```
//!
//! Only the selector subset used by record contracts is supported:
//! implicit equality, dotted paths, nested objects and the
//! `$eq $ne $gt $gte $lt $lte $in $nin $exists $and $or $nor $not` operators.

use serde::Deserialize;
use serde_json::{Map, Number, Value};
use std::cmp::Ordering;
use std::fmt;

mod selector;


pub use selector::{Condition, Selector};

/// Rich query errors
#[derive(Debug, Clone, PartialEq)]
pub enum SelectorError {
    /// Query is not a JSON document
    InvalidJson(String),
    /// Query has no `selector` object
    MissingSelector,
    /// Operator outside the supported subset
    UnsupportedOperator(String),
    /// Operator given an operand of the wrong shape
    InvalidOperand { operator: String, reason: String },
    /// Malformed `sort` entry
    InvalidSort(String),
}

impl fmt::Display for SelectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectorError::InvalidJson(e) => write!(f, "query is not valid JSON: {}", e),
            SelectorError::MissingSelector => write!(f, "query must contain a selector object"),
            SelectorError::UnsupportedOperator(op) => write!(f, "unsupported operator '{}'", op),
            SelectorError::InvalidOperand { operator, reason } => {
                write!(f, "invalid operand for '{}': {}", operator, reason)
            }
            SelectorError::InvalidSort(msg) => write!(f, "invalid sort: {}", msg),
        }
    }
}

impl std::error::Error for SelectorError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SortKey {
    pub path: Vec<String>,
    pub direction: SortDirection,
}

/// Parsed rich query
#[derive(Debug, Clone, PartialEq)]
pub struct RichQuery {
    pub selector: Selector,
    pub sort: Vec<SortKey>,
    pub limit: Option<usize>,
    pub skip: usize,
}

/// Wire form of a query document.
///
/// `fields` and `use_index` are tolerated and ignored: records are always
/// returned whole.
#[derive(Deserialize)]
struct QueryDocument {
    selector: Option<Value>,
    #[serde(default)]
    sort: Vec<Value>,
    limit: Option<usize>,
    #[serde(default)]
    skip: usize,
}

impl RichQuery {
    pub fn parse(query: &str) -> Result<Self, SelectorError> {
        let doc: QueryDocument =
            serde_json::from_str(query).map_err(|e| SelectorError::InvalidJson(e.to_string()))?;

        let selector = match doc.selector {
            Some(Value::Object(map)) => Selector::parse(&map)?,
            _ => return Err(SelectorError::MissingSelector),
        };

        let sort = doc
            .sort
            .iter()
            .map(parse_sort_key)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            selector,
            sort,
            limit: doc.limit,
            skip: doc.skip,
        })
    }

    /// Filters, orders and pages `rows`, each paired with its JSON document.
    ///
    /// Rows keep their input order unless the query sorts them.
    pub fn run<T>(&self, rows: Vec<(T, Value)>) -> Vec<T> {
        let mut matched: Vec<(T, Value)> = rows
            .into_iter()
            .filter(|(_, doc)| self.selector.matches(doc))
            .collect();

        if !self.sort.is_empty() {
            matched.sort_by(|(_, a), (_, b)| self.compare_documents(a, b));
        }

        let limit = self.limit.unwrap_or(usize::MAX);
        matched
            .into_iter()
            .skip(self.skip)
            .take(limit)
            .map(|(row, _)| row)
            .collect()
    }

    fn compare_documents(&self, a: &Value, b: &Value) -> Ordering {
        for key in &self.sort {
            let ordering = match (resolve(a, &key.path), resolve(b, &key.path)) {
                (Some(x), Some(y)) => collate(x, y),
                (None, Some(_)) => Ordering::Less,
                (Some(_), None) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            };
            let ordering = match key.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }
}

fn parse_sort_key(entry: &Value) -> Result<SortKey, SelectorError> {
    match entry {
        Value::String(field) => Ok(SortKey {
            path: split_path(field),
            direction: SortDirection::Asc,
        }),
        Value::Object(map) if map.len() == 1 => {
            let (field, direction) = map.iter().next().ok_or_else(|| {
                SelectorError::InvalidSort("empty sort object".to_string())
            })?;
            let direction = match direction.as_str() {
                Some("asc") => SortDirection::Asc,
                Some("desc") => SortDirection::Desc,
                _ => {
                    return Err(SelectorError::InvalidSort(format!(
                        "direction for '{}' must be \"asc\" or \"desc\"",
                        field
                    )))
                }
            };
            Ok(SortKey {
                path: split_path(field),
                direction,
            })
        }
        other => Err(SelectorError::InvalidSort(format!(
            "expected a field name or {{field: direction}}, got {}",
            other
        ))),
    }
}

pub(crate) fn split_path(field: &str) -> Vec<String> {
    field.split('.').map(|s| s.to_string()).collect()
}

/// Follows a dotted path into a JSON document
pub(crate) fn resolve<'v>(doc: &'v Value, path: &[String]) -> Option<&'v Value> {
    path.iter().try_fold(doc, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        _ => None,
    })
}

/// CouchDB view collation: null < false < true < numbers < strings < arrays < objects
pub(crate) fn collate(a: &Value, b: &Value) -> Ordering {
    let rank_order = type_rank(a).cmp(&type_rank(b));
    if rank_order != Ordering::Equal {
        return rank_order;
    }

    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => collate_numbers(x, y),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Array(x), Value::Array(y)) => {
            for (left, right) in x.iter().zip(y.iter()) {
                let ordering = collate(left, right);
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            x.len().cmp(&y.len())
        }
        (Value::Object(x), Value::Object(y)) => collate_objects(x, y),
        _ => Ordering::Equal,
    }
}

// Integers compare exactly; anything involving a float goes through f64
fn collate_numbers(x: &Number, y: &Number) -> Ordering {
    match (integer(x), integer(y)) {
        (Some(x), Some(y)) => x.cmp(&y),
        _ => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
    }
}

fn integer(n: &Number) -> Option<i128> {
    n.as_i64()
        .map(i128::from)
        .or_else(|| n.as_u64().map(i128::from))
}

fn collate_objects(x: &Map<String, Value>, y: &Map<String, Value>) -> Ordering {
    for ((kx, vx), (ky, vy)) in x.iter().zip(y.iter()) {
        let ordering = kx.cmp(ky).then_with(|| collate(vx, vy));
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    x.len().cmp(&y.len())
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(false) => 1,
        Value::Bool(true) => 2,
        Value::Number(_) => 3,
        Value::String(_) => 4,
        Value::Array(_) => 5,
        Value::Object(_) => 6,
    }
}
