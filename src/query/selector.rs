use super::{collate, resolve, split_path, SelectorError};
use serde_json::{Map, Value};
use std::cmp::Ordering;

/// Selector tree
#[derive(Debug, Clone, PartialEq)]
pub enum Selector {
    /// All children match (an object with several keys is an implicit `$and`)
    And(Vec<Selector>),
    Or(Vec<Selector>),
    Nor(Vec<Selector>),
    Not(Box<Selector>),
    /// Condition on the value at a dotted path
    Field {
        path: Vec<String>,
        condition: Condition,
    },
}

/// Condition applied to a single field value
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Eq(Value),
    Ne(Value),
    Gt(Value),
    Gte(Value),
    Lt(Value),
    Lte(Value),
    In(Vec<Value>),
    Nin(Vec<Value>),
    Exists(bool),
    Not(Box<Condition>),
    /// Several operators on the same field
    All(Vec<Condition>),
}

impl Selector {
    pub fn parse(map: &Map<String, Value>) -> Result<Self, SelectorError> {
        Self::parse_with_prefix(map, &[])
    }

    fn parse_with_prefix(map: &Map<String, Value>, prefix: &[String]) -> Result<Self, SelectorError> {
        let mut clauses = Vec::with_capacity(map.len());

        for (key, value) in map {
            if key.starts_with('$') {
                clauses.push(Self::parse_combinator(key, value, prefix)?);
                continue;
            }

            let mut path = prefix.to_vec();
            path.extend(split_path(key));

            match value {
                // Object without operators: nested field match
                Value::Object(inner) if !inner.is_empty() && !has_operator_keys(inner) => {
                    clauses.push(Self::parse_with_prefix(inner, &path)?);
                }
                _ => clauses.push(Selector::Field {
                    path,
                    condition: Condition::parse(value)?,
                }),
            }
        }

        if clauses.len() == 1 {
            Ok(clauses.remove(0))
        } else {
            Ok(Selector::And(clauses))
        }
    }

    fn parse_combinator(operator: &str, value: &Value, prefix: &[String]) -> Result<Self, SelectorError> {
        match operator {
            "$and" | "$or" | "$nor" => {
                let items = value.as_array().ok_or_else(|| SelectorError::InvalidOperand {
                    operator: operator.to_string(),
                    reason: "expected an array of selectors".to_string(),
                })?;
                let children = items
                    .iter()
                    .map(|item| match item {
                        Value::Object(map) => Self::parse_with_prefix(map, prefix),
                        _ => Err(SelectorError::InvalidOperand {
                            operator: operator.to_string(),
                            reason: "array items must be selector objects".to_string(),
                        }),
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(match operator {
                    "$and" => Selector::And(children),
                    "$or" => Selector::Or(children),
                    _ => Selector::Nor(children),
                })
            }
            "$not" => match value {
                Value::Object(map) => Ok(Selector::Not(Box::new(Self::parse_with_prefix(
                    map, prefix,
                )?))),
                _ => Err(SelectorError::InvalidOperand {
                    operator: operator.to_string(),
                    reason: "expected a selector object".to_string(),
                }),
            },
            other => Err(SelectorError::UnsupportedOperator(other.to_string())),
        }
    }

    pub fn matches(&self, doc: &Value) -> bool {
        match self {
            Selector::And(children) => children.iter().all(|c| c.matches(doc)),
            Selector::Or(children) => children.iter().any(|c| c.matches(doc)),
            Selector::Nor(children) => !children.iter().any(|c| c.matches(doc)),
            Selector::Not(inner) => !inner.matches(doc),
            Selector::Field { path, condition } => condition.matches(resolve(doc, path)),
        }
    }
}

impl Condition {
    fn parse(value: &Value) -> Result<Self, SelectorError> {
        let map = match value {
            Value::Object(map) if has_operator_keys(map) => map,
            other => return Ok(Condition::Eq(other.clone())),
        };

        let mut conditions = Vec::with_capacity(map.len());
        for (operator, operand) in map {
            conditions.push(Self::parse_operator(operator, operand)?);
        }

        if conditions.len() == 1 {
            Ok(conditions.remove(0))
        } else {
            Ok(Condition::All(conditions))
        }
    }

    fn parse_operator(operator: &str, operand: &Value) -> Result<Self, SelectorError> {
        let condition = match operator {
            "$eq" => Condition::Eq(operand.clone()),
            "$ne" => Condition::Ne(operand.clone()),
            "$gt" => Condition::Gt(operand.clone()),
            "$gte" => Condition::Gte(operand.clone()),
            "$lt" => Condition::Lt(operand.clone()),
            "$lte" => Condition::Lte(operand.clone()),
            "$in" | "$nin" => {
                let values = operand
                    .as_array()
                    .cloned()
                    .ok_or_else(|| SelectorError::InvalidOperand {
                        operator: operator.to_string(),
                        reason: "expected an array".to_string(),
                    })?;
                if operator == "$in" {
                    Condition::In(values)
                } else {
                    Condition::Nin(values)
                }
            }
            "$exists" => {
                let flag = operand.as_bool().ok_or_else(|| SelectorError::InvalidOperand {
                    operator: operator.to_string(),
                    reason: "expected a boolean".to_string(),
                })?;
                Condition::Exists(flag)
            }
            "$not" => Condition::Not(Box::new(Self::parse(operand)?)),
            other => return Err(SelectorError::UnsupportedOperator(other.to_string())),
        };
        Ok(condition)
    }

    /// `value` is `None` when the field is absent from the document
    pub fn matches(&self, value: Option<&Value>) -> bool {
        match self {
            Condition::Exists(expected) => value.is_some() == *expected,
            Condition::Not(inner) => value.is_some() && !inner.matches(value),
            Condition::All(conditions) => conditions.iter().all(|c| c.matches(value)),
            // Every other operator only matches documents that have the field
            _ => match value {
                Some(actual) => self.matches_present(actual),
                None => false,
            },
        }
    }

    fn matches_present(&self, actual: &Value) -> bool {
        match self {
            Condition::Eq(expected) => collate(actual, expected) == Ordering::Equal,
            Condition::Ne(expected) => collate(actual, expected) != Ordering::Equal,
            Condition::Gt(bound) => collate(actual, bound) == Ordering::Greater,
            Condition::Gte(bound) => collate(actual, bound) != Ordering::Less,
            Condition::Lt(bound) => collate(actual, bound) == Ordering::Less,
            Condition::Lte(bound) => collate(actual, bound) != Ordering::Greater,
            Condition::In(values) => values.iter().any(|v| collate(actual, v) == Ordering::Equal),
            Condition::Nin(values) => values.iter().all(|v| collate(actual, v) != Ordering::Equal),
            Condition::Exists(_) | Condition::Not(_) | Condition::All(_) => self.matches(Some(actual)),
        }
    }
}

fn has_operator_keys(map: &Map<String, Value>) -> bool {
    map.keys().any(|k| k.starts_with('$'))
}
