use crate::error::DataError;
use rowbind_core::{Record, Value};
use std::str::FromStr;

/// Comparison operator of a [`Criterion`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    NotEq,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
    NotLike,
}

impl Operator {
    pub fn as_sql(self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::NotEq => "!=",
            Operator::Gt => ">",
            Operator::Gte => ">=",
            Operator::Lt => "<",
            Operator::Lte => "<=",
            Operator::Like => "LIKE",
            Operator::NotLike => "NOT LIKE",
        }
    }
}

impl FromStr for Operator {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "=" | "==" => Ok(Operator::Eq),
            "!=" | "<>" => Ok(Operator::NotEq),
            ">" => Ok(Operator::Gt),
            ">=" => Ok(Operator::Gte),
            "<" => Ok(Operator::Lt),
            "<=" => Ok(Operator::Lte),
            "LIKE" => Ok(Operator::Like),
            "NOT LIKE" => Ok(Operator::NotLike),
            other => Err(DataError::InvalidArgument(format!("unknown operator '{other}'"))),
        }
    }
}

/// One `(field, value, operator)` triple.
#[derive(Debug, Clone, PartialEq)]
pub struct Criterion {
    pub field: String,
    pub value: Value,
    pub operator: Operator,
}

impl Criterion {
    pub fn new(field: impl Into<String>, operator: Operator, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
            operator,
        }
    }
}

/// A WHERE condition: criteria joined with `AND`, in insertion order.
///
/// ```
/// use rowbind_data::{Condition, Operator};
///
/// let cond = Condition::new().eq("status", "active").with("age", Operator::Gte, 18);
/// assert_eq!(cond.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Condition {
    criteria: Vec<Criterion>,
}

impl Condition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with(field, Operator::Eq, value)
    }

    pub fn with(mut self, field: impl Into<String>, operator: Operator, value: impl Into<Value>) -> Self {
        self.criteria.push(Criterion::new(field, operator, value));
        self
    }

    pub fn push(&mut self, criterion: Criterion) {
        self.criteria.push(criterion);
    }

    /// Append every criterion of `other`.
    pub fn and(mut self, other: Condition) -> Self {
        self.criteria.extend(other.criteria);
        self
    }

    /// Build from `(field, value, operator)` triples with textual operators
    /// such as `"="` or `">="`.
    pub fn from_triples<I, F, V>(triples: I) -> Result<Self, DataError>
    where
        I: IntoIterator<Item = (F, V, &'static str)>,
        F: Into<String>,
        V: Into<Value>,
    {
        triples
            .into_iter()
            .map(|(field, value, op)| -> Result<Criterion, DataError> {
                Ok(Criterion::new(field, op.parse()?, value))
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }

    pub fn len(&self) -> usize {
        self.criteria.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Criterion> {
        self.criteria.iter()
    }
}

/// A mapping implies equality on every entry.
impl From<Record> for Condition {
    fn from(record: Record) -> Self {
        record
            .into_iter()
            .map(|(field, value)| Criterion::new(field, Operator::Eq, value))
            .collect()
    }
}

impl From<&Record> for Condition {
    fn from(record: &Record) -> Self {
        Condition::from(record.clone())
    }
}

impl From<Vec<Criterion>> for Condition {
    fn from(criteria: Vec<Criterion>) -> Self {
        Self { criteria }
    }
}

impl<F: Into<String>, V: Into<Value>> From<Vec<(F, V, Operator)>> for Condition {
    fn from(triples: Vec<(F, V, Operator)>) -> Self {
        triples
            .into_iter()
            .map(|(field, value, op)| Criterion::new(field, op, value))
            .collect()
    }
}

impl FromIterator<Criterion> for Condition {
    fn from_iter<T: IntoIterator<Item = Criterion>>(iter: T) -> Self {
        Self {
            criteria: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Condition {
    type Item = &'a Criterion;
    type IntoIter = std::slice::Iter<'a, Criterion>;

    fn into_iter(self) -> Self::IntoIter {
        self.criteria.iter()
    }
}

/// One `ORDER BY` term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

impl Order {
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            ascending: true,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            ascending: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rowbind_core::record;

    #[test]
    fn record_means_equality() {
        let cond = Condition::from(record! { "a" => 1, "b" => "x" });
        assert_eq!(cond.len(), 2);
        assert!(cond.iter().all(|c| c.operator == Operator::Eq));
    }

    #[test]
    fn triples_parse_operators() {
        let cond = Condition::from_triples(vec![("age", Value::Int(18), ">="), ("name", Value::from("a%"), "like")])
            .unwrap();
        let ops: Vec<_> = cond.iter().map(|c| c.operator).collect();
        assert_eq!(ops, [Operator::Gte, Operator::Like]);
    }

    #[test]
    fn unknown_operator_is_invalid_argument() {
        let err = Condition::from_triples(vec![("age", 1, "~")]).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn typed_triples() {
        let cond: Condition = vec![("id", 1, Operator::Eq), ("rank", 3, Operator::Lt)].into();
        assert_eq!(cond.iter().nth(1).unwrap().value, Value::Int(3));
    }
}
