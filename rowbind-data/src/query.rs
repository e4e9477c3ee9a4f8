//! SQL generation: a fluent SELECT builder plus the INSERT / REPLACE /
//! UPDATE / DELETE writers used by models.
//!
//! ```
//! use rowbind_data::query::{Dialect, QueryBuilder};
//!
//! let stmt = QueryBuilder::new("users")
//!     .dialect(Dialect::Postgres)
//!     .where_eq("email", "a@b.com")
//!     .where_like("name", "%alice%")
//!     .order_by("id", true)
//!     .limit(10)
//!     .build_select(&["id", "name"])
//!     .unwrap();
//! assert_eq!(
//!     stmt.sql,
//!     "SELECT id, name FROM users WHERE email = $1 AND name LIKE $2 ORDER BY id ASC LIMIT 10"
//! );
//! ```

use crate::condition::{Condition, Criterion, Operator, Order};
use rowbind_core::{Record, Value};
use std::collections::BTreeSet;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dialect {
    /// Generic SQL using `?` placeholders (default).
    #[default]
    Generic,
    /// SQLite-style `?` placeholders.
    Sqlite,
    /// MySQL-style `?` placeholders with backtick quoting.
    MySql,
    /// Postgres-style `$1, $2, ...` placeholders.
    Postgres,
}

impl Dialect {
    fn placeholder(self, index: usize) -> String {
        match self {
            Dialect::Postgres => format!("${index}"),
            Dialect::Generic | Dialect::Sqlite | Dialect::MySql => "?".to_string(),
        }
    }

    /// Tail of an INSERT that writes no columns.
    fn empty_insert(self) -> &'static str {
        match self {
            Dialect::MySql => " () VALUES ()",
            Dialect::Generic | Dialect::Sqlite | Dialect::Postgres => " DEFAULT VALUES",
        }
    }

    fn quote_char(self) -> char {
        match self {
            Dialect::MySql => '`',
            Dialect::Generic | Dialect::Sqlite | Dialect::Postgres => '"',
        }
    }
}

impl FromStr for Dialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "generic" => Ok(Dialect::Generic),
            "sqlite" => Ok(Dialect::Sqlite),
            "mysql" => Ok(Dialect::MySql),
            "postgres" | "postgresql" => Ok(Dialect::Postgres),
            other => Err(format!("unknown SQL dialect '{other}'")),
        }
    }
}

/// Identifiers are always validated; `Quote` also wraps them in the
/// dialect's quote character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdentifierPolicy {
    #[default]
    Validate,
    Quote,
}

/// Placeholder and identifier style shared by every generated statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SqlStyle {
    pub dialect: Dialect,
    pub identifier_policy: IdentifierPolicy,
}

impl SqlStyle {
    pub fn new(dialect: Dialect, identifier_policy: IdentifierPolicy) -> Self {
        Self {
            dialect,
            identifier_policy,
        }
    }
}

/// A parameterized SQL statement and its bind values, in placeholder order.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub args: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    #[error("Invalid {kind} identifier: {ident}")]
    InvalidIdentifier { kind: &'static str, ident: String },
    #[error("Refusing to build {statement} without a condition")]
    MissingCondition { statement: &'static str },
    #[error("Refusing to build UPDATE without assignments")]
    NothingToUpdate,
}

/// Accumulates SQL text and bind values so placeholder numbering stays
/// consistent across SET and WHERE parts.
struct SqlWriter {
    style: SqlStyle,
    sql: String,
    args: Vec<Value>,
}

impl SqlWriter {
    fn new(style: SqlStyle) -> Self {
        Self {
            style,
            sql: String::new(),
            args: Vec::new(),
        }
    }

    fn push(&mut self, s: &str) {
        self.sql.push_str(s);
    }

    fn ident(&mut self, ident: &str, kind: &'static str) -> Result<(), QueryError> {
        let formatted = format_identifier(ident, false, kind, self.style)?;
        self.sql.push_str(&formatted);
        Ok(())
    }

    fn bind(&mut self, value: Value) {
        let placeholder = self.style.dialect.placeholder(self.args.len() + 1);
        self.sql.push_str(&placeholder);
        self.args.push(value);
    }

    fn criterion(&mut self, criterion: &Criterion) -> Result<(), QueryError> {
        self.ident(&criterion.field, "column")?;
        match (criterion.operator, &criterion.value) {
            (Operator::Eq, Value::Null) => self.push(" IS NULL"),
            (Operator::NotEq, Value::Null) => self.push(" IS NOT NULL"),
            (op, value) => {
                self.push(" ");
                self.push(op.as_sql());
                self.push(" ");
                self.bind(value.clone());
            }
        }
        Ok(())
    }

    fn condition(&mut self, condition: &Condition) -> Result<(), QueryError> {
        for (i, criterion) in condition.iter().enumerate() {
            if i > 0 {
                self.push(" AND ");
            }
            self.criterion(criterion)?;
        }
        Ok(())
    }

    fn where_clause(&mut self, condition: &Condition) -> Result<(), QueryError> {
        if condition.is_empty() {
            return Ok(());
        }
        self.push(" WHERE ");
        self.condition(condition)
    }

    fn order(&mut self, order: &[Order]) -> Result<(), QueryError> {
        if order.is_empty() {
            return Ok(());
        }
        self.push(" ORDER BY ");
        for (i, term) in order.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            self.ident(&term.column, "column")?;
            self.push(if term.ascending { " ASC" } else { " DESC" });
        }
        Ok(())
    }

    fn finish(self) -> Statement {
        Statement {
            sql: self.sql,
            args: self.args,
        }
    }
}

/// Render a condition on its own (without the `WHERE` keyword), numbering
/// placeholders from 1.
pub fn build_where_clause(condition: &Condition, style: SqlStyle) -> Result<Statement, QueryError> {
    let mut w = SqlWriter::new(style);
    w.condition(condition)?;
    Ok(w.finish())
}

/// The column/value pairs a write statement will carry.
///
/// Only fields listed in `allowed` and not in `locked` are kept; the table
/// schema's field order is preserved.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Assignments {
    pairs: Vec<(String, Value)>,
}

impl Assignments {
    pub fn build(data: &Record, allowed: &[String], locked: &BTreeSet<String>) -> Self {
        let pairs = allowed
            .iter()
            .filter(|field| !locked.contains(field.as_str()))
            .filter_map(|field| data.get(field).map(|v| (field.clone(), v.clone())))
            .collect();
        Self { pairs }
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.pairs.iter().map(|(c, _)| c.as_str())
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.pairs.iter().find(|(c, _)| c == column).map(|(_, v)| v)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertMode {
    Insert,
    /// `REPLACE INTO`: insert, or delete-and-insert on key conflict.
    Replace,
}

pub fn build_insert(
    table: &str,
    assignments: &Assignments,
    mode: InsertMode,
    style: SqlStyle,
) -> Result<Statement, QueryError> {
    let mut w = SqlWriter::new(style);
    w.push(match mode {
        InsertMode::Insert => "INSERT INTO ",
        InsertMode::Replace => "REPLACE INTO ",
    });
    w.ident(table, "table")?;
    if assignments.is_empty() {
        w.push(style.dialect.empty_insert());
        return Ok(w.finish());
    }
    w.push(" (");
    for (i, (column, _)) in assignments.pairs.iter().enumerate() {
        if i > 0 {
            w.push(", ");
        }
        w.ident(column, "column")?;
    }
    w.push(") VALUES (");
    for (i, (_, value)) in assignments.pairs.iter().enumerate() {
        if i > 0 {
            w.push(", ");
        }
        w.bind(value.clone());
    }
    w.push(")");
    Ok(w.finish())
}

pub fn build_update(
    table: &str,
    assignments: &Assignments,
    condition: &Condition,
    style: SqlStyle,
) -> Result<Statement, QueryError> {
    if condition.is_empty() {
        return Err(QueryError::MissingCondition { statement: "UPDATE" });
    }
    if assignments.is_empty() {
        return Err(QueryError::NothingToUpdate);
    }
    let mut w = SqlWriter::new(style);
    w.push("UPDATE ");
    w.ident(table, "table")?;
    w.push(" SET ");
    for (i, (column, value)) in assignments.pairs.iter().enumerate() {
        if i > 0 {
            w.push(", ");
        }
        w.ident(column, "column")?;
        w.push(" = ");
        w.bind(value.clone());
    }
    w.where_clause(condition)?;
    Ok(w.finish())
}

pub fn build_delete(table: &str, condition: &Condition, style: SqlStyle) -> Result<Statement, QueryError> {
    if condition.is_empty() {
        return Err(QueryError::MissingCondition { statement: "DELETE" });
    }
    let mut w = SqlWriter::new(style);
    w.push("DELETE FROM ");
    w.ident(table, "table")?;
    w.where_clause(condition)?;
    Ok(w.finish())
}

/// A fluent query builder for constructing SELECT queries.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    table: String,
    condition: Condition,
    order: Vec<Order>,
    limit_val: Option<u64>,
    offset_val: Option<u64>,
    style: SqlStyle,
}

impl QueryBuilder {
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            condition: Condition::new(),
            order: Vec::new(),
            limit_val: None,
            offset_val: None,
            style: SqlStyle::default(),
        }
    }

    pub fn with_style(mut self, style: SqlStyle) -> Self {
        self.style = style;
        self
    }

    /// Set the SQL dialect (affects placeholder style and quoting).
    pub fn dialect(mut self, dialect: Dialect) -> Self {
        self.style.dialect = dialect;
        self
    }

    pub fn identifier_policy(mut self, policy: IdentifierPolicy) -> Self {
        self.style.identifier_policy = policy;
        self
    }

    pub fn where_eq(self, column: &str, value: impl Into<Value>) -> Self {
        self.where_op(column, Operator::Eq, value)
    }

    pub fn where_not_eq(self, column: &str, value: impl Into<Value>) -> Self {
        self.where_op(column, Operator::NotEq, value)
    }

    pub fn where_like(self, column: &str, pattern: &str) -> Self {
        self.where_op(column, Operator::Like, pattern)
    }

    pub fn where_gt(self, column: &str, value: impl Into<Value>) -> Self {
        self.where_op(column, Operator::Gt, value)
    }

    pub fn where_lt(self, column: &str, value: impl Into<Value>) -> Self {
        self.where_op(column, Operator::Lt, value)
    }

    pub fn where_null(self, column: &str) -> Self {
        self.where_op(column, Operator::Eq, Value::Null)
    }

    pub fn where_not_null(self, column: &str) -> Self {
        self.where_op(column, Operator::NotEq, Value::Null)
    }

    pub fn where_op(mut self, column: &str, operator: Operator, value: impl Into<Value>) -> Self {
        self.condition.push(Criterion::new(column, operator, value));
        self
    }

    /// Append every criterion of `condition`.
    pub fn filter(mut self, condition: Condition) -> Self {
        self.condition = self.condition.and(condition);
        self
    }

    pub fn order_by(mut self, column: &str, ascending: bool) -> Self {
        self.order.push(Order {
            column: column.to_string(),
            ascending,
        });
        self
    }

    pub fn orders(mut self, order: &[Order]) -> Self {
        self.order.extend_from_slice(order);
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit_val = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset_val = Some(offset);
        self
    }

    /// Build a SELECT over `columns` (`&["*"]` for every column).
    pub fn build_select(&self, columns: &[&str]) -> Result<Statement, QueryError> {
        let mut w = SqlWriter::new(self.style);
        w.push("SELECT ");
        for (i, column) in columns.iter().enumerate() {
            if i > 0 {
                w.push(", ");
            }
            let formatted = format_identifier(column, true, "column", self.style)?;
            w.push(&formatted);
        }
        w.push(" FROM ");
        w.ident(&self.table, "table")?;
        w.where_clause(&self.condition)?;
        w.order(&self.order)?;
        if let Some(limit) = self.limit_val {
            w.push(&format!(" LIMIT {limit}"));
        }
        if let Some(offset) = self.offset_val {
            w.push(&format!(" OFFSET {offset}"));
        }
        Ok(w.finish())
    }

    /// Build a `SELECT COUNT(*)` over the same conditions.
    pub fn build_count(&self) -> Result<Statement, QueryError> {
        let mut w = SqlWriter::new(self.style);
        w.push("SELECT COUNT(*) FROM ");
        w.ident(&self.table, "table")?;
        w.where_clause(&self.condition)?;
        Ok(w.finish())
    }
}

fn format_identifier(
    ident: &str,
    allow_star: bool,
    kind: &'static str,
    style: SqlStyle,
) -> Result<String, QueryError> {
    if !is_valid_identifier(ident, allow_star) {
        return Err(QueryError::InvalidIdentifier {
            kind,
            ident: ident.to_string(),
        });
    }
    match style.identifier_policy {
        IdentifierPolicy::Quote => Ok(quote_identifier(ident, style.dialect, allow_star)),
        IdentifierPolicy::Validate => Ok(ident.to_string()),
    }
}

fn is_valid_identifier(ident: &str, allow_star: bool) -> bool {
    if ident.is_empty() {
        return false;
    }
    let parts: Vec<&str> = ident.split('.').collect();
    for (idx, part) in parts.iter().enumerate() {
        if allow_star && *part == "*" {
            return idx + 1 == parts.len();
        }
        if !is_valid_segment(part) {
            return false;
        }
    }
    true
}

fn is_valid_segment(segment: &str) -> bool {
    let mut chars = segment.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn quote_identifier(ident: &str, dialect: Dialect, allow_star: bool) -> String {
    let quote = dialect.quote_char();
    let parts: Vec<&str> = ident.split('.').collect();
    let last_idx = parts.len().saturating_sub(1);
    parts
        .into_iter()
        .enumerate()
        .map(|(idx, part)| {
            if allow_star && part == "*" && idx == last_idx {
                part.to_string()
            } else {
                format!("{quote}{part}{quote}")
            }
        })
        .collect::<Vec<_>>()
        .join(".")
}
