use rowbind_core::{Record, Value};
use rowbind_data::{DataError, Database, PrimaryKey, Statement, TableSchema};
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Error returned by a scripted failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct MockError(pub String);

/// Build a [`TableSchema`] from string slices.
///
/// One key column gives a single key, several a composite one.
pub fn table_schema(fields: &[&str], primary_key: &[&str], auto_increment: bool) -> TableSchema {
    TableSchema::new(
        fields.iter().map(|f| f.to_string()).collect(),
        PrimaryKey::from_columns(primary_key.iter().map(|c| c.to_string()).collect()),
        auto_increment,
    )
}

#[derive(Default)]
struct State {
    schemas: HashMap<String, TableSchema>,
    introspections: HashMap<String, usize>,
    rows: VecDeque<Option<Record>>,
    counts: VecDeque<u64>,
    insert_ids: VecDeque<Value>,
    affected_rows: VecDeque<u64>,
    fail_next: Option<String>,
    statements: Vec<Statement>,
    last_insert_id: Option<Value>,
    last_error: Option<String>,
}

/// A scripted [`Database`] that records every statement it receives.
///
/// Queries answer from queues filled up front: [`push_row`](Self::push_row)
/// for `fetch_row`, [`push_count`](Self::push_count) for `fetch_count`.
/// Empty queues answer "no row" and `0`. Writes affect one row unless
/// scripted otherwise.
///
/// ```ignore
/// let db = Arc::new(
///     MockDatabase::new()
///         .with_table("users", table_schema(&["id", "name"], &["id"], true))
///         .with_insert_id(42),
/// );
/// let source = DataSource::new(db.clone());
/// ```
#[derive(Default)]
pub struct MockDatabase {
    state: Mutex<State>,
}

impl MockDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn with_table(self, table: &str, schema: TableSchema) -> Self {
        self.add_table(table, schema);
        self
    }

    pub fn with_insert_id(self, id: impl Into<Value>) -> Self {
        self.push_insert_id(id);
        self
    }

    pub fn add_table(&self, table: &str, schema: TableSchema) {
        self.state().schemas.insert(table.to_string(), schema);
    }

    /// Queue the answer of the next `fetch_row`.
    pub fn push_row(&self, row: Option<Record>) {
        self.state().rows.push_back(row);
    }

    pub fn push_count(&self, count: u64) {
        self.state().counts.push_back(count);
    }

    /// Queue the id reported after the next INSERT or REPLACE.
    pub fn push_insert_id(&self, id: impl Into<Value>) {
        self.state().insert_ids.push_back(id.into());
    }

    pub fn push_affected_rows(&self, rows: u64) {
        self.state().affected_rows.push_back(rows);
    }

    /// Make the next `execute` fail with `message` as the last error.
    pub fn fail_next_execute(&self, message: impl Into<String>) {
        self.state().fail_next = Some(message.into());
    }

    pub fn statements(&self) -> Vec<Statement> {
        self.state().statements.clone()
    }

    pub fn executed_sql(&self) -> Vec<String> {
        self.state().statements.iter().map(|s| s.sql.clone()).collect()
    }

    pub fn last_statement(&self) -> Option<Statement> {
        self.state().statements.last().cloned()
    }

    pub fn clear_statements(&self) {
        self.state().statements.clear();
    }

    /// How many times `table` was introspected.
    pub fn introspections(&self, table: &str) -> usize {
        self.state().introspections.get(table).copied().unwrap_or(0)
    }

    fn record(state: &mut State, sql: &str, args: &[Value]) {
        tracing::trace!(sql, args = args.len(), "mock database received statement");
        state.statements.push(Statement {
            sql: sql.to_string(),
            args: args.to_vec(),
        });
    }
}

impl Database for MockDatabase {
    fn table_schema(&self, table: &str) -> Result<TableSchema, DataError> {
        let mut state = self.state();
        *state.introspections.entry(table.to_string()).or_default() += 1;
        state
            .schemas
            .get(table)
            .cloned()
            .ok_or_else(|| DataError::schema(table, "no such table"))
    }

    fn execute(&self, sql: &str, args: &[Value]) -> Result<u64, DataError> {
        let mut state = self.state();
        Self::record(&mut state, sql, args);

        if let Some(message) = state.fail_next.take() {
            state.last_error = Some(message.clone());
            return Err(DataError::database(MockError(message)));
        }

        state.last_error = None;
        if sql.starts_with("INSERT") || sql.starts_with("REPLACE") {
            state.last_insert_id = state.insert_ids.pop_front();
        }
        Ok(state.affected_rows.pop_front().unwrap_or(1))
    }

    fn fetch_row(&self, sql: &str, args: &[Value]) -> Result<Option<Record>, DataError> {
        let mut state = self.state();
        Self::record(&mut state, sql, args);
        Ok(state.rows.pop_front().flatten())
    }

    fn fetch_count(&self, sql: &str, args: &[Value]) -> Result<u64, DataError> {
        let mut state = self.state();
        Self::record(&mut state, sql, args);
        Ok(state.counts.pop_front().unwrap_or(0))
    }

    fn last_insert_id(&self) -> Option<Value> {
        self.state().last_insert_id.clone()
    }

    fn last_error(&self) -> Option<String> {
        self.state().last_error.clone()
    }
}
