use crate::error::DataError;
use crate::schema::TableSchema;
use rowbind_core::{Record, Value};

/// The database collaborator every data model talks to.
///
/// Calls are blocking. Implementations are shared by reference across the
/// models of a unit of work, so they keep their "last" state (insert id,
/// error text) behind interior mutability.
///
/// # Example
///
/// ```ignore
/// impl Database for MyDriver {
///     fn table_schema(&self, table: &str) -> Result<TableSchema, DataError> { ... }
///     fn execute(&self, sql: &str, args: &[Value]) -> Result<u64, DataError> { ... }
///     ...
/// }
/// ```
pub trait Database: Send + Sync {
    /// Live introspection of one table.
    fn table_schema(&self, table: &str) -> Result<TableSchema, DataError>;

    /// Run a write statement, returning the number of affected rows.
    fn execute(&self, sql: &str, args: &[Value]) -> Result<u64, DataError>;

    /// Run a query and return its first row, if any.
    fn fetch_row(&self, sql: &str, args: &[Value]) -> Result<Option<Record>, DataError>;

    /// Run a `SELECT COUNT(*)`-style query and return the first column of the first row.
    fn fetch_count(&self, sql: &str, args: &[Value]) -> Result<u64, DataError>;

    /// Id generated by the most recent successful insert.
    fn last_insert_id(&self) -> Option<Value>;

    /// Error text of the most recent failed call.
    fn last_error(&self) -> Option<String>;
}
