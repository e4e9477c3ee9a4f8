use crate::error::{SqlxErrorExt, SqlxResult};
use rowbind_core::{Config, Record, Value};
use rowbind_data::{DataError, Database, PrimaryKey, TableSchema};
use sqlx::query::Query;
use sqlx::sqlite::{Sqlite, SqliteArguments, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Column, Row, TypeInfo, ValueRef};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::runtime::Runtime;

/// Pool size used when `rowbind.database.max_connections` is not set.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Default)]
struct LastState {
    insert_id: Option<Value>,
    error: Option<String>,
}

/// Blocking SQLite [`Database`] over an `sqlx` pool.
///
/// Owns a current-thread tokio runtime and blocks on it for every call, so
/// it must not be used from inside another tokio runtime.
///
/// In-memory databases (`sqlite::memory:`) are limited to one connection
/// that is never recycled, since every new connection would open a fresh,
/// empty database.
pub struct SqliteDatabase {
    runtime: Runtime,
    pool: SqlitePool,
    last: Mutex<LastState>,
}

impl SqliteDatabase {
    pub fn connect(url: &str, max_connections: u32) -> SqlxResult<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(DataError::database)?;

        let in_memory = url.contains(":memory:") || url.contains("mode=memory");
        let options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(max_connections.max(1))
        };
        let pool = runtime
            .block_on(options.connect(url))
            .map_err(SqlxErrorExt::into_data_error)?;

        tracing::info!(url, in_memory, "connected to sqlite");
        Ok(Self {
            runtime,
            pool,
            last: Mutex::new(LastState::default()),
        })
    }

    /// Connect using `rowbind.database.url` and `rowbind.database.max_connections`.
    pub fn from_config(config: &Config) -> SqlxResult<Self> {
        let url: String = config.get("rowbind.database.url")?;
        let max_connections = config.get_or("rowbind.database.max_connections", DEFAULT_MAX_CONNECTIONS)?;
        Self::connect(&url, max_connections)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    fn last(&self) -> MutexGuard<'_, LastState> {
        self.last.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record the outcome of a call in the "last" state.
    fn track<T>(&self, result: Result<T, sqlx::Error>) -> SqlxResult<T> {
        match result {
            Ok(value) => {
                self.last().error = None;
                Ok(value)
            }
            Err(err) => {
                self.last().error = Some(err.to_string());
                Err(err.into_data_error())
            }
        }
    }
}

fn bind_values<'q>(sql: &'q str, args: &[Value]) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    args.iter().fold(sqlx::query(sql), |query, value| match value {
        Value::Null => query.bind(None::<String>),
        Value::Bool(b) => query.bind(*b),
        Value::Int(i) => query.bind(*i),
        Value::Float(f) => query.bind(*f),
        Value::Text(s) => query.bind(s.clone()),
        Value::Bytes(b) => query.bind(b.clone()),
    })
}

fn decode_column(row: &SqliteRow, index: usize) -> Result<Value, sqlx::Error> {
    let raw = row.try_get_raw(index)?;
    if raw.is_null() {
        return Ok(Value::Null);
    }
    let type_name = raw.type_info().name().to_ascii_uppercase();
    let value = match type_name.as_str() {
        "INTEGER" | "INT" | "BIGINT" | "BOOLEAN" => Value::Int(row.try_get_unchecked(index)?),
        "REAL" | "FLOAT" | "DOUBLE" | "NUMERIC" => Value::Float(row.try_get_unchecked(index)?),
        "BLOB" => Value::Bytes(row.try_get_unchecked(index)?),
        _ => Value::Text(row.try_get_unchecked(index)?),
    };
    Ok(value)
}

fn decode_row(row: &SqliteRow) -> Result<Record, sqlx::Error> {
    row.columns()
        .iter()
        .enumerate()
        .map(|(index, column)| -> Result<(String, Value), sqlx::Error> {
            Ok((column.name().to_string(), decode_column(row, index)?))
        })
        .collect()
}

fn is_insert(sql: &str) -> bool {
    let head = sql.trim_start();
    ["INSERT", "REPLACE"]
        .iter()
        .any(|kw| head.get(..kw.len()).is_some_and(|h| h.eq_ignore_ascii_case(kw)))
}

impl Database for SqliteDatabase {
    fn table_schema(&self, table: &str) -> Result<TableSchema, DataError> {
        let sql = format!("PRAGMA table_info(\"{}\")", table.replace('"', "\"\""));
        let rows = self.track(self.runtime.block_on(sqlx::query(&sql).fetch_all(&self.pool)))?;
        if rows.is_empty() {
            return Err(DataError::schema(table, "no such table"));
        }

        let mut fields = Vec::with_capacity(rows.len());
        let mut keyed: Vec<(i64, String, String)> = Vec::new();
        for row in &rows {
            let name: String = row.try_get("name").map_err(SqlxErrorExt::into_data_error)?;
            let declared: String = row.try_get("type").map_err(SqlxErrorExt::into_data_error)?;
            let pk: i64 = row.try_get("pk").map_err(SqlxErrorExt::into_data_error)?;
            if pk > 0 {
                keyed.push((pk, name.clone(), declared));
            }
            fields.push(name);
        }
        keyed.sort();

        // A single INTEGER key is an alias of the rowid.
        let auto_increment =
            matches!(keyed.as_slice(), [(_, _, declared)] if declared.eq_ignore_ascii_case("INTEGER"));
        let primary_key = PrimaryKey::from_columns(keyed.into_iter().map(|(_, name, _)| name).collect());

        tracing::debug!(table, fields = fields.len(), auto_increment, "introspected sqlite table");
        Ok(TableSchema::new(fields, primary_key, auto_increment))
    }

    fn execute(&self, sql: &str, args: &[Value]) -> Result<u64, DataError> {
        let result = self.track(self.runtime.block_on(bind_values(sql, args).execute(&self.pool)))?;
        if is_insert(sql) {
            self.last().insert_id = Some(Value::Int(result.last_insert_rowid()));
        }
        Ok(result.rows_affected())
    }

    fn fetch_row(&self, sql: &str, args: &[Value]) -> Result<Option<Record>, DataError> {
        let row = self.track(self.runtime.block_on(bind_values(sql, args).fetch_optional(&self.pool)))?;
        row.as_ref()
            .map(decode_row)
            .transpose()
            .map_err(SqlxErrorExt::into_data_error)
    }

    fn fetch_count(&self, sql: &str, args: &[Value]) -> Result<u64, DataError> {
        let row = self.track(self.runtime.block_on(bind_values(sql, args).fetch_one(&self.pool)))?;
        let count: i64 = row.try_get(0).map_err(SqlxErrorExt::into_data_error)?;
        u64::try_from(count).map_err(|_| DataError::Other(format!("negative row count {count}")))
    }

    fn last_insert_id(&self) -> Option<Value> {
        self.last().insert_id.clone()
    }

    fn last_error(&self) -> Option<String> {
        self.last().error.clone()
    }
}
