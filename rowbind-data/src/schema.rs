use crate::database::Database;
use crate::error::DataError;
use rowbind_cache::{CacheStore, InMemoryStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Primary key of a table: one column, or several sorted by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrimaryKey {
    Single(String),
    Composite(Vec<String>),
}

impl PrimaryKey {
    /// One column gives `Single`; anything else a sorted `Composite`
    /// (empty when the table has no key).
    pub fn from_columns(mut columns: Vec<String>) -> Self {
        if columns.len() == 1 {
            return PrimaryKey::Single(columns.remove(0));
        }
        columns.sort();
        columns.dedup();
        PrimaryKey::Composite(columns)
    }

    pub fn columns(&self) -> &[String] {
        match self {
            PrimaryKey::Single(col) => std::slice::from_ref(col),
            PrimaryKey::Composite(cols) => cols,
        }
    }

    pub fn contains(&self, field: &str) -> bool {
        self.columns().iter().any(|c| c == field)
    }

    pub fn is_composite(&self) -> bool {
        matches!(self, PrimaryKey::Composite(cols) if !cols.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.columns().is_empty()
    }

    fn normalized(self) -> Self {
        match self {
            PrimaryKey::Single(col) => PrimaryKey::Single(col),
            PrimaryKey::Composite(cols) => PrimaryKey::from_columns(cols),
        }
    }
}

/// Table metadata: ordered field list, primary key, auto-increment flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    pub fields: Vec<String>,
    pub primary_key: PrimaryKey,
    pub auto_increment: bool,
}

impl TableSchema {
    pub fn new(fields: Vec<String>, primary_key: PrimaryKey, auto_increment: bool) -> Self {
        Self {
            fields,
            primary_key,
            auto_increment,
        }
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f == field)
    }

    /// The auto-increment column, if the key is a single auto-increment one.
    pub fn auto_increment_column(&self) -> Option<&str> {
        match (&self.primary_key, self.auto_increment) {
            (PrimaryKey::Single(col), true) => Some(col),
            _ => None,
        }
    }

    /// Sort composite keys and reject schemas a model cannot work with.
    pub fn normalize(self, table: &str) -> Result<Self, DataError> {
        if self.fields.is_empty() {
            return Err(DataError::schema(table, "table has no fields"));
        }
        let primary_key = self.primary_key.normalized();
        if let Some(missing) = primary_key.columns().iter().find(|c| !self.fields.contains(c)) {
            return Err(DataError::schema(
                table,
                format!("primary key column '{missing}' is not a table field"),
            ));
        }
        let auto_increment = self.auto_increment && matches!(primary_key, PrimaryKey::Single(_));
        Ok(Self {
            fields: self.fields,
            primary_key,
            auto_increment,
        })
    }
}

/// Cache of resolved table schemas, keyed by table name.
pub type SchemaCache = Arc<dyn CacheStore<Arc<TableSchema>>>;

const CACHE_PREFIX: &str = "table_schema:";

/// Resolves table metadata once per table, from the injected cache or by
/// live introspection.
///
/// Without a cache every resolution introspects the database.
#[derive(Clone)]
pub struct SchemaResolver {
    cache: Option<SchemaCache>,
}

impl SchemaResolver {
    pub fn new(cache: SchemaCache) -> Self {
        Self { cache: Some(cache) }
    }

    /// Resolver backed by a fresh in-memory cache that never expires.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryStore::<Arc<TableSchema>>::new()))
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self::new(Arc::new(InMemoryStore::<Arc<TableSchema>>::with_ttl(ttl)))
    }

    pub fn uncached() -> Self {
        Self { cache: None }
    }

    pub fn cache_key(table: &str) -> String {
        format!("{CACHE_PREFIX}{table}")
    }

    pub fn is_cached(&self) -> bool {
        self.cache.is_some()
    }

    pub fn resolve(&self, db: &dyn Database, table: &str) -> Result<Arc<TableSchema>, DataError> {
        let key = Self::cache_key(table);
        if let Some(cache) = &self.cache {
            if let Some(schema) = cache.read(&key) {
                tracing::debug!(table, "schema cache hit");
                return Ok(schema);
            }
        }

        let schema = Arc::new(db.table_schema(table)?.normalize(table)?);
        tracing::info!(
            table,
            fields = schema.fields.len(),
            primary_key = ?schema.primary_key.columns(),
            auto_increment = schema.auto_increment,
            "resolved table schema"
        );

        if let Some(cache) = &self.cache {
            cache.write(&key, schema.clone());
        }
        Ok(schema)
    }

    /// Drop the cached schema of `table`.
    pub fn invalidate(&self, table: &str) {
        if let Some(cache) = &self.cache {
            cache.remove(&Self::cache_key(table));
        }
    }

    /// Drop every cached schema.
    pub fn invalidate_all(&self) {
        if let Some(cache) = &self.cache {
            cache.remove_by_prefix(CACHE_PREFIX);
        }
    }
}

impl Default for SchemaResolver {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl std::fmt::Debug for SchemaResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaResolver")
            .field("cached", &self.cache.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn composite_keys_are_sorted() {
        let pk = PrimaryKey::from_columns(strings(&["pk2", "pk1"]));
        assert_eq!(pk, PrimaryKey::Composite(strings(&["pk1", "pk2"])));
        assert!(pk.is_composite());
        assert!(pk.contains("pk2"));
    }

    #[test]
    fn single_column_key() {
        let pk = PrimaryKey::from_columns(strings(&["id"]));
        assert_eq!(pk.columns(), ["id".to_string()]);
        assert!(!pk.is_composite());
    }

    #[test]
    fn normalize_rejects_empty_fields() {
        let schema = TableSchema::new(vec![], PrimaryKey::Composite(vec![]), false);
        assert!(matches!(schema.normalize("t"), Err(DataError::Schema { .. })));
    }

    #[test]
    fn normalize_rejects_unknown_key_column() {
        let schema = TableSchema::new(strings(&["a"]), PrimaryKey::Single("id".into()), true);
        assert!(schema.normalize("t").is_err());
    }

    #[test]
    fn auto_increment_only_for_single_keys() {
        let schema = TableSchema::new(
            strings(&["b", "a"]),
            PrimaryKey::Composite(strings(&["b", "a"])),
            true,
        )
        .normalize("t")
        .unwrap();
        assert!(!schema.auto_increment);
        assert_eq!(schema.primary_key.columns(), strings(&["a", "b"]).as_slice());
        assert_eq!(schema.auto_increment_column(), None);
    }
}
