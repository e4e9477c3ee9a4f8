//! # rowbind-data-sqlx : SQLx backend for the rowbind data layer
//!
//! Provides a blocking [`Database`](rowbind_data::Database) implementation on
//! top of [SQLx](https://github.com/launchbadge/sqlx), plus the error bridge
//! from `sqlx::Error` to [`DataError`](rowbind_data::DataError).
//!
//! | Type | Description |
//! |------|-------------|
//! | [`SqliteDatabase`] | SQLite pool plus an owned current-thread runtime |
//! | [`SqlxErrorExt`] | Extension trait to convert `sqlx::Error` → `DataError` (`.into_data_error()`) |
//! | [`SqlxResult<T>`] | Type alias for `Result<T, DataError>` |
//!
//! # Quick start
//!
//! ```ignore
//! use rowbind_data::DataSource;
//! use rowbind_data_sqlx::SqliteDatabase;
//! use std::sync::Arc;
//!
//! let db = Arc::new(SqliteDatabase::connect("sqlite::memory:", 1)?);
//! let source = DataSource::new(db);
//! let mut user = source.model(User::default())?;
//! user.set("name", "bob")?;
//! user.create()?;
//! ```

pub mod error;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use error::{SqlxErrorExt, SqlxResult};
#[cfg(feature = "sqlite")]
pub use sqlite::{SqliteDatabase, DEFAULT_MAX_CONNECTIONS};

/// Re-exports of the most commonly used types from both `rowbind-data` and this crate.
pub mod prelude {
    #[cfg(feature = "sqlite")]
    pub use crate::SqliteDatabase;
    pub use crate::SqlxErrorExt;
    pub use rowbind_data::prelude::*;
}
