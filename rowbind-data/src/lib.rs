//! # rowbind-data
//!
//! The Active-Record layer: an [`Entity`] declares its table and field map,
//! a [`Model`] wraps it with schema resolution, attribute storage, identity
//! tracking and parameterized CRUD statements.

pub mod condition;
pub mod database;
pub mod entity;
pub mod error;
pub mod finder;
pub mod model;
pub mod query;
pub mod schema;
pub mod source;

pub use condition::{Condition, Criterion, Operator, Order};
pub use database::Database;
pub use entity::{Entity, Plain};
pub use error::{DataError, DataResult, ErrorKind};
pub use finder::{Finder, FinderOptions};
pub use model::{KeyValue, Model, PERSISTENCE_ERROR_CODE, RESERVED_NAMES};
pub use query::{Dialect, IdentifierPolicy, QueryBuilder, QueryError, SqlStyle, Statement};
pub use schema::{PrimaryKey, SchemaCache, SchemaResolver, TableSchema};
pub use source::{DataSource, ModelOptions};

pub mod prelude {
    //! Re-exports of the most commonly used data types.
    pub use crate::{
        Condition, DataError, DataSource, Entity, KeyValue, Model, Operator, Order, PrimaryKey,
        TableSchema,
    };
}
