use crate::query::QueryError;

/// Errors that can occur in the data layer.
///
/// Not-found is never an error here: loads report a miss as `Ok(false)`,
/// and validation failures are reported through the model's error slot.
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    /// A persistence operation was called on a model without a table.
    #[error("{0} is not a data model")]
    NotDataModel(String),
    /// Missing or malformed input, such as an empty condition.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    /// The model is not in a state where the operation makes sense.
    #[error("Unexpected state: {0}")]
    UnexpectedState(String),
    /// Attempt to re-point a loaded, instance-apart model.
    #[error("Primary key field '{0}' is read-only while the instance is loaded")]
    PrimaryKeyReadOnly(String),
    /// The name belongs to a declared property that is not field-mapped.
    #[error("Property '{0}' is not accessible as an attribute")]
    InaccessibleProperty(String),
    #[error("Property '{0}' not found")]
    PropertyNotFound(String),
    /// Statement execution failed; carries the database's last error text.
    #[error("Persistence error: {0}")]
    Persistence(String),
    #[error("Schema error for table '{table}': {message}")]
    Schema { table: String, message: String },
    #[error("Configuration error: {0}")]
    Config(#[from] rowbind_core::ConfigError),
    #[error("Database error: {0}")]
    Database(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("Data error: {0}")]
    Other(String),
}

/// Coarse classification of a [`DataError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Programmer or setup mistakes: wrong model, missing condition, bad shape.
    Configuration,
    IdentityProtection,
    /// Mismatch between the entity's mapping and the attribute asked for.
    Resolution,
    Persistence,
    Schema,
    Other,
}

impl DataError {
    /// Construct a `Database` variant from any error type.
    ///
    /// Used by backend crates (e.g. `rowbind-data-sqlx`) to wrap
    /// driver-specific errors.
    pub fn database(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        DataError::Database(Box::new(err))
    }

    pub fn schema(table: &str, message: impl Into<String>) -> Self {
        DataError::Schema {
            table: table.to_string(),
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            DataError::NotDataModel(_)
            | DataError::InvalidArgument(_)
            | DataError::UnexpectedState(_)
            | DataError::Config(_) => ErrorKind::Configuration,
            DataError::PrimaryKeyReadOnly(_) => ErrorKind::IdentityProtection,
            DataError::InaccessibleProperty(_) | DataError::PropertyNotFound(_) => ErrorKind::Resolution,
            DataError::Persistence(_) | DataError::Database(_) => ErrorKind::Persistence,
            DataError::Schema { .. } => ErrorKind::Schema,
            DataError::Other(_) => ErrorKind::Other,
        }
    }

    pub fn is_configuration(&self) -> bool {
        self.kind() == ErrorKind::Configuration
    }
}

impl From<QueryError> for DataError {
    fn from(err: QueryError) -> Self {
        DataError::InvalidArgument(err.to_string())
    }
}

/// Convenience alias for data-layer results.
pub type DataResult<T> = Result<T, DataError>;
