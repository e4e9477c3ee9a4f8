use crate::database::Database;
use crate::entity::Entity;
use crate::error::DataError;
use crate::model::Model;
use crate::query::{Dialect, IdentifierPolicy, SqlStyle};
use crate::schema::SchemaResolver;
use rowbind_core::{Config, ConfigError, RuleValidator, Validator};
use std::sync::Arc;
use std::time::Duration;

/// Behaviour shared by the models created from one [`DataSource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelOptions {
    /// Initial instance-apart flag of every model.
    pub instance_apart: bool,
    pub style: SqlStyle,
}

impl Default for ModelOptions {
    fn default() -> Self {
        Self {
            instance_apart: true,
            style: SqlStyle::default(),
        }
    }
}

/// Everything a data model needs: the database, the schema resolver, the
/// validator, and model options. Cheap to clone.
#[derive(Clone)]
pub struct DataSource {
    db: Arc<dyn Database>,
    schemas: SchemaResolver,
    validator: Arc<dyn Validator>,
    options: ModelOptions,
}

impl DataSource {
    /// Source with an in-memory schema cache, the built-in rule validator,
    /// and default options.
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self {
            db,
            schemas: SchemaResolver::in_memory(),
            validator: RuleValidator::shared(),
            options: ModelOptions::default(),
        }
    }

    /// Build from `rowbind.schema_cache.*`, `rowbind.model.*` and `rowbind.sql.*` keys.
    pub fn from_config(db: Arc<dyn Database>, config: &Config) -> Result<Self, ConfigError> {
        let schemas = if config.get_or("rowbind.schema_cache.enabled", true)? {
            match config.get_or("rowbind.schema_cache.ttl_secs", 0u64)? {
                0 => SchemaResolver::in_memory(),
                secs => SchemaResolver::with_ttl(Duration::from_secs(secs)),
            }
        } else {
            SchemaResolver::uncached()
        };

        let dialect_name: String = config.get_or("rowbind.sql.dialect", "generic".to_string())?;
        let dialect = dialect_name
            .parse::<Dialect>()
            .map_err(|message| ConfigError::Invalid {
                key: "rowbind.sql.dialect".to_string(),
                message,
            })?;
        let identifier_policy = if config.get_or("rowbind.sql.quote_identifiers", false)? {
            IdentifierPolicy::Quote
        } else {
            IdentifierPolicy::Validate
        };

        let options = ModelOptions {
            instance_apart: config.get_or("rowbind.model.instance_apart", true)?,
            style: SqlStyle::new(dialect, identifier_policy),
        };

        Ok(Self::new(db).with_schema_resolver(schemas).with_options(options))
    }

    pub fn with_schema_resolver(mut self, schemas: SchemaResolver) -> Self {
        self.schemas = schemas;
        self
    }

    pub fn with_validator(mut self, validator: Arc<dyn Validator>) -> Self {
        self.validator = validator;
        self
    }

    pub fn with_options(mut self, options: ModelOptions) -> Self {
        self.options = options;
        self
    }

    pub fn db(&self) -> &Arc<dyn Database> {
        &self.db
    }

    pub fn schemas(&self) -> &SchemaResolver {
        &self.schemas
    }

    pub fn validator(&self) -> &Arc<dyn Validator> {
        &self.validator
    }

    pub fn options(&self) -> ModelOptions {
        self.options
    }

    /// Shorthand for [`Model::new`].
    pub fn model<E: Entity>(&self, entity: E) -> Result<Model<E>, DataError> {
        Model::new(entity, self)
    }
}

impl std::fmt::Debug for DataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataSource")
            .field("schemas", &self.schemas)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
