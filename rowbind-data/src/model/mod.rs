//! The Active-Record model: one in-memory representative of a table row.

mod attributes;
mod identity;
mod persistence;

pub use identity::KeyValue;
pub use persistence::PERSISTENCE_ERROR_CODE;

use crate::database::Database;
use crate::entity::Entity;
use crate::error::DataError;
use crate::query::SqlStyle;
use crate::schema::TableSchema;
use crate::source::DataSource;
use rowbind_core::{ErrorContainer, ErrorRecord, Record, RuleSet, RuleValidator, ValidationBridge};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Names owned by the model itself; never usable as attributes.
pub const RESERVED_NAMES: &[&str] = &[
    "table_name",
    "table_schema",
    "field_map",
    "dynamic_attributes",
    "loaded_primary_key_value",
    "locked_fields",
    "instance_is_apart",
    "last_error",
];

struct Backing {
    db: Arc<dyn Database>,
    schema: Arc<TableSchema>,
}

/// An entity bound to (at most) one table row.
///
/// Declared properties live on `E`; every other field is kept as a dynamic
/// attribute. All reads and writes go through [`get`](Model::get) and
/// [`set`](Model::set).
///
/// A model whose entity has an empty table name, or one built with
/// [`Model::detached`], is not a data model: attribute access works but
/// every persistence operation fails with [`DataError::NotDataModel`].
pub struct Model<E: Entity> {
    entity: E,
    backing: Option<Backing>,
    bridge: ValidationBridge,
    style: SqlStyle,
    attributes: Record,
    loaded_key: Option<KeyValue>,
    locked_fields: BTreeSet<String>,
    instance_apart: bool,
    error: ErrorContainer,
}

impl<E: Entity> Model<E> {
    /// Bind `entity` to its table, resolving the schema through the source's resolver.
    ///
    /// The auto-increment primary key column, if any, starts locked.
    pub fn new(entity: E, source: &DataSource) -> Result<Self, DataError> {
        let table = E::table_name();
        let backing = if table.is_empty() {
            None
        } else {
            let schema = source.schemas().resolve(source.db().as_ref(), table)?;
            Some(Backing {
                db: source.db().clone(),
                schema,
            })
        };

        let mut locked_fields = BTreeSet::new();
        if let Some(col) = backing.as_ref().and_then(|b| b.schema.auto_increment_column()) {
            locked_fields.insert(col.to_string());
        }

        let options = source.options();
        Ok(Self {
            entity,
            backing,
            bridge: ValidationBridge::new(source.validator().clone()),
            style: options.style,
            attributes: Record::new(),
            loaded_key: None,
            locked_fields,
            instance_apart: options.instance_apart,
            error: ErrorContainer::single(),
        })
    }

    /// A model with no database behind it.
    pub fn detached(entity: E) -> Self {
        Self {
            entity,
            backing: None,
            bridge: ValidationBridge::new(RuleValidator::shared()),
            style: SqlStyle::default(),
            attributes: Record::new(),
            loaded_key: None,
            locked_fields: BTreeSet::new(),
            instance_apart: true,
            error: ErrorContainer::single(),
        }
    }

    pub fn entity(&self) -> &E {
        &self.entity
    }

    /// Direct access to the entity, bypassing primary-key protection.
    ///
    /// Changing a key property through this handle makes `is_loaded()` false.
    pub fn entity_mut(&mut self) -> &mut E {
        &mut self.entity
    }

    pub fn into_entity(self) -> E {
        self.entity
    }

    pub fn table_name(&self) -> &'static str {
        E::table_name()
    }

    pub fn schema(&self) -> Option<&TableSchema> {
        self.backing.as_ref().map(|b| b.schema.as_ref())
    }

    pub fn is_data_model(&self) -> bool {
        self.backing.is_some()
    }

    /// Dynamic attributes only; mapped properties are on the entity.
    pub fn attributes(&self) -> &Record {
        &self.attributes
    }

    fn model_name(&self) -> String {
        match E::table_name() {
            "" => std::any::type_name::<E>().to_string(),
            table => table.to_string(),
        }
    }

    fn parts(&self) -> Result<(Arc<dyn Database>, Arc<TableSchema>), DataError> {
        self.backing
            .as_ref()
            .map(|b| (b.db.clone(), b.schema.clone()))
            .ok_or_else(|| DataError::NotDataModel(self.model_name()))
    }

    // -- validation ---------------------------------------------------------

    /// Validate [`to_record`](Model::to_record) against `E::rules()`.
    pub fn run_validation_rules(&mut self) -> bool {
        let data = self.to_record();
        self.validate(&data, &E::rules())
    }

    /// Validate arbitrary data; on failure the first error lands in the error slot.
    pub fn validate(&mut self, data: &Record, rules: &RuleSet) -> bool {
        if self.bridge.validate(data, rules, false) {
            return true;
        }
        if let Some(first) = self.bridge.first_error().cloned() {
            self.error.push(first);
        }
        false
    }

    /// Every error found by the last validation run.
    pub fn validation_errors(&self) -> &ErrorContainer {
        self.bridge.errors()
    }

    // -- error slot ---------------------------------------------------------

    pub fn error(&self) -> Option<&ErrorRecord> {
        self.error.first()
    }

    pub fn has_error(&self) -> bool {
        self.error.has_error()
    }

    pub fn reset_error(&mut self) {
        self.error.reset();
    }

    pub fn set_error(&mut self, error: impl Into<ErrorRecord>) {
        self.error.push(error);
    }

    pub fn set_error_code(&mut self, message: impl Into<String>, code: impl Into<String>) {
        self.error.push(ErrorRecord::new(message).with_code(code));
    }
}

impl<E: Entity> std::fmt::Debug for Model<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model")
            .field("table", &E::table_name())
            .field("attributes", &self.attributes)
            .field("loaded_key", &self.loaded_key)
            .field("locked_fields", &self.locked_fields)
            .field("instance_apart", &self.instance_apart)
            .field("error", &self.error.first())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Plain;
    use rowbind_core::{FieldRules, Value};

    #[test]
    fn detached_model_is_not_a_data_model() {
        let model = Model::detached(Plain);
        assert!(!model.is_data_model());
        assert!(model.schema().is_none());
        assert_eq!(model.table_name(), "");
    }

    #[test]
    fn validation_stores_first_error_only() {
        let mut model = Model::detached(Plain);
        let rules = RuleSet::new()
            .field("attr", FieldRules::new().required().message("please enter attr"))
            .field("zz", FieldRules::new().required());
        let data = rowbind_core::record! { "attr" => "" };

        assert!(!model.validate(&data, &rules));
        assert_eq!(model.error().map(|e| e.message.as_str()), Some("please enter attr"));
        assert_eq!(model.validation_errors().len(), 2);
    }

    #[test]
    fn error_slot_is_overwritten() {
        let mut model = Model::detached(Plain);
        model.set_error("first");
        model.set_error_code("second", "custom");
        let err = model.error().unwrap();
        assert_eq!(err.message, "second");
        assert_eq!(err.code, "custom");
        model.reset_error();
        assert!(!model.has_error());
    }

    #[test]
    fn empty_rules_always_pass() {
        let mut model = Model::detached(Plain);
        model.set("anything", Value::Null).unwrap();
        assert!(model.run_validation_rules());
        assert!(!model.has_error());
    }
}
