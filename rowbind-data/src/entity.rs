use crate::error::DataError;
use rowbind_core::{RuleSet, Value};

/// Trait describing how an entity type binds to a table.
///
/// Everything here is static per type: the table name, which table fields
/// live in declared struct properties (`field_map`), and the declared
/// property names that must never be reached as attributes. Fields absent
/// from the map are stored as dynamic attributes on the [`Model`](crate::Model).
///
/// # Example
///
/// ```ignore
/// struct User {
///     user_name: Option<String>,
/// }
///
/// impl Entity for User {
///     fn table_name() -> &'static str { "users" }
///     fn field_map() -> &'static [(&'static str, &'static str)] { &[("name", "user_name")] }
///
///     fn property(&self, name: &str) -> Option<Value> {
///         match name {
///             "user_name" => Some(self.user_name.clone().into()),
///             _ => None,
///         }
///     }
///
///     fn set_property(&mut self, name: &str, value: Value) -> Result<(), DataError> {
///         match name {
///             "user_name" => self.user_name = value.as_str().map(str::to_string),
///             _ => return Err(DataError::PropertyNotFound(name.to_string())),
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait Entity: Send + 'static {
    /// Table this entity maps to; empty for a non-persistent entity.
    fn table_name() -> &'static str;

    /// `(field, property)` pairs. Both sides are case sensitive.
    fn field_map() -> &'static [(&'static str, &'static str)] {
        &[]
    }

    /// Declared property names that are not field-mapped. Mapped property
    /// names are declared implicitly.
    fn declared_properties() -> &'static [&'static str] {
        &[]
    }

    /// Current value of a declared property, `Some(Value::Null)` while it
    /// holds nothing. `None` only for names the entity does not have.
    fn property(&self, name: &str) -> Option<Value> {
        let _ = name;
        None
    }

    /// Write a declared property. Custom setter logic belongs here.
    fn set_property(&mut self, name: &str, value: Value) -> Result<(), DataError> {
        let _ = value;
        Err(DataError::PropertyNotFound(name.to_string()))
    }

    /// Validation rules checked by `Model::run_validation_rules`.
    fn rules() -> RuleSet {
        RuleSet::new()
    }
}

/// A non-persistent entity with no declared properties: every attribute is dynamic.
#[derive(Debug, Clone, Copy, Default)]
pub struct Plain;

impl Entity for Plain {
    fn table_name() -> &'static str {
        ""
    }
}

/// Property bound to `field`, if the field is mapped.
pub(crate) fn mapped_property<E: Entity>(field: &str) -> Option<&'static str> {
    E::field_map()
        .iter()
        .find(|(f, _)| *f == field)
        .map(|(_, p)| *p)
}

pub(crate) fn is_declared_property<E: Entity>(name: &str) -> bool {
    E::declared_properties().contains(&name) || E::field_map().iter().any(|(_, p)| *p == name)
}
