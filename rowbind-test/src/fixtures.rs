//! Ready-made entities and schemas for model tests.

use crate::mock::table_schema;
use rowbind_core::{FieldRules, RuleSet, Value};
use rowbind_data::{DataError, Entity, TableSchema};

/// `users(id, name, email)` with an auto-increment `id`.
///
/// `id` and `name` are mapped onto struct properties; `email` stays dynamic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct User {
    pub id: Option<i64>,
    pub display_name: Option<String>,
}

impl User {
    pub fn schema() -> TableSchema {
        table_schema(&["id", "name", "email"], &["id"], true)
    }
}

impl Entity for User {
    fn table_name() -> &'static str {
        "users"
    }

    fn field_map() -> &'static [(&'static str, &'static str)] {
        &[("id", "id"), ("name", "display_name")]
    }

    fn property(&self, name: &str) -> Option<Value> {
        match name {
            "id" => Some(self.id.into()),
            "display_name" => Some(self.display_name.clone().into()),
            _ => None,
        }
    }

    fn set_property(&mut self, name: &str, value: Value) -> Result<(), DataError> {
        match name {
            "id" => self.id = value.as_i64(),
            "display_name" => self.display_name = value.as_str().map(str::to_string),
            _ => return Err(DataError::PropertyNotFound(name.to_string())),
        }
        Ok(())
    }

    fn rules() -> RuleSet {
        RuleSet::new()
            .field("name", FieldRules::new().required().message("please enter name"))
            .field("email", FieldRules::new().email())
    }
}

/// `memberships(pk1, pk2, role)` keyed on `(pk1, pk2)`; every field is dynamic.
#[derive(Debug, Clone, Copy, Default)]
pub struct Membership;

impl Membership {
    pub fn schema() -> TableSchema {
        table_schema(&["pk1", "pk2", "role"], &["pk2", "pk1"], false)
    }
}

impl Entity for Membership {
    fn table_name() -> &'static str {
        "memberships"
    }
}
