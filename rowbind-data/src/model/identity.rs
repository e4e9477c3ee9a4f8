use super::Model;
use crate::condition::Condition;
use crate::entity::Entity;
use crate::error::DataError;
use crate::schema::{PrimaryKey, TableSchema};
use rowbind_core::{Record, Value};
use serde::Serialize;
use std::collections::BTreeMap;

/// A primary-key value: a scalar for single-column keys, a name-ordered
/// mapping for composite ones.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum KeyValue {
    Single(Value),
    Composite(BTreeMap<String, Value>),
}

impl KeyValue {
    pub fn single(value: impl Into<Value>) -> Self {
        KeyValue::Single(value.into())
    }

    pub fn composite<K, V>(parts: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        KeyValue::Composite(parts.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl From<Value> for KeyValue {
    fn from(value: Value) -> Self {
        KeyValue::Single(value)
    }
}

impl From<i64> for KeyValue {
    fn from(value: i64) -> Self {
        KeyValue::Single(value.into())
    }
}

impl From<&str> for KeyValue {
    fn from(value: &str) -> Self {
        KeyValue::Single(value.into())
    }
}

impl From<String> for KeyValue {
    fn from(value: String) -> Self {
        KeyValue::Single(value.into())
    }
}

impl From<Record> for KeyValue {
    fn from(parts: Record) -> Self {
        KeyValue::Composite(parts)
    }
}

impl<E: Entity> Model<E> {
    fn key_schema(&self) -> Result<&TableSchema, DataError> {
        self.schema().ok_or_else(|| DataError::NotDataModel(self.model_name()))
    }

    fn key_component(&self, field: &str) -> Option<Value> {
        self.get(field).ok().filter(|v| !v.is_null())
    }

    /// Live primary-key value; `None` while any component is unset or null.
    pub fn primary_key_value(&self) -> Option<KeyValue> {
        match &self.schema()?.primary_key {
            PrimaryKey::Single(col) => self.key_component(col).map(KeyValue::Single),
            PrimaryKey::Composite(cols) if cols.is_empty() => None,
            PrimaryKey::Composite(cols) => cols
                .iter()
                .map(|col| self.key_component(col).map(|v| (col.clone(), v)))
                .collect::<Option<BTreeMap<_, _>>>()
                .map(KeyValue::Composite),
        }
    }

    /// Set the primary key. The shape must match the table's key: a scalar
    /// for a single column, a mapping with exactly the key's components for
    /// a composite one.
    pub fn set_primary_key_value(&mut self, key: impl Into<KeyValue>) -> Result<(), DataError> {
        let primary_key = self.key_schema()?.primary_key.clone();
        match (&primary_key, key.into()) {
            (PrimaryKey::Single(col), KeyValue::Single(value)) => self.set(col, value),
            (PrimaryKey::Composite(cols), KeyValue::Composite(parts))
                if !cols.is_empty() && parts.keys().eq(cols.iter()) =>
            {
                for (col, value) in parts {
                    self.set(&col, value)?;
                }
                Ok(())
            }
            (pk, key) => Err(DataError::InvalidArgument(format!(
                "primary key value {key:?} does not match key columns {:?}",
                pk.columns()
            ))),
        }
    }

    /// Snapshot the live key as the loaded key.
    pub fn mark_loaded(&mut self) -> Result<(), DataError> {
        self.key_schema()?;
        let key = self.primary_key_value().ok_or_else(|| {
            DataError::UnexpectedState(format!(
                "cannot mark {} loaded: primary key value is not set",
                self.model_name()
            ))
        })?;
        self.loaded_key = Some(key);
        Ok(())
    }

    /// True while the loaded snapshot equals the live key.
    pub fn is_loaded(&self) -> bool {
        match &self.loaded_key {
            Some(loaded) => self.primary_key_value().as_ref() == Some(loaded),
            None => false,
        }
    }

    /// One equality criterion per key component.
    pub fn primary_key_condition(&self) -> Result<Condition, DataError> {
        let schema = self.key_schema()?;
        match (&schema.primary_key, self.primary_key_value()) {
            (PrimaryKey::Single(col), Some(KeyValue::Single(value))) => {
                Ok(Condition::new().eq(col.as_str(), value))
            }
            (_, Some(KeyValue::Composite(parts))) => Ok(Condition::from(parts)),
            _ => Err(DataError::InvalidArgument(format!(
                "primary key value of {} is not set",
                self.model_name()
            ))),
        }
    }

    pub fn set_instance_apart(&mut self, apart: bool) {
        self.instance_apart = apart;
    }

    pub fn is_instance_apart(&self) -> bool {
        self.instance_apart
    }

    /// Reject writes that would re-point a loaded, apart model at another row.
    pub(super) fn guard_primary_key(&self, field: &str, new_value: &Value) -> Result<(), DataError> {
        let Some(schema) = self.schema() else {
            return Ok(());
        };
        if !self.instance_apart || !schema.primary_key.contains(field) || !self.is_loaded() {
            return Ok(());
        }
        match self.get(field) {
            Ok(current) if &current == new_value => Ok(()),
            _ => Err(DataError::PrimaryKeyReadOnly(field.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_value_shapes() {
        assert_eq!(KeyValue::from(7i64), KeyValue::Single(Value::Int(7)));
        let composite = KeyValue::composite([("pk2", Value::from("a")), ("pk1", Value::Int(1))]);
        let KeyValue::Composite(parts) = &composite else {
            panic!("expected composite");
        };
        assert_eq!(parts.keys().collect::<Vec<_>>(), ["pk1", "pk2"]);
        assert_eq!(
            serde_json::to_string(&composite).unwrap(),
            r#"{"pk1":1,"pk2":"a"}"#
        );
    }
}
