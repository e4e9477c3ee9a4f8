use super::{Model, RESERVED_NAMES};
use crate::entity::{is_declared_property, mapped_property, Entity};
use crate::error::DataError;
use rowbind_core::{Record, Value};

/// Where a name resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    /// A mapped field, stored in this entity property.
    Mapped(&'static str),
    /// A declared or reserved name that is not a mapped field.
    Declared,
    Dynamic,
}

impl<E: Entity> Model<E> {
    fn slot(name: &str) -> Slot {
        if let Some(property) = mapped_property::<E>(name) {
            Slot::Mapped(property)
        } else if RESERVED_NAMES.contains(&name) || is_declared_property::<E>(name) {
            Slot::Declared
        } else {
            Slot::Dynamic
        }
    }

    /// Current value of a field or dynamic attribute.
    ///
    /// A mapped field returns its bound value, `Null` included. An unset
    /// dynamic attribute is an error, never a silent `Null`.
    pub fn get(&self, name: &str) -> Result<Value, DataError> {
        match Self::slot(name) {
            Slot::Mapped(property) => self
                .entity
                .property(property)
                .ok_or_else(|| DataError::PropertyNotFound(name.to_string())),
            Slot::Declared => Err(DataError::InaccessibleProperty(name.to_string())),
            Slot::Dynamic => self
                .attributes
                .get(name)
                .cloned()
                .ok_or_else(|| DataError::PropertyNotFound(name.to_string())),
        }
    }

    /// Like [`get`](Model::get), with a fallback for unset values.
    ///
    /// Declared-property collisions are still errors.
    pub fn get_or(&self, name: &str, default: impl Into<Value>) -> Result<Value, DataError> {
        match self.get(name) {
            Err(DataError::PropertyNotFound(_)) => Ok(default.into()),
            other => other,
        }
    }

    /// Resolve `name` for a write of `value`, applying the collision and
    /// primary-key checks without touching any state.
    fn writable_slot(&self, name: &str, value: &Value) -> Result<Slot, DataError> {
        let slot = Self::slot(name);
        if slot == Slot::Declared {
            return Err(DataError::InaccessibleProperty(name.to_string()));
        }
        self.guard_primary_key(name, value)?;
        Ok(slot)
    }

    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<(), DataError> {
        let value = value.into();
        match self.writable_slot(name, &value)? {
            Slot::Mapped(property) => self.entity.set_property(property, value),
            _ => {
                self.attributes.insert(name.to_string(), value);
                Ok(())
            }
        }
    }

    /// Mapped fields report whether the property holds a non-null value;
    /// dynamic attributes whether the key is present.
    pub fn has(&self, name: &str) -> bool {
        match Self::slot(name) {
            Slot::Mapped(property) => self.entity.property(property).is_some_and(|v| !v.is_null()),
            Slot::Declared => false,
            Slot::Dynamic => self.attributes.contains_key(name),
        }
    }

    /// Null out a mapped property, or drop a dynamic attribute.
    pub fn remove(&mut self, name: &str) -> Result<(), DataError> {
        match self.writable_slot(name, &Value::Null)? {
            Slot::Mapped(property) => self.entity.set_property(property, Value::Null),
            _ => {
                self.attributes.remove(name);
                Ok(())
            }
        }
    }

    /// Assign every pair through [`set`](Model::set).
    ///
    /// Every name is checked before the first write, so a collision or a
    /// primary-key violation leaves the model untouched.
    pub fn bulk_assign<K, V>(
        &mut self,
        data: impl IntoIterator<Item = (K, V)>,
        mark_as_loaded: bool,
    ) -> Result<(), DataError>
    where
        K: AsRef<str>,
        V: Into<Value>,
    {
        let data: Vec<(K, Value)> = data.into_iter().map(|(k, v)| (k, v.into())).collect();
        for (name, value) in &data {
            self.writable_slot(name.as_ref(), value)?;
        }
        for (name, value) in data {
            self.set(name.as_ref(), value)?;
        }
        if mark_as_loaded {
            self.mark_loaded()?;
        }
        Ok(())
    }

    /// The persistable row state: every dynamic attribute plus every mapped
    /// field, nulls included.
    pub fn to_record(&self) -> Record {
        let mut record = self.attributes.clone();
        for (field, property) in E::field_map() {
            if let Some(value) = self.entity.property(property) {
                record.insert(field.to_string(), value);
            }
        }
        record
    }

    pub fn to_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self.to_record())
    }
}
