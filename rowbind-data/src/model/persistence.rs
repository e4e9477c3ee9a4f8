use super::Model;
use crate::condition::{Condition, Order};
use crate::database::Database;
use crate::entity::Entity;
use crate::error::{DataError, ErrorKind};
use crate::finder::{Finder, FinderOptions};
use crate::query::{build_delete, build_insert, build_update, Assignments, InsertMode, Statement};
use crate::schema::TableSchema;
use rowbind_core::{ErrorRecord, Record};
use std::sync::Arc;

/// Error code stored in the model's error slot for failed statements.
pub const PERSISTENCE_ERROR_CODE: &str = "persistence";

impl<E: Entity> Model<E> {
    /// Load the row identified by the current primary-key value.
    ///
    /// Returns `Ok(false)` when no row matches.
    pub fn load(&mut self) -> Result<bool, DataError> {
        let condition = self.primary_key_condition()?;
        self.load_by_condition(condition, &[])
    }

    /// Load the first row matching `condition`, assign it and mark the model loaded.
    pub fn load_by_condition(
        &mut self,
        condition: impl Into<Condition>,
        order: &[Order],
    ) -> Result<bool, DataError> {
        let (db, _) = self.parts()?;
        let condition = condition.into();
        if condition.is_empty() {
            return Err(DataError::InvalidArgument(
                "load requires a non-empty condition".into(),
            ));
        }

        let options = FinderOptions {
            table: E::table_name().to_string(),
            condition,
            order: order.to_vec(),
        };
        let row = Finder::new(db.as_ref(), options, self.style)
            .fetch_row()
            .map_err(|err| self.persistence_failure(db.as_ref(), err))?;

        match row {
            Some(row) => {
                self.bulk_assign(row, true)?;
                Ok(true)
            }
            None => {
                tracing::debug!(table = E::table_name(), "no row matched");
                Ok(false)
            }
        }
    }

    /// True if the model is loaded, otherwise whether a row with its key exists.
    pub fn exists(&mut self) -> Result<bool, DataError> {
        let (db, _) = self.parts()?;
        if self.is_loaded() {
            return Ok(true);
        }
        let options = FinderOptions {
            table: E::table_name().to_string(),
            condition: self.primary_key_condition()?,
            order: Vec::new(),
        };
        let count = Finder::new(db.as_ref(), options, self.style)
            .fetch_count()
            .map_err(|err| self.persistence_failure(db.as_ref(), err))?;
        Ok(count > 0)
    }

    /// INSERT the row and mark the model loaded.
    ///
    /// The key comes from the database's last insert id for auto-increment
    /// tables, otherwise from the values already set, which must then be
    /// complete before anything is sent. When no key can be known after the
    /// insert the row is still written and the model stays unloaded.
    pub fn create(&mut self) -> Result<(), DataError> {
        let (db, schema) = self.parts()?;
        if self.instance_apart && self.is_loaded() {
            return Err(DataError::UnexpectedState(format!(
                "{} is already loaded; create would insert a second row for it",
                self.model_name()
            )));
        }
        let natural_key = !schema.primary_key.is_empty() && schema.auto_increment_column().is_none();
        if natural_key && self.primary_key_value().is_none() {
            return Err(DataError::InvalidArgument(format!(
                "primary key {:?} of {} must be set before create",
                schema.primary_key.columns(),
                self.model_name()
            )));
        }

        self.insert(db.as_ref(), &schema, InsertMode::Insert)?;
        self.adopt_insert_id(db.as_ref(), &schema)?;
        if self.primary_key_value().is_some() {
            self.mark_loaded()?;
        } else if !schema.primary_key.is_empty() {
            tracing::debug!(table = E::table_name(), "no insert id reported; model left unloaded");
        }
        Ok(())
    }

    /// `REPLACE INTO` the row. The model is never marked loaded.
    pub fn replace(&mut self) -> Result<(), DataError> {
        let (db, schema) = self.parts()?;
        self.insert(db.as_ref(), &schema, InsertMode::Replace)?;
        if !self.is_loaded() {
            self.adopt_insert_id(db.as_ref(), &schema)?;
        }
        Ok(())
    }

    /// UPDATE every field of [`to_record`](Model::to_record) by primary key.
    pub fn update(&mut self) -> Result<u64, DataError> {
        let condition = self.primary_key_condition()?;
        let data = self.to_record();
        self.update_by_condition(data, condition)
    }

    /// UPDATE the rows matching `condition` with `data`.
    ///
    /// Primary-key and locked fields are never written. With nothing left
    /// to write no statement is sent and `Ok(0)` is returned.
    pub fn update_by_condition(
        &mut self,
        mut data: Record,
        condition: impl Into<Condition>,
    ) -> Result<u64, DataError> {
        let (db, schema) = self.parts()?;
        let condition = condition.into();
        if condition.is_empty() {
            return Err(DataError::InvalidArgument(
                "update requires a non-empty condition".into(),
            ));
        }

        for col in schema.primary_key.columns() {
            data.remove(col);
        }
        let assignments = Assignments::build(&data, &schema.fields, &self.locked_fields);
        if assignments.is_empty() {
            tracing::debug!(table = E::table_name(), "nothing to update");
            return Ok(0);
        }

        let stmt = build_update(E::table_name(), &assignments, &condition, self.style)?;
        self.run(db.as_ref(), &stmt)
    }

    /// UPDATE only the comma-separated `fields`, by primary key.
    pub fn save_fields(&mut self, fields: &str) -> Result<u64, DataError> {
        let names: Vec<&str> = fields
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .collect();
        if names.is_empty() {
            return Err(DataError::InvalidArgument("no fields to save".into()));
        }

        let mut data = Record::new();
        for name in names {
            data.insert(name.to_string(), self.get(name)?);
        }
        let condition = self.primary_key_condition()?;
        self.update_by_condition(data, condition)
    }

    /// [`update`](Model::update) when loaded, [`create`](Model::create) otherwise.
    pub fn save(&mut self) -> Result<(), DataError> {
        if self.is_loaded() {
            self.update().map(|_| ())
        } else {
            self.create()
        }
    }

    /// DELETE the row by primary key; the model is no longer loaded afterwards.
    pub fn delete(&mut self) -> Result<u64, DataError> {
        let condition = self.primary_key_condition()?;
        let rows = self.delete_by_condition(condition)?;
        self.loaded_key = None;
        Ok(rows)
    }

    /// DELETE the rows matching `condition`, which must not be empty.
    pub fn delete_by_condition(&mut self, condition: impl Into<Condition>) -> Result<u64, DataError> {
        let condition = condition.into();
        if condition.is_empty() {
            return Err(DataError::InvalidArgument(
                "delete requires a non-empty condition".into(),
            ));
        }
        let (db, _) = self.parts()?;
        let stmt = build_delete(E::table_name(), &condition, self.style)?;
        self.run(db.as_ref(), &stmt)
    }

    // -- field locking ------------------------------------------------------

    pub fn lock_fields<I, S>(&mut self, fields: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.locked_fields
            .extend(fields.into_iter().map(|f| f.as_ref().to_string()));
    }

    pub fn unlock_fields<I, S>(&mut self, fields: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for field in fields {
            self.locked_fields.remove(field.as_ref());
        }
    }

    pub fn locked_fields(&self) -> &std::collections::BTreeSet<String> {
        &self.locked_fields
    }

    // -- helpers ------------------------------------------------------------

    fn insert(
        &mut self,
        db: &dyn Database,
        schema: &TableSchema,
        mode: InsertMode,
    ) -> Result<u64, DataError> {
        let record = self.to_record();
        let assignments = Assignments::build(&record, &schema.fields, &self.locked_fields);
        let stmt = build_insert(E::table_name(), &assignments, mode, self.style)?;
        self.run(db, &stmt)
    }

    fn adopt_insert_id(&mut self, db: &dyn Database, schema: &Arc<TableSchema>) -> Result<(), DataError> {
        if let Some(col) = schema.auto_increment_column() {
            if let Some(id) = db.last_insert_id() {
                self.set(col, id)?;
            }
        }
        Ok(())
    }

    fn run(&mut self, db: &dyn Database, stmt: &Statement) -> Result<u64, DataError> {
        tracing::debug!(
            table = E::table_name(),
            sql = %stmt.sql,
            args = stmt.args.len(),
            "executing statement"
        );
        let rows = db
            .execute(&stmt.sql, &stmt.args)
            .map_err(|err| self.persistence_failure(db, err))?;
        tracing::debug!(table = E::table_name(), rows, "statement executed");
        Ok(rows)
    }

    /// Turn a driver failure into `DataError::Persistence` carrying the
    /// database's last error text, and record it in the error slot.
    ///
    /// Configuration errors pass through untouched.
    fn persistence_failure(&mut self, db: &dyn Database, err: DataError) -> DataError {
        if err.kind() != ErrorKind::Persistence {
            return err;
        }
        let message = db.last_error().unwrap_or_else(|| err.to_string());
        tracing::warn!(table = E::table_name(), error = %message, "statement failed");
        self.error
            .push(ErrorRecord::new(message.clone()).with_code(PERSISTENCE_ERROR_CODE));
        DataError::Persistence(message)
    }
}
