use crate::condition::{Condition, Order};
use crate::database::Database;
use crate::error::DataError;
use crate::query::{QueryBuilder, SqlStyle};
use rowbind_core::Record;

/// What a [`Finder`] looks for.
#[derive(Debug, Clone, Default)]
pub struct FinderOptions {
    pub table: String,
    pub condition: Condition,
    pub order: Vec<Order>,
}

/// Single-table query helper built on [`QueryBuilder`].
pub struct Finder<'a> {
    db: &'a dyn Database,
    options: FinderOptions,
    style: SqlStyle,
}

impl<'a> Finder<'a> {
    pub fn new(db: &'a dyn Database, options: FinderOptions, style: SqlStyle) -> Self {
        Self { db, options, style }
    }

    fn query(&self) -> QueryBuilder {
        QueryBuilder::new(&self.options.table)
            .with_style(self.style)
            .filter(self.options.condition.clone())
    }

    /// The first matching row, honouring the configured order.
    pub fn fetch_row(&self) -> Result<Option<Record>, DataError> {
        let stmt = self.query().orders(&self.options.order).limit(1).build_select(&["*"])?;
        tracing::debug!(table = %self.options.table, sql = %stmt.sql, "fetching row");
        self.db.fetch_row(&stmt.sql, &stmt.args)
    }

    pub fn fetch_count(&self) -> Result<u64, DataError> {
        let stmt = self.query().build_count()?;
        tracing::debug!(table = %self.options.table, sql = %stmt.sql, "counting rows");
        self.db.fetch_count(&stmt.sql, &stmt.args)
    }
}
