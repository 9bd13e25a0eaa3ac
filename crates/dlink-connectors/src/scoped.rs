//! Table connectors bound to their isolated context

use std::sync::Arc;

use dlink_core::{Parameter, Result, TableConnector, TableField};

use crate::ambient::run_in_context;
use crate::isolation::IsolatedContext;

/// A table connector whose every call runs under its own context.
///
/// The connector is dropped before the context so code from the connector's
/// archives never outlives them.
pub struct ScopedTableConnector {
    inner: Box<dyn TableConnector>,
    context: Arc<IsolatedContext>,
}

impl ScopedTableConnector {
    pub fn new(inner: Box<dyn TableConnector>, context: Arc<IsolatedContext>) -> Self {
        Self { inner, context }
    }

    pub fn context(&self) -> &Arc<IsolatedContext> {
        &self.context
    }

    fn scoped<T>(&mut self, call: impl FnOnce(&mut dyn TableConnector) -> T) -> T {
        let inner = &mut self.inner;
        run_in_context(&self.context, || call(inner.as_mut()))
    }
}

impl TableConnector for ScopedTableConnector {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn initialize(&mut self, param: &Parameter) -> Result<()> {
        self.scoped(|c| c.initialize(param))
    }

    fn list_databases(&mut self) -> Result<Vec<String>> {
        self.scoped(|c| c.list_databases())
    }

    fn list_tables(&mut self, database: &str) -> Result<Vec<String>> {
        self.scoped(|c| c.list_tables(database))
    }

    fn list_tables_matching(&mut self, database: &str, pattern: Option<&str>) -> Result<Vec<String>> {
        self.scoped(|c| c.list_tables_matching(database, pattern))
    }

    fn list_columns(&mut self, database: &str, table: &str) -> Result<Vec<TableField>> {
        self.scoped(|c| c.list_columns(database, table))
    }

    fn list_columns_matching(
        &mut self,
        database: &str,
        table: &str,
        pattern: Option<&str>,
    ) -> Result<Vec<TableField>> {
        self.scoped(|c| c.list_columns_matching(database, table, pattern))
    }

    fn test_connectivity(&mut self) -> bool {
        self.scoped(|c| c.test_connectivity())
    }

    fn close(&mut self) -> Result<()> {
        self.scoped(|c| c.close())
    }
}
