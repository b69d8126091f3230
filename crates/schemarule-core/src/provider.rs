use std::collections::BTreeSet;

use crate::error::{Error, Result};
use crate::schema::{
    AssociationDescriptor, ColumnDescriptor, IndexDescriptor, SchemaSnapshot, TableSnapshot,
};

/// Source of table metadata consumed by rule inference.
///
/// Failures (unreadable schema, missing table) are returned as errors and
/// must be propagated by callers rather than masked.
pub trait MetadataProvider {
    /// Columns of the table, in declaration order.
    fn columns(&self, table: &str) -> Result<Vec<ColumnDescriptor>>;

    fn indexes(&self, table: &str) -> Result<Vec<IndexDescriptor>>;

    /// Belongs-to associations of the table.
    fn associations(&self, table: &str) -> Result<Vec<AssociationDescriptor>>;

    fn enumerated_columns(&self, table: &str) -> Result<BTreeSet<String>>;

    fn primary_key(&self, table: &str) -> Result<Option<String>>;
}

impl SchemaSnapshot {
    /// Look up a table by name.
    pub fn table(&self, name: &str) -> Result<&TableSnapshot> {
        self.tables
            .iter()
            .find(|table| table.name == name)
            .ok_or_else(|| Error::InvalidSchema(format!("table not found: {name}")))
    }

    pub fn table_names(&self) -> Vec<&str> {
        self.tables.iter().map(|table| table.name.as_str()).collect()
    }
}

impl MetadataProvider for SchemaSnapshot {
    fn columns(&self, table: &str) -> Result<Vec<ColumnDescriptor>> {
        Ok(self.table(table)?.columns.clone())
    }

    fn indexes(&self, table: &str) -> Result<Vec<IndexDescriptor>> {
        Ok(self.table(table)?.indexes.clone())
    }

    fn associations(&self, table: &str) -> Result<Vec<AssociationDescriptor>> {
        Ok(self.table(table)?.associations())
    }

    fn enumerated_columns(&self, table: &str) -> Result<BTreeSet<String>> {
        Ok(self
            .table(table)?
            .columns
            .iter()
            .filter(|column| column.enumerated)
            .map(|column| column.name.clone())
            .collect())
    }

    fn primary_key(&self, table: &str) -> Result<Option<String>> {
        Ok(self.table(table)?.primary_key.clone())
    }
}
