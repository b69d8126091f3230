use std::collections::BTreeSet;

use crate::error::{Error, Result};
use crate::schema::{SchemaSnapshot, TableSnapshot};

/// Validate internal consistency of a schema snapshot.
///
/// This checks:
/// - duplicate tables/columns
/// - primary key columns exist
/// - index columns exist
/// - belongs-to foreign key columns exist
pub fn validate_snapshot(snapshot: &SchemaSnapshot) -> Result<()> {
    let mut tables = BTreeSet::new();

    for table in &snapshot.tables {
        if !tables.insert(table.name.as_str()) {
            return Err(Error::InvalidSchema(format!(
                "duplicate table name: {}",
                table.name
            )));
        }

        validate_table(table)?;
    }

    Ok(())
}

fn validate_table(table: &TableSnapshot) -> Result<()> {
    let mut columns = BTreeSet::new();
    for column in &table.columns {
        if !columns.insert(column.name.as_str()) {
            return Err(Error::InvalidSchema(format!(
                "duplicate column name: {}.{}",
                table.name, column.name
            )));
        }
    }

    if let Some(pk) = &table.primary_key {
        if !columns.contains(pk.as_str()) {
            return Err(Error::InvalidSchema(format!(
                "primary key column not found: {}.{}",
                table.name, pk
            )));
        }
    }

    for index in &table.indexes {
        if index.columns.is_empty() {
            return Err(Error::InvalidSchema(format!(
                "index without columns: {}.{}",
                table.name, index.name
            )));
        }

        for column in &index.columns {
            if !columns.contains(column.as_str()) {
                return Err(Error::InvalidSchema(format!(
                    "index column not found: {}.{} ({})",
                    table.name, column, index.name
                )));
            }
        }
    }

    for assoc in &table.belongs_to {
        if !columns.contains(assoc.foreign_key.as_str()) {
            return Err(Error::InvalidSchema(format!(
                "foreign key column not found: {}.{} (association {})",
                table.name, assoc.foreign_key, assoc.name
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{BelongsTo, ColumnDescriptor, ColumnType, IndexDescriptor};

    fn table(name: &str) -> TableSnapshot {
        TableSnapshot {
            name: name.to_string(),
            primary_key: Some("id".to_string()),
            columns: vec![
                ColumnDescriptor::new("id", ColumnType::Integer),
                ColumnDescriptor::new("name", ColumnType::String),
            ],
            indexes: Vec::new(),
            belongs_to: Vec::new(),
        }
    }

    fn snapshot(tables: Vec<TableSnapshot>) -> SchemaSnapshot {
        SchemaSnapshot {
            schema_version: crate::SCHEMA_VERSION.to_string(),
            engine: "postgres".to_string(),
            database: Some("db".to_string()),
            tables,
        }
    }

    #[test]
    fn accepts_consistent_snapshot() {
        let mut users = table("users");
        users.indexes.push(IndexDescriptor::unique("users_name_key", &["name"]));
        assert!(validate_snapshot(&snapshot(vec![users, table("orders")])).is_ok());
    }

    #[test]
    fn rejects_duplicate_tables() {
        let err = validate_snapshot(&snapshot(vec![table("users"), table("users")])).unwrap_err();
        assert!(err.to_string().contains("duplicate table name"));
    }

    #[test]
    fn rejects_unknown_index_column() {
        let mut users = table("users");
        users
            .indexes
            .push(IndexDescriptor::unique("users_mail_key", &["mail"]));
        let err = validate_snapshot(&snapshot(vec![users])).unwrap_err();
        assert!(err.to_string().contains("index column not found"));
    }

    #[test]
    fn rejects_dangling_association() {
        let mut users = table("users");
        users.belongs_to.push(BelongsTo {
            name: "organisation".to_string(),
            foreign_key: "organisation_id".to_string(),
        });
        let err = validate_snapshot(&snapshot(vec![users])).unwrap_err();
        assert!(err.to_string().contains("foreign key column not found"));
    }
}
