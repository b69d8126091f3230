use schemarule_core::{BelongsTo, ColumnDescriptor, ColumnType, IndexDescriptor};
use tracing::debug;

use super::queries::{RawColumn, RawForeignKey, RawIndex};

/// Map a Postgres type name to the logical column type.
pub fn column_type_from_udt(udt_name: &str) -> ColumnType {
    match udt_name {
        "varchar" | "bpchar" | "text" | "citext" => ColumnType::String,
        "int2" | "int4" | "int8" => ColumnType::Integer,
        "numeric" => ColumnType::Decimal,
        "float4" | "float8" => ColumnType::Float,
        "bool" => ColumnType::Boolean,
        other => ColumnType::Other(other.to_string()),
    }
}

/// User enum types hold labels, so they are reported as enumerated strings.
pub fn map_columns(raw: Vec<RawColumn>) -> Vec<ColumnDescriptor> {
    raw.into_iter()
        .map(|col| ColumnDescriptor {
            column_type: if col.is_enum {
                ColumnType::String
            } else {
                column_type_from_udt(&col.udt_name)
            },
            name: col.name,
            nullable: col.is_nullable,
            limit: col
                .character_max_length
                .and_then(|limit| u32::try_from(limit).ok()),
            enumerated: col.is_enum,
            collation: col.collation,
        })
        .collect()
}

/// A composite primary key cannot be excluded column by column; only a
/// single-column key is reported.
pub fn map_primary_key(columns: Vec<String>) -> Option<String> {
    match <[String; 1]>::try_from(columns) {
        Ok([column]) => Some(column),
        Err(_) => None,
    }
}

/// Indexes over expressions are dropped: their key cannot be expressed as
/// plain columns.
pub fn map_indexes(raw: Vec<RawIndex>) -> Vec<IndexDescriptor> {
    raw.into_iter()
        .filter_map(|idx| {
            if idx.has_expressions || idx.columns.is_empty() {
                debug!(index = %idx.name, "skipping expression index");
                return None;
            }

            Some(IndexDescriptor {
                name: idx.name,
                columns: idx.columns,
                unique: idx.is_unique,
                partial: idx.is_partial,
            })
        })
        .collect()
}

/// Single-column foreign keys become belongs-to associations named after
/// the column without its `_id` suffix, or after the referenced table.
pub fn map_foreign_keys(raw: Vec<RawForeignKey>) -> Vec<BelongsTo> {
    raw.into_iter()
        .filter_map(|fk| {
            let [column] = <[String; 1]>::try_from(fk.columns).ok()?;
            let name = association_name(&column, &fk.referenced_table);
            Some(BelongsTo {
                name,
                foreign_key: column,
            })
        })
        .collect()
}

fn association_name(column: &str, referenced_table: &str) -> String {
    match column.strip_suffix("_id") {
        Some(stem) if !stem.is_empty() => stem.to_string(),
        _ => referenced_table.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_postgres_types() {
        assert_eq!(column_type_from_udt("varchar"), ColumnType::String);
        assert_eq!(column_type_from_udt("int8"), ColumnType::Integer);
        assert_eq!(column_type_from_udt("numeric"), ColumnType::Decimal);
        assert_eq!(column_type_from_udt("float8"), ColumnType::Float);
        assert_eq!(column_type_from_udt("bool"), ColumnType::Boolean);
        assert_eq!(
            column_type_from_udt("timestamptz"),
            ColumnType::Other("timestamptz".to_string())
        );
    }

    #[test]
    fn maps_columns_with_limits_and_enums() {
        let columns = map_columns(vec![
            RawColumn {
                name: "name".to_string(),
                udt_name: "varchar".to_string(),
                is_nullable: false,
                is_enum: false,
                character_max_length: Some(100),
                collation: None,
            },
            RawColumn {
                name: "status".to_string(),
                udt_name: "status".to_string(),
                is_nullable: true,
                is_enum: true,
                character_max_length: None,
                collation: None,
            },
        ]);

        assert_eq!(
            columns[0],
            ColumnDescriptor::new("name", ColumnType::String).with_limit(100)
        );
        assert_eq!(columns[1].column_type, ColumnType::String);
        assert!(columns[1].enumerated);
        assert!(columns[1].nullable);
        assert_eq!(columns[1].limit, None);
    }

    #[test]
    fn composite_primary_key_is_not_reported() {
        assert_eq!(map_primary_key(vec!["id".to_string()]), Some("id".to_string()));
        assert_eq!(
            map_primary_key(vec!["tenant_id".to_string(), "id".to_string()]),
            None
        );
        assert_eq!(map_primary_key(Vec::new()), None);
    }

    #[test]
    fn expression_indexes_are_skipped() {
        let indexes = map_indexes(vec![
            RawIndex {
                name: "users_lower_email".to_string(),
                is_unique: true,
                is_partial: false,
                has_expressions: true,
                columns: Vec::new(),
            },
            RawIndex {
                name: "users_active_handle".to_string(),
                is_unique: true,
                is_partial: true,
                has_expressions: false,
                columns: vec!["handle".to_string()],
            },
        ]);

        assert_eq!(indexes.len(), 1);
        assert!(indexes[0].partial);
        assert!(!indexes[0].enforces_uniqueness());
    }

    #[test]
    fn names_associations_from_foreign_keys() {
        let associations = map_foreign_keys(vec![
            RawForeignKey {
                name: "resources_organisation_fk".to_string(),
                columns: vec!["organisation_id".to_string()],
                referenced_table: "organisations".to_string(),
            },
            RawForeignKey {
                name: "resources_manager_fk".to_string(),
                columns: vec!["manager".to_string()],
                referenced_table: "people".to_string(),
            },
            RawForeignKey {
                name: "resources_composite_fk".to_string(),
                columns: vec!["a".to_string(), "b".to_string()],
                referenced_table: "pairs".to_string(),
            },
        ]);

        assert_eq!(
            associations,
            vec![
                BelongsTo {
                    name: "organisation".to_string(),
                    foreign_key: "organisation_id".to_string(),
                },
                BelongsTo {
                    name: "people".to_string(),
                    foreign_key: "manager".to_string(),
                },
            ]
        );
    }
}
