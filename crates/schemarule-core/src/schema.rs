use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Top-level snapshot of the tables rules are inferred for.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SchemaSnapshot {
    /// Contract version for this snapshot format.
    pub schema_version: String,
    /// Database engine identifier (e.g. `postgres`).
    pub engine: String,
    /// Database name when available.
    #[serde(default)]
    pub database: Option<String>,
    /// Tables captured in the snapshot.
    pub tables: Vec<TableSnapshot>,
}

/// Immutable metadata for a single table.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TableSnapshot {
    pub name: String,
    #[serde(default)]
    pub primary_key: Option<String>,
    pub columns: Vec<ColumnDescriptor>,
    #[serde(default)]
    pub indexes: Vec<IndexDescriptor>,
    /// Belongs-to associations backed by a foreign key column of this table.
    #[serde(default)]
    pub belongs_to: Vec<BelongsTo>,
}

impl TableSnapshot {
    /// Look up a column by name.
    pub fn column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|column| column.name == name)
    }

    /// Resolve belongs-to declarations into association descriptors.
    ///
    /// An association is required when its foreign key column is not nullable.
    pub fn associations(&self) -> Vec<AssociationDescriptor> {
        self.belongs_to
            .iter()
            .map(|assoc| AssociationDescriptor {
                name: assoc.name.clone(),
                foreign_key: assoc.foreign_key.clone(),
                required: self
                    .column(&assoc.foreign_key)
                    .is_some_and(|column| !column.nullable),
            })
            .collect()
    }
}

/// Logical column type as far as rule inference is concerned.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    String,
    Integer,
    Decimal,
    Float,
    Boolean,
    /// Any other storage type, keeping the raw type name.
    Other(String),
}

/// Column metadata for a table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub struct ColumnDescriptor {
    pub name: String,
    pub column_type: ColumnType,
    pub nullable: bool,
    /// Declared maximum length for string columns.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    /// Raw value maps to a closed symbolic value set.
    #[serde(default)]
    pub enumerated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collation: Option<String>,
}

impl ColumnDescriptor {
    /// Create a non-nullable column of the given type.
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            nullable: false,
            limit: None,
            enumerated: false,
            collation: None,
        }
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn enumerated(mut self) -> Self {
        self.enumerated = true;
        self
    }

    pub fn with_collation(mut self, collation: impl Into<String>) -> Self {
        self.collation = Some(collation.into());
        self
    }

    /// Whether comparisons on this column honour case.
    ///
    /// Columns without a collation are case sensitive. `*_ci` collations,
    /// SQLite `NOCASE` and ICU strength level 1/2 collations are not.
    pub fn case_sensitive(&self) -> bool {
        let Some(collation) = self.collation.as_deref() else {
            return true;
        };
        let collation = collation.to_ascii_lowercase();
        !(collation.ends_with("_ci")
            || collation == "nocase"
            || collation.contains("ks-level1")
            || collation.contains("ks-level2"))
    }
}

/// Index definition preserving key column order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub struct IndexDescriptor {
    pub name: String,
    pub columns: Vec<String>,
    pub unique: bool,
    /// The index carries a filter predicate.
    #[serde(default)]
    pub partial: bool,
}

impl IndexDescriptor {
    pub fn unique(name: impl Into<String>, columns: &[&str]) -> Self {
        Self {
            name: name.into(),
            columns: columns.iter().map(|column| column.to_string()).collect(),
            unique: true,
            partial: false,
        }
    }

    pub fn partial(mut self) -> Self {
        self.partial = true;
        self
    }

    /// Unique over every row, i.e. able to back a uniqueness rule.
    pub fn enforces_uniqueness(&self) -> bool {
        self.unique && !self.partial
    }

    /// Last key column, the one a scoped uniqueness rule targets.
    pub fn target_column(&self) -> Option<&str> {
        self.columns.last().map(String::as_str)
    }

    /// Columns preceding the target column, in key order.
    pub fn scope(&self) -> &[String] {
        match self.columns.split_last() {
            Some((_, scope)) => scope,
            None => &[],
        }
    }
}

/// Belongs-to declaration as stored in a snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub struct BelongsTo {
    pub name: String,
    pub foreign_key: String,
}

/// Belongs-to association resolved against its foreign key column.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub struct AssociationDescriptor {
    pub name: String,
    pub foreign_key: String,
    /// The foreign key column is not nullable.
    pub required: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collation_controls_case_sensitivity() {
        let plain = ColumnDescriptor::new("name", ColumnType::String);
        assert!(plain.case_sensitive());
        assert!(!plain.clone().with_collation("utf8mb4_general_ci").case_sensitive());
        assert!(!plain.clone().with_collation("NOCASE").case_sensitive());
        assert!(!plain.clone().with_collation("und-u-ks-level2").case_sensitive());
        assert!(plain.with_collation("C").case_sensitive());
    }

    #[test]
    fn index_scope_excludes_target_column() {
        let index = IndexDescriptor::unique("idx", &["country", "city", "name"]);
        assert_eq!(index.target_column(), Some("name"));
        assert_eq!(index.scope(), ["country".to_string(), "city".to_string()]);

        let single = IndexDescriptor::unique("idx_single", &["identifier"]);
        assert!(single.scope().is_empty());
        assert!(!single.clone().partial().enforces_uniqueness());
    }

    #[test]
    fn associations_follow_foreign_key_nullability() {
        let table = TableSnapshot {
            name: "capabilities".to_string(),
            primary_key: Some("id".to_string()),
            columns: vec![
                ColumnDescriptor::new("organisation_id", ColumnType::Integer).nullable(),
                ColumnDescriptor::new("owner_id", ColumnType::Integer),
            ],
            indexes: Vec::new(),
            belongs_to: vec![
                BelongsTo {
                    name: "organisation".to_string(),
                    foreign_key: "organisation_id".to_string(),
                },
                BelongsTo {
                    name: "owner".to_string(),
                    foreign_key: "owner_id".to_string(),
                },
            ],
        };

        let associations = table.associations();
        assert!(!associations[0].required);
        assert!(associations[1].required);
    }
}
