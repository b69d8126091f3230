/// Options that control how introspection behaves.
#[derive(Debug, Clone)]
pub struct IntrospectOptions {
    /// Namespace to read tables from.
    pub schema: String,
    /// Restrict the snapshot to these tables.
    pub tables: Option<Vec<String>>,
    /// Capture indexes; without them no uniqueness rule can be inferred.
    pub include_indexes: bool,
    /// Capture single-column foreign keys as belongs-to associations.
    pub include_associations: bool,
}

impl Default for IntrospectOptions {
    fn default() -> Self {
        Self {
            schema: "public".to_string(),
            tables: None,
            include_indexes: true,
            include_associations: true,
        }
    }
}

impl IntrospectOptions {
    pub fn table_enabled(&self, table: &str) -> bool {
        match &self.tables {
            Some(list) => list.iter().any(|item| item == table),
            None => true,
        }
    }
}
