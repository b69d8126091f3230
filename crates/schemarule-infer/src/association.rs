use std::collections::HashMap;

use schemarule_core::AssociationDescriptor;

/// Lookup from foreign key column to the belongs-to association it backs.
#[derive(Debug, Clone, Default)]
pub struct AssociationResolver {
    by_foreign_key: HashMap<String, AssociationDescriptor>,
}

impl AssociationResolver {
    /// Build the lookup; when several associations share a foreign key the
    /// first one wins.
    pub fn new(associations: impl IntoIterator<Item = AssociationDescriptor>) -> Self {
        let mut by_foreign_key = HashMap::new();
        for association in associations {
            by_foreign_key
                .entry(association.foreign_key.clone())
                .or_insert(association);
        }
        Self { by_foreign_key }
    }

    pub fn resolve(&self, column: &str) -> Option<&AssociationDescriptor> {
        self.by_foreign_key.get(column)
    }
}
