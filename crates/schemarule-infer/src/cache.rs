use std::collections::BTreeSet;
use std::sync::Arc;

use dashmap::DashMap;
use schemarule_core::{
    AssociationDescriptor, ColumnDescriptor, IndexDescriptor, MetadataProvider, Result,
};

/// Provider wrapper that memoizes index lookups per table.
///
/// Entries are computed once and never mutated afterwards. Two threads
/// racing on a cold table may both query the inner provider; the first
/// insert wins and the results are equivalent. Errors are not cached.
#[derive(Debug)]
pub struct CachedProvider<P> {
    inner: P,
    indexes: DashMap<String, Arc<[IndexDescriptor]>>,
}

impl<P: MetadataProvider> CachedProvider<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            indexes: DashMap::new(),
        }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    /// Number of tables with cached indexes.
    pub fn cached_tables(&self) -> usize {
        self.indexes.len()
    }

    fn cached_indexes(&self, table: &str) -> Result<Arc<[IndexDescriptor]>> {
        if let Some(hit) = self.indexes.get(table) {
            return Ok(Arc::clone(hit.value()));
        }

        let computed: Arc<[IndexDescriptor]> = self.inner.indexes(table)?.into();
        let entry = self
            .indexes
            .entry(table.to_string())
            .or_insert(computed);
        Ok(Arc::clone(entry.value()))
    }
}

impl<P: MetadataProvider> MetadataProvider for CachedProvider<P> {
    fn columns(&self, table: &str) -> Result<Vec<ColumnDescriptor>> {
        self.inner.columns(table)
    }

    fn indexes(&self, table: &str) -> Result<Vec<IndexDescriptor>> {
        Ok(self.cached_indexes(table)?.to_vec())
    }

    fn associations(&self, table: &str) -> Result<Vec<AssociationDescriptor>> {
        self.inner.associations(table)
    }

    fn enumerated_columns(&self, table: &str) -> Result<BTreeSet<String>> {
        self.inner.enumerated_columns(table)
    }

    fn primary_key(&self, table: &str) -> Result<Option<String>> {
        self.inner.primary_key(table)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use schemarule_core::{ColumnType, Error};

    #[derive(Default)]
    struct CountingProvider {
        index_reads: AtomicUsize,
    }

    impl MetadataProvider for CountingProvider {
        fn columns(&self, _table: &str) -> Result<Vec<ColumnDescriptor>> {
            Ok(vec![ColumnDescriptor::new("name", ColumnType::String)])
        }

        fn indexes(&self, table: &str) -> Result<Vec<IndexDescriptor>> {
            self.index_reads.fetch_add(1, Ordering::SeqCst);
            if table == "broken" {
                return Err(Error::Db("connection reset".to_string()));
            }
            Ok(vec![IndexDescriptor::unique("idx_name", &["name"])])
        }

        fn associations(&self, _table: &str) -> Result<Vec<AssociationDescriptor>> {
            Ok(Vec::new())
        }

        fn enumerated_columns(&self, _table: &str) -> Result<BTreeSet<String>> {
            Ok(BTreeSet::new())
        }

        fn primary_key(&self, _table: &str) -> Result<Option<String>> {
            Ok(None)
        }
    }

    #[test]
    fn indexes_are_read_once_per_table() {
        let provider = CachedProvider::new(CountingProvider::default());

        let first = provider.indexes("people").unwrap();
        let second = provider.indexes("people").unwrap();
        provider.indexes("places").unwrap();

        assert_eq!(first, second);
        assert_eq!(provider.inner().index_reads.load(Ordering::SeqCst), 2);
        assert_eq!(provider.cached_tables(), 2);
    }

    #[test]
    fn errors_propagate_and_are_not_cached() {
        let provider = CachedProvider::new(CountingProvider::default());

        assert!(matches!(provider.indexes("broken"), Err(Error::Db(_))));
        assert!(provider.indexes("broken").is_err());
        assert_eq!(provider.inner().index_reads.load(Ordering::SeqCst), 2);
        assert_eq!(provider.cached_tables(), 0);
    }
}
