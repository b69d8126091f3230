use async_trait::async_trait;

use schemarule_core::{Result, SchemaSnapshot};

use crate::options::IntrospectOptions;

/// Trait implemented by database adapters that can capture table metadata.
#[async_trait]
pub trait Adapter {
    /// Returns the engine identifier (e.g. `postgres`).
    fn engine(&self) -> &'static str;

    /// Introspect the database and return an immutable snapshot.
    async fn introspect(&self, opts: &IntrospectOptions) -> Result<SchemaSnapshot>;
}
