use sqlx::PgPool;
use tracing::info;

use schemarule_core::{Result, SCHEMA_VERSION, SchemaSnapshot, TableSnapshot};

use crate::adapter::Adapter;
use crate::options::IntrospectOptions;

mod mapper;
mod queries;

/// Adapter for PostgreSQL databases.
#[derive(Debug, Clone)]
pub struct PostgresAdapter {
    pool: PgPool,
}

impl PostgresAdapter {
    /// Create a new adapter using a pre-configured pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl Adapter for PostgresAdapter {
    fn engine(&self) -> &'static str {
        "postgres"
    }

    async fn introspect(&self, opts: &IntrospectOptions) -> Result<SchemaSnapshot> {
        introspect(&self.pool, opts).await
    }
}

/// Introspect Postgres with default options.
pub async fn introspect_postgres(pool: &PgPool) -> Result<SchemaSnapshot> {
    introspect_postgres_with_options(pool, IntrospectOptions::default()).await
}

/// Introspect Postgres with caller-provided options.
pub async fn introspect_postgres_with_options(
    pool: &PgPool,
    opts: IntrospectOptions,
) -> Result<SchemaSnapshot> {
    introspect(pool, &opts).await
}

/// Capture every table of the configured namespace.
pub async fn introspect(pool: &PgPool, opts: &IntrospectOptions) -> Result<SchemaSnapshot> {
    let database = queries::fetch_database_name(pool).await?;
    let table_names = queries::list_tables_in_schema(pool, &opts.schema).await?;

    let mut tables = Vec::new();
    for name in table_names {
        if !opts.table_enabled(&name) {
            continue;
        }

        tables.push(introspect_table(pool, &opts.schema, name, opts).await?);
    }

    info!(
        schema = %opts.schema,
        tables = tables.len(),
        "introspection finished"
    );

    Ok(SchemaSnapshot {
        schema_version: SCHEMA_VERSION.to_string(),
        engine: "postgres".to_string(),
        database: Some(database),
        tables,
    })
}

async fn introspect_table(
    pool: &PgPool,
    schema: &str,
    name: String,
    opts: &IntrospectOptions,
) -> Result<TableSnapshot> {
    let columns = mapper::map_columns(queries::list_columns(pool, schema, &name).await?);
    let primary_key = mapper::map_primary_key(queries::get_primary_key(pool, schema, &name).await?);

    let indexes = if opts.include_indexes {
        mapper::map_indexes(queries::list_indexes(pool, schema, &name).await?)
    } else {
        Vec::new()
    };

    let belongs_to = if opts.include_associations {
        mapper::map_foreign_keys(queries::list_foreign_keys(pool, schema, &name).await?)
    } else {
        Vec::new()
    };

    Ok(TableSnapshot {
        name,
        primary_key,
        columns,
        indexes,
        belongs_to,
    })
}
