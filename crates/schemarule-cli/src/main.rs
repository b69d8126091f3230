mod config;
mod registry;

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::{Args, Parser, Subcommand};
use schemarule_core::{
    DerivedRule, Error as CoreError, SCHEMA_VERSION, SchemaSnapshot, validate_snapshot,
};
use schemarule_infer::{CachedProvider, ConstraintEmitter, RuleRegistry, emit_rules};
use schemarule_introspect::{Adapter, IntrospectOptions, PostgresAdapter};
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;
use uuid::Uuid;

use config::{ConfigError, load_config};
use registry::{RunContext, TableRules, init_logging, start_run, write_json, write_rules};

#[derive(Debug, Error)]
enum CliError {
    #[error("registry error: {0}")]
    Registry(#[from] registry::RegistryError),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("core error: {0}")]
    Core(#[from] CoreError),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported engine: {0}")]
    UnsupportedEngine(String),
}

#[derive(Parser, Debug)]
#[command(name = "schemarule", version, about = "Derive validation rules from table schemas")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Capture table metadata from a live database into a snapshot file.
    Introspect(IntrospectArgs),
    /// Derive validation rules from a snapshot file.
    Infer(InferArgs),
}

#[derive(Args, Debug)]
struct IntrospectArgs {
    /// Database connection string.
    #[arg(value_name = "CONNECTION_STRING")]
    conn: String,
    /// Schema (namespace) to read tables from.
    #[arg(long, default_value = "public")]
    schema: String,
    /// Table name(s) to include; all tables when omitted.
    #[arg(long, value_name = "TABLE")]
    table: Vec<String>,
    /// Output path for the snapshot.
    #[arg(long, default_value = "snapshot.json")]
    out: PathBuf,
    /// Skip index introspection.
    #[arg(long, default_value_t = false)]
    skip_indexes: bool,
    /// Skip foreign key introspection.
    #[arg(long, default_value_t = false)]
    skip_associations: bool,
    /// Log at debug level.
    #[arg(long, short, default_value_t = false)]
    verbose: bool,
}

#[derive(Args, Debug)]
struct InferArgs {
    /// Snapshot produced by `schemarule introspect`.
    #[arg(long, default_value = "snapshot.json")]
    snapshot: PathBuf,
    /// Table name(s) to infer rules for; all tables when omitted.
    #[arg(long, value_name = "TABLE")]
    table: Vec<String>,
    /// Override configuration file.
    #[arg(long, default_value = "schemarule.toml")]
    config: PathBuf,
    /// Output directory for runs.
    #[arg(long, default_value = "runs")]
    run_dir: PathBuf,
    /// Log every column decision.
    #[arg(long, short, default_value_t = false)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();

    match cli.command {
        Command::Introspect(args) => run_introspect(args).await,
        Command::Infer(args) => run_infer(args),
    }
}

async fn run_introspect(args: IntrospectArgs) -> Result<(), CliError> {
    let IntrospectArgs {
        conn,
        schema,
        table,
        out,
        skip_indexes,
        skip_associations,
        verbose,
    } = args;

    init_logging(verbose, None)?;
    detect_engine(&conn)?;

    let options = IntrospectOptions {
        schema,
        tables: if table.is_empty() { None } else { Some(table) },
        include_indexes: !skip_indexes,
        include_associations: !skip_associations,
    };

    let timer = Instant::now();
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(10))
        .connect(&conn)
        .await?;

    let adapter = PostgresAdapter::new(pool);
    tracing::info!(
        event = "introspection_started",
        engine = adapter.engine(),
        schema = %options.schema
    );
    let snapshot = adapter.introspect(&options).await?;
    validate_snapshot(&snapshot)?;

    write_json(&out, &snapshot)?;
    tracing::info!(
        event = "snapshot_written",
        path = %out.display(),
        tables = snapshot.tables.len(),
        duration_ms = timer.elapsed().as_millis()
    );

    Ok(())
}

fn run_infer(args: InferArgs) -> Result<(), CliError> {
    let InferArgs {
        snapshot: snapshot_path,
        table,
        config: config_path,
        run_dir,
        verbose,
    } = args;

    let config = load_config(&config_path)?;
    let content = std::fs::read_to_string(&snapshot_path)?;
    let snapshot: SchemaSnapshot = serde_json::from_str(&content)?;
    validate_snapshot(&snapshot)?;

    let tables = if table.is_empty() {
        snapshot
            .table_names()
            .into_iter()
            .map(str::to_string)
            .collect()
    } else {
        table
    };

    let run_ctx = RunContext {
        run_id: Uuid::new_v4().to_string(),
        started_at: chrono::Utc::now(),
        schema_version: snapshot.schema_version.clone(),
        snapshot: snapshot_path,
        config: config_path,
        tables: tables.clone(),
        run_dir,
    };

    let run_paths = start_run(&run_ctx)?;
    init_logging(verbose || config.verbose, Some(&run_paths.logs_path))?;

    if snapshot.schema_version != SCHEMA_VERSION {
        tracing::warn!(
            event = "schema_version_mismatch",
            expected = SCHEMA_VERSION,
            found = %snapshot.schema_version
        );
    }
    tracing::info!(event = "run_started", run_id = %run_ctx.run_id, tables = tables.len());

    let timer = Instant::now();
    let provider = CachedProvider::new(snapshot);
    let mut results = BTreeMap::new();

    for name in &tables {
        let disabled = config.disable_spec(name);
        let mut rules: Vec<DerivedRule> = Vec::new();
        let count = emit_rules(&provider, name, &disabled, &mut rules)?;
        tracing::info!(event = "table_inferred", table = %name, rules = count);

        print_summary(name, &rules);
        results.insert(name.clone(), TableRules { disabled, rules });
    }

    write_rules(&run_paths, &run_ctx, &results)?;
    tracing::info!(event = "rules_written", path = %run_paths.rules_path.display());

    let duration_ms = timer.elapsed().as_millis();
    tracing::info!(event = "run_finished", status = "success", duration_ms = duration_ms);

    Ok(())
}

fn print_summary(table: &str, rules: &[DerivedRule]) {
    let mut registry = RuleRegistry::new();
    for rule in rules {
        registry.register(rule.clone());
    }

    println!("{table} ({} rules)", registry.len());
    for field in registry.fields() {
        let kinds: Vec<String> = registry
            .rules_for(field)
            .iter()
            .map(|params| params.kind().to_string())
            .collect();
        println!("  {field}: {}", kinds.join(", "));
    }
}

fn detect_engine(conn: &str) -> Result<&'static str, CliError> {
    if conn.starts_with("postgres://") || conn.starts_with("postgresql://") {
        Ok("postgres")
    } else {
        Err(CliError::UnsupportedEngine(conn.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_postgres_urls_only() {
        assert_eq!(detect_engine("postgres://localhost/db").unwrap(), "postgres");
        assert_eq!(detect_engine("postgresql://localhost/db").unwrap(), "postgres");
        assert!(matches!(
            detect_engine("mysql://localhost/db"),
            Err(CliError::UnsupportedEngine(_))
        ));
    }

    #[test]
    fn parses_infer_arguments() {
        let cli = Cli::try_parse_from([
            "schemarule",
            "infer",
            "--snapshot",
            "fixtures/app.json",
            "--table",
            "resources",
            "--table",
            "organisations",
            "-v",
        ])
        .expect("parse args");

        let Command::Infer(args) = cli.command else {
            panic!("expected infer command");
        };
        assert_eq!(args.table, vec!["resources", "organisations"]);
        assert_eq!(args.config, PathBuf::from("schemarule.toml"));
        assert!(args.verbose);
    }
}
