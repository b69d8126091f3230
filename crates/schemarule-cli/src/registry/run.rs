use std::collections::BTreeMap;
use std::fs::{OpenOptions, create_dir_all};
use std::path::{Path, PathBuf};
use std::process::Command;

use chrono::{DateTime, Utc};
use serde::Serialize;

use schemarule_core::{DerivedRule, DisableSpec};

use super::{RegistryError, RegistryResult};

/// Metadata captured at run start.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub schema_version: String,
    pub snapshot: PathBuf,
    pub config: PathBuf,
    pub tables: Vec<String>,
    pub run_dir: PathBuf,
}

/// JSON config written to each run directory.
#[derive(Debug, Serialize)]
pub struct RunConfig {
    pub run_id: String,
    pub started_at: String,
    pub schema_version: String,
    pub snapshot: String,
    pub config: String,
    pub tables: Vec<String>,
    pub git: GitInfo,
}

/// Git metadata for reproducibility.
#[derive(Debug, Serialize)]
pub struct GitInfo {
    pub commit: Option<String>,
    pub dirty: Option<bool>,
}

/// Paths for run artifacts.
#[derive(Debug, Clone)]
pub struct RunPaths {
    pub rules_path: PathBuf,
    pub logs_path: PathBuf,
}

/// Rules derived for one table, with the overrides that shaped them.
#[derive(Debug, Clone, Serialize)]
pub struct TableRules {
    pub disabled: DisableSpec,
    pub rules: Vec<DerivedRule>,
}

#[derive(Debug, Serialize)]
struct RulesArtifact<'a> {
    run_id: &'a str,
    schema_version: &'a str,
    generated_at: String,
    tables: &'a BTreeMap<String, TableRules>,
}

pub fn start_run(ctx: &RunContext) -> RegistryResult<RunPaths> {
    let timestamp = ctx.started_at.format("%Y-%m-%dT%H-%M-%SZ").to_string();
    let run_root = ctx.run_dir.join(format!("{timestamp}__run_{}", ctx.run_id));

    create_dir_all(&run_root)?;

    let config_path = run_root.join("config.json");
    let rules_path = run_root.join("rules.json");
    let logs_path = run_root.join("logs.ndjson");

    let config = RunConfig {
        run_id: ctx.run_id.clone(),
        started_at: ctx.started_at.to_rfc3339(),
        schema_version: ctx.schema_version.clone(),
        snapshot: ctx.snapshot.display().to_string(),
        config: ctx.config.display().to_string(),
        tables: ctx.tables.clone(),
        git: collect_git_info(),
    };

    write_json(&config_path, &config)?;

    OpenOptions::new()
        .create(true)
        .append(true)
        .open(&logs_path)?;

    Ok(RunPaths {
        rules_path,
        logs_path,
    })
}

pub fn write_rules(
    paths: &RunPaths,
    ctx: &RunContext,
    tables: &BTreeMap<String, TableRules>,
) -> RegistryResult<()> {
    let artifact = RulesArtifact {
        run_id: &ctx.run_id,
        schema_version: &ctx.schema_version,
        generated_at: Utc::now().to_rfc3339(),
        tables,
    };
    write_json(&paths.rules_path, &artifact)
}

pub fn collect_git_info() -> GitInfo {
    let commit = Command::new("git")
        .args(["rev-parse", "HEAD"])
        .output()
        .ok()
        .and_then(|output| {
            if output.status.success() {
                Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
            } else {
                None
            }
        })
        .filter(|value| !value.is_empty());

    let dirty = Command::new("git")
        .args(["status", "--porcelain"])
        .output()
        .ok()
        .filter(|output| output.status.success())
        .map(|output| !output.stdout.is_empty());

    GitInfo { commit, dirty }
}

/// Write pretty JSON, creating parent directories as needed.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> RegistryResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            create_dir_all(parent)?;
        }
    }

    let file = OpenOptions::new()
        .create(true)
        .truncate(true)
        .write(true)
        .open(path)?;
    serde_json::to_writer_pretty(file, value).map_err(RegistryError::from)
}
