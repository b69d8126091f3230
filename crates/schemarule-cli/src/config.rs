use std::collections::BTreeMap;
use std::path::Path;

use schemarule_core::{DisableConfig, DisableSpec, parse_kinds};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading `schemarule.toml`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("toml parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Contents of the CLI configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RulesConfig {
    /// Log every column decision at debug level.
    #[serde(default)]
    pub verbose: bool,
    /// Per-table overrides keyed by table name.
    #[serde(default)]
    pub tables: BTreeMap<String, TableConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableConfig {
    #[serde(default)]
    pub disable: DisableConfig,
    /// Rule kinds disabled for every field of the table.
    #[serde(default)]
    pub kinds: Vec<String>,
}

impl TableConfig {
    pub fn disable_spec(&self) -> DisableSpec {
        let mut spec = self.disable.compile();
        let kinds = parse_kinds(&self.kinds)
            .into_iter()
            .fold(DisableSpec::builder(), |builder, kind| {
                builder.disable_kind(kind)
            })
            .build();
        spec.merge(kinds);
        spec
    }
}

impl RulesConfig {
    /// Compiled overrides for a table; tables without a section disable nothing.
    pub fn disable_spec(&self, table: &str) -> DisableSpec {
        self.tables
            .get(table)
            .map(TableConfig::disable_spec)
            .unwrap_or_default()
    }
}

pub fn parse_config(content: &str) -> Result<RulesConfig, ConfigError> {
    Ok(toml::from_str(content)?)
}

/// Load the config file, falling back to defaults when it does not exist.
pub fn load_config(path: &Path) -> Result<RulesConfig, ConfigError> {
    if !path.exists() {
        return Ok(RulesConfig::default());
    }

    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use schemarule_core::RuleKind;

    #[test]
    fn parses_flat_and_directive_tables() {
        let config = parse_config(
            r#"
            verbose = true

            [tables.resources]
            disable = { description = false, name = "presence" }

            [tables.organisations]
            disable = ["city", { name = ["uniqueness", "length"] }]
            kinds = ["inclusion"]
            "#,
        )
        .expect("parse config");

        assert!(config.verbose);

        let resources = config.disable_spec("resources");
        assert!(resources.is_field_disabled("description"));
        assert!(resources.is_disabled("name", RuleKind::Presence));
        assert!(!resources.is_disabled("name", RuleKind::Length));

        let organisations = config.disable_spec("organisations");
        assert!(organisations.is_field_disabled("city"));
        assert!(organisations.is_disabled("name", RuleKind::Length));
        assert!(organisations.is_disabled("country", RuleKind::Inclusion));
        assert!(!organisations.is_disabled("country", RuleKind::Presence));

        assert!(config.disable_spec("people").is_empty());
    }

    #[test]
    fn unknown_kinds_load_and_disable_nothing() {
        let config = parse_config(
            r#"
            [tables.resources]
            disable = { name = ["format", "length"] }
            kinds = ["format"]
            "#,
        )
        .expect("parse config");

        let resources = config.disable_spec("resources");
        assert_eq!(
            resources.disabled_kinds("name"),
            std::collections::BTreeSet::from([RuleKind::Length])
        );
        assert!(resources.disabled_kinds("mail").is_empty());
    }

    #[test]
    fn missing_file_means_defaults() {
        let config = load_config(Path::new("does-not-exist/schemarule.toml")).expect("defaults");
        assert_eq!(config, RulesConfig::default());
    }
}
