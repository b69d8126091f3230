//! Caller overrides that suppress generated rules.
//!
//! Overrides only ever disable: compiling several directives unions their
//! effects, and nothing re-enables a kind once disabled. Field names are not
//! checked against the table; unknown fields simply match nothing, and
//! unknown kind names are dropped.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::rules::RuleKind;

/// Compiled set of suppressed (field, kind) pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DisableSpec {
    fields: BTreeMap<String, BTreeSet<RuleKind>>,
    kinds: BTreeSet<RuleKind>,
}

impl DisableSpec {
    pub fn builder() -> DisableBuilder {
        DisableBuilder::default()
    }

    /// Nothing is disabled.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.kinds.is_empty()
    }

    /// Whether `kind` is suppressed for `field`.
    pub fn is_disabled(&self, field: &str, kind: RuleKind) -> bool {
        self.kinds.contains(&kind)
            || self
                .fields
                .get(field)
                .is_some_and(|kinds| kinds.contains(&kind))
    }

    /// All five kinds are suppressed for `field`.
    pub fn is_field_disabled(&self, field: &str) -> bool {
        RuleKind::ALL
            .into_iter()
            .all(|kind| self.is_disabled(field, kind))
    }

    /// Kinds disabled for `field`, including kind-wide suppressions.
    pub fn disabled_kinds(&self, field: &str) -> BTreeSet<RuleKind> {
        let mut kinds = self.kinds.clone();
        if let Some(field_kinds) = self.fields.get(field) {
            kinds.extend(field_kinds.iter().copied());
        }
        kinds
    }

    /// Union another spec into this one.
    pub fn merge(&mut self, other: DisableSpec) {
        for (field, kinds) in other.fields {
            self.fields.entry(field).or_default().extend(kinds);
        }
        self.kinds.extend(other.kinds);
    }
}

/// Accumulates disable directives into a [`DisableSpec`].
#[derive(Debug, Clone, Default)]
pub struct DisableBuilder {
    spec: DisableSpec,
}

impl DisableBuilder {
    /// Disable every rule kind for a field.
    pub fn disable_field(self, field: impl Into<String>) -> Self {
        self.disable(field, RuleKind::ALL)
    }

    /// Disable the given kinds for a field.
    pub fn disable(
        mut self,
        field: impl Into<String>,
        kinds: impl IntoIterator<Item = RuleKind>,
    ) -> Self {
        let kinds: BTreeSet<RuleKind> = kinds.into_iter().collect();
        if !kinds.is_empty() {
            self.spec.fields.entry(field.into()).or_default().extend(kinds);
        }
        self
    }

    /// Disable a kind for every field of the table.
    pub fn disable_kind(mut self, kind: RuleKind) -> Self {
        self.spec.kinds.insert(kind);
        self
    }

    pub fn build(self) -> DisableSpec {
        self.spec
    }
}

/// One kind name or a list of kind names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KindSelector {
    One(String),
    Many(Vec<String>),
}

impl KindSelector {
    fn parse(&self) -> Vec<RuleKind> {
        match self {
            KindSelector::One(kind) => known_kind(kind).into_iter().collect(),
            KindSelector::Many(kinds) => kinds.iter().filter_map(|kind| known_kind(kind)).collect(),
        }
    }
}

fn known_kind(name: &str) -> Option<RuleKind> {
    match name.parse() {
        Ok(kind) => Some(kind),
        Err(_) => {
            warn!(kind = %name, "ignoring unknown rule kind in disable config");
            None
        }
    }
}

/// Value of a flat mapping entry.
///
/// `false` disables the whole field, `true` is accepted and changes nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FlatValue {
    Flag(bool),
    Kinds(KindSelector),
}

/// Selector of a single `disable(...)` directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Directive {
    /// Disable every kind for this field.
    Field(String),
    /// Disable the selected kinds per field.
    Kinds(BTreeMap<String, KindSelector>),
}

/// Serialized override configuration, as written in config files.
///
/// Either a flat mapping (`{ description = false, name = "presence" }`) or a
/// list of directives (`["description", { name = ["presence", "length"] }]`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DisableConfig {
    Flat(BTreeMap<String, FlatValue>),
    Directives(Vec<Directive>),
}

impl Default for DisableConfig {
    fn default() -> Self {
        DisableConfig::Flat(BTreeMap::new())
    }
}

impl DisableConfig {
    /// Compile into a [`DisableSpec`].
    pub fn compile(&self) -> DisableSpec {
        let mut builder = DisableSpec::builder();

        match self {
            DisableConfig::Flat(entries) => {
                for (field, value) in entries {
                    builder = match value {
                        FlatValue::Flag(false) => builder.disable_field(field.as_str()),
                        FlatValue::Flag(true) => builder,
                        FlatValue::Kinds(selector) => {
                            builder.disable(field.as_str(), selector.parse())
                        }
                    };
                }
            }
            DisableConfig::Directives(directives) => {
                for directive in directives {
                    builder = match directive {
                        Directive::Field(field) => builder.disable_field(field.as_str()),
                        Directive::Kinds(selectors) => {
                            for (field, selector) in selectors {
                                builder = builder.disable(field.as_str(), selector.parse());
                            }
                            builder
                        }
                    };
                }
            }
        }

        builder.build()
    }
}

/// Parse a list of kind names disabled for every field, dropping unknown ones.
pub fn parse_kinds(kinds: &[String]) -> BTreeSet<RuleKind> {
    kinds.iter().filter_map(|kind| known_kind(kind)).collect()
}
