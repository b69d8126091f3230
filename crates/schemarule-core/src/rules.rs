use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Kind of validation rule that can be derived from schema metadata.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    Presence,
    Uniqueness,
    Inclusion,
    Numericality,
    Length,
}

impl RuleKind {
    pub const ALL: [RuleKind; 5] = [
        RuleKind::Presence,
        RuleKind::Uniqueness,
        RuleKind::Inclusion,
        RuleKind::Numericality,
        RuleKind::Length,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RuleKind::Presence => "presence",
            RuleKind::Uniqueness => "uniqueness",
            RuleKind::Inclusion => "inclusion",
            RuleKind::Numericality => "numericality",
            RuleKind::Length => "length",
        }
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RuleKind {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        RuleKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == value)
            .ok_or_else(|| Error::InvalidConfig(format!("unknown rule kind: {value}")))
    }
}

/// A validation rule derived for one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedRule {
    /// Column or association name the rule applies to.
    pub field: String,
    #[serde(flatten)]
    pub params: RuleParams,
}

impl DerivedRule {
    pub fn new(field: impl Into<String>, params: RuleParams) -> Self {
        Self {
            field: field.into(),
            params,
        }
    }

    pub fn kind(&self) -> RuleKind {
        self.params.kind()
    }
}

/// Rule parameters, one variant per rule kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RuleParams {
    Presence,
    Uniqueness(Uniqueness),
    Inclusion(Inclusion),
    Numericality(Numericality),
    Length(Length),
}

impl RuleParams {
    pub fn kind(&self) -> RuleKind {
        match self {
            RuleParams::Presence => RuleKind::Presence,
            RuleParams::Uniqueness(_) => RuleKind::Uniqueness,
            RuleParams::Inclusion(_) => RuleKind::Inclusion,
            RuleParams::Numericality(_) => RuleKind::Numericality,
            RuleParams::Length(_) => RuleKind::Length,
        }
    }
}

/// Uniqueness check, optionally scoped by other columns.
///
/// An unscoped rule carries no options. A scoped rule always sets
/// `case_sensitive` and `allow_nil`, and lists the nullable scope columns
/// in `unless_null`: the check is skipped while any of them is null.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Uniqueness {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scope: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub case_sensitive: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_nil: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unless_null: Vec<String>,
}

impl Uniqueness {
    pub fn unscoped() -> Self {
        Self::default()
    }

    pub fn scoped(scope: Vec<String>, case_sensitive: bool, unless_null: Vec<String>) -> Self {
        Self {
            scope,
            case_sensitive: Some(case_sensitive),
            allow_nil: Some(true),
            unless_null,
        }
    }

    pub fn is_scoped(&self) -> bool {
        !self.scope.is_empty()
    }

    /// Evaluate the guard for a record, given a null test for its fields.
    pub fn should_check(&self, is_null: impl Fn(&str) -> bool) -> bool {
        !self.unless_null.iter().any(|column| is_null(column))
    }
}

/// Value must be one of a closed domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inclusion {
    #[serde(rename = "in")]
    pub values: Vec<bool>,
    pub allow_nil: bool,
}

impl Inclusion {
    pub fn boolean(allow_nil: bool) -> Self {
        Self {
            values: vec![false, true],
            allow_nil,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Numericality {
    pub only_integer: bool,
    pub allow_nil: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Length {
    pub maximum: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_kinds_and_rejects_others() {
        assert_eq!("length".parse::<RuleKind>().unwrap(), RuleKind::Length);
        assert!(matches!(
            "format".parse::<RuleKind>(),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn guard_skips_when_nullable_scope_is_null() {
        let rule = Uniqueness::scoped(
            vec!["organisation_id".to_string()],
            true,
            vec!["organisation_id".to_string()],
        );
        assert!(rule.is_scoped());
        assert!(!rule.should_check(|column| column == "organisation_id"));
        assert!(rule.should_check(|_| false));
        assert!(Uniqueness::unscoped().should_check(|_| true));
    }
}
