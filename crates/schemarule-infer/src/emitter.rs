use std::collections::BTreeMap;

use schemarule_core::{DerivedRule, DisableSpec, MetadataProvider, Result, RuleKind, RuleParams};
use serde::Serialize;

use crate::engine::infer;

/// Host-side sink for derived rules.
///
/// Rules carry no ordering dependencies, so implementations may register
/// them in any order.
pub trait ConstraintEmitter {
    fn register(&mut self, rule: DerivedRule);
}

impl ConstraintEmitter for Vec<DerivedRule> {
    fn register(&mut self, rule: DerivedRule) {
        self.push(rule);
    }
}

/// Rules grouped by field, one entry per `validates(field, ...)` call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RuleRegistry {
    fields: BTreeMap<String, Vec<RuleParams>>,
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rules_for(&self, field: &str) -> &[RuleParams] {
        self.fields.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn get(&self, field: &str, kind: RuleKind) -> Option<&RuleParams> {
        self.rules_for(field)
            .iter()
            .find(|params| params.kind() == kind)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Total number of registered rules.
    pub fn len(&self) -> usize {
        self.fields.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl ConstraintEmitter for RuleRegistry {
    fn register(&mut self, rule: DerivedRule) {
        self.fields.entry(rule.field).or_default().push(rule.params);
    }
}

/// Infer rules for `table` and hand each one to `emitter`.
///
/// Returns the number of rules registered.
pub fn emit_rules<P, E>(
    provider: &P,
    table: &str,
    disable: &DisableSpec,
    emitter: &mut E,
) -> Result<usize>
where
    P: MetadataProvider + ?Sized,
    E: ConstraintEmitter + ?Sized,
{
    let rules = infer(provider, table, disable)?;
    let count = rules.len();
    for rule in rules {
        emitter.register(rule);
    }
    Ok(count)
}
