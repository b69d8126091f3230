use std::collections::{BTreeSet, HashSet};

use schemarule_core::{
    ColumnDescriptor, ColumnType, DerivedRule, DisableSpec, IndexDescriptor, Inclusion, Length,
    MetadataProvider, Numericality, Result, RuleKind, RuleParams, Uniqueness,
};
use tracing::debug;

use crate::association::AssociationResolver;

/// Audit columns maintained by the persistence layer, never validated.
pub const AUDIT_TIMESTAMP_COLUMNS: [&str; 4] =
    ["created_at", "created_on", "updated_at", "updated_on"];

/// Metadata of one table, loaded once per inference run.
#[derive(Debug, Clone)]
pub struct TableMetadata {
    pub table: String,
    pub primary_key: Option<String>,
    pub columns: Vec<ColumnDescriptor>,
    pub indexes: Vec<IndexDescriptor>,
    pub enumerated: BTreeSet<String>,
    pub associations: AssociationResolver,
}

impl TableMetadata {
    /// Read everything inference needs from a provider.
    ///
    /// Provider errors are returned unchanged.
    pub fn load<P: MetadataProvider + ?Sized>(provider: &P, table: &str) -> Result<Self> {
        Ok(Self {
            table: table.to_string(),
            primary_key: provider.primary_key(table)?,
            columns: provider.columns(table)?,
            indexes: provider.indexes(table)?,
            enumerated: provider.enumerated_columns(table)?,
            associations: AssociationResolver::new(provider.associations(table)?),
        })
    }

    pub fn column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|column| column.name == name)
    }

    fn is_enumerated(&self, column: &ColumnDescriptor) -> bool {
        column.enumerated || self.enumerated.contains(&column.name)
    }

    fn is_excluded(&self, column: &ColumnDescriptor) -> bool {
        self.primary_key.as_deref() == Some(column.name.as_str())
            || AUDIT_TIMESTAMP_COLUMNS.contains(&column.name.as_str())
    }
}

/// Load metadata for `table` and derive its rules.
pub fn infer<P: MetadataProvider + ?Sized>(
    provider: &P,
    table: &str,
    disable: &DisableSpec,
) -> Result<Vec<DerivedRule>> {
    let metadata = TableMetadata::load(provider, table)?;
    Ok(infer_table(&metadata, disable))
}

/// Derive rules for every column of an already loaded table.
pub fn infer_table(metadata: &TableMetadata, disable: &DisableSpec) -> Vec<DerivedRule> {
    let mut rules = RuleAccumulator::new(disable);

    for column in &metadata.columns {
        if metadata.is_excluded(column) {
            continue;
        }

        debug!(
            table = %metadata.table,
            column = %column.name,
            column_type = ?column.column_type,
            null = column.nullable,
            limit = ?column.limit,
            "generating rules"
        );

        let before = rules.len();
        infer_column(metadata, column, &mut rules);

        debug!(
            table = %metadata.table,
            column = %column.name,
            kinds = ?rules.kinds_since(before),
            "derived rules"
        );
    }

    rules.into_rules()
}

fn infer_column(
    metadata: &TableMetadata,
    column: &ColumnDescriptor,
    rules: &mut RuleAccumulator<'_>,
) {
    if let Some(association) = metadata.associations.resolve(&column.name) {
        if association.required {
            rules.push(&association.name, RuleParams::Presence);
        }
        return;
    }

    if column.column_type == ColumnType::Boolean {
        rules.push(
            &column.name,
            RuleParams::Inclusion(Inclusion::boolean(column.nullable)),
        );
    } else if !column.nullable {
        rules.push(&column.name, RuleParams::Presence);
    }

    if let Some(uniqueness) = uniqueness(metadata, column) {
        rules.push(&column.name, RuleParams::Uniqueness(uniqueness));
    }

    if let Some(numericality) = numericality(metadata, column) {
        rules.push(&column.name, RuleParams::Numericality(numericality));
    }

    if let Some(length) = length(column) {
        rules.push(&column.name, RuleParams::Length(length));
    }
}

fn uniqueness(metadata: &TableMetadata, column: &ColumnDescriptor) -> Option<Uniqueness> {
    let candidates: Vec<&IndexDescriptor> = metadata
        .indexes
        .iter()
        .filter(|index| {
            index.enforces_uniqueness() && index.target_column() == Some(column.name.as_str())
        })
        .collect();

    let [index] = candidates.as_slice() else {
        if candidates.len() > 1 {
            debug!(
                table = %metadata.table,
                column = %column.name,
                indexes = ?candidates.iter().map(|index| index.name.as_str()).collect::<Vec<_>>(),
                "ambiguous unique indexes, skipping uniqueness"
            );
        }
        return None;
    };

    let scope = index.scope();
    if scope.is_empty() {
        return Some(Uniqueness::unscoped());
    }

    let unless_null = scope
        .iter()
        .filter(|name| metadata.column(name).is_some_and(|scoped| scoped.nullable))
        .cloned()
        .collect();

    Some(Uniqueness::scoped(
        scope.to_vec(),
        column.case_sensitive(),
        unless_null,
    ))
}

// allow_nil stays true even for NOT NULL columns: the presence rule already
// reports blanks.
fn numericality(metadata: &TableMetadata, column: &ColumnDescriptor) -> Option<Numericality> {
    if metadata.is_enumerated(column) {
        return None;
    }

    match column.column_type {
        ColumnType::Integer => Some(Numericality {
            only_integer: true,
            allow_nil: true,
        }),
        ColumnType::Decimal | ColumnType::Float => Some(Numericality {
            only_integer: false,
            allow_nil: true,
        }),
        _ => None,
    }
}

fn length(column: &ColumnDescriptor) -> Option<Length> {
    match (&column.column_type, column.limit) {
        (ColumnType::String, Some(maximum)) => Some(Length { maximum }),
        _ => None,
    }
}

/// Collects rules, dropping disabled and duplicate (field, kind) pairs.
struct RuleAccumulator<'a> {
    disable: &'a DisableSpec,
    seen: HashSet<(String, RuleKind)>,
    rules: Vec<DerivedRule>,
}

impl<'a> RuleAccumulator<'a> {
    fn new(disable: &'a DisableSpec) -> Self {
        Self {
            disable,
            seen: HashSet::new(),
            rules: Vec::new(),
        }
    }

    fn push(&mut self, field: &str, params: RuleParams) {
        let kind = params.kind();
        if self.disable.is_disabled(field, kind) {
            return;
        }
        if self.seen.insert((field.to_string(), kind)) {
            self.rules.push(DerivedRule::new(field, params));
        }
    }

    fn len(&self) -> usize {
        self.rules.len()
    }

    fn kinds_since(&self, start: usize) -> Vec<RuleKind> {
        self.rules[start..].iter().map(DerivedRule::kind).collect()
    }

    fn into_rules(self) -> Vec<DerivedRule> {
        self.rules
    }
}
