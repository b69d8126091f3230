//! Core contracts and helpers for schemarule.
//!
//! This crate defines the schema snapshot types, the derived rule model,
//! disable configuration, and the metadata provider contract shared by the
//! inference engine, introspection adapters and the CLI.

pub mod disable;
pub mod error;
pub mod provider;
pub mod rules;
pub mod schema;
pub mod validation;

pub use disable::{DisableBuilder, DisableConfig, DisableSpec, parse_kinds};
pub use error::{Error, Result};
pub use provider::MetadataProvider;
pub use rules::{DerivedRule, Inclusion, Length, Numericality, RuleKind, RuleParams, Uniqueness};
pub use schema::{
    AssociationDescriptor, BelongsTo, ColumnDescriptor, ColumnType, IndexDescriptor,
    SchemaSnapshot, TableSnapshot,
};
pub use validation::validate_snapshot;

/// Current contract version for snapshot artifacts.
pub const SCHEMA_VERSION: &str = "0.1";
