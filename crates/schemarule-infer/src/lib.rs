//! Rule inference for schemarule.
//!
//! Derives field-level validation rules from table metadata: presence from
//! nullability, uniqueness from unique indexes, numericality and length from
//! column types, boolean inclusion, and association presence for foreign
//! keys. Rules are handed to a [`ConstraintEmitter`] owned by the host.

pub mod association;
pub mod cache;
pub mod emitter;
pub mod engine;

pub use association::AssociationResolver;
pub use cache::CachedProvider;
pub use emitter::{ConstraintEmitter, RuleRegistry, emit_rules};
pub use engine::{AUDIT_TIMESTAMP_COLUMNS, TableMetadata, infer, infer_table};
