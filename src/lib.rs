//! splitmigrate — migration and reconciliation engine for content trees.
//!
//! Converts a flat, location-addressed legacy tree with two parallel mutable
//! copies (published and draft) into a single versioned, branch-aware
//! document store: one immutable structure per version, with "published" and
//! "draft" branch pointers per course. The legacy sources are treated as
//! strictly read-only; the target store only ever gains versions.

pub mod cli;
pub mod mapper;
pub mod migrate;
pub mod store;
pub mod types;

// Re-export commonly used types at the crate root
pub use mapper::LocationMapper;
pub use migrate::{
    copy_published, merge_drafts, project_fields, DraftSummary, MigrationDriver,
    MigrationReport, PublishSummary,
};
pub use store::{
    Block, CourseIndex, DraftView, LegacyDump, LegacyStore, PublishedView, SourceNode,
    SourceStore, SplitStore, TargetStore,
};
pub use types::{
    apply_diff, now_micros, BlockLocator, Branch, FieldDiff, FieldMap, LegacyAddress,
    MigrateError, MigrateResult, Revision, UsageId, VersionId, CHILDREN_FIELD,
};
