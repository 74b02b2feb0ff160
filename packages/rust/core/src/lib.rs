//! Index-builder engine for nbindex.
//!
//! Reconstructs page trees from flat, level-annotated page lists, plans them
//! onto a deterministic filesystem layout, and renders the navigable indexes
//! (`build_index`). After the export has run, `validate_links` audits that
//! every planned path exists.

pub mod assembler;
pub mod builder;
pub mod layout;
pub mod tree;
pub mod validate;

pub use assembler::{
    ArtifactMeta, WrittenIndex, execute_operation, execute_operations, write_index_files,
};
pub use builder::{IndexBuildResult, build_index};
pub use layout::{LayoutPlanner, PlannedDir, PlannedLayout};
pub use tree::resolve_pages;
pub use validate::{LinkKind, MissingLink, ValidationReport, validate_links};
