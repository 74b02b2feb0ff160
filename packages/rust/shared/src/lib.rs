//! Shared types, error model, naming rules, and configuration for nbindex.
//!
//! This crate is the foundation depended on by all other nbindex crates.
//! It provides:
//! - [`NbIndexError`]: the unified error type
//! - Inventory input types ([`Inventory`], [`NotebookInput`], [`PageRecord`])
//! - The planned tree ([`NotebookNode`], [`SectionNode`], [`PageForest`])
//! - Naming rules ([`sanitize_path_name`], [`display_label`], [`link_target`])
//! - Configuration ([`AppConfig`], [`BuildOptions`], config loading)

pub mod config;
pub mod error;
pub mod model;
pub mod naming;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, BuildOptions, IndexConfig, LayoutConfig, config_dir, config_file_path,
    init_config, load_config, load_config_from, validate_config,
};
pub use error::{NbIndexError, Result};
pub use model::{
    FsOperation, IdPathMap, NodeId, NotebookNode, OrphanReason, PageForest, PageNode,
    PathCollision, RunMetadata, SectionGroupNode, SectionNode, Totals,
};
pub use naming::{
    display_label, format_order_prefix, link_target, relative_link_path, sanitize_path_name,
};
pub use types::{
    AccountInfo, ErrorRecord, INDEX_FORMAT_VERSION, Inventory, NotebookInput, PageRecord,
    SectionGroupInput, SectionInput,
};
