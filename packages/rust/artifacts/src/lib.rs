//! Index renderers for nbindex.
//!
//! Turns a fully planned notebook forest into the two index artifacts:
//! - [`render_markdown`]: the human-readable `index.md` outline
//! - [`build_document`]: the machine-readable `index.json` document
//!
//! Both are pure and deterministic: the same [`IndexView`] always renders
//! to the same bytes.

pub mod json;
pub mod markdown;

pub use json::{
    IndexDocument, NotebookEntry, PageEntry, SectionEntry, SectionGroupEntry, build_document,
};
pub use markdown::render_markdown;

use nbindex_shared::{ErrorRecord, IdPathMap, NotebookNode, RunMetadata, Totals};

/// Everything a renderer reads, borrowed from the build result.
#[derive(Debug, Clone, Copy)]
pub struct IndexView<'a> {
    pub meta: &'a RunMetadata,
    pub notebooks: &'a [NotebookNode],
    pub id_to_path: &'a IdPathMap,
    pub totals: &'a Totals,
    pub errors: &'a [ErrorRecord],
}
