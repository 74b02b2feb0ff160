//! Planned notebook tree: the structure produced by tree resolution and
//! layout planning, consumed by the renderers and the link validator.
//!
//! Pages of a section live in a flat arena ([`PageForest`]); parent/child
//! edges are [`NodeId`] indices into it, so a subtree is never owned twice.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::types::{AccountInfo, PageRecord};

// ---------------------------------------------------------------------------
// Pages
// ---------------------------------------------------------------------------

/// Position of a page inside its section's [`PageForest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// Why a page could not be placed in the clean tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrphanReason {
    /// `level > 0` but no shallower page precedes it.
    MissingParent,
    /// The page was reachable from itself.
    CircularReference,
}

impl OrphanReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MissingParent => "No parent found at expected level",
            Self::CircularReference => "Involved in circular reference",
        }
    }
}

impl std::fmt::Display for OrphanReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A page with its resolved edges and (after planning) its location.
#[derive(Debug, Clone, PartialEq)]
pub struct PageNode {
    pub id: String,
    /// Raw title, unsanitized.
    pub title: String,
    pub created_at: Option<String>,
    pub modified_at: Option<String>,
    /// Id of the resolved parent, or the source's hint when none was resolved.
    pub parent_page_id: Option<String>,
    pub level: u32,
    pub order: i64,

    /// Resolved parent inside the arena.
    pub parent: Option<NodeId>,
    /// Children in resolution order.
    pub children: Vec<NodeId>,
    pub is_orphan: bool,
    pub orphan_reason: Option<OrphanReason>,

    /// Recursion depth from the section root, set by the planner.
    pub depth: u32,
    /// Display-only position among siblings (e.g. `01`).
    pub order_prefix: String,
    /// Planned content file.
    pub resolved_path: Option<PathBuf>,
    /// `resolved_path` relative to the export root, `/`-separated.
    pub relative_path: Option<String>,
}

impl PageNode {
    pub fn from_record(record: &PageRecord) -> Self {
        Self {
            id: record.id.clone(),
            title: record.title.clone(),
            created_at: record.created_at.clone(),
            modified_at: record.modified_at.clone(),
            parent_page_id: record.parent_id.clone(),
            level: record.level,
            order: record.order,
            parent: None,
            children: Vec::new(),
            is_orphan: false,
            orphan_reason: None,
            depth: 0,
            order_prefix: String::new(),
            resolved_path: None,
            relative_path: None,
        }
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    pub fn mark_orphan(&mut self, reason: OrphanReason) {
        self.is_orphan = true;
        self.orphan_reason = Some(reason);
    }
}

/// All pages of one section plus the two entry lists into them.
///
/// Every node is reachable from exactly one entry of `roots` or `orphans`,
/// either directly or as a descendant.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageForest {
    nodes: Vec<PageNode>,
    /// Clean top-level pages, sorted by `order`.
    pub roots: Vec<NodeId>,
    /// Pages that could not be placed, sorted by `order`.
    pub orphans: Vec<NodeId>,
}

impl PageForest {
    pub fn new(nodes: Vec<PageNode>, roots: Vec<NodeId>, orphans: Vec<NodeId>) -> Self {
        Self {
            nodes,
            roots,
            orphans,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> &PageNode {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut PageNode {
        &mut self.nodes[id.0]
    }

    /// Nodes in input order.
    pub fn nodes(&self) -> &[PageNode] {
        &self.nodes
    }

    pub fn children(&self, id: NodeId) -> impl Iterator<Item = (NodeId, &PageNode)> {
        self.nodes[id.0]
            .children
            .iter()
            .map(|&child| (child, &self.nodes[child.0]))
    }

    /// Walk up from `id` through resolved parents (excluding `id` itself).
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            forest: self,
            next: self.nodes[id.0].parent,
            remaining: self.nodes.len(),
        }
    }

    /// Pre-order walk of the subtree rooted at `id`, `id` first.
    pub fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.nodes[next.0].children.iter().rev().copied());
        }
        out
    }
}

/// Iterator returned by [`PageForest::ancestors`].
///
/// Bounded by the arena size so a corrupted parent chain cannot loop forever.
pub struct Ancestors<'a> {
    forest: &'a PageForest,
    next: Option<NodeId>,
    remaining: usize,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let current = self.next?;
        self.remaining -= 1;
        self.next = self.forest.node(current).parent;
        Some(current)
    }
}

// ---------------------------------------------------------------------------
// Containers
// ---------------------------------------------------------------------------

/// A section with its resolved pages.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionNode {
    pub id: String,
    pub name: String,
    pub notebook_id: String,
    pub notebook_name: String,
    /// `/`-joined raw names of containing section groups, empty if direct.
    pub group_path: String,
    pub pages: PageForest,
    pub resolved_path: Option<PathBuf>,
    pub relative_path: Option<String>,
}

impl SectionNode {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn orphan_count(&self) -> usize {
        self.pages.orphans.len()
    }
}

/// A section group as placed on disk. Sections themselves live flattened
/// on the notebook; this only records the container hierarchy.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionGroupNode {
    pub id: String,
    pub name: String,
    pub group_path: String,
    pub section_ids: Vec<String>,
    pub section_groups: Vec<SectionGroupNode>,
    pub resolved_path: Option<PathBuf>,
    pub relative_path: Option<String>,
}

/// A notebook with its flattened sections.
#[derive(Debug, Clone, PartialEq)]
pub struct NotebookNode {
    pub id: String,
    pub name: String,
    pub created_at: Option<String>,
    pub modified_at: Option<String>,
    /// Direct sections first, then grouped sections depth-first.
    pub sections: Vec<SectionNode>,
    pub section_groups: Vec<SectionGroupNode>,
    pub resolved_path: Option<PathBuf>,
    pub relative_path: Option<String>,
}

// ---------------------------------------------------------------------------
// Build bookkeeping
// ---------------------------------------------------------------------------

/// Running counts over one build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    pub notebooks: usize,
    pub section_groups: usize,
    pub sections: usize,
    pub pages: usize,
    pub orphans: usize,
    pub parent_pages: usize,
    pub child_pages: usize,
}

/// Run metadata stamped into both index documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunMetadata {
    pub scan_timestamp: String,
    pub account: AccountInfo,
    pub tenant: String,
    pub scope: String,
}

/// A filesystem operation the caller must execute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "lowercase")]
pub enum FsOperation {
    /// Create a directory, parents included; existing directories are fine.
    Mkdir { path: PathBuf },
}

impl FsOperation {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Mkdir { .. } => "mkdir",
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            Self::Mkdir { path } => path,
        }
    }
}

/// Two pages planned onto the same file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathCollision {
    pub relative_path: String,
    pub first_page_id: String,
    pub second_page_id: String,
}

/// Page id to root-relative path, ordered by id.
pub type IdPathMap = BTreeMap<String, String>;
