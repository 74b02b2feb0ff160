//! Filesystem layout planning.
//!
//! Assigns every notebook, section group, section and page a concrete path
//! under the export root, and records the directories the caller must create.
//! Planning is pure: nothing touches the disk here.
//!
//! Layout rules (must match the content exporter's naming exactly):
//! ```text
//! <root>/<notebook>/
//! <root>/<notebook>/<group>/.../<section>/
//! <section>/<Leaf>.<ext>
//! <section>/<Parent>/<Parent>.<ext>      page with children
//! <section>/<Parent>/<Child>.<ext>
//! <section>/<Orphan>.<ext>               orphans sit beside root pages
//! ```
//! Order prefixes are computed for display only and never appear in names.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};

use tracing::{debug, instrument, warn};

use nbindex_shared::{
    BuildOptions, FsOperation, IdPathMap, NodeId, NotebookNode, PageForest, PathCollision,
    SectionGroupNode, SectionNode, format_order_prefix, sanitize_path_name,
};

/// A planned directory: absolute-style path plus its root-relative link path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedDir {
    pub path: PathBuf,
    /// `/`-separated, empty for the export root itself.
    pub relative: String,
}

impl PlannedDir {
    pub fn root(export_root: &Path) -> Self {
        Self {
            path: export_root.to_path_buf(),
            relative: String::new(),
        }
    }

    /// Descend into `name` (already sanitized).
    pub fn join(&self, name: &str) -> Self {
        let relative = if self.relative.is_empty() {
            name.to_string()
        } else {
            format!("{}/{name}", self.relative)
        };
        Self {
            path: self.path.join(name),
            relative,
        }
    }
}

/// Everything the planner accumulates across one build.
#[derive(Debug, Clone, Default)]
pub struct PlannedLayout {
    pub id_to_path: IdPathMap,
    pub operations: Vec<FsOperation>,
    pub collisions: Vec<PathCollision>,
}

/// Stateful planner; one instance per build.
#[derive(Debug)]
pub struct LayoutPlanner {
    root: PlannedDir,
    extension: String,
    max_name_length: usize,
    id_to_path: BTreeMap<String, String>,
    operations: Vec<FsOperation>,
    planned_dirs: HashSet<PathBuf>,
    claimed_files: HashMap<PathBuf, String>,
    collisions: Vec<PathCollision>,
}

impl LayoutPlanner {
    pub fn new(export_root: &Path, options: &BuildOptions) -> Self {
        Self {
            root: PlannedDir::root(export_root),
            extension: options.content_extension.clone(),
            max_name_length: options.max_name_length,
            id_to_path: BTreeMap::new(),
            operations: Vec::new(),
            planned_dirs: HashSet::new(),
            claimed_files: HashMap::new(),
            collisions: Vec::new(),
        }
    }

    fn name_for(&self, text: &str) -> String {
        sanitize_path_name(text, self.max_name_length)
    }

    /// `<root>/<notebook>`
    pub fn plan_notebook(&mut self, notebook: &mut NotebookNode) -> PlannedDir {
        let dir = self.root.join(&self.name_for(&notebook.name));
        self.mkdir(&dir);
        notebook.resolved_path = Some(dir.path.clone());
        notebook.relative_path = Some(dir.relative.clone());
        dir
    }

    /// `<container>/<group>`
    pub fn plan_section_group(
        &mut self,
        group: &mut SectionGroupNode,
        container: &PlannedDir,
    ) -> PlannedDir {
        let dir = container.join(&self.name_for(&group.name));
        self.mkdir(&dir);
        group.resolved_path = Some(dir.path.clone());
        group.relative_path = Some(dir.relative.clone());
        dir
    }

    /// `<container>/<section>`
    pub fn plan_section(
        &mut self,
        section: &mut SectionNode,
        container: &PlannedDir,
    ) -> PlannedDir {
        let dir = container.join(&self.name_for(&section.name));
        self.mkdir(&dir);
        section.resolved_path = Some(dir.path.clone());
        section.relative_path = Some(dir.relative.clone());
        dir
    }

    /// Plan every page of an already-planned section.
    #[instrument(skip_all, fields(section = %section.name, pages = section.pages.len()))]
    pub fn plan_pages(&mut self, section: &mut SectionNode, section_dir: &PlannedDir) {
        let forest = &mut section.pages;

        let roots = forest.roots.clone();
        for (idx, &id) in roots.iter().enumerate() {
            let prefix = format_order_prefix(idx + 1, roots.len());
            self.plan_page(forest, id, section_dir, prefix, 0);
        }

        let orphans = forest.orphans.clone();
        for (idx, &id) in orphans.iter().enumerate() {
            let prefix = format_order_prefix(idx + 1, orphans.len());
            self.plan_flat(forest, id, section_dir, prefix, 0);
        }

        debug!(
            roots = roots.len(),
            orphans = orphans.len(),
            "section pages planned"
        );
    }

    /// Folder-or-file placement for a page in the clean tree.
    fn plan_page(
        &mut self,
        forest: &mut PageForest,
        id: NodeId,
        parent_dir: &PlannedDir,
        prefix: String,
        depth: u32,
    ) {
        let name = self.name_for(&forest.node(id).title);
        let children = forest.node(id).children.clone();

        let content_dir = if children.is_empty() {
            parent_dir.clone()
        } else {
            let folder = parent_dir.join(&name);
            self.mkdir(&folder);
            for (idx, &child) in children.iter().enumerate() {
                let child_prefix = format_order_prefix(idx + 1, children.len());
                self.plan_page(forest, child, &folder, child_prefix, depth + 1);
            }
            folder
        };

        self.assign(forest, id, &content_dir, &name, prefix, depth);
    }

    /// Orphans and anything hanging under them become plain files in the
    /// section folder; the exporter gives them no dedicated subfolder.
    fn plan_flat(
        &mut self,
        forest: &mut PageForest,
        id: NodeId,
        section_dir: &PlannedDir,
        prefix: String,
        depth: u32,
    ) {
        let name = self.name_for(&forest.node(id).title);
        self.assign(forest, id, section_dir, &name, prefix, depth);

        let children = forest.node(id).children.clone();
        for (idx, &child) in children.iter().enumerate() {
            let child_prefix = format_order_prefix(idx + 1, children.len());
            self.plan_flat(forest, child, section_dir, child_prefix, depth + 1);
        }
    }

    fn assign(
        &mut self,
        forest: &mut PageForest,
        id: NodeId,
        dir: &PlannedDir,
        name: &str,
        prefix: String,
        depth: u32,
    ) {
        let file = dir.join(&format!("{name}.{}", self.extension));
        let page = forest.node_mut(id);

        page.depth = depth;
        page.order_prefix = prefix;
        page.resolved_path = Some(file.path.clone());
        page.relative_path = Some(file.relative.clone());

        let page_id = page.id.clone();
        self.claim_file(&file, &page_id);
        if let Some(existing) = self.id_to_path.get(&page_id) {
            // the first mapping wins; later pages with the same id keep their own paths
            warn!(
                page_id = %page_id,
                kept = %existing,
                ignored = %file.relative,
                "page id planned twice"
            );
        } else {
            self.id_to_path.insert(page_id, file.relative);
        }
    }

    fn claim_file(&mut self, file: &PlannedDir, page_id: &str) {
        if let Some(first) = self.claimed_files.get(&file.path) {
            warn!(
                path = %file.relative,
                first = %first,
                second = %page_id,
                "two pages planned onto the same file"
            );
            self.collisions.push(PathCollision {
                relative_path: file.relative.clone(),
                first_page_id: first.clone(),
                second_page_id: page_id.to_string(),
            });
        } else {
            self.claimed_files
                .insert(file.path.clone(), page_id.to_string());
        }
    }

    /// Record a directory once, in first-seen order.
    fn mkdir(&mut self, dir: &PlannedDir) {
        if self.planned_dirs.insert(dir.path.clone()) {
            self.operations.push(FsOperation::Mkdir {
                path: dir.path.clone(),
            });
        }
    }

    pub fn finish(self) -> PlannedLayout {
        PlannedLayout {
            id_to_path: self.id_to_path,
            operations: self.operations,
            collisions: self.collisions,
        }
    }
}
