//! Post-export link audit.
//!
//! Walks every planned path in a build result and reports the ones that do
//! not exist on disk. Read-only; nothing is repaired.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, instrument, warn};

use nbindex_shared::{NodeId, NotebookNode, SectionNode, display_label};

use crate::builder::IndexBuildResult;

/// What a missing link pointed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkKind {
    Notebook,
    Section,
    Page,
}

/// A planned path with nothing behind it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingLink {
    pub kind: LinkKind,
    pub target: PathBuf,
    pub relative_target: String,
    pub notebook_id: String,
    pub notebook_name: String,
    pub section_id: Option<String>,
    pub section_name: Option<String>,
    pub page_id: Option<String>,
    pub page_title: Option<String>,
    /// e.g. `page 'Agenda' in section 'Meetings'`
    pub context: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    /// Planned paths examined.
    pub checked: usize,
    pub missing: Vec<MissingLink>,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.missing.is_empty()
    }

    pub fn count(&self, kind: LinkKind) -> usize {
        self.missing.iter().filter(|m| m.kind == kind).count()
    }
}

/// Check every planned notebook, section and page path against the disk.
#[instrument(skip_all, fields(root = %result.export_root.display()))]
pub fn validate_links(result: &IndexBuildResult) -> ValidationReport {
    let mut report = ValidationReport::default();

    for notebook in &result.notebooks {
        if let (Some(path), Some(rel)) = (&notebook.resolved_path, &notebook.relative_path) {
            report.check(path, || MissingLink {
                kind: LinkKind::Notebook,
                target: path.clone(),
                relative_target: rel.clone(),
                notebook_id: notebook.id.clone(),
                notebook_name: notebook.name.clone(),
                section_id: None,
                section_name: None,
                page_id: None,
                page_title: None,
                context: format!("notebook '{}'", display_label(&notebook.name)),
            });
        }

        for section in &notebook.sections {
            report.check_section(notebook, section);
        }
    }

    if report.is_clean() {
        info!(checked = report.checked, "all planned links resolve");
    } else {
        info!(
            checked = report.checked,
            missing = report.missing.len(),
            "link audit found missing targets"
        );
    }
    report
}

impl ValidationReport {
    fn check(&mut self, path: &Path, missing: impl FnOnce() -> MissingLink) {
        self.checked += 1;
        if !path.exists() {
            let link = missing();
            warn!(
                kind = ?link.kind,
                target = %link.relative_target,
                "{}",
                link.context
            );
            self.missing.push(link);
        }
    }

    fn check_section(&mut self, notebook: &NotebookNode, section: &SectionNode) {
        if let (Some(path), Some(rel)) = (&section.resolved_path, &section.relative_path) {
            self.check(path, || MissingLink {
                kind: LinkKind::Section,
                target: path.clone(),
                relative_target: rel.clone(),
                notebook_id: notebook.id.clone(),
                notebook_name: notebook.name.clone(),
                section_id: Some(section.id.clone()),
                section_name: Some(section.name.clone()),
                page_id: None,
                page_title: None,
                context: format!(
                    "section '{}' in notebook '{}'",
                    display_label(&section.name),
                    display_label(&notebook.name)
                ),
            });
        }

        let forest = &section.pages;
        let entries = forest.roots.iter().chain(forest.orphans.iter());
        for id in entries.flat_map(|&entry| forest.subtree(entry)) {
            self.check_page(notebook, section, id);
        }
    }

    fn check_page(&mut self, notebook: &NotebookNode, section: &SectionNode, id: NodeId) {
        let page = section.pages.node(id);
        let (Some(path), Some(rel)) = (&page.resolved_path, &page.relative_path) else {
            return;
        };
        self.check(path, || MissingLink {
            kind: LinkKind::Page,
            target: path.clone(),
            relative_target: rel.clone(),
            notebook_id: notebook.id.clone(),
            notebook_name: notebook.name.clone(),
            section_id: Some(section.id.clone()),
            section_name: Some(section.name.clone()),
            page_id: Some(page.id.clone()),
            page_title: Some(page.title.clone()),
            context: format!(
                "page '{}' in section '{}'",
                display_label(&page.title),
                display_label(&section.name)
            ),
        });
    }
}
