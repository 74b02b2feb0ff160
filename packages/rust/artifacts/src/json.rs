//! `index.json` document model.
//!
//! Mirrors the planned forest one-to-one, with raw names and titles, so that
//! everything shown in `index.md` can be recovered from it.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::instrument;

use nbindex_shared::{
    AccountInfo, ErrorRecord, INDEX_FORMAT_VERSION, IdPathMap, NodeId, NotebookNode, PageForest,
    SectionGroupNode, SectionNode, Totals,
};

use crate::IndexView;

/// Top level of `index.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexDocument {
    pub version: String,
    pub scan_timestamp: String,
    pub account: AccountInfo,
    pub tenant: String,
    pub scope: String,
    pub totals: Totals,
    pub errors: Vec<ErrorRecord>,
    pub id_to_path_map: IdPathMap,
    pub notebooks: Vec<NotebookEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotebookEntry {
    pub notebook_id: String,
    pub name: String,
    pub created_date_time: Option<String>,
    pub last_modified_date_time: Option<String>,
    pub resolved_path: Option<String>,
    pub relative_path_from_root: Option<String>,
    pub sections: Vec<SectionEntry>,
    pub section_groups: Vec<SectionGroupEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionGroupEntry {
    pub section_group_id: String,
    pub name: String,
    pub section_group_path: String,
    pub resolved_path: Option<String>,
    pub relative_path_from_root: Option<String>,
    pub section_ids: Vec<String>,
    pub section_groups: Vec<SectionGroupEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionEntry {
    pub section_id: String,
    pub name: String,
    pub notebook_id: String,
    pub section_group_path: String,
    pub resolved_path: Option<String>,
    pub relative_path_from_root: Option<String>,
    pub page_count: usize,
    pub orphan_count: usize,
    pub pages: Vec<PageEntry>,
    pub orphans: Vec<PageEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageEntry {
    pub page_id: String,
    pub title: String,
    pub created_date_time: Option<String>,
    pub last_modified_date_time: Option<String>,
    pub parent_page_id: Option<String>,
    pub level: u32,
    pub order: i64,
    pub depth: u32,
    pub order_prefix: String,
    pub resolved_path: Option<String>,
    pub relative_path_from_root: Option<String>,
    pub is_orphan: bool,
    pub orphan_reason: Option<String>,
    pub children: Vec<PageEntry>,
}

/// Build the `index.json` document for a planned forest.
#[instrument(skip_all, fields(notebooks = view.notebooks.len()))]
pub fn build_document(view: &IndexView<'_>) -> IndexDocument {
    IndexDocument {
        version: INDEX_FORMAT_VERSION.to_string(),
        scan_timestamp: view.meta.scan_timestamp.clone(),
        account: view.meta.account.clone(),
        tenant: view.meta.tenant.clone(),
        scope: view.meta.scope.clone(),
        totals: *view.totals,
        errors: view.errors.to_vec(),
        id_to_path_map: view.id_to_path.clone(),
        notebooks: view.notebooks.iter().map(notebook_entry).collect(),
    }
}

fn path_string(path: Option<&Path>) -> Option<String> {
    path.map(|p| p.to_string_lossy().into_owned())
}

fn notebook_entry(notebook: &NotebookNode) -> NotebookEntry {
    NotebookEntry {
        notebook_id: notebook.id.clone(),
        name: notebook.name.clone(),
        created_date_time: notebook.created_at.clone(),
        last_modified_date_time: notebook.modified_at.clone(),
        resolved_path: path_string(notebook.resolved_path.as_deref()),
        relative_path_from_root: notebook.relative_path.clone(),
        sections: notebook.sections.iter().map(section_entry).collect(),
        section_groups: notebook.section_groups.iter().map(group_entry).collect(),
    }
}

fn group_entry(group: &SectionGroupNode) -> SectionGroupEntry {
    SectionGroupEntry {
        section_group_id: group.id.clone(),
        name: group.name.clone(),
        section_group_path: group.group_path.clone(),
        resolved_path: path_string(group.resolved_path.as_deref()),
        relative_path_from_root: group.relative_path.clone(),
        section_ids: group.section_ids.clone(),
        section_groups: group.section_groups.iter().map(group_entry).collect(),
    }
}

fn section_entry(section: &SectionNode) -> SectionEntry {
    let forest = &section.pages;
    SectionEntry {
        section_id: section.id.clone(),
        name: section.name.clone(),
        notebook_id: section.notebook_id.clone(),
        section_group_path: section.group_path.clone(),
        resolved_path: path_string(section.resolved_path.as_deref()),
        relative_path_from_root: section.relative_path.clone(),
        page_count: section.page_count(),
        orphan_count: section.orphan_count(),
        pages: forest
            .roots
            .iter()
            .map(|&id| page_entry(forest, id, false))
            .collect(),
        orphans: forest
            .orphans
            .iter()
            .map(|&id| page_entry(forest, id, true))
            .collect(),
    }
}

fn page_entry(forest: &PageForest, id: NodeId, listed_as_orphan: bool) -> PageEntry {
    let page = forest.node(id);
    PageEntry {
        page_id: page.id.clone(),
        title: page.title.clone(),
        created_date_time: page.created_at.clone(),
        last_modified_date_time: page.modified_at.clone(),
        parent_page_id: page.parent_page_id.clone(),
        level: page.level,
        order: page.order,
        depth: page.depth,
        order_prefix: page.order_prefix.clone(),
        resolved_path: path_string(page.resolved_path.as_deref()),
        relative_path_from_root: page.relative_path.clone(),
        is_orphan: listed_as_orphan || page.is_orphan,
        orphan_reason: page.orphan_reason.map(|r| r.as_str().to_string()),
        children: page
            .children
            .iter()
            .map(|&child| page_entry(forest, child, false))
            .collect(),
    }
}
