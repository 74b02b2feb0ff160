//! Index orchestrator.
//!
//! Walks an [`Inventory`], resolves and plans every section, accumulates
//! totals and scan errors, then renders both index documents once over the
//! whole planned forest.

use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

use nbindex_artifacts::{IndexDocument, IndexView, build_document, render_markdown};
use nbindex_shared::{
    BuildOptions, ErrorRecord, FsOperation, IdPathMap, Inventory, NotebookInput, NotebookNode,
    PageForest, PathCollision, RunMetadata, SectionGroupInput, SectionGroupNode, SectionInput,
    SectionNode, Totals,
};

use crate::layout::{LayoutPlanner, PlannedDir};
use crate::tree::resolve_pages;

/// Output of one [`build_index`] call.
#[derive(Debug, Clone)]
pub struct IndexBuildResult {
    pub export_root: PathBuf,
    pub notebooks: Vec<NotebookNode>,
    pub index_markdown: String,
    pub index_json: IndexDocument,
    pub id_to_path: IdPathMap,
    /// Directories to create, in first-seen order.
    pub operations: Vec<FsOperation>,
    pub totals: Totals,
    pub errors: Vec<ErrorRecord>,
    pub collisions: Vec<PathCollision>,
}

/// Build the complete index for `inventory` planned under `export_root`.
///
/// Total over any well-typed inventory: orphans and cycles are reported on
/// the pages, never returned as errors.
#[instrument(
    skip_all,
    fields(root = %export_root.display(), notebooks = inventory.notebooks.len())
)]
pub fn build_index(
    export_root: &Path,
    inventory: &Inventory,
    meta: &RunMetadata,
    options: &BuildOptions,
) -> IndexBuildResult {
    let mut run = Run {
        planner: LayoutPlanner::new(export_root, options),
        totals: Totals::default(),
        errors: inventory.errors.clone(),
    };

    let notebooks: Vec<NotebookNode> = inventory
        .notebooks
        .iter()
        .map(|input| run.notebook(input))
        .collect();

    let Run {
        planner,
        totals,
        errors,
    } = run;
    let layout = planner.finish();

    let view = IndexView {
        meta,
        notebooks: &notebooks,
        id_to_path: &layout.id_to_path,
        totals: &totals,
        errors: &errors,
    };
    let index_markdown = render_markdown(&view, options.max_listed_errors);
    let index_json = build_document(&view);

    info!(
        notebooks = totals.notebooks,
        sections = totals.sections,
        pages = totals.pages,
        orphans = totals.orphans,
        operations = layout.operations.len(),
        collisions = layout.collisions.len(),
        "index built"
    );

    IndexBuildResult {
        export_root: export_root.to_path_buf(),
        notebooks,
        index_markdown,
        index_json,
        id_to_path: layout.id_to_path,
        operations: layout.operations,
        totals,
        errors,
        collisions: layout.collisions,
    }
}

/// Mutable accumulators for one build.
struct Run {
    planner: LayoutPlanner,
    totals: Totals,
    errors: Vec<ErrorRecord>,
}

impl Run {
    fn notebook(&mut self, input: &NotebookInput) -> NotebookNode {
        self.totals.notebooks += 1;
        self.errors.extend(input.errors.iter().cloned());

        let mut notebook = NotebookNode {
            id: input.id.clone(),
            name: input.name.clone(),
            created_at: input.created_at.clone(),
            modified_at: input.modified_at.clone(),
            sections: Vec::new(),
            section_groups: Vec::new(),
            resolved_path: None,
            relative_path: None,
        };
        let dir = self.planner.plan_notebook(&mut notebook);

        for section in &input.sections {
            let node = self.section(section, &notebook, "", &dir);
            notebook.sections.push(node);
        }

        let mut sections = Vec::new();
        let mut groups = Vec::with_capacity(input.section_groups.len());
        for group in &input.section_groups {
            groups.push(self.group(group, &notebook, &mut sections, "", &dir));
        }
        notebook.sections.extend(sections);
        notebook.section_groups = groups;

        debug!(
            notebook = %notebook.name,
            sections = notebook.sections.len(),
            "notebook planned"
        );
        notebook
    }

    fn group(
        &mut self,
        input: &SectionGroupInput,
        notebook: &NotebookNode,
        sections: &mut Vec<SectionNode>,
        parent_path: &str,
        container: &PlannedDir,
    ) -> SectionGroupNode {
        self.totals.section_groups += 1;
        self.errors.extend(input.errors.iter().cloned());

        let group_path = if parent_path.is_empty() {
            input.name.clone()
        } else {
            format!("{parent_path}/{}", input.name)
        };

        let mut group = SectionGroupNode {
            id: input.id.clone(),
            name: input.name.clone(),
            group_path: group_path.clone(),
            section_ids: input.sections.iter().map(|s| s.id.clone()).collect(),
            section_groups: Vec::new(),
            resolved_path: None,
            relative_path: None,
        };
        let dir = self.planner.plan_section_group(&mut group, container);

        for section in &input.sections {
            let node = self.section(section, notebook, &group_path, &dir);
            sections.push(node);
        }

        for nested in &input.section_groups {
            let node = self.group(nested, notebook, sections, &group_path, &dir);
            group.section_groups.push(node);
        }
        group
    }

    fn section(
        &mut self,
        input: &SectionInput,
        notebook: &NotebookNode,
        group_path: &str,
        container: &PlannedDir,
    ) -> SectionNode {
        let mut section = SectionNode {
            id: input.id.clone(),
            name: input.name.clone(),
            notebook_id: notebook.id.clone(),
            notebook_name: notebook.name.clone(),
            group_path: group_path.to_string(),
            pages: resolve_pages(&input.pages),
            resolved_path: None,
            relative_path: None,
        };

        let dir = self.planner.plan_section(&mut section, container);
        self.planner.plan_pages(&mut section, &dir);

        self.totals.sections += 1;
        self.totals.pages += section.page_count();
        self.totals.orphans += section.orphan_count();
        count_hierarchy(&section.pages, &mut self.totals);

        self.errors.extend(input.errors.iter().cloned());
        section
    }
}

/// Parents and their direct children, counted over the clean tree only.
fn count_hierarchy(forest: &PageForest, totals: &mut Totals) {
    for &root in &forest.roots {
        for id in forest.subtree(root) {
            let page = forest.node(id);
            if page.has_children() {
                totals.parent_pages += 1;
                totals.child_pages += page.children.len();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nbindex_shared::{AccountInfo, PageRecord};

    fn meta() -> RunMetadata {
        RunMetadata {
            scan_timestamp: "2024-05-01T09:30:00Z".into(),
            account: AccountInfo {
                display_name: Some("Test User".into()),
                mail: None,
            },
            tenant: "consumers".into(),
            scope: "All notebooks".into(),
        }
    }

    fn single_section(pages: Vec<PageRecord>) -> Inventory {
        Inventory {
            notebooks: vec![NotebookInput {
                id: "nb1".into(),
                name: "Notebook".into(),
                sections: vec![SectionInput {
                    id: "s1".into(),
                    name: "Section".into(),
                    pages,
                    errors: vec![],
                }],
                ..NotebookInput::default()
            }],
            ..Inventory::default()
        }
    }

    fn build(inventory: &Inventory) -> IndexBuildResult {
        build_index(
            Path::new("/export"),
            inventory,
            &meta(),
            &BuildOptions::default(),
        )
    }

    fn fixture() -> Inventory {
        let text = std::fs::read_to_string("../../../fixtures/json/inventory.fixture.json")
            .expect("read fixture");
        Inventory::from_json(&text).expect("fixture")
    }

    #[test]
    fn flat_pages_are_leaves() {
        let result = build(&single_section(vec![
            PageRecord::new("1", "A", 0, 0),
            PageRecord::new("2", "B", 0, 1),
        ]));
        let section = &result.notebooks[0].sections[0];
        assert_eq!(section.pages.roots.len(), 2);
        assert!(section.pages.orphans.is_empty());
        // notebook + section, no page folders
        assert_eq!(result.operations.len(), 2);
        assert_eq!(result.totals.parent_pages, 0);
    }

    #[test]
    fn parent_with_two_children() {
        let result = build(&single_section(vec![
            PageRecord::new("p", "P", 0, 0),
            PageRecord::new("c1", "C1", 1, 1),
            PageRecord::new("c2", "C2", 1, 2),
        ]));
        assert_eq!(result.totals.parent_pages, 1);
        assert_eq!(result.totals.child_pages, 2);
        assert_eq!(result.operations.len(), 3);
        assert_eq!(result.id_to_path["p"], "Notebook/Section/P/P.html");
        assert_eq!(result.id_to_path["c1"], "Notebook/Section/P/C1.html");
    }

    #[test]
    fn orphan_is_counted_and_rendered() {
        let result = build(&single_section(vec![
            PageRecord::new("orphan", "Lost", 1, 0),
            PageRecord::new("p1", "Top", 0, 1),
        ]));
        assert_eq!(result.totals.orphans, 1);
        assert_eq!(result.totals.pages, 2);
        let section = &result.notebooks[0].sections[0];
        assert_eq!(section.pages.roots.len(), 1);
        assert_eq!(section.pages.orphans.len(), 1);
        assert!(result
            .index_markdown
            .contains("⚠️ _No parent found at expected level_"));
    }

    #[test]
    fn title_with_slash_links_to_sanitized_path() {
        let result = build(&single_section(vec![PageRecord::new(
            "p",
            "Environment / Energy",
            0,
            0,
        )]));
        assert!(result
            .index_markdown
            .contains("[Environment / Energy](Notebook/Section/Environment%20_%20Energy.html)"));
        assert_eq!(result.id_to_path["p"], "Notebook/Section/Environment _ Energy.html");
    }

    #[test]
    fn empty_titles_get_untitled_label_and_slug() {
        let result = build(&single_section(vec![
            PageRecord::new("a", "", 0, 0),
            PageRecord::new("b", "   ", 0, 1),
        ]));
        assert!(result.index_markdown.contains("[Untitled](Notebook/Section/untitled.html)"));
        assert!(!result.index_markdown.contains("[]("));
        assert_eq!(result.id_to_path["a"], "Notebook/Section/untitled.html");
        // both land on the same file
        assert_eq!(result.collisions.len(), 1);
    }

    #[test]
    fn fixture_totals_and_groups() {
        let result = build(&fixture());
        let totals = result.totals;
        assert_eq!(totals.notebooks, 2);
        assert_eq!(totals.section_groups, 2);
        assert_eq!(totals.sections, 3);
        assert_eq!(totals.pages, 7);
        assert_eq!(totals.orphans, 1);
        assert_eq!(totals.parent_pages, 1);
        assert_eq!(totals.child_pages, 2);

        let work = &result.notebooks[0];
        let names: Vec<&str> = work.sections.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["Meetings", "2022", "Notes"]);
        assert_eq!(work.sections[2].group_path, "Archive/Old");
        assert_eq!(
            work.sections[2].relative_path.as_deref(),
            Some("Work _ Projects/Archive/Old/Notes")
        );
        assert_eq!(work.section_groups[0].section_groups[0].id, "sg-old");
        assert!(result.index_markdown.contains("#### 📁 Archive/Old"));
    }

    #[test]
    fn errors_keep_scan_order() {
        let result = build(&fixture());
        let contexts: Vec<&str> = result.errors.iter().map(|e| e.context.as_str()).collect();
        assert_eq!(contexts, ["list notebooks", "Work / Projects/Archive/2022"]);
        assert_eq!(result.index_json.errors, result.errors);
    }

    #[test]
    fn counts_match_id_map() {
        let result = build(&fixture());
        assert_eq!(result.id_to_path.len(), result.totals.pages);
        assert_eq!(result.index_json.id_to_path_map, result.id_to_path);
        assert_eq!(result.index_json.totals, result.totals);
    }

    #[test]
    fn mkdirs_are_unique() {
        let result = build(&fixture());
        let mut paths: Vec<&Path> = result.operations.iter().map(|op| op.path()).collect();
        let before = paths.len();
        paths.sort();
        paths.dedup();
        assert_eq!(paths.len(), before);
        // empty notebook still gets its folder
        assert!(paths.contains(&Path::new("/export/Personal")));
    }

    #[test]
    fn build_is_deterministic() {
        let inventory = fixture();
        let a = build(&inventory);
        let b = build(&inventory);
        assert_eq!(a.index_markdown, b.index_markdown);
        let json_a = serde_json::to_string_pretty(&a.index_json).expect("serialize");
        let json_b = serde_json::to_string_pretty(&b.index_json).expect("serialize");
        assert_eq!(json_a, json_b);
    }

    #[test]
    fn page_input_order_does_not_matter() {
        let pages = vec![
            PageRecord::new("p", "P", 0, 0),
            PageRecord::new("c", "C", 1, 1),
            PageRecord::new("q", "Q", 0, 2),
        ];
        let mut shuffled = pages.clone();
        shuffled.reverse();
        let a = build(&single_section(pages));
        let b = build(&single_section(shuffled));
        assert_eq!(a.index_markdown, b.index_markdown);
        assert_eq!(a.id_to_path, b.id_to_path);
    }

    #[test]
    fn tied_orders_build_identical_indexes() {
        let pages = vec![
            PageRecord::new("a", "A", 0, 0),
            PageRecord::new("b", "B", 1, 0),
            PageRecord::new("c", "C", 0, 0),
        ];
        let mut reversed = pages.clone();
        reversed.reverse();
        let a = build(&single_section(pages));
        let b = build(&single_section(reversed));

        assert_eq!(a.id_to_path["a"], "Notebook/Section/A/A.html");
        assert_eq!(a.id_to_path["b"], "Notebook/Section/A/B.html");
        assert_eq!(a.id_to_path["c"], "Notebook/Section/C.html");
        assert_eq!(a.id_to_path, b.id_to_path);
        assert_eq!(a.index_markdown, b.index_markdown);
        assert_eq!(
            serde_json::to_string(&a.index_json).unwrap(),
            serde_json::to_string(&b.index_json).unwrap()
        );
    }

    #[test]
    fn metadata_flows_into_both_documents() {
        let result = build(&Inventory::default());
        assert!(result.index_markdown.contains("**Tenant:** consumers"));
        assert!(result.index_markdown.contains("**Email:** Unknown"));
        assert_eq!(result.index_json.scope, "All notebooks");
        assert!(result.operations.is_empty());
    }
}
