//! `index.md` renderer.
//!
//! Link text always comes from [`display_label`]; link targets always come
//! from the planned relative path passed through [`link_target`].

use tracing::{debug, instrument};

use nbindex_shared::{NodeId, PageForest, SectionNode, display_label, link_target};

use crate::IndexView;

const UNKNOWN: &str = "Unknown";

/// Render the navigable outline.
///
/// At most `max_listed_errors` scan errors are listed verbatim; the rest are
/// summarized in a single elision line.
#[instrument(skip_all, fields(notebooks = view.notebooks.len()))]
pub fn render_markdown(view: &IndexView<'_>, max_listed_errors: usize) -> String {
    let meta = view.meta;
    let totals = view.totals;
    let account = &meta.account;

    let mut lines = vec![
        "# OneNote Export Index".to_string(),
        String::new(),
        format!("**Generated:** {}", meta.scan_timestamp),
        format!(
            "**Account:** {}",
            account.display_name.as_deref().unwrap_or(UNKNOWN)
        ),
        format!("**Email:** {}", account.mail.as_deref().unwrap_or(UNKNOWN)),
        format!("**Tenant:** {}", meta.tenant),
        format!("**Scope:** {}", meta.scope),
        String::new(),
        "## Summary".to_string(),
        String::new(),
        "| Metric | Count |".to_string(),
        "|--------|-------|".to_string(),
        format!("| Notebooks | {} |", totals.notebooks),
        format!("| Section Groups | {} |", totals.section_groups),
        format!("| Sections | {} |", totals.sections),
        format!("| Pages | {} |", totals.pages),
        format!("| Orphaned Pages | {} |", totals.orphans),
        String::new(),
    ];

    if !view.errors.is_empty() {
        lines.push("## ⚠️ Errors During Scan".to_string());
        lines.push(String::new());
        for err in view.errors.iter().take(max_listed_errors) {
            lines.push(format!("- {}: {}", err.context, err.error));
        }
        if view.errors.len() > max_listed_errors {
            lines.push(format!(
                "- ... and {} more errors",
                view.errors.len() - max_listed_errors
            ));
        }
        lines.push(String::new());
    }

    lines.push("## Table of Contents".to_string());
    lines.push(String::new());

    for notebook in view.notebooks {
        lines.push(format!(
            "### 📓 {}",
            folder_link(&notebook.name, notebook.relative_path.as_deref())
        ));
        lines.push(String::new());
        for section in &notebook.sections {
            push_section(&mut lines, section);
        }
        lines.push(String::new());
    }

    debug!(lines = lines.len(), "rendered index.md");
    lines.join("\n")
}

fn push_section(lines: &mut Vec<String>, section: &SectionNode) {
    if !section.group_path.is_empty() {
        lines.push(format!("#### 📁 {}", section.group_path));
        lines.push(String::new());
    }

    let mut summary = format!("({} pages", section.page_count());
    if section.orphan_count() > 0 {
        summary.push_str(&format!(", {} orphaned", section.orphan_count()));
    }
    summary.push(')');

    lines.push(format!(
        "- 📑 {} {summary}",
        folder_link(&section.name, section.relative_path.as_deref())
    ));

    let forest = &section.pages;
    for &root in &forest.roots {
        push_page_tree(lines, forest, root, 1);
    }

    if !forest.orphans.is_empty() {
        lines.push(String::new());
        lines.push("  - **⚠️ Orphaned Pages**".to_string());
        for &orphan in &forest.orphans {
            push_page_tree(lines, forest, orphan, 2);
        }
    }

    lines.push(String::new());
}

fn push_page_tree(lines: &mut Vec<String>, forest: &PageForest, id: NodeId, indent: usize) {
    push_page_line(lines, forest, id, indent);
    for &child in &forest.node(id).children {
        push_page_tree(lines, forest, child, indent + 1);
    }
}

fn push_page_line(lines: &mut Vec<String>, forest: &PageForest, id: NodeId, indent: usize) {
    let page = forest.node(id);
    let label = display_label(&page.title);

    let link = match page.relative_path.as_deref() {
        Some(rel) => format!("[{label}]({})", link_target(rel)),
        None => format!("**{label}**"),
    };

    let prefix = if page.order_prefix.is_empty() {
        String::new()
    } else {
        format!("{}.", page.order_prefix)
    };

    let children = if page.has_children() {
        format!(" (+{} children)", page.children.len())
    } else {
        String::new()
    };

    let reason = match page.orphan_reason {
        Some(reason) if page.is_orphan => format!(" ⚠️ _{reason}_"),
        _ => String::new(),
    };

    lines.push(format!(
        "{}- {prefix} {link}{children}{reason}",
        "  ".repeat(indent)
    ));
}

/// Folder link with a trailing slash, or bold text when nothing was planned.
fn folder_link(name: &str, relative: Option<&str>) -> String {
    let label = display_label(name);
    match relative {
        Some(rel) => format!("[{label}]({}/)", link_target(rel)),
        None => format!("**{label}**"),
    }
}
