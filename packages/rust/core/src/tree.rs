//! Page tree resolution.
//!
//! Rebuilds parent/child edges for one section from the flat, order-annotated
//! page list the scanner produces. Nesting comes from each page's `level`:
//! a page at level N hangs under the nearest preceding page (by `order`) with
//! a level below N.

use tracing::{debug, instrument, warn};

use nbindex_shared::{NodeId, OrphanReason, PageForest, PageNode, PageRecord};

/// Resolve a section's pages into a forest of roots and orphans.
///
/// 1. Sort pages by `order`, ties broken by page id
/// 2. Attach pages to parents with a level stack
/// 3. Sever any edge that closes a cycle
/// 4. Split into roots and orphans, both sorted by `order`
#[instrument(skip_all, fields(page_count = records.len()))]
pub fn resolve_pages(records: &[PageRecord]) -> PageForest {
    if records.is_empty() {
        return PageForest::default();
    }

    let mut nodes: Vec<PageNode> = records.iter().map(PageNode::from_record).collect();
    let sorted = order_sorted(&nodes);

    link_by_level(&mut nodes, &sorted);
    sever_cycles(&mut nodes);

    let forest = categorize(nodes, &sorted);
    debug!(
        roots = forest.roots.len(),
        orphans = forest.orphans.len(),
        "page tree resolved"
    );
    forest
}

/// Node ids sorted by `(order, id)`.
///
/// Scanners that report no `order` leave every page at 0, so ties are common.
/// Breaking them by id keeps the tree independent of input position.
fn order_sorted(nodes: &[PageNode]) -> Vec<NodeId> {
    let mut ids: Vec<NodeId> = (0..nodes.len()).map(NodeId).collect();
    ids.sort_by(|a, b| {
        let (x, y) = (&nodes[a.0], &nodes[b.0]);
        (x.order, &x.id).cmp(&(y.order, &y.id))
    });
    ids
}

/// Attach every page to the nearest shallower page before it.
///
/// The stack holds candidate parents. Popping everything at or below the
/// current level leaves the nearest shallower ancestor on top. Orphans are
/// still pushed, so deeper pages following them hang underneath.
fn link_by_level(nodes: &mut [PageNode], sorted: &[NodeId]) {
    let mut stack: Vec<(NodeId, u32)> = Vec::new();

    for &id in sorted {
        let level = nodes[id.0].level;

        while stack.last().is_some_and(|&(_, top)| top >= level) {
            stack.pop();
        }

        if level > 0 {
            match stack.last() {
                Some(&(parent, _)) => {
                    let parent_id = nodes[parent.0].id.clone();
                    let node = &mut nodes[id.0];
                    node.parent = Some(parent);
                    node.parent_page_id = Some(parent_id);
                    nodes[parent.0].children.push(id);
                }
                None => {
                    warn!(page_id = %nodes[id.0].id, level, "page has no parent at expected level");
                    nodes[id.0].mark_orphan(OrphanReason::MissingParent);
                }
            }
        }

        stack.push((id, level));
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    New,
    OnStack,
    Done,
}

/// Find edges that point back at a page on the current DFS path and cut them.
///
/// Level-stack linking only ever points forward in `order`, so it cannot
/// produce a cycle. This pass guards the invariant for edges built any
/// other way (e.g. from explicit parent ids).
pub(crate) fn sever_cycles(nodes: &mut [PageNode]) {
    let back_edges = find_back_edges(nodes);

    for (from, target) in back_edges {
        nodes[from.0].children.retain(|&c| c != target);
        if let Some(parent) = nodes[target.0].parent.take() {
            nodes[parent.0].children.retain(|&c| c != target);
        }
        warn!(page_id = %nodes[target.0].id, "page involved in circular reference");
        nodes[target.0].mark_orphan(OrphanReason::CircularReference);
    }
}

fn find_back_edges(nodes: &[PageNode]) -> Vec<(NodeId, NodeId)> {
    let mut state = vec![Visit::New; nodes.len()];
    let mut back_edges = Vec::new();

    for start in 0..nodes.len() {
        if state[start] != Visit::New {
            continue;
        }
        state[start] = Visit::OnStack;
        let mut stack: Vec<(usize, usize)> = vec![(start, 0)];

        while let Some(frame) = stack.last_mut() {
            let (node, cursor) = *frame;
            match nodes[node].children.get(cursor).copied() {
                Some(child) => {
                    frame.1 += 1;
                    match state[child.0] {
                        Visit::New => {
                            state[child.0] = Visit::OnStack;
                            stack.push((child.0, 0));
                        }
                        Visit::OnStack => back_edges.push((NodeId(node), child)),
                        Visit::Done => {}
                    }
                }
                None => {
                    state[node] = Visit::Done;
                    stack.pop();
                }
            }
        }
    }

    back_edges
}

/// Split nodes into roots and orphans, each in `order` sequence.
///
/// A root is a clean page with level 0 or no resolved parent. Everything
/// else is reachable as a descendant of one or the other.
pub(crate) fn categorize(nodes: Vec<PageNode>, sorted: &[NodeId]) -> PageForest {
    let mut roots = Vec::new();
    let mut orphans = Vec::new();

    for &id in sorted {
        let node = &nodes[id.0];
        if node.is_orphan {
            orphans.push(id);
        } else if node.level == 0 || node.parent.is_none() {
            roots.push(id);
        }
    }

    PageForest::new(nodes, roots, orphans)
}
