//! Export-root assembler.
//!
//! The only part of the core that writes: executes planned directory
//! operations and persists `index.md` / `index.json` into the export root.

use std::path::Path;

use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument};

use nbindex_shared::{BuildOptions, FsOperation, NbIndexError, Result};

use crate::builder::IndexBuildResult;

/// Metadata for a single written index file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactMeta {
    pub filename: String,
    pub sha256: String,
    pub size_bytes: usize,
}

/// Both index files as written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WrittenIndex {
    pub markdown: ArtifactMeta,
    pub json: ArtifactMeta,
}

/// Execute one planned operation. Existing directories are fine.
pub fn execute_operation(op: &FsOperation) -> Result<()> {
    match op {
        FsOperation::Mkdir { path } => {
            std::fs::create_dir_all(path).map_err(|e| NbIndexError::io(path, e))?;
        }
    }
    debug!(operation = op.name(), path = %op.path().display(), "executed");
    Ok(())
}

/// Execute planned operations in order.
#[instrument(skip_all, fields(count = ops.len()))]
pub fn execute_operations(ops: &[FsOperation]) -> Result<()> {
    for op in ops {
        execute_operation(op)?;
    }
    info!(count = ops.len(), "directory operations complete");
    Ok(())
}

/// Write `index.md` and pretty-printed `index.json` into the export root.
///
/// Each file is written to a temp file first, then renamed into place.
#[instrument(skip_all, fields(root = %result.export_root.display()))]
pub fn write_index_files(
    result: &IndexBuildResult,
    options: &BuildOptions,
) -> Result<WrittenIndex> {
    let root = &result.export_root;
    std::fs::create_dir_all(root).map_err(|e| NbIndexError::io(root, e))?;

    let json = serde_json::to_string_pretty(&result.index_json)
        .map_err(|e| NbIndexError::Serialization(format!("index.json: {e}")))?;

    let markdown = write_atomic(root, &options.markdown_file, &result.index_markdown)?;
    let json = write_atomic(root, &options.json_file, &json)?;

    info!(
        markdown = %markdown.filename,
        json = %json.filename,
        "index files written"
    );
    Ok(WrittenIndex { markdown, json })
}

fn write_atomic(dir: &Path, filename: &str, content: &str) -> Result<ArtifactMeta> {
    let target = dir.join(filename);
    let temp = dir.join(format!(".{filename}.tmp"));

    std::fs::write(&temp, content).map_err(|e| NbIndexError::io(&temp, e))?;
    std::fs::rename(&temp, &target).map_err(|e| NbIndexError::io(&target, e))?;

    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let hash = format!("{:x}", hasher.finalize());

    debug!(file = %filename, size = content.len(), "wrote index file");

    Ok(ArtifactMeta {
        filename: filename.to_string(),
        sha256: hash,
        size_bytes: content.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use crate::builder::build_index;
    use nbindex_artifacts::IndexDocument;
    use nbindex_shared::{
        AccountInfo, Inventory, NotebookInput, PageRecord, RunMetadata, SectionInput,
    };

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "nbindex-assembler-test-{}",
            uuid::Uuid::now_v7()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn build(root: &Path) -> IndexBuildResult {
        let inventory = Inventory {
            notebooks: vec![NotebookInput {
                id: "nb1".into(),
                name: "Work".into(),
                sections: vec![SectionInput {
                    id: "s1".into(),
                    name: "Meetings".into(),
                    pages: vec![
                        PageRecord::new("p", "Weekly", 0, 0),
                        PageRecord::new("c", "Jan", 1, 1),
                    ],
                    errors: vec![],
                }],
                ..NotebookInput::default()
            }],
            ..Inventory::default()
        };
        let meta = RunMetadata {
            scan_timestamp: "2024-05-01T09:30:00Z".into(),
            account: AccountInfo::default(),
            tenant: "consumers".into(),
            scope: "All notebooks".into(),
        };
        build_index(root, &inventory, &meta, &BuildOptions::default())
    }

    #[test]
    fn operations_create_planned_tree() {
        let root = temp_dir();
        let result = build(&root);
        execute_operations(&result.operations).unwrap();

        assert!(root.join("Work").join("Meetings").is_dir());
        assert!(root.join("Work").join("Meetings").join("Weekly").is_dir());

        std::fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn operations_are_idempotent() {
        let root = temp_dir();
        let result = build(&root);
        execute_operations(&result.operations).unwrap();
        execute_operations(&result.operations).unwrap();
        assert!(root.join("Work").is_dir());

        std::fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn mkdir_over_a_file_fails() {
        let root = temp_dir();
        let blocker = root.join("blocked");
        std::fs::write(&blocker, "x").unwrap();
        let err = execute_operation(&FsOperation::Mkdir {
            path: blocker.join("inner"),
        })
        .unwrap_err();
        assert!(err.to_string().contains("blocked"));

        std::fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn writes_both_index_files() {
        let root = temp_dir();
        let result = build(&root);
        let written = write_index_files(&result, &BuildOptions::default()).unwrap();

        assert_eq!(written.markdown.filename, "index.md");
        assert_eq!(written.json.filename, "index.json");

        let md = std::fs::read_to_string(root.join("index.md")).unwrap();
        assert_eq!(md, result.index_markdown);
        assert_eq!(written.markdown.size_bytes, md.len());
        assert_eq!(written.markdown.sha256.len(), 64);

        let json = std::fs::read_to_string(root.join("index.json")).unwrap();
        let doc: IndexDocument = serde_json::from_str(&json).unwrap();
        assert_eq!(doc, result.index_json);

        std::fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn no_temp_files_left_behind() {
        let root = temp_dir();
        let result = build(&root);
        write_index_files(&result, &BuildOptions::default()).unwrap();

        let leftovers: Vec<_> = std::fs::read_dir(&root)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());

        std::fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn checksum_is_stable_across_writes() {
        let root = temp_dir();
        let result = build(&root);
        let first = write_index_files(&result, &BuildOptions::default()).unwrap();
        let second = write_index_files(&result, &BuildOptions::default()).unwrap();
        assert_eq!(first, second);

        std::fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn custom_file_names() {
        let root = temp_dir();
        let result = build(&root);
        let options = BuildOptions {
            markdown_file: "README.md".into(),
            json_file: "inventory.json".into(),
            ..BuildOptions::default()
        };
        write_index_files(&result, &options).unwrap();
        assert!(root.join("README.md").is_file());
        assert!(root.join("inventory.json").is_file());

        std::fs::remove_dir_all(&root).unwrap();
    }
}
