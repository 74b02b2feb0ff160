//! Inventory types consumed from the scan layer.
//!
//! These mirror the JSON written by the notebook scanner. Everything is
//! typed at this boundary so the planner never inspects untyped maps.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{NbIndexError, Result};

/// Version string stamped into `index.json`.
pub const INDEX_FORMAT_VERSION: &str = "3.1";

// ---------------------------------------------------------------------------
// Inventory
// ---------------------------------------------------------------------------

/// A complete scan: notebooks plus run metadata and scan-level errors.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Inventory {
    /// When the scan ran (opaque string, passed through).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scan_timestamp: Option<String>,
    /// Signed-in account.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<AccountInfo>,
    /// Tenant identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant: Option<String>,
    /// Human description of what was scanned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    /// Scanned notebooks, in scan order.
    #[serde(default)]
    pub notebooks: Vec<NotebookInput>,
    /// Errors not attributable to a single notebook.
    #[serde(default)]
    pub errors: Vec<ErrorRecord>,
}

impl Inventory {
    /// Read and validate an inventory file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| NbIndexError::io(path, e))?;
        let inventory = Self::from_json(&content)
            .map_err(|e| NbIndexError::parse(format!("{}: {e}", path.display())))?;
        tracing::debug!(
            path = %path.display(),
            notebooks = inventory.notebooks.len(),
            "loaded inventory"
        );
        Ok(inventory)
    }

    /// Decode and validate an inventory from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        let inventory: Self =
            serde_json::from_str(json).map_err(|e| NbIndexError::parse(e.to_string()))?;
        inventory.validate()?;
        Ok(inventory)
    }

    /// Check contracts serde cannot express.
    ///
    /// Page ids must be unique across the whole inventory; the planner keys
    /// the id-to-path map on them.
    pub fn validate(&self) -> Result<()> {
        let mut seen: HashMap<&str, &str> = HashMap::new();
        for notebook in &self.notebooks {
            for section in notebook.all_sections() {
                for page in &section.pages {
                    if let Some(first) = seen.insert(page.id.as_str(), section.id.as_str()) {
                        return Err(NbIndexError::validation(format!(
                            "duplicate page id '{}' in section '{}' ({}) of notebook '{}', \
                             first seen in section {first}",
                            page.id, section.name, section.id, notebook.name
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

/// Account details shown in the index header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountInfo {
    /// Display name of the signed-in user.
    #[serde(default)]
    pub display_name: Option<String>,
    /// Primary email address.
    #[serde(default)]
    pub mail: Option<String>,
}

/// A free-form diagnostic reported by the scan layer, passed through verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRecord {
    /// Where the error happened (e.g. `Work/Meetings`).
    #[serde(default)]
    pub context: String,
    /// What went wrong.
    #[serde(default)]
    pub error: String,
}

impl ErrorRecord {
    pub fn new(context: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            context: context.into(),
            error: error.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Containers
// ---------------------------------------------------------------------------

/// One scanned notebook.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotebookInput {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "createdDateTime", alias = "createdAt")]
    pub created_at: Option<String>,
    #[serde(default, rename = "lastModifiedDateTime", alias = "modifiedAt")]
    pub modified_at: Option<String>,
    /// Sections directly under the notebook.
    #[serde(default)]
    pub sections: Vec<SectionInput>,
    /// Nested section groups.
    #[serde(default, rename = "section_groups", alias = "sectionGroups")]
    pub section_groups: Vec<SectionGroupInput>,
    /// Errors raised while listing this notebook's children.
    #[serde(default)]
    pub errors: Vec<ErrorRecord>,
}

impl NotebookInput {
    /// Every section in the notebook, direct sections first, then groups depth-first.
    pub fn all_sections(&self) -> Vec<&SectionInput> {
        let mut out: Vec<&SectionInput> = self.sections.iter().collect();
        for group in &self.section_groups {
            group.collect_sections(&mut out);
        }
        out
    }
}

/// A section group; nests arbitrarily deep.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SectionGroupInput {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub sections: Vec<SectionInput>,
    #[serde(default, rename = "section_groups", alias = "sectionGroups")]
    pub section_groups: Vec<SectionGroupInput>,
    #[serde(default)]
    pub errors: Vec<ErrorRecord>,
}

impl SectionGroupInput {
    fn collect_sections<'a>(&'a self, out: &mut Vec<&'a SectionInput>) {
        out.extend(self.sections.iter());
        for nested in &self.section_groups {
            nested.collect_sections(out);
        }
    }
}

/// A section and its flat, order-annotated page list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SectionInput {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub pages: Vec<PageRecord>,
    #[serde(default)]
    pub errors: Vec<ErrorRecord>,
}

/// One page as reported by the scan: flat, with nesting given by `level`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRecord {
    pub id: String,
    #[serde(default)]
    pub title: String,
    /// Parent hint from the source; the tree is rebuilt from `level`.
    #[serde(default, rename = "parentPageId", alias = "parentId")]
    pub parent_id: Option<String>,
    /// Nesting depth, 0 = top level.
    #[serde(default)]
    pub level: u32,
    /// Global sequencing key within the section.
    #[serde(default)]
    pub order: i64,
    #[serde(default, rename = "createdDateTime", alias = "createdAt")]
    pub created_at: Option<String>,
    #[serde(default, rename = "lastModifiedDateTime", alias = "modifiedAt")]
    pub modified_at: Option<String>,
}

impl PageRecord {
    /// Shorthand used heavily by tests and fixtures.
    pub fn new(id: impl Into<String>, title: impl Into<String>, level: u32, order: i64) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            level,
            order,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_record_accepts_scanner_field_names() {
        let json = r#"{
            "id": "p1",
            "title": "Agenda",
            "level": 1,
            "order": 3,
            "createdDateTime": "2024-01-01T00:00:00Z",
            "lastModifiedDateTime": "2024-01-02T00:00:00Z",
            "parentPageId": "p0"
        }"#;
        let page: PageRecord = serde_json::from_str(json).expect("deserialize");
        assert_eq!(page.level, 1);
        assert_eq!(page.order, 3);
        assert_eq!(page.parent_id.as_deref(), Some("p0"));
        assert_eq!(page.created_at.as_deref(), Some("2024-01-01T00:00:00Z"));
    }

    #[test]
    fn missing_fields_default() {
        let page: PageRecord = serde_json::from_str(r#"{"id": "p1"}"#).expect("deserialize");
        assert_eq!(page.title, "");
        assert_eq!(page.level, 0);
        assert_eq!(page.order, 0);
    }

    #[test]
    fn section_groups_accept_both_spellings() {
        let snake = r#"{"id": "nb", "name": "N", "section_groups": [{"id": "g", "name": "G"}]}"#;
        let camel = r#"{"id": "nb", "name": "N", "sectionGroups": [{"id": "g", "name": "G"}]}"#;
        let a: NotebookInput = serde_json::from_str(snake).expect("snake");
        let b: NotebookInput = serde_json::from_str(camel).expect("camel");
        assert_eq!(a.section_groups.len(), 1);
        assert_eq!(b.section_groups[0].name, "G");
    }

    #[test]
    fn all_sections_walks_nested_groups() {
        let notebook = NotebookInput {
            id: "nb".into(),
            name: "N".into(),
            sections: vec![SectionInput {
                id: "s0".into(),
                ..SectionInput::default()
            }],
            section_groups: vec![SectionGroupInput {
                name: "A".into(),
                sections: vec![SectionInput {
                    id: "s1".into(),
                    ..SectionInput::default()
                }],
                section_groups: vec![SectionGroupInput {
                    name: "B".into(),
                    sections: vec![SectionInput {
                        id: "s2".into(),
                        ..SectionInput::default()
                    }],
                    ..SectionGroupInput::default()
                }],
                ..SectionGroupInput::default()
            }],
            ..NotebookInput::default()
        };
        let ids: Vec<&str> = notebook.all_sections().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, ["s0", "s1", "s2"]);
    }

    #[test]
    fn duplicate_page_ids_are_rejected() {
        let json = r#"{
            "notebooks": [{
                "id": "nb", "name": "Work",
                "sections": [{
                    "id": "s1", "name": "Meetings",
                    "pages": [{"id": "p1", "title": "A"}, {"id": "p1", "title": "B"}]
                }]
            }]
        }"#;
        let err = Inventory::from_json(json).unwrap_err();
        assert!(err.to_string().contains("duplicate page id 'p1'"));
    }

    #[test]
    fn same_page_id_in_different_sections_is_rejected() {
        let json = r#"{
            "notebooks": [{
                "id": "nb", "name": "Work",
                "sections": [
                    {"id": "s1", "name": "A", "pages": [{"id": "p1"}]},
                    {"id": "s2", "name": "B", "pages": [{"id": "p1"}]}
                ]
            }]
        }"#;
        let err = Inventory::from_json(json).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("duplicate page id 'p1' in section 'B' (s2)"));
        assert!(message.contains("first seen in section s1"));
    }

    #[test]
    fn same_page_id_in_different_notebooks_is_rejected() {
        let json = r#"{
            "notebooks": [
                {"id": "nb1", "name": "Work",
                 "sections": [{"id": "s1", "pages": [{"id": "p1"}]}]},
                {"id": "nb2", "name": "Home",
                 "sections": [{"id": "s2", "pages": [{"id": "p1"}]}]}
            ]
        }"#;
        let err = Inventory::from_json(json).unwrap_err();
        assert!(err.to_string().contains("of notebook 'Home'"));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = Inventory::from_json("{ not json").unwrap_err();
        assert!(err.to_string().starts_with("parse error"));
    }

    #[test]
    fn inventory_fixture_validates() {
        let fixture = std::fs::read_to_string("../../../fixtures/json/inventory.fixture.json")
            .expect("read fixture");
        let inventory = Inventory::from_json(&fixture).expect("deserialize fixture inventory");
        assert_eq!(inventory.notebooks.len(), 2);
        assert_eq!(inventory.notebooks[0].all_sections().len(), 3);
        assert_eq!(inventory.errors.len(), 1);
        assert_eq!(
            inventory.account.and_then(|a| a.display_name).as_deref(),
            Some("Test User")
        );
    }
}
