//! Document reference entity type - file pointers embedded in a project

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::core::identity::{EntityId, EntityPrefix};

/// Kind of referenced document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum, Default)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum DocumentType {
    Agreement,
    Drawing,
    Approval,
    Inspection,
    Billing,
    Invoice,
    #[default]
    Other,
}

impl std::fmt::Display for DocumentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentType::Agreement => write!(f, "agreement"),
            DocumentType::Drawing => write!(f, "drawing"),
            DocumentType::Approval => write!(f, "approval"),
            DocumentType::Inspection => write!(f, "inspection"),
            DocumentType::Billing => write!(f, "billing"),
            DocumentType::Invoice => write!(f, "invoice"),
            DocumentType::Other => write!(f, "other"),
        }
    }
}

/// A pointer to a file on disk; the file itself is not managed here
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentReference {
    pub id: EntityId,
    pub project_id: EntityId,
    pub name: String,

    #[serde(rename = "type", default)]
    pub doc_type: DocumentType,

    pub file_path: String,

    #[serde(default)]
    pub folder_path: String,

    /// Size in bytes as recorded at upload time
    #[serde(default)]
    pub size: u64,

    /// Uploader; may no longer resolve to a stored user
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uploaded_by: Option<EntityId>,

    pub uploaded_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl DocumentReference {
    pub fn new(
        project_id: EntityId,
        name: impl Into<String>,
        doc_type: DocumentType,
        file_path: impl Into<String>,
    ) -> Self {
        Self {
            id: EntityId::new(EntityPrefix::Doc),
            project_id,
            name: name.into(),
            doc_type,
            file_path: file_path.into(),
            folder_path: String::new(),
            size: 0,
            uploaded_by: None,
            uploaded_at: Utc::now(),
            tags: Vec::new(),
            is_active: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_roundtrip() {
        let doc = DocumentReference::new(
            EntityId::new(EntityPrefix::Prj),
            "Signed agreement",
            DocumentType::Agreement,
            "agreements/signed.pdf",
        );

        let json = serde_json::to_string(&doc).unwrap();
        let parsed: DocumentReference = serde_json::from_str(&json).unwrap();

        assert_eq!(doc.id, parsed.id);
        assert_eq!(parsed.doc_type, DocumentType::Agreement);
        assert!(parsed.is_active);
    }
}
