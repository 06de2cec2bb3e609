//! Data model shared by the metadata-store implementations.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Classification role a folder node plays in the destination tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubjectKind {
    /// The base root of the destination tree.
    Root,
    /// First level below the root: document type.
    DocumentType,
    /// Second level: main subject.
    MainSubject,
    /// Third level: sub subject.
    SubSubject,
}

impl SubjectKind {
    /// Stable label persisted in the store.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Root => "root",
            Self::DocumentType => "document_type",
            Self::MainSubject => "main_subject",
            Self::SubSubject => "sub_subject",
        }
    }

    /// Parse a persisted label back into a subject kind.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "root" => Some(Self::Root),
            "document_type" => Some(Self::DocumentType),
            "main_subject" => Some(Self::MainSubject),
            "sub_subject" => Some(Self::SubSubject),
            _ => None,
        }
    }
}

/// Node of the destination folder tree.
///
/// At most one node exists per distinct `full_path`; the store enforces the
/// uniqueness. The parent chain reconstructs the full path segment by
/// segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderNode {
    /// Generated node identifier.
    pub id: Uuid,
    /// Last path segment.
    pub name: String,
    /// Full forward-slash path from the filesystem root.
    pub full_path: String,
    /// External reference other nodes use to point at this one. Assigned
    /// from the generated id after creation.
    pub external_ref: Option<String>,
    /// External reference of the parent node; `None` for the base root.
    pub parent_ref: Option<String>,
    /// Classification role, when the node sits within the tagged depth.
    pub subject: Option<SubjectKind>,
    /// Classification identifier matching the subject role.
    pub subject_id: Option<i64>,
}

/// Document record owned by the metadata store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRecord {
    /// Generated record identifier.
    pub id: Uuid,
    /// External identifier embedded in staged file names.
    pub external_id: String,
    /// Document type classification id.
    pub type_id: Option<i64>,
    /// Main subject classification id.
    pub main_subject_id: Option<i64>,
    /// Sub subject classification id.
    pub sub_subject_id: Option<i64>,
    /// Destination directory recorded after relocation.
    pub storage_path: Option<String>,
    /// Timestamp-prefixed name the file carries at its destination.
    pub stored_name: Option<String>,
    /// Name the file carried before relocation, identifier token stripped.
    pub original_name: Option<String>,
    /// Leaf folder node the record is filed under.
    pub folder_id: Option<Uuid>,
}

/// Row returned by the batched classification lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRow {
    /// External identifier the row was matched on.
    pub external_id: String,
    /// Document type name, unsanitized.
    pub doc_type: Option<String>,
    /// Main subject name, unsanitized.
    pub main_subject: Option<String>,
    /// Sub subject name, unsanitized.
    pub sub_subject: Option<String>,
    /// Document type classification id.
    pub type_id: Option<i64>,
    /// Main subject classification id.
    pub main_subject_id: Option<i64>,
    /// Sub subject classification id.
    pub sub_subject_id: Option<i64>,
    /// Year of the document date, falling back to the registration date.
    pub year: Option<i32>,
}
