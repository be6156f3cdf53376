//! Request DTOs with validation, as received from the routing layer.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use drivehub_core::result::AppResult;
use drivehub_core::types::PageRequest;
use drivehub_entity::{Namespace, ParentRef, PermissionSet, SharePermission};

use crate::share::NewShare;
use crate::tree::{NewFile, NewFolder};

/// Namespace fields as sent by clients.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NamespaceInput {
    /// Namespace id.
    #[validate(length(min = 1, message = "namespace.id is required"))]
    pub id: String,
    /// Namespace display name.
    #[validate(length(min = 1, message = "namespace.name is required"))]
    pub name: String,
}

impl From<NamespaceInput> for Namespace {
    fn from(input: NamespaceInput) -> Self {
        Namespace::new(input.id, input.name)
    }
}

/// Create folder request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateFolderRequest {
    /// Target namespace.
    #[validate(nested)]
    pub namespace: NamespaceInput,
    /// Parent folder id, or `ROOT` / absent for root.
    #[serde(default)]
    pub parent_id: Option<ParentRef>,
    /// Folder name.
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    /// Description.
    #[validate(length(max = 1024))]
    pub description: Option<String>,
}

impl From<CreateFolderRequest> for NewFolder {
    fn from(req: CreateFolderRequest) -> Self {
        NewFolder {
            namespace: req.namespace.into(),
            parent_id: req.parent_id.unwrap_or(ParentRef::Root),
            name: req.name,
            description: req.description,
        }
    }
}

/// Upload body, either base64 text or raw bytes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "encoding", content = "data", rename_all = "lowercase")]
pub enum UploadContent {
    /// Standard base64; embedded whitespace is ignored.
    Base64(String),
    /// Raw bytes.
    Binary(Vec<u8>),
}

impl UploadContent {
    /// Decode into raw bytes.
    pub fn decode(self) -> AppResult<Bytes> {
        match self {
            Self::Base64(text) => {
                let cleaned: String = text.chars().filter(|c| !c.is_whitespace()).collect();
                Ok(Bytes::from(STANDARD.decode(cleaned)?))
            }
            Self::Binary(data) => Ok(Bytes::from(data)),
        }
    }
}

/// Upload file request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UploadFileRequest {
    /// Target namespace.
    #[validate(nested)]
    pub namespace: NamespaceInput,
    /// Parent folder id, or `ROOT` / absent for root.
    #[serde(default)]
    pub parent_id: Option<ParentRef>,
    /// File name.
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    /// Declared MIME type.
    #[validate(length(min = 1, message = "mimeType is required"))]
    pub mime_type: String,
    /// Declared size in bytes.
    pub size: u64,
    /// File body.
    pub content: UploadContent,
    /// Tags.
    #[serde(default)]
    pub tags: Vec<String>,
}

impl UploadFileRequest {
    /// Decode the body and build the service input.
    pub fn into_new_file(self) -> AppResult<NewFile> {
        Ok(NewFile {
            namespace: self.namespace.into(),
            parent_id: self.parent_id.unwrap_or(ParentRef::Root),
            name: self.name,
            mime_type: self.mime_type,
            size: self.size,
            content: self.content.decode()?,
            tags: self.tags,
        })
    }
}

/// Rename request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RenameRequest {
    /// The new name.
    #[validate(length(min = 1, max = 255))]
    pub new_name: String,
}

/// Move request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveRequest {
    /// Destination folder id, or `ROOT` / absent for root.
    #[serde(default)]
    pub new_parent_id: Option<ParentRef>,
}

impl MoveRequest {
    /// The destination, root when absent.
    pub fn destination(&self) -> ParentRef {
        self.new_parent_id.clone().unwrap_or(ParentRef::Root)
    }
}

/// Listing request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ListRequest {
    /// Namespace to list.
    #[validate(length(min = 1, message = "namespaceId is required"))]
    pub namespace_id: String,
    /// Folder to list, root when absent.
    #[serde(default)]
    pub parent_id: Option<ParentRef>,
    /// Page size, clamped to `1..=100`.
    #[serde(default)]
    pub limit: Option<usize>,
    /// Cursor from the previous page.
    #[serde(default)]
    pub page_token: Option<String>,
}

impl ListRequest {
    /// Parent to list.
    pub fn parent(&self) -> ParentRef {
        self.parent_id.clone().unwrap_or(ParentRef::Root)
    }

    /// Page parameters.
    pub fn page(&self) -> PageRequest {
        page_request(self.limit, self.page_token.clone())
    }
}

/// Build a page request, defaulting the limit.
pub fn page_request(limit: Option<usize>, page_token: Option<String>) -> PageRequest {
    let default = PageRequest::default();
    PageRequest::new(limit.unwrap_or(default.limit), page_token)
}

/// Create share request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ShareRequest {
    /// Grantee.
    #[validate(length(min = 1, message = "sharedWithUserId is required"))]
    pub shared_with_user_id: String,
    /// Granted permissions.
    #[validate(length(min = 1, message = "At least one permission is required"))]
    pub permissions: Vec<SharePermission>,
    /// Expiry.
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    /// Note for the grantee.
    #[validate(length(max = 1000))]
    #[serde(default)]
    pub message: Option<String>,
}

impl From<ShareRequest> for NewShare {
    fn from(req: ShareRequest) -> Self {
        NewShare {
            shared_with_user_id: req.shared_with_user_id,
            permissions: req.permissions.into_iter().collect(),
            expires_at: req.expires_at,
            message: req.message,
        }
    }
}

/// Update share permissions request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePermissionsRequest {
    /// Replacement permissions.
    #[validate(length(min = 1, message = "At least one permission is required"))]
    pub permissions: Vec<SharePermission>,
}

impl UpdatePermissionsRequest {
    /// As a permission set.
    pub fn permission_set(&self) -> PermissionSet {
        self.permissions.iter().copied().collect()
    }
}
