use std::path::Path;

use async_trait::async_trait;

use crate::errors::Result;

pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

/// Id of the top of the user's "My Drive" hierarchy.
pub const ROOT_FOLDER_ID: &str = "root";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteKind {
    File,
    Folder,
}

impl RemoteKind {
    pub fn from_mime_type(mime_type: Option<&str>) -> RemoteKind {
        match mime_type {
            Some(FOLDER_MIME_TYPE) => RemoteKind::Folder,
            _ => RemoteKind::File,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteNode {
    pub id: String,
    pub name: String,
    pub kind: RemoteKind,
}

/// The remote side of a sync: list, create folder, upload file.
///
/// Calls are awaited one at a time, so the futures need not be `Send`.
#[async_trait(?Send)]
pub trait RemoteStorage {
    /// Children of `parent_id`, optionally restricted to an exact name.
    async fn list_children(
        &self,
        parent_id: &str,
        name_filter: Option<&str>,
    ) -> Result<Vec<RemoteNode>>;

    /// Creates a folder and returns its id.
    async fn create_folder(&self, parent_id: &str, name: &str) -> Result<String>;

    /// Uploads the content of `local_path` as a new file and returns its id.
    async fn create_file(&self, parent_id: &str, name: &str, local_path: &Path) -> Result<String>;
}
