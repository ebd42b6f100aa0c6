use std::io::Cursor;
use std::path::Path;

use async_trait::async_trait;
use google_drive3::api::{File, FileList};
use google_drive3::hyper::client::HttpConnector;
use google_drive3::hyper_rustls::HttpsConnector;
use google_drive3::{hyper, hyper_rustls, oauth2, DriveHub};
use mime::Mime;

use crate::errors::{ErrorKind, Result, ResultExt};
use crate::storage::{RemoteKind, RemoteNode, RemoteStorage, FOLDER_MIME_TYPE};

pub type Connector = HttpsConnector<HttpConnector>;

/// Files above this size go through a resumable upload session.
const SIMPLE_UPLOAD_LIMIT: u64 = 5 * 1024 * 1024;

const LIST_FIELDS: &str = "nextPageToken,files(id,name,mimeType)";

const OCTET_STREAM: &str = "application/octet-stream";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UploadProtocol {
    /// One multipart request carrying metadata and content.
    Simple,
    /// An upload session, for content above `SIMPLE_UPLOAD_LIMIT`.
    Resumable,
}

fn upload_protocol(size: u64) -> UploadProtocol {
    if size > SIMPLE_UPLOAD_LIMIT {
        UploadProtocol::Resumable
    } else {
        UploadProtocol::Simple
    }
}

fn parse_mime(essence: &str) -> Result<Mime> {
    essence
        .parse()
        .map_err(|_| ErrorKind::InvalidMimeType(essence.to_string()).into())
}

pub struct Drive {
    hub: DriveHub<Connector>,
    scopes: Vec<String>,
}

impl Drive {
    pub fn new(hub: DriveHub<Connector>, scopes: Vec<String>) -> Drive {
        Drive { hub, scopes }
    }

    async fn list_page(&self, query: &str, page_token: Option<&str>) -> Result<FileList> {
        let mut list_query = self.hub.files().list().q(query).param("fields", LIST_FIELDS);
        for scope in &self.scopes {
            list_query = list_query.add_scope(scope.as_str());
        }
        if let Some(page_token) = page_token {
            list_query = list_query.page_token(page_token);
        }
        let (_, file_list) = list_query.doit().await?;
        Ok(file_list)
    }
}

#[async_trait(?Send)]
impl RemoteStorage for Drive {
    async fn list_children(
        &self,
        parent_id: &str,
        name_filter: Option<&str>,
    ) -> Result<Vec<RemoteNode>> {
        let query = children_query(parent_id, name_filter);

        let mut nodes = vec![];
        let mut page_token: Option<String> = None;
        loop {
            let file_list = self
                .list_page(&query, page_token.as_deref())
                .await
                .chain_err(|| format!("Could not list files in folder {parent_id} in drive."))?;
            for file in file_list.files.unwrap_or_default() {
                nodes.push(remote_node_from(file)?);
            }
            match file_list.next_page_token {
                Some(next) => page_token = Some(next),
                None => break,
            }
        }
        Ok(nodes)
    }

    async fn create_folder(&self, parent_id: &str, name: &str) -> Result<String> {
        let folder = File {
            name: Some(name.to_string()),
            mime_type: Some(FOLDER_MIME_TYPE.to_string()),
            parents: Some(vec![parent_id.to_string()]),
            ..Default::default()
        };
        let mut create = self.hub.files().create(folder).param("fields", "id");
        for scope in &self.scopes {
            create = create.add_scope(scope.as_str());
        }
        // Metadata-only creation is an upload with no content.
        let (_, created) = create
            .upload(Cursor::new(Vec::new()), parse_mime(FOLDER_MIME_TYPE)?)
            .await
            .chain_err(|| format!("Could not create folder {name} in drive."))?;
        created.id.ok_or_else(|| ErrorKind::MissingField("id").into())
    }

    async fn create_file(&self, parent_id: &str, name: &str, local_path: &Path) -> Result<String> {
        let content = tokio::fs::File::open(local_path)
            .await
            .chain_err(|| format!("Could not open {} for upload.", local_path.display()))?;
        let size = content.metadata().await?.len();
        let content = content.into_std().await;

        let metadata = File {
            name: Some(name.to_string()),
            parents: Some(vec![parent_id.to_string()]),
            ..Default::default()
        };
        let mut create = self.hub.files().create(metadata).param("fields", "id");
        for scope in &self.scopes {
            create = create.add_scope(scope.as_str());
        }
        let mime_type = parse_mime(OCTET_STREAM)?;
        let upload = match upload_protocol(size) {
            UploadProtocol::Resumable => create.upload_resumable(content, mime_type).await,
            UploadProtocol::Simple => create.upload(content, mime_type).await,
        };
        let (_, created) = upload.chain_err(|| format!("Could not upload {name} to drive."))?;
        created.id.ok_or_else(|| ErrorKind::MissingField("id").into())
    }
}

pub fn create_drive_hub(
    authenticator: oauth2::authenticator::Authenticator<Connector>,
) -> DriveHub<Connector> {
    DriveHub::new(
        hyper::Client::builder().build(
            hyper_rustls::HttpsConnectorBuilder::new()
                .with_native_roots()
                .https_or_http()
                .enable_http1()
                .enable_http2()
                .build(),
        ),
        authenticator,
    )
}

fn remote_node_from(file: File) -> Result<RemoteNode> {
    let kind = RemoteKind::from_mime_type(file.mime_type.as_deref());
    Ok(RemoteNode {
        id: file.id.ok_or(ErrorKind::MissingField("id"))?,
        name: file.name.ok_or(ErrorKind::MissingField("name"))?,
        kind,
    })
}

fn children_query(parent_id: &str, name_filter: Option<&str>) -> String {
    let mut query = format!("'{}' in parents and trashed = false", escape_query_value(parent_id));
    if let Some(name) = name_filter {
        query.push_str(&format!(" and name = '{}'", escape_query_value(name)));
    }
    query
}

/// Escapes a value for use inside a single-quoted Drive query literal.
fn escape_query_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}
