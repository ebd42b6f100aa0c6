//! Mirrors a local directory tree into a remote folder.
//!
//! A remote object counts as synced when an object with the same name exists
//! under the matching remote folder. Content is never compared and nothing
//! remote is overwritten or deleted.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};

use error_chain::ChainedError;
use log::{debug, error, info, warn};

use crate::config::Config;
use crate::errors::{Result, ResultExt};
use crate::storage::{RemoteKind, RemoteNode, RemoteStorage};

/// Which local directories are left out of a sync.
#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    pub reserved_names: Vec<String>,
}

impl SyncOptions {
    pub fn from_config(config: &Config) -> SyncOptions {
        SyncOptions { reserved_names: config.reserved_names.clone() }
    }

    /// Dot-prefixed names are always reserved.
    pub fn is_reserved(&self, name: &str) -> bool {
        name.starts_with('.') || self.reserved_names.iter().any(|reserved| reserved == name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub folders_created: usize,
    pub folders_reused: usize,
    pub files_uploaded: usize,
    pub files_present: usize,
    pub uploads_failed: usize,
    pub reserved_skipped: usize,
    pub subtrees_failed: usize,
    pub entries_skipped: usize,
}

impl SyncReport {
    pub fn has_failures(&self) -> bool {
        self.uploads_failed > 0 || self.subtrees_failed > 0
    }
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} folders created, {} reused, {} files uploaded, {} already present, \
             {} uploads failed, {} folders failed, {} reserved folders skipped, \
             {} other entries skipped",
            self.folders_created,
            self.folders_reused,
            self.files_uploaded,
            self.files_present,
            self.uploads_failed,
            self.subtrees_failed,
            self.reserved_skipped,
            self.entries_skipped
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LocalKind {
    File,
    Directory,
}

#[derive(Debug)]
struct LocalNode {
    name: String,
    path: PathBuf,
    kind: LocalKind,
}

/// Remote children of one folder.
struct SyncContext {
    folders: HashMap<String, String>,
    names: HashSet<String>,
}

impl SyncContext {
    fn new(remote_children: Vec<RemoteNode>) -> SyncContext {
        let mut folders = HashMap::new();
        let mut names = HashSet::with_capacity(remote_children.len());
        for node in remote_children {
            if node.kind == RemoteKind::Folder {
                // Drive allows duplicate names; the first listed folder wins.
                folders.entry(node.name.clone()).or_insert(node.id);
            }
            names.insert(node.name);
        }
        SyncContext { folders, names }
    }

    fn folder_id(&self, name: &str) -> Option<&str> {
        self.folders.get(name).map(String::as_str)
    }

    fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }
}

/// Makes sure every file and directory below `local_path` has a remote
/// counterpart under `remote_parent_id`, creating what is missing.
///
/// Failing to list `local_path` itself or its remote folder is an error.
/// The same failure further down only abandons that subtree, and a failed
/// upload only skips that file; both are logged and counted in the report.
pub async fn sync_directory(
    local_path: &Path,
    remote_parent_id: &str,
    storage: &dyn RemoteStorage,
    options: &SyncOptions,
) -> Result<SyncReport> {
    let mut report = SyncReport::default();

    let mut pending = sync_level(local_path, remote_parent_id, storage, options, &mut report).await?;
    pending.reverse();

    while let Some((path, remote_id)) = pending.pop() {
        match sync_level(&path, &remote_id, storage, options, &mut report).await {
            Ok(children) => pending.extend(children.into_iter().rev()),
            Err(e) => {
                error!("Can not back up {}: {}", path.display(), e.display_chain());
                report.subtrees_failed += 1;
            }
        }
    }
    Ok(report)
}

/// Syncs the direct children of one directory and returns the
/// subdirectories still to visit, paired with their remote folder ids.
async fn sync_level(
    local_path: &Path,
    remote_id: &str,
    storage: &dyn RemoteStorage,
    options: &SyncOptions,
    report: &mut SyncReport,
) -> Result<Vec<(PathBuf, String)>> {
    let remote_children = storage
        .list_children(remote_id, None)
        .await
        .chain_err(|| format!("Could not list remote folder for {}", local_path.display()))?;
    let context = SyncContext::new(remote_children);
    let local_children = list_local(local_path, report).await?;

    let mut subdirectories = vec![];
    for dir in local_children.iter().filter(|node| node.kind == LocalKind::Directory) {
        if options.is_reserved(&dir.name) {
            warn!("Can not back up {}. It's a reserved folder.", dir.path.display());
            report.reserved_skipped += 1;
            continue;
        }

        let folder_id = match context.folder_id(&dir.name) {
            Some(id) => {
                debug!("Folder {} already exists", dir.path.display());
                report.folders_reused += 1;
                id.to_string()
            }
            None => match storage.create_folder(remote_id, &dir.name).await {
                Ok(id) => {
                    info!("Created the folder {}", dir.path.display());
                    report.folders_created += 1;
                    id
                }
                Err(e) => {
                    error!("Can not create the folder {}: {}", dir.path.display(), e.display_chain());
                    report.subtrees_failed += 1;
                    continue;
                }
            },
        };
        subdirectories.push((dir.path.clone(), folder_id));
    }

    for file in local_children.iter().filter(|node| node.kind == LocalKind::File) {
        if context.contains(&file.name) {
            debug!("Skipping {}, already backed up", file.path.display());
            report.files_present += 1;
            continue;
        }
        match storage.create_file(remote_id, &file.name, &file.path).await {
            Ok(_) => {
                info!("Backed up a file: {}", file.path.display());
                report.files_uploaded += 1;
            }
            Err(e) => {
                error!("Can not back up {}: {}", file.path.display(), e.display_chain());
                report.uploads_failed += 1;
            }
        }
    }

    Ok(subdirectories)
}

/// Lists a local directory, sorted by name.
///
/// Symlinked files are followed. Symlinked directories are skipped, since a
/// link back to an ancestor would otherwise be walked without end.
async fn list_local(dir: &Path, report: &mut SyncReport) -> Result<Vec<LocalNode>> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .chain_err(|| format!("Could not list local directory {}", dir.display()))?;

    let mut nodes = vec![];
    while let Some(entry) = entries
        .next_entry()
        .await
        .chain_err(|| format!("Could not list local directory {}", dir.display()))?
    {
        let path = entry.path();
        let Ok(name) = entry.file_name().into_string() else {
            warn!("Skipping {}: name is not valid UTF-8", path.display());
            report.entries_skipped += 1;
            continue;
        };
        let is_symlink = match tokio::fs::symlink_metadata(&path).await {
            Ok(metadata) => metadata.file_type().is_symlink(),
            Err(e) => {
                warn!("Skipping {}: {}", path.display(), e);
                report.entries_skipped += 1;
                continue;
            }
        };
        let kind = match tokio::fs::metadata(&path).await {
            Ok(metadata) if metadata.is_dir() && is_symlink => {
                warn!("Skipping {}: symlinked folders are not followed", path.display());
                report.entries_skipped += 1;
                continue;
            }
            Ok(metadata) if metadata.is_dir() => LocalKind::Directory,
            Ok(metadata) if metadata.is_file() => LocalKind::File,
            Ok(_) => {
                warn!("Skipping {}: not a regular file or directory", path.display());
                report.entries_skipped += 1;
                continue;
            }
            Err(e) => {
                warn!("Skipping {}: {}", path.display(), e);
                report.entries_skipped += 1;
                continue;
            }
        };
        nodes.push(LocalNode { name, path, kind });
    }
    nodes.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(nodes)
}
