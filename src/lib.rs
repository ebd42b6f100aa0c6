use chrono::Local;
use log::info;

use config::{BackupMode, Config};
use errors::{ErrorKind, Result, ResultExt};
use storage::{RemoteKind, RemoteStorage, ROOT_FOLDER_ID};
use sync::{sync_directory, SyncOptions, SyncReport};

pub mod cli_factories;
pub mod config;
pub mod drive;
pub mod errors;
pub mod prompt;
pub mod storage;
pub mod sync;

#[cfg(test)]
mod memory_storage;

/// Mirrors `config.local_root` into a top-level Drive folder chosen by
/// `config.mode`.
pub async fn back_up(config: &Config, storage: &dyn RemoteStorage) -> Result<SyncReport> {
    let local_root = &config.local_root;
    let metadata = tokio::fs::metadata(local_root)
        .await
        .chain_err(|| format!("Could not read local folder {}", local_root.display()))?;
    if !metadata.is_dir() {
        return Err(ErrorKind::NotADirectory(local_root.clone()).into());
    }

    let folder_id = resolve_remote_root(config, storage).await?;
    info!("Backing up {} into folder {}", local_root.display(), folder_id);

    sync_directory(local_root, &folder_id, storage, &SyncOptions::from_config(config)).await
}

async fn resolve_remote_root(config: &Config, storage: &dyn RemoteStorage) -> Result<String> {
    let folder_name = config.remote_root_name(&Local::now());

    if config.mode == BackupMode::Sync {
        let existing = storage
            .list_children(ROOT_FOLDER_ID, Some(folder_name.as_str()))
            .await
            .chain_err(|| format!("Could not look up {folder_name} folder in drive."))?
            .into_iter()
            .find(|node| node.kind == RemoteKind::Folder && node.name == folder_name);
        if let Some(folder) = existing {
            info!("Reusing folder {folder_name}");
            return Ok(folder.id);
        }
    }

    let id = storage
        .create_folder(ROOT_FOLDER_ID, &folder_name)
        .await
        .chain_err(|| format!("Could not create {folder_name} folder in drive."))?;
    info!("Created folder {folder_name}");
    Ok(id)
}
