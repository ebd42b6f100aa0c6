//! In-memory `RemoteStorage` used by the tests.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::errors::Result;
use crate::storage::{RemoteKind, RemoteNode, RemoteStorage};

/// A successful create call, in the order it was made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    CreateFolder { parent: String, name: String },
    CreateFile { parent: String, name: String },
}

struct Entry {
    parent: String,
    node: RemoteNode,
}

#[derive(Default)]
struct State {
    entries: Vec<Entry>,
    calls: Vec<Call>,
    next_id: usize,
    failing_uploads: HashSet<String>,
    failing_folders: HashSet<String>,
    failing_listings: HashSet<String>,
}

impl State {
    fn insert(&mut self, parent: &str, name: &str, kind: RemoteKind) -> String {
        self.next_id += 1;
        let id = format!("id-{}", self.next_id);
        self.entries.push(Entry {
            parent: parent.to_string(),
            node: RemoteNode { id: id.clone(), name: name.to_string(), kind },
        });
        id
    }
}

#[derive(Default)]
pub struct MemoryStorage {
    state: Mutex<State>,
}

impl MemoryStorage {
    pub fn new() -> MemoryStorage {
        MemoryStorage::default()
    }

    pub fn seed_folder(&self, parent: &str, name: &str) -> String {
        self.state.lock().unwrap().insert(parent, name, RemoteKind::Folder)
    }

    pub fn seed_file(&self, parent: &str, name: &str) -> String {
        self.state.lock().unwrap().insert(parent, name, RemoteKind::File)
    }

    pub fn fail_upload(&self, name: &str) {
        self.state.lock().unwrap().failing_uploads.insert(name.to_string());
    }

    pub fn fail_folder(&self, name: &str) {
        self.state.lock().unwrap().failing_folders.insert(name.to_string());
    }

    pub fn fail_listing(&self, parent: &str) {
        self.state.lock().unwrap().failing_listings.insert(parent.to_string());
    }

    pub fn creates(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Names under `parent`, sorted.
    pub fn child_names(&self, parent: &str) -> Vec<String> {
        self.names_where(parent, |_| true)
    }

    /// Folder names under `parent`, sorted.
    pub fn folder_names(&self, parent: &str) -> Vec<String> {
        self.names_where(parent, |node| node.kind == RemoteKind::Folder)
    }

    pub fn child_id(&self, parent: &str, name: &str) -> Option<String> {
        let state = self.state.lock().unwrap();
        state
            .entries
            .iter()
            .find(|entry| entry.parent == parent && entry.node.name == name)
            .map(|entry| entry.node.id.clone())
    }

    fn names_where(&self, parent: &str, keep: impl Fn(&RemoteNode) -> bool) -> Vec<String> {
        let state = self.state.lock().unwrap();
        let mut names: Vec<String> = state
            .entries
            .iter()
            .filter(|entry| entry.parent == parent && keep(&entry.node))
            .map(|entry| entry.node.name.clone())
            .collect();
        names.sort();
        names
    }
}

#[async_trait(?Send)]
impl RemoteStorage for MemoryStorage {
    async fn list_children(
        &self,
        parent_id: &str,
        name_filter: Option<&str>,
    ) -> Result<Vec<RemoteNode>> {
        let state = self.state.lock().unwrap();
        if state.failing_listings.contains(parent_id) {
            return Err(format!("listing {parent_id} failed").into());
        }
        Ok(state
            .entries
            .iter()
            .filter(|entry| entry.parent == parent_id)
            .filter(|entry| name_filter.map_or(true, |name| entry.node.name == name))
            .map(|entry| entry.node.clone())
            .collect())
    }

    async fn create_folder(&self, parent_id: &str, name: &str) -> Result<String> {
        let mut state = self.state.lock().unwrap();
        if state.failing_folders.contains(name) {
            return Err(format!("creating folder {name} failed").into());
        }
        state.calls.push(Call::CreateFolder { parent: parent_id.to_string(), name: name.to_string() });
        Ok(state.insert(parent_id, name, RemoteKind::Folder))
    }

    async fn create_file(&self, parent_id: &str, name: &str, local_path: &Path) -> Result<String> {
        let mut state = self.state.lock().unwrap();
        if state.failing_uploads.contains(name) {
            return Err(format!("uploading {name} failed").into());
        }
        std::fs::metadata(local_path)?;
        state.calls.push(Call::CreateFile { parent: parent_id.to_string(), name: name.to_string() });
        Ok(state.insert(parent_id, name, RemoteKind::File))
    }
}
