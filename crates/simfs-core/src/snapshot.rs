//! Snapshot persistence for simulation instances.
//!
//! A snapshot captures the namespace tree with its metadata (names,
//! kinds, sizes, timestamps, permissions, owners) plus the working
//! directory and capacity. File content and block placement are
//! deliberately not persisted: a restored file reports its size but
//! owns no blocks until it is recreated, and the pool starts empty.

use crate::{FileSystem, Node, NodeId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use simfs_error::{Result, SimfsError};
use simfs_types::{FileCategory, NodeKind, Permissions};
use std::fs;
use std::path::Path;
use tracing::info;

/// One node in serialized form. Directories carry `children`; files
/// carry `file_type`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeSnapshot {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    pub size: u64,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
    pub permissions: Permissions,
    pub owner: String,
    #[serde(rename = "file_type", skip_serializing_if = "Option::is_none", default)]
    pub category: Option<FileCategory>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub children: Option<Vec<NodeSnapshot>>,
}

/// Serialized form of a whole [`FileSystem`] instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FsSnapshot {
    pub root: NodeSnapshot,
    pub current_path: Vec<String>,
    pub total_size: u64,
    pub used_size: u64,
}

impl FileSystem {
    // ── Capture ─────────────────────────────────────────────────────────

    /// Capture the current state. Content and blocks are dropped; see
    /// the module docs.
    #[must_use]
    pub fn snapshot(&self) -> FsSnapshot {
        FsSnapshot {
            root: self.snapshot_node(self.root_id()),
            current_path: self.current_path.clone(),
            total_size: self.capacity,
            used_size: self.used_size,
        }
    }

    fn snapshot_node(&self, id: NodeId) -> NodeSnapshot {
        let node = self.node(id);
        let children = if node.kind.is_directory() {
            Some(
                node.children
                    .iter()
                    .map(|&child| self.snapshot_node(child))
                    .collect(),
            )
        } else {
            None
        };
        NodeSnapshot {
            name: node.name.clone(),
            kind: node.kind,
            size: node.size,
            created: node.created,
            modified: node.modified,
            permissions: node.permissions.clone(),
            owner: node.owner.clone(),
            category: node.category,
            children,
        }
    }

    /// Pretty-printed JSON form of [`Self::snapshot`].
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.snapshot())
            .map_err(|err| SimfsError::Snapshot(err.to_string()))
    }

    // ── Restore ─────────────────────────────────────────────────────────

    /// Rebuild an instance from a snapshot.
    ///
    /// The arena is rebuilt from scratch and the block pool starts
    /// empty, so every restored file has an empty block list. The
    /// working directory is restored when it still resolves, and falls
    /// back to root otherwise.
    #[must_use]
    pub fn restore(snapshot: &FsSnapshot) -> Self {
        let mut fs = Self::bare(snapshot.total_size);
        {
            let root = fs.node_mut(fs.root);
            root.name = snapshot.root.name.clone();
            root.created = snapshot.root.created;
            root.modified = snapshot.root.modified;
            root.permissions = snapshot.root.permissions.clone();
            root.owner = snapshot.root.owner.clone();
        }
        if let Some(children) = &snapshot.root.children {
            for child in children {
                fs.restore_node(child, fs.root);
            }
        }
        fs.recompute_sizes();

        let path = format!("/{}", snapshot.current_path.join("/"));
        if fs.change_directory(&path).is_err() {
            fs.current_path.clear();
        }
        fs
    }

    fn restore_node(&mut self, snapshot: &NodeSnapshot, parent: NodeId) {
        let mut node = match snapshot.kind {
            NodeKind::Directory => Node::directory(&snapshot.name, Some(parent)),
            NodeKind::File => Node::file(&snapshot.name, parent),
        };
        node.size = if snapshot.kind == NodeKind::File {
            snapshot.size
        } else {
            0
        };
        node.created = snapshot.created;
        node.modified = snapshot.modified;
        node.permissions = snapshot.permissions.clone();
        node.owner = snapshot.owner.clone();
        node.category = snapshot.category;

        let id = self.insert_node(node);
        self.node_mut(parent).children.push(id);
        if let Some(children) = &snapshot.children {
            for child in children {
                self.restore_node(child, id);
            }
        }
    }

    /// Parse a snapshot produced by [`Self::to_json`] into a fresh
    /// instance.
    pub fn from_json(json: &str) -> Result<Self> {
        let snapshot: FsSnapshot =
            serde_json::from_str(json).map_err(|err| SimfsError::Snapshot(err.to_string()))?;
        Ok(Self::restore(&snapshot))
    }

    // ── File persistence ────────────────────────────────────────────────

    /// Write the snapshot JSON to `path`.
    pub fn save_state(&self, path: &Path) -> Result<String> {
        fs::write(path, self.to_json()?)?;
        info!(path = %path.display(), "state saved");
        Ok(format!("File system state saved to {}", path.display()))
    }

    /// Load an instance from a snapshot file written by
    /// [`Self::save_state`].
    pub fn load_state(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        let restored = Self::from_json(&json)?;
        info!(path = %path.display(), "state loaded");
        Ok(restored)
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use simfs_types::DEFAULT_CAPACITY;

    fn fs() -> FileSystem {
        FileSystem::with_capacity_and_seed(DEFAULT_CAPACITY, 3).unwrap()
    }

    #[test]
    fn round_trip_preserves_tree_and_metadata() {
        let mut fs = fs();
        fs.chmod("600", "readme.txt").unwrap();
        fs.chown("alice", "readme.txt").unwrap();
        let restored = FileSystem::restore(&fs.snapshot());

        let original_id = fs.resolve("/home/user/readme.txt").unwrap();
        let restored_id = restored.resolve("/home/user/readme.txt").unwrap();
        let original = fs.node(original_id);
        let copy = restored.node(restored_id);
        assert_eq!(copy.name, original.name);
        assert_eq!(copy.size, original.size);
        assert_eq!(copy.created, original.created);
        assert_eq!(copy.modified, original.modified);
        assert_eq!(copy.permissions, original.permissions);
        assert_eq!(copy.owner, "alice");
        assert_eq!(copy.category, original.category);

        assert_eq!(restored.pwd(), fs.pwd());
        assert_eq!(restored.capacity(), fs.capacity());
        assert_eq!(restored.used_size(), fs.used_size());
    }

    #[test]
    fn restore_drops_content_and_blocks() {
        let fs = fs();
        let restored = FileSystem::restore(&fs.snapshot());
        let id = restored.resolve("/home/user/readme.txt").unwrap();
        assert!(restored.node(id).content.is_none());
        assert!(!restored.node(id).has_blocks());
        assert_eq!(restored.pool().used_count(), 0);
    }

    #[test]
    fn json_round_trip() {
        let fs = fs();
        let json = fs.to_json().unwrap();
        assert!(json.contains("\"type\": \"directory\""));
        assert!(json.contains("\"file_type\": \"text\""));

        let restored = FileSystem::from_json(&json).unwrap();
        assert_eq!(restored.used_size(), fs.used_size());
        assert_eq!(restored.pwd(), "/home/user");
    }

    #[test]
    fn from_json_rejects_garbage() {
        let err = FileSystem::from_json("not json").unwrap_err();
        assert!(matches!(err, SimfsError::Snapshot(_)));
    }

    #[test]
    fn save_and_load_state_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        let fs = fs();
        let msg = fs.save_state(&path).unwrap();
        assert!(msg.starts_with("File system state saved to "));

        let restored = FileSystem::load_state(&path).unwrap();
        assert_eq!(restored.used_size(), fs.used_size());
        assert!(restored.resolve("/home/user/media/video.mp4").is_ok());
    }

    #[test]
    fn restore_falls_back_to_root_for_stale_working_dir() {
        let fs = fs();
        let mut snap = fs.snapshot();
        snap.current_path = vec!["no".to_owned(), "such".to_owned()];
        let restored = FileSystem::restore(&snap);
        assert_eq!(restored.pwd(), "/");
    }
}
