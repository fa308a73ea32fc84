#![forbid(unsafe_code)]
//! SimFS simulation engine.
//!
//! An in-memory hierarchical filesystem with block-level allocation,
//! built for demonstrating filesystem internals behind an interactive
//! command surface. No real disk I/O happens anywhere: blocks, sizes,
//! permissions, and owners are simulated metadata.
//!
//! ## Design
//!
//! The engine is layered:
//!
//! 1. **Node arena** — nodes addressed by stable [`NodeId`] indices;
//!    parents are lookup keys, directories hold ordered child index
//!    vectors, so the owned tree carries no reference cycles.
//! 2. **Path resolver** — segment-by-segment walk handling `.`, `..`
//!    (clamped at root), and empty segments.
//! 3. **Usage accountant** — bottom-up recomputation of directory
//!    sizes after every structural mutation.
//! 4. **Command surface** (`commands` module) — `ls`, `cd`, `mkdir`,
//!    `touch`, `rm`, `cat`, `chmod`, `df`, `tree`, `find`, and the
//!    block inspection commands, all thin orchestration over 1–3 and
//!    the [`simfs_alloc::BlockPool`].
//!
//! A [`FileSystem`] is an explicitly owned simulation instance; the
//! [`session`] module keys independent instances by session id for
//! callers that serve multiple clients.

mod commands;
pub mod session;
pub mod snapshot;

pub use commands::FileBlocks;
pub use simfs_alloc::{Allocation, BlockPool, PoolReport};
pub use simfs_error::{Result, SimfsError};
pub use simfs_types::{
    format_size, AllocationStrategy, BlockIndex, FileCategory, NodeId, NodeKind, Permissions,
    BLOCK_SIZE, DEFAULT_CAPACITY, DEFAULT_OWNER,
};

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

/// Working directory every fresh or reset shell lands in.
pub const DEFAULT_WORKING_DIR: [&str; 2] = ["home", "user"];

// ── Node ────────────────────────────────────────────────────────────────────

/// A file or directory entry in the namespace tree.
///
/// Directory `size` is derived (sum of descendant file sizes) and only
/// meaningful after [`FileSystem::recompute_sizes`]; file `size` is
/// stored.
#[derive(Debug, Clone)]
pub struct Node {
    pub name: String,
    pub kind: NodeKind,
    pub size: u64,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
    pub permissions: Permissions,
    pub owner: String,
    /// Text payload; files only, and only when one was provided or
    /// generated.
    pub content: Option<String>,
    /// Derived from the filename extension; files only.
    pub category: Option<FileCategory>,
    /// Blocks owned by this file, in allocation order.
    pub blocks: Vec<BlockIndex>,
    /// Strategy the blocks were placed with, recorded at allocation.
    pub allocation: Option<AllocationStrategy>,
    /// First block of the run; contiguous allocations only.
    pub start_block: Option<BlockIndex>,
    /// Parent lookup key; `None` only for root.
    pub parent: Option<NodeId>,
    /// Ordered child ids; directories only.
    pub children: Vec<NodeId>,
}

impl Node {
    fn directory(name: &str, parent: Option<NodeId>) -> Self {
        let now = Utc::now();
        Self {
            name: name.to_owned(),
            kind: NodeKind::Directory,
            size: 0,
            created: now,
            modified: now,
            permissions: Permissions::default(),
            owner: DEFAULT_OWNER.to_owned(),
            content: None,
            category: None,
            blocks: Vec::new(),
            allocation: None,
            start_block: None,
            parent,
            children: Vec::new(),
        }
    }

    fn file(name: &str, parent: NodeId) -> Self {
        let now = Utc::now();
        Self {
            name: name.to_owned(),
            kind: NodeKind::File,
            size: 0,
            created: now,
            modified: now,
            permissions: Permissions::default(),
            owner: DEFAULT_OWNER.to_owned(),
            content: None,
            category: Some(FileCategory::from_name(name)),
            blocks: Vec::new(),
            allocation: None,
            start_block: None,
            parent: Some(parent),
            children: Vec::new(),
        }
    }

    /// Whether this file currently owns blocks.
    #[must_use]
    pub fn has_blocks(&self) -> bool {
        !self.blocks.is_empty()
    }
}

// ── FileSystem ──────────────────────────────────────────────────────────────

/// One simulated filesystem instance: namespace tree, block pool, and
/// working-directory state.
///
/// Every command is a complete, non-interruptible transaction; a
/// failed call leaves the instance exactly as it was.
#[derive(Debug)]
pub struct FileSystem {
    nodes: Vec<Option<Node>>,
    free_slots: Vec<NodeId>,
    root: NodeId,
    /// Segments from root to the working directory; empty means root.
    current_path: Vec<String>,
    capacity: u64,
    used_size: u64,
    pool: BlockPool,
    strategy: AllocationStrategy,
    size_rng: StdRng,
}

impl FileSystem {
    /// Create the default 100 MB simulation with the bootstrap layout
    /// (`/home/user` with sample files, `/etc`, `/var`, `/tmp`).
    pub fn new() -> Result<Self> {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a bootstrapped simulation with a custom capacity.
    ///
    /// Fails with `DiskFull` or an allocator error if the capacity
    /// cannot hold the bootstrap layout.
    pub fn with_capacity(capacity: u64) -> Result<Self> {
        let mut fs = Self::bare_parts(capacity, StdRng::from_entropy(), BlockPool::new(capacity));
        fs.bootstrap()?;
        Ok(fs)
    }

    /// Like [`Self::with_capacity`] but fully deterministic: both the
    /// synthetic-size RNG and the linked allocator draw from `seed`.
    pub fn with_capacity_and_seed(capacity: u64, seed: u64) -> Result<Self> {
        let mut fs = Self::bare_with_seed(capacity, seed);
        fs.bootstrap()?;
        Ok(fs)
    }

    /// An empty simulation: just root, no bootstrap layout.
    #[must_use]
    pub fn bare(capacity: u64) -> Self {
        Self::bare_parts(capacity, StdRng::from_entropy(), BlockPool::new(capacity))
    }

    /// An empty, deterministic simulation.
    #[must_use]
    pub fn bare_with_seed(capacity: u64, seed: u64) -> Self {
        Self::bare_parts(
            capacity,
            StdRng::seed_from_u64(seed),
            BlockPool::with_seed(capacity, seed.wrapping_add(1)),
        )
    }

    fn bare_parts(capacity: u64, size_rng: StdRng, pool: BlockPool) -> Self {
        let root = Node::directory("/", None);
        Self {
            nodes: vec![Some(root)],
            free_slots: Vec::new(),
            root: NodeId(0),
            current_path: Vec::new(),
            capacity,
            used_size: 0,
            pool,
            strategy: AllocationStrategy::Indexed,
            size_rng,
        }
    }

    /// Build the fixed bootstrap layout and land in `/home/user`.
    fn bootstrap(&mut self) -> Result<()> {
        self.mkdir("home")?;
        self.change_directory("home")?;
        self.mkdir("user")?;
        self.change_directory("user")?;

        self.touch_with(
            "readme.txt",
            None,
            Some("This is a sample readme file.\nWelcome to the file system simulator!"),
        )?;
        self.touch_with(
            "notes.md",
            None,
            Some("# My Notes\n\n- Important task 1\n- Important task 2"),
        )?;
        self.touch("photo.jpg")?;
        self.touch("screenshot.png")?;
        self.touch("document.pdf")?;
        self.touch("presentation.pptx")?;

        self.mkdir("documents")?;
        self.change_directory("documents")?;
        self.touch("report.docx")?;
        self.touch("spreadsheet.xlsx")?;
        self.change_directory("..")?;

        self.mkdir("media")?;
        self.change_directory("media")?;
        self.touch("video.mp4")?;
        self.touch("music.mp3")?;
        self.change_directory("..")?;

        self.change_directory("/")?;
        self.mkdir("etc")?;
        self.mkdir("var")?;
        self.mkdir("tmp")?;

        self.change_directory("")?;
        debug!(
            capacity = self.capacity,
            used = self.used_size,
            "bootstrap layout created"
        );
        Ok(())
    }

    // ── Accessors ───────────────────────────────────────────────────────

    #[must_use]
    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    #[must_use]
    pub fn used_size(&self) -> u64 {
        self.used_size
    }

    #[must_use]
    pub fn free_size(&self) -> u64 {
        self.capacity.saturating_sub(self.used_size)
    }

    #[must_use]
    pub fn root_id(&self) -> NodeId {
        self.root
    }

    #[must_use]
    pub fn allocation_strategy(&self) -> AllocationStrategy {
        self.strategy
    }

    #[must_use]
    pub fn pool(&self) -> &BlockPool {
        &self.pool
    }

    /// Borrow a node by id.
    ///
    /// Ids handed out by this instance stay valid until the node is
    /// removed; a stale id is a caller bug, not a recoverable error.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &Node {
        self.nodes[id.0].as_ref().expect("dangling node id")
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        self.nodes[id.0].as_mut().expect("dangling node id")
    }

    /// Id of a direct child of `dir` with the given name.
    #[must_use]
    pub fn child_by_name(&self, dir: NodeId, name: &str) -> Option<NodeId> {
        self.node(dir)
            .children
            .iter()
            .copied()
            .find(|&child| self.node(child).name == name)
    }

    /// Id of the working directory.
    ///
    /// Falls back to root if the stored path no longer resolves (e.g.
    /// after restoring a snapshot whose working directory was removed).
    #[must_use]
    pub fn current_dir(&self) -> NodeId {
        let mut id = self.root;
        for segment in &self.current_path {
            match self.child_by_name(id, segment) {
                Some(child) => id = child,
                None => return self.root,
            }
        }
        id
    }

    /// Absolute path of the working directory.
    ///
    /// Derived from [`Self::current_dir`], so when the stored path is
    /// stale and the lookup falls back to root, this reports `/` too.
    #[must_use]
    pub fn pwd(&self) -> String {
        self.absolute_path_of(self.current_dir())
    }

    /// Absolute path of any live node.
    #[must_use]
    pub fn absolute_path_of(&self, id: NodeId) -> String {
        let mut segments = Vec::new();
        let mut cursor = id;
        while let Some(parent) = self.node(cursor).parent {
            segments.push(self.node(cursor).name.clone());
            cursor = parent;
        }
        if segments.is_empty() {
            return "/".to_owned();
        }
        segments.reverse();
        format!("/{}", segments.join("/"))
    }

    fn segments_of(&self, id: NodeId) -> Vec<String> {
        let mut segments = Vec::new();
        let mut cursor = id;
        while let Some(parent) = self.node(cursor).parent {
            segments.push(self.node(cursor).name.clone());
            cursor = parent;
        }
        segments.reverse();
        segments
    }

    // ── Path resolver ───────────────────────────────────────────────────

    /// Resolve a path to a node id.
    ///
    /// Absolute paths walk from root, relative paths from the working
    /// directory. `.` is a no-op, `..` clamps at root, and empty
    /// segments from doubled separators are ignored. An intermediate
    /// file fails with `NotADirectory`; a missing child with
    /// `PathNotFound`.
    pub fn resolve(&self, path: &str) -> Result<NodeId> {
        let mut current = if path.starts_with('/') {
            self.root
        } else {
            self.current_dir()
        };

        for segment in path.split('/').filter(|s| !s.is_empty()) {
            match segment {
                "." => {}
                ".." => {
                    current = self.node(current).parent.unwrap_or(self.root);
                }
                name => {
                    if !self.node(current).kind.is_directory() {
                        return Err(SimfsError::NotADirectory(path.to_owned()));
                    }
                    current = self
                        .child_by_name(current, name)
                        .ok_or_else(|| SimfsError::PathNotFound(path.to_owned()))?;
                }
            }
        }
        Ok(current)
    }

    /// Change the working directory.
    ///
    /// An empty path resets to `/home/user`; `/` resets to root. The
    /// stored path is always the absolute decomposition of the target.
    pub fn change_directory(&mut self, path: &str) -> Result<()> {
        if path.is_empty() {
            self.current_path = DEFAULT_WORKING_DIR.iter().map(|s| (*s).to_owned()).collect();
            return Ok(());
        }
        if path == "/" {
            self.current_path.clear();
            return Ok(());
        }

        let target = self.resolve(path)?;
        if !self.node(target).kind.is_directory() {
            return Err(SimfsError::NotADirectory(path.to_owned()));
        }
        self.current_path = self.segments_of(target);
        Ok(())
    }

    // ── Usage accountant ────────────────────────────────────────────────

    /// Recompute every directory size bottom-up and refresh the
    /// aggregate usage. Returns the new used size (root's size).
    pub fn recompute_sizes(&mut self) -> u64 {
        let root = self.root;
        let total = self.recompute_subtree(root);
        self.used_size = total;
        total
    }

    fn recompute_subtree(&mut self, id: NodeId) -> u64 {
        if self.node(id).kind == NodeKind::File {
            return self.node(id).size;
        }
        let children = self.node(id).children.clone();
        let total = children
            .into_iter()
            .map(|child| self.recompute_subtree(child))
            .sum();
        self.node_mut(id).size = total;
        total
    }

    // ── Arena plumbing ──────────────────────────────────────────────────

    fn insert_node(&mut self, node: Node) -> NodeId {
        if let Some(id) = self.free_slots.pop() {
            self.nodes[id.0] = Some(node);
            id
        } else {
            self.nodes.push(Some(node));
            NodeId(self.nodes.len() - 1)
        }
    }

    /// Drop a detached subtree from the arena, recycling its slots.
    fn remove_subtree(&mut self, id: NodeId) {
        let children = self.node(id).children.clone();
        for child in children {
            self.remove_subtree(child);
        }
        self.nodes[id.0] = None;
        self.free_slots.push(id);
    }

    /// Return every block owned by files in the subtree to the pool.
    fn release_subtree_blocks(&mut self, id: NodeId) {
        if self.node(id).kind == NodeKind::File {
            let blocks = std::mem::take(&mut self.node_mut(id).blocks);
            self.pool.release(&blocks);
            self.node_mut(id).start_block = None;
            return;
        }
        let children = self.node(id).children.clone();
        for child in children {
            self.release_subtree_blocks(child);
        }
    }

    /// Synthetic size for a file created without explicit size or
    /// content, drawn from the category's range.
    fn default_size_for(&mut self, category: FileCategory) -> u64 {
        let (low, high) = category.default_size_range();
        self.size_rng.gen_range(low..=high)
    }

    pub(crate) fn now() -> DateTime<Utc> {
        Utc::now()
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
