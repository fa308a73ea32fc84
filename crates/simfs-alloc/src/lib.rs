#![forbid(unsafe_code)]
//! Block allocation for the simulated disk.
//!
//! [`BlockPool`] tracks a fixed pool of 4 KiB blocks and implements
//! three interchangeable placement schemes:
//!
//! 1. **Contiguous** — best-fit over maximal free runs: among runs at
//!    least as long as the request, the shortest one wins, so large
//!    runs stay intact for future large files.
//! 2. **Linked** — blocks drawn uniformly at random from the free set;
//!    the returned order is allocation order, not ascending, by design.
//! 3. **Indexed** — the lowest-numbered free blocks, deterministic.
//!
//! The free and used `BTreeSet`s are the source of truth; the per-block
//! occupancy bitmap is derived on demand rather than stored, so it can
//! never drift. Every allocation is atomic with respect to the call:
//! feasibility is decided before the first block is moved, and a
//! failed call leaves the pool untouched.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use simfs_error::{Result, SimfsError};
use simfs_types::{blocks_needed, AllocationStrategy, BlockIndex, NodeId, BLOCK_SIZE};
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, trace};

// ── Allocation result ───────────────────────────────────────────────────────

/// Blocks handed to one file by a single [`BlockPool::allocate`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocation {
    /// Owned block indices in allocation order.
    pub blocks: Vec<BlockIndex>,
    /// Strategy that produced this allocation.
    pub strategy: AllocationStrategy,
    /// First block of the run; contiguous allocations only.
    pub start_block: Option<BlockIndex>,
}

/// Pool occupancy summary, including the derived bitmap.
#[derive(Debug, Clone, Serialize)]
pub struct PoolReport {
    pub total_blocks: u64,
    pub used_blocks: u64,
    pub free_blocks: u64,
    pub block_size: u64,
    pub fragmentation_index: u8,
    pub bitmap: Vec<bool>,
}

// ── Block pool ──────────────────────────────────────────────────────────────

/// Fixed-size pool of simulated blocks with ownership tracking.
#[derive(Debug)]
pub struct BlockPool {
    total_blocks: u64,
    free: BTreeSet<BlockIndex>,
    used: BTreeSet<BlockIndex>,
    owners: HashMap<BlockIndex, NodeId>,
    rng: StdRng,
}

impl BlockPool {
    /// Create a pool covering `capacity_bytes` of simulated disk,
    /// rounded up to whole blocks. All blocks start free.
    #[must_use]
    pub fn new(capacity_bytes: u64) -> Self {
        Self::with_rng(capacity_bytes, StdRng::from_entropy())
    }

    /// Create a pool with a deterministic RNG for the linked strategy.
    #[must_use]
    pub fn with_seed(capacity_bytes: u64, seed: u64) -> Self {
        Self::with_rng(capacity_bytes, StdRng::seed_from_u64(seed))
    }

    fn with_rng(capacity_bytes: u64, rng: StdRng) -> Self {
        let total_blocks = capacity_bytes.div_ceil(BLOCK_SIZE);
        Self {
            total_blocks,
            free: (0..total_blocks).map(BlockIndex).collect(),
            used: BTreeSet::new(),
            owners: HashMap::new(),
            rng,
        }
    }

    #[must_use]
    pub fn total_blocks(&self) -> u64 {
        self.total_blocks
    }

    #[must_use]
    pub fn free_count(&self) -> u64 {
        self.free.len() as u64
    }

    #[must_use]
    pub fn used_count(&self) -> u64 {
        self.used.len() as u64
    }

    /// Owning file of a block, if the block is allocated.
    #[must_use]
    pub fn owner_of(&self, block: BlockIndex) -> Option<NodeId> {
        self.owners.get(&block).copied()
    }

    /// Per-block occupancy view, derived from the used set.
    #[must_use]
    #[expect(clippy::cast_possible_truncation)]
    pub fn bitmap(&self) -> Vec<bool> {
        let mut map = vec![false; self.total_blocks as usize];
        for block in &self.used {
            map[block.0 as usize] = true;
        }
        map
    }

    // ── Allocation ──────────────────────────────────────────────────────

    /// Allocate blocks backing `bytes` of payload for `owner`.
    ///
    /// The number of blocks is `ceil(bytes / BLOCK_SIZE)`, minimum one.
    /// On failure the pool is unchanged.
    pub fn allocate(
        &mut self,
        owner: NodeId,
        bytes: u64,
        strategy: AllocationStrategy,
    ) -> Result<Allocation> {
        let needed = blocks_needed(bytes);
        trace!(%owner, bytes, needed, %strategy, "allocating blocks");

        let allocation = match strategy {
            AllocationStrategy::Contiguous => self.allocate_contiguous(needed)?,
            AllocationStrategy::Linked => self.allocate_linked(needed)?,
            AllocationStrategy::Indexed => self.allocate_indexed(needed)?,
        };

        for &block in &allocation.blocks {
            self.free.remove(&block);
            self.used.insert(block);
            self.owners.insert(block, owner);
        }
        debug_assert!(self.is_consistent());

        debug!(
            %owner,
            %strategy,
            count = allocation.blocks.len(),
            start = ?allocation.start_block,
            "blocks allocated"
        );
        Ok(allocation)
    }

    /// Best-fit over maximal free runs: shortest qualifying run wins,
    /// earliest start breaks ties. Fails with
    /// `InsufficientContiguousSpace` even when enough blocks exist in
    /// aggregate.
    fn allocate_contiguous(&self, needed: u64) -> Result<Allocation> {
        let mut best: Option<(u64, u64)> = None; // (start, len)
        for (start, len) in self.free_runs() {
            if len >= needed && best.is_none_or(|(_, best_len)| len < best_len) {
                best = Some((start, len));
            }
        }

        let Some((start, _)) = best else {
            return Err(SimfsError::InsufficientContiguousSpace {
                requested: needed.saturating_mul(BLOCK_SIZE),
            });
        };

        Ok(Allocation {
            blocks: (start..start + needed).map(BlockIndex).collect(),
            strategy: AllocationStrategy::Contiguous,
            start_block: Some(BlockIndex(start)),
        })
    }

    /// Uniformly random picks from the free set, one block at a time.
    fn allocate_linked(&mut self, needed: u64) -> Result<Allocation> {
        if self.free_count() < needed {
            return Err(SimfsError::InsufficientSpace {
                requested: needed.saturating_mul(BLOCK_SIZE),
            });
        }

        // Picks are removed from a scratch set so a pool mutation only
        // happens after the whole request is satisfiable (it is, by the
        // count check, but this keeps the selection uniform without
        // replacement).
        let mut remaining: BTreeSet<BlockIndex> = self.free.clone();
        let mut blocks = Vec::with_capacity(usize::try_from(needed).unwrap_or(usize::MAX));
        for _ in 0..needed {
            let pick = self.rng.gen_range(0..remaining.len());
            let block = *remaining
                .iter()
                .nth(pick)
                .ok_or(SimfsError::InsufficientSpace {
                    requested: needed.saturating_mul(BLOCK_SIZE),
                })?;
            remaining.remove(&block);
            blocks.push(block);
        }

        Ok(Allocation {
            blocks,
            strategy: AllocationStrategy::Linked,
            start_block: None,
        })
    }

    /// First `needed` free blocks in ascending numeric order.
    fn allocate_indexed(&self, needed: u64) -> Result<Allocation> {
        if self.free_count() < needed {
            return Err(SimfsError::InsufficientSpace {
                requested: needed.saturating_mul(BLOCK_SIZE),
            });
        }

        let blocks: Vec<BlockIndex> = self
            .free
            .iter()
            .take(usize::try_from(needed).unwrap_or(usize::MAX))
            .copied()
            .collect();

        Ok(Allocation {
            blocks,
            strategy: AllocationStrategy::Indexed,
            start_block: None,
        })
    }

    /// Return every listed block to the free set and clear its owner
    /// entry. Blocks not currently used are ignored.
    pub fn release(&mut self, blocks: &[BlockIndex]) {
        for &block in blocks {
            if self.used.remove(&block) {
                self.free.insert(block);
                self.owners.remove(&block);
            }
        }
        debug_assert!(self.is_consistent());
        debug!(count = blocks.len(), "blocks released");
    }

    // ── Diagnostics ─────────────────────────────────────────────────────

    /// Fragmentation score in 0..=100.
    ///
    /// `runs` counts maximal contiguous runs of used blocks; the score
    /// scales `runs - 1` against the worst case
    /// `min(|used|, |free| + 1) - 1`.
    #[must_use]
    #[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn fragmentation_index(&self) -> u8 {
        let used = self.used.len() as u64;
        if used == 0 {
            return 0;
        }
        let max_possible_runs = used.min(self.free.len() as u64 + 1);
        if max_possible_runs <= 1 {
            return 0;
        }

        let runs = self.used_run_count();
        let score = ((runs - 1) as f64 / (max_possible_runs - 1) as f64) * 100.0;
        score.round() as u8
    }

    /// Full occupancy report including the derived bitmap.
    #[must_use]
    pub fn report(&self) -> PoolReport {
        PoolReport {
            total_blocks: self.total_blocks,
            used_blocks: self.used_count(),
            free_blocks: self.free_count(),
            block_size: BLOCK_SIZE,
            fragmentation_index: self.fragmentation_index(),
            bitmap: self.bitmap(),
        }
    }

    /// Invariant check: free and used partition `[0, total_blocks)`,
    /// and the owner map covers exactly the used set.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.free.len() + self.used.len() == self.total_blocks as usize
            && self.free.intersection(&self.used).next().is_none()
            && self.owners.len() == self.used.len()
            && self.used.iter().all(|b| self.owners.contains_key(b))
    }

    /// Maximal runs of free blocks as `(start, len)` pairs.
    fn free_runs(&self) -> Vec<(u64, u64)> {
        let mut runs = Vec::new();
        let mut current: Option<(u64, u64)> = None;
        for block in &self.free {
            current = match current {
                Some((start, len)) if start + len == block.0 => Some((start, len + 1)),
                Some(run) => {
                    runs.push(run);
                    Some((block.0, 1))
                }
                None => Some((block.0, 1)),
            };
        }
        if let Some(run) = current {
            runs.push(run);
        }
        runs
    }

    /// Number of maximal runs of used blocks.
    fn used_run_count(&self) -> u64 {
        let mut runs = 0u64;
        let mut prev: Option<u64> = None;
        for block in &self.used {
            if prev != Some(block.0.wrapping_sub(1)) {
                runs += 1;
            }
            prev = Some(block.0);
        }
        runs
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
