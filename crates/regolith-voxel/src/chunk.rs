//! Chunk identity, block kinds, and per-chunk voxel storage.

use std::fmt;
use std::str::FromStr;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// The kinds of block a voxel cell can hold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockId {
    /// Empty cell.
    Air,
    /// Plain terrain.
    Ground,
    /// Minable resource vein.
    Resource,
}

impl BlockId {
    /// Anything that isn't air occludes and can be targeted.
    pub fn is_solid(self) -> bool {
        self != BlockId::Air
    }
}

/// Position of a chunk in the 2D chunk grid.
///
/// Serializes as its canonical key string `"x:z"`, which doubles as the map
/// key in the persisted world and as the entries of the visible-chunk list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkId {
    /// Chunk-grid X coordinate.
    pub x: i32,
    /// Chunk-grid Z coordinate.
    pub z: i32,
}

impl ChunkId {
    /// Creates a new chunk id.
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }
}

impl fmt::Display for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.x, self.z)
    }
}

/// Failure to parse a chunk key string.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("invalid chunk key: {0:?}")]
pub struct ParseChunkKeyError(String);

impl FromStr for ChunkId {
    type Err = ParseChunkKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseChunkKeyError(s.to_owned());
        let (xs, zs) = s.split_once(':').ok_or_else(err)?;
        let x = xs.parse().map_err(|_| err())?;
        let z = zs.parse().map_err(|_| err())?;
        Ok(Self { x, z })
    }
}

impl Serialize for ChunkId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ChunkId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let key = String::deserialize(deserializer)?;
        key.parse().map_err(D::Error::custom)
    }
}

/// Canonical string key for a chunk id.
pub fn chunk_key(id: ChunkId) -> String {
    id.to_string()
}

/// Parses a canonical chunk key back into its id.
pub fn parse_chunk_key(key: &str) -> Option<ChunkId> {
    key.parse().ok()
}

/// Local voxel coordinate within a chunk.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VoxelCoord {
    pub x: usize,
    pub y: usize,
    pub z: usize,
}

impl VoxelCoord {
    /// Creates a new local coordinate.
    pub const fn new(x: usize, y: usize, z: usize) -> Self {
        Self { x, y, z }
    }
}

/// Voxel storage for one chunk: a flat block array plus a remesh flag.
///
/// Blocks are indexed `y * size * size + z * size + x`; the array length is
/// always `size * size * height`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChunkState {
    /// Position of this chunk in the chunk grid.
    pub id: ChunkId,
    /// Voxels per horizontal side.
    pub size: usize,
    /// Vertical voxel count.
    pub height: usize,
    /// Flat block array of length `size * size * height`.
    pub blocks: Vec<BlockId>,
    /// True when the renderer needs to rebuild this chunk's mesh.
    pub dirty: bool,
}

impl ChunkState {
    /// Creates an all-air chunk of the given dimensions.
    pub fn new(id: ChunkId, size: usize, height: usize) -> Self {
        Self {
            id,
            size,
            height,
            blocks: vec![BlockId::Air; size * size * height],
            dirty: false,
        }
    }

    /// Flat index of a local `(x, y, z)` coordinate.
    ///
    /// The coordinate must be in bounds.
    pub fn index(&self, x: usize, y: usize, z: usize) -> usize {
        y * self.size * self.size + z * self.size + x
    }

    /// Whether the coordinate lies inside this chunk.
    pub fn contains(&self, coord: VoxelCoord) -> bool {
        coord.x < self.size && coord.z < self.size && coord.y < self.height
    }

    /// Block at the coordinate, or `None` when out of bounds.
    pub fn block(&self, coord: VoxelCoord) -> Option<BlockId> {
        if !self.contains(coord) {
            return None;
        }
        Some(self.blocks[self.index(coord.x, coord.y, coord.z)])
    }

    /// Copy-on-write block update.
    ///
    /// Returns the updated chunk with `dirty` set, or `None` when the
    /// coordinate is out of bounds or the block value is unchanged.
    pub fn with_block(&self, coord: VoxelCoord, block: BlockId) -> Option<ChunkState> {
        if !self.contains(coord) {
            return None;
        }
        let idx = self.index(coord.x, coord.y, coord.z);
        if self.blocks[idx] == block {
            return None;
        }
        let mut next = self.clone();
        next.blocks[idx] = block;
        next.dirty = true;
        Some(next)
    }

    /// Height of the solid column at `(x, z)`: one above the topmost solid
    /// block, or 0 for an empty or out-of-bounds column.
    pub fn column_height(&self, x: usize, z: usize) -> usize {
        if x >= self.size || z >= self.size {
            return 0;
        }
        for y in (0..self.height).rev() {
            if self.blocks[self.index(x, y, z)].is_solid() {
                return y + 1;
            }
        }
        0
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_key_round_trip() {
        for x in [-129, -1, 0, 1, 37, i32::MAX] {
            for z in [-5, 0, 12, i32::MIN] {
                let id = ChunkId::new(x, z);
                assert_eq!(parse_chunk_key(&chunk_key(id)), Some(id));
            }
        }
    }

    #[test]
    fn test_parse_chunk_key_rejects_garbage() {
        assert_eq!(parse_chunk_key(""), None);
        assert_eq!(parse_chunk_key("1"), None);
        assert_eq!(parse_chunk_key("a:b"), None);
        assert_eq!(parse_chunk_key("1:2:3"), None);
    }

    #[test]
    fn test_chunk_id_serde_as_key_string() {
        let id = ChunkId::new(-3, 7);
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"-3:7\"");
        let back: ChunkId = serde_json::from_str("\"-3:7\"").unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_new_chunk_is_air_with_exact_length() {
        let chunk = ChunkState::new(ChunkId::new(0, 0), 4, 3);
        assert_eq!(chunk.blocks.len(), 4 * 4 * 3);
        assert!(chunk.blocks.iter().all(|b| *b == BlockId::Air));
        assert!(!chunk.dirty);
    }

    #[test]
    fn test_block_out_of_bounds_is_none() {
        let chunk = ChunkState::new(ChunkId::new(0, 0), 4, 3);
        assert_eq!(chunk.block(VoxelCoord::new(4, 0, 0)), None);
        assert_eq!(chunk.block(VoxelCoord::new(0, 3, 0)), None);
        assert_eq!(chunk.block(VoxelCoord::new(0, 0, 0)), Some(BlockId::Air));
    }

    #[test]
    fn test_with_block_sets_dirty_and_skips_no_ops() {
        let chunk = ChunkState::new(ChunkId::new(0, 0), 4, 3);
        let coord = VoxelCoord::new(1, 1, 1);
        // Unchanged value is a no-op.
        assert!(chunk.with_block(coord, BlockId::Air).is_none());
        let updated = chunk.with_block(coord, BlockId::Ground).unwrap();
        assert!(updated.dirty);
        assert_eq!(updated.block(coord), Some(BlockId::Ground));
        // Original untouched.
        assert_eq!(chunk.block(coord), Some(BlockId::Air));
    }

    #[test]
    fn test_column_height() {
        let mut chunk = ChunkState::new(ChunkId::new(0, 0), 4, 5);
        let idx0 = chunk.index(2, 0, 2);
        let idx1 = chunk.index(2, 1, 2);
        chunk.blocks[idx0] = BlockId::Ground;
        chunk.blocks[idx1] = BlockId::Resource;
        assert_eq!(chunk.column_height(2, 2), 2);
        assert_eq!(chunk.column_height(0, 0), 0);
        assert_eq!(chunk.column_height(9, 0), 0);
    }
}
