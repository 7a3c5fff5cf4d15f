//! Per-chunk terrain and resource generation.

use std::f64::consts::PI;

use regolith_rng::Lcg;
use regolith_voxel::{BlockId, ChunkId, ChunkState, VoxelCoord, WorldState};

/// Minimum terrain height in voxels.
pub const BASE_HEIGHT: usize = 2;
/// Maximum height variation above [`BASE_HEIGHT`].
pub const VARIATION: usize = 3;
/// Air layers above the tallest possible column (room to place blocks).
const EXTRA_HEADROOM: usize = 2;

/// Default voxels per chunk side.
pub const DEFAULT_CHUNK_SIZE: usize = 16;
/// Default vertical voxel count per chunk.
pub const DEFAULT_CHUNK_HEIGHT: usize = BASE_HEIGHT + VARIATION + EXTRA_HEADROOM;
/// Default streaming window radius (Chebyshev, in chunks).
pub const DEFAULT_CHUNK_RADIUS: i32 = 2;

/// A freshly generated chunk and where its resources ended up.
#[derive(Clone, Debug)]
pub struct GeneratedChunk {
    pub chunk: ChunkState,
    /// Local coordinates of every resource block placed.
    pub resources: Vec<VoxelCoord>,
}

/// Derives a chunk's RNG seed from the world seed and chunk coordinates.
///
/// Spatial-hash fold of the coordinates XORed into the world seed, so every
/// chunk is independently deterministic yet world-seed-dependent. The
/// multiplications wrap mod 2^32 (the historical save formats were produced
/// with 32-bit integer coercion, and chunk seeds must match them).
pub fn derive_chunk_seed(seed: u32, id: ChunkId) -> u32 {
    let hx = (i64::from(id.x) * 73_856_093) as u32;
    let hz = (i64::from(id.z) * 19_349_663) as u32;
    seed ^ (hx ^ hz)
}

/// Generates one chunk: ridged ground columns plus surface resource veins.
///
/// Every chunk is guaranteed at least one resource; if the random pass
/// places none, one is forced at the chunk's center column.
pub fn generate_chunk(seed: u32, id: ChunkId, size: usize, height: usize) -> GeneratedChunk {
    let mut rng = Lcg::new(derive_chunk_seed(seed, id));
    let mut chunk = ChunkState::new(id, size, height);
    let mut resources = Vec::new();

    for z in 0..size {
        for x in 0..size {
            let ridge = libm::sin(x as f64 / size as f64 * PI)
                + libm::cos(z as f64 / size as f64 * PI);
            let noise = rng.next_range(-1.0, 1.0);
            let raw = BASE_HEIGHT as f64
                + VARIATION as f64 * 0.3 * ridge
                + VARIATION as f64 * 0.5 * noise;
            let column = (raw.round() as i64).clamp(1, (BASE_HEIGHT + VARIATION) as i64) as usize;

            let limit = column.min(height);
            for y in 0..limit {
                let idx = chunk.index(x, y, z);
                chunk.blocks[idx] = BlockId::Ground;
            }

            if rng.next() > 0.6 {
                let y = (column - 1).min(height - 1);
                let idx = chunk.index(x, y, z);
                chunk.blocks[idx] = BlockId::Resource;
                resources.push(VoxelCoord::new(x, y, z));
            }
        }
    }

    if resources.is_empty() {
        let center = size / 2;
        let column = chunk.column_height(center, center).max(1);
        let y = (column - 1).min(height - 1);
        let idx = chunk.index(center, y, center);
        chunk.blocks[idx] = BlockId::Resource;
        resources.push(VoxelCoord::new(center, y, center));
    }

    GeneratedChunk { chunk, resources }
}

/// Creates a world with no chunks loaded yet.
pub fn create_empty_world(seed: u32, size: usize, height: usize) -> WorldState {
    WorldState {
        seed,
        chunk_size: size,
        chunk_height: height,
        chunks: Default::default(),
        visible_chunk_keys: Vec::new(),
        mesh_diffs: Vec::new(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
