//! Chunk streaming: keeping a square window of chunks loaded around a focus
//! position, generating on entry and queuing remove diffs on exit.

use rustc_hash::FxHashSet;

use regolith_math::Vec3;
use regolith_voxel::{
    ChunkId, ChunkMeshDiff, MeshDiffKind, VoxelCoord, WorldState, push_mesh_diff,
};

use crate::generator::{create_empty_world, generate_chunk};

/// Outcome of a streaming pass.
///
/// `changed` is false when the window, chunk set, and diff queue all came
/// back untouched; callers use it to skip downstream work.
#[derive(Debug)]
pub struct StreamingUpdate {
    pub world: WorldState,
    pub changed: bool,
}

/// The chunk containing a world-space position.
fn chunk_id_from_position(chunk_size: usize, position: Vec3) -> ChunkId {
    let size = chunk_size as f32;
    let half = size / 2.0;
    ChunkId::new(
        ((position.x + half) / size).floor() as i32,
        ((position.z + half) / size).floor() as i32,
    )
}

/// All chunk ids within `radius` (Chebyshev) of `center`, in row order.
fn window_chunk_ids(center: ChunkId, radius: i32) -> Vec<ChunkId> {
    let mut ids = Vec::with_capacity(((2 * radius + 1) * (2 * radius + 1)) as usize);
    for z in center.z - radius..=center.z + radius {
        for x in center.x - radius..=center.x + radius {
            ids.push(ChunkId::new(x, z));
        }
    }
    ids
}

/// Brings the streaming window around `position` up to date.
///
/// Generates any missing chunk in the window, queues rebuild diffs for newly
/// generated or newly re-visible chunks, queues remove diffs for chunks that
/// left the window, and replaces the visible-key list. Chunks that leave the
/// window stay in the chunk map as a cache; only their meshes are dropped.
pub fn ensure_chunks_for_position(
    mut world: WorldState,
    seed: u32,
    position: Vec3,
    radius: i32,
) -> StreamingUpdate {
    let center = chunk_id_from_position(world.chunk_size, position);
    let needed = window_chunk_ids(center, radius);
    let needed_set: FxHashSet<ChunkId> = needed.iter().copied().collect();
    let previous_visible: FxHashSet<ChunkId> = world.visible_chunk_keys.iter().copied().collect();

    let mut changed = false;

    for id in &needed {
        if !world.chunks.contains_key(id) {
            let generated = generate_chunk(seed, *id, world.chunk_size, world.chunk_height);
            log::debug!(
                "generated chunk {id} ({} resources)",
                generated.resources.len()
            );
            world.chunks.insert(*id, generated.chunk);
            push_mesh_diff(
                &mut world.mesh_diffs,
                ChunkMeshDiff {
                    chunk_id: *id,
                    kind: MeshDiffKind::Rebuild,
                },
            );
            changed = true;
        } else if !previous_visible.contains(id) {
            // Cached chunk re-entering the window: the renderer dropped its
            // mesh on the way out and needs a rebuild.
            let before = world.mesh_diffs.len();
            push_mesh_diff(
                &mut world.mesh_diffs,
                ChunkMeshDiff {
                    chunk_id: *id,
                    kind: MeshDiffKind::Rebuild,
                },
            );
            changed |= world.mesh_diffs.len() != before;
        }
    }

    for id in &world.visible_chunk_keys {
        if !needed_set.contains(id) {
            push_mesh_diff(
                &mut world.mesh_diffs,
                ChunkMeshDiff {
                    chunk_id: *id,
                    kind: MeshDiffKind::Remove,
                },
            );
            changed = true;
        }
    }

    if world.visible_chunk_keys != needed {
        world.visible_chunk_keys = needed;
        changed = true;
    }

    StreamingUpdate { world, changed }
}

/// An eagerly generated world plus each chunk's resource coordinates.
#[derive(Debug)]
pub struct GeneratedWorld {
    pub world: WorldState,
    /// Resource voxels per visible chunk, in window order.
    pub resources: Vec<(ChunkId, Vec<VoxelCoord>)>,
}

/// Builds every chunk in a window of `radius` around the origin, eagerly.
///
/// The per-chunk resource lists are used for initial drone placement.
pub fn generate_world(seed: u32, radius: i32, size: usize, height: usize) -> GeneratedWorld {
    let base = create_empty_world(seed, size, height);
    let update = ensure_chunks_for_position(base, seed, Vec3::ZERO, radius);
    let world = update.world;

    let mut resources = Vec::new();
    for id in &world.visible_chunk_keys {
        let Some(chunk) = world.chunks.get(id) else {
            continue;
        };
        let mut coords = Vec::new();
        for z in 0..chunk.size {
            for y in 0..chunk.height {
                for x in 0..chunk.size {
                    if chunk.blocks[chunk.index(x, y, z)] == regolith_voxel::BlockId::Resource {
                        coords.push(VoxelCoord::new(x, y, z));
                    }
                }
            }
        }
        if !coords.is_empty() {
            resources.push((*id, coords));
        }
    }

    GeneratedWorld { world, resources }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
