//! World aggregate: the chunk map, mutation operations, coordinate mapping,
//! and the mesh-diff queue consumed by the external renderer.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use regolith_math::Vec3;

use crate::chunk::{BlockId, ChunkId, ChunkState, VoxelCoord};

/// What the renderer should do with a chunk's mesh.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeshDiffKind {
    /// (Re)build the chunk mesh.
    Rebuild,
    /// Drop the chunk mesh.
    Remove,
}

/// Pending instruction for the renderer, drained once per tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkMeshDiff {
    /// Affected chunk.
    pub chunk_id: ChunkId,
    /// Rebuild or remove.
    #[serde(rename = "type")]
    pub kind: MeshDiffKind,
}

/// A voxel addressed by its owning chunk plus local coordinate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldVoxel {
    pub chunk: ChunkId,
    pub voxel: VoxelCoord,
}

/// The chunked voxel world.
///
/// `visible_chunk_keys` lists the chunks inside the current streaming window;
/// every entry has a corresponding chunk in `chunks`. Chunks may linger in
/// `chunks` after leaving the window as a generation cache.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorldState {
    /// World generation seed (immutable for the world's lifetime).
    pub seed: u32,
    /// Voxels per chunk side.
    pub chunk_size: usize,
    /// Vertical voxel count per chunk.
    pub chunk_height: usize,
    /// All loaded chunks, keyed by chunk id.
    pub chunks: FxHashMap<ChunkId, ChunkState>,
    /// Chunk ids inside the streaming window, in window order.
    pub visible_chunk_keys: Vec<ChunkId>,
    /// Pending renderer instructions, deduplicated per (chunk, kind).
    pub mesh_diffs: Vec<ChunkMeshDiff>,
}

/// Appends a mesh diff unless an identical one is already pending.
pub fn push_mesh_diff(diffs: &mut Vec<ChunkMeshDiff>, diff: ChunkMeshDiff) {
    if !diffs.contains(&diff) {
        diffs.push(diff);
    }
}

/// Sets a block in the world, returning the updated world.
///
/// No-op (the world comes back unchanged) when the chunk is unloaded, the
/// voxel is out of bounds, or the block value is already `block`. A
/// successful write marks the chunk dirty and queues a rebuild diff.
pub fn set_block_in_world(
    mut world: WorldState,
    chunk_id: ChunkId,
    coord: VoxelCoord,
    block: BlockId,
) -> WorldState {
    let Some(chunk) = world.chunks.get(&chunk_id) else {
        log::debug!("set_block_in_world: chunk {chunk_id} not loaded");
        return world;
    };
    let Some(updated) = chunk.with_block(coord, block) else {
        return world;
    };
    world.chunks.insert(chunk_id, updated);
    push_mesh_diff(
        &mut world.mesh_diffs,
        ChunkMeshDiff {
            chunk_id,
            kind: MeshDiffKind::Rebuild,
        },
    );
    world
}

/// Consumes a mined resource voxel.
///
/// Mining the surface skin of a height-1 column exposes the dirt beneath
/// (cell becomes ground); mining a vein on a taller column leaves a void
/// (cell becomes air). No-op unless the cell currently holds a resource.
pub fn mark_resource_depleted(
    world: WorldState,
    chunk_id: ChunkId,
    coord: VoxelCoord,
) -> WorldState {
    let Some(chunk) = world.chunks.get(&chunk_id) else {
        return world;
    };
    if chunk.block(coord) != Some(BlockId::Resource) {
        return world;
    }
    let replacement = if chunk.column_height(coord.x, coord.z) > 1 {
        BlockId::Air
    } else {
        BlockId::Ground
    };
    set_block_in_world(world, chunk_id, coord, replacement)
}

/// World-space center of a voxel cell.
///
/// Each chunk is centered horizontally on its grid origin, and each voxel is
/// centered on its cell (+0.5 on every axis that has extent).
pub fn voxel_to_world(chunk: &ChunkState, coord: VoxelCoord) -> Vec3 {
    let half = chunk.size as f32 / 2.0;
    let offset_x = (chunk.id.x * chunk.size as i32) as f32;
    let offset_z = (chunk.id.z * chunk.size as i32) as f32;
    Vec3::new(
        coord.x as f32 - half + 0.5 + offset_x,
        coord.y as f32 + 0.5,
        coord.z as f32 - half + 0.5 + offset_z,
    )
}

/// Resolves a world-space position to the chunk + local voxel containing it.
///
/// Returns `None` when the chunk is not loaded or the position falls outside
/// the chunk's vertical range.
pub fn world_to_voxel(world: &WorldState, position: Vec3) -> Option<WorldVoxel> {
    let size = world.chunk_size as f32;
    let half = size / 2.0;
    let chunk_x = ((position.x + half) / size).floor() as i32;
    let chunk_z = ((position.z + half) / size).floor() as i32;
    let local_x = (position.x - chunk_x as f32 * size + half).floor() as i64;
    let local_z = (position.z - chunk_z as f32 * size + half).floor() as i64;
    let local_y = position.y.floor() as i64;
    let id = ChunkId::new(chunk_x, chunk_z);
    let chunk = world.chunks.get(&id)?;
    if local_x < 0 || local_x >= chunk.size as i64 || local_z < 0 || local_z >= chunk.size as i64 {
        return None;
    }
    if local_y < 0 || local_y >= chunk.height as i64 {
        return None;
    }
    Some(WorldVoxel {
        chunk: id,
        voxel: VoxelCoord::new(local_x as usize, local_y as usize, local_z as usize),
    })
}

/// Resolves a global voxel-grid coordinate (the raycast grid) to its chunk +
/// local voxel. `None` when the chunk is unloaded or `gy` is out of range.
pub fn voxel_at_global(world: &WorldState, gx: i64, gy: i64, gz: i64) -> Option<WorldVoxel> {
    let size = world.chunk_size as i64;
    let chunk_x = gx.div_euclid(size);
    let chunk_z = gz.div_euclid(size);
    let local_x = gx.rem_euclid(size);
    let local_z = gz.rem_euclid(size);
    let id = ChunkId::new(chunk_x as i32, chunk_z as i32);
    let chunk = world.chunks.get(&id)?;
    if gy < 0 || gy >= chunk.height as i64 {
        return None;
    }
    Some(WorldVoxel {
        chunk: id,
        voxel: VoxelCoord::new(local_x as usize, gy as usize, local_z as usize),
    })
}

/// Terrain height (top of the solid column) at a world-space XZ position.
///
/// Returns 0 over unloaded chunks.
pub fn sample_height_at_world(world: &WorldState, wx: f32, wz: f32) -> f32 {
    let Some(addr) = world_to_voxel(world, Vec3::new(wx, 0.0, wz)) else {
        return 0.0;
    };
    let Some(chunk) = world.chunks.get(&addr.chunk) else {
        return 0.0;
    };
    chunk.column_height(addr.voxel.x, addr.voxel.z) as f32
}

/// Every resource voxel in every loaded chunk.
///
/// Chunks are visited in sorted id order and voxels in z/y/x order, so the
/// result (and every "ties broken by scan order" consumer) is reproducible.
pub fn list_active_resources(world: &WorldState) -> Vec<WorldVoxel> {
    let mut ids: Vec<ChunkId> = world.chunks.keys().copied().collect();
    ids.sort();
    let mut results = Vec::new();
    for id in ids {
        let chunk = &world.chunks[&id];
        for z in 0..chunk.size {
            for y in 0..chunk.height {
                for x in 0..chunk.size {
                    if chunk.blocks[chunk.index(x, y, z)] == BlockId::Resource {
                        results.push(WorldVoxel {
                            chunk: id,
                            voxel: VoxelCoord::new(x, y, z),
                        });
                    }
                }
            }
        }
    }
    results
}

/// Renderer acknowledgement: atomically clears the mesh-diff queue and every
/// chunk's dirty flag. Called exactly once after the renderer drains diffs.
pub fn acknowledge_mesh_diffs(mut world: WorldState) -> WorldState {
    world.mesh_diffs.clear();
    for chunk in world.chunks.values_mut() {
        chunk.dirty = false;
    }
    world
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn test_world(size: usize, height: usize) -> WorldState {
        let mut chunks = FxHashMap::default();
        let id = ChunkId::new(0, 0);
        chunks.insert(id, ChunkState::new(id, size, height));
        WorldState {
            seed: 1,
            chunk_size: size,
            chunk_height: height,
            chunks,
            visible_chunk_keys: vec![id],
            mesh_diffs: Vec::new(),
        }
    }

    fn place(world: WorldState, x: usize, y: usize, z: usize, block: BlockId) -> WorldState {
        set_block_in_world(world, ChunkId::new(0, 0), VoxelCoord::new(x, y, z), block)
    }

    #[test]
    fn test_set_block_queues_one_rebuild_diff() {
        let world = test_world(4, 4);
        let world = place(world, 1, 0, 1, BlockId::Ground);
        let world = place(world, 2, 0, 2, BlockId::Ground);
        assert_eq!(world.mesh_diffs.len(), 1);
        assert_eq!(world.mesh_diffs[0].kind, MeshDiffKind::Rebuild);
        assert!(world.chunks[&ChunkId::new(0, 0)].dirty);
    }

    #[test]
    fn test_set_block_no_op_on_unloaded_chunk() {
        let world = test_world(4, 4);
        let before = world.clone();
        let after = set_block_in_world(
            world,
            ChunkId::new(9, 9),
            VoxelCoord::new(0, 0, 0),
            BlockId::Ground,
        );
        assert_eq!(after, before);
    }

    #[test]
    fn test_depletion_on_short_column_becomes_ground() {
        let world = test_world(4, 4);
        let world = place(world, 1, 0, 1, BlockId::Resource);
        let world = mark_resource_depleted(world, ChunkId::new(0, 0), VoxelCoord::new(1, 0, 1));
        let chunk = &world.chunks[&ChunkId::new(0, 0)];
        assert_eq!(chunk.block(VoxelCoord::new(1, 0, 1)), Some(BlockId::Ground));
    }

    #[test]
    fn test_depletion_on_tall_column_becomes_air() {
        let world = test_world(4, 4);
        let world = place(world, 1, 0, 1, BlockId::Ground);
        let world = place(world, 1, 1, 1, BlockId::Resource);
        let world = mark_resource_depleted(world, ChunkId::new(0, 0), VoxelCoord::new(1, 1, 1));
        let chunk = &world.chunks[&ChunkId::new(0, 0)];
        assert_eq!(chunk.block(VoxelCoord::new(1, 1, 1)), Some(BlockId::Air));
    }

    #[test]
    fn test_depletion_ignores_non_resource() {
        let world = test_world(4, 4);
        let world = place(world, 1, 0, 1, BlockId::Ground);
        let before = world.clone();
        let after = mark_resource_depleted(world, ChunkId::new(0, 0), VoxelCoord::new(1, 0, 1));
        assert_eq!(after, before);
    }

    #[test]
    fn test_voxel_world_round_trip() {
        let world = test_world(16, 7);
        let chunk = &world.chunks[&ChunkId::new(0, 0)];
        let coord = VoxelCoord::new(3, 2, 11);
        let pos = voxel_to_world(chunk, coord);
        let back = world_to_voxel(&world, pos).unwrap();
        assert_eq!(back.chunk, ChunkId::new(0, 0));
        assert_eq!(back.voxel, coord);
    }

    #[test]
    fn test_world_to_voxel_unloaded_chunk_is_none() {
        let world = test_world(16, 7);
        assert!(world_to_voxel(&world, Vec3::new(100.0, 1.0, 0.0)).is_none());
    }

    #[test]
    fn test_world_to_voxel_above_chunk_is_none() {
        let world = test_world(16, 7);
        assert!(world_to_voxel(&world, Vec3::new(0.0, 7.5, 0.0)).is_none());
    }

    #[test]
    fn test_list_active_resources_finds_all() {
        let world = test_world(4, 4);
        let world = place(world, 0, 0, 0, BlockId::Resource);
        let world = place(world, 3, 2, 1, BlockId::Resource);
        let world = place(world, 2, 0, 2, BlockId::Ground);
        let found = list_active_resources(&world);
        assert_eq!(found.len(), 2);
        assert!(
            found
                .iter()
                .any(|r| r.voxel == VoxelCoord::new(0, 0, 0))
        );
        assert!(
            found
                .iter()
                .any(|r| r.voxel == VoxelCoord::new(3, 2, 1))
        );
    }

    #[test]
    fn test_acknowledge_clears_diffs_and_dirty() {
        let world = test_world(4, 4);
        let world = place(world, 1, 0, 1, BlockId::Ground);
        let world = acknowledge_mesh_diffs(world);
        assert!(world.mesh_diffs.is_empty());
        assert!(world.chunks.values().all(|c| !c.dirty));
    }

    #[test]
    fn test_world_state_json_uses_key_strings() {
        let world = test_world(2, 2);
        let json = serde_json::to_value(&world).unwrap();
        assert!(json["chunks"]["0:0"].is_object());
        assert_eq!(json["visibleChunkKeys"][0], "0:0");
        let back: WorldState = serde_json::from_value(json).unwrap();
        assert_eq!(back, world);
    }
}
