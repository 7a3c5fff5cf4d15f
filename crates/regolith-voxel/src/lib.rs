//! Chunked voxel world model: block storage, mutation, coordinate mapping,
//! mesh-diff bookkeeping, and grid raycasting.
//!
//! Every mutating operation is a pure, total function: invalid input
//! (out-of-bounds voxel, unloaded chunk, unchanged value) degrades to a
//! no-op that hands the world back unmodified. Callers treat that as
//! "the action had no effect" — nothing in this crate panics or errors
//! on a bad spatial reference.

pub mod chunk;
pub mod raycast;
pub mod world;

pub use chunk::{BlockId, ChunkId, ChunkState, ParseChunkKeyError, VoxelCoord, chunk_key, parse_chunk_key};
pub use raycast::{PlacementPreview, RaycastHit, TargetedVoxel, raycast_world};
pub use world::{
    ChunkMeshDiff, MeshDiffKind, WorldState, WorldVoxel, acknowledge_mesh_diffs,
    list_active_resources, mark_resource_depleted, push_mesh_diff, sample_height_at_world,
    set_block_in_world, voxel_to_world, world_to_voxel,
};
