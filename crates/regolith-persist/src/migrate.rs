//! Legacy save-version migrations.
//!
//! Every save ever written loads into the current [`SimState`]. Version 1
//! predates the stored world (terrain is re-derived from the seed), version 2
//! stored a single chunk as a heightmap with per-column resource flags, and
//! version 3 stored a single chunk as a flat block array. Multi-chunk worlds
//! arrived with version 4; all single-chunk saves map to the origin chunk.

use serde::Deserialize;
use serde_json::Value;

use regolith_math::Vec3;
use regolith_sim::{DroneState, MineOrder, OrderStatus, PlayerState, SimState, empty_inventory};
use regolith_terrain::{
    DEFAULT_CHUNK_HEIGHT, DEFAULT_CHUNK_SIZE, create_empty_world, generate_chunk,
};
use regolith_voxel::{BlockId, ChunkId, ChunkState, VoxelCoord, WorldState};

const ORIGIN: ChunkId = ChunkId { x: 0, z: 0 };

/// Parses a versioned payload into the current state shape.
///
/// `None` means the payload is unreadable (unknown version or malformed
/// state); callers fall back to a fresh world.
pub fn migrate_state(version: u32, state: Value) -> Option<SimState> {
    match version {
        1 => parse::<SaveV1>(version, state).map(migrate_v1),
        2 => parse::<SaveV2>(version, state).map(migrate_v2),
        3 => parse::<SaveV3>(version, state).map(migrate_v3),
        4 => parse(version, state),
        other => {
            log::warn!("unknown save version {other}, ignoring save");
            None
        }
    }
}

fn parse<T: serde::de::DeserializeOwned>(version: u32, state: Value) -> Option<T> {
    match serde_json::from_value(state) {
        Ok(parsed) => Some(parsed),
        Err(err) => {
            log::warn!("version {version} save payload rejected: {err}");
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Historical payload shapes
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct SaveV1 {
    seed: u32,
    tick: u64,
    player: V1Player,
    #[serde(default)]
    drones: Vec<DroneState>,
    // Pause state was dropped from the save format; ignored on load.
    #[serde(default, rename = "paused")]
    _paused: bool,
}

#[derive(Deserialize)]
struct V1Player {
    position: Vec3,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SaveV2 {
    seed: u32,
    #[serde(default)]
    rng_seed: Option<u32>,
    tick: u64,
    world: V2World,
    player: PlayerState,
    #[serde(default)]
    drones: Vec<DroneState>,
    #[serde(default)]
    orders: Vec<LegacyOrder>,
    #[serde(default)]
    order_counter: u64,
}

#[derive(Deserialize)]
struct V2World {
    chunk: V2Chunk,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct V2Chunk {
    size: usize,
    /// Column heights, indexed `z * size + x`.
    height_map: Vec<usize>,
    /// Per-column flag: resource block on top of the column.
    resources: Vec<bool>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SaveV3 {
    seed: u32,
    #[serde(default)]
    rng_seed: Option<u32>,
    tick: u64,
    world: V3World,
    player: PlayerState,
    #[serde(default)]
    drones: Vec<DroneState>,
    #[serde(default)]
    orders: Vec<LegacyOrder>,
    #[serde(default)]
    order_counter: u64,
}

#[derive(Deserialize)]
struct V3World {
    size: usize,
    height: usize,
    blocks: Vec<BlockId>,
}

/// Pre-v4 orders carried no chunk coordinate (the world was one chunk).
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyOrder {
    id: String,
    target: VoxelCoord,
    status: OrderStatus,
    #[serde(default)]
    drone_id: Option<String>,
}

impl LegacyOrder {
    fn into_order(self) -> MineOrder {
        MineOrder {
            id: self.id,
            chunk: ORIGIN,
            target: self.target,
            status: self.status,
            drone_id: self.drone_id,
        }
    }
}

// ---------------------------------------------------------------------------
// Migrations
// ---------------------------------------------------------------------------

/// v1 stored no terrain at all: the origin chunk is re-derived from the world
/// seed, exactly as generation would have produced it at the time.
fn migrate_v1(save: SaveV1) -> SimState {
    let generated = generate_chunk(save.seed, ORIGIN, DEFAULT_CHUNK_SIZE, DEFAULT_CHUNK_HEIGHT);
    let size = DEFAULT_CHUNK_SIZE;

    let mut height_map = vec![0usize; size * size];
    let mut resources = vec![false; size * size];
    for z in 0..size {
        for x in 0..size {
            let column = generated.chunk.column_height(x, z);
            height_map[z * size + x] = column;
            let top = VoxelCoord::new(x, column.saturating_sub(1), z);
            resources[z * size + x] = generated.chunk.block(top) == Some(BlockId::Resource);
        }
    }

    migrate_v2(SaveV2 {
        seed: save.seed,
        rng_seed: Some(save.seed),
        tick: save.tick,
        world: V2World {
            chunk: V2Chunk {
                size,
                height_map,
                resources,
            },
        },
        player: PlayerState {
            position: save.player.position,
            yaw: 0.0,
            pitch: 0.0,
            velocity: Vec3::ZERO,
            inventory: empty_inventory(),
            hotbar: Default::default(),
            equipment: Default::default(),
            dev_creative: false,
            dev_fly: false,
            dev_noclip: false,
        },
        drones: save.drones,
        orders: Vec::new(),
        order_counter: 0,
    })
}

/// v2's heightmap expands into a block array: ground up to each column's
/// height, with the top block swapped for a resource where flagged.
fn migrate_v2(save: SaveV2) -> SimState {
    let size = save.world.chunk.size;
    let height = DEFAULT_CHUNK_HEIGHT;
    let mut chunk = ChunkState::new(ORIGIN, size, height);

    for z in 0..size {
        for x in 0..size {
            let column_index = z * size + x;
            let column = save
                .world
                .chunk
                .height_map
                .get(column_index)
                .copied()
                .unwrap_or(0)
                .min(height);
            for y in 0..column {
                let idx = chunk.index(x, y, z);
                chunk.blocks[idx] = BlockId::Ground;
            }
            if column > 0
                && save
                    .world
                    .chunk
                    .resources
                    .get(column_index)
                    .copied()
                    .unwrap_or(false)
            {
                let idx = chunk.index(x, column - 1, z);
                chunk.blocks[idx] = BlockId::Resource;
            }
        }
    }

    migrate_v3(SaveV3 {
        seed: save.seed,
        rng_seed: save.rng_seed,
        tick: save.tick,
        world: V3World {
            size,
            height,
            blocks: chunk.blocks,
        },
        player: save.player,
        drones: save.drones,
        orders: save.orders,
        order_counter: save.order_counter,
    })
}

/// v3's single chunk becomes the origin chunk of a streaming world.
fn migrate_v3(save: SaveV3) -> SimState {
    let mut chunk = ChunkState::new(ORIGIN, save.world.size, save.world.height);
    let expected = chunk.blocks.len();
    if save.world.blocks.len() == expected {
        chunk.blocks = save.world.blocks;
    } else {
        log::warn!(
            "v3 block array has {} entries, expected {expected}; keeping air",
            save.world.blocks.len()
        );
    }

    let mut world: WorldState = create_empty_world(save.seed, save.world.size, save.world.height);
    world.chunks.insert(ORIGIN, chunk);
    world.visible_chunk_keys = vec![ORIGIN];

    SimState {
        seed: save.seed,
        rng_seed: save.rng_seed.unwrap_or(save.seed),
        tick: save.tick,
        world,
        player: save.player,
        drones: save.drones,
        orders: save.orders.into_iter().map(LegacyOrder::into_order).collect(),
        order_counter: save.order_counter,
        interaction: Default::default(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
