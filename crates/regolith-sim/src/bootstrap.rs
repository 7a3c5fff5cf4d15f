//! Initial-state construction for a brand new world.

use regolith_math::Vec3;
use regolith_terrain::{DEFAULT_CHUNK_HEIGHT, DEFAULT_CHUNK_RADIUS, DEFAULT_CHUNK_SIZE, generate_world};
use regolith_voxel::{ChunkId, VoxelCoord, sample_height_at_world, voxel_to_world};

use crate::types::{
    Activity, DroneState, Equipment, Hotbar, InteractionState, PlayerState, SimState,
    empty_inventory,
};

/// World seed used when none is configured.
pub const DEFAULT_SEED: u32 = 1337;
/// Drones spawned in a fresh world.
pub const DEFAULT_DRONE_COUNT: usize = 3;

/// Knobs for building a fresh world.
#[derive(Clone, Copy, Debug)]
pub struct InitialStateParams {
    pub seed: u32,
    pub drone_count: usize,
    /// Streaming window radius, in chunks.
    pub chunk_radius: i32,
}

impl Default for InitialStateParams {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            drone_count: DEFAULT_DRONE_COUNT,
            chunk_radius: DEFAULT_CHUNK_RADIUS,
        }
    }
}

/// Builds a fresh simulation with default parameters and the given seed.
pub fn create_initial_state(seed: u32) -> SimState {
    build_initial_state(&InitialStateParams {
        seed,
        ..Default::default()
    })
}

/// Builds a fresh simulation: eager chunk window around the origin, player on
/// the ground at the center, drones parked above the first generated
/// resources (with a grid fallback once resources run out).
pub fn build_initial_state(params: &InitialStateParams) -> SimState {
    let generated = generate_world(
        params.seed,
        params.chunk_radius,
        DEFAULT_CHUNK_SIZE,
        DEFAULT_CHUNK_HEIGHT,
    );
    let world = generated.world;

    // Flatten per-chunk resource lists, keeping window order.
    let spawn_spots: Vec<(ChunkId, VoxelCoord)> = generated
        .resources
        .iter()
        .flat_map(|(id, coords)| coords.iter().map(move |coord| (*id, *coord)))
        .collect();

    let ground = sample_height_at_world(&world, 0.0, 0.0);

    let drones = (0..params.drone_count)
        .map(|i| {
            let position = spawn_spots
                .get(i)
                .and_then(|(id, coord)| {
                    world
                        .chunks
                        .get(id)
                        .map(|chunk| voxel_to_world(chunk, *coord) + Vec3::new(0.0, 1.2, 0.0))
                })
                .unwrap_or_else(|| {
                    Vec3::new(
                        i as f32 - (params.drone_count / 2) as f32,
                        ground + 1.2,
                        2.0 - i as f32,
                    )
                });
            DroneState {
                id: format!("drone-{}", i + 1),
                position,
                velocity: Vec3::ZERO,
                battery: 1.0,
                carrying: 0,
                activity: Activity::Idle,
                task: None,
            }
        })
        .collect();

    log::info!(
        "built initial state: seed {}, {} chunks, {} drones",
        params.seed,
        world.chunks.len(),
        params.drone_count
    );

    SimState {
        seed: params.seed,
        rng_seed: params.seed,
        tick: 0,
        world,
        player: PlayerState {
            position: Vec3::new(0.0, ground + 0.6, 0.0),
            yaw: 0.0,
            pitch: 0.0,
            velocity: Vec3::ZERO,
            inventory: empty_inventory(),
            hotbar: Hotbar::default(),
            equipment: Equipment::default(),
            dev_creative: false,
            dev_fly: false,
            dev_noclip: false,
        },
        drones,
        orders: Vec::new(),
        order_counter: 0,
        interaction: InteractionState::default(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
