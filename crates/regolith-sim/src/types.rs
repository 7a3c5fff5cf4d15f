//! Simulation state types and the per-tick input contract.
//!
//! These shapes are the persisted save format (version 4), so every serde
//! attribute here is load-bearing: field names are camelCase, enums store
//! their historical string forms, and newer fields default when absent so
//! older payloads that predate them still parse.

use serde::{Deserialize, Serialize};

use regolith_math::Vec3;
use regolith_voxel::{ChunkId, PlacementPreview, TargetedVoxel, VoxelCoord, WorldState};

/// Inventory slot count.
pub const INVENTORY_SIZE: usize = 20;
/// Hotbar slot count.
pub const HOTBAR_SLOTS: usize = 5;

/// Item kinds the simulation knows about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemId {
    /// A placeable ground block.
    #[serde(rename = "block:ground")]
    BlockGround,
    /// A placeable resource block.
    #[serde(rename = "block:resource")]
    BlockResource,
    /// Mined ore; collected, not placeable.
    #[serde(rename = "resource:ore")]
    ResourceOre,
}

/// A stack of identical items in one inventory slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStack {
    pub item: ItemId,
    pub count: u32,
}

/// Fixed-size array of nullable item stacks.
pub type Inventory = Vec<Option<ItemStack>>;

/// An empty inventory of the standard size.
pub fn empty_inventory() -> Inventory {
    vec![None; INVENTORY_SIZE]
}

/// Quick-select bar: each slot optionally points at an inventory index.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hotbar {
    pub slots: Vec<Option<usize>>,
    pub active_index: usize,
}

impl Default for Hotbar {
    /// Standard hotbar: slots mapped to inventory indices 0..5, first active.
    fn default() -> Self {
        Self {
            slots: (0..HOTBAR_SLOTS).map(Some).collect(),
            active_index: 0,
        }
    }
}

/// Named equipment slots, all nullable.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Equipment {
    pub head: Option<ItemStack>,
    pub chest: Option<ItemStack>,
    pub legs: Option<ItemStack>,
    pub boots: Option<ItemStack>,
    pub left_hand: Option<ItemStack>,
    pub right_hand: Option<ItemStack>,
    pub backpack: Option<ItemStack>,
}

/// The player avatar.
///
/// Velocity is derived (position delta over dt), never integrated. The three
/// dev flags alter movement/interaction rules and are forced false by the
/// persistence sanitizer — a save never carries them as true.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerState {
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub velocity: Vec3,
    #[serde(default = "empty_inventory")]
    pub inventory: Inventory,
    #[serde(default)]
    pub hotbar: Hotbar,
    #[serde(default)]
    pub equipment: Equipment,
    /// Break without drops, place without cost.
    #[serde(default)]
    pub dev_creative: bool,
    /// Free vertical movement, no ground snapping.
    #[serde(default)]
    pub dev_fly: bool,
    /// Walk through terrain (no ground snapping).
    #[serde(default)]
    pub dev_noclip: bool,
}

/// What a drone is currently doing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activity {
    #[default]
    Idle,
    Moving,
    Mining,
    Returning,
    /// Reserved: never entered by current logic.
    Charging,
}

/// The work item a drone is bound to.
///
/// Progress accumulates across ticks and resets only when the drone binds a
/// different order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DroneTask {
    /// Id of the bound order.
    pub order_id: String,
    /// Target voxel (local coordinate within the order's chunk).
    pub target: VoxelCoord,
    /// Mining seconds accumulated so far.
    pub progress: f32,
}

/// An autonomous mining drone.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DroneState {
    pub id: String,
    pub position: Vec3,
    #[serde(default)]
    pub velocity: Vec3,
    /// Charge level in `0..=1`; drains a fixed amount per tick, floors at 0.
    /// Reaching 0 has no behavioral effect yet (reserved extension point).
    #[serde(default = "full_battery")]
    pub battery: f32,
    /// Collected resource units.
    #[serde(default)]
    pub carrying: u32,
    #[serde(default)]
    pub activity: Activity,
    #[serde(default)]
    pub task: Option<DroneTask>,
}

fn full_battery() -> f32 {
    1.0
}

/// Lifecycle of a mine order. Transitions are one-directional:
/// pending → assigned → completed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Assigned,
    Completed,
}

/// A standing request to mine one voxel.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MineOrder {
    /// Unique id minted from the world's order counter.
    pub id: String,
    /// Chunk holding the target.
    pub chunk: ChunkId,
    /// Target voxel within the chunk.
    pub target: VoxelCoord,
    pub status: OrderStatus,
    /// Drone bound to this order once assigned.
    #[serde(default)]
    pub drone_id: Option<String>,
}

/// What the player is currently looking at.
///
/// Recomputed from a fresh raycast every tick; never meaningful after a load
/// (the sanitizer clears it).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionState {
    #[serde(default)]
    pub target: Option<TargetedVoxel>,
    #[serde(default)]
    pub placement: Option<PlacementPreview>,
}

/// Root simulation aggregate: the unit of persistence and the value the tick
/// engine transforms.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimState {
    /// Immutable world-generation seed.
    pub seed: u32,
    /// Current RNG state (advances every tick; distinct from `seed`).
    pub rng_seed: u32,
    /// Monotonic tick counter.
    pub tick: u64,
    pub world: WorldState,
    pub player: PlayerState,
    pub drones: Vec<DroneState>,
    pub orders: Vec<MineOrder>,
    /// Monotonic counter backing order-id minting.
    pub order_counter: u64,
    #[serde(default)]
    pub interaction: InteractionState,
}

/// Held directional input for one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InputState {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
    /// Fly mode only.
    pub ascend: bool,
    /// Fly mode only.
    pub descend: bool,
}

/// Direction to cycle the hotbar.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CycleDirection {
    Previous,
    Next,
}

impl CycleDirection {
    /// Signed slot delta.
    pub fn delta(self) -> i64 {
        match self {
            CycleDirection::Previous => -1,
            CycleDirection::Next => 1,
        }
    }
}

/// Discrete one-shot actions queued by the driver since the last tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimAction {
    /// Break/deplete the targeted block.
    BreakBlock,
    /// Place a block into the placement cell.
    PlaceBlock,
    /// Step the active hotbar index, wrapping both ways.
    CycleHotbar(CycleDirection),
    /// Jump the active hotbar index directly to a slot.
    SelectHotbar(usize),
}

/// Everything the driver supplies for one fixed timestep.
///
/// The driver accumulates variable frame time into fixed-size steps and calls
/// the tick once per step; the tick itself never subdivides `dt`.
#[derive(Clone, Debug, Default)]
pub struct TickContext {
    pub input: InputState,
    /// Camera heading in radians (movement and look direction are relative
    /// to it).
    pub heading: f32,
    /// Camera polar angle in radians (π/2 is level).
    pub camera_phi: f32,
    /// Fixed timestep in seconds.
    pub dt: f32,
    pub actions: Vec<SimAction>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
