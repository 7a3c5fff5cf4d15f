//! Deterministic fixed-timestep simulation: player movement, mining drones,
//! block interaction, and the per-tick pipeline that binds them.
//!
//! The whole simulation is one immutable value ([`SimState`]) transformed by
//! [`run_sim_tick`]: given bit-identical state and context, the tick produces
//! bit-identical output. Nothing here reads a clock, performs I/O, or draws
//! uncontrolled randomness — the driver owns time accumulation and side
//! effects.

pub mod bootstrap;
pub mod drone;
pub mod engine;
pub mod player;
pub mod types;

pub use bootstrap::{
    DEFAULT_DRONE_COUNT, DEFAULT_SEED, InitialStateParams, build_initial_state,
    create_initial_state,
};
pub use drone::{DroneConfig, DroneStepResult, step_drone};
pub use engine::{INTERACT_DISTANCE, find_nearest_resource, issue_mine_order, run_sim_tick};
pub use player::{MovementConfig, apply_movement, step_player};
pub use types::{
    Activity, CycleDirection, DroneState, DroneTask, Equipment, HOTBAR_SLOTS, Hotbar,
    INVENTORY_SIZE, InputState, InteractionState, Inventory, ItemId, ItemStack, MineOrder,
    OrderStatus, PlayerState, SimAction, SimState, TickContext, empty_inventory,
};
