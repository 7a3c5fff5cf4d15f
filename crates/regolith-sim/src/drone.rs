//! Per-tick drone state machine.
//!
//! A drone is driven entirely by its assigned order: no order (or an order
//! targeting an unloaded chunk) forces idle; otherwise it flies to a hover
//! point above the target, mines for a fixed duration, then reports the
//! completed order and the consumed voxel. The caller applies the side
//! effects — depleting the voxel and marking the order completed — so this
//! module never touches the world.

use regolith_math::Vec3;
use regolith_voxel::{WorldState, WorldVoxel, voxel_to_world};

use crate::types::{Activity, DroneState, DroneTask, MineOrder};

/// Drone movement/mining parameters.
#[derive(Clone, Copy, Debug)]
pub struct DroneConfig {
    /// Flight speed in units per second.
    pub speed: f32,
    /// Seconds of accumulated progress needed to mine one block.
    pub mining_time: f32,
    /// Hover station height above the target voxel's grid layer.
    pub hover_height: f32,
    /// Distance within which the drone counts as arrived at the hover point.
    pub arrive_radius: f32,
    /// Battery drained per tick, regardless of activity.
    pub battery_drain: f32,
}

impl Default for DroneConfig {
    fn default() -> Self {
        Self {
            speed: 2.5,
            mining_time: 2.0,
            hover_height: 1.4,
            arrive_radius: 0.1,
            battery_drain: 0.001,
        }
    }
}

/// One drone's tick outcome plus side effects for the caller to apply.
#[derive(Clone, Debug)]
pub struct DroneStepResult {
    pub drone: DroneState,
    /// Order the drone finished this tick.
    pub completed_order: Option<String>,
    /// Voxel to deplete in the world.
    pub consumed: Option<WorldVoxel>,
}

impl DroneStepResult {
    fn quiet(drone: DroneState) -> Self {
        Self {
            drone,
            completed_order: None,
            consumed: None,
        }
    }
}

fn move_towards(current: Vec3, target: Vec3, speed: f32, dt: f32) -> Vec3 {
    let delta = target - current;
    let dist = delta.length();
    if dist == 0.0 {
        return target;
    }
    let step = dist.min(speed * dt);
    current + delta * (step / dist)
}

fn idle(drone: &DroneState) -> DroneState {
    DroneState {
        activity: Activity::Idle,
        velocity: Vec3::ZERO,
        task: None,
        ..drone.clone()
    }
}

/// Advances one drone by one tick against its assigned order (if any).
pub fn step_drone(
    drone: &DroneState,
    order: Option<&MineOrder>,
    world: &WorldState,
    dt: f32,
    cfg: &DroneConfig,
) -> DroneStepResult {
    if dt <= 0.0 {
        return DroneStepResult::quiet(drone.clone());
    }

    let Some(order) = order else {
        return DroneStepResult::quiet(idle(drone));
    };

    // Target chunk unloaded: unreachable, treat as no order.
    let Some(chunk) = world.chunks.get(&order.chunk) else {
        return DroneStepResult::quiet(idle(drone));
    };

    let target_world = voxel_to_world(chunk, order.target);
    let hover = Vec3::new(
        target_world.x,
        order.target.y as f32 + cfg.hover_height,
        target_world.z,
    );

    if drone.position.distance(hover) >= cfg.arrive_radius {
        let next_pos = move_towards(drone.position, hover, cfg.speed, dt);
        return DroneStepResult::quiet(DroneState {
            position: next_pos,
            velocity: (next_pos - drone.position) / dt,
            activity: Activity::Moving,
            task: Some(DroneTask {
                order_id: order.id.clone(),
                target: order.target,
                progress: 0.0,
            }),
            ..drone.clone()
        });
    }

    // Continue prior progress only if the task already references this order.
    let prior = match &drone.task {
        Some(task) if task.order_id == order.id => task.progress,
        _ => 0.0,
    };
    let progress = prior + dt;

    if progress < cfg.mining_time {
        return DroneStepResult::quiet(DroneState {
            position: hover,
            velocity: Vec3::ZERO,
            activity: Activity::Mining,
            task: Some(DroneTask {
                order_id: order.id.clone(),
                target: order.target,
                progress,
            }),
            ..drone.clone()
        });
    }

    // Done: land just above the block, hand the payload back.
    let landing = Vec3::new(target_world.x, target_world.y + 0.2, target_world.z);
    DroneStepResult {
        drone: DroneState {
            position: landing,
            velocity: Vec3::ZERO,
            activity: Activity::Returning,
            carrying: drone.carrying + 1,
            task: None,
            ..drone.clone()
        },
        completed_order: Some(order.id.clone()),
        consumed: Some(WorldVoxel {
            chunk: order.chunk,
            voxel: order.target,
        }),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
