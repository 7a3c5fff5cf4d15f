//! The fixed-timestep tick pipeline and order management.
//!
//! `run_sim_tick` advances the whole simulation by exactly one step, in a
//! fixed order: RNG advance, order assignment, interaction raycast, discrete
//! actions, drone stepping (with depletion/completion side effects), player
//! movement, and a final raycast refresh so the renderer always sees an
//! up-to-date target.

use rustc_hash::FxHashSet;

use regolith_math::{Vec3, clamp};
use regolith_rng::Lcg;
use regolith_voxel::{
    BlockId, ChunkId, WorldState, WorldVoxel, list_active_resources, mark_resource_depleted,
    raycast_world, set_block_in_world, voxel_to_world,
};

use crate::drone::{DroneConfig, step_drone};
use crate::player::{MovementConfig, step_player};
use crate::types::{
    CycleDirection, DroneState, InteractionState, Inventory, ItemId, ItemStack, MineOrder,
    OrderStatus, PlayerState, SimAction, SimState, TickContext,
};

/// How far the player's interaction ray reaches, in world units.
pub const INTERACT_DISTANCE: f32 = 8.0;

/// Assigns pending orders to idle drones, in order-list order.
///
/// First-declared pending order gets the first idle drone; spatial proximity
/// is deliberately not considered. A drone counts as idle when it carries no
/// active task.
fn assign_orders(orders: &[MineOrder], drones: &[DroneState]) -> Vec<MineOrder> {
    let mut next = orders.to_vec();
    let idle: Vec<&str> = drones
        .iter()
        .filter(|d| d.task.is_none())
        .map(|d| d.id.as_str())
        .collect();
    let mut cursor = 0;
    for order in &mut next {
        if order.status != OrderStatus::Pending {
            continue;
        }
        let Some(drone_id) = idle.get(cursor) else {
            break;
        };
        order.status = OrderStatus::Assigned;
        order.drone_id = Some((*drone_id).to_owned());
        cursor += 1;
    }
    next
}

/// What a broken block yields.
fn block_to_item(block: BlockId) -> Option<ItemId> {
    match block {
        BlockId::Ground => Some(ItemId::BlockGround),
        BlockId::Resource => Some(ItemId::ResourceOre),
        BlockId::Air => None,
    }
}

/// What an item places as. Ore is a payload, not a block.
fn item_to_block(item: ItemId) -> Option<BlockId> {
    match item {
        ItemId::BlockGround => Some(BlockId::Ground),
        ItemId::BlockResource => Some(BlockId::Resource),
        ItemId::ResourceOre => None,
    }
}

/// Adds items to the inventory: tops up the first matching stack, otherwise
/// fills the first empty slot. Overflow beyond the last empty slot is lost.
fn add_item_to_inventory(inventory: &Inventory, item: ItemId, count: u32) -> Inventory {
    if count == 0 {
        return inventory.clone();
    }
    let mut next = inventory.clone();
    for slot in next.iter_mut() {
        if let Some(stack) = slot
            && stack.item == item
        {
            stack.count += count;
            return next;
        }
    }
    for slot in next.iter_mut() {
        if slot.is_none() {
            *slot = Some(ItemStack { item, count });
            return next;
        }
    }
    next
}

/// Removes `amount` items from a slot. `None` when the slot is invalid or
/// empty; a stack smaller than `amount` is drained entirely.
fn remove_from_inventory_slot(
    inventory: &Inventory,
    slot_index: usize,
    amount: u32,
) -> Option<Inventory> {
    if amount == 0 {
        return None;
    }
    let stack = inventory.get(slot_index)?.as_ref()?;
    let mut next = inventory.clone();
    if stack.count <= amount {
        next[slot_index] = None;
    } else {
        next[slot_index] = Some(ItemStack {
            item: stack.item,
            count: stack.count - amount,
        });
    }
    Some(next)
}

/// Steps the active hotbar index, wrapping in both directions.
fn cycle_hotbar_index(current: usize, len: usize, direction: CycleDirection) -> usize {
    if len == 0 {
        return 0;
    }
    (current as i64 + direction.delta()).rem_euclid(len as i64) as usize
}

/// Look direction from camera heading and polar angle (π/2 is level).
fn compute_look_direction(heading: f32, camera_phi: f32) -> Vec3 {
    let pitch = camera_phi - std::f32::consts::FRAC_PI_2;
    Vec3::new(
        heading.sin() * pitch.cos(),
        pitch.sin(),
        heading.cos() * pitch.cos(),
    )
}

/// Applies the tick's queued discrete actions against the current
/// interaction state. Actions with no valid target degrade to no-ops.
fn apply_actions(
    actions: &[SimAction],
    mut player: PlayerState,
    mut world: WorldState,
    interaction: &InteractionState,
) -> (PlayerState, WorldState) {
    for action in actions {
        match action {
            SimAction::CycleHotbar(direction) => {
                player.hotbar.active_index = cycle_hotbar_index(
                    player.hotbar.active_index,
                    player.hotbar.slots.len(),
                    *direction,
                );
            }
            SimAction::SelectHotbar(index) => {
                if *index < player.hotbar.slots.len() {
                    player.hotbar.active_index = *index;
                }
            }
            SimAction::BreakBlock => {
                let Some(target) = interaction.target else {
                    continue;
                };
                let Some(chunk) = world.chunks.get(&target.chunk) else {
                    continue;
                };
                let Some(block) = chunk.block(target.voxel) else {
                    continue;
                };
                if !block.is_solid() {
                    continue;
                }
                if !player.dev_creative
                    && let Some(item) = block_to_item(block)
                {
                    player.inventory = add_item_to_inventory(&player.inventory, item, 1);
                }
                world = if block == BlockId::Resource {
                    mark_resource_depleted(world, target.chunk, target.voxel)
                } else {
                    set_block_in_world(world, target.chunk, target.voxel, BlockId::Air)
                };
            }
            SimAction::PlaceBlock => {
                let Some(placement) = interaction.placement else {
                    continue;
                };
                let Some(chunk) = world.chunks.get(&placement.chunk) else {
                    continue;
                };
                if chunk.block(placement.voxel) != Some(BlockId::Air) {
                    continue;
                }

                let mut to_place = None;
                let mut inventory = player.inventory.clone();
                if player.dev_creative {
                    // Creative placement is free and unlimited.
                    to_place = Some(BlockId::Ground);
                } else if let Some(&Some(slot_index)) =
                    player.hotbar.slots.get(player.hotbar.active_index)
                    && let Some(Some(stack)) = inventory.get(slot_index)
                    && let Some(block) = item_to_block(stack.item)
                    && let Some(next) = remove_from_inventory_slot(&inventory, slot_index, 1)
                {
                    inventory = next;
                    to_place = Some(block);
                }

                if let Some(block) = to_place {
                    world = set_block_in_world(world, placement.chunk, placement.voxel, block);
                    player.inventory = inventory;
                }
            }
        }
    }
    (player, world)
}

/// Advances the simulation by exactly one fixed timestep.
///
/// Deterministic: the same state and context always produce the same output.
pub fn run_sim_tick(state: SimState, ctx: &TickContext) -> SimState {
    let drone_cfg = DroneConfig::default();
    let movement_cfg = MovementConfig::default();

    // Reserved draw: keeps the RNG stream position stable for future
    // randomized events without changing the save format.
    let mut rng = Lcg::new(state.rng_seed);
    rng.next();

    let assigned = assign_orders(&state.orders, &state.drones);

    let mut player = state.player.clone();
    player.yaw = ctx.heading;
    player.pitch = ctx.camera_phi;

    let look_dir = compute_look_direction(ctx.heading, ctx.camera_phi);
    let ray = raycast_world(&state.world, player.position, look_dir, INTERACT_DISTANCE);
    let interaction = InteractionState {
        target: ray.target,
        placement: ray.placement,
    };

    // Drones evaluate reachability against the pre-action world.
    let drone_world = state.world.clone();
    let (player, mut world) = apply_actions(&ctx.actions, player, state.world, &interaction);

    let mut drones = Vec::with_capacity(state.drones.len());
    let mut completed: FxHashSet<String> = FxHashSet::default();
    for drone in &state.drones {
        let order = assigned.iter().find(|o| {
            o.status == OrderStatus::Assigned && o.drone_id.as_deref() == Some(drone.id.as_str())
        });
        let result = step_drone(drone, order, &drone_world, ctx.dt, &drone_cfg);
        if let Some(consumed) = result.consumed {
            world = mark_resource_depleted(world, consumed.chunk, consumed.voxel);
        }
        if let Some(order_id) = result.completed_order {
            log::debug!("drone {} completed {order_id}", drone.id);
            completed.insert(order_id);
        }
        let mut next = result.drone;
        next.battery = clamp(next.battery - drone_cfg.battery_drain, 0.0, 1.0);
        drones.push(next);
    }

    let orders: Vec<MineOrder> = assigned
        .into_iter()
        .map(|mut order| {
            if completed.contains(&order.id) {
                order.status = OrderStatus::Completed;
            }
            order
        })
        .collect();

    let interim = SimState {
        seed: state.seed,
        rng_seed: rng.state(),
        tick: state.tick + 1,
        world,
        player,
        drones,
        orders,
        order_counter: state.order_counter,
        interaction,
    };

    let moved = step_player(&interim, ctx, &movement_cfg);
    let final_ray = raycast_world(&interim.world, moved.position, look_dir, INTERACT_DISTANCE);
    SimState {
        player: moved,
        interaction: InteractionState {
            target: final_ray.target,
            placement: final_ray.placement,
        },
        ..interim
    }
}

/// Finds the nearest unclaimed resource to `origin` by straight-line
/// distance, ties broken by scan order.
///
/// Columns targeted by any order in `exclude` count as claimed; callers pass
/// every non-completed order.
pub fn find_nearest_resource(
    state: &SimState,
    exclude: &[MineOrder],
    origin: Vec3,
) -> Option<WorldVoxel> {
    let reserved: FxHashSet<(ChunkId, usize, usize)> = exclude
        .iter()
        .map(|o| (o.chunk, o.target.x, o.target.z))
        .collect();

    let mut best: Option<(WorldVoxel, f32)> = None;
    for entry in list_active_resources(&state.world) {
        if reserved.contains(&(entry.chunk, entry.voxel.x, entry.voxel.z)) {
            continue;
        }
        let Some(chunk) = state.world.chunks.get(&entry.chunk) else {
            continue;
        };
        let distance = voxel_to_world(chunk, entry.voxel).distance(origin);
        if best.is_none_or(|(_, d)| distance < d) {
            best = Some((entry, distance));
        }
    }
    best.map(|(entry, _)| entry)
}

/// Issues a mine order for the nearest unclaimed resource to `origin`.
///
/// No-op when every loaded resource is already claimed or none exist.
pub fn issue_mine_order(state: SimState, origin: Vec3) -> SimState {
    let active: Vec<MineOrder> = state
        .orders
        .iter()
        .filter(|o| o.status != OrderStatus::Completed)
        .cloned()
        .collect();
    let Some(found) = find_nearest_resource(&state, &active, origin) else {
        return state;
    };

    let mut next = state;
    next.order_counter += 1;
    let id = format!("order-{}", next.order_counter);
    log::debug!("issued {id} for {}@{:?}", found.chunk, found.voxel);
    next.orders.push(MineOrder {
        id,
        chunk: found.chunk,
        target: found.voxel,
        status: OrderStatus::Pending,
        drone_id: None,
    });
    next
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bootstrap::create_initial_state;
    use crate::types::{DroneTask, InputState};
    use regolith_voxel::VoxelCoord;

    const DT: f32 = 1.0 / 60.0;

    fn empty_ctx() -> TickContext {
        TickContext {
            input: InputState::default(),
            heading: 0.0,
            camera_phi: std::f32::consts::FRAC_PI_2,
            dt: DT,
            actions: Vec::new(),
        }
    }

    #[test]
    fn test_assignment_follows_order_list_order() {
        let state = create_initial_state(1337);
        let orders = vec![
            MineOrder {
                id: "order-1".into(),
                chunk: ChunkId::new(0, 0),
                target: VoxelCoord::new(0, 0, 0),
                status: OrderStatus::Pending,
                drone_id: None,
            },
            MineOrder {
                id: "order-2".into(),
                chunk: ChunkId::new(0, 0),
                target: VoxelCoord::new(1, 0, 1),
                status: OrderStatus::Pending,
                drone_id: None,
            },
        ];
        let assigned = assign_orders(&orders, &state.drones);
        assert_eq!(assigned[0].status, OrderStatus::Assigned);
        assert_eq!(assigned[0].drone_id.as_deref(), Some("drone-1"));
        assert_eq!(assigned[1].drone_id.as_deref(), Some("drone-2"));
    }

    #[test]
    fn test_busy_drones_are_skipped() {
        let mut state = create_initial_state(1337);
        for drone in &mut state.drones {
            drone.task = Some(DroneTask {
                order_id: "busy".into(),
                target: VoxelCoord::new(0, 0, 0),
                progress: 0.0,
            });
        }
        let orders = vec![MineOrder {
            id: "order-1".into(),
            chunk: ChunkId::new(0, 0),
            target: VoxelCoord::new(0, 0, 0),
            status: OrderStatus::Pending,
            drone_id: None,
        }];
        let assigned = assign_orders(&orders, &state.drones);
        assert_eq!(assigned[0].status, OrderStatus::Pending);
        assert!(assigned[0].drone_id.is_none());
    }

    #[test]
    fn test_cycle_hotbar_wraps_both_ways() {
        assert_eq!(cycle_hotbar_index(0, 5, CycleDirection::Previous), 4);
        assert_eq!(cycle_hotbar_index(4, 5, CycleDirection::Next), 0);
        assert_eq!(cycle_hotbar_index(2, 5, CycleDirection::Next), 3);
        assert_eq!(cycle_hotbar_index(0, 0, CycleDirection::Next), 0);
    }

    #[test]
    fn test_select_hotbar_ignores_out_of_range() {
        let state = create_initial_state(1337);
        let ctx = TickContext {
            actions: vec![SimAction::SelectHotbar(3), SimAction::SelectHotbar(99)],
            ..empty_ctx()
        };
        let next = run_sim_tick(state, &ctx);
        assert_eq!(next.player.hotbar.active_index, 3);
    }

    #[test]
    fn test_inventory_stacks_then_fills_empty() {
        let mut inventory = empty_inventory_of(3);
        inventory = add_item_to_inventory(&inventory, ItemId::ResourceOre, 2);
        inventory = add_item_to_inventory(&inventory, ItemId::ResourceOre, 1);
        inventory = add_item_to_inventory(&inventory, ItemId::BlockGround, 1);
        assert_eq!(
            inventory[0],
            Some(ItemStack {
                item: ItemId::ResourceOre,
                count: 3
            })
        );
        assert_eq!(
            inventory[1],
            Some(ItemStack {
                item: ItemId::BlockGround,
                count: 1
            })
        );
        assert_eq!(inventory[2], None);
    }

    fn empty_inventory_of(size: usize) -> Inventory {
        vec![None; size]
    }

    #[test]
    fn test_remove_from_slot() {
        let mut inventory = empty_inventory_of(2);
        inventory[0] = Some(ItemStack {
            item: ItemId::BlockGround,
            count: 2,
        });
        let inventory = remove_from_inventory_slot(&inventory, 0, 1).unwrap();
        assert_eq!(inventory[0].unwrap().count, 1);
        let inventory = remove_from_inventory_slot(&inventory, 0, 1).unwrap();
        assert_eq!(inventory[0], None);
        assert!(remove_from_inventory_slot(&inventory, 0, 1).is_none());
        assert!(remove_from_inventory_slot(&inventory, 9, 1).is_none());
    }

    #[test]
    fn test_break_block_grants_item_and_mutates_world() {
        let state = create_initial_state(1337);
        // Look straight down at the ground under the player's feet.
        let ctx = TickContext {
            camera_phi: 0.0,
            actions: vec![SimAction::BreakBlock],
            ..empty_ctx()
        };
        // First tick only establishes the interaction target.
        let state = run_sim_tick(state, &empty_down_ctx());
        assert!(state.interaction.target.is_some());
        let before = state.clone();
        let next = run_sim_tick(state, &ctx);

        let granted: u32 = next
            .player
            .inventory
            .iter()
            .flatten()
            .map(|stack| stack.count)
            .sum();
        assert_eq!(granted, 1);
        let target = before.interaction.target.unwrap();
        let chunk = &next.world.chunks[&target.chunk];
        assert_ne!(chunk.block(target.voxel), before.world.chunks[&target.chunk].block(target.voxel));
    }

    // Camera at zenith: looking straight down.
    fn empty_down_ctx() -> TickContext {
        TickContext {
            camera_phi: 0.0,
            ..empty_ctx()
        }
    }

    #[test]
    fn test_creative_break_grants_nothing() {
        let mut state = create_initial_state(1337);
        state.player.dev_creative = true;
        let state = run_sim_tick(state, &empty_down_ctx());
        let ctx = TickContext {
            actions: vec![SimAction::BreakBlock],
            ..empty_down_ctx()
        };
        let next = run_sim_tick(state, &ctx);
        assert!(next.player.inventory.iter().all(Option::is_none));
    }

    #[test]
    fn test_place_block_consumes_from_active_slot() {
        let mut state = create_initial_state(1337);
        state.player.inventory[0] = Some(ItemStack {
            item: ItemId::BlockGround,
            count: 2,
        });
        // Establish target + placement cell, then place.
        let state = run_sim_tick(state, &empty_down_ctx());
        let placement = state.interaction.placement.expect("placement cell");
        let ctx = TickContext {
            actions: vec![SimAction::PlaceBlock],
            ..empty_down_ctx()
        };
        let next = run_sim_tick(state, &ctx);
        assert_eq!(next.player.inventory[0].unwrap().count, 1);
        let chunk = &next.world.chunks[&placement.chunk];
        assert_eq!(chunk.block(placement.voxel), Some(BlockId::Ground));
    }

    #[test]
    fn test_place_with_empty_hand_is_a_no_op() {
        let state = create_initial_state(1337);
        let state = run_sim_tick(state, &empty_down_ctx());
        let world_before = state.world.clone();
        let ctx = TickContext {
            actions: vec![SimAction::PlaceBlock],
            ..empty_down_ctx()
        };
        let next = run_sim_tick(state, &ctx);
        assert_eq!(next.world.chunks, world_before.chunks);
    }

    #[test]
    fn test_nearest_resource_skips_reserved_columns() {
        let state = create_initial_state(1337);
        let origin = state.player.position;
        let first = find_nearest_resource(&state, &[], origin).expect("resources exist");
        let claim = MineOrder {
            id: "order-1".into(),
            chunk: first.chunk,
            target: first.voxel,
            status: OrderStatus::Pending,
            drone_id: None,
        };
        let second = find_nearest_resource(&state, &[claim], origin).expect("more resources");
        assert_ne!(
            (second.chunk, second.voxel.x, second.voxel.z),
            (first.chunk, first.voxel.x, first.voxel.z)
        );
    }

    #[test]
    fn test_issue_order_mints_monotonic_ids() {
        let state = create_initial_state(1337);
        let origin = state.player.position;
        let state = issue_mine_order(state, origin);
        let state = issue_mine_order(state, origin);
        assert_eq!(state.orders.len(), 2);
        assert_eq!(state.orders[0].id, "order-1");
        assert_eq!(state.orders[1].id, "order-2");
        assert_eq!(state.order_counter, 2);
        assert_ne!(
            (state.orders[0].chunk, state.orders[0].target),
            (state.orders[1].chunk, state.orders[1].target)
        );
    }

    #[test]
    fn test_rng_seed_advances_each_tick() {
        let state = create_initial_state(1337);
        let before = state.rng_seed;
        let next = run_sim_tick(state, &empty_ctx());
        assert_ne!(next.rng_seed, before);
        assert_eq!(next.tick, 1);
    }
}
