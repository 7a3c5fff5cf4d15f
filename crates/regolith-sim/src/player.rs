//! Third-person player movement against the heightfield.
//!
//! Walking is heightfield-snapped: the avatar never leaves the ground and
//! vertical input is ignored. Fly mode moves faster, honors ascend/descend,
//! and skips the snap; noclip skips the snap at walking speed. Velocity is
//! always the realized position delta over dt — derived, never integrated.

use regolith_math::Vec3;
use regolith_voxel::sample_height_at_world;

use crate::types::{InputState, PlayerState, SimState, TickContext};

/// Player movement parameters.
#[derive(Clone, Copy, Debug)]
pub struct MovementConfig {
    /// Walking speed in units per second.
    pub walk_speed: f32,
    /// Fly-mode speed in units per second (horizontal and vertical).
    pub fly_speed: f32,
    /// Height of the avatar's origin above the ground surface.
    pub foot_offset: f32,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            walk_speed: 4.0,
            fly_speed: 6.0,
            foot_offset: 0.6,
        }
    }
}

/// Horizontal displacement from held input, relative to the camera heading.
///
/// Diagonal input is normalized so combined speed never exceeds `speed`.
/// dt ≤ 0 returns the position unchanged.
pub fn apply_movement(
    position: Vec3,
    input: &InputState,
    heading: f32,
    dt: f32,
    speed: f32,
) -> Vec3 {
    if dt <= 0.0 {
        return position;
    }

    let forward = Vec3::new(heading.sin(), 0.0, heading.cos());
    let right = Vec3::new(heading.cos(), 0.0, -heading.sin());

    let mut wish = Vec3::ZERO;
    if input.forward {
        wish += forward;
    }
    if input.backward {
        wish -= forward;
    }
    if input.left {
        wish -= right;
    }
    if input.right {
        wish += right;
    }

    position + wish.normalize() * (speed * dt)
}

/// Applies one tick of movement to the player, producing the new player state.
pub fn step_player(state: &SimState, ctx: &TickContext, cfg: &MovementConfig) -> PlayerState {
    let player = &state.player;
    if ctx.dt <= 0.0 {
        return PlayerState {
            velocity: Vec3::ZERO,
            ..player.clone()
        };
    }

    let speed = if player.dev_fly {
        cfg.fly_speed
    } else {
        cfg.walk_speed
    };
    let mut next = apply_movement(player.position, &ctx.input, ctx.heading, ctx.dt, speed);

    if player.dev_fly {
        let mut vertical = 0.0;
        if ctx.input.ascend {
            vertical += 1.0;
        }
        if ctx.input.descend {
            vertical -= 1.0;
        }
        next.y += vertical * speed * ctx.dt;
    } else if !player.dev_noclip {
        let ground = sample_height_at_world(&state.world, next.x, next.z);
        next.y = ground + cfg.foot_offset;
    }

    let inv_dt = 1.0 / ctx.dt;
    PlayerState {
        position: next,
        velocity: (next - player.position) * inv_dt,
        ..player.clone()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bootstrap::create_initial_state;
    use crate::types::InputState;

    const DT: f32 = 1.0 / 60.0;

    fn forward_ctx() -> TickContext {
        TickContext {
            input: InputState {
                forward: true,
                ..Default::default()
            },
            dt: DT,
            ..Default::default()
        }
    }

    #[test]
    fn test_forward_walk_covers_speed_times_dt() {
        let state = create_initial_state(1337);
        let cfg = MovementConfig::default();
        let next = step_player(&state, &forward_ctx(), &cfg);
        let dx = next.position.x - state.player.position.x;
        let dz = next.position.z - state.player.position.z;
        let horizontal = (dx * dx + dz * dz).sqrt();
        assert!((horizontal - cfg.walk_speed * DT).abs() < 1e-5);
        // Heading 0 means +Z forward: no lateral drift.
        assert!(dx.abs() < 1e-6);
    }

    #[test]
    fn test_diagonal_input_is_normalized() {
        let state = create_initial_state(1337);
        let cfg = MovementConfig::default();
        let ctx = TickContext {
            input: InputState {
                forward: true,
                right: true,
                ..Default::default()
            },
            dt: DT,
            ..Default::default()
        };
        let next = step_player(&state, &ctx, &cfg);
        let dx = next.position.x - state.player.position.x;
        let dz = next.position.z - state.player.position.z;
        let horizontal = (dx * dx + dz * dz).sqrt();
        assert!((horizontal - cfg.walk_speed * DT).abs() < 1e-5);
    }

    #[test]
    fn test_walking_snaps_to_ground() {
        let mut state = create_initial_state(1337);
        state.player.position.y = 50.0;
        let next = step_player(&state, &forward_ctx(), &MovementConfig::default());
        let ground = sample_height_at_world(&state.world, next.position.x, next.position.z);
        assert_eq!(next.position.y, ground + 0.6);
    }

    #[test]
    fn test_fly_moves_vertically_and_skips_snap() {
        let mut state = create_initial_state(1337);
        state.player.dev_fly = true;
        state.player.position.y = 20.0;
        let cfg = MovementConfig::default();
        let ctx = TickContext {
            input: InputState {
                ascend: true,
                ..Default::default()
            },
            dt: DT,
            ..Default::default()
        };
        let next = step_player(&state, &ctx, &cfg);
        assert!((next.position.y - (20.0 + cfg.fly_speed * DT)).abs() < 1e-5);
    }

    #[test]
    fn test_noclip_keeps_altitude() {
        let mut state = create_initial_state(1337);
        state.player.dev_noclip = true;
        state.player.position.y = 20.0;
        let next = step_player(&state, &forward_ctx(), &MovementConfig::default());
        assert_eq!(next.position.y, 20.0);
    }

    #[test]
    fn test_zero_dt_is_a_no_op_with_zero_velocity() {
        let mut state = create_initial_state(1337);
        state.player.velocity = Vec3::new(1.0, 2.0, 3.0);
        let ctx = TickContext {
            input: InputState {
                forward: true,
                ..Default::default()
            },
            dt: 0.0,
            ..Default::default()
        };
        let next = step_player(&state, &ctx, &MovementConfig::default());
        assert_eq!(next.position, state.player.position);
        assert_eq!(next.velocity, Vec3::ZERO);
    }
}
