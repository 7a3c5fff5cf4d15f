//! Minimal 3D vector math for the simulation core.
//!
//! The simulation deliberately avoids a full linear-algebra dependency: the
//! only operations it needs are the handful below, and the vector's on-disk
//! shape (`[x, y, z]`) is part of the save format, so we own the type.

mod vec3;

pub use vec3::Vec3;

/// Clamps `value` into `[min, max]`.
#[inline]
pub fn clamp(value: f32, min: f32, max: f32) -> f32 {
    value.max(min).min(max)
}
