//! Jelly Arena - simulation core for two-player jelly digging and biplane battles
//!
//! Core modules:
//! - `sim`: Frame-driven simulation (terrain field, actors, projectiles, effects)
//! - `settings`: Data-driven tuning and variant selection
//! - `error`: Configuration errors (the simulation itself never fails)
//!
//! Rendering, audio and raw keyboard handling are external: they feed
//! [`sim::TickInput`] in and read [`sim::Snapshot`] / [`sim::GameEvent`] out.

pub mod error;
pub mod settings;
pub mod sim;

pub use error::ConfigError;
pub use settings::{BodyModel, Settings, Variant};

use glam::Vec2;

/// Authored tuning constants (one tick = one frame)
pub mod consts {
    /// Default viewport
    pub const DEFAULT_WIDTH: f32 = 1280.0;
    pub const DEFAULT_HEIGHT: f32 = 720.0;

    /// Jelly miner world gravity (per tick²)
    pub const MINER_GRAVITY: f32 = 0.55;
    /// Biplane world gravity (per tick²)
    pub const FLIGHT_GRAVITY: f32 = 0.1;

    /// Cave field
    pub const FIELD_SPACING: f32 = 40.0;
    pub const FIELD_NODE_RADIUS: f32 = 28.0;
    pub const FIELD_MARGIN: f32 = 60.0;
    /// Nodes smaller than this are removed from the field
    pub const FIELD_MIN_RADIUS: f32 = 3.0;

    /// Digger body
    pub const DIGGER_RADIUS: f32 = 20.0;
    pub const DIGGER_MASS: f32 = 1.6;
    pub const DIGGER_AIR_DAMPING: f32 = 0.985;
    pub const DIGGER_STUN_DAMPING: f32 = 0.92;
    pub const BOUNDS_MARGIN: f32 = 12.0;
    pub const WALL_RESTITUTION: f32 = 0.3;
    pub const GROUND_RESTITUTION: f32 = 0.35;
    /// Minimum input-into-surface alignment before a node is eroded
    pub const DIG_ALIGNMENT_MIN: f32 = 0.12;
    pub const DIG_PRESSURE_CAP: f32 = 1.8;
    pub const DIG_RATE: f32 = 1.6;

    /// Gem collection
    pub const GEM_COUNT: usize = 12;
    pub const GEM_COVER_CHECK_RADIUS: f32 = 8.0;
    pub const GEM_COVER_THRESHOLD: f32 = 6.0;

    /// Shooting
    pub const SHOOT_COOLDOWN_TICKS: u32 = 18;
    pub const BOMB_COOLDOWN_TICKS: u32 = 45;

    /// Status durations
    pub const STUN_TICKS: u32 = 360;
    pub const BUBBLE_TRAP_TICKS: u32 = 180;
    pub const POWERUP_TICKS: u32 = 600;
    pub const RESPAWN_DELAY_TICKS: u32 = 120;
    pub const BALLOON_RESPAWN_TICKS: u32 = 360;
    /// Fraction of remaining shield time consumed per absorbed hit
    pub const SHIELD_HIT_COST: f32 = 0.5;

    /// Biplane flight
    pub const PLANE_RADIUS: f32 = 22.0;
    pub const THRUST_FORCE: f32 = 0.16;
    pub const LIFT_FACTOR: f32 = 0.012;
    pub const TURN_SPEED: f32 = 2.5;
    pub const GROUND_FRICTION: f32 = 0.95;
    pub const MIN_TAKEOFF_SPEED: f32 = 1.8;
    pub const MAX_LANDING_SPEED: f32 = 2.5;
    pub const STALL_CLIMB_DEG: f32 = 70.0;
    pub const STALL_RECOVERY_CLIMB_DEG: f32 = 50.0;
    pub const STALL_LIFT_FACTOR: f32 = 0.2;
    pub const PLANE_COLLISION_FACTOR: f32 = 0.8;
    pub const GROUND_HEIGHT: f32 = 40.0;

    /// Bomb
    pub const BOMB_EXPLOSION_RADIUS: f32 = 70.0;
}

/// Normalize an angle in degrees to (-180, 180]
#[inline]
pub fn normalize_angle_deg(mut angle: f32) -> f32 {
    if !angle.is_finite() {
        return 0.0;
    }
    angle %= 360.0;
    if angle > 180.0 {
        angle -= 360.0;
    } else if angle <= -180.0 {
        angle += 360.0;
    }
    angle
}

/// Vector of length `len` pointing along `deg` (screen space, +y down)
#[inline]
pub fn from_angle_deg(deg: f32, len: f32) -> Vec2 {
    let rad = deg.to_radians();
    Vec2::new(rad.cos() * len, rad.sin() * len)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_angle_deg() {
        assert_eq!(normalize_angle_deg(0.0), 0.0);
        assert!((normalize_angle_deg(190.0) - (-170.0)).abs() < 1e-4);
        assert!((normalize_angle_deg(-190.0) - 170.0).abs() < 1e-4);
        assert!((normalize_angle_deg(720.0 + 45.0) - 45.0).abs() < 1e-4);
        assert_eq!(normalize_angle_deg(f32::NAN), 0.0);
    }

    #[test]
    fn test_from_angle_deg() {
        let down = from_angle_deg(90.0, 8.0);
        assert!(down.x.abs() < 1e-4);
        assert!((down.y - 8.0).abs() < 1e-4);
    }
}
