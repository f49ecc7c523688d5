//! Simulation module
//!
//! All gameplay physics lives here. This module must stay free of
//! rendering and platform dependencies:
//! - One fixed tick per frame, advanced by [`tick`]
//! - All randomness from the state's own RNG
//! - Stable iteration order (actors by index, everything else by id)

pub mod actor;
pub mod collision;
pub mod effects;
pub mod field;
pub mod flight;
pub mod jelly;
pub mod pickup;
pub mod projectile;
pub mod snapshot;
pub mod state;
pub mod tick;

pub use actor::{Actor, ActorId, Body, Intent, Lifecycle, ShotRequest};
pub use collision::{CollisionResult, Rect, circle_circle, circle_rect, clamp_to_bounds, reflect_velocity};
pub use effects::{EffectKind, StatusEffects};
pub use field::{FieldNode, NodeId, SpatialField};
pub use flight::Flight;
pub use jelly::{BodyNode, JellyBody};
pub use pickup::{Balloon, Pickup, PickupKind};
pub use projectile::{Projectile, ProjectileKind};
pub use snapshot::Snapshot;
pub use state::{GameEvent, GameState, KillCause, Obstacle};
pub use tick::{TickInput, tick};
