//! Read-only views for renderers
//!
//! Everything a renderer needs to draw a frame without physics knowledge.
//! Serializes to JSON for the headless binary.

use glam::Vec2;
use serde::Serialize;

use super::actor::{Actor, ActorId, Body, Lifecycle};
use super::effects::EffectKind;
use super::pickup::PickupKind;
use super::projectile::ProjectileKind;
use super::state::GameState;

/// Radius around a gem used for its exposure glow
const EXPOSURE_CHECK_RADIUS: f32 = 18.0;

#[derive(Debug, Clone, Serialize)]
pub struct ActorView {
    pub id: ActorId,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub facing: f32,
    pub lifecycle: Lifecycle,
    pub effects: Vec<(EffectKind, u32)>,
    /// Ring node positions for jelly bodies
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ring: Vec<Vec2>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heading: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub respawn_in: Option<u32>,
}

impl From<&Actor> for ActorView {
    fn from(actor: &Actor) -> Self {
        Self {
            id: actor.id,
            pos: actor.pos,
            vel: actor.vel,
            radius: actor.radius,
            facing: actor.facing,
            lifecycle: actor.lifecycle(),
            effects: actor.effects.iter().collect(),
            ring: match &actor.body {
                Body::Jelly(body) => body.outline(),
                _ => Vec::new(),
            },
            heading: actor.heading(),
            respawn_in: actor.respawn_in(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectileView {
    pub id: u32,
    pub kind: ProjectileKind,
    pub owner: ActorId,
    pub pos: Vec2,
    pub radius: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct PickupView {
    pub id: u32,
    pub kind: PickupKind,
    pub pos: Vec2,
    pub size: f32,
    /// 0 = buried, 1 = fully exposed
    pub exposure: f32,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct NodeView {
    pub pos: Vec2,
    pub radius: f32,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct BalloonView {
    pub pos: Vec2,
    pub radius: f32,
    pub active: bool,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct ObstacleView {
    pub min: Vec2,
    pub max: Vec2,
    pub destroyed: bool,
}

/// One frame of state
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub time_ticks: u64,
    pub variant: &'static str,
    pub width: f32,
    pub height: f32,
    pub ground_y: f32,
    pub scores: Vec<u32>,
    pub actors: Vec<ActorView>,
    pub projectiles: Vec<ProjectileView>,
    pub pickups: Vec<PickupView>,
    pub field: Vec<NodeView>,
    pub balloons: Vec<BalloonView>,
    pub obstacles: Vec<ObstacleView>,
}

impl Snapshot {
    pub fn capture(state: &GameState) -> Self {
        Self {
            time_ticks: state.time_ticks,
            variant: state.settings.variant.as_str(),
            width: state.settings.width,
            height: state.settings.height,
            ground_y: state.ground_y(),
            scores: state.scores.clone(),
            actors: state.actors.iter().map(ActorView::from).collect(),
            projectiles: state
                .projectiles
                .iter()
                .map(|p| ProjectileView {
                    id: p.id,
                    kind: p.kind,
                    owner: p.owner,
                    pos: p.pos,
                    radius: p.radius(),
                })
                .collect(),
            pickups: state
                .pickups
                .iter()
                .map(|p| PickupView {
                    id: p.id,
                    kind: p.kind,
                    pos: p.pos,
                    size: p.size,
                    exposure: match p.kind {
                        PickupKind::Gem => 1.0 - state.field.coverage(p.pos, EXPOSURE_CHECK_RADIUS),
                        PickupKind::PowerUp(_) => 1.0,
                    },
                })
                .collect(),
            field: state
                .field
                .iter()
                .map(|n| NodeView {
                    pos: n.pos,
                    radius: n.radius,
                })
                .collect(),
            balloons: state
                .balloons
                .iter()
                .map(|b| BalloonView {
                    pos: b.pos,
                    radius: b.radius,
                    active: b.is_active(),
                })
                .collect(),
            obstacles: state
                .obstacles
                .iter()
                .map(|o| ObstacleView {
                    min: o.rect.min,
                    max: o.rect.max,
                    destroyed: o.destroyed,
                })
                .collect(),
        }
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
