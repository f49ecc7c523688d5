//! Collectibles and the balloon target

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::actor::Actor;
use super::effects::EffectKind;

pub const GEM_SIZE: f32 = 10.0;
pub const POWERUP_SIZE: f32 = 20.0;
pub const BALLOON_RADIUS: f32 = 30.0;

const POWERUP_GRAVITY_SCALE: f32 = 0.2;
const POWERUP_DRAG: f32 = 0.99;
const BOB_AMPLITUDE: f32 = 6.0;
/// Bob phase advance per tick, degrees
const BOB_RATE_DEG: f32 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PickupKind {
    Gem,
    PowerUp(EffectKind),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pickup {
    pub id: u32,
    pub kind: PickupKind,
    pub pos: Vec2,
    pub vel: Vec2,
    pub size: f32,
    /// Remaining ticks; gems never expire
    pub ttl: Option<u32>,
}

impl Pickup {
    pub fn gem(id: u32, pos: Vec2) -> Self {
        Self {
            id,
            kind: PickupKind::Gem,
            pos,
            vel: Vec2::ZERO,
            size: GEM_SIZE,
            ttl: None,
        }
    }

    /// A falling power-up that lasts one and a half effect durations
    pub fn power_up(id: u32, effect: EffectKind, pos: Vec2, effect_ticks: u32) -> Self {
        Self {
            id,
            kind: PickupKind::PowerUp(effect),
            pos,
            vel: Vec2::ZERO,
            size: POWERUP_SIZE,
            ttl: Some(effect_ticks.saturating_mul(3) / 2),
        }
    }

    /// Fall and bounce; returns false once expired
    pub fn update(&mut self, gravity: f32, ground_y: f32) -> bool {
        if let Some(ttl) = &mut self.ttl {
            *ttl = ttl.saturating_sub(1);
            if *ttl == 0 {
                return false;
            }
        }
        if self.kind == PickupKind::Gem {
            return true;
        }

        self.vel.y += gravity * POWERUP_GRAVITY_SCALE;
        self.vel *= POWERUP_DRAG;
        self.pos += self.vel;
        let floor = ground_y - self.size * 0.5;
        if self.pos.y > floor {
            self.pos.y = floor;
            self.vel.y *= -0.4;
            self.vel.x *= 0.8;
        }
        true
    }

    /// Overlap test used for power-ups
    pub fn touches(&self, actor: &Actor) -> bool {
        actor.is_alive() && actor.pos.distance(self.pos) < actor.radius * 0.8 + self.size * 0.5
    }
}

/// Drifting target that drops a power-up when popped
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Balloon {
    pub pos: Vec2,
    /// Height the bob oscillates around
    pub base_y: f32,
    pub drift: f32,
    pub radius: f32,
    /// Ticks until it reappears after being popped
    pub respawn_in: Option<u32>,
}

impl Balloon {
    pub fn new(rng: &mut impl Rng, size: Vec2) -> Self {
        let mut balloon = Self {
            pos: Vec2::ZERO,
            base_y: 0.0,
            drift: 0.0,
            radius: BALLOON_RADIUS,
            respawn_in: None,
        };
        balloon.place(rng, size);
        balloon
    }

    fn place(&mut self, rng: &mut impl Rng, size: Vec2) {
        let lo_y = (size.y * 0.15).min(size.y * 0.5);
        let hi_y = (size.y * 0.5).max(lo_y + 1.0);
        self.pos = Vec2::new(rng.random_range(0.0..size.x.max(1.0)), rng.random_range(lo_y..hi_y));
        self.base_y = self.pos.y;
        self.drift = if rng.random::<bool>() { 0.4 } else { -0.4 };
    }

    pub fn is_active(&self) -> bool {
        self.respawn_in.is_none()
    }

    pub fn update(&mut self, time_ticks: u64, width: f32) {
        if !self.is_active() {
            return;
        }
        let phase = (time_ticks as f32 * BOB_RATE_DEG).to_radians();
        self.pos.y = self.base_y + phase.sin() * BOB_AMPLITUDE;
        self.pos.x += self.drift;
        if self.pos.x < -self.radius {
            self.pos.x += width + self.radius * 2.0;
        } else if self.pos.x > width + self.radius {
            self.pos.x -= width + self.radius * 2.0;
        }
    }

    pub fn hit_by(&self, point: Vec2, radius: f32) -> bool {
        self.is_active() && self.pos.distance(point) < self.radius + radius
    }

    pub fn pop(&mut self, respawn_ticks: u32) {
        self.respawn_in = Some(respawn_ticks.max(1));
    }

    /// Count down while popped; returns true when it reappears
    pub fn tick_respawn(&mut self, rng: &mut impl Rng, size: Vec2) -> bool {
        match self.respawn_in {
            Some(t) if t <= 1 => {
                self.respawn_in = None;
                self.place(rng, size);
                true
            }
            Some(t) => {
                self.respawn_in = Some(t - 1);
                false
            }
            None => false,
        }
    }
}
