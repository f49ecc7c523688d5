//! Projectiles
//!
//! One [`Projectile`] type for every kind; per-kind behavior comes from the
//! [`KindParams`] table. A projectile is alive until `dead` is set, which
//! happens on expiry, on a hit, on leaving the viewport, or when its bounce
//! budget runs out. Bombs set `detonate` instead and the game loop turns
//! them into an explosion.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::actor::{Actor, ShotRequest};
use super::collision::{circle_rect, reflect_velocity, Rect, DEGENERATE_DISTANCE};
use super::field::{Erosion, SpatialField};
use super::state::GameEvent;
use crate::from_angle_deg;

/// Margin past the viewport before a projectile counts as offscreen
const OFFSCREEN_MARGIN: f32 = 50.0;
/// Extra reach of the bouncy weapon's splash erosion
const SPLASH_REACH: f32 = 18.0;
const SPLASH_FACTOR: f32 = 0.35;
const CHICKEN_GROUND_RESTITUTION: f32 = 0.7;
const CHICKEN_REST_FRICTION: f32 = 0.9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProjectileKind {
    Bullet,
    BouncyWeapon,
    Bubble,
    Chicken,
    Bomb,
}

/// What a projectile does when it meets a field node
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TerrainResponse {
    /// Dies, carving the node by `carve`
    Stop { carve: f32 },
    /// Reflects, spending one bounce and eroding the node
    Bounce { restitution: f32, damping: f32 },
    /// Passes through
    Ignore,
    /// Detonates
    Explode,
}

/// Effect on an actor that is hit
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HitEffect {
    Kill,
    Stun { knockback: f32 },
    Trap,
    Explode,
}

/// Per-kind behavior parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KindParams {
    /// Launch speed along the shot angle
    pub speed: f32,
    pub radius: f32,
    /// Ticks before expiry (fuse for bombs)
    pub life: u32,
    pub bounces: u32,
    /// Multiplier on world gravity; negative floats upward
    pub gravity_scale: f32,
    /// Velocity multiplier per tick
    pub drag: f32,
    pub terrain: TerrainResponse,
    pub hit: HitEffect,
    /// Actor contact distance is `(actor.radius + radius) * hit_factor`
    pub hit_factor: f32,
}

impl ProjectileKind {
    pub fn params(self) -> KindParams {
        match self {
            ProjectileKind::Bullet => KindParams {
                speed: 10.0,
                radius: 3.0,
                life: 120,
                bounces: 0,
                gravity_scale: 0.0,
                drag: 1.0,
                terrain: TerrainResponse::Stop { carve: 2.0 },
                hit: HitEffect::Kill,
                hit_factor: 0.8,
            },
            ProjectileKind::BouncyWeapon => KindParams {
                speed: 8.0,
                radius: 8.0,
                life: 420,
                bounces: 6,
                gravity_scale: 0.6,
                drag: 1.0,
                terrain: TerrainResponse::Bounce {
                    restitution: 0.9,
                    damping: 0.94,
                },
                hit: HitEffect::Stun { knockback: 3.0 },
                hit_factor: 0.8,
            },
            ProjectileKind::Bubble => KindParams {
                speed: 4.0,
                radius: 12.5,
                life: 240,
                bounces: 0,
                gravity_scale: -0.05,
                drag: 0.995,
                terrain: TerrainResponse::Ignore,
                hit: HitEffect::Trap,
                hit_factor: 1.0,
            },
            ProjectileKind::Chicken => KindParams {
                speed: 6.0,
                radius: 10.0,
                life: 300,
                bounces: 3,
                gravity_scale: 1.0,
                drag: 0.995,
                terrain: TerrainResponse::Ignore,
                hit: HitEffect::Kill,
                hit_factor: 1.0,
            },
            ProjectileKind::Bomb => KindParams {
                speed: 1.0,
                radius: 6.0,
                life: 90,
                bounces: 0,
                gravity_scale: 1.5,
                drag: 0.985,
                terrain: TerrainResponse::Explode,
                hit: HitEffect::Explode,
                hit_factor: 0.7,
            },
        }
    }

    /// True if a direct hit can kill
    pub fn is_lethal(self) -> bool {
        matches!(self.params().hit, HitEffect::Kill | HitEffect::Explode)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectileKind::Bullet => "bullet",
            ProjectileKind::BouncyWeapon => "bouncy",
            ProjectileKind::Bubble => "bubble",
            ProjectileKind::Chicken => "chicken",
            ProjectileKind::Bomb => "bomb",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projectile {
    pub id: u32,
    pub pos: Vec2,
    pub vel: Vec2,
    pub owner: usize,
    pub kind: ProjectileKind,
    pub life: u32,
    pub bounces_left: u32,
    pub dead: bool,
    /// Set on a bomb that should explode this tick
    pub detonate: bool,
}

impl Projectile {
    pub fn spawn(id: u32, shot: &ShotRequest) -> Self {
        let p = shot.kind.params();
        let vel = match shot.kind {
            ProjectileKind::Bomb => shot.carrier_vel * 0.5 + Vec2::new(0.0, p.speed),
            _ => from_angle_deg(shot.angle_deg, p.speed),
        };
        Self {
            id,
            pos: shot.pos,
            vel,
            owner: shot.owner,
            kind: shot.kind,
            life: p.life,
            bounces_left: p.bounces,
            dead: false,
            detonate: false,
        }
    }

    pub fn radius(&self) -> f32 {
        self.kind.params().radius
    }

    /// Apply gravity and drag, move, and count down life
    pub fn integrate(&mut self, gravity: f32) {
        if self.dead || self.detonate {
            return;
        }
        let p = self.kind.params();
        self.vel.y += gravity * p.gravity_scale;
        self.vel *= p.drag;
        self.pos += self.vel;
        if !self.pos.is_finite() || !self.vel.is_finite() {
            log::warn!("Discarding {} projectile with non-finite state", self.kind.as_str());
            self.dead = true;
            return;
        }

        self.life = self.life.saturating_sub(1);
        if self.life == 0 {
            if self.kind == ProjectileKind::Bomb {
                self.detonate = true;
            } else {
                self.dead = true;
            }
        }
    }

    /// Resolve contact with the field; returns true if anything was hit
    pub fn collide_terrain(&mut self, field: &mut SpatialField, events: &mut Vec<GameEvent>) -> bool {
        if self.dead || self.detonate || field.is_empty() {
            return false;
        }
        let radius = self.radius();
        let terrain = self.kind.params().terrain;
        if terrain == TerrainResponse::Ignore {
            return false;
        }

        for id in field.query(self.pos, radius) {
            let Some(node) = field.get(id) else {
                continue;
            };
            let (node_pos, node_radius) = (node.pos, node.radius);
            let offset = self.pos - node_pos;
            let dist = offset.length();
            if dist <= DEGENERATE_DISTANCE || dist >= radius + node_radius {
                continue;
            }

            match terrain {
                TerrainResponse::Ignore => return false,
                TerrainResponse::Stop { carve } => {
                    let removed = field.erode(id, carve) == Erosion::Removed;
                    events.push(GameEvent::Eroded { pos: self.pos, removed });
                    self.dead = true;
                    return true;
                }
                TerrainResponse::Explode => {
                    self.detonate = true;
                    return true;
                }
                TerrainResponse::Bounce { restitution, damping } => {
                    let normal = offset / dist;
                    if self.vel.dot(normal) >= 0.0 {
                        continue;
                    }
                    self.pos += normal * (radius + node_radius - dist);
                    self.vel = reflect_velocity(self.vel, normal, restitution) * damping;

                    let damage = 1.6 * (self.vel.length() / 8.0).clamp(0.5, 3.0);
                    let removed = field.erode(id, damage) == Erosion::Removed;
                    for other in field.query(node_pos, node_radius + SPLASH_REACH) {
                        if other != id {
                            field.erode(other, damage * SPLASH_FACTOR);
                        }
                    }
                    events.push(GameEvent::Eroded { pos: node_pos, removed });

                    self.bounces_left = self.bounces_left.saturating_sub(1);
                    if self.bounces_left == 0 {
                        self.dead = true;
                    }
                    return true;
                }
            }
        }
        false
    }

    /// Resolve contact with the viewport edges and the ground line
    pub fn collide_bounds(&mut self, width: f32, ground_y: f32) {
        if self.dead || self.detonate {
            return;
        }
        let r = self.radius();
        match self.kind {
            ProjectileKind::Bullet => {
                if self.pos.y + r >= ground_y {
                    self.dead = true;
                }
            }
            ProjectileKind::Bomb => {
                if self.pos.y + r >= ground_y {
                    self.pos.y = ground_y - r;
                    self.detonate = true;
                }
            }
            ProjectileKind::Chicken => {
                if self.pos.y + r < ground_y {
                    return;
                }
                self.pos.y = ground_y - r;
                if self.bounces_left > 0 && self.vel.y > 0.0 {
                    self.vel.y = -self.vel.y * CHICKEN_GROUND_RESTITUTION;
                    self.bounces_left -= 1;
                } else {
                    // Out of bounces: settle
                    self.vel.y = 0.0;
                    self.vel.x *= CHICKEN_REST_FRICTION;
                }
            }
            ProjectileKind::BouncyWeapon => {
                if self.pos.x - r < 0.0 {
                    self.pos.x = r;
                    self.vel.x = self.vel.x.abs();
                } else if self.pos.x + r > width {
                    self.pos.x = width - r;
                    self.vel.x = -self.vel.x.abs();
                }
                if self.pos.y + r > ground_y {
                    self.pos.y = ground_y - r;
                    self.vel.y = -self.vel.y.abs() * 0.9;
                    self.bounces_left = self.bounces_left.saturating_sub(1);
                    if self.bounces_left == 0 {
                        self.dead = true;
                    }
                }
            }
            ProjectileKind::Bubble => {}
        }
    }

    /// Resolve contact with a static obstacle; returns true on contact
    ///
    /// Bubbles drift through obstacles untouched.
    pub fn collide_obstacle(&mut self, rect: &Rect) -> bool {
        if self.dead || self.detonate || self.kind == ProjectileKind::Bubble {
            return false;
        }
        let hit = circle_rect(self.pos, self.radius(), rect);
        if !hit.hit {
            return false;
        }
        match self.kind {
            ProjectileKind::Bullet => self.dead = true,
            ProjectileKind::Bubble => {}
            ProjectileKind::Bomb => self.detonate = true,
            ProjectileKind::Chicken | ProjectileKind::BouncyWeapon => {
                self.pos += hit.normal * hit.penetration;
                self.vel = reflect_velocity(self.vel, hit.normal, CHICKEN_GROUND_RESTITUTION);
            }
        }
        true
    }

    /// Contact test against an actor's fixed collision radius
    ///
    /// The owner and dead actors are never hit.
    pub fn check_collision(&self, actor: &Actor) -> bool {
        if self.dead || self.detonate || actor.id == self.owner || !actor.is_alive() {
            return false;
        }
        let p = self.kind.params();
        self.pos.distance(actor.pos) < (actor.radius + p.radius) * p.hit_factor
    }

    /// Consume the projectile on a hit and report what it does
    pub fn on_hit(&mut self) -> HitEffect {
        let hit = self.kind.params().hit;
        if hit == HitEffect::Explode {
            self.detonate = true;
        } else {
            self.dead = true;
        }
        hit
    }

    /// Dead, or far enough outside the viewport to forget
    pub fn is_expired(&self, size: Vec2) -> bool {
        self.dead
            || self.pos.x < -OFFSCREEN_MARGIN
            || self.pos.x > size.x + OFFSCREEN_MARGIN
            || self.pos.y < -OFFSCREEN_MARGIN
            || self.pos.y > size.y + OFFSCREEN_MARGIN
    }
}
