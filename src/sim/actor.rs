//! Player-controlled actors
//!
//! One [`Actor`] per player, created at reset and never destroyed. Its body
//! is a rigid digger circle, a spring-mesh jelly, or a biplane; all three
//! share the same lifecycle, effects and fixed collision radius.
//!
//! Lifecycle is derived, never stored twice: an actor with a respawn
//! countdown is `Dead`; otherwise `Bubbled` / `Stunned` follow the matching
//! status effect timers, and everything else is `Active`.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::collision::{clamp_to_bounds, DEGENERATE_DISTANCE};
use super::effects::{EffectKind, StatusEffects};
use super::field::{Erosion, SpatialField};
use super::flight::{Flight, FlightOutcome};
use super::jelly::JellyBody;
use super::projectile::ProjectileKind;
use super::state::GameEvent;
use crate::from_angle_deg;
use crate::settings::{DiggerTuning, JellyParams, Rules, Settings};

/// Index of an actor in [`super::GameState::actors`]
pub type ActorId = usize;

/// Held input for one actor this tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intent {
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
    pub shoot: bool,
}

impl Intent {
    /// Unnormalized direction the player is pushing (+y down)
    pub fn direction(&self) -> Vec2 {
        let mut dir = Vec2::ZERO;
        if self.left {
            dir.x -= 1.0;
        }
        if self.right {
            dir.x += 1.0;
        }
        if self.up {
            dir.y -= 1.0;
        }
        if self.down {
            dir.y += 1.0;
        }
        dir
    }
}

/// Derived lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Lifecycle {
    Active,
    Stunned,
    Bubbled,
    Dead,
}

/// Physical body of an actor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Body {
    Digger,
    Jelly(JellyBody),
    Plane(Flight),
}

/// A projectile an actor wants to fire this tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShotRequest {
    pub kind: ProjectileKind,
    pub owner: ActorId,
    pub pos: Vec2,
    pub angle_deg: f32,
    /// Velocity of the shooter (bombs inherit part of it)
    pub carrier_vel: Vec2,
}

/// Result of moving an actor for one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Motion {
    Moved,
    /// Landed too hard
    Crashed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    pub id: ActorId,
    pub pos: Vec2,
    pub vel: Vec2,
    /// Collision radius; cosmetic effects never change it
    pub radius: f32,
    pub mass: f32,
    /// +1 facing right, -1 facing left
    pub facing: f32,
    pub spawn: Vec2,
    spawn_facing: f32,
    pub intent: Intent,
    prev_intent: Intent,
    pub shoot_cooldown: u32,
    pub bomb_cooldown: u32,
    pub effects: StatusEffects,
    respawn_in: Option<u32>,
    pub body: Body,
}

impl Actor {
    fn with_body(id: ActorId, spawn: Vec2, facing: f32, radius: f32, mass: f32, body: Body) -> Self {
        Self {
            id,
            pos: spawn,
            vel: Vec2::ZERO,
            radius,
            mass,
            facing,
            spawn,
            spawn_facing: facing,
            intent: Intent::default(),
            prev_intent: Intent::default(),
            shoot_cooldown: 0,
            bomb_cooldown: 0,
            effects: StatusEffects::new(),
            respawn_in: None,
            body,
        }
    }

    /// Rigid-circle digger
    pub fn digger(id: ActorId, spawn: Vec2, tuning: &DiggerTuning) -> Self {
        Self::with_body(id, spawn, 1.0, tuning.radius, tuning.mass, Body::Digger)
    }

    /// Spring-mesh jelly whose rest radius matches the digger radius
    pub fn jelly(id: ActorId, spawn: Vec2, tuning: &DiggerTuning, params: &JellyParams) -> Self {
        let body = JellyBody::new(spawn, tuning.radius, params.clone());
        Self::with_body(id, spawn, 1.0, tuning.radius, params.center_mass, Body::Jelly(body))
    }

    /// Biplane parked at `spawn`, nose along `facing`
    pub fn plane(id: ActorId, spawn: Vec2, facing: f32, settings: &Settings) -> Self {
        let heading = if facing < 0.0 { 180.0 } else { 0.0 };
        Self::with_body(
            id,
            spawn,
            facing.signum(),
            settings.flight.radius,
            1.0,
            Body::Plane(Flight::new(heading)),
        )
    }

    pub fn lifecycle(&self) -> Lifecycle {
        if self.respawn_in.is_some() {
            Lifecycle::Dead
        } else if self.effects.is_active(EffectKind::Bubbled) {
            Lifecycle::Bubbled
        } else if self.effects.is_active(EffectKind::Stun) {
            Lifecycle::Stunned
        } else {
            Lifecycle::Active
        }
    }

    pub fn is_alive(&self) -> bool {
        self.respawn_in.is_none()
    }

    /// Ticks until respawn while dead
    pub fn respawn_in(&self) -> Option<u32> {
        self.respawn_in
    }

    /// Latch this tick's input, remembering the previous one for edges
    pub fn set_intent(&mut self, intent: Intent) {
        self.prev_intent = self.intent;
        self.intent = intent;
    }

    /// Decrement weapon cooldowns
    pub fn tick_cooldowns(&mut self) {
        self.shoot_cooldown = self.shoot_cooldown.saturating_sub(1);
        self.bomb_cooldown = self.bomb_cooldown.saturating_sub(1);
    }

    /// Integrate motion for one tick under the settings of the active variant
    pub fn update_motion(&mut self, settings: &Settings) -> Motion {
        let size = Vec2::new(settings.width, settings.height);
        match self.lifecycle() {
            Lifecycle::Dead => return Motion::Moved,
            Lifecycle::Bubbled => {
                self.float_in_bubble(&settings.digger, size);
                return Motion::Moved;
            }
            Lifecycle::Active | Lifecycle::Stunned => {}
        }

        let control = self.lifecycle() == Lifecycle::Active;
        let t = &settings.digger;
        let force = if control && !matches!(self.body, Body::Plane(_)) {
            let boost = self.effects.speed_multiplier();
            self.thrust(t, boost)
        } else {
            Vec2::ZERO
        };

        match &mut self.body {
            Body::Digger => {
                if !control {
                    self.vel *= t.stun_damping;
                }
                self.vel += (force + Vec2::new(0.0, t.gravity * self.mass)) / self.mass;
                self.vel *= t.air_damping;
                self.pos += self.vel;
                clamp_to_bounds(
                    &mut self.pos,
                    &mut self.vel,
                    size,
                    t.bounds_margin,
                    t.wall_restitution,
                    t.ground_restitution,
                );
            }
            Body::Jelly(body) => {
                if !control {
                    body.center.vel *= t.stun_damping;
                }
                let min = Vec2::splat(t.bounds_margin);
                let max = (size - Vec2::splat(t.bounds_margin)).max(min);
                body.step(force, t.gravity, min, max);
                self.pos = body.center.pos;
                self.vel = body.center.vel;
            }
            Body::Plane(flight) => {
                let trampoline = self.effects.is_active(EffectKind::Trampoline);
                let boost = if self.effects.is_active(EffectKind::SpeedBoost) {
                    settings.flight.speed_boost
                } else {
                    1.0
                };
                let outcome = flight.step(
                    &mut self.pos,
                    &mut self.vel,
                    &self.intent,
                    control,
                    boost,
                    trampoline,
                    &settings.flight,
                    size,
                );
                let dx = flight.direction().x;
                if dx.abs() > 0.05 {
                    self.facing = dx.signum();
                }
                if outcome == FlightOutcome::Crashed {
                    return Motion::Crashed;
                }
            }
        }
        Motion::Moved
    }

    /// Input force for ground bodies; also updates facing
    fn thrust(&mut self, t: &DiggerTuning, boost: f32) -> Vec2 {
        let mut force = Vec2::ZERO;
        if self.intent.left {
            force.x -= t.thrust_side * boost;
            self.facing = -1.0;
        }
        if self.intent.right {
            force.x += t.thrust_side * boost;
            self.facing = 1.0;
        }
        if self.intent.up {
            force.y -= t.thrust_up * boost;
        }
        if self.intent.down {
            force.y += t.thrust_down * boost;
        }
        force
    }

    /// Bubbled actors drift upward with no control
    fn float_in_bubble(&mut self, t: &DiggerTuning, size: Vec2) {
        let start = self.pos;
        self.vel *= t.stun_damping;
        self.vel.y -= t.bubble_buoyancy;
        self.pos += self.vel;
        clamp_to_bounds(
            &mut self.pos,
            &mut self.vel,
            size,
            t.bounds_margin,
            t.wall_restitution,
            t.ground_restitution,
        );
        if let Body::Jelly(body) = &mut self.body {
            body.translate(self.pos - start);
            body.set_velocity(self.vel);
        }
    }

    /// Push out of overlapping field nodes and dig into the ones the
    /// player is pushing against
    pub fn resolve_field(
        &mut self,
        field: &mut SpatialField,
        t: &DiggerTuning,
        rng: &mut impl Rng,
        events: &mut Vec<GameEvent>,
    ) {
        if !self.is_alive() || matches!(self.body, Body::Plane(_)) || field.is_empty() {
            return;
        }

        let start = self.pos;
        let input = if self.lifecycle() == Lifecycle::Active {
            self.intent.direction()
        } else {
            Vec2::ZERO
        };

        for id in field.query(self.pos, self.radius + field.node_radius() * 1.2) {
            let Some(node) = field.get(id) else {
                continue;
            };
            let to_node = node.pos - self.pos;
            let dist = to_node.length();
            if dist <= DEGENERATE_DISTANCE {
                continue;
            }
            let overlap = self.radius + node.radius - dist;
            if overlap <= 0.0 {
                continue;
            }

            let normal = to_node / dist;
            self.pos -= normal * overlap * 0.5;
            let vn = self.vel.dot(normal);
            if vn > 0.0 {
                self.vel -= normal * vn * rng.random_range(0.8f32..=1.0);
            }

            if input.length() <= t.dig_alignment_min {
                continue;
            }
            let alignment = input.normalize().dot(normal);
            if alignment > t.dig_alignment_min {
                let pressure = (alignment * t.dig_pressure_cap).clamp(0.0, t.dig_pressure_cap);
                let removed = field.erode(id, t.dig_rate * pressure) == Erosion::Removed;
                events.push(GameEvent::Eroded {
                    pos: self.pos + normal * self.radius,
                    removed,
                });
            }
        }

        if let Body::Jelly(body) = &mut self.body {
            body.translate(self.pos - start);
            body.center.vel = self.vel;
        }
    }

    /// Fire whatever the current input and cooldowns allow
    pub fn take_shots(&mut self, rules: &Rules, rng: &mut impl Rng) -> Vec<ShotRequest> {
        let mut shots = Vec::new();
        if self.lifecycle() != Lifecycle::Active {
            return shots;
        }

        let cooldown = ((rules.shoot_cooldown_ticks as f32 * self.effects.cooldown_multiplier())
            .round() as u32)
            .max(1);

        match &self.body {
            Body::Digger | Body::Jelly(_) => {
                let kind = self
                    .effects
                    .weapon_override()
                    .unwrap_or(ProjectileKind::BouncyWeapon);
                let down_pressed = self.intent.down && !self.prev_intent.down;
                if self.shoot_cooldown == 0 && self.intent.shoot {
                    let base: f32 = if self.facing < 0.0 { 180.0 } else { 0.0 };
                    let angle = base + rng.random_range(-10.0f32..=10.0);
                    shots.push(self.shot(kind, angle));
                    self.shoot_cooldown = cooldown;
                } else if self.shoot_cooldown == 0 && down_pressed {
                    let angle = 90.0 + rng.random_range(-6.0f32..=6.0);
                    shots.push(self.shot(kind, angle));
                    self.shoot_cooldown = cooldown;
                }
            }
            Body::Plane(flight) => {
                let heading = flight.heading;
                if self.shoot_cooldown == 0 && self.intent.shoot {
                    let kind = self
                        .effects
                        .weapon_override()
                        .unwrap_or(ProjectileKind::Bullet);
                    let spread: &[f32] = if self.effects.shot_count() >= 3 {
                        &[-10.0, 0.0, 10.0]
                    } else {
                        &[0.0]
                    };
                    for offset in spread {
                        shots.push(self.shot(kind, heading + offset));
                    }
                    self.shoot_cooldown = cooldown;
                }
                if self.bomb_cooldown == 0
                    && self.intent.down
                    && self.effects.is_active(EffectKind::Bomb)
                {
                    shots.push(ShotRequest {
                        kind: ProjectileKind::Bomb,
                        owner: self.id,
                        pos: self.pos + Vec2::new(0.0, self.radius * 0.6),
                        angle_deg: 90.0,
                        carrier_vel: self.vel,
                    });
                    self.bomb_cooldown = rules.bomb_cooldown_ticks;
                }
            }
        }
        shots
    }

    fn shot(&self, kind: ProjectileKind, angle_deg: f32) -> ShotRequest {
        ShotRequest {
            kind,
            owner: self.id,
            pos: self.pos + from_angle_deg(angle_deg, self.radius * 1.2),
            angle_deg,
            carrier_vel: self.vel,
        }
    }

    /// True if this actor can pick up an item at `point`
    ///
    /// The actor must be close enough, and no field node near the item may
    /// still be larger than the cover threshold.
    pub fn can_collect(&self, point: Vec2, size: f32, field: &SpatialField, rules: &Rules) -> bool {
        if !self.is_alive() {
            return false;
        }
        let reach = size * 0.9;
        let near = match &self.body {
            Body::Jelly(body) => body.touches(point, reach),
            _ => self.pos.distance(point) <= self.radius + reach,
        };
        near && !field.is_covered(point, rules.gem_cover_check_radius, rules.gem_cover_threshold)
    }

    /// Enter the dead state, clearing every effect
    ///
    /// Returns false if the actor was already dead.
    pub fn kill(&mut self, respawn_ticks: u32) -> bool {
        if !self.is_alive() {
            return false;
        }
        self.effects.clear();
        self.respawn_in = Some(respawn_ticks.max(1));
        self.vel = Vec2::ZERO;
        true
    }

    /// Count down a pending respawn; returns true on the tick it happens
    pub fn tick_respawn(&mut self, settings: &Settings) -> bool {
        match self.respawn_in {
            Some(t) if t <= 1 => {
                self.respawn(settings);
                true
            }
            Some(t) => {
                self.respawn_in = Some(t - 1);
                false
            }
            None => false,
        }
    }

    /// Back to the spawn point with a clean slate
    pub fn respawn(&mut self, settings: &Settings) {
        self.respawn_in = None;
        self.pos = self.spawn;
        self.vel = Vec2::ZERO;
        self.facing = self.spawn_facing;
        self.effects.clear();
        self.shoot_cooldown = 0;
        self.bomb_cooldown = 0;
        match &mut self.body {
            Body::Digger => {}
            Body::Jelly(body) => {
                *body = JellyBody::new(self.spawn, body.rest_radius, settings.jelly.clone());
            }
            Body::Plane(flight) => {
                *flight = Flight::new(if self.spawn_facing < 0.0 { 180.0 } else { 0.0 });
            }
        }
    }

    /// Move to a new spot without touching anything else
    pub fn teleport(&mut self, pos: Vec2) {
        let delta = pos - self.pos;
        self.pos = pos;
        if let Body::Jelly(body) = &mut self.body {
            body.translate(delta);
        }
    }

    /// Plane heading, if this is a plane
    pub fn heading(&self) -> Option<f32> {
        match &self.body {
            Body::Plane(flight) => Some(flight.heading),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::FieldConfig;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn settings() -> Settings {
        Settings {
            width: 800.0,
            height: 600.0,
            ..Settings::default()
        }
    }

    #[test]
    fn test_gravity_pulls_digger_to_floor() {
        let s = settings();
        let mut actor = Actor::digger(0, Vec2::new(400.0, 100.0), &s.digger);
        for _ in 0..300 {
            actor.update_motion(&s);
        }
        assert!((actor.pos.y - (s.height - s.digger.bounds_margin)).abs() < 1.0);
        assert_eq!(actor.lifecycle(), Lifecycle::Active);
    }

    #[test]
    fn test_stun_suppresses_input() {
        let s = settings();
        let mut actor = Actor::digger(0, Vec2::new(400.0, 588.0), &s.digger);
        actor.effects.extend(EffectKind::Stun, 10);
        actor.set_intent(Intent {
            right: true,
            ..Default::default()
        });
        actor.update_motion(&s);
        assert_eq!(actor.lifecycle(), Lifecycle::Stunned);
        assert!(actor.vel.x.abs() < 1e-5);
        assert!(actor.take_shots(&s.rules, &mut Pcg32::seed_from_u64(1)).is_empty());
    }

    #[test]
    fn test_digging_requires_pushing_into_node() {
        let s = settings();
        let mut rng = Pcg32::seed_from_u64(3);
        let node_pos = Vec2::new(400.0, 300.0);
        let mut field = SpatialField::from_nodes(FieldConfig::default(), [(node_pos, 28.0)]);
        let mut events = Vec::new();

        // Overlapping the node from the left, no input: pushed out, no digging
        let mut actor = Actor::digger(0, node_pos - Vec2::new(40.0, 0.0), &s.digger);
        actor.resolve_field(&mut field, &s.digger, &mut rng, &mut events);
        assert!(events.is_empty());
        assert_eq!(field.get(0).unwrap().radius, 28.0);
        assert!(actor.pos.x < node_pos.x - 40.0);

        // Pushing away from the node: still no digging
        let mut actor = Actor::digger(0, node_pos - Vec2::new(40.0, 0.0), &s.digger);
        actor.set_intent(Intent {
            left: true,
            ..Default::default()
        });
        actor.resolve_field(&mut field, &s.digger, &mut rng, &mut events);
        assert!(events.is_empty());

        // Pushing into it: erodes
        let mut actor = Actor::digger(0, node_pos - Vec2::new(40.0, 0.0), &s.digger);
        actor.set_intent(Intent {
            right: true,
            ..Default::default()
        });
        actor.resolve_field(&mut field, &s.digger, &mut rng, &mut events);
        assert_eq!(events.len(), 1);
        let radius = field.get(0).unwrap().radius;
        assert!((radius - (28.0 - s.digger.dig_rate * s.digger.dig_pressure_cap)).abs() < 1e-4);
    }

    #[test]
    fn test_inward_velocity_removed_on_contact() {
        let s = settings();
        let mut rng = Pcg32::seed_from_u64(5);
        let node_pos = Vec2::new(400.0, 300.0);
        let mut field = SpatialField::from_nodes(FieldConfig::default(), [(node_pos, 28.0)]);
        let mut actor = Actor::digger(0, node_pos - Vec2::new(0.0, 45.0), &s.digger);
        actor.vel = Vec2::new(0.0, 6.0);
        actor.resolve_field(&mut field, &s.digger, &mut rng, &mut Vec::new());
        assert!(actor.vel.y <= 6.0 * 0.2 + 1e-4);
        assert!(actor.vel.y >= 0.0);
    }

    #[test]
    fn test_can_collect_gated_by_cover() {
        let s = settings();
        let gem = Vec2::new(300.0, 300.0);
        let mut field = SpatialField::from_nodes(FieldConfig::default(), [(gem + Vec2::new(4.0, 0.0), 20.0)]);
        let actor = Actor::digger(0, gem + Vec2::new(10.0, 0.0), &s.digger);

        assert!(!actor.can_collect(gem, 10.0, &field, &s.rules));
        // Erode down to exactly the threshold: now collectible
        field.erode(0, 20.0 - s.rules.gem_cover_threshold);
        assert!(actor.can_collect(gem, 10.0, &field, &s.rules));

        // Too far away never collects
        let far = Actor::digger(1, gem + Vec2::new(200.0, 0.0), &s.digger);
        assert!(!far.can_collect(gem, 10.0, &field, &s.rules));
    }

    #[test]
    fn test_shoot_and_down_shot_edges() {
        let s = settings();
        let mut rng = Pcg32::seed_from_u64(9);
        let mut actor = Actor::digger(0, Vec2::new(400.0, 300.0), &s.digger);

        actor.set_intent(Intent {
            down: true,
            ..Default::default()
        });
        let shots = actor.take_shots(&s.rules, &mut rng);
        assert_eq!(shots.len(), 1);
        assert_eq!(shots[0].kind, ProjectileKind::BouncyWeapon);
        assert!((shots[0].angle_deg - 90.0).abs() <= 6.0);

        // Holding down does not fire again, even after the cooldown
        for _ in 0..s.rules.shoot_cooldown_ticks {
            actor.tick_cooldowns();
        }
        actor.set_intent(Intent {
            down: true,
            ..Default::default()
        });
        assert!(actor.take_shots(&s.rules, &mut rng).is_empty());

        actor.set_intent(Intent {
            shoot: true,
            left: true,
            ..Default::default()
        });
        actor.update_motion(&s);
        let shots = actor.take_shots(&s.rules, &mut rng);
        assert_eq!(shots.len(), 1);
        assert!((shots[0].angle_deg - 180.0).abs() <= 10.0);
        assert_eq!(actor.shoot_cooldown, s.rules.shoot_cooldown_ticks);
    }

    #[test]
    fn test_kill_clears_effects_and_respawns() {
        let s = settings();
        let spawn = Vec2::new(200.0, 150.0);
        let mut actor = Actor::digger(0, spawn, &s.digger);
        actor.effects.apply(EffectKind::Shield, 100);
        actor.effects.apply(EffectKind::RapidFire, 100);
        actor.teleport(Vec2::new(500.0, 500.0));

        assert!(actor.kill(3));
        assert_eq!(actor.lifecycle(), Lifecycle::Dead);
        assert!(actor.effects.is_empty());
        assert!(!actor.kill(3));

        assert!(!actor.tick_respawn(&s));
        assert!(!actor.tick_respawn(&s));
        assert!(actor.tick_respawn(&s));
        assert_eq!(actor.lifecycle(), Lifecycle::Active);
        assert_eq!(actor.pos, spawn);
    }

    #[test]
    fn test_jelly_actor_follows_its_body() {
        let s = settings();
        let mut actor = Actor::jelly(0, Vec2::new(400.0, 200.0), &s.digger, &s.jelly);
        for _ in 0..30 {
            actor.update_motion(&s);
        }
        let Body::Jelly(body) = &actor.body else {
            panic!("expected jelly body");
        };
        assert_eq!(actor.pos, body.center.pos);
        assert!(actor.pos.y > 200.0);
        assert!(body.touches(actor.pos, 0.0));
    }

    #[test]
    fn test_plane_triple_shot_and_bombs() {
        let s = Settings::for_variant(crate::Variant::Biplane);
        let mut rng = Pcg32::seed_from_u64(2);
        let mut plane = Actor::plane(1, Vec2::new(600.0, 300.0), -1.0, &s);
        assert_eq!(plane.heading(), Some(180.0));
        plane.effects.apply(EffectKind::TripleShot, 50);
        plane.effects.apply(EffectKind::Bomb, 50);
        plane.set_intent(Intent {
            shoot: true,
            down: true,
            ..Default::default()
        });
        let shots = plane.take_shots(&s.rules, &mut rng);
        assert_eq!(shots.iter().filter(|s| s.kind == ProjectileKind::Bullet).count(), 3);
        assert_eq!(shots.iter().filter(|s| s.kind == ProjectileKind::Bomb).count(), 1);
    }
}
