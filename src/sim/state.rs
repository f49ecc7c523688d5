//! Game state and cross-entity rules
//!
//! [`GameState`] owns every mutable collection of a run. Subsystems receive
//! it (or disjoint pieces of it) by reference from [`super::tick`]; nothing
//! lives in globals.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::Serialize;

use super::actor::{Actor, ActorId, Body};
use super::collision::{circle_rect, Rect};
use super::effects::EffectKind;
use super::field::SpatialField;
use super::flight::Flight;
use super::pickup::{Balloon, Pickup, PickupKind};
use super::projectile::{Projectile, ProjectileKind};
use super::snapshot::Snapshot;
use crate::settings::{BodyModel, Settings, Variant};

/// Hut size in the biplane arena
pub const HUT_SIZE: Vec2 = Vec2::new(60.0, 50.0);
/// Amount an explosion erodes each field node in range
pub const EXPLOSION_EROSION: f32 = 12.0;
/// Gems keep this far from the left/right edges
const GEM_SIDE_MARGIN: f32 = 120.0;
const GEM_TOP_MARGIN: f32 = 140.0;
const GEM_BOTTOM_MARGIN: f32 = 120.0;

/// Static rectangle that stops projectiles and planes
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Obstacle {
    pub rect: Rect,
    pub destroyed: bool,
}

/// Why an actor died
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum KillCause {
    Projectile(ProjectileKind),
    Explosion,
    /// Landed too hard
    Crash,
    /// Two planes collided
    MidAir,
    /// Flew into an obstacle
    Obstacle,
}

/// Cosmetic signal for renderers and audio
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum GameEvent {
    Eroded { pos: Vec2, removed: bool },
    Explosion { pos: Vec2, radius: f32 },
    PickupCollected { actor: ActorId, kind: PickupKind },
    EffectApplied { actor: ActorId, kind: EffectKind },
    EffectExpired { actor: ActorId, kind: EffectKind },
    ShieldAbsorbed { actor: ActorId },
    Killed { victim: ActorId, killer: Option<ActorId>, cause: KillCause },
    Stunned { actor: ActorId },
    Bubbled { actor: ActorId },
    Respawned { actor: ActorId },
    BalloonPopped { pos: Vec2 },
    ObstacleDestroyed { pos: Vec2 },
}

/// Complete game state
#[derive(Debug, Clone)]
pub struct GameState {
    pub settings: Settings,
    /// Run seed
    pub seed: u64,
    pub rng: Pcg32,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Score per actor
    pub scores: Vec<u32>,
    pub actors: Vec<Actor>,
    /// Active projectiles (sorted by id)
    pub projectiles: Vec<Projectile>,
    /// Gems and power-ups (sorted by id)
    pub pickups: Vec<Pickup>,
    pub balloons: Vec<Balloon>,
    pub obstacles: Vec<Obstacle>,
    pub field: SpatialField,
    /// Events produced by the last tick
    pub events: Vec<GameEvent>,
    next_id: u32,
}

/// Spawn point and facing for each actor in the current viewport
fn spawn_points(settings: &Settings) -> Vec<(Vec2, f32)> {
    let (w, h) = (settings.width, settings.height);
    match settings.variant {
        Variant::JellyMiner => vec![
            (Vec2::new(w * 0.25, h * 0.2), 1.0),
            (Vec2::new(w * 0.75, h * 0.2), -1.0),
        ],
        Variant::Biplane => {
            let y = Flight::ground_level(&settings.flight, h);
            vec![
                (Vec2::new(w * 0.15, y), 1.0),
                (Vec2::new(w * 0.85, y), -1.0),
            ]
        }
    }
}

impl GameState {
    /// Create a new game with the given settings and seed
    pub fn new(settings: Settings, seed: u64) -> Self {
        let field = SpatialField::empty(settings.field.clone());
        let mut state = Self {
            settings,
            seed,
            rng: Pcg32::seed_from_u64(seed),
            time_ticks: 0,
            scores: Vec::new(),
            actors: Vec::new(),
            projectiles: Vec::new(),
            pickups: Vec::new(),
            balloons: Vec::new(),
            obstacles: Vec::new(),
            field,
            events: Vec::new(),
            next_id: 1,
        };
        state.reset();
        state
    }

    /// Discard everything and rebuild the initial layout
    ///
    /// The RNG is re-seeded from its own stream, so successive restarts
    /// differ but stay reproducible from the run seed.
    pub fn reset(&mut self) {
        let (w, h) = (self.settings.width, self.settings.height);
        self.time_ticks = 0;
        self.rng = Pcg32::seed_from_u64(self.rng.random());
        self.projectiles.clear();
        self.pickups.clear();
        self.balloons.clear();
        self.obstacles.clear();
        self.events.clear();
        self.next_id = 1;
        self.field = SpatialField::empty(self.settings.field.clone());

        let s = &self.settings;
        let spawns = spawn_points(s);
        self.actors = match s.variant {
            Variant::JellyMiner => spawns
                .into_iter()
                .enumerate()
                .map(|(id, (spawn, _))| match s.body {
                    BodyModel::Digger => Actor::digger(id, spawn, &s.digger),
                    BodyModel::Jelly => Actor::jelly(id, spawn, &s.digger, &s.jelly),
                })
                .collect(),
            Variant::Biplane => spawns
                .into_iter()
                .enumerate()
                .map(|(id, (spawn, facing))| Actor::plane(id, spawn, facing, s))
                .collect(),
        };
        self.scores = vec![0; self.actors.len()];

        match self.settings.variant {
            Variant::JellyMiner => {
                self.field.rebuild(w, h, &mut self.rng);
                for _ in 0..self.settings.rules.gem_count {
                    self.spawn_gem();
                }
            }
            Variant::Biplane => {
                self.place_obstacles();
                let size = self.size();
                let balloon = Balloon::new(&mut self.rng, size);
                self.balloons.push(balloon);
            }
        }

        log::info!(
            "Reset {} arena {}x{}: {} actors, {} field nodes",
            self.settings.variant.as_str(),
            w,
            h,
            self.actors.len(),
            self.field.len()
        );
    }

    /// Change the viewport; the field is regenerated from scratch and spawn
    /// points follow the new size
    pub fn resize(&mut self, width: f32, height: f32) {
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            log::warn!("Ignoring resize to {}x{}", width, height);
            return;
        }
        self.settings.width = width;
        self.settings.height = height;
        match self.settings.variant {
            Variant::JellyMiner => self.field.rebuild(width, height, &mut self.rng),
            Variant::Biplane => self.place_obstacles(),
        }
        let ground = Flight::ground_level(&self.settings.flight, height);
        for (actor, (spawn, _)) in self.actors.iter_mut().zip(spawn_points(&self.settings)) {
            actor.spawn = spawn;
            if let Body::Plane(flight) = &actor.body
                && flight.grounded
            {
                actor.pos.y = ground;
                actor.vel.y = 0.0;
            }
        }
        let size = self.size();
        for pickup in &mut self.pickups {
            pickup.pos = pickup.pos.clamp(Vec2::ZERO, size);
        }
        log::info!("Resized to {}x{}", width, height);
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.settings.width, self.settings.height)
    }

    /// Height of the floor line
    pub fn ground_y(&self) -> f32 {
        match self.settings.variant {
            Variant::JellyMiner => self.settings.height,
            Variant::Biplane => self.settings.height - self.settings.flight.ground_height,
        }
    }

    /// World gravity for projectiles and pickups
    pub fn gravity(&self) -> f32 {
        match self.settings.variant {
            Variant::JellyMiner => self.settings.digger.gravity,
            Variant::Biplane => self.settings.flight.gravity,
        }
    }

    /// Allocate the next entity id
    pub fn alloc_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Events from the last tick, leaving the list empty
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(self)
    }

    fn place_obstacles(&mut self) {
        let center = Vec2::new(self.settings.width * 0.5, self.ground_y() - HUT_SIZE.y * 0.5);
        let destroyed = self.obstacles.first().is_some_and(|o| o.destroyed);
        self.obstacles = vec![Obstacle {
            rect: Rect::from_center_size(center, HUT_SIZE),
            destroyed,
        }];
    }

    /// Place a gem somewhere in the cave interior
    pub fn spawn_gem(&mut self) {
        let (w, h) = (self.settings.width, self.settings.height);
        let x = if w > GEM_SIDE_MARGIN * 2.0 {
            self.rng.random_range(GEM_SIDE_MARGIN..w - GEM_SIDE_MARGIN)
        } else {
            w * 0.5
        };
        let y = if h > GEM_TOP_MARGIN + GEM_BOTTOM_MARGIN {
            self.rng.random_range(GEM_TOP_MARGIN..h - GEM_BOTTOM_MARGIN)
        } else {
            h * 0.5
        };
        let id = self.alloc_id();
        self.pickups.push(Pickup::gem(id, Vec2::new(x, y)));
    }

    /// Grant an effect; stun keeps the longer timer, others refresh
    pub fn apply_effect(&mut self, actor: ActorId, kind: EffectKind, ticks: u32) {
        let Some(a) = self.actors.get_mut(actor) else {
            return;
        };
        if !a.is_alive() {
            return;
        }
        match kind {
            EffectKind::Stun => a.effects.extend(kind, ticks),
            _ => a.effects.apply(kind, ticks),
        }
        log::debug!("Actor {} gains {:?} for {} ticks", actor, kind, ticks);
        self.events.push(GameEvent::EffectApplied { actor, kind });
    }

    pub fn clear_effects(&mut self, actor: ActorId) {
        if let Some(a) = self.actors.get_mut(actor) {
            a.effects.clear();
        }
    }

    /// Apply a potentially lethal hit; returns true if the victim died
    ///
    /// With `shieldable` set, an active shield absorbs the hit instead.
    /// Killing another actor scores a point for the killer.
    pub fn hit_lethal(
        &mut self,
        victim: ActorId,
        killer: Option<ActorId>,
        cause: KillCause,
        shieldable: bool,
    ) -> bool {
        let shield_cost = self.settings.rules.shield_hit_cost;
        let respawn = self.settings.rules.respawn_ticks;
        let Some(actor) = self.actors.get_mut(victim) else {
            return false;
        };
        if !actor.is_alive() {
            return false;
        }
        if shieldable && actor.effects.absorb_hit(shield_cost) {
            log::debug!("Actor {} shield absorbed {:?}", victim, cause);
            self.events.push(GameEvent::ShieldAbsorbed { actor: victim });
            return false;
        }

        actor.kill(respawn);
        log::debug!("Actor {} killed by {:?} ({:?})", victim, killer, cause);
        self.events.push(GameEvent::Killed {
            victim,
            killer,
            cause,
        });
        if let Some(k) = killer
            && k != victim
            && let Some(score) = self.scores.get_mut(k)
        {
            *score += 1;
        }
        true
    }

    /// Stun an actor and knock it back
    pub fn stun(&mut self, victim: ActorId, knockback: Vec2) {
        let ticks = self.settings.rules.stun_ticks;
        let Some(actor) = self.actors.get_mut(victim) else {
            return;
        };
        if !actor.is_alive() {
            return;
        }
        actor.vel += knockback;
        if let Body::Jelly(body) = &mut actor.body {
            body.center.vel += knockback;
        }
        self.apply_effect(victim, EffectKind::Stun, ticks);
        self.events.push(GameEvent::Stunned { actor: victim });
    }

    /// Trap an actor in a bubble; shields do not help
    pub fn trap(&mut self, victim: ActorId) {
        let ticks = self.settings.rules.bubble_ticks;
        if !self.actors.get(victim).is_some_and(Actor::is_alive) {
            return;
        }
        self.apply_effect(victim, EffectKind::Bubbled, ticks);
        self.events.push(GameEvent::Bubbled { actor: victim });
    }

    /// Blast at `pos`: kills actors in range, erodes the field, destroys
    /// obstacles and pops balloons
    pub fn explode(&mut self, pos: Vec2, owner: ActorId) {
        let radius = self.settings.rules.explosion_radius;
        self.events.push(GameEvent::Explosion { pos, radius });

        let victims: Vec<ActorId> = self
            .actors
            .iter()
            .filter(|a| a.is_alive() && a.pos.distance(pos) < radius + a.radius * 0.5)
            .map(|a| a.id)
            .collect();
        for victim in victims {
            self.hit_lethal(victim, Some(owner), KillCause::Explosion, true);
        }

        self.field.erode_area(pos, radius, EXPLOSION_EROSION);

        for obstacle in &mut self.obstacles {
            if !obstacle.destroyed && circle_rect(pos, radius, &obstacle.rect).hit {
                obstacle.destroyed = true;
                log::debug!("Obstacle destroyed at {:?}", obstacle.rect.center());
                self.events.push(GameEvent::ObstacleDestroyed {
                    pos: obstacle.rect.center(),
                });
            }
        }

        for i in 0..self.balloons.len() {
            if self.balloons[i].hit_by(pos, radius) {
                self.pop_balloon(i);
            }
        }
    }

    /// Pop a balloon, dropping a random power-up where it was
    pub fn pop_balloon(&mut self, index: usize) {
        let respawn = self.settings.rules.balloon_respawn_ticks;
        let Some(balloon) = self.balloons.get_mut(index) else {
            return;
        };
        if !balloon.is_active() {
            return;
        }
        let pos = balloon.pos;
        balloon.pop(respawn);

        let kind = EffectKind::POWERUPS[self.rng.random_range(0..EffectKind::POWERUPS.len())];
        let id = self.alloc_id();
        let ticks = self.settings.rules.powerup_ticks;
        self.pickups.push(Pickup::power_up(id, kind, pos, ticks));
        log::debug!("Balloon popped, dropping {:?}", kind);
        self.events.push(GameEvent::BalloonPopped { pos });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_miner_layout() {
        let state = GameState::new(Settings::default(), 42);
        assert_eq!(state.actors.len(), 2);
        assert_eq!(state.scores, vec![0, 0]);
        assert_eq!(state.pickups.len(), state.settings.rules.gem_count);
        assert!(!state.field.is_empty());
        assert!(state.obstacles.is_empty());
        for gem in &state.pickups {
            assert!(gem.pos.x >= GEM_SIDE_MARGIN && gem.pos.x <= state.settings.width - GEM_SIDE_MARGIN);
        }
    }

    #[test]
    fn test_new_biplane_layout() {
        let state = GameState::new(Settings::for_variant(Variant::Biplane), 42);
        assert!(state.field.is_empty());
        assert_eq!(state.obstacles.len(), 1);
        assert_eq!(state.balloons.len(), 1);
        assert_eq!(state.actors[0].heading(), Some(0.0));
        assert_eq!(state.actors[1].heading(), Some(180.0));
        let hut = state.obstacles[0].rect;
        assert!((hut.max.y - state.ground_y()).abs() < 1e-4);
    }

    #[test]
    fn test_shield_absorbs_then_kill_scores() {
        let mut state = GameState::new(Settings::default(), 1);
        state.apply_effect(1, EffectKind::Shield, 100);

        let killed = state.hit_lethal(1, Some(0), KillCause::Projectile(ProjectileKind::Bullet), true);
        assert!(!killed);
        assert_eq!(state.actors[1].effects.remaining(EffectKind::Shield), Some(50));
        assert_eq!(state.scores[0], 0);

        // Crashes bypass the shield and never score
        assert!(state.hit_lethal(1, None, KillCause::Crash, false));
        assert!(state.actors[1].effects.is_empty());
        assert_eq!(state.scores, vec![0, 0]);

        // Already dead: nothing happens
        assert!(!state.hit_lethal(1, Some(0), KillCause::Explosion, true));
    }

    #[test]
    fn test_self_kill_scores_nothing() {
        let mut state = GameState::new(Settings::default(), 1);
        assert!(state.hit_lethal(0, Some(0), KillCause::Explosion, true));
        assert_eq!(state.scores, vec![0, 0]);
    }

    #[test]
    fn test_stun_refresh_keeps_longer() {
        let mut state = GameState::new(Settings::default(), 1);
        state.apply_effect(0, EffectKind::Stun, 300);
        state.apply_effect(0, EffectKind::Stun, 10);
        assert_eq!(state.actors[0].effects.remaining(EffectKind::Stun), Some(300));

        state.apply_effect(0, EffectKind::Shield, 50);
        state.clear_effects(0);
        assert!(state.actors[0].effects.is_empty());
        assert_eq!(state.actors[0].lifecycle(), crate::sim::Lifecycle::Active);
    }

    #[test]
    fn test_explosion_destroys_hut_and_pops_balloon() {
        let mut state = GameState::new(Settings::for_variant(Variant::Biplane), 3);
        let hut = state.obstacles[0].rect.center();
        state.balloons[0].pos = hut + Vec2::new(0.0, -40.0);
        state.explode(hut, 0);
        assert!(state.obstacles[0].destroyed);
        assert!(!state.balloons[0].is_active());
        assert_eq!(state.pickups.len(), 1);
        assert!(state.events.iter().any(|e| matches!(e, GameEvent::ObstacleDestroyed { .. })));
        // Hut stays destroyed across a resize
        state.resize(1000.0, 700.0);
        assert!(state.obstacles[0].destroyed);
    }

    #[test]
    fn test_resize_rebuilds_field() {
        let mut state = GameState::new(Settings::default(), 9);
        let before = state.field.len();
        state.resize(640.0, 480.0);
        assert!(state.field.len() < before);
        assert_eq!(state.size(), Vec2::new(640.0, 480.0));
        state.resize(f32::NAN, 100.0);
        assert_eq!(state.size(), Vec2::new(640.0, 480.0));
    }

    #[test]
    fn test_resize_moves_plane_spawn_to_new_ground() {
        let mut state = GameState::new(Settings::for_variant(Variant::Biplane), 21);
        state.resize(1280.0, 1000.0);
        let ground = Flight::ground_level(&state.settings.flight, 1000.0);
        for actor in &state.actors {
            assert_eq!(actor.spawn.y, ground);
            // Parked planes sit on the new ground line
            assert_eq!(actor.pos.y, ground);
        }
        assert_eq!(state.actors[1].spawn.x, 1280.0 * 0.85);

        let settings = state.settings.clone();
        let plane = &mut state.actors[0];
        assert!(plane.kill(1));
        assert!(plane.tick_respawn(&settings));
        assert_eq!(plane.pos, Vec2::new(1280.0 * 0.15, ground));
    }

    #[test]
    fn test_reset_reseeds_from_own_stream() {
        let mut a = GameState::new(Settings::default(), 5);
        let b = GameState::new(Settings::default(), 5);
        let first: Vec<Vec2> = a.field.iter().map(|n| n.pos).collect();
        assert_eq!(first, b.field.iter().map(|n| n.pos).collect::<Vec<_>>());

        a.reset();
        let second: Vec<Vec2> = a.field.iter().map(|n| n.pos).collect();
        assert_ne!(first, second);

        // Same history, same restart
        let mut c = GameState::new(Settings::default(), 5);
        c.reset();
        assert_eq!(second, c.field.iter().map(|n| n.pos).collect::<Vec<_>>());
    }
}
