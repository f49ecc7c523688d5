//! Fixed timestep simulation tick
//!
//! One call advances every subsystem by exactly one frame, in a fixed
//! order: input capture, actor motion and terrain, actor pairs,
//! projectiles, pickups, effect timers, respawns. Later passes see the
//! state produced by earlier ones in the same tick.

use glam::Vec2;

use super::actor::{ActorId, Body, Intent, Motion};
use super::collision::{circle_circle, circle_rect};
use super::pickup::PickupKind;
use super::projectile::{HitEffect, Projectile, ProjectileKind};
use super::state::{GameEvent, GameState, KillCause};

/// Input for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Held intents per actor; missing entries mean no input
    pub intents: Vec<Intent>,
    /// Reset the whole game before this tick
    pub restart: bool,
    /// New viewport size
    pub resize: Option<(f32, f32)>,
}

/// Advance the game state by one fixed timestep
pub fn tick(state: &mut GameState, input: &TickInput) {
    state.events.clear();
    if input.restart {
        state.reset();
    }
    if let Some((w, h)) = input.resize {
        state.resize(w, h);
    }
    state.time_ticks += 1;

    for (i, actor) in state.actors.iter_mut().enumerate() {
        actor.set_intent(input.intents.get(i).copied().unwrap_or_default());
    }

    update_actors(state);
    resolve_actor_pairs(state);
    update_projectiles(state);
    update_pickups(state);
    tick_effects(state);
    tick_respawns(state);
}

fn update_actors(state: &mut GameState) {
    for i in 0..state.actors.len() {
        let (motion, shots) = {
            let actor = &mut state.actors[i];
            if !actor.is_alive() {
                continue;
            }
            actor.tick_cooldowns();
            let motion = actor.update_motion(&state.settings);
            actor.resolve_field(&mut state.field, &state.settings.digger, &mut state.rng, &mut state.events);
            (motion, actor.take_shots(&state.settings.rules, &mut state.rng))
        };

        for shot in shots {
            let id = state.alloc_id();
            state.projectiles.push(Projectile::spawn(id, &shot));
        }

        if motion == Motion::Crashed {
            state.hit_lethal(i, None, KillCause::Crash, false);
            continue;
        }

        let actor = &state.actors[i];
        let rammed = matches!(actor.body, Body::Plane(_))
            && state
                .obstacles
                .iter()
                .any(|o| !o.destroyed && circle_rect(actor.pos, actor.radius, &o.rect).hit);
        if rammed {
            state.hit_lethal(i, None, KillCause::Obstacle, false);
        }
    }
}

/// Ground actors push apart; planes that touch both go down
fn resolve_actor_pairs(state: &mut GameState) {
    let factor = state.settings.flight.collision_factor;
    let mut collisions: Vec<(ActorId, ActorId)> = Vec::new();

    for i in 0..state.actors.len() {
        for j in (i + 1)..state.actors.len() {
            let (head, tail) = state.actors.split_at_mut(j);
            let (a, b) = (&mut head[i], &mut tail[0]);
            if !a.is_alive() || !b.is_alive() {
                continue;
            }

            if matches!(a.body, Body::Plane(_)) && matches!(b.body, Body::Plane(_)) {
                if a.pos.distance(b.pos) < factor * (a.radius + b.radius) {
                    collisions.push((i, j));
                }
                continue;
            }

            let hit = circle_circle(a.pos, a.radius, b.pos, b.radius);
            if !hit.hit {
                continue;
            }
            let push = hit.normal * hit.penetration * 0.5;
            a.teleport(a.pos + push);
            b.teleport(b.pos - push);

            let closing = (a.vel - b.vel).dot(hit.normal);
            if closing < 0.0 {
                let impulse = hit.normal * closing * 0.5;
                a.vel -= impulse;
                b.vel += impulse;
                for actor in [a, b] {
                    if let Body::Jelly(body) = &mut actor.body {
                        body.center.vel = actor.vel;
                    }
                }
            }
        }
    }

    for (i, j) in collisions {
        state.hit_lethal(i, None, KillCause::MidAir, false);
        state.hit_lethal(j, None, KillCause::MidAir, false);
    }
}

fn update_projectiles(state: &mut GameState) {
    let gravity = state.gravity();
    let ground_y = state.ground_y();
    let size = state.size();

    for pi in 0..state.projectiles.len() {
        {
            let p = &mut state.projectiles[pi];
            p.integrate(gravity);
            p.collide_terrain(&mut state.field, &mut state.events);
            p.collide_bounds(size.x, ground_y);
            for obstacle in state.obstacles.iter().filter(|o| !o.destroyed) {
                p.collide_obstacle(&obstacle.rect);
            }
        }

        for ai in 0..state.actors.len() {
            if !state.projectiles[pi].check_collision(&state.actors[ai]) {
                continue;
            }
            let p = &mut state.projectiles[pi];
            let (kind, owner, vel) = (p.kind, p.owner, p.vel);
            match p.on_hit() {
                HitEffect::Kill => {
                    state.hit_lethal(ai, Some(owner), KillCause::Projectile(kind), true);
                }
                HitEffect::Stun { knockback } => {
                    state.stun(ai, vel.normalize_or_zero() * knockback);
                }
                HitEffect::Trap => state.trap(ai),
                HitEffect::Explode => {}
            }
            break;
        }

        let (pos, radius, kind) = {
            let p = &state.projectiles[pi];
            (p.pos, p.radius(), p.kind)
        };
        if !state.projectiles[pi].dead && !state.projectiles[pi].detonate && kind.is_lethal() {
            if let Some(bi) = state.balloons.iter().position(|b| b.hit_by(pos, radius)) {
                if kind == ProjectileKind::Bomb {
                    state.projectiles[pi].detonate = true;
                } else {
                    state.projectiles[pi].dead = true;
                    state.pop_balloon(bi);
                }
            }
        }

        if state.projectiles[pi].detonate {
            let p = &mut state.projectiles[pi];
            p.detonate = false;
            p.dead = true;
            let (pos, owner) = (p.pos, p.owner);
            state.explode(pos, owner);
        }
    }

    state.projectiles.retain(|p| !p.is_expired(size));
}

fn update_pickups(state: &mut GameState) {
    let gravity = state.gravity();
    let ground_y = state.ground_y();
    state.pickups.retain_mut(|p| p.update(gravity, ground_y));

    let mut collected: Vec<(usize, ActorId)> = Vec::new();
    for (pi, pickup) in state.pickups.iter().enumerate() {
        let collector = state.actors.iter().find(|a| match pickup.kind {
            PickupKind::Gem => a.can_collect(pickup.pos, pickup.size, &state.field, &state.settings.rules),
            PickupKind::PowerUp(_) => pickup.touches(a),
        });
        if let Some(actor) = collector {
            collected.push((pi, actor.id));
        }
    }

    let mut taken = Vec::with_capacity(collected.len());
    for &(pi, actor) in collected.iter().rev() {
        taken.push((state.pickups.remove(pi), actor));
    }
    for (pickup, actor) in taken.into_iter().rev() {
        state.events.push(GameEvent::PickupCollected {
            actor,
            kind: pickup.kind,
        });
        match pickup.kind {
            PickupKind::Gem => {
                if let Some(score) = state.scores.get_mut(actor) {
                    *score += 1;
                }
                state.spawn_gem();
            }
            PickupKind::PowerUp(effect) => {
                let ticks = state.settings.rules.powerup_ticks;
                state.apply_effect(actor, effect, ticks);
            }
        }
    }

    let time = state.time_ticks;
    let size = state.size();
    for balloon in &mut state.balloons {
        balloon.update(time, size.x);
        balloon.tick_respawn(&mut state.rng, size);
    }
}

fn tick_effects(state: &mut GameState) {
    for actor in state.actors.iter_mut().filter(|a| a.is_alive()) {
        for kind in actor.effects.tick() {
            log::debug!("Actor {} loses {:?}", actor.id, kind);
            state.events.push(GameEvent::EffectExpired { actor: actor.id, kind });
        }
    }
}

fn tick_respawns(state: &mut GameState) {
    for actor in state.actors.iter_mut() {
        if actor.tick_respawn(&state.settings) {
            log::info!("Actor {} respawned at {:?}", actor.id, actor.pos);
            state.events.push(GameEvent::Respawned { actor: actor.id });
        }
    }
}
