//! Spring-mesh jelly body
//!
//! One center mass plus a ring of nodes. Each substep integrates every node,
//! bounces it off the viewport (the center off the viewport shrunk by the
//! rest radius), then runs a single relaxation pass of radial
//! (node to center) and structural (node to neighbour) springs. This is a
//! simplified position-based solver: one pass, no convergence loop, energy
//! not conserved. The center only receives half of each radial correction,
//! so momentum is approximate too.

use std::f32::consts::TAU;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::settings::JellyParams;

/// A point mass in the mesh
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodyNode {
    pub pos: Vec2,
    pub vel: Vec2,
    pub mass: f32,
}

impl BodyNode {
    fn new(pos: Vec2, mass: f32) -> Self {
        Self {
            pos,
            vel: Vec2::ZERO,
            mass,
        }
    }

    fn integrate(&mut self, force: Vec2, dt: f32, damping: f32) {
        if self.mass > 0.0 {
            self.vel += force / self.mass * dt;
        }
        self.vel *= damping;
        self.pos += self.vel * dt;
    }

    fn bounce(&mut self, min: Vec2, max: Vec2, restitution: f32) {
        if self.pos.x < min.x {
            self.pos.x = min.x;
            self.vel.x = self.vel.x.abs() * restitution;
        } else if self.pos.x > max.x {
            self.pos.x = max.x;
            self.vel.x = -self.vel.x.abs() * restitution;
        }
        if self.pos.y < min.y {
            self.pos.y = min.y;
            self.vel.y = self.vel.y.abs() * restitution;
        } else if self.pos.y > max.y {
            self.pos.y = max.y;
            self.vel.y = -self.vel.y.abs() * restitution;
        }
    }
}

/// Soft body made of a center node and a spring-connected ring
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JellyBody {
    pub center: BodyNode,
    pub ring: Vec<BodyNode>,
    /// Rest distance from center to every ring node
    pub rest_radius: f32,
    params: JellyParams,
}

impl JellyBody {
    /// Ring nodes evenly spaced on a circle of `radius` around `center`
    pub fn new(center: Vec2, radius: f32, params: JellyParams) -> Self {
        let count = params.node_count.max(3);
        let ring = (0..count)
            .map(|i| {
                let angle = i as f32 / count as f32 * TAU;
                BodyNode::new(
                    center + Vec2::new(angle.cos(), angle.sin()) * radius,
                    params.node_mass,
                )
            })
            .collect();
        Self {
            center: BodyNode::new(center, params.center_mass),
            ring,
            rest_radius: radius,
            params,
        }
    }

    /// Rest length between adjacent ring nodes (chord of the rest circle)
    pub fn chord_length(&self) -> f32 {
        2.0 * self.rest_radius * (std::f32::consts::PI / self.ring.len() as f32).sin()
    }

    /// Advance one frame in `substeps` slices
    ///
    /// `force` acts on the center only. `min`/`max` bound every ring node;
    /// the center is kept a rest radius inside them so the ring can rest
    /// against a wall without being crushed.
    pub fn step(&mut self, force: Vec2, gravity: f32, min: Vec2, max: Vec2) {
        let substeps = self.params.substeps.max(1);
        let dt = 1.0 / substeps as f32;
        let p = &self.params;
        let (damping, restitution) = (p.damping, p.restitution);
        let center_gravity = Vec2::new(0.0, gravity * p.center_gravity_scale);
        let ring_gravity = Vec2::new(0.0, gravity * p.ring_gravity_scale);
        let inset = Vec2::splat(self.rest_radius).min((max - min).max(Vec2::ZERO) * 0.5);
        let (center_min, center_max) = (min + inset, max - inset);

        for _ in 0..substeps {
            let center_mass = self.center.mass;
            self.center
                .integrate(center_gravity * center_mass + force, dt, damping);
            self.center.bounce(center_min, center_max, restitution);

            for node in &mut self.ring {
                let mass = node.mass;
                node.integrate(ring_gravity * mass, dt, damping);
                node.bounce(min, max, restitution);
            }

            self.relax();
        }
    }

    /// One radial pass followed by one structural pass
    ///
    /// Corrections move positions and feed the same delta into velocity so
    /// ring nodes follow the center instead of free-falling behind it.
    pub fn relax(&mut self) {
        let k_radial = self.params.stiffness_radial;
        let k_structural = self.params.stiffness_structural;

        for node in &mut self.ring {
            let offset = node.pos - self.center.pos;
            let dist = offset.length();
            if dist <= f32::EPSILON || !dist.is_finite() {
                continue;
            }
            let target = self.center.pos + offset / dist * self.rest_radius;
            let delta = (target - node.pos) * k_radial;
            node.pos += delta;
            node.vel += delta;
            self.center.pos -= delta * 0.5;
        }

        let rest = self.chord_length();
        let n = self.ring.len();
        for i in 0..n {
            let j = (i + 1) % n;
            let offset = self.ring[j].pos - self.ring[i].pos;
            let dist = offset.length();
            if dist <= f32::EPSILON || !dist.is_finite() {
                continue;
            }
            let correction = offset / dist * (dist - rest) * 0.5 * k_structural;
            self.ring[i].pos += correction;
            self.ring[i].vel += correction;
            self.ring[j].pos -= correction;
            self.ring[j].vel -= correction;
        }
    }

    /// True if the center or any ring node is within `radius` plus the node
    /// contact radius of `point`
    pub fn touches(&self, point: Vec2, radius: f32) -> bool {
        let reach = radius + self.params.node_radius;
        self.center.pos.distance(point) < reach
            || self.ring.iter().any(|n| n.pos.distance(point) < reach)
    }

    /// Shift the whole body without changing its shape
    pub fn translate(&mut self, delta: Vec2) {
        self.center.pos += delta;
        for node in &mut self.ring {
            node.pos += delta;
        }
    }

    /// Set every node's velocity
    pub fn set_velocity(&mut self, vel: Vec2) {
        self.center.vel = vel;
        for node in &mut self.ring {
            node.vel = vel;
        }
    }

    /// Ring node positions for rendering
    pub fn outline(&self) -> Vec<Vec2> {
        self.ring.iter().map(|n| n.pos).collect()
    }

    /// Largest center-to-node distance error relative to the rest radius
    pub fn max_radial_error(&self) -> f32 {
        self.ring
            .iter()
            .map(|n| (n.pos.distance(self.center.pos) - self.rest_radius).abs() / self.rest_radius)
            .fold(0.0, f32::max)
    }
}
