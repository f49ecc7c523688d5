//! Biplane flight model
//!
//! Heading is in degrees, screen space (0 = right, 90 = down). Up thrusts
//! along the heading; lift grows with the square of speed, is capped
//! relative to gravity and vanishes when the wings are vertical. Climbing
//! too steeply below take-off speed stalls the plane.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::actor::Intent;
use crate::settings::FlightTuning;
use crate::{from_angle_deg, normalize_angle_deg};

/// Lift can exceed gravity by at most this factor
const LIFT_CAP: f32 = 1.5;
const CEILING_RESTITUTION: f32 = 0.3;

/// What happened to the plane this tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlightOutcome {
    Flying,
    /// On the ground, rolling or parked
    Rolling,
    /// Hard landing absorbed by a trampoline
    Bounced,
    /// Hard landing: lethal
    Crashed,
}

/// Per-plane flight state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flight {
    /// Nose direction in degrees, (-180, 180]
    pub heading: f32,
    pub stalled: bool,
    pub grounded: bool,
}

impl Flight {
    pub fn new(heading: f32) -> Self {
        Self {
            heading: normalize_angle_deg(heading),
            stalled: false,
            grounded: true,
        }
    }

    /// Unit vector along the nose
    pub fn direction(&self) -> Vec2 {
        from_angle_deg(self.heading, 1.0)
    }

    /// Degrees above the horizon (negative when diving)
    pub fn climb_deg(&self) -> f32 {
        (-self.direction().y).clamp(-1.0, 1.0).asin().to_degrees()
    }

    /// Height of the plane's center when resting on the ground
    pub fn ground_level(tuning: &FlightTuning, height: f32) -> f32 {
        height - tuning.ground_height - tuning.radius * 0.5
    }

    /// Advance one tick, mutating `pos` and `vel` in place
    ///
    /// `control` is false while stunned; the plane then flies ballistically.
    #[allow(clippy::too_many_arguments)]
    pub fn step(
        &mut self,
        pos: &mut Vec2,
        vel: &mut Vec2,
        intent: &Intent,
        control: bool,
        boost: f32,
        trampoline: bool,
        tuning: &FlightTuning,
        size: Vec2,
    ) -> FlightOutcome {
        if control {
            let turn = tuning.turn_speed * boost;
            if intent.left {
                self.heading -= turn;
            }
            if intent.right {
                self.heading += turn;
            }
            self.heading = normalize_angle_deg(self.heading);
        }

        let dir = self.direction();
        if control && intent.up {
            *vel += dir * tuning.thrust * boost;
        }

        let speed = vel.length();
        let climb = self.climb_deg();
        if self.grounded {
            self.stalled = false;
        } else if climb > tuning.stall_climb_deg && speed < tuning.min_takeoff_speed {
            if !self.stalled {
                log::debug!("Stall at heading {:.0}", self.heading);
            }
            self.stalled = true;
        } else if self.stalled && climb < tuning.stall_recovery_climb_deg {
            self.stalled = false;
        }

        let mut lift = (speed * speed * tuning.lift_factor).min(tuning.gravity * LIFT_CAP) * dir.x.abs();
        if self.stalled {
            lift *= tuning.stall_lift_factor;
        }
        vel.y += tuning.gravity - lift;
        *vel *= tuning.air_damping;
        *pos += *vel;

        // Wrap horizontally
        if pos.x < 0.0 {
            pos.x += size.x;
        } else if pos.x > size.x {
            pos.x -= size.x;
        }

        let ceiling = tuning.radius * 0.5;
        if pos.y < ceiling {
            pos.y = ceiling;
            vel.y = vel.y.abs() * CEILING_RESTITUTION;
        }

        let ground = Self::ground_level(tuning, size.y);
        if pos.y < ground {
            if pos.y < ground - 0.5 {
                self.grounded = false;
            }
            return FlightOutcome::Flying;
        }

        let impact = vel.y;
        if !self.grounded && impact > tuning.max_landing_speed {
            pos.y = ground;
            if trampoline {
                vel.y = -impact * tuning.trampoline_restitution;
                return FlightOutcome::Bounced;
            }
            return FlightOutcome::Crashed;
        }

        pos.y = ground;
        vel.y = vel.y.min(0.0);
        vel.x *= tuning.ground_friction;
        self.grounded = true;
        // Nose can't point into the ground while rolling
        if dir.y > 0.0 {
            self.heading = if dir.x >= 0.0 { 0.0 } else { 180.0 };
        }
        FlightOutcome::Rolling
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIZE: Vec2 = Vec2::new(1280.0, 720.0);

    fn parked(tuning: &FlightTuning) -> (Flight, Vec2, Vec2) {
        (
            Flight::new(0.0),
            Vec2::new(200.0, Flight::ground_level(tuning, SIZE.y)),
            Vec2::ZERO,
        )
    }

    #[test]
    fn test_parked_plane_stays_put() {
        let tuning = FlightTuning::default();
        let (mut flight, mut pos, mut vel) = parked(&tuning);
        let idle = Intent::default();
        for _ in 0..60 {
            let out = flight.step(&mut pos, &mut vel, &idle, true, 1.0, false, &tuning, SIZE);
            assert_eq!(out, FlightOutcome::Rolling);
        }
        assert!((pos.y - Flight::ground_level(&tuning, SIZE.y)).abs() < 1e-3);
        assert!(vel.length() < 1e-3);
    }

    #[test]
    fn test_takeoff_with_throttle_and_pull_up() {
        let tuning = FlightTuning::default();
        let (mut flight, mut pos, mut vel) = parked(&tuning);
        let throttle = Intent {
            up: true,
            ..Default::default()
        };
        for _ in 0..120 {
            flight.step(&mut pos, &mut vel, &throttle, true, 1.0, false, &tuning, SIZE);
        }
        // Pull the nose up a little and keep throttling
        let climb = Intent {
            up: true,
            left: true,
            ..Default::default()
        };
        for _ in 0..6 {
            flight.step(&mut pos, &mut vel, &climb, true, 1.0, false, &tuning, SIZE);
        }
        for _ in 0..60 {
            flight.step(&mut pos, &mut vel, &throttle, true, 1.0, false, &tuning, SIZE);
        }
        assert!(!flight.grounded);
        assert!(pos.y < Flight::ground_level(&tuning, SIZE.y) - 10.0);
    }

    #[test]
    fn test_hard_landing_crashes_unless_trampoline() {
        let tuning = FlightTuning::default();
        let ground = Flight::ground_level(&tuning, SIZE.y);
        let idle = Intent::default();

        let mut flight = Flight::new(0.0);
        flight.grounded = false;
        let mut pos = Vec2::new(300.0, ground - 2.0);
        let mut vel = Vec2::new(0.0, 6.0);
        let out = flight.step(&mut pos, &mut vel, &idle, true, 1.0, false, &tuning, SIZE);
        assert_eq!(out, FlightOutcome::Crashed);

        let mut flight = Flight::new(0.0);
        flight.grounded = false;
        let mut pos = Vec2::new(300.0, ground - 2.0);
        let mut vel = Vec2::new(0.0, 6.0);
        let out = flight.step(&mut pos, &mut vel, &idle, true, 1.0, true, &tuning, SIZE);
        assert_eq!(out, FlightOutcome::Bounced);
        assert!(vel.y < 0.0);
    }

    #[test]
    fn test_stall_when_climbing_slowly() {
        let tuning = FlightTuning::default();
        let mut flight = Flight::new(-85.0);
        flight.grounded = false;
        let mut pos = Vec2::new(400.0, 300.0);
        let mut vel = Vec2::new(0.0, -0.5);
        flight.step(&mut pos, &mut vel, &Intent::default(), true, 1.0, false, &tuning, SIZE);
        assert!(flight.stalled);
        assert!(flight.climb_deg() > 80.0);
    }

    #[test]
    fn test_horizontal_wrap() {
        let tuning = FlightTuning::default();
        let mut flight = Flight::new(0.0);
        flight.grounded = false;
        let mut pos = Vec2::new(SIZE.x - 1.0, 300.0);
        let mut vel = Vec2::new(5.0, 0.0);
        flight.step(&mut pos, &mut vel, &Intent::default(), false, 1.0, false, &tuning, SIZE);
        assert!(pos.x < 10.0);
    }
}
