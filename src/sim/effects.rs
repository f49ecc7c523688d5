//! Timed status effects
//!
//! Each actor owns a [`StatusEffects`] map from effect kind to remaining
//! ticks. Presence of a key means the effect is active; a timer reaching
//! zero removes the key and reports the kind as expired.
//!
//! Precedence: Shield absorbs lethal projectile hits by spending a fraction
//! of its remaining time. It never intercepts a bubble, which always traps,
//! nor a stun. A bubbled actor is still vulnerable to lethal hits.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::projectile::ProjectileKind;

/// Every timed modifier an actor can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EffectKind {
    Shield,
    RapidFire,
    SpeedBoost,
    TripleShot,
    /// Down intent drops bombs instead of doing nothing
    Bomb,
    /// Hard landings bounce instead of crashing
    Trampoline,
    ChickenLauncher,
    BubbleGun,
    /// Cosmetic only: never changes collision geometry
    CloudDisguise,
    /// Input and control disabled
    Stun,
    /// Trapped in a floating bubble
    Bubbled,
}

/// Behavior parameters looked up per kind
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectParams {
    /// Multiplier applied to shot cooldowns
    pub cooldown_multiplier: f32,
    /// Multiplier applied to thrust and turning
    pub speed_multiplier: f32,
    /// Shot kind this effect swaps in, if any
    pub weapon: Option<ProjectileKind>,
    /// Number of shots per trigger
    pub shots: u8,
    /// Disables control while active
    pub disables_control: bool,
    /// Can be granted by a power-up pickup
    pub is_powerup: bool,
}

const NEUTRAL: EffectParams = EffectParams {
    cooldown_multiplier: 1.0,
    speed_multiplier: 1.0,
    weapon: None,
    shots: 1,
    disables_control: false,
    is_powerup: true,
};

impl EffectKind {
    /// Kinds that can drop from the balloon
    pub const POWERUPS: [EffectKind; 9] = [
        EffectKind::Shield,
        EffectKind::RapidFire,
        EffectKind::SpeedBoost,
        EffectKind::TripleShot,
        EffectKind::Bomb,
        EffectKind::Trampoline,
        EffectKind::ChickenLauncher,
        EffectKind::BubbleGun,
        EffectKind::CloudDisguise,
    ];

    pub fn params(self) -> EffectParams {
        match self {
            EffectKind::RapidFire => EffectParams {
                cooldown_multiplier: 0.5,
                ..NEUTRAL
            },
            EffectKind::SpeedBoost => EffectParams {
                speed_multiplier: 1.5,
                ..NEUTRAL
            },
            EffectKind::TripleShot => EffectParams { shots: 3, ..NEUTRAL },
            EffectKind::ChickenLauncher => EffectParams {
                weapon: Some(ProjectileKind::Chicken),
                cooldown_multiplier: 1.5,
                ..NEUTRAL
            },
            EffectKind::BubbleGun => EffectParams {
                weapon: Some(ProjectileKind::Bubble),
                cooldown_multiplier: 1.2,
                ..NEUTRAL
            },
            EffectKind::Stun | EffectKind::Bubbled => EffectParams {
                disables_control: true,
                is_powerup: false,
                ..NEUTRAL
            },
            EffectKind::Shield
            | EffectKind::Bomb
            | EffectKind::Trampoline
            | EffectKind::CloudDisguise => NEUTRAL,
        }
    }
}

/// Active effects of one actor
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusEffects {
    timers: BTreeMap<EffectKind, u32>,
}

impl StatusEffects {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or refresh an effect to the full `ticks` duration
    ///
    /// Durations never stack. A zero duration removes the effect.
    pub fn apply(&mut self, kind: EffectKind, ticks: u32) {
        if ticks == 0 {
            self.timers.remove(&kind);
        } else {
            self.timers.insert(kind, ticks);
        }
    }

    /// Keep the longer of the current and the new duration
    pub fn extend(&mut self, kind: EffectKind, ticks: u32) {
        if ticks == 0 {
            return;
        }
        let timer = self.timers.entry(kind).or_insert(0);
        *timer = (*timer).max(ticks);
    }

    /// Advance every timer by one tick, returning the kinds that expired
    pub fn tick(&mut self) -> Vec<EffectKind> {
        let mut expired = Vec::new();
        for (kind, remaining) in self.timers.iter_mut() {
            *remaining = remaining.saturating_sub(1);
            if *remaining == 0 {
                expired.push(*kind);
            }
        }
        for kind in &expired {
            self.timers.remove(kind);
        }
        expired
    }

    /// Drop every effect
    pub fn clear(&mut self) {
        self.timers.clear();
    }

    pub fn remove(&mut self, kind: EffectKind) -> bool {
        self.timers.remove(&kind).is_some()
    }

    pub fn is_active(&self, kind: EffectKind) -> bool {
        self.timers.contains_key(&kind)
    }

    pub fn remaining(&self, kind: EffectKind) -> Option<u32> {
        self.timers.get(&kind).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    /// Active effects in kind order
    pub fn iter(&self) -> impl Iterator<Item = (EffectKind, u32)> + '_ {
        self.timers.iter().map(|(k, v)| (*k, *v))
    }

    /// True while any active effect disables control
    pub fn controls_disabled(&self) -> bool {
        self.timers.keys().any(|k| k.params().disables_control)
    }

    /// Combined cooldown multiplier of all active effects
    pub fn cooldown_multiplier(&self) -> f32 {
        self.timers
            .keys()
            .map(|k| k.params().cooldown_multiplier)
            .product()
    }

    /// Combined speed multiplier of all active effects
    pub fn speed_multiplier(&self) -> f32 {
        self.timers
            .keys()
            .map(|k| k.params().speed_multiplier)
            .product()
    }

    /// Shots fired per trigger
    pub fn shot_count(&self) -> u8 {
        self.timers
            .keys()
            .map(|k| k.params().shots)
            .max()
            .unwrap_or(1)
    }

    /// Weapon swapped in by an active effect (first in kind order)
    pub fn weapon_override(&self) -> Option<ProjectileKind> {
        self.timers.keys().find_map(|k| k.params().weapon)
    }

    /// Spend shield time to absorb a lethal hit
    ///
    /// Consumes `cost` (a fraction of the remaining ticks, at least one
    /// tick). Returns false if no shield was active.
    pub fn absorb_hit(&mut self, cost: f32) -> bool {
        let Some(remaining) = self.timers.get_mut(&EffectKind::Shield) else {
            return false;
        };
        let spend = ((*remaining as f32 * cost.clamp(0.0, 1.0)).ceil() as u32).max(1);
        *remaining = remaining.saturating_sub(spend);
        if *remaining == 0 {
            self.timers.remove(&EffectKind::Shield);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_tick_expires_and_reports() {
        let mut fx = StatusEffects::new();
        fx.apply(EffectKind::RapidFire, 2);
        fx.apply(EffectKind::Shield, 5);

        assert!(fx.tick().is_empty());
        assert_eq!(fx.tick(), vec![EffectKind::RapidFire]);
        assert!(!fx.is_active(EffectKind::RapidFire));
        assert_eq!(fx.remaining(EffectKind::Shield), Some(3));
    }

    #[test]
    fn test_stun_extend_keeps_longer() {
        let mut fx = StatusEffects::new();
        fx.extend(EffectKind::Stun, 100);
        fx.extend(EffectKind::Stun, 40);
        assert_eq!(fx.remaining(EffectKind::Stun), Some(100));
        assert!(fx.controls_disabled());
    }

    #[test]
    fn test_clear_then_tick_is_noop() {
        let mut fx = StatusEffects::new();
        fx.apply(EffectKind::Shield, 10);
        fx.apply(EffectKind::Bubbled, 10);
        fx.clear();
        assert!(fx.is_empty());
        assert!(fx.tick().is_empty());
        assert!(fx.is_empty());
    }

    #[test]
    fn test_shield_absorb_spends_fraction() {
        let mut fx = StatusEffects::new();
        assert!(!fx.absorb_hit(0.5));

        fx.apply(EffectKind::Shield, 100);
        assert!(fx.absorb_hit(0.5));
        assert_eq!(fx.remaining(EffectKind::Shield), Some(50));
        assert!(fx.absorb_hit(0.5));
        assert_eq!(fx.remaining(EffectKind::Shield), Some(25));

        fx.apply(EffectKind::Shield, 1);
        assert!(fx.absorb_hit(0.5));
        assert!(!fx.is_active(EffectKind::Shield));
    }

    #[test]
    fn test_lookup_table_combines() {
        let mut fx = StatusEffects::new();
        fx.apply(EffectKind::RapidFire, 10);
        fx.apply(EffectKind::TripleShot, 10);
        fx.apply(EffectKind::BubbleGun, 10);
        assert!((fx.cooldown_multiplier() - 0.6).abs() < 1e-5);
        assert_eq!(fx.shot_count(), 3);
        assert_eq!(fx.weapon_override(), Some(ProjectileKind::Bubble));
        assert!(!fx.controls_disabled());
    }

    #[test]
    fn test_powerup_list_excludes_debuffs() {
        assert!(EffectKind::POWERUPS.iter().all(|k| k.params().is_powerup));
        assert!(!EffectKind::Stun.params().is_powerup);
        assert!(!EffectKind::Bubbled.params().is_powerup);
    }

    proptest! {
        #[test]
        fn prop_refresh_resets_instead_of_stacking(duration in 1u32..500, elapsed in 0u32..500) {
            let elapsed = elapsed % duration;
            let mut fx = StatusEffects::new();
            fx.apply(EffectKind::Shield, duration);
            for _ in 0..elapsed {
                fx.tick();
            }
            fx.apply(EffectKind::Shield, duration);
            prop_assert_eq!(fx.remaining(EffectKind::Shield), Some(duration));
        }
    }
}
