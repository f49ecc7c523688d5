//! Game settings and tuning
//!
//! Every section is `#[serde(default)]`, so a settings file only needs the
//! values it overrides. Defaults come from [`crate::consts`].

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::ConfigError;

/// Which of the two games to simulate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Variant {
    /// Dig through a jelly cave for gems, stun the rival with bouncy weapons
    #[default]
    JellyMiner,
    /// Biplane dogfight over a ground strip with a hut and a power-up balloon
    Biplane,
}

impl Variant {
    pub fn as_str(&self) -> &'static str {
        match self {
            Variant::JellyMiner => "jelly-miner",
            Variant::Biplane => "biplane",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "jelly-miner" | "jelly" | "miner" => Some(Variant::JellyMiner),
            "biplane" | "planes" => Some(Variant::Biplane),
            _ => None,
        }
    }
}

/// Body model used by jelly miner actors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum BodyModel {
    /// Rigid circle
    #[default]
    Digger,
    /// Ring of spring-connected mass nodes around a center mass
    Jelly,
}

/// Cave field generation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldConfig {
    /// Grid spacing between node sites (also the spatial index cell size)
    pub spacing: f32,
    /// Authored node radius before jitter
    pub node_radius: f32,
    /// Border left empty on every side
    pub margin: f32,
    /// Top fraction of the screen that is mostly open
    pub open_band: f32,
    /// Chance a site inside the open band is skipped
    pub open_skip_chance: f32,
    /// Position jitter as a fraction of spacing
    pub position_jitter: f32,
    /// Radius jitter (radius is scaled by 1 ± this)
    pub radius_jitter: f32,
    /// Nodes eroded below this radius are removed
    pub min_radius: f32,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            spacing: FIELD_SPACING,
            node_radius: FIELD_NODE_RADIUS,
            margin: FIELD_MARGIN,
            open_band: 0.12,
            open_skip_chance: 0.85,
            position_jitter: 0.25,
            radius_jitter: 0.15,
            min_radius: FIELD_MIN_RADIUS,
        }
    }
}

/// Rigid-circle digger movement
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiggerTuning {
    pub radius: f32,
    pub mass: f32,
    pub gravity: f32,
    pub thrust_side: f32,
    pub thrust_up: f32,
    pub thrust_down: f32,
    pub air_damping: f32,
    /// Extra per-tick damping while stunned or bubbled
    pub stun_damping: f32,
    /// Upward drift while trapped in a bubble
    pub bubble_buoyancy: f32,
    pub bounds_margin: f32,
    pub wall_restitution: f32,
    pub ground_restitution: f32,
    pub dig_alignment_min: f32,
    pub dig_pressure_cap: f32,
    pub dig_rate: f32,
}

impl Default for DiggerTuning {
    fn default() -> Self {
        Self {
            radius: DIGGER_RADIUS,
            mass: DIGGER_MASS,
            gravity: MINER_GRAVITY,
            thrust_side: 0.9,
            thrust_up: 1.1,
            thrust_down: 0.45,
            air_damping: DIGGER_AIR_DAMPING,
            stun_damping: DIGGER_STUN_DAMPING,
            bubble_buoyancy: 0.08,
            bounds_margin: BOUNDS_MARGIN,
            wall_restitution: WALL_RESTITUTION,
            ground_restitution: GROUND_RESTITUTION,
            dig_alignment_min: DIG_ALIGNMENT_MIN,
            dig_pressure_cap: DIG_PRESSURE_CAP,
            dig_rate: DIG_RATE,
        }
    }
}

/// Spring-mesh jelly body
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JellyParams {
    pub node_count: usize,
    pub substeps: u32,
    pub center_mass: f32,
    pub node_mass: f32,
    /// Fraction of world gravity applied to the center
    pub center_gravity_scale: f32,
    /// Fraction of world gravity applied to each ring node
    pub ring_gravity_scale: f32,
    /// Velocity multiplier per substep
    pub damping: f32,
    pub stiffness_radial: f32,
    pub stiffness_structural: f32,
    pub restitution: f32,
    /// Contact radius of a single ring node
    pub node_radius: f32,
}

impl Default for JellyParams {
    fn default() -> Self {
        Self {
            node_count: 16,
            substeps: 3,
            center_mass: DIGGER_MASS,
            node_mass: 0.2,
            center_gravity_scale: 0.6,
            ring_gravity_scale: 1.0,
            damping: 0.995,
            stiffness_radial: 0.25,
            stiffness_structural: 0.35,
            restitution: WALL_RESTITUTION,
            node_radius: 5.0,
        }
    }
}

/// Biplane flight model
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FlightTuning {
    pub radius: f32,
    pub gravity: f32,
    pub thrust: f32,
    pub lift_factor: f32,
    /// Degrees per tick
    pub turn_speed: f32,
    pub air_damping: f32,
    pub ground_friction: f32,
    pub ground_height: f32,
    pub min_takeoff_speed: f32,
    pub max_landing_speed: f32,
    pub stall_climb_deg: f32,
    pub stall_recovery_climb_deg: f32,
    pub stall_lift_factor: f32,
    /// Planes collide when closer than this times their combined radii
    pub collision_factor: f32,
    pub trampoline_restitution: f32,
    pub speed_boost: f32,
}

impl Default for FlightTuning {
    fn default() -> Self {
        Self {
            radius: PLANE_RADIUS,
            gravity: FLIGHT_GRAVITY,
            thrust: THRUST_FORCE,
            lift_factor: LIFT_FACTOR,
            turn_speed: TURN_SPEED,
            air_damping: DIGGER_AIR_DAMPING,
            ground_friction: GROUND_FRICTION,
            ground_height: GROUND_HEIGHT,
            min_takeoff_speed: MIN_TAKEOFF_SPEED,
            max_landing_speed: MAX_LANDING_SPEED,
            stall_climb_deg: STALL_CLIMB_DEG,
            stall_recovery_climb_deg: STALL_RECOVERY_CLIMB_DEG,
            stall_lift_factor: STALL_LIFT_FACTOR,
            collision_factor: PLANE_COLLISION_FACTOR,
            trampoline_restitution: 0.9,
            speed_boost: 1.5,
        }
    }
}

/// Durations, counts and cooldowns shared by both variants
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Rules {
    pub gem_count: usize,
    pub gem_cover_check_radius: f32,
    pub gem_cover_threshold: f32,
    pub shoot_cooldown_ticks: u32,
    pub bomb_cooldown_ticks: u32,
    pub stun_ticks: u32,
    pub bubble_ticks: u32,
    pub powerup_ticks: u32,
    pub respawn_ticks: u32,
    pub balloon_respawn_ticks: u32,
    pub shield_hit_cost: f32,
    pub explosion_radius: f32,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            gem_count: GEM_COUNT,
            gem_cover_check_radius: GEM_COVER_CHECK_RADIUS,
            gem_cover_threshold: GEM_COVER_THRESHOLD,
            shoot_cooldown_ticks: SHOOT_COOLDOWN_TICKS,
            bomb_cooldown_ticks: BOMB_COOLDOWN_TICKS,
            stun_ticks: STUN_TICKS,
            bubble_ticks: BUBBLE_TRAP_TICKS,
            powerup_ticks: POWERUP_TICKS,
            respawn_ticks: RESPAWN_DELAY_TICKS,
            balloon_respawn_ticks: BALLOON_RESPAWN_TICKS,
            shield_hit_cost: SHIELD_HIT_COST,
            explosion_radius: BOMB_EXPLOSION_RADIUS,
        }
    }
}

/// Complete simulation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub variant: Variant,
    /// Body model for jelly miner actors (planes always fly)
    pub body: BodyModel,
    /// Viewport width (world units)
    pub width: f32,
    /// Viewport height (world units)
    pub height: f32,
    pub field: FieldConfig,
    pub digger: DiggerTuning,
    pub jelly: JellyParams,
    pub flight: FlightTuning,
    pub rules: Rules,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            variant: Variant::JellyMiner,
            body: BodyModel::Digger,
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            field: FieldConfig::default(),
            digger: DiggerTuning::default(),
            jelly: JellyParams::default(),
            flight: FlightTuning::default(),
            rules: Rules::default(),
        }
    }
}

impl Settings {
    /// Default settings for a variant
    pub fn for_variant(variant: Variant) -> Self {
        Self {
            variant,
            ..Self::default()
        }
    }

    /// Parse settings from JSON and validate them
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let settings = Self::from_json(&json)?;
        log::info!(
            "Loaded {} settings from {}",
            settings.variant.as_str(),
            path.display()
        );
        Ok(settings)
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values the simulation cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("width", self.width)?;
        positive("height", self.height)?;
        positive("field.spacing", self.field.spacing)?;
        positive("field.node_radius", self.field.node_radius)?;
        non_negative("field.min_radius", self.field.min_radius)?;
        fraction("field.open_skip_chance", self.field.open_skip_chance)?;
        fraction("field.radius_jitter", self.field.radius_jitter)?;
        positive("digger.radius", self.digger.radius)?;
        positive("digger.mass", self.digger.mass)?;
        restitution("digger.wall_restitution", self.digger.wall_restitution)?;
        restitution("digger.ground_restitution", self.digger.ground_restitution)?;
        if self.jelly.node_count < 3 {
            return Err(ConfigError::invalid(
                "jelly.node_count",
                format!("need at least 3 ring nodes, got {}", self.jelly.node_count),
            ));
        }
        if self.jelly.substeps == 0 {
            return Err(ConfigError::invalid("jelly.substeps", "must be at least 1"));
        }
        positive("jelly.center_mass", self.jelly.center_mass)?;
        positive("jelly.node_mass", self.jelly.node_mass)?;
        fraction("jelly.stiffness_radial", self.jelly.stiffness_radial)?;
        fraction("jelly.stiffness_structural", self.jelly.stiffness_structural)?;
        restitution("jelly.restitution", self.jelly.restitution)?;
        positive("flight.radius", self.flight.radius)?;
        non_negative("flight.ground_height", self.flight.ground_height)?;
        if self.flight.ground_height >= self.height {
            return Err(ConfigError::invalid(
                "flight.ground_height",
                "ground strip must be lower than the viewport height",
            ));
        }
        fraction("rules.shield_hit_cost", self.rules.shield_hit_cost)?;
        non_negative("rules.explosion_radius", self.rules.explosion_radius)?;
        Ok(())
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("must be positive, got {value}")))
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("must be >= 0, got {value}")))
    }
}

fn fraction(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("must be in [0, 1], got {value}")))
    }
}

fn restitution(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if (0.0..=2.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("must be in [0, 2], got {value}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_round_trip_names() {
        for v in [Variant::JellyMiner, Variant::Biplane] {
            assert_eq!(Variant::from_str(v.as_str()), Some(v));
        }
        assert_eq!(Variant::from_str("PLANES"), Some(Variant::Biplane));
        assert_eq!(Variant::from_str("chess"), None);
    }

    #[test]
    fn test_defaults_are_valid() {
        assert!(Settings::default().validate().is_ok());
        assert!(Settings::for_variant(Variant::Biplane).validate().is_ok());
    }

    #[test]
    fn test_partial_json_overrides() {
        let json = r#"{ "variant": "Biplane", "width": 800.0, "field": { "spacing": 32.0 } }"#;
        let settings = Settings::from_json(json).unwrap();
        assert_eq!(settings.variant, Variant::Biplane);
        assert_eq!(settings.width, 800.0);
        assert_eq!(settings.field.spacing, 32.0);
        // Untouched values keep their defaults
        assert_eq!(settings.field.node_radius, FIELD_NODE_RADIUS);
        assert_eq!(settings.rules.gem_count, GEM_COUNT);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = Settings::from_json(r#"{ "height": -5.0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "height", .. }));

        let err = Settings::from_json(r#"{ "jelly": { "node_count": 2 } }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "jelly.node_count", .. }));

        let err = Settings::from_json("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = Settings::load("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
        assert!(err.to_string().contains("failed to read settings"));
    }
}
