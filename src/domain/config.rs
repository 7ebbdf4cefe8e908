//! Simulation tuning.
//!
//! The numbers here are gameplay tuning, not physics. They were picked to look
//! right at 60 Hz with a 1024-unit world and 8192 particles, so every kernel
//! reads them from here instead of hard-coding them.

use serde::{Deserialize, Serialize};

use crate::core::{SimError, SimResult};
use crate::domain::particle_type::{ParticleType, TypeDefaults, DEFAULT_TYPE_TABLE, TYPE_COUNT};

/// Largest neighborhood window accepted from JSON (cells from the centre).
const MAX_WINDOW: i32 = 64;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SimConfig {
    /// Number of particle slots.
    pub capacity: usize,
    /// Side of the square world in world units.
    pub world_size: f32,
    pub types: [TypeDefaults; TYPE_COUNT],
    pub forces: ForceConfig,
    pub heat: HeatConfig,
    pub air: AirConfig,
    pub queries: QueryConfig,
    pub emit: EmitConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            capacity: 8192,
            world_size: 1024.0,
            types: DEFAULT_TYPE_TABLE,
            forces: ForceConfig::default(),
            heat: HeatConfig::default(),
            air: AirConfig::default(),
            queries: QueryConfig::default(),
            emit: EmitConfig::default(),
        }
    }
}

impl SimConfig {
    pub fn from_json(json: &str) -> SimResult<Self> {
        let config: SimConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }

    /// Cells per side of the half-resolution grids.
    #[inline]
    pub fn grid_side(&self) -> usize {
        (self.world_size * 0.5) as usize
    }

    #[inline]
    pub fn type_defaults(&self, ty: ParticleType) -> TypeDefaults {
        self.types[ty.index()]
    }

    pub fn validate(&self) -> SimResult<()> {
        if self.capacity == 0 {
            return Err(SimError::InvalidConfig("capacity must be > 0".to_string()));
        }
        // Hash cells store slot indices as u32
        if self.capacity >= u32::MAX as usize {
            return Err(SimError::InvalidConfig(format!(
                "capacity {} does not fit a hash cell",
                self.capacity
            )));
        }
        if !(self.world_size >= 4.0) || self.world_size % 2.0 != 0.0 {
            return Err(SimError::InvalidConfig(format!(
                "worldSize must be an even number >= 4, got {}",
                self.world_size
            )));
        }
        for (idx, t) in self.types.iter().enumerate() {
            if !(t.radius > 0.0) || t.viscosity < 0.0 || !(t.life > 0.0) {
                return Err(SimError::InvalidConfig(format!(
                    "type {} defaults need radius > 0, viscosity >= 0, life > 0",
                    idx
                )));
            }
        }
        if !(0.0..=1.0).contains(&self.forces.wall_restitution) {
            return Err(SimError::InvalidConfig(
                "forces.wallRestitution must be within [0, 1]".to_string(),
            ));
        }
        for (name, window) in [
            ("forces.window", self.forces.window),
            ("heat.window", self.heat.window),
            ("queries.nearestWindow", self.queries.nearest_window),
            ("queries.soundWindow", self.queries.sound_window),
        ] {
            if !(0..=MAX_WINDOW).contains(&window) {
                return Err(SimError::InvalidConfig(format!(
                    "{} must be within 0..={}, got {}",
                    name, MAX_WINDOW, window
                )));
            }
        }
        if self.queries.sound_lattice == 0 || self.queries.sound_lattice % 2 == 0 {
            return Err(SimError::InvalidConfig(
                "queries.soundLattice must be odd".to_string(),
            ));
        }
        if self.emit.solid_lattice_step < 1 {
            return Err(SimError::InvalidConfig(
                "emit.solidLatticeStep must be >= 1".to_string(),
            ));
        }
        if self.heat.min_heat > self.heat.max_heat {
            return Err(SimError::InvalidConfig(
                "heat.minHeat must not exceed heat.maxHeat".to_string(),
            ));
        }
        Ok(())
    }
}

/// Velocity integrator tuning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ForceConfig {
    /// Downward acceleration (world y grows downward).
    pub gravity: f32,
    /// Per-frame velocity retention.
    pub damping: f32,
    /// Water/Bio lose this share of velocity per unit of negative heat (ice).
    pub cold_damping: f32,
    /// Vertical push on Water/Bio per unit of heat: negative heat lifts,
    /// positive heat sinks.
    pub heat_buoyancy: f32,
    /// Lava/Bio extra lateral damping per unit of positive heat.
    pub hot_damping: f32,
    /// Hash cells scanned in each direction.
    pub window: i32,
    /// Repulsion coefficient, `pair[self][neighbor]`.
    pub pair: [[f32; TYPE_COUNT]; TYPE_COUNT],
    pub pair_scale: f32,
    /// Share of a neighbor's velocity added as drag.
    pub neighbor_drag: f32,
    pub player_radius: f32,
    /// Pull of Water/Bio toward the player inside `radius + playerRadius`.
    pub player_pull: f32,
    pub wall_restitution: f32,
}

impl Default for ForceConfig {
    fn default() -> Self {
        Self {
            gravity: 100.0,
            damping: 0.991,
            cold_damping: 0.9999,
            heat_buoyancy: 500.0,
            hot_damping: 0.05,
            window: 5,
            pair: [
                //  water  lava   solid  fire   bio
                [250.0, 200.0, 250.0, 1.0, 200.0], // water
                [25.0, 250.0, 250.0, 1.0, 250.0],  // lava
                [1.0, 1.0, 250.0, 1.0, 1.0],       // solid
                [1.0, 1.0, 250.0, 500.0, 1.0],     // fire
                [25.0, 250.0, 250.0, 1.0, 250.0],  // bio
            ],
            pair_scale: 4.0,
            neighbor_drag: 0.1,
            player_radius: 4.0,
            player_pull: 40.0,
            wall_restitution: 0.95,
        }
    }
}

/// Attribute/phase updater tuning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HeatConfig {
    pub window: i32,
    pub min_heat: f32,
    pub max_heat: f32,

    /// Water/Bio pair exchange rate.
    pub watery_rate: f32,
    /// Boost when a cold Water/Bio meets a hot one.
    pub watery_thaw_boost: f32,
    /// Partner heat that counts as "hot" for the thaw boost.
    pub thaw_partner_heat: f32,
    /// Below this a Water/Bio particle counts as cold.
    pub cold_heat: f32,
    pub lava_rate: f32,
    pub lava_chill_boost: f32,
    /// Lava partner heat below which Lava cools Lava fast.
    pub lava_chill_partner: f32,
    /// Water heated by Lava/Bio.
    pub water_heating_rate: f32,
    /// Multiplier once the Water heat is above `waterWarmAbove`.
    pub water_warm_factor: f32,
    pub water_warm_above: f32,
    pub water_lava_boost: f32,
    pub lava_cooling_rate: f32,
    pub lava_bio_rate: f32,
    pub bio_heating_rate: f32,
    /// Heat offset a hot partner is treated as having.
    pub hot_offset: f32,
    /// Heat offset Lava sees from Water.
    pub chill_offset: f32,
    /// Cap on a single pair exchange factor.
    pub exchange_cap: f32,

    /// Air heat map samples are scaled by this.
    pub air_sample_scale: f32,
    /// Ambient heat below this is ignored.
    pub air_threshold: f32,
    pub air_absorb_cold: f32,
    pub water_air_absorb: f32,
    pub bio_air_absorb: f32,

    pub boil_threshold: f32,
    pub boil_damage: f32,
    pub boil_growth: f32,
    pub lava_chill_threshold: f32,
    pub warm_relax: f32,

    /// Water/Bio retained share of new heat while cold / warm.
    pub water_cold_blend: f32,
    pub water_warm_blend: f32,
    pub default_blend: f32,

    pub water_freeze_below: f32,
    pub lava_freeze_below: f32,
    /// Life given to freshly frozen Solid.
    pub frozen_life: f32,
    pub solid_life_recovery: f32,
    pub solid_hot_heat: f32,
    pub solid_hot_radius: f32,

    pub fire_decay: f32,
    /// Influence above which overlap with a Solid kills the particle.
    pub crush_influence: f32,
    pub bio_contact: f32,
    pub bio_revert_damage: f32,
    pub bio_revert_life: f32,

    /// Slow particles with no same-type neighbor lose life.
    pub isolation_speed: f32,
    pub weak_life: f32,
    pub top_damage: f32,
}

impl Default for HeatConfig {
    fn default() -> Self {
        Self {
            window: 3,
            min_heat: -1.0,
            max_heat: 10.0,
            watery_rate: 3.0,
            watery_thaw_boost: 7.5,
            thaw_partner_heat: 0.5,
            cold_heat: -0.1,
            lava_rate: 0.5,
            lava_chill_boost: 16.0,
            lava_chill_partner: -0.25,
            water_heating_rate: 4.0,
            water_warm_factor: 0.1,
            water_warm_above: -0.01,
            water_lava_boost: 4.0,
            lava_cooling_rate: 24.0,
            lava_bio_rate: 0.1,
            bio_heating_rate: 24.0,
            hot_offset: 5.0,
            chill_offset: 1.0,
            exchange_cap: 0.5,
            air_sample_scale: 0.25,
            air_threshold: 2.5,
            air_absorb_cold: 15.0,
            water_air_absorb: 0.5,
            bio_air_absorb: 5.0,
            boil_threshold: 0.1,
            boil_damage: 2.0,
            boil_growth: 2.0,
            lava_chill_threshold: -0.1,
            warm_relax: 0.25,
            water_cold_blend: 0.9,
            water_warm_blend: 0.5,
            default_blend: 0.1,
            water_freeze_below: -0.9,
            lava_freeze_below: -0.9,
            frozen_life: 0.01,
            solid_life_recovery: 3.0,
            solid_hot_heat: 0.5,
            solid_hot_radius: 1.25,
            fire_decay: 1.0,
            crush_influence: 0.95,
            bio_contact: 0.5,
            bio_revert_damage: 4.0,
            bio_revert_life: 0.1,
            isolation_speed: 10.0,
            weak_life: 0.75,
            top_damage: 4.0,
        }
    }
}

/// Air heat map tuning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AirConfig {
    /// Fraction of `dt` the map advances per tick.
    pub time_scale: f32,
    pub inject_scale: f32,
    pub down_weight: f32,
    pub side_weight: f32,
    pub up_weight: f32,
    pub decay: f32,
    pub lava_offset: f32,
    pub lava_gain: f32,
    pub watery_bonus: f32,
}

impl Default for AirConfig {
    fn default() -> Self {
        Self {
            time_scale: 0.25,
            inject_scale: 2.0,
            down_weight: 2.0,
            side_weight: 1.0,
            up_weight: 0.6,
            decay: 0.8,
            lava_offset: 2.0,
            lava_gain: 8.0,
            watery_bonus: 0.1,
        }
    }
}

/// Query kernel tuning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QueryConfig {
    pub nearest_window: i32,
    /// Particles at or below this life are not reported as nearest.
    pub nearest_min_life: f32,
    /// Sample points per side of the audio lattice (odd).
    pub sound_lattice: usize,
    pub sound_spacing: f32,
    pub sound_window: i32,
    pub sound_falloff: f32,
    pub sound_falloff_exp: f32,
    pub sound_heat_gain: f32,
    pub sound_heat_density: f32,
    pub sound_heat_speed: f32,
    pub sound_velocity_exp: f32,
    pub sound_velocity_gain: f32,
    pub sound_refresh_chance: f32,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            nearest_window: 15,
            nearest_min_life: 0.75,
            sound_lattice: 17,
            sound_spacing: 30.0,
            sound_window: 7,
            sound_falloff: 12.0,
            sound_falloff_exp: 0.15,
            sound_heat_gain: 24.0,
            sound_heat_density: 0.5,
            sound_heat_speed: 500.0,
            sound_velocity_exp: 0.1,
            sound_velocity_gain: 10.0,
            sound_refresh_chance: 0.25,
        }
    }
}

/// Emission protocol tuning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EmitConfig {
    /// Non-solid placement lands within `radius * jitterScale` of the centre.
    pub jitter_scale: f32,
    /// Same-type particles this close to the sampled point are replaced.
    pub replace_radius: f32,
    /// Anything this close to a rock lattice point is replaced.
    pub solid_clear_radius: f32,
    /// Stride of the rock lattice in half-resolution cells. 1 fills every
    /// covered cell; larger values give a sparser editor brush.
    pub solid_lattice_step: i32,
    pub down_speed: f32,
}

impl Default for EmitConfig {
    fn default() -> Self {
        Self {
            jitter_scale: 2.0,
            replace_radius: 0.5,
            solid_clear_radius: 1.99,
            solid_lattice_step: 1,
            down_speed: 100.0,
        }
    }
}
