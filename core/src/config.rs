//! Tunable parameters describing a single game session.
//!
//! Every table carries `#[serde(default)]` so partial TOML documents only need
//! to mention the values they override. Durations are stored as fractional
//! seconds and converted on demand.

use std::time::Duration;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{BaseRect, CellCoord};

/// Complete set of tunables for a game session.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Playfield layout, grid geometry and starting lives.
    pub arena: ArenaConfig,
    /// Attacker wave cadence, speed range and collision size.
    pub attackers: AttackerConfig,
    /// Defender inventory, cooldown and collision size.
    pub defenders: DefenderConfig,
    /// Projectile speed range and spin.
    pub projectiles: ProjectileConfig,
    /// Currency pickup cadence and lifespan.
    pub pickups: PickupConfig,
}

impl SessionConfig {
    /// Rejects configurations that would produce a degenerate session.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let arena = &self.arena;
        positive("arena.width", arena.width)?;
        positive("arena.height", arena.height)?;
        positive("arena.cell_side", arena.cell_side)?;
        positive("arena.rows", arena.rows as f32)?;
        positive("arena.columns", arena.columns as f32)?;
        if arena.rows.checked_mul(arena.columns).is_none() {
            return Err(ConfigError::GridTooLarge {
                rows: arena.rows,
                columns: arena.columns,
            });
        }
        positive("arena.starting_lives", arena.starting_lives as f32)?;
        non_negative("arena.cell_spacing", arena.cell_spacing)?;
        non_negative("arena.drop_tolerance", arena.drop_tolerance)?;
        probability("arena.opening_defender_chance", arena.opening_defender_chance)?;

        let attackers = &self.attackers;
        positive("attackers.spawn_interval_secs", attackers.spawn_interval_secs)?;
        positive("attackers.max_per_wave", attackers.max_per_wave as f32)?;
        positive("attackers.min_speed", attackers.min_speed)?;
        ordered("attackers.speed", attackers.min_speed, attackers.max_speed)?;
        positive("attackers.outer_radius", attackers.outer_radius)?;
        positive("attackers.fade_rate", attackers.fade_rate)?;

        let pickups = &self.pickups;
        positive("pickups.spawn_interval_secs", pickups.spawn_interval_secs)?;
        positive("pickups.min_per_wave", pickups.min_per_wave as f32)?;
        ordered(
            "pickups.per_wave",
            pickups.min_per_wave as f32,
            pickups.max_per_wave as f32,
        )?;
        positive("pickups.lifespan_secs", pickups.lifespan_secs)?;
        positive("pickups.radius", pickups.radius)?;

        let defenders = &self.defenders;
        if defenders.costs.is_empty() {
            return Err(ConfigError::EmptyInventory);
        }
        non_negative("defenders.shot_cooldown_secs", defenders.shot_cooldown_secs)?;
        positive("defenders.pick_radius", defenders.pick_radius)?;
        positive("defenders.reach", defenders.reach)?;
        positive("defenders.fade_rate", defenders.fade_rate)?;

        let projectiles = &self.projectiles;
        positive("projectiles.min_speed", projectiles.min_speed)?;
        ordered(
            "projectiles.speed",
            projectiles.min_speed,
            projectiles.max_speed,
        )?;
        positive("projectiles.reach", projectiles.reach)?;

        Ok(())
    }
}

/// Playfield dimensions, grid lattice and session-wide counters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    /// Width of the visible play area in world units.
    pub width: f32,
    /// Height of the visible play area in world units.
    pub height: f32,
    /// Number of grid rows, which doubles as the number of lanes.
    pub rows: u32,
    /// Number of grid columns available for placement.
    pub columns: u32,
    /// Side length of a grid cell.
    pub cell_side: f32,
    /// Gap left between neighbouring cells.
    pub cell_spacing: f32,
    /// Maximum distance between a drop point and a cell center.
    pub drop_tolerance: f32,
    /// Lives available when the session starts.
    pub starting_lives: u32,
    /// Probability that a cell receives a free defender when the session starts.
    pub opening_defender_chance: f32,
    /// Side length of an inventory slot.
    pub inventory_slot_size: f32,
    /// Gap left between neighbouring inventory slots.
    pub inventory_spacing: f32,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 720.0,
            rows: 5,
            columns: 4,
            cell_side: 85.0,
            cell_spacing: 85.0 / 4.0,
            drop_tolerance: 15.0,
            starting_lives: 3,
            opening_defender_chance: 0.5,
            inventory_slot_size: 100.0,
            inventory_spacing: 85.0 / 4.0,
        }
    }
}

impl ArenaConfig {
    /// World-space center of the provided grid cell.
    ///
    /// Column zero sits one cell width away from the left edge, leaving room
    /// for the base. Rows grow upwards from the bottom of the arena.
    #[must_use]
    pub fn cell_center(&self, cell: CellCoord) -> Vec2 {
        let column = cell.column() as f32;
        let half = self.cell_side / 2.0;
        Vec2::new(
            self.cell_side * (column + 1.0) + column * self.cell_spacing + half,
            self.lane_y(cell.row()),
        )
    }

    /// Vertical coordinate attackers travel along in the provided lane.
    #[must_use]
    pub fn lane_y(&self, row: u32) -> f32 {
        let row = row as f32;
        self.cell_side * row + self.cell_spacing * (row + 1.0) + self.cell_side / 2.0
    }

    /// Rectangle that attackers must not reach.
    #[must_use]
    pub fn base_rect(&self) -> BaseRect {
        let rows = self.rows as f32;
        BaseRect::new(
            Vec2::ZERO,
            Vec2::new(
                self.cell_side,
                rows * (self.cell_side + self.cell_spacing) + self.cell_spacing,
            ),
        )
    }

    /// World-space center of the inventory slot at `index`.
    #[must_use]
    pub fn inventory_slot_center(&self, index: u32) -> Vec2 {
        let size = self.inventory_slot_size;
        Vec2::new(
            index as f32 * (size + self.inventory_spacing) + size / 2.0,
            self.height - self.inventory_spacing - size / 2.0,
        )
    }

    /// Extent of the visible play area.
    #[must_use]
    pub fn extent(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }
}

/// Attacker waves and attacker collision parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttackerConfig {
    /// Seconds between attacker waves.
    pub spawn_interval_secs: f32,
    /// Largest number of attackers released by a single wave.
    pub max_per_wave: u32,
    /// Slowest attacker speed in world units per second.
    pub min_speed: f32,
    /// Fastest attacker speed in world units per second.
    pub max_speed: f32,
    /// Outer collision radius.
    pub outer_radius: f32,
    /// Inner radius used by the visual layer.
    pub inner_radius: f32,
    /// Scale lost per second once destroyed.
    pub fade_rate: f32,
}

impl Default for AttackerConfig {
    fn default() -> Self {
        Self {
            spawn_interval_secs: 8.0,
            max_per_wave: 4,
            min_speed: 25.0,
            max_speed: 50.0,
            outer_radius: 35.0,
            inner_radius: 25.0,
            fade_rate: 0.25,
        }
    }
}

impl AttackerConfig {
    /// Delay between attacker waves.
    #[must_use]
    pub fn spawn_interval(&self) -> Duration {
        seconds(self.spawn_interval_secs)
    }
}

/// Currency pickup waves.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PickupConfig {
    /// Seconds between pickup waves.
    pub spawn_interval_secs: f32,
    /// Smallest number of pickups released by a single wave.
    pub min_per_wave: u32,
    /// Largest number of pickups released by a single wave.
    pub max_per_wave: u32,
    /// Seconds a pickup stays collectable.
    pub lifespan_secs: f32,
    /// Pointer pick radius.
    pub radius: f32,
    /// Maximum number of collected pickups kept on display.
    pub display_cap: usize,
}

impl Default for PickupConfig {
    fn default() -> Self {
        Self {
            spawn_interval_secs: 5.0,
            min_per_wave: 3,
            max_per_wave: 6,
            lifespan_secs: 5.0,
            radius: 20.0,
            display_cap: 3,
        }
    }
}

impl PickupConfig {
    /// Delay between pickup waves.
    #[must_use]
    pub fn spawn_interval(&self) -> Duration {
        seconds(self.spawn_interval_secs)
    }

    /// Time a freshly spawned pickup stays collectable.
    #[must_use]
    pub fn lifespan(&self) -> Duration {
        seconds(self.lifespan_secs)
    }
}

/// Defender inventory and combat parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefenderConfig {
    /// Currency cost of each inventory template, in slot order.
    pub costs: Vec<u32>,
    /// Seconds a placed defender waits between shots.
    pub shot_cooldown_secs: f32,
    /// Pointer pick radius for templates and placed defenders.
    pub pick_radius: f32,
    /// Characteristic length used by attacker collisions.
    pub reach: f32,
    /// Inner length used by the visual layer.
    pub inner_length: f32,
    /// Scale lost per second once crushed.
    pub fade_rate: f32,
}

impl Default for DefenderConfig {
    fn default() -> Self {
        Self {
            costs: vec![1, 1, 1, 1, 2, 2, 3, 3],
            shot_cooldown_secs: 5.0,
            pick_radius: 55.0,
            reach: 40.0,
            inner_length: 25.0,
            fade_rate: 0.25,
        }
    }
}

impl DefenderConfig {
    /// Delay between consecutive shots of a placed defender.
    #[must_use]
    pub fn shot_cooldown(&self) -> Duration {
        seconds(self.shot_cooldown_secs)
    }
}

/// Projectile motion parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectileConfig {
    /// Slowest projectile speed in world units per second.
    pub min_speed: f32,
    /// Fastest projectile speed in world units per second.
    pub max_speed: f32,
    /// Rotation in degrees applied when a projectile is fired.
    pub initial_rotation: f32,
    /// Spin in degrees per second.
    pub spin_rate: f32,
    /// Length of the projectile's longer side, used by attacker collisions.
    pub reach: f32,
    /// Length of the projectile's shorter side, used by the visual layer.
    pub width: f32,
}

impl Default for ProjectileConfig {
    fn default() -> Self {
        Self {
            min_speed: 30.0,
            max_speed: 60.0,
            initial_rotation: 30.0,
            spin_rate: 5.0,
            reach: 5.0,
            width: 3.0,
        }
    }
}

/// Reasons a [`SessionConfig`] is refused.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigError {
    /// A value that must be strictly positive and finite was not.
    #[error("{field} must be positive and finite (received {value})")]
    NotPositive {
        /// Dotted path of the offending field.
        field: &'static str,
        /// Value supplied by the configuration.
        value: f32,
    },
    /// A value that must be finite and not negative was not.
    #[error("{field} must be finite and not negative (received {value})")]
    Negative {
        /// Dotted path of the offending field.
        field: &'static str,
        /// Value supplied by the configuration.
        value: f32,
    },
    /// The lower bound of a range exceeds its upper bound, or a bound is not
    /// finite.
    #[error("{field} range must be finite and ordered (received {min}..={max})")]
    InvertedRange {
        /// Dotted path of the offending range.
        field: &'static str,
        /// Lower bound supplied by the configuration.
        min: f32,
        /// Upper bound supplied by the configuration.
        max: f32,
    },
    /// A probability lies outside `0.0..=1.0`.
    #[error("{field} must lie within 0.0..=1.0 (received {value})")]
    NotAProbability {
        /// Dotted path of the offending field.
        field: &'static str,
        /// Value supplied by the configuration.
        value: f32,
    },
    /// The grid holds more cells than can be addressed.
    #[error("arena grid of {rows} x {columns} cells is too large")]
    GridTooLarge {
        /// Number of rows supplied by the configuration.
        rows: u32,
        /// Number of columns supplied by the configuration.
        columns: u32,
    },
    /// The defender inventory lists no templates.
    #[error("defenders.costs must list at least one inventory template")]
    EmptyInventory,
}

fn seconds(value: f32) -> Duration {
    Duration::try_from_secs_f32(value).unwrap_or(Duration::ZERO)
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { field, value })
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Negative { field, value })
    }
}

fn ordered(field: &'static str, min: f32, max: f32) -> Result<(), ConfigError> {
    if min.is_finite() && max.is_finite() && min <= max {
        Ok(())
    } else {
        Err(ConfigError::InvertedRange { field, min, max })
    }
}

fn probability(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::NotAProbability { field, value })
    }
}
