#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that decides when placed defenders fire.

use lane_defence_core::{AttackerView, Command, DefenderSnapshot, DefenderView, SessionConfig};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Configuration parameters required to construct the combat system.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Config {
    min_projectile_speed: f32,
    max_projectile_speed: f32,
    rng_seed: u64,
}

impl Config {
    /// Creates a configuration from an explicit projectile speed range.
    #[must_use]
    pub const fn new(min_projectile_speed: f32, max_projectile_speed: f32, rng_seed: u64) -> Self {
        Self {
            min_projectile_speed,
            max_projectile_speed,
            rng_seed,
        }
    }

    /// Reads the projectile speed range from a session configuration.
    #[must_use]
    pub fn from_session(session: &SessionConfig, rng_seed: u64) -> Self {
        Self::new(
            session.projectiles.min_speed,
            session.projectiles.max_speed,
            rng_seed,
        )
    }
}

/// Reports whether an active attacker shares the defender's lane and faction.
#[must_use]
pub fn has_target(defender: &DefenderSnapshot, attackers: &AttackerView) -> bool {
    let Some(cell) = defender.cell else {
        return false;
    };
    attackers
        .active()
        .any(|attacker| attacker.lane == cell.row() && attacker.faction == defender.faction)
}

/// Combat system that queues firing commands for ready defenders.
#[derive(Debug)]
pub struct Combat {
    config: Config,
    rng: ChaCha8Rng,
    scratch: Vec<Command>,
}

impl Combat {
    /// Creates a new combat system seeded from the configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
            config,
            scratch: Vec::new(),
        }
    }

    /// Emits `Command::FireProjectile` for every placed defender whose shot
    /// timer has covered its cooldown while a matching attacker is in its lane.
    ///
    /// Shot timers are charged by the world beforehand; defenders without a
    /// target keep charging and fire as soon as one appears.
    pub fn handle(
        &mut self,
        defenders: &DefenderView,
        attackers: &AttackerView,
        out: &mut Vec<Command>,
    ) {
        self.scratch.clear();

        for defender in defenders.placed() {
            if !defender.ready() || !has_target(defender, attackers) {
                continue;
            }
            let speed = self
                .rng
                .gen_range(self.config.min_projectile_speed..=self.config.max_projectile_speed);
            self.scratch.push(Command::FireProjectile {
                defender: defender.id,
                speed,
            });
        }

        if self.scratch.is_empty() {
            return;
        }

        out.reserve(self.scratch.len());
        out.append(&mut self.scratch);
    }
}
