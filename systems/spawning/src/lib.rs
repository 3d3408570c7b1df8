#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Spawning system responsible for emitting attacker waves and currency pickups.
//!
//! Two independent interval timers accumulate frame time. Whenever a timer
//! covers its interval, the interval is subtracted rather than the timer being
//! zeroed, so overshoot carries into the next wave and the long-run spawn rate
//! does not depend on frame pacing.

use std::time::Duration;

use glam::Vec2;
use lane_defence_core::{Command, Faction, SessionConfig};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Configuration parameters required to construct the spawning system.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Config {
    attacker_interval: Duration,
    max_attackers_per_wave: u32,
    min_attacker_speed: f32,
    max_attacker_speed: f32,
    lanes: u32,
    pickup_interval: Duration,
    min_pickups_per_wave: u32,
    max_pickups_per_wave: u32,
    play_area: Vec2,
    rng_seed: u64,
}

impl Config {
    /// Derives spawn cadence, wave sizes and the play area from a session.
    #[must_use]
    pub fn from_session(session: &SessionConfig, rng_seed: u64) -> Self {
        Self {
            attacker_interval: session.attackers.spawn_interval(),
            max_attackers_per_wave: session.attackers.max_per_wave,
            min_attacker_speed: session.attackers.min_speed,
            max_attacker_speed: session.attackers.max_speed,
            lanes: session.arena.rows,
            pickup_interval: session.pickups.spawn_interval(),
            min_pickups_per_wave: session.pickups.min_per_wave,
            max_pickups_per_wave: session.pickups.max_per_wave,
            play_area: session.arena.extent(),
            rng_seed,
        }
    }
}

/// Interval timer that reports how many whole intervals elapsed.
#[derive(Clone, Copy, Debug)]
struct SpawnTimer {
    interval: Duration,
    accumulator: Duration,
}

impl SpawnTimer {
    const fn new(interval: Duration) -> Self {
        Self {
            interval,
            accumulator: Duration::ZERO,
        }
    }

    fn advance(&mut self, dt: Duration) -> usize {
        if self.interval.is_zero() {
            return 0;
        }

        self.accumulator = self.accumulator.saturating_add(dt);
        let mut waves = 0;
        while self.accumulator >= self.interval {
            self.accumulator -= self.interval;
            waves += 1;
        }
        waves
    }
}

/// Seeded system that emits spawn commands as its timers elapse.
#[derive(Debug)]
pub struct Spawning {
    config: Config,
    attackers: SpawnTimer,
    pickups: SpawnTimer,
    rng: ChaCha8Rng,
}

impl Spawning {
    /// Creates a new spawning system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            attackers: SpawnTimer::new(config.attacker_interval),
            pickups: SpawnTimer::new(config.pickup_interval),
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
            config,
        }
    }

    /// Advances the attacker timer and emits one `SpawnAttacker` per attacker
    /// in every wave that came due.
    pub fn spawn_attackers(&mut self, dt: Duration, out: &mut Vec<Command>) {
        if self.config.lanes == 0 || self.config.max_attackers_per_wave == 0 {
            return;
        }

        for _ in 0..self.attackers.advance(dt) {
            let count = self.rng.gen_range(1..=self.config.max_attackers_per_wave);
            for _ in 0..count {
                let lane = self.rng.gen_range(0..self.config.lanes);
                let speed = self
                    .rng
                    .gen_range(self.config.min_attacker_speed..=self.config.max_attacker_speed);
                let faction = Faction::ALL[self.rng.gen_range(0..Faction::ALL.len())];
                out.push(Command::SpawnAttacker {
                    lane,
                    faction,
                    speed,
                });
            }
        }
    }

    /// Advances the pickup timer and emits one `SpawnPickup` per pickup in
    /// every wave that came due.
    pub fn spawn_pickups(&mut self, dt: Duration, out: &mut Vec<Command>) {
        for _ in 0..self.pickups.advance(dt) {
            let count = self
                .rng
                .gen_range(self.config.min_pickups_per_wave..=self.config.max_pickups_per_wave);
            for _ in 0..count {
                let position = Vec2::new(
                    self.rng.gen_range(0.0..self.config.play_area.x),
                    self.rng.gen_range(0.0..self.config.play_area.y),
                );
                out.push(Command::SpawnPickup { position });
            }
        }
    }

    /// Time banked toward the next attacker wave.
    #[must_use]
    pub fn attacker_backlog(&self) -> Duration {
        self.attackers.accumulator
    }

    /// Time banked toward the next pickup wave.
    #[must_use]
    pub fn pickup_backlog(&self) -> Duration {
        self.pickups.accumulator
    }
}
