#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative session state for Lane Defence.
//!
//! The world owns the grid, every entity store and the economy counters. It
//! only changes in response to [`apply`], and reports each change as an
//! [`Event`]. Once the session stops, gameplay commands are ignored.

mod economy;
mod entities;
mod grid;
mod store;

pub use grid::{GridCell, GridRegistry};

use std::time::Duration;

use economy::Economy;
use entities::{fade, Attacker, Defender, Pickup, Projectile};
use glam::Vec2;
use lane_defence_core::{
    AttackerId, CellCoord, Command, DefenderId, DefenderTemplate, EntityKey, Event, Faction,
    InventorySlot, PickupId, PlacementError, ProjectileId, SessionConfig, ATTACKER_HIT_THRESHOLD,
    WELCOME_BANNER,
};
use store::Store;

/// Represents the authoritative Lane Defence world state.
#[derive(Debug)]
pub struct World {
    banner: &'static str,
    config: SessionConfig,
    grid: GridRegistry,
    templates: Vec<DefenderTemplate>,
    attackers: Store<AttackerId, Attacker>,
    defenders: Store<DefenderId, Defender>,
    projectiles: Store<ProjectileId, Projectile>,
    pickups: Store<PickupId, Pickup>,
    economy: Economy,
    running: bool,
}

impl World {
    /// Creates a running session laid out according to `config`.
    ///
    /// The inventory bar receives one template per configured cost, with
    /// factions assigned in palette order. The grid starts empty.
    #[must_use]
    pub fn new(config: SessionConfig) -> Self {
        let templates = config
            .defenders
            .costs
            .iter()
            .enumerate()
            .map(|(index, &cost)| DefenderTemplate {
                slot: InventorySlot::new(index as u32),
                faction: Faction::from_index(index),
                cost,
                position: config.arena.inventory_slot_center(index as u32),
                pick_radius: config.defenders.pick_radius,
            })
            .collect();

        Self {
            banner: WELCOME_BANNER,
            grid: GridRegistry::new(&config.arena),
            templates,
            attackers: Store::new(),
            defenders: Store::new(),
            projectiles: Store::new(),
            pickups: Store::new(),
            economy: Economy::new(config.arena.starting_lives, config.pickups.display_cap),
            running: true,
            config,
        }
    }

    fn retire_attacker(&mut self, attacker: AttackerId, out_events: &mut Vec<Event>) {
        if self.attackers.remove(attacker).is_some() {
            out_events.push(Event::EntityRetired {
                entity: EntityKey::Attacker(attacker),
            });
        }
    }

    fn retire_projectile(&mut self, projectile: ProjectileId, out_events: &mut Vec<Event>) {
        if self.projectiles.remove(projectile).is_some() {
            out_events.push(Event::EntityRetired {
                entity: EntityKey::Projectile(projectile),
            });
        }
    }

    fn retire_pickup(&mut self, pickup: PickupId, out_events: &mut Vec<Event>) {
        if self.pickups.remove(pickup).is_some() {
            out_events.push(Event::EntityRetired {
                entity: EntityKey::Pickup(pickup),
            });
        }
    }

    fn retire_defender(&mut self, defender: DefenderId, out_events: &mut Vec<Event>) {
        if self.defenders.remove(defender).is_some() {
            out_events.push(Event::EntityRetired {
                entity: EntityKey::Defender(defender),
            });
        }
    }

    fn spawn_attacker(&mut self, lane: u32, faction: Faction, speed: f32) -> Option<AttackerId> {
        if lane >= self.grid.rows() {
            return None;
        }
        let position = Vec2::new(self.config.arena.width, self.config.arena.lane_y(lane));
        let radius = self.config.attackers.outer_radius;
        Some(self.attackers.insert_with(|id| Attacker {
            id,
            faction,
            lane,
            position,
            speed,
            hits: 0,
            radius,
            active: true,
            scale: 1.0,
        }))
    }

    /// Occupies `cell` and stores a fresh defender there.
    fn place_defender(
        &mut self,
        faction: Faction,
        cell: CellCoord,
    ) -> Result<DefenderId, PlacementError> {
        self.grid.occupy(cell)?;
        let position = self.config.arena.cell_center(cell);
        let reach = self.config.defenders.reach;
        let cooldown = self.config.defenders.shot_cooldown();
        Ok(self.defenders.insert_with(|id| Defender {
            id,
            faction,
            position,
            cell: Some(cell),
            reach,
            shot_timer: Duration::ZERO,
            cooldown,
            active: true,
            scale: 1.0,
        }))
    }

    fn purchase_defender(
        &mut self,
        slot: InventorySlot,
        cell: CellCoord,
    ) -> Result<(DefenderId, Faction, u32), PlacementError> {
        let template = self
            .templates
            .get(slot.get() as usize)
            .copied()
            .ok_or(PlacementError::UnknownSlot)?;
        self.economy.ensure_affordable(template.cost)?;
        let defender = self.place_defender(template.faction, cell)?;
        let currency = self.economy.spend(template.cost);
        Ok((defender, template.faction, currency))
    }

    fn fire_projectile(&mut self, defender: DefenderId, speed: f32) -> Option<Event> {
        let state = self.defenders.get_mut(defender)?;
        if !state.placed() || state.shot_timer < state.cooldown {
            return None;
        }
        state.shot_timer = Duration::ZERO;
        let faction = state.faction;
        let position = state.position;

        let rotation = self.config.projectiles.initial_rotation;
        let spin_rate = self.config.projectiles.spin_rate;
        let reach = self.config.projectiles.reach;
        let projectile = self.projectiles.insert_with(|id| Projectile {
            id,
            faction,
            position,
            rotation,
            speed,
            spin_rate,
            reach,
        });

        Some(Event::ProjectileFired {
            projectile,
            defender,
            faction,
            position,
        })
    }

    fn hit_attacker(
        &mut self,
        attacker: AttackerId,
        projectile: ProjectileId,
        out_events: &mut Vec<Event>,
    ) {
        let Some(faction) = self.projectiles.get(projectile).map(|shot| shot.faction) else {
            return;
        };
        let Some(target) = self.attackers.get_mut(attacker) else {
            return;
        };
        if !target.active || target.faction != faction {
            return;
        }

        target.hits = target.hits.saturating_add(1);
        let hits = target.hits;
        let destroyed = hits >= ATTACKER_HIT_THRESHOLD;
        if destroyed {
            target.active = false;
        }

        out_events.push(Event::AttackerHit {
            attacker,
            projectile,
            hits,
        });
        self.retire_projectile(projectile, out_events);
        if destroyed {
            out_events.push(Event::AttackerDestroyed { attacker });
        }
    }

    fn animate_fades(&mut self, dt: f32, out_events: &mut Vec<Event>) {
        let rate = self.config.attackers.fade_rate;
        let vanished: Vec<AttackerId> = self
            .attackers
            .values_mut()
            .filter(|attacker| !attacker.active)
            .filter_map(|attacker| fade(&mut attacker.scale, rate, dt).then_some(attacker.id))
            .collect();
        for attacker in vanished {
            self.retire_attacker(attacker, out_events);
        }

        let rate = self.config.defenders.fade_rate;
        let vanished: Vec<DefenderId> = self
            .defenders
            .values_mut()
            .filter(|defender| !defender.active)
            .filter_map(|defender| fade(&mut defender.scale, rate, dt).then_some(defender.id))
            .collect();
        for defender in vanished {
            self.retire_defender(defender, out_events);
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

/// Applies the provided command to the world, mutating state deterministically.
///
/// While the session is stopped every command is ignored, except that
/// placement requests are answered with [`PlacementError::GameOver`] so the
/// caller learns why nothing happened.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    if !world.running {
        if let Command::PlaceDefender { slot, cell } = command {
            out_events.push(Event::PlacementRejected {
                slot,
                cell,
                reason: PlacementError::GameOver,
            });
        }
        return;
    }

    match command {
        Command::SpawnAttacker {
            lane,
            faction,
            speed,
        } => {
            if let Some(attacker) = world.spawn_attacker(lane, faction, speed) {
                out_events.push(Event::AttackerSpawned {
                    attacker,
                    lane,
                    faction,
                });
            }
        }
        Command::SpawnPickup { position } => {
            let remaining = world.config.pickups.lifespan();
            let radius = world.config.pickups.radius;
            let pickup = world.pickups.insert_with(|id| Pickup {
                id,
                position,
                remaining,
                radius,
            });
            out_events.push(Event::PickupSpawned { pickup, position });
        }
        Command::AdvanceAttackers { dt } => {
            let dt = dt.as_secs_f32();
            let base = world.config.arena.base_rect();
            let escaped: Vec<AttackerId> = world
                .attackers
                .values_mut()
                .filter(|attacker| attacker.active)
                .filter_map(|attacker| attacker.advance(dt, &base).then_some(attacker.id))
                .collect();
            for attacker in escaped {
                out_events.push(Event::AttackerEscaped { attacker });
                world.retire_attacker(attacker, out_events);
            }
        }
        Command::BreachBase { attacker } => {
            if !world.attackers.get(attacker).is_some_and(|state| state.active) {
                return;
            }
            let lives_remaining = world.economy.lose_life();
            out_events.push(Event::BaseBreached {
                attacker,
                lives_remaining,
            });
            world.retire_attacker(attacker, out_events);
            if lives_remaining == 0 {
                world.running = false;
                out_events.push(Event::GameOver);
            }
        }
        Command::AgePickups { dt } => {
            let expired: Vec<PickupId> = world
                .pickups
                .values_mut()
                .filter_map(|pickup| pickup.age(dt).then_some(pickup.id))
                .collect();
            for pickup in expired {
                out_events.push(Event::PickupExpired { pickup });
                world.retire_pickup(pickup, out_events);
            }
        }
        Command::CrushDefender { defender, attacker } => {
            let Some(state) = world.defenders.get_mut(defender) else {
                return;
            };
            if !state.active {
                return;
            }
            state.active = false;
            state.shot_timer = Duration::ZERO;
            if let Some(cell) = state.cell.take() {
                let _ = world.grid.free(cell);
                out_events.push(Event::DefenderCrushed {
                    defender,
                    attacker,
                    cell,
                });
            }
        }
        Command::HitAttacker {
            attacker,
            projectile,
        } => world.hit_attacker(attacker, projectile, out_events),
        Command::ChargeDefenders { dt } => {
            for defender in world.defenders.values_mut() {
                if defender.placed() {
                    defender.shot_timer = defender.shot_timer.saturating_add(dt);
                }
            }
        }
        Command::FireProjectile { defender, speed } => {
            if let Some(event) = world.fire_projectile(defender, speed) {
                out_events.push(event);
            }
        }
        Command::AdvanceProjectiles { dt } => {
            let dt = dt.as_secs_f32();
            let extent = world.config.arena.extent();
            let departed: Vec<ProjectileId> = world
                .projectiles
                .values_mut()
                .filter_map(|projectile| projectile.advance(dt, extent).then_some(projectile.id))
                .collect();
            for projectile in departed {
                out_events.push(Event::ProjectileLeftArena { projectile });
                world.retire_projectile(projectile, out_events);
            }
        }
        Command::AnimateFades { dt } => world.animate_fades(dt.as_secs_f32(), out_events),
        Command::CollectPickup { pickup } => {
            if world.pickups.get(pickup).is_none() {
                return;
            }
            let display_slot = world.economy.collect(pickup);
            out_events.push(Event::PickupCollected {
                pickup,
                currency: world.economy.currency(),
                display_slot,
            });
            world.retire_pickup(pickup, out_events);
        }
        Command::PlaceDefender { slot, cell } => match world.purchase_defender(slot, cell) {
            Ok((defender, faction, currency)) => out_events.push(Event::DefenderPlaced {
                defender,
                slot: Some(slot),
                faction,
                cell,
                currency,
            }),
            Err(reason) => out_events.push(Event::PlacementRejected { slot, cell, reason }),
        },
        Command::SeedDefender { faction, cell } => {
            if let Ok(defender) = world.place_defender(faction, cell) {
                out_events.push(Event::DefenderPlaced {
                    defender,
                    slot: None,
                    faction,
                    cell,
                    currency: world.economy.currency(),
                });
            }
        }
        Command::RemoveDefender { defender } => {
            let Some(cell) = world
                .defenders
                .get(defender)
                .filter(|state| state.active)
                .and_then(|state| state.cell)
            else {
                return;
            };
            let _ = world.grid.free(cell);
            out_events.push(Event::DefenderRemoved { defender, cell });
            world.retire_defender(defender, out_events);
        }
        Command::StopGame => {
            world.running = false;
            out_events.push(Event::GameStopped);
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use lane_defence_core::{
        AttackerView, BaseRect, DefenderTemplate, DefenderView, InventorySlot, PickupId,
        PickupView, ProjectileView, SessionConfig,
    };

    use super::{GridRegistry, World};

    /// Number of entities held by each store.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct Population {
        /// Attackers, including destroyed ones still fading out.
        pub attackers: usize,
        /// Placed defenders, including crushed ones still fading out.
        pub defenders: usize,
        /// Projectiles in flight.
        pub projectiles: usize,
        /// Collectable pickups.
        pub pickups: usize,
    }

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Configuration the session was created with.
    #[must_use]
    pub fn config(world: &World) -> &SessionConfig {
        &world.config
    }

    /// Provides read-only access to the placement grid.
    #[must_use]
    pub fn grid(world: &World) -> &GridRegistry {
        &world.grid
    }

    /// Inventory templates in slot order.
    #[must_use]
    pub fn templates(world: &World) -> &[DefenderTemplate] {
        &world.templates
    }

    /// Looks up the template held by an inventory slot.
    #[must_use]
    pub fn template(world: &World, slot: InventorySlot) -> Option<&DefenderTemplate> {
        world.templates.get(slot.get() as usize)
    }

    /// Rectangle the attackers are trying to reach.
    #[must_use]
    pub fn base(world: &World) -> BaseRect {
        world.config.arena.base_rect()
    }

    /// Captures a read-only view of every attacker.
    #[must_use]
    pub fn attacker_view(world: &World) -> AttackerView {
        AttackerView::from_snapshots(world.attackers.values().map(|a| a.snapshot()).collect())
    }

    /// Captures a read-only view of every placed or fading defender.
    #[must_use]
    pub fn defender_view(world: &World) -> DefenderView {
        DefenderView::from_snapshots(world.defenders.values().map(|d| d.snapshot()).collect())
    }

    /// Captures a read-only view of every projectile in flight.
    #[must_use]
    pub fn projectile_view(world: &World) -> ProjectileView {
        ProjectileView::from_snapshots(world.projectiles.values().map(|p| p.snapshot()).collect())
    }

    /// Captures a read-only view of every collectable pickup.
    #[must_use]
    pub fn pickup_view(world: &World) -> PickupView {
        PickupView::from_snapshots(world.pickups.values().map(|p| p.snapshot()).collect())
    }

    /// Currency available for placements.
    #[must_use]
    pub fn currency(world: &World) -> u32 {
        world.economy.currency()
    }

    /// Lives left before the session ends.
    #[must_use]
    pub fn lives(world: &World) -> u32 {
        world.economy.lives()
    }

    /// Pickups shown in the capped collection display, oldest first.
    #[must_use]
    pub fn collected_display(world: &World) -> &[PickupId] {
        world.economy.display()
    }

    /// Reports whether gameplay commands are still honoured.
    #[must_use]
    pub fn is_running(world: &World) -> bool {
        world.running
    }

    /// Counts the entities held by each store.
    #[must_use]
    pub fn population(world: &World) -> Population {
        Population {
            attackers: world.attackers.len(),
            defenders: world.defenders.len(),
            projectiles: world.projectiles.len(),
            pickups: world.pickups.len(),
        }
    }
}
