#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Frame orchestrator for a Lane Defence session.
//!
//! [`Simulation`] owns the world, every system and the visual collaborator.
//! Each [`Simulation::tick`] runs the systems in a fixed order, applies their
//! commands, mirrors the resulting events onto visuals and finishes with a
//! single deferred-deletion flush. Pointer gestures are fed in between ticks
//! through [`Simulation::pointer`].

mod scene;

use std::time::Duration;

use glam::Vec2;
use lane_defence_core::{
    CellCoord, Command, ConfigError, EntityKey, Event, Faction, SessionConfig,
};
use lane_defence_rendering::{
    DeferredDeletion, ScreenToWorld, VisualBackend, VisualError, VisualKey, VisualKind,
};
use lane_defence_system_collision::Collision;
use lane_defence_system_combat::{self as combat, Combat};
use lane_defence_system_placement::{GestureOutcome, GestureState, Placement, PointerEvent};
use lane_defence_system_spawning::{self as spawning, Spawning};
use lane_defence_world::{self as world, query, World};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use thiserror::Error;

use scene::VisualSpec;

const COMBAT_STREAM: u64 = 0x9e37_79b9_7f4a_7c15;
const OPENING_STREAM: u64 = 0xd1b5_4a32_d192_ed03;

/// Errors that prevent a session from starting.
#[derive(Debug, Error)]
pub enum SimulationError {
    /// The session configuration failed validation.
    #[error("invalid session configuration")]
    Config(#[from] ConfigError),
    /// A visual of the static scene could not be built.
    #[error("failed to build the {key:?} visual")]
    Scene {
        /// Visual that failed.
        key: VisualKey,
        /// Backend failure.
        #[source]
        source: VisualError,
    },
}

/// A running game session bound to a visual backend.
#[derive(Debug)]
pub struct Simulation<B> {
    world: World,
    spawning: Spawning,
    collision: Collision,
    combat: Combat,
    placement: Placement,
    backend: B,
    visuals: DeferredDeletion,
    commands: Vec<Command>,
    events: Vec<Event>,
    held: Option<VisualKey>,
    gestures: u32,
    ticks: u64,
    skipped_visuals: u64,
}

impl<B: VisualBackend> Simulation<B> {
    /// Validates `config`, builds the static scene and seeds the opening
    /// defenders.
    ///
    /// All randomness derives from `seed`, so two sessions created with the
    /// same arguments and fed the same input evolve identically.
    pub fn new(config: SessionConfig, seed: u64, backend: B) -> Result<Self, SimulationError> {
        config.validate()?;
        let spawning = Spawning::new(spawning::Config::from_session(&config, seed));
        let combat = Combat::new(combat::Config::from_session(
            &config,
            seed ^ COMBAT_STREAM,
        ));

        let mut simulation = Self {
            world: World::new(config),
            spawning,
            collision: Collision::new(),
            combat,
            placement: Placement::new(),
            backend,
            visuals: DeferredDeletion::new(),
            commands: Vec::new(),
            events: Vec::new(),
            held: None,
            gestures: 0,
            ticks: 0,
            skipped_visuals: 0,
        };
        simulation.build_scene()?;
        simulation.seed_opening_defenders(seed ^ OPENING_STREAM);
        simulation.dispatch(0);
        simulation.present();
        tracing::info!(seed, "{}", query::welcome_banner(&simulation.world));
        Ok(simulation)
    }

    /// Advances the session by `dt` and returns the events it produced.
    ///
    /// Order: attacker spawns, attacker motion and base contact, pickup
    /// spawns, pickup ageing, crushes, projectile hits, defender fire,
    /// projectile motion, fades. Once the session is over only the flush
    /// runs.
    pub fn tick(&mut self, dt: Duration) -> &[Event] {
        self.events.clear();
        if query::is_running(&self.world) {
            self.advance(dt);
        }
        self.dispatch(0);
        let _ = self.visuals.flush(&mut self.backend);
        self.present();
        self.ticks += 1;
        &self.events
    }

    /// Feeds a screen-space pointer event to the placement gestures.
    pub fn pointer<S>(&mut self, event: PointerEvent, viewport: &S) -> GestureOutcome
    where
        S: ScreenToWorld + ?Sized,
    {
        let event = to_world(event, viewport);
        let start = self.events.len();
        let mut outcome = self
            .placement
            .handle(event, &self.world, &mut self.commands);
        self.execute_pending();

        match outcome {
            GestureOutcome::DragStarted { slot } => {
                if self.grab_held() {
                    tracing::debug!(slot = slot.get(), "drag started");
                } else {
                    outcome = GestureOutcome::Ignored;
                }
            }
            GestureOutcome::DragMoved { position } => {
                if let Some(key) = self.held {
                    self.position(key, position, 0.0, 1.0);
                }
            }
            GestureOutcome::DropRequested { slot, cell } => {
                tracing::debug!(
                    slot = slot.get(),
                    column = cell.column(),
                    row = cell.row(),
                    "drop requested"
                );
                self.drop_held();
            }
            GestureOutcome::DragCancelled { slot, reason } => {
                tracing::debug!(slot = slot.get(), ?reason, "drag cancelled");
                self.drop_held();
            }
            GestureOutcome::DragRefused {
                slot,
                cost,
                available,
            } => {
                tracing::info!(slot = slot.get(), cost, available, "not enough currency");
            }
            GestureOutcome::Collected { count } => {
                tracing::debug!(count, "pickups collected");
            }
            GestureOutcome::RemovalRequested { defender } => {
                tracing::debug!(defender = defender.get(), "removal requested");
            }
            GestureOutcome::Ignored => {}
        }

        self.dispatch(start);
        outcome
    }

    /// Ends the session. Gameplay freezes but deferred deletions keep
    /// flushing on every tick.
    pub fn stop(&mut self) {
        if self.placement.cancel().is_some() {
            self.drop_held();
        }
        let start = self.events.len();
        self.execute(Command::StopGame);
        self.dispatch(start);
    }

    /// Authoritative world state.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Visual backend the session draws through.
    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Mutable access to the visual backend.
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Registered visuals and pending deletions.
    #[must_use]
    pub fn visuals(&self) -> &DeferredDeletion {
        &self.visuals
    }

    /// Current phase of the drag gesture.
    #[must_use]
    pub fn gesture(&self) -> GestureState {
        self.placement.state()
    }

    /// Events produced since the start of the last tick, including those of
    /// pointer gestures handled afterwards.
    #[must_use]
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Number of ticks run so far.
    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Number of entities or markers dropped because their visual could not
    /// be built.
    #[must_use]
    pub fn skipped_visuals(&self) -> u64 {
        self.skipped_visuals
    }

    fn advance(&mut self, dt: Duration) {
        self.spawning.spawn_attackers(dt, &mut self.commands);
        self.execute_pending();

        self.execute(Command::AdvanceAttackers { dt });
        self.collision.base_breaches(
            query::base(&self.world),
            &query::attacker_view(&self.world),
            &mut self.commands,
        );
        self.execute_pending();
        if !query::is_running(&self.world) {
            return;
        }

        self.spawning.spawn_pickups(dt, &mut self.commands);
        self.execute_pending();
        self.execute(Command::AgePickups { dt });

        self.collision.defender_crushes(
            &query::attacker_view(&self.world),
            &query::defender_view(&self.world),
            &mut self.commands,
        );
        self.execute_pending();

        self.collision.projectile_hits(
            &query::attacker_view(&self.world),
            &query::projectile_view(&self.world),
            &mut self.commands,
        );
        self.execute_pending();

        self.execute(Command::ChargeDefenders { dt });
        self.combat.handle(
            &query::defender_view(&self.world),
            &query::attacker_view(&self.world),
            &mut self.commands,
        );
        self.execute_pending();

        self.execute(Command::AdvanceProjectiles { dt });
        self.execute(Command::AnimateFades { dt });
    }

    fn execute_pending(&mut self) {
        let mut commands = std::mem::take(&mut self.commands);
        for command in commands.drain(..) {
            self.execute(command);
        }
        self.commands = commands;
    }

    /// Applies `command`, building the visual of any entity it creates first.
    ///
    /// An entity whose visual cannot be built is never created.
    fn execute(&mut self, command: Command) {
        let Some(spec) = self.visual_for(&command) else {
            world::apply(&mut self.world, command, &mut self.events);
            return;
        };

        let handle = match self.backend.create_visual(spec.kind, spec.shape, spec.color) {
            Ok(handle) => handle,
            Err(error) => {
                self.skipped_visuals += 1;
                tracing::warn!(%error, ?command, "entity skipped");
                return;
            }
        };

        let first = self.events.len();
        world::apply(&mut self.world, command, &mut self.events);
        match self.events[first..].iter().find_map(created_entity) {
            Some(entity) => {
                let _ = self.visuals.register(VisualKey::Entity(entity), handle);
            }
            None => {
                let key = VisualKey::Unclaimed(handle);
                let _ = self.visuals.register(key, handle);
                let _ = self.visuals.mark_for_deletion(key);
            }
        }
    }

    fn visual_for(&self, command: &Command) -> Option<VisualSpec> {
        let config = query::config(&self.world);
        match *command {
            Command::SpawnAttacker { faction, .. } => {
                Some(scene::attacker(&config.attackers, faction))
            }
            Command::SpawnPickup { .. } => Some(scene::pickup(&config.pickups, VisualKind::Pickup)),
            Command::FireProjectile { defender, .. } => query::defender_view(&self.world)
                .get(defender)
                .map(|shooter| scene::projectile(&config.projectiles, shooter.faction)),
            Command::PlaceDefender { slot, .. } => query::template(&self.world, slot).map(|template| {
                scene::defender(&config.defenders, template.faction, VisualKind::Defender)
            }),
            Command::SeedDefender { faction, .. } => Some(scene::defender(
                &config.defenders,
                faction,
                VisualKind::Defender,
            )),
            _ => None,
        }
    }

    /// Mirrors events from `from` onwards onto visuals and logs.
    fn dispatch(&mut self, from: usize) {
        let events = std::mem::take(&mut self.events);
        for event in events.iter().skip(from) {
            self.observe(event);
        }
        self.events = events;
    }

    fn observe(&mut self, event: &Event) {
        match *event {
            Event::EntityRetired { entity } => {
                let _ = self.visuals.mark_for_deletion(VisualKey::Entity(entity));
            }
            Event::BaseBreached {
                attacker,
                lives_remaining,
            } => {
                tracing::info!(attacker = attacker.get(), lives_remaining, "base breached");
                let _ = self
                    .visuals
                    .mark_for_deletion(VisualKey::Life(lives_remaining));
            }
            Event::GameOver => tracing::info!(ticks = self.ticks, "game over"),
            Event::GameStopped => tracing::info!(ticks = self.ticks, "session stopped"),
            Event::AttackerSpawned {
                attacker,
                lane,
                faction,
            } => tracing::debug!(attacker = attacker.get(), lane, ?faction, "attacker spawned"),
            Event::AttackerEscaped { attacker } => {
                tracing::debug!(attacker = attacker.get(), "attacker left the arena")
            }
            Event::AttackerDestroyed { attacker } => {
                tracing::debug!(attacker = attacker.get(), "attacker destroyed")
            }
            Event::PickupSpawned { pickup, position } => {
                tracing::debug!(pickup = pickup.get(), ?position, "pickup spawned")
            }
            Event::PickupCollected {
                pickup,
                currency,
                display_slot,
            } => {
                tracing::debug!(pickup = pickup.get(), currency, "pickup collected");
                if let Some(slot) = display_slot {
                    self.show_wallet(slot);
                }
            }
            Event::DefenderPlaced {
                defender,
                slot,
                faction,
                cell,
                currency,
            } => tracing::info!(
                defender = defender.get(),
                slot = slot.map(|slot| slot.get()),
                ?faction,
                column = cell.column(),
                row = cell.row(),
                currency,
                "defender placed"
            ),
            Event::PlacementRejected { slot, cell, reason } => tracing::info!(
                slot = slot.get(),
                column = cell.column(),
                row = cell.row(),
                %reason,
                "placement rejected"
            ),
            Event::DefenderCrushed {
                defender, attacker, ..
            } => tracing::info!(
                defender = defender.get(),
                attacker = attacker.get(),
                "defender crushed"
            ),
            Event::DefenderRemoved { defender, .. } => {
                tracing::info!(defender = defender.get(), "defender removed")
            }
            _ => {}
        }
    }

    /// Builds the cells, base, inventory templates and life markers.
    fn build_scene(&mut self) -> Result<(), SimulationError> {
        let config = query::config(&self.world);
        let mut statics = Vec::new();
        for cell in query::grid(&self.world).cells() {
            statics.push((
                VisualKey::Cell(cell.coord()),
                scene::cell(&config.arena),
                cell.center(),
            ));
        }
        let base = query::base(&self.world);
        statics.push((
            VisualKey::Base,
            scene::base(base),
            base.origin() + base.size() / 2.0,
        ));
        for template in query::templates(&self.world) {
            statics.push((
                VisualKey::Template(template.slot),
                scene::defender(&config.defenders, template.faction, VisualKind::Template),
                template.position,
            ));
        }
        for index in 0..query::lives(&self.world) {
            statics.push((
                VisualKey::Life(index),
                scene::life(),
                scene::life_position(&config.arena, index),
            ));
        }

        for (key, spec, position) in statics {
            match self.backend.create_visual(spec.kind, spec.shape, spec.color) {
                Ok(handle) => {
                    self.backend.position_visual(handle, position, 0.0, 1.0);
                    let _ = self.visuals.register(key, handle);
                }
                Err(source) => {
                    self.release_all();
                    return Err(SimulationError::Scene { key, source });
                }
            }
        }
        Ok(())
    }

    fn release_all(&mut self) {
        let keys: Vec<VisualKey> = self.visuals.handles().map(|(key, _)| key).collect();
        for key in keys {
            let _ = self.visuals.mark_for_deletion(key);
        }
        let _ = self.visuals.flush(&mut self.backend);
    }

    fn seed_opening_defenders(&mut self, seed: u64) {
        let chance = f64::from(query::config(&self.world).arena.opening_defender_chance);
        let cells: Vec<CellCoord> = query::grid(&self.world)
            .cells()
            .iter()
            .map(|cell| cell.coord())
            .collect();

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        for cell in cells {
            if rng.gen_bool(chance) {
                let faction = Faction::from_index(rng.gen_range(0..Faction::ALL.len()));
                self.execute(Command::SeedDefender { faction, cell });
            }
        }
    }

    fn show_wallet(&mut self, slot: usize) {
        let key = VisualKey::Wallet(slot);
        if self.visuals.handle(key).is_some() {
            return;
        }

        let config = query::config(&self.world);
        let spec = scene::pickup(&config.pickups, VisualKind::Wallet);
        let position = scene::wallet_position(&config.arena, config.defenders.costs.len(), slot);
        match self.backend.create_visual(spec.kind, spec.shape, spec.color) {
            Ok(handle) => {
                self.backend.position_visual(handle, position, 0.0, 1.0);
                let _ = self.visuals.register(key, handle);
            }
            Err(error) => {
                self.skipped_visuals += 1;
                tracing::warn!(%error, slot, "wallet marker skipped");
            }
        }
    }

    fn grab_held(&mut self) -> bool {
        let Some(held) = self.placement.held().copied() else {
            return false;
        };
        let spec = scene::defender(
            &query::config(&self.world).defenders,
            held.faction,
            VisualKind::Defender,
        );

        match self.backend.create_visual(spec.kind, spec.shape, spec.color) {
            Ok(handle) => {
                self.gestures = self.gestures.wrapping_add(1);
                let key = VisualKey::Held(self.gestures);
                self.backend.position_visual(handle, held.position, 0.0, 1.0);
                let _ = self.visuals.register(key, handle);
                self.held = Some(key);
                true
            }
            Err(error) => {
                self.skipped_visuals += 1;
                let _ = self.placement.cancel();
                tracing::warn!(%error, slot = held.slot.get(), "drag abandoned");
                false
            }
        }
    }

    fn drop_held(&mut self) {
        if let Some(key) = self.held.take() {
            let _ = self.visuals.mark_for_deletion(key);
        }
    }

    /// Moves every entity visual to its current transform.
    fn present(&mut self) {
        for attacker in query::attacker_view(&self.world).iter() {
            let key = VisualKey::Entity(EntityKey::Attacker(attacker.id));
            self.position(key, attacker.position, 0.0, attacker.scale);
        }
        for defender in query::defender_view(&self.world).iter() {
            let key = VisualKey::Entity(EntityKey::Defender(defender.id));
            self.position(key, defender.position, 0.0, defender.scale);
        }
        for projectile in query::projectile_view(&self.world).iter() {
            let key = VisualKey::Entity(EntityKey::Projectile(projectile.id));
            self.position(key, projectile.position, projectile.rotation, 1.0);
        }
        for pickup in query::pickup_view(&self.world).iter() {
            let key = VisualKey::Entity(EntityKey::Pickup(pickup.id));
            self.position(key, pickup.position, 0.0, 1.0);
        }
        if let (Some(key), Some(held)) = (self.held, self.placement.held()) {
            let position = held.position;
            self.position(key, position, 0.0, 1.0);
        }
    }

    fn position(&mut self, key: VisualKey, position: Vec2, rotation: f32, scale: f32) {
        if let Some(handle) = self.visuals.handle(key) {
            self.backend
                .position_visual(handle, position, rotation, scale);
        }
    }
}

fn created_entity(event: &Event) -> Option<EntityKey> {
    match *event {
        Event::AttackerSpawned { attacker, .. } => Some(EntityKey::Attacker(attacker)),
        Event::PickupSpawned { pickup, .. } => Some(EntityKey::Pickup(pickup)),
        Event::ProjectileFired { projectile, .. } => Some(EntityKey::Projectile(projectile)),
        Event::DefenderPlaced { defender, .. } => Some(EntityKey::Defender(defender)),
        _ => None,
    }
}

fn to_world<S>(event: PointerEvent, viewport: &S) -> PointerEvent
where
    S: ScreenToWorld + ?Sized,
{
    match event {
        PointerEvent::Pressed { button, position } => PointerEvent::Pressed {
            button,
            position: viewport.screen_to_world(position),
        },
        PointerEvent::Moved { position } => PointerEvent::Moved {
            position: viewport.screen_to_world(position),
        },
        PointerEvent::Released { button, position } => PointerEvent::Released {
            button,
            position: viewport.screen_to_world(position),
        },
    }
}
