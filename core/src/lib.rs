#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Lane Defence engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Systems read immutable snapshot
//! views and answer with [`Command`] batches describing desired mutations.
//! The world executes those commands via its `apply` entry point and reports
//! what actually changed as [`Event`] values. Entities are identified by
//! typed identifiers allocated by the world; nothing is looked up by name.

mod config;

pub use config::{
    ArenaConfig, AttackerConfig, ConfigError, DefenderConfig, PickupConfig, ProjectileConfig,
    SessionConfig,
};

use std::time::Duration;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to Lane Defence.";

/// Number of matching hits that destroys an attacker.
pub const ATTACKER_HIT_THRESHOLD: u32 = 3;

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Requests a new attacker at the far end of a lane.
    SpawnAttacker {
        /// Lane (grid row) the attacker travels along.
        lane: u32,
        /// Faction key gating which projectiles can damage it.
        faction: Faction,
        /// Travel speed in world units per second.
        speed: f32,
    },
    /// Requests a new currency pickup.
    SpawnPickup {
        /// World-space position of the pickup.
        position: Vec2,
    },
    /// Moves every active attacker toward the base.
    AdvanceAttackers {
        /// Simulated time that elapsed.
        dt: Duration,
    },
    /// Reports that an attacker reached the base.
    BreachBase {
        /// Attacker that touched the base.
        attacker: AttackerId,
    },
    /// Counts down pickup lifespans.
    AgePickups {
        /// Simulated time that elapsed.
        dt: Duration,
    },
    /// Reports that an attacker ran into a placed defender.
    CrushDefender {
        /// Defender that was run over.
        defender: DefenderId,
        /// Attacker responsible for the collision.
        attacker: AttackerId,
    },
    /// Reports that a projectile struck an attacker of its own faction.
    HitAttacker {
        /// Attacker that was struck.
        attacker: AttackerId,
        /// Projectile that struck it.
        projectile: ProjectileId,
    },
    /// Accumulates the shot timer of every placed defender.
    ChargeDefenders {
        /// Simulated time that elapsed.
        dt: Duration,
    },
    /// Requests that a ready defender fires a projectile.
    FireProjectile {
        /// Defender pulling the trigger.
        defender: DefenderId,
        /// Projectile speed in world units per second.
        speed: f32,
    },
    /// Moves and spins every active projectile.
    AdvanceProjectiles {
        /// Simulated time that elapsed.
        dt: Duration,
    },
    /// Shrinks destroyed entities until they can be retired.
    AnimateFades {
        /// Simulated time that elapsed.
        dt: Duration,
    },
    /// Collects a currency pickup.
    CollectPickup {
        /// Pickup claimed by the player.
        pickup: PickupId,
    },
    /// Places a defender cloned from an inventory template, paying its cost.
    PlaceDefender {
        /// Inventory slot the defender was dragged from.
        slot: InventorySlot,
        /// Cell the defender should occupy.
        cell: CellCoord,
    },
    /// Places a free defender as part of the opening layout.
    SeedDefender {
        /// Faction of the seeded defender.
        faction: Faction,
        /// Cell the defender should occupy.
        cell: CellCoord,
    },
    /// Removes a placed defender and frees its cell.
    RemoveDefender {
        /// Defender targeted for removal.
        defender: DefenderId,
    },
    /// Stops the session, freezing all gameplay state.
    StopGame,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Confirms that an attacker entered a lane.
    AttackerSpawned {
        /// Identifier assigned to the attacker.
        attacker: AttackerId,
        /// Lane the attacker travels along.
        lane: u32,
        /// Faction of the attacker.
        faction: Faction,
    },
    /// Reports that an attacker left the arena without touching the base.
    AttackerEscaped {
        /// Attacker that left the arena.
        attacker: AttackerId,
    },
    /// Reports that an attacker reached the base and cost a life.
    BaseBreached {
        /// Attacker that reached the base.
        attacker: AttackerId,
        /// Lives left after the breach.
        lives_remaining: u32,
    },
    /// Announces that the last life was lost.
    GameOver,
    /// Announces that the session was stopped on request.
    GameStopped,
    /// Confirms that a currency pickup appeared.
    PickupSpawned {
        /// Identifier assigned to the pickup.
        pickup: PickupId,
        /// World-space position of the pickup.
        position: Vec2,
    },
    /// Reports that a pickup ran out of lifespan uncollected.
    PickupExpired {
        /// Pickup that expired.
        pickup: PickupId,
    },
    /// Confirms that a pickup was collected.
    PickupCollected {
        /// Pickup that was collected.
        pickup: PickupId,
        /// Currency available after the collection.
        currency: u32,
        /// Display slot the pickup occupies, if the display list had room.
        display_slot: Option<usize>,
    },
    /// Confirms that a defender now occupies a cell.
    DefenderPlaced {
        /// Identifier assigned to the defender.
        defender: DefenderId,
        /// Inventory slot it was cloned from; `None` for the opening layout.
        slot: Option<InventorySlot>,
        /// Faction of the defender.
        faction: Faction,
        /// Cell the defender occupies.
        cell: CellCoord,
        /// Currency left after paying for the defender.
        currency: u32,
    },
    /// Reports that a placement request was refused.
    PlacementRejected {
        /// Inventory slot named by the request.
        slot: InventorySlot,
        /// Cell named by the request.
        cell: CellCoord,
        /// Specific reason the placement failed.
        reason: PlacementError,
    },
    /// Confirms that the player removed a defender.
    DefenderRemoved {
        /// Defender that was removed.
        defender: DefenderId,
        /// Cell that was freed.
        cell: CellCoord,
    },
    /// Reports that an attacker destroyed a defender.
    DefenderCrushed {
        /// Defender that was destroyed.
        defender: DefenderId,
        /// Attacker responsible.
        attacker: AttackerId,
        /// Cell that was freed.
        cell: CellCoord,
    },
    /// Confirms that a defender fired.
    ProjectileFired {
        /// Identifier assigned to the projectile.
        projectile: ProjectileId,
        /// Defender that fired it.
        defender: DefenderId,
        /// Faction shared by the defender and projectile.
        faction: Faction,
        /// Spawn position, equal to the defender's position.
        position: Vec2,
    },
    /// Reports that a projectile left the visible area.
    ProjectileLeftArena {
        /// Projectile that left the arena.
        projectile: ProjectileId,
    },
    /// Confirms that a projectile damaged an attacker.
    AttackerHit {
        /// Attacker that was struck.
        attacker: AttackerId,
        /// Projectile that was spent.
        projectile: ProjectileId,
        /// Hit counter after the strike.
        hits: u32,
    },
    /// Reports that an attacker took its final hit.
    AttackerDestroyed {
        /// Attacker that was destroyed.
        attacker: AttackerId,
    },
    /// Announces that an entity left its store for good.
    ///
    /// Adapters release the entity's visual resources in response.
    EntityRetired {
        /// Entity that was retired.
        entity: EntityKey,
    },
}

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        pub struct $name(u32);

        impl $name {
            /// Creates a new identifier with the provided numeric value.
            #[must_use]
            pub const fn new(value: u32) -> Self {
                Self(value)
            }

            /// Retrieves the numeric representation of the identifier.
            #[must_use]
            pub const fn get(&self) -> u32 {
                self.0
            }
        }
    };
}

entity_id!(
    /// Unique identifier assigned to each attacker.
    AttackerId
);
entity_id!(
    /// Unique identifier assigned to each placed defender.
    DefenderId
);
entity_id!(
    /// Unique identifier assigned to each projectile.
    ProjectileId
);
entity_id!(
    /// Unique identifier assigned to each currency pickup.
    PickupId
);
entity_id!(
    /// Index of a defender template within the inventory bar.
    InventorySlot
);

/// Identifies any entity held by one of the world's stores.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityKey {
    /// An attacker.
    Attacker(AttackerId),
    /// A placed defender.
    Defender(DefenderId),
    /// A projectile.
    Projectile(ProjectileId),
    /// A currency pickup.
    Pickup(PickupId),
}

/// Location of a single placement cell expressed as grid coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell. Rows double as attacker lanes.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }
}

/// Matching key shared by defenders, projectiles and attackers.
///
/// A projectile only damages attackers of its own faction, and a defender
/// only fires while an attacker of its faction is in its lane.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Faction {
    /// Blue faction.
    Blue,
    /// Cyan faction.
    Cyan,
    /// Green faction.
    Green,
    /// Yellow faction.
    Yellow,
    /// Purple faction.
    Purple,
    /// Red faction.
    Red,
    /// White faction.
    White,
    /// Black faction.
    Black,
}

impl Faction {
    /// Every faction in palette order.
    pub const ALL: [Faction; 8] = [
        Faction::Blue,
        Faction::Cyan,
        Faction::Green,
        Faction::Yellow,
        Faction::Purple,
        Faction::Red,
        Faction::White,
        Faction::Black,
    ];

    /// Faction at `index` in palette order, wrapping around the palette.
    #[must_use]
    pub const fn from_index(index: usize) -> Self {
        Self::ALL[index % Self::ALL.len()]
    }

    /// Byte RGB components used when presenting the faction.
    #[must_use]
    pub const fn rgb(self) -> (u8, u8, u8) {
        match self {
            Self::Blue => (0, 0, 255),
            Self::Cyan => (0, 255, 128),
            Self::Green => (128, 255, 255),
            Self::Yellow => (255, 204, 0),
            Self::Purple => (255, 0, 204),
            Self::Red => (255, 0, 0),
            Self::White => (255, 255, 255),
            Self::Black => (0, 0, 0),
        }
    }
}

/// Axis-aligned rectangle guarded by the player.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BaseRect {
    origin: Vec2,
    size: Vec2,
}

impl BaseRect {
    /// Creates a rectangle from its lower-left corner and size.
    #[must_use]
    pub const fn new(origin: Vec2, size: Vec2) -> Self {
        Self { origin, size }
    }

    /// Lower-left corner of the rectangle.
    #[must_use]
    pub const fn origin(&self) -> Vec2 {
        self.origin
    }

    /// Width and height of the rectangle.
    #[must_use]
    pub const fn size(&self) -> Vec2 {
        self.size
    }

    /// Point on or inside the rectangle closest to `point`.
    #[must_use]
    pub fn nearest_point(&self, point: Vec2) -> Vec2 {
        point.clamp(self.origin, self.origin + self.size)
    }
}

/// Reasons a placement request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum PlacementError {
    /// The cell already holds a defender.
    #[error("cell is already occupied")]
    Occupied,
    /// The cell lies outside the grid.
    #[error("cell lies outside the grid")]
    OutOfBounds,
    /// The inventory has no template in the requested slot.
    #[error("inventory has no such slot")]
    UnknownSlot,
    /// The player cannot afford the template.
    #[error("defender costs {cost} but only {available} is available")]
    InsufficientCurrency {
        /// Cost of the requested template.
        cost: u32,
        /// Currency available when the request was evaluated.
        available: u32,
    },
    /// The session has ended.
    #[error("the session is no longer running")]
    GameOver,
}

/// Immutable representation of a single attacker's state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AttackerSnapshot {
    /// Identifier allocated to the attacker.
    pub id: AttackerId,
    /// Faction of the attacker.
    pub faction: Faction,
    /// Lane the attacker travels along.
    pub lane: u32,
    /// World-space center.
    pub position: Vec2,
    /// Travel speed in world units per second.
    pub speed: f32,
    /// Matching hits absorbed so far.
    pub hits: u32,
    /// Outer collision radius.
    pub radius: f32,
    /// Whether the attacker still interacts with the world.
    pub active: bool,
    /// Visual scale, shrinking once destroyed.
    pub scale: f32,
}

/// Read-only snapshot of all attackers stored in the world.
#[derive(Clone, Debug, Default)]
pub struct AttackerView {
    snapshots: Vec<AttackerSnapshot>,
}

impl AttackerView {
    /// Creates a new view from snapshots, sorting them by identifier.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<AttackerSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &AttackerSnapshot> {
        self.snapshots.iter()
    }

    /// Iterator over attackers that still interact with the world.
    pub fn active(&self) -> impl Iterator<Item = &AttackerSnapshot> {
        self.snapshots.iter().filter(|snapshot| snapshot.active)
    }

    /// Looks up a single attacker.
    #[must_use]
    pub fn get(&self, id: AttackerId) -> Option<&AttackerSnapshot> {
        self.snapshots
            .binary_search_by_key(&id, |snapshot| snapshot.id)
            .ok()
            .map(|index| &self.snapshots[index])
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<AttackerSnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a single placed defender's state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DefenderSnapshot {
    /// Identifier allocated to the defender.
    pub id: DefenderId,
    /// Faction of the defender.
    pub faction: Faction,
    /// World-space center.
    pub position: Vec2,
    /// Cell the defender occupies; `None` once it has been crushed.
    pub cell: Option<CellCoord>,
    /// Characteristic length used by attacker collisions.
    pub reach: f32,
    /// Time accumulated since the last shot.
    pub shot_timer: Duration,
    /// Time that must accumulate between shots.
    pub cooldown: Duration,
    /// Whether the defender still interacts with the world.
    pub active: bool,
    /// Visual scale, shrinking once crushed.
    pub scale: f32,
}

impl DefenderSnapshot {
    /// Reports whether the defender currently holds a grid cell.
    #[must_use]
    pub const fn placed(&self) -> bool {
        self.cell.is_some()
    }

    /// Reports whether the shot timer has covered the cooldown.
    #[must_use]
    pub fn ready(&self) -> bool {
        self.shot_timer >= self.cooldown
    }
}

/// Read-only snapshot of all defenders stored in the world.
#[derive(Clone, Debug, Default)]
pub struct DefenderView {
    snapshots: Vec<DefenderSnapshot>,
}

impl DefenderView {
    /// Creates a new view from snapshots, sorting them by identifier.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<DefenderSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &DefenderSnapshot> {
        self.snapshots.iter()
    }

    /// Iterator over active defenders that hold a grid cell.
    pub fn placed(&self) -> impl Iterator<Item = &DefenderSnapshot> {
        self.snapshots
            .iter()
            .filter(|snapshot| snapshot.active && snapshot.placed())
    }

    /// Looks up a single defender.
    #[must_use]
    pub fn get(&self, id: DefenderId) -> Option<&DefenderSnapshot> {
        self.snapshots
            .binary_search_by_key(&id, |snapshot| snapshot.id)
            .ok()
            .map(|index| &self.snapshots[index])
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<DefenderSnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a single projectile's state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectileSnapshot {
    /// Identifier allocated to the projectile.
    pub id: ProjectileId,
    /// Faction inherited from the firing defender.
    pub faction: Faction,
    /// World-space center.
    pub position: Vec2,
    /// Rotation in degrees within `0.0..360.0`.
    pub rotation: f32,
    /// Travel speed in world units per second.
    pub speed: f32,
    /// Length of the longer side, used by attacker collisions.
    pub reach: f32,
}

/// Read-only snapshot of all projectiles in flight.
#[derive(Clone, Debug, Default)]
pub struct ProjectileView {
    snapshots: Vec<ProjectileSnapshot>,
}

impl ProjectileView {
    /// Creates a new view from snapshots, sorting them by identifier.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<ProjectileSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &ProjectileSnapshot> {
        self.snapshots.iter()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<ProjectileSnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a single currency pickup.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PickupSnapshot {
    /// Identifier allocated to the pickup.
    pub id: PickupId,
    /// World-space center.
    pub position: Vec2,
    /// Lifespan left before the pickup expires.
    pub remaining: Duration,
    /// Pointer pick radius.
    pub radius: f32,
}

impl PickupSnapshot {
    /// Reports whether `point` lies within the pickup's pick radius.
    #[must_use]
    pub fn contains(&self, point: Vec2) -> bool {
        self.position.distance_squared(point) <= self.radius * self.radius
    }
}

/// Read-only snapshot of all collectable pickups.
#[derive(Clone, Debug, Default)]
pub struct PickupView {
    snapshots: Vec<PickupSnapshot>,
}

impl PickupView {
    /// Creates a new view from snapshots, sorting them by identifier.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<PickupSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &PickupSnapshot> {
        self.snapshots.iter()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<PickupSnapshot> {
        self.snapshots
    }
}

/// Defender template displayed in the inventory bar.
///
/// Templates never occupy a grid cell; placing one clones it into the
/// defender store.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DefenderTemplate {
    /// Inventory slot holding the template.
    pub slot: InventorySlot,
    /// Faction given to defenders cloned from the template.
    pub faction: Faction,
    /// Currency cost of a clone.
    pub cost: u32,
    /// World-space center of the slot.
    pub position: Vec2,
    /// Pointer pick radius.
    pub pick_radius: f32,
}

impl DefenderTemplate {
    /// Reports whether `point` lies within the template's pick radius.
    #[must_use]
    pub fn contains(&self, point: Vec2) -> bool {
        self.position.distance_squared(point) <= self.pick_radius * self.pick_radius
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{de::DeserializeOwned, Serialize};

    #[test]
    fn nearest_point_clamps_outside_positions() {
        let base = BaseRect::new(Vec2::ZERO, Vec2::new(85.0, 500.0));

        assert_eq!(base.nearest_point(Vec2::new(120.0, 60.0)), Vec2::new(85.0, 60.0));
        assert_eq!(base.nearest_point(Vec2::new(-5.0, 600.0)), Vec2::new(0.0, 500.0));
        assert_eq!(base.nearest_point(Vec2::new(10.0, 10.0)), Vec2::new(10.0, 10.0));
    }

    #[test]
    fn faction_index_wraps_around_palette() {
        assert_eq!(Faction::from_index(0), Faction::Blue);
        assert_eq!(Faction::from_index(5), Faction::Red);
        assert_eq!(Faction::from_index(9), Faction::Cyan);
    }

    #[test]
    fn views_sort_snapshots_and_support_lookup() {
        let view = AttackerView::from_snapshots(vec![attacker(4, true), attacker(1, false)]);

        let ids: Vec<u32> = view.iter().map(|snapshot| snapshot.id.get()).collect();
        assert_eq!(ids, vec![1, 4]);
        assert_eq!(view.active().count(), 1);
        assert!(view.get(AttackerId::new(4)).is_some());
        assert!(view.get(AttackerId::new(2)).is_none());
    }

    #[test]
    fn defender_readiness_compares_timer_with_cooldown() {
        let mut snapshot = DefenderSnapshot {
            id: DefenderId::new(0),
            faction: Faction::Red,
            position: Vec2::ZERO,
            cell: Some(CellCoord::new(0, 2)),
            reach: 40.0,
            shot_timer: Duration::from_millis(4_999),
            cooldown: Duration::from_secs(5),
            active: true,
            scale: 1.0,
        };
        assert!(!snapshot.ready());

        snapshot.shot_timer = Duration::from_secs(5);
        assert!(snapshot.ready());
        assert!(snapshot.placed());
    }

    #[test]
    fn placement_error_describes_shortfall() {
        let error = PlacementError::InsufficientCurrency {
            cost: 3,
            available: 1,
        };
        assert_eq!(error.to_string(), "defender costs 3 but only 1 is available");
    }

    #[test]
    fn contract_types_round_trip_through_bincode() {
        assert_round_trip(&CellCoord::new(3, 1));
        assert_round_trip(&Faction::Purple);
        assert_round_trip(&EntityKey::Pickup(PickupId::new(12)));
        assert_round_trip(&PlacementError::InsufficientCurrency {
            cost: 2,
            available: 0,
        });
    }

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let decoded: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&decoded, value);
    }

    fn attacker(id: u32, active: bool) -> AttackerSnapshot {
        AttackerSnapshot {
            id: AttackerId::new(id),
            faction: Faction::Blue,
            lane: 0,
            position: Vec2::ZERO,
            speed: 30.0,
            hits: 0,
            radius: 35.0,
            active,
            scale: 1.0,
        }
    }
}
