use std::time::Duration;

use glam::Vec2;
use lane_defence_core::{
    CellCoord, Command, DefenderId, Event, Faction, InventorySlot, PickupId, SessionConfig,
};
use lane_defence_system_combat::{Combat, Config};
use lane_defence_world::{self as world, query, World};

const RED_SLOT: InventorySlot = InventorySlot::new(5);

#[test]
fn same_lane_same_faction_fires_exactly_one_projectile_after_cooldown() {
    let mut world = arena_with_red_defender_in_lane_two();
    spawn_attacker(&mut world, 2, Faction::Red);
    let mut combat = combat();

    let fired = step(&mut world, &mut combat, Duration::from_millis(4_900));
    assert!(fired.is_empty(), "cooldown has not elapsed yet");

    let fired = step(&mut world, &mut combat, Duration::from_millis(100));
    let position = query::config(&world).arena.cell_center(CellCoord::new(0, 2));
    assert_eq!(fired.len(), 1, "exactly one projectile per elapsed cooldown");
    match fired[0] {
        Event::ProjectileFired {
            defender,
            faction,
            position: origin,
            ..
        } => {
            assert_eq!(defender, DefenderId::new(0));
            assert_eq!(faction, Faction::Red);
            assert_eq!(origin, position);
        }
        ref other => panic!("unexpected event: {other:?}"),
    }

    let projectiles = query::projectile_view(&world).into_vec();
    assert_eq!(projectiles.len(), 1);
    assert_eq!(projectiles[0].faction, Faction::Red);
    assert_eq!(projectiles[0].position, position);
    assert_eq!(projectiles[0].rotation, 30.0);
    assert!((30.0..=60.0).contains(&projectiles[0].speed));

    let again = step(&mut world, &mut combat, Duration::from_millis(100));
    assert!(again.is_empty(), "the shot timer restarts after firing");
}

#[test]
fn timer_keeps_charging_until_a_target_appears() {
    let mut world = arena_with_red_defender_in_lane_two();
    spawn_attacker(&mut world, 2, Faction::Blue);
    spawn_attacker(&mut world, 1, Faction::Red);
    let mut combat = combat();

    let fired = step(&mut world, &mut combat, Duration::from_secs(12));
    assert!(fired.is_empty(), "no same-lane, same-faction attacker");

    spawn_attacker(&mut world, 2, Faction::Red);
    let fired = step(&mut world, &mut combat, Duration::ZERO);
    assert_eq!(fired.len(), 1, "a charged defender fires as soon as a target appears");
}

#[test]
fn identical_seeds_pick_identical_projectile_speeds() {
    let mut left = arena_with_red_defender_in_lane_two();
    let mut right = arena_with_red_defender_in_lane_two();
    spawn_attacker(&mut left, 2, Faction::Red);
    spawn_attacker(&mut right, 2, Faction::Red);
    let mut left_combat = combat();
    let mut right_combat = combat();

    for _ in 0..4 {
        let _ = step(&mut left, &mut left_combat, Duration::from_secs(5));
        let _ = step(&mut right, &mut right_combat, Duration::from_secs(5));
    }

    let speeds = |world: &World| -> Vec<f32> {
        query::projectile_view(world)
            .iter()
            .map(|projectile| projectile.speed)
            .collect()
    };
    assert_eq!(speeds(&left).len(), 4);
    assert_eq!(speeds(&left), speeds(&right));
}

fn combat() -> Combat {
    Combat::new(Config::from_session(&SessionConfig::default(), 0x5eed))
}

fn step(world: &mut World, combat: &mut Combat, dt: Duration) -> Vec<Event> {
    let mut events = Vec::new();
    world::apply(world, Command::ChargeDefenders { dt }, &mut events);

    let mut commands = Vec::new();
    combat.handle(
        &query::defender_view(world),
        &query::attacker_view(world),
        &mut commands,
    );
    for command in commands {
        world::apply(world, command, &mut events);
    }

    events
        .into_iter()
        .filter(|event| matches!(event, Event::ProjectileFired { .. }))
        .collect()
}

fn arena_with_red_defender_in_lane_two() -> World {
    let mut world = World::default();
    let mut events = Vec::new();
    for pickup in 0..2 {
        world::apply(
            &mut world,
            Command::SpawnPickup {
                position: Vec2::new(640.0, 360.0),
            },
            &mut events,
        );
        world::apply(
            &mut world,
            Command::CollectPickup {
                pickup: PickupId::new(pickup),
            },
            &mut events,
        );
    }
    world::apply(
        &mut world,
        Command::PlaceDefender {
            slot: RED_SLOT,
            cell: CellCoord::new(0, 2),
        },
        &mut events,
    );
    assert!(
        events
            .iter()
            .any(|event| matches!(event, Event::DefenderPlaced { .. })),
        "defender placement must succeed",
    );
    world
}

fn spawn_attacker(world: &mut World, lane: u32, faction: Faction) {
    let mut events = Vec::new();
    world::apply(
        world,
        Command::SpawnAttacker {
            lane,
            faction,
            speed: 30.0,
        },
        &mut events,
    );
}
