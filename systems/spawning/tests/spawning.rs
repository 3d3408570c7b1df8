use std::time::Duration;

use lane_defence_core::{Command, Event, SessionConfig};
use lane_defence_system_spawning::{Config, Spawning};
use lane_defence_world::{self as world, query, World};

const SEED: u64 = 0x4d59_5df4_d0f3_3173;

#[test]
fn no_attackers_before_first_interval() {
    let mut spawning = spawning(SEED);
    let mut commands = Vec::new();

    spawning.spawn_attackers(Duration::from_millis(7_999), &mut commands);

    assert!(commands.is_empty(), "no spawn before full interval");
    assert_eq!(spawning.attacker_backlog(), Duration::from_millis(7_999));
}

#[test]
fn attacker_waves_respect_lane_speed_and_size_limits() {
    let session = SessionConfig::default();
    let mut spawning = spawning(SEED);

    for _ in 0..100 {
        let mut commands = Vec::new();
        spawning.spawn_attackers(Duration::from_secs(8), &mut commands);

        assert!(
            (1..=4).contains(&commands.len()),
            "each wave releases between one and four attackers, got {}",
            commands.len(),
        );
        for command in commands {
            match command {
                Command::SpawnAttacker { lane, speed, .. } => {
                    assert!(lane < session.arena.rows);
                    assert!((25.0..=50.0).contains(&speed), "speed {speed} out of range");
                }
                other => panic!("unexpected command emitted: {other:?}"),
            }
        }
    }
}

#[test]
fn overshoot_carries_into_following_wave() {
    let mut spawning = spawning(SEED);
    let mut commands = Vec::new();

    spawning.spawn_attackers(Duration::from_secs(9), &mut commands);
    assert!(!commands.is_empty());
    assert_eq!(spawning.attacker_backlog(), Duration::from_secs(1));

    commands.clear();
    spawning.spawn_attackers(Duration::from_secs(7), &mut commands);
    assert!(
        !commands.is_empty(),
        "carried overshoot completes the second interval early",
    );
    assert_eq!(spawning.attacker_backlog(), Duration::ZERO);
}

#[test]
fn pickup_waves_span_three_to_six_and_reach_the_maximum() {
    let session = SessionConfig::default();
    let mut spawning = spawning(SEED);
    let mut largest = 0;

    for _ in 0..200 {
        let mut commands = Vec::new();
        spawning.spawn_pickups(Duration::from_secs(5), &mut commands);

        assert!(
            (3..=6).contains(&commands.len()),
            "pickup waves hold three to six pickups, got {}",
            commands.len(),
        );
        for command in &commands {
            match command {
                Command::SpawnPickup { position } => {
                    assert!(position.x >= 0.0 && position.x < session.arena.width);
                    assert!(position.y >= 0.0 && position.y < session.arena.height);
                }
                other => panic!("unexpected command emitted: {other:?}"),
            }
        }
        largest = largest.max(commands.len());
    }

    assert_eq!(largest, 6, "a maximal draw spawns six pickups in one interval");
}

#[test]
fn identical_seeds_replay_identical_waves() {
    let mut first = spawning(SEED);
    let mut second = spawning(SEED);
    let mut left = Vec::new();
    let mut right = Vec::new();

    for step in 0..40 {
        let dt = Duration::from_millis(250 + step * 37);
        first.spawn_attackers(dt, &mut left);
        first.spawn_pickups(dt, &mut left);
        second.spawn_attackers(dt, &mut right);
        second.spawn_pickups(dt, &mut right);
    }

    assert!(!left.is_empty());
    assert_eq!(left, right);
}

#[test]
fn spawned_attackers_enter_at_the_far_edge_of_their_lane() {
    let mut world = World::default();
    let mut spawning = spawning(SEED);
    let mut commands = Vec::new();
    spawning.spawn_attackers(Duration::from_secs(8), &mut commands);

    let mut events = Vec::new();
    for command in commands {
        world::apply(&mut world, command, &mut events);
    }

    let arena = &query::config(&world).arena;
    let view = query::attacker_view(&world);
    assert_eq!(
        view.iter().count(),
        events
            .iter()
            .filter(|event| matches!(event, Event::AttackerSpawned { .. }))
            .count(),
    );
    for attacker in view.iter() {
        assert_eq!(attacker.position.x, arena.width);
        assert_eq!(attacker.position.y, arena.lane_y(attacker.lane));
        assert_eq!(attacker.hits, 0);
        assert!(attacker.active);
    }
}

fn spawning(seed: u64) -> Spawning {
    Spawning::new(Config::from_session(&SessionConfig::default(), seed))
}
