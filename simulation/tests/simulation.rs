use std::collections::BTreeSet;
use std::time::Duration;

use glam::Vec2;
use lane_defence_core::{CellCoord, EntityKey, Event, InventorySlot, SessionConfig};
use lane_defence_rendering::{
    HeadlessBackend, OrthographicViewport, ScreenToWorld, VisualBackend, VisualKey, VisualKind,
};
use lane_defence_simulation::Simulation;
use lane_defence_system_placement::{GestureOutcome, GestureState, PointerButton, PointerEvent};
use lane_defence_world::query;

const SECOND: Duration = Duration::from_secs(1);

#[test]
fn breach_costs_one_life_and_releases_one_life_marker() {
    let mut simulation = session(single_file_config(), 11);

    let mut breaches = Vec::new();
    for _ in 0..100 {
        breaches = simulation
            .tick(SECOND)
            .iter()
            .filter_map(|event| match event {
                Event::BaseBreached {
                    lives_remaining, ..
                } => Some(*lives_remaining),
                _ => None,
            })
            .collect();
        if !breaches.is_empty() {
            break;
        }
    }

    assert_eq!(breaches, vec![2]);
    assert_eq!(query::lives(simulation.world()), 2);
    assert_eq!(simulation.visuals().handle(VisualKey::Life(2)), None);
    assert!(simulation.visuals().handle(VisualKey::Life(1)).is_some());
    assert!(simulation.visuals().handle(VisualKey::Life(0)).is_some());
    assert_eq!(simulation.backend().live_of_kind(VisualKind::Life), 2);
    assert_eq!(simulation.ticks(), 31, "x = 1280 - 50 * 24 touches the base");
}

#[test]
fn a_single_long_frame_still_breaches_the_base() {
    let mut simulation = session(single_file_config(), 13);
    let _ = simulation.tick(Duration::from_secs(7));

    let events = simulation.tick(Duration::from_secs(30)).to_vec();

    let breaches = events
        .iter()
        .filter(|event| matches!(event, Event::BaseBreached { .. }))
        .count();
    assert!(breaches >= 3, "{events:?}");
    assert!(!events
        .iter()
        .any(|event| matches!(event, Event::AttackerEscaped { .. })));
    assert!(events.contains(&Event::GameOver));
    assert_eq!(query::lives(simulation.world()), 0);
}

#[test]
fn game_over_freezes_gameplay_but_keeps_flushing() {
    let mut config = single_file_config();
    config.arena.starting_lives = 1;
    let mut simulation = session(config, 5);

    let mut over = false;
    for _ in 0..100 {
        if simulation.tick(SECOND).contains(&Event::GameOver) {
            over = true;
            break;
        }
    }
    assert!(over, "the first breach ends a one-life session");
    assert!(!query::is_running(simulation.world()));
    assert_eq!(simulation.visuals().marked_len(), 0);
    assert_eq!(simulation.backend().live_of_kind(VisualKind::Life), 0);

    let attackers = query::attacker_view(simulation.world()).into_vec();
    let pickups = query::pickup_view(simulation.world()).into_vec();
    let released = simulation.backend().released_count();
    for _ in 0..20 {
        assert!(simulation.tick(SECOND).is_empty());
    }

    assert_eq!(query::attacker_view(simulation.world()).into_vec(), attackers);
    assert_eq!(query::pickup_view(simulation.world()).into_vec(), pickups);
    assert_eq!(simulation.backend().released_count(), released);
    assert_eq!(simulation.backend().redundant_releases(), 0);
}

#[test]
fn entities_without_visuals_are_skipped_and_the_session_continues() {
    let mut simulation = Simulation::new(
        single_file_config(),
        3,
        HeadlessBackend::failing_on(VisualKind::Attacker),
    )
    .expect("valid session");

    for _ in 0..20 {
        let _ = simulation.tick(SECOND);
    }
    assert_eq!(query::population(simulation.world()).attackers, 0);
    assert_eq!(simulation.skipped_visuals(), 2, "waves at 8 s and 16 s");
    assert!(query::is_running(simulation.world()));

    simulation.backend_mut().set_failing(None);
    for _ in 0..4 {
        let _ = simulation.tick(SECOND);
    }
    assert_eq!(query::population(simulation.world()).attackers, 1);
    assert_eq!(simulation.backend().live_of_kind(VisualKind::Attacker), 1);
}

#[test]
fn drag_collect_place_and_remove_through_a_flipped_viewport() {
    let mut simulation = session(quiet_config(), 21);
    let viewport =
        OrthographicViewport::identity(Vec2::new(1280.0, 720.0)).expect("valid viewport");

    for _ in 0..5 {
        let _ = simulation.tick(SECOND);
    }
    let pickups: Vec<Vec2> = query::pickup_view(simulation.world())
        .iter()
        .map(|pickup| pickup.position)
        .collect();
    assert!(pickups.len() >= 3, "first pickup wave is due at 5 s");
    for position in pickups {
        let _ = simulation.pointer(press(screen(position)), &viewport);
        let _ = simulation.pointer(release(screen(position)), &viewport);
    }
    assert!(query::currency(simulation.world()) >= 3);
    assert_eq!(simulation.gesture(), GestureState::Idle);

    let template = query::template(simulation.world(), InventorySlot::new(0))
        .expect("first template")
        .position;
    assert_eq!(
        simulation.pointer(press(screen(template)), &viewport),
        GestureOutcome::DragStarted {
            slot: InventorySlot::new(0),
        },
    );
    assert_eq!(simulation.backend().live_of_kind(VisualKind::Defender), 1);

    let cell = CellCoord::new(1, 1);
    let center = query::config(simulation.world()).arena.cell_center(cell);
    let _ = simulation.pointer(
        PointerEvent::Moved {
            position: screen(center + Vec2::new(4.0, 4.0)),
        },
        &viewport,
    );
    assert_eq!(
        simulation.pointer(release(screen(center + Vec2::new(4.0, 4.0))), &viewport),
        GestureOutcome::DropRequested {
            slot: InventorySlot::new(0),
            cell,
        },
    );
    assert!(simulation
        .events()
        .iter()
        .any(|event| matches!(event, Event::DefenderPlaced { .. })));

    let _ = simulation.tick(Duration::ZERO);
    assert_eq!(
        simulation.backend().live_of_kind(VisualKind::Defender),
        1,
        "the dragged clone is released, the placed defender remains"
    );
    let defender = query::defender_view(simulation.world()).into_vec()[0].id;
    let handle = simulation
        .visuals()
        .handle(VisualKey::Entity(EntityKey::Defender(defender)))
        .expect("placed defender has a visual");
    assert_eq!(
        simulation.backend().visual(handle).map(|visual| visual.position),
        Some(center)
    );

    assert_eq!(
        simulation.pointer(
            PointerEvent::Pressed {
                button: PointerButton::Secondary,
                position: screen(center),
            },
            &viewport,
        ),
        GestureOutcome::RemovalRequested { defender },
    );
    let _ = simulation.tick(Duration::ZERO);
    assert!(query::grid(simulation.world()).is_free(cell));
    assert_eq!(simulation.backend().live_of_kind(VisualKind::Defender), 0);
}

#[test]
fn long_session_keeps_grid_entities_and_visuals_consistent() {
    let mut simulation = session(SessionConfig::default(), 0xfeed);
    let frame = Duration::from_secs_f32(1.0 / 30.0);
    let mut lives = query::lives(simulation.world());

    for tick in 0..3_000 {
        if tick % 30 == 0 {
            autoplay(&mut simulation);
        }
        let _ = simulation.tick(frame);

        let world = simulation.world();
        let occupied: BTreeSet<CellCoord> = query::grid(world)
            .cells()
            .iter()
            .filter(|cell| cell.occupied())
            .map(|cell| cell.coord())
            .collect();
        let placed: Vec<CellCoord> = query::defender_view(world)
            .placed()
            .filter_map(|defender| defender.cell)
            .collect();
        assert_eq!(placed.len(), occupied.len(), "one defender per occupied cell");
        assert_eq!(placed.into_iter().collect::<BTreeSet<_>>(), occupied);

        assert!(query::attacker_view(world)
            .active()
            .all(|attacker| attacker.hits < 3));
        assert!(query::lives(world) <= lives);
        lives = query::lives(world);

        let visuals = simulation.visuals();
        assert_eq!(visuals.marked_len(), 0);
        assert_eq!(simulation.backend().live_count(), visuals.registered_len());
        let population = query::population(world);
        let entity_visuals = visuals
            .handles()
            .filter(|(key, _)| matches!(key, VisualKey::Entity(_)))
            .count();
        assert_eq!(
            entity_visuals,
            population.attackers + population.defenders + population.projectiles + population.pickups
        );
    }

    assert_eq!(simulation.backend().redundant_releases(), 0);
}

#[test]
fn identical_seeds_replay_identically() {
    let mut left = session(SessionConfig::default(), 77);
    let mut right = session(SessionConfig::default(), 77);

    for _ in 0..600 {
        let frame = Duration::from_millis(100);
        let expected = left.tick(frame).to_vec();
        assert_eq!(right.tick(frame), expected.as_slice());
    }
}

#[test]
fn stop_cancels_the_drag_and_flushes_its_clone() {
    let mut simulation = session(quiet_config(), 4);
    let viewport = WorldSpace;
    for _ in 0..5 {
        let _ = simulation.tick(SECOND);
    }
    autoplay_collect(&mut simulation);
    let template = query::template(simulation.world(), InventorySlot::new(0))
        .expect("first template")
        .position;
    let _ = simulation.pointer(press(template), &viewport);
    assert!(matches!(simulation.gesture(), GestureState::Dragging(_)));

    simulation.stop();
    assert_eq!(simulation.gesture(), GestureState::Idle);
    assert!(simulation.events().contains(&Event::GameStopped));

    let _ = simulation.tick(SECOND);
    assert_eq!(simulation.backend().live_of_kind(VisualKind::Defender), 0);
    let released = simulation.backend().released_count();
    let _ = simulation.tick(SECOND);
    assert_eq!(simulation.backend().released_count(), released);
    assert_eq!(
        simulation.pointer(press(template), &viewport),
        GestureOutcome::Ignored
    );
}

struct WorldSpace;

impl ScreenToWorld for WorldSpace {
    fn screen_to_world(&self, screen: Vec2) -> Vec2 {
        screen
    }
}

fn session(config: SessionConfig, seed: u64) -> Simulation<HeadlessBackend> {
    Simulation::new(config, seed, HeadlessBackend::new()).expect("valid session")
}

fn quiet_config() -> SessionConfig {
    let mut config = SessionConfig::default();
    config.arena.opening_defender_chance = 0.0;
    config
}

/// One attacker per wave at a fixed speed and an empty grid.
fn single_file_config() -> SessionConfig {
    let mut config = quiet_config();
    config.attackers.max_per_wave = 1;
    config.attackers.min_speed = 50.0;
    config.attackers.max_speed = 50.0;
    config
}

fn screen(world: Vec2) -> Vec2 {
    Vec2::new(world.x, 720.0 - world.y)
}

fn press(position: Vec2) -> PointerEvent {
    PointerEvent::Pressed {
        button: PointerButton::Primary,
        position,
    }
}

fn release(position: Vec2) -> PointerEvent {
    PointerEvent::Released {
        button: PointerButton::Primary,
        position,
    }
}

fn autoplay_collect<B: VisualBackend>(simulation: &mut Simulation<B>) {
    let pickups: Vec<Vec2> = query::pickup_view(simulation.world())
        .iter()
        .map(|pickup| pickup.position)
        .collect();
    for position in pickups {
        let _ = simulation.pointer(press(position), &WorldSpace);
        let _ = simulation.pointer(release(position), &WorldSpace);
    }
}

fn autoplay<B: VisualBackend>(simulation: &mut Simulation<B>) {
    autoplay_collect(simulation);

    let world = simulation.world();
    let currency = query::currency(world);
    let Some(template) = query::templates(world)
        .iter()
        .filter(|template| template.cost <= currency)
        .min_by_key(|template| template.cost)
        .map(|template| template.position)
    else {
        return;
    };
    let Some(target) = query::grid(world)
        .cells()
        .iter()
        .find(|cell| !cell.occupied())
        .map(|cell| cell.center())
    else {
        return;
    };

    let _ = simulation.pointer(press(template), &WorldSpace);
    let _ = simulation.pointer(PointerEvent::Moved { position: target }, &WorldSpace);
    let _ = simulation.pointer(release(target), &WorldSpace);
}
