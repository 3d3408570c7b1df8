//! Scripted player used by headless runs.
//!
//! Between frames the player sweeps every visible pickup, then drags the
//! cheapest affordable template onto the first free cell.

use glam::Vec2;
use lane_defence_rendering::{ScreenToWorld, VisualBackend};
use lane_defence_simulation::Simulation;
use lane_defence_system_placement::{PointerButton, PointerEvent};
use lane_defence_world::query;

/// Headless sessions have no screen, so pointer coordinates are world
/// coordinates.
struct WorldPointer;

impl ScreenToWorld for WorldPointer {
    fn screen_to_world(&self, screen: Vec2) -> Vec2 {
        screen
    }
}

pub(crate) fn step<B: VisualBackend>(simulation: &mut Simulation<B>) {
    collect_pickups(simulation);

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

    click(simulation, template, target);
}

fn collect_pickups<B: VisualBackend>(simulation: &mut Simulation<B>) {
    let pickups: Vec<Vec2> = query::pickup_view(simulation.world())
        .iter()
        .map(|pickup| pickup.position)
        .collect();
    for position in pickups {
        click(simulation, position, position);
    }
}

/// Presses at `from`, drags to `to` and releases there.
fn click<B: VisualBackend>(simulation: &mut Simulation<B>, from: Vec2, to: Vec2) {
    let _ = simulation.pointer(
        PointerEvent::Pressed {
            button: PointerButton::Primary,
            position: from,
        },
        &WorldPointer,
    );
    if from != to {
        let _ = simulation.pointer(PointerEvent::Moved { position: to }, &WorldPointer);
    }
    let _ = simulation.pointer(
        PointerEvent::Released {
            button: PointerButton::Primary,
            position: to,
        },
        &WorldPointer,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use lane_defence_core::SessionConfig;
    use lane_defence_rendering::HeadlessBackend;
    use std::time::Duration;

    #[test]
    fn autoplay_spends_collected_currency_on_defenders() {
        let mut config = SessionConfig::default();
        config.arena.opening_defender_chance = 0.0;
        let mut simulation =
            Simulation::new(config, 12, HeadlessBackend::new()).expect("valid session");

        for _ in 0..6 {
            let _ = simulation.tick(Duration::from_secs(1));
        }
        step(&mut simulation);

        let world = simulation.world();
        assert!(query::population(world).defenders >= 1);
        assert_eq!(query::population(world).pickups, 0);
        assert!(!query::grid(world).is_free(lane_defence_core::CellCoord::new(0, 0)));
    }
}
