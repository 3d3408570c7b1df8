//! Shapes, colors and fixed positions of every visual the session creates.

use glam::Vec2;
use lane_defence_core::{
    ArenaConfig, AttackerConfig, BaseRect, DefenderConfig, Faction, PickupConfig,
    ProjectileConfig,
};
use lane_defence_rendering::{palette, Color, ShapeParams, VisualKind};

const LIFE_RADIUS: f32 = 8.0;

/// Arguments for a single `create_visual` call.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct VisualSpec {
    pub(crate) kind: VisualKind,
    pub(crate) shape: ShapeParams,
    pub(crate) color: Color,
}

pub(crate) fn attacker(config: &AttackerConfig, faction: Faction) -> VisualSpec {
    VisualSpec {
        kind: VisualKind::Attacker,
        shape: ShapeParams::Ring {
            outer: config.outer_radius,
            inner: config.inner_radius,
        },
        color: faction.into(),
    }
}

/// Placed defenders, dragged clones and inventory templates share a shape.
pub(crate) fn defender(config: &DefenderConfig, faction: Faction, kind: VisualKind) -> VisualSpec {
    VisualSpec {
        kind,
        shape: ShapeParams::Star {
            outer: config.reach,
            inner: config.inner_length,
        },
        color: faction.into(),
    }
}

pub(crate) fn projectile(config: &ProjectileConfig, faction: Faction) -> VisualSpec {
    VisualSpec {
        kind: VisualKind::Projectile,
        shape: ShapeParams::Bar {
            length: config.reach,
            width: config.width,
        },
        color: Color::from(faction).lighten(0.25),
    }
}

pub(crate) fn pickup(config: &PickupConfig, kind: VisualKind) -> VisualSpec {
    VisualSpec {
        kind,
        shape: ShapeParams::Circle {
            radius: config.radius,
        },
        color: palette::PICKUP,
    }
}

pub(crate) fn cell(arena: &ArenaConfig) -> VisualSpec {
    VisualSpec {
        kind: VisualKind::Cell,
        shape: ShapeParams::Rect {
            size: Vec2::splat(arena.cell_side),
        },
        color: palette::CELL,
    }
}

pub(crate) fn base(rect: BaseRect) -> VisualSpec {
    VisualSpec {
        kind: VisualKind::Base,
        shape: ShapeParams::Rect { size: rect.size() },
        color: palette::BASE,
    }
}

pub(crate) fn life() -> VisualSpec {
    VisualSpec {
        kind: VisualKind::Life,
        shape: ShapeParams::Circle {
            radius: LIFE_RADIUS,
        },
        color: palette::LIFE,
    }
}

/// Life markers stack downwards from the top of the base.
pub(crate) fn life_position(arena: &ArenaConfig, index: u32) -> Vec2 {
    let base = arena.base_rect();
    let top = base.origin().y + base.size().y;
    Vec2::new(
        base.origin().x + base.size().x / 2.0,
        top - arena.cell_spacing - index as f32 * LIFE_RADIUS * 3.0,
    )
}

/// Collected pickups line up in the inventory bar after the templates.
pub(crate) fn wallet_position(arena: &ArenaConfig, templates: usize, slot: usize) -> Vec2 {
    arena.inventory_slot_center((templates + slot) as u32)
}
