//! Authoritative per-entity state and motion integration.

use std::time::Duration;

use glam::Vec2;
use lane_defence_core::{
    AttackerId, AttackerSnapshot, BaseRect, CellCoord, DefenderId, DefenderSnapshot, Faction,
    PickupId, PickupSnapshot, ProjectileId, ProjectileSnapshot,
};

const FULL_TURN_DEGREES: f32 = 360.0;

#[derive(Clone, Debug)]
pub(crate) struct Attacker {
    pub(crate) id: AttackerId,
    pub(crate) faction: Faction,
    pub(crate) lane: u32,
    pub(crate) position: Vec2,
    pub(crate) speed: f32,
    pub(crate) hits: u32,
    pub(crate) radius: f32,
    pub(crate) active: bool,
    pub(crate) scale: f32,
}

impl Attacker {
    /// Moves the attacker toward the base, reporting whether it left the arena.
    ///
    /// Attackers travelling along a lane the base spans stop at the base's
    /// left edge, so a long step cannot carry them past it.
    pub(crate) fn advance(&mut self, dt: f32, base: &BaseRect) -> bool {
        self.position.x -= self.speed * dt;
        let bottom = base.origin().y;
        let top = bottom + base.size().y;
        if (bottom..=top).contains(&self.position.y) {
            self.position.x = self.position.x.max(base.origin().x);
            return false;
        }
        self.position.x < 0.0
    }

    pub(crate) fn snapshot(&self) -> AttackerSnapshot {
        AttackerSnapshot {
            id: self.id,
            faction: self.faction,
            lane: self.lane,
            position: self.position,
            speed: self.speed,
            hits: self.hits,
            radius: self.radius,
            active: self.active,
            scale: self.scale,
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Defender {
    pub(crate) id: DefenderId,
    pub(crate) faction: Faction,
    pub(crate) position: Vec2,
    pub(crate) cell: Option<CellCoord>,
    pub(crate) reach: f32,
    pub(crate) shot_timer: Duration,
    pub(crate) cooldown: Duration,
    pub(crate) active: bool,
    pub(crate) scale: f32,
}

impl Defender {
    /// Reports whether the defender is active and holds a cell.
    pub(crate) fn placed(&self) -> bool {
        self.active && self.cell.is_some()
    }

    pub(crate) fn snapshot(&self) -> DefenderSnapshot {
        DefenderSnapshot {
            id: self.id,
            faction: self.faction,
            position: self.position,
            cell: self.cell,
            reach: self.reach,
            shot_timer: self.shot_timer,
            cooldown: self.cooldown,
            active: self.active,
            scale: self.scale,
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Projectile {
    pub(crate) id: ProjectileId,
    pub(crate) faction: Faction,
    pub(crate) position: Vec2,
    pub(crate) rotation: f32,
    pub(crate) speed: f32,
    pub(crate) spin_rate: f32,
    pub(crate) reach: f32,
}

impl Projectile {
    /// Moves and spins the projectile, reporting whether it left the arena.
    pub(crate) fn advance(&mut self, dt: f32, extent: Vec2) -> bool {
        self.position.x += self.speed * dt;
        self.rotation = (self.rotation + self.spin_rate * dt).rem_euclid(FULL_TURN_DEGREES);
        self.position.x > extent.x || self.position.y > extent.y
    }

    pub(crate) fn snapshot(&self) -> ProjectileSnapshot {
        ProjectileSnapshot {
            id: self.id,
            faction: self.faction,
            position: self.position,
            rotation: self.rotation,
            speed: self.speed,
            reach: self.reach,
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Pickup {
    pub(crate) id: PickupId,
    pub(crate) position: Vec2,
    pub(crate) remaining: Duration,
    pub(crate) radius: f32,
}

impl Pickup {
    /// Counts down the lifespan, reporting whether the pickup expired.
    pub(crate) fn age(&mut self, dt: Duration) -> bool {
        self.remaining = self.remaining.saturating_sub(dt);
        self.remaining.is_zero()
    }

    pub(crate) fn snapshot(&self) -> PickupSnapshot {
        PickupSnapshot {
            id: self.id,
            position: self.position,
            remaining: self.remaining,
            radius: self.radius,
        }
    }
}

/// Shrinks a fading entity, reporting whether it vanished entirely.
pub(crate) fn fade(scale: &mut f32, rate: f32, dt: f32) -> bool {
    *scale = (*scale - rate * dt).max(0.0);
    *scale <= 0.0
}
