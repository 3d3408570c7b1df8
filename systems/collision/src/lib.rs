#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that detects attacker collisions and emits their consequences.
//!
//! Motion itself is integrated by the world. This system inspects the
//! resulting snapshots and reports three kinds of contact, each evaluated
//! against every active pair:
//!
//! * attacker vs. base: the point of the base rectangle nearest to the
//!   attacker lies within half of the attacker's outer radius;
//! * attacker vs. defender: both axis-wise distances fall below the sum of
//!   the attacker's outer radius and the defender's reach;
//! * attacker vs. projectile: the same axis-aligned test using the
//!   projectile's reach, gated by an exact faction match.

use glam::Vec2;
use lane_defence_core::{
    AttackerId, AttackerSnapshot, AttackerView, BaseRect, Command, DefenderView, ProjectileView,
    ATTACKER_HIT_THRESHOLD,
};

/// Reports whether an attacker has reached the base rectangle.
#[must_use]
pub fn touches_base(base: &BaseRect, attacker: &AttackerSnapshot) -> bool {
    let nearest = base.nearest_point(attacker.position);
    let reach = attacker.radius / 2.0;
    attacker.position.distance_squared(nearest) < reach * reach
}

/// Axis-aligned proximity test between an attacker and another body.
#[must_use]
pub fn overlaps(attacker: &AttackerSnapshot, position: Vec2, reach: f32) -> bool {
    let delta = (attacker.position - position).abs();
    let limit = attacker.radius + reach;
    delta.x < limit && delta.y < limit
}

/// Collision system that queues breach, crush and hit commands.
#[derive(Debug, Default)]
pub struct Collision {
    hits: Vec<(AttackerId, u32)>,
    scratch: Vec<Command>,
}

impl Collision {
    /// Creates a new collision system with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Emits `Command::BreachBase` for every active attacker touching the base.
    pub fn base_breaches(
        &mut self,
        base: BaseRect,
        attackers: &AttackerView,
        out: &mut Vec<Command>,
    ) {
        out.extend(
            attackers
                .active()
                .filter(|attacker| touches_base(&base, attacker))
                .map(|attacker| Command::BreachBase {
                    attacker: attacker.id,
                }),
        );
    }

    /// Emits `Command::CrushDefender` for every placed defender that an
    /// active attacker has run into. The lowest attacker identifier is
    /// credited when several overlap the same defender.
    pub fn defender_crushes(
        &mut self,
        attackers: &AttackerView,
        defenders: &DefenderView,
        out: &mut Vec<Command>,
    ) {
        self.scratch.clear();

        for defender in defenders.placed() {
            let crusher = attackers
                .active()
                .find(|attacker| overlaps(attacker, defender.position, defender.reach));
            if let Some(attacker) = crusher {
                self.scratch.push(Command::CrushDefender {
                    defender: defender.id,
                    attacker: attacker.id,
                });
            }
        }

        out.append(&mut self.scratch);
    }

    /// Emits `Command::HitAttacker` for projectiles overlapping an attacker
    /// of their own faction.
    ///
    /// Each projectile strikes at most one attacker, the lowest identifier
    /// among its candidates. Hits queued earlier in the same pass count
    /// toward the threshold, so an attacker that will already be destroyed
    /// by this batch does not soak up further projectiles.
    pub fn projectile_hits(
        &mut self,
        attackers: &AttackerView,
        projectiles: &ProjectileView,
        out: &mut Vec<Command>,
    ) {
        self.scratch.clear();
        self.hits.clear();
        self.hits
            .extend(attackers.active().map(|attacker| (attacker.id, attacker.hits)));

        for projectile in projectiles.iter() {
            let target = attackers.active().zip(self.hits.iter_mut()).find(
                |(attacker, (_, hits))| {
                    *hits < ATTACKER_HIT_THRESHOLD
                        && attacker.faction == projectile.faction
                        && overlaps(attacker, projectile.position, projectile.reach)
                },
            );
            if let Some((attacker, (_, hits))) = target {
                *hits += 1;
                self.scratch.push(Command::HitAttacker {
                    attacker: attacker.id,
                    projectile: projectile.id,
                });
            }
        }

        out.append(&mut self.scratch);
    }
}
