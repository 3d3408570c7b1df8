#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pointer-driven placement state machine.
//!
//! The primary button collects pickups and drags defender templates out of
//! the inventory bar onto the grid. The secondary button removes placed
//! defenders. The system never mutates the world; it emits commands that the
//! world validates again when they are applied.

use glam::Vec2;
use lane_defence_core::{CellCoord, Command, DefenderId, Faction, InventorySlot};
use lane_defence_world::{query, World};

/// Pointer buttons recognised by the placement gestures.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PointerButton {
    /// Collects pickups and drags templates.
    Primary,
    /// Removes placed defenders.
    Secondary,
}

/// Pointer input already translated into world space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PointerEvent {
    /// A button went down.
    Pressed {
        /// Button that was pressed.
        button: PointerButton,
        /// World-space pointer location.
        position: Vec2,
    },
    /// The pointer moved.
    Moved {
        /// World-space pointer location.
        position: Vec2,
    },
    /// A button was released.
    Released {
        /// Button that was released.
        button: PointerButton,
        /// World-space pointer location.
        position: Vec2,
    },
}

/// Template clone carried by an active drag.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HeldDefender {
    /// Inventory slot the clone was taken from.
    pub slot: InventorySlot,
    /// Faction of the clone.
    pub faction: Faction,
    /// Cost charged when the clone is placed.
    pub cost: u32,
    /// Current world-space position of the clone.
    pub position: Vec2,
    /// Position the clone occupied before the drag began.
    pub origin: Vec2,
}

/// Current phase of the drag gesture.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum GestureState {
    /// No template is held.
    #[default]
    Idle,
    /// A template clone follows the pointer.
    Dragging(HeldDefender),
}

/// Why a drag ended without a placement request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CancelReason {
    /// No free cell center lies within the drop tolerance.
    NoFreeCell,
    /// Currency fell below the template cost during the drag.
    InsufficientCurrency {
        /// Cost of the held template.
        cost: u32,
        /// Currency available at drop time.
        available: u32,
    },
    /// The session ended during the drag.
    SessionOver,
}

/// Result of feeding one pointer event to the placement system.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GestureOutcome {
    /// The event had no effect.
    Ignored,
    /// Pickups under the pointer were queued for collection.
    Collected {
        /// Number of pickups queued.
        count: u32,
    },
    /// A template clone is now held.
    DragStarted {
        /// Slot the clone was taken from.
        slot: InventorySlot,
    },
    /// The player could not afford the template under the pointer.
    DragRefused {
        /// Slot under the pointer.
        slot: InventorySlot,
        /// Cost of the template.
        cost: u32,
        /// Currency available, including pickups collected by the same press.
        available: u32,
    },
    /// The held clone followed the pointer.
    DragMoved {
        /// New world-space position of the clone.
        position: Vec2,
    },
    /// A placement command was queued for the released clone.
    DropRequested {
        /// Slot the clone was taken from.
        slot: InventorySlot,
        /// Cell the clone should occupy.
        cell: CellCoord,
    },
    /// The held clone was discarded.
    DragCancelled {
        /// Slot the clone was taken from.
        slot: InventorySlot,
        /// Why the drop could not be honoured.
        reason: CancelReason,
    },
    /// A removal command was queued for a placed defender.
    RemovalRequested {
        /// Defender under the pointer.
        defender: DefenderId,
    },
}

/// Placement system tracking the drag gesture between pointer events.
#[derive(Debug, Default)]
pub struct Placement {
    state: GestureState,
}

impl Placement {
    /// Creates a placement system in the idle state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current phase of the drag gesture.
    #[must_use]
    pub fn state(&self) -> GestureState {
        self.state
    }

    /// Template clone currently following the pointer, if any.
    #[must_use]
    pub fn held(&self) -> Option<&HeldDefender> {
        match &self.state {
            GestureState::Dragging(held) => Some(held),
            GestureState::Idle => None,
        }
    }

    /// Abandons the current drag, returning the discarded clone.
    pub fn cancel(&mut self) -> Option<HeldDefender> {
        match std::mem::take(&mut self.state) {
            GestureState::Dragging(held) => Some(held),
            GestureState::Idle => None,
        }
    }

    /// Consumes a pointer event and emits the commands it implies.
    pub fn handle(
        &mut self,
        event: PointerEvent,
        world: &World,
        out: &mut Vec<Command>,
    ) -> GestureOutcome {
        match event {
            PointerEvent::Pressed {
                button: PointerButton::Primary,
                position,
            } => self.press(position, world, out),
            PointerEvent::Pressed {
                button: PointerButton::Secondary,
                position,
            } => remove_at(position, world, out),
            PointerEvent::Moved { position } => match &mut self.state {
                GestureState::Dragging(held) => {
                    held.position = position;
                    GestureOutcome::DragMoved { position }
                }
                GestureState::Idle => GestureOutcome::Ignored,
            },
            PointerEvent::Released {
                button: PointerButton::Primary,
                position,
            } => self.release(position, world, out),
            PointerEvent::Released {
                button: PointerButton::Secondary,
                ..
            } => GestureOutcome::Ignored,
        }
    }

    fn press(&mut self, position: Vec2, world: &World, out: &mut Vec<Command>) -> GestureOutcome {
        if !query::is_running(world) {
            return GestureOutcome::Ignored;
        }

        let mut collected = 0;
        for pickup in query::pickup_view(world).iter() {
            if pickup.contains(position) {
                out.push(Command::CollectPickup { pickup: pickup.id });
                collected += 1;
            }
        }

        if self.held().is_some() {
            return GestureOutcome::Ignored;
        }

        let template = query::templates(world)
            .iter()
            .find(|template| template.contains(position));
        let Some(template) = template else {
            return if collected > 0 {
                GestureOutcome::Collected { count: collected }
            } else {
                GestureOutcome::Ignored
            };
        };

        let available = query::currency(world).saturating_add(collected);
        if template.cost > available {
            return GestureOutcome::DragRefused {
                slot: template.slot,
                cost: template.cost,
                available,
            };
        }

        self.state = GestureState::Dragging(HeldDefender {
            slot: template.slot,
            faction: template.faction,
            cost: template.cost,
            position: template.position,
            origin: template.position,
        });
        GestureOutcome::DragStarted {
            slot: template.slot,
        }
    }

    fn release(&mut self, position: Vec2, world: &World, out: &mut Vec<Command>) -> GestureOutcome {
        let Some(held) = self.cancel() else {
            return GestureOutcome::Ignored;
        };
        let slot = held.slot;

        if !query::is_running(world) {
            return GestureOutcome::DragCancelled {
                slot,
                reason: CancelReason::SessionOver,
            };
        }

        let available = query::currency(world);
        if held.cost > available {
            return GestureOutcome::DragCancelled {
                slot,
                reason: CancelReason::InsufficientCurrency {
                    cost: held.cost,
                    available,
                },
            };
        }

        let tolerance = query::config(world).arena.drop_tolerance;
        match query::grid(world).nearest_free_within(position, tolerance) {
            Some(cell) => {
                out.push(Command::PlaceDefender { slot, cell });
                GestureOutcome::DropRequested { slot, cell }
            }
            None => GestureOutcome::DragCancelled {
                slot,
                reason: CancelReason::NoFreeCell,
            },
        }
    }
}

/// Queues removal of the placed defender nearest to `position` within its
/// pick radius.
fn remove_at(position: Vec2, world: &World, out: &mut Vec<Command>) -> GestureOutcome {
    if !query::is_running(world) {
        return GestureOutcome::Ignored;
    }

    let radius = query::config(world).defenders.pick_radius;
    let target = query::defender_view(world)
        .placed()
        .map(|defender| (defender.id, defender.position.distance_squared(position)))
        .filter(|(_, distance)| *distance <= radius * radius)
        .min_by(|left, right| left.1.total_cmp(&right.1));

    match target {
        Some((defender, _)) => {
            out.push(Command::RemoveDefender { defender });
            GestureOutcome::RemovalRequested { defender }
        }
        None => GestureOutcome::Ignored,
    }
}
