#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Visual collaborator contracts for Lane Defence adapters.
//!
//! The simulation never draws anything itself. It asks a [`VisualBackend`]
//! for one handle per entity, positions those handles once per frame and
//! hands them back through the [`DeferredDeletion`] manager, which releases
//! everything marked during a tick at a single collection point.

mod deletion;
mod headless;

pub use deletion::{DeferredDeletion, VisualKey};
pub use headless::{HeadlessBackend, HeadlessVisual};

use glam::Vec2;
use lane_defence_core::Faction;
use thiserror::Error;

/// RGBA color used when presenting visuals.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Creates a new color from floating point channels.
    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: 1.0,
        }
    }

    /// Returns a new color lightened towards white by the provided amount.
    #[must_use]
    pub fn lighten(self, amount: f32) -> Self {
        let amount = amount.clamp(0.0, 1.0);

        Self {
            red: lighten_channel(self.red, amount),
            green: lighten_channel(self.green, amount),
            blue: lighten_channel(self.blue, amount),
            alpha: self.alpha,
        }
    }
}

impl From<Faction> for Color {
    fn from(faction: Faction) -> Self {
        let (red, green, blue) = faction.rgb();
        Self::from_rgb_u8(red, green, blue)
    }
}

fn lighten_channel(channel: f32, amount: f32) -> f32 {
    channel + (1.0 - channel) * amount
}

/// Palette for visuals that carry no faction.
pub mod palette {
    use super::Color;

    /// Grid cells awaiting a defender.
    pub const CELL: Color = Color::from_rgb_u8(64, 64, 64);
    /// Base rectangle on the left edge of the arena.
    pub const BASE: Color = Color::from_rgb_u8(255, 255, 255);
    /// Remaining-life markers.
    pub const LIFE: Color = Color::from_rgb_u8(255, 0, 0);
    /// Currency pickups, loose or collected.
    pub const PICKUP: Color = Color::from_rgb_u8(255, 204, 0);
}

/// Kind of entity a visual represents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VisualKind {
    /// Moving attacker.
    Attacker,
    /// Placed defender or a template clone being dragged.
    Defender,
    /// Inventory template in the bottom bar.
    Template,
    /// Projectile in flight.
    Projectile,
    /// Loose currency pickup.
    Pickup,
    /// Collected pickup shown in the wallet display.
    Wallet,
    /// Remaining-life marker.
    Life,
    /// Placement cell.
    Cell,
    /// Base rectangle.
    Base,
}

/// Geometric parameters passed to the backend when building a visual.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ShapeParams {
    /// Annulus used for attackers.
    Ring {
        /// Outer radius.
        outer: f32,
        /// Inner radius.
        inner: f32,
    },
    /// Four-pointed star used for defenders.
    Star {
        /// Distance from the center to each outer point.
        outer: f32,
        /// Distance from the center to each inner vertex.
        inner: f32,
    },
    /// Thin bar used for projectiles.
    Bar {
        /// Half length along the travel axis.
        length: f32,
        /// Bar thickness.
        width: f32,
    },
    /// Filled disc.
    Circle {
        /// Disc radius.
        radius: f32,
    },
    /// Axis-aligned rectangle anchored at its center.
    Rect {
        /// Full width and height.
        size: Vec2,
    },
}

/// Stable handle issued by a [`VisualBackend`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VisualHandle(u64);

impl VisualHandle {
    /// Creates a handle from its raw backend value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Raw backend value of the handle.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

/// Errors reported by visual backends.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum VisualError {
    /// The backend could not build geometry for the requested shape.
    #[error("backend cannot build a {kind:?} visual from {shape:?}")]
    ShapeRejected {
        /// Kind of the visual that failed.
        kind: VisualKind,
        /// Shape parameters that were rejected.
        shape: ShapeParams,
    },
    /// The backend ran out of resources for new visuals.
    #[error("backend has no capacity left for a {kind:?} visual")]
    Exhausted {
        /// Kind of the visual that failed.
        kind: VisualKind,
    },
}

/// Rendering collaborator that owns the visual resources of every entity.
pub trait VisualBackend {
    /// Builds a visual once at entity creation.
    fn create_visual(
        &mut self,
        kind: VisualKind,
        shape: ShapeParams,
        color: Color,
    ) -> Result<VisualHandle, VisualError>;

    /// Moves a visual into place before the frame is presented.
    ///
    /// `rotation` is expressed in degrees.
    fn position_visual(&mut self, handle: VisualHandle, position: Vec2, rotation: f32, scale: f32);

    /// Releases a visual. Releasing an already released handle must be a
    /// no-op.
    fn release_visual(&mut self, handle: VisualHandle);
}

/// Translates pointer coordinates into world space.
pub trait ScreenToWorld {
    /// Maps a screen-space point to the world.
    fn screen_to_world(&self, screen: Vec2) -> Vec2;
}

/// Viewport that maps a top-left-origin screen onto a bottom-left-origin
/// world of possibly different extent.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OrthographicViewport {
    screen: Vec2,
    world: Vec2,
}

impl OrthographicViewport {
    /// Creates a viewport stretching `screen` pixels over `world` units.
    ///
    /// Returns `None` when either extent has a non-positive component.
    #[must_use]
    pub fn new(screen: Vec2, world: Vec2) -> Option<Self> {
        if screen.cmple(Vec2::ZERO).any() || world.cmple(Vec2::ZERO).any() {
            return None;
        }
        Some(Self { screen, world })
    }

    /// Viewport whose screen and world extents coincide.
    #[must_use]
    pub fn identity(extent: Vec2) -> Option<Self> {
        Self::new(extent, extent)
    }
}

impl ScreenToWorld for OrthographicViewport {
    fn screen_to_world(&self, screen: Vec2) -> Vec2 {
        let scale = self.world / self.screen;
        Vec2::new(screen.x * scale.x, (self.screen.y - screen.y) * scale.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn faction_colors_are_opaque() {
        let color = Color::from(Faction::Red);

        assert_eq!(color, Color::new(1.0, 0.0, 0.0, 1.0));
    }

    #[test]
    fn lighten_moves_channels_towards_white() {
        let color = Color::from_rgb_u8(0, 0, 0).lighten(0.5);

        assert_eq!(color, Color::new(0.5, 0.5, 0.5, 1.0));
    }

    #[test]
    fn viewport_flips_the_vertical_axis() {
        let viewport =
            OrthographicViewport::identity(Vec2::new(1280.0, 720.0)).expect("valid extent");

        assert_eq!(
            viewport.screen_to_world(Vec2::new(50.0, 0.0)),
            Vec2::new(50.0, 720.0)
        );
        assert_eq!(
            viewport.screen_to_world(Vec2::new(640.0, 720.0)),
            Vec2::new(640.0, 0.0)
        );
    }

    #[test]
    fn viewport_scales_between_extents() {
        let viewport = OrthographicViewport::new(Vec2::new(640.0, 360.0), Vec2::new(1280.0, 720.0))
            .expect("valid extents");

        assert_eq!(
            viewport.screen_to_world(Vec2::new(320.0, 90.0)),
            Vec2::new(640.0, 540.0)
        );
    }

    #[test]
    fn viewport_rejects_degenerate_extents() {
        assert!(OrthographicViewport::new(Vec2::new(0.0, 10.0), Vec2::ONE).is_none());
        assert!(OrthographicViewport::new(Vec2::ONE, Vec2::new(10.0, -1.0)).is_none());
    }
}
