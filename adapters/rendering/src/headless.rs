//! In-memory visual backend for headless sessions and tests.

use std::collections::BTreeMap;

use glam::Vec2;

use crate::{Color, ShapeParams, VisualBackend, VisualError, VisualHandle, VisualKind};

/// State of a visual held by the [`HeadlessBackend`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HeadlessVisual {
    /// Kind the visual was created for.
    pub kind: VisualKind,
    /// Shape the visual was built from.
    pub shape: ShapeParams,
    /// Fill color.
    pub color: Color,
    /// Last position assigned.
    pub position: Vec2,
    /// Last rotation assigned, in degrees.
    pub rotation: f32,
    /// Last scale assigned.
    pub scale: f32,
}

/// Backend that records visuals in memory without drawing anything.
///
/// Used by the command line runner and by tests that need to observe what the
/// simulation asked of its visual collaborator.
#[derive(Debug, Default)]
pub struct HeadlessBackend {
    next: u64,
    live: BTreeMap<VisualHandle, HeadlessVisual>,
    failing: Option<VisualKind>,
    released: u64,
    redundant_releases: u64,
}

impl HeadlessBackend {
    /// Creates a backend that builds every requested visual.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a backend that refuses to build visuals of `kind`.
    #[must_use]
    pub fn failing_on(kind: VisualKind) -> Self {
        Self {
            failing: Some(kind),
            ..Self::default()
        }
    }

    /// Stops or starts refusing visuals of a kind.
    pub fn set_failing(&mut self, kind: Option<VisualKind>) {
        self.failing = kind;
    }

    /// Number of visuals created and not yet released.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Number of live visuals of `kind`.
    #[must_use]
    pub fn live_of_kind(&self, kind: VisualKind) -> usize {
        self.live
            .values()
            .filter(|visual| visual.kind == kind)
            .count()
    }

    /// Live visual behind `handle`.
    #[must_use]
    pub fn visual(&self, handle: VisualHandle) -> Option<&HeadlessVisual> {
        self.live.get(&handle)
    }

    /// Number of successful releases.
    #[must_use]
    pub fn released_count(&self) -> u64 {
        self.released
    }

    /// Number of releases aimed at handles that were no longer live.
    #[must_use]
    pub fn redundant_releases(&self) -> u64 {
        self.redundant_releases
    }
}

impl VisualBackend for HeadlessBackend {
    fn create_visual(
        &mut self,
        kind: VisualKind,
        shape: ShapeParams,
        color: Color,
    ) -> Result<VisualHandle, VisualError> {
        if self.failing == Some(kind) {
            return Err(VisualError::ShapeRejected { kind, shape });
        }

        let handle = VisualHandle::new(self.next);
        self.next = self
            .next
            .checked_add(1)
            .ok_or(VisualError::Exhausted { kind })?;
        let _ = self.live.insert(
            handle,
            HeadlessVisual {
                kind,
                shape,
                color,
                position: Vec2::ZERO,
                rotation: 0.0,
                scale: 1.0,
            },
        );
        Ok(handle)
    }

    fn position_visual(&mut self, handle: VisualHandle, position: Vec2, rotation: f32, scale: f32) {
        if let Some(visual) = self.live.get_mut(&handle) {
            visual.position = position;
            visual.rotation = rotation;
            visual.scale = scale;
        }
    }

    fn release_visual(&mut self, handle: VisualHandle) {
        if self.live.remove(&handle).is_some() {
            self.released += 1;
        } else {
            self.redundant_releases += 1;
            tracing::debug!(handle = handle.get(), "ignored release of unknown visual");
        }
    }
}
