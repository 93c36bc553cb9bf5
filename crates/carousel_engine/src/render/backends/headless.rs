//! Headless shadow backend
//!
//! Keeps the bookkeeping of a real backend (target ids, memory, open passes)
//! without touching a GPU. The viewer binary runs on it and tests use it to
//! observe which passes were recorded in which order.

use std::cell::RefCell;

use crate::render::shadow::{ShadowBackend, ShadowTarget};
use crate::render::{RenderError, RenderResult};

/// Bytes per texel of a 32-bit float depth target
const DEPTH_TEXEL_BYTES: u64 = 4;

/// Identifies one headless depth texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HeadlessTextureId(pub u32);

/// Something recorded while a frame's shadow passes ran
#[derive(Debug, Clone, PartialEq)]
pub enum PassEvent {
    /// A target was bound, cleared to `clear_depth` and given a `size` x `size` viewport
    Begin {
        /// Target that was bound
        target: HeadlessTextureId,
        /// Viewport side length
        size: u32,
        /// Depth clear value
        clear_depth: f32,
    },
    /// Geometry was submitted into the open pass
    Draw {
        /// Caller supplied label of what was drawn
        label: String,
    },
    /// The pass on `target` was closed
    End {
        /// Target that was released
        target: HeadlessTextureId,
    },
}

/// Command log standing in for a command buffer
#[derive(Debug, Default)]
pub struct PassRecorder {
    events: RefCell<Vec<PassEvent>>,
}

impl PassRecorder {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a draw into the currently open pass
    pub fn draw(&self, label: impl Into<String>) {
        self.events.borrow_mut().push(PassEvent::Draw { label: label.into() });
    }

    /// Snapshot of everything recorded so far
    pub fn events(&self) -> Vec<PassEvent> {
        self.events.borrow().clone()
    }

    /// Number of passes begun so far
    pub fn pass_count(&self) -> usize {
        self.events
            .borrow()
            .iter()
            .filter(|event| matches!(event, PassEvent::Begin { .. }))
            .count()
    }

    /// Forget everything recorded, typically once per frame
    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }

    fn push(&self, event: PassEvent) {
        self.events.borrow_mut().push(event);
    }
}

/// Allocates [`HeadlessShadowTarget`]s, optionally within a memory budget
#[derive(Debug, Default)]
pub struct HeadlessShadowBackend {
    next_id: u32,
    allocated_bytes: u64,
    memory_budget: Option<u64>,
}

impl HeadlessShadowBackend {
    /// Backend without a memory limit
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend that fails allocations once `bytes` of depth storage are in use
    pub fn with_memory_budget(bytes: u64) -> Self {
        Self {
            memory_budget: Some(bytes),
            ..Self::default()
        }
    }

    /// Bytes handed out so far
    pub fn allocated_bytes(&self) -> u64 {
        self.allocated_bytes
    }

    /// Number of targets created so far
    pub fn target_count(&self) -> u32 {
        self.next_id
    }
}

impl ShadowBackend for HeadlessShadowBackend {
    type Target = HeadlessShadowTarget;

    fn create_target(&mut self, size: u32) -> RenderResult<HeadlessShadowTarget> {
        if size == 0 {
            return Err(RenderError::ResourceCreationFailed(
                "shadow map size must be positive".to_string(),
            ));
        }

        let bytes = u64::from(size) * u64::from(size) * DEPTH_TEXEL_BYTES;
        if let Some(budget) = self.memory_budget {
            if self.allocated_bytes + bytes > budget {
                log::error!(
                    "Shadow map {}x{} needs {} bytes, only {} of {} left",
                    size,
                    size,
                    bytes,
                    budget.saturating_sub(self.allocated_bytes),
                    budget
                );
                return Err(RenderError::ResourceCreationFailed(format!(
                    "out of depth memory allocating {size}x{size} shadow map"
                )));
            }
        }

        let id = HeadlessTextureId(self.next_id);
        self.next_id += 1;
        self.allocated_bytes += bytes;
        log::debug!("Created headless shadow target {:?} ({}x{})", id, size, size);

        Ok(HeadlessShadowTarget {
            id,
            size,
            open: false,
            completed_passes: 0,
        })
    }
}

/// CPU-side depth target
#[derive(Debug)]
pub struct HeadlessShadowTarget {
    id: HeadlessTextureId,
    size: u32,
    open: bool,
    completed_passes: u64,
}

impl HeadlessShadowTarget {
    /// Whether a depth pass is currently open on this target
    pub fn is_bound(&self) -> bool {
        self.open
    }

    /// Number of passes that have been begun and ended
    pub fn completed_passes(&self) -> u64 {
        self.completed_passes
    }
}

impl ShadowTarget for HeadlessShadowTarget {
    type Recorder = PassRecorder;
    type Texture = HeadlessTextureId;

    fn size(&self) -> u32 {
        self.size
    }

    fn begin_depth_pass(&mut self, recorder: &PassRecorder) -> RenderResult<()> {
        if self.open {
            return Err(RenderError::RenderingFailed(format!(
                "shadow target {:?} is already bound",
                self.id
            )));
        }
        self.open = true;
        recorder.push(PassEvent::Begin {
            target: self.id,
            size: self.size,
            clear_depth: 1.0,
        });
        Ok(())
    }

    fn end_depth_pass(&mut self, recorder: &PassRecorder) {
        self.open = false;
        self.completed_passes += 1;
        recorder.push(PassEvent::End { target: self.id });
    }

    fn depth_texture(&self) -> HeadlessTextureId {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::shadow::DepthPass;

    #[test]
    fn targets_get_distinct_ids() {
        let mut backend = HeadlessShadowBackend::new();
        let a = backend.create_target(64).unwrap();
        let b = backend.create_target(64).unwrap();

        assert_ne!(a.depth_texture(), b.depth_texture());
        assert_eq!(backend.target_count(), 2);
        assert_eq!(backend.allocated_bytes(), 2 * 64 * 64 * 4);
    }

    #[test]
    fn budget_exhaustion_fails_allocation() {
        let mut backend = HeadlessShadowBackend::with_memory_budget(512 * 512 * 4);
        assert!(backend.create_target(512).is_ok());
        assert!(matches!(
            backend.create_target(512),
            Err(RenderError::ResourceCreationFailed(_))
        ));
    }

    #[test]
    fn zero_size_is_rejected() {
        let mut backend = HeadlessShadowBackend::new();
        assert!(backend.create_target(0).is_err());
    }

    #[test]
    fn depth_pass_guard_closes_on_drop() {
        let mut backend = HeadlessShadowBackend::new();
        let mut target = backend.create_target(128).unwrap();
        let recorder = PassRecorder::new();

        {
            let pass = DepthPass::begin(&mut target, &recorder).unwrap();
            assert_eq!(pass.size(), 128);
            pass.recorder().draw("scene");
        }

        assert!(!target.is_bound());
        assert_eq!(target.completed_passes(), 1);
        assert_eq!(
            recorder.events(),
            vec![
                PassEvent::Begin { target: HeadlessTextureId(0), size: 128, clear_depth: 1.0 },
                PassEvent::Draw { label: "scene".to_string() },
                PassEvent::End { target: HeadlessTextureId(0) },
            ]
        );
    }
}
