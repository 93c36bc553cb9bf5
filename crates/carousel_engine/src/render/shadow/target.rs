//! Shadow map render targets
//!
//! A shadow target is a square depth-only image a light renders the scene
//! into and the lit pass later samples. The lighting code never talks to the
//! graphics API directly: it allocates targets through a [`ShadowBackend`]
//! and drives them through [`ShadowTarget`]. Implementations live under
//! `render::backends`.

use crate::render::RenderResult;

/// Allocates shadow map render targets
pub trait ShadowBackend {
    /// Concrete render target type produced by this backend
    type Target: ShadowTarget;

    /// Allocate a `size` x `size` depth render target
    ///
    /// Failure is fatal for the light being built; callers surface it and
    /// abort construction rather than retrying.
    fn create_target(&mut self, size: u32) -> RenderResult<Self::Target>;
}

/// A depth render target exclusively owned by one light
pub trait ShadowTarget {
    /// Whatever the backend records draw commands into
    type Recorder: ?Sized;

    /// Handle the lit pass uses to sample the depth texture
    type Texture: Copy + std::fmt::Debug;

    /// Side length in texels, fixed for the target's lifetime
    fn size(&self) -> u32;

    /// Make this the active draw target, clear depth and set a full viewport
    fn begin_depth_pass(&mut self, recorder: &Self::Recorder) -> RenderResult<()>;

    /// Finish the pass started by [`ShadowTarget::begin_depth_pass`]
    fn end_depth_pass(&mut self, recorder: &Self::Recorder);

    /// Sampling handle for the depth texture
    fn depth_texture(&self) -> Self::Texture;
}

/// Scoped binding of a shadow target as the active draw target
///
/// The depth pass stays open until the guard is dropped.
#[must_use = "the depth pass ends as soon as the guard is dropped"]
pub struct DepthPass<'a, T: ShadowTarget> {
    target: &'a mut T,
    recorder: &'a T::Recorder,
}

impl<'a, T: ShadowTarget> DepthPass<'a, T> {
    pub(crate) fn begin(target: &'a mut T, recorder: &'a T::Recorder) -> RenderResult<Self> {
        target.begin_depth_pass(recorder)?;
        Ok(Self { target, recorder })
    }

    /// Viewport side length of the open pass
    pub fn size(&self) -> u32 {
        self.target.size()
    }

    /// Recorder the pass was opened on, for the caller's draw calls
    pub fn recorder(&self) -> &T::Recorder {
        self.recorder
    }
}

impl<T: ShadowTarget> Drop for DepthPass<'_, T> {
    fn drop(&mut self) {
        self.target.end_depth_pass(self.recorder);
    }
}

/// A depth texture exposed to the lit pass at a given texture unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepthTextureBinding<H> {
    /// Texture unit the shader samples from
    pub slot: u32,
    /// Backend handle of the depth texture
    pub texture: H,
}
