//! Shared state of every shadow-casting light

use crate::foundation::math::Mat4;
use crate::render::shadow::target::{DepthPass, DepthTextureBinding, ShadowBackend, ShadowTarget};
use crate::render::shadow::uniforms::UniformSink;
use crate::render::RenderResult;

/// View and projection of a light plus the depth target it renders into
///
/// The matrices are only ever replaced together by the owning light kind, so
/// [`Projector::light_matrix`] always reflects the latest pose.
pub struct Projector<T: ShadowTarget> {
    view: Mat4,
    projection: Mat4,
    shadowmap_size: u32,
    target: T,
}

impl<T: ShadowTarget> Projector<T> {
    /// Allocate the depth target; both matrices start as identity
    pub fn new<B>(backend: &mut B, shadowmap_size: u32) -> RenderResult<Self>
    where
        B: ShadowBackend<Target = T>,
    {
        let target = backend.create_target(shadowmap_size)?;
        Ok(Self {
            view: Mat4::identity(),
            projection: Mat4::identity(),
            shadowmap_size,
            target,
        })
    }

    /// `projection * view`
    pub fn light_matrix(&self) -> Mat4 {
        self.projection * self.view
    }

    /// World to light view space
    pub fn view_matrix(&self) -> &Mat4 {
        &self.view
    }

    /// Light view space to clip space
    pub fn projection_matrix(&self) -> &Mat4 {
        &self.projection
    }

    /// Side length of the shadow map, fixed at construction
    pub fn shadowmap_size(&self) -> u32 {
        self.shadowmap_size
    }

    /// The owned depth target
    pub fn target(&self) -> &T {
        &self.target
    }

    /// Open a depth pass on this light's target
    ///
    /// The target is cleared and the viewport covers the whole shadow map
    /// until the returned guard is dropped.
    pub fn bind_render_target<'a>(
        &'a mut self,
        recorder: &'a T::Recorder,
    ) -> RenderResult<DepthPass<'a, T>> {
        DepthPass::begin(&mut self.target, recorder)
    }

    /// Expose the depth texture for sampling at `slot`
    pub fn bind_depth_texture(&self, slot: u32) -> DepthTextureBinding<T::Texture> {
        DepthTextureBinding {
            slot,
            texture: self.target.depth_texture(),
        }
    }

    pub(crate) fn set_matrices(&mut self, view: Mat4, projection: Mat4) {
        self.view = view;
        self.projection = projection;
    }
}

/// Capability shared by every light kind that casts shadows
pub trait LightProjector {
    /// Render target type of the underlying projector
    type Target: ShadowTarget;

    /// Shared projector state
    fn projector(&self) -> &Projector<Self::Target>;

    /// Shared projector state, mutable
    fn projector_mut(&mut self) -> &mut Projector<Self::Target>;

    /// `projection * view` of the light's current pose
    fn light_matrix(&self) -> Mat4 {
        self.projector().light_matrix()
    }

    /// Open a depth pass on the light's target
    fn bind_render_target<'a>(
        &'a mut self,
        recorder: &'a <Self::Target as ShadowTarget>::Recorder,
    ) -> RenderResult<DepthPass<'a, Self::Target>>
    where
        Self::Target: 'a,
    {
        self.projector_mut().bind_render_target(recorder)
    }

    /// Expose the light's depth texture at `slot`
    fn bind_depth_texture(
        &self,
        slot: u32,
    ) -> DepthTextureBinding<<Self::Target as ShadowTarget>::Texture> {
        self.projector().bind_depth_texture(slot)
    }

    /// Upload the light matrix under `name`
    fn update_light_matrix_uniform(&self, sink: &mut dyn UniformSink, name: &str) {
        sink.set_mat4(name, &self.light_matrix());
    }
}

impl<T: ShadowTarget> LightProjector for Projector<T> {
    type Target = T;

    fn projector(&self) -> &Projector<T> {
        self
    }

    fn projector_mut(&mut self) -> &mut Projector<T> {
        self
    }
}
