//! Per-session state of the viewer
//!
//! Everything the frame loop mutates lives in one [`ViewerContext`]: the
//! camera, every shadow-casting light and the user toggles. It is created at
//! startup, fed one [`ViewerContext::update_frame`] per frame and dropped at
//! shutdown.

use crate::core::config::ViewerConfig;
use crate::foundation::bounds::{transform_bounding_box, Aabb};
use crate::foundation::math::{Mat4, Point3, Vec3};
use crate::lighting::{is_daytime, HeadlightOptics, Headlights, LampCone, LampGroup};
use crate::render::primitives::{CameraControls, Direction};
use crate::render::shadow::uniforms::names;
use crate::render::shadow::{
    DepthPass, DepthTextureBinding, DirectionalProjector, LightProjector, ShadowBackend,
    ShadowTarget, UniformSink,
};
use crate::render::RenderResult;
use crate::viewer::input::ViewerCommand;

/// The camera never sinks below this height in normalized world units
pub const MIN_EYE_HEIGHT: f32 = 0.01;

/// A light whose shadow map is rendered this frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShadowCaster {
    /// Headlight 0 (left) or 1 (right)
    Headlight(usize),
    /// The sun
    Sun,
    /// The `i`th active lamp
    Lamp(usize),
}

/// Static scene input, in scene units
#[derive(Debug, Clone)]
pub struct SceneLayout {
    /// Box around all static geometry
    pub bounds: Aabb,
    /// Light position of every lamp post
    pub lamp_positions: Vec<Vec3>,
}

impl SceneLayout {
    /// Map scene units into a world of unit diagonal centered on the origin
    pub fn normalization(&self) -> (Vec3, f32) {
        let diagonal = self.bounds.diagonal();
        assert!(
            !self.bounds.is_empty() && diagonal > 0.0,
            "scene bounds must enclose some volume"
        );
        (self.bounds.center().coords, 1.0 / diagonal)
    }
}

/// Camera, lights and toggles of one viewing session
pub struct ViewerContext<T: ShadowTarget> {
    config: ViewerConfig,
    scene_to_world: Mat4,
    camera: CameraControls,
    sun: DirectionalProjector<T>,
    lamps: LampGroup<T>,
    headlights: Headlights<T>,
    daytime: bool,
    draw_shadows: bool,
    sun_enabled: bool,
    lamp_user: bool,
    headlight_user: bool,
    fine_movement: bool,
    debug_view: bool,
    time_step: bool,
}

impl<T: ShadowTarget> ViewerContext<T> {
    /// Allocate every light's shadow map and place the camera
    ///
    /// The scene is rescaled to unit diagonal around its center. Lamps use
    /// texture units from `lamp_texture_slot_base` on; the two headlights
    /// take the next two.
    pub fn new<B>(
        backend: &mut B,
        config: ViewerConfig,
        scene: &SceneLayout,
        sun_direction: Vec3,
    ) -> RenderResult<Self>
    where
        B: ShadowBackend<Target = T>,
    {
        let (center, scale) = scene.normalization();
        let scene_to_world = Mat4::new_scaling(scale) * Mat4::new_translation(&(-center));

        let world_bounds = transform_bounding_box(&scene.bounds, &scene_to_world);
        let sun = DirectionalProjector::new(
            backend,
            world_bounds,
            config.shadows.sun_shadowmap_size,
            sun_direction,
        )?;

        let lamp_positions: Vec<Vec3> = scene
            .lamp_positions
            .iter()
            .map(|p| scene_to_world.transform_point(&Point3::from(*p)).coords)
            .collect();
        let lamps = LampGroup::new(
            backend,
            &lamp_positions,
            LampCone::from_config(&config.lighting),
            config.shadows.lamp_shadowmap_size,
            config.shadows.lamp_texture_slot_base,
        )?;

        let headlight_base = config.shadows.lamp_texture_slot_base + lamp_positions.len() as u32;
        let headlights = Headlights::new(
            backend,
            HeadlightOptics::from_config(&config.lighting),
            center,
            scale,
            config.shadows.headlight_shadowmap_size,
            [headlight_base, headlight_base + 1],
        )?;

        let camera = CameraControls::from_config(&config.camera);
        log::info!(
            "Viewer ready: {} lamps, scene scale {:.4}, camera at {:?}",
            lamps.size(),
            scale,
            camera.position()
        );

        let mut context = Self {
            config,
            scene_to_world,
            camera,
            sun,
            lamps,
            headlights,
            daytime: is_daytime(&sun_direction),
            draw_shadows: true,
            sun_enabled: true,
            lamp_user: false,
            headlight_user: false,
            fine_movement: false,
            debug_view: false,
            time_step: true,
        };
        context.update_frame(sun_direction, &Mat4::identity());
        Ok(context)
    }

    /// Apply this frame's sun direction and car pose, then switch lights
    ///
    /// Must run before any light matrix is read for the frame. `car_frame`
    /// is the chassis pose in scene units.
    pub fn update_frame(&mut self, sun_direction: Vec3, car_frame: &Mat4) {
        self.sun.set_direction(sun_direction);
        self.headlights.set_car_frame(car_frame);

        let lighting = &self.config.lighting;
        self.lamps.set_sunlight_switch(sun_direction, lighting.lamp_nighttime_threshold());
        self.headlights
            .set_sunlight_switch(sun_direction, lighting.headlight_nighttime_threshold());
        self.lamps.set_user_switch(self.lamp_user);
        self.headlights.set_user_switch(self.headlight_user);

        let daytime = is_daytime(&sun_direction);
        if daytime != self.daytime {
            log::debug!("{}", if daytime { "Sunrise" } else { "Sunset" });
        }
        self.daytime = daytime;
    }

    /// React to one unit of input
    pub fn handle_command(&mut self, command: ViewerCommand) {
        match command {
            ViewerCommand::Step { direction, delta_time } => {
                if direction == Direction::Down && self.camera.position().y <= MIN_EYE_HEIGHT {
                    return;
                }
                self.camera.step(direction, delta_time);
            }
            ViewerCommand::MouseLook { x, y } => self.camera.mouse_look(x, y),
            ViewerCommand::ToggleFineMovement => {
                self.fine_movement = !self.fine_movement;
                let camera = &self.config.camera;
                let speed = if self.fine_movement { camera.slow_speed } else { camera.fast_speed };
                self.camera.set_speed(speed);
            }
            ViewerCommand::ToggleDebugView => self.debug_view = !self.debug_view,
            ViewerCommand::ToggleTimeStep => {
                self.time_step = !self.time_step;
                log::info!("Day clock {}", if self.time_step { "running" } else { "paused" });
            }
            ViewerCommand::ToggleLampUser => {
                self.lamp_user = !self.lamp_user;
                self.lamps.set_user_switch(self.lamp_user);
            }
            ViewerCommand::ToggleHeadlightUser => {
                self.headlight_user = !self.headlight_user;
                self.headlights.set_user_switch(self.headlight_user);
            }
            ViewerCommand::ToggleSun => {
                self.sun_enabled = !self.sun_enabled;
                log::info!("Sunlight {}", if self.sun_enabled { "enabled" } else { "disabled" });
            }
            ViewerCommand::ToggleShadows => {
                self.draw_shadows = !self.draw_shadows;
                log::info!("Shadows {}", if self.draw_shadows { "enabled" } else { "disabled" });
            }
            ViewerCommand::ToggleLamp(slot) => {
                if slot < self.lamps.size() {
                    self.lamps.toggle(slot);
                } else {
                    log::warn!("No lamp post in slot {} (have {})", slot, self.lamps.size());
                }
            }
        }
    }

    /// Lights to render shadow maps for this frame, in render order
    pub fn shadow_casters(&self) -> Vec<ShadowCaster> {
        let mut casters = Vec::new();
        if !self.draw_shadows {
            return casters;
        }
        if self.headlights.is_on() {
            casters.extend([ShadowCaster::Headlight(0), ShadowCaster::Headlight(1)]);
        }
        if self.sun_enabled && self.daytime {
            casters.push(ShadowCaster::Sun);
        }
        if self.lamps.is_on() {
            casters.extend((0..self.lamps.active_count()).map(ShadowCaster::Lamp));
        }
        casters
    }

    /// Light matrix of `caster`
    pub fn light_matrix(&self, caster: ShadowCaster) -> Mat4 {
        match caster {
            ShadowCaster::Headlight(i) => self.headlights.light_matrix(i),
            ShadowCaster::Sun => self.sun.light_matrix(),
            ShadowCaster::Lamp(i) => self.lamps.light_matrix(i),
        }
    }

    /// Render `caster`'s shadow map
    ///
    /// Opens the caster's depth pass and hands `draw` the light matrix to
    /// render the scene with. The pass ends when `draw` returns.
    pub fn render_shadow_pass<F>(
        &mut self,
        caster: ShadowCaster,
        recorder: &T::Recorder,
        draw: F,
    ) -> RenderResult<()>
    where
        F: FnOnce(&Mat4, &DepthPass<'_, T>),
    {
        let light_matrix = self.light_matrix(caster);
        let pass = match caster {
            ShadowCaster::Headlight(i) => self.headlights.bind_render_target(i, recorder)?,
            ShadowCaster::Sun => self.sun.bind_render_target(recorder)?,
            ShadowCaster::Lamp(i) => self.lamps.bind_render_target(i, recorder)?,
        };
        draw(&light_matrix, &pass);
        Ok(())
    }

    /// Depth texture of `caster` at the texture unit the lit pass samples
    pub fn bind_depth_texture(&self, caster: ShadowCaster) -> DepthTextureBinding<T::Texture> {
        match caster {
            ShadowCaster::Headlight(i) => {
                self.headlights.bind_depth_texture(i, self.headlights.texture_slot(i))
            }
            ShadowCaster::Sun => self.sun.bind_depth_texture(self.config.shadows.sun_texture_slot),
            ShadowCaster::Lamp(i) => self.lamps.bind_depth_texture(i),
        }
    }

    /// Upload every light's uniforms and the state flags for the lit pass
    pub fn upload_lit_uniforms(&self, sink: &mut dyn UniformSink) {
        self.sun.update_light_direction_uniform(sink, names::SUN_DIRECTION);
        self.sun.update_light_matrix_uniform(sink, names::SUN_MATRIX);
        sink.set_i32(names::SUN_SHADOWMAP, self.config.shadows.sun_texture_slot as i32);
        sink.set_i32(names::SUN_SHADOWMAP_SIZE, self.config.shadows.sun_shadowmap_size as i32);

        self.lamps.upload_uniforms(sink);
        self.headlights.upload_uniforms(sink);

        sink.set_bool(names::DRAW_SHADOWS, self.draw_shadows);
        sink.set_bool(names::SUN_STATE, self.sun_enabled);
        sink.set_bool(names::LAMP_STATE, self.lamps.is_on());
        sink.set_bool(names::HEADLIGHT_STATE, self.headlights.is_on());
    }

    /// Light matrices to outline as frusta while the debug view is on
    pub fn debug_frusta(&self) -> Vec<(ShadowCaster, Mat4)> {
        if !self.debug_view {
            return Vec::new();
        }
        let mut frusta = vec![(ShadowCaster::Sun, self.sun.light_matrix())];
        if self.lamps.is_on() {
            frusta.extend(
                (0..self.lamps.active_count())
                    .map(|i| (ShadowCaster::Lamp(i), self.lamps.light_matrix(i))),
            );
        }
        if self.headlights.is_on() {
            frusta.extend(
                (0..2).map(|i| (ShadowCaster::Headlight(i), self.headlights.light_matrix(i))),
            );
        }
        frusta
    }

    /// View matrix of the free-look camera
    pub fn view_matrix(&self) -> Mat4 {
        self.camera.matrix()
    }

    /// Scene units to normalized world
    pub fn scene_to_world(&self) -> &Mat4 {
        &self.scene_to_world
    }

    /// The camera
    pub fn camera(&self) -> &CameraControls {
        &self.camera
    }

    /// The sun
    pub fn sun(&self) -> &DirectionalProjector<T> {
        &self.sun
    }

    /// The street lamps
    pub fn lamps(&self) -> &LampGroup<T> {
        &self.lamps
    }

    /// The car's headlights
    pub fn headlights(&self) -> &Headlights<T> {
        &self.headlights
    }

    /// Whether the sun is at or above the horizon
    pub fn is_daytime(&self) -> bool {
        self.daytime
    }

    /// Whether shadow maps are rendered at all
    pub fn draw_shadows(&self) -> bool {
        self.draw_shadows
    }

    /// Whether the sun contributes light
    pub fn sun_enabled(&self) -> bool {
        self.sun_enabled
    }

    /// Whether the camera moves at the slow speed
    pub fn fine_movement(&self) -> bool {
        self.fine_movement
    }

    /// Whether light frusta are drawn
    pub fn debug_view(&self) -> bool {
        self.debug_view
    }

    /// Whether the host should advance its day clock
    pub fn time_step(&self) -> bool {
        self.time_step
    }

    /// The configuration the context was built from
    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::backends::headless::{
        HeadlessShadowBackend, HeadlessShadowTarget, PassEvent, PassRecorder,
    };
    use crate::render::shadow::RecordingSink;
    use approx::assert_relative_eq;

    const NOON: Vec3 = Vec3::new(0.0, 1.0, 0.0);
    const MIDNIGHT: Vec3 = Vec3::new(0.0, -1.0, 0.0);

    fn scene() -> SceneLayout {
        SceneLayout {
            bounds: Aabb::new(Point3::new(-10.0, 0.0, -10.0), Point3::new(10.0, 2.0, 10.0)),
            lamp_positions: vec![
                Vec3::new(-5.0, 2.0, -5.0),
                Vec3::new(5.0, 2.0, -5.0),
                Vec3::new(5.0, 2.0, 5.0),
                Vec3::new(-5.0, 2.0, 5.0),
            ],
        }
    }

    fn context(sun: Vec3) -> ViewerContext<HeadlessShadowTarget> {
        let mut backend = HeadlessShadowBackend::new();
        ViewerContext::new(&mut backend, ViewerConfig::default(), &scene(), sun).unwrap()
    }

    #[test]
    fn every_light_gets_its_own_target() {
        let mut backend = HeadlessShadowBackend::new();
        ViewerContext::new(&mut backend, ViewerConfig::default(), &scene(), NOON).unwrap();
        assert_eq!(backend.target_count(), 1 + 4 + 2);
    }

    #[test]
    fn allocation_failure_is_reported() {
        let mut backend = HeadlessShadowBackend::with_memory_budget(1024);
        let result = ViewerContext::new(&mut backend, ViewerConfig::default(), &scene(), NOON);
        assert!(matches!(result, Err(crate::render::RenderError::ResourceCreationFailed(_))));
    }

    #[test]
    fn noon_renders_only_the_sun() {
        let mut viewer = context(NOON);
        viewer.handle_command(ViewerCommand::ToggleLamp(1));
        assert!(viewer.is_daytime());
        assert_eq!(viewer.shadow_casters(), vec![ShadowCaster::Sun]);
    }

    #[test]
    fn midnight_renders_headlights_then_active_lamps() {
        let mut viewer = context(NOON);
        viewer.handle_command(ViewerCommand::ToggleLamp(2));
        viewer.handle_command(ViewerCommand::ToggleLamp(0));
        viewer.update_frame(MIDNIGHT, &Mat4::identity());

        assert_eq!(
            viewer.shadow_casters(),
            vec![
                ShadowCaster::Headlight(0),
                ShadowCaster::Headlight(1),
                ShadowCaster::Lamp(0),
                ShadowCaster::Lamp(1),
            ]
        );
        assert_eq!(viewer.lamps().active_lamps(), &[2, 0]);
    }

    #[test]
    fn shadow_toggle_gates_every_caster() {
        let mut viewer = context(MIDNIGHT);
        viewer.handle_command(ViewerCommand::ToggleLamp(0));
        viewer.handle_command(ViewerCommand::ToggleShadows);
        assert!(viewer.shadow_casters().is_empty());

        viewer.handle_command(ViewerCommand::ToggleShadows);
        assert!(!viewer.shadow_casters().is_empty());
    }

    #[test]
    fn disabled_sun_casts_nothing() {
        let mut viewer = context(NOON);
        viewer.handle_command(ViewerCommand::ToggleSun);
        assert!(viewer.shadow_casters().is_empty());
    }

    #[test]
    fn user_override_adds_lamps_by_day() {
        let mut viewer = context(NOON);
        viewer.handle_command(ViewerCommand::ToggleLamp(3));
        viewer.handle_command(ViewerCommand::ToggleLampUser);
        assert_eq!(viewer.shadow_casters(), vec![ShadowCaster::Sun, ShadowCaster::Lamp(0)]);

        // Still on after the next frame re-applies the sun switch
        viewer.update_frame(NOON, &Mat4::identity());
        assert!(viewer.lamps().is_on());
    }

    #[test]
    fn low_sun_turns_lamps_on_before_headlights() {
        let mut viewer = context(NOON);
        // 10 degrees above the horizon
        let angle = 10.0f32.to_radians();
        viewer.update_frame(Vec3::new(angle.cos(), angle.sin(), 0.0), &Mat4::identity());
        assert!(viewer.lamps().is_on());
        assert!(!viewer.headlights().is_on());
        assert!(viewer.is_daytime());
    }

    #[test]
    fn car_pose_applies_before_matrices_are_read() {
        let mut viewer = context(MIDNIGHT);
        let before = viewer.light_matrix(ShadowCaster::Headlight(0));
        let moved = Mat4::new_translation(&Vec3::new(4.0, 0.0, 0.0));
        viewer.update_frame(MIDNIGHT, &moved);

        assert!((viewer.light_matrix(ShadowCaster::Headlight(0)) - before).norm() > 1e-3);
        assert_eq!(
            viewer.light_matrix(ShadowCaster::Headlight(1)),
            viewer.headlights().light_matrix(1)
        );
    }

    #[test]
    fn shadow_pass_hands_out_the_light_matrix() {
        let mut viewer = context(NOON);
        let recorder = PassRecorder::new();
        let expected = viewer.sun().light_matrix();

        let mut seen = None;
        viewer
            .render_shadow_pass(ShadowCaster::Sun, &recorder, |matrix, pass| {
                seen = Some(*matrix);
                pass.recorder().draw("scene");
            })
            .unwrap();

        assert_eq!(seen, Some(expected));
        let events = recorder.events();
        assert_eq!(events.len(), 3);
        assert!(matches!(events[0], PassEvent::Begin { size: 2048, .. }));
        assert!(matches!(events[2], PassEvent::End { .. }));
    }

    #[test]
    fn texture_units_follow_the_pool() {
        let mut viewer = context(MIDNIGHT);
        viewer.handle_command(ViewerCommand::ToggleLamp(3));
        let base = viewer.config().shadows.lamp_texture_slot_base;

        assert_eq!(viewer.bind_depth_texture(ShadowCaster::Lamp(0)).slot, base + 3);
        assert_eq!(viewer.bind_depth_texture(ShadowCaster::Headlight(0)).slot, base + 4);
        assert_eq!(viewer.bind_depth_texture(ShadowCaster::Headlight(1)).slot, base + 5);
        assert_eq!(
            viewer.bind_depth_texture(ShadowCaster::Sun).slot,
            viewer.config().shadows.sun_texture_slot
        );
    }

    #[test]
    fn lit_uniforms_carry_state_flags() {
        let mut viewer = context(MIDNIGHT);
        viewer.handle_command(ViewerCommand::ToggleLamp(1));
        viewer.handle_command(ViewerCommand::ToggleSun);

        let mut sink = RecordingSink::new();
        viewer.upload_lit_uniforms(&mut sink);

        assert_eq!(sink.f32(names::DRAW_SHADOWS), Some(1.0));
        assert_eq!(sink.f32(names::SUN_STATE), Some(0.0));
        assert_eq!(sink.f32(names::LAMP_STATE), Some(1.0));
        assert_eq!(sink.f32(names::HEADLIGHT_STATE), Some(1.0));
        assert_eq!(sink.i32(names::LAMP_COUNT), Some(1));
        assert_eq!(sink.mat4(names::SUN_MATRIX), Some(viewer.sun().light_matrix()));
        assert_eq!(sink.mat4_array(names::HEADLIGHT_MATRICES).map(<[Mat4]>::len), Some(2));
    }

    #[test]
    fn fine_movement_slows_the_camera() {
        let mut viewer = context(NOON);
        viewer.handle_command(ViewerCommand::ToggleFineMovement);
        assert!(viewer.fine_movement());
        assert_eq!(viewer.camera().speed(), viewer.config().camera.slow_speed);

        viewer.handle_command(ViewerCommand::ToggleFineMovement);
        assert_eq!(viewer.camera().speed(), viewer.config().camera.fast_speed);
    }

    #[test]
    fn camera_stops_at_minimum_height() {
        let mut viewer = context(NOON);
        let start = viewer.camera().position();
        viewer.handle_command(ViewerCommand::Step { direction: Direction::Down, delta_time: 100.0 });
        let low = viewer.camera().position();
        assert!(low.y < start.y);

        viewer.handle_command(ViewerCommand::Step { direction: Direction::Down, delta_time: 1.0 });
        assert_eq!(viewer.camera().position(), low);
    }

    #[test]
    fn scene_is_rescaled_to_unit_diagonal() {
        let viewer = context(NOON);
        let bounds = viewer.sun().scene_bounds();
        assert_relative_eq!(bounds.diagonal(), 1.0, epsilon = 1e-5);
        assert_relative_eq!(bounds.center().coords, Vec3::zeros(), epsilon = 1e-6);
    }

    #[test]
    fn debug_frusta_follow_the_toggle() {
        let mut viewer = context(MIDNIGHT);
        assert!(viewer.debug_frusta().is_empty());

        viewer.handle_command(ViewerCommand::ToggleDebugView);
        let frusta = viewer.debug_frusta();
        assert_eq!(frusta.len(), 3);
        assert_eq!(frusta[0].0, ShadowCaster::Sun);
    }
}
