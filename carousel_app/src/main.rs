//! Headless carousel viewer
//!
//! Runs the lighting subsystem through a few simulated days without opening a
//! window: the sun circles the scene, a car laps the track and the shadow
//! passes are recorded into a command log instead of a GPU queue.
//!
//! Usage: `carousel_viewer [config.toml|config.ron]`

use std::time::Duration;

use carousel_engine::foundation::logging;
use carousel_engine::foundation::math::constants::PI;
use carousel_engine::prelude::*;
use carousel_engine::render::shadow::uniforms::casters_as_bytes;
use thiserror::Error;

/// Simulated frame rate
const FRAME_TIME: Duration = Duration::from_millis(33);

/// Seconds of simulated time per full day
const DAY_LENGTH: f32 = 20.0;

/// Seconds the car needs for one lap
const LAP_TIME: f32 = 7.5;

/// Number of days to simulate
const DAYS: f32 = 2.0;

/// Radius of the car's lap in scene units
const TRACK_RADIUS: f32 = 60.0;

/// Lamp posts stand just outside the track
const LAMP_RADIUS: f32 = 70.0;
const LAMP_COUNT: usize = 12;
const LAMP_HEIGHT: f32 = 8.0;

#[derive(Error, Debug)]
enum AppError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("render error: {0}")]
    Render(#[from] RenderError),
}

/// Day clock driving the sun around the X axis
struct DayClock {
    time: f32,
}

impl DayClock {
    /// Start at sunrise
    fn new() -> Self {
        Self { time: 0.0 }
    }

    fn advance(&mut self, delta_time: f32) {
        self.time += delta_time;
    }

    /// Direction toward the sun; tilted south so it never crosses the zenith exactly
    fn sun_direction(&self) -> Vec3 {
        let angle = 2.0 * PI * self.time / DAY_LENGTH;
        Vec3::new(angle.cos(), angle.sin(), 0.3).normalize()
    }
}

/// Chassis pose of a car lapping the track counter-clockwise, in scene units
fn car_frame(time: f32) -> Mat4 {
    let angle = 2.0 * PI * time / LAP_TIME;
    let position = Vec3::new(TRACK_RADIUS * angle.cos(), 0.0, -TRACK_RADIUS * angle.sin());
    // The car faces -Z in its own frame; turn it along the tangent
    Mat4::new_translation(&position) * Mat4::rotation_y(angle)
}

fn scene_layout() -> SceneLayout {
    let lamp_positions = (0..LAMP_COUNT)
        .map(|i| {
            let angle = 2.0 * PI * i as f32 / LAMP_COUNT as f32;
            Vec3::new(LAMP_RADIUS * angle.cos(), LAMP_HEIGHT, LAMP_RADIUS * angle.sin())
        })
        .collect();

    SceneLayout {
        bounds: Aabb::new(Point3::new(-80.0, -1.0, -80.0), Point3::new(80.0, 12.0, 80.0)),
        lamp_positions,
    }
}

fn load_config() -> Result<ViewerConfig, AppError> {
    let config = match std::env::args().nth(1) {
        Some(path) => {
            log::info!("Loading configuration from {}", path);
            ViewerConfig::load_or_default(&path)?
        }
        None => ViewerConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

fn run() -> Result<(), AppError> {
    let config = load_config()?;
    let mut clock = DayClock::new();
    let mut backend = HeadlessShadowBackend::new();
    let mut viewer =
        ViewerContext::new(&mut backend, config, &scene_layout(), clock.sun_direction())?;
    log::info!(
        "Allocated {} shadow maps ({:.1} MiB)",
        backend.target_count(),
        backend.allocated_bytes() as f64 / (1024.0 * 1024.0)
    );

    // Every third lamp post has a working bulb
    for slot in (0..LAMP_COUNT).step_by(3) {
        viewer.handle_command(ViewerCommand::ToggleLamp(slot));
    }

    let recorder = PassRecorder::new();
    let mut uniforms = RecordingSink::new();
    let mut timer = Timer::new();
    let mut stopwatch = Stopwatch::new();
    let mut previous_casters = Vec::new();
    let mut total_passes = 0usize;
    stopwatch.start();

    while timer.total_time() < DAYS * DAY_LENGTH {
        timer.advance(FRAME_TIME);
        let delta_time = timer.delta_time();

        // A slow walk forward while turning left
        if let Some(step) = ViewerCommand::from_key_held(KeyCode::W, delta_time) {
            viewer.handle_command(step);
        }
        let pan = (timer.frame_count() % 600) as f64 / 600.0;
        viewer.handle_command(ViewerCommand::MouseLook { x: 1.0 - pan, y: 0.5 });

        // Headlights forced on for the second day
        if timer.frame_count() == (DAY_LENGTH / FRAME_TIME.as_secs_f32()) as u64 {
            if let Some(command) = ViewerCommand::from_key_press(KeyCode::J) {
                viewer.handle_command(command);
            }
        }

        if viewer.time_step() {
            clock.advance(delta_time);
        }
        viewer.update_frame(clock.sun_direction(), &car_frame(timer.total_time()));

        recorder.clear();
        let casters = viewer.shadow_casters();
        for &caster in &casters {
            viewer.render_shadow_pass(caster, &recorder, |light_matrix, pass| {
                let constants = DepthPushConstants::new(light_matrix);
                pass.recorder().draw(format!(
                    "scene for {:?} ({} bytes of push constants)",
                    caster,
                    constants.as_bytes().len()
                ));
            })?;
        }
        total_passes += recorder.pass_count();
        viewer.upload_lit_uniforms(&mut uniforms);
        let lamp_casters = viewer.lamps().gpu_casters();
        log::trace!("Lamp caster buffer: {} bytes", casters_as_bytes(&lamp_casters).len());

        if casters != previous_casters {
            log::info!(
                "t={:.1}s daytime={} lamps={} headlights={} casters={:?}",
                clock.time,
                viewer.is_daytime(),
                viewer.lamps().is_on(),
                viewer.headlights().is_on(),
                casters
            );
            previous_casters = casters;
        }
        log::trace!("View matrix {:?}", viewer.view_matrix());
    }

    stopwatch.stop();
    log::info!(
        "Simulated {} frames ({:.0} s) with {} shadow passes in {:.1} ms, {} uniforms per frame",
        timer.frame_count(),
        timer.total_time(),
        total_passes,
        stopwatch.elapsed_millis(),
        uniforms.len()
    );
    log::info!("Camera ended at {:?}", viewer.camera().position());
    Ok(())
}

fn main() {
    logging::init();

    if let Err(e) = run() {
        log::error!("Viewer failed: {}", e);
        std::process::exit(1);
    }
}
