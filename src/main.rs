mod cli;
mod error;
mod field;
mod framepace;
mod gpu;
mod gui;
mod particle;
mod render;
mod texture;
mod utils;
mod view;

use std::sync::Arc;

use clap::Parser;
use cli::FieldConfig;
use egui::Widget;
use error::SetupError;
use field::{check_particle_count, FieldModule, FieldParams};
use framepace::Framepacer;
use glam::Vec2;
use gpu::{GpuContext, SurfaceAction};
use gui::Overlay;
use log::{debug, error, info, warn};
use particle::{generate_particles, rng_for, upload_particles};
use rand::rngs::StdRng;
use render::RenderModule;
use texture::TextureImage;
use view::Camera;
use winit::{
    application::ApplicationHandler,
    event::{MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

fn main() -> anyhow::Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    // Collect Arguments
    let config = cli::Args::parse().config()?;

    // Setup Winit
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App {
        tokio_rt: tokio::runtime::Runtime::new()?,
        rng: rng_for(config.seed),
        scene: None,
        error: None,
        framepace: Framepacer::new(),
        camera: Camera::default(),

        is_right_click_pressed: false,
        mouse_position: Vec2::ZERO,
        surface_failures: 0,

        is_paused: false,
        step: false,
        regenerate: false,
        edited_particles: config.particles,
        framerate: config.framerate,
        time_scale: config.time_scale,

        config,
    };

    event_loop.run_app(&mut app)?;

    match app.error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// Keyboard bindings, ignored while an overlay text field has focus.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Shortcut {
    TogglePause,
    Step,
    Regenerate,
    ToggleFullscreen,
    Quit,
}

impl Shortcut {
    fn from_key(key: PhysicalKey) -> Option<Self> {
        let PhysicalKey::Code(code) = key else {
            return None;
        };

        Some(match code {
            KeyCode::Space => Self::TogglePause,
            KeyCode::KeyN => Self::Step,
            KeyCode::KeyR => Self::Regenerate,
            KeyCode::F11 => Self::ToggleFullscreen,
            KeyCode::Escape => Self::Quit,
            _ => return None,
        })
    }
}

/// Everything that exists once a window and a device do.
struct Scene {
    window: Arc<Window>,
    gpu: GpuContext<'static>,

    field: FieldModule,
    render: RenderModule,
    overlay: Overlay,
}

impl Scene {
    fn screen_size(&self) -> Vec2 {
        Vec2::new(self.gpu.config.width as f32, self.gpu.config.height as f32)
    }

    fn update_view(&self, camera: &Camera) {
        self.render
            .update_view(&self.gpu.queue, &camera.uniform(self.screen_size()));
    }

    /// Places every particle back at a fresh random spawn position.
    fn regenerate(&mut self, rng: &mut StdRng, config: &FieldConfig) {
        let particles =
            generate_particles(rng, self.field.particle_count(), config.spawn_area);
        upload_particles(&self.gpu.queue, &self.field, &particles);

        self.field.params.time = 0.0;
    }
}

struct App {
    config: FieldConfig,
    tokio_rt: tokio::runtime::Runtime,
    rng: StdRng,
    scene: Option<Scene>,
    error: Option<anyhow::Error>,
    framepace: Framepacer,
    camera: Camera,

    is_right_click_pressed: bool,
    mouse_position: Vec2,
    surface_failures: u32,

    is_paused: bool,
    step: bool,
    regenerate: bool,
    edited_particles: u32,
    framerate: u32,
    time_scale: f32,
}

impl App {
    fn create_scene(&mut self, event_loop: &ActiveEventLoop) -> Result<Scene, SetupError> {
        let window = Arc::new(
            event_loop.create_window(Window::default_attributes().with_title("Particle Field"))?,
        );

        let gpu = self.tokio_rt.block_on(GpuContext::new(window.clone()))?;
        check_particle_count(self.config.particles, &gpu.limits())?;

        let texture = TextureImage::load(self.config.texture.as_deref())?
            .upload(&gpu.device, &gpu.queue);

        let field = FieldModule::new(
            &gpu.device,
            FieldParams::new(self.config.particles, self.config.spawn_area),
        );
        let render = RenderModule::new(&gpu.device, gpu.config.format, &texture);

        let mut overlay = Overlay::new(&gpu.device, gpu.config.format);
        overlay.input.resize(gpu.config.width, gpu.config.height);

        let mut scene = Scene {
            window,
            gpu,
            field,
            render,
            overlay,
        };

        scene.regenerate(&mut self.rng, &self.config);
        self.camera = Camera::fit(self.config.spawn_area, scene.screen_size());
        scene.update_view(&self.camera);

        Ok(scene)
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        error!("{err:#}");
        self.error = Some(err);
        event_loop.exit();
    }

    fn frame(&mut self, event_loop: &ActiveEventLoop) {
        let Some(scene) = self.scene.as_mut() else {
            return;
        };

        let delta_time = self.framepace.begin_frame();

        if scene.gpu.is_minimized() {
            self.framepace.skip_frame(self.framerate);
            return;
        }

        let frame = match scene.gpu.surface.get_current_texture() {
            Ok(frame) => {
                self.surface_failures = 0;
                frame
            }
            Err(err) => {
                let action = SurfaceAction::from(&err);
                if action == SurfaceAction::Fatal {
                    self.fail(event_loop, err.into());
                    return;
                }

                if self.surface_failures == 0 {
                    warn!("Failed to acquire the next frame: {err}");
                } else {
                    debug!("Failed to acquire the next frame again: {err}");
                }
                self.surface_failures += 1;

                if action == SurfaceAction::Reconfigure {
                    scene.gpu.reconfigure_surface();
                }
                self.framepace.skip_frame(self.framerate);
                return;
            }
        };

        // Settings overlay
        let fps = self.framepace.framerate();
        let particle_count = scene.field.particle_count();
        let mut params = scene.field.params;
        scene.overlay.run(self.framepace.frametime(), |ctx| {
            egui::Window::new("Settings")
                .default_width(160.0)
                .show(ctx, |ui| {
                    ui.label(format!("FPS {:.1}", fps));
                    ui.checkbox(&mut self.is_paused, "Paused [Space]");
                    if ui.button("Step [N]").clicked() {
                        self.step = true;
                    }
                    egui::DragValue::new(&mut self.framerate)
                        .suffix(" Fixed FPS")
                        .ui(ui);
                    egui::DragValue::new(&mut self.time_scale)
                        .clamp_range(0.0..=10.0)
                        .speed(0.01)
                        .suffix(" Time Scale")
                        .ui(ui);
                });

            egui::Window::new("Field")
                .default_width(160.0)
                .show(ctx, |ui| {
                    ui.label(format!("{} particles", particle_count));
                    ui.add(egui::Slider::new(&mut params.stiffness, 0.0..=20.0).text("Stiffness"));
                    ui.add(egui::Slider::new(&mut params.damping, 0.5..=1.0).text("Damping"));
                    ui.add(egui::Slider::new(&mut params.swirl, 0.0..=400.0).text("Swirl"));

                    ui.separator();
                    egui::DragValue::new(&mut self.edited_particles)
                        .clamp_range(1..=u32::MAX)
                        .suffix(" Particles")
                        .ui(ui);
                    if ui.button("Regenerate [R]").clicked() {
                        self.regenerate = true;
                    }
                });
        });
        scene.field.params = params;

        if self.regenerate {
            self.regenerate = false;

            if self.edited_particles != particle_count {
                match check_particle_count(self.edited_particles, &scene.gpu.limits()) {
                    Ok(()) => {
                        info!("Resizing field to {} particles", self.edited_particles);
                        scene.field.resize(&scene.gpu.device, self.edited_particles);
                    }
                    Err(err) => {
                        warn!("{err}");
                        self.edited_particles = particle_count;
                    }
                }
            }

            scene.regenerate(&mut self.rng, &self.config);
            // Fill the vertex buffer even while paused
            self.step = true;
        }

        let mut encoder = scene
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None });

        // Compute
        if !self.is_paused || self.step {
            scene
                .field
                .update_time(&scene.gpu.queue, delta_time * self.time_scale);
            let _cpass = scene.field.begin_pass(&mut encoder);

            self.step = false;
        }

        scene
            .overlay
            .pre_render(&scene.gpu.device, &scene.gpu.queue, &mut encoder);

        // Render
        {
            let view = frame
                .texture
                .create_view(&wgpu::TextureViewDescriptor::default());

            let mut rpass = scene.render.begin_pass(
                &mut encoder,
                &view,
                scene.field.vertex_buffer(),
                scene.field.particle_count(),
            );

            scene.overlay.render(&mut rpass);
        }

        scene.gpu.queue.submit(Some(encoder.finish()));
        frame.present();

        self.framepace.end_frame(self.framerate);
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.scene.is_some() {
            return;
        }

        match self.create_scene(event_loop) {
            Ok(scene) => self.scene = Some(scene),
            Err(err) => self.fail(event_loop, err.into()),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        let Some(scene) = self.scene.as_mut() else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }

            WindowEvent::Resized(new_size) => {
                scene.gpu.resize(new_size.width, new_size.height);
                scene.overlay.input.resize(new_size.width, new_size.height);
                scene.update_view(&self.camera);
            }
            WindowEvent::KeyboardInput { event, .. } => {
                let typing = scene
                    .overlay
                    .key(&event.logical_key, event.state, event.repeat);
                if typing || !event.state.is_pressed() || event.repeat {
                    return;
                }

                let Some(shortcut) = Shortcut::from_key(event.physical_key) else {
                    return;
                };

                match shortcut {
                    Shortcut::TogglePause => self.is_paused = !self.is_paused,
                    Shortcut::Step => self.step = true,
                    Shortcut::Regenerate => self.regenerate = true,
                    Shortcut::ToggleFullscreen => {
                        if scene.window.fullscreen().is_none() {
                            scene
                                .window
                                .set_fullscreen(Some(winit::window::Fullscreen::Borderless(None)));
                        } else {
                            scene.window.set_fullscreen(None);
                        }
                    }
                    Shortcut::Quit => event_loop.exit(),
                }
            }
            WindowEvent::ModifiersChanged(modifiers) => {
                scene.overlay.input.modifiers(modifiers.state());
            }
            WindowEvent::MouseWheel { delta, .. } => {
                if scene.overlay.wants_pointer() {
                    return;
                }

                let scroll = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 20.0,
                };

                self.camera.zoom_by(scroll);
                scene.update_view(&self.camera);
            }
            WindowEvent::MouseInput { state, button, .. } => {
                let captured = scene.overlay.pointer_button(button, state);
                if button == MouseButton::Right {
                    self.is_right_click_pressed = state.is_pressed() && !captured;
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                let position = Vec2::new(position.x as f32, position.y as f32);
                if self.is_right_click_pressed {
                    self.camera.pan(position - self.mouse_position);
                    scene.update_view(&self.camera);
                }

                scene.overlay.input.pointer_moved(position);
                self.mouse_position = position;
            }

            _ => (),
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        self.frame(event_loop);
    }
}

#[cfg(test)]
mod tests {
    use winit::keyboard::NativeKeyCode;

    use super::*;

    #[test]
    fn documented_keys_map_to_shortcuts() {
        let cases = [
            (KeyCode::Space, Shortcut::TogglePause),
            (KeyCode::KeyN, Shortcut::Step),
            (KeyCode::KeyR, Shortcut::Regenerate),
            (KeyCode::F11, Shortcut::ToggleFullscreen),
            (KeyCode::Escape, Shortcut::Quit),
        ];

        for (code, shortcut) in cases {
            assert_eq!(Shortcut::from_key(PhysicalKey::Code(code)), Some(shortcut));
        }
    }

    #[test]
    fn other_keys_are_not_shortcuts() {
        assert_eq!(Shortcut::from_key(PhysicalKey::Code(KeyCode::KeyQ)), None);
        assert_eq!(
            Shortcut::from_key(PhysicalKey::Unidentified(NativeKeyCode::Unidentified)),
            None
        );
    }
}
