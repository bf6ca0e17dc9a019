//! egui overlay drawn on top of the particle field.

use glam::Vec2;
use winit::{
    event::{ElementState, MouseButton},
    keyboard::{Key, ModifiersState, NamedKey},
};

/// Window events translated into egui input, collected between frames.
#[derive(Default)]
pub struct OverlayInput {
    raw_input: egui::RawInput,
    modifiers: egui::Modifiers,
    pointer: Option<egui::Pos2>,
}

impl OverlayInput {
    pub fn resize(&mut self, width: u32, height: u32) {
        self.raw_input.screen_rect = Some(egui::Rect::from_min_size(
            egui::Pos2::ZERO,
            egui::vec2(width as f32, height as f32),
        ));
    }

    pub fn modifiers(&mut self, state: ModifiersState) {
        self.modifiers = egui::Modifiers {
            alt: state.alt_key(),
            ctrl: state.control_key(),
            shift: state.shift_key(),
            mac_cmd: state.super_key(),
            command: state.control_key() | state.super_key(),
        };
    }

    pub fn pointer_moved(&mut self, position: Vec2) {
        let pos = egui::pos2(position.x, position.y);
        self.pointer = Some(pos);
        self.raw_input.events.push(egui::Event::PointerMoved(pos));
    }

    pub fn pointer_button(&mut self, button: MouseButton, state: ElementState) {
        let button = match button {
            MouseButton::Left => egui::PointerButton::Primary,
            MouseButton::Right => egui::PointerButton::Secondary,
            MouseButton::Middle => egui::PointerButton::Middle,
            _ => return,
        };

        self.raw_input.events.push(egui::Event::PointerButton {
            pos: self.pointer.unwrap_or(egui::Pos2::ZERO),
            button,
            pressed: state.is_pressed(),
            modifiers: self.modifiers,
        });
    }

    /// Typed characters become text, editing keys become key presses.
    pub fn key(&mut self, key: &Key, state: ElementState, repeat: bool) {
        let pressed = state.is_pressed();
        let key = match key {
            Key::Character(text) => {
                if pressed {
                    self.raw_input.events.push(egui::Event::Text(text.to_string()));
                }
                return;
            }
            Key::Named(named) => match editing_key(*named) {
                Some(key) => key,
                None => return,
            },
            _ => return,
        };

        self.raw_input.events.push(egui::Event::Key {
            key,
            physical_key: None,
            pressed,
            repeat,
            modifiers: self.modifiers,
        });
    }

    fn take(&mut self, predicted_dt: f32) -> egui::RawInput {
        self.raw_input.predicted_dt = predicted_dt;
        self.raw_input.modifiers = self.modifiers;
        std::mem::take(&mut self.raw_input)
    }
}

fn editing_key(key: NamedKey) -> Option<egui::Key> {
    Some(match key {
        NamedKey::Backspace => egui::Key::Backspace,
        NamedKey::Delete => egui::Key::Delete,
        NamedKey::Enter => egui::Key::Enter,
        NamedKey::Escape => egui::Key::Escape,
        NamedKey::Tab => egui::Key::Tab,
        NamedKey::ArrowLeft => egui::Key::ArrowLeft,
        NamedKey::ArrowRight => egui::Key::ArrowRight,
        NamedKey::Home => egui::Key::Home,
        NamedKey::End => egui::Key::End,
        _ => return None,
    })
}

/// Whether the UI of the last frame owns the pointer.
fn pointer_captured(ctx: &egui::Context) -> bool {
    ctx.wants_pointer_input() || ctx.is_pointer_over_area()
}

pub struct Overlay {
    pub ctx: egui::Context,
    pub input: OverlayInput,
    frametime: f32,

    renderer: egui_wgpu::Renderer,
    clipped_shapes: Vec<egui::ClippedPrimitive>,
    textures_delta: egui::TexturesDelta,
}

impl Overlay {
    pub fn new(device: &wgpu::Device, swapchain_format: wgpu::TextureFormat) -> Self {
        Self {
            ctx: egui::Context::default(),
            input: OverlayInput::default(),
            frametime: 0.0,

            renderer: egui_wgpu::Renderer::new(device, swapchain_format, None, 1),
            clipped_shapes: Vec::new(),
            textures_delta: egui::TexturesDelta::default(),
        }
    }

    /// Forwards a button press and reports whether the overlay consumed it.
    pub fn pointer_button(&mut self, button: MouseButton, state: ElementState) -> bool {
        self.input.pointer_button(button, state);
        pointer_captured(&self.ctx)
    }

    pub fn wants_pointer(&self) -> bool {
        pointer_captured(&self.ctx)
    }

    /// Forwards a key and reports whether a text field is focused.
    pub fn key(&mut self, key: &Key, state: ElementState, repeat: bool) -> bool {
        self.input.key(key, state, repeat);
        self.ctx.wants_keyboard_input()
    }

    pub fn run<F: FnOnce(&egui::Context)>(&mut self, frametime: f32, run_ui: F) {
        self.frametime = frametime;
        let output = self.ctx.run(self.input.take(frametime), run_ui);

        self.clipped_shapes = self.ctx.tessellate(output.shapes, output.pixels_per_point);
        self.textures_delta = output.textures_delta;
    }

    pub fn pre_render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
    ) {
        for (id, delta) in &self.textures_delta.set {
            self.renderer.update_texture(device, queue, *id, delta);
        }

        self.renderer.update_buffers(
            device,
            queue,
            encoder,
            &self.clipped_shapes,
            &self.screen_descriptor(),
        );

        for id in &self.textures_delta.free {
            self.renderer.free_texture(id);
        }
    }

    pub fn render<'a>(&'a self, rpass: &mut wgpu::RenderPass<'a>) {
        self.renderer
            .render(rpass, &self.clipped_shapes, &self.screen_descriptor());
    }

    fn screen_descriptor(&self) -> egui_wgpu::ScreenDescriptor {
        let screen_rect = self.ctx.screen_rect();
        egui_wgpu::ScreenDescriptor {
            size_in_pixels: [screen_rect.width() as u32, screen_rect.height() as u32],
            pixels_per_point: self.ctx.pixels_per_point(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn events(input: &mut OverlayInput) -> Vec<egui::Event> {
        input.take(0.0).events
    }

    #[test]
    fn buttons_are_reported_at_the_last_pointer_position() {
        let mut input = OverlayInput::default();
        input.pointer_moved(Vec2::new(12.0, 34.0));
        input.pointer_button(MouseButton::Left, ElementState::Pressed);
        input.pointer_button(MouseButton::Back, ElementState::Pressed);

        let events = events(&mut input);
        assert_eq!(events.len(), 2);
        match &events[1] {
            egui::Event::PointerButton {
                pos,
                button,
                pressed,
                ..
            } => {
                assert_eq!(*pos, egui::pos2(12.0, 34.0));
                assert_eq!(*button, egui::PointerButton::Primary);
                assert!(*pressed);
            }
            other => panic!("expected a pointer button, got {other:?}"),
        }
    }

    #[test]
    fn typed_characters_become_text_on_press_only() {
        let mut input = OverlayInput::default();
        input.key(&Key::Character("5".into()), ElementState::Pressed, false);
        input.key(&Key::Character("5".into()), ElementState::Released, false);

        assert_eq!(events(&mut input), vec![egui::Event::Text("5".into())]);
    }

    #[test]
    fn editing_keys_are_forwarded_and_others_dropped() {
        let mut input = OverlayInput::default();
        input.modifiers(ModifiersState::SHIFT);
        input.key(&Key::Named(NamedKey::Backspace), ElementState::Pressed, true);
        input.key(&Key::Named(NamedKey::F11), ElementState::Pressed, false);

        let events = events(&mut input);
        assert_eq!(events.len(), 1);
        match &events[0] {
            egui::Event::Key {
                key,
                pressed,
                repeat,
                modifiers,
                ..
            } => {
                assert_eq!(*key, egui::Key::Backspace);
                assert!(*pressed);
                assert!(*repeat);
                assert!(modifiers.shift);
            }
            other => panic!("expected a key, got {other:?}"),
        }
    }

    #[test]
    fn taking_input_clears_pending_events() {
        let mut input = OverlayInput::default();
        input.resize(800, 600);
        input.pointer_moved(Vec2::ONE);

        let raw = input.take(0.016);
        assert_eq!(raw.predicted_dt, 0.016);
        assert_eq!(raw.screen_rect.map(|r| r.width()), Some(800.0));
        assert!(input.take(0.016).events.is_empty());
    }

    fn frame_with_window(ctx: &egui::Context, pointer: egui::Pos2) {
        let mut input = OverlayInput::default();
        input.resize(800, 600);
        input.pointer_moved(Vec2::new(pointer.x, pointer.y));

        let _ = ctx.run(input.take(0.016), |ctx| {
            egui::Window::new("Settings")
                .fixed_pos(egui::pos2(10.0, 10.0))
                .show(ctx, |ui| ui.label("particles"));
        });
    }

    #[test]
    fn pointer_over_a_window_is_captured() {
        let ctx = egui::Context::default();
        for _ in 0..2 {
            frame_with_window(&ctx, egui::pos2(20.0, 20.0));
        }

        assert!(pointer_captured(&ctx));
    }

    #[test]
    fn pointer_elsewhere_reaches_the_field() {
        let ctx = egui::Context::default();
        for _ in 0..2 {
            frame_with_window(&ctx, egui::pos2(700.0, 500.0));
        }

        assert!(!pointer_captured(&ctx));
    }
}
