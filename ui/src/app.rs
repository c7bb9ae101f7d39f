use crate::error::Error;
use crate::CameraLoop;
use eframe::egui::{ImageData, Key, Ui, ViewportCommand};
use eframe::{
    egui::{self, Color32, ColorImage, Context, TextureHandle, TextureOptions},
    Frame,
};
use log::{error, info};
use std::sync::Arc;
use turret_backend::cv::vision::{mat_size_and_vec, to_rgba, COLOR_BGR2RGBA};
use turret_backend::ControllerMode;

pub(crate) struct App {
    tex_handler: Option<TextureHandle>,
    tracking: CameraLoop,
    stopped: bool,

    error: Option<Error>,
    error_open: bool,
}

impl App {
    pub(crate) fn new(tracking: CameraLoop) -> Self {
        Self {
            tex_handler: None,
            tracking,
            stopped: false,
            error: None,
            error_open: false,
        }
    }

    /// Releases turret and camera, then closes the window.
    fn stop(&mut self, ctx: &Context) {
        if self.stopped {
            return;
        }
        self.stopped = true;
        self.tracking.shutdown();
        ctx.send_viewport_cmd(ViewportCommand::Close);
    }

    fn mode_label(&self, ui: &mut Ui) {
        let (text, color) = match self.tracking.controller().mode() {
            ControllerMode::Driving => ("Turret: driving", Color32::LIGHT_GREEN),
            ControllerMode::Simulated => ("Turret: simulated", Color32::LIGHT_YELLOW),
        };
        ui.colored_label(color, text);
    }

    fn mirror_toggle(&mut self, ui: &mut Ui) {
        let camera = self.tracking.source_mut();
        let mut mirror = camera.mirror();
        if ui.toggle_value(&mut mirror, "Mirror").changed() {
            camera.set_mirror(mirror);
        }
    }

    fn top_bar(&mut self, ui: &mut Ui) {
        ui.horizontal(|ui| {
            self.mode_label(ui);
            ui.separator();
            ui.monospace(format!("FPS: {:.1}", self.tracking.fps()));
            ui.separator();
            self.mirror_toggle(ui);
        });
    }

    fn central_panel(&mut self, ui: &mut Ui) -> crate::Result<()> {
        let frame = match self.tracking.step() {
            Ok(frame) => frame,
            Err(err) => {
                error!("{err}");
                self.stop(ui.ctx());
                return Ok(());
            }
        };

        let (size, rgba) = mat_size_and_vec(&to_rgba(&frame, COLOR_BGR2RGBA)?)?;
        let texture = self.tex_handler.get_or_insert_with(|| {
            ui.ctx().load_texture(
                "camera-frame",
                ColorImage::new(size, Color32::LIGHT_YELLOW),
                TextureOptions::default(),
            )
        });

        texture.set(
            ImageData::Color(Arc::new(ColorImage::from_rgba_unmultiplied(size, &rgba))),
            TextureOptions::default(),
        );

        ui.image((texture.id(), texture.size_vec2()));

        Ok(())
    }

    fn show_err(&mut self, ctx: &Context) {
        let message = self
            .error
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default();

        egui::Window::new("Error").show(ctx, |ui| {
            ui.label("An error was encountered:");
            ui.monospace(message);
            ui.horizontal(|ui| {
                if ui.button("Ok").clicked() {
                    self.error_open = false
                }
            });
        });
    }

    fn app(&mut self, ctx: &Context, _frame: &mut Frame) -> crate::Result<()> {
        if self.error_open {
            self.show_err(ctx);
        }

        egui::TopBottomPanel::top("top-row").show(ctx, |ui| self.top_bar(ui));

        egui::CentralPanel::default()
            .show(ctx, |ui| -> crate::Result<()> { self.central_panel(ui) })
            .inner?;

        Ok(())
    }
}

impl eframe::App for App {
    fn update(&mut self, ctx: &Context, frame: &mut Frame) {
        if ctx.input(|i| i.key_pressed(Key::Escape)) {
            info!("stop requested");
            self.stop(ctx);
        }
        if self.stopped {
            return;
        }

        match self.app(ctx, frame) {
            Err(err) if !self.error_open => {
                error!("{err}");
                self.error_open = true;
                self.error = Some(err);
            }
            _ => {}
        }

        ctx.request_repaint();
    }
}

impl Drop for App {
    fn drop(&mut self) {
        self.tracking.shutdown();
    }
}
