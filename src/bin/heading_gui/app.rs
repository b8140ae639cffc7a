//! Main GUI application

use crate::live::{self, ConnectResult};
use crate::state::{AppMode, AppState, SensorHandle};
use compass_rotator::{fit_size, CompassShape, Point, Triangle};
use eframe::egui;
use egui_plot::{HLine, Line, Plot, PlotPoints};
use std::sync::mpsc::TryRecvError;

const BODY_COLOR: egui::Color32 = egui::Color32::from_rgb(40, 80, 220);
const POINTER_COLOR: egui::Color32 = egui::Color32::from_rgb(220, 40, 40);

/// Height reserved under the canvas for the freeze button
const BUTTON_AREA: f32 = 48.0;

/// Main application struct
pub struct CompassApp {
    state: AppState,
}

impl CompassApp {
    pub fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        Self {
            state: AppState::default(),
        }
    }

    /// Drain pending sensor events from the streaming thread
    fn poll_sensor_events(&mut self) {
        let Some(handle) = self.state.sensor_handle.take() else {
            return;
        };

        let mut finished = false;
        loop {
            match handle.rx.try_recv() {
                Ok(event) => self.state.apply_event(&event),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    finished = true;
                    break;
                }
            }
        }

        if finished {
            join_source(handle);
            match self.state.mode {
                AppMode::Replay => self.state.ui.status = "Replay finished".to_string(),
                _ => self.state.ui.error = Some("Sensor connection lost".to_string()),
            }
            self.state.mode = AppMode::Idle;
        } else {
            self.state.sensor_handle = Some(handle);
        }
    }

    fn start_simulation(&mut self) {
        self.disconnect();
        self.state.ui.error = None;

        match live::start_simulation(self.state.sim_config.clone()) {
            ConnectResult::Success(handle) => {
                self.state.reset_readings();
                self.state.sensor_handle = Some(handle);
                self.state.mode = AppMode::Simulated;
                self.state.replay_path = None;
                self.state.ui.status = "Simulating".to_string();
            }
            ConnectResult::Error(e) => {
                self.state.ui.error = Some(e);
                self.state.ui.status = "Simulation failed".to_string();
            }
        }
    }

    fn open_replay(&mut self, path: &std::path::Path) {
        self.disconnect();
        self.state.ui.error = None;
        self.state.ui.status = format!("Loading {}...", path.display());

        match live::start_replay(path) {
            ConnectResult::Success(handle) => {
                self.state.reset_readings();
                self.state.sensor_handle = Some(handle);
                self.state.mode = AppMode::Replay;
                self.state.replay_path = Some(path.to_path_buf());
                self.state.ui.status = "Replaying".to_string();
            }
            ConnectResult::Error(e) => {
                self.state.ui.error = Some(e);
                self.state.ui.status = "Replay failed".to_string();
            }
        }
    }

    fn disconnect(&mut self) {
        if let Some(handle) = self.state.sensor_handle.take() {
            handle.stop();
            join_source(handle);
            self.state.ui.status = "Disconnected".to_string();
        }
        self.state.mode = AppMode::Idle;
    }

    /// Freeze or release the displayed heading
    fn toggle_display(&mut self) {
        self.state.display.toggle(self.state.live_heading);
    }

    /// Render the top toolbar
    fn render_toolbar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Compass");
                ui.separator();

                if self.state.mode == AppMode::Idle {
                    if ui.button("▶ Start Simulation").clicked() {
                        self.start_simulation();
                    }
                } else if ui.button("⏹ Disconnect").clicked() {
                    self.disconnect();
                }

                if ui.button("📂 Open Recording").clicked() {
                    if let Some(path) = rfd::FileDialog::new()
                        .add_filter("CSV recordings", &["csv"])
                        .pick_file()
                    {
                        self.open_replay(&path);
                    }
                }

                ui.separator();
                ui.checkbox(&mut self.state.ui.show_trace, "Heading trace");

                // Status on the right
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if let Some(error) = &self.state.ui.error {
                        ui.colored_label(egui::Color32::RED, error);
                    } else {
                        ui.label(&self.state.ui.status);
                    }
                });
            });
        });
    }

    /// Render the left sidebar
    fn render_sidebar(&mut self, ctx: &egui::Context) {
        egui::SidePanel::left("sidebar")
            .resizable(true)
            .default_width(200.0)
            .show(ctx, |ui| {
                ui.heading("Source");
                match self.state.mode {
                    AppMode::Idle => ui.label("⚪ Idle"),
                    AppMode::Simulated => ui.label("🟢 Simulated device"),
                    AppMode::Replay => ui.label("📁 Replay"),
                };
                if let Some(path) = &self.state.replay_path {
                    ui.label(path.display().to_string());
                }
                if let Some(handle) = &self.state.sensor_handle {
                    ui.label(format!("Running: {:.0}s", handle.start_time.elapsed().as_secs_f64()));
                }
                ui.separator();

                ui.heading("Orientation");
                let orientation = self.state.estimator.orientation();
                ui.label(format!("Heading: {}", self.state.live_heading));
                ui.label(format!("Pitch: {:+.1}°", orientation.pitch_degrees()));
                ui.label(format!("Roll: {:+.1}°", orientation.roll_degrees()));
                if let compass_rotator::DisplayState::Fixed(frozen) = self.state.display {
                    ui.colored_label(POINTER_COLOR, format!("Frozen at {}", frozen));
                }
                ui.separator();

                ui.heading("Readings");
                if self.state.estimator.has_both_readings() {
                    let a = self.state.estimator.accelerometer();
                    let m = self.state.estimator.magnetometer();
                    ui.label(format!("Accel: {:+.2} {:+.2} {:+.2}", a.x, a.y, a.z));
                    ui.label(format!("Mag:   {:+.1} {:+.1} {:+.1}", m.x, m.y, m.z));
                } else {
                    ui.label("Waiting for both sensors");
                }
                ui.label(format!("Trace: {} samples", self.state.history.len()));
                ui.separator();

                ui.heading("Simulation");
                let config = &mut self.state.sim_config;
                ui.add(egui::Slider::new(&mut config.rate_hz, 5..=200).text("Rate").suffix(" Hz"));
                ui.add(
                    egui::Slider::new(&mut config.yaw_rate_dps, -180.0..=180.0)
                        .text("Yaw")
                        .suffix("°/s"),
                );
                ui.add(egui::Slider::new(&mut config.tilt_deg, 0.0..=60.0).text("Tilt").suffix("°"));
                ui.label("Applied on next start");

                if self.state.ui.show_trace {
                    ui.separator();
                    ui.heading("Trace");
                    ui.add(
                        egui::Slider::new(&mut self.state.ui.trace_window, 2.0..=60.0)
                            .suffix("s")
                            .logarithmic(true),
                    );
                }
            });
    }

    /// Render the heading trace along the bottom
    fn render_trace(&self, ctx: &egui::Context) {
        if !self.state.ui.show_trace {
            return;
        }

        egui::TopBottomPanel::bottom("trace")
            .resizable(true)
            .default_height(180.0)
            .show(ctx, |ui| {
                let points: PlotPoints = self
                    .state
                    .history
                    .window(self.state.ui.trace_window)
                    .map(|s| [s.timestamp, s.degrees as f64])
                    .collect();

                Plot::new("heading_trace")
                    .allow_zoom(false)
                    .allow_drag(false)
                    .include_y(-180.0)
                    .include_y(180.0)
                    .x_axis_label("Time (s)")
                    .y_axis_label("Heading (°)")
                    .legend(egui_plot::Legend::default())
                    .show(ui, |plot_ui| {
                        plot_ui.line(Line::new(points).name("Live").color(BODY_COLOR).width(1.5));
                        if let compass_rotator::DisplayState::Fixed(frozen) = self.state.display {
                            plot_ui.hline(
                                HLine::new(frozen.degrees() as f64)
                                    .name("Frozen")
                                    .color(POINTER_COLOR),
                            );
                        }
                    });
            });
    }

    /// Render the rotating polygon and the freeze button
    fn render_compass(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let canvas = egui::vec2(
                ui.available_width(),
                (ui.available_height() - BUTTON_AREA).max(0.0),
            );
            let (response, painter) = ui.allocate_painter(canvas, egui::Sense::hover());
            let rect = response.rect;

            let center = Point::new(rect.center().x, rect.center().y);
            let size = fit_size(rect.width(), rect.height());
            let shape = CompassShape::for_heading(center, size, self.state.shown_heading());

            painter.add(egui::Shape::convex_polygon(
                to_pos(&shape.body),
                BODY_COLOR,
                egui::Stroke::NONE,
            ));
            painter.add(egui::Shape::convex_polygon(
                to_pos(&shape.pointer),
                POINTER_COLOR,
                egui::Stroke::NONE,
            ));

            ui.vertical_centered(|ui| {
                ui.add_space(8.0);
                let label = self.state.display.toggle_label();
                if ui.add(egui::Button::new(label).min_size(egui::vec2(120.0, 32.0))).clicked() {
                    self.toggle_display();
                }
            });
        });
    }
}

fn to_pos(triangle: &Triangle) -> Vec<egui::Pos2> {
    triangle.points().iter().map(|p| egui::pos2(p.x, p.y)).collect()
}

fn join_source(mut handle: SensorHandle) {
    if let Some(thread) = handle.thread.take() {
        let _ = thread.join();
    }
}

impl eframe::App for CompassApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Poll for sensor events
        self.poll_sensor_events();

        // Request repaint for live updates
        if self.state.sensor_handle.is_some() {
            ctx.request_repaint();
        }

        // Render UI (side and bottom panels before the central one)
        self.render_toolbar(ctx);
        self.render_sidebar(ctx);
        self.render_trace(ctx);
        self.render_compass(ctx);
    }
}

impl Drop for CompassApp {
    fn drop(&mut self) {
        self.disconnect();
    }
}
