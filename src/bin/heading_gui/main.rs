//! Compass Heading GUI
//!
//! Draws a polygon that rotates against the device heading, with a button to
//! freeze and release the displayed angle. Sensor events come from a simulated
//! device or a CSV recording.

mod app;
mod live;
mod state;

use app::CompassApp;

fn main() -> eframe::Result<()> {
    compass_rotator::init_logging("info");

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1000.0, 800.0])
            .with_min_inner_size([600.0, 500.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Compass Heading",
        options,
        Box::new(|cc| Ok(Box::new(CompassApp::new(cc)))),
    )
}
