mod app;
mod color;
mod config;
mod dashboard;
mod data;
mod error;
mod ui;

use app::StudentDashboardApp;
use config::DashboardConfig;
use dashboard::Dashboard;
use eframe::egui;

fn main() -> eframe::Result {
    env_logger::init();

    let (config, config_error) = match DashboardConfig::load() {
        Ok(config) => (config, None),
        Err(e) => {
            log::error!("Failed to load config: {e:#}");
            (DashboardConfig::default(), Some(format!("Config error: {e:#}")))
        }
    };

    let mut dashboard = Dashboard::new(&config);
    if let Some(source) = &config.source {
        dashboard.open_path(&source.path);
    }
    if config_error.is_some() {
        dashboard.status_message = config_error;
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 900.0])
            .with_min_inner_size([700.0, 500.0]),
        ..Default::default()
    };

    eframe::run_native(
        &config.title,
        options,
        Box::new(|_cc| Ok(Box::new(StudentDashboardApp::new(dashboard)))),
    )
}
