use eframe::egui;

use crate::dashboard::Dashboard;
use crate::ui::{page, panels};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct StudentDashboardApp {
    pub dashboard: Dashboard,
}

impl StudentDashboardApp {
    pub fn new(dashboard: Dashboard) -> Self {
        Self { dashboard }
    }
}

impl eframe::App for StudentDashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.dashboard);
        });

        // ---- Left side panel: filters ----
        egui::SidePanel::left("filter_panel")
            .default_width(220.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.dashboard);
            });

        // ---- Central panel: metrics, records, charts ----
        egui::CentralPanel::default().show(ctx, |ui| {
            page::central_page(ui, &self.dashboard);
        });
    }
}
