use eframe::egui::{self, Color32, RichText, Ui};

use super::section_message;
use crate::dashboard::Dashboard;
use crate::data::filter::Dimension;
use crate::data::model::Value;

/// Why the filter panel has nothing to offer when there is no view.
fn unavailable_reason(dash: &Dashboard) -> &'static str {
    if dash.source.is_none() {
        "No data source open."
    } else {
        "Run failed; filters unavailable."
    }
}

// ---------------------------------------------------------------------------
// Left side panel – drill-down filter
// ---------------------------------------------------------------------------

/// Render the left filter panel: one dimension, one value (or "All").
pub fn side_panel(ui: &mut Ui, dash: &mut Dashboard) {
    ui.heading("Filters");
    ui.separator();

    // Clone what we need so we can mutate the dashboard below.
    let choices = match &dash.view {
        Some(view) => view.choices.clone(),
        None => {
            ui.label(RichText::new(unavailable_reason(dash)).weak());
            return;
        }
    };

    ui.strong("Filter by");
    let mut dimension = dash.dimension;
    egui::ComboBox::from_id_salt("dimension")
        .selected_text(dimension.label())
        .show_ui(ui, |ui: &mut Ui| {
            for d in Dimension::ALL {
                ui.selectable_value(&mut dimension, d, d.label());
            }
        });
    ui.add_space(6.0);

    match &choices {
        Err(e) => section_message(ui, e),
        Ok(values) => {
            let enabled = !values.is_empty();
            let mut selected = dash.selected.clone();
            let current = selected
                .as_ref()
                .map_or_else(|| "All".to_string(), Value::to_string);

            ui.add_enabled_ui(enabled, |ui: &mut Ui| {
                egui::ComboBox::from_id_salt("dimension_value")
                    .selected_text(current)
                    .show_ui(ui, |ui: &mut Ui| {
                        ui.selectable_value(&mut selected, None, "All");
                        for v in values {
                            ui.selectable_value(&mut selected, Some(v.clone()), v.to_string());
                        }
                    });
            });
            if !enabled {
                ui.label(RichText::new("No values to filter by.").weak());
            }
            dash.select_value(selected);
        }
    }

    dash.select_dimension(dimension);
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, dash: &mut Dashboard) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(dash);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(source) = &dash.source {
            ui.label(source.describe());
            if ui.button("Rerun").clicked() {
                dash.rerun();
            }
        }

        if let Some(Ok(records)) = dash.view.as_ref().map(|v| &v.records) {
            ui.separator();
            ui.label(format!("{} records shown", records.len()));
        }

        if let Some(msg) = &dash.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

const SQLITE_EXTENSIONS: [&str; 4] = ["db", "sqlite", "sqlite3", "db3"];

pub fn open_file_dialog(dash: &mut Dashboard) {
    let supported: Vec<&str> = SQLITE_EXTENSIONS
        .iter()
        .chain(&["parquet", "pq", "json", "csv"])
        .copied()
        .collect();
    let file = rfd::FileDialog::new()
        .set_title("Open student data")
        .add_filter("Supported files", &supported[..])
        .add_filter("SQLite database", &SQLITE_EXTENSIONS)
        .add_filter("Parquet", &["parquet", "pq"])
        .add_filter("JSON", &["json"])
        .add_filter("CSV", &["csv"])
        .pick_file();

    if let Some(path) = file {
        dash.open_path(&path);
    }
}
