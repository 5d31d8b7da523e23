use eframe::egui::Ui;
use egui_extras::{Column, TableBuilder};

use crate::data::model::ResultSet;

const ROW_HEIGHT: f32 = 18.0;
const MAX_TABLE_HEIGHT: f32 = 320.0;

// ---------------------------------------------------------------------------
// Record table
// ---------------------------------------------------------------------------

/// Scrollable, striped table with the columns as the source named them.
pub fn records_table(ui: &mut Ui, id: &str, rs: &ResultSet) {
    let width = rs.columns.len();
    ui.push_id(id, |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .resizable(true)
            .max_scroll_height(MAX_TABLE_HEIGHT)
            .columns(Column::auto().at_least(60.0).clip(true), width)
            .header(20.0, |mut header| {
                for name in &rs.columns {
                    header.col(|ui: &mut Ui| {
                        ui.strong(name);
                    });
                }
            })
            .body(|body| {
                body.rows(ROW_HEIGHT, rs.len(), |mut row| {
                    let r = row.index();
                    for c in 0..width {
                        row.col(|ui: &mut Ui| {
                            ui.label(rs.cell(r, c).to_string());
                        });
                    }
                });
            });
    });
}
