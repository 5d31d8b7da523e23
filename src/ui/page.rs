use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use super::{charts, section_message, table};
use crate::dashboard::{Dashboard, Metrics, Section};
use crate::data::model::Aggregate;

// ---------------------------------------------------------------------------
// Central panel – the report page
// ---------------------------------------------------------------------------

/// Render the page for the latest run.
pub fn central_page(ui: &mut Ui, dash: &Dashboard) {
    ui.heading(&dash.title);

    if let Some(err) = &dash.page_error {
        ui.add_space(8.0);
        ui.label(RichText::new(format!("Could not load data: {err}")).color(Color32::RED));
        return;
    }

    let Some(view) = &dash.view else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a data source to begin  (File → Open…)");
        });
        return;
    };

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            metrics_row(ui, &view.metrics);
            ui.separator();

            let heading = match &view.applied {
                Some(sel) => format!("Student Records · {} = {}", sel.dimension, sel.value),
                None => "Student Records".to_string(),
            };
            ui.heading(heading);
            match &view.records {
                Ok(rs) if rs.is_empty() => {
                    ui.label(RichText::new("No matching records.").weak());
                }
                Ok(rs) => table::records_table(ui, "records", rs),
                Err(e) => section_message(ui, e),
            }
            ui.separator();

            chart_section(ui, "Student Count by Major", &view.by_major, |ui, agg| {
                charts::bar_chart(ui, "by_major", agg)
            });
            chart_section(ui, "Enrollment Status Breakdown", &view.by_status, |ui, agg| {
                charts::bar_chart(ui, "by_status", agg)
            });
            chart_section(ui, "Students by Country", &view.by_country, |ui, agg| {
                charts::bar_chart(ui, "by_country", agg)
            });
            chart_section(ui, "Graduation Year Trend", &view.by_year, |ui, agg| {
                charts::line_chart(ui, "by_year", agg)
            });
        });
}

fn chart_section(
    ui: &mut Ui,
    title: &str,
    section: &Section<Aggregate>,
    draw: impl FnOnce(&mut Ui, &Aggregate),
) {
    ui.add_space(6.0);
    ui.horizontal(|ui: &mut Ui| {
        ui.heading(title);
        if let Ok(agg) = section {
            ui.label(RichText::new(format!("{} students", agg.total())).weak());
        }
    });
    match section {
        Ok(agg) => draw(ui, agg),
        Err(e) => section_message(ui, e),
    }
}

fn metrics_row(ui: &mut Ui, metrics: &Metrics) {
    ui.columns(4, |cols: &mut [Ui]| {
        metric(&mut cols[0], "Total Students", &metrics.students);
        metric(&mut cols[1], "Countries", &metrics.countries);
        metric(&mut cols[2], "Majors", &metrics.majors);
        metric(&mut cols[3], "Grad Years", &metrics.years);
    });
}

fn metric(ui: &mut Ui, label: &str, value: &Section<usize>) {
    egui::Frame::group(ui.style()).show(ui, |ui: &mut Ui| {
        ui.set_min_width(ui.available_width());
        ui.label(RichText::new(label).weak());
        match value {
            Ok(n) => {
                ui.label(RichText::new(n.to_string()).size(28.0).strong());
            }
            Err(e) => section_message(ui, e),
        }
    });
}
