use std::ops::RangeInclusive;

use eframe::egui::Ui;
use egui_plot::{Bar, BarChart, GridMark, Line, Plot, PlotPoints, Points};

use crate::color::{accent, generate_palette};
use crate::data::model::Aggregate;

const CHART_HEIGHT: f32 = 240.0;

// ---------------------------------------------------------------------------
// Bar chart: category → count
// ---------------------------------------------------------------------------

/// One bar per entry, in the aggregate's order, labelled on the x axis.
pub fn bar_chart(ui: &mut Ui, id: &str, agg: &Aggregate) {
    let labels: Vec<String> = agg.entries.iter().map(|(k, _)| k.to_string()).collect();
    let colours = generate_palette(agg.len());

    let bars: Vec<Bar> = agg
        .entries
        .iter()
        .zip(colours)
        .enumerate()
        .map(|(i, ((key, count), colour))| {
            Bar::new(i as f64, *count as f64)
                .name(key.to_string())
                .fill(colour)
                .width(0.7)
        })
        .collect();

    // fixed, non-interactive so the page scroll keeps working
    Plot::new(id)
        .height(CHART_HEIGHT)
        .allow_drag(false)
        .allow_scroll(false)
        .allow_zoom(false)
        .allow_boxed_zoom(false)
        .show_x(false)
        .y_axis_label("Students")
        .x_axis_formatter(move |mark: GridMark, _range: &RangeInclusive<f64>| {
            category_label(&labels, mark.value)
        })
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars));
        });
}

// ---------------------------------------------------------------------------
// Line chart: year → count
// ---------------------------------------------------------------------------

/// Trend line. Numeric keys (years) are placed on a numeric axis; anything
/// else falls back to evenly spaced categories.
pub fn line_chart(ui: &mut Ui, id: &str, agg: &Aggregate) {
    let numeric = agg.entries.iter().all(|(k, _)| k.as_f64().is_some());
    let labels: Vec<String> = agg.entries.iter().map(|(k, _)| k.to_string()).collect();

    let coords: Vec<[f64; 2]> = agg
        .entries
        .iter()
        .enumerate()
        .map(|(i, (key, count))| {
            let x = if numeric {
                key.as_f64().unwrap_or(i as f64)
            } else {
                i as f64
            };
            [x, *count as f64]
        })
        .collect();

    Plot::new(id)
        .height(CHART_HEIGHT)
        .allow_drag(false)
        .allow_scroll(false)
        .allow_zoom(false)
        .allow_boxed_zoom(false)
        .show_x(false)
        .y_axis_label("Graduates")
        .x_axis_formatter(move |mark: GridMark, _range: &RangeInclusive<f64>| {
            if numeric {
                whole_number(mark.value)
            } else {
                category_label(&labels, mark.value)
            }
        })
        .show(ui, |plot_ui| {
            plot_ui.line(
                Line::new(PlotPoints::from(coords.clone()))
                    .name("Graduates")
                    .color(accent())
                    .width(2.0),
            );
            plot_ui.points(Points::new(PlotPoints::from(coords)).color(accent()).radius(3.5));
        });
}

// -- helpers --

fn category_label(labels: &[String], x: f64) -> String {
    let idx = x.round();
    if (x - idx).abs() > 1e-6 || idx < 0.0 {
        return String::new();
    }
    labels.get(idx as usize).cloned().unwrap_or_default()
}

fn whole_number(x: f64) -> String {
    if x.fract().abs() > 1e-6 {
        String::new()
    } else {
        format!("{x:.0}")
    }
}
