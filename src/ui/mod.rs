//! Render surface: egui widgets drawing a [`crate::dashboard::DashboardView`].

use eframe::egui::{Color32, RichText, Ui};

use crate::error::SectionError;

pub mod charts;
pub mod page;
pub mod panels;
pub mod table;

const WARNING: Color32 = Color32::from_rgb(230, 160, 0);

/// Draw the message that replaces a section which could not be rendered.
pub fn section_message(ui: &mut Ui, err: &SectionError) {
    if err.is_empty_result() {
        ui.label(RichText::new("ℹ No data to show.").weak());
    } else {
        ui.label(RichText::new(format!("⚠ {err}")).color(WARNING));
    }
}
