use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::data::model::FilterDimension;
use crate::state::{AppState, Page};

// ---------------------------------------------------------------------------
// Left side panel – page selection and filter widgets
// ---------------------------------------------------------------------------

/// Render the left panel: page selector on top, per-dimension filters below.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Pages");
    egui::ComboBox::from_id_salt("page_select")
        .selected_text(state.page.label())
        .show_ui(ui, |ui: &mut Ui| {
            for page in Page::ALL {
                ui.selectable_value(&mut state.page, page, page.label());
            }
        });
    ui.separator();

    ui.heading("Filters");
    ui.separator();

    let dataset = match &state.dataset {
        Some(ds) => ds,
        None => {
            ui.label("No dataset loaded.");
            return;
        }
    };

    // Clone the option lists so we can mutate state inside the loop.
    let unique = dataset.unique_values.clone();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            for dim in FilterDimension::ALL {
                let Some(all_values) = unique.get(&dim) else {
                    continue;
                };

                let selected = state.filters.entry(dim).or_default();

                // Show count of selected / total in the header
                let n_selected = selected.len();
                let n_total = all_values.len();
                let header_text = format!("{}  ({n_selected}/{n_total})", dim.label());

                egui::CollapsingHeader::new(RichText::new(header_text).strong())
                    .id_salt(dim.label())
                    .default_open(false)
                    .show(ui, |ui: &mut Ui| {
                        // Select all / none buttons
                        ui.horizontal(|ui: &mut Ui| {
                            if ui.small_button("All").clicked() {
                                state.select_all(dim);
                            }
                            if ui.small_button("None").clicked() {
                                state.select_none(dim);
                            }
                        });

                        // Re-borrow after potential mutation from All/None
                        let selected = state.filters.entry(dim).or_default();

                        for val in all_values {
                            let is_selected = selected.contains(val);
                            let label = val.to_string();

                            // Property types carry their chart colour
                            let mut text = RichText::new(&label);
                            if dim == FilterDimension::PropertyType {
                                if let Some(cm) = &state.type_colors {
                                    text = text.color(cm.color_for(val));
                                }
                            }

                            let mut checked = is_selected;
                            if ui.checkbox(&mut checked, text).changed() {
                                if checked {
                                    selected.insert(val.clone());
                                } else {
                                    selected.remove(val);
                                }
                            }
                        }
                    });
            }
        });

    // Recompute visible indices after any checkbox changes.
    state.refilter();
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(ds) = &state.dataset {
            ui.label(format!(
                "{} sales loaded, {} visible",
                ds.len(),
                state.visible_indices.len()
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open sales data")
        .add_filter("Supported files", &["csv", "json", "parquet", "pq"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        state.loading = true;
        match crate::data::loader::load_file(&path) {
            Ok(dataset) => {
                log::info!("Loaded {} sales", dataset.len());
                state.set_dataset(dataset);
            }
            Err(e) => {
                log::error!("Failed to load file: {e:#}");
                state.status_message = Some(format!("Error: {e:#}"));
                state.loading = false;
            }
        }
    }
}
