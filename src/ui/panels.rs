use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::export::ExportFormat;
use crate::state::{AppState, FilterDimension};

// ---------------------------------------------------------------------------
// Left side panel – prediction form
// ---------------------------------------------------------------------------

/// Render the prediction form. Submitting validates and filters in one go.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Enter Your Details");
    ui.separator();

    let mut submitted = false;
    {
        let AppState { dataset, form, .. } = state;
        let Some(dataset) = dataset.as_ref() else {
            ui.label("No dataset loaded.");
            return;
        };
        let schema = &dataset.schema;

        ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui: &mut Ui| {
                // ---- Category + gender ----
                ui.strong("Category + Gender");
                let current = form.cutoff_key.clone().unwrap_or_default();
                egui::ComboBox::from_id_salt("cutoff_key")
                    .selected_text(current.as_str())
                    .width(ui.available_width())
                    .show_ui(ui, |ui: &mut Ui| {
                        for col in &schema.cutoff_columns {
                            let key = col.as_str();
                            if ui.selectable_label(current == key, key).clicked() {
                                form.cutoff_key = Some(key.to_string());
                            }
                        }
                    });
                ui.add_space(6.0);

                // ---- Rank ----
                ui.strong("Your Rank (required)");
                let rank_edit = ui.add(
                    egui::TextEdit::singleline(&mut form.rank_input).hint_text("e.g., 32000"),
                );
                if rank_edit.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                    submitted = true;
                }
                ui.separator();

                // ---- Code filters (collapsible checklists) ----
                for dim in FilterDimension::available(schema) {
                    let options = dim.options(schema);
                    let selected = form.selection_mut(dim);
                    let header_text =
                        format!("{}  ({}/{})", dim.label(), selected.len(), options.len());

                    egui::CollapsingHeader::new(RichText::new(header_text).strong())
                        .id_salt(dim.label())
                        .default_open(false)
                        .show(ui, |ui: &mut Ui| {
                            if ui.small_button("Clear").clicked() {
                                selected.clear();
                            }
                            for val in options {
                                let mut checked = selected.contains(val);
                                if ui.checkbox(&mut checked, val.to_string()).changed() {
                                    if checked {
                                        selected.insert(val.clone());
                                    } else {
                                        selected.remove(val);
                                    }
                                }
                            }
                        });
                }
                ui.separator();

                if ui.button("Predict Colleges").clicked() {
                    submitted = true;
                }
            });
    }

    if submitted {
        state.submit();
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open dataset…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            ui.separator();
            let has_result = state.result().is_some();
            for format in ExportFormat::ALL {
                let button = egui::Button::new(format!("Export {}…", format.label()));
                if ui.add_enabled(has_result, button).clicked() {
                    save_file_dialog(state, format);
                    ui.close_menu();
                }
            }
        });

        ui.separator();

        if let Some(ds) = &state.dataset {
            ui.label(format!(
                "{} rows, {} columns, {} categories",
                ds.table.len(),
                ds.table.columns.len(),
                ds.schema.cutoff_columns.len()
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open cutoff ranks")
        .add_filter(
            "Supported files",
            &["xlsx", "xlsm", "xlsb", "xls", "ods", "csv", "parquet", "pq"],
        )
        .add_filter("Excel", &["xlsx", "xlsm", "xlsb", "xls"])
        .add_filter("OpenDocument", &["ods"])
        .add_filter("CSV", &["csv"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        state.load_path(&path);
    }
}

pub fn save_file_dialog(state: &mut AppState, format: ExportFormat) {
    let file = rfd::FileDialog::new()
        .set_title(format!("Export results as {}", format.label()))
        .set_file_name(format.file_name())
        .add_filter(format.label(), &[format.extension()])
        .save_file();

    if let Some(path) = file {
        match state.export_to(format, &path) {
            Ok(()) => state.status_message = None,
            Err(e) => {
                log::error!("Export failed: {e:#}");
                state.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }
}
