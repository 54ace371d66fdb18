use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::{Column, TableBuilder};

use crate::data::filter::{QueryOutcome, ResultTable};
use crate::state::AppState;

const ROW_HEIGHT: f32 = 18.0;

// ---------------------------------------------------------------------------
// Results (central panel)
// ---------------------------------------------------------------------------

/// Render the outcome of the last submission in the central panel.
pub fn results_view(ui: &mut Ui, state: &AppState) {
    if state.dataset.is_none() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a cutoff-rank file to start  (File → Open dataset…)");
        });
        return;
    }

    match &state.outcome {
        None => {
            ui.centered_and_justified(|ui: &mut Ui| {
                ui.heading("Enter your rank and press “Predict Colleges”");
            });
        }
        Some(Err(e)) => {
            ui.label(RichText::new(e.to_string()).color(Color32::RED).strong());
        }
        Some(Ok(QueryOutcome::NoMatches)) => {
            ui.label(
                RichText::new("No exact matches found for your filters. Try changing filters.")
                    .color(Color32::YELLOW),
            );
        }
        Some(Ok(QueryOutcome::Matches(result))) => {
            ui.label(
                RichText::new(format!("Found {} matching colleges!", result.len()))
                    .color(Color32::GREEN)
                    .strong(),
            );
            ui.small("Export the list from File → Export PDF…");
            ui.separator();
            result_table(ui, result);
        }
    }
}

fn result_table(ui: &mut Ui, result: &ResultTable) {
    ScrollArea::horizontal().show(ui, |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .resizable(true)
            .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
            .columns(Column::auto().at_least(60.0).clip(true), result.columns.len())
            .header(ROW_HEIGHT + 4.0, |mut header| {
                for col in &result.columns {
                    header.col(|ui: &mut Ui| {
                        ui.strong(col.as_str());
                    });
                }
            })
            .body(|body| {
                body.rows(ROW_HEIGHT, result.len(), |mut row| {
                    let cells = &result.rows[row.index()];
                    for cell in cells {
                        row.col(|ui: &mut Ui| {
                            ui.label(cell.to_string());
                        });
                    }
                });
            });
    });
}
