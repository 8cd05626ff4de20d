use eframe::egui;

use crate::messenger::format_size;
use crate::ui::state::AppState;

#[derive(Default)]
pub struct ComposerActions {
    pub send: bool,
    pub attach: bool,
    pub remove_file: Option<usize>,
}

pub fn render(ui: &mut egui::Ui, state: &mut AppState) -> ComposerActions {
    let mut actions = ComposerActions::default();
    let submitting = state.is_submitting();

    ui.add_enabled_ui(!submitting, |ui| {
        ui.horizontal(|ui| {
            ui.label("Subject");
            ui.text_edit_singleline(&mut state.composer.subject);
        });
        ui.add(
            egui::TextEdit::multiline(&mut state.composer.message)
                .desired_rows(3)
                .desired_width(f32::INFINITY)
                .hint_text("Write a message…"),
        );

        ui.horizontal(|ui| {
            let response = ui.add(
                egui::TextEdit::singleline(&mut state.attach_path_input)
                    .hint_text("File path (or drop files on the window)"),
            );
            if ui.button("Attach").clicked()
                || (response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)))
            {
                actions.attach = true;
            }
        });

        for (index, file) in state.composer.files().iter().enumerate() {
            ui.horizontal(|ui| {
                ui.label(format!("📎 {} ({})", file.name, format_size(file.size)))
                    .on_hover_text(file.preview.as_str());
                if ui.small_button("✕").clicked() {
                    actions.remove_file = Some(index);
                }
            });
        }

        ui.horizontal(|ui| {
            if ui.button("Send").clicked() {
                actions.send = true;
            }
            if submitting {
                ui.spinner();
            }
        });
    });

    actions
}
