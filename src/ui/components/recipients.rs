use eframe::egui;

use crate::messenger::Composer;

pub fn render(ui: &mut egui::Ui, composer: &mut Composer) {
    ui.heading("Recipients");
    ui.separator();

    if composer.recipients().is_empty() {
        ui.label("Loading project members…");
        return;
    }

    let mut toggled = None;
    for recipient in composer.recipients() {
        let mut selected = recipient.selected;
        let response = ui.checkbox(&mut selected, recipient.name.as_str());
        let response = match &recipient.email {
            Some(email) => response.on_hover_text(email),
            None => response,
        };
        if response.changed() {
            toggled = Some(recipient.id);
        }
    }

    if let Some(id) = toggled {
        composer.toggle_recipient(id);
    }
}
