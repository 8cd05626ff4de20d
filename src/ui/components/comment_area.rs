use eframe::egui;

use crate::common::Comment;
use crate::ui::state::AppState;

/// Returns true when "load older" was clicked.
pub fn render(ui: &mut egui::Ui, state: &mut AppState) -> bool {
    let mut load_older = false;
    let scroll_to_latest = state.take_scroll_to_latest();

    egui::ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui| {
            if state.comments.has_more() || state.comments.is_loading() {
                ui.vertical_centered(|ui| {
                    if state.comments.is_loading() {
                        ui.spinner();
                    } else if ui
                        .add_enabled(state.comments.can_load_older(), egui::Button::new("Load older"))
                        .clicked()
                    {
                        load_older = true;
                    }
                });
            }

            for comment in state.comments.items() {
                render_comment(ui, comment);
                ui.separator();
            }

            if scroll_to_latest {
                ui.scroll_to_cursor(Some(egui::Align::BOTTOM));
            }
        });

    load_older
}

fn render_comment(ui: &mut egui::Ui, comment: &Comment) {
    ui.horizontal(|ui| {
        ui.label(egui::RichText::new(&comment.author.name).strong());
        ui.label(
            egui::RichText::new(comment.created_at.format("%Y-%m-%d %H:%M").to_string()).weak(),
        );
    });
    if let Some(subject) = comment.subject.as_deref().filter(|s| !s.is_empty()) {
        ui.label(egui::RichText::new(subject).strong());
    }
    if let Some(message) = comment.message.as_deref() {
        ui.label(message);
    }
    for attachment in &comment.attachments {
        ui.hyperlink_to(format!("📎 {}", attachment_label(&attachment.url)), &attachment.url);
    }
}

fn attachment_label(url: &str) -> &str {
    url.rsplit('/').next().filter(|name| !name.is_empty()).unwrap_or(url)
}
