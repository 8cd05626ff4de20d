use crate::ui::state::AppState;
use eframe::egui;

#[derive(Default)]
pub struct ThreadListActions {
    pub selected: Option<String>,
    pub new_thread: bool,
    pub search: bool,
    pub next_page: bool,
    pub previous_page: bool,
}

pub fn render(ui: &mut egui::Ui, state: &mut AppState) -> ThreadListActions {
    let mut actions = ThreadListActions::default();

    ui.heading("Threads");
    ui.separator();

    ui.horizontal(|ui| {
        let response = ui.text_edit_singleline(&mut state.search_input);
        if ui.button("Search").clicked()
            || (response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)))
        {
            actions.search = true;
        }
    });

    let composing = state.open_thread().is_none();
    if ui.selectable_label(composing, "✉ New thread").clicked() {
        actions.new_thread = true;
    }
    ui.separator();

    if state.threads.items().is_empty() {
        if state.threads.is_loading() {
            ui.spinner();
        } else {
            ui.label("No threads yet");
        }
    }

    let open = state.open_thread().map(str::to_string);
    egui::ScrollArea::vertical()
        .auto_shrink([false, true])
        .max_height((ui.available_height() - 32.0).max(64.0))
        .show(ui, |ui| {
            for group in state.threads.items() {
                let selected = open.as_deref() == Some(group.hash.as_str());
                let response = ui.selectable_label(selected, group.title());
                if response.clicked() {
                    actions.selected = Some(group.hash.clone());
                }

                // Người nhận + thời điểm tin nhắn cuối
                let when = group
                    .last_message_at
                    .unwrap_or(group.updated_at)
                    .format("%d %b %H:%M");
                let names = group
                    .recipients
                    .iter()
                    .map(|recipient| recipient.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", ");
                ui.label(egui::RichText::new(format!("{names} · {when}")).weak().small());
                ui.add_space(4.0);
            }
        });

    ui.separator();
    ui.horizontal(|ui| {
        if ui
            .add_enabled(state.threads.has_previous(), egui::Button::new("◀"))
            .clicked()
        {
            actions.previous_page = true;
        }
        ui.label(format!("Page {}", state.threads.page()));
        if ui
            .add_enabled(state.threads.has_next(), egui::Button::new("▶"))
            .clicked()
        {
            actions.next_page = true;
        }
    });

    actions
}
