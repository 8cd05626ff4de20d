use std::path::PathBuf;
use std::time::Duration;

use eframe::egui;
use tokio::sync::mpsc;

use crate::common::{MessengerCommand, MessengerEvent};

use super::components::{comment_area, composer, recipients, thread_list};
use super::state::{AppState, PanelMode};

pub struct MessengerApp {
    state: AppState,
    command_sender: mpsc::Sender<MessengerCommand>,
    event_receiver: mpsc::Receiver<MessengerEvent>,
}

impl MessengerApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        mut state: AppState,
        command_sender: mpsc::Sender<MessengerCommand>,
        event_receiver: mpsc::Receiver<MessengerEvent>,
    ) -> Self {
        state.start();
        Self {
            state,
            command_sender,
            event_receiver,
        }
    }

    fn handle_network_events(&mut self) {
        while let Ok(event) = self.event_receiver.try_recv() {
            self.state.apply_event(event);
        }
    }

    fn flush_commands(&mut self) {
        for command in self.state.drain_commands() {
            let kind = command.request_kind();
            if let Err(err) = self.command_sender.try_send(command) {
                log::warn!("Failed to send command to network: {err}");
                self.state.apply_event(MessengerEvent::RequestFailed {
                    kind,
                    message: "The network worker is not responding".to_string(),
                });
            }
        }
    }

    fn handle_dropped_files(&mut self, ctx: &egui::Context) {
        let dropped: Vec<PathBuf> = ctx.input(|i| {
            i.raw
                .dropped_files
                .iter()
                .filter_map(|file| file.path.clone())
                .collect()
        });
        if !dropped.is_empty() {
            self.state.attach_paths(dropped);
        }
    }
}

impl eframe::App for MessengerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_network_events();
        self.handle_dropped_files(ctx);

        if let Some(message) = self.state.error().map(str::to_string) {
            egui::TopBottomPanel::top("error_banner").show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.colored_label(egui::Color32::RED, message);
                    if ui.small_button("Dismiss").clicked() {
                        self.state.dismiss_error();
                    }
                });
            });
        }

        egui::SidePanel::left("thread_list")
            .resizable(true)
            .default_width(260.0)
            .show(ctx, |ui| {
                let actions = thread_list::render(ui, &mut self.state);
                if actions.search {
                    self.state.search();
                }
                if actions.previous_page {
                    self.state.previous_page();
                }
                if actions.next_page {
                    self.state.next_page();
                }
                if actions.new_thread {
                    self.state.start_new_thread();
                }
                if let Some(group_hash) = actions.selected {
                    self.state.select_thread(&group_hash);
                }
            });

        if self.state.mode() == &PanelMode::Compose {
            egui::SidePanel::right("recipients")
                .resizable(true)
                .default_width(200.0)
                .show(ctx, |ui| {
                    recipients::render(ui, &mut self.state.composer);
                });
        }

        egui::TopBottomPanel::bottom("composer")
            .resizable(true)
            .show(ctx, |ui| {
                ui.add_space(4.0);
                let actions = composer::render(ui, &mut self.state);
                if let Some(index) = actions.remove_file {
                    self.state.composer.remove_file(index);
                }
                if actions.attach {
                    self.state.attach_from_input();
                }
                if actions.send {
                    // Validation errors land in the banner.
                    let _ = self.state.submit();
                }
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            let title = match self.state.mode() {
                PanelMode::Compose => "New thread".to_string(),
                PanelMode::Reply { group_hash } => self
                    .state
                    .threads
                    .find(group_hash)
                    .map(|group| group.title())
                    .unwrap_or_else(|| "Thread".to_string()),
            };
            if let Some(project) = &self.state.project {
                ui.label(egui::RichText::new(&project.title).weak());
            }
            ui.heading(title);
            ui.separator();

            if self.state.open_thread().is_some() && comment_area::render(ui, &mut self.state) {
                self.state.load_older();
            }
        });

        self.flush_commands();
        ctx.request_repaint_after(Duration::from_millis(100));
    }
}
