use std::path::PathBuf;

use crate::common::{
    Comment, MessengerCommand, MessengerEvent, ProjectDetail, RequestKind, SendRequest, SendTarget,
};
use crate::config::AppConfig;
use crate::messenger::{
    Composer, ComposerError, CursorPager, FileCandidate, PreviewRegistry, ThreadList,
};

/// Which pane the composer writes into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelMode {
    /// Starting a new thread; recipients are picked.
    Compose,
    Reply { group_hash: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendPhase {
    Idle,
    Submitting,
}

/// Trạng thái cục bộ của UI.
///
/// Pure state: user actions queue `MessengerCommand`s in an outbox the app
/// drains each frame, and worker results come back through `apply_event`.
pub struct AppState {
    pub project: Option<ProjectDetail>,
    pub threads: ThreadList,
    pub comments: CursorPager<Comment>,
    pub composer: Composer,
    pub search_input: String,
    pub attach_path_input: String,
    mode: PanelMode,
    phase: SendPhase,
    error: Option<String>,
    scroll_to_latest: bool,
    outbox: Vec<MessengerCommand>,
}

impl AppState {
    pub fn new(config: &AppConfig, previews: PreviewRegistry) -> Self {
        Self {
            project: None,
            threads: ThreadList::new(config.threads_per_page),
            comments: CursorPager::new(),
            composer: Composer::new(config.attachment_limits(), previews),
            search_input: String::new(),
            attach_path_input: String::new(),
            mode: PanelMode::Compose,
            phase: SendPhase::Idle,
            error: None,
            scroll_to_latest: false,
            outbox: Vec::new(),
        }
    }

    pub fn mode(&self) -> &PanelMode {
        &self.mode
    }

    pub fn is_submitting(&self) -> bool {
        self.phase == SendPhase::Submitting
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    pub fn open_thread(&self) -> Option<&str> {
        match &self.mode {
            PanelMode::Reply { group_hash } => Some(group_hash),
            PanelMode::Compose => None,
        }
    }

    /// Commands queued since the last call.
    pub fn drain_commands(&mut self) -> Vec<MessengerCommand> {
        std::mem::take(&mut self.outbox)
    }

    /// True once after an initial comment page arrived.
    pub fn take_scroll_to_latest(&mut self) -> bool {
        std::mem::replace(&mut self.scroll_to_latest, false)
    }

    pub fn start(&mut self) {
        self.outbox.push(MessengerCommand::LoadProject);
        self.load_threads(1, None);
    }

    fn load_threads(&mut self, page: u32, query: Option<String>) {
        let (page, query) = self.threads.request(page, query);
        self.outbox.push(MessengerCommand::LoadThreads { page, query });
    }

    pub fn search(&mut self) {
        let query = Some(self.search_input.clone());
        self.load_threads(1, query);
    }

    pub fn next_page(&mut self) {
        if self.threads.has_next() {
            let query = self.threads.query().map(str::to_string);
            self.load_threads(self.threads.page() + 1, query);
        }
    }

    pub fn previous_page(&mut self) {
        if self.threads.has_previous() {
            let query = self.threads.query().map(str::to_string);
            self.load_threads(self.threads.page() - 1, query);
        }
    }

    pub fn select_thread(&mut self, group_hash: &str) {
        self.mode = PanelMode::Reply {
            group_hash: group_hash.to_string(),
        };
        self.load_latest_comments(group_hash.to_string());
    }

    fn load_latest_comments(&mut self, group_hash: String) {
        let request = self.comments.begin_initial();
        self.outbox.push(MessengerCommand::LoadComments {
            group_hash,
            before_id: None,
            request,
        });
    }

    pub fn start_new_thread(&mut self) {
        self.mode = PanelMode::Compose;
        self.comments.clear();
    }

    pub fn load_older(&mut self) {
        let Some(group_hash) = self.open_thread().map(str::to_string) else {
            return;
        };
        if let Some((request, before_id)) = self.comments.begin_older() {
            self.outbox.push(MessengerCommand::LoadComments {
                group_hash,
                before_id: Some(before_id),
                request,
            });
        }
    }

    pub fn add_files(&mut self, candidates: Vec<FileCandidate>) {
        if let Err(err) = self.composer.add_files(candidates) {
            self.error = Some(err.to_string());
        }
    }

    /// Attach local paths (typed in or dropped onto the window).
    pub fn attach_paths(&mut self, paths: Vec<PathBuf>) {
        let mut candidates = Vec::with_capacity(paths.len());
        for path in paths {
            match FileCandidate::from_path(&path) {
                Some(candidate) => candidates.push(candidate),
                None => {
                    self.error = Some(format!("Cannot attach {}", path.display()));
                    return;
                }
            }
        }
        self.add_files(candidates);
    }

    pub fn attach_from_input(&mut self) {
        let input = self.attach_path_input.trim().to_string();
        if input.is_empty() {
            return;
        }
        self.attach_path_input.clear();
        self.attach_paths(vec![PathBuf::from(input)]);
    }

    /// Validate the draft and queue it. Invalid drafts never reach the network.
    pub fn submit(&mut self) -> Result<(), ComposerError> {
        let result = self.try_submit();
        if let Err(err) = &result {
            self.error = Some(err.to_string());
        }
        result
    }

    fn try_submit(&mut self) -> Result<(), ComposerError> {
        if self.is_submitting() {
            return Err(ComposerError::Busy);
        }
        let new_thread = self.mode == PanelMode::Compose;
        let draft = self.composer.validate(new_thread)?;

        let target = match &self.mode {
            PanelMode::Compose => SendTarget::NewThread {
                recipient_ids: draft.recipient_ids,
            },
            PanelMode::Reply { group_hash } => SendTarget::Reply {
                group_hash: group_hash.clone(),
            },
        };
        self.outbox.push(MessengerCommand::Send(SendRequest {
            target,
            subject: draft.payload.subject,
            message: draft.payload.message,
            attachments: draft.attachments,
        }));
        self.phase = SendPhase::Submitting;
        self.error = None;
        Ok(())
    }

    pub fn apply_event(&mut self, event: MessengerEvent) {
        match event {
            MessengerEvent::ProjectLoaded(project) => {
                self.composer.set_recipients(project.recipient_candidates());
                self.project = Some(project);
            }
            MessengerEvent::ThreadsLoaded {
                page,
                query,
                result,
            } => {
                self.threads.apply(page, query.as_deref(), result);
            }
            MessengerEvent::CommentsLoaded {
                group_hash,
                request,
                initial,
                page,
            } => {
                if self.open_thread() != Some(group_hash.as_str()) {
                    log::debug!("Discarding comments of closed thread {group_hash}");
                    return;
                }
                if self.comments.apply_page(request, page) && initial {
                    self.scroll_to_latest = true;
                }
            }
            MessengerEvent::ThreadCreated { group_hash } => {
                // The thread exists from now on, even if the first comment fails.
                self.mode = PanelMode::Reply { group_hash };
                self.comments.clear();
            }
            MessengerEvent::CommentPosted { group_hash, .. } => {
                self.composer.clear();
                self.phase = SendPhase::Idle;
                self.error = None;
                self.mode = PanelMode::Reply {
                    group_hash: group_hash.clone(),
                };
                let query = self.threads.active_query().map(str::to_string);
                self.load_threads(1, query);
                self.load_latest_comments(group_hash);
            }
            MessengerEvent::RequestFailed { kind, message } => {
                let current = match kind {
                    RequestKind::Project => true,
                    RequestKind::Threads { page, query } => {
                        self.threads.fail(page, query.as_deref())
                    }
                    RequestKind::Comments {
                        group_hash,
                        request,
                    } => {
                        self.open_thread() == Some(group_hash.as_str())
                            && self.comments.fail(request)
                    }
                    RequestKind::Send => {
                        self.phase = SendPhase::Idle;
                        true
                    }
                };
                if current {
                    self.error = Some(message);
                } else {
                    log::debug!("Ignoring failure of a superseded request: {message}");
                }
            }
        }
    }
}
