use tokio::sync::{mpsc, oneshot};

use crate::common::{
    CommentPayload, MessengerCommand, MessengerEvent, RequestKind, SendRequest, SendTarget,
};
use crate::messenger::{CommentSource, PageSource};

use super::api::ApiClient;
use super::error::ApiError;

/// Per-project settings of the worker.
#[derive(Debug, Clone)]
pub struct WorkerSettings {
    pub project_hash: String,
    pub threads_per_page: u32,
    pub comments_page_size: u32,
}

/// Shared by every spawned request task.
#[derive(Clone)]
struct WorkerContext {
    api: ApiClient,
    settings: WorkerSettings,
    event_sender: mpsc::Sender<MessengerEvent>,
}

/// Executes UI commands against the backend and reports results as events.
pub struct MessengerWorker {
    context: WorkerContext,
    command_receiver: mpsc::Receiver<MessengerCommand>,
}

impl MessengerWorker {
    pub fn new(
        api: ApiClient,
        settings: WorkerSettings,
        event_sender: mpsc::Sender<MessengerEvent>,
        command_receiver: mpsc::Receiver<MessengerCommand>,
    ) -> Self {
        Self {
            context: WorkerContext {
                api,
                settings,
                event_sender,
            },
            command_receiver,
        }
    }

    /// Serve commands until the UI drops its sender.
    ///
    /// Every command runs on its own task. The project fetch is abortable: a
    /// newer `LoadProject` or the end of this loop cancels it.
    pub async fn run(mut self) {
        log::info!(
            "Messenger worker started for project {}",
            self.context.settings.project_hash
        );
        let mut project_abort: Option<oneshot::Sender<()>> = None;

        while let Some(command) = self.command_receiver.recv().await {
            let context = self.context.clone();
            match command {
                MessengerCommand::LoadProject => {
                    let (abort_tx, abort_rx) = oneshot::channel();
                    // Dropping the previous sender aborts a superseded fetch.
                    project_abort = Some(abort_tx);
                    tokio::spawn(async move { context.load_project(abort_rx).await });
                }
                MessengerCommand::LoadThreads { page, query } => {
                    tokio::spawn(async move { context.load_threads(page, query).await });
                }
                MessengerCommand::LoadComments {
                    group_hash,
                    before_id,
                    request,
                } => {
                    tokio::spawn(async move {
                        context.load_comments(group_hash, before_id, request).await
                    });
                }
                MessengerCommand::Send(request) => {
                    tokio::spawn(async move { context.send(request).await });
                }
            }
        }

        drop(project_abort);
        log::info!("Messenger worker stopped");
    }
}

impl WorkerContext {
    async fn emit(&self, event: MessengerEvent) {
        if self.event_sender.send(event).await.is_err() {
            log::debug!("UI is gone; dropping late result");
        }
    }

    async fn report(&self, kind: RequestKind, err: ApiError) {
        if err.is_aborted() {
            log::debug!("{kind:?} request aborted");
            return;
        }
        log::warn!("{kind:?} request failed: {err}");
        self.emit(MessengerEvent::RequestFailed {
            kind,
            message: err.to_string(),
        })
        .await;
    }

    async fn load_project(&self, abort: oneshot::Receiver<()>) {
        let hash = &self.settings.project_hash;
        let result = tokio::select! {
            result = self.api.get_project(hash) => result,
            _ = abort => Err(ApiError::Aborted),
        };
        match result {
            Ok(project) => {
                log::info!("Loaded project {} ({})", project.hash, project.title);
                self.emit(MessengerEvent::ProjectLoaded(project)).await;
            }
            Err(err) => self.report(RequestKind::Project, err).await,
        }
    }

    async fn load_threads(&self, page: u32, query: Option<String>) {
        let result = self
            .api
            .list_comment_groups(
                &self.settings.project_hash,
                page,
                self.settings.threads_per_page,
                query.as_deref(),
            )
            .await;
        match result {
            Ok(result) => {
                self.emit(MessengerEvent::ThreadsLoaded {
                    page,
                    query,
                    result,
                })
                .await;
            }
            Err(err) => self.report(RequestKind::Threads { page, query }, err).await,
        }
    }

    async fn load_comments(&self, group_hash: String, before_id: Option<i64>, request: u64) {
        let source = CommentSource {
            client: &self.api,
            group_hash: &group_hash,
            limit: self.settings.comments_page_size,
        };
        let result = source.fetch_page(before_id).await;
        match result {
            Ok(page) => {
                self.emit(MessengerEvent::CommentsLoaded {
                    group_hash,
                    request,
                    initial: before_id.is_none(),
                    page,
                })
                .await;
            }
            Err(err) => {
                self.report(RequestKind::Comments { group_hash, request }, err)
                    .await;
            }
        }
    }

    /// Create the thread if needed, then post the comment. The UI refreshes
    /// both panes once `CommentPosted` arrives.
    async fn send(&self, request: SendRequest) {
        let group_hash = match request.target {
            SendTarget::Reply { group_hash } => group_hash,
            SendTarget::NewThread { recipient_ids } => {
                match self
                    .api
                    .create_comment_group(&self.settings.project_hash, &recipient_ids)
                    .await
                {
                    Ok(group_hash) => {
                        log::info!(
                            "Created thread {group_hash} with {} recipients",
                            recipient_ids.len()
                        );
                        self.emit(MessengerEvent::ThreadCreated {
                            group_hash: group_hash.clone(),
                        })
                        .await;
                        group_hash
                    }
                    Err(err) => {
                        self.report(RequestKind::Send, err).await;
                        return;
                    }
                }
            }
        };

        let payload = CommentPayload {
            subject: request.subject,
            message: request.message,
        };
        match self
            .api
            .post_comment(&group_hash, &payload, &request.attachments)
            .await
        {
            Ok(comment) => {
                log::info!(
                    "Posted comment {} to {group_hash} ({} attachments)",
                    comment.id,
                    request.attachments.len()
                );
                self.emit(MessengerEvent::CommentPosted {
                    group_hash: group_hash.clone(),
                    comment,
                })
                .await;
            }
            Err(err) => self.report(RequestKind::Send, err).await,
        }
    }
}
