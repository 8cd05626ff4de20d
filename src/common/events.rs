use super::types::{Comment, CommentPage, ProjectDetail, ThreadPage};

/// Which request an error belongs to.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestKind {
    Project,
    Threads { page: u32, query: Option<String> },
    /// `request` is the ticket the comment pager issued.
    Comments { group_hash: String, request: u64 },
    Send,
}

/// Sự kiện từ tầng mạng gửi lên UI.
#[derive(Debug, Clone)]
pub enum MessengerEvent {
    ProjectLoaded(ProjectDetail),
    ThreadsLoaded {
        page: u32,
        query: Option<String>,
        result: ThreadPage,
    },
    CommentsLoaded {
        group_hash: String,
        request: u64,
        initial: bool,
        page: CommentPage,
    },
    /// Step one of a new thread succeeded; the first comment is still pending.
    ThreadCreated { group_hash: String },
    CommentPosted {
        group_hash: String,
        comment: Comment,
    },
    RequestFailed { kind: RequestKind, message: String },
}
