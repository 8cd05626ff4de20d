use std::path::PathBuf;

use super::events::RequestKind;

/// Lệnh UI gửi xuống tầng mạng.
#[derive(Debug, Clone, PartialEq)]
pub enum MessengerCommand {
    /// Fetch the project detail to build the recipient candidates.
    LoadProject,
    LoadThreads {
        page: u32,
        query: Option<String>,
    },
    /// `before_id = None` loads the newest page of the thread. `request` is
    /// echoed back so superseded pages can be told apart.
    LoadComments {
        group_hash: String,
        before_id: Option<i64>,
        request: u64,
    },
    Send(SendRequest),
}

impl MessengerCommand {
    /// The request this command issues, for error attribution.
    pub fn request_kind(&self) -> RequestKind {
        match self {
            Self::LoadProject => RequestKind::Project,
            Self::LoadThreads { page, query } => RequestKind::Threads {
                page: *page,
                query: query.clone(),
            },
            Self::LoadComments {
                group_hash,
                request,
                ..
            } => RequestKind::Comments {
                group_hash: group_hash.clone(),
                request: *request,
            },
            Self::Send(_) => RequestKind::Send,
        }
    }
}

/// Where a composed message goes.
#[derive(Debug, Clone, PartialEq)]
pub enum SendTarget {
    NewThread { recipient_ids: Vec<i64> },
    Reply { group_hash: String },
}

/// A local file to upload with a comment.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadFile {
    pub path: PathBuf,
    pub file_name: String,
    pub mime: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SendRequest {
    pub target: SendTarget,
    pub subject: Option<String>,
    pub message: Option<String>,
    pub attachments: Vec<UploadFile>,
}
