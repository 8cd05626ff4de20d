pub mod commands;
pub mod events;
pub mod types;

pub use commands::{MessengerCommand, SendRequest, SendTarget, UploadFile};
pub use events::{MessengerEvent, RequestKind};
pub use types::{
    Attachment, Comment, CommentGroup, CommentPage, CommentPayload, CommentPreview,
    CreatedThread, NextCursor, Page, ProjectDetail, Recipient, ThreadPage, UserSummary,
};
