pub mod composer;
pub mod pager;
pub mod previews;
pub mod threads;

pub use composer::{
    AttachmentLimits, Composer, ComposerError, Draft, FileCandidate, PendingAttachment,
    format_size,
};
pub use pager::{CommentSource, CursorPager, PageSource, PagedItem, RequestId, fetch_all};
pub use previews::{PreviewRegistry, PreviewUrl};
pub use threads::ThreadList;
