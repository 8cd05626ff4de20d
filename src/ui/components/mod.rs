pub mod comment_area;
pub mod composer;
pub mod recipients;
pub mod thread_list;
