pub mod database;
pub mod local_storage;

pub use local_storage::{LocalStorage, TOKEN_KEY};
