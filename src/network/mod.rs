pub mod api;
pub mod error;
pub mod worker;

pub use api::{ApiClient, StaticToken, TokenSource};
pub use error::ApiError;
pub use worker::{MessengerWorker, WorkerSettings};
