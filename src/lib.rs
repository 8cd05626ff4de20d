pub mod common;
pub mod config;
pub mod messenger;
pub mod network;
pub mod storage;
pub mod ui;
