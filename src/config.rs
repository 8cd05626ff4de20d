use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::messenger::AttachmentLimits;

pub const DEFAULT_CONFIG_PATH: &str = "config/messenger.json";

pub const ENV_API_URL: &str = "MESSENGER_API_URL";
pub const ENV_PROJECT_HASH: &str = "MESSENGER_PROJECT_HASH";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
    pub api_base_url: String,
    pub project_hash: Option<String>,
    pub threads_per_page: u32,
    pub comments_page_size: u32,
    pub max_attachments: usize,
    pub max_attachment_bytes: u64,
    pub database_path: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:3000/api".to_string(),
            project_hash: None,
            threads_per_page: 20,
            comments_page_size: 20,
            max_attachments: 10,
            max_attachment_bytes: 25 * 1024 * 1024,
            database_path: "data/client.db".to_string(),
        }
    }
}

impl AppConfig {
    /// Apply `MESSENGER_*` overrides; `lookup` is usually `std::env::var(..).ok()`.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_API_URL).filter(|value| !value.trim().is_empty()) {
            self.api_base_url = url.trim().to_string();
        }
        if let Some(hash) = lookup(ENV_PROJECT_HASH).filter(|value| !value.trim().is_empty()) {
            self.project_hash = Some(hash.trim().to_string());
        }
    }

    pub fn attachment_limits(&self) -> AttachmentLimits {
        AttachmentLimits {
            max_count: self.max_attachments,
            max_total_bytes: self.max_attachment_bytes,
        }
    }
}

pub fn load_config(path: &str) -> AppConfig {
    let path = Path::new(path);
    match fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str::<AppConfig>(&content) {
            Ok(config) => config,
            Err(err) => {
                log::warn!("Failed to parse config file {}: {err}", path.display());
                AppConfig::default()
            }
        },
        Err(err) => {
            log::info!(
                "Config file {} not found ({err}); using defaults",
                path.display()
            );
            AppConfig::default()
        }
    }
}
