use std::error::Error;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use team_messenger::common::Comment;
use team_messenger::config::{self, AppConfig};
use team_messenger::messenger::{CommentSource, CursorPager, PreviewRegistry, fetch_all};
use team_messenger::network::{ApiClient, MessengerWorker, TokenSource, WorkerSettings};
use team_messenger::storage::{LocalStorage, TOKEN_KEY};
use team_messenger::ui::{AppState, MessengerApp};
use tokio::sync::mpsc;

#[derive(Parser)]
#[command(
    name = "team_messenger",
    version,
    about = "Team messaging panel for marketplace projects"
)]
struct Cli {
    /// Path to JSON config file
    #[arg(long, default_value = config::DEFAULT_CONFIG_PATH, value_name = "FILE")]
    config: String,
    /// Project whose threads are shown
    #[arg(long, value_name = "HASH")]
    project: Option<String>,
    /// Backend base URL
    #[arg(long, value_name = "URL")]
    api_url: Option<String>,
    #[command(subcommand)]
    mode: Option<Mode>,
}

#[derive(Subcommand, Clone, PartialEq, Eq)]
enum Mode {
    /// Store the bearer token used for API calls
    Login { token: String },
    /// Forget the stored token
    Logout,
    /// Print every comment of a thread, oldest first, as JSON lines
    Export { group_hash: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv().ok();
    // Khởi tạo Logger để debug
    env_logger::init();

    let cli = Cli::parse();
    let mut app_config = config::load_config(&cli.config);
    app_config.apply_env_overrides(|key| std::env::var(key).ok());
    if let Some(url) = cli.api_url {
        app_config.api_base_url = url;
    }
    if let Some(project) = cli.project {
        app_config.project_hash = Some(project);
    }

    let storage = Arc::new(LocalStorage::with_path(&app_config.database_path)?);

    match cli.mode {
        Some(Mode::Login { token }) => {
            storage.set_item(TOKEN_KEY, token.trim())?;
            log::info!("Stored API token in {}", app_config.database_path);
            Ok(())
        }
        Some(Mode::Logout) => {
            storage.remove_item(TOKEN_KEY)?;
            log::info!("Removed API token");
            Ok(())
        }
        Some(Mode::Export { group_hash }) => export_thread(&app_config, storage, &group_hash).await,
        None => run_full_client(app_config, storage).await,
    }
}

async fn export_thread(
    app_config: &AppConfig,
    tokens: Arc<dyn TokenSource>,
    group_hash: &str,
) -> Result<(), Box<dyn Error>> {
    let api = ApiClient::new(&app_config.api_base_url, tokens)?;
    let source = CommentSource {
        client: &api,
        group_hash,
        limit: app_config.comments_page_size,
    };
    let mut pager: CursorPager<Comment> = CursorPager::new();
    let requests = fetch_all(&source, &mut pager).await?;
    log::info!(
        "Fetched {} comments of {group_hash} in {requests} requests",
        pager.items().len()
    );

    for comment in pager.items() {
        println!("{}", serde_json::to_string(comment)?);
    }
    Ok(())
}

async fn run_full_client(
    app_config: AppConfig,
    tokens: Arc<dyn TokenSource>,
) -> Result<(), Box<dyn Error>> {
    let Some(project_hash) = app_config.project_hash.clone() else {
        return Err("no project configured; pass --project or set MESSENGER_PROJECT_HASH".into());
    };
    let api = ApiClient::new(&app_config.api_base_url, tokens)?;

    // 1. Tạo các kênh giao tiếp (Channels)
    // UI -> Network
    let (cmd_tx, cmd_rx) = mpsc::channel(100);
    // Network -> UI
    let (event_tx, event_rx) = mpsc::channel(100);

    // 2. Khởi chạy Network Worker (Chạy ngầm)
    let settings = WorkerSettings {
        project_hash,
        threads_per_page: app_config.threads_per_page,
        comments_page_size: app_config.comments_page_size,
    };
    tokio::spawn(MessengerWorker::new(api, settings, event_tx, cmd_rx).run());

    // 3. Khởi chạy UI (Chạy trên Main Thread)
    let options = eframe::NativeOptions::default();
    let state = AppState::new(&app_config, PreviewRegistry::new());

    log::info!("Connecting to {}", app_config.api_base_url);

    eframe::run_native(
        "Team Messenger",
        options,
        Box::new(move |cc| Ok(Box::new(MessengerApp::new(cc, state, cmd_tx, event_rx)))),
    )?;
    Ok(())
}
