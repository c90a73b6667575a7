pub mod analyze;

use crate::config::AnalyzerConfig;
use crate::db::Database;
use crate::llm::GeminiClient;
use tauri::Manager;

pub struct AppState {
    pub db: Database,
    pub model: GeminiClient,
}

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tauri::Builder::default()
        .plugin(tauri_plugin_dialog::init())
        .setup(|app| {
            let app_dir = app.path().app_data_dir()?;
            let config = AnalyzerConfig::from_env()?.db_path(app_dir.join("documents.db"));
            let db = Database::open(&config.db_path)?;
            if config.reset_on_start {
                db.reset_schema()?;
            }
            app.manage(AppState {
                db,
                model: GeminiClient::new(config.gemini()),
            });
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            analyze::analyze_document,
            analyze::save_report,
            analyze::list_documents,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
