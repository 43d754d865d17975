use searchdeck::config::AppConfig;
use searchdeck::core::logging;
use searchdeck::database::Database;
use searchdeck::server::{self, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    let _log_guard = logging::init();
    log::info!("SearchDeck v{} starting", searchdeck::VERSION);

    let config = AppConfig::load();
    let db = Database::open(&config.database_path()).await?;

    let state = AppState::new(config, db);
    server::serve(state).await
}
