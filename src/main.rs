use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use rxlens::analysis::PrescriptionAnalyzer;
use rxlens::api::server::serve;
use rxlens::api::types::ApiContext;
use rxlens::config::{self, Config};
use rxlens::db::sqlite::open_database;
use rxlens::druginfo::OpenFdaClient;
use rxlens::vision::GeminiVisionClient;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let cfg = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            std::process::exit(1);
        }
    };

    if cfg.vision_api_key.is_none() {
        tracing::warn!("GEMINI_API_KEY is not set; analysis requests will fail until it is");
    }

    if let Err(e) = std::fs::create_dir_all(&cfg.data_dir) {
        tracing::error!(dir = %cfg.data_dir.display(), error = %e, "Cannot create data directory");
        std::process::exit(1);
    }

    let conn = match open_database(&cfg.db_path()) {
        Ok(conn) => conn,
        Err(e) => {
            tracing::error!(error = %e, "Cannot open database");
            std::process::exit(1);
        }
    };

    let vision = Arc::new(GeminiVisionClient::new(
        &cfg.vision_base_url,
        &cfg.vision_model,
        cfg.vision_api_key.clone(),
    ));
    let drug_info = Arc::new(OpenFdaClient::new(&cfg.fda_base_url));
    let analyzer = Arc::new(PrescriptionAnalyzer::new(vision, drug_info));

    let ctx = ApiContext::new(conn, analyzer);

    if let Err(e) = serve(ctx, cfg.bind_addr).await {
        tracing::error!(error = %e, "Server exited with error");
        std::process::exit(1);
    }
}
