use conversor::infrastructure::config::AppConfig;
use conversor::infrastructure::storage;
use conversor::interfaces::http;
use tracing_subscriber::EnvFilter;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::load()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()))?;
    storage::ensure_upload_root(&config.upload_root)?;

    tracing::info!(host = %config.host, port = config.port, "starting conversor");
    http::start_server(config)?.await
}
