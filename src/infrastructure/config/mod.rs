// ============================================================
// CONFIG
// ============================================================
// Layered configuration: compiled defaults, then conversor.toml, then
// CONVERSOR_* environment variables, last writer wins.

use crate::domain::error::{AppError, Result};
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub upload_root: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            upload_root: PathBuf::from("uploads"),
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        Self::figment()
            .extract()
            .map_err(|e| AppError::Internal(format!("configuração inválida: {}", e)))
    }

    fn figment() -> Figment {
        Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file("conversor.toml"))
            .merge(Env::prefixed("CONVERSOR_"))
    }
}
