use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;

use crate::storage::{FileStorage, LocalStorage, MemoryStorage};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppConfig {
    pub storage_path: Option<PathBuf>,
    pub rng_seed: Option<u64>,
    pub log_json: bool,
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let _ = dotenvy::dotenv();

        let rng_seed = match non_empty_var("QUIZ_RNG_SEED") {
            Some(raw) => Some(
                raw.trim()
                    .parse::<u64>()
                    .map_err(|e| anyhow::anyhow!("QUIZ_RNG_SEED must be an unsigned integer: {}", e))?,
            ),
            None => None,
        };
        let log_json = non_empty_var("QUIZ_LOG_JSON")
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Ok(Self {
            storage_path: non_empty_var("QUIZ_STORAGE_PATH").map(PathBuf::from),
            rng_seed,
            log_json,
        })
    }
}

pub fn build_storage(config: &AppConfig) -> Box<dyn LocalStorage> {
    match &config.storage_path {
        Some(path) => Box::new(FileStorage::open(path)),
        None => Box::new(MemoryStorage::new()),
    }
}

pub fn build_rng(config: &AppConfig) -> StdRng {
    match config.rng_seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}
