pub mod config;
pub mod error;
pub mod flow;
pub mod models;
pub mod review;
pub mod scorer;
pub mod selector;
pub mod session;
pub mod storage;
pub mod store;
pub mod summary;
pub mod tracker;

use tracing_subscriber::EnvFilter;

pub use error::QuizError;

pub fn init_tracing(config: &config::AppConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::from_default_env().add_directive("info".parse()?);
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if config.log_json {
        builder
            .json()
            .try_init()
            .map_err(|e| anyhow::anyhow!("failed to install subscriber: {}", e))
    } else {
        builder
            .try_init()
            .map_err(|e| anyhow::anyhow!("failed to install subscriber: {}", e))
    }
}
