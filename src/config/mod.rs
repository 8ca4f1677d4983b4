mod defaults;
mod io;
mod schema;
mod validate;

pub use io::{CONFIG_PATH_ENV, DEFAULT_CONFIG_PATH, config_path_from_env, load_config};
pub use schema::{Config, DetectorConfig, IngestConfig, PublisherConfig, TelegramConfig};
pub use validate::ConfigError;
