pub mod config;
pub mod error;
pub mod types;

pub use config::{load_env_file, Neo4jConfig, PgConfig};
pub use error::GlasspaneError;
pub use types::*;
