pub mod config;
pub mod error;

pub use config::{CatalogConfig, InstallConfig, SkillbookConfig};
pub use error::CommandError;
