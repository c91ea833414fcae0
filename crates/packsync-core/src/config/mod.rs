//! Deployment configuration.
//!
//! A single TOML file describes where the modpack source and the server
//! live, how to reach the container, and which optional stages run.

pub mod parser;
pub mod schema;

pub use parser::{load_config, parse_config_str};
pub use schema::{
    API_KEY_ENV, CurseForgeConfig, DeployConfig, DeploySettings, DockerConfig, GitConfig,
    MANAGED_FOLDERS, MinecraftConfig, NetworkConfig, NotifyConfig, PathsConfig,
};
