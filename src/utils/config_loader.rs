use std::path::Path;
use anyhow::{Context, Result};

use crate::config::sources::ServiceConfig;
use crate::config::proc_loader::file_to_config;

pub async fn run(config_path: &str) -> Result<ServiceConfig> {
    let path = Path::new(config_path);
    file_to_config(path)
        .await
        .with_context(|| format!("Invalid config '{}'", config_path))
}
