use anyhow::{Context, Result, anyhow};
use dotenvy::dotenv;
use serde::Deserialize;
use std::{fs, time::Duration};
use url::Url;

use griot::client::DEFAULT_PIPE_CAPACITY;

const ENV_PREFIX: &str = "GRIOT_";

#[derive(Debug, Deserialize, Default)]
struct ConfigFile {
    content_base_url: Option<Url>,
    upload_timeout: Option<String>,
    pipe_capacity: Option<usize>,
}

#[derive(Debug, Deserialize, Default)]
struct ConfigEnv {
    content_base_url: Option<Url>,
    upload_timeout: Option<String>,
    pipe_capacity: Option<usize>,
}

#[derive(Debug)]
pub struct Config {
    pub content_base_url: Url,
    pub upload_timeout: Option<Duration>,
    pub pipe_capacity: usize,
}

fn merge_config(base: ConfigFile, override_config: ConfigEnv) -> Result<Config> {
    let content_base_url = override_config
        .content_base_url
        .or(base.content_base_url)
        .ok_or(anyhow!(
            "No content service base URL provided (set {ENV_PREFIX}CONTENT_BASE_URL)"
        ))?;

    let upload_timeout = override_config
        .upload_timeout
        .or(base.upload_timeout)
        .map(|timeout| {
            humantime::parse_duration(&timeout)
                .with_context(|| format!("Invalid upload timeout: {timeout}"))
        })
        .transpose()?;

    let pipe_capacity = override_config
        .pipe_capacity
        .or(base.pipe_capacity)
        .unwrap_or(DEFAULT_PIPE_CAPACITY);

    Ok(Config {
        content_base_url,
        upload_timeout,
        pipe_capacity,
    })
}

pub fn read_config() -> Result<Config> {
    let _ = dotenv();
    let env_config = envy::prefixed(ENV_PREFIX)
        .from_env::<ConfigEnv>()
        .context("Invalid GRIOT_* environment variable")?;

    let project_dirs = directories::ProjectDirs::from("dev", "z5labs", "griot")
        .ok_or(anyhow!("Unable to determine home directory"))?;
    let config_file = project_dirs.config_dir().join("config.toml");
    let file_config = if let Ok(config) = fs::read_to_string(&config_file) {
        toml::from_str(&config)
            .with_context(|| format!("Failed to parse {}", config_file.display()))?
    } else {
        ConfigFile::default()
    };

    merge_config(file_config, env_config)
}
