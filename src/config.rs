use serde::Deserialize;

use anyhow::{Context, Result};

use crate::constants::{
    ANONYMOUS_PASSWORD, ANONYMOUS_USER, FTP_CONTROL_PORT, TRANSFER_BUFFER_SIZE,
};

#[derive(Debug, Default, Deserialize)]
pub struct ClientConfig {
    pub control_port: Option<u16>,
    pub transfer_buffer_size: Option<usize>, // Optional to allow default value
    pub anonymous_user: Option<String>,
    pub anonymous_password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub client: ClientConfig,
}

impl ClientConfig {
    pub fn control_port(&self) -> u16 {
        self.control_port.unwrap_or(FTP_CONTROL_PORT)
    }

    pub fn transfer_buffer_size(&self) -> usize {
        self.transfer_buffer_size.unwrap_or(TRANSFER_BUFFER_SIZE)
    }

    pub fn anonymous_user(&self) -> &str {
        self.anonymous_user.as_deref().unwrap_or(ANONYMOUS_USER)
    }

    pub fn anonymous_password(&self) -> &str {
        self.anonymous_password
            .as_deref()
            .unwrap_or(ANONYMOUS_PASSWORD)
    }
}

pub fn load_config(path: &str) -> Result<Config> {
    let config_str = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration file: {}", path))?;
    let config = toml::from_str(&config_str)
        .with_context(|| format!("Failed to parse configuration file: {}", path))?;
    Ok(config)
}
