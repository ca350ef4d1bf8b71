use dotenvy::dotenv;
use std::{env, net::SocketAddr, path::PathBuf, str::FromStr};

use crate::errors::ConfigError;

pub const DEFAULT_MAX_PART_SIZE: usize = 10 * 1024 * 1024;
pub const DEFAULT_MAX_BODY_SIZE: usize = 100 * 1024 * 1024;
pub const DEFAULT_UPLOAD_DIR: &str = "./public/img";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageType {
    Local,
    Memory,
}

impl FromStr for StorageType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "local" => Ok(StorageType::Local),
            "memory" => Ok(StorageType::Memory),
            other => Err(ConfigError::InvalidStorageType(other.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub storage_type: StorageType,
    pub upload_dir: PathBuf,
    pub max_part_size: usize,
    pub max_body_size: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            storage_type: StorageType::Local,
            upload_dir: PathBuf::from(DEFAULT_UPLOAD_DIR),
            max_part_size: DEFAULT_MAX_PART_SIZE,
            max_body_size: DEFAULT_MAX_BODY_SIZE,
        }
    }
}

impl AppConfig {
    /// Reads `.env` if present, then the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup, falling back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        Ok(Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: parse_number(&lookup, "PORT", defaults.port)?,
            storage_type: match lookup("STORAGE_TYPE") {
                Some(value) => value.parse()?,
                None => defaults.storage_type,
            },
            upload_dir: lookup("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.upload_dir),
            max_part_size: parse_number(&lookup, "MAX_PART_SIZE", defaults.max_part_size)?,
            max_body_size: parse_number(&lookup, "MAX_BODY_SIZE", defaults.max_body_size)?,
        })
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let addr = format!("{}:{}", self.host, self.port);
        addr.parse().map_err(|_| ConfigError::InvalidAddr(addr))
    }
}

fn parse_number<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidNumber { key, value }),
        None => Ok(default),
    }
}
