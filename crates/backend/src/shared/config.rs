use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub data: DataConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DataConfig {
    /// Payables CSV; relative paths resolve next to the executable first
    pub csv_path: String,
    #[serde(default = "default_delimiter")]
    pub delimiter: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_delimiter() -> String {
    ",".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

/// Default configuration embedded in the binary
const DEFAULT_CONFIG: &str = r#"
[data]
csv_path = "contas_pagar.csv"
delimiter = ","

[server]
host = "127.0.0.1"
port = 3000
"#;

/// Load configuration from config.toml file
///
/// Search order:
/// 1. Next to the executable (copied there by build.rs)
/// 2. Falls back to embedded default config
pub fn load_config() -> anyhow::Result<Config> {
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            let config_path = exe_dir.join("config.toml");

            if config_path.exists() {
                tracing::info!("Loading config from: {}", config_path.display());
                let contents = std::fs::read_to_string(&config_path)?;
                return parse_config(&contents);
            } else {
                tracing::warn!("config.toml not found at: {}", config_path.display());
            }
        }
    }

    tracing::info!("Using default embedded configuration");
    parse_config(DEFAULT_CONFIG)
}

pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let config: Config = toml::from_str(contents)?;
    csv_delimiter(&config)?;
    Ok(config)
}

/// Delimiter as the single byte the CSV reader expects
pub fn csv_delimiter(config: &Config) -> anyhow::Result<u8> {
    match config.data.delimiter.as_bytes() {
        [byte] => Ok(*byte),
        _ => Err(anyhow::anyhow!(
            "data.delimiter must be a single ASCII character, got {:?}",
            config.data.delimiter
        )),
    }
}

/// Get the payables CSV path from configuration
///
/// Relative paths are tried next to the executable, then against the
/// current directory.
pub fn get_csv_path(config: &Config) -> PathBuf {
    let csv_path = Path::new(&config.data.csv_path);

    if csv_path.is_absolute() {
        return csv_path.to_path_buf();
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            let resolved_path = exe_dir.join(csv_path);
            if resolved_path.exists() {
                return resolved_path;
            }
        }
    }

    PathBuf::from(csv_path)
}
