use anyhow::Context;
use clap::Parser;
use serde::Deserialize;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_DATABASE: &str = "mail_atlas.db";
pub const DEFAULT_GEO_API_URL: &str = "https://ipgeolocation.abstractapi.com/v1/";
pub const DEFAULT_STATIC_DIR: &str = "static";

#[derive(Parser, Debug, Clone)]
#[command(name = "mail-atlas")]
#[command(version = "0.1.0")]
#[command(about = "Inbound email geolocation tracker", long_about = None)]
pub struct Args {
    /// Host to bind the HTTP server to
    #[arg(long, env = "ATLAS_HOST", default_value = DEFAULT_HOST)]
    pub host: String,

    /// Port to bind the HTTP server to
    #[arg(short = 'p', long, env = "ATLAS_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Database file path
    #[arg(short = 'd', long, env = "ATLAS_DATABASE", default_value = DEFAULT_DATABASE)]
    pub database: String,

    /// Geolocation API key
    #[arg(long, env = "GEOLOCATION_API_KEY")]
    pub api_key: Option<String>,

    /// Geolocation API base URL
    #[arg(long, env = "ATLAS_GEO_API_URL", default_value = DEFAULT_GEO_API_URL)]
    pub geo_api_url: String,

    /// Directory with the static map frontend
    #[arg(long, env = "ATLAS_STATIC_DIR", default_value = DEFAULT_STATIC_DIR)]
    pub static_dir: String,

    /// Verbose output
    #[arg(short = 'v', long, env = "ATLAS_VERBOSE")]
    pub verbose: bool,

    /// Optional TOML config file
    #[arg(short = 'c', long, env = "ATLAS_CONFIG")]
    pub config: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    host: Option<String>,
    port: Option<u16>,
    database: Option<String>,
    api_key: Option<String>,
    geo_api_url: Option<String>,
    static_dir: Option<String>,
    verbose: Option<bool>,
}

impl Args {
    /// Merge values from the optional TOML config file. File values
    /// replace built-in defaults only; anything set explicitly on the
    /// command line or via environment wins over the file.
    pub fn merge_with_config(mut self) -> anyhow::Result<Self> {
        let Some(path) = self.config.clone() else {
            return Ok(self);
        };

        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path))?;
        let file: FileConfig =
            toml::from_str(&text).with_context(|| format!("Invalid config file: {}", path))?;

        if self.host == DEFAULT_HOST {
            if let Some(host) = file.host {
                self.host = host;
            }
        }
        if self.port == DEFAULT_PORT {
            if let Some(port) = file.port {
                self.port = port;
            }
        }
        if self.database == DEFAULT_DATABASE {
            if let Some(database) = file.database {
                self.database = database;
            }
        }
        if self.api_key.is_none() {
            self.api_key = file.api_key;
        }
        if self.geo_api_url == DEFAULT_GEO_API_URL {
            if let Some(url) = file.geo_api_url {
                self.geo_api_url = url;
            }
        }
        if self.static_dir == DEFAULT_STATIC_DIR {
            if let Some(dir) = file.static_dir {
                self.static_dir = dir;
            }
        }
        if let Some(verbose) = file.verbose {
            self.verbose = self.verbose || verbose;
        }

        Ok(self)
    }
}
