//! Configuration management
//!
//! Precedence (lowest to highest): built-in defaults, `config.*` file in the
//! config directory, `CONSOLE_*` environment variables, legacy `NODE_ENV` /
//! `VUE_APP_OPEN_PROXY` overrides.

use anyhow::Result;
use serde::Deserialize;
use std::path::PathBuf;

const APP_DIR_NAME: &str = "admin-console";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Backend root every API action is appended to
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Build environment ("production" disables the dev proxy)
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Route API calls through the local dev proxy prefix
    #[serde(default)]
    pub open_proxy: bool,

    #[serde(default = "default_proxy_prefix")]
    pub proxy_prefix: String,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Action path of the navigation-menu endpoint
    #[serde(default = "default_menu_nav_path")]
    pub menu_nav_path: String,

    /// Header (and cookie) name carrying the session credential
    #[serde(default = "default_token_header")]
    pub token_header: String,

    /// View module keys shipped with the bundle, e.g. `modules/sys/user`
    #[serde(default)]
    pub view_modules: Vec<String>,
}

fn default_base_url() -> String {
    "http://localhost:8080/renren-fast".to_string()
}

fn default_environment() -> String {
    "development".to_string()
}

fn default_proxy_prefix() -> String {
    "/api".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_menu_nav_path() -> String {
    "/sys/menu/nav".to_string()
}

fn default_token_header() -> String {
    "token".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            environment: default_environment(),
            open_proxy: false,
            proxy_prefix: default_proxy_prefix(),
            request_timeout_secs: default_request_timeout_secs(),
            menu_nav_path: default_menu_nav_path(),
            token_header: default_token_header(),
            view_modules: Vec::new(),
        }
    }
}

impl Config {
    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    /// Whether API calls should use the proxy prefix instead of `base_url`
    pub fn uses_proxy(&self) -> bool {
        !self.is_production() && self.open_proxy
    }
}

/// Get config directory (XDG_CONFIG_HOME or platform default)
pub fn get_config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("CONSOLE_CONFIG_DIR") {
        return PathBuf::from(dir);
    }

    #[cfg(target_os = "macos")]
    {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home)
                .join("Library/Application Support")
                .join(APP_DIR_NAME);
        }
    }

    #[cfg(target_os = "linux")]
    {
        if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
            return PathBuf::from(xdg).join(APP_DIR_NAME);
        }
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join(".config").join(APP_DIR_NAME);
        }
    }

    #[cfg(target_os = "windows")]
    {
        if let Ok(appdata) = std::env::var("APPDATA") {
            return PathBuf::from(appdata).join(APP_DIR_NAME);
        }
    }

    PathBuf::from(".")
}

/// Get data directory (XDG_DATA_HOME or platform default)
pub fn get_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("CONSOLE_DATA_DIR") {
        return PathBuf::from(dir);
    }

    #[cfg(target_os = "macos")]
    {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home)
                .join("Library/Application Support")
                .join(APP_DIR_NAME);
        }
    }

    #[cfg(target_os = "linux")]
    {
        if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
            return PathBuf::from(xdg).join(APP_DIR_NAME);
        }
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join(".local/share").join(APP_DIR_NAME);
        }
    }

    #[cfg(target_os = "windows")]
    {
        if let Ok(appdata) = std::env::var("LOCALAPPDATA") {
            return PathBuf::from(appdata).join(APP_DIR_NAME);
        }
    }

    PathBuf::from("./data")
}

/// Parse a truthy flag value ("true" / "1")
fn is_truthy(value: &str) -> bool {
    let value = value.trim();
    value.eq_ignore_ascii_case("true") || value == "1"
}

pub fn load_config() -> Result<Config> {
    let config_dir = get_config_dir();

    let mut builder = ::config::Config::builder()
        .set_default("base_url", default_base_url())?
        .set_default("environment", default_environment())?
        .set_default("request_timeout_secs", default_request_timeout_secs() as i64)?
        .add_source(
            ::config::File::with_name(&config_dir.join("config").to_string_lossy()).required(false),
        )
        // CONSOLE_BASE_URL, CONSOLE_OPEN_PROXY, CONSOLE_VIEW_MODULES=a,b ...
        .add_source(
            ::config::Environment::with_prefix("CONSOLE")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("view_modules"),
        );

    // Legacy frontend build variables still honoured by deploy scripts
    if let Ok(env) = std::env::var("NODE_ENV") {
        builder = builder.set_override("environment", env)?;
    }
    if let Ok(flag) = std::env::var("VUE_APP_OPEN_PROXY") {
        builder = builder.set_override("open_proxy", is_truthy(&flag))?;
    }

    let config: Config = builder.build()?.try_deserialize()?;

    if url::Url::parse(&config.base_url).is_err() {
        tracing::warn!(
            "base_url {:?} is not an absolute URL; requests will be relative",
            config.base_url
        );
    }

    Ok(config)
}
