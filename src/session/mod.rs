//! Session context shared by the transport and the router
//!
//! Holds three pieces of client state:
//! - cookie-style credential store (the `token` key), optionally persisted
//! - session-scoped storage for the menu/permission/route artifacts
//! - the "dynamic routes installed" flag
//!
//! Session storage never touches disk; it lives as long as the process.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Cookie key of the session credential
pub const TOKEN_KEY: &str = "token";
/// Session storage key of the raw server menu list (JSON)
pub const MENU_LIST_KEY: &str = "menuList";
/// Session storage key of the flattened permission list (JSON)
pub const PERMISSIONS_KEY: &str = "permissions";
/// Session storage key of the synthesized dynamic route descriptors (JSON)
pub const DYNAMIC_MENU_ROUTES_KEY: &str = "dynamicMenuRoutes";

const CREDENTIALS_FILE: &str = "credentials.json";

/// True when the value has no non-whitespace character
pub fn is_blank(value: &str) -> bool {
    value.chars().all(char::is_whitespace)
}

pub struct Session {
    cookies: RwLock<HashMap<String, String>>,
    storage: RwLock<HashMap<String, String>>,
    routes_installed: AtomicBool,
    data_dir: Option<PathBuf>,
}

pub type SharedSession = Arc<Session>;

impl Session {
    /// In-memory session (nothing persisted)
    pub fn new() -> Self {
        Self {
            cookies: RwLock::new(HashMap::new()),
            storage: RwLock::new(HashMap::new()),
            routes_installed: AtomicBool::new(false),
            data_dir: None,
        }
    }

    /// Session whose cookies survive restarts in `data_dir/credentials.json`
    pub fn with_persistence(data_dir: PathBuf) -> Self {
        let cookies = Self::load_from_disk(&data_dir);
        Self {
            cookies: RwLock::new(cookies),
            storage: RwLock::new(HashMap::new()),
            routes_installed: AtomicBool::new(false),
            data_dir: Some(data_dir),
        }
    }

    pub fn shared(self) -> SharedSession {
        Arc::new(self)
    }

    fn credentials_file(data_dir: &Path) -> PathBuf {
        data_dir.join(CREDENTIALS_FILE)
    }

    fn load_from_disk(data_dir: &Path) -> HashMap<String, String> {
        let path = Self::credentials_file(data_dir);
        if let Ok(content) = fs::read_to_string(&path) {
            if let Ok(cookies) = serde_json::from_str(&content) {
                return cookies;
            }
            tracing::warn!("Ignoring unreadable credentials file {}", path.display());
        }
        HashMap::new()
    }

    async fn save_to_disk(&self) {
        let Some(data_dir) = &self.data_dir else {
            return;
        };
        let cookies = self.cookies.read().await;
        let path = Self::credentials_file(data_dir);

        if let Some(parent) = path.parent() {
            let _ = fs::create_dir_all(parent);
        }

        match serde_json::to_string_pretty(&*cookies) {
            Ok(json) => {
                if let Err(e) = fs::write(&path, json) {
                    tracing::warn!("Failed to persist credentials: {}", e);
                }
            }
            Err(e) => tracing::warn!("Failed to serialize credentials: {}", e),
        }
    }

    // =========================================================================
    // Credential
    // =========================================================================

    /// Current session credential, if any (may be blank)
    pub async fn token(&self) -> Option<String> {
        self.cookies.read().await.get(TOKEN_KEY).cloned()
    }

    /// Store the credential issued at login
    pub async fn set_token(&self, token: impl Into<String>) {
        self.cookies
            .write()
            .await
            .insert(TOKEN_KEY.to_string(), token.into());
        self.save_to_disk().await;
    }

    /// Whether a usable (present, non-blank) credential is held
    pub async fn has_credential(&self) -> bool {
        self.token()
            .await
            .map(|token| !is_blank(&token))
            .unwrap_or(false)
    }

    /// Drop all session-scoped authentication state.
    ///
    /// Removes the credential and resets the installed flag so the next
    /// session fetches its menu again.
    pub async fn clear_login_info(&self) {
        self.cookies.write().await.remove(TOKEN_KEY);
        self.routes_installed.store(false, Ordering::SeqCst);
        self.save_to_disk().await;
        tracing::info!("Session login info cleared");
    }

    // =========================================================================
    // Installed flag
    // =========================================================================

    pub fn routes_installed(&self) -> bool {
        self.routes_installed.load(Ordering::SeqCst)
    }

    pub fn mark_routes_installed(&self) {
        self.routes_installed.store(true, Ordering::SeqCst);
    }

    // =========================================================================
    // Session storage
    // =========================================================================

    pub async fn get_item(&self, key: &str) -> Option<String> {
        self.storage.read().await.get(key).cloned()
    }

    pub async fn set_item(&self, key: &str, value: impl Into<String>) {
        self.storage
            .write()
            .await
            .insert(key.to_string(), value.into());
    }

    pub async fn remove_item(&self, key: &str) {
        self.storage.write().await.remove(key);
    }

    /// Persisted permission list (empty when absent or malformed)
    pub async fn permissions(&self) -> Vec<String> {
        self.get_item(PERMISSIONS_KEY)
            .await
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default()
    }

    /// Whether the session holds the given permission key
    pub async fn is_auth(&self, permission: &str) -> bool {
        self.permissions().await.iter().any(|p| p == permission)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
