//! Navigation-menu payload and the source it is fetched from.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::http::{HttpClient, TransportError};

/// Envelope code of a successful menu response
pub const MENU_SUCCESS_CODE: i64 = 0;

/// One node of the server menu: a group (non-empty `list`) or a leaf
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub menu_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list: Option<Vec<MenuEntry>>,
    /// parentId, perms, icon, orderNum, ... kept verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MenuEntry {
    pub fn leaf(menu_id: i64, name: &str, url: &str) -> Self {
        Self {
            menu_id: Some(menu_id),
            name: Some(name.to_string()),
            url: Some(url.to_string()),
            ..Self::default()
        }
    }

    pub fn group(name: &str, list: Vec<MenuEntry>) -> Self {
        Self {
            name: Some(name.to_string()),
            list: Some(list),
            ..Self::default()
        }
    }

    pub fn children(&self) -> &[MenuEntry] {
        self.list.as_deref().unwrap_or_default()
    }

    pub fn is_group(&self) -> bool {
        !self.children().is_empty()
    }
}

/// Response envelope of the menu endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavMenu {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub menu_list: Option<Vec<MenuEntry>>,
    #[serde(default)]
    pub permissions: Option<Vec<String>>,
}

impl NavMenu {
    pub fn is_success(&self) -> bool {
        self.code == Some(MENU_SUCCESS_CODE)
    }

    pub fn entries(&self) -> &[MenuEntry] {
        self.menu_list.as_deref().unwrap_or_default()
    }
}

/// Where the guard gets the menu from
#[async_trait]
pub trait MenuSource: Send + Sync {
    async fn fetch_nav_menu(&self) -> Result<NavMenu, TransportError>;
}

#[async_trait]
impl MenuSource for HttpClient {
    async fn fetch_nav_menu(&self) -> Result<NavMenu, TransportError> {
        let action = self.config().menu_nav_path.clone();
        let response = self.get(&action, Value::Null).await?;
        response.json()
    }
}
