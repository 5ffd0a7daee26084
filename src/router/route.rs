//! Route definitions, view resolution and the registered route table.

use serde::Serialize;
use std::collections::HashSet;
use thiserror::Error;

pub const NOT_FOUND: &str = "404";
pub const LOGIN: &str = "login";
pub const MAIN: &str = "main";
/// Name the main subtree takes once dynamic children are installed
pub const MAIN_DYNAMIC: &str = "main-dynamic";
pub const HOME: &str = "home";
/// Path of the catch-all route appended after the dynamic subtree
pub const CATCH_ALL_PATH: &str = "*";

/// Display metadata carried by every route
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub menu_id: Option<i64>,
    pub title: String,
    pub is_dynamic: bool,
    pub is_tab: bool,
    /// Absolute URL shown in an iframe shell, empty for regular views
    pub iframe_url: String,
}

impl RouteMeta {
    pub fn titled(title: &str) -> Self {
        Self {
            title: title.to_string(),
            ..Self::default()
        }
    }

    pub fn tab(title: &str) -> Self {
        Self {
            is_tab: true,
            ..Self::titled(title)
        }
    }
}

/// Key of a view module, e.g. `modules/order/list`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ViewRef(String);

impl ViewRef {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn key(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no view module registered for {key}")]
pub struct ViewNotFound {
    pub key: String,
}

/// What renders a route
#[derive(Debug, Clone, PartialEq)]
pub enum RouteView {
    Component(ViewRef),
    /// External page rendered by the generic iframe shell
    Iframe,
    /// View lookup failed; the route stays registered and the error
    /// boundary decides what to show
    Missing(ViewNotFound),
    /// Pure container or redirect record
    None,
}

impl From<Result<ViewRef, ViewNotFound>> for RouteView {
    fn from(result: Result<ViewRef, ViewNotFound>) -> Self {
        match result {
            Ok(view) => RouteView::Component(view),
            Err(missing) => RouteView::Missing(missing),
        }
    }
}

/// Resolves view module keys to renderable views
pub trait ViewResolver: Send + Sync {
    fn resolve(&self, key: &str) -> Result<ViewRef, ViewNotFound>;
}

/// Set of view modules known to the bundle
#[derive(Debug, Clone, Default)]
pub struct ViewRegistry {
    keys: HashSet<String>,
}

impl ViewRegistry {
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }

    pub fn register(&mut self, key: impl Into<String>) {
        self.keys.insert(key.into());
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl ViewResolver for ViewRegistry {
    fn resolve(&self, key: &str) -> Result<ViewRef, ViewNotFound> {
        if self.keys.contains(key) {
            Ok(ViewRef::new(key))
        } else {
            Err(ViewNotFound {
                key: key.to_string(),
            })
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteDefinition {
    pub path: String,
    pub name: String,
    /// Name of the route this one redirects to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
    pub meta: RouteMeta,
    #[serde(skip)]
    pub view: RouteView,
    /// Entering this route (or any child) requires a session credential
    #[serde(skip)]
    pub requires_auth: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<RouteDefinition>,
}

impl RouteDefinition {
    pub fn new(path: &str, name: &str, view: RouteView, meta: RouteMeta) -> Self {
        Self {
            path: path.to_string(),
            name: name.to_string(),
            redirect: None,
            meta,
            view,
            requires_auth: false,
            children: Vec::new(),
        }
    }

    fn catch_all(redirect: &str) -> Self {
        Self {
            redirect: Some(redirect.to_string()),
            ..Self::new(CATCH_ALL_PATH, CATCH_ALL_PATH, RouteView::None, RouteMeta::default())
        }
    }
}

/// Global routes: flat, reachable without the main layout or a session
pub fn global_routes() -> Vec<RouteDefinition> {
    vec![
        RouteDefinition::new(
            "/404",
            NOT_FOUND,
            RouteView::Component(ViewRef::new("common/404")),
            RouteMeta::titled("404 Not Found"),
        ),
        RouteDefinition::new(
            "/login",
            LOGIN,
            RouteView::Component(ViewRef::new("common/login")),
            RouteMeta::titled("Login"),
        ),
    ]
}

/// Main layout subtree with its built-in pages
pub fn main_route() -> RouteDefinition {
    let page = |path: &str, name: &str, view: &str, meta: RouteMeta| {
        RouteDefinition::new(path, name, RouteView::Component(ViewRef::new(view)), meta)
    };
    RouteDefinition {
        redirect: Some(HOME.to_string()),
        requires_auth: true,
        children: vec![
            page("/home", HOME, "common/home", RouteMeta::titled("Home")),
            page("/theme", "theme", "common/theme", RouteMeta::titled("Theme")),
            page(
                "/demo-echarts",
                "demo-echarts",
                "demo/echarts",
                RouteMeta::tab("demo-echarts"),
            ),
            page(
                "/demo-user-filter",
                "user-filter",
                "demo/user-filter",
                RouteMeta::tab("User Radar"),
            ),
        ],
        ..RouteDefinition::new(
            "/",
            MAIN,
            RouteView::Component(ViewRef::new("main")),
            RouteMeta::titled("Main Layout"),
        )
    }
}

/// Full path of a child record under `parent`
pub(crate) fn join_path(parent: &str, child: &str) -> String {
    if child.starts_with('/') || child == CATCH_ALL_PATH {
        child.to_string()
    } else if parent.ends_with('/') {
        format!("{}{}", parent, child)
    } else {
        format!("{}/{}", parent, child)
    }
}

/// A matched record chain, root first
#[derive(Debug, Clone, PartialEq)]
pub struct RouteMatch {
    pub path: String,
    pub chain: Vec<RouteDefinition>,
}

impl RouteMatch {
    pub fn leaf(&self) -> Option<&RouteDefinition> {
        self.chain.last()
    }

    pub fn requires_auth(&self) -> bool {
        self.chain.iter().any(|r| r.requires_auth)
    }
}

/// Registered routes, in registration order
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<RouteDefinition>,
}

impl RouteTable {
    pub fn new(routes: Vec<RouteDefinition>) -> Self {
        Self { routes }
    }

    /// Static table: global routes followed by the main subtree
    pub fn with_static_routes() -> Self {
        let mut routes = global_routes();
        routes.push(main_route());
        Self::new(routes)
    }

    pub fn routes(&self) -> &[RouteDefinition] {
        &self.routes
    }

    /// Template for the dynamic subtree (the static main record)
    pub fn main_template(&self) -> Option<&RouteDefinition> {
        self.routes.iter().find(|r| r.name == MAIN)
    }

    /// Register the dynamic main subtree and the trailing catch-all.
    ///
    /// Re-registration replaces an earlier dynamic subtree in place; the
    /// catch-all is only ever added once and always stays last.
    pub fn install_dynamic(&mut self, main_dynamic: RouteDefinition) {
        self.routes.retain(|r| r.path != CATCH_ALL_PATH);
        match self.routes.iter_mut().find(|r| r.name == main_dynamic.name) {
            Some(existing) => *existing = main_dynamic,
            None => self.routes.push(main_dynamic),
        }
        self.routes.push(RouteDefinition::catch_all(NOT_FOUND));
    }

    /// Names of every registered record, depth first
    pub fn names(&self) -> Vec<String> {
        fn walk(routes: &[RouteDefinition], out: &mut Vec<String>) {
            for route in routes {
                out.push(route.name.clone());
                walk(&route.children, out);
            }
        }
        let mut names = Vec::new();
        walk(&self.routes, &mut names);
        names
    }

    pub fn match_name(&self, name: &str) -> Option<RouteMatch> {
        fn walk(
            routes: &[RouteDefinition],
            parent: &str,
            chain: &mut Vec<RouteDefinition>,
            name: &str,
        ) -> Option<RouteMatch> {
            for route in routes {
                let path = join_path(parent, &route.path);
                chain.push(route.clone());
                if route.name == name {
                    return Some(RouteMatch {
                        path,
                        chain: chain.clone(),
                    });
                }
                if let Some(found) = walk(&route.children, &path, chain, name) {
                    return Some(found);
                }
                chain.pop();
            }
            None
        }
        walk(&self.routes, "", &mut Vec::new(), name)
    }

    /// First record whose full path equals `path`; the catch-all matches
    /// anything but is only consulted after every other record.
    pub fn match_path(&self, path: &str) -> Option<RouteMatch> {
        fn walk(
            routes: &[RouteDefinition],
            parent: &str,
            chain: &mut Vec<RouteDefinition>,
            target: &str,
        ) -> Option<RouteMatch> {
            for route in routes.iter().filter(|r| r.path != CATCH_ALL_PATH) {
                let path = join_path(parent, &route.path);
                chain.push(route.clone());
                if path == target {
                    return Some(RouteMatch {
                        path,
                        chain: chain.clone(),
                    });
                }
                if let Some(found) = walk(&route.children, &path, chain, target) {
                    return Some(found);
                }
                chain.pop();
            }
            None
        }
        walk(&self.routes, "", &mut Vec::new(), path).or_else(|| {
            self.routes
                .iter()
                .find(|r| r.path == CATCH_ALL_PATH)
                .map(|catch_all| RouteMatch {
                    path: path.to_string(),
                    chain: vec![catch_all.clone()],
                })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_resolution() {
        let registry = ViewRegistry::new(["modules/order/list"]);
        assert_eq!(
            registry.resolve("modules/order/list"),
            Ok(ViewRef::new("modules/order/list"))
        );
        let missing = registry.resolve("modules/nope").unwrap_err();
        assert_eq!(missing.key, "modules/nope");
        assert_eq!(
            RouteView::from(registry.resolve("modules/nope")),
            RouteView::Missing(missing)
        );
    }

    #[test]
    fn test_join_path() {
        assert_eq!(join_path("/", "order-list"), "/order-list");
        assert_eq!(join_path("/", "/home"), "/home");
        assert_eq!(join_path("/sys", "user"), "/sys/user");
        assert_eq!(join_path("", "/login"), "/login");
    }

    #[test]
    fn test_static_table_matches_by_path_and_name() {
        let table = RouteTable::with_static_routes();

        let home = table.match_path("/home").expect("home registered");
        assert_eq!(home.leaf().unwrap().name, HOME);
        assert_eq!(
            home.chain.iter().map(|r| r.name.as_str()).collect::<Vec<_>>(),
            vec![MAIN, HOME]
        );
        assert!(home.requires_auth());

        let login = table.match_name(LOGIN).expect("login registered");
        assert_eq!(login.path, "/login");
        assert!(!login.requires_auth());

        assert!(table.match_path("/order-list").is_none());
        assert!(table.match_name("order-list").is_none());
    }

    #[test]
    fn test_install_dynamic_appends_catch_all_last() {
        let mut table = RouteTable::with_static_routes();
        let mut dynamic = table.main_template().unwrap().clone();
        dynamic.name = MAIN_DYNAMIC.to_string();
        dynamic.children = vec![RouteDefinition::new(
            "order-list",
            "order-list",
            RouteView::None,
            RouteMeta::default(),
        )];

        table.install_dynamic(dynamic.clone());
        table.install_dynamic(dynamic);

        let paths: Vec<&str> = table.routes().iter().map(|r| r.path.as_str()).collect();
        assert_eq!(paths, vec!["/404", "/login", "/", "/", CATCH_ALL_PATH]);

        let order = table.match_path("/order-list").expect("dynamic child matched");
        assert_eq!(order.chain[0].name, MAIN_DYNAMIC);

        let unknown = table.match_path("/does/not/exist").expect("catch-all");
        assert_eq!(unknown.leaf().unwrap().redirect.as_deref(), Some(NOT_FOUND));

        // "/" still resolves to the static main record registered first
        assert_eq!(table.match_path("/").unwrap().leaf().unwrap().name, MAIN);
    }

    #[test]
    fn test_route_definition_serializes_without_view() {
        let route = RouteDefinition::new(
            "order-list",
            "order-list",
            RouteView::Component(ViewRef::new("modules/order/list")),
            RouteMeta {
                menu_id: Some(7),
                title: "Orders".to_string(),
                is_dynamic: true,
                is_tab: true,
                iframe_url: String::new(),
            },
        );
        let json = serde_json::to_value(&route).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "path": "order-list",
                "name": "order-list",
                "meta": {"menuId": 7, "title": "Orders", "isDynamic": true, "isTab": true, "iframeUrl": ""}
            })
        );
    }
}
