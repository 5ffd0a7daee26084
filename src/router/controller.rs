//! Navigation controller: before-navigation guard, dynamic route
//! installation and the navigation pipeline.
//!
//! ```text
//! navigate(target)
//!   → before_each   installed or global → Next
//!                   no credential → Redirect(login)
//!                   else fetch menu (single flight):
//!                     code 0   → install, persist, Replay (replace)
//!                     code ≠ 0 → persist "[]", Next
//!                     error    → Redirect(login)
//!   → match         follow record redirects (main → home, * → 404)
//!   → enter_main    main subtree needs a credential
//!   → commit        push / replace history (same path → replace)
//! ```

use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{broadcast, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::classify::{classify, RouteKind};
use super::guard::{enter_main, GuardDecision, GuardState};
use super::history::{History, Location, NavTarget};
use super::menu::{MenuSource, NavMenu};
use super::route::{
    global_routes, main_route, RouteDefinition, RouteMatch, RouteTable, ViewResolver, LOGIN,
    MAIN_DYNAMIC,
};
use super::synth::synthesize;
use crate::bus::{BusEvent, SharedBus};
use crate::session::{
    SharedSession, DYNAMIC_MENU_ROUTES_KEY, MENU_LIST_KEY, PERMISSIONS_KEY,
};

/// Upper bound on guard/record redirects within one navigation
pub const MAX_NAVIGATION_HOPS: usize = 8;

const EMPTY_LIST: &str = "[]";

#[derive(Debug, Error)]
pub enum NavigationError {
    #[error("navigation to {target} exceeded {hops} redirects")]
    RedirectLoop { target: String, hops: usize },
}

pub struct NavigationController {
    session: SharedSession,
    menu_source: Arc<dyn MenuSource>,
    resolver: Arc<dyn ViewResolver>,
    bus: SharedBus,
    static_routes: Vec<RouteDefinition>,
    table: RwLock<RouteTable>,
    history: RwLock<History>,
    /// Serializes menu fetches so only one install happens per session
    install_lock: Mutex<()>,
}

impl NavigationController {
    pub fn new(
        session: SharedSession,
        menu_source: Arc<dyn MenuSource>,
        resolver: Arc<dyn ViewResolver>,
        bus: SharedBus,
    ) -> Self {
        Self {
            session,
            menu_source,
            resolver,
            bus,
            static_routes: global_routes(),
            table: RwLock::new(RouteTable::with_static_routes()),
            history: RwLock::new(History::default()),
            install_lock: Mutex::new(()),
        }
    }

    pub fn session(&self) -> &SharedSession {
        &self.session
    }

    pub fn state(&self) -> GuardState {
        if self.session.routes_installed() {
            GuardState::RoutesReady
        } else {
            GuardState::RoutesPending
        }
    }

    /// Snapshot of the registered routes
    pub async fn route_table(&self) -> RouteTable {
        self.table.read().await.clone()
    }

    pub async fn current(&self) -> Option<Location> {
        self.history.read().await.current().cloned()
    }

    pub async fn history_len(&self) -> usize {
        self.history.read().await.len()
    }

    pub async fn push(&self, target: NavTarget) -> Result<Location, NavigationError> {
        self.navigate(target, false).await
    }

    pub async fn replace(&self, target: NavTarget) -> Result<Location, NavigationError> {
        self.navigate(target, true).await
    }

    async fn navigate(
        &self,
        mut target: NavTarget,
        mut replace: bool,
    ) -> Result<Location, NavigationError> {
        for _ in 0..MAX_NAVIGATION_HOPS {
            let path = self.target_path(&target).await;

            match self.before_each(&path).await {
                GuardDecision::Next => {}
                GuardDecision::Replay => {
                    debug!("Replaying navigation to {} with replace", target);
                    replace = true;
                    continue;
                }
                GuardDecision::Redirect(next) => {
                    info!("Navigation to {} redirected to {}", target, next);
                    target = next;
                    continue;
                }
            }

            let matched = self.match_target(&target).await;
            if let Some(m) = &matched {
                if let Some(redirect) = m.leaf().and_then(|r| r.redirect.clone()) {
                    target = NavTarget::Name(redirect);
                    continue;
                }
                if m.requires_auth() {
                    if let GuardDecision::Redirect(next) = enter_main(&self.session).await {
                        target = next;
                        continue;
                    }
                }
            }

            let location = Location::from_match(&path, matched);
            self.commit(location.clone(), replace).await;
            return Ok(location);
        }

        Err(NavigationError::RedirectLoop {
            target: target.to_string(),
            hops: MAX_NAVIGATION_HOPS,
        })
    }

    /// Path the guard sees: named targets resolve through the table, and an
    /// unknown name falls back to "/" (it may exist once routes install).
    async fn target_path(&self, target: &NavTarget) -> String {
        match target {
            NavTarget::Path(path) => path.clone(),
            NavTarget::Name(name) => self
                .table
                .read()
                .await
                .match_name(name)
                .map(|m| m.path)
                .unwrap_or_else(|| "/".to_string()),
        }
    }

    async fn match_target(&self, target: &NavTarget) -> Option<RouteMatch> {
        let table = self.table.read().await;
        match target {
            NavTarget::Path(path) => table.match_path(path),
            NavTarget::Name(name) => table.match_name(name),
        }
    }

    /// Global before-navigation guard
    pub async fn before_each(&self, path: &str) -> GuardDecision {
        if self.session.routes_installed() {
            return GuardDecision::Next;
        }
        if classify(path, &self.static_routes) == RouteKind::Global {
            return GuardDecision::Next;
        }
        if !self.session.has_credential().await {
            // Anonymous sessions go to login without touching the menu endpoint
            return enter_main(&self.session).await;
        }

        let _flight = self.install_lock.lock().await;
        if self.session.routes_installed() {
            // Installed by the navigation we waited on
            return GuardDecision::Next;
        }

        debug!("Dynamic routes pending, fetching menu for {}", path);
        match self.menu_source.fetch_nav_menu().await {
            Ok(menu) if menu.is_success() => {
                self.install_routes(&menu).await;
                GuardDecision::Replay
            }
            Ok(menu) => {
                info!("Menu unavailable (code {:?}), continuing without dynamic routes", menu.code);
                self.session.set_item(MENU_LIST_KEY, EMPTY_LIST).await;
                self.session.set_item(PERMISSIONS_KEY, EMPTY_LIST).await;
                self.bus.publish(BusEvent::MenuUnavailable {
                    code: menu.code.unwrap_or_default(),
                });
                GuardDecision::Next
            }
            Err(e) => {
                warn!("Menu fetch failed: {}", e);
                GuardDecision::to_login()
            }
        }
    }

    /// Synthesize, register, mark installed, persist
    async fn install_routes(&self, menu: &NavMenu) {
        let children = synthesize(menu.entries(), self.resolver.as_ref());

        {
            let mut table = self.table.write().await;
            let mut dynamic = table.main_template().cloned().unwrap_or_else(main_route);
            dynamic.name = MAIN_DYNAMIC.to_string();
            dynamic.children = children.clone();
            table.install_dynamic(dynamic);
        }
        self.session.mark_routes_installed();

        let menu_list = serde_json::to_string(menu.entries()).unwrap_or_else(|_| EMPTY_LIST.into());
        let permissions = serde_json::to_string(menu.permissions.as_deref().unwrap_or_default())
            .unwrap_or_else(|_| EMPTY_LIST.into());
        let dynamic_routes = serde_json::to_string(&children).unwrap_or_else(|_| EMPTY_LIST.into());
        self.session.set_item(MENU_LIST_KEY, menu_list).await;
        self.session.set_item(PERMISSIONS_KEY, permissions).await;
        self.session.set_item(DYNAMIC_MENU_ROUTES_KEY, dynamic_routes).await;

        let route_names: Vec<String> = children.iter().map(|r| r.name.clone()).collect();
        info!("Installed {} dynamic routes", route_names.len());
        self.bus.publish(BusEvent::RoutesInstalled { route_names });
    }

    async fn commit(&self, location: Location, replace: bool) {
        {
            let mut history = self.history.write().await;
            let duplicate = history
                .current()
                .is_some_and(|current| current.path == location.path);
            if replace || duplicate {
                history.replace(location.clone());
            } else {
                history.push(location.clone());
            }
        }
        debug!("Navigated to {}", location.path);
        self.bus.publish(BusEvent::Navigated {
            name: location.name.unwrap_or_default(),
            path: location.path,
        });
    }

    /// Send the user to the login page whenever the transport reports an
    /// invalidated session. Runs until `shutdown` is cancelled.
    pub fn watch_session(self: &Arc<Self>, shutdown: CancellationToken) -> JoinHandle<()> {
        let controller = Arc::clone(self);
        let mut rx = controller.bus.subscribe();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    event = rx.recv() => match event {
                        Ok(BusEvent::SessionInvalidated { url }) => {
                            info!("Session invalidated by {}, returning to login", url);
                            let at_login = controller
                                .current()
                                .await
                                .map(|l| l.is_named(LOGIN))
                                .unwrap_or(false);
                            if at_login {
                                continue;
                            }
                            if let Err(e) = controller.push(NavTarget::name(LOGIN)).await {
                                warn!("Login redirect failed: {}", e);
                            }
                        }
                        Ok(_) => {}
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            warn!("Session watcher lagged, skipped {} events", skipped);
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
            }
            debug!("Session watcher stopped");
        })
    }
}
