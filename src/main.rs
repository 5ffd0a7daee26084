//! Admin Console bootstrap
//!
//! Usage: `admin-console [TARGET]` where TARGET is a path (`/order-list`) or
//! a route name prefixed with `@` (`@home`). Defaults to `/`.

use admin_console::{bus, config, http, router, session};

use anyhow::Result;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use router::{NavTarget, NavigationController, ViewRegistry};

/// View modules bundled with the console shell
const BUILTIN_VIEWS: &[&str] = &[
    "main",
    "common/404",
    "common/login",
    "common/home",
    "common/theme",
    "demo/echarts",
    "demo/user-filter",
];

/// Built-in views plus the bundle's module views from config
fn view_registry(config: &config::Config) -> ViewRegistry {
    let mut views = ViewRegistry::new(BUILTIN_VIEWS.iter().copied());
    for key in &config.view_modules {
        views.register(key.trim_start_matches('/'));
    }
    views
}

fn parse_target(arg: Option<String>) -> NavTarget {
    match arg {
        Some(arg) => match arg.strip_prefix('@') {
            Some(name) => NavTarget::name(name),
            None => NavTarget::path(arg),
        },
        None => NavTarget::path("/"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "admin_console=debug,reqwest=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "Starting Admin Console v{} ({})",
        env!("CONSOLE_VERSION"),
        env!("CONSOLE_GIT_SHA")
    );

    let config = config::load_config()?;
    tracing::info!(
        "Configuration loaded, environment: {}, api: {}",
        config.environment,
        http::adorn::adorn_url(&config, "")
    );

    let data_dir = config::get_data_dir();
    let session = session::Session::with_persistence(data_dir).shared();
    if let Ok(token) = std::env::var("CONSOLE_TOKEN") {
        session.set_token(token).await;
        tracing::info!("Session credential taken from CONSOLE_TOKEN");
    }

    let views = view_registry(&config);
    if config.view_modules.is_empty() {
        tracing::warn!("No view_modules configured; dynamic menu routes will have no views");
    } else {
        tracing::info!("Registered {} view modules", views.len());
    }

    let bus = bus::create_bus();
    let client = http::HttpClient::new(config, session.clone(), bus.clone())?;

    let controller = Arc::new(NavigationController::new(
        session,
        Arc::new(client),
        Arc::new(views),
        bus,
    ));

    let shutdown = CancellationToken::new();
    let watcher = controller.watch_session(shutdown.clone());

    let target = parse_target(std::env::args().nth(1));
    let location = controller.push(target).await?;
    tracing::info!(
        "Settled on {} (name: {}, matched: {:?})",
        location.path,
        location.name.as_deref().unwrap_or("-"),
        location.matched
    );
    tracing::info!("Registered routes: {:?}", controller.route_table().await.names());

    shutdown.cancel();
    watcher.await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
