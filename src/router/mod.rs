//! Client-side router: static and dynamic route tables, the
//! before-navigation guard and menu-driven route synthesis.

pub mod classify;
pub mod controller;
pub mod guard;
pub mod history;
pub mod menu;
pub mod route;
pub mod synth;

pub use classify::{classify, RouteKind};
pub use controller::{NavigationController, NavigationError, MAX_NAVIGATION_HOPS};
pub use guard::{enter_main, GuardDecision, GuardState};
pub use history::{History, Location, NavTarget};
pub use menu::{MenuEntry, MenuSource, NavMenu};
pub use route::{
    global_routes, main_route, RouteDefinition, RouteMatch, RouteMeta, RouteTable, RouteView,
    ViewNotFound, ViewRef, ViewRegistry, ViewResolver,
};
pub use synth::synthesize;
