//! Global-vs-main classification of navigation targets.

use super::route::RouteDefinition;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteKind {
    /// Static route, reachable without dynamic routes
    Global,
    /// Belongs to the main subtree (possibly not registered yet)
    Main,
}

/// Classify `path` against the static routes.
///
/// Each level is compared in full before descending: top-level paths first,
/// then the children of every static route, and so on.
pub fn classify(path: &str, static_routes: &[RouteDefinition]) -> RouteKind {
    let mut level: Vec<&RouteDefinition> = static_routes.iter().collect();
    while !level.is_empty() {
        if level.iter().any(|route| route.path == path) {
            return RouteKind::Global;
        }
        level = level
            .iter()
            .flat_map(|route| route.children.iter())
            .collect();
    }
    RouteKind::Main
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::route::{global_routes, RouteMeta, RouteView};

    fn route(path: &str, children: Vec<RouteDefinition>) -> RouteDefinition {
        RouteDefinition {
            children,
            ..RouteDefinition::new(path, path, RouteView::None, RouteMeta::default())
        }
    }

    #[test]
    fn test_static_paths_are_global() {
        let routes = global_routes();
        assert_eq!(classify("/404", &routes), RouteKind::Global);
        assert_eq!(classify("/login", &routes), RouteKind::Global);
    }

    #[test]
    fn test_unknown_paths_are_main() {
        let routes = global_routes();
        assert_eq!(classify("/", &routes), RouteKind::Main);
        assert_eq!(classify("/order-list", &routes), RouteKind::Main);
        assert_eq!(classify("", &routes), RouteKind::Main);
        assert_eq!(classify("/login/", &routes), RouteKind::Main);
    }

    #[test]
    fn test_nested_static_children_are_global_at_any_depth() {
        let routes = vec![
            route("/a", vec![route("/a/b", vec![route("/a/b/c", vec![])])]),
            route("/x", vec![route("/x/y", vec![])]),
        ];
        assert_eq!(classify("/a/b/c", &routes), RouteKind::Global);
        assert_eq!(classify("/x/y", &routes), RouteKind::Global);
        assert_eq!(classify("/a/c", &routes), RouteKind::Main);
    }

    #[test]
    fn test_empty_static_set_is_always_main() {
        assert_eq!(classify("/login", &[]), RouteKind::Main);
    }
}
