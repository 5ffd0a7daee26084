//! Menu → route synthesis.
//!
//! Menu groups are expanded level by level through an explicit FIFO
//! worklist: every leaf at depth N is emitted before any leaf at depth N+1,
//! and within a depth the server's order is kept.

use regex::Regex;
use std::collections::VecDeque;
use std::sync::OnceLock;

use super::menu::MenuEntry;
use super::route::{RouteDefinition, RouteMeta, RouteView, ViewResolver};
use crate::session::is_blank;

/// Directory prefix of dynamically resolved view modules
pub const MODULES_PREFIX: &str = "modules";

fn absolute_url_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^https?://").ok()).as_ref()
}

/// Whether a menu url points at an external page (rendered in an iframe)
pub fn is_absolute_url(url: &str) -> bool {
    absolute_url_regex()
        .map(|re| re.is_match(url))
        .unwrap_or(false)
}

/// Leaves of the menu in level order
pub fn flatten_leaves(entries: &[MenuEntry]) -> Vec<&MenuEntry> {
    let mut queue: VecDeque<&MenuEntry> = entries.iter().collect();
    let mut leaves = Vec::new();
    while let Some(entry) = queue.pop_front() {
        if entry.is_group() {
            queue.extend(entry.children());
        } else {
            leaves.push(entry);
        }
    }
    leaves
}

/// Route for a single leaf, or None when its url is missing/blank
pub fn leaf_route(entry: &MenuEntry, resolver: &dyn ViewResolver) -> Option<RouteDefinition> {
    let url = entry.url.as_deref().filter(|url| !is_blank(url))?;
    let normalized = url.strip_prefix('/').unwrap_or(url);

    let meta = RouteMeta {
        menu_id: entry.menu_id,
        title: entry.name.clone().unwrap_or_default(),
        is_dynamic: true,
        is_tab: true,
        iframe_url: String::new(),
    };

    if is_absolute_url(url) {
        let name = format!("i-{}", entry.menu_id.unwrap_or_default());
        return Some(RouteDefinition::new(
            &name,
            &name,
            RouteView::Iframe,
            RouteMeta {
                iframe_url: url.to_string(),
                ..meta
            },
        ));
    }

    let name = normalized.replacen('/', "-", 1);
    let view = RouteView::from(resolver.resolve(&format!("{}/{}", MODULES_PREFIX, normalized)));
    if let RouteView::Missing(missing) = &view {
        tracing::debug!("Dynamic route {} has no view: {}", name, missing);
    }
    Some(RouteDefinition::new(&name, &name, view, meta))
}

/// Flat route list for the dynamic main subtree
pub fn synthesize(entries: &[MenuEntry], resolver: &dyn ViewResolver) -> Vec<RouteDefinition> {
    flatten_leaves(entries)
        .into_iter()
        .filter_map(|entry| leaf_route(entry, resolver))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::route::{ViewRef, ViewRegistry};

    fn names(routes: &[RouteDefinition]) -> Vec<&str> {
        routes.iter().map(|r| r.name.as_str()).collect()
    }

    #[test]
    fn test_single_leaf_route_shape() {
        let registry = ViewRegistry::new(["modules/order/list"]);
        let routes = synthesize(&[MenuEntry::leaf(7, "Orders", "/order/list")], &registry);

        assert_eq!(routes.len(), 1);
        let route = &routes[0];
        assert_eq!(route.path, "order-list");
        assert_eq!(route.name, "order-list");
        assert_eq!(
            route.meta,
            RouteMeta {
                menu_id: Some(7),
                title: "Orders".to_string(),
                is_dynamic: true,
                is_tab: true,
                iframe_url: String::new(),
            }
        );
        assert_eq!(route.view, RouteView::Component(ViewRef::new("modules/order/list")));
    }

    #[test]
    fn test_only_first_slash_becomes_hyphen() {
        let routes = synthesize(
            &[MenuEntry::leaf(1, "Deep", "/sys/user/detail")],
            &ViewRegistry::default(),
        );
        assert_eq!(routes[0].path, "sys-user/detail");
    }

    #[test]
    fn test_only_one_leading_slash_stripped() {
        let routes = synthesize(&[MenuEntry::leaf(1, "Odd", "//x/y")], &ViewRegistry::default());
        assert_eq!(routes[0].name, "-x/y");
    }

    #[test]
    fn test_blank_urls_produce_no_route() {
        let entries = vec![
            MenuEntry::leaf(1, "Blank", "   "),
            MenuEntry::leaf(2, "Empty", ""),
            MenuEntry {
                url: None,
                ..MenuEntry::leaf(3, "Missing", "")
            },
            MenuEntry::leaf(4, "Ok", "sys/role"),
        ];
        let routes = synthesize(&entries, &ViewRegistry::default());
        assert_eq!(names(&routes), vec!["sys-role"]);
    }

    #[test]
    fn test_absolute_url_becomes_iframe_route() {
        let url = "https://docs.example.com/guide/index.html";
        let routes = synthesize(&[MenuEntry::leaf(31, "Docs", url)], &ViewRegistry::default());

        let route = &routes[0];
        assert_eq!(route.name, "i-31");
        assert_eq!(route.path, "i-31");
        assert_eq!(route.meta.iframe_url, url);
        assert_eq!(route.view, RouteView::Iframe);
    }

    #[test]
    fn test_http_scheme_is_also_external() {
        assert!(is_absolute_url("http://a.b"));
        assert!(is_absolute_url("https://a.b"));
        assert!(!is_absolute_url("/http://a.b"));
        assert!(!is_absolute_url("ftp://a.b"));
        assert!(!is_absolute_url("sys/user"));
    }

    #[test]
    fn test_missing_view_keeps_route() {
        let routes = synthesize(&[MenuEntry::leaf(5, "Gone", "/gone/page")], &ViewRegistry::default());
        assert_eq!(routes.len(), 1);
        match &routes[0].view {
            RouteView::Missing(missing) => assert_eq!(missing.key, "modules/gone/page"),
            other => panic!("expected missing view, got {:?}", other),
        }
    }

    #[test]
    fn test_nested_group_single_leaf() {
        let entries = vec![MenuEntry {
            list: Some(vec![MenuEntry {
                list: Some(vec![MenuEntry::leaf(1, "A", "/a/b")]),
                ..MenuEntry::default()
            }]),
            ..MenuEntry::default()
        }];
        let routes = synthesize(&entries, &ViewRegistry::default());
        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].path, "a-b");
    }

    #[test]
    fn test_level_order_across_interleaved_groups() {
        // depth 0: leaf r0, group G1, leaf r1, group G2
        // depth 1: G1 -> [g1a, group G1x], G2 -> [g2a]
        // depth 2: G1x -> [deep]
        let entries = vec![
            MenuEntry::leaf(1, "r0", "r/0"),
            MenuEntry::group(
                "G1",
                vec![
                    MenuEntry::leaf(2, "g1a", "g1/a"),
                    MenuEntry::group("G1x", vec![MenuEntry::leaf(3, "deep", "deep/x")]),
                ],
            ),
            MenuEntry::leaf(4, "r1", "r/1"),
            MenuEntry::group("G2", vec![MenuEntry::leaf(5, "g2a", "g2/a")]),
        ];

        let routes = synthesize(&entries, &ViewRegistry::default());
        // Depth-first would give r-0, g1-a, deep-x, r-1, g2-a
        assert_eq!(names(&routes), vec!["r-0", "r-1", "g1-a", "g2-a", "deep-x"]);
    }

    #[test]
    fn test_synthesis_is_structurally_idempotent() {
        let entries = vec![
            MenuEntry::group("G", vec![MenuEntry::leaf(2, "x", "/x/y")]),
            MenuEntry::leaf(9, "ext", "http://example.com"),
        ];
        let registry = ViewRegistry::new(["modules/x/y"]);
        let first = synthesize(&entries, &registry);
        let second = synthesize(&entries, &registry);
        assert_eq!(first, second);
        // input untouched
        assert_eq!(entries[0].children()[0].url.as_deref(), Some("/x/y"));
    }
}
