use explorer_core::{build_level, Entry, LeafKind, NavigationState, FOLDER_MIME};
use pretty_assertions::assert_eq;

fn entry(id: &str, name: &str, mime: Option<&str>) -> Entry {
    Entry {
        id: id.to_string(),
        name: name.to_string(),
        mime_type: mime.map(str::to_string),
    }
}

#[test]
fn navigation_snapshot_round_trips_with_camel_case_keys() {
    let state = NavigationState {
        selected_id: Some("doc-1".to_string()),
        collapsed_ids: ["f2".to_string(), "f1".to_string()].into_iter().collect(),
        drawer_open: true,
    };

    let text = serde_json::to_string(&state).unwrap();
    assert_eq!(
        text,
        r#"{"selectedId":"doc-1","collapsedIds":["f1","f2"],"drawerOpen":true}"#
    );
    let restored: NavigationState = serde_json::from_str(&text).unwrap();
    assert_eq!(restored, state);
}

#[test]
fn partial_snapshot_fills_defaults() {
    let restored: NavigationState = serde_json::from_str(r#"{"drawerOpen":true}"#).unwrap();
    assert_eq!(
        restored,
        NavigationState {
            drawer_open: true,
            ..NavigationState::default()
        }
    );
}

#[test]
fn level_order_is_containers_first_then_by_name() {
    let remote_order = vec![
        entry("d", "delta.json", Some("application/json")),
        entry("a", "Beta", Some(FOLDER_MIME)),
        entry("c", "charlie.pdf", None),
        entry("b", "Alpha", Some(FOLDER_MIME)),
    ];
    let mut reversed = remote_order.clone();
    reversed.reverse();

    for entries in [remote_order, reversed] {
        let level = build_level(&entries);
        let names: Vec<&str> = level.iter().map(|node| node.name.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "Beta", "charlie.pdf", "delta.json"]);
        assert!(level[0].is_container && !level[0].loaded());
        assert_eq!(level[2].kind, Some(LeafKind::Presentation));
        assert_eq!(level[3].kind, Some(LeafKind::StructuredDocument));
    }
}
