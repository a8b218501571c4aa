use std::sync::Once;

use explorer_core::{update, AppState, Effect, LeafKind, Msg, NavigationState, Node};
use pretty_assertions::assert_eq;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(explorer_logging::initialize_for_tests);
}

/// Root "root" opened at generation 1 with one folder and three leaves loaded.
fn opened_root() -> AppState {
    let (state, _) = update(
        AppState::new(),
        Msg::OpenRoot {
            root_id: "root".to_string(),
            reset: false,
        },
    );
    let (state, _) = update(
        state,
        Msg::RootMetadataLoaded {
            generation: 1,
            root_id: "root".to_string(),
            name: "Games".to_string(),
        },
    );
    let (state, _) = update(
        state,
        Msg::LevelLoaded {
            generation: 1,
            parent: "root".to_string(),
            nodes: vec![
                Node::container("topic", "Topic"),
                Node::leaf("quiz", "quiz.json", LeafKind::StructuredDocument),
                Node::leaf("slides", "slides.pdf", LeafKind::Presentation),
                Node::leaf("notes", "notes.txt", LeafKind::Other),
            ],
        },
    );
    state
}

#[test]
fn open_root_requests_metadata_for_new_generation() {
    init_logging();
    let (state, effects) = update(
        AppState::new(),
        Msg::OpenRoot {
            root_id: "root".to_string(),
            reset: false,
        },
    );

    assert_eq!(state.generation(), 1);
    assert_eq!(
        effects,
        vec![Effect::FetchRootMetadata {
            generation: 1,
            root_id: "root".to_string(),
        }]
    );
}

#[test]
fn root_metadata_clears_selection_and_loads_first_level() {
    init_logging();
    let navigation = NavigationState {
        selected_id: Some("old".to_string()),
        collapsed_ids: ["topic".to_string()].into_iter().collect(),
        drawer_open: true,
    };
    let (state, _) = update(
        AppState::with_navigation(navigation),
        Msg::OpenRoot {
            root_id: "root".to_string(),
            reset: false,
        },
    );
    let (state, effects) = update(
        state,
        Msg::RootMetadataLoaded {
            generation: 1,
            root_id: "root".to_string(),
            name: "Games".to_string(),
        },
    );

    assert_eq!(state.navigation().selected_id, None);
    assert!(state.navigation().collapsed_ids.contains("topic"));
    assert!(state.navigation().drawer_open);
    assert_eq!(state.view().root_name.as_deref(), Some("Games"));
    assert_eq!(
        effects,
        vec![
            Effect::PersistNavigation,
            Effect::EnsureLoaded {
                id: "root".to_string()
            },
        ]
    );
}

#[test]
fn stale_root_metadata_is_ignored() {
    init_logging();
    let (state, _) = update(
        AppState::new(),
        Msg::OpenRoot {
            root_id: "first".to_string(),
            reset: false,
        },
    );
    let (state, _) = update(
        state,
        Msg::OpenRoot {
            root_id: "second".to_string(),
            reset: true,
        },
    );
    let (next, effects) = update(
        state.clone(),
        Msg::RootMetadataLoaded {
            generation: 1,
            root_id: "first".to_string(),
            name: "First".to_string(),
        },
    );

    assert_eq!(next, state);
    assert!(effects.is_empty());
}

#[test]
fn root_switch_resets_navigation_and_clears_caches() {
    init_logging();
    let state = opened_root();
    let (state, _) = update(state, Msg::NodeSelected("quiz".to_string()));
    let (state, _) = update(state, Msg::DrawerSet(true));

    let (state, effects) = update(
        state,
        Msg::OpenRoot {
            root_id: "other".to_string(),
            reset: true,
        },
    );

    assert_eq!(state.generation(), 2);
    assert!(state.tree().is_empty());
    assert_eq!(state.navigation().selected_id, None);
    assert!(state.navigation().drawer_open);
    assert_eq!(
        effects,
        vec![
            Effect::ClearCaches,
            Effect::PersistNavigation,
            Effect::FetchRootMetadata {
                generation: 2,
                root_id: "other".to_string(),
            },
        ]
    );
}

#[test]
fn toggle_unloaded_container_expands_and_loads() {
    init_logging();
    let state = opened_root();
    let (state, effects) = update(state, Msg::ToggleClicked("topic".to_string()));

    assert!(!state.navigation().collapsed_ids.contains("topic"));
    assert_eq!(
        effects,
        vec![
            Effect::PersistNavigation,
            Effect::EnsureLoaded {
                id: "topic".to_string()
            },
        ]
    );
}

#[test]
fn toggle_loaded_container_flips_membership() {
    init_logging();
    let state = opened_root();
    let (state, _) = update(
        state,
        Msg::LevelLoaded {
            generation: 1,
            parent: "topic".to_string(),
            nodes: vec![],
        },
    );

    let (state, effects) = update(state, Msg::ToggleClicked("topic".to_string()));
    assert!(state.navigation().collapsed_ids.contains("topic"));
    assert_eq!(effects, vec![Effect::PersistNavigation]);

    let (state, effects) = update(state, Msg::ToggleClicked("topic".to_string()));
    assert!(!state.navigation().collapsed_ids.contains("topic"));
    assert_eq!(effects, vec![Effect::PersistNavigation]);
}

#[test]
fn toggle_on_leaf_never_records_collapse() {
    init_logging();
    let state = opened_root();
    let (next, effects) = update(state.clone(), Msg::ToggleClicked("quiz".to_string()));

    assert_eq!(next, state);
    assert!(effects.is_empty());
    let quiz = next.tree().node("quiz").unwrap();
    assert!(!next.navigation().is_collapsed(quiz));
}

#[test]
fn selection_routes_by_node_kind() {
    init_logging();
    let state = opened_root();

    let (state, effects) = update(state, Msg::NodeSelected("quiz".to_string()));
    assert_eq!(state.navigation().selected_id.as_deref(), Some("quiz"));
    assert_eq!(
        effects,
        vec![
            Effect::PersistNavigation,
            Effect::ResolveDocument {
                id: "quiz".to_string()
            },
        ]
    );

    let (state, effects) = update(state, Msg::NodeSelected("slides".to_string()));
    assert_eq!(
        effects,
        vec![
            Effect::PersistNavigation,
            Effect::ShowUnsupported {
                id: "slides".to_string(),
                kind: LeafKind::Presentation,
            },
        ]
    );

    let (_state, effects) = update(state, Msg::NodeSelected("topic".to_string()));
    assert_eq!(
        effects,
        vec![
            Effect::PersistNavigation,
            Effect::EnsureLoaded {
                id: "topic".to_string()
            },
            Effect::ShowFolder {
                id: "topic".to_string()
            },
        ]
    );
}

#[test]
fn drawer_mutations_persist() {
    init_logging();
    let (state, effects) = update(AppState::new(), Msg::DrawerToggled);
    assert!(state.navigation().drawer_open);
    assert_eq!(effects, vec![Effect::PersistNavigation]);

    let (state, effects) = update(state, Msg::DrawerSet(false));
    assert!(!state.navigation().drawer_open);
    assert_eq!(effects, vec![Effect::PersistNavigation]);
}

#[test]
fn failed_level_reverts_to_not_loaded_without_touching_siblings() {
    init_logging();
    let state = opened_root();
    let (state, _) = update(
        state,
        Msg::LevelRequested {
            parent: "topic".to_string(),
        },
    );
    assert!(state.tree().node("topic").unwrap().loading);

    let (state, _) = update(
        state,
        Msg::LevelFailed {
            generation: 1,
            parent: "topic".to_string(),
        },
    );
    let topic = state.tree().node("topic").unwrap();
    assert!(!topic.loading);
    assert!(!topic.loaded());
    assert!(state.tree().node("quiz").is_some());
    assert!(state.tree().node("root").unwrap().loaded());
}

#[test]
fn late_level_from_previous_root_is_guarded() {
    init_logging();
    let state = opened_root();
    let (state, _) = update(
        state,
        Msg::OpenRoot {
            root_id: "root".to_string(),
            reset: true,
        },
    );
    let (state, _) = update(
        state,
        Msg::RootMetadataLoaded {
            generation: 2,
            root_id: "root".to_string(),
            name: "Games".to_string(),
        },
    );

    let (state, _) = update(
        state,
        Msg::LevelLoaded {
            generation: 1,
            parent: "root".to_string(),
            nodes: vec![Node::container("stale", "Stale")],
        },
    );

    assert!(state.tree().node("stale").is_none());
    assert!(!state.tree().node("root").unwrap().loaded());
}

#[test]
fn view_lists_expanded_rows_with_depth() {
    init_logging();
    let state = opened_root();
    let (state, _) = update(
        state,
        Msg::LevelLoaded {
            generation: 1,
            parent: "topic".to_string(),
            nodes: vec![Node::leaf("inner", "inner.json", LeafKind::StructuredDocument)],
        },
    );
    let (state, _) = update(state, Msg::NodeSelected("inner".to_string()));

    let view = state.view();
    let rows: Vec<(&str, usize)> = view
        .rows
        .iter()
        .map(|row| (row.label.as_str(), row.depth))
        .collect();
    assert_eq!(
        rows,
        vec![
            ("Topic", 0),
            ("inner", 1),
            ("quiz", 0),
            ("slides", 0),
            ("notes", 0),
        ]
    );
    assert_eq!(view.selected_path, vec!["Topic".to_string(), "inner.json".to_string()]);
    assert!(view.rows[1].selected);

    let (state, _) = update(state, Msg::ToggleClicked("topic".to_string()));
    let view = state.view();
    assert_eq!(view.rows.len(), 4);
    assert!(view.rows[0].collapsed);
}

#[test]
fn root_metadata_failure_is_fatal_for_view() {
    init_logging();
    let (state, _) = update(
        AppState::new(),
        Msg::OpenRoot {
            root_id: "root".to_string(),
            reset: false,
        },
    );
    let (state, effects) = update(
        state,
        Msg::RootMetadataFailed {
            generation: 1,
            message: "404 File not found".to_string(),
        },
    );

    assert!(effects.is_empty());
    assert_eq!(
        state.view().fatal_error.as_deref(),
        Some("404 File not found")
    );
}
