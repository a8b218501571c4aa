use crate::model::LeafKind;
use crate::{AppState, Effect, Msg, NavigationState, Tree};

/// Pure update function: applies a message to state and returns any effects.
///
/// Every navigation mutation emits `Effect::PersistNavigation` first so the
/// runner writes the snapshot before acting on anything else.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::OpenRoot { root_id, reset } => {
            state.generation += 1;
            state.tree = Tree::default();
            state.root_error = None;
            let mut effects = Vec::with_capacity(3);
            if reset {
                state.navigation = NavigationState {
                    drawer_open: state.navigation.drawer_open,
                    ..NavigationState::default()
                };
                effects.push(Effect::ClearCaches);
                effects.push(Effect::PersistNavigation);
            }
            effects.push(Effect::FetchRootMetadata {
                generation: state.generation,
                root_id,
            });
            effects
        }
        Msg::RootMetadataLoaded {
            generation,
            root_id,
            name,
        } => {
            if generation != state.generation {
                return (state, Vec::new());
            }
            state.tree = Tree::new(root_id.clone(), name, generation);
            // Start state: nothing selected.
            state.navigation.selected_id = None;
            vec![
                Effect::PersistNavigation,
                Effect::EnsureLoaded { id: root_id },
            ]
        }
        Msg::RootMetadataFailed {
            generation,
            message,
        } => {
            if generation == state.generation {
                state.root_error = Some(message);
            }
            Vec::new()
        }
        Msg::ToggleClicked(id) => {
            let Some(node) = state.tree.node(&id) else {
                return (state, Vec::new());
            };
            if !node.is_container {
                return (state, Vec::new());
            }
            if node.loaded() {
                if !state.navigation.collapsed_ids.remove(&id) {
                    state.navigation.collapsed_ids.insert(id);
                }
                vec![Effect::PersistNavigation]
            } else {
                // An unloaded container displays closed; toggling it means expand.
                state.navigation.collapsed_ids.remove(&id);
                vec![Effect::PersistNavigation, Effect::EnsureLoaded { id }]
            }
        }
        Msg::NodeSelected(id) => {
            let Some(node) = state.tree.node(&id) else {
                return (state, Vec::new());
            };
            let mut effects = vec![Effect::PersistNavigation];
            if node.is_container {
                if !node.loaded() {
                    effects.push(Effect::EnsureLoaded { id: id.clone() });
                }
                effects.push(Effect::ShowFolder { id: id.clone() });
            } else {
                match node.kind.unwrap_or(LeafKind::Other) {
                    LeafKind::StructuredDocument => {
                        effects.push(Effect::ResolveDocument { id: id.clone() })
                    }
                    kind => effects.push(Effect::ShowUnsupported {
                        id: id.clone(),
                        kind,
                    }),
                }
            }
            state.navigation.selected_id = Some(id);
            effects
        }
        Msg::DrawerSet(open) => {
            state.navigation.drawer_open = open;
            vec![Effect::PersistNavigation]
        }
        Msg::DrawerToggled => {
            state.navigation.drawer_open = !state.navigation.drawer_open;
            vec![Effect::PersistNavigation]
        }
        Msg::LevelRequested { parent } => {
            state.tree.begin_load(&parent);
            Vec::new()
        }
        Msg::LevelLoaded {
            generation,
            parent,
            nodes,
        } => {
            state.tree.apply_level(generation, &parent, nodes);
            Vec::new()
        }
        Msg::LevelFailed { generation, parent } => {
            state.tree.fail_load(generation, &parent);
            Vec::new()
        }
        Msg::NoOp => Vec::new(),
    };

    (state, effects)
}
