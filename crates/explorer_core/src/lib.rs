//! Explorer core: pure tree/navigation state machine, game-type taxonomy and
//! payload resolution.
mod effect;
mod game_type;
mod model;
mod msg;
mod payload;
mod resolve;
mod state;
mod tree;
mod update;
mod view_model;

pub use effect::Effect;
pub use game_type::{
    infer_type, normalize_type, GameType, InferenceRule, TypeTable, INFERENCE_RULES,
};
pub use model::{
    build_level, classify_leaf, compare_nodes, display_label, Children, Entry, LeafKind, Node,
    NodeId, FOLDER_MIME,
};
pub use msg::Msg;
pub use payload::{Payload, DECLARED_TYPE_KEYS};
pub use resolve::{
    resolve_step, validate_payload, Resolution, ResolveEffect, ResolveFailure, ResolveMsg,
    ResolvePhase, Validation,
};
pub use state::{AppState, NavigationState};
pub use tree::Tree;
pub use update::update;
pub use view_model::{AppViewModel, TreeRowView};
