use explorer_core::{AppViewModel, LeafKind, TreeRowView};
use explorer_engine::ContentView;

pub(crate) fn render_tree(view: &AppViewModel) -> Vec<String> {
    if let Some(error) = &view.fatal_error {
        return vec![format!("!! {error}")];
    }
    let mut lines = Vec::with_capacity(view.rows.len() + 2);
    lines.push(format!(
        "{} {}",
        if view.drawer_open { "[menu]" } else { "[=]" },
        view.root_name.as_deref().unwrap_or("(loading)")
    ));
    lines.extend(view.rows.iter().map(render_row));
    if !view.selected_path.is_empty() {
        lines.push(format!("> {}", view.selected_path.join(" / ")));
    }
    lines
}

fn render_row(row: &TreeRowView) -> String {
    let marker = match (row.is_container, row.collapsed, row.loading) {
        (true, _, true) => "…",
        (true, true, _) => "▸",
        (true, false, _) => "▾",
        (false, ..) => match row.kind {
            Some(LeafKind::StructuredDocument) => "◆",
            Some(LeafKind::Presentation) => "▤",
            _ => "·",
        },
    };
    let selected = if row.selected { "*" } else { " " };
    format!(
        "{selected}{}{marker} {} [{}]",
        "  ".repeat(row.depth + 1),
        row.label,
        row.id
    )
}

pub(crate) fn render_content(content: &ContentView) -> Vec<String> {
    match content {
        ContentView::Ready => vec!["Select a game from the menu.".to_string()],
        ContentView::Folder { path, children, .. } => {
            let mut lines = vec![format!("Folder: {}", path.join(" / "))];
            if children.is_empty() {
                lines.push("  (empty)".to_string());
            } else {
                lines.extend(children.iter().map(|name| format!("  - {name}")));
            }
            lines
        }
        ContentView::Unsupported { path, kind, .. } => vec![format!(
            "No preview for {} ({})",
            path.join(" / "),
            match kind {
                LeafKind::Presentation => "presentation",
                _ => "unsupported file",
            }
        )],
        ContentView::Game {
            path,
            game_type,
            entry,
            ..
        } => vec![format!("Playing {} [{}] -> {}", path.join(" / "), game_type, entry)],
        ContentView::Error { id, message } => vec![format!("Error in {id}: {message}")],
    }
}
