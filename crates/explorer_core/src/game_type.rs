//! The closed game-type taxonomy shared by validation and dispatch.
//!
//! Three tables live here: the renderer identity of each [`GameType`], the
//! alias table mapping normalized type strings to game types, and the ordered
//! shape-inference rules used when a payload declares no usable type.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameType {
    EscapeGame,
    WhatAndWhy,
    WerBinIch,
    MatchingPuzzle,
    SortierSpiel,
    QuickQuiz,
}

impl GameType {
    pub const ALL: [GameType; 6] = [
        GameType::EscapeGame,
        GameType::WhatAndWhy,
        GameType::WerBinIch,
        GameType::MatchingPuzzle,
        GameType::SortierSpiel,
        GameType::QuickQuiz,
    ];

    /// Canonical normalized key, written back into inferred payloads.
    pub fn as_str(self) -> &'static str {
        match self {
            GameType::EscapeGame => "escape_game",
            GameType::WhatAndWhy => "what_and_why",
            GameType::WerBinIch => "wer_bin_ich",
            GameType::MatchingPuzzle => "matching_puzzle",
            GameType::SortierSpiel => "sortier_spiel",
            GameType::QuickQuiz => "quick_quiz",
        }
    }

    /// Page of the isolated renderer, relative to the renderer base path.
    pub fn renderer_page(self) -> &'static str {
        match self {
            GameType::EscapeGame => "Escape-Game.html",
            GameType::WhatAndWhy => "what_and_why.html",
            GameType::WerBinIch => "wer_bin_ich.html",
            GameType::MatchingPuzzle => "matching_puzzle.html",
            GameType::SortierSpiel => "sortier_spiel.html",
            GameType::QuickQuiz => "quick_quiz.html",
        }
    }

    /// Arrays a payload must populate for the renderer to start.
    pub fn required_arrays(self) -> &'static [&'static str] {
        match self {
            GameType::EscapeGame => &["sections"],
            GameType::WhatAndWhy => &["cases"],
            GameType::WerBinIch => &["legalForms", "questions"],
            GameType::MatchingPuzzle => &["sets"],
            GameType::SortierSpiel => &["columns", "cards"],
            GameType::QuickQuiz => &["questions", "answerLabels"],
        }
    }
}

impl fmt::Display for GameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trim, lowercase, and fold runs of whitespace, hyphens and underscores into
/// a single underscore.
pub fn normalize_type(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_sep = false;
    for c in raw.trim().chars() {
        if c.is_whitespace() || c == '-' || c == '_' {
            pending_sep = true;
            continue;
        }
        if pending_sep && !out.is_empty() {
            out.push('_');
        }
        pending_sep = false;
        out.extend(c.to_lowercase());
    }
    out
}

const DEFAULT_ALIASES: &[(&str, GameType)] = &[
    ("mini_escape_room", GameType::EscapeGame),
    ("escape_room", GameType::EscapeGame),
    ("what_why", GameType::WhatAndWhy),
    ("who_am_i", GameType::WerBinIch),
    ("matching", GameType::MatchingPuzzle),
    ("sorting_game", GameType::SortierSpiel),
    ("quiz", GameType::QuickQuiz),
];

/// Normalized type string -> game type. Canonical keys are always present;
/// aliases are data so the accepted spellings can grow without new branches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeTable {
    entries: Vec<(String, GameType)>,
}

impl Default for TypeTable {
    fn default() -> Self {
        let mut table = Self::canonical();
        for (alias, game_type) in DEFAULT_ALIASES {
            table = table.with_alias(alias, *game_type);
        }
        table
    }
}

impl TypeTable {
    /// Only the canonical keys, no aliases.
    pub fn canonical() -> Self {
        Self {
            entries: GameType::ALL
                .iter()
                .map(|game_type| (game_type.as_str().to_string(), *game_type))
                .collect(),
        }
    }

    pub fn with_alias(mut self, alias: &str, game_type: GameType) -> Self {
        let key = normalize_type(alias);
        if !key.is_empty() && self.lookup_normalized(&key).is_none() {
            self.entries.push((key, game_type));
        }
        self
    }

    /// Normalizes `raw` and looks it up.
    pub fn lookup(&self, raw: &str) -> Option<GameType> {
        self.lookup_normalized(&normalize_type(raw))
    }

    fn lookup_normalized(&self, key: &str) -> Option<GameType> {
        self.entries
            .iter()
            .find(|(entry, _)| entry == key)
            .map(|(_, game_type)| *game_type)
    }
}

/// One shape heuristic: every `requires` field is a populated array and no
/// `excludes` field is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InferenceRule {
    pub game_type: GameType,
    pub requires: &'static [&'static str],
    pub excludes: &'static [&'static str],
}

impl InferenceRule {
    pub fn matches(&self, fields: &Map<String, Value>) -> bool {
        self.requires.iter().all(|key| is_populated_array(fields, key))
            && !self.excludes.iter().any(|key| is_populated_array(fields, key))
    }
}

/// Evaluated in order. Each rule excludes the discriminators of every rule
/// above it, so at most one rule can match any payload.
pub const INFERENCE_RULES: &[InferenceRule] = &[
    InferenceRule {
        game_type: GameType::EscapeGame,
        requires: &["sections"],
        excludes: &[],
    },
    InferenceRule {
        game_type: GameType::WhatAndWhy,
        requires: &["cases"],
        excludes: &["sections"],
    },
    InferenceRule {
        game_type: GameType::WerBinIch,
        requires: &["legalForms"],
        excludes: &["sections", "cases"],
    },
    InferenceRule {
        game_type: GameType::MatchingPuzzle,
        requires: &["sets"],
        excludes: &["sections", "cases", "legalForms"],
    },
    InferenceRule {
        game_type: GameType::SortierSpiel,
        requires: &["columns", "cards"],
        excludes: &["sections", "cases", "legalForms", "sets"],
    },
    InferenceRule {
        game_type: GameType::QuickQuiz,
        requires: &["questions", "answerLabels"],
        excludes: &["sections", "cases", "legalForms", "sets", "columns", "cards"],
    },
];

pub fn infer_type(fields: &Map<String, Value>) -> Option<GameType> {
    INFERENCE_RULES
        .iter()
        .find(|rule| rule.matches(fields))
        .map(|rule| rule.game_type)
}

fn is_populated_array(fields: &Map<String, Value>, key: &str) -> bool {
    matches!(fields.get(key), Some(Value::Array(items)) if !items.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_folds_separators() {
        assert_eq!(normalize_type("  Quick-Quiz "), "quick_quiz");
        assert_eq!(normalize_type("what  and__why"), "what_and_why");
        assert_eq!(normalize_type("Escape - Game"), "escape_game");
        assert_eq!(normalize_type("--_ "), "");
        assert_eq!(normalize_type("_quiz_"), "quiz");
    }

    #[test]
    fn rules_are_pairwise_exclusive() {
        for (i, earlier) in INFERENCE_RULES.iter().enumerate() {
            for later in &INFERENCE_RULES[i + 1..] {
                let excluded = earlier
                    .requires
                    .iter()
                    .any(|key| later.excludes.contains(key));
                assert!(excluded, "{} does not exclude {}", later.game_type, earlier.game_type);
            }
        }
    }
}
