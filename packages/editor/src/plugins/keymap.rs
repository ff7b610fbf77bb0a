use scribe_model::{Command, Dispatch, EditorState, Plugin, PluginKey, Transaction};
use tracing::trace;

const MODIFIERS: [&str; 4] = ["Alt", "Ctrl", "Meta", "Shift"];

/// Canonical form of a key chord: modifiers in a fixed order, `Mod`
/// resolved for the platform, single character keys lowercased.
///
/// `"Shift-Mod-z"` and `"Mod-Shift-Z"` both become `"Ctrl-Shift-z"` off macOS.
pub fn normalize_chord(chord: &str) -> String {
    let mut parts: Vec<&str> = chord.split('-').collect();
    // A trailing empty part means the key itself is `-`
    let key = match parts.pop() {
        Some("") => {
            parts.pop();
            "-".to_string()
        }
        Some(key) => key.to_string(),
        None => String::new(),
    };

    let mut held = [false; 4];
    for modifier in parts {
        let name = match modifier {
            "Mod" if cfg!(target_os = "macos") => "Meta",
            "Mod" => "Ctrl",
            "Cmd" => "Meta",
            "Control" => "Ctrl",
            "Option" => "Alt",
            other => other,
        };
        if let Some(index) = MODIFIERS.iter().position(|known| *known == name) {
            held[index] = true;
        }
    }

    let key = if key.chars().count() == 1 { key.to_lowercase() } else { key };
    let mut normalized = String::new();
    for (modifier, held) in MODIFIERS.iter().zip(held) {
        if held {
            normalized.push_str(modifier);
            normalized.push('-');
        }
    }
    normalized.push_str(&key);
    normalized
}

/// Runs the command bound to a chord
pub struct KeymapPlugin {
    key: PluginKey,
    bindings: Vec<(String, Command)>,
}

impl KeymapPlugin {
    pub fn new(name: &str, bindings: &[(String, Command)]) -> Self {
        Self {
            key: PluginKey::new(&format!("keymap:{name}")),
            bindings: bindings
                .iter()
                .map(|(chord, command)| (normalize_chord(chord), command.clone()))
                .collect(),
        }
    }
}

impl Plugin for KeymapPlugin {
    type State = ();

    fn key(&self) -> &PluginKey {
        &self.key
    }

    fn init(&self, _state: &EditorState) {}

    fn apply(&self, _tr: &Transaction, _value: &(), _old: &EditorState, _new: &EditorState) {}

    fn handle_key(&self, state: &EditorState, chord: &str, dispatch: Dispatch<'_>) -> bool {
        let chord = normalize_chord(chord);
        match self.bindings.iter().find(|(bound, _)| *bound == chord) {
            Some((_, command)) => {
                trace!(keymap = %self.key, chord = %chord, "running key binding");
                command(state, Some(dispatch))
            }
            None => false,
        }
    }
}
